use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SVR weights — per-signal weighting for stop / value / repeat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configurable weights for the three SVR dimensions. Defaults are the
/// reconciled set; each sub-vector is expected to sum to ~1.0 but this
/// is not enforced — callers normalize if they tune them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrWeights {
    #[serde(default)]
    pub stop: StopWeights,
    #[serde(default)]
    pub value: ValueWeights,
    #[serde(default)]
    pub repeat: RepeatWeights,
}

impl Default for SvrWeights {
    fn default() -> Self {
        Self {
            stop: StopWeights::default(),
            value: ValueWeights::default(),
            repeat: RepeatWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StopWeights {
    #[serde(default = "d_030")]
    pub consensus_contribution: f64,
    #[serde(default = "d_025")]
    pub saturation: f64,
    #[serde(default = "d_015")]
    pub fatigue: f64,
    #[serde(default = "d_020")]
    pub global_stop_signal: f64,
    #[serde(default = "d_010")]
    pub time_factor: f64,
}

impl Default for StopWeights {
    fn default() -> Self {
        Self {
            consensus_contribution: 0.30,
            saturation: 0.25,
            fatigue: 0.15,
            global_stop_signal: 0.20,
            time_factor: 0.10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValueWeights {
    #[serde(default = "d_035")]
    pub turn_quality: f64,
    #[serde(default = "d_025")]
    pub history_performance: f64,
    #[serde(default = "d_025")]
    pub interaction_potential: f64,
    #[serde(default = "d_015")]
    pub topical_relevance: f64,
}

impl Default for ValueWeights {
    fn default() -> Self {
        Self {
            turn_quality: 0.35,
            history_performance: 0.25,
            interaction_potential: 0.25,
            topical_relevance: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RepeatWeights {
    #[serde(default = "d_040")]
    pub self_similarity: f64,
    #[serde(default = "d_025")]
    pub pattern_repetition: f64,
    #[serde(default = "d_020")]
    pub argument_recycling: f64,
    #[serde(default = "d_015")]
    pub frequency_risk: f64,
}

impl Default for RepeatWeights {
    fn default() -> Self {
        Self {
            self_similarity: 0.40,
            pattern_repetition: 0.25,
            argument_recycling: 0.20,
            frequency_risk: 0.15,
        }
    }
}

fn d_010() -> f64 {
    0.10
}
fn d_015() -> f64 {
    0.15
}
fn d_020() -> f64 {
    0.20
}
fn d_025() -> f64 {
    0.25
}
fn d_030() -> f64 {
    0.30
}
fn d_035() -> f64 {
    0.35
}
fn d_040() -> f64 {
    0.40
}
