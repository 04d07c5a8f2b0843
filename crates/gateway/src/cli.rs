//! Command-line surface: `conclave serve`, `conclave config validate|show`.

use clap::{Parser, Subcommand};
use conclave_domain::config::EngineConfig;

/// Conclave — a multi-agent deliberative discussion orchestration engine.
#[derive(Debug, Parser)]
#[command(name = "conclave", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the gateway server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the configuration from the path named by `CONCLAVE_CONFIG` (or
/// `config.toml` by default). Returns the parsed config and the path used.
pub fn load_config() -> anyhow::Result<(EngineConfig, String)> {
    let config_path = std::env::var("CONCLAVE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        EngineConfig::default()
    };

    Ok((config, config_path))
}

pub mod config {
    use conclave_domain::config::{ConfigSeverity, EngineConfig};

    /// Parse and validate the config, printing any issues. Returns `true`
    /// when the config has no error-severity issues.
    pub fn validate(config: &EngineConfig, config_path: &str) -> bool {
        let issues = config.validate();

        if issues.is_empty() {
            println!("Config OK ({config_path})");
            return true;
        }

        let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();
        let warning_count = issues.len() - error_count;

        for issue in &issues {
            println!("{issue}");
        }

        println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");
        error_count == 0
    }

    /// Dump the resolved config (with all defaults filled in) as TOML.
    pub fn show(config: &EngineConfig) {
        match toml::to_string_pretty(config) {
            Ok(output) => print!("{output}"),
            Err(e) => {
                eprintln!("failed to serialize config: {e}");
                std::process::exit(1);
            }
        }
    }
}
