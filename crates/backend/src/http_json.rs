//! A generic single-endpoint JSON HTTP backend.
//!
//! POSTs `{system, history, params}` and expects `{text, usage}` back.
//! Works against any service that speaks this minimal contract — this
//! engine does not assume a specific vendor wire format the way the
//! teacher's OpenAI-compatible adapter does.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use conclave_domain::config::PlatformConfig;
use conclave_domain::think::ThinkError;
use serde::Serialize;
use serde_json::Value;

use crate::traits::{AgentBackend, HistoryTurn, ThinkReply, ThinkRequest, Usage};
use crate::util::{from_reqwest, mask_secrets, resolve_api_key};

const RETRY_BASE: Duration = Duration::from_millis(250);
const RETRY_CAP: Duration = Duration::from_secs(2);

pub struct HttpJsonBackend {
    platform_id: String,
    base_url: String,
    api_key: Option<String>,
    default_model: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct WireHistoryTurn<'a> {
    speaker: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct WireParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    system: &'a str,
    history: Vec<WireHistoryTurn<'a>>,
    params: WireParams<'a>,
}

impl HttpJsonBackend {
    pub fn from_config(cfg: &PlatformConfig) -> Result<Self, ThinkError> {
        let api_key = match resolve_api_key(&cfg.api_key, &cfg.api_key_env) {
            Ok(key) => Some(key),
            Err(_) if cfg.api_key.is_none() && cfg.api_key_env.is_none() => None,
            Err(e) => return Err(e),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            platform_id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: cfg.model.clone(),
            max_retries: cfg.max_retries,
            client,
        })
    }

    fn build_body(&self, req: &ThinkRequest) -> WireRequest<'_> {
        WireRequest {
            system: &req.system_prompt,
            history: req
                .history
                .iter()
                .map(|t| WireHistoryTurn {
                    speaker: &t.speaker,
                    content: &t.content,
                })
                .collect(),
            params: WireParams {
                model: req
                    .params
                    .model
                    .as_deref()
                    .or(self.default_model.as_deref()),
                temperature: req.params.temperature,
                max_tokens: req.params.max_tokens,
            },
        }
    }

    fn parse_reply(body: &Value) -> Result<ThinkReply, ThinkError> {
        let text = body
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ThinkError::Permanent("response missing 'text' field".into()))?
            .to_string();

        let usage = body
            .get("usage")
            .map(|u| Usage {
                prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                completion_tokens: u
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            })
            .unwrap_or_default();

        Ok(ThinkReply { text, usage })
    }
}

#[async_trait]
impl AgentBackend for HttpJsonBackend {
    async fn think(&self, req: ThinkRequest) -> Result<ThinkReply, ThinkError> {
        let body = self.build_body(&req);
        let mut last_err: Option<ThinkError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = (RETRY_BASE * 2u32.pow(attempt - 1)).min(RETRY_CAP);
                tokio::time::sleep(backoff).await;
            }

            let started = Instant::now();
            let mut builder = self.client.post(&self.base_url).json(&body);
            if let Some(ref key) = self.api_key {
                builder = builder.bearer_auth(key);
            }

            match builder.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let resp_json: Value = match resp.json().await {
                        Ok(v) => v,
                        Err(e) => return Err(from_reqwest(e)),
                    };
                    return Self::parse_reply(&resp_json);
                }
                Ok(resp) if resp.status().is_server_error() => {
                    let status = resp.status();
                    tracing::warn!(
                        platform = %self.platform_id,
                        status = %status,
                        attempt,
                        duration_ms = started.elapsed().as_millis() as u64,
                        "backend returned server error, retrying"
                    );
                    last_err = Some(ThinkError::Transient(format!("HTTP {status}")));
                    continue;
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body_text = resp.text().await.unwrap_or_default();
                    return Err(ThinkError::Permanent(format!(
                        "HTTP {status} — {}",
                        mask_secrets(&body_text)
                    )));
                }
                Err(e) => {
                    tracing::warn!(
                        platform = %self.platform_id,
                        attempt,
                        error = %e,
                        "backend request failed, retrying"
                    );
                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or(ThinkError::Timeout))
    }

    fn platform_id(&self) -> &str {
        &self.platform_id
    }
}
