//! Translation engines.
//!
//! The pipeline only sees the [`Translate`] trait: one blocking call per chunk
//! of text. The engines here talk to model-backed HTTP services.

use crate::config::{EngineKind, TranslateConfig};
use crate::error::EngineError;
use log::warn;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// A text-to-text translation capability
pub trait Translate {
    fn translate(&self, text: &str) -> Result<String, EngineError>;
}

impl<T: Translate + ?Sized> Translate for Box<T> {
    fn translate(&self, text: &str) -> Result<String, EngineError> {
        (**self).translate(text)
    }
}

/// Build the engine selected by `config`.
pub fn from_config(config: &TranslateConfig) -> Result<Box<dyn Translate>, EngineError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| EngineError::RequestFailed(e.to_string()))?;
    let retry = RetryPolicy {
        max_retries: config.max_retries,
        backoff_base_ms: config.backoff_base_ms,
    };

    Ok(match config.engine {
        EngineKind::LibreTranslate => Box::new(LibreTranslate {
            client,
            url: format!("{}/translate", config.endpoint()),
            source: config.source_language.clone(),
            target: config.target_language.clone(),
            api_key: config.api_key.clone(),
            retry,
        }),
        EngineKind::Ollama => Box::new(Ollama {
            client,
            url: format!("{}/api/generate", config.endpoint()),
            model: config.model.clone().unwrap_or_default(),
            source: config.source_language.clone(),
            target: config.target_language.clone(),
            retry,
        }),
    })
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Run `request`, retrying transient failures with exponential backoff.
    pub fn run<T>(
        &self,
        mut request: impl FnMut() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut attempt = 0;
        loop {
            match request() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = self.backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
                    warn!(
                        "Engine request failed: {} - retrying in {} ms (attempt {}/{})",
                        e,
                        backoff_ms,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn send_json<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, EngineError> {
    let response = request
        .send()
        .map_err(|e| EngineError::RequestFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        return Err(EngineError::Api {
            status_code: status.as_u16(),
            message,
        });
    }

    response
        .json::<R>()
        .map_err(|e| EngineError::Parse(e.to_string()))
}

/// Client for a LibreTranslate-compatible server
pub struct LibreTranslate {
    client: Client,
    url: String,
    source: String,
    target: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl Translate for LibreTranslate {
    fn translate(&self, text: &str) -> Result<String, EngineError> {
        let body = LibreRequest {
            q: text,
            source: &self.source,
            target: &self.target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        self.retry.run(|| {
            let response: LibreResponse = send_json(self.client.post(&self.url).json(&body))?;
            Ok(response.translated_text)
        })
    }
}

/// Client for a model served by Ollama's generate endpoint
pub struct Ollama {
    client: Client,
    url: String,
    model: String,
    source: String,
    target: String,
    retry: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    system: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Ollama {
    fn system_prompt(&self) -> String {
        format!(
            "You are a literary translator. Translate the user's text from {} to {}. \
             Reply with the translation only, without notes or quotation marks.",
            self.source, self.target
        )
    }
}

impl Translate for Ollama {
    fn translate(&self, text: &str) -> Result<String, EngineError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: text.to_string(),
            system: self.system_prompt(),
            stream: false,
        };
        self.retry.run(|| {
            let response: GenerateResponse = send_json(self.client.post(&self.url).json(&body))?;
            Ok(response.response.trim().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        }
    }

    #[test]
    fn test_retry_recovers_from_transient_failures() {
        let calls = Cell::new(0);
        let result = policy(2).run(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(EngineError::RequestFailed("timed out".into()))
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = policy(1).run(|| {
            calls.set(calls.get() + 1);
            Err(EngineError::Api {
                status_code: 503,
                message: "busy".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = policy(5).run(|| {
            calls.set(calls.get() + 1);
            Err(EngineError::Api {
                status_code: 400,
                message: "bad language".into(),
            })
        });
        assert!(matches!(result, Err(EngineError::Api { status_code: 400, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_libretranslate_request_shape() {
        let body = LibreRequest {
            q: "Bonjour",
            source: "fr",
            target: "en",
            format: "text",
            api_key: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"q": "Bonjour", "source": "fr", "target": "en", "format": "text"})
        );
        let reply: LibreResponse = serde_json::from_str(r#"{"translatedText":"Hello"}"#).unwrap();
        assert_eq!(reply.translated_text, "Hello");
    }

    #[test]
    fn test_unreachable_engine_reports_request_failure() {
        let config = TranslateConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: 2,
            ..TranslateConfig::default()
        };
        let engine = from_config(&config).unwrap();
        let err = engine.translate("Bonjour").unwrap_err();
        assert!(matches!(err, EngineError::RequestFailed(_)));
    }
}
