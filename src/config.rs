use crate::cli::TranslateArgs;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Translation service that backs the translation port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// LibreTranslate-compatible `/translate` endpoint
    #[default]
    #[value(name = "libretranslate")]
    LibreTranslate,
    /// Local model served by Ollama
    Ollama,
}

impl EngineKind {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::LibreTranslate => "http://localhost:5000",
            Self::Ollama => "http://localhost:11434",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LibreTranslate => write!(f, "libretranslate"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

/// Settings for the translate command, read from an optional JSON file and
/// then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub engine: EngineKind,
    /// Service base URL; the engine's default when unset
    pub endpoint: Option<String>,
    /// Model name, required by Ollama
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub source_language: String,
    pub target_language: String,
    /// Maximum characters per engine request
    pub max_chars: usize,
    /// Deadline for a single engine request
    pub timeout_secs: u64,
    /// Extra attempts after a transient engine failure
    pub max_retries: u32,
    /// First retry delay; doubles on every further attempt
    pub backoff_base_ms: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            endpoint: None,
            model: None,
            api_key: None,
            source_language: "fr".to_string(),
            target_language: "en".to_string(),
            max_chars: 500,
            timeout_secs: 120,
            max_retries: 0,
            backoff_base_ms: 500,
        }
    }
}

impl TranslateConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Build the effective configuration for a translate invocation.
    pub fn resolve(args: &TranslateArgs) -> Result<Self> {
        let base = match args.config {
            Some(ref path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, args: &TranslateArgs) -> Self {
        if let Some(engine) = args.engine {
            self.engine = engine;
        }
        if let Some(ref endpoint) = args.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(ref model) = args.model {
            self.model = Some(model.clone());
        }
        if let Some(ref source) = args.source_language {
            self.source_language = source.clone();
        }
        if let Some(ref target) = args.target_language {
            self.target_language = target.clone();
        }
        if let Some(max_chars) = args.max_chars {
            self.max_chars = max_chars;
        }
        if let Some(timeout) = args.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = args.max_retries {
            self.max_retries = retries;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            bail!("max_chars must be at least 1");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be at least 1");
        }
        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            bail!("source and target languages must not be empty");
        }
        if self.engine == EngineKind::Ollama && self.model.as_deref().unwrap_or("").is_empty() {
            bail!("the ollama engine requires a model (--model)");
        }
        Ok(())
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.engine.default_endpoint())
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn args() -> TranslateArgs {
        TranslateArgs {
            input: PathBuf::from("in.epub"),
            output: PathBuf::from("out.epub"),
            config: None,
            engine: None,
            endpoint: None,
            model: None,
            source_language: None,
            target_language: None,
            max_chars: None,
            timeout_secs: None,
            max_retries: None,
        }
    }

    #[test]
    fn test_defaults_follow_french_to_english() {
        let config = TranslateConfig::resolve(&args()).unwrap();
        assert_eq!(config.engine, EngineKind::LibreTranslate);
        assert_eq!(config.source_language, "fr");
        assert_eq!(config.target_language, "en");
        assert_eq!(config.max_chars, 500);
        assert_eq!(config.endpoint(), "http://localhost:5000");
    }

    #[test]
    fn test_file_values_are_overridden_by_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"engine": "ollama", "model": "llama3", "max_chars": 300, "endpoint": "http://gpu:11434/"}}"#
        )
        .unwrap();

        let mut args = args();
        args.config = Some(file.path().to_path_buf());
        args.max_chars = Some(200);
        args.target_language = Some("de".to_string());

        let config = TranslateConfig::resolve(&args).unwrap();
        assert_eq!(config.engine, EngineKind::Ollama);
        assert_eq!(config.model.as_deref(), Some("llama3"));
        assert_eq!(config.max_chars, 200);
        assert_eq!(config.target_language, "de");
        assert_eq!(config.source_language, "fr");
        assert_eq!(config.endpoint(), "http://gpu:11434");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut zero = args();
        zero.max_chars = Some(0);
        assert!(TranslateConfig::resolve(&zero).is_err());

        let mut ollama = args();
        ollama.engine = Some(EngineKind::Ollama);
        assert!(TranslateConfig::resolve(&ollama).is_err());
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(TranslateConfig::from_file(file.path()).is_err());
    }
}
