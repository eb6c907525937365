use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::transcript::fetcher::Strategy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API settings
    pub youtube: YoutubeConfig,

    /// Transcript retrieval settings
    pub transcripts: TranscriptConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Data API key, overridden by --api-key / YOUTUBE_API_KEY
    pub api_key: Option<String>,

    /// Data API base URL
    pub api_base_url: String,

    /// Videos requested per playlist page (the API caps this at 50)
    pub page_size: u32,

    /// Timeout for every HTTP request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language codes accepted as English, in order of preference
    pub languages: Vec<String>,

    /// Language requested when translating a foreign track
    pub translate_to: String,

    /// Fallback order
    pub strategies: Vec<Strategy>,

    /// Pause between consecutive videos
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default report format
    pub default_output_format: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            page_size: 50,
            request_timeout_secs: 30,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            translate_to: "en".to_string(),
            strategies: Strategy::DEFAULT_ORDER.to_vec(),
            request_delay_ms: 1000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_output_format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            Self::from_yaml(&content)
        } else {
            let config = Self::default();
            if let Err(e) = config.save().await {
                tracing::warn!("Could not write default config to {}: {}", config_path.display(), e);
            }
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("tubescribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.transcripts.languages.is_empty() {
            anyhow::bail!("transcripts.languages must list at least one language code");
        }

        if self.transcripts.translate_to.trim().is_empty() {
            anyhow::bail!("transcripts.translate_to must not be empty");
        }

        if self.transcripts.strategies.is_empty() {
            anyhow::bail!("transcripts.strategies must list at least one strategy");
        }

        for (i, strategy) in self.transcripts.strategies.iter().enumerate() {
            if self.transcripts.strategies[..i].contains(strategy) {
                anyhow::bail!("transcripts.strategies lists '{}' more than once", strategy);
            }
        }

        if !(1..=50).contains(&self.youtube.page_size) {
            anyhow::bail!("youtube.page_size must be between 1 and 50");
        }

        self.default_output_format()?;

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  API Key: {}",
            if self.youtube.api_key.is_some() { "set" } else { "not set" }
        );
        println!("  API Base URL: {}", self.youtube.api_base_url);
        println!("  Page Size: {}", self.youtube.page_size);
        println!("  Languages: {}", self.transcripts.languages.join(", "));
        println!("  Translate To: {}", self.transcripts.translate_to);
        println!(
            "  Strategies: {}",
            self.transcripts
                .strategies
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        println!("  Request Delay: {}ms", self.transcripts.request_delay_ms);
        println!("  Default Format: {}", self.app.default_output_format);
    }

    pub fn default_output_format(&self) -> Result<OutputFormat> {
        self.app.default_output_format.parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.youtube.request_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.transcripts.request_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transcripts.strategies, Strategy::DEFAULT_ORDER.to_vec());
        assert_eq!(config.request_delay(), Duration::from_secs(1));
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config = Config::from_yaml(
            "transcripts:\n  strategies: [generated, manual]\n  request_delay_ms: 250\n",
        )
        .unwrap();

        assert_eq!(
            config.transcripts.strategies,
            vec![Strategy::Generated, Strategy::Manual]
        );
        assert_eq!(config.transcripts.request_delay_ms, 250);
        assert_eq!(config.transcripts.translate_to, "en");
        assert_eq!(config.youtube.page_size, 50);
    }

    #[test]
    fn rejects_duplicate_strategies() {
        let err = Config::from_yaml("transcripts:\n  strategies: [manual, manual]\n").unwrap_err();
        assert!(format!("{:#}", err).contains("more than once"));
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        assert!(Config::from_yaml("youtube:\n  page_size: 500\n").is_err());
    }

    #[test]
    fn rejects_unknown_output_format() {
        assert!(Config::from_yaml("app:\n  default_output_format: srt\n").is_err());
    }
}
