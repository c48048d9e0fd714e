//! Domain configuration records served by dedicated endpoints.
//!
//! Each record carries a hard-coded conservative default that the client
//! hands back when the backend is unreachable, so feature code never needs a
//! failure branch for these.

use serde::{Deserialize, Serialize};

/// Configuration for the tutoring chat surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatConfig {
    /// Whether responses stream token-by-token.
    pub streaming_enabled: bool,
    /// Model providers in preference order.
    pub provider_order: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            streaming_enabled: false,
            provider_order: vec!["openai".to_owned(), "anthropic".to_owned()],
        }
    }
}

/// Configuration for learning games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct GamesConfig {
    /// Whether games are available at all.
    pub enabled: bool,
    /// Game categories offered to the current context.
    pub allowed_categories: Vec<String>,
}

/// Configuration for speech-language screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlpConfig {
    /// Whether the articulation screener is offered.
    pub screener_enabled: bool,
    /// Upper bound on a single recording.
    pub max_recording_seconds: u32,
}

impl Default for SlpConfig {
    fn default() -> Self {
        SlpConfig {
            screener_enabled: false,
            max_recording_seconds: 30,
        }
    }
}

/// Configuration for social-emotional learning screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelConfig {
    /// Whether the SEL screener is offered.
    pub screener_enabled: bool,
    /// Survey revision to administer.
    pub survey_version: String,
}

impl Default for SelConfig {
    fn default() -> Self {
        SelConfig {
            screener_enabled: false,
            survey_version: "v1".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatConfig, GamesConfig, SelConfig, SlpConfig};

    #[test]
    fn chat_default_is_conservative() {
        let config = ChatConfig::default();
        assert!(!config.streaming_enabled);
        assert_eq!(config.provider_order, vec!["openai", "anthropic"]);
    }

    #[test]
    fn games_default_disabled() {
        let config = GamesConfig::default();
        assert!(!config.enabled);
        assert!(config.allowed_categories.is_empty());
    }

    #[test]
    fn screeners_default_disabled() {
        assert!(!SlpConfig::default().screener_enabled);
        assert!(!SelConfig::default().screener_enabled);
    }

    #[test]
    fn partial_payload_falls_back_to_field_defaults() {
        let config: ChatConfig = serde_json::from_str(r#"{"streamingEnabled": true}"#).unwrap();
        assert!(config.streaming_enabled);
        assert_eq!(config.provider_order, ChatConfig::default().provider_order);
    }
}
