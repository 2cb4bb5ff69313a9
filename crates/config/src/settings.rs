//! Application settings

use crate::constants::{self, decision, reply};
use crate::ConfigError;
use config::{Config, Environment, File};
use scamshield_core::EntityType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix (`SCAMSHIELD__DECISION__MAX_TURNS=12`)
pub const ENV_PREFIX: &str = "SCAMSHIELD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeEnvironment::Development => "development",
            RuntimeEnvironment::Staging => "staging",
            RuntimeEnvironment::Production => "production",
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub intelligence: IntelligenceSettings,

    #[serde(default)]
    pub decision: DecisionSettings,

    #[serde(default)]
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Entity extraction knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelligenceSettings {
    /// Candidates below this confidence are dropped
    pub min_confidence: f32,
    /// Keep candidates below `min_confidence`
    pub include_low_confidence: bool,
    /// Threshold for the high-confidence view
    pub high_confidence_threshold: f32,
    /// Characters either side of a match scanned for context keywords
    pub context_radius_chars: usize,
}

impl Default for IntelligenceSettings {
    fn default() -> Self {
        Self {
            min_confidence: constants::confidence::MIN_ACCEPTED,
            include_low_confidence: false,
            high_confidence_threshold: constants::confidence::HIGH,
            context_radius_chars: 50,
        }
    }
}

/// Intel score weight per entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityWeights {
    pub phone: f32,
    pub upi: f32,
    pub bank_account: f32,
    pub ifsc: f32,
    pub phishing_link: f32,
    pub email: f32,
}

impl Default for EntityWeights {
    fn default() -> Self {
        Self {
            phone: 0.20,
            upi: 0.25,
            bank_account: 0.25,
            ifsc: 0.10,
            phishing_link: 0.15,
            email: 0.05,
        }
    }
}

impl EntityWeights {
    /// Weight for a type; `other` is not scored
    pub fn weight(&self, entity_type: EntityType) -> Option<f32> {
        match entity_type {
            EntityType::Phone => Some(self.phone),
            EntityType::Upi => Some(self.upi),
            EntityType::BankAccount => Some(self.bank_account),
            EntityType::Ifsc => Some(self.ifsc),
            EntityType::PhishingLink => Some(self.phishing_link),
            EntityType::Email => Some(self.email),
            EntityType::Other => None,
        }
    }

    /// Scored types, heaviest first; equal weights keep declaration order
    pub fn ranked(&self) -> Vec<(EntityType, f32)> {
        let mut ranked: Vec<(EntityType, f32)> = EntityType::all()
            .iter()
            .filter_map(|t| self.weight(*t).map(|w| (*t, w)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (entity_type, weight) in self.ranked() {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::invalid(
                    &format!("decision.weights.{}", entity_type),
                    format!("must be within [0, 1], got {}", weight),
                ));
            }
        }
        Ok(())
    }
}

/// Continuation decision knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionSettings {
    pub max_turns: u32,
    pub target_score: f32,
    pub min_success_score: f32,
    pub stagnation_turns: u32,
    pub stagnation_score: f32,
    /// Case-insensitive substrings that end the engagement
    pub threat_keywords: Vec<String>,
    pub weights: EntityWeights,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self {
            max_turns: decision::DEFAULT_MAX_TURNS,
            target_score: decision::TARGET_SCORE,
            min_success_score: decision::MIN_SUCCESS_SCORE,
            stagnation_turns: decision::STAGNATION_TURNS,
            stagnation_score: decision::STAGNATION_SCORE,
            threat_keywords: constants::DEFAULT_THREAT_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            weights: EntityWeights::default(),
        }
    }
}

/// Orchestration and reply-generation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Timeout for the external reply generator
    pub reply_timeout_ms: u64,
    /// Most recent messages handed to the reply generator
    pub history_window: usize,
    /// Re-extract over the whole scammer history instead of the latest message
    pub extract_across_history: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            reply_timeout_ms: reply::DEFAULT_TIMEOUT_MS,
            history_window: reply::DEFAULT_HISTORY_WINDOW,
            extract_across_history: false,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("intelligence.min_confidence", self.intelligence.min_confidence)?;
        check_unit(
            "intelligence.high_confidence_threshold",
            self.intelligence.high_confidence_threshold,
        )?;

        let d = &self.decision;
        if d.max_turns == 0 || d.max_turns > decision::MAX_TURNS_CEILING {
            return Err(ConfigError::invalid(
                "decision.max_turns",
                format!("must be within 1..={}", decision::MAX_TURNS_CEILING),
            ));
        }
        check_unit("decision.target_score", d.target_score)?;
        check_unit("decision.min_success_score", d.min_success_score)?;
        check_unit("decision.stagnation_score", d.stagnation_score)?;
        if d.min_success_score > d.target_score {
            return Err(ConfigError::invalid(
                "decision.min_success_score",
                "must not exceed decision.target_score",
            ));
        }
        if d.threat_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "decision.threat_keywords",
                "must not contain empty entries",
            ));
        }
        d.weights.validate()?;

        if self.agent.reply_timeout_ms == 0 {
            return Err(ConfigError::invalid("agent.reply_timeout_ms", "must be positive"));
        }

        Ok(())
    }
}

fn check_unit(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1], got {}", value),
        ))
    }
}

/// Load settings from `./config` and the environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    build(Path::new("config"), env)
}

/// Load settings from an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::FileNotFound(dir.display().to_string()));
    }
    build(dir, env)
}

fn build(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::from(dir.join("default")).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.decision.max_turns, 10);
        assert_eq!(settings.decision.weights.upi, 0.25);
        assert!(settings
            .decision
            .threat_keywords
            .iter()
            .any(|k| k == "honeypot"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.decision.max_turns = 0;
        assert!(settings.validate().is_err());

        settings.decision.max_turns = 12;
        assert!(settings.validate().is_ok());

        settings.decision.min_success_score = 0.9;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_weight_validation() {
        let mut settings = Settings::default();
        settings.decision.weights.ifsc = 1.5;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("decision.weights.ifsc"));
    }

    #[test]
    fn test_ranked_weights() {
        let ranked = EntityWeights::default().ranked();
        let order: Vec<EntityType> = ranked.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            order,
            vec![
                EntityType::Upi,
                EntityType::BankAccount,
                EntityType::Phone,
                EntityType::PhishingLink,
                EntityType::Ifsc,
                EntityType::Email,
            ]
        );
    }

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.yaml"),
            "decision:\n  max_turns: 14\n  threat_keywords: [\"police\", \"honeypot\"]\nlogging:\n  json: true\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.yaml"),
            "environment: staging\nagent:\n  reply_timeout_ms: 2500\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.decision.max_turns, 14);
        assert_eq!(settings.decision.threat_keywords.len(), 2);
        assert!(settings.logging.json);
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);
        assert_eq!(settings.agent.reply_timeout_ms, 2500);
        // untouched sections keep their defaults
        assert_eq!(settings.decision.target_score, 0.6);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.yaml"), "decision:\n  max_turns: 500\n").unwrap();
        assert!(matches!(
            load_settings_from(dir.path(), None),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_dir() {
        let missing = Path::new("/nonexistent/scamshield-config");
        assert!(matches!(
            load_settings_from(missing, None),
            Err(ConfigError::FileNotFound(_))
        ));
    }
}
