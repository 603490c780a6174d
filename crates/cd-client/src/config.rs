//! Configuration for an oracle session.

use serde::{Deserialize, Serialize};

use cd_core::Identity;
use cd_engine::OracleRules;

use crate::error::{OracleError, OracleResult};

/// Largest batch the oracle accepts in one upload.
pub const MAX_BATCH_SIZE: usize = 10;

/// Configuration for an [`OracleSession`](crate::session::OracleSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Program the oracle's addresses are derived under.
    pub program_id: Identity,
    /// Cards per upload request.
    pub batch_size: usize,
    /// Extra divination attempts after a fortune address collision.
    pub max_collision_retries: u32,
    /// Rules used for client-side checks and stats. Should match the oracle.
    pub rules: OracleRules,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: Identity::new([0; 32]),
            batch_size: MAX_BATCH_SIZE,
            max_collision_retries: 3,
            rules: OracleRules::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> OracleResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| OracleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the program ID.
    pub fn with_program_id(mut self, program_id: Identity) -> Self {
        self.program_id = program_id;
        self
    }

    /// Set the upload batch size (clamped to 1-10).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Set how many times a colliding divination is retried.
    pub fn with_collision_retries(mut self, retries: u32) -> Self {
        self.max_collision_retries = retries;
        self
    }

    /// Set the rules used for client-side checks.
    pub fn with_rules(mut self, rules: OracleRules) -> Self {
        self.rules = rules;
        self
    }

    /// Check values the builder would have clamped, and the rules.
    pub fn validate(&self) -> OracleResult<()> {
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(OracleError::Config(format!(
                "batch_size {} outside 1-{MAX_BATCH_SIZE}",
                self.batch_size
            )));
        }
        self.rules.validate().map_err(OracleError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.max_collision_retries, 3);
        assert_eq!(cfg.program_id.to_string(), "11111111111111111111111111111111");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let program = Identity::new([7; 32]);
        let cfg = ClientConfig::default()
            .with_program_id(program)
            .with_batch_size(4)
            .with_collision_retries(0);
        assert_eq!(cfg.program_id, program);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.max_collision_retries, 0);
    }

    #[test]
    fn batch_size_clamped() {
        assert_eq!(ClientConfig::default().with_batch_size(0).batch_size, 1);
        assert_eq!(ClientConfig::default().with_batch_size(50).batch_size, 10);
    }

    #[test]
    fn from_json_fills_defaults() {
        let cfg = ClientConfig::from_json(r#"{"batch_size": 5}"#).unwrap();
        assert_eq!(cfg.batch_size, 5);
        assert_eq!(cfg.max_collision_retries, 3);
        assert_eq!(cfg.rules, OracleRules::default());
    }

    #[test]
    fn from_json_rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_json(r#"{"batch_size": 0}"#),
            Err(OracleError::Config(_))
        ));
        assert!(ClientConfig::from_json(r#"{"program_id": "not-base58!"}"#).is_err());
    }

    #[test]
    fn from_json_rejects_unbounded_periods() {
        for json in [
            r#"{"rules":{"cooldown":{"policy":"fixed","period_secs":9223372036854775807}}}"#,
            r#"{"rules":{"cooldown":{"policy":"escalating","steps_secs":[0,-60]}}}"#,
            r#"{"rules":{"daily_window_secs":10000000000000}}"#,
            r#"{"rules":{"min_fee":20,"max_fee":10}}"#,
        ] {
            assert!(
                matches!(ClientConfig::from_json(json), Err(OracleError::Config(_))),
                "{json} accepted"
            );
        }
    }

    #[test]
    fn validate_checks_rules_built_in_code() {
        let rules = OracleRules {
            daily_window_secs: -1,
            ..OracleRules::default()
        };
        let cfg = ClientConfig::default().with_rules(rules);
        assert!(matches!(cfg.validate(), Err(OracleError::Config(_))));
    }
}
