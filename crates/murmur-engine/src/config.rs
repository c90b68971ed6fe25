//! Simulation-wide settings.

use murmur_behavior::WriteOrderPolicy;
use murmur_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings fixed for the lifetime of a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Root seed for stochastic behaviors. Default: 0.
    pub seed: u64,
    /// Timestep handed to every behavior. Must be finite and positive.
    /// Default: 1.0.
    pub dt: f32,
    /// How pipelines that replace after accumulating are treated.
    /// Default: [`WriteOrderPolicy::Strict`].
    pub write_order: WriteOrderPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dt: 1.0,
            write_order: WriteOrderPolicy::Strict,
        }
    }
}

impl SimulationConfig {
    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidConfig`] if `dt` is not finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                reason: format!("dt must be finite and positive, got {}", self.dt),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.dt, 1.0);
        assert_eq!(config.write_order, WriteOrderPolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_or_nan_dt_rejected() {
        for dt in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let config = SimulationConfig {
                dt,
                ..SimulationConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "seed": 7, "write_order": "warn" }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.dt, 1.0);
        assert_eq!(config.write_order, WriteOrderPolicy::Warn);
    }
}
