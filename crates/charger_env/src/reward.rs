use serde::{Deserialize, Serialize};
use simcore::ConfigError;

/// Reward shaping weights and references
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub target_soc: f64,
    pub ripple_weight: f64,
    pub efficiency_weight: f64,
    pub temperature_weight: f64,
    pub soc_weight: f64,
    /// Temperature above which the thermal penalty starts (degC)
    pub temperature_reference: f64,
    /// Temperature span mapped onto a full penalty of 1 (degC)
    pub temperature_scale: f64,
    /// Subtracted on every step run in limited mode
    pub limited_mode_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            target_soc: 1.0,
            ripple_weight: 5.0,
            efficiency_weight: 2.0,
            temperature_weight: 1.0,
            soc_weight: 5.0,
            temperature_reference: 40.0,
            temperature_scale: 100.0,
            limited_mode_penalty: 0.5,
        }
    }
}

impl RewardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("reward.temperature_scale", self.temperature_scale)?;
        let weights = [
            self.target_soc,
            self.ripple_weight,
            self.efficiency_weight,
            self.temperature_weight,
            self.soc_weight,
            self.temperature_reference,
            self.limited_mode_penalty,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(ConfigError::NonFinite { field: "reward" });
        }
        Ok(())
    }
}

/// Individual penalty terms of one step, before weighting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    /// |V - V_target| / V_target
    pub ripple: f64,
    /// 1 - efficiency, efficiency clamped to [0, 1]
    pub efficiency_penalty: f64,
    /// (T - T_ref) / scale, clamped to [0, 1]
    pub temperature_penalty: f64,
    /// (SOC - SOC_target)^2
    pub soc_penalty: f64,
}

impl RewardComponents {
    pub fn compute(
        config: &RewardConfig,
        terminal_voltage: f64,
        target_voltage: f64,
        efficiency: f64,
        temperature: f64,
        soc: f64,
    ) -> Self {
        Self {
            ripple: (terminal_voltage - target_voltage).abs() / target_voltage,
            efficiency_penalty: 1.0 - efficiency.clamp(0.0, 1.0),
            temperature_penalty: ((temperature - config.temperature_reference)
                / config.temperature_scale)
                .clamp(0.0, 1.0),
            soc_penalty: (soc - config.target_soc).powi(2),
        }
    }

    /// Scalar reward: negative weighted penalty sum, less the limited-mode penalty
    pub fn reward(&self, config: &RewardConfig, limited: bool) -> f64 {
        let mut reward = -(config.ripple_weight * self.ripple
            + config.efficiency_weight * self.efficiency_penalty
            + config.temperature_weight * self.temperature_penalty
            + config.soc_weight * self.soc_penalty);
        if limited {
            reward -= config.limited_mode_penalty;
        }
        reward
    }
}
