//! Environment configuration
//!
//! Every tunable of the charging episode lives here. `EnvConfig::default()`
//! reproduces the nominal setup: 400 V input, 50 Ah / 48-60 V battery,
//! 10 s episodes at 1e-4 s steps.

use std::path::Path;

use control::{ChargeControlConfig, PidConfig};
use electrical::{BatteryConstant, ConverterConstant};
use serde::{Deserialize, Serialize};
use simcore::ConfigError;

use crate::reward::RewardConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Environment step (s)
    pub dt: f64,
    /// Truncation horizon (s)
    pub duration_s: f64,
    /// SOC at which the episode terminates as fully charged
    pub soc_full: f64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            dt: 1e-4,
            duration_s: 10.0,
            soc_full: 0.999,
        }
    }
}

/// Which step size the battery integrates with.
///
/// The battery keeps its own `dt` (1e-3 s by default) while the environment
/// and converter step at 1e-4 s, so in `Independent` mode each environment
/// step advances the battery's SOC and temperature by ten times the elapsed
/// environment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryTimebase {
    /// Battery integrates with `battery.dt`
    #[default]
    Independent,
    /// Battery `dt` is overridden by `episode.dt`
    Environment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub episode: EpisodeConfig,
    pub battery: BatteryConstant,
    pub converter: ConverterConstant,
    pub voltage_pid: PidConfig,
    pub current_pid: PidConfig,
    pub control: ChargeControlConfig,
    pub reward: RewardConfig,
    pub battery_timebase: BatteryTimebase,
    /// Also clear both PID loops when the episode is reset
    pub reset_controllers_on_reset: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        let episode = EpisodeConfig::default();
        Self {
            episode,
            battery: BatteryConstant::default(),
            converter: ConverterConstant {
                dt: episode.dt,
                ..Default::default()
            },
            voltage_pid: PidConfig::voltage_loop(),
            current_pid: PidConfig::current_loop(),
            control: ChargeControlConfig::default(),
            reward: RewardConfig::default(),
            battery_timebase: BatteryTimebase::default(),
            reset_controllers_on_reset: true,
        }
    }
}

impl EnvConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EnvConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading environment config from {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("episode.dt", self.episode.dt)?;
        ConfigError::require_positive("episode.duration_s", self.episode.duration_s)?;
        if !self.episode.soc_full.is_finite() {
            return Err(ConfigError::NonFinite { field: "episode.soc_full" });
        }
        self.effective_battery().validate()?;
        self.converter.validate()?;
        self.voltage_pid.validate()?;
        self.current_pid.validate()?;
        self.control.validate()?;
        self.reward.validate()?;

        if self.converter.dt != self.episode.dt {
            log::warn!(
                "converter dt ({:e}s) differs from episode dt ({:e}s)",
                self.converter.dt,
                self.episode.dt
            );
        }
        for (name, pid) in [("voltage", &self.voltage_pid), ("current", &self.current_pid)] {
            if pid.dt != self.episode.dt {
                log::warn!(
                    "{name} loop dt ({:e}s) differs from episode dt ({:e}s)",
                    pid.dt,
                    self.episode.dt
                );
            }
        }
        Ok(())
    }

    /// Battery constants after applying the timebase selection
    pub fn effective_battery(&self) -> BatteryConstant {
        match self.battery_timebase {
            BatteryTimebase::Independent => self.battery,
            BatteryTimebase::Environment => BatteryConstant {
                dt: self.episode.dt,
                ..self.battery
            },
        }
    }

    /// Regulation target: the battery's full open-circuit voltage
    pub fn target_voltage(&self) -> f64 {
        self.battery.v_max
    }
}
