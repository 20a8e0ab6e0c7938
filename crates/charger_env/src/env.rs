//! Gym-style charging environment.
//!
//! One `ConverterEnv` is one charging episode at a time: a buck converter
//! feeding a battery, regulated by the cascaded charge controller, with an
//! external agent adding a residual current reference through `step`.

use control::{ChargeController, ControlInput, OperatingMode};
use electrical::{Battery, BuckConverter};
use serde::{Deserialize, Serialize};
use simcore::{ConfigError, EpisodeClock, Model};

use crate::config::EnvConfig;
use crate::observation::Observation;
use crate::reward::RewardComponents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// SOC reached the full threshold
    FullyCharged,
    /// Episode horizon elapsed
    Horizon,
}

impl TerminationReason {
    /// Same name the serde representation uses
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::FullyCharged => "fully_charged",
            TerminationReason::Horizon => "horizon",
        }
    }
}

/// Diagnostics of one step, for logging and plotting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub terminal_voltage: f64,
    pub soc: f64,
    pub temperature: f64,
    pub efficiency: f64,
    pub limited_mode: bool,
    pub ripple: f64,
    pub efficiency_penalty: f64,
    pub temperature_penalty: f64,
    pub soc_penalty: f64,
    pub duty: f64,
    pub iref_pid: f64,
    pub iref_total: f64,
    /// Action as supplied, before clamping
    pub action: f64,
    /// Simulated time after the step (s)
    pub time: f64,
    pub step: u64,
    pub termination_reason: Option<TerminationReason>,
}

/// Result of a single environment step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// `terminated || truncated`
    pub done: bool,
    /// Battery reached the full SOC threshold
    pub terminated: bool,
    /// Horizon elapsed
    pub truncated: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone)]
pub struct ConverterEnv {
    config: EnvConfig,
    clock: EpisodeClock,
    battery: Battery,
    converter: BuckConverter,
    controller: ChargeController,
    last_iref_pid: f64,
    last_iref_total: f64,
    last_action: f64,
    done: bool,
}

impl ConverterEnv {
    pub fn new(config: EnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = EpisodeClock::new(config.episode.dt, config.episode.duration_s)?;
        let battery = Battery::new(config.effective_battery())?;
        let converter = BuckConverter::new(config.converter)?;
        let controller =
            ChargeController::new(config.control, config.voltage_pid, config.current_pid)?;
        log::debug!(
            "charging environment: Vin={} V, target={} V, battery dt={:e}s, horizon={} steps",
            converter.input_voltage(),
            config.target_voltage(),
            battery.constants().dt,
            clock.horizon_steps()
        );

        let mut env = Self {
            config,
            clock,
            battery,
            converter,
            controller,
            last_iref_pid: 0.0,
            last_iref_total: 0.0,
            last_action: 0.0,
            done: false,
        };
        env.reset();
        Ok(env)
    }

    /// Starts a new episode and returns the initial observation.
    pub fn reset(&mut self) -> Observation {
        self.converter.reset();
        self.battery.reset();
        self.clock.reset();
        if self.config.reset_controllers_on_reset {
            self.controller.reset();
        }
        self.last_iref_pid = 0.0;
        self.last_iref_total = 0.0;
        self.last_action = 0.0;
        self.done = false;
        self.observation()
    }

    /// Advances the episode by one environment step under `action`.
    pub fn step(&mut self, action: f64) -> StepResult {
        let target_voltage = self.config.target_voltage();

        let decision = self.controller.decide(ControlInput {
            target_voltage,
            battery_voltage: self.battery.terminal_voltage(),
            input_voltage: self.converter.input_voltage(),
            inductor_current: self.converter.inductor_current(),
            action,
        });
        let limited = decision.mode == OperatingMode::Limited;
        if limited {
            log::debug!(
                "step {}: input {} V below target {} V + headroom, running at full duty",
                self.clock.steps(),
                self.converter.input_voltage(),
                target_voltage
            );
        }

        // The battery holds the output node
        self.converter.update(decision.duty, self.battery.terminal_voltage());

        self.last_iref_pid = decision.iref_pid;
        self.last_iref_total = decision.iref_total;
        self.last_action = action;

        let terminal_voltage = self.battery.update(self.converter.inductor_current());

        let reward_config = &self.config.reward;
        let components = RewardComponents::compute(
            reward_config,
            terminal_voltage,
            target_voltage,
            self.converter.efficiency(),
            self.battery.temperature(),
            self.battery.soc(),
        );
        let reward = components.reward(reward_config, limited);

        let ctx = self.clock.advance();
        let truncated = self.clock.expired();
        let terminated = self.battery.soc() >= self.config.episode.soc_full;
        let done = terminated || truncated;
        let termination_reason = if terminated {
            Some(TerminationReason::FullyCharged)
        } else if truncated {
            Some(TerminationReason::Horizon)
        } else {
            None
        };

        log::trace!(
            "t={:.4}s duty={:.4} il={:.3} A v={:.3} V soc={:.6} reward={:.4}",
            ctx.t,
            decision.duty,
            self.converter.inductor_current(),
            terminal_voltage,
            self.battery.soc(),
            reward
        );
        if done && !self.done {
            log::info!(
                "episode finished ({:?}) after {} steps, t={:.4}s, soc={:.6}, temperature={:.2}",
                termination_reason,
                self.clock.steps(),
                self.clock.time(),
                self.battery.soc(),
                self.battery.temperature()
            );
        }
        self.done = done;

        let info = StepInfo {
            terminal_voltage,
            soc: self.battery.soc(),
            temperature: self.battery.temperature(),
            efficiency: self.converter.efficiency(),
            limited_mode: limited,
            ripple: components.ripple,
            efficiency_penalty: components.efficiency_penalty,
            temperature_penalty: components.temperature_penalty,
            soc_penalty: components.soc_penalty,
            duty: decision.duty,
            iref_pid: decision.iref_pid,
            iref_total: decision.iref_total,
            action,
            time: self.clock.time(),
            step: self.clock.steps(),
            termination_reason,
        };

        StepResult {
            observation: self.observation(),
            reward,
            done,
            terminated,
            truncated,
            info,
        }
    }

    pub fn observation(&self) -> Observation {
        Observation::new(
            self.battery.terminal_voltage(),
            self.converter.inductor_current(),
            self.converter.input_voltage(),
            self.battery.temperature(),
            self.battery.soc(),
        )
    }

    /// Current reference from the voltage loop on the last step (A)
    pub fn last_iref_pid(&self) -> f64 {
        self.last_iref_pid
    }

    /// Current reference including the action offset on the last step (A)
    pub fn last_iref_total(&self) -> f64 {
        self.last_iref_total
    }

    /// Changes the converter's source voltage from the next step on.
    pub fn set_input_voltage(&mut self, input_voltage: f64) -> Result<(), ConfigError> {
        self.converter.set_input_voltage(input_voltage)
    }

    pub fn last_action(&self) -> f64 {
        self.last_action
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn steps(&self) -> u64 {
        self.clock.steps()
    }

    pub fn horizon_steps(&self) -> u64 {
        self.clock.horizon_steps()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn converter(&self) -> &BuckConverter {
        &self.converter
    }

    pub fn controller(&self) -> &ChargeController {
        &self.controller
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatteryTimebase, EpisodeConfig};
    use approx::assert_relative_eq;
    use electrical::ConverterConstant;

    fn env() -> ConverterEnv {
        ConverterEnv::new(EnvConfig::default()).unwrap()
    }

    fn limited_config() -> EnvConfig {
        EnvConfig {
            converter: ConverterConstant {
                input_voltage: 62.0,
                dt: 1e-4,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_reset_observation() {
        let mut env = env();
        let obs = env.reset();
        assert_eq!(obs, Observation::new(54.0, 0.0, 400.0, 25.0, 0.5));
        assert!(obs.within_bounds());
        assert_eq!(env.time(), 0.0);
    }

    #[test]
    fn test_first_step_matches_hand_computation() {
        let mut env = env();
        let r = env.step(0.0);

        // Voltage loop saturates at 20 A, duty = 0.009 * 20 + 26 * 20 * 1e-4
        assert_eq!(r.info.iref_pid, 20.0);
        assert_relative_eq!(r.info.duty, 0.232, epsilon = 1e-12);
        // IL = (400 * 0.232 - 54) / 1e-3 * 1e-4
        let il = (400.0 * 0.232 - 54.0) / 1e-3 * 1e-4;
        assert_relative_eq!(r.observation.inductor_current(), il, epsilon = 1e-9);
        assert_relative_eq!(r.info.efficiency, 54.0 / (400.0 * 0.232), epsilon = 1e-6);
        // Battery integrates with its own 1e-3 s step
        let soc = 0.5 + il * 1e-3 / (50.0 * 3600.0);
        assert_relative_eq!(r.info.soc, soc, epsilon = 1e-15);
        assert_relative_eq!(r.info.terminal_voltage, 48.0 + 12.0 * soc + il * 0.05, epsilon = 1e-9);
        assert!(!r.info.limited_mode);
        assert!(!r.done);
        assert_relative_eq!(env.time(), 1e-4);
        assert_eq!(env.last_iref_total(), 20.0);
    }

    #[test]
    fn test_reward_composition() {
        let mut env = env();
        let r = env.step(0.0);
        let i = r.info;
        let expected = -(5.0 * i.ripple
            + 2.0 * i.efficiency_penalty
            + i.temperature_penalty
            + 5.0 * i.soc_penalty);
        assert_relative_eq!(r.reward, expected, epsilon = 1e-12);
        assert_relative_eq!(i.ripple, (i.terminal_voltage - 60.0).abs() / 60.0, epsilon = 1e-12);
        assert_eq!(i.temperature_penalty, 0.0);
    }

    #[test]
    fn test_action_shifts_current_reference() {
        let mut env = env();
        env.step(0.5);
        assert_relative_eq!(env.last_iref_total() - env.last_iref_pid(), 10.0);
        assert_eq!(env.last_action(), 0.5);

        env.step(-3.0);
        assert_relative_eq!(env.last_iref_total() - env.last_iref_pid(), -20.0);
        assert_eq!(env.last_action(), -3.0);
    }

    #[test]
    fn test_limited_mode_forces_full_duty_and_resets_controllers() {
        let mut env = ConverterEnv::new(limited_config()).unwrap();
        for _ in 0..10 {
            let r = env.step(1.0);
            assert!(r.info.limited_mode);
            assert_eq!(r.info.duty, 1.0);
            assert_eq!(r.info.iref_pid, 0.0);
            assert_eq!(r.info.iref_total, 0.0);
            assert_eq!(env.controller().voltage_loop().integral(), 0.0);
            assert_eq!(env.controller().current_loop().integral(), 0.0);
        }
    }

    #[test]
    fn test_limited_mode_penalty() {
        let mut env = ConverterEnv::new(limited_config()).unwrap();
        let r = env.step(0.0);
        let i = r.info;
        let base = -(5.0 * i.ripple
            + 2.0 * i.efficiency_penalty
            + i.temperature_penalty
            + 5.0 * i.soc_penalty);
        assert_relative_eq!(r.reward, base - 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mode_never_persists_across_steps() {
        let mut env = env();
        for _ in 0..50 {
            assert!(!env.step(0.0).info.limited_mode);
        }

        env.set_input_voltage(62.0).unwrap();
        let r = env.step(0.0);
        assert!(r.info.limited_mode);
        assert_eq!(r.info.duty, 1.0);

        // Back above the threshold: normal regulation resumes on the very next
        // step, starting from cleared loops
        env.set_input_voltage(400.0).unwrap();
        let error = 60.0 - env.battery().terminal_voltage();
        let r = env.step(0.0);
        assert!(!r.info.limited_mode);
        assert!(r.info.duty < 1.0);
        let voltage_loop = env.controller().voltage_loop();
        assert_eq!(voltage_loop.previous_error(), error);
        assert_relative_eq!(voltage_loop.integral(), error * 220.0 * 1e-4, epsilon = 1e-12);
    }

    #[test]
    fn test_termination_reason_names_match_serde() {
        for reason in [TerminationReason::FullyCharged, TerminationReason::Horizon] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_reset_restores_configured_input_voltage() {
        let mut env = env();
        env.set_input_voltage(62.0).unwrap();
        assert!(env.step(0.0).info.limited_mode);

        let obs = env.reset();
        assert_eq!(obs.input_voltage(), env.config().converter.input_voltage);
        assert_eq!(obs.input_voltage(), 400.0);
        assert!(!env.step(0.0).info.limited_mode);
    }

    #[test]
    fn test_truncates_on_exact_horizon_step() {
        let mut env = env();
        assert_eq!(env.horizon_steps(), 100_000);
        let mut steps = 0u64;
        loop {
            let r = env.step(0.0);
            steps += 1;
            if r.done {
                assert!(r.truncated);
                assert!(!r.terminated);
                assert_eq!(r.info.termination_reason, Some(TerminationReason::Horizon));
                assert_eq!(r.info.step, 100_000);
                break;
            }
            assert!(steps < 100_000, "not done at step {steps}");
        }
        assert_eq!(steps, 100_000);
        assert!(env.is_done());
        assert_relative_eq!(env.time(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_terminates_when_fully_charged() {
        let config = EnvConfig {
            episode: EpisodeConfig {
                soc_full: 0.5000001,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut env = ConverterEnv::new(config).unwrap();
        let r = (0..100_000).map(|_| env.step(1.0)).find(|r| r.done).unwrap();
        assert!(r.terminated);
        assert_eq!(r.info.termination_reason, Some(TerminationReason::FullyCharged));
        assert!(r.info.step < 100_000);
    }

    #[test]
    fn test_battery_timebase_discrepancy() {
        // Same converter current, battery stepped at 1e-3 s vs 1e-4 s
        let mut independent = env();
        let mut shared = ConverterEnv::new(EnvConfig {
            battery_timebase: BatteryTimebase::Environment,
            ..Default::default()
        })
        .unwrap();

        let a = independent.step(0.0);
        let b = shared.step(0.0);
        let il = a.observation.inductor_current();
        assert_eq!(il, b.observation.inductor_current());

        let gain_independent = a.info.soc - 0.5;
        let gain_shared = b.info.soc - 0.5;
        assert_relative_eq!(gain_independent, il * 1e-3 / 180_000.0, max_relative = 1e-6);
        assert_relative_eq!(gain_shared, il * 1e-4 / 180_000.0, max_relative = 1e-6);
        assert_relative_eq!(gain_independent / gain_shared, 10.0, max_relative = 1e-6);
    }

    #[test]
    fn test_deterministic_given_actions() {
        let actions: Vec<f64> = (0..2000).map(|i| ((i as f64) * 0.37).sin()).collect();
        let run = || {
            let mut env = env();
            actions.iter().map(|a| env.step(*a)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reset_restores_initial_episode() {
        let mut env = env();
        let first: Vec<StepResult> = (0..500).map(|_| env.step(0.2)).collect();
        let obs_once = env.reset();
        let obs_twice = env.reset();
        assert_eq!(obs_once, obs_twice);
        assert_eq!(env.steps(), 0);
        assert!(!env.is_done());
        let second: Vec<StepResult> = (0..500).map(|_| env.step(0.2)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reset_can_keep_controller_state() {
        let mut env = ConverterEnv::new(EnvConfig {
            reset_controllers_on_reset: false,
            ..Default::default()
        })
        .unwrap();
        for _ in 0..100 {
            env.step(0.0);
        }
        let integral = env.controller().voltage_loop().integral();
        assert!(integral != 0.0);
        env.reset();
        assert_eq!(env.controller().voltage_loop().integral(), integral);
        assert_eq!(env.battery().soc(), 0.5);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = EnvConfig {
            episode: EpisodeConfig {
                dt: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(ConverterEnv::new(config).is_err());
    }
}
