//! Runs one charging episode with a built-in policy and writes a CSV trace.
//!
//! ```text
//! buck-charger-app [--config FILE] [--policy zero|constant:<a>|random:<seed>[:<sigma>]]
//!                  [--csv FILE] [--max-steps N] [--sample-every N] [--verbose]
//! ```

mod policy;

use std::fs::File;
use std::io::{BufWriter, Write};

use charger_env::{ConverterEnv, EnvConfig, StepResult};
use clap::Parser;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::policy::PolicySpec;

/// Command-line arguments for the charging episode runner.
#[derive(Parser, Debug)]
#[command(name = "buck-charger-app")]
struct Cli {
    /// JSON file overriding any subset of the default configuration
    #[arg(long)]
    config: Option<String>,

    /// Residual action policy: zero, constant:<a> or random:<seed>[:<sigma>]
    #[arg(long, default_value = "zero", value_parser = PolicySpec::parse)]
    policy: PolicySpec,

    /// Write a sampled trace to this CSV file
    #[arg(long)]
    csv: Option<String>,

    /// Stop after this many steps even if the episode is not done
    #[arg(long)]
    max_steps: Option<u64>,

    /// CSV sampling period in steps
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    sample_every: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct EpisodeSummary {
    steps: u64,
    total_reward: f64,
    limited_steps: u64,
    peak_temperature: f64,
    peak_current: f64,
}

impl EpisodeSummary {
    fn record(&mut self, r: &StepResult) {
        self.steps += 1;
        self.total_reward += r.reward;
        if r.info.limited_mode {
            self.limited_steps += 1;
        }
        self.peak_temperature = self.peak_temperature.max(r.info.temperature);
        self.peak_current = self.peak_current.max(r.observation.inductor_current());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let config = match &args.config {
        Some(path) => EnvConfig::from_json_file(path)?,
        None => EnvConfig::default(),
    };
    let mut env = ConverterEnv::new(config)?;
    let mut policy = args.policy.build()?;
    log::info!("running {:?} policy, horizon {} steps", args.policy, env.horizon_steps());

    let mut csv = match &args.csv {
        Some(path) => {
            let mut w = BufWriter::new(File::create(path)?);
            writeln!(
                w,
                "t,v_bat,i_l,soc,temp,efficiency,duty,iref_pid,iref_total,action,reward,limited"
            )?;
            Some(w)
        }
        None => None,
    };

    let mut obs = env.reset();
    let mut summary = EpisodeSummary {
        peak_temperature: obs.temperature(),
        ..Default::default()
    };

    loop {
        let action = policy.act(obs.as_array());
        let r = env.step(action);
        summary.record(&r);
        obs = r.observation;

        if let Some(w) = csv.as_mut() {
            if r.info.step % args.sample_every == 0 || r.done {
                let i = &r.info;
                writeln!(
                    w,
                    "{:.6},{:.6},{:.6},{:.9},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{}",
                    i.time,
                    i.terminal_voltage,
                    r.observation.inductor_current(),
                    i.soc,
                    i.temperature,
                    i.efficiency,
                    i.duty,
                    i.iref_pid,
                    i.iref_total,
                    i.action,
                    r.reward,
                    i.limited_mode as u8
                )?;
            }
        }

        if r.done || args.max_steps.is_some_and(|max| summary.steps >= max) {
            break;
        }
    }

    if let Some(mut w) = csv {
        w.flush()?;
        if let Some(path) = &args.csv {
            log::info!("wrote {path}");
        }
    }

    log::info!(
        "steps={} t={:.4}s soc={:.6} v_bat={:.3} V peak_i={:.2} A peak_temp={:.2} C \
         limited_steps={} mean_reward={:.5}",
        summary.steps,
        env.time(),
        obs.soc(),
        obs.terminal_voltage(),
        summary.peak_current,
        summary.peak_temperature,
        summary.limited_steps,
        summary.total_reward / summary.steps.max(1) as f64
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("buck-charger-app").chain(list.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let a = args(&[]).unwrap();
        assert_eq!(a.policy, PolicySpec::Zero);
        assert!(a.config.is_none());
        assert_eq!(a.sample_every, 100);
        assert!(!a.verbose);
    }

    #[test]
    fn test_full_argument_set() {
        let a = args(&[
            "--config",
            "c.json",
            "--policy",
            "constant:0.5",
            "--csv",
            "out.csv",
            "--max-steps",
            "10",
            "--sample-every",
            "5",
            "-v",
        ])
        .unwrap();
        assert_eq!(a.config.as_deref(), Some("c.json"));
        assert_eq!(a.policy, PolicySpec::Constant(0.5));
        assert_eq!(a.csv.as_deref(), Some("out.csv"));
        assert_eq!(a.max_steps, Some(10));
        assert_eq!(a.sample_every, 5);
        assert!(a.verbose);
    }

    #[test]
    fn test_random_policy_argument() {
        let a = args(&["--policy", "random:7:0.1"]).unwrap();
        assert_eq!(
            a.policy,
            PolicySpec::Random {
                seed: 7,
                sigma: 0.1,
            }
        );
    }

    #[test]
    fn test_errors() {
        assert!(args(&["--max-steps"]).is_err());
        assert!(args(&["--max-steps", "many"]).is_err());
        assert!(args(&["--sample-every", "0"]).is_err());
        assert!(args(&["--policy", "ppo"]).is_err());
        assert!(args(&["--bogus"]).is_err());
    }

    #[test]
    fn test_summary_counts_limited_steps() {
        let json = r#"{ "converter": { "input_voltage": 62.0, "dt": 1e-4 } }"#;
        let config = EnvConfig::from_json_str(json).unwrap();
        let mut env = ConverterEnv::new(config).unwrap();
        let mut summary = EpisodeSummary::default();
        for _ in 0..20 {
            let r = env.step(0.0);
            summary.record(&r);
        }
        assert_eq!(summary.steps, 20);
        assert_eq!(summary.limited_steps, 20);
        assert!(summary.total_reward < -0.5 * 20.0);
    }
}
