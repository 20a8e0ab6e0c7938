//! Built-in stand-in policies for running episodes without an agent.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

#[derive(Debug, Clone, PartialEq)]
pub enum PolicySpec {
    /// Pure PID charging, no residual
    Zero,
    Constant(f64),
    /// Gaussian exploration noise around zero
    Random { seed: u64, sigma: f64 },
}

impl PolicySpec {
    /// Parses `zero`, `constant:<a>` or `random:<seed>[:<sigma>]`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut parts = text.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("zero"), None, None) => Ok(PolicySpec::Zero),
            (Some("constant"), Some(a), None) => a
                .parse()
                .map(PolicySpec::Constant)
                .map_err(|e| format!("bad constant action '{a}': {e}")),
            (Some("random"), Some(seed), sigma) => {
                let seed = seed.parse().map_err(|e| format!("bad seed '{seed}': {e}"))?;
                let sigma = match sigma {
                    Some(s) => s.parse().map_err(|e| format!("bad sigma '{s}': {e}"))?,
                    None => 0.3,
                };
                Ok(PolicySpec::Random { seed, sigma })
            }
            _ => Err(format!("unknown policy '{text}'")),
        }
    }

    pub fn build(&self) -> Result<Box<dyn Policy>, Box<dyn std::error::Error>> {
        Ok(match *self {
            PolicySpec::Zero => Box::new(ConstantPolicy(0.0)),
            PolicySpec::Constant(a) => Box::new(ConstantPolicy(a)),
            PolicySpec::Random { seed, sigma } => Box::new(NoisePolicy {
                rng: StdRng::seed_from_u64(seed),
                noise: Normal::new(0.0, sigma)?,
            }),
        })
    }
}

pub trait Policy {
    fn act(&mut self, observation: &[f64; 5]) -> f64;
}

struct ConstantPolicy(f64);

impl Policy for ConstantPolicy {
    fn act(&mut self, _observation: &[f64; 5]) -> f64 {
        self.0
    }
}

struct NoisePolicy {
    rng: StdRng,
    noise: Normal<f64>,
}

impl Policy for NoisePolicy {
    fn act(&mut self, _observation: &[f64; 5]) -> f64 {
        self.noise.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(PolicySpec::parse("zero"), Ok(PolicySpec::Zero));
        assert_eq!(PolicySpec::parse("constant:0.25"), Ok(PolicySpec::Constant(0.25)));
        assert_eq!(
            PolicySpec::parse("random:7"),
            Ok(PolicySpec::Random {
                seed: 7,
                sigma: 0.3,
            })
        );
        assert_eq!(
            PolicySpec::parse("random:7:0.1"),
            Ok(PolicySpec::Random {
                seed: 7,
                sigma: 0.1,
            })
        );
        assert!(PolicySpec::parse("constant:x").is_err());
        assert!(PolicySpec::parse("ppo").is_err());
    }

    #[test]
    fn test_random_policy_is_seeded() {
        let spec = PolicySpec::Random {
            seed: 42,
            sigma: 0.5,
        };
        let mut a = spec.build().unwrap();
        let mut b = spec.build().unwrap();
        let obs = [0.0; 5];
        for _ in 0..100 {
            assert_eq!(a.act(&obs), b.act(&obs));
        }
    }
}
