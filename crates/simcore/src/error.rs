use thiserror::Error;

/// Rejected configuration. Raised only at construction; stepping a validly
/// constructed model never fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    #[error("{field} bounds are inverted: min {min} > max {max}")]
    InvertedBounds {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Checks that `value` is finite and strictly positive.
    pub fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NonFinite { field });
        }
        if value <= 0.0 {
            return Err(ConfigError::NonPositive { field, value });
        }
        Ok(())
    }

    /// Checks that `min <= max`, both finite.
    pub fn require_ordered(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
        if min.is_nan() || max.is_nan() {
            return Err(ConfigError::NonFinite { field });
        }
        if min > max {
            return Err(ConfigError::InvertedBounds { field, min, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive() {
        assert!(ConfigError::require_positive("dt", 1e-4).is_ok());
        assert!(matches!(
            ConfigError::require_positive("dt", 0.0),
            Err(ConfigError::NonPositive { field: "dt", .. })
        ));
        assert!(matches!(
            ConfigError::require_positive("dt", -1.0),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            ConfigError::require_positive("dt", f64::NAN),
            Err(ConfigError::NonFinite { field: "dt" })
        ));
    }

    #[test]
    fn test_require_ordered() {
        assert!(ConfigError::require_ordered("voltage", 48.0, 60.0).is_ok());
        assert!(ConfigError::require_ordered("voltage", 60.0, 60.0).is_ok());
        let err = ConfigError::require_ordered("voltage", 60.0, 48.0).unwrap_err();
        assert_eq!(err.to_string(), "voltage bounds are inverted: min 60 > max 48");
    }
}
