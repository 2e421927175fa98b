use rand::Rng;
use rand_distr::{Beta, Distribution, Normal, Triangular};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    #[error("unknown distribution kind '{0}'")]
    UnknownKind(String),
    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),
}

/// Uncertain activity duration in working days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationDistribution {
    Triangular { min: f64, mode: f64, max: f64 },
    Normal { mean: f64, std_dev: f64 },
    Uniform { min: f64, max: f64 },
    Pert { min: f64, mode: f64, max: f64 },
}

impl DurationDistribution {
    pub fn constant(value: f64) -> Self {
        DurationDistribution::Uniform {
            min: value,
            max: value,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DurationDistribution::Triangular { .. } => "triangular",
            DurationDistribution::Normal { .. } => "normal",
            DurationDistribution::Uniform { .. } => "uniform",
            DurationDistribution::Pert { .. } => "pert",
        }
    }

    pub fn validate(&self) -> Result<(), DistributionError> {
        let invalid = |reason: String| Err(DistributionError::InvalidParameters(reason));
        match *self {
            DurationDistribution::Triangular { min, mode, max }
            | DurationDistribution::Pert { min, mode, max } => {
                if ![min, mode, max].iter().all(|v| v.is_finite()) {
                    return invalid(format!("{} parameters must be finite", self.kind()));
                }
                if min < 0.0 {
                    return invalid(format!("min must be non-negative, got {min}"));
                }
                if !(min <= mode && mode <= max) {
                    return invalid(format!(
                        "expected min <= mode <= max, got {min}, {mode}, {max}"
                    ));
                }
            }
            DurationDistribution::Uniform { min, max } => {
                if !(min.is_finite() && max.is_finite()) {
                    return invalid("uniform parameters must be finite".to_string());
                }
                if min < 0.0 {
                    return invalid(format!("min must be non-negative, got {min}"));
                }
                if min > max {
                    return invalid(format!("expected min <= max, got {min}, {max}"));
                }
            }
            DurationDistribution::Normal { mean, std_dev } => {
                if !(mean.is_finite() && std_dev.is_finite()) {
                    return invalid("normal parameters must be finite".to_string());
                }
                if mean < 0.0 {
                    return invalid(format!("mean must be non-negative, got {mean}"));
                }
                if std_dev < 0.0 {
                    return invalid(format!("std_dev must be non-negative, got {std_dev}"));
                }
            }
        }
        Ok(())
    }

    /// Expected value; PERT uses the same `lambda` as sampling.
    pub fn mean(&self, pert_lambda: f64) -> f64 {
        match *self {
            DurationDistribution::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            DurationDistribution::Normal { mean, .. } => mean,
            DurationDistribution::Uniform { min, max } => (min + max) / 2.0,
            DurationDistribution::Pert { min, mode, max } => {
                (min + pert_lambda * mode + max) / (pert_lambda + 2.0)
            }
        }
    }
}

/// Loosely typed distribution as it arrives from files or other tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
}

impl TryFrom<DistributionSpec> for DurationDistribution {
    type Error = DistributionError;

    fn try_from(spec: DistributionSpec) -> Result<Self, Self::Error> {
        let kind = spec.kind.trim().to_ascii_lowercase();
        let need = |value: Option<f64>, name: &str| {
            value.ok_or_else(|| {
                DistributionError::InvalidParameters(format!("{kind} distribution requires '{name}'"))
            })
        };
        let distribution = match kind.as_str() {
            "triangular" => DurationDistribution::Triangular {
                min: need(spec.min, "min")?,
                mode: need(spec.mode, "mode")?,
                max: need(spec.max, "max")?,
            },
            "pert" | "beta_pert" => DurationDistribution::Pert {
                min: need(spec.min, "min")?,
                mode: need(spec.mode, "mode")?,
                max: need(spec.max, "max")?,
            },
            "uniform" => DurationDistribution::Uniform {
                min: need(spec.min, "min")?,
                max: need(spec.max, "max")?,
            },
            "normal" => DurationDistribution::Normal {
                mean: need(spec.mean, "mean")?,
                std_dev: need(spec.std_dev, "std_dev")?,
            },
            _ => return Err(DistributionError::UnknownKind(spec.kind)),
        };
        distribution.validate()?;
        Ok(distribution)
    }
}

/// Ready-to-draw form of a validated distribution.
#[derive(Debug, Clone)]
pub(crate) enum Sampler {
    Constant(f64),
    Uniform { min: f64, span: f64 },
    Triangular(Triangular<f64>),
    Normal(Normal<f64>),
    Pert { min: f64, span: f64, beta: Beta<f64> },
}

const MIN_SHAPE: f64 = 1e-3;

fn parameter_error(err: impl std::fmt::Display) -> DistributionError {
    DistributionError::InvalidParameters(err.to_string())
}

impl Sampler {
    pub fn new(distribution: &DurationDistribution, pert_lambda: f64) -> Result<Self, DistributionError> {
        distribution.validate()?;
        let sampler = match *distribution {
            DurationDistribution::Uniform { min, max }
            | DurationDistribution::Triangular { min, max, .. }
            | DurationDistribution::Pert { min, max, .. }
                if min == max =>
            {
                Sampler::Constant(min)
            }
            DurationDistribution::Normal { mean, std_dev } if std_dev == 0.0 => Sampler::Constant(mean),
            DurationDistribution::Uniform { min, max } => Sampler::Uniform {
                min,
                span: max - min,
            },
            DurationDistribution::Triangular { min, mode, max } => {
                Sampler::Triangular(Triangular::new(min, max, mode).map_err(parameter_error)?)
            }
            DurationDistribution::Normal { mean, std_dev } => {
                Sampler::Normal(Normal::new(mean, std_dev).map_err(parameter_error)?)
            }
            DurationDistribution::Pert { min, mode, max } => {
                let span = max - min;
                let alpha = (1.0 + pert_lambda * (mode - min) / span).max(MIN_SHAPE);
                let beta = (1.0 + pert_lambda * (max - mode) / span).max(MIN_SHAPE);
                Sampler::Pert {
                    min,
                    span,
                    beta: Beta::new(alpha, beta).map_err(parameter_error)?,
                }
            }
        };
        Ok(sampler)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Sampler::Constant(value) => *value,
            Sampler::Uniform { min, span } => min + rng.random::<f64>() * span,
            Sampler::Triangular(dist) => dist.sample(rng),
            Sampler::Normal(dist) => dist.sample(rng),
            Sampler::Pert { min, span, beta } => min + beta.sample(rng) * span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn rejects_mode_outside_range() {
        let dist = DurationDistribution::Triangular {
            min: 2.0,
            mode: 9.0,
            max: 5.0,
        };
        assert!(matches!(
            dist.validate(),
            Err(DistributionError::InvalidParameters(_))
        ));
    }

    #[test]
    fn rejects_negative_lower_bound_and_nan() {
        assert!(DurationDistribution::Uniform { min: -1.0, max: 2.0 }.validate().is_err());
        assert!(
            DurationDistribution::Normal {
                mean: f64::NAN,
                std_dev: 1.0
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn loose_form_conversion_checks_kind_and_parameters() {
        let spec = DistributionSpec {
            kind: "PERT".to_string(),
            min: Some(1.0),
            mode: Some(2.0),
            max: Some(6.0),
            ..DistributionSpec::default()
        };
        assert_eq!(
            DurationDistribution::try_from(spec).unwrap(),
            DurationDistribution::Pert {
                min: 1.0,
                mode: 2.0,
                max: 6.0
            }
        );

        let unknown = DistributionSpec {
            kind: "lognormal".to_string(),
            ..DistributionSpec::default()
        };
        assert_eq!(
            DurationDistribution::try_from(unknown),
            Err(DistributionError::UnknownKind("lognormal".to_string()))
        );

        let missing = DistributionSpec {
            kind: "normal".to_string(),
            mean: Some(3.0),
            ..DistributionSpec::default()
        };
        assert!(matches!(
            DurationDistribution::try_from(missing),
            Err(DistributionError::InvalidParameters(_))
        ));
    }

    #[test]
    fn degenerate_ranges_sample_a_constant() {
        let mut rng = StdRng::seed_from_u64(7);
        for dist in [
            DurationDistribution::constant(4.0),
            DurationDistribution::Pert {
                min: 4.0,
                mode: 4.0,
                max: 4.0,
            },
            DurationDistribution::Normal {
                mean: 4.0,
                std_dev: 0.0,
            },
        ] {
            let sampler = Sampler::new(&dist, 4.0).unwrap();
            assert!((0..50).all(|_| sampler.sample(&mut rng) == 4.0));
        }
    }

    #[test]
    fn bounded_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for dist in [
            DurationDistribution::Triangular {
                min: 2.0,
                mode: 3.0,
                max: 8.0,
            },
            DurationDistribution::Pert {
                min: 2.0,
                mode: 3.0,
                max: 8.0,
            },
            DurationDistribution::Uniform { min: 2.0, max: 8.0 },
        ] {
            let sampler = Sampler::new(&dist, 4.0).unwrap();
            for _ in 0..500 {
                let value = sampler.sample(&mut rng);
                assert!((2.0..=8.0).contains(&value), "{} gave {value}", dist.kind());
            }
        }
    }
}
