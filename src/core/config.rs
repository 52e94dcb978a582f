//! Process-wide defaults, passed explicitly to filters.
//!
//! Nothing in the crate reads global state: a [`CodConfig`] is handed to the
//! constructors that need defaults (boundary policy, Gaussian truncation,
//! eigen-solver tolerance). Configs can be built in code or loaded from TOML.
//!
//! ```toml
//! [boundary]
//! policy = "zero_flux"
//!
//! [convolution]
//! safe_path = true
//!
//! [gaussian]
//! truncate = 3.0
//!
//! [eigen]
//! epsilon = 1e-12
//! ```

use crate::boundary::BoundaryPolicy;
use crate::core::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Gaussian truncation, in standard deviations.
pub const DEFAULT_GAUSSIAN_TRUNCATE: f64 = 3.0;

/// Default relative tolerance of the eigen-solver.
pub const DEFAULT_EIGEN_EPSILON: f64 = 1e-12;

/// Boundary defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryDefaults {
    /// Policy used when a filter is not given an explicit handler. A
    /// fixed-value policy carries its own fill value.
    pub policy: BoundaryPolicy,
}

impl Default for BoundaryDefaults {
    fn default() -> Self {
        Self {
            policy: BoundaryPolicy::ZeroFlux,
        }
    }
}

/// Convolution engine options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvolutionDefaults {
    /// Use the bounds-check-free traversal on the safe sub-region.
    pub safe_path: bool,
}

impl Default for ConvolutionDefaults {
    fn default() -> Self {
        Self { safe_path: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianDefaults {
    /// Kernel radius is `ceil(truncate * sigma)`.
    pub truncate: f64,
}

impl Default for GaussianDefaults {
    fn default() -> Self {
        Self {
            truncate: DEFAULT_GAUSSIAN_TRUNCATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenDefaults {
    /// Relative tolerance for repeated roots and zero eigenvectors.
    pub epsilon: f64,
}

impl Default for EigenDefaults {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EIGEN_EPSILON,
        }
    }
}

/// Configuration shared by filters and point filters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodConfig {
    pub boundary: BoundaryDefaults,
    pub convolution: ConvolutionDefaults,
    pub gaussian: GaussianDefaults,
    pub eigen: EigenDefaults,
}

impl CodConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default boundary policy.
    pub fn with_boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary.policy = policy;
        self
    }

    /// Use a fixed-value boundary with `value` outside the domain.
    pub fn with_fill_value(mut self, value: f64) -> Self {
        self.boundary.policy = BoundaryPolicy::FixedValue(value);
        self
    }

    /// Enable or disable the safe-region fast path.
    pub fn with_safe_path(mut self, enabled: bool) -> Self {
        self.convolution.safe_path = enabled;
        self
    }

    /// Set the Gaussian truncation factor.
    pub fn with_gaussian_truncate(mut self, truncate: f64) -> Self {
        self.gaussian.truncate = truncate;
        self
    }

    /// Set the eigen-solver tolerance.
    pub fn with_eigen_epsilon(mut self, epsilon: f64) -> Self {
        self.eigen.epsilon = epsilon;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: CodConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        let config: CodConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if let BoundaryPolicy::FixedValue(v) = self.boundary.policy {
            if !v.is_finite() {
                return Err(ConfigError::Invalid("boundary.policy value must be finite".to_string()));
            }
        }
        if !(self.gaussian.truncate > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gaussian.truncate must be positive, got {}",
                self.gaussian.truncate
            )));
        }
        if !(self.eigen.epsilon > 0.0 && self.eigen.epsilon < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "eigen.epsilon must be in (0, 1), got {}",
                self.eigen.epsilon
            )));
        }
        Ok(())
    }
}
