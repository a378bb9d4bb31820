//! Error types
//!
//! Configuration errors are fatal and only surface while building a world.
//! Simulation errors are recoverable: a rejected call leaves the world untouched.

use thiserror::Error;

use crate::sim::AgentId;

/// Invalid construction-time configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A parameter that must be strictly positive was zero or negative
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    /// A parameter was NaN or infinite
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },

    /// The arena cannot hold a single agent
    #[error("arena {width}x{height} is smaller than one agent diameter ({diameter})")]
    ArenaTooSmall {
        width: f64,
        height: f64,
        diameter: f64,
    },

    /// Grid cells narrower than one agent diameter would miss touching pairs
    #[error("cell_size {cell_size} is smaller than one agent diameter ({diameter})")]
    CellTooSmall { cell_size: f64, diameter: f64 },

    /// An agent attribute was negative or not finite
    #[error("agent attribute {field} is invalid (got {value})")]
    InvalidAttribute { field: &'static str, value: f64 },

    /// Parameter document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected runtime operation
#[derive(Error, Debug)]
pub enum SimError {
    /// Reference to an agent id this world never issued
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    /// A numeric input was NaN or infinite
    #[error("non-finite {what}")]
    NonFiniteInput { what: &'static str },

    /// Attributes supplied to `add_agent` failed validation
    #[error("invalid attributes: {0}")]
    InvalidAttributes(#[from] ConfigError),
}

impl ConfigError {
    /// Check that `value` is finite and strictly positive
    pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), Self> {
        if !value.is_finite() {
            return Err(Self::NonFinite { field });
        }
        if value <= 0.0 {
            return Err(Self::NonPositive { field, value });
        }
        Ok(())
    }

    /// Check that `value` is finite and not negative
    pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Self::InvalidAttribute { field, value });
        }
        Ok(())
    }
}
