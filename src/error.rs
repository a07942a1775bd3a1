//! Errors in the library.
use thiserror::Error;

/// Errors raised by the agent.
///
/// None of these are transient; they indicate a caller or configuration
/// defect and propagate unchanged.
#[derive(Error, Debug)]
pub enum AtocError {
    /// An input tensor disagrees with the configured dimensions.
    #[error("shape mismatch of {name}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Name of the offending tensor.
        name: &'static str,
        /// Expected shape, `-1` standing for any batch dimension.
        expected: Vec<i64>,
        /// Shape actually received.
        got: Vec<i64>,
    },

    /// A transition batch violates the batching contract.
    #[error("malformed transition batch: {0}")]
    MalformedBatch(String),

    /// The configured action space resolves to zero output dimensions.
    #[error("action space resolves to no action dimensions")]
    EmptyActionSpace,
}
