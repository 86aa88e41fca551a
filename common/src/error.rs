use lin_reg::LinRegError;
use thiserror::Error;

/// Result type alias used throughout the reservoir computers
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building, driving or training a reservoir computer
#[derive(Debug, Error)]
pub enum Error {
    /// The parameters can not describe a valid network.
    /// Raised at construction time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Data passed in does not have the width or length the network was built for
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    Shape {
        /// What was being checked
        context: String,
        /// The size the network expects
        expected: usize,
        /// The size that was passed in
        got: usize,
    },

    /// The operation is not allowed in the current lifecycle phase
    #[error("invalid state: {0}")]
    State(String),

    /// Solving for the readout failed
    #[error("numerical failure: {0}")]
    Numerical(#[from] LinRegError),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Create a shape error
    pub fn shape(context: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::Shape { context: context.into(), expected, got }
    }

    /// Create a state error
    pub fn state(reason: impl Into<String>) -> Self {
        Self::State(reason.into())
    }
}
