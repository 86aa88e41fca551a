use common::Result;
use nalgebra::{DMatrix, DVector};

use crate::CellParams;

/// Provides the abstraction needed for custom implementations of the reservoir generation process.
/// Only called for weights that are not supplied through the `CellParams`.
pub trait ReservoirConstructor {
    /// Recurrent weights of shape (hidden_dim, hidden_dim)
    fn construct_reservoir_weights(&mut self, params: &CellParams) -> Result<DMatrix<f64>>;

    /// Biases of length hidden_dim
    fn construct_reservoir_biases(&mut self, params: &CellParams) -> DVector<f64>;

    /// Input weights of shape (hidden_dim, input_dim)
    fn construct_input_weight_matrix(&mut self, params: &CellParams) -> Result<DMatrix<f64>>;

    /// Feedback weights of shape (hidden_dim, feedback_dim)
    fn construct_feedback_weight_matrix(&mut self, params: &CellParams) -> DMatrix<f64>;
}
