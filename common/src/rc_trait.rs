use nalgebra::{Const, DMatrix, DVector, Dyn, MatrixView};

use crate::{Error, Result};

/// A sequence of observations.
/// There is one row per time step and one column per feature.
pub type Sequence<'a> = MatrixView<'a, f64, Dyn, Dyn, Const<1>, Dyn>;

/// A single recurrent reservoir layer.
/// Its weights are fixed once constructed, only the hidden state evolves.
pub trait ReservoirCell {
    /// Number of input features per time step
    fn input_dim(&self) -> usize;

    /// The number of inner nodes (`neurons`) in the reservoir
    fn hidden_dim(&self) -> usize;

    /// Advance the reservoir by a single time step
    ///
    /// # Arguments:
    /// input: Column vector of `input_dim` values
    /// feedback: The output observed at the previous time step, if any
    ///
    /// # Returns:
    /// The updated hidden state
    fn step(
        &mut self,
        input: &DVector<f64>,
        feedback: Option<&DVector<f64>>,
    ) -> Result<&DVector<f64>>;

    /// Drive the reservoir with a whole sequence and collect its states
    ///
    /// # Arguments:
    /// inputs: A Matrix where there are N rows corresponding to the time steps
    /// feedback: Row `t` holds the output fed back at time step `t`
    ///
    /// # Returns:
    /// One row of hidden state per time step
    fn forward(
        &mut self,
        inputs: &Sequence<'_>,
        feedback: Option<&Sequence<'_>>,
    ) -> Result<DMatrix<f64>> {
        if inputs.ncols() != self.input_dim() {
            return Err(Error::shape("reservoir input columns", self.input_dim(), inputs.ncols()));
        }
        if let Some(feedback) = feedback {
            if feedback.nrows() != inputs.nrows() {
                return Err(Error::shape("feedback rows", inputs.nrows(), feedback.nrows()));
            }
        }

        let mut states = DMatrix::zeros(inputs.nrows(), self.hidden_dim());
        for t in 0..inputs.nrows() {
            let input = inputs.row(t).transpose();
            let fdb = feedback.map(|f| f.row(t).transpose());
            let state = self.step(&input, fdb.as_ref())?;
            states.set_row(t, &state.transpose());
        }

        Ok(states)
    }

    /// Sets the hidden state back to zeros
    fn reset_hidden_state(&mut self);

    /// The current hidden state
    fn hidden_state(&self) -> &DVector<f64>;

    /// The recurrent weights, of shape (hidden_dim, hidden_dim)
    fn recurrence_matrix(&self) -> &DMatrix<f64>;

    /// The input weights, of shape (hidden_dim, input_dim)
    fn input_matrix(&self) -> &DMatrix<f64>;

    /// Largest absolute eigenvalue of the recurrence matrix
    fn spectral_radius(&self) -> f64;
}

/// A linear output layer trained in closed form.
/// Statistics are accumulated over any number of calls and solved at once.
pub trait Readout {
    /// Number of state features consumed, without the bias column
    fn input_dim(&self) -> usize;

    /// Number of outputs produced per time step
    fn output_dim(&self) -> usize;

    /// Incorporate states and their targets into the running statistics
    fn accumulate(&mut self, states: &Sequence<'_>, targets: &Sequence<'_>) -> Result<()>;

    /// Solve for the readout weights and clear the statistics
    fn finalize(&mut self) -> Result<&DMatrix<f64>>;

    /// Discard statistics and weights
    fn reset(&mut self);

    /// Map states to outputs using the finalized weights
    fn forward(&self, states: &Sequence<'_>) -> Result<DMatrix<f64>>;

    /// The finalized weights, of shape (output_dim, input_dim [+1 for the bias])
    fn weights(&self) -> Option<&DMatrix<f64>>;

    /// Whether weights have been solved for
    fn is_finalized(&self) -> bool {
        self.weights().is_some()
    }
}
