use common::{Error, Readout, ReservoirCell, Result, Sequence};
use lin_reg::TikhonovRegularization;
use nalgebra::{DMatrix, DVector};

use crate::{EsnCell, LayerStack, RidgeReadout, StackParams};

/// The lifecycle phase of a stacked network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Forward calls accumulate statistics for the readout
    #[default]
    Training,
    /// The readout is finalized and forward calls predict
    Inference,
}

/// Stacked Echo State Network.
/// Reservoirs are chained, their states concatenated and mapped to the outputs by a single readout
#[derive(Debug, Clone)]
pub struct StackedEsn<C, R> {
    stack: LayerStack<C>,
    readout: R,
    feedbacks: bool,
    phase: Phase,
    /// The output fed back at the first time step of the next call
    prev_output: Option<DVector<f64>>,
}

impl StackedEsn<EsnCell, RidgeReadout<TikhonovRegularization>> {
    /// Create a new stack of reservoirs with random initialization and an untrained ridge readout
    pub fn new(params: &StackParams) -> Result<Self> {
        let stack = LayerStack::new(params)?;
        let readout = RidgeReadout::ridge(
            stack.total_feature_width(),
            params.output_dim,
            params.ridge_param,
            params.with_bias,
            params.solve_method,
        );

        Ok(Self::from_parts(stack, readout, params.feedbacks))
    }
}

impl<C, R> StackedEsn<C, R>
where
    C: ReservoirCell,
    R: Readout,
{
    /// Assemble a network from an existing stack and readout.
    /// The readout has to be sized for the stacks `total_feature_width`,
    /// a mismatch surfaces on the first forward call.
    pub fn from_parts(stack: LayerStack<C>, readout: R, feedbacks: bool) -> Self {
        Self { stack, readout, feedbacks, phase: Phase::Training, prev_output: None }
    }

    /// Drive the network with a sequence.
    ///
    /// While training, `targets` are required. They are accumulated into the readout,
    /// and fed back into the reservoirs when feedback is enabled.
    /// The concatenated states are returned.
    ///
    /// Once finalized, `targets` are ignored and the predictions are returned.
    /// With feedback, every prediction is fed back into the reservoirs at the next time step.
    ///
    /// # Arguments
    /// inputs: One row per time step, `input_dim` columns
    /// targets: One row per time step, `output_dim` columns
    pub fn forward(
        &mut self,
        inputs: &Sequence<'_>,
        targets: Option<&Sequence<'_>>,
    ) -> Result<DMatrix<f64>> {
        if inputs.ncols() != self.stack.input_dim() {
            return Err(Error::shape("input columns", self.stack.input_dim(), inputs.ncols()));
        }
        match (self.phase, self.feedbacks) {
            (Phase::Training, _) => {
                let targets = targets.ok_or_else(|| {
                    if self.feedbacks {
                        Error::state("training with feedback requires targets for teacher forcing")
                    } else {
                        Error::state("training requires targets")
                    }
                })?;
                self.accumulate(inputs, targets)
            }
            (Phase::Inference, true) => self.predict_with_feedback(inputs),
            (Phase::Inference, false) => {
                let states = self.stack.forward(inputs, None)?;
                self.check_feature_width(states.ncols())?;
                self.readout.forward(&states.rows(0, states.nrows()))
            }
        }
    }

    /// Drive the reservoirs and accumulate their states with the targets into the readout.
    /// With feedback, the last target of a call is fed back at the first step of the next one.
    ///
    /// # Returns
    /// The concatenated states of all layers
    pub fn accumulate(
        &mut self,
        inputs: &Sequence<'_>,
        targets: &Sequence<'_>,
    ) -> Result<DMatrix<f64>> {
        if self.phase == Phase::Inference {
            return Err(Error::state("network is finalized, reset it before training again"));
        }
        if inputs.ncols() != self.stack.input_dim() {
            return Err(Error::shape("input columns", self.stack.input_dim(), inputs.ncols()));
        }
        if targets.nrows() != inputs.nrows() {
            return Err(Error::shape("target rows", inputs.nrows(), targets.nrows()));
        }
        if targets.ncols() != self.readout.output_dim() {
            return Err(Error::shape("target columns", self.readout.output_dim(), targets.ncols()));
        }

        let states = if self.feedbacks {
            let forced = shifted(targets, self.prev_output.as_ref());
            let states = self.stack.forward(inputs, Some(&forced.rows(0, forced.nrows())))?;
            if targets.nrows() > 0 {
                self.prev_output = Some(targets.row(targets.nrows() - 1).transpose());
            }
            states
        } else {
            self.stack.forward(inputs, None)?
        };
        self.check_feature_width(states.ncols())?;
        self.readout.accumulate(&states.rows(0, states.nrows()), targets)?;
        debug!("accumulated {} time steps", inputs.nrows());

        Ok(states)
    }

    /// Predict one time step after the other, feeding each prediction back.
    /// The first fed back output is read out from the current reservoir states.
    fn predict_with_feedback(&mut self, inputs: &Sequence<'_>) -> Result<DMatrix<f64>> {
        if !self.readout.is_finalized() {
            return Err(Error::state("feedback requires finalized readout weights"));
        }
        let mut outputs = DMatrix::zeros(inputs.nrows(), self.readout.output_dim());
        let mut prev = self.read_out(&self.stack.hidden_states())?;
        for t in 0..inputs.nrows() {
            let features = self.stack.step(&inputs.row(t).transpose(), Some(&prev))?;
            prev = self.read_out(&features)?;
            outputs.set_row(t, &prev.transpose());
        }
        self.prev_output = Some(prev);

        Ok(outputs)
    }

    /// Readout of a single concatenated state
    fn read_out(&self, features: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_feature_width(features.len())?;
        let features = DMatrix::from_column_slice(1, features.len(), features.as_slice());
        let pred = self.readout.forward(&features.rows(0, 1))?;

        Ok(pred.row(0).transpose())
    }

    fn check_feature_width(&self, got: usize) -> Result<()> {
        if got != self.readout.input_dim() {
            return Err(Error::shape("readout input columns", self.readout.input_dim(), got));
        }
        Ok(())
    }

    /// Solve for the readout weights and switch to inference.
    /// On failure the phase and any previous weights are kept.
    pub fn finalize(&mut self) -> Result<()> {
        let weights = self.readout.finalize()?;
        info!("finalized, readout weights dims: ({}, {})", weights.nrows(), weights.ncols());
        self.phase = Phase::Inference;

        Ok(())
    }

    /// Discard the readout weights and statistics and go back to training.
    /// Reservoir weights and states are left untouched.
    pub fn reset(&mut self) {
        self.readout.reset();
        self.phase = Phase::Training;
        info!("readout reset, training again");
    }

    /// Zero the states of all reservoirs and forget the last fed back output
    pub fn reset_hidden(&mut self) {
        self.stack.reset_hidden();
        self.prev_output = None;
    }

    /// The current lifecycle phase
    #[inline(always)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline(always)]
    pub fn is_training(&self) -> bool {
        self.phase == Phase::Training
    }

    /// Whether outputs are fed back into the reservoirs
    #[inline(always)]
    pub fn feedbacks(&self) -> bool {
        self.feedbacks
    }

    /// Number of reservoir layers
    #[inline(always)]
    pub fn n_layers(&self) -> usize {
        self.stack.len()
    }

    /// The reservoir layers and their wiring
    #[inline(always)]
    pub fn stack(&self) -> &LayerStack<C> {
        &self.stack
    }

    #[inline(always)]
    pub fn layers(&self) -> &[C] {
        self.stack.layers()
    }

    /// The trainable output layer
    #[inline(always)]
    pub fn readout(&self) -> &R {
        &self.readout
    }

    /// Number of state features the readout is sized for
    #[inline(always)]
    pub fn total_feature_width(&self) -> usize {
        self.stack.total_feature_width()
    }

    #[inline(always)]
    pub fn output_dim(&self) -> usize {
        self.readout.output_dim()
    }

    /// State of the reservoir of layer `layer`
    pub fn hidden(&self, layer: usize) -> Option<&DVector<f64>> {
        self.stack.layer(layer).map(|l| l.hidden_state())
    }

    /// Recurrent weights of layer `layer`
    pub fn recurrence_matrix(&self, layer: usize) -> Option<&DMatrix<f64>> {
        self.stack.layer(layer).map(|l| l.recurrence_matrix())
    }

    /// Input weights of layer `layer`
    pub fn input_matrix(&self, layer: usize) -> Option<&DMatrix<f64>> {
        self.stack.layer(layer).map(|l| l.input_matrix())
    }

    /// Spectral radius of the recurrent weights of layer `layer`
    pub fn spectral_radius(&self, layer: usize) -> Option<f64> {
        self.stack.layer(layer).map(|l| l.spectral_radius())
    }

    /// The finalized readout weights, `None` while training
    pub fn readout_weights(&self) -> Option<&DMatrix<f64>> {
        self.readout.weights()
    }
}

/// Targets delayed by one time step.
/// The first row is `first`, or zeros without a previous output.
fn shifted(targets: &Sequence<'_>, first: Option<&DVector<f64>>) -> DMatrix<f64> {
    let n = targets.nrows();
    let mut out = DMatrix::zeros(n, targets.ncols());
    if n == 0 {
        return out;
    }
    if let Some(first) = first {
        out.set_row(0, &first.transpose());
    }
    if n > 1 {
        out.rows_mut(1, n - 1).copy_from(&targets.rows(0, n - 1));
    }
    out
}
