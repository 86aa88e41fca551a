use common::{Error, ReservoirCell, Result};
use nalgebra::{DMatrix, DVector};

use crate::{spectral_radius, CellParams, ReservoirConstructor};

/// A single leaky Echo State Network reservoir.
/// The weights are fixed after construction, only the state evolves.
#[derive(Debug, Clone)]
pub struct EsnCell {
    params: CellParams,
    input_weight_matrix: DMatrix<f64>,
    reservoir_matrix: DMatrix<f64>,
    reservoir_biases: DVector<f64>,
    feedback_matrix: Option<DMatrix<f64>>,
    spectral_radius: f64,
    state: DVector<f64>,
}

fn check_shape(name: &str, got: (usize, usize), expected: (usize, usize)) -> Result<()> {
    if got != expected {
        return Err(Error::configuration(format!(
            "{name} has shape {got:?}, expected {expected:?}"
        )));
    }
    Ok(())
}

impl EsnCell {
    /// Create a new reservoir.
    /// Weights supplied through the params are used as given, the rest is generated
    ///
    /// # Arguments
    /// params: The resolved parameters of this layer
    /// constructor: Generates the weights that are not supplied
    pub fn new<C>(mut params: CellParams, constructor: &mut C) -> Result<Self>
    where
        C: ReservoirConstructor,
    {
        if params.input_dim == 0 || params.hidden_dim == 0 {
            return Err(Error::configuration(format!(
                "reservoir dims must be positive, got input_dim {} and hidden_dim {}",
                params.input_dim, params.hidden_dim
            )));
        }
        if !(params.leaking_rate > 0.0 && params.leaking_rate <= 1.0) {
            return Err(Error::configuration(format!(
                "leaking_rate must be in (0, 1], got {}",
                params.leaking_rate
            )));
        }
        if params.feedbacks && params.feedback_dim == 0 {
            return Err(Error::configuration("feedbacks enabled without any feedback dimension"));
        }
        let (d, h) = (params.input_dim, params.hidden_dim);

        let reservoir_matrix = match params.recurrence_weights.take() {
            Some(w) => {
                check_shape("recurrence_weights", w.shape(), (h, h))?;
                w
            }
            None => constructor.construct_reservoir_weights(&params)?,
        };
        let input_weight_matrix = match params.input_weights.take() {
            Some(w_in) => {
                check_shape("input_weights", w_in.shape(), (h, d))?;
                w_in
            }
            None => constructor.construct_input_weight_matrix(&params)?,
        };
        let reservoir_biases = match params.bias_weights.take() {
            Some(b) => {
                check_shape("bias_weights", b.shape(), (h, 1))?;
                b
            }
            None => constructor.construct_reservoir_biases(&params),
        };
        let feedback_matrix = if params.feedbacks {
            Some(constructor.construct_feedback_weight_matrix(&params))
        } else {
            None
        };
        let spectral_radius = spectral_radius(&reservoir_matrix)?;
        let state = DVector::zeros(h);

        Ok(Self {
            params,
            input_weight_matrix,
            reservoir_matrix,
            reservoir_biases,
            feedback_matrix,
            spectral_radius,
            state,
        })
    }

    /// The parameters this reservoir was built with, without the supplied weights
    #[inline(always)]
    pub fn params(&self) -> &CellParams {
        &self.params
    }

    #[inline(always)]
    pub fn biases(&self) -> &DVector<f64> {
        &self.reservoir_biases
    }

    /// Weights of the fed back outputs, if feedback is enabled
    #[inline(always)]
    pub fn feedback_matrix(&self) -> Option<&DMatrix<f64>> {
        self.feedback_matrix.as_ref()
    }
}

impl ReservoirCell for EsnCell {
    #[inline(always)]
    fn input_dim(&self) -> usize {
        self.params.input_dim
    }

    #[inline(always)]
    fn hidden_dim(&self) -> usize {
        self.params.hidden_dim
    }

    fn step(
        &mut self,
        input: &DVector<f64>,
        feedback: Option<&DVector<f64>>,
    ) -> Result<&DVector<f64>> {
        if input.len() != self.params.input_dim {
            return Err(Error::shape("reservoir input", self.params.input_dim, input.len()));
        }
        let mut pre: DVector<f64> = &self.input_weight_matrix * input
            + &self.reservoir_matrix * &self.state
            + &self.reservoir_biases;

        if let (Some(w_fdb), Some(y)) = (&self.feedback_matrix, feedback) {
            if y.len() != w_fdb.ncols() {
                return Err(Error::shape("feedback values", w_fdb.ncols(), y.len()));
            }
            let norm = y.norm();
            if self.params.normalize_feedbacks && norm > 0.0 {
                pre += w_fdb * (y / norm);
            } else {
                pre += w_fdb * y;
            }
        }
        self.params.activation.activate(pre.as_mut_slice());

        // leaky integration of the new activation
        let a = self.params.leaking_rate;
        self.state = (1.0 - a) * &self.state + a * pre;

        Ok(&self.state)
    }

    /// Resets the state to it's initial values
    #[inline(always)]
    fn reset_hidden_state(&mut self) {
        self.state.fill(0.0);
    }

    #[inline(always)]
    fn hidden_state(&self) -> &DVector<f64> {
        &self.state
    }

    #[inline(always)]
    fn recurrence_matrix(&self) -> &DMatrix<f64> {
        &self.reservoir_matrix
    }

    #[inline(always)]
    fn input_matrix(&self) -> &DMatrix<f64> {
        &self.input_weight_matrix
    }

    #[inline(always)]
    fn spectral_radius(&self) -> f64 {
        self.spectral_radius
    }
}
