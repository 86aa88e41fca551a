use common::{Error, Result};
use nalgebra::{DMatrix, DVector, Schur};
use nanorand::{Rng, WyRand};

use crate::{CellParams, ReservoirConstructor};

/// Constructs the weights of a classic Echo State Network
#[derive(Debug, Clone)]
pub struct EsnConstructor {
    rng: WyRand,
}

impl EsnConstructor {
    /// Create a new constructor, with an optional seed for reproducible weights
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => WyRand::new_seed(seed),
            None => WyRand::new(),
        };

        Self { rng }
    }
}

const MAX_SCHUR_ITERATIONS: usize = 10_000;

/// Largest absolute eigenvalue of a square matrix.
/// Fails for non finite entries or if the eigenvalues do not converge.
pub fn spectral_radius(m: &DMatrix<f64>) -> Result<f64> {
    if !m.is_square() {
        return Err(Error::configuration(format!(
            "spectral radius of a non square {}x{} matrix",
            m.nrows(),
            m.ncols()
        )));
    }
    if m.iter().any(|v| !v.is_finite()) {
        return Err(Error::configuration("recurrence matrix contains non finite values"));
    }
    // the schur decomposition never terminates on a zero matrix
    if m.is_empty() || m.amax() == 0.0 {
        return Ok(0.0);
    }
    let schur = Schur::try_new(m.clone(), f64::EPSILON, MAX_SCHUR_ITERATIONS).ok_or_else(|| {
        Error::configuration(format!(
            "eigenvalues of the {}x{} recurrence matrix did not converge",
            m.nrows(),
            m.ncols()
        ))
    })?;

    Ok(schur.complex_eigenvalues().iter().map(|e| e.norm_sqr().sqrt()).fold(0.0, f64::max))
}

#[inline(always)]
fn uniform(rng: &mut WyRand) -> f64 {
    rng.generate::<f64>() * 2.0 - 1.0
}

/// Draws whether a connection exists, always true without a probability
#[inline(always)]
fn connected(rng: &mut WyRand, probability: Option<f64>) -> bool {
    match probability {
        Some(p) => rng.generate::<f64>() < p,
        None => true,
    }
}

impl ReservoirConstructor for EsnConstructor {
    fn construct_reservoir_weights(&mut self, params: &CellParams) -> Result<DMatrix<f64>> {
        let n = params.hidden_dim;
        let mut reservoir_matrix = DMatrix::from_fn(n, n, |_, _| {
            if connected(&mut self.rng, params.w_sparsity) {
                uniform(&mut self.rng)
            } else {
                0.0
            }
        });

        let spec_rad = spectral_radius(&reservoir_matrix)?;
        if spec_rad > 0.0 {
            reservoir_matrix *= (1.0 / spec_rad) * params.spectral_radius;
        } else {
            debug!("generated reservoir has no connections, skipping spectral radius scaling");
        }
        trace!("reservoir: {}", reservoir_matrix);

        Ok(reservoir_matrix)
    }

    fn construct_reservoir_biases(&mut self, params: &CellParams) -> DVector<f64> {
        DVector::from_fn(params.hidden_dim, |_, _| uniform(&mut self.rng) * params.bias_scaling)
    }

    fn construct_input_weight_matrix(&mut self, params: &CellParams) -> Result<DMatrix<f64>> {
        if params.input_set.is_empty() {
            return Err(Error::configuration("input_set must contain at least one value"));
        }
        let input_set = &params.input_set;
        let input_matrix = DMatrix::from_fn(params.hidden_dim, params.input_dim, |_, _| {
            if connected(&mut self.rng, params.sparsity) {
                input_set[self.rng.generate_range(0..input_set.len())] * params.input_scaling
            } else {
                0.0
            }
        });
        trace!("input_matrix: {}", input_matrix);

        Ok(input_matrix)
    }

    fn construct_feedback_weight_matrix(&mut self, params: &CellParams) -> DMatrix<f64> {
        DMatrix::from_fn(params.hidden_dim, params.feedback_dim, |_, _| {
            if connected(&mut self.rng, params.feedback_sparsity) {
                uniform(&mut self.rng)
            } else {
                0.0
            }
        })
    }
}
