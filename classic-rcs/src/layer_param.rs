use common::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// A hyperparameter that is either shared by all layers of a stack or given per layer
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LayerParam<T> {
    /// Let the reservoir use its default or generate its own value
    #[default]
    Unset,
    /// The same value for every layer
    Shared(T),
    /// One value per layer, matched by layer index
    PerLayer(Vec<T>),
}

impl<T: Clone> LayerParam<T> {
    /// Select the value that applies to layer `layer` of a stack with `n_layers` layers.
    /// Per layer values of the wrong length are rejected, never truncated or padded.
    ///
    /// # Arguments:
    /// name: Name of the hyperparameter, used in error messages
    pub fn resolve(&self, name: &str, layer: usize, n_layers: usize) -> Result<Option<T>> {
        if layer >= n_layers {
            return Err(Error::configuration(format!(
                "{name}: layer index {layer} out of range for {n_layers} layers"
            )));
        }
        match self {
            LayerParam::Unset => Ok(None),
            LayerParam::Shared(v) => Ok(Some(v.clone())),
            LayerParam::PerLayer(vals) => {
                if vals.len() != n_layers {
                    return Err(Error::configuration(format!(
                        "{name}: {} per layer values given for {n_layers} layers",
                        vals.len()
                    )));
                }
                Ok(Some(vals[layer].clone()))
            }
        }
    }

    /// Whether a distinct value is given for each layer
    #[inline(always)]
    pub fn is_per_layer(&self) -> bool {
        matches!(self, LayerParam::PerLayer(_))
    }

    /// The number of layers this parameter was given for, `None` unless per layer
    pub fn len_hint(&self) -> Option<usize> {
        match self {
            LayerParam::PerLayer(vals) => Some(vals.len()),
            _ => None,
        }
    }
}

impl LayerParam<DVector<f64>> {
    /// Treat each row of a stacked matrix as the vector of one layer
    pub fn from_stacked_rows(stacked: &DMatrix<f64>) -> Self {
        LayerParam::PerLayer(stacked.row_iter().map(|r| r.transpose()).collect())
    }
}

impl From<f64> for LayerParam<f64> {
    fn from(v: f64) -> Self {
        LayerParam::Shared(v)
    }
}

impl From<Vec<f64>> for LayerParam<f64> {
    fn from(vals: Vec<f64>) -> Self {
        LayerParam::PerLayer(vals)
    }
}

impl From<DMatrix<f64>> for LayerParam<DMatrix<f64>> {
    fn from(m: DMatrix<f64>) -> Self {
        LayerParam::Shared(m)
    }
}

impl From<Vec<DMatrix<f64>>> for LayerParam<DMatrix<f64>> {
    fn from(stacked: Vec<DMatrix<f64>>) -> Self {
        LayerParam::PerLayer(stacked)
    }
}

impl From<DVector<f64>> for LayerParam<DVector<f64>> {
    fn from(v: DVector<f64>) -> Self {
        LayerParam::Shared(v)
    }
}

impl From<Vec<DVector<f64>>> for LayerParam<DVector<f64>> {
    fn from(stacked: Vec<DVector<f64>>) -> Self {
        LayerParam::PerLayer(stacked)
    }
}
