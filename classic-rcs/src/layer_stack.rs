use common::{Error, ReservoirCell, Result, Sequence};
use nalgebra::{DMatrix, DVector};

use crate::{CellParams, EsnCell, EsnConstructor, FeatureWidth, StackParams};

/// An ordered stack of reservoirs, each driven by the states of the one before it.
/// The first layer is driven by the input itself.
#[derive(Debug, Clone)]
pub struct LayerStack<C> {
    layers: Vec<C>,
    input_dim: usize,
    feature_width: FeatureWidth,
    total_feature_width: usize,
}

impl LayerStack<EsnCell> {
    /// Build a stack of Echo State Networks with generated weights
    pub fn new(params: &StackParams) -> Result<Self> {
        Self::build(params, |cell_params| {
            let mut constructor = EsnConstructor::new(cell_params.seed);
            EsnCell::new(cell_params, &mut constructor)
        })
    }
}

impl<C> LayerStack<C>
where
    C: ReservoirCell,
{
    /// Build a stack from the resolved parameters of each layer
    ///
    /// # Arguments
    /// params: The stack parameters, resolved once per layer
    /// make_cell: Creates the reservoir of a layer from its parameters
    pub fn build<F>(params: &StackParams, mut make_cell: F) -> Result<Self>
    where
        F: FnMut(CellParams) -> Result<C>,
    {
        params.validate()?;

        let n_layers = params.n_layers();
        let mut layers = Vec::with_capacity(n_layers);
        for layer in 0..n_layers {
            let cell_params = params.layer_params(layer)?;
            let (input_dim, hidden_dim) = (cell_params.input_dim, cell_params.hidden_dim);

            let cell = make_cell(cell_params)?;
            if cell.input_dim() != input_dim || cell.hidden_dim() != hidden_dim {
                return Err(Error::configuration(format!(
                    "layer {layer} has dims ({}, {}), expected ({input_dim}, {hidden_dim})",
                    cell.input_dim(),
                    cell.hidden_dim()
                )));
            }
            debug!("layer {}: input_dim: {}, hidden_dim: {}", layer, input_dim, hidden_dim);
            layers.push(cell);
        }

        let total_feature_width = match params.feature_width {
            FeatureWidth::HiddenWidths => layers.iter().map(|l| l.hidden_dim()).sum(),
            FeatureWidth::InputWidths => layers.iter().map(|l| l.input_dim()).sum(),
        };
        info!(
            "built {} layers, readout features: {} ({:?})",
            n_layers, total_feature_width, params.feature_width
        );

        Ok(Self {
            layers,
            input_dim: params.input_dim,
            feature_width: params.feature_width,
            total_feature_width,
        })
    }

    /// Number of layers
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// The layers in construction order
    #[inline(always)]
    pub fn layers(&self) -> &[C] {
        &self.layers
    }

    /// Layer `i`, `None` if out of range
    #[inline(always)]
    pub fn layer(&self, i: usize) -> Option<&C> {
        self.layers.get(i)
    }

    /// Number of input features of the first layer
    #[inline(always)]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Number of nodes of each reservoir, in layer order
    pub fn hidden_dims(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.hidden_dim()).collect()
    }

    /// Width of the concatenated states of all layers
    pub fn state_width(&self) -> usize {
        self.layers.iter().map(|l| l.hidden_dim()).sum()
    }

    /// Number of features the readout is sized for, counted as configured by `feature_width`
    #[inline(always)]
    pub fn total_feature_width(&self) -> usize {
        self.total_feature_width
    }

    /// How `total_feature_width` is counted
    #[inline(always)]
    pub fn feature_width(&self) -> FeatureWidth {
        self.feature_width
    }

    /// The current states of all layers concatenated in layer order
    pub fn hidden_states(&self) -> DVector<f64> {
        let mut features = DVector::zeros(self.state_width());
        let mut offset = 0;
        for layer in self.layers.iter() {
            let state = layer.hidden_state();
            features.rows_mut(offset, state.len()).copy_from(state);
            offset += state.len();
        }
        features
    }

    /// Zero the state of every layer
    pub fn reset_hidden(&mut self) {
        for layer in self.layers.iter_mut() {
            layer.reset_hidden_state();
        }
    }

    /// Drive every layer with a whole sequence, one layer after the other.
    ///
    /// # Arguments
    /// inputs: One row per time step
    /// feedback: Fed to every layer, row `t` is the output fed back at time step `t`
    ///
    /// # Returns
    /// The states of all layers concatenated along the columns, in layer order
    pub fn forward(
        &mut self,
        inputs: &Sequence<'_>,
        feedback: Option<&Sequence<'_>>,
    ) -> Result<DMatrix<f64>> {
        let mut states: Vec<DMatrix<f64>> = Vec::with_capacity(self.layers.len());
        for layer in self.layers.iter_mut() {
            let layer_states = match states.last() {
                None => layer.forward(inputs, feedback)?,
                Some(prev) => layer.forward(&prev.rows(0, prev.nrows()), feedback)?,
            };
            states.push(layer_states);
        }

        Ok(concat_columns(inputs.nrows(), &states))
    }

    /// Advance every layer by a single time step
    ///
    /// # Returns
    /// The new states of all layers concatenated in layer order
    pub fn step(
        &mut self,
        input: &DVector<f64>,
        feedback: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>> {
        let mut features = DVector::zeros(self.state_width());
        let mut offset = 0;
        let mut x = input.clone();
        for layer in self.layers.iter_mut() {
            let state = layer.step(&x, feedback)?;
            features.rows_mut(offset, state.len()).copy_from(state);
            offset += state.len();
            x = state.clone();
        }

        Ok(features)
    }
}

fn concat_columns(nrows: usize, blocks: &[DMatrix<f64>]) -> DMatrix<f64> {
    let ncols = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for b in blocks {
        out.columns_mut(offset, b.ncols()).copy_from(b);
        offset += b.ncols();
    }
    out
}
