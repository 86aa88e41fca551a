use classic_rcs::{
    Error, EsnCell, FeatureWidth, LayerParam, LinRegError, Phase, Readout, ReservoirCell,
    RidgeReadout, SolveMethod, StackParams, StackedEsn, TikhonovRegularization,
};
use nalgebra::{DMatrix, DVector};

fn sequence(len: usize, dim: usize, offset: usize) -> DMatrix<f64> {
    DMatrix::from_fn(len, dim, |i, j| ((i + offset) as f64 * 0.1 * (j + 1) as f64).sin())
}

fn targets_of(inputs: &DMatrix<f64>, output_dim: usize) -> DMatrix<f64> {
    DMatrix::from_fn(inputs.nrows(), output_dim, |i, k| {
        inputs.row(i).iter().sum::<f64>() * (k + 1) as f64 * 0.5
    })
}

fn params() -> StackParams {
    let mut params = StackParams::new(3, vec![5, 4], 2);
    params.ridge_param = 1e-4;
    params.seed = Some(42);
    params
}

type Esn = StackedEsn<EsnCell, RidgeReadout<TikhonovRegularization>>;

fn trained(params: &StackParams) -> Esn {
    let mut esn = StackedEsn::new(params).unwrap();
    let inputs = sequence(50, params.input_dim, 0);
    let targets = targets_of(&inputs, params.output_dim);
    esn.forward(&inputs.rows(0, 50), Some(&targets.rows(0, 50))).unwrap();
    esn.finalize().unwrap();
    esn
}

#[test]
fn end_to_end() {
    if let Err(_) = pretty_env_logger::try_init() {}

    let params = params();
    let mut esn = StackedEsn::new(&params).unwrap();
    assert_eq!(esn.n_layers(), 2);
    assert_eq!(esn.total_feature_width(), 9);

    let inputs = sequence(50, 3, 0);
    let targets = targets_of(&inputs, 2);
    let states = esn.forward(&inputs.rows(0, 50), Some(&targets.rows(0, 50))).unwrap();
    assert_eq!(states.shape(), (50, 9));

    esn.finalize().unwrap();
    assert_eq!(esn.phase(), Phase::Inference);
    assert_eq!(esn.readout_weights().unwrap().shape(), (2, 9 + 1));

    let test_inputs = sequence(10, 3, 50);
    let outputs = esn.forward(&test_inputs.rows(0, 10), None).unwrap();
    assert_eq!(outputs.shape(), (10, 2));
    assert!(outputs.iter().all(|v| v.is_finite()));
}

#[test]
fn without_bias() {
    let mut params = params();
    params.with_bias = false;
    params.solve_method = SolveMethod::Lu;

    let esn = trained(&params);

    assert_eq!(esn.readout_weights().unwrap().shape(), (2, 9));
}

#[test]
fn layer_accessors() {
    let mut params = params();
    params.spectral_radius = vec![0.5, 0.7].into();
    let esn = StackedEsn::new(&params).unwrap();

    assert_eq!(esn.layers()[1].input_dim(), esn.layers()[0].hidden_dim());
    assert_eq!(esn.recurrence_matrix(0).unwrap().shape(), (5, 5));
    assert_eq!(esn.recurrence_matrix(1).unwrap().shape(), (4, 4));
    assert_eq!(esn.input_matrix(0).unwrap().shape(), (5, 3));
    assert_eq!(esn.input_matrix(1).unwrap().shape(), (4, 5));
    assert!((esn.spectral_radius(0).unwrap() - 0.5).abs() < 1e-6);
    assert!((esn.spectral_radius(1).unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(esn.hidden(1).unwrap(), &DVector::zeros(4));
    assert!(esn.hidden(2).is_none());
    assert!(esn.recurrence_matrix(2).is_none());
}

#[test]
fn supplied_per_layer_weights() {
    let mut params = params();
    let w0 = DMatrix::from_element(5, 5, 0.01);
    let w1 = DMatrix::from_element(4, 4, 0.02);
    params.recurrence_weights = vec![w0.clone(), w1.clone()].into();
    params.bias_weights = LayerParam::Shared(DVector::zeros(5));
    let err = StackedEsn::new(&params).unwrap_err();
    // a shared bias of width 5 does not fit the second layer
    assert!(matches!(err, Error::Configuration(_)));

    params.bias_weights = vec![DVector::zeros(5), DVector::zeros(4)].into();
    let esn = StackedEsn::new(&params).unwrap();

    assert_eq!(esn.recurrence_matrix(0).unwrap(), &w0);
    assert_eq!(esn.recurrence_matrix(1).unwrap(), &w1);
}

#[test]
fn per_layer_list_length_mismatch() {
    let mut params = StackParams::new(3, vec![10, 20], 1);
    params.spectral_radius = vec![0.9, 0.8, 0.7].into();

    assert!(matches!(StackedEsn::new(&params), Err(Error::Configuration(_))));

    let mut params = StackParams::new(3, vec![10, 20], 1);
    params.input_weights = vec![DMatrix::zeros(10, 3)].into();

    assert!(matches!(StackedEsn::new(&params), Err(Error::Configuration(_))));
}

#[test]
fn empty_hidden_dims() {
    let params = StackParams::new(3, vec![], 1);

    assert!(matches!(StackedEsn::new(&params), Err(Error::Configuration(_))));
}

#[test]
fn training_requires_targets() {
    let inputs = sequence(20, 3, 0);

    let mut esn = StackedEsn::new(&params()).unwrap();
    assert!(matches!(esn.forward(&inputs.rows(0, 20), None), Err(Error::State(_))));

    let mut params = params();
    params.feedbacks = true;
    let mut esn = StackedEsn::new(&params).unwrap();
    assert!(matches!(esn.forward(&inputs.rows(0, 20), None), Err(Error::State(_))));
    assert_eq!(esn.readout().correlations().num_samples(), 0);
}

#[test]
fn shape_errors() {
    let mut esn = StackedEsn::new(&params()).unwrap();

    let inputs = sequence(20, 2, 0);
    let targets = DMatrix::zeros(20, 2);
    let err = esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap_err();
    assert!(matches!(err, Error::Shape { expected: 3, got: 2, .. }));

    let inputs = sequence(20, 3, 0);
    let err = esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 19))).unwrap_err();
    assert!(matches!(err, Error::Shape { expected: 20, got: 19, .. }));

    let targets = DMatrix::zeros(20, 3);
    let err = esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap_err();
    assert!(matches!(err, Error::Shape { expected: 2, got: 3, .. }));
}

#[test]
fn accumulate_after_finalize() {
    let params = params();
    let mut esn = trained(&params);
    let inputs = sequence(20, 3, 0);
    let targets = targets_of(&inputs, 2);

    let err = esn.accumulate(&inputs.rows(0, 20), &targets.rows(0, 20)).unwrap_err();
    assert!(matches!(err, Error::State(_)));

    esn.reset();
    assert!(esn.readout_weights().is_none());
    assert!(esn.is_training());
    esn.accumulate(&inputs.rows(0, 20), &targets.rows(0, 20)).unwrap();
    assert_eq!(esn.readout().correlations().num_samples(), 20);
}

#[test]
fn finalize_twice() {
    let params = params();
    let mut esn = trained(&params);
    let weights = esn.readout_weights().cloned();

    let err = esn.finalize().unwrap_err();

    assert!(matches!(err, Error::Numerical(LinRegError::NoSamples)));
    assert_eq!(esn.phase(), Phase::Inference);
    assert_eq!(esn.readout_weights().cloned(), weights);
}

#[test]
fn finalize_without_training() {
    let mut esn = StackedEsn::new(&params()).unwrap();

    assert!(matches!(esn.finalize(), Err(Error::Numerical(LinRegError::NoSamples))));
    assert_eq!(esn.phase(), Phase::Training);
}

#[test]
fn reset_is_idempotent() {
    let params = params();
    let mut once = trained(&params);
    let inputs = sequence(10, 3, 60);
    once.forward(&inputs.rows(0, 10), None).unwrap();
    let mut twice = once.clone();

    once.reset();
    twice.reset();
    twice.reset();

    assert_eq!(once.phase(), twice.phase());
    assert_eq!(once.readout_weights(), twice.readout_weights());
    assert_eq!(once.readout().correlations(), twice.readout().correlations());
    for layer in 0..2 {
        assert_eq!(once.hidden(layer), twice.hidden(layer));
        assert_eq!(once.recurrence_matrix(layer), twice.recurrence_matrix(layer));
    }
}

#[test]
fn reset_keeps_reservoirs() {
    let params = params();
    let mut esn = trained(&params);
    let w = esn.recurrence_matrix(0).cloned();
    let hidden = esn.hidden(1).cloned();

    esn.reset();

    assert_eq!(esn.recurrence_matrix(0).cloned(), w);
    assert_eq!(esn.hidden(1).cloned(), hidden);

    esn.reset_hidden();
    assert_eq!(esn.hidden(1).unwrap(), &DVector::zeros(4));
}

#[test]
fn feedback_lifecycle() {
    if let Err(_) = pretty_env_logger::try_init() {}

    let mut params = params();
    params.feedbacks = true;
    params.normalize_feedbacks = true;
    params.feedback_sparsity = Some(0.5);
    let mut esn = trained(&params);
    assert!(esn.feedbacks());

    let inputs = sequence(10, 3, 50);
    let outputs = esn.forward(&inputs.rows(0, 10), None).unwrap();
    assert_eq!(outputs.shape(), (10, 2));
    assert!(outputs.iter().all(|v| v.is_finite()));

    // back to training, the old weights are gone and targets are needed again
    esn.reset();
    assert!(esn.readout_weights().is_none());
    assert!(matches!(esn.forward(&inputs.rows(0, 10), None), Err(Error::State(_))));
}

#[test]
fn inference_ignores_targets() {
    let params = params();
    let mut a = trained(&params);
    let mut b = a.clone();
    let inputs = sequence(10, 3, 50);
    let targets = DMatrix::from_element(10, 2, 100.0);

    let with = a.forward(&inputs.rows(0, 10), Some(&targets.rows(0, 10))).unwrap();
    let without = b.forward(&inputs.rows(0, 10), None).unwrap();

    assert_eq!(with, without);
}

#[test]
fn input_width_feature_accounting() {
    // 3 + 5 input features, but 5 + 4 state features
    let mut params = params();
    params.feature_width = FeatureWidth::InputWidths;
    let mut esn = StackedEsn::new(&params).unwrap();
    assert_eq!(esn.total_feature_width(), 8);

    let inputs = sequence(20, 3, 0);
    let targets = targets_of(&inputs, 2);
    let err = esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap_err();
    assert!(matches!(err, Error::Shape { expected: 8, got: 9, .. }));
    assert_eq!(esn.readout().correlations().num_samples(), 0);

    // both sums agree when every layer is as wide as the input
    let mut params = StackParams::new(4, vec![4, 4], 1);
    params.feature_width = FeatureWidth::InputWidths;
    params.seed = Some(3);
    let mut esn = StackedEsn::new(&params).unwrap();
    assert_eq!(esn.total_feature_width(), 8);

    let inputs = sequence(30, 4, 0);
    let targets = targets_of(&inputs, 1);
    esn.forward(&inputs.rows(0, 30), Some(&targets.rows(0, 30))).unwrap();
    esn.finalize().unwrap();
    assert_eq!(esn.readout_weights().unwrap().shape(), (1, 9));
    assert_eq!(esn.readout().input_dim(), 8);
}

#[test]
fn sine_next_step_prediction() {
    if let Err(_) = pretty_env_logger::try_init() {}

    const TRAIN_LEN: usize = 300;
    const TEST_LEN: usize = 100;
    let signal: Vec<f64> = (0..TRAIN_LEN + TEST_LEN + 1).map(|i| (i as f64 * 0.2).sin()).collect();

    let mut params = StackParams::new(1, vec![30, 20], 1);
    params.input_scaling = 0.5.into();
    params.ridge_param = 1e-8;
    params.seed = Some(42);
    let mut esn = StackedEsn::new(&params).unwrap();

    let inputs = DMatrix::from_column_slice(TRAIN_LEN, 1, &signal[..TRAIN_LEN]);
    let targets = DMatrix::from_column_slice(TRAIN_LEN, 1, &signal[1..TRAIN_LEN + 1]);
    esn.forward(&inputs.rows(0, TRAIN_LEN), Some(&targets.rows(0, TRAIN_LEN))).unwrap();
    esn.finalize().unwrap();

    // the reservoirs carry on from where training left off
    let inputs = DMatrix::from_column_slice(TEST_LEN, 1, &signal[TRAIN_LEN..TRAIN_LEN + TEST_LEN]);
    let outputs = esn.forward(&inputs.rows(0, TEST_LEN), None).unwrap();

    let mse = (0..TEST_LEN)
        .map(|i| (outputs[(i, 0)] - signal[TRAIN_LEN + 1 + i]).powi(2))
        .sum::<f64>()
        / TEST_LEN as f64;
    log::info!("sine next step rmse: {}", mse.sqrt());

    assert!(mse.sqrt() < 0.1);
}

fn feedback_params() -> StackParams {
    let mut params = StackParams::new(1, vec![8, 5], 1);
    params.feedbacks = true;
    params.ridge_param = 1e-6;
    params.seed = Some(9);
    params
}

fn wave(len: usize, offset: usize) -> DMatrix<f64> {
    DMatrix::from_fn(len, 1, |i, _| ((i + offset) as f64 * 0.2).sin())
}

#[test]
fn chunked_teacher_forcing_matches_single_call() {
    let params = feedback_params();
    let inputs = wave(40, 0);
    let targets = wave(40, 1);

    let mut whole = StackedEsn::new(&params).unwrap();
    let states = whole.forward(&inputs.rows(0, 40), Some(&targets.rows(0, 40))).unwrap();

    let mut chunked = StackedEsn::new(&params).unwrap();
    let first = chunked.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap();
    let second = chunked.forward(&inputs.rows(20, 20), Some(&targets.rows(20, 20))).unwrap();

    assert!((states.rows(0, 20) - first).amax() < 1e-12);
    assert!((states.rows(20, 20) - second).amax() < 1e-12);
    assert_eq!(chunked.readout().num_samples(), whole.readout().num_samples());
}

#[test]
fn reset_hidden_restarts_teacher_forcing() {
    let params = feedback_params();
    let inputs = wave(20, 0);
    let targets = wave(20, 1);

    let mut fresh = StackedEsn::new(&params).unwrap();
    let expected = fresh.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap();

    let mut esn = StackedEsn::new(&params).unwrap();
    esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap();
    esn.reset_hidden();
    let states = esn.forward(&inputs.rows(0, 20), Some(&targets.rows(0, 20))).unwrap();

    assert_eq!(states, expected);
}

#[test]
fn chunked_feedback_inference_matches_single_call() {
    let params = feedback_params();
    let mut whole = StackedEsn::new(&params).unwrap();
    let inputs = wave(100, 0);
    let targets = wave(100, 1);
    whole.forward(&inputs.rows(0, 100), Some(&targets.rows(0, 100))).unwrap();
    whole.finalize().unwrap();
    let mut chunked = whole.clone();

    let test_inputs = wave(20, 100);
    let outputs = whole.forward(&test_inputs.rows(0, 20), None).unwrap();
    let first = chunked.forward(&test_inputs.rows(0, 10), None).unwrap();
    let second = chunked.forward(&test_inputs.rows(10, 10), None).unwrap();

    assert_eq!(outputs.rows(0, 10), first);
    assert_eq!(outputs.rows(10, 10), second);
}

#[test]
fn feedback_inference_continues_from_training() {
    if let Err(_) = pretty_env_logger::try_init() {}

    const TRAIN_LEN: usize = 300;
    let signal: Vec<f64> = (0..TRAIN_LEN + 2).map(|i| (i as f64 * 0.2).sin()).collect();

    let mut params = StackParams::new(1, vec![30, 20], 1);
    params.feedbacks = true;
    params.input_scaling = 0.5.into();
    params.ridge_param = 1e-6;
    params.seed = Some(42);
    let mut esn = StackedEsn::new(&params).unwrap();

    let inputs = DMatrix::from_column_slice(TRAIN_LEN, 1, &signal[..TRAIN_LEN]);
    let targets = DMatrix::from_column_slice(TRAIN_LEN, 1, &signal[1..TRAIN_LEN + 1]);
    esn.forward(&inputs.rows(0, TRAIN_LEN), Some(&targets.rows(0, TRAIN_LEN))).unwrap();
    esn.finalize().unwrap();

    let next = DMatrix::from_element(1, 1, signal[TRAIN_LEN]);
    let outputs = esn.forward(&next.rows(0, 1), None).unwrap();
    log::info!("first prediction: {}, truth: {}", outputs[(0, 0)], signal[TRAIN_LEN + 1]);

    assert!((outputs[(0, 0)] - signal[TRAIN_LEN + 1]).abs() < 0.1);
}
