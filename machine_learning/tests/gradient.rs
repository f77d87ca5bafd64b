use machine_learning::{
    arch::{
        LogisticRegression, Model,
        loss::{LossFn, NegativeLogLikelihood},
    },
    optimization::{GradientDescent, Optimizer},
};
use ndarray::{Array1, Array2, array};

fn loss_at(model: &LogisticRegression, params: &[f32], x: &Array2<f32>, y: &Array1<usize>) -> f32 {
    let scores = model.forward(params, x.view()).unwrap();
    NegativeLogLikelihood::new().loss(scores.view(), y.view())
}

fn analytic_grad(
    model: &LogisticRegression,
    params: &[f32],
    x: &Array2<f32>,
    y: &Array1<usize>,
) -> Vec<f32> {
    let scores = model.forward(params, x.view()).unwrap();
    let d = NegativeLogLikelihood::new().loss_prime(scores.view(), y.view());

    let mut grad = vec![0.0; model.size()];
    model.backward(params, &mut grad, x.view(), d.view()).unwrap();
    grad
}

#[test]
fn gradient_matches_central_differences() {
    let model = LogisticRegression::new(3, 3);
    let x = array![
        [0.2, -0.4, 1.0],
        [1.5, 0.3, -0.7],
        [-0.6, 0.8, 0.1],
        [0.0, -1.2, 0.5]
    ];
    let y = array![0, 2, 1, 2];
    let params: Vec<f32> = (0..model.size())
        .map(|i| ((i * 7 % 11) as f32 - 5.0) * 0.1)
        .collect();

    let grad = analytic_grad(&model, &params, &x, &y);
    let eps = 1e-2;

    // covers every entry of W followed by every entry of b
    for i in 0..model.size() {
        let mut plus = params.clone();
        let mut minus = params.clone();
        plus[i] += eps;
        minus[i] -= eps;

        let numeric = (loss_at(&model, &plus, &x, &y) - loss_at(&model, &minus, &x, &y)) / (2.0 * eps);
        assert!(
            (numeric - grad[i]).abs() < 2e-3,
            "param {i}: numeric {numeric} vs analytic {}",
            grad[i]
        );
    }
}

#[test]
fn one_small_step_decreases_the_loss() {
    let model = LogisticRegression::new(2, 2);
    let x = array![[2.0, 0.1], [1.8, -0.2], [-2.1, 0.3], [-1.9, -0.1]];
    let y = array![0, 0, 1, 1];

    let mut params = vec![0.0; model.size()];
    let before = loss_at(&model, &params, &x, &y);

    let grad = analytic_grad(&model, &params, &x, &y);
    GradientDescent::new(0.1).update_params(&mut params, &grad).unwrap();
    let after = loss_at(&model, &params, &x, &y);

    assert!(after < before, "loss went from {before} to {after}");
}
