use super::*;

use std::convert::Infallible;

use approx::assert_abs_diff_eq;
use thiserror::Error;

use crate::multi::bowls::{self, Bowl};

type Value = fn(&[f64; 2]) -> Result<f64, Infallible>;
type Slope = fn(&[f64; 2], &mut [f64; 2]) -> Result<(), Infallible>;

/// Convex but not quadratic, with minimum 1 at `(1, 1)`.
fn convex(x: &[f64; 2]) -> Result<f64, Infallible> {
    Ok((x[0] - 1.0).exp() - x[0] + (x[1] - x[0]).powi(2) + 1.0)
}

fn convex_gradient(x: &[f64; 2], out: &mut [f64; 2]) -> Result<(), Infallible> {
    out[0] = (x[0] - 1.0).exp() - 1.0 - 2.0 * (x[1] - x[0]);
    out[1] = 2.0 * (x[1] - x[0]);
    Ok(())
}

fn solver(objective: Value, gradient: Slope, start: [f64; 2]) -> ConjugateGradient<Value, Slope, 2> {
    let mut cg = ConjugateGradient::new();
    cg.set_objective(objective).unwrap();
    cg.set_gradient(gradient).unwrap();
    cg.set_start(start).unwrap();
    cg
}

#[test]
fn reference_bowl() {
    let bowl = bowls::reference();
    let mut cg = ConjugateGradient::new();
    cg.set_objective(bowl).unwrap();
    cg.set_gradient(bowl).unwrap();
    cg.set_start([0.0, 0.0]).unwrap();

    let solution = cg.minimize(()).unwrap();

    assert_abs_diff_eq!(solution.objective, 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.x[0], 2.0, epsilon = 1e-3);
    assert_abs_diff_eq!(solution.x[1], -1.0, epsilon = 1e-3);
}

fn random_bowls<const N: usize>(polak_ribiere: bool) {
    let mut rng = bowls::rng();
    for _ in 0..10 {
        let bowl = Bowl::<N>::random(&mut rng);
        let start = Bowl::<N>::random(&mut rng).minimum;

        let mut cg = ConjugateGradient::new();
        cg.set_objective(bowl).unwrap();
        cg.set_gradient(bowl).unwrap();
        cg.set_start(start).unwrap();
        cg.set_polak_ribiere(polak_ribiere).unwrap();
        let solution = cg.minimize(()).unwrap();

        assert_abs_diff_eq!(solution.objective, bowl.offset, epsilon = 1e-6);
    }
}

#[test]
fn random_bowls_in_two_to_four_dimensions() {
    for polak_ribiere in [false, true] {
        random_bowls::<2>(polak_ribiere);
        random_bowls::<3>(polak_ribiere);
        random_bowls::<4>(polak_ribiere);
    }
}

#[test]
fn coupled_quadratic_converges_quickly() {
    for polak_ribiere in [false, true] {
        let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [-3.0, 4.0]);
        cg.set_polak_ribiere(polak_ribiere).unwrap();

        let solution = cg.minimize(()).unwrap();

        assert_abs_diff_eq!(solution.objective, 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(solution.x[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.x[1], -2.0, epsilon = 1e-4);
        assert!(solution.iters <= 5, "took {} iterations", solution.iters);
    }
}

#[test]
fn non_quadratic_objective() {
    for polak_ribiere in [false, true] {
        let mut cg = solver(convex, convex_gradient, [-1.0, 3.0]);
        cg.set_polak_ribiere(polak_ribiere).unwrap();
        cg.set_config(Config::new(1e-12, 500).unwrap()).unwrap();

        let solution = cg.minimize(()).unwrap();

        assert_abs_diff_eq!(solution.x[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.x[1], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.objective, 1.0, epsilon = 1e-8);
    }
}

#[test]
fn events_follow_descent_directions() {
    let mut iters = Vec::new();
    let observer = |event: &Event<'_, 2>| {
        assert_eq!(event.state, State::Locked);
        assert!(dot(event.direction, event.gradient) < 0.0 || event.restarted);
        assert!(event.beta >= 0.0);
        iters.push(event.iter);
    };

    let mut cg = solver(convex, convex_gradient, [-1.0, 3.0]);
    cg.set_polak_ribiere(true).unwrap();
    let solution = cg.minimize(observer).unwrap();

    assert_eq!(iters, (1..=solution.iters).collect::<Vec<_>>());
}

#[test]
fn uphill_initial_direction_is_ignored() {
    let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [-3.0, 4.0]);
    let mut g = [0.0; 2];
    bowls::coupled_gradient(&[-3.0, 4.0], &mut g).unwrap();

    cg.set_initial_direction(g).unwrap();
    let solution = cg.minimize(()).unwrap();

    assert_abs_diff_eq!(solution.objective, 3.0, epsilon = 1e-8);
}

#[test]
fn downhill_initial_direction_is_used() {
    let mut first_point = None;
    let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [-3.0, 4.0]);

    // From (-3, 4) the minimum (1, -2) lies along (4, -6).
    cg.set_initial_direction([4.0, -6.0]).unwrap();
    cg.minimize(|event: &Event<'_, 2>| {
        if event.iter == 1 {
            first_point = Some(event.point);
        }
    })
    .unwrap();

    let first = first_point.expect("one event");
    assert_abs_diff_eq!(first.objective, 3.0, epsilon = 1e-10);
}

#[test]
fn initial_direction_validation() {
    let mut cg: ConjugateGradient<Value, Slope, 2> = ConjugateGradient::new();

    assert!(matches!(
        cg.set_initial_direction([0.0, 0.0]),
        Err(Error::InvalidConfig(ConfigError::ZeroDirection))
    ));
    assert!(matches!(
        cg.set_initial_direction([f64::NAN, 1.0]),
        Err(Error::InvalidConfig(ConfigError::NonFinitePoint))
    ));
    cg.set_initial_direction([1.0, 0.0]).unwrap();
    cg.clear_initial_direction().unwrap();
}

#[test]
fn starting_at_the_minimum() {
    let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [1.0, -2.0]);

    let solution = cg.minimize(()).unwrap();

    assert_eq!(solution.iters, 0);
    assert_eq!(solution.x, [1.0, -2.0]);
}

#[test]
fn rerun_from_result_is_stable() {
    let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [-3.0, 4.0]);
    let first = cg.minimize(()).unwrap();
    assert_eq!(*cg.result().unwrap(), first);

    cg.set_start(first.x).unwrap();
    let second = cg.minimize(()).unwrap();

    assert!(second.iters <= 1);
    assert_abs_diff_eq!(second.objective, first.objective, epsilon = 1e-10);
}

#[test]
fn needs_objective_gradient_and_start() {
    let mut cg: ConjugateGradient<Value, Slope, 2> = ConjugateGradient::new();
    cg.set_objective(bowls::coupled).unwrap();
    cg.set_start([0.0, 0.0]).unwrap();

    assert_eq!(cg.state(), State::NotReady);
    assert!(matches!(
        cg.minimize(()),
        Err(Error::NotReady(Missing::Gradient))
    ));

    cg.set_gradient(bowls::coupled_gradient).unwrap();
    assert_eq!(cg.state(), State::Ready);
}

#[test]
fn setters_rejected_while_locked() {
    let mut cg = solver(bowls::coupled, bowls::coupled_gradient, [-3.0, 4.0]);
    cg.force_lock();

    assert_eq!(cg.state(), State::Locked);
    assert!(matches!(cg.set_gradient(bowls::coupled_gradient), Err(Error::Locked)));
    assert!(matches!(cg.set_polak_ribiere(true), Err(Error::Locked)));
    assert!(matches!(cg.set_initial_direction([1.0, 0.0]), Err(Error::Locked)));
    assert!(matches!(cg.set_start([0.0, 0.0]), Err(Error::Locked)));
    assert!(!cg.is_polak_ribiere());
}

#[test]
fn failure_moves_start_to_last_iterate() {
    let mut last = None;
    let mut cg = solver(convex, convex_gradient, [-1.0, 3.0]);
    cg.set_config(Config::new(1e-12, 1).unwrap()).unwrap();

    let err = cg
        .minimize(|event: &Event<'_, 2>| last = Some(event.point.x))
        .unwrap_err();

    assert!(matches!(err, Error::Failed(Failure::MaxIters { max_iters: 1 })));
    assert_eq!(Some(*cg.start().unwrap()), last);
}

#[derive(Debug, Error)]
#[error("gradient unavailable")]
struct NoGradient;

#[test]
fn gradient_error_propagates() {
    let broken = |_: &[f64; 2], _: &mut [f64; 2]| Err::<(), _>(NoGradient);

    let mut cg = ConjugateGradient::new();
    cg.set_objective(bowls::coupled).unwrap();
    cg.set_gradient(broken).unwrap();
    cg.set_start([0.0, 0.0]).unwrap();
    let err = cg.minimize(()).unwrap_err();

    assert_eq!(err.kind(), crate::ErrorKind::Evaluation);
    assert!(
        std::error::Error::source(&err)
            .and_then(|e| e.downcast_ref::<NoGradient>())
            .is_some()
    );
}
