use super::*;

use std::{cell::Cell, convert::Infallible};

use approx::assert_abs_diff_eq;
use thiserror::Error;

use crate::multi::bowls::{self, Bowl};

fn solver<F: Objective<2>>(objective: F, start: [f64; 2]) -> NelderMead<F, 2> {
    let mut nm = NelderMead::new();
    nm.set_objective(objective).unwrap();
    nm.set_simplex(&Simplex::from_start(start, [1.0, 1.0]).unwrap())
        .unwrap();
    nm
}

#[test]
fn reference_bowl() {
    let mut nm = solver(bowls::reference(), [0.0, 0.0]);
    nm.set_tolerance(1e-10).unwrap();

    let solution = nm.minimize(()).unwrap();

    assert_abs_diff_eq!(solution.x[0], 2.0, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.x[1], -1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.objective, 0.5, epsilon = 1e-8);
    assert!(solution.iters < 500, "took {} iterations", solution.iters);
    assert_eq!(nm.state(), State::ResultAvailable);
}

fn random_bowls<const N: usize>() {
    let mut rng = bowls::rng();
    for _ in 0..10 {
        let bowl = Bowl::<N>::random(&mut rng);
        let start = Bowl::<N>::random(&mut rng).minimum;

        let mut nm = NelderMead::new();
        nm.set_objective(bowl).unwrap();
        nm.set_simplex(&Simplex::from_start(start, [1.0; N]).unwrap())
            .unwrap();
        let solution = nm.minimize(()).unwrap();

        assert_abs_diff_eq!(solution.objective, bowl.offset, epsilon = 1e-6);
    }
}

#[test]
fn random_bowls_in_two_to_four_dimensions() {
    random_bowls::<2>();
    random_bowls::<3>();
    random_bowls::<4>();
}

#[test]
fn coupled_quadratic() {
    let mut nm = solver(bowls::coupled, [-3.0, 4.0]);

    let solution = nm.minimize(()).unwrap();

    assert_abs_diff_eq!(solution.objective, 3.0, epsilon = 1e-7);
    assert_abs_diff_eq!(solution.x[0], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(solution.x[1], -2.0, epsilon = 1e-3);
}

#[test]
fn single_variable() {
    let parabola = |x: &[f64; 1]| Ok::<_, Infallible>((x[0] - 3.0).powi(2) / 1.5 + 7.0);

    let mut nm = NelderMead::new();
    nm.set_objective(parabola).unwrap();
    nm.set_simplex(&Simplex::from_start([-10.0], [1.0]).unwrap())
        .unwrap();
    nm.set_tolerance(1e-12).unwrap();
    let solution = nm.minimize(()).unwrap();

    assert_abs_diff_eq!(solution.x[0], 3.0, epsilon = 1e-4);
    assert_abs_diff_eq!(solution.objective, 7.0, epsilon = 1e-10);
}

#[test]
fn events_report_moves() {
    let mut moves = Vec::new();
    let mut best = f64::INFINITY;
    let observer = |event: &Event<'_, 2>| {
        assert_eq!(event.state, State::Locked);
        assert_eq!(event.simplex.len(), 3);
        assert_eq!(event.iter, moves.len() + 1);
        assert!(event.point.objective <= best);
        best = event.point.objective;
        moves.push(event.movement);
    };

    let mut nm = solver(bowls::reference(), [0.0, 0.0]);
    let solution = nm.minimize(observer).unwrap();

    // From (0, 0) the reflected point (1, -1) beats every vertex, and the
    // expanded point (1.5, -2) beats the reflected one.
    assert_eq!(moves[0], Move::Expand);
    assert!(moves.contains(&Move::Reflect));
    assert!(
        moves
            .iter()
            .any(|m| matches!(m, Move::ContractInside | Move::ContractOutside | Move::Shrink))
    );
    assert_eq!(moves.len(), solution.iters);
}

#[test]
fn simplex_needs_objective() {
    let mut nm: NelderMead<Bowl<2>, 2> = NelderMead::new();
    let simplex = Simplex::from_start([0.0, 0.0], [1.0, 1.0]).unwrap();

    assert!(matches!(
        nm.set_simplex(&simplex),
        Err(Error::NotReady(Missing::Objective))
    ));
    assert!(matches!(
        nm.simplex(),
        Err(Error::NotReady(Missing::Simplex))
    ));
    assert_eq!(nm.state(), State::NotReady);

    nm.set_objective(bowls::reference()).unwrap();
    nm.set_simplex(&simplex).unwrap();
    assert_eq!(nm.state(), State::Ready);

    let vertices = nm.simplex().unwrap();
    assert_eq!(vertices.len(), 3);
    assert_abs_diff_eq!(vertices[1].x[0], 1.0);
    assert_abs_diff_eq!(
        vertices[1].objective,
        (1.0_f64 / 1.2).powi(2) + (1.0_f64 / 1.8).powi(2) + 0.5,
        epsilon = 1e-12
    );
}

#[test]
fn replacing_the_objective_discards_the_simplex() {
    let mut nm = solver(bowls::reference(), [0.0, 0.0]);

    nm.set_objective(bowls::reference()).unwrap();

    assert!(matches!(
        nm.minimize(()),
        Err(Error::NotReady(Missing::Simplex))
    ));
}

#[test]
fn rerun_from_result_is_stable() {
    let mut nm = solver(bowls::coupled, [-3.0, 4.0]);
    let first = nm.minimize(()).unwrap();
    assert_eq!(*nm.result().unwrap(), first);

    // The evolved simplex is kept and has already converged.
    let second = nm.minimize(()).unwrap();

    assert_eq!(second.iters, 0);
    assert_eq!(second.x, first.x);
    assert_eq!(nm.simplex().unwrap()[0].x, first.x);
}

#[test]
fn failure_keeps_the_evolved_simplex() {
    let mut nm = solver(bowls::reference(), [0.0, 0.0]);
    let initial_best = nm
        .simplex()
        .unwrap()
        .iter()
        .map(|p| p.objective)
        .fold(f64::INFINITY, f64::min);
    nm.set_config(Config::new(1e-10, 3).unwrap()).unwrap();

    let err = nm.minimize(()).unwrap_err();

    assert!(matches!(err, Error::Failed(Failure::MaxIters { max_iters: 3 })));
    assert!(matches!(nm.result(), Err(Error::NotReady(Missing::Result))));
    let simplex = nm.simplex().unwrap();
    assert!(simplex[0].objective < initial_best);
    assert!(simplex.windows(2).all(|w| w[0].objective <= w[1].objective));
}

#[test]
fn nan_objective_is_a_failure() {
    let bowl = bowls::reference();
    let holed = move |x: &[f64; 2]| {
        if x[1] < -1.5 {
            Ok(f64::NAN)
        } else {
            minima_core::Objective::value(&bowl, x)
        }
    };

    let mut nm = solver(holed, [0.0, 0.0]);

    assert!(matches!(
        nm.minimize(()),
        Err(Error::Failed(Failure::NotANumber))
    ));
    assert_eq!(nm.state(), State::Ready);
}

#[derive(Debug, Error)]
#[error("objective refused at {0:?}")]
struct Refused([f64; 2]);

#[test]
fn evaluation_error_leaves_simplex_unset() {
    let picky = |x: &[f64; 2]| {
        if x[0] > 0.5 {
            Err(Refused(*x))
        } else {
            Ok(x[0] * x[0] + x[1] * x[1])
        }
    };

    let mut nm = NelderMead::new();
    nm.set_objective(picky).unwrap();
    let err = nm
        .set_simplex(&Simplex::from_start([0.0, 0.0], [1.0, 1.0]).unwrap())
        .unwrap_err();

    assert_eq!(err.kind(), crate::ErrorKind::Evaluation);
    assert!(matches!(
        nm.simplex(),
        Err(Error::NotReady(Missing::Simplex))
    ));
    let source = std::error::Error::source(&err).and_then(|e| e.downcast_ref::<Refused>());
    assert!(matches!(source, Some(Refused([x, _])) if *x == 1.0));
}

#[test]
fn evaluation_error_mid_run_keeps_simplex_ordered() {
    for budget in 4..60 {
        let calls = Cell::new(0);
        let limited = |x: &[f64; 2]| {
            calls.set(calls.get() + 1);
            if calls.get() > budget {
                Err(Refused(*x))
            } else {
                bowls::rosenbrock(x).map_err(|never| match never {})
            }
        };

        let mut nm = solver(limited, [-1.2, 1.0]);
        let err = nm.minimize(()).unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::Evaluation, "budget {budget}");
        let simplex = nm.simplex().unwrap();
        assert!(
            simplex.windows(2).all(|w| w[0].objective <= w[1].objective),
            "budget {budget}: {simplex:?}"
        );
    }
}

#[test]
fn setters_rejected_while_locked() {
    let mut nm = solver(bowls::reference(), [0.0, 0.0]);
    nm.force_lock();

    assert_eq!(nm.state(), State::Locked);
    assert!(nm.is_locked());
    assert!(matches!(
        nm.set_objective(bowls::reference()),
        Err(Error::Locked)
    ));
    assert!(matches!(
        nm.set_simplex(&Simplex::from_start([0.0, 0.0], [1.0, 1.0]).unwrap()),
        Err(Error::Locked)
    ));
    assert!(matches!(nm.set_tolerance(1e-3), Err(Error::Locked)));
    assert!(matches!(nm.minimize(()), Err(Error::Locked)));
}
