//! Tests for MIGRAD through the `Minuit` facade

use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{
    FitStatus, FnObjective, MinOptError, MinimizationStatus, Minuit, MinuitConfig, Objective,
    Strategy,
};
use ndarray::Array1;

#[test]
fn test_quadratic_minimum() {
    let mut m = Minuit::new(FnObjective::new(func1), &["x", "y"]).unwrap();
    let fit = m.migrad().unwrap();

    assert!(fit.is_valid());
    assert_eq!(fit.minimization, MinimizationStatus::Converged);
    assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-4);
    assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-4);
    assert_relative_eq!(m.fval().unwrap(), 10.0, epsilon = 1e-8);
    assert!(m.matrix_accurate());
    assert!(m.edm().unwrap() < m.config().edm_max());
    assert!(m.nfcn() > 0);
}

#[test]
fn test_quadratic_minimum_with_gradient() {
    let f = FnObjective::new(func1).with_gradient(|p: &Array1<f64>| {
        Ok(ndarray::array![2.0 * (p[0] - 2.0), 2.0 * (p[1] - 5.0)])
    });
    assert!(f.has_custom_gradient());

    let mut m = Minuit::new(f, &["x", "y"]).unwrap();
    let fit = m.migrad().unwrap();
    assert!(fit.is_valid());
    assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-4);
    assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-4);
    assert!(m.matrix_accurate());
}

#[test]
fn test_parameter_list() {
    let f = FnObjective::new(|p: &Array1<f64>| {
        Ok(0.2 * (p[0] - 2.0).powi(2) + 0.1 * (p[1] - 5.0).powi(2) + 0.25 * (p[2] - 7.0).powi(2) + 10.0)
    })
    .with_parameter_count(3);

    let mut m = Minuit::from_parameter_list(f, &[1.0, 1.0, 1.0]).unwrap();
    assert_eq!(m.list_of_vary_param(), vec!["p0", "p1", "p2"]);
    m.migrad().unwrap();

    let args = m.args();
    assert_relative_eq!(args[0], 2.0, epsilon = 1e-3);
    assert_relative_eq!(args[1], 5.0, epsilon = 1e-3);
    assert_relative_eq!(args[2], 7.0, epsilon = 1e-3);
    assert_relative_eq!(m.errors()["p1"], 10.0_f64.sqrt(), epsilon = 1e-3);
}

fn check_func4<F: Objective>(fcn: F) {
    let mut m = Minuit::new(fcn, &["x", "y", "z"]).unwrap();
    m.migrad().unwrap();

    let values = m.values();
    assert_relative_eq!(values["x"], 2.0, epsilon = 1e-3);
    assert_relative_eq!(values["y"], 5.0, epsilon = 1e-3);
    assert_relative_eq!(values["z"], 7.0, epsilon = 1e-3);

    let errors = m.errors();
    assert_relative_eq!(errors["x"], 5.0_f64.sqrt(), epsilon = 1e-3);
    assert_relative_eq!(errors["y"], 10.0_f64.sqrt(), epsilon = 1e-3);
    assert_relative_eq!(errors["z"], 2.0, epsilon = 1e-3);
}

#[test]
fn test_three_parameter_errors() {
    check_func4(func4_objective());
    check_func4(func4_with_gradient());
}

#[test]
fn test_fixed_parameter() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .value("y", 10.0)
        .fix("y")
        .build()
        .unwrap();
    m.migrad().unwrap();

    assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-3);
    assert_eq!(m.values()["y"], 10.0);
    assert_relative_eq!(m.values()["z"], 7.0, epsilon = 1e-3);
    assert_relative_eq!(m.fval().unwrap(), 12.5, epsilon = 1e-6);

    let free = m.list_of_vary_param();
    let fixed = m.list_of_fixed_param();
    assert!(free.contains(&"x".to_string()));
    assert!(!fixed.contains(&"x".to_string()));
    assert!(fixed.contains(&"y".to_string()));
    assert!(!free.contains(&"y".to_string()));

    // Covariance only covers the free parameters
    assert_eq!(m.covariance().unwrap().names(), &["x".to_string(), "z".to_string()]);
}

#[test]
fn test_release_and_refit() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .value("y", 10.0)
        .fix("y")
        .build()
        .unwrap();
    m.migrad().unwrap();
    m.release("y").unwrap();
    assert!(m.fmin().is_err());

    m.migrad().unwrap();
    assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-3);
    assert_relative_eq!(m.fval().unwrap(), 10.0, epsilon = 1e-6);
}

#[test]
fn test_strategies() {
    for strategy in [Strategy::Low, Strategy::Medium, Strategy::High] {
        let mut m = Minuit::builder(func3_with_gradient(), &["x", "y"])
            .strategy(strategy)
            .build()
            .unwrap();
        let fit = m.migrad().unwrap();
        assert!(fit.minimization.is_converged(), "{:?}", strategy);
        assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-3);
        assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-3);
    }
}

#[test]
fn test_call_limit() {
    let rosenbrock = FnObjective::new(|p: &Array1<f64>| {
        Ok((1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0] * p[0]).powi(2))
    });
    let mut m = Minuit::builder(rosenbrock, &["x", "y"])
        .value("x", -1.2)
        .value("y", 1.0)
        .max_calls(20)
        .build()
        .unwrap();
    let fit = m.migrad().unwrap();

    assert_eq!(fit.status, FitStatus::NotConverged);
    assert_eq!(fit.minimization, MinimizationStatus::CallLimitReached);
    assert!(!m.migrad_ok());
    assert!(matches!(
        m.minos(None, 1.0),
        Err(MinOptError::PreconditionError(_))
    ));
}

#[test]
fn test_zero_curvature_does_not_crash() {
    let f = FnObjective::new(|p: &Array1<f64>| Ok((p[0] * p[1]).powi(2)));
    let mut m = Minuit::new(f, &["x", "y"]).unwrap();
    let fit = m.migrad().unwrap();

    assert_eq!(fit.status, FitStatus::HesseFailed);
    assert!(!m.migrad_ok());
    assert!(!m.matrix_accurate());
    assert!(m.matrix(false).is_err());
    assert!(m
        .warnings()
        .iter()
        .any(|w| matches!(w, minopt_rs::NumericalWarning::HesseFailed { .. })));
}

#[test]
fn test_objective_error_propagates() {
    let f = FnObjective::new(|p: &Array1<f64>| {
        if p[0] > 0.5 {
            Err(MinOptError::FunctionEvaluation("out of domain".to_string()))
        } else {
            Ok(p[0] * p[0])
        }
    });
    let mut m = Minuit::builder(f, &["x"]).value("x", 3.0).build().unwrap();
    assert!(matches!(
        m.migrad(),
        Err(MinOptError::FunctionEvaluation(_))
    ));
}

#[test]
fn test_config_setters() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.set_strategy(Strategy::High);
    m.set_tol(1e-4).unwrap();
    m.set_print_level(0);
    assert!(m.set_tol(-1.0).is_err());
    assert!(m.set_errordef(0.0).is_err());
    assert_eq!(m.config().strategy(), Strategy::High);
    assert_eq!(m.config().tol(), 1e-4);

    m.set_config(MinuitConfig::default());
    assert_eq!(m.config().strategy(), Strategy::Medium);
}
