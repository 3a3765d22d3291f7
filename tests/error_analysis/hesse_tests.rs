use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{CovarianceStatus, FitStatus, FnObjective, MinOptError, Minuit};
use ndarray::Array1;

#[test]
fn test_matrix_after_migrad() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let cov = m.matrix(false).unwrap();
    assert_relative_eq!(cov[[0, 0]], 5.0, epsilon = 1e-2);
    assert_relative_eq!(cov[[0, 1]], 0.0, epsilon = 1e-2);
    assert_relative_eq!(cov[[1, 1]], 1.0, epsilon = 1e-2);

    let corr = m.matrix(true).unwrap();
    assert_relative_eq!(corr[[0, 0]], 1.0, epsilon = 1e-9);
    assert_relative_eq!(corr[[0, 1]], 0.0, epsilon = 1e-2);
    assert_relative_eq!(corr[[1, 1]], 1.0, epsilon = 1e-9);
}

#[test]
fn test_hesse_after_migrad() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();
    let calls = m.nfcn();

    let cov = m.hesse().unwrap();
    assert_eq!(cov.status(), CovarianceStatus::Accurate);
    assert_relative_eq!(cov.get("x", "x").unwrap(), 5.0, epsilon = 1e-3);
    assert_relative_eq!(cov.get("y", "y").unwrap(), 1.0, epsilon = 1e-3);
    assert_relative_eq!(cov.get("x", "y").unwrap(), 0.0, epsilon = 1e-3);
    assert_relative_eq!(cov.standard_errors()[0], 5.0_f64.sqrt(), epsilon = 1e-3);
    // Numerical second derivatives cost function calls
    assert!(m.nfcn() > calls);
    assert_eq!(m.status(), FitStatus::Converged);
}

#[test]
fn test_hesse_with_analytic_gradient() {
    let mut m = Minuit::new(func3_with_gradient(), &["x", "y"]).unwrap();
    m.migrad().unwrap();
    let calls = m.nfcn();

    // Second derivatives come from differences of the gradient, not of the function
    let cov = m.hesse().unwrap();
    assert_eq!(cov.status(), CovarianceStatus::Accurate);
    assert_relative_eq!(cov.get("x", "x").unwrap(), 5.0, epsilon = 1e-3);
    assert_relative_eq!(cov.get("y", "y").unwrap(), 1.0, epsilon = 1e-3);
    assert_eq!(m.nfcn(), calls);
}

#[test]
fn test_hesse_requires_migrad() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    assert!(matches!(m.hesse(), Err(MinOptError::PreconditionError(_))));

    m.migrad().unwrap();
    m.fix("x").unwrap();
    assert!(matches!(m.hesse(), Err(MinOptError::PreconditionError(_))));
}

#[test]
fn test_errordef_scales_errors() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();
    let err_x = m.errors()["x"];

    m.set_errordef(4.0).unwrap();
    assert_relative_eq!(m.errors()["x"], 2.0 * err_x, epsilon = 1e-9);
    assert_relative_eq!(m.matrix(false).unwrap()[[0, 0]], 4.0 * err_x * err_x, epsilon = 1e-6);

    m.hesse().unwrap();
    assert_relative_eq!(m.errors()["x"], 2.0 * 5.0_f64.sqrt(), epsilon = 1e-3);
}

#[test]
fn test_hesse_failure_keeps_matrix_unusable() {
    let f = FnObjective::new(|p: &Array1<f64>| Ok((p[0] * p[1]).powi(2)));
    let mut m = Minuit::new(f, &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let cov = m.hesse().unwrap();
    assert_eq!(cov.status(), CovarianceStatus::HesseFailed);
    assert!(!m.matrix_accurate());
    assert!(matches!(m.matrix(true), Err(MinOptError::InvalidState(_))));
}

#[test]
fn test_bounded_parameter_covariance() {
    // Minimum well inside the limits: the transform must not distort the error
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .limit("x", Some(-10.0), Some(10.0))
        .limit("y", Some(0.0), None)
        .value("y", 1.0)
        .tol(1e-4)
        .build()
        .unwrap();
    m.migrad().unwrap();
    m.hesse().unwrap();

    assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-3);
    assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-3);
    assert_relative_eq!(m.errors()["x"], 5.0_f64.sqrt(), epsilon = 1e-2);
    assert_relative_eq!(m.errors()["y"], 1.0, epsilon = 1e-2);
}
