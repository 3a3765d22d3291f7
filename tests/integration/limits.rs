use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{FitArg, MinOptError, Minuit};

#[test]
fn test_one_sided_limit_inactive() {
    // A limit far from the minimum must not move it
    let fitarg = FitArg::new()
        .with_value("x", 0.0)
        .with_value("y", 0.0)
        .with_value("z", 0.0)
        .with_limit("x", None, Some(9.0))
        .with_tol(1e-4);
    let mut limited = Minuit::with_fitarg(func4_objective(), &["x", "y", "z"], fitarg).unwrap();
    limited.migrad().unwrap();

    let mut free = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .tol(1e-4)
        .build()
        .unwrap();
    free.migrad().unwrap();

    for name in ["x", "y", "z"] {
        assert_relative_eq!(limited.values()[name], free.values()[name], epsilon = 1e-4);
    }
}

#[test]
fn test_one_sided_limit_active() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .limit("x", None, Some(1.0))
        .build()
        .unwrap();
    m.migrad().unwrap();

    assert_relative_eq!(m.values()["x"], 1.0, epsilon = 1e-3);
    assert_relative_eq!(m.values()["y"], 5.0, epsilon = 1e-3);
    assert_relative_eq!(m.values()["z"], 7.0, epsilon = 1e-3);
}

#[test]
fn test_two_sided_limit_active() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .limit("x", Some(-1.0), Some(1.0))
        .limit("y", Some(6.0), Some(8.0))
        .value("y", 7.0)
        .build()
        .unwrap();
    m.migrad().unwrap();

    assert_relative_eq!(m.values()["x"], 1.0, epsilon = 1e-3);
    assert_relative_eq!(m.values()["y"], 6.0, epsilon = 1e-3);
}

#[test]
fn test_inverted_limits_fail_at_fit_time() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .limit("x", Some(2.0), Some(1.0))
        .build()
        .unwrap();
    assert!(matches!(m.migrad(), Err(MinOptError::BoundsViolation(_))));
    assert!(m.fmin().is_err());
}

#[test]
fn test_all_parameters_fixed() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .value("x", 2.0)
        .value("y", 5.0)
        .fix("x")
        .fix("y")
        .build()
        .unwrap();
    let fit = m.migrad().unwrap();

    assert!(fit.minimization.is_converged());
    assert_eq!(fit.fval, 10.0);
    assert_eq!(m.nfcn(), 1);
}
