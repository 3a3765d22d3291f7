use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::parameters::Parameter;
use minopt_rs::{MinOptError, Minuit, NumericalWarning, Parameters};

#[test]
fn test_defaults() {
    let m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    assert_eq!(m.values()["x"], 0.0);
    assert_eq!(m.errors()["y"], 1.0);
    assert_eq!(m.list_of_vary_param(), vec!["x", "y"]);
    assert!(m.list_of_fixed_param().is_empty());
    assert_eq!(m.parameters().len(), 2);
}

#[test]
fn test_duplicate_names_rejected() {
    let result = Minuit::new(func3_objective(), &["x", "x"]);
    assert!(matches!(result, Err(MinOptError::ConfigError(_))));
}

#[test]
fn test_set_value_and_error() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.set_value("x", 1.5).unwrap();
    m.set_error("x", 0.25).unwrap();
    assert_eq!(m.values()["x"], 1.5);
    assert_eq!(m.errors()["x"], 0.25);

    assert!(m.set_error("x", 0.0).is_err());
    assert!(m.set_error("x", -1.0).is_err());
    assert!(m.set_value("z", 1.0).is_err());
}

#[test]
fn test_set_value_discards_fit() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();
    assert!(m.fmin().is_ok());

    m.set_value("x", 0.0).unwrap();
    assert!(m.fmin().is_err());
    assert!(m.merrors().is_empty());
}

#[test]
fn test_reset_restores_initial_values() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .value("x", 1.0)
        .build()
        .unwrap();
    m.migrad().unwrap();
    assert!(approx_eq(m.values()["x"], 2.0, 1e-3));

    m.reset();
    assert_eq!(m.values()["x"], 1.0);
    assert_eq!(m.values()["y"], 0.0);
    assert!(m.fmin().is_err());
}

#[test]
fn test_start_value_outside_limits_is_clamped() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .value("x", 5.0)
        .limit("x", None, Some(1.0))
        .build()
        .unwrap();
    m.migrad().unwrap();

    assert_relative_eq!(m.values()["x"], 1.0, epsilon = 2e-3);
    assert!(m
        .warnings()
        .iter()
        .any(|w| matches!(w, NumericalWarning::ValueClamped { name, .. } if name == "x")));
}

#[test]
fn test_fit_leaves_limit_it_starts_on() {
    let limits = [(Some(1.0), Some(10.0)), (Some(1.0), None)];
    for (low, high) in limits {
        for error in [1.0, 0.25] {
            // Default start 0 lies below the lower limit 1
            let mut m = Minuit::builder(func3_objective(), &["x", "y"])
                .limit("x", low, high)
                .error("x", error)
                .tol(1e-4)
                .build()
                .unwrap();
            let fit = m.migrad().unwrap();

            assert!(fit.is_valid(), "{:?} {:?}: {}", low, high, fit);
            assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-2);
            assert_relative_eq!(fit.fval, 10.0, epsilon = 1e-4);
        }
    }

    // A value placed exactly on the limit moves off it as well
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .value("x", 1.0)
        .limit("x", Some(1.0), None)
        .tol(1e-4)
        .build()
        .unwrap();
    m.migrad().unwrap();
    assert_relative_eq!(m.values()["x"], 2.0, epsilon = 1e-2);
}

#[test]
fn test_parameters_store_round_trip() {
    let mut params = Parameters::new();
    params.add(Parameter::new("a", 1.0)).unwrap();
    params
        .add(Parameter::with_bounds("b", 2.0, 0.0, 10.0).unwrap())
        .unwrap();
    params.fix("a").unwrap();

    let json = params.to_json().unwrap();
    let restored = Parameters::from_json(&json).unwrap();
    assert_eq!(restored.names(), vec!["a", "b"]);
    assert!(restored.get("a").unwrap().is_fixed());
    assert_eq!(restored.get("b").unwrap().limits(), Some((Some(0.0), Some(10.0))));
    assert_eq!(restored.free_names(), vec!["b"]);
}
