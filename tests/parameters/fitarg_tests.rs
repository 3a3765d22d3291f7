use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{FitArg, FitArgValue, MinOptError, Minuit, NumericalWarning, Strategy};

#[test]
fn test_keywords_set_parameters_and_config() {
    let fitarg = FitArg::new()
        .with_value("x", 1.0)
        .with_error("x", 0.5)
        .with_limit("y", Some(0.0), None)
        .with_fix("y", true)
        .with_errordef(0.5)
        .with_strategy(Strategy::High)
        .with_tol(0.01);
    let m = Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg).unwrap();

    assert_eq!(m.values()["x"], 1.0);
    assert_eq!(m.errors()["x"], 0.5);
    let y = m.parameters().get("y").unwrap();
    assert!(y.is_fixed());
    assert_eq!(y.limits(), Some((Some(0.0), None)));
    assert_eq!(m.config().errordef(), 0.5);
    assert_eq!(m.config().strategy(), Strategy::High);
    assert_eq!(m.config().tol(), 0.01);
}

#[test]
fn test_unknown_keyword_rejected() {
    let fitarg = FitArg::new().with_value("x", 1.0).with_error("z", 1.0);
    let result = Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg);
    assert!(matches!(result, Err(MinOptError::ConfigError(_))));

    let mut fitarg = FitArg::new();
    fitarg.insert("tolerance", 0.1);
    let result = Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg);
    assert!(matches!(result, Err(MinOptError::ConfigError(_))));
}

#[test]
fn test_wrong_value_type_rejected() {
    let mut fitarg = FitArg::new();
    fitarg.insert("fix_x", 1.0);
    assert!(matches!(
        Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg),
        Err(MinOptError::ConfigError(_))
    ));

    let mut fitarg = FitArg::new();
    fitarg.insert("strategy", 1.5);
    assert!(matches!(
        Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg),
        Err(MinOptError::ConfigError(_))
    ));
}

#[test]
fn test_pedantic_reports_missing_values() {
    let m = Minuit::builder(func3_objective(), &["x", "y"])
        .value("x", 1.0)
        .error("x", 0.1)
        .pedantic(true)
        .build()
        .unwrap();
    let warnings = m.warnings();
    assert!(warnings
        .iter()
        .any(|w| matches!(w, NumericalWarning::MissingInitialValue { name } if name == "y")));
    assert!(warnings
        .iter()
        .any(|w| matches!(w, NumericalWarning::MissingInitialError { name } if name == "y")));
    assert!(!warnings
        .iter()
        .any(|w| matches!(w, NumericalWarning::MissingInitialValue { name } if name == "x")));

    let quiet = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    assert!(quiet.warnings().is_empty());
}

#[test]
fn test_fitarg_reproduces_fit() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .value("y", 10.0)
        .fix("y")
        .limit("z", Some(0.0), None)
        .build()
        .unwrap();
    m.migrad().unwrap();
    let fitarg = m.fitarg();

    assert_eq!(fitarg.get("fix_y"), Some(&FitArgValue::Bool(true)));
    assert_eq!(fitarg.get("limit_z"), Some(&FitArgValue::Limit(Some(0.0), None)));
    match fitarg.get("x") {
        Some(FitArgValue::Number(v)) => assert_relative_eq!(*v, 2.0, epsilon = 1e-3),
        other => panic!("unexpected value for x: {:?}", other),
    }

    let json = fitarg.to_json().unwrap();
    let restored = FitArg::from_json(&json).unwrap();
    assert_eq!(restored.len(), fitarg.len());
    assert_eq!(restored.get("fix_y"), Some(&FitArgValue::Bool(true)));

    let m2 = Minuit::with_fitarg(func4_objective(), &["x", "y", "z"], restored).unwrap();
    assert_eq!(m2.list_of_fixed_param(), vec!["y"]);
    assert_relative_eq!(m2.values()["z"], m.values()["z"], epsilon = 1e-12);
    assert_relative_eq!(m2.errors()["x"], m.errors()["x"], epsilon = 1e-12);
}

#[test]
fn test_fitarg_from_json_file_contents() {
    let json = r#"{
        "x": 1.0,
        "error_x": 0.5,
        "limit_y": [null, 3.0],
        "fix_y": false,
        "errordef": 1.0,
        "max_calls": 500
    }"#;
    let fitarg = FitArg::from_json(json).unwrap();
    let m = Minuit::with_fitarg(func3_objective(), &["x", "y"], fitarg).unwrap();
    assert_eq!(m.config().max_calls(), Some(500));
    assert_eq!(
        m.parameters().get("y").unwrap().limits(),
        Some((None, Some(3.0)))
    );
}

#[test]
fn test_fitarg_snapshot_before_fit() {
    let m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .value("x", 2.5)
        .limit("x", Some(3.0), Some(2.0))
        .value("y", 10.0)
        .fix("y")
        .error("z", 0.3)
        .limit("z", None, Some(4.0))
        .build()
        .unwrap();
    let fitarg = m.fitarg();

    assert_eq!(fitarg.get("x"), Some(&FitArgValue::Number(2.5)));
    assert_eq!(
        fitarg.get("limit_x"),
        Some(&FitArgValue::Limit(Some(3.0), Some(2.0)))
    );
    assert_eq!(fitarg.get("fix_y"), Some(&FitArgValue::Bool(true)));
    assert_eq!(fitarg.get("fix_x"), Some(&FitArgValue::Bool(false)));
    assert_eq!(fitarg.get("error_z"), Some(&FitArgValue::Number(0.3)));
    assert_eq!(fitarg.get("limit_z"), Some(&FitArgValue::Limit(None, Some(4.0))));
    assert_eq!(fitarg.get("limit_y"), None);

    let restored = FitArg::from_json(&fitarg.to_json().unwrap()).unwrap();
    assert_eq!(restored, fitarg);

    let mut m2 = Minuit::with_fitarg(func4_objective(), &["x", "y", "z"], restored).unwrap();
    assert_eq!(m2.fitarg(), fitarg);
    assert_eq!(m2.values(), m.values());
    assert_eq!(m2.errors(), m.errors());
    assert_eq!(m2.list_of_fixed_param(), vec!["y"]);
    assert_eq!(
        m2.parameters().get("x").unwrap().limits(),
        Some((Some(3.0), Some(2.0)))
    );

    // The inverted limit survives the round trip and stops the fit
    assert!(matches!(m2.migrad(), Err(MinOptError::BoundsViolation(_))));
}
