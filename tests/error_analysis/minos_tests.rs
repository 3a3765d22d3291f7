use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{FnObjective, MinOptError, Minuit, NumericalWarning};
use ndarray::Array1;

#[test]
fn test_minos_all_parameters() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();
    let merrors = m.minos(None, 1.0).unwrap().unwrap();

    assert_eq!(merrors.len(), 2);
    let x = &merrors["x"];
    assert!(x.is_valid());
    assert_relative_eq!(x.lower, -(5.0_f64.sqrt()), epsilon = 1e-2);
    assert_relative_eq!(x.upper, 5.0_f64.sqrt(), epsilon = 1e-2);
    let y = &merrors["y"];
    assert_relative_eq!(y.lower, -1.0, epsilon = 1e-2);
    assert_relative_eq!(y.upper, 1.0, epsilon = 1e-2);

    assert_eq!(m.merrors().len(), 2);
}

#[test]
fn test_minos_single_parameter_and_sigma() {
    let mut m = Minuit::new(func4_objective(), &["x", "y", "z"]).unwrap();
    m.migrad().unwrap();

    let one = m.minos(Some("y"), 1.0).unwrap().unwrap();
    assert_eq!(one.len(), 1);
    assert_relative_eq!(one["y"].upper, 10.0_f64.sqrt(), epsilon = 1e-2);

    let two = m.minos(Some("z"), 2.0).unwrap().unwrap();
    assert_relative_eq!(two["z"].lower, -4.0, epsilon = 2e-2);
    assert_relative_eq!(two["z"].upper, 4.0, epsilon = 2e-2);
    let (low, high) = two["z"].interval();
    assert_relative_eq!(low, 3.0, epsilon = 2e-2);
    assert_relative_eq!(high, 11.0, epsilon = 2e-2);

    // Results accumulate until the next MIGRAD
    assert_eq!(m.merrors().len(), 2);
    m.migrad().unwrap();
    assert!(m.merrors().is_empty());
}

#[test]
fn test_minos_with_fixed_parameter() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .value("y", 10.0)
        .fix("y")
        .build()
        .unwrap();
    m.migrad().unwrap();

    assert!(m.minos(Some("y"), 1.0).unwrap().is_none());
    assert!(m
        .warnings()
        .iter()
        .any(|w| matches!(w, NumericalWarning::FixedParameter { name } if name == "y")));

    let merrors = m.minos(None, 1.0).unwrap().unwrap();
    assert!(merrors.contains_key("x"));
    assert!(merrors.contains_key("z"));
    assert!(!merrors.contains_key("y"));
}

#[test]
fn test_minos_preconditions() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    assert!(matches!(
        m.minos(Some("x"), 1.0),
        Err(MinOptError::PreconditionError(_))
    ));

    m.migrad().unwrap();
    assert!(matches!(
        m.minos(Some("nope"), 1.0),
        Err(MinOptError::PreconditionError(_))
    ));
    assert!(matches!(
        m.minos(Some("x"), 0.0),
        Err(MinOptError::InvalidInput(_))
    ));
}

#[test]
fn test_minos_asymmetric() {
    // f = exp(x) - 2x: minimum at ln 2, steeper on the right
    let f = FnObjective::new(|p: &Array1<f64>| Ok(p[0].exp() - 2.0 * p[0]));
    let mut m = Minuit::builder(f, &["x"]).errordef(0.5).build().unwrap();
    m.migrad().unwrap();
    let me = m.minos(Some("x"), 1.0).unwrap().unwrap().remove("x").unwrap();

    assert!(me.is_valid());
    assert!(me.upper < -me.lower);
    let fmin = m.fval().unwrap();
    let at = |x: f64| x.exp() - 2.0 * x - fmin;
    assert_relative_eq!(at(me.min + me.upper), 0.5, epsilon = 5e-3);
    assert_relative_eq!(at(me.min + me.lower), 0.5, epsilon = 5e-3);
}

#[test]
fn test_minos_hits_limit() {
    let mut m = Minuit::builder(func3_objective(), &["x", "y"])
        .limit("x", None, Some(3.0))
        .build()
        .unwrap();
    m.migrad().unwrap();
    let me = m.minos(Some("x"), 1.0).unwrap().unwrap().remove("x").unwrap();

    assert!(me.at_upper_limit);
    assert!(!me.upper_valid);
    assert!(me.lower_valid);
    assert_relative_eq!(me.lower, -(5.0_f64.sqrt()), epsilon = 2e-2);
    assert!(m
        .warnings()
        .iter()
        .any(|w| matches!(w, NumericalWarning::MinosInvalid { side, .. } if *side == "upper")));
}
