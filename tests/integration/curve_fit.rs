use approx::assert_relative_eq;
use minopt_rs::{FnObjective, Minuit, Result, Strategy};
use ndarray::Array1;

const DATA_Y: [f64; 22] = [
    0.552, 0.735, 0.846, 0.875, 1.059, 1.675, 1.622, 2.928, 3.372, 2.377, 4.307, 2.784, 3.328,
    2.143, 1.402, 1.44, 1.313, 1.682, 0.886, 0.0, 0.266, 0.3,
];

/// Lorentzian-like peak `a / ((x - m)^2 + s^2)`
fn peak(x: f64, a: f64, m: f64, s: f64) -> f64 {
    a / ((x - m).powi(2) + s * s)
}

fn chi2(p: &Array1<f64>) -> Result<f64> {
    let (a, m, s) = (p[0], p[1], p[2]);
    Ok(DATA_Y
        .iter()
        .enumerate()
        .map(|(i, &y)| (peak(i as f64, a, m, s) - y).powi(2))
        .sum())
}

#[test]
fn test_peak_fit() {
    for strategy in [Strategy::Medium, Strategy::High] {
        let mut m = Minuit::builder(FnObjective::new(chi2), &["a", "m", "s"])
            .value("a", 60.0)
            .error("a", 1.0)
            .value("m", 10.0)
            .error("m", 0.5)
            .value("s", 4.0)
            .error("s", 0.5)
            .errordef(0.01)
            .strategy(strategy)
            .build()
            .unwrap();
        let fit = m.migrad().unwrap();

        assert!(fit.is_valid(), "{:?}: {}", strategy, fit);
        let values = m.values();
        // Reference optimum A = 64.376, m = 9.839, s = 4.268 to one decimal
        assert_eq!((10.0 * values["a"]).round(), 644.0);
        assert_eq!((10.0 * values["m"]).round(), 98.0);
        assert_eq!((10.0 * values["s"].abs()).round(), 43.0);
    }
}

#[test]
fn test_peak_fit_errors_are_consistent() {
    let mut m = Minuit::builder(FnObjective::new(chi2), &["a", "m", "s"])
        .value("a", 60.0)
        .value("m", 10.0)
        .value("s", 4.0)
        .errordef(0.01)
        .build()
        .unwrap();
    m.migrad().unwrap();
    let cov = m.hesse().unwrap();
    assert!(cov.is_accurate());

    let merrors = m.minos(Some("m"), 1.0).unwrap().unwrap();
    let me = &merrors["m"];
    assert!(me.is_valid());
    // Nearly parabolic in m: MINOS agrees with HESSE to a few percent
    let parabolic = m.errors()["m"];
    assert_relative_eq!(me.upper, parabolic, max_relative = 0.1);
    assert_relative_eq!(-me.lower, parabolic, max_relative = 0.1);
}
