use crate::test_helpers::*;
use approx::assert_relative_eq;
use minopt_rs::{FnObjective, MinOptError, Minuit, ScanBound};
use ndarray::Array1;

fn correlated(p: &Array1<f64>) -> minopt_rs::Result<f64> {
    let (dx, dy) = (p[0] - 1.0, p[1] - 2.0);
    Ok(dx * dx + dy * dy + dx * dy)
}

#[test]
fn test_mncontour_matches_minos() {
    for sigma in [1.0, 2.0] {
        let mut m = Minuit::builder(FnObjective::new(correlated), &["x", "y"])
            .value("x", 1.0)
            .value("y", 2.0)
            .error("x", 3.0)
            .build()
            .unwrap();
        m.migrad().unwrap();
        let fmin = m.fval().unwrap();
        let ex = m.minos(Some("x"), sigma).unwrap().unwrap().remove("x").unwrap();
        let ey = m.minos(Some("y"), sigma).unwrap().unwrap().remove("y").unwrap();

        let (mx, my, points) = m.mncontour("x", "y", 30, sigma).unwrap();
        assert_eq!(points.len(), 30);

        // Marginal variance of x and y is 4/3
        let expected = sigma * (4.0_f64 / 3.0).sqrt();
        assert_relative_eq!(mx.upper, expected, epsilon = 1e-2 * sigma);
        assert_relative_eq!(mx.lower, -expected, epsilon = 1e-2 * sigma);
        assert_relative_eq!(my.upper, expected, epsilon = 1e-2 * sigma);

        // The first vertex is the upper MINOS crossing of x
        assert_relative_eq!(points[0].0, mx.min + mx.upper, epsilon = 1e-2 * sigma);

        let level = sigma * sigma;
        for &(x, y) in &points {
            let f = correlated(&ndarray::array![x, y]).unwrap() - fmin;
            assert_relative_eq!(f, level, epsilon = 2e-2 * level);
        }

        // Extremes of the polygon agree with MINOS run on its own
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let xmax = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let xmin = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let ymax = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let ymin = ys.iter().copied().fold(f64::INFINITY, f64::min);
        assert_relative_eq!(xmax, ex.min + ex.upper, epsilon = 2e-2 * sigma);
        assert_relative_eq!(xmin, ex.min + ex.lower, epsilon = 2e-2 * sigma);
        assert_relative_eq!(ymax, ey.min + ey.upper, epsilon = 2e-2 * sigma);
        assert_relative_eq!(ymin, ey.min + ey.lower, epsilon = 2e-2 * sigma);
        assert_relative_eq!(mx.upper, ex.upper, epsilon = 1e-4);
        assert_relative_eq!(my.lower, ey.lower, epsilon = 1e-4);
    }
}

#[test]
fn test_mncontour_preconditions() {
    let mut m = Minuit::builder(func4_objective(), &["x", "y", "z"])
        .fix("z")
        .build()
        .unwrap();
    assert!(matches!(
        m.mncontour("x", "y", 20, 1.0),
        Err(MinOptError::PreconditionError(_))
    ));

    m.migrad().unwrap();
    assert!(m.mncontour("x", "z", 20, 1.0).is_err());
    assert!(m.mncontour("x", "x", 20, 1.0).is_err());
    assert!(matches!(
        m.mncontour("x", "y", 3, 1.0),
        Err(MinOptError::InvalidInput(_))
    ));
}

#[test]
fn test_mncontour_profiles_third_parameter() {
    let mut m = Minuit::new(func4_objective(), &["x", "y", "z"]).unwrap();
    m.migrad().unwrap();
    let (_, _, points) = m.mncontour("x", "z", 12, 1.0).unwrap();

    // z is profiled: along the contour y stays at its minimum, so the
    // ellipse is 0.2 dx^2 + 0.25 dz^2 = 1
    for &(x, z) in &points {
        let level = 0.2 * (x - 2.0).powi(2) + 0.25 * (z - 7.0).powi(2);
        assert_relative_eq!(level, 1.0, epsilon = 2e-2);
    }
}

#[test]
fn test_profile_scan() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let scan = m.profile("x", 21, ScanBound::Sigma(2.0), true).unwrap();
    assert_eq!(scan.values.len(), 21);
    let (xmin, fmin) = scan.minimum().unwrap();
    assert_relative_eq!(xmin, 2.0, epsilon = 1e-3);
    assert_relative_eq!(fmin, 0.0, epsilon = 1e-6);
    // At +2 sigma the plain scan sits 4 units above the minimum
    assert_relative_eq!(scan.fvals[20], 4.0, epsilon = 1e-2);

    let range = m.profile("y", 5, ScanBound::Range(3.0, 7.0), false).unwrap();
    assert_eq!(range.values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_relative_eq!(range.fvals[0], 14.0, epsilon = 1e-6);

    assert!(m.profile("x", 1, ScanBound::default(), false).is_err());
}

#[test]
fn test_mnprofile_scan() {
    let f = FnObjective::new(correlated);
    let mut m = Minuit::new(f, &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let scan = m.mnprofile("x", 11, ScanBound::Range(-1.0, 3.0), true).unwrap();
    assert!(scan.converged.iter().all(|&c| c));
    for (&x, &f) in scan.values.iter().zip(&scan.fvals) {
        // Minimizing over y leaves 0.75 dx^2
        assert_relative_eq!(f, 0.75 * (x - 1.0).powi(2), epsilon = 1e-3);
    }
}

#[test]
fn test_contour_grid() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let grid = m
        .contour("x", "y", 11, ScanBound::Sigma(1.0), true)
        .unwrap();
    assert_eq!(grid.fvals.dim(), (11, 11));
    assert_eq!(grid.x_name, "x");
    assert_relative_eq!(grid.fvals[[5, 5]], 0.0, epsilon = 1e-6);
    assert_relative_eq!(grid.fvals[[10, 5]], 1.0, epsilon = 1e-2);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_scans_match_serial() {
    let mut m = Minuit::new(func3_objective(), &["x", "y"]).unwrap();
    m.migrad().unwrap();

    let serial = m.profile("x", 25, ScanBound::Sigma(2.0), true).unwrap();
    let parallel = m.profile_parallel("x", 25, ScanBound::Sigma(2.0), true).unwrap();
    assert_eq!(parallel, serial);

    let serial = m.contour("x", "y", 12, ScanBound::Range(0.0, 6.0), false).unwrap();
    let parallel = m
        .contour_parallel("x", "y", 12, ScanBound::Range(0.0, 6.0), false)
        .unwrap();
    assert_eq!(parallel.fvals, serial.fvals);
    assert_eq!(parallel.x, serial.x);
    assert_eq!(parallel.y, serial.y);
}
