//! Parabolic line search along the MIGRAD step.

use crate::error::Result;
use crate::utils::Precision;
use ndarray::Array1;

const MAX_LAMBDA: f64 = 1000.0;
const MAX_EXPANSION: f64 = 5.0;
const GROWTH: f64 = 2.0;
const TOLERANCE: f64 = 0.05;
const MAX_ITERATIONS: usize = 12;
const MAX_BACKOFF: usize = 30;

/// Outcome of a line search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineSearchResult {
    /// Multiple of the step giving the lowest value seen
    pub lambda: f64,
    pub fval: f64,
    /// Whether `fval` is significantly below the starting value
    pub improved: bool,
}

/// Minimize `f(x0 + λ·step)` over `λ` by successive parabolic fits.
///
/// `gdel` is the directional derivative `step·g` at `λ = 0` and must be
/// negative. Non-finite function values are treated as +∞, and the first
/// trial step is halved until it gives a finite value.
pub(crate) fn line_search<F>(
    f: F,
    x0: &Array1<f64>,
    step: &Array1<f64>,
    f0: f64,
    gdel: f64,
) -> Result<LineSearchResult>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let prec = Precision::default();

    // Smallest λ that still moves some parameter by a representable amount.
    let mut slamin = 0.0_f64;
    for i in 0..step.len() {
        if step[i] != 0.0 {
            let ratio = (x0[i] / step[i]).abs();
            if slamin == 0.0 || ratio < slamin {
                slamin = ratio;
            }
        }
    }
    slamin = slamin.max(prec.eps) * prec.eps2;

    let eval = |lambda: f64| -> Result<f64> {
        let x = x0 + &(step * lambda);
        let v = f(&x)?;
        Ok(if v.is_finite() { v } else { f64::INFINITY })
    };

    let mut points: Vec<(f64, f64)> = vec![(0.0, f0)];

    let mut lambda = 1.0;
    let mut f1 = eval(lambda)?;
    let mut backoff = 0;
    while !f1.is_finite() && backoff < MAX_BACKOFF && lambda > slamin {
        lambda *= 0.5;
        f1 = eval(lambda)?;
        backoff += 1;
    }
    points.push((lambda, f1));

    let mut next = if f1.is_finite() {
        let curvature = (f1 - f0 - gdel * lambda) / (lambda * lambda);
        if curvature > 0.0 {
            -gdel / (2.0 * curvature)
        } else {
            MAX_EXPANSION * lambda
        }
    } else {
        0.5 * lambda
    };
    next = clamp_lambda(next, &points, slamin);

    for _ in 0..MAX_ITERATIONS {
        if points
            .iter()
            .any(|&(l, _)| (l - next).abs() <= TOLERANCE * next.abs().max(slamin))
        {
            break;
        }
        let fnext = eval(next)?;
        points.push((next, fnext));

        let (best_lambda, _) = best_point(&points);
        let proposal = match parabola_vertex(&points) {
            Some(v) => v,
            None => {
                let largest = points.iter().map(|p| p.0).fold(0.0, f64::max);
                if best_lambda >= largest {
                    GROWTH * best_lambda
                } else {
                    0.5 * best_lambda
                }
            }
        };
        next = clamp_lambda(proposal, &points, slamin);
    }

    let (best_lambda, best_f) = best_point(&points);
    let improved = best_f < f0 && (f0 - best_f) > f0.abs() * prec.eps;
    Ok(LineSearchResult {
        lambda: if improved { best_lambda } else { 0.0 },
        fval: if improved { best_f } else { f0 },
        improved,
    })
}

fn clamp_lambda(lambda: f64, points: &[(f64, f64)], slamin: f64) -> f64 {
    let largest = points.iter().map(|p| p.0).fold(0.0, f64::max);
    let upper = (MAX_EXPANSION * largest).min(MAX_LAMBDA);
    if !lambda.is_finite() {
        return upper;
    }
    lambda.min(upper).max(slamin)
}

fn best_point(points: &[(f64, f64)]) -> (f64, f64) {
    points
        .iter()
        .copied()
        .fold((0.0, f64::INFINITY), |best, p| if p.1 < best.1 { p } else { best })
}

/// Vertex of the parabola through the three lowest points, if it is a minimum.
fn parabola_vertex(points: &[(f64, f64)]) -> Option<f64> {
    let mut sorted: Vec<(f64, f64)> = points.iter().copied().filter(|p| p.1.is_finite()).collect();
    if sorted.len() < 3 {
        return None;
    }
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (x1, y1) = sorted[0];
    let (x2, y2) = sorted[1];
    let (x3, y3) = sorted[2];

    let d12 = x1 - x2;
    let d13 = x1 - x3;
    let d23 = x2 - x3;
    if d12 == 0.0 || d13 == 0.0 || d23 == 0.0 {
        return None;
    }

    // y = a x^2 + b x + c
    let a = (y1 / (d12 * d13)) - (y2 / (d12 * d23)) + (y3 / (d13 * d23));
    if !(a > 0.0) {
        return None;
    }
    let b = (y2 - y1) / (x2 - x1) - a * (x1 + x2);
    let vertex = -b / (2.0 * a);
    vertex.is_finite().then_some(vertex)
}
