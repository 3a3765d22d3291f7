//! Search for the point where a profile crosses a target level.
//!
//! The profile is parametrized by the distance `t ≥ 0` from the minimum
//! along a fixed direction. The search works on `s(t) = sqrt(F(t) - fmin)`,
//! which is linear in `t` for a quadratic objective, so the secant step is
//! exact in that case.

use crate::error::Result;
use crate::minos::profiler::ProfilePoint;

/// How a crossing search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrossStatus {
    Valid,
    /// The parameter limit was reached before the level
    AtLimit,
    /// A function value below the minimum was found
    NewMinimum,
    /// The iteration budget ran out
    CallLimit,
    /// The level was reached but the conditional fit did not converge
    NotConverged,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CrossSearch {
    pub fmin: f64,
    /// Required rise above the minimum, `sigma²·up`
    pub aim: f64,
    pub tolerance: f64,
    /// First trial distance
    pub t0: f64,
    /// Distance to the nearest limit along the direction
    pub t_max: Option<f64>,
    pub max_iterations: usize,
}

impl CrossSearch {
    pub fn new(fmin: f64, sigma: f64, up: f64, t0: f64) -> Self {
        Self {
            fmin,
            aim: sigma * sigma * up,
            tolerance: 0.001 * up,
            t0,
            t_max: None,
            max_iterations: 30,
        }
    }

    pub fn with_t_max(mut self, t_max: Option<f64>) -> Self {
        self.t_max = t_max;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Crossing {
    pub t: f64,
    pub point: ProfilePoint,
    pub status: CrossStatus,
}

/// Find `t` with `profile(t).fval = fmin + aim`.
pub(crate) fn function_cross<P>(search: &CrossSearch, mut profile: P) -> Result<Crossing>
where
    P: FnMut(f64) -> Result<ProfilePoint>,
{
    let target = search.aim.sqrt();
    let t_max = search.t_max.unwrap_or(f64::INFINITY);

    if t_max <= 0.0 {
        let point = profile(0.0)?;
        return Ok(Crossing {
            t: 0.0,
            point,
            status: CrossStatus::AtLimit,
        });
    }

    let mut t = if search.t0 > 0.0 && search.t0.is_finite() {
        search.t0.min(t_max)
    } else {
        t_max.min(1.0)
    };

    // Points below the level, in increasing t; the minimum itself is the first.
    let mut below: Vec<(f64, f64)> = vec![(0.0, 0.0)];
    let mut above: Option<(f64, f64)> = None;
    let mut last: Option<(f64, ProfilePoint)> = None;

    for _ in 0..search.max_iterations {
        let point = profile(t)?;
        let df = point.fval - search.fmin;

        if df < -search.tolerance {
            return Ok(Crossing {
                t,
                point,
                status: CrossStatus::NewMinimum,
            });
        }
        if (df - search.aim).abs() <= search.tolerance {
            let status = if point.valid {
                CrossStatus::Valid
            } else {
                CrossStatus::NotConverged
            };
            return Ok(Crossing { t, point, status });
        }

        let s = df.max(0.0).sqrt();
        if df < search.aim {
            if t >= t_max {
                return Ok(Crossing {
                    t,
                    point,
                    status: CrossStatus::AtLimit,
                });
            }
            if below.last().map_or(true, |b| t > b.0) {
                below.push((t, s));
            }
        } else if above.map_or(true, |a| t < a.0) {
            above = Some((t, s));
        }
        last = Some((t, point));

        let (tb, sb) = below[below.len() - 1];
        t = match above {
            Some((ta, sa)) => {
                let guess = if sa > sb {
                    tb + (target - sb) * (ta - tb) / (sa - sb)
                } else {
                    f64::NAN
                };
                if guess > tb && guess < ta {
                    guess
                } else {
                    0.5 * (ta + tb)
                }
            }
            None => {
                let (tp, sp) = if below.len() >= 2 {
                    below[below.len() - 2]
                } else {
                    (0.0, 0.0)
                };
                let guess = if sb > sp {
                    tb + (target - sb) * (tb - tp) / (sb - sp)
                } else {
                    2.0 * tb
                };
                let guess = if guess.is_finite() { guess } else { 2.0 * tb };
                guess.max(1.01 * tb).min(4.0 * tb).min(t_max)
            }
        };
    }

    match last {
        Some((t, point)) => Ok(Crossing {
            t,
            point,
            status: CrossStatus::CallLimit,
        }),
        None => {
            let point = profile(0.0)?;
            Ok(Crossing {
                t: 0.0,
                point,
                status: CrossStatus::CallLimit,
            })
        }
    }
}
