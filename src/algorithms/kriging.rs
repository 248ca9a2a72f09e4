//! Ordinary kriging over scattered delay observations.
//!
//! The estimator fits a variogram model to the observed delays and predicts a
//! continuous delay surface over the pattern's bounding box, or a single
//! point estimate at an arbitrary location. Fitting is fully deterministic:
//! the same observations and model always produce the same surface, which the
//! integration tests rely on.
//!
//! Degenerate inputs (fewer than three distinct holes, or a collinear
//! pattern) are rejected with [`BlastError::InsufficientData`] instead of
//! producing a silently meaningless grid.

use std::str::FromStr;
use std::time::Duration;

use nalgebra::linalg::LU;
use nalgebra::{DMatrix, DVector, Dyn};
use serde::{Deserialize, Serialize};

use crate::core::deadline::Deadline;
use crate::core::domain::{BoundingBox, Pattern};
use crate::error::{BlastError, BlastResult};

/// Number of lag bins in the experimental semivariogram.
const NLAGS: usize = 6;

/// Two holes closer than this are treated as one observation.
const COINCIDENT_EPS: f64 = 1e-9;

/// Floor for fitted slopes, sills, and ranges.
const PARAM_FLOOR: f64 = 1e-12;

/// Variogram model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramModel {
    Exponential,
    Spherical,
    Gaussian,
    Linear,
    Power,
}

impl VariogramModel {
    pub fn name(&self) -> &'static str {
        match self {
            VariogramModel::Exponential => "exponential",
            VariogramModel::Spherical => "spherical",
            VariogramModel::Gaussian => "gaussian",
            VariogramModel::Linear => "linear",
            VariogramModel::Power => "power",
        }
    }
}

impl FromStr for VariogramModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exponential" => Ok(VariogramModel::Exponential),
            "spherical" => Ok(VariogramModel::Spherical),
            "gaussian" => Ok(VariogramModel::Gaussian),
            "linear" => Ok(VariogramModel::Linear),
            "power" => Ok(VariogramModel::Power),
            other => Err(format!(
                "unknown variogram model: {}. Use 'exponential', 'spherical', 'gaussian', 'linear', or 'power'",
                other
            )),
        }
    }
}

/// A fitted variogram: the model family with concrete parameters.
#[derive(Debug, Clone)]
enum FittedVariogram {
    /// Exponential, spherical, or gaussian: partial sill + effective range.
    Bounded {
        kind: VariogramModel,
        psill: f64,
        range: f64,
        nugget: f64,
    },
    Linear {
        slope: f64,
        nugget: f64,
    },
    Power {
        scale: f64,
        exponent: f64,
        nugget: f64,
    },
}

impl FittedVariogram {
    fn semivariance(&self, h: f64) -> f64 {
        match *self {
            FittedVariogram::Bounded {
                kind,
                psill,
                range,
                nugget,
            } => {
                let g = match kind {
                    VariogramModel::Exponential => 1.0 - (-h / (range / 3.0)).exp(),
                    VariogramModel::Gaussian => {
                        1.0 - (-(h / (range * 4.0 / 7.0)).powi(2)).exp()
                    }
                    VariogramModel::Spherical => {
                        if h < range {
                            1.5 * h / range - 0.5 * (h / range).powi(3)
                        } else {
                            1.0
                        }
                    }
                    // Bounded is only built for the three families above.
                    VariogramModel::Linear | VariogramModel::Power => unreachable!(),
                };
                nugget + psill * g
            }
            FittedVariogram::Linear { slope, nugget } => nugget + slope * h,
            FittedVariogram::Power {
                scale,
                exponent,
                nugget,
            } => nugget + scale * h.powf(exponent),
        }
    }
}

/// One lag bin of the experimental semivariogram.
struct LagBin {
    h: f64,
    gamma: f64,
}

/// Estimated delay surface over a regular grid spanning the pattern's
/// bounding box. `values` is row-major: `values[iy][ix]` corresponds to
/// `(grid_x[ix], grid_y[iy])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimatedSurface {
    pub grid_x: Vec<f64>,
    pub grid_y: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    pub model: VariogramModel,
}

#[derive(Debug)]
enum Solver {
    /// All observed delays are equal; every estimate is that constant.
    Constant(f64),
    System {
        fitted: FittedVariogram,
        lu: LU<f64, Dyn, Dyn>,
    },
}

/// Ordinary-kriging estimator, fitted once and queried many times.
#[derive(Debug)]
pub struct KrigingEstimator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    zs: Vec<f64>,
    bbox: BoundingBox,
    model: VariogramModel,
    solver: Solver,
}

impl KrigingEstimator {
    /// Fit the variogram and factor the kriging system.
    ///
    /// Exactly coincident holes are collapsed into one observation with the
    /// mean of their delays; the validator keeps them separate, but they
    /// would make the kriging matrix singular.
    pub fn fit(pattern: &Pattern, model: VariogramModel) -> BlastResult<Self> {
        if pattern.is_empty() {
            return Err(BlastError::EmptyPattern("kriging estimation"));
        }
        let bbox = pattern.bounding_box().expect("non-empty pattern");

        let (xs, ys, zs) = collapse_coincident(pattern);
        let n = xs.len();
        if n < 3 {
            return Err(BlastError::InsufficientData(format!(
                "need at least 3 distinct points, got {}",
                n
            )));
        }
        if collinear(&xs, &ys) {
            return Err(BlastError::InsufficientData(
                "points are collinear; a delay surface is undetermined".to_string(),
            ));
        }

        let (z_min, z_max) = zs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| {
                (lo.min(z), hi.max(z))
            });
        if z_max - z_min < 1e-12 {
            log::debug!("all delays equal; kriging degenerates to a constant surface");
            return Ok(Self {
                xs,
                ys,
                zs: zs.clone(),
                bbox,
                model,
                solver: Solver::Constant(zs[0]),
            });
        }

        let bins = experimental_variogram(&xs, &ys, &zs);
        let variance = sample_variance(&zs);
        let fitted = fit_variogram(model, &bins, variance);
        log::debug!(
            "fitted {} variogram over {} observations ({} lag bins)",
            model.name(),
            n,
            bins.len()
        );

        // Ordinary-kriging system: semivariance block bordered by the
        // Lagrange row/column enforcing unit weight sum.
        let mut a = DMatrix::<f64>::zeros(n + 1, n + 1);
        for i in 0..n {
            for j in 0..n {
                let d = ((xs[i] - xs[j]).powi(2) + (ys[i] - ys[j]).powi(2)).sqrt();
                a[(i, j)] = fitted.semivariance(d);
            }
            a[(i, n)] = 1.0;
            a[(n, i)] = 1.0;
        }

        let lu = a.lu();
        Ok(Self {
            xs,
            ys,
            zs,
            bbox,
            model,
            solver: Solver::System { fitted, lu },
        })
    }

    pub fn model(&self) -> VariogramModel {
        self.model
    }

    /// Estimated delay at an arbitrary location.
    pub fn predict_point(&self, x: f64, y: f64) -> BlastResult<f64> {
        match &self.solver {
            Solver::Constant(c) => Ok(*c),
            Solver::System { fitted, lu } => {
                let n = self.xs.len();
                let mut b = DVector::<f64>::zeros(n + 1);
                for i in 0..n {
                    let d = ((x - self.xs[i]).powi(2) + (y - self.ys[i]).powi(2)).sqrt();
                    b[i] = fitted.semivariance(d);
                }
                b[n] = 1.0;
                let w = lu.solve(&b).ok_or_else(|| {
                    BlastError::InsufficientData("kriging system is singular".to_string())
                })?;
                Ok((0..n).map(|i| w[i] * self.zs[i]).sum())
            }
        }
    }

    /// Estimated delay surface over a `resolution` x `resolution` grid
    /// spanning the observed bounding box.
    ///
    /// `budget` bounds the wall-clock time; the deadline is checked once per
    /// grid row.
    pub fn predict_grid(
        &self,
        resolution: usize,
        budget: Option<Duration>,
    ) -> BlastResult<EstimatedSurface> {
        let resolution = resolution.max(1);
        let deadline = Deadline::new(budget);

        let grid_x = linspace(self.bbox.min_x, self.bbox.max_x, resolution);
        let grid_y = linspace(self.bbox.min_y, self.bbox.max_y, resolution);

        let mut values = Vec::with_capacity(resolution);
        for &y in &grid_y {
            deadline.check()?;
            let mut row = Vec::with_capacity(resolution);
            for &x in &grid_x {
                row.push(self.predict_point(x, y)?);
            }
            values.push(row);
        }

        Ok(EstimatedSurface {
            grid_x,
            grid_y,
            values,
            model: self.model,
        })
    }
}

/// Fit a variogram and predict the full delay surface in one call.
pub fn fit_and_predict_grid(
    pattern: &Pattern,
    model: VariogramModel,
    resolution: usize,
    budget: Option<Duration>,
) -> BlastResult<EstimatedSurface> {
    KrigingEstimator::fit(pattern, model)?.predict_grid(resolution, budget)
}

/// Fit a variogram and estimate the delay at a single location.
pub fn fit_and_predict_point(
    pattern: &Pattern,
    model: VariogramModel,
    x: f64,
    y: f64,
) -> BlastResult<f64> {
    KrigingEstimator::fit(pattern, model)?.predict_point(x, y)
}

fn collapse_coincident(pattern: &Pattern) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut xs: Vec<f64> = Vec::new();
    let mut ys: Vec<f64> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();

    for p in pattern.iter() {
        let existing = xs
            .iter()
            .zip(&ys)
            .position(|(&x, &y)| ((p.x - x).powi(2) + (p.y - y).powi(2)).sqrt() < COINCIDENT_EPS);
        match existing {
            Some(i) => {
                sums[i] += p.delay;
                counts[i] += 1;
            }
            None => {
                xs.push(p.x);
                ys.push(p.y);
                sums.push(p.delay);
                counts.push(1);
            }
        }
    }

    let zs = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &c)| s / c as f64)
        .collect();
    (xs, ys, zs)
}

fn collinear(xs: &[f64], ys: &[f64]) -> bool {
    // Farthest point from the first spans the candidate line.
    let (x0, y0) = (xs[0], ys[0]);
    let mut far = 0;
    let mut far_d = 0.0;
    for i in 1..xs.len() {
        let d = ((xs[i] - x0).powi(2) + (ys[i] - y0).powi(2)).sqrt();
        if d > far_d {
            far_d = d;
            far = i;
        }
    }
    if far_d < COINCIDENT_EPS {
        return true;
    }

    let (dx, dy) = (xs[far] - x0, ys[far] - y0);
    let tol = far_d * 1e-10;
    xs.iter().zip(ys).all(|(&x, &y)| {
        let offline = (dx * (y - y0) - dy * (x - x0)).abs() / far_d;
        offline <= tol
    })
}

fn sample_variance(zs: &[f64]) -> f64 {
    let n = zs.len() as f64;
    let mean = zs.iter().sum::<f64>() / n;
    zs.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n
}

fn experimental_variogram(xs: &[f64], ys: &[f64], zs: &[f64]) -> Vec<LagBin> {
    let n = xs.len();
    let mut max_d = 0.0f64;
    let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = ((xs[i] - xs[j]).powi(2) + (ys[i] - ys[j]).powi(2)).sqrt();
            let sv = 0.5 * (zs[i] - zs[j]).powi(2);
            max_d = max_d.max(d);
            pairs.push((d, sv));
        }
    }

    let width = max_d / NLAGS as f64;
    let mut h_sum = [0.0f64; NLAGS];
    let mut g_sum = [0.0f64; NLAGS];
    let mut count = [0usize; NLAGS];
    for (d, sv) in pairs {
        let idx = ((d / width) as usize).min(NLAGS - 1);
        h_sum[idx] += d;
        g_sum[idx] += sv;
        count[idx] += 1;
    }

    (0..NLAGS)
        .filter(|&i| count[i] > 0)
        .map(|i| LagBin {
            h: h_sum[i] / count[i] as f64,
            gamma: g_sum[i] / count[i] as f64,
        })
        .collect()
}

/// Deterministic parameter selection for the chosen family.
///
/// Linear and power use closed-form least squares; the bounded families pick
/// the lowest-SSE combination from a fixed candidate set (ranges at the lag
/// bin centers, nugget either zero or the first-bin semivariance, partial
/// sill anchored to the sample variance). Ties resolve to the first
/// candidate.
fn fit_variogram(model: VariogramModel, bins: &[LagBin], variance: f64) -> FittedVariogram {
    match model {
        VariogramModel::Linear => {
            if bins.len() < 2 {
                let slope = bins
                    .first()
                    .map(|b| (b.gamma / b.h).max(PARAM_FLOOR))
                    .unwrap_or(PARAM_FLOOR);
                return FittedVariogram::Linear { slope, nugget: 0.0 };
            }
            let n = bins.len() as f64;
            let mean_h = bins.iter().map(|b| b.h).sum::<f64>() / n;
            let mean_g = bins.iter().map(|b| b.gamma).sum::<f64>() / n;
            let sxx = bins.iter().map(|b| (b.h - mean_h).powi(2)).sum::<f64>();
            let sxy = bins
                .iter()
                .map(|b| (b.h - mean_h) * (b.gamma - mean_g))
                .sum::<f64>();
            let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 }.max(PARAM_FLOOR);
            let nugget = (mean_g - slope * mean_h).max(0.0);
            FittedVariogram::Linear { slope, nugget }
        }
        VariogramModel::Power => {
            let mut best = FittedVariogram::Power {
                scale: PARAM_FLOOR,
                exponent: 1.0,
                nugget: 0.0,
            };
            let mut best_sse = f64::INFINITY;
            for k in 1..20 {
                let exponent = k as f64 * 0.1;
                let num: f64 = bins.iter().map(|b| b.gamma * b.h.powf(exponent)).sum();
                let den: f64 = bins.iter().map(|b| b.h.powf(2.0 * exponent)).sum();
                if den <= 0.0 {
                    continue;
                }
                let scale = (num / den).max(PARAM_FLOOR);
                let sse: f64 = bins
                    .iter()
                    .map(|b| (scale * b.h.powf(exponent) - b.gamma).powi(2))
                    .sum();
                if sse < best_sse {
                    best_sse = sse;
                    best = FittedVariogram::Power {
                        scale,
                        exponent,
                        nugget: 0.0,
                    };
                }
            }
            best
        }
        kind => {
            let first_gamma = bins.first().map(|b| b.gamma).unwrap_or(0.0);
            let max_h = bins.iter().map(|b| b.h).fold(0.0f64, f64::max);
            let sill = variance.max(PARAM_FLOOR);

            let nugget_candidates = [0.0, first_gamma.min(sill * 0.5)];
            let mut best = FittedVariogram::Bounded {
                kind,
                psill: sill,
                range: max_h.max(PARAM_FLOOR),
                nugget: 0.0,
            };
            let mut best_sse = f64::INFINITY;
            for &nugget in &nugget_candidates {
                let psill = (sill - nugget).max(PARAM_FLOOR);
                for bin in bins {
                    let candidate = FittedVariogram::Bounded {
                        kind,
                        psill,
                        range: bin.h.max(PARAM_FLOOR),
                        nugget,
                    };
                    let sse: f64 = bins
                        .iter()
                        .map(|b| (candidate.semivariance(b.h) - b.gamma).powi(2))
                        .sum();
                    if sse < best_sse {
                        best_sse = sse;
                        best = candidate;
                    }
                }
            }
            best
        }
    }
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    (0..n)
        .map(|i| start + (stop - start) * (i as f64 / (n - 1) as f64))
        .collect()
}
