//! Bootstrap uncertainties for the enthalpy and confinement differences.
//!
//! Every replicate redraws, with replacement, as many frames as the original series holds.
//! States are resampled independently, and for the confinement term every step is resampled
//! on its own frame axis before the integration is redone. Replicate `r` draws from an RNG
//! seeded with `seed + r`, so the result does not depend on how rayon schedules the work.

use crate::error::{CcrError, Result};
use crate::free_energy::integration;
use crate::schedule::RestraintSchedule;
use crate::series::ChiSquaredSeries;
use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

/// Bootstrap spread around a directly computed point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BootstrapEstimate {
    /// Statistic on the full data, not the replicate mean.
    pub point: f64,
    /// Sample standard deviation of the replicate statistics.
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
    pub replicates: usize,
    /// Replicates dropped because the statistic was undefined or not finite.
    pub discarded: usize,
}

impl BootstrapEstimate {
    /// The same estimate with every energy-valued field multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        let (lower, upper) = if factor < 0.0 {
            (self.upper * factor, self.lower * factor)
        } else {
            (self.lower * factor, self.upper * factor)
        };
        Self {
            point: self.point * factor,
            std_dev: self.std_dev * factor.abs(),
            lower,
            upper,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bootstrap {
    replicates: usize,
    seed: u64,
    confidence: f64,
}

impl Bootstrap {
    pub fn new(replicates: usize, seed: u64, confidence: f64) -> Result<Self> {
        if replicates < 2 {
            return Err(CcrError::InvalidConfig(format!(
                "at least 2 bootstrap replicates are needed, got {replicates}"
            )));
        }
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(CcrError::InvalidConfig(format!(
                "confidence must lie in (0, 1), got {confidence}"
            )));
        }
        Ok(Self {
            replicates,
            seed,
            confidence,
        })
    }

    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Uncertainty of the mean of one series.
    pub fn mean(&self, series: &[f64]) -> Result<BootstrapEstimate> {
        let series = ArrayView1::from(series);
        check_samples("series", series)?;
        let point = mean(series);
        self.run(point, |rng| Ok(resampled_mean(series, rng)))
    }

    /// Uncertainty of `mean(a) - mean(b)`, the two series resampled independently.
    pub fn mean_difference(&self, a: &[f64], b: &[f64]) -> Result<BootstrapEstimate> {
        let (a, b) = (ArrayView1::from(a), ArrayView1::from(b));
        check_samples("series A", a)?;
        check_samples("series B", b)?;
        let point = mean(a) - mean(b);
        self.run(point, |rng| {
            Ok(resampled_mean(a, rng) - resampled_mean(b, rng))
        })
    }

    /// Uncertainty of the confinement free-energy difference `ΔG_A - ΔG_B`.
    pub fn confinement_difference(
        &self,
        a: (&RestraintSchedule, &ChiSquaredSeries),
        b: (&RestraintSchedule, &ChiSquaredSeries),
    ) -> Result<BootstrapEstimate> {
        for (label, (schedule, chi)) in [("A", a), ("B", b)] {
            if schedule.len() != chi.len() {
                return Err(CcrError::LengthMismatch {
                    what: "restraint schedule and chi-squared steps",
                    left: schedule.len(),
                    right: chi.len(),
                });
            }
            for (step, frames) in chi.steps().enumerate() {
                check_samples(&format!("chi-squared of state {label} step {step}"), frames)?;
            }
        }

        let point = integration::confinement_free_energy(a.0.force_constants(), &a.1.means())?
            - integration::confinement_free_energy(b.0.force_constants(), &b.1.means())?;

        self.run(point, |rng| {
            let dg_a = resampled_confinement(a.0, a.1, rng)?;
            let dg_b = resampled_confinement(b.0, b.1, rng)?;
            Ok(dg_a - dg_b)
        })
    }

    fn run<F>(&self, point: f64, statistic: F) -> Result<BootstrapEstimate>
    where
        F: Fn(&mut StdRng) -> Result<f64> + Sync,
    {
        let outcomes = (0..self.replicates)
            .into_par_iter()
            .map(|r| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(r as u64));
                match statistic(&mut rng) {
                    Ok(value) if value.is_finite() => Ok(Some(value)),
                    Ok(_) | Err(CcrError::DegenerateIntegrationSegment { .. }) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<Vec<Option<f64>>>>()?;

        let mut values: Vec<f64> = outcomes.into_iter().flatten().collect();
        let discarded = self.replicates - values.len();
        if discarded > 0 {
            log::warn!(
                "{discarded} of {} bootstrap replicates were undefined and discarded",
                self.replicates
            );
        }
        if values.len() < 2 {
            return Err(CcrError::InsufficientSamples {
                what: "usable bootstrap replicates".to_string(),
                found: values.len(),
            });
        }

        let std_dev = sample_std_dev(&values);
        values.sort_by(|a, b| a.total_cmp(b));
        let tail = (1.0 - self.confidence) / 2.0;
        Ok(BootstrapEstimate {
            point,
            std_dev,
            lower: percentile(&values, tail),
            upper: percentile(&values, 1.0 - tail),
            confidence: self.confidence,
            replicates: self.replicates,
            discarded,
        })
    }
}

fn check_samples(what: &str, series: ArrayView1<'_, f64>) -> Result<()> {
    if series.len() < 2 {
        return Err(CcrError::InsufficientSamples {
            what: what.to_string(),
            found: series.len(),
        });
    }
    Ok(())
}

fn mean(series: ArrayView1<'_, f64>) -> f64 {
    series.sum() / series.len() as f64
}

fn resampled_mean(series: ArrayView1<'_, f64>, rng: &mut StdRng) -> f64 {
    let n = series.len();
    (0..n).map(|_| series[rng.random_range(0..n)]).sum::<f64>() / n as f64
}

fn resampled_confinement(
    schedule: &RestraintSchedule,
    chi: &ChiSquaredSeries,
    rng: &mut StdRng,
) -> Result<f64> {
    let means: Vec<f64> = chi.steps().map(|frames| resampled_mean(frames, rng)).collect();
    integration::confinement_free_energy(schedule.force_constants(), &means)
}

/// Sample standard deviation with the data shifted by its first value, so a set of
/// identical values gives exactly zero.
pub(crate) fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let shift = values[0];
    let (sum, sum_sq) = values.iter().fold((0.0, 0.0), |(s, s2), v| {
        let d = v - shift;
        (s + d, s2 + d * d)
    });
    let var = (sum_sq - sum * sum / n as f64) / (n - 1) as f64;
    var.max(0.0).sqrt()
}

/// Linear-interpolated percentile of sorted values, `q` in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
