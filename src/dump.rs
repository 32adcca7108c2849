//! Plain CSV tables for plotting: chi-squared per step, raw energies, integration segments.

use crate::error::{CcrError, Result};
use crate::free_energy::integration::Integral;
use crate::schedule::RestraintSchedule;
use crate::series::{ChiSquaredSeries, EnergySeries};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ChiSquaredRow {
    step: usize,
    force_constant: f64,
    chi_squared: f64,
    frames: usize,
}

#[derive(Serialize)]
struct EnergyRow {
    frame: usize,
    energy: f64,
}

#[derive(Serialize)]
struct SegmentRow<'a> {
    state: &'a str,
    segment: usize,
    k_start: f64,
    k_end: f64,
    slope: f64,
    contribution: f64,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| CcrError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_chi_squared_table(
    path: impl AsRef<Path>,
    schedule: &RestraintSchedule,
    chi: &ChiSquaredSeries,
) -> Result<()> {
    let rows = schedule
        .force_constants()
        .iter()
        .zip(chi.steps())
        .enumerate()
        .map(|(step, (&force_constant, frames))| ChiSquaredRow {
            step,
            force_constant,
            chi_squared: frames.sum() / frames.len() as f64,
            frames: frames.len(),
        });
    write_rows(path.as_ref(), rows)
}

pub fn write_energy_series(path: impl AsRef<Path>, energies: &EnergySeries) -> Result<()> {
    let rows = energies
        .values()
        .iter()
        .enumerate()
        .map(|(frame, &energy)| EnergyRow { frame, energy });
    write_rows(path.as_ref(), rows)
}

pub fn write_segments(path: impl AsRef<Path>, integrals: &[(&str, &Integral)]) -> Result<()> {
    let rows = integrals.iter().flat_map(|(state, integral)| {
        integral.segments.iter().map(move |s| SegmentRow {
            state,
            segment: s.segment,
            k_start: s.k_start,
            k_end: s.k_end,
            slope: s.slope,
            contribution: s.contribution,
        })
    });
    write_rows(path.as_ref(), rows)
}
