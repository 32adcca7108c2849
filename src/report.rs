//! The final free-energy report and its text rendering.

use crate::error::{CcrError, Result};
use crate::free_energy::bootstrap::BootstrapEstimate;
use crate::free_energy::quasiharmonic::EntropyMethod;
use crate::units::EnergyUnit;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "std_dev")]
pub enum Uncertainty {
    Estimated(f64),
    /// No uncertainty estimate exists for this term. It is not zero.
    Unestimated,
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uncertainty::Estimated(sd) => match f.precision() {
                Some(p) => write!(f, "± {:.*}", p, sd),
                None => write!(f, "± {sd}"),
            },
            Uncertainty::Unestimated => write!(f, "± unestimated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermDifference {
    pub value: f64,
    pub uncertainty: Uncertainty,
}

/// Terms of one state, in the report unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub label: String,
    pub confinement: f64,
    pub enthalpy: f64,
    /// -T S
    pub entropic: f64,
    /// S in J/(K mol)
    pub entropy: f64,
    pub modes_used: usize,
    pub modes_degenerate: usize,
    pub total: f64,
}

/// Outcome of a run. All differences are state A minus state B.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeEnergyReport {
    pub created: String,
    pub unit: EnergyUnit,
    pub temperature_k: f64,
    pub entropy_method: EntropyMethod,
    /// Set when an experimental estimator produced any term.
    pub experimental: bool,
    pub state_a: StateSummary,
    pub state_b: StateSummary,
    pub confinement: TermDifference,
    pub enthalpy: TermDifference,
    pub entropic: TermDifference,
    pub total: TermDifference,
    pub enthalpy_bootstrap: BootstrapEstimate,
    pub confinement_bootstrap: BootstrapEstimate,
}

impl FreeEnergyReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| CcrError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|source| {
            CcrError::Json {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl fmt::Display for FreeEnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit.symbol();
        let (a, b) = (&self.state_a, &self.state_b);
        if self.experimental {
            writeln!(
                f,
                "*** EXPERIMENTAL: the {} entropy estimator is unvalidated; \
                 treat every number below with caution ***",
                self.entropy_method
            )?;
        }
        writeln!(f, "Confine-Configure-Release free energy ({})", self.created)?;
        writeln!(
            f,
            "T = {} K, entropy estimator: {}, energies in {unit}",
            self.temperature_k, self.entropy_method
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<14}{:>14}{:>14}{:>14}  uncertainty",
            "term",
            a.label,
            b.label,
            format!("{} - {}", a.label, b.label)
        )?;
        let rows = [
            ("confinement", a.confinement, b.confinement, &self.confinement),
            ("enthalpy", a.enthalpy, b.enthalpy, &self.enthalpy),
            ("-TS", a.entropic, b.entropic, &self.entropic),
            ("total", a.total, b.total, &self.total),
        ];
        for (name, va, vb, diff) in rows {
            writeln!(
                f,
                "{name:<14}{va:>14.3}{vb:>14.3}{:>14.3}  {:.3}",
                diff.value, diff.uncertainty
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "entropy S: {} {:.3} J/(K mol) ({} modes, {} degenerate), \
             {} {:.3} J/(K mol) ({} modes, {} degenerate)",
            a.label,
            a.entropy,
            a.modes_used,
            a.modes_degenerate,
            b.label,
            b.entropy,
            b.modes_used,
            b.modes_degenerate
        )?;
        for (name, boot) in [
            ("enthalpy", &self.enthalpy_bootstrap),
            ("confinement", &self.confinement_bootstrap),
        ] {
            writeln!(
                f,
                "{name} bootstrap: {} replicates ({} discarded), \
                 {:.0}% interval [{:.3}, {:.3}] {unit}",
                boot.replicates,
                boot.discarded,
                boot.confidence * 100.0,
                boot.lower,
                boot.upper
            )?;
        }
        writeln!(
            f,
            "The uncertainty of the entropic term is unestimated; \
             the total uncertainty covers the enthalpy and confinement terms only."
        )
    }
}
