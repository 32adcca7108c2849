//! Analysis parameters, read from a JSON file and/or the command line.

use crate::constants::{ThermalContext, DEFAULT_TEMPERATURE_K};
use crate::error::{CcrError, Result};
use crate::free_energy::quasiharmonic::EntropyMethod;
use crate::units::{EnergyUnit, LengthUnit};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_REPLICATES: usize = 1000;
const DEFAULT_CONFIDENCE: f64 = 0.95;
const DEFAULT_RIGID_BODY_MODES: usize = 6;
const DEFAULT_DEGENERATE_TOLERANCE: f64 = 1.0e-10;
const DEFAULT_HYDROGEN_MASS_CUTOFF: f64 = 1.5;
const DEFAULT_SCHEDULE_HEADER_LINES: usize = 1;

/// How the potential energy of a final-step frame is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EnergyModel {
    /// Per-frame energies precomputed by an external engine (`energies.dat`).
    #[default]
    Tabulated,
    /// Pairwise Lennard-Jones energy from the per-atom parameters in `system.json`.
    LennardJones,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Which quasiharmonic formula to use. Required: the two variants are not equivalent.
    pub entropy_method: EntropyMethod,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_replicates")]
    pub bootstrap_replicates: usize,

    /// Base seed for the bootstrap. A random one is drawn (and logged) when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Coverage of the reported percentile interval.
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Lowest modes dropped as translations/rotations (eigen variant only).
    #[serde(default = "default_rigid_body_modes")]
    pub rigid_body_modes: usize,

    /// Modes with variance below this fraction of the largest one are treated as degenerate.
    #[serde(default = "default_degenerate_tolerance")]
    pub degenerate_tolerance: f64,

    #[serde(default = "default_true")]
    pub exclude_hydrogens: bool,

    /// Atoms lighter than this (amu) count as hydrogens.
    #[serde(default = "default_hydrogen_mass_cutoff")]
    pub hydrogen_mass_cutoff: f64,

    #[serde(default = "default_schedule_header_lines")]
    pub schedule_header_lines: usize,

    #[serde(default = "default_length_unit")]
    pub length_unit: LengthUnit,

    /// Unit of force constants (per length²), potential energies and the report.
    #[serde(default = "default_energy_unit")]
    pub energy_unit: EnergyUnit,

    #[serde(default)]
    pub energy_model: EnergyModel,

    #[serde(default = "default_state_a")]
    pub state_a: String,

    #[serde(default = "default_state_b")]
    pub state_b: String,
}

#[inline(always)]
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE_K
}

#[inline(always)]
fn default_replicates() -> usize {
    DEFAULT_REPLICATES
}

#[inline(always)]
fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

#[inline(always)]
fn default_rigid_body_modes() -> usize {
    DEFAULT_RIGID_BODY_MODES
}

#[inline(always)]
fn default_degenerate_tolerance() -> f64 {
    DEFAULT_DEGENERATE_TOLERANCE
}

#[inline(always)]
fn default_true() -> bool {
    true
}

#[inline(always)]
fn default_hydrogen_mass_cutoff() -> f64 {
    DEFAULT_HYDROGEN_MASS_CUTOFF
}

#[inline(always)]
fn default_schedule_header_lines() -> usize {
    DEFAULT_SCHEDULE_HEADER_LINES
}

#[inline(always)]
fn default_length_unit() -> LengthUnit {
    LengthUnit::Nanometer
}

#[inline(always)]
fn default_energy_unit() -> EnergyUnit {
    EnergyUnit::KilojoulePerMole
}

fn default_state_a() -> String {
    "A".to_string()
}

fn default_state_b() -> String {
    "B".to_string()
}

impl AnalysisConfig {
    /// Defaults for everything except the entropy method, which has no default.
    pub fn new(entropy_method: EntropyMethod) -> Self {
        Self {
            entropy_method,
            temperature: DEFAULT_TEMPERATURE_K,
            bootstrap_replicates: DEFAULT_REPLICATES,
            seed: None,
            confidence: DEFAULT_CONFIDENCE,
            rigid_body_modes: DEFAULT_RIGID_BODY_MODES,
            degenerate_tolerance: DEFAULT_DEGENERATE_TOLERANCE,
            exclude_hydrogens: true,
            hydrogen_mass_cutoff: DEFAULT_HYDROGEN_MASS_CUTOFF,
            schedule_header_lines: DEFAULT_SCHEDULE_HEADER_LINES,
            length_unit: default_length_unit(),
            energy_unit: default_energy_unit(),
            energy_model: EnergyModel::default(),
            state_a: default_state_a(),
            state_b: default_state_b(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CcrError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| CcrError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ThermalContext::new(self.temperature)?;
        if self.bootstrap_replicates < 2 {
            return Err(CcrError::InvalidConfig(format!(
                "at least 2 bootstrap replicates are needed, got {}",
                self.bootstrap_replicates
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(CcrError::InvalidConfig(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if !(self.degenerate_tolerance >= 0.0 && self.degenerate_tolerance < 1.0) {
            return Err(CcrError::InvalidConfig(format!(
                "degenerate_tolerance must lie in [0, 1), got {}",
                self.degenerate_tolerance
            )));
        }
        if self.state_a == self.state_b {
            return Err(CcrError::InvalidConfig(format!(
                "states must differ, both are `{}`",
                self.state_a
            )));
        }
        Ok(())
    }

    pub fn thermal_context(&self) -> Result<ThermalContext> {
        ThermalContext::new(self.temperature)
    }

    /// Log basic info about the analysis.
    pub fn info(&self) {
        log::info!(
            "Comparing states `{}` and `{}` at {} K.",
            self.state_a,
            self.state_b,
            self.temperature
        );
        log::info!(
            "Entropy estimator: {}; bootstrap: {} replicates, {:.0}% interval.",
            self.entropy_method,
            self.bootstrap_replicates,
            self.confidence * 100.0
        );
        if self.entropy_method.is_experimental() {
            log::warn!(
                "The {} entropy estimator is experimental; results are unvalidated.",
                self.entropy_method
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_minimal_json() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"entropy_method": "eigen"}"#).unwrap();
        assert_eq!(config, AnalysisConfig::new(EntropyMethod::Eigen));
        assert_eq!(config.bootstrap_replicates, DEFAULT_REPLICATES);
        assert_eq!(config.length_unit, LengthUnit::Nanometer);
        assert_eq!(config.energy_model, EnergyModel::Tabulated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn entropy_method_is_required() {
        assert!(serde_json::from_str::<AnalysisConfig>("{}").is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let text = r#"{"entropy_method": "svd", "temprature": 310.0}"#;
        assert!(serde_json::from_str::<AnalysisConfig>(text).is_err());
    }

    #[test]
    fn full_json() {
        let text = r#"{
            "entropy_method": "svd",
            "temperature": 310.0,
            "bootstrap_replicates": 200,
            "seed": 7,
            "energy_unit": "kilocalorie-per-mole",
            "length_unit": "angstrom",
            "energy_model": "lennard-jones",
            "state_a": "bound",
            "state_b": "unbound"
        }"#;
        let config: AnalysisConfig = serde_json::from_str(text).unwrap();
        assert_eq!(config.entropy_method, EntropyMethod::Svd);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.energy_unit, EnergyUnit::KilocaloriePerMole);
        assert_eq!(config.energy_model, EnergyModel::LennardJones);
        assert_eq!(config.state_b, "unbound");
    }

    #[test]
    fn validation_failures() {
        let mut config = AnalysisConfig::new(EntropyMethod::Eigen);
        config.bootstrap_replicates = 1;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new(EntropyMethod::Eigen);
        config.confidence = 1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new(EntropyMethod::Eigen);
        config.temperature = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new(EntropyMethod::Eigen);
        config.state_b = "A".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"entropy_method": "eigen", "bootstrap_replicates": 0}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::from_file(&path),
            Err(CcrError::InvalidConfig(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_file(dir.path().join("absent.json")),
            Err(CcrError::Io { .. })
        ));
    }
}
