//! Residual entropy from quasiharmonic analysis of atomic fluctuations.
//!
//! The trajectory is mean-centred and weighted by the square root of each atom's mass; the
//! eigenvalues of the resulting covariance are the variances σ² of independent harmonic modes.
//! Every retained mode contributes `ln α` with `α = h / sqrt(kB T σ²)` and
//!
//! ```text
//! S   = -kB Σ ln α
//! G_S = -T S
//! ```
//!
//! Two formulations are in use and they do not agree, so both are kept as named variants:
//!
//! * [`EntropyMethod::Eigen`]: covariance eigendecomposition, Planck's constant `h`, lowest
//!   six rigid-body modes dropped.
//! * [`EntropyMethod::Svd`]: SVD of the fluctuation matrix, reduced constant `ħ`, every mode
//!   kept. Experimental.

use crate::constants::ThermalContext;
use crate::error::{CcrError, Result};
use crate::units::{mass_length_squared_to_si, Energy, LengthUnit, MassUnit};
use nalgebra::DMatrix;
use ndarray::{ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntropyMethod {
    Eigen,
    Svd,
}

impl EntropyMethod {
    /// Results from experimental variants must be labelled unvalidated.
    pub fn is_experimental(self) -> bool {
        matches!(self, EntropyMethod::Svd)
    }
}

impl fmt::Display for EntropyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntropyMethod::Eigen => write!(f, "eigen"),
            EntropyMethod::Svd => write!(f, "svd (experimental)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuasiharmonicOptions {
    pub method: EntropyMethod,
    /// Lowest modes treated as translation/rotation. Ignored by the SVD variant.
    pub rigid_body_modes: usize,
    /// Relative cut below which a mode counts as having no variance.
    pub degenerate_tolerance: f64,
    /// Unit of the trajectory coordinates.
    pub length_unit: LengthUnit,
}

impl QuasiharmonicOptions {
    pub fn new(method: EntropyMethod) -> Self {
        Self {
            method,
            rigid_body_modes: 6,
            degenerate_tolerance: 1.0e-10,
            length_unit: LengthUnit::Nanometer,
        }
    }
}

/// Mode variances in kg·m², sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct QuasiharmonicSpectrum {
    pub variances: Vec<f64>,
    /// Number of leading modes dropped as rigid-body motion.
    pub rigid_body_excluded: usize,
    /// Indices (into `variances`) of modes dropped for near-zero variance.
    pub degenerate: Vec<usize>,
}

impl QuasiharmonicSpectrum {
    pub fn modes_used(&self) -> usize {
        self.variances.len() - self.rigid_body_excluded - self.degenerate.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuasiharmonicEntropy {
    pub method: EntropyMethod,
    /// Entropy in J/(K·mol).
    pub entropy: f64,
    /// The entropic free-energy term, -T S.
    pub free_energy: Energy,
    pub spectrum: QuasiharmonicSpectrum,
}

/// Mean-centred, mass-weighted fluctuations: one row per degree of freedom, one column per frame.
pub fn fluctuation_matrix(trajectory: ArrayView3<'_, f64>, masses: &[f64]) -> Result<DMatrix<f64>> {
    let (n_frames, n_atoms, n_dim) = trajectory.dim();
    if n_frames < 2 {
        return Err(CcrError::InsufficientSamples {
            what: "quasiharmonic trajectory frames".to_string(),
            found: n_frames,
        });
    }
    if n_atoms == 0 {
        return Err(CcrError::InsufficientSamples {
            what: "atoms".to_string(),
            found: 0,
        });
    }
    if masses.len() != n_atoms {
        return Err(CcrError::LengthMismatch {
            what: "trajectory atoms and masses",
            left: n_atoms,
            right: masses.len(),
        });
    }
    if let Some(index) = masses.iter().position(|m| !(m.is_finite() && *m > 0.0)) {
        return Err(CcrError::NonPositiveValue {
            what: "mass",
            index,
            value: masses[index],
        });
    }
    let mean = trajectory
        .mean_axis(Axis(0))
        .ok_or_else(|| CcrError::InsufficientSamples {
            what: "quasiharmonic trajectory frames".to_string(),
            found: n_frames,
        })?;

    let sqrt_masses: Vec<f64> = masses.iter().map(|m| m.sqrt()).collect();
    Ok(DMatrix::from_fn(n_atoms * n_dim, n_frames, |dof, frame| {
        let (atom, dim) = (dof / n_dim, dof % n_dim);
        sqrt_masses[atom] * (trajectory[[frame, atom, dim]] - mean[[atom, dim]])
    }))
}

/// Population covariance `X Xᵀ / F` of a fluctuation matrix.
pub fn covariance(fluctuations: &DMatrix<f64>) -> DMatrix<f64> {
    let n_frames = fluctuations.ncols() as f64;
    (fluctuations * fluctuations.transpose()) / n_frames
}

/// Mode variances in the input units (amu·length²), ascending.
fn mode_variances(fluctuations: DMatrix<f64>, method: EntropyMethod) -> Vec<f64> {
    let mut variances: Vec<f64> = match method {
        EntropyMethod::Eigen => covariance(&fluctuations)
            .symmetric_eigen()
            .eigenvalues
            .iter()
            .copied()
            .collect(),
        EntropyMethod::Svd => {
            let n_frames = fluctuations.ncols() as f64;
            fluctuations
                .svd(false, false)
                .singular_values
                .iter()
                .map(|s| s * s / n_frames)
                .collect()
        }
    };
    variances.sort_by(|a, b| a.total_cmp(b));
    variances
}

/// Quasiharmonic entropy of a trajectory (frames × atoms × 3) with masses in amu.
pub fn estimate(
    trajectory: ArrayView3<'_, f64>,
    masses: &[f64],
    ctx: &ThermalContext,
    options: &QuasiharmonicOptions,
) -> Result<QuasiharmonicEntropy> {
    let fluctuations = fluctuation_matrix(trajectory, masses)?;
    let to_si = mass_length_squared_to_si(MassUnit::Dalton, options.length_unit);
    let variances: Vec<f64> = mode_variances(fluctuations, options.method)
        .into_iter()
        .map(|v| v * to_si)
        .collect();

    let rigid_body_excluded = match options.method {
        EntropyMethod::Eigen => options.rigid_body_modes.min(variances.len()),
        EntropyMethod::Svd => 0,
    };
    let largest = variances.iter().copied().fold(0.0_f64, f64::max);
    let cutoff = options.degenerate_tolerance * largest;

    let planck = match options.method {
        EntropyMethod::Eigen => ctx.planck,
        EntropyMethod::Svd => ctx.reduced_planck,
    };
    let kt = ctx.kt();

    let mut degenerate = Vec::new();
    let mut sum_ln_alpha = 0.0;
    for (mode, &variance) in variances.iter().enumerate().skip(rigid_body_excluded) {
        if variance <= cutoff || variance <= 0.0 {
            log::warn!(
                "quasiharmonic mode {mode} has near-zero variance ({variance:.3e} kg m^2), excluded"
            );
            degenerate.push(mode);
            continue;
        }
        let alpha = planck / (kt * variance).sqrt();
        sum_ln_alpha += alpha.ln();
    }

    let spectrum = QuasiharmonicSpectrum {
        variances,
        rigid_body_excluded,
        degenerate,
    };
    if spectrum.modes_used() == 0 {
        return Err(CcrError::DegenerateModes {
            total: spectrum.variances.len(),
            degenerate: spectrum.degenerate.len(),
        });
    }

    let entropy_molecular = -ctx.boltzmann * sum_ln_alpha;
    let free_energy =
        Energy::from_molecular_joules(-ctx.temperature_k * entropy_molecular, ctx.avogadro);
    log::debug!(
        "quasiharmonic ({}): {} modes used, {} rigid-body, {} degenerate",
        options.method,
        spectrum.modes_used(),
        spectrum.rigid_body_excluded,
        spectrum.degenerate.len()
    );

    Ok(QuasiharmonicEntropy {
        method: options.method,
        entropy: entropy_molecular * ctx.avogadro,
        free_energy,
        spectrum,
    })
}
