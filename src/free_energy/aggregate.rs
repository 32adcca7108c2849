//! Combination of the confinement, enthalpy and entropy terms of two states.
//!
//! Every difference is taken as A - B. The enthalpy and confinement uncertainties come from
//! the bootstrap and are added in quadrature for the total; the entropic term has no
//! uncertainty estimate and is marked as such.

use crate::free_energy::bootstrap::BootstrapEstimate;
use crate::free_energy::quasiharmonic::{EntropyMethod, QuasiharmonicEntropy};
use crate::report::{FreeEnergyReport, StateSummary, TermDifference, Uncertainty};
use crate::units::{Energy, EnergyUnit};

/// The three free-energy terms of one state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTerms {
    pub label: String,
    pub confinement: Energy,
    pub enthalpy: Energy,
    pub entropy: QuasiharmonicEntropy,
}

impl StateTerms {
    pub fn total(&self, unit: EnergyUnit) -> Energy {
        self.confinement.to(unit) + self.enthalpy + self.entropy.free_energy
    }

    fn summary(&self, unit: EnergyUnit) -> StateSummary {
        StateSummary {
            label: self.label.clone(),
            confinement: self.confinement.to(unit).value(),
            enthalpy: self.enthalpy.to(unit).value(),
            entropic: self.entropy.free_energy.to(unit).value(),
            entropy: self.entropy.entropy,
            modes_used: self.entropy.spectrum.modes_used(),
            modes_degenerate: self.entropy.spectrum.degenerate.len(),
            total: self.total(unit).value(),
        }
    }
}

/// Bootstrap estimates of the two resampled differences, both taken as A - B.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferenceUncertainties {
    pub enthalpy: BootstrapEstimate,
    pub confinement: BootstrapEstimate,
    /// Unit of the resampled series both estimates were computed from.
    pub unit: EnergyUnit,
}

pub fn aggregate(
    a: &StateTerms,
    b: &StateTerms,
    uncertainties: DifferenceUncertainties,
    temperature_k: f64,
    unit: EnergyUnit,
) -> FreeEnergyReport {
    let method: EntropyMethod = a.entropy.method;
    if b.entropy.method != method {
        log::warn!(
            "states `{}` and `{}` used different entropy estimators ({} vs {})",
            a.label,
            b.label,
            method,
            b.entropy.method
        );
    }
    let state_a = a.summary(unit);
    let state_b = b.summary(unit);

    let factor = Energy::new(1.0, uncertainties.unit).to(unit).value();
    let enthalpy_bootstrap = uncertainties.enthalpy.scaled(factor);
    let confinement_bootstrap = uncertainties.confinement.scaled(factor);
    let sigma_h = enthalpy_bootstrap.std_dev;
    let sigma_c = confinement_bootstrap.std_dev;

    let confinement = TermDifference {
        value: state_a.confinement - state_b.confinement,
        uncertainty: Uncertainty::Estimated(sigma_c),
    };
    let enthalpy = TermDifference {
        value: state_a.enthalpy - state_b.enthalpy,
        uncertainty: Uncertainty::Estimated(sigma_h),
    };
    let entropic = TermDifference {
        value: state_a.entropic - state_b.entropic,
        uncertainty: Uncertainty::Unestimated,
    };
    let total = TermDifference {
        value: state_a.total - state_b.total,
        uncertainty: Uncertainty::Estimated((sigma_h * sigma_h + sigma_c * sigma_c).sqrt()),
    };

    let experimental = a.entropy.method.is_experimental() || b.entropy.method.is_experimental();
    log::info!(
        "dG({} - {}) = {:.3} {} (confinement {:.3}, enthalpy {:.3}, -TS {:.3})",
        state_a.label,
        state_b.label,
        total.value,
        unit.symbol(),
        confinement.value,
        enthalpy.value,
        entropic.value
    );

    FreeEnergyReport {
        created: chrono::Local::now().to_rfc3339(),
        unit,
        temperature_k,
        entropy_method: method,
        experimental,
        state_a,
        state_b,
        confinement,
        enthalpy,
        entropic,
        total,
        enthalpy_bootstrap,
        confinement_bootstrap,
    }
}
