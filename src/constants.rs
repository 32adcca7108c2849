//! Physical constants (CODATA 2018, SI) and the thermal context handed to every estimator.

use crate::error::{CcrError, Result};

pub const BOLTZMANN_J_PER_K: f64 = 1.380_649e-23;
pub const PLANCK_J_S: f64 = 6.626_070_15e-34;
pub const REDUCED_PLANCK_J_S: f64 = PLANCK_J_S / (2.0 * std::f64::consts::PI);
pub const AVOGADRO_PER_MOL: f64 = 6.022_140_76e23;

/// Default simulation temperature in kelvin.
pub const DEFAULT_TEMPERATURE_K: f64 = 300.0;

/// Immutable set of constants for one run.
///
/// Passed by reference into the estimators so two states processed at different
/// temperatures can never see each other's values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalContext {
    pub temperature_k: f64,
    pub boltzmann: f64,
    pub planck: f64,
    pub reduced_planck: f64,
    pub avogadro: f64,
}

impl ThermalContext {
    pub fn new(temperature_k: f64) -> Result<Self> {
        if !(temperature_k.is_finite() && temperature_k > 0.0) {
            return Err(CcrError::InvalidConfig(format!(
                "temperature must be positive, got {temperature_k} K"
            )));
        }
        Ok(Self {
            temperature_k,
            boltzmann: BOLTZMANN_J_PER_K,
            planck: PLANCK_J_S,
            reduced_planck: REDUCED_PLANCK_J_S,
            avogadro: AVOGADRO_PER_MOL,
        })
    }

    /// kB·T in joules.
    pub fn kt(&self) -> f64 {
        self.boltzmann * self.temperature_k
    }
}
