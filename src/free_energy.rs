//! Free-energy estimators of the confinement cycle.
//!
//! - [`integration`]: thermodynamic integration over the restraint schedule
//! - [`quasiharmonic`]: entropy of the fully restrained state
//! - [`bootstrap`]: resampled uncertainties
//! - [`aggregate`]: the A − B difference and its error budget

pub mod aggregate;
pub mod bootstrap;
pub mod integration;
pub mod quasiharmonic;
