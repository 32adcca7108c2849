/*

=========================================================
 Confinement free-energy post-processing
 Based on:
 "Calculation of Free-Energy Differences by Confinement Simulations.
  Application to Peptide Conformers" (Cecchini, Krivov, Spichty, Karplus)
 J. Phys. Chem. B 2009, 113, 9728-9740
=========================================================

Restraint schedule
------------------
Each state is simulated at a ladder of harmonic force constants
k_1 > ... > k_N. Step i gives a trajectory; the mean squared deviation
from the reference structure (chi-squared) is recorded per step.

Confinement free energy
-----------------------
Between neighbouring steps chi is taken as a local power law,
    chi(k) = a k^b,   b = ln(chi_2/chi_1) / ln(k_2/k_1)
which integrates in closed form:
    L = (k_2 chi_2 - k_1 chi_1) / (b + 1)
b = -1 is degenerate and reported as an error.

Quasiharmonic entropy
---------------------
Mode variances sigma^2 of the mass-weighted covariance of the
fully restrained step give
    alpha = h / sqrt(kT sigma^2),   S = -kB sum ln alpha
and the entropic free energy G = -T S.

Difference
----------
    dG(A -> B) = dG_conf + dH - T dS   (reported as A - B)

*/

pub mod config;
pub mod constants;
pub mod dump;
pub mod error;
pub mod free_energy;
pub mod pipeline;
pub mod report;
pub mod schedule;
pub mod series;
pub mod source;
pub mod units;

pub use config::{AnalysisConfig, EnergyModel};
pub use constants::ThermalContext;
pub use error::{CcrError, Result};
pub use free_energy::quasiharmonic::EntropyMethod;
pub use report::FreeEnergyReport;
pub use source::directory::DirectorySource;
pub use source::TrajectorySource;
