//! Access to per-state, per-step simulation data.
//!
//! The estimators only see the [`TrajectorySource`] trait. [`directory::DirectorySource`]
//! implements it over the on-disk layout written by the simulation setup.

pub mod directory;
pub mod energy;
pub mod system;
pub mod xyz;

use crate::error::{CcrError, Result};
use crate::schedule::RestraintSchedule;
use ndarray::{Array2, Array3, ArrayBase, Axis, Data, Dimension, RemoveAxis};

pub use energy::PotentialEnergy;

pub trait TrajectorySource {
    fn load_restraint_schedule(&self, state: &str) -> Result<RestraintSchedule>;

    /// Structure of `step`, atoms × 3.
    fn load_reference_coordinates(&self, state: &str, step: usize) -> Result<Array2<f64>>;

    /// Trajectory of `step`, frames × atoms × 3, optionally restricted to `atoms`.
    fn load_trajectory(
        &self,
        state: &str,
        step: usize,
        atoms: Option<&[usize]>,
    ) -> Result<Array3<f64>>;

    /// Masses in amu, optionally restricted to `atoms`.
    fn load_system_masses(
        &self,
        state: &str,
        step: usize,
        atoms: Option<&[usize]>,
    ) -> Result<Vec<f64>>;

    /// Atoms that are not hydrogens, by mass.
    fn heavy_atoms(&self, state: &str, step: usize, hydrogen_cutoff: f64) -> Result<Vec<usize>>;

    fn load_energy_model(&self, state: &str, step: usize) -> Result<Box<dyn PotentialEnergy>>;
}

/// Keep only `atoms` along `axis`, checking every index first.
pub(crate) fn select_atoms<S, D>(
    array: &ArrayBase<S, D>,
    axis: Axis,
    atoms: Option<&[usize]>,
) -> Result<ndarray::Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension + RemoveAxis,
{
    match atoms {
        None => Ok(array.to_owned()),
        Some(atoms) => {
            let n = array.len_of(axis);
            if let Some(&bad) = atoms.iter().find(|&&i| i >= n) {
                return Err(CcrError::LengthMismatch {
                    what: "atom selection index and atom count",
                    left: bad,
                    right: n,
                });
            }
            Ok(array.select(axis, atoms))
        }
    }
}
