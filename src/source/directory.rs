//! Filesystem layout of a confinement run:
//!
//! ```text
//! <root>/<state>/force_constants.dat
//! <root>/<state>/<step>/trajectory.xyz
//! <root>/<state>/<step>/structure.xyz
//! <root>/<state>/<step>/system.json
//! <root>/<state>/<step>/energies.dat
//! ```
//!
//! Paths are always built from the root; the process working directory is never changed.

use crate::config::EnergyModel;
use crate::error::{CcrError, Result};
use crate::schedule::RestraintSchedule;
use crate::source::energy::{LennardJonesModel, PotentialEnergy, TabulatedEnergies};
use crate::source::system::SystemDescription;
use crate::source::xyz::read_xyz;
use crate::source::{select_atoms, TrajectorySource};
use ndarray::{Array2, Array3, Axis};
use std::path::PathBuf;

pub const SCHEDULE_FILE: &str = "force_constants.dat";
pub const TRAJECTORY_FILE: &str = "trajectory.xyz";
pub const STRUCTURE_FILE: &str = "structure.xyz";
pub const SYSTEM_FILE: &str = "system.json";
pub const ENERGIES_FILE: &str = "energies.dat";

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    schedule_header_lines: usize,
    energy_model: EnergyModel,
}

impl DirectorySource {
    pub fn new(
        root: impl Into<PathBuf>,
        schedule_header_lines: usize,
        energy_model: EnergyModel,
    ) -> Self {
        Self {
            root: root.into(),
            schedule_header_lines,
            energy_model,
        }
    }

    pub fn state_dir(&self, state: &str) -> Result<PathBuf> {
        existing_dir(self.root.join(state))
    }

    pub fn step_dir(&self, state: &str, step: usize) -> Result<PathBuf> {
        existing_dir(self.state_dir(state)?.join(step.to_string()))
    }

    fn system(&self, state: &str, step: usize) -> Result<SystemDescription> {
        SystemDescription::from_file(self.step_dir(state, step)?.join(SYSTEM_FILE))
    }
}

fn existing_dir(path: PathBuf) -> Result<PathBuf> {
    if path.is_dir() {
        Ok(path)
    } else {
        Err(CcrError::MissingTrajectoryData { path })
    }
}

impl TrajectorySource for DirectorySource {
    fn load_restraint_schedule(&self, state: &str) -> Result<RestraintSchedule> {
        RestraintSchedule::from_file(
            self.state_dir(state)?.join(SCHEDULE_FILE),
            self.schedule_header_lines,
        )
    }

    fn load_reference_coordinates(&self, state: &str, step: usize) -> Result<Array2<f64>> {
        let structure = read_xyz(self.step_dir(state, step)?.join(STRUCTURE_FILE))?;
        Ok(structure.first_frame())
    }

    fn load_trajectory(
        &self,
        state: &str,
        step: usize,
        atoms: Option<&[usize]>,
    ) -> Result<Array3<f64>> {
        let traj = read_xyz(self.step_dir(state, step)?.join(TRAJECTORY_FILE))?;
        select_atoms(&traj.coordinates, Axis(1), atoms)
    }

    fn load_system_masses(
        &self,
        state: &str,
        step: usize,
        atoms: Option<&[usize]>,
    ) -> Result<Vec<f64>> {
        let masses = self.system(state, step)?.masses();
        match atoms {
            None => Ok(masses),
            Some(atoms) => atoms
                .iter()
                .map(|&i| {
                    masses.get(i).copied().ok_or(CcrError::LengthMismatch {
                        what: "atom selection index and atom count",
                        left: i,
                        right: masses.len(),
                    })
                })
                .collect(),
        }
    }

    fn heavy_atoms(&self, state: &str, step: usize, hydrogen_cutoff: f64) -> Result<Vec<usize>> {
        Ok(self.system(state, step)?.heavy_atom_indices(hydrogen_cutoff))
    }

    fn load_energy_model(&self, state: &str, step: usize) -> Result<Box<dyn PotentialEnergy>> {
        let dir = self.step_dir(state, step)?;
        Ok(match self.energy_model {
            EnergyModel::Tabulated => {
                Box::new(TabulatedEnergies::from_file(dir.join(ENERGIES_FILE))?)
            }
            EnergyModel::LennardJones => {
                let system = SystemDescription::from_file(dir.join(SYSTEM_FILE))?;
                Box::new(LennardJonesModel::new(&system))
            }
        })
    }
}
