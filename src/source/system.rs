//! Serialized system description: per-atom mass and Lennard-Jones parameters.

use crate::error::{CcrError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AtomParameters {
    #[serde(default)]
    pub element: String,
    /// amu
    pub mass: f64,
    #[serde(default)]
    pub sigma: f64,
    #[serde(default)]
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemDescription {
    pub atoms: Vec<AtomParameters>,
}

impl SystemDescription {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CcrError::io(path, source))?;
        let system: Self = serde_json::from_str(&text).map_err(|source| CcrError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(index) = system
            .atoms
            .iter()
            .position(|a| !(a.mass.is_finite() && a.mass > 0.0))
        {
            return Err(CcrError::NonPositiveValue {
                what: "mass",
                index,
                value: system.atoms[index].mass,
            });
        }
        Ok(system)
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.atoms.iter().map(|a| a.mass).collect()
    }

    /// Atoms at least as heavy as `hydrogen_cutoff` amu.
    pub fn heavy_atom_indices(&self, hydrogen_cutoff: f64) -> Vec<usize> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.mass >= hydrogen_cutoff)
            .map(|(i, _)| i)
            .collect()
    }
}
