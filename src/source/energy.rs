//! Potential-energy models used to build the energy series of the final step.

use crate::error::{CcrError, Result};
use crate::source::system::SystemDescription;
use ndarray::ArrayView2;
use std::fs;
use std::path::Path;

/// Potential energy of one configuration (atoms × 3) of a system.
pub trait PotentialEnergy {
    fn potential_energy(&self, frame: usize, coordinates: ArrayView2<'_, f64>) -> Result<f64>;

    /// Number of frames the model is tied to, if any.
    fn frames(&self) -> Option<usize> {
        None
    }
}

/// 12-6 Lennard-Jones pair energy.
pub fn lennard_jones_potential(r: f64, sigma: f64, epsilon: f64) -> f64 {
    if r < 1e-9 {
        return 0.0; // coincident sites
    }
    let sr6 = (sigma / r).powi(6);
    4.0 * epsilon * (sr6 * sr6 - sr6)
}

/// Pairwise Lennard-Jones energy with Lorentz-Berthelot mixing.
#[derive(Debug, Clone, PartialEq)]
pub struct LennardJonesModel {
    sigma: Vec<f64>,
    epsilon: Vec<f64>,
}

impl LennardJonesModel {
    pub fn new(system: &SystemDescription) -> Self {
        Self {
            sigma: system.atoms.iter().map(|a| a.sigma).collect(),
            epsilon: system.atoms.iter().map(|a| a.epsilon).collect(),
        }
    }
}

impl PotentialEnergy for LennardJonesModel {
    fn potential_energy(&self, _frame: usize, coordinates: ArrayView2<'_, f64>) -> Result<f64> {
        let n = self.sigma.len();
        if coordinates.nrows() != n {
            return Err(CcrError::LengthMismatch {
                what: "configuration atoms and system atoms",
                left: coordinates.nrows(),
                right: n,
            });
        }
        let mut total_energy = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let sigma = 0.5 * (self.sigma[i] + self.sigma[j]);
                let epsilon = (self.epsilon[i] * self.epsilon[j]).sqrt();
                if epsilon == 0.0 {
                    continue;
                }
                let r_vec = &coordinates.row(j) - &coordinates.row(i);
                let r = r_vec.dot(&r_vec).sqrt();
                total_energy += lennard_jones_potential(r, sigma, epsilon);
            }
        }
        Ok(total_energy)
    }
}

/// Energies computed elsewhere, one per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedEnergies {
    energies: Vec<f64>,
}

impl TabulatedEnergies {
    pub fn new(energies: Vec<f64>) -> Self {
        Self { energies }
    }

    /// One energy per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CcrError::io(path, source))?;
        let mut energies = Vec::new();
        for (line_idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let value: f64 = line.parse().map_err(|_| CcrError::Parse {
                path: path.to_path_buf(),
                line: line_idx + 1,
                reason: format!("expected an energy, found `{line}`"),
            })?;
            energies.push(value);
        }
        Ok(Self { energies })
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

impl PotentialEnergy for TabulatedEnergies {
    fn potential_energy(&self, frame: usize, _coordinates: ArrayView2<'_, f64>) -> Result<f64> {
        self.energies
            .get(frame)
            .copied()
            .ok_or(CcrError::LengthMismatch {
                what: "trajectory frames and tabulated energies",
                left: frame + 1,
                right: self.energies.len(),
            })
    }

    fn frames(&self) -> Option<usize> {
        Some(self.energies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::system::AtomParameters;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn atom(sigma: f64, epsilon: f64) -> AtomParameters {
        AtomParameters {
            element: "Ar".to_string(),
            mass: 39.948,
            sigma,
            epsilon,
        }
    }

    #[test]
    fn minimum_at_two_to_the_sixth() {
        let r_min = 2.0_f64.powf(1.0 / 6.0);
        assert_relative_eq!(lennard_jones_potential(r_min, 1.0, 0.5), -0.5, epsilon = 1e-12);
        assert_relative_eq!(lennard_jones_potential(1.0, 1.0, 0.5), 0.0, epsilon = 1e-12);
        assert_eq!(lennard_jones_potential(0.0, 1.0, 0.5), 0.0);
    }

    #[test]
    fn mixing_rules() {
        let system = SystemDescription {
            atoms: vec![atom(0.3, 1.0), atom(0.5, 4.0)],
        };
        let model = LennardJonesModel::new(&system);
        let r = 0.4 * 2.0_f64.powf(1.0 / 6.0);
        let coords = array![[0.0, 0.0, 0.0], [0.0, r, 0.0]];
        let energy = model.potential_energy(0, coords.view()).unwrap();
        assert_relative_eq!(energy, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn three_body_sum_skips_uncharged() {
        let system = SystemDescription {
            atoms: vec![atom(1.0, 1.0), atom(1.0, 1.0), atom(1.0, 0.0)],
        };
        let model = LennardJonesModel::new(&system);
        let coords = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.5]];
        let energy = model.potential_energy(0, coords.view()).unwrap();
        assert_relative_eq!(energy, 0.0, epsilon = 1e-12);
        assert!(model.potential_energy(0, coords.slice(ndarray::s![..2, ..])).is_err());
    }

    #[test]
    fn tabulated_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energies.dat");
        std::fs::write(&path, "# potential energy (kJ/mol)\n-100.5\n-101.0\n\n-99.5\n").unwrap();
        let table = TabulatedEnergies::from_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.frames(), Some(3));
        let coords = array![[0.0, 0.0, 0.0]];
        assert_eq!(table.potential_energy(1, coords.view()).unwrap(), -101.0);
        assert!(table.potential_energy(3, coords.view()).is_err());

        std::fs::write(&path, "-1.0\nnot-a-number\n").unwrap();
        assert!(matches!(
            TabulatedEnergies::from_file(&path),
            Err(CcrError::Parse { line: 2, .. })
        ));
    }
}
