//! Per-frame series extracted from the step trajectories: chi-squared deviations from the
//! reference structure and potential energies of the final step.

use crate::error::{CcrError, Result};
use crate::units::{Energy, EnergyUnit};
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayView3, Axis};

/// Per-frame chi-squared: the mean over atoms of |x - x_ref|².
pub fn squared_deviations(
    trajectory: ArrayView3<'_, f64>,
    reference: ArrayView2<'_, f64>,
) -> Result<Array1<f64>> {
    let (_, n_atoms, n_dim) = trajectory.dim();
    if reference.dim() != (n_atoms, n_dim) {
        return Err(CcrError::LengthMismatch {
            what: "trajectory atoms and reference atoms",
            left: n_atoms,
            right: reference.nrows(),
        });
    }
    if n_atoms == 0 {
        return Err(CcrError::InsufficientSamples {
            what: "atoms in chi-squared selection".to_string(),
            found: 0,
        });
    }
    let chi = trajectory
        .axis_iter(Axis(0))
        .map(|frame| {
            let diff = &frame - &reference;
            diff.mapv(|d| d * d).sum() / n_atoms as f64
        })
        .collect();
    Ok(chi)
}

/// Per-frame chi-squared for every step of one state, in schedule order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquaredSeries {
    steps: Vec<Array1<f64>>,
}

impl ChiSquaredSeries {
    pub fn new(steps: Vec<Array1<f64>>) -> Result<Self> {
        if let Some(step) = steps.iter().position(|s| s.is_empty()) {
            return Err(CcrError::InsufficientSamples {
                what: format!("chi-squared frames of step {step}"),
                found: 0,
            });
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, step: usize) -> ArrayView1<'_, f64> {
        self.steps[step].view()
    }

    pub fn steps(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.steps.iter().map(|s| s.view())
    }

    /// Scalar form: mean chi-squared per step.
    pub fn means(&self) -> Vec<f64> {
        self.steps
            .iter()
            .map(|s| s.sum() / s.len() as f64)
            .collect()
    }
}

/// Potential energy of every frame of the final step.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySeries {
    values: Vec<f64>,
    unit: EnergyUnit,
}

impl EnergySeries {
    pub fn new(values: Vec<f64>, unit: EnergyUnit) -> Result<Self> {
        if values.is_empty() {
            return Err(CcrError::InsufficientSamples {
                what: "potential energy frames".to_string(),
                found: 0,
            });
        }
        if let Some(index) = values.iter().position(|e| !e.is_finite()) {
            return Err(CcrError::Parse {
                path: "<energy series>".into(),
                line: index + 1,
                reason: format!("frame {index} has a non-finite energy {}", values[index]),
            });
        }
        Ok(Self { values, unit })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn unit(&self) -> EnergyUnit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The residual enthalpy: mean potential energy.
    pub fn mean(&self) -> Energy {
        Energy::new(
            self.values.iter().sum::<f64>() / self.values.len() as f64,
            self.unit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array3};

    #[test]
    fn chi_squared_per_frame() {
        let reference = array![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let mut traj = Array3::zeros((2, 2, 3));
        // frame 0 equals the reference, frame 1 shifts both atoms by (0.1, 0.2, 0.2)
        traj[[0, 1, 0]] = 1.0;
        for atom in 0..2 {
            traj[[1, atom, 0]] = reference[[atom, 0]] + 0.1;
            traj[[1, atom, 1]] = 0.2;
            traj[[1, atom, 2]] = 0.2;
        }
        let chi = squared_deviations(traj.view(), reference.view()).unwrap();
        assert_eq!(chi.len(), 2);
        assert_relative_eq!(chi[0], 0.0);
        assert_relative_eq!(chi[1], 0.09, epsilon = 1e-12);
    }

    #[test]
    fn chi_squared_shape_mismatch() {
        let reference = array![[0.0, 0.0, 0.0]];
        let traj = Array3::zeros((3, 2, 3));
        assert!(matches!(
            squared_deviations(traj.view(), reference.view()),
            Err(CcrError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn series_means() {
        let series = ChiSquaredSeries::new(vec![array![1.0, 3.0], array![0.5, 0.5, 2.0]]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.means(), vec![2.0, 1.0]);
        assert!(ChiSquaredSeries::new(vec![array![1.0], Array1::zeros(0)]).is_err());
    }

    #[test]
    fn energy_mean_and_validation() {
        let energies =
            EnergySeries::new(vec![-10.0, -12.0, -11.0], EnergyUnit::KilojoulePerMole).unwrap();
        assert_relative_eq!(energies.mean().value(), -11.0);
        assert_eq!(energies.values(), &[-10.0, -12.0, -11.0]);
        assert!(EnergySeries::new(Vec::new(), EnergyUnit::KilojoulePerMole).is_err());
        assert!(EnergySeries::new(vec![1.0, f64::NAN], EnergyUnit::KilojoulePerMole).is_err());
    }
}
