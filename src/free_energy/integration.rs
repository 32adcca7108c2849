//! Confinement free energy by thermodynamic integration over the restraint force constant.
//!
//! Each pair of neighbouring points is joined by a local power law `chi = c k^b`, whose
//! integral over `[k_i, k_{i+1}]` is exact:
//!
//! ```text
//! b   = (ln chi[i+1] - ln chi[i]) / (ln k[i+1] - ln k[i])
//! L_i = (chi[i+1] k[i+1] - chi[i] k[i]) / (b + 1)
//! ```
//!
//! Cecchini, Krivov, Spichty & Karplus, J. Phys. Chem. B 113, 9728 (2009), eq. 14.

use crate::error::{CcrError, Result};
use itertools::Itertools;

/// `b + 1` closer to zero than this makes a segment undefined.
const SLOPE_TOLERANCE: f64 = 1.0e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTerm {
    pub segment: usize,
    pub k_start: f64,
    pub k_end: f64,
    pub slope: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Integral {
    pub total: f64,
    pub segments: Vec<SegmentTerm>,
}

/// Integrate `chi` over `k`. The two slices must be co-indexed; their order is otherwise free.
pub fn integrate(force_constants: &[f64], chi_squared: &[f64]) -> Result<Integral> {
    if force_constants.len() != chi_squared.len() {
        return Err(CcrError::LengthMismatch {
            what: "force constants and chi-squared series",
            left: force_constants.len(),
            right: chi_squared.len(),
        });
    }
    if force_constants.len() < 2 {
        return Err(CcrError::InsufficientSamples {
            what: "thermodynamic integration points".to_string(),
            found: force_constants.len(),
        });
    }
    check_positive("force constant", force_constants)?;
    check_positive("chi-squared", chi_squared)?;

    let segments = force_constants
        .iter()
        .zip(chi_squared)
        .tuple_windows()
        .enumerate()
        .map(|(segment, ((&k0, &c0), (&k1, &c1)))| segment_term(segment, k0, k1, c0, c1))
        .collect::<Result<Vec<_>>>()?;

    let total = segments.iter().map(|s| s.contribution).sum();
    Ok(Integral { total, segments })
}

/// Convenience wrapper returning only the total.
pub fn confinement_free_energy(force_constants: &[f64], chi_squared: &[f64]) -> Result<f64> {
    integrate(force_constants, chi_squared).map(|integral| integral.total)
}

fn segment_term(segment: usize, k0: f64, k1: f64, c0: f64, c1: f64) -> Result<SegmentTerm> {
    let log_dk = k1.ln() - k0.ln();
    if log_dk == 0.0 {
        // equal force constants, the slope has no meaning
        return Err(CcrError::DegenerateIntegrationSegment {
            segment,
            slope: f64::NAN,
        });
    }
    let slope = (c1.ln() - c0.ln()) / log_dk;
    if (slope + 1.0).abs() <= SLOPE_TOLERANCE {
        return Err(CcrError::DegenerateIntegrationSegment { segment, slope });
    }
    let contribution = (c1 * k1 - c0 * k0) / (slope + 1.0);
    if !contribution.is_finite() {
        return Err(CcrError::DegenerateIntegrationSegment { segment, slope });
    }
    log::debug!(
        "segment {segment}: k {k0} -> {k1}, slope {slope:.4}, contribution {contribution:.6}"
    );
    Ok(SegmentTerm {
        segment,
        k_start: k0,
        k_end: k1,
        slope,
        contribution,
    })
}

fn check_positive(what: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
        Some(index) => Err(CcrError::NonPositiveValue {
            what,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn power_law(c: f64, p: f64, k: &[f64]) -> Vec<f64> {
        k.iter().map(|k| c * k.powf(p)).collect()
    }

    /// Closed form of the integral of c k^p from `from` to `to`.
    fn analytic(c: f64, p: f64, from: f64, to: f64) -> f64 {
        c * (to.powf(p + 1.0) - from.powf(p + 1.0)) / (p + 1.0)
    }

    #[test]
    fn four_step_ladder_square_root_law() {
        let k = [100.0, 50.0, 25.0, 12.5];
        let chi = power_law(0.001, 0.5, &k);
        let dg = confinement_free_energy(&k, &chi).unwrap();
        let expected = 0.001 * (2.0 / 3.0) * (12.5_f64.powf(1.5) - 100.0_f64.powf(1.5));
        assert_relative_eq!(dg, expected, max_relative = 1e-6);
    }

    #[test]
    fn reproduces_power_laws() {
        let k = [1000.0, 300.0, 90.0, 20.0, 4.0, 0.5];
        for &p in &[-2.5, -1.5, -0.5, 0.0, 0.7, 2.0] {
            let chi = power_law(0.3, p, &k);
            let dg = confinement_free_energy(&k, &chi).unwrap();
            assert_relative_eq!(dg, analytic(0.3, p, 1000.0, 0.5), max_relative = 1e-9);
        }
    }

    #[test]
    fn segments_report_local_slope() {
        let k = [16.0, 4.0, 1.0];
        let chi = power_law(2.0, -0.5, &k);
        let integral = integrate(&k, &chi).unwrap();
        assert_eq!(integral.segments.len(), 2);
        for s in &integral.segments {
            assert_relative_eq!(s.slope, -0.5, epsilon = 1e-12);
        }
        assert_relative_eq!(
            integral.segments[0].contribution + integral.segments[1].contribution,
            integral.total
        );
    }

    #[test]
    fn slope_of_minus_one_is_rejected() {
        // chi * k constant on the second segment gives b = -1
        let k = [100.0, 10.0, 1.0];
        let chi = [0.5, 0.1, 1.0];
        match integrate(&k, &chi) {
            Err(CcrError::DegenerateIntegrationSegment { segment, slope }) => {
                assert_eq!(segment, 1);
                assert_relative_eq!(slope, -1.0, epsilon = 1e-12);
            }
            other => panic!("expected a degenerate segment, got {other:?}"),
        }
    }

    #[test]
    fn equal_neighbouring_force_constants_rejected() {
        let err = integrate(&[10.0, 10.0], &[0.1, 0.2]).unwrap_err();
        assert!(matches!(
            err,
            CcrError::DegenerateIntegrationSegment { segment: 0, .. }
        ));
    }

    #[test]
    fn invalid_inputs() {
        assert!(matches!(
            integrate(&[10.0, 1.0], &[0.1]),
            Err(CcrError::LengthMismatch { .. })
        ));
        assert!(matches!(
            integrate(&[10.0], &[0.1]),
            Err(CcrError::InsufficientSamples { .. })
        ));
        assert!(matches!(
            integrate(&[10.0, 0.0], &[0.1, 0.2]),
            Err(CcrError::NonPositiveValue { index: 1, .. })
        ));
        assert!(matches!(
            integrate(&[10.0, 1.0], &[0.0, 0.2]),
            Err(CcrError::NonPositiveValue { index: 0, .. })
        ));
    }

    #[test]
    fn co_indexed_permutation_keeps_result() {
        let k = [100.0, 50.0, 25.0, 12.5];
        let chi = power_law(0.001, 0.5, &k);
        let reference = confinement_free_energy(&k, &chi).unwrap();

        // same permutation applied to both arrays, endpoints kept
        let order = [0, 2, 1, 3];
        let k_perm: Vec<f64> = order.iter().map(|&i| k[i]).collect();
        let chi_perm: Vec<f64> = order.iter().map(|&i| chi[i]).collect();
        let permuted = confinement_free_energy(&k_perm, &chi_perm).unwrap();
        assert_relative_eq!(permuted, reference, max_relative = 1e-9);
    }

    #[test]
    fn reversing_one_array_breaks_result() {
        let k = [100.0, 50.0, 25.0, 12.5];
        let chi = power_law(0.001, 0.5, &k);
        let reference = confinement_free_energy(&k, &chi).unwrap();

        let mut chi_rev = chi.clone();
        chi_rev.reverse();
        match confinement_free_energy(&k, &chi_rev) {
            Ok(wrong) => assert!((wrong - reference).abs() > 1e-3 * reference.abs()),
            Err(_) => {}
        }
    }

    #[test]
    fn reversing_both_arrays_negates() {
        let k = [100.0, 50.0, 25.0, 12.5];
        let chi = power_law(0.001, 0.5, &k);
        let forward = confinement_free_energy(&k, &chi).unwrap();
        let k_rev: Vec<f64> = k.iter().rev().copied().collect();
        let chi_rev: Vec<f64> = chi.iter().rev().copied().collect();
        let backward = confinement_free_energy(&k_rev, &chi_rev).unwrap();
        assert_relative_eq!(backward, -forward, max_relative = 1e-12);
    }
}
