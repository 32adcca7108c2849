//! The whole post-processing run: both states, the bootstrap, the report and the dumps.

use crate::config::AnalysisConfig;
use crate::constants::ThermalContext;
use crate::dump;
use crate::error::{CcrError, Result};
use crate::free_energy::aggregate::{aggregate, DifferenceUncertainties, StateTerms};
use crate::free_energy::bootstrap::Bootstrap;
use crate::free_energy::integration::{self, Integral};
use crate::free_energy::quasiharmonic::{self, QuasiharmonicEntropy, QuasiharmonicOptions};
use crate::report::FreeEnergyReport;
use crate::schedule::RestraintSchedule;
use crate::series::{squared_deviations, ChiSquaredSeries, EnergySeries};
use crate::source::{select_atoms, TrajectorySource};
use crate::units::Energy;
use kdam::{tqdm, Bar, BarExt};
use ndarray::Axis;
use std::fs;
use std::path::Path;

/// Everything computed for one state.
#[derive(Debug, Clone)]
pub struct StateAnalysis {
    pub label: String,
    pub schedule: RestraintSchedule,
    pub chi_squared: ChiSquaredSeries,
    pub integral: Integral,
    pub energies: EnergySeries,
    pub entropy: QuasiharmonicEntropy,
}

impl StateAnalysis {
    pub fn terms(&self, config: &AnalysisConfig) -> StateTerms {
        StateTerms {
            label: self.label.clone(),
            confinement: Energy::new(self.integral.total, config.energy_unit),
            enthalpy: self.energies.mean(),
            entropy: self.entropy.clone(),
        }
    }
}

fn tick(pb: &mut Bar) {
    if let Err(e) = pb.update(1) {
        log::debug!("progress bar not updated: {e}");
    }
}

/// Load and reduce every step of one state.
pub fn analyze_state(
    source: &dyn TrajectorySource,
    label: &str,
    config: &AnalysisConfig,
    ctx: &ThermalContext,
    show_progress: bool,
) -> Result<StateAnalysis> {
    let schedule = source.load_restraint_schedule(label)?;
    let final_step = schedule.final_step();
    log::info!(
        "State `{label}`: {} steps, force constants {:?}",
        schedule.len(),
        schedule.force_constants()
    );

    let selection = if config.exclude_hydrogens {
        let heavy = source.heavy_atoms(label, final_step, config.hydrogen_mass_cutoff)?;
        log::info!("State `{label}`: {} heavy atoms selected", heavy.len());
        Some(heavy)
    } else {
        None
    };
    let selection = selection.as_deref();

    let reference = select_atoms(
        &source.load_reference_coordinates(label, final_step)?,
        Axis(0),
        selection,
    )?;

    let mut pb = tqdm!(
        total = schedule.len(),
        desc = format!("state {label}"),
        disable = !show_progress
    );
    let mut steps = Vec::with_capacity(schedule.len());
    for step in 0..final_step {
        let traj = source.load_trajectory(label, step, selection)?;
        steps.push(squared_deviations(traj.view(), reference.view())?);
        tick(&mut pb);
    }

    // the final step feeds the chi-squared series, the energies and the entropy
    let final_traj = source.load_trajectory(label, final_step, None)?;
    let selected = select_atoms(&final_traj, Axis(1), selection)?;
    steps.push(squared_deviations(selected.view(), reference.view())?);
    tick(&mut pb);

    let chi_squared = ChiSquaredSeries::new(steps)?;
    let integral = integration::integrate(schedule.force_constants(), &chi_squared.means())?;
    log::info!(
        "State `{label}`: confinement free energy {:.4} {}",
        integral.total,
        config.energy_unit.symbol()
    );

    let model = source.load_energy_model(label, final_step)?;
    let n_frames = final_traj.len_of(Axis(0));
    if let Some(tabulated) = model.frames() {
        if tabulated != n_frames {
            return Err(CcrError::LengthMismatch {
                what: "trajectory frames and tabulated energies",
                left: n_frames,
                right: tabulated,
            });
        }
    }
    let energies = final_traj
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(frame, coords)| model.potential_energy(frame, coords))
        .collect::<Result<Vec<f64>>>()?;
    let energies = EnergySeries::new(energies, config.energy_unit)?;
    log::info!(
        "State `{label}`: mean potential energy {:.4} over {} frames",
        energies.mean(),
        energies.len()
    );

    let masses = source.load_system_masses(label, final_step, selection)?;
    let options = QuasiharmonicOptions {
        method: config.entropy_method,
        rigid_body_modes: config.rigid_body_modes,
        degenerate_tolerance: config.degenerate_tolerance,
        length_unit: config.length_unit,
    };
    let entropy = quasiharmonic::estimate(selected.view(), &masses, ctx, &options)?;
    log::info!(
        "State `{label}`: S = {:.4} J/(K mol), -TS = {:.4}",
        entropy.entropy,
        entropy.free_energy.to(config.energy_unit)
    );

    Ok(StateAnalysis {
        label: label.to_string(),
        schedule,
        chi_squared,
        integral,
        energies,
        entropy,
    })
}

/// Process both states and build the report. Dumps are written when `output` is given.
pub fn run(
    source: &dyn TrajectorySource,
    config: &AnalysisConfig,
    output: Option<&Path>,
    show_progress: bool,
) -> Result<FreeEnergyReport> {
    config.validate()?;
    config.info();
    let ctx = config.thermal_context()?;

    let a = analyze_state(source, &config.state_a, config, &ctx, show_progress)?;
    let b = analyze_state(source, &config.state_b, config, &ctx, show_progress)?;

    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("Bootstrap seed: {seed}");
    let bootstrap = Bootstrap::new(config.bootstrap_replicates, seed, config.confidence)?;
    let uncertainties = DifferenceUncertainties {
        enthalpy: bootstrap.mean_difference(a.energies.values(), b.energies.values())?,
        confinement: bootstrap
            .confinement_difference((&a.schedule, &a.chi_squared), (&b.schedule, &b.chi_squared))?,
        unit: config.energy_unit,
    };

    let report = aggregate(
        &a.terms(config),
        &b.terms(config),
        uncertainties,
        ctx.temperature_k,
        config.energy_unit,
    );

    if let Some(output) = output {
        write_outputs(output, &a, &b, &report)?;
    }
    Ok(report)
}

fn write_outputs(
    output: &Path,
    a: &StateAnalysis,
    b: &StateAnalysis,
    report: &FreeEnergyReport,
) -> Result<()> {
    fs::create_dir_all(output).map_err(|source| CcrError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    for state in [a, b] {
        dump::write_chi_squared_table(
            output.join(format!("{}_chi_squared.csv", state.label)),
            &state.schedule,
            &state.chi_squared,
        )?;
        dump::write_energy_series(
            output.join(format!("{}_energies.csv", state.label)),
            &state.energies,
        )?;
    }
    dump::write_segments(
        output.join("segments.csv"),
        &[(a.label.as_str(), &a.integral), (b.label.as_str(), &b.integral)],
    )?;
    report.write_json(output.join("report.json"))?;
    log::info!("Tables and report written to `{}`", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyModel;
    use crate::free_energy::quasiharmonic::EntropyMethod;
    use crate::report::Uncertainty;
    use crate::source::directory::DirectorySource;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::Normal;
    use std::fmt::Write as _;

    const REFERENCE: [[f64; 3]; 5] = [
        [0.0, 0.0, 0.0],
        [0.15, 0.0, 0.0],
        [0.15, 0.15, 0.0],
        [0.0, 0.15, 0.1],
        [0.0, 0.0, 0.11],
    ];
    const ELEMENTS: [&str; 5] = ["C", "C", "C", "C", "H"];

    fn xyz_frame(out: &mut String, coords: &[[f64; 3]; 5]) {
        writeln!(out, "5\nframe").unwrap();
        for (element, [x, y, z]) in ELEMENTS.iter().zip(coords) {
            writeln!(out, "{element} {x} {y} {z}").unwrap();
        }
    }

    fn write_state(root: &Path, label: &str, spread: f64, energy: f64, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let force_constants = [100.0_f64, 10.0, 1.0];
        let state = root.join(label);
        fs::create_dir_all(&state).unwrap();
        let schedule: String = force_constants.iter().map(|k| format!("{k}\n")).collect();
        let schedule = format!("k (kJ/mol/nm^2)\n{schedule}");
        fs::write(state.join("force_constants.dat"), schedule).unwrap();

        for (step, k) in force_constants.iter().enumerate() {
            let dir = state.join(step.to_string());
            fs::create_dir_all(&dir).unwrap();
            let noise = Normal::new(0.0, spread * k.powf(-0.3)).unwrap();
            let mut traj = String::new();
            for _ in 0..40 {
                let mut frame = REFERENCE;
                for atom in frame.iter_mut() {
                    for x in atom.iter_mut() {
                        *x += rng.sample(noise);
                    }
                }
                xyz_frame(&mut traj, &frame);
            }
            fs::write(dir.join("trajectory.xyz"), traj).unwrap();
            let mut structure = String::new();
            xyz_frame(&mut structure, &REFERENCE);
            fs::write(dir.join("structure.xyz"), structure).unwrap();
            fs::write(
                dir.join("system.json"),
                r#"{"atoms": [{"mass": 12.011}, {"mass": 12.011}, {"mass": 12.011},
                              {"mass": 12.011}, {"mass": 1.008}]}"#,
            )
            .unwrap();
            let energies: String = (0..40)
                .map(|_| format!("{}\n", energy + rng.sample(Normal::new(0.0, 2.0).unwrap())))
                .collect();
            fs::write(dir.join("energies.dat"), energies).unwrap();
        }
    }

    fn config() -> AnalysisConfig {
        let mut config = AnalysisConfig::new(EntropyMethod::Eigen);
        config.bootstrap_replicates = 200;
        config.seed = Some(7);
        config
    }

    #[test]
    fn end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_state(dir.path(), "A", 0.02, -500.0, 1);
        write_state(dir.path(), "B", 0.01, -520.0, 2);
        let source = DirectorySource::new(dir.path(), 1, EnergyModel::Tabulated);
        let out = dir.path().join("out");

        let config = config();
        let report = run(&source, &config, Some(&out), false).unwrap();
        assert_eq!(report.state_a.label, "A");
        assert_eq!(report.state_a.modes_used, 6);
        assert!(report.enthalpy.value > 0.0);
        assert!(report.confinement.value.is_finite());
        assert_eq!(report.entropic.uncertainty, Uncertainty::Unestimated);
        assert!(matches!(report.total.uncertainty, Uncertainty::Estimated(s) if s > 0.0));
        assert!(!report.experimental);

        for file in [
            "A_chi_squared.csv",
            "B_chi_squared.csv",
            "A_energies.csv",
            "B_energies.csv",
            "segments.csv",
            "report.json",
        ] {
            assert!(out.join(file).is_file(), "{file} not written");
        }

        let mut swapped = config.clone();
        swapped.state_a = "B".to_string();
        swapped.state_b = "A".to_string();
        let reverse = run(&source, &swapped, None, false).unwrap();
        assert_relative_eq!(reverse.total.value, -report.total.value, epsilon = 1e-9);
        assert_relative_eq!(reverse.confinement.value, -report.confinement.value, epsilon = 1e-9);
        assert_relative_eq!(reverse.entropic.value, -report.entropic.value, epsilon = 1e-9);
    }

    #[test]
    fn hydrogens_kept_on_request() {
        let dir = tempfile::tempdir().unwrap();
        write_state(dir.path(), "A", 0.02, -500.0, 3);
        let source = DirectorySource::new(dir.path(), 1, EnergyModel::Tabulated);
        let mut config = config();
        config.exclude_hydrogens = false;
        let ctx = config.thermal_context().unwrap();
        let state = analyze_state(&source, "A", &config, &ctx, false).unwrap();
        assert_eq!(state.entropy.spectrum.variances.len(), 15);
        assert_eq!(state.chi_squared.len(), 3);
        assert_eq!(state.energies.len(), 40);
    }

    #[test]
    fn surplus_energies_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_state(dir.path(), "A", 0.02, -500.0, 5);
        let energies: String = (0..43).map(|i| format!("{}\n", -500.0 + i as f64)).collect();
        fs::write(dir.path().join("A").join("2").join("energies.dat"), energies).unwrap();
        let source = DirectorySource::new(dir.path(), 1, EnergyModel::Tabulated);
        let config = config();
        let ctx = config.thermal_context().unwrap();
        assert!(matches!(
            analyze_state(&source, "A", &config, &ctx, false),
            Err(CcrError::LengthMismatch { left: 40, right: 43, .. })
        ));
    }

    #[test]
    fn missing_state() {
        let dir = tempfile::tempdir().unwrap();
        write_state(dir.path(), "A", 0.02, -500.0, 4);
        let source = DirectorySource::new(dir.path(), 1, EnergyModel::Tabulated);
        assert!(matches!(
            run(&source, &config(), None, false),
            Err(CcrError::MissingTrajectoryData { .. })
        ));
    }
}
