use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while post-processing a confinement run.
#[derive(Error, Debug)]
pub enum CcrError {
    /// The restraint schedule is unusable (too short, non-numeric, non-positive, repeated).
    #[error("malformed restraint schedule `{}`{}: {reason}", path.display(), line_suffix(*line))]
    MalformedSchedule {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },

    /// The local log-log slope of a segment is -1, the integral of that segment is undefined.
    #[error("thermodynamic integration segment {segment} is degenerate (log-log slope {slope})")]
    DegenerateIntegrationSegment { segment: usize, slope: f64 },

    #[error("{what}[{index}] = {value} must be finite and strictly positive")]
    NonPositiveValue {
        what: &'static str,
        index: usize,
        value: f64,
    },

    #[error("{what}: lengths differ ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// A step/state directory or one of its files does not exist.
    #[error("missing trajectory data: `{}`", path.display())]
    MissingTrajectoryData { path: PathBuf },

    #[error("I/O error while reading `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse `{}` at line {line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid JSON in `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("could not write table: {0}")]
    Csv(#[from] csv::Error),

    /// No usable quasiharmonic mode is left once rigid-body and near-zero modes are dropped.
    #[error(
        "quasiharmonic spectrum is degenerate: \
         {degenerate} of {total} modes have near-zero variance"
    )]
    DegenerateModes { total: usize, degenerate: usize },

    #[error("not enough samples in {what}: found {found}, need at least 2")]
    InsufficientSamples { what: String, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn line_suffix(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line}"),
        None => String::new(),
    }
}

impl CcrError {
    /// Wrap an I/O error, turning "not found" into [`CcrError::MissingTrajectoryData`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CcrError::MissingTrajectoryData { path }
        } else {
            CcrError::Io { path, source }
        }
    }
}

/// Result type for the ccr_post crate
pub type Result<T> = std::result::Result<T, CcrError>;
