use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the analysis pipeline.
///
/// Every variant aborts only the region or period under analysis; the batch
/// orchestrator records the message and moves on to the next region.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Shape mismatch: {temperatures} temperatures, {dates} dates")]
    Shape { temperatures: usize, dates: usize },

    #[error("Insufficient data: only {valid} valid days (need at least {required})")]
    InsufficientData { valid: usize, required: usize },

    #[error("Degree mismatch: degree {degree} fit requires coefficient '{key}'")]
    DegreeMismatch { degree: usize, key: String },

    #[error("Invalid polynomial degree {0}: supported degrees are 1 to 4")]
    InvalidDegree(usize),

    #[error("No data found for period {start_year}-{end_year}")]
    NoData { start_year: i32, end_year: i32 },

    #[error("No common dates between demand and temperature data for {region}")]
    NoOverlap { region: String },

    #[error("Missing {kind}: {target}")]
    MissingArtifact { kind: &'static str, target: String },

    #[error("No column with '{pattern}' in its name found in {path}")]
    MissingColumn { pattern: String, path: PathBuf },

    #[error("Invalid price curve for {region}: {reason}")]
    InvalidPriceCurve { region: String, reason: String },

    #[error("Least squares system could not be solved ({samples} samples, {columns} columns)")]
    SingularDesign { samples: usize, columns: usize },

    #[error("All {total} regions failed")]
    AllRegionsFailed { total: usize, errors: Vec<String> },

    #[error("Parse error in {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Error for an artifact file that does not exist on disk
    pub fn missing_file(kind: &'static str, path: &std::path::Path) -> Self {
        Self::MissingArtifact {
            kind,
            target: path.display().to_string(),
        }
    }

    /// Stable name of the error kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Shape { .. } => "ShapeError",
            Self::InsufficientData { .. } => "InsufficientDataError",
            Self::DegreeMismatch { .. } | Self::InvalidDegree(_) => "DegreeMismatchError",
            Self::NoData { .. } | Self::NoOverlap { .. } => "NoDataError",
            Self::MissingArtifact { .. } | Self::InvalidPriceCurve { .. } => {
                "MissingArtifactError"
            }
            Self::MissingColumn { .. } | Self::Parse { .. } => "ParseError",
            Self::SingularDesign { .. } => "SingularDesignError",
            Self::AllRegionsFailed { .. } => "AllRegionsFailedError",
            Self::Io(_) | Self::Csv(_) | Self::Json(_) => "IoError",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
