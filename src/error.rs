/// Data-quality failures raised while loading the event table.
///
/// Nothing past the loader returns an error: empty selections and zero reach
/// are represented as `None`/NaN results instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Load: failed to open {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Load: CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks one or more required columns.
    #[error("Load: missing required column(s): {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    #[error("Load: line {line}: unparsable timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("Load: line {line}: invalid value '{value}' in column '{column}'")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;
