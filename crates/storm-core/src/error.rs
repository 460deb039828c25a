use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the storm report.
#[derive(Error, Debug)]
pub enum StormError {
    /// The input file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required column is absent from the header row.
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// A data row is structurally unusable (e.g. too few fields).
    #[error("Invalid row at line {line}: {message}")]
    InvalidRow { line: u64, message: String },

    /// A numeric field could not be parsed into the expected type.
    #[error("Invalid value {value:?} in column {column} at line {line}")]
    InvalidField {
        line: u64,
        column: String,
        value: String,
    },

    /// The CSV reader itself failed (bad quoting, invalid UTF-8, ...).
    #[error("CSV error: {0}")]
    Csv(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the storm crates.
pub type Result<T> = std::result::Result<T, StormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = StormError::FileRead {
            path: PathBuf::from("/data/StormData.csv.bz2"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/StormData.csv.bz2"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = StormError::MissingColumn {
            column: "PROPDMGEXP".to_string(),
        };
        assert_eq!(err.to_string(), "Missing required column: PROPDMGEXP");
    }

    #[test]
    fn test_error_display_invalid_field() {
        let err = StormError::InvalidField {
            line: 42,
            column: "FATALITIES".to_string(),
            value: "many".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"many\" in column FATALITIES at line 42"
        );
    }

    #[test]
    fn test_error_display_invalid_row() {
        let err = StormError::InvalidRow {
            line: 7,
            message: "expected at least 4 fields, found 2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid row at line 7: expected at least 4 fields, found 2"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = StormError::Config("top-n must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: top-n must be positive");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StormError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: StormError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
