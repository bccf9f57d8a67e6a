use thiserror::Error;

/// Failures that abort a stage. Anything else (I/O, malformed CSV or JSON
/// syntax) travels as a plain `anyhow::Error` with file context attached.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("couldn't parse {field} value {value:?}")]
    Parse { field: &'static str, value: String },

    #[error("{table}: {detail}")]
    Schema { table: String, detail: String },

    #[error("{table} references {id} which is missing from {target}")]
    Referential {
        table: String,
        id: String,
        target: String,
    },
}

impl PipelineError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::Schema {
            table: table.to_string(),
            detail: format!("missing column {column:?}"),
        }
    }

    /// Whether a per-record skip policy may swallow this error.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Schema { .. })
    }
}
