// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("template is missing required sheet '{sheet}'")]
    TemplateStructure { sheet: String },

    #[error("non-finite value {value} in {field}")]
    Arithmetic { field: String, value: f64 },

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("invalid layout: {0}")]
    Layout(String),

    #[error("invalid report: {0}")]
    InvalidReport(String),

    #[error("snapshot parse error: {0}")]
    Snapshot(toml::de::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("TOML serialisation error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("timestamp formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),

    #[error("TOML edit error: {0}")]
    TomlEdit(#[from] toml_edit::TomlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tempfile::PersistError> for ReportError {
    fn from(err: tempfile::PersistError) -> Self {
        ReportError::Io(err.error)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
