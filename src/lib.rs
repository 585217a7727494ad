//! Quarterly CBAM report generation: fills the regulator's communication
//! workbook, composes a one-page summary PDF and recovers energy figures
//! from supplier invoices.

pub mod config;
pub mod emissions;
pub mod error;
pub mod heuristics;
pub mod layout;
pub mod model;
pub mod pdf_extract;
pub mod snapshot;
pub mod summary_pdf;
pub mod template_fill;

pub use error::{ReportError, Result};
