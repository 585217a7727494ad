// src/pdf_extract.rs

use crate::heuristics::{ExtractionResult, MatcherChain, Quantity};
use crate::model::EnergyRecord;
use lopdf::{Document, ObjectId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Text recovered from an evidence PDF, or why there is none.
#[derive(Debug)]
pub enum PdfContent {
    Text(String),
    /// Image-only pages or too little text; the figures must be typed in.
    ScannedImage,
    /// The bytes are not a readable PDF.
    Error(String),
}

impl PdfContent {
    pub fn kind(&self) -> &'static str {
        match self {
            PdfContent::Text(_) => "text",
            PdfContent::ScannedImage => "scanned",
            PdfContent::Error(_) => "error",
        }
    }
}

/// Fewer non-whitespace characters than this and the text layer is
/// considered empty.
const MIN_TEXT_CHARS: usize = 30;

/// Share of image-only pages above which the whole file counts as scanned.
const SCANNED_PAGE_RATIO: f64 = 0.8;

/// Classify the PDF structurally with lopdf, then pull its text layer.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> PdfContent {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(doc) => doc,
        Err(e) => return PdfContent::Error(format!("not a readable PDF: {e}")),
    };

    if image_only_share(&doc).is_some_and(|share| share >= SCANNED_PAGE_RATIO) {
        info!("Evidence is image-only");
        return PdfContent::ScannedImage;
    }

    let text = match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "No text layer could be read");
            return PdfContent::ScannedImage;
        }
    };

    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    if chars < MIN_TEXT_CHARS {
        info!(chars, "Text layer too thin, treating as scanned");
        return PdfContent::ScannedImage;
    }
    debug!(chars, "Text layer recovered");
    PdfContent::Text(text)
}

/// Fraction of pages that carry images but no fonts. `None` for a file
/// without pages, which is left to text extraction to judge.
fn image_only_share(doc: &Document) -> Option<f64> {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return None;
    }

    let image_only = pages
        .values()
        .filter(|id| page_is_image_only(doc, **id))
        .count();
    let share = image_only as f64 / pages.len() as f64;
    debug!(pages = pages.len(), image_only, share, "Page resource scan");
    Some(share)
}

fn page_is_image_only(doc: &Document, page_id: ObjectId) -> bool {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return false;
    };
    let resources = page
        .get(b"Resources")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_dict())
        .ok();

    let non_empty = |key: &[u8]| -> bool {
        resources
            .and_then(|res| res.get(key).ok())
            .and_then(|obj| doc.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_dict().ok())
            .is_some_and(|dict| !dict.is_empty())
    };

    non_empty(b"XObject".as_slice()) && !non_empty(b"Font".as_slice())
}

// ---------------------------------------------------------------------------
// Evidence uploads
// ---------------------------------------------------------------------------

/// What an uploaded document is evidence for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Electricity,
    Gas,
    /// Anything else; kept for the record, never parsed into energy.
    Evidence,
}

impl EvidenceKind {
    /// The energy quantity this kind of upload may fill in.
    pub fn quantity(&self) -> Option<Quantity> {
        match self {
            EvidenceKind::Electricity => Some(Quantity::Electricity),
            EvidenceKind::Gas => Some(Quantity::NaturalGas),
            EvidenceKind::Evidence => None,
        }
    }
}

impl FromStr for EvidenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electricity" => Ok(EvidenceKind::Electricity),
            "gas" => Ok(EvidenceKind::Gas),
            "evidence" => Ok(EvidenceKind::Evidence),
            other => Err(format!(
                "unknown evidence kind '{other}' (expected electricity, gas or evidence)"
            )),
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceKind::Electricity => "electricity",
            EvidenceKind::Gas => "gas",
            EvidenceKind::Evidence => "evidence",
        };
        f.write_str(s)
    }
}

/// SHA-256 of the uploaded file, hex encoded.
pub fn evidence_fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Outcome of running one evidence file through text recovery + heuristics.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceReport {
    pub fingerprint: String,
    pub kind: EvidenceKind,
    /// "text", "scanned" or "error"
    pub content_type: String,
    pub result: ExtractionResult,
}

/// Recover text from a PDF and run the matcher chain over it.
///
/// Scanned or unreadable files yield an empty result: manual entry.
pub fn process_evidence(pdf_bytes: &[u8], kind: EvidenceKind, chain: &MatcherChain) -> EvidenceReport {
    let fingerprint = evidence_fingerprint(pdf_bytes);
    let span = tracing::info_span!("evidence", %kind, sha256 = %fingerprint);
    let _guard = span.enter();

    let content = extract_text_from_pdf(pdf_bytes);
    let result = match &content {
        PdfContent::Text(text) => {
            let result = chain.extract(text);
            let (filled, total) = result.coverage();
            info!(
                filled,
                total,
                electricity_kwh = ?result.electricity_kwh,
                natural_gas_sm3 = ?result.natural_gas_sm3,
                "Heuristic coverage"
            );
            result
        }
        PdfContent::ScannedImage => {
            info!("PDF is scanned — manual entry required");
            ExtractionResult::default()
        }
        PdfContent::Error(e) => {
            tracing::error!(error = %e, "Failed to process PDF");
            ExtractionResult::default()
        }
    };

    EvidenceReport {
        fingerprint,
        kind,
        content_type: content.kind().to_string(),
        result,
    }
}

/// Copy the quantity matching `kind` onto the energy record.
///
/// Absent or zero values are not applied. Returns whether anything changed.
pub fn apply_extraction(
    energy: &mut EnergyRecord,
    kind: EvidenceKind,
    result: &ExtractionResult,
    now: OffsetDateTime,
) -> bool {
    let Some(quantity) = kind.quantity() else {
        return false;
    };
    let Some(value) = result.get(quantity).filter(|v| *v != 0.0) else {
        return false;
    };

    match quantity {
        Quantity::Electricity => energy.electricity_kwh = value,
        Quantity::NaturalGas => energy.natural_gas_sm3 = value,
    }
    energy.updated_at = Some(now);
    true
}
