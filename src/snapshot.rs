// src/snapshot.rs

use crate::error::{ReportError, Result};
use crate::heuristics::{ExtractionResult, Quantity};
use crate::model::{EnergyRecord, ProductLine, ReportingPeriod};
use crate::pdf_extract::{EvidenceKind, apply_extraction};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use toml_edit::{DocumentMut, value};
use tracing::info;

/// Everything the exporters need for one period, as handed over by the
/// record-keeping side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub period: ReportingPeriod,
    #[serde(default)]
    pub energy: Option<EnergyRecord>,
    /// Row order of the exported workbook.
    #[serde(default)]
    pub products: Vec<ProductLine>,
}

impl ReportSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let snapshot: ReportSnapshot = toml::from_str(content).map_err(ReportError::Snapshot)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        let p = &self.period;
        if !(1..=4).contains(&p.quarter) {
            return Err(ReportError::InvalidReport(format!(
                "quarter must be 1-4, got {}",
                p.quarter
            )));
        }
        if p.start_date > p.end_date {
            return Err(ReportError::InvalidReport(format!(
                "start_date {} is after end_date {}",
                p.start_date, p.end_date
            )));
        }
        Ok(())
    }

    /// `<org>_CBAM_<year>_Q<quarter>`, without extension.
    pub fn export_stem(&self, organization: &str) -> String {
        format!(
            "{}_CBAM_{}_Q{}",
            organization, self.period.year, self.period.quarter
        )
    }
}

/// Write an accepted extraction back into the snapshot file's `[energy]`
/// table, keeping the rest of the file (comments, ordering) intact.
///
/// Returns `false` when nothing applicable was found.
pub fn update_energy_in_file(
    path: impl AsRef<Path>,
    kind: EvidenceKind,
    result: &ExtractionResult,
    now: OffsetDateTime,
) -> Result<bool> {
    let content = fs::read_to_string(&path)?;
    let snapshot = ReportSnapshot::from_toml(&content)?;

    let mut energy = snapshot.energy.unwrap_or_default();
    if !apply_extraction(&mut energy, kind, result, now) {
        return Ok(false);
    }

    let mut doc = content.parse::<DocumentMut>()?;
    if doc.get("energy").is_none() {
        doc["energy"] = toml_edit::table();
    }
    match kind.quantity() {
        Some(Quantity::Electricity) => {
            doc["energy"]["electricity_kwh"] = value(energy.electricity_kwh);
        }
        Some(Quantity::NaturalGas) => {
            doc["energy"]["natural_gas_sm3"] = value(energy.natural_gas_sm3);
        }
        None => return Ok(false),
    }
    doc["energy"]["updated_at"] = value(now.format(&Rfc3339)?);

    fs::write(&path, doc.to_string())?;
    info!(path = %path.as_ref().display(), %kind, "Energy record updated from evidence");
    Ok(true)
}
