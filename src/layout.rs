// src/layout.rs

use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::{fs, path::Path};

const BUILTIN_LAYOUT: &str = include_str!("../layouts/cbam_communication.toml");

/// Where each logical field lives in the regulator's workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    pub header: HeaderLayout,
    pub quality: QualityLayout,
    pub summary: SummaryLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderLayout {
    pub sheet: String,
    pub reporting_start: String,
    pub reporting_end: String,
    pub installation: InstallationCells,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationCells {
    pub name: String,
    pub name_en: String,
    pub street_number: String,
    pub economic_activity: String,
    pub post_code: String,
    pub po_box: String,
    pub city: String,
    pub country: String,
    pub unlocode: String,
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityLayout {
    pub sheet: String,
    pub data_quality: String,
    pub default_values_justification: String,
    pub quality_assurance: String,
    pub total_indirect_emissions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLayout {
    pub sheet: String,
    /// First product row (1-based).
    pub start_row: u32,
    /// Rows blanked before writing, regardless of product count.
    pub clear_rows: u32,
    pub clear_columns: Vec<String>,
    pub columns: SummaryColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryColumns {
    pub process: String,
    pub aggregated_category: String,
    pub cn_code: String,
    pub cn_name: String,
    pub product_name: String,
    pub direct_see: String,
    pub indirect_see: String,
}

impl TemplateLayout {
    /// Layout of the template version this crate ships against.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_LAYOUT)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let layout: TemplateLayout = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject bad coordinates up front so a fill never stops half way.
    pub fn validate(&self) -> Result<()> {
        let h = &self.header;
        let i = &h.installation;
        let q = &self.quality;
        for cell in [
            &h.reporting_start,
            &h.reporting_end,
            &i.name,
            &i.name_en,
            &i.street_number,
            &i.economic_activity,
            &i.post_code,
            &i.po_box,
            &i.city,
            &i.country,
            &i.unlocode,
            &i.latitude,
            &i.longitude,
            &q.data_quality,
            &q.default_values_justification,
            &q.quality_assurance,
            &q.total_indirect_emissions,
        ] {
            CellRef::parse(cell)?;
        }

        let s = &self.summary;
        let c = &s.columns;
        for column in s.clear_columns.iter().chain([
            &c.process,
            &c.aggregated_category,
            &c.cn_code,
            &c.cn_name,
            &c.product_name,
            &c.direct_see,
            &c.indirect_see,
        ]) {
            column_index(column)?;
        }

        if s.start_row == 0 {
            return Err(ReportError::Layout("summary.start_row must be >= 1".into()));
        }
        Ok(())
    }
}

/// Bottom-right cell of an xlsx worksheet.
pub const LAST_CELL: CellRef = CellRef {
    column: 16_384,
    row: 1_048_576,
};

/// A 1-based (column, row) cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: u32,
    pub row: u32,
}

impl CellRef {
    /// Parse an A1-style reference such as `"M26"`.
    pub fn parse(a1: &str) -> Result<Self> {
        let a1 = a1.trim();
        let split = a1
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| ReportError::Layout(format!("'{a1}' has no row number")))?;
        let (letters, digits) = a1.split_at(split);

        let column = column_index(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| ReportError::Layout(format!("'{a1}' has an invalid row number")))?;
        if row == 0 {
            return Err(ReportError::Layout(format!("'{a1}': rows start at 1")));
        }
        let cell = CellRef { column, row };
        if column > LAST_CELL.column || row > LAST_CELL.row {
            return Err(ReportError::Layout(format!(
                "{cell} is outside the worksheet (last cell is {LAST_CELL})"
            )));
        }
        Ok(cell)
    }

    /// umya-spreadsheet takes `(column, row)` tuples.
    pub fn coordinate(&self) -> (u32, u32) {
        (self.column, self.row)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

/// `"A"` -> 1, `"Z"` -> 26, `"AA"` -> 27.
pub fn column_index(letters: &str) -> Result<u32> {
    let letters = letters.trim();
    if letters.is_empty() || letters.len() > 3 {
        return Err(ReportError::Layout(format!("invalid column '{letters}'")));
    }
    let mut idx: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(ReportError::Layout(format!("invalid column '{letters}'")));
        }
        idx = idx * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    Ok(idx)
}

fn column_letters(mut column: u32) -> String {
    let mut out = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layout_loads() {
        let layout = TemplateLayout::builtin().unwrap();
        assert_eq!(layout.header.sheet, "A_InstData");
        assert_eq!(layout.quality.sheet, "C_Emissions&Energy");
        assert_eq!(layout.summary.sheet, "Summary_Products");
        assert_eq!(layout.summary.start_row, 10);
        assert_eq!(layout.summary.clear_rows, 200);
        assert_eq!(layout.summary.clear_columns.len(), 7);
        assert_eq!(layout.header.installation.unlocode, "I27");
    }

    #[test]
    fn test_cell_ref_parse() {
        assert_eq!(CellRef::parse("I9").unwrap(), CellRef { column: 9, row: 9 });
        assert_eq!(CellRef::parse("M26").unwrap(), CellRef { column: 13, row: 26 });
        assert_eq!(CellRef::parse("aa100").unwrap(), CellRef { column: 27, row: 100 });
        assert!(CellRef::parse("26").is_err());
        assert!(CellRef::parse("M").is_err());
        assert!(CellRef::parse("M0").is_err());
        assert!(CellRef::parse("M2x").is_err());
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef { column: 13, row: 26 }.to_string(), "M26");
        assert_eq!(CellRef { column: 27, row: 3 }.to_string(), "AA3");
        assert_eq!(CellRef { column: 26, row: 1 }.to_string(), "Z1");
    }

    #[test]
    fn test_cell_beyond_sheet_names_the_limit() {
        assert_eq!(CellRef::parse("XFD1048576").unwrap(), LAST_CELL);
        let err = CellRef::parse("xfe1").unwrap_err().to_string();
        assert!(err.contains("XFE1 is outside the worksheet"), "{err}");
        assert!(err.contains("last cell is XFD1048576"), "{err}");
        assert!(CellRef::parse("A1048577").is_err());
    }

    #[test]
    fn test_invalid_coordinate_rejected_on_load() {
        let bad = BUILTIN_LAYOUT.replace("\"M26\"", "\"26M\"");
        let err = TemplateLayout::from_toml(&bad).unwrap_err();
        assert!(matches!(err, ReportError::Layout(_)));
    }

    #[test]
    fn test_layout_round_trips_through_toml() {
        let layout = TemplateLayout::builtin().unwrap();
        let text = layout.to_toml().unwrap();
        assert_eq!(TemplateLayout::from_toml(&text).unwrap(), layout);
    }
}
