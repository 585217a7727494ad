// src/template_fill.rs

use crate::emissions::{EmissionTotals, round_to};
use crate::error::{ReportError, Result};
use crate::layout::{CellRef, TemplateLayout, column_index};
use crate::model::{ProductLine, ReportingPeriod};
use std::path::Path;
use time::Date;
use time::macros::date;
use tracing::{info, warn};
use umya_spreadsheet::{NumberingFormat, Spreadsheet, Worksheet};

/// Decimal places of the installation-level total written to the workbook.
pub const TOTAL_DECIMALS: u32 = 6;

/// Excel's day zero (1900 date system, including the phantom 1900-02-29).
const EXCEL_EPOCH: Date = date!(1899 - 12 - 30);

/// What a fill wrote, for the caller's logs and UI.
#[derive(Debug, Clone, PartialEq)]
pub struct FillSummary {
    pub rows_written: usize,
    /// Rounded the same way as the written cell.
    pub totals: EmissionTotals,
}

/// Populates the regulator's communication template from report records.
pub struct TemplateMapper<'a> {
    layout: &'a TemplateLayout,
    process_label: &'a str,
}

impl<'a> TemplateMapper<'a> {
    /// `process_label` goes into the production-process column of every row.
    pub fn new(layout: &'a TemplateLayout, process_label: &'a str) -> Self {
        Self {
            layout,
            process_label,
        }
    }

    /// Fill `template` and write the result to `destination`.
    ///
    /// The template file is only read. Nothing is written to `destination`
    /// unless every cell was populated.
    pub fn fill(
        &self,
        template: &Path,
        destination: &Path,
        period: &ReportingPeriod,
        products: &[ProductLine],
    ) -> Result<FillSummary> {
        let span = tracing::info_span!("fill", period = %period.label(), products = products.len());
        let _guard = span.enter();

        // Aggregates first: a bad figure must fail before any I/O.
        let totals = EmissionTotals::from_products(products)?.rounded(TOTAL_DECIMALS);

        if !template.is_file() {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("template not found: {}", template.display()),
            )));
        }
        let mut book = umya_spreadsheet::reader::xlsx::read(template)
            .map_err(|e| ReportError::Spreadsheet(format!("failed to open template: {e}")))?;

        self.populate(&mut book, period, products, &totals)?;
        write_atomically(&book, destination)?;

        info!(
            destination = %destination.display(),
            rows = products.len(),
            total_direct = totals.direct,
            total_indirect = totals.indirect,
            "Workbook written"
        );

        Ok(FillSummary {
            rows_written: products.len(),
            totals,
        })
    }

    /// Write every field into an already-loaded workbook.
    pub fn populate(
        &self,
        book: &mut Spreadsheet,
        period: &ReportingPeriod,
        products: &[ProductLine],
        totals: &EmissionTotals,
    ) -> Result<()> {
        self.write_header(book, period)?;
        self.write_quality(book, period, totals)?;
        self.write_products(book, products)
    }

    fn write_header(&self, book: &mut Spreadsheet, period: &ReportingPeriod) -> Result<()> {
        let h = &self.layout.header;
        let ws = sheet_mut(book, &h.sheet)?;

        write_date(ws, &h.reporting_start, period.start_date)?;
        write_date(ws, &h.reporting_end, period.end_date)?;

        let cells = &h.installation;
        let inst = &period.installation;
        for (cell, value) in [
            (&cells.name, &inst.name),
            (&cells.name_en, &inst.name_en),
            (&cells.street_number, &inst.street_number),
            (&cells.economic_activity, &inst.economic_activity),
            (&cells.post_code, &inst.post_code),
            (&cells.po_box, &inst.po_box),
            (&cells.city, &inst.city),
            (&cells.country, &inst.country),
            (&cells.unlocode, &inst.unlocode),
            (&cells.latitude, &inst.latitude),
            (&cells.longitude, &inst.longitude),
        ] {
            write_text(ws, cell, value)?;
        }
        Ok(())
    }

    fn write_quality(
        &self,
        book: &mut Spreadsheet,
        period: &ReportingPeriod,
        totals: &EmissionTotals,
    ) -> Result<()> {
        let q = &self.layout.quality;
        let ws = sheet_mut(book, &q.sheet)?;

        write_text(ws, &q.data_quality, &period.quality.data_quality)?;
        write_text(
            ws,
            &q.default_values_justification,
            &period.quality.default_values_justification,
        )?;
        write_text(ws, &q.quality_assurance, &period.quality.quality_assurance)?;

        // TODO: write totals.direct once the regulator template names a cell for it
        let cell = CellRef::parse(&q.total_indirect_emissions)?;
        ws.get_cell_mut(cell.coordinate())
            .set_value_number(round_to(totals.indirect, TOTAL_DECIMALS));
        Ok(())
    }

    fn write_products(&self, book: &mut Spreadsheet, products: &[ProductLine]) -> Result<()> {
        let s = &self.layout.summary;
        let ws = sheet_mut(book, &s.sheet)?;

        // Blank the whole window so a shorter list leaves no residue.
        let clear: Vec<u32> = s
            .clear_columns
            .iter()
            .map(|c| column_index(c))
            .collect::<Result<_>>()?;
        for row in s.start_row..s.start_row + s.clear_rows {
            for &col in &clear {
                if ws.get_cell((col, row)).is_some() {
                    ws.get_cell_mut((col, row)).set_blank();
                }
            }
        }

        if products.len() > s.clear_rows as usize {
            warn!(
                products = products.len(),
                window = s.clear_rows,
                "More products than the clearing window; rows past it are not cleared on re-export"
            );
        }

        let c = &s.columns;
        let process = column_index(&c.process)?;
        let category = column_index(&c.aggregated_category)?;
        let cn_code = column_index(&c.cn_code)?;
        let cn_name = column_index(&c.cn_name)?;
        let product_name = column_index(&c.product_name)?;
        let direct = column_index(&c.direct_see)?;
        let indirect = column_index(&c.indirect_see)?;

        for (i, p) in products.iter().enumerate() {
            let row = s.start_row + i as u32;
            ws.get_cell_mut((process, row))
                .set_value_string(self.process_label);
            ws.get_cell_mut((category, row))
                .set_value_string(p.aggregated_category.as_str());
            ws.get_cell_mut((cn_code, row))
                .set_value_string(p.cn_code.as_str());
            ws.get_cell_mut((cn_name, row))
                .set_value_string(p.cn_name.as_str());
            ws.get_cell_mut((product_name, row))
                .set_value_string(p.product_name.as_str());
            ws.get_cell_mut((direct, row)).set_value_number(p.direct_see);
            ws.get_cell_mut((indirect, row)).set_value_number(p.indirect_see);
        }
        Ok(())
    }
}

fn sheet_mut<'b>(book: &'b mut Spreadsheet, name: &str) -> Result<&'b mut Worksheet> {
    book.get_sheet_by_name_mut(name)
        .ok_or_else(|| ReportError::TemplateStructure {
            sheet: name.to_string(),
        })
}

fn write_text(ws: &mut Worksheet, a1: &str, value: &str) -> Result<()> {
    let cell = CellRef::parse(a1)?;
    ws.get_cell_mut(cell.coordinate()).set_value_string(value);
    Ok(())
}

fn write_date(ws: &mut Worksheet, a1: &str, value: Date) -> Result<()> {
    let cell = CellRef::parse(a1)?;
    ws.get_cell_mut(cell.coordinate())
        .set_value_number(excel_serial(value));
    ws.get_style_mut(cell.coordinate())
        .get_number_format_mut()
        .set_format_code(NumberingFormat::FORMAT_DATE_YYYYMMDD2);
    Ok(())
}

/// Days since Excel's epoch, as stored in a date-formatted cell.
pub fn excel_serial(value: Date) -> f64 {
    (value - EXCEL_EPOCH).whole_days() as f64
}

/// Serialise next to `destination`, then rename into place.
fn write_atomically(book: &Spreadsheet, destination: &Path) -> Result<()> {
    let dir = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    umya_spreadsheet::writer::xlsx::write_writer(book, tmp.as_file_mut())
        .map_err(|e| ReportError::Spreadsheet(format!("failed to serialise workbook: {e}")))?;
    tmp.persist(destination)?;
    Ok(())
}
