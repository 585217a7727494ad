// src/summary_pdf/mod.rs

pub mod canvas;
pub mod render;

use crate::emissions::EmissionTotals;
use crate::error::Result;
use crate::model::{EnergyRecord, ProductLine, ReportingPeriod};
use canvas::{Font, MM, PageLayout};
use std::path::Path;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

/// Product rows that fit on the summary page.
pub const MAX_TABLE_ROWS: usize = 12;

/// Characters of the product name shown in the table.
const PRODUCT_NAME_CHARS: usize = 35;

const MARGIN: f32 = 20.0 * MM;
const ROW_STEP: f32 = 6.0 * MM;

/// Left edges of the six table columns.
const TABLE_COLUMNS: [f32; 6] = [20.0 * MM, 45.0 * MM, 105.0 * MM, 130.0 * MM, 155.0 * MM, 180.0 * MM];

/// Right edges for the numeric columns (production, direct, indirect, total).
const NUMERIC_RIGHT: [f32; 4] = [120.0 * MM, 140.0 * MM, 165.0 * MM, 190.0 * MM];

const TABLE_HEADERS: [&str; 6] = [
    "CN Code",
    "Product",
    "Production (t)",
    "Direct SEE",
    "Indirect SEE",
    "Total SEE",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeSummary {
    pub pages: usize,
    pub rows_rendered: usize,
    pub rows_omitted: usize,
    /// Unrounded; the document prints them with three decimals.
    pub totals: EmissionTotals,
}

/// Lays out the human-readable quarterly summary.
pub struct SummaryComposer<'a> {
    organization: &'a str,
}

impl<'a> SummaryComposer<'a> {
    pub fn new(organization: &'a str) -> Self {
        Self { organization }
    }

    /// Compose the summary and write it to `destination`, stamped with the
    /// local date (UTC when the local offset cannot be determined).
    pub fn compose(
        &self,
        destination: &Path,
        period: &ReportingPeriod,
        products: &[ProductLine],
        energy: Option<&EnergyRecord>,
    ) -> Result<ComposeSummary> {
        let now = local_time(OffsetDateTime::now_utc(), UtcOffset::current_local_offset().ok());
        self.compose_at(destination, period, products, energy, now)
    }

    pub fn compose_at(
        &self,
        destination: &Path,
        period: &ReportingPeriod,
        products: &[ProductLine],
        energy: Option<&EnergyRecord>,
        generated_at: OffsetDateTime,
    ) -> Result<ComposeSummary> {
        let span = tracing::info_span!("compose", period = %period.label());
        let _guard = span.enter();

        let (pages, summary) = self.layout(period, products, energy, generated_at)?;
        render::write_pdf(&pages, destination)?;

        info!(
            destination = %destination.display(),
            pages = summary.pages,
            rows = summary.rows_rendered,
            omitted = summary.rows_omitted,
            "Summary document written"
        );
        Ok(summary)
    }

    /// Lay out every page without touching the filesystem.
    pub fn layout(
        &self,
        period: &ReportingPeriod,
        products: &[ProductLine],
        energy: Option<&EnergyRecord>,
        generated_at: OffsetDateTime,
    ) -> Result<(Vec<PageLayout>, ComposeSummary)> {
        // All figures are settled before the first mark is placed.
        let totals = EmissionTotals::from_products(products)?;
        let shown = &products[..products.len().min(MAX_TABLE_ROWS)];
        if shown.len() < products.len() {
            debug!(
                shown = shown.len(),
                omitted = products.len() - shown.len(),
                "Product table truncated"
            );
        }

        let mut page = PageLayout::a4();
        self.header(&mut page, period, generated_at);
        let mut y = page.height - 55.0 * MM;
        installation_block(&mut page, &mut y, period);
        product_table(&mut page, &mut y, shown);
        emissions_breakdown(&mut page, &mut y, &totals, energy);
        footer(&mut page, &mut y);

        let pages = vec![page];
        let summary = ComposeSummary {
            pages: pages.len(),
            rows_rendered: shown.len(),
            rows_omitted: products.len() - shown.len(),
            totals,
        };
        Ok((pages, summary))
    }

    fn header(&self, page: &mut PageLayout, period: &ReportingPeriod, generated_at: OffsetDateTime) {
        let (w, h) = (page.width, page.height);

        page.set_font(Font::Bold, 18.0);
        page.draw_string(
            MARGIN,
            h - 25.0 * MM,
            format!("{} - CBAM Communication Report", self.organization),
        );
        page.set_font(Font::Regular, 10.0);
        page.draw_string(MARGIN, h - 32.0 * MM, "EU REGULATION 2023/1773 COMPLIANT (MVP)");
        page.line(MARGIN, h - 35.0 * MM, w - MARGIN, h - 35.0 * MM);

        page.draw_right_string(w - MARGIN, h - 25.0 * MM, format!("Period: {}", period.label()));
        page.draw_right_string(
            w - MARGIN,
            h - 32.0 * MM,
            format!("Date: {}", format_day(generated_at)),
        );
    }
}

fn installation_block(page: &mut PageLayout, y: &mut f32, period: &ReportingPeriod) {
    let inst = &period.installation;

    page.set_font(Font::Bold, 12.0);
    page.draw_string(MARGIN, *y, "1. INSTALLATION");
    *y -= 8.0 * MM;

    page.set_font(Font::Regular, 10.0);
    let lines = [
        ("Company", inst.name.clone()),
        ("Address", format!("{} / {}", inst.street_number, inst.city)),
        ("Country", inst.country.clone()),
        ("UN/LOCODE", inst.unlocode.clone()),
        ("Coordinates", format!("{} N, {} E", inst.latitude, inst.longitude)),
    ];
    for (i, (key, value)) in lines.iter().enumerate() {
        page.draw_string(MARGIN, *y - i as f32 * ROW_STEP, format!("{key}: {value}"));
    }
    *y -= 45.0 * MM;
}

fn product_table(page: &mut PageLayout, y: &mut f32, products: &[ProductLine]) {
    page.set_font(Font::Bold, 12.0);
    page.draw_string(MARGIN, *y, "2. SUMMARY OF GOODS");
    *y -= 8.0 * MM;

    page.set_font(Font::Bold, 9.0);
    for (x, label) in TABLE_COLUMNS.iter().zip(TABLE_HEADERS) {
        page.draw_string(*x, *y, label);
    }
    *y -= 4.0 * MM;
    page.line(MARGIN, *y, page.width - MARGIN, *y);
    *y -= ROW_STEP;

    page.set_font(Font::Regular, 9.0);
    for p in products {
        let name: String = p.product_name.chars().take(PRODUCT_NAME_CHARS).collect();
        page.draw_string(TABLE_COLUMNS[0], *y, p.cn_code.as_str());
        page.draw_string(TABLE_COLUMNS[1], *y, name);

        let figures = [
            format!("{:.3}", p.production_t),
            format!("{:.6}", p.direct_see),
            format!("{:.6}", p.indirect_see),
            format!("{:.6}", p.total_see()),
        ];
        for (right, text) in NUMERIC_RIGHT.iter().zip(figures) {
            page.draw_right_string(*right, *y, text);
        }
        *y -= ROW_STEP;
    }
}

fn emissions_breakdown(
    page: &mut PageLayout,
    y: &mut f32,
    totals: &EmissionTotals,
    energy: Option<&EnergyRecord>,
) {
    *y -= ROW_STEP;
    page.set_font(Font::Bold, 12.0);
    page.draw_string(MARGIN, *y, "3. EMISSIONS BREAKDOWN");
    *y -= 10.0 * MM;

    page.set_font(Font::Regular, 10.0);
    let scope3 = 0.0_f64;
    let lines = [
        format!("Scope 1 (direct): {:.3} tCO2e", totals.direct),
        format!("Scope 2 (electricity): {:.3} tCO2e", totals.indirect),
        format!("Scope 3 (raw materials): {scope3:.3} tCO2e (MVP: calculation pending)"),
        match energy {
            Some(e) => format!(
                "Energy basis: electricity {:.3} kWh, natural gas {:.3} Sm3",
                e.electricity_kwh, e.natural_gas_sm3
            ),
            None => "Energy basis: not recorded".to_string(),
        },
    ];
    for line in lines {
        page.draw_string(MARGIN, *y, line);
        *y -= ROW_STEP;
    }
    *y -= 6.0 * MM;
}

fn footer(page: &mut PageLayout, y: &mut f32) {
    page.set_font(Font::Oblique, 9.0);
    page.draw_string(
        MARGIN,
        *y,
        "Note: this PDF is an MVP summary. The final version will mirror every sheet of the CBAM template.",
    );
}

fn local_time(now: OffsetDateTime, local: Option<UtcOffset>) -> OffsetDateTime {
    match local {
        Some(offset) => now.to_offset(offset),
        None => {
            debug!("Local UTC offset unavailable, stamping in UTC");
            now
        }
    }
}

fn format_day(at: OffsetDateTime) -> String {
    format!("{:02}.{:02}.{}", at.day(), u8::from(at.month()), at.year())
}
