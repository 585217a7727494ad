// src/emissions.rs

use crate::error::{ReportError, Result};
use crate::model::ProductLine;

/// Installation-level embedded emissions for one period, in tCO2e.
///
/// Both the workbook and the summary document take their totals from
/// [`EmissionTotals::from_products`] so the two can never disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionTotals {
    /// Scope 1: Σ production × direct SEE
    pub direct: f64,
    /// Scope 2: Σ production × indirect SEE
    pub indirect: f64,
}

impl EmissionTotals {
    pub fn from_products(products: &[ProductLine]) -> Result<Self> {
        let mut totals = EmissionTotals::default();

        for (idx, p) in products.iter().enumerate() {
            check_finite(idx, "production_t", p.production_t)?;
            check_finite(idx, "direct_see", p.direct_see)?;
            check_finite(idx, "indirect_see", p.indirect_see)?;

            totals.direct += p.production_t * p.direct_see;
            totals.indirect += p.production_t * p.indirect_see;
        }

        check_finite(products.len(), "scope 1 total", totals.direct)?;
        check_finite(products.len(), "scope 2 total", totals.indirect)?;
        Ok(totals)
    }

    /// Same totals rounded to `places` decimals.
    pub fn rounded(&self, places: u32) -> Self {
        EmissionTotals {
            direct: round_to(self.direct, places),
            indirect: round_to(self.indirect, places),
        }
    }
}

/// Half-away-from-zero rounding to a fixed number of decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    let rounded = (value * factor).round() / factor;
    // keep -0.0 out of the output cells
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn check_finite(idx: usize, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ReportError::Arithmetic {
            field: format!("product[{idx}].{field}"),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(production_t: f64, direct_see: f64, indirect_see: f64) -> ProductLine {
        ProductLine {
            cn_code: "7308".into(),
            product_name: "Mounting rail".into(),
            production_t,
            direct_see,
            indirect_see,
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_sum_production_weighted_see() {
        let totals = EmissionTotals::from_products(&[
            product(10.0, 1.5, 0.25),
            product(4.0, 0.5, 1.0),
        ])
        .unwrap();
        assert!((totals.direct - 17.0).abs() < 1e-9);
        assert!((totals.indirect - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_products_are_zero() {
        let totals = EmissionTotals::from_products(&[]).unwrap();
        assert_eq!(totals, EmissionTotals::default());
    }

    #[test]
    fn test_non_finite_input_is_arithmetic_error() {
        let err = EmissionTotals::from_products(&[product(1.0, f64::NAN, 0.0)]).unwrap_err();
        match err {
            ReportError::Arithmetic { field, .. } => assert_eq!(field, "product[0].direct_see"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_overflowing_total_is_arithmetic_error() {
        let err = EmissionTotals::from_products(&[product(f64::MAX, 0.0, 10.0)]).unwrap_err();
        assert!(matches!(err, ReportError::Arithmetic { .. }));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-0.0000001, 3), 0.0);
        assert!(round_to(-0.0000001, 3).is_sign_positive());
    }
}
