// src/heuristics/mod.rs

mod generic;

pub use generic::GenericMatcher;

use serde::Deserialize;
use serde::Serialize;
use tracing::{debug, warn};

/// The two quantities we try to lift off an energy invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// kWh
    Electricity,
    /// Sm³ / Nm³ / m³
    NaturalGas,
}

impl Quantity {
    pub const ALL: [Quantity; 2] = [Quantity::Electricity, Quantity::NaturalGas];
}

/// What a single matcher made of the text for one quantity.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Found(f64),
    /// The unit pattern matched but the numeral did not parse.
    Malformed(String),
    Miss,
}

/// A pattern matcher for energy quantities.
///
/// Supplier-specific parsers implement this and are run ahead of the
/// generic fallback.
pub trait EnergyMatcher: Send + Sync {
    fn name(&self) -> &str;

    fn find(&self, text: &str, quantity: Quantity) -> MatchOutcome;
}

/// Energy figures recovered from an invoice. `None` means "enter manually".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub electricity_kwh: Option<f64>,
    pub natural_gas_sm3: Option<f64>,
}

impl ExtractionResult {
    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Electricity => self.electricity_kwh,
            Quantity::NaturalGas => self.natural_gas_sm3,
        }
    }

    fn set(&mut self, quantity: Quantity, value: f64) {
        match quantity {
            Quantity::Electricity => self.electricity_kwh = Some(value),
            Quantity::NaturalGas => self.natural_gas_sm3 = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.electricity_kwh.is_none() && self.natural_gas_sm3.is_none()
    }

    /// How many quantities were found (out of the two we look for).
    pub fn coverage(&self) -> (usize, usize) {
        let filled = Quantity::ALL
            .iter()
            .filter(|q| self.get(**q).is_some())
            .count();
        (filled, Quantity::ALL.len())
    }
}

/// Ordered matchers; for each quantity the first `Found` wins.
pub struct MatcherChain {
    matchers: Vec<Box<dyn EnergyMatcher>>,
    fallback: GenericMatcher,
}

impl Default for MatcherChain {
    fn default() -> Self {
        Self {
            matchers: Vec::new(),
            fallback: GenericMatcher,
        }
    }
}

impl MatcherChain {
    /// Add a matcher ahead of the generic fallback (after any added earlier).
    pub fn with_matcher(mut self, matcher: impl EnergyMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    pub fn extract(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::default();

        for quantity in Quantity::ALL {
            let chain = self
                .matchers
                .iter()
                .map(|m| m.as_ref() as &dyn EnergyMatcher)
                .chain(std::iter::once(&self.fallback as &dyn EnergyMatcher));

            for matcher in chain {
                match matcher.find(text, quantity) {
                    MatchOutcome::Found(value) => {
                        debug!(matcher = matcher.name(), ?quantity, value, "Quantity found");
                        result.set(quantity, value);
                        break;
                    }
                    MatchOutcome::Malformed(raw) => {
                        warn!(
                            matcher = matcher.name(),
                            ?quantity,
                            raw = %raw,
                            "Unit matched but numeral did not parse — treating as miss"
                        );
                    }
                    MatchOutcome::Miss => {}
                }
            }
        }

        result
    }
}

/// Extract energy quantities from raw invoice text with the default chain.
pub fn extract_energy(text: &str) -> ExtractionResult {
    MatcherChain::default().extract(text)
}

/// Parse a numeral written in the European convention: `.` groups
/// thousands, `,` is the decimal point.
pub fn parse_european_number(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSupplier(MatchOutcome);

    impl EnergyMatcher for FixedSupplier {
        fn name(&self) -> &str {
            "fixed-supplier"
        }

        fn find(&self, _text: &str, quantity: Quantity) -> MatchOutcome {
            match quantity {
                Quantity::Electricity => self.0.clone(),
                Quantity::NaturalGas => MatchOutcome::Miss,
            }
        }
    }

    #[test]
    fn test_european_numbers() {
        assert_eq!(parse_european_number("1.234,56"), Some(1234.56));
        assert_eq!(parse_european_number("450"), Some(450.0));
        assert_eq!(parse_european_number("12.500"), Some(12500.0));
        assert_eq!(parse_european_number("0,75"), Some(0.75));
        assert_eq!(parse_european_number("1,2,3"), None);
    }

    #[test]
    fn test_extract_kwh_label_first() {
        let r = extract_energy("kWh: 1.234,56");
        assert_eq!(r.electricity_kwh, Some(1234.56));
        assert_eq!(r.natural_gas_sm3, None);
    }

    #[test]
    fn test_extract_gas_number_first() {
        let r = extract_energy("450 Nm3");
        assert_eq!(r.natural_gas_sm3, Some(450.0));
        assert_eq!(r.electricity_kwh, None);
    }

    #[test]
    fn test_no_numbers_is_empty() {
        let r = extract_energy("no numbers here");
        assert!(r.is_empty());
        assert_eq!(r.coverage(), (0, 2));
    }

    #[test]
    fn test_both_quantities() {
        let text = "Fatura dönemi 01.01.2025\nTüketim 12.500 kWh\nDoğalgaz Sm3 = 3.210,5\n";
        let r = extract_energy(text);
        assert_eq!(r.electricity_kwh, Some(12500.0));
        assert_eq!(r.natural_gas_sm3, Some(3210.5));
        assert_eq!(r.coverage(), (2, 2));
    }

    #[test]
    fn test_malformed_numeral_is_a_miss() {
        let r = extract_energy("kWh: 1,2,3");
        assert_eq!(r.electricity_kwh, None);
    }

    #[test]
    fn test_supplier_matcher_wins_over_fallback() {
        let chain = MatcherChain::default().with_matcher(FixedSupplier(MatchOutcome::Found(99.0)));
        let r = chain.extract("kWh: 5\n120 Sm3");
        assert_eq!(r.electricity_kwh, Some(99.0));
        assert_eq!(r.natural_gas_sm3, Some(120.0));
    }

    #[test]
    fn test_supplier_malformed_falls_through() {
        let chain = MatcherChain::default()
            .with_matcher(FixedSupplier(MatchOutcome::Malformed("12,,".into())));
        let r = chain.extract("Aktif tüketim kWh 7.000");
        assert_eq!(r.electricity_kwh, Some(7000.0));
    }
}
