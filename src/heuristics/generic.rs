use super::{EnergyMatcher, MatchOutcome, Quantity, parse_european_number};
use regex::Regex;

/// Fallback matcher — unit-anchored regex patterns that work on any
/// supplier's invoice text, at the cost of precision.
pub struct GenericMatcher;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

// Tried in order; the first structural match decides.
const ELECTRICITY_PATTERNS: [&str; 2] = [
    r"(?i)kWh\s*[:=]?\s*(?P<num>[0-9][0-9.,]*)",
    r"(?i)(?P<num>[0-9][0-9.,]*)\s*kWh",
];

const GAS_PATTERNS: [&str; 2] = [
    r"(?i)(?:Sm\s*3|Nm\s*3|m\s*3)\s*[:=]?\s*(?P<num>[0-9][0-9.,]*)",
    r"(?i)(?P<num>[0-9][0-9.,]*)\s*(?:Sm\s*3|Nm\s*3|m\s*3)",
];

impl EnergyMatcher for GenericMatcher {
    fn name(&self) -> &str {
        "generic"
    }

    fn find(&self, text: &str, quantity: Quantity) -> MatchOutcome {
        let patterns = match quantity {
            Quantity::Electricity => &ELECTRICITY_PATTERNS,
            Quantity::NaturalGas => &GAS_PATTERNS,
        };

        let Some(raw) = first_numeral(text, patterns) else {
            return MatchOutcome::Miss;
        };

        match parse_european_number(&raw) {
            Some(value) => MatchOutcome::Found(value),
            None => MatchOutcome::Malformed(raw),
        }
    }
}

/// Numeral text of the first pattern that matches at all.
fn first_numeral(text: &str, patterns: &[&str]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).ok()?;
        re.captures(text).map(|c| c["num"].to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_before_number() {
        assert_eq!(
            GenericMatcher.find("Aktif Enerji KWH = 8.750,25", Quantity::Electricity),
            MatchOutcome::Found(8750.25)
        );
    }

    #[test]
    fn test_number_before_unit() {
        assert_eq!(
            GenericMatcher.find("Tüketim: 980 kwh", Quantity::Electricity),
            MatchOutcome::Found(980.0)
        );
    }

    #[test]
    fn test_gas_unit_variants() {
        for text in ["Sm3: 1.200", "Nm 3 1.200", "m3 1.200", "1.200 sm3", "1.200 m 3"] {
            assert_eq!(
                GenericMatcher.find(text, Quantity::NaturalGas),
                MatchOutcome::Found(1200.0),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Önceki dönem kWh: 100\nBu dönem kWh: 200";
        assert_eq!(
            GenericMatcher.find(text, Quantity::Electricity),
            MatchOutcome::Found(100.0)
        );
    }

    #[test]
    fn test_malformed_does_not_fall_through() {
        // the unit-first pattern matches structurally, so the later
        // well-formed "42 kWh" is never considered
        assert_eq!(
            GenericMatcher.find("kWh: 1,2,3 ... 42 kWh", Quantity::Electricity),
            MatchOutcome::Malformed("1,2,3".into())
        );
    }

    #[test]
    fn test_miss() {
        assert_eq!(
            GenericMatcher.find("Fatura toplamı 1.234,00 TL", Quantity::Electricity),
            MatchOutcome::Miss
        );
        assert_eq!(
            GenericMatcher.find("Fatura toplamı 1.234,00 TL", Quantity::NaturalGas),
            MatchOutcome::Miss
        );
    }
}
