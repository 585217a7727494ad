// src/model.rs

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// RFC 3339 timestamps, written as strings. Reading also takes native TOML
/// datetimes with an offset (`updated_at = 2025-04-02T10:00:00Z`).
mod timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Native(toml::value::Datetime),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<OffsetDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OffsetDateTime>, D::Error> {
        let text = match Option::<Raw>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(Raw::Native(dt)) => dt.to_string(),
            Some(Raw::Text(s)) => s,
        };
        OffsetDateTime::parse(&text, &Rfc3339)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("'{text}' is not an RFC 3339 timestamp: {e}")))
    }
}

/// Site the report is filed for, as entered in the installation form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Installation {
    pub name: String,
    pub name_en: String,
    pub street_number: String,
    pub economic_activity: String,
    pub post_code: String,
    pub po_box: String,
    pub city: String,
    pub country: String,
    pub unlocode: String,
    /// Kept verbatim; the template takes whatever the operator typed.
    pub latitude: String,
    pub longitude: String,
}

/// Free-text statements for the emissions & energy quality block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityStatements {
    pub data_quality: String,
    pub default_values_justification: String,
    pub quality_assurance: String,
}

/// One quarterly reporting window and the installation it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year: i32,
    pub quarter: u8,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(default)]
    pub installation: Installation,
    #[serde(default)]
    pub quality: QualityStatements,
}

impl ReportingPeriod {
    /// `2025-Q1` style label used in headers and logs.
    pub fn label(&self) -> String {
        format!("{}-Q{}", self.year, self.quarter)
    }
}

/// Energy consumption and scope aggregates for a period.
///
/// Created lazily: a period without one is valid and exports with zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyRecord {
    pub electricity_kwh: f64,
    pub natural_gas_sm3: f64,
    pub scope1_tco2e: f64,
    pub scope2_tco2e: f64,
    pub scope3_tco2e: f64,
    #[serde(with = "timestamp")]
    pub updated_at: Option<OffsetDateTime>,
}

/// A single product line of the quarterly summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductLine {
    pub cn_code: String,
    pub cn_name: String,
    /// e.g. "Iron or steel products", "Aluminium products"
    pub aggregated_category: String,
    pub product_name: String,
    /// Tonnes produced in the quarter.
    pub production_t: f64,
    /// tCO2e/t
    pub direct_see: f64,
    /// tCO2e/t
    pub indirect_see: f64,
}

impl ProductLine {
    pub fn total_see(&self) -> f64 {
        self.direct_see + self.indirect_see
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_product_defaults_to_zero() {
        let p: ProductLine = toml::from_str(r#"cn_code = "7308""#).unwrap();
        assert_eq!(p.cn_code, "7308");
        assert_eq!(p.production_t, 0.0);
        assert_eq!(p.direct_see, 0.0);
        assert_eq!(p.indirect_see, 0.0);
    }

    #[test]
    fn test_period_dates_and_label() {
        let p: ReportingPeriod = toml::from_str(
            r#"
year = 2025
quarter = 2
start_date = "2025-04-01"
end_date = "2025-06-30"
"#,
        )
        .unwrap();
        assert_eq!(p.start_date, date!(2025 - 04 - 01));
        assert_eq!(p.end_date, date!(2025 - 06 - 30));
        assert_eq!(p.label(), "2025-Q2");
        assert_eq!(p.installation, Installation::default());
    }

    #[test]
    fn test_energy_defaults() {
        let e: EnergyRecord = toml::from_str("electricity_kwh = 12.5").unwrap();
        assert_eq!(e.electricity_kwh, 12.5);
        assert_eq!(e.natural_gas_sm3, 0.0);
        assert!(e.updated_at.is_none());
    }

    #[test]
    fn test_updated_at_quoted_or_native() {
        let quoted: EnergyRecord = toml::from_str(r#"updated_at = "2025-04-02T10:00:00Z""#).unwrap();
        let native: EnergyRecord = toml::from_str("updated_at = 2025-04-02T13:00:00+03:00").unwrap();
        assert_eq!(quoted.updated_at, Some(datetime!(2025-04-02 10:00 UTC)));
        assert_eq!(native.updated_at, quoted.updated_at);
    }

    #[test]
    fn test_updated_at_without_offset_rejected() {
        assert!(toml::from_str::<EnergyRecord>("updated_at = 2025-04-02T10:00:00").is_err());
        assert!(toml::from_str::<EnergyRecord>(r#"updated_at = "yesterday""#).is_err());
    }

    #[test]
    fn test_updated_at_written_as_rfc3339_string() {
        let e = EnergyRecord {
            updated_at: Some(datetime!(2025-04-02 10:00 UTC)),
            ..Default::default()
        };
        let text = toml::to_string(&e).unwrap();
        assert!(text.contains(r#"updated_at = "2025-04-02T10:00:00Z""#), "{text}");
    }
}
