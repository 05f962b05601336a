// Shared helpers for request validation and exports

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use validator::ValidationError;

use crate::error::{AppError, Result};

/// Accepts `YYYY-MM` commission periods.
pub fn validate_periodo(periodo: &str) -> std::result::Result<(), ValidationError> {
    let valid = periodo.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", periodo), "%Y-%m-%d").is_ok();
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("periodo");
        err.message = Some("periodo must be YYYY-MM".into());
        Err(err)
    }
}

/// Inclusive date filter sent as `{ fechaInicio, fechaFin }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(serialize_with = "serialize_start_of_day")]
    pub fecha_inicio: NaiveDate,
    #[serde(serialize_with = "serialize_end_of_day")]
    pub fecha_fin: NaiveDate,
}

impl DateRange {
    pub fn new(fecha_inicio: NaiveDate, fecha_fin: NaiveDate) -> Result<Self> {
        if fecha_inicio > fecha_fin {
            return Err(AppError::Validation(format!(
                "date range start {} is after end {}",
                fecha_inicio, fecha_fin
            )));
        }
        Ok(Self {
            fecha_inicio,
            fecha_fin,
        })
    }

    pub fn parse(fecha_inicio: &str, fecha_fin: &str) -> Result<Self> {
        let parse = |value: &str| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| AppError::Validation(format!("invalid date: {}", value)))
        };
        Self::new(parse(fecha_inicio)?, parse(fecha_fin)?)
    }

    /// Query-string form used by the GET report endpoints.
    pub(crate) fn query(&self) -> [(&'static str, String); 2] {
        [
            ("fechaInicio", self.fecha_inicio.format("%Y-%m-%d").to_string()),
            ("fechaFin", self.fecha_fin.format("%Y-%m-%d").to_string()),
        ]
    }
}

fn serialize_start_of_day<S: serde::Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let at = date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    serializer.serialize_str(&iso_millis(at))
}

fn serialize_end_of_day<S: serde::Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let at = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc();
    serializer.serialize_str(&iso_millis(at))
}

/// ISO-8601 with milliseconds and `Z`, the format browsers send.
pub fn iso_millis(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_periodo() {
        assert!(validate_periodo("2024-07").is_ok());
        assert!(validate_periodo("2024-13").is_err());
        assert!(validate_periodo("2024-7").is_err());
        assert!(validate_periodo("julio").is_err());
    }

    #[test]
    fn test_date_range_must_be_ordered() {
        assert!(DateRange::parse("2024-01-01", "2024-03-31").is_ok());
        assert!(matches!(
            DateRange::parse("2024-04-01", "2024-03-31"),
            Err(AppError::Validation(_))
        ));
        assert!(DateRange::parse("2024-02-30", "2024-03-31").is_err());
    }

    #[test]
    fn test_date_range_body_covers_whole_days() {
        let range = DateRange::parse("2024-01-01", "2024-01-31").unwrap();
        let body = serde_json::to_value(range).unwrap();
        assert_eq!(body["fechaInicio"], "2024-01-01T00:00:00.000Z");
        assert_eq!(body["fechaFin"], "2024-01-31T23:59:59.999Z");
    }
}
