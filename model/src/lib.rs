//! Data shapes shared by the device, the ingestion endpoint and the dashboard.
//!
//! The device posts a [`TelemetryRecord`], the ingestion endpoint accepts an
//! [`IngestPayload`] and persists a [`TableRow`], which the dashboard reads back.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Text format of every timestamp on the wire and in the table. Sorts lexically.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(when: NaiveDateTime) -> String {
    when.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT).ok()
}

/// One complete set of sampled values from the inlet and outlet probes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub inlet_temp: f32,
    pub inlet_hum: f32,
    pub outlet_temp: f32,
    pub outlet_hum: f32,
}

impl Reading {
    /// Temperatures a probe can plausibly report, in °C.
    pub const TEMPERATURE_RANGE: RangeInclusive<f32> = -20.0..=60.0;
    /// Relative humidity bounds, in %.
    pub const HUMIDITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;

    pub fn is_plausible(&self) -> bool {
        Self::TEMPERATURE_RANGE.contains(&self.inlet_temp)
            && Self::TEMPERATURE_RANGE.contains(&self.outlet_temp)
            && Self::HUMIDITY_RANGE.contains(&self.inlet_hum)
            && Self::HUMIDITY_RANGE.contains(&self.outlet_hum)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inlet: {:.1}°C {:.1}% / outlet: {:.1}°C {:.1}%",
            self.inlet_temp, self.inlet_hum, self.outlet_temp, self.outlet_hum
        )
    }
}

/// The payload the device posts: a flat JSON object of the four reading
/// values plus the time they were taken.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TelemetryRecord {
    pub timestamp: String,
    #[serde(flatten)]
    pub reading: Reading,
}

impl TelemetryRecord {
    pub fn new(when: NaiveDateTime, reading: Reading) -> Self {
        Self {
            timestamp: format_timestamp(when),
            reading,
        }
    }
}

/// Single-probe payload `{timestamp, temperature, humidity}`.
///
/// Older producers post this shape; it is still accepted on ingestion.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SingleProbeRecord {
    pub timestamp: String,
    pub temperature: f32,
    pub humidity: f32,
}

/// Any payload the ingestion endpoint accepts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum IngestPayload {
    Probes(TelemetryRecord),
    SingleProbe(SingleProbeRecord),
}

/// One persisted row, keyed by `Timestamp`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct TableRow {
    #[serde(rename = "Timestamp", alias = "TimeStamp")]
    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet_temp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet_hum: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_temp: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_hum: Option<f32>,

    #[serde(rename = "Temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(rename = "Humidity", default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
}

impl TableRow {
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// The four probe values, if this row was written from a two-probe payload.
    pub fn reading(&self) -> Option<Reading> {
        Some(Reading {
            inlet_temp: self.inlet_temp?,
            inlet_hum: self.inlet_hum?,
            outlet_temp: self.outlet_temp?,
            outlet_hum: self.outlet_hum?,
        })
    }
}

impl From<IngestPayload> for TableRow {
    fn from(payload: IngestPayload) -> Self {
        match payload {
            IngestPayload::Probes(record) => Self {
                timestamp: record.timestamp,
                inlet_temp: Some(record.reading.inlet_temp),
                inlet_hum: Some(record.reading.inlet_hum),
                outlet_temp: Some(record.reading.outlet_temp),
                outlet_hum: Some(record.reading.outlet_hum),
                ..Default::default()
            },
            IngestPayload::SingleProbe(record) => Self {
                timestamp: record.timestamp,
                temperature: Some(record.temperature),
                humidity: Some(record.humidity),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading() -> Reading {
        Reading {
            inlet_temp: 21.0,
            inlet_hum: 40.0,
            outlet_temp: 35.5,
            outlet_hum: 18.0,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(12, 0, 30)
            .unwrap()
    }

    #[test]
    fn telemetry_record_is_a_flat_object() {
        let record = TelemetryRecord::new(noon(), reading());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "timestamp": "2024-05-17 12:00:30",
                "inlet_temp": 21.0,
                "inlet_hum": 40.0,
                "outlet_temp": 35.5,
                "outlet_hum": 18.0,
            })
        );
    }

    #[test]
    fn payload_accepts_both_shapes() {
        let probes: IngestPayload = serde_json::from_str(
            r#"{"timestamp":"2024-05-17 12:00:30","inlet_temp":21,"inlet_hum":40,"outlet_temp":35.5,"outlet_hum":18}"#,
        )
        .unwrap();
        assert_eq!(probes, IngestPayload::Probes(TelemetryRecord::new(noon(), reading())));

        let single: IngestPayload = serde_json::from_str(
            r#"{"timestamp":"2024-05-17 12:00:30","temperature":25.0,"humidity":50.0}"#,
        )
        .unwrap();
        assert!(matches!(single, IngestPayload::SingleProbe(_)));
    }

    #[test]
    fn payload_without_temperature_is_rejected() {
        let result = serde_json::from_str::<IngestPayload>(
            r#"{"timestamp":"2024-05-17 12:00:30","humidity":50.0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn row_round_trips_through_the_reading() {
        let row = TableRow::from(IngestPayload::Probes(TelemetryRecord::new(noon(), reading())));
        assert_eq!(row.reading(), Some(reading()));
        assert_eq!(row.parsed_timestamp(), Some(noon()));

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Timestamp"], "2024-05-17 12:00:30");
        assert!(json.get("Temperature").is_none());
    }

    #[test]
    fn single_probe_row_has_no_reading() {
        let row = TableRow::from(IngestPayload::SingleProbe(SingleProbeRecord {
            timestamp: "2024-05-17 12:00:30".into(),
            temperature: 25.0,
            humidity: 50.0,
        }));
        assert_eq!(row.reading(), None);
        assert_eq!(row.temperature, Some(25.0));
    }

    #[test]
    fn row_accepts_dashboard_spelling_of_timestamp() {
        let row: TableRow =
            serde_json::from_str(r#"{"TimeStamp":"2024-05-17 12:00:30","inlet_temp":1.0}"#).unwrap();
        assert_eq!(row.timestamp, "2024-05-17 12:00:30");
        assert_eq!(row.inlet_temp, Some(1.0));
    }

    #[test]
    fn plausibility_bounds() {
        assert!(reading().is_plausible());
        let hot = Reading {
            outlet_temp: 75.0,
            ..reading()
        };
        assert!(!hot.is_plausible());
    }
}
