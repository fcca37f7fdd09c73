//! Dashboard derivations: scan the table, order it in time, split it into
//! per-probe series and lay out the charts.

use chrono::NaiveDateTime;
use psychro_model::{format_timestamp, TableRow};
use serde::Serialize;

use crate::figure::{Axis, Figure, Layout, Trace};
use crate::psychro;
use crate::store::{StoreError, TableStore};

/// Rows ascending by timestamp. Rows whose timestamp does not parse are
/// dropped with a warning.
pub fn sort_rows(rows: Vec<TableRow>) -> Vec<(NaiveDateTime, TableRow)> {
    let mut timed: Vec<_> = rows
        .into_iter()
        .filter_map(|row| match row.parsed_timestamp() {
            Some(when) => Some((when, row)),
            None => {
                log::warn!("Skipping row with bad timestamp {:?}", row.timestamp);
                None
            }
        })
        .collect();

    timed.sort_by_key(|(when, _)| *when);
    timed
}

/// Time series of both probes. Rows without probe values are skipped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbeSeries {
    pub timestamps: Vec<NaiveDateTime>,
    pub inlet_temp: Vec<f64>,
    pub outlet_temp: Vec<f64>,
    pub inlet_hum: Vec<f64>,
    pub outlet_hum: Vec<f64>,
}

impl ProbeSeries {
    pub fn from_sorted(rows: &[(NaiveDateTime, TableRow)]) -> Self {
        let mut series = Self::default();

        for (when, row) in rows {
            let Some(reading) = row.reading() else {
                continue;
            };
            series.timestamps.push(*when);
            series.inlet_temp.push(reading.inlet_temp as f64);
            series.outlet_temp.push(reading.outlet_temp as f64);
            series.inlet_hum.push(reading.inlet_hum as f64);
            series.outlet_hum.push(reading.outlet_hum as f64);
        }

        series
    }

    fn time_axis(&self) -> Axis {
        Axis::Time(self.timestamps.iter().copied().map(format_timestamp).collect())
    }

    fn progression(&self, title: &str, y_title: &str, inlet: &[f64], outlet: &[f64]) -> Figure {
        Figure {
            data: vec![
                Trace::lines("Inlet", self.time_axis(), inlet.to_vec()),
                Trace::lines("Outlet", self.time_axis(), outlet.to_vec()),
            ],
            layout: Layout {
                title: title.into(),
                xaxis_title: "Time".into(),
                yaxis_title: y_title.into(),
                legend_title: None,
            },
        }
    }

    pub fn temperature_figure(&self) -> Figure {
        self.progression(
            "Temperature Progression",
            "Temperature (°C)",
            &self.inlet_temp,
            &self.outlet_temp,
        )
    }

    pub fn humidity_figure(&self) -> Figure {
        self.progression(
            "Humidity Progression",
            "Relative Humidity (%)",
            &self.inlet_hum,
            &self.outlet_hum,
        )
    }
}

pub fn psychrometric_figure() -> Figure {
    let data = psychro::psychrometric_curves()
        .into_iter()
        .map(|curve| {
            Trace::lines(
                format!("RH {}%", curve.relative_humidity),
                Axis::Numeric(curve.temperatures),
                curve.dew_points,
            )
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: "Psychrometric Analysis".into(),
            xaxis_title: "Temperature (°C)".into(),
            yaxis_title: "Dew Point (°C)".into(),
            legend_title: Some("Relative Humidity".into()),
        },
    }
}

/// Everything the dashboard shows.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub rows: usize,
    pub temperature: Figure,
    pub humidity: Figure,
    pub psychrometry: Figure,
}

impl Dashboard {
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        let sorted = sort_rows(rows);
        let series = ProbeSeries::from_sorted(&sorted);

        Self {
            rows: sorted.len(),
            temperature: series.temperature_figure(),
            humidity: series.humidity_figure(),
            psychrometry: psychrometric_figure(),
        }
    }

    pub fn load<S: TableStore>(store: &S) -> Result<Self, StoreError> {
        let rows = store.scan()?;
        log::info!("Scanned {} rows", rows.len());
        Ok(Self::from_rows(rows))
    }
}
