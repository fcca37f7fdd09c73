//! Dew point and the psychrometric curve family drawn by the dashboard.

/// Magnus coefficients (over water).
pub const MAGNUS_A: f64 = 17.27;
pub const MAGNUS_B: f64 = 237.7;

/// Dew point in °C for air at `temperature` °C and `relative_humidity` %.
///
/// `relative_humidity` must be in (0, 100]; zero humidity has no dew point.
pub fn dew_point(temperature: f64, relative_humidity: f64) -> f64 {
    let alpha = (MAGNUS_A * temperature) / (MAGNUS_B + temperature) + (relative_humidity / 100.0).ln();
    (MAGNUS_B * alpha) / (MAGNUS_A - alpha)
}

/// `count` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Dew point against air temperature at one relative humidity.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub relative_humidity: u8,
    pub temperatures: Vec<f64>,
    pub dew_points: Vec<f64>,
}

pub const CURVE_TEMPERATURE_RANGE: (f64, f64) = (0.0, 40.0);
pub const CURVE_POINTS: usize = 100;

/// One curve per relative-humidity decile from 10 % to 90 %.
pub fn psychrometric_curves() -> Vec<Curve> {
    let (start, end) = CURVE_TEMPERATURE_RANGE;
    let temperatures = linspace(start, end, CURVE_POINTS);

    (1..=9u8)
        .map(|decile| {
            let relative_humidity = decile * 10;
            Curve {
                relative_humidity,
                dew_points: temperatures
                    .iter()
                    .map(|t| dew_point(*t, relative_humidity as f64))
                    .collect(),
                temperatures: temperatures.clone(),
            }
        })
        .collect()
}
