use super::{ProbeDriver, ProbeError, Sample};

/// Deterministic stand-in for a probe, for host runs without hardware.
///
/// Values swing slowly around a base point, one step per sample.
#[derive(Clone, Debug)]
pub struct SimulatedDriver {
    base: Sample,
    swing: Sample,
    step: u32,
}

impl SimulatedDriver {
    const PERIOD: f32 = 40.0;

    pub fn new(temperature_celsius: f32, humidity_percent: f32) -> Self {
        Self {
            base: Sample {
                temperature_celsius,
                humidity_percent,
            },
            swing: Sample {
                temperature_celsius: 2.0,
                humidity_percent: 5.0,
            },
            step: 0,
        }
    }

    /// Typical ambient air entering the unit.
    pub fn inlet() -> Self {
        Self::new(22.0, 55.0)
    }

    /// Warm, dry air leaving the unit.
    pub fn outlet() -> Self {
        Self::new(38.0, 25.0)
    }
}

impl ProbeDriver for SimulatedDriver {
    fn sample(&mut self) -> Result<Sample, ProbeError> {
        let phase = (self.step as f32 / Self::PERIOD) * std::f32::consts::TAU;
        self.step = self.step.wrapping_add(1);

        Ok(Sample {
            temperature_celsius: self.base.temperature_celsius
                + self.swing.temperature_celsius * phase.sin(),
            humidity_percent: (self.base.humidity_percent - self.swing.humidity_percent * phase.sin())
                .clamp(0.0, 100.0),
        })
    }
}

#[test]
fn simulated_samples_stay_plausible() {
    let mut driver = SimulatedDriver::outlet();
    for _ in 0..200 {
        let sample = driver.sample().unwrap();
        assert!((-20.0..=60.0).contains(&sample.temperature_celsius));
        assert!((0.0..=100.0).contains(&sample.humidity_percent));
    }
}
