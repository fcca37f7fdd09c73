use esp_idf_svc::hal::gpio::{AnyIOPin, IOPin, Pin};

use psychro_common::sensor::dht11::{self, FRAME_BITS};
use psychro_common::sensor::{ProbeDriver, ProbeError, Sample};

/// A DHT11 on a single-wire GPIO, bit-banged through the IDF GPIO calls.
pub struct Dht11 {
    _pin: AnyIOPin,
    pin: i32,
}

impl Dht11 {
    pub fn new(pin: impl IOPin) -> Self {
        let pin = pin.downgrade();
        let number = i32::from(pin.pin());
        Self {
            _pin: pin,
            pin: number,
        }
    }

    /// Microseconds the line stays at `state`, or `None` past `max_wait`.
    fn signal_level(&self, max_wait: u32, state: i32) -> Option<u32> {
        use esp_idf_svc::sys::*;

        let mut u_sec = 0;
        unsafe {
            while gpio_get_level(self.pin) == state {
                u_sec += 1;
                if u_sec > max_wait {
                    return None;
                }
                ets_delay_us(1);
            }
        }

        Some(u_sec)
    }

    fn read_pulses(&self) -> Result<[u32; FRAME_BITS], ProbeError> {
        use esp_idf_svc::sys::*;

        let mut pulses = [0; FRAME_BITS];

        unsafe {
            esp!(gpio_set_direction(self.pin, GPIO_MODE_DEF_OUTPUT))
                .map_err(|e| ProbeError::Pin(e.to_string()))?;

            // start signal: at least 18 ms low
            gpio_set_level(self.pin, 0);
            ets_delay_us(20_000);

            gpio_set_level(self.pin, 1);
            ets_delay_us(25);

            esp!(gpio_set_direction(self.pin, GPIO_MODE_DEF_INPUT))
                .map_err(|e| ProbeError::Pin(e.to_string()))?;
        }

        // response: 80 us low, then 80 us high
        self.signal_level(85, 0).ok_or(ProbeError::Timeout)?;
        self.signal_level(85, 1).ok_or(ProbeError::Timeout)?;

        for pulse in pulses.iter_mut() {
            // every bit starts with 50 us low
            self.signal_level(56, 0).ok_or(ProbeError::Timeout)?;
            *pulse = self.signal_level(75, 1).ok_or(ProbeError::Timeout)?;
        }

        Ok(pulses)
    }
}

impl ProbeDriver for Dht11 {
    fn sample(&mut self) -> Result<Sample, ProbeError> {
        let pulses = self.read_pulses()?;
        dht11::decode_pulses(&pulses)
    }
}
