//! DHT11 frame decoding.
//!
//! The probe answers a start pulse with 40 bits: humidity integral and
//! decimal bytes, temperature integral and decimal bytes, then a checksum.
//! Each bit is a ~50 µs low followed by a high whose length carries the value.
//! Timing the line is the firmware's job; turning the timings into a sample
//! happens here.

use super::{ProbeError, Sample};

pub const FRAME_BITS: usize = 40;
pub const FRAME_BYTES: usize = 5;

/// High pulses longer than this (µs) are ones.
pub const ONE_THRESHOLD_US: u32 = 40;

/// Pack the high-pulse lengths of the 40 data bits, MSB first.
pub fn frame_from_pulses(pulses: &[u32; FRAME_BITS]) -> [u8; FRAME_BYTES] {
    let mut frame = [0u8; FRAME_BYTES];

    for (index, &pulse) in pulses.iter().enumerate() {
        if pulse > ONE_THRESHOLD_US {
            frame[index / 8] |= 1 << (7 - index % 8);
        }
    }

    frame
}

pub fn decode(frame: [u8; FRAME_BYTES]) -> Result<Sample, ProbeError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(ProbeError::ChecksumMismatch);
    }

    let humidity = frame[0] as f32 + frame[1] as f32 / 10.0;

    // Bit 7 of the temperature decimal byte flags a sub-zero reading.
    let mut temperature = frame[2] as f32 + (frame[3] & 0x7F) as f32 / 10.0;
    if frame[3] & 0x80 != 0 {
        temperature = -temperature;
    }

    Ok(Sample {
        temperature_celsius: temperature,
        humidity_percent: humidity,
    })
}

pub fn decode_pulses(pulses: &[u32; FRAME_BITS]) -> Result<Sample, ProbeError> {
    decode(frame_from_pulses(pulses))
}
