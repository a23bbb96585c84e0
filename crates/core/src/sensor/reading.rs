//! Measurement frame decoding and plausibility gate
//!
//! # Frame layout
//!
//! ```text
//! byte:   0        1        2        3        4        5        6
//!       status  HHHHHHHH HHHHHHHH HHHHTTTT TTTTTTTT TTTTTTTT  crc
//! ```
//!
//! Humidity and temperature are 20-bit fractions sharing byte 3. The trailing
//! byte is the chip's CRC; it is carried through but not verified.

use crate::bus::BusError;
use crate::sensor::StatusFlags;

/// Length of a full measurement read
pub const FRAME_LEN: usize = 7;

/// Readings at or below this temperature are rejected
pub const MIN_TEMPERATURE_C: f32 = -80.0;
/// Readings at or above this temperature are rejected
pub const MAX_TEMPERATURE_C: f32 = 130.0;
/// Lowest accepted humidity (inclusive)
pub const MIN_HUMIDITY_PCT: f32 = 0.0;
/// Highest accepted humidity (inclusive)
pub const MAX_HUMIDITY_PCT: f32 = 100.0;

const FRACTION_SCALE: f32 = 1_048_576.0; // 2^20
const FRACTION_MAX: u32 = 0x000F_FFFF;

/// Raw 7-byte measurement frame as read from the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawReading(pub [u8; FRAME_LEN]);

impl RawReading {
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_byte(self.0[0])
    }

    /// 20-bit humidity fraction: bytes 1..=2 and the upper nibble of byte 3.
    pub const fn humidity_raw(&self) -> u32 {
        ((self.0[1] as u32) << 12) | ((self.0[2] as u32) << 4) | ((self.0[3] as u32) >> 4)
    }

    /// 20-bit temperature fraction: lower nibble of byte 3 and bytes 4..=5.
    pub const fn temperature_raw(&self) -> u32 {
        (((self.0[3] & 0x0F) as u32) << 16) | ((self.0[4] as u32) << 8) | (self.0[5] as u32)
    }

    /// Convert to engineering units. Pure; performs no validation.
    pub fn decode(&self) -> SensorReading {
        let humidity_pct = self.humidity_raw() as f32 * 100.0 / FRACTION_SCALE;
        let temperature_c = self.temperature_raw() as f32 * 200.0 / FRACTION_SCALE - 50.0;
        SensorReading {
            temperature_c,
            humidity_pct,
        }
    }

    /// Build a frame that decodes to the given values (nearest representable).
    ///
    /// Status is idle and calibrated; the CRC byte is left at zero. Values
    /// outside the encodable range saturate.
    pub fn synthesize(temperature_c: f32, humidity_pct: f32) -> Self {
        let h = to_fraction(humidity_pct / 100.0);
        let t = to_fraction((temperature_c + 50.0) / 200.0);
        Self([
            StatusFlags::CALIBRATED.bits(),
            (h >> 12) as u8,
            (h >> 4) as u8,
            (((h & 0x0F) << 4) | (t >> 16)) as u8,
            (t >> 8) as u8,
            t as u8,
            0x00,
        ])
    }
}

fn to_fraction(unit: f32) -> u32 {
    // `as` saturates: negative and NaN inputs become 0.
    let scaled = (unit * FRACTION_SCALE + 0.5) as u32;
    scaled.min(FRACTION_MAX)
}

/// Decoded measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    /// Temperature in degrees Celsius
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_pct: f32,
}

impl SensorReading {
    /// "No data" marker. Never passes [`SensorReading::is_valid`].
    pub const INVALID: SensorReading = SensorReading {
        temperature_c: f32::NAN,
        humidity_pct: f32::NAN,
    };

    pub const fn new(temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            temperature_c,
            humidity_pct,
        }
    }

    /// Physical plausibility: temperature in (-80, 130) °C, humidity in
    /// [0, 100] %, neither NaN.
    pub fn is_valid(&self) -> bool {
        if self.temperature_c.is_nan() || self.humidity_pct.is_nan() {
            return false;
        }
        self.temperature_c > MIN_TEMPERATURE_C
            && self.temperature_c < MAX_TEMPERATURE_C
            && self.humidity_pct >= MIN_HUMIDITY_PCT
            && self.humidity_pct <= MAX_HUMIDITY_PCT
    }

    /// Pass the reading through the plausibility gate.
    pub fn validate(self) -> Result<Self, BusError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(BusError::OutOfRange)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        let diff = a - b;
        diff <= tol && diff >= -tol
    }

    #[test]
    fn field_extraction_is_bit_exact() {
        let raw = RawReading::new([0x18, 0x5A, 0x3C, 0x91, 0x27, 0xB4, 0x00]);
        assert_eq!(raw.humidity_raw(), 0x5A3C9);
        assert_eq!(raw.temperature_raw(), 0x127B4);
        assert!(raw.status().is_calibrated());
    }

    #[test]
    fn decode_matches_formulas() {
        let raw = RawReading::new([0x18, 0x5A, 0x3C, 0x91, 0x27, 0xB4, 0x00]);
        let reading = raw.decode();

        let h = ((((0x5Au32 << 8) | 0x3C) << 4) | (0x91 >> 4)) as f32 * 100.0 / 1_048_576.0;
        let t = ((((0x91u32 & 0x0F) << 8 | 0x27) << 8) | 0xB4) as f32 * 200.0 / 1_048_576.0 - 50.0;
        assert_eq!(reading.humidity_pct, h);
        assert_eq!(reading.temperature_c, t);
        assert!(approx(reading.humidity_pct, 35.249, 0.001));
        assert!(approx(reading.temperature_c, -35.561, 0.001));
    }

    #[test]
    fn decode_is_deterministic() {
        let raw = RawReading::new([0x1C, 0x80, 0x00, 0x05, 0x55, 0x55, 0xAA]);
        assert_eq!(raw.decode(), raw.decode());
    }

    #[test]
    fn decode_extremes() {
        let zero = RawReading::new([0; FRAME_LEN]).decode();
        assert_eq!(zero.humidity_pct, 0.0);
        assert_eq!(zero.temperature_c, -50.0);

        let full = RawReading::new([0x18, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]).decode();
        assert!(full.humidity_pct < 100.0);
        assert!(full.temperature_c > 149.99);
    }

    #[test]
    fn synthesize_round_trip() {
        for &(t, h) in &[
            (23.4f32, 45.0f32),
            (-40.0, 0.0),
            (0.0, 100.0),
            (85.5, 12.34),
            (-49.9, 99.99),
        ] {
            let reading = RawReading::synthesize(t, h).decode();
            assert!(
                approx(reading.temperature_c, t, 0.01),
                "t={} got {}",
                t,
                reading.temperature_c
            );
            assert!(
                approx(reading.humidity_pct, h, 0.01),
                "h={} got {}",
                h,
                reading.humidity_pct
            );
        }
    }

    #[test]
    fn synthesize_saturates() {
        let raw = RawReading::synthesize(500.0, -10.0);
        assert_eq!(raw.temperature_raw(), 0xFFFFF);
        assert_eq!(raw.humidity_raw(), 0);
    }

    #[test]
    fn plausibility_bounds() {
        assert!(SensorReading::new(20.0, 0.0).is_valid());
        assert!(SensorReading::new(20.0, 100.0).is_valid());
        assert!(SensorReading::new(-79.9, 50.0).is_valid());
        assert!(SensorReading::new(129.9, 50.0).is_valid());

        assert!(!SensorReading::new(-80.0, 50.0).is_valid());
        assert!(!SensorReading::new(130.0, 50.0).is_valid());
        assert!(!SensorReading::new(20.0, -0.1).is_valid());
        assert!(!SensorReading::new(20.0, 100.1).is_valid());
        assert!(!SensorReading::new(f32::NAN, 50.0).is_valid());
        assert!(!SensorReading::INVALID.is_valid());
    }

    #[test]
    fn gate_rejects_hot_frame() {
        // Temperature fraction 0xFFFFF decodes to ~150 °C.
        let raw = RawReading::new([0x18, 0x80, 0x00, 0x0F, 0xFF, 0xFF, 0x00]);
        assert_eq!(raw.decode().validate(), Err(BusError::OutOfRange));
    }

    #[test]
    fn gate_passes_plausible_frame() {
        let raw = RawReading::synthesize(21.0, 55.0);
        assert!(raw.decode().validate().is_ok());
    }
}
