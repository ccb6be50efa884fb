//! Calibration
//!
//! This module converts raw ADC readings into physical units, one pure
//! function per conversion, and owns the per-modality decode policy: a
//! modality whose readings cannot all be read from the packet falls back
//! to zero-filled values so the rest of the sample keeps streaming. GSR
//! and IMU dropout is reported (once per session, via the tracker); PPG
//! and battery dropout is expected on many device configurations and is
//! absorbed silently.

use crate::packet::{ChannelTag, RawPacket, ReadError};
use crate::registry::Modality;
use crate::tracker::ErrorTracker;

/// Reference resistors selected by the top two bits of a GSR reading (kΩ)
pub const GSR_REF_KOHMS: [f64; 4] = [40.2, 287.0, 1000.0, 3300.0];

/// ADC reference: 3.0 V full scale over a 12-bit range
const ADC_VOLTS_PER_COUNT: f64 = 3.0 / 4095.0;

/// Accelerometer zero-g offset (ADC counts)
const ACCEL_OFFSET: f64 = 2048.0;

/// Accelerometer sensitivity (ADC counts per g)
const ACCEL_COUNTS_PER_G: f64 = 830.0;

/// Standard gravity (m/s^2)
const GRAVITY: f64 = 9.81;

/// Gyroscope sensitivity (counts per deg/s)
const GYRO_COUNTS_PER_DPS: f64 = 131.0;

/// Magnetometer sensitivity (counts per local-flux unit)
const MAG_COUNTS_PER_FLUX: f64 = 1100.0;

/// Reference-resistor range index encoded in the top two bits of a raw
/// 16-bit GSR reading
pub fn gsr_range(raw: u16) -> usize {
    ((raw >> 14) & 0x03) as usize
}

/// Skin resistance in kΩ from a raw 16-bit GSR reading.
///
/// The low 14 bits are the ADC count; the top two bits select one of four
/// reference resistors. At or below the 0.5 V divider midpoint the reading
/// carries no usable signal and the resistance reports as 0.0.
pub fn gsr_kohms(raw: u16) -> f64 {
    let raw14 = raw & 0x3FFF;
    let volts = raw14 as f64 * ADC_VOLTS_PER_COUNT;
    if volts <= 0.5 {
        0.0
    } else {
        GSR_REF_KOHMS[gsr_range(raw)] / ((volts / 0.5) - 1.0)
    }
}

/// PPG amplitude in millivolts
pub fn ppg_millivolts(raw: i32) -> f64 {
    raw as f64 * (3000.0 / 4095.0)
}

/// Acceleration in m/s^2 from an offset-centered low-noise accelerometer
/// reading
pub fn accel_ms2(raw: i32) -> f64 {
    (raw as f64 - ACCEL_OFFSET) / ACCEL_COUNTS_PER_G * GRAVITY
}

/// Angular rate in deg/s
pub fn gyro_dps(raw: i32) -> f64 {
    raw as f64 / GYRO_COUNTS_PER_DPS
}

/// Magnetic field in local-flux units
pub fn mag_flux(raw: i32) -> f64 {
    raw as f64 / MAG_COUNTS_PER_FLUX
}

/// Battery voltage in millivolts
pub fn battery_millivolts(raw: i32) -> f64 {
    raw as f64 * (6000.0 / 4095.0)
}

/// Decode one modality from `packet` and append its calibrated channels to
/// `sample`, in the modality's fixed channel order.
///
/// Any unreadable tag zero-fills every channel of the modality; the sample
/// always grows by exactly `modality.channel_count()` values.
pub fn decode_into(
    modality: Modality,
    packet: &dyn RawPacket,
    tracker: &mut ErrorTracker,
    sample: &mut Vec<f64>,
) {
    match modality {
        Modality::Gsr => match packet.read(ChannelTag::GsrRaw) {
            Ok(raw) => {
                let raw = (raw & 0xFFFF) as u16;
                sample.push(gsr_kohms(raw));
                sample.push(gsr_range(raw) as f64);
            }
            Err(ReadError::NotFound(tag)) => {
                tracker.report_once(
                    modality.id(),
                    &format!("GSR reading ({tag}) not found; check device sensor configuration"),
                );
                sample.extend([0.0, 0.0]);
            }
        },
        Modality::Ppg => {
            // Absent by design on many configurations; stays silent
            let value = packet
                .read(ChannelTag::Ppg)
                .map(ppg_millivolts)
                .unwrap_or(0.0);
            sample.push(value);
        }
        Modality::Accel => decode_triple(modality, packet, tracker, sample, accel_ms2),
        Modality::Gyro => decode_triple(modality, packet, tracker, sample, gyro_dps),
        Modality::Mag => decode_triple(modality, packet, tracker, sample, mag_flux),
        Modality::Battery => {
            // Same reliability profile as PPG; stays silent
            let value = packet
                .read(ChannelTag::Battery)
                .map(battery_millivolts)
                .unwrap_or(0.0);
            sample.push(value);
        }
    }
}

/// Decode a three-axis modality. A miss on any axis invalidates the whole
/// triple: the device either streams the sensor or it does not.
fn decode_triple(
    modality: Modality,
    packet: &dyn RawPacket,
    tracker: &mut ErrorTracker,
    sample: &mut Vec<f64>,
    convert: fn(i32) -> f64,
) {
    let tags = modality.tags();
    let mut raw = [0i32; 3];
    for (slot, tag) in raw.iter_mut().zip(tags) {
        match packet.read(*tag) {
            Ok(value) => *slot = value,
            Err(ReadError::NotFound(tag)) => {
                tracker.report_once(
                    modality.id(),
                    &format!(
                        "{} reading ({tag}) not found; check device sensor configuration",
                        modality.id()
                    ),
                );
                sample.extend([0.0; 3]);
                return;
            }
        }
    }
    sample.extend(raw.map(convert));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::TaggedPacket;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_gsr_range_selection() {
        assert_eq!(gsr_range(0b00_00000000000000), 0);
        assert_eq!(gsr_range(0b01_00000000000000), 1);
        assert_eq!(gsr_range(0b10_00000000000000), 2);
        assert_eq!(gsr_range(0b11_00000000000000), 3);
        // Range bits are independent of the ADC count
        assert_eq!(gsr_range(0b10_11111111111111), 2);
    }

    #[test]
    fn test_gsr_zero_below_midpoint() {
        // Range 1, ADC count 0: volts = 0, at or below the 0.5 V midpoint
        assert_eq!(gsr_kohms(0b01_00000000000000), 0.0);
        // Count 682 is the highest count still at or below 0.5 V
        assert!(682.0 * 3.0 / 4095.0 <= 0.5);
        assert_eq!(gsr_kohms(682), 0.0);
        // One count above the midpoint produces a finite positive value
        assert!(gsr_kohms(683) > 0.0);
    }

    #[test]
    fn test_gsr_resistance_in_range_two() {
        // Range 2 selects the 1000 kΩ reference
        let raw14: u16 = 2048;
        let raw = (0b10 << 14) | raw14;
        let volts = raw14 as f64 * 3.0 / 4095.0;
        let expected = 1000.0 / ((volts / 0.5) - 1.0);
        assert!((gsr_kohms(raw) - expected).abs() < EPSILON);
        // ~1.5 V input sits near 500 kΩ on this range
        assert!((gsr_kohms(raw) - 500.0).abs() < 1.0);
    }

    #[test]
    fn test_gsr_reference_resistor_per_range() {
        // Same ADC count, different range bits: resistance scales with R_ref
        let raw14: u16 = 3000;
        let base = gsr_kohms(raw14); // range 0
        for range in 1..4usize {
            let raw = ((range as u16) << 14) | raw14;
            let expected = base / GSR_REF_KOHMS[0] * GSR_REF_KOHMS[range];
            assert!((gsr_kohms(raw) - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ppg_linear_scale() {
        assert_eq!(ppg_millivolts(0), 0.0);
        assert!((ppg_millivolts(4095) - 3000.0).abs() < EPSILON);
        assert!((ppg_millivolts(2048) - 2048.0 * 3000.0 / 4095.0).abs() < EPSILON);
    }

    #[test]
    fn test_accel_zero_at_offset() {
        // Raw 2048 is the zero-g point; must be exactly 0.0
        assert_eq!(accel_ms2(2048), 0.0);
        // One g above the offset
        assert!((accel_ms2(2048 + 830) - 9.81).abs() < EPSILON);
        assert!((accel_ms2(2048 - 830) + 9.81).abs() < EPSILON);
    }

    #[test]
    fn test_gyro_and_mag_scales() {
        assert!((gyro_dps(131) - 1.0).abs() < EPSILON);
        assert!((gyro_dps(-262) + 2.0).abs() < EPSILON);
        assert!((mag_flux(1100) - 1.0).abs() < EPSILON);
        assert!((mag_flux(-550) + 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_battery_linear_scale() {
        assert_eq!(battery_millivolts(0), 0.0);
        assert!((battery_millivolts(4095) - 6000.0).abs() < EPSILON);
    }

    #[test]
    fn test_decode_gsr_emits_resistance_and_range() {
        let raw = (0b10u16 << 14) | 2048;
        let pkt = TaggedPacket::new().with(ChannelTag::GsrRaw, raw as i32);
        let mut tracker = ErrorTracker::new();
        let mut sample = Vec::new();

        decode_into(Modality::Gsr, &pkt, &mut tracker, &mut sample);

        assert_eq!(sample.len(), 2);
        assert!((sample[0] - gsr_kohms(raw)).abs() < EPSILON);
        assert_eq!(sample[1], 2.0);
        assert_eq!(tracker.reported_count(), 0);
    }

    #[test]
    fn test_missing_gsr_zero_fills_and_reports() {
        let pkt = TaggedPacket::new();
        let mut tracker = ErrorTracker::new();
        let mut sample = Vec::new();

        decode_into(Modality::Gsr, &pkt, &mut tracker, &mut sample);

        assert_eq!(sample, vec![0.0, 0.0]);
        assert!(tracker.is_reported("gsr"));
    }

    #[test]
    fn test_missing_ppg_is_silent() {
        let pkt = TaggedPacket::new();
        let mut tracker = ErrorTracker::new();
        let mut sample = Vec::new();

        decode_into(Modality::Ppg, &pkt, &mut tracker, &mut sample);
        decode_into(Modality::Battery, &pkt, &mut tracker, &mut sample);

        assert_eq!(sample, vec![0.0, 0.0]);
        assert_eq!(tracker.reported_count(), 0);
    }

    #[test]
    fn test_partial_triple_zero_fills_all_axes() {
        // Two of three gyro axes present: the whole triple is invalid
        let pkt = TaggedPacket::new()
            .with(ChannelTag::GyroX, 131)
            .with(ChannelTag::GyroY, 131);
        let mut tracker = ErrorTracker::new();
        let mut sample = Vec::new();

        decode_into(Modality::Gyro, &pkt, &mut tracker, &mut sample);

        assert_eq!(sample, vec![0.0, 0.0, 0.0]);
        assert!(tracker.is_reported("gyro"));
    }

    #[test]
    fn test_complete_triple_is_calibrated() {
        let pkt = TaggedPacket::new()
            .with(ChannelTag::AccelX, 2048)
            .with(ChannelTag::AccelY, 2048 + 830)
            .with(ChannelTag::AccelZ, 2048 - 830);
        let mut tracker = ErrorTracker::new();
        let mut sample = Vec::new();

        decode_into(Modality::Accel, &pkt, &mut tracker, &mut sample);

        assert_eq!(sample[0], 0.0);
        assert!((sample[1] - 9.81).abs() < EPSILON);
        assert!((sample[2] + 9.81).abs() < EPSILON);
        assert_eq!(tracker.reported_count(), 0);
    }
}
