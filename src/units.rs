//! Piecewise-linear unit conversions between human units (seconds, percent)
//! and protocol byte values (ramp-rate, on-level, LED-brightness).
//!
//! Ported from `examples/original_source/pysteon/units.py`.

/// (seconds, ramp-rate byte), sorted ascending by seconds / descending by
/// byte, as in the original 31-entry table.
const RAMP_RATES: [(f64, u8); 31] = [
    (0.1, 0x1f),
    (0.2, 0x1e),
    (0.3, 0x1d),
    (0.5, 0x1c),
    (2.0, 0x1b),
    (4.5, 0x1a),
    (6.5, 0x19),
    (8.5, 0x18),
    (19.0, 0x17),
    (21.5, 0x16),
    (23.5, 0x15),
    (26.0, 0x14),
    (28.0, 0x13),
    (30.0, 0x12),
    (32.0, 0x11),
    (34.0, 0x10),
    (38.5, 0x0f),
    (43.0, 0x0e),
    (47.0, 0x0d),
    (60.0, 0x0c),
    (90.0, 0x0b),
    (120.0, 0x0a),
    (150.0, 0x09),
    (180.0, 0x08),
    (210.0, 0x07),
    (240.0, 0x06),
    (270.0, 0x05),
    (300.0, 0x04),
    (360.0, 0x03),
    (420.0, 0x02),
    (480.0, 0x01),
];

/// Walks `table` (any order; re-sorted ascending by key here) and returns
/// the value paired with the entry immediately before the first key that
/// strictly exceeds `key`, or the table's last value if no entry exceeds
/// it.
fn project_onto<V: Copy>(key: f64, table: &[(f64, V)]) -> V {
    let mut sorted: Vec<(f64, V)> = table.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    for index in 1..sorted.len() {
        if sorted[index].0 > key {
            return sorted[index - 1].1;
        }
    }

    sorted.last().expect("table is non-empty").1
}

/// Converts a number of seconds to the nearest ramp-rate byte.
pub fn ramp_rate_from_seconds(seconds: f64) -> u8 {
    project_onto(seconds, &RAMP_RATES)
}

/// Converts a ramp-rate byte back to a number of seconds. The table is
/// inverted (sorted by byte instead of seconds) before projecting.
pub fn ramp_rate_to_seconds(byte: u8) -> f64 {
    let inverted: Vec<(f64, f64)> = RAMP_RATES
        .iter()
        .map(|&(s, b)| (f64::from(b), s))
        .collect();
    project_onto(f64::from(byte), &inverted)
}

/// Rounds to the nearest integer, breaking exact `.5` ties downward (spec
/// S5: `light_on(.., 50.0, ..)` must emit `0x7F`, not `0x80`).
fn round_half_down(value: f64) -> f64 {
    (value - 0.5).ceil()
}

/// Scales a percent (clamped to 0..100) to an LED-brightness byte (0..0x7f).
pub fn led_brightness_from_percent(percent: f64) -> u8 {
    let percent = percent.max(0.0).min(100.0);
    round_half_down(percent / 100.0 * f64::from(0x7f)) as u8
}

/// Scales an LED-brightness byte (clamped to 0..0x7f) back to a percent.
pub fn led_brightness_to_percent(byte: u8) -> f64 {
    let byte = byte.min(0x7f);
    (f64::from(byte) / f64::from(0x7f) * 100.0).round()
}

/// Scales a percent (clamped to 0..100) to an on-level byte (0..0xff).
pub fn on_level_from_percent(percent: f64) -> u8 {
    let percent = percent.max(0.0).min(100.0);
    round_half_down(percent / 100.0 * f64::from(0xffu16)) as u8
}

/// Scales an on-level byte back to a percent.
pub fn on_level_to_percent(byte: u8) -> f64 {
    (f64::from(byte) / f64::from(0xffu16) * 100.0).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_level_quantization_is_idempotent_after_one_pass() {
        for b in 0..=255u16 {
            let b = b as u8;
            let percent = on_level_to_percent(b);
            let back = on_level_from_percent(percent);
            assert_eq!(
                back,
                on_level_from_percent(on_level_to_percent(back)),
                "idempotent after one pass for byte {}",
                b
            );
        }
    }

    #[test]
    fn on_level_extremes() {
        assert_eq!(on_level_from_percent(0.0), 0);
        assert_eq!(on_level_from_percent(100.0), 0xff);
        // S5: half-unit ties round down, so 50% yields 0x7F, not 0x80.
        assert_eq!(on_level_from_percent(50.0), 0x7f);
    }

    #[test]
    fn on_level_clamps_out_of_range_input() {
        assert_eq!(on_level_from_percent(-10.0), 0);
        assert_eq!(on_level_from_percent(250.0), 0xff);
    }

    #[test]
    fn led_brightness_extremes() {
        assert_eq!(led_brightness_from_percent(0.0), 0);
        assert_eq!(led_brightness_from_percent(100.0), 0x7f);
    }

    #[test]
    fn ramp_rate_monotonic_on_table_entries() {
        for &(seconds, byte) in RAMP_RATES.iter() {
            assert_eq!(ramp_rate_from_seconds(seconds), byte);
        }
    }

    #[test]
    fn ramp_rate_roundtrip_on_table_entries() {
        for &(seconds, byte) in RAMP_RATES.iter() {
            let back_seconds = ramp_rate_to_seconds(byte);
            assert_eq!(ramp_rate_from_seconds(back_seconds), byte);
        }
    }

    #[test]
    fn ramp_rate_below_table_min_uses_fastest() {
        assert_eq!(ramp_rate_from_seconds(0.0), 0x1f);
    }

    #[test]
    fn ramp_rate_above_table_max_uses_slowest() {
        assert_eq!(ramp_rate_from_seconds(1000.0), 0x01);
    }
}
