//! Status normalization: raw heterogeneous device fields into a
//! [`StatusSnapshot`].
//!
//! Pure and total -- no I/O, no failure path. Malformed fields were
//! already degraded to absent at the gateway boundary; here, absent
//! fields fall back to the previous snapshot's value so a sparse payload
//! can never blank a previously-valid reading. A field with no previous
//! value stays absent (the caller substitutes a documented default rather
//! than inventing a reading).

use chrono::{DateTime, Utc};

use airlink_gateway::{FanSetting, RawStatus};

use crate::model::status::{FilterLife, OperatingMode, PowerState, StatusSnapshot};

/// Fan percentage presented while the device sleeps.
const SLEEP_FAN_PCT: u8 = 10;

/// Fan percentage presented when a powered device reports no usable
/// numeric level (named settings, absent field). A documented default,
/// not device-confirmed semantics.
const DEFAULT_FAN_PCT: u8 = 50;

/// Highest numeric fan level the device reports.
const MAX_FAN_LEVEL: u8 = 3;

/// Normalize one raw payload against the previous snapshot.
pub fn normalize(
    raw: &RawStatus,
    previous: Option<&StatusSnapshot>,
    captured_at: DateTime<Utc>,
) -> StatusSnapshot {
    let power = match raw.pwr {
        Some(1) => PowerState::On,
        Some(_) => PowerState::Off,
        None => previous.map_or(PowerState::Off, |p| p.power),
    };

    let mode = match raw.mode.as_deref() {
        Some("A") => OperatingMode::Automatic,
        Some("M") => OperatingMode::Manual,
        Some("S") => OperatingMode::Sleep,
        Some(_) => OperatingMode::Unknown,
        None => previous.map_or(OperatingMode::Unknown, |p| p.mode),
    };

    let fan_level = match &raw.om {
        Some(FanSetting::Level(level)) => Some(*level),
        Some(FanSetting::Named(_)) => None,
        None => previous.and_then(|p| p.fan_level),
    };

    let fan_percent = fan_percent(power, mode, fan_level);

    let pre_filter = raw
        .fltsts0
        .map(FilterLife::new)
        .or_else(|| previous.map(|p| p.pre_filter))
        .unwrap_or_default();
    let wick_filter = raw
        .fltsts1
        .map(FilterLife::new)
        .or_else(|| previous.map(|p| p.wick_filter))
        .unwrap_or_default();

    StatusSnapshot {
        power,
        mode,
        fan_level,
        fan_percent,
        air_quality: raw.iaql.or_else(|| previous.and_then(|p| p.air_quality)),
        pre_filter,
        wick_filter,
        temperature: raw.temp.or_else(|| previous.and_then(|p| p.temperature)),
        humidity: raw.rh.or_else(|| previous.and_then(|p| p.humidity)),
        captured_at,
    }
}

/// Presentation fan percentage.
///
/// Only meaningful while powered: off forces 0 regardless of the raw
/// level. Sleep runs the fan at a fixed low percentage. A numeric level
/// `n` in 1-3 maps to `round(n / 3 * 100)`; anything else while powered
/// falls back to [`DEFAULT_FAN_PCT`].
#[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fan_percent(power: PowerState, mode: OperatingMode, fan_level: Option<u8>) -> u8 {
    if !power.is_on() {
        return 0;
    }
    if mode == OperatingMode::Sleep {
        return SLEEP_FAN_PCT;
    }
    match fan_level {
        Some(level @ 1..=MAX_FAN_LEVEL) => {
            (f64::from(level) / f64::from(MAX_FAN_LEVEL) * 100.0).round() as u8
        }
        _ => DEFAULT_FAN_PCT,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp")
    }

    fn full_raw() -> RawStatus {
        RawStatus {
            pwr: Some(1),
            mode: Some("M".into()),
            om: Some(FanSetting::Level(2)),
            iaql: Some(3.0),
            fltsts0: Some(120),
            fltsts1: Some(300),
            temp: Some(21.5),
            rh: Some(45.0),
        }
    }

    /// Rebuild a raw payload from a snapshot's own fields.
    fn raw_from_snapshot(snap: &StatusSnapshot) -> RawStatus {
        RawStatus {
            pwr: Some(u8::from(snap.power.is_on())),
            mode: Some(
                match snap.mode {
                    OperatingMode::Automatic => "A",
                    OperatingMode::Manual => "M",
                    OperatingMode::Sleep => "S",
                    OperatingMode::Unknown => "?",
                }
                .into(),
            ),
            om: snap.fan_level.map(FanSetting::Level),
            iaql: snap.air_quality,
            fltsts0: Some(snap.pre_filter.days),
            fltsts1: Some(snap.wick_filter.days),
            temp: snap.temperature,
            rh: snap.humidity,
        }
    }

    #[test]
    fn fan_level_mapping() {
        for (level, expected) in [(1u8, 33u8), (2, 67), (3, 100)] {
            let raw = RawStatus {
                pwr: Some(1),
                mode: Some("M".into()),
                om: Some(FanSetting::Level(level)),
                ..RawStatus::default()
            };
            let snap = normalize(&raw, None, at());
            assert_eq!(snap.fan_percent, expected, "level {level}");
        }
    }

    #[test]
    fn powered_off_forces_zero_percent() {
        let raw = RawStatus {
            pwr: Some(0),
            mode: Some("M".into()),
            om: Some(FanSetting::Level(3)),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.fan_percent, 0);
        assert_eq!(snap.fan_level, Some(3), "native level is retained");
    }

    #[test]
    fn sleep_mode_runs_a_fixed_low_percentage() {
        let raw = RawStatus {
            pwr: Some(1),
            mode: Some("S".into()),
            om: Some(FanSetting::Named("s".into())),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.fan_percent, 10);
    }

    #[test]
    fn named_level_while_powered_defaults_to_half() {
        let raw = RawStatus {
            pwr: Some(1),
            mode: Some("A".into()),
            om: Some(FanSetting::Named("t".into())),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.fan_percent, 50);
    }

    #[test]
    fn absent_level_while_powered_defaults_to_half() {
        let raw = RawStatus {
            pwr: Some(1),
            mode: Some("A".into()),
            ..RawStatus::default()
        };
        assert_eq!(normalize(&raw, None, at()).fan_percent, 50);
    }

    #[test]
    fn unknown_mode_code_maps_to_unknown() {
        let raw = RawStatus {
            pwr: Some(1),
            mode: Some("X".into()),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.mode, OperatingMode::Unknown);
        assert_eq!(snap.mode.display_mode(), OperatingMode::Automatic);
    }

    #[test]
    fn filter_mapping_reaches_the_snapshot() {
        let raw = RawStatus {
            fltsts0: Some(180),
            fltsts1: Some(17),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.pre_filter.percent(), 100);
        assert!(!snap.pre_filter.change_required());
        assert_eq!(snap.wick_filter.percent(), 9);
        assert!(snap.wick_filter.change_required());
    }

    #[test]
    fn absent_power_keeps_the_previous_state() {
        let previous = normalize(&full_raw(), None, at());
        assert_eq!(previous.power, PowerState::On);

        let sparse = RawStatus {
            temp: Some(22.0),
            ..RawStatus::default()
        };
        let snap = normalize(&sparse, Some(&previous), at());

        assert_eq!(snap.power, PowerState::On);
        assert_eq!(snap.mode, previous.mode);
        assert_eq!(snap.temperature, Some(22.0));
        assert_eq!(snap.humidity, previous.humidity);
    }

    #[test]
    fn sparse_payload_never_blanks_valid_fields() {
        let previous = normalize(&full_raw(), None, at());
        let snap = normalize(&RawStatus::default(), Some(&previous), at());
        assert_eq!(snap, StatusSnapshot { captured_at: at(), ..previous });
    }

    #[test]
    fn fields_without_history_stay_absent() {
        let raw = RawStatus {
            pwr: Some(1),
            ..RawStatus::default()
        };
        let snap = normalize(&raw, None, at());
        assert_eq!(snap.air_quality, None);
        assert_eq!(snap.temperature, None);
        assert_eq!(snap.humidity, None);
    }

    #[test]
    fn fully_populated_inputs_are_a_fixed_point() {
        let first = normalize(&full_raw(), None, at());
        let second = normalize(&raw_from_snapshot(&first), Some(&first), at());
        assert_eq!(first, second);
    }

    #[test]
    fn powered_off_snapshot_is_also_a_fixed_point() {
        let raw = RawStatus {
            pwr: Some(0),
            ..full_raw()
        };
        let first = normalize(&raw, None, at());
        let second = normalize(&raw_from_snapshot(&first), Some(&first), at());
        assert_eq!(first, second);
    }
}
