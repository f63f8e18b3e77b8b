// ── Status domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Nominal filter service life the day counters are measured against.
pub const FILTER_SERVICE_LIFE_DAYS: u32 = 180;

/// Remaining-life percentage below which a filter change is due.
pub const FILTER_CHANGE_THRESHOLD_PCT: u8 = 10;

/// Power state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

/// Operating mode reported by the device.
///
/// `Unknown` covers mode codes this engine does not recognize; downstream
/// presentation folds it to automatic via [`display_mode`](Self::display_mode)
/// -- a documented default, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OperatingMode {
    #[strum(to_string = "auto", serialize = "automatic")]
    Automatic,
    Manual,
    Sleep,
    Unknown,
}

impl OperatingMode {
    /// The mode to present downstream: unknown displays as automatic.
    pub fn display_mode(self) -> Self {
        if self == Self::Unknown {
            Self::Automatic
        } else {
            self
        }
    }
}

/// Remaining life of one filter, as a day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterLife {
    pub days: u32,
}

impl FilterLife {
    pub fn new(days: u32) -> Self {
        Self { days }
    }

    /// Remaining life as a 0-100 percentage of the nominal service life.
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(self) -> u8 {
        let pct = f64::from(self.days) / f64::from(FILTER_SERVICE_LIFE_DAYS) * 100.0;
        pct.round().clamp(0.0, 100.0) as u8
    }

    /// Whether the filter is due for replacement.
    pub fn change_required(self) -> bool {
        self.percent() < FILTER_CHANGE_THRESHOLD_PCT
    }
}

impl Default for FilterLife {
    fn default() -> Self {
        Self {
            days: FILTER_SERVICE_LIFE_DAYS,
        }
    }
}

/// One normalized status reading, replaced wholesale on each successful
/// refresh. Fields the device did not report stay absent rather than
/// being invented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub power: PowerState,
    pub mode: OperatingMode,

    /// Native fan level (1-3) when the device reported one numerically.
    pub fan_level: Option<u8>,

    /// Presentation fan speed, 0-100.
    pub fan_percent: u8,

    /// Air quality index, non-negative when present.
    pub air_quality: Option<f64>,

    pub pre_filter: FilterLife,
    pub wick_filter: FilterLife,

    /// Ambient temperature in degrees Celsius.
    pub temperature: Option<f64>,

    /// Relative humidity percentage.
    pub humidity: Option<f64>,

    pub captured_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// The safe presentation for a device that cannot be reached.
    ///
    /// Power off and fan stopped so consumers never see a stale "on"
    /// state; filters report full life; temperature and humidity hold the
    /// documented neutral values (20.0 °C / 50 %); air quality stays
    /// absent because no reading exists to report.
    pub fn safe_default() -> Self {
        Self {
            power: PowerState::Off,
            mode: OperatingMode::Automatic,
            fan_level: None,
            fan_percent: 0,
            air_quality: None,
            pre_filter: FilterLife::default(),
            wick_filter: FilterLife::default(),
            temperature: Some(20.0),
            humidity: Some(50.0),
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn filter_life_mapping() {
        assert_eq!(FilterLife::new(180).percent(), 100);
        assert_eq!(FilterLife::new(90).percent(), 50);
        assert_eq!(FilterLife::new(17).percent(), 9);
        assert_eq!(FilterLife::new(0).percent(), 0);
        // Day counts past the nominal life clamp instead of overflowing.
        assert_eq!(FilterLife::new(400).percent(), 100);
    }

    #[test]
    fn filter_change_threshold() {
        assert!(!FilterLife::new(180).change_required());
        assert!(!FilterLife::new(18).change_required()); // exactly 10%
        assert!(FilterLife::new(17).change_required()); // 9%
    }

    #[test]
    fn unknown_mode_displays_as_automatic() {
        assert_eq!(
            OperatingMode::Unknown.display_mode(),
            OperatingMode::Automatic
        );
        assert_eq!(OperatingMode::Sleep.display_mode(), OperatingMode::Sleep);
    }

    #[test]
    fn mode_parses_both_spellings() {
        assert_eq!(
            OperatingMode::from_str("auto").ok(),
            Some(OperatingMode::Automatic)
        );
        assert_eq!(
            OperatingMode::from_str("automatic").ok(),
            Some(OperatingMode::Automatic)
        );
        assert_eq!(
            OperatingMode::from_str("sleep").ok(),
            Some(OperatingMode::Sleep)
        );
    }

    #[test]
    fn safe_default_is_visibly_off() {
        let snap = StatusSnapshot::safe_default();
        assert_eq!(snap.power, PowerState::Off);
        assert_eq!(snap.fan_percent, 0);
        assert!(!snap.pre_filter.change_required());
        assert!(!snap.wick_filter.change_required());
        assert_eq!(snap.temperature, Some(20.0));
        assert_eq!(snap.humidity, Some(50.0));
        assert_eq!(snap.air_quality, None);
    }
}
