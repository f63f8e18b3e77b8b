// ── Raw status payload ──
//
// The control script emits one JSON object of raw device fields. Firmware
// generations disagree about encodings (numbers arrive as numbers or as
// strings, the fan setting can be a level or a named mode), so the payload
// is decoded tolerantly here, once, at the gateway boundary. A field that
// cannot be understood degrades to absent -- decoding never fails.

use serde_json::Value;

/// The device's reported fan setting.
///
/// Numeric levels are the 1-3 native scale. Some firmware reports named
/// settings instead (`"s"` for silent, `"t"` for turbo); those are kept
/// verbatim so the normalizer can apply its documented default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanSetting {
    Level(u8),
    Named(String),
}

/// Raw status fields as reported by the device, all optional.
///
/// Field names follow the device's own vocabulary: `pwr` power flag,
/// `mode` operating mode code, `om` fan setting, `iaql` air quality index,
/// `fltsts0`/`fltsts1` remaining filter life in days (pre-filter and wick
/// filter), `temp` ambient temperature, `rh` relative humidity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawStatus {
    pub pwr: Option<u8>,
    pub mode: Option<String>,
    pub om: Option<FanSetting>,
    pub iaql: Option<f64>,
    pub fltsts0: Option<u32>,
    pub fltsts1: Option<u32>,
    pub temp: Option<f64>,
    pub rh: Option<f64>,
}

impl RawStatus {
    /// Decode a raw status from the script's JSON payload.
    ///
    /// Total: unknown fields are ignored, malformed values become absent.
    pub fn from_value(value: &Value) -> Self {
        Self {
            pwr: field_u64(value, "pwr").and_then(|v| u8::try_from(v).ok()),
            mode: value
                .get("mode")
                .and_then(Value::as_str)
                .map(str::to_owned),
            om: value.get("om").and_then(fan_setting),
            iaql: field_f64(value, "iaql").filter(|v| *v >= 0.0),
            fltsts0: field_u64(value, "fltsts0").and_then(|v| u32::try_from(v).ok()),
            fltsts1: field_u64(value, "fltsts1").and_then(|v| u32::try_from(v).ok()),
            temp: field_f64(value, "temp"),
            rh: field_f64(value, "rh"),
        }
    }
}

/// Extract an unsigned integer that may be encoded as a number or a
/// numeric string.
fn field_u64(value: &Value, key: &str) -> Option<u64> {
    let field = value.get(key)?;
    field
        .as_u64()
        .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Extract a float that may be encoded as a number or a numeric string.
fn field_f64(value: &Value, key: &str) -> Option<f64> {
    let field = value.get(key)?;
    field
        .as_f64()
        .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Decode the `om` field: a numeric level when it parses as one, a named
/// setting otherwise.
fn fan_setting(field: &Value) -> Option<FanSetting> {
    if let Some(level) = field.as_u64() {
        return u8::try_from(level).ok().map(FanSetting::Level);
    }
    let text = field.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<u8>() {
        Ok(level) => Some(FanSetting::Level(level)),
        Err(_) => Some(FanSetting::Named(text.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_numeric_fields() {
        let raw = RawStatus::from_value(&json!({
            "pwr": 1,
            "mode": "A",
            "om": 2,
            "iaql": 3,
            "fltsts0": 180,
            "fltsts1": 330,
            "temp": 21.5,
            "rh": 45
        }));

        assert_eq!(raw.pwr, Some(1));
        assert_eq!(raw.mode.as_deref(), Some("A"));
        assert_eq!(raw.om, Some(FanSetting::Level(2)));
        assert_eq!(raw.iaql, Some(3.0));
        assert_eq!(raw.fltsts0, Some(180));
        assert_eq!(raw.fltsts1, Some(330));
        assert_eq!(raw.temp, Some(21.5));
        assert_eq!(raw.rh, Some(45.0));
    }

    #[test]
    fn decodes_string_encoded_numbers() {
        let raw = RawStatus::from_value(&json!({
            "pwr": "1",
            "om": "3",
            "temp": "19.5",
            "fltsts0": "90"
        }));

        assert_eq!(raw.pwr, Some(1));
        assert_eq!(raw.om, Some(FanSetting::Level(3)));
        assert_eq!(raw.temp, Some(19.5));
        assert_eq!(raw.fltsts0, Some(90));
    }

    #[test]
    fn named_fan_settings_are_preserved() {
        let silent = RawStatus::from_value(&json!({ "om": "s" }));
        let turbo = RawStatus::from_value(&json!({ "om": "t" }));

        assert_eq!(silent.om, Some(FanSetting::Named("s".into())));
        assert_eq!(turbo.om, Some(FanSetting::Named("t".into())));
    }

    #[test]
    fn malformed_fields_degrade_to_absent() {
        let raw = RawStatus::from_value(&json!({
            "pwr": [1, 2],
            "iaql": "not-a-number",
            "fltsts0": -5,
            "temp": {},
            "rh": null
        }));

        assert_eq!(raw, RawStatus::default());
    }

    #[test]
    fn negative_air_quality_is_rejected() {
        let raw = RawStatus::from_value(&json!({ "iaql": -1.0 }));
        assert_eq!(raw.iaql, None);
    }

    #[test]
    fn empty_payload_is_fully_absent() {
        assert_eq!(RawStatus::from_value(&json!({})), RawStatus::default());
    }
}
