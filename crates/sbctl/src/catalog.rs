//! Named categories, lookup tables and value parsing for soundbar commands.
//!
//! Nothing here talks to the device. Every helper resolves human-friendly
//! input into the field names and indices the protocol expects.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

pub const EQ_VIEW_INFO: &str = "EQ_VIEW_INFO";
pub const PLAY_INFO: &str = "PLAY_INFO";
pub const FUNC_VIEW_INFO: &str = "FUNC_VIEW_INFO";
pub const SETTING_VIEW_INFO: &str = "SETTING_VIEW_INFO";
pub const PRODUCT_INFO: &str = "PRODUCT_INFO";
pub const C4A_SETTING_INFO: &str = "C4A_SETTING_INFO";
pub const RADIO_VIEW_INFO: &str = "RADIO_VIEW_INFO";
pub const SHARE_AP_INFO: &str = "SHARE_AP_INFO";
pub const UPDATE_VIEW_INFO: &str = "UPDATE_VIEW_INFO";
pub const BUILD_INFO_DEV: &str = "BUILD_INFO_DEV";
pub const OPTION_INFO_DEV: &str = "OPTION_INFO_DEV";
pub const MAC_INFO_DEV: &str = "MAC_INFO_DEV";
pub const MEM_MON_DEV: &str = "MEM_MON_DEV";
pub const TEST_DEV: &str = "TEST_DEV";
pub const SPK_LIST_VIEW_INFO: &str = "SPK_LIST_VIEW_INFO";
pub const TEST_TONE_REQ: &str = "TEST_TONE_REQ";
pub const FACTORY_SET_REQ: &str = "FACTORY_SET_REQ";

/// Categories that can be read with a plain get.
pub const READABLE: &[&str] = &[
    EQ_VIEW_INFO,
    PLAY_INFO,
    FUNC_VIEW_INFO,
    SETTING_VIEW_INFO,
    PRODUCT_INFO,
    C4A_SETTING_INFO,
    RADIO_VIEW_INFO,
    SHARE_AP_INFO,
    UPDATE_VIEW_INFO,
    BUILD_INFO_DEV,
    OPTION_INFO_DEV,
    MAC_INFO_DEV,
    MEM_MON_DEV,
    TEST_DEV,
    SPK_LIST_VIEW_INFO,
];

/// Input sources, indexed by `i_curr_func`.
///
/// Not every model supports every input. Reading reports E-ARC as 20, but
/// selecting E-ARC is done with index 4 (Optical).
pub const INPUTS: &[&str] = &[
    "Wifi",
    "Bluetooth",
    "Portable",
    "Aux",
    "Optical",
    "CP",
    "HDMI",
    "ARC",
    "Spotify",
    "Optical2",
    "HDMI2",
    "HDMI3",
    "LG TV",
    "Mic",
    "Chromecast",
    "Optical/HDMI ARC",
    "LG Optical",
    "FM",
    "USB",
    "USB2",
    "E-ARC",
];

/// Sound modes, indexed by `i_curr_eq`.
pub const EQUALIZERS: &[&str] = &[
    "Standard",
    "Bass",
    "Flat",
    "Boost",
    "Treble and Bass",
    "User",
    "Music",
    "Cinema",
    "Night",
    "News",
    "Voice",
    "ia_sound",
    "Adaptive Sound Control",
    "Movie",
    "Bass Blast",
    "Dolby Atmos",
    "DTS Virtual X",
    "Bass Boost Plus",
    "DTS X",
];

/// Name reported for an index outside its lookup table.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown input: {0}")]
    UnknownInput(String),

    #[error("unknown equalizer: {0}")]
    UnknownEqualizer(String),

    #[error("invalid volume: {0:?} (expected N, +N or -N)")]
    InvalidVolume(String),

    #[error("invalid value {value:?} for {setting}")]
    InvalidSettingValue { setting: Setting, value: String },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

fn lookup(table: &[&str], name: &str) -> Option<usize> {
    let name = name.trim();
    table
        .iter()
        .position(|entry| entry.eq_ignore_ascii_case(name))
}

/// Index for an input name, case-insensitive.
pub fn input_index(name: &str) -> Result<usize> {
    lookup(INPUTS, name).ok_or_else(|| CatalogError::UnknownInput(name.to_string()))
}

/// Input name for `i_curr_func`, or [`UNKNOWN`].
pub fn input_name(index: u64) -> &'static str {
    usize::try_from(index)
        .ok()
        .and_then(|index| INPUTS.get(index))
        .copied()
        .unwrap_or(UNKNOWN)
}

/// Index for an equalizer name, case-insensitive.
pub fn equalizer_index(name: &str) -> Result<usize> {
    lookup(EQUALIZERS, name).ok_or_else(|| CatalogError::UnknownEqualizer(name.to_string()))
}

pub fn equalizer_name(index: u64) -> Option<&'static str> {
    usize::try_from(index)
        .ok()
        .and_then(|index| EQUALIZERS.get(index))
        .copied()
}

/// A requested volume: absolute (`"7"`) or relative to the current level
/// (`"+2"`, `"-3"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    Absolute(u32),
    Relative(i32),
}

impl VolumeChange {
    pub fn is_relative(self) -> bool {
        matches!(self, Self::Relative(_))
    }

    /// Target level given the current one. Never below zero.
    pub fn apply(self, current: u32) -> u32 {
        match self {
            Self::Absolute(level) => level,
            Self::Relative(delta) => {
                let target = i64::from(current) + i64::from(delta);
                u32::try_from(target.max(0)).unwrap_or(u32::MAX)
            }
        }
    }
}

impl FromStr for VolumeChange {
    type Err = CatalogError;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || CatalogError::InvalidVolume(input.to_string());

        if let Some(rest) = trimmed.strip_prefix('+') {
            let step: i32 = rest.parse().map_err(|_| invalid())?;
            if step < 0 {
                return Err(invalid());
            }
            return Ok(Self::Relative(step));
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            let step: i32 = rest.parse().map_err(|_| invalid())?;
            if step < 0 {
                return Err(invalid());
            }
            return Ok(Self::Relative(-step));
        }
        trimmed.parse().map(Self::Absolute).map_err(|_| invalid())
    }
}

impl fmt::Display for VolumeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(level) => write!(f, "{level}"),
            Self::Relative(delta) => write!(f, "{delta:+}"),
        }
    }
}

/// Writable fields of `SETTING_VIEW_INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Setting {
    NightMode,
    AutoVolume,
    Drc,
    NeuralX,
    AvSync,
    Woofer,
    RearControl,
    RearLevel,
    TopLevel,
    CenterLevel,
    TvRemote,
    AutoPower,
    AutoDisplay,
    BtStandby,
    BtRestrict,
    SleepTime,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKind {
    Toggle,
    Level,
    Text,
}

impl Setting {
    /// Field name inside the `data` object.
    pub fn field(self) -> &'static str {
        match self {
            Self::NightMode => "b_night_time",
            Self::AutoVolume => "b_auto_vol",
            Self::Drc => "b_drc",
            Self::NeuralX => "b_neuralx",
            Self::AvSync => "i_av_sync",
            Self::Woofer => "i_woofer_level",
            Self::RearControl => "b_rear",
            Self::RearLevel => "i_rear_level",
            Self::TopLevel => "i_top_level",
            Self::CenterLevel => "i_center_level",
            Self::TvRemote => "b_tv_remote",
            Self::AutoPower => "b_auto_power",
            Self::AutoDisplay => "b_auto_display",
            Self::BtStandby => "b_bt_standby",
            Self::BtRestrict => "b_conn_bt_limit",
            Self::SleepTime => "i_sleep_time",
            Self::Name => "s_user_name",
        }
    }

    fn kind(self) -> SettingKind {
        match self.field().as_bytes().first() {
            Some(b'b') => SettingKind::Toggle,
            Some(b'i') => SettingKind::Level,
            _ => SettingKind::Text,
        }
    }

    /// Parse a command-line value into the JSON type the field expects.
    pub fn parse_value(self, raw: &str) -> Result<Value> {
        let invalid = || CatalogError::InvalidSettingValue {
            setting: self,
            value: raw.to_string(),
        };
        match self.kind() {
            SettingKind::Toggle => parse_switch(raw).map(Value::Bool).ok_or_else(invalid),
            SettingKind::Level => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid()),
            SettingKind::Text => Ok(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Parse `on`/`off` style switches.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes() {
        assert_eq!(INPUTS.len(), 21);
        assert_eq!(EQUALIZERS.len(), 19);
        assert_eq!(READABLE.len(), 15);
    }

    #[test]
    fn lookups_ignore_case() {
        assert_eq!(input_index("hdmi").unwrap(), 6);
        assert_eq!(input_index("e-arc").unwrap(), 20);
        assert_eq!(input_index(" LG tv ").unwrap(), 12);
        assert_eq!(equalizer_index("dts x").unwrap(), 18);
        assert_eq!(equalizer_index("Cinema").unwrap(), 7);
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            input_index("Cassette"),
            Err(CatalogError::UnknownInput("Cassette".into()))
        );
        assert!(matches!(
            equalizer_index("Loud"),
            Err(CatalogError::UnknownEqualizer(_))
        ));
    }

    #[test]
    fn input_names_out_of_range_are_unknown() {
        assert_eq!(input_name(1), "Bluetooth");
        assert_eq!(input_name(21), UNKNOWN);
        assert_eq!(equalizer_name(99), None);
    }

    #[test]
    fn volume_parsing() {
        assert_eq!("7".parse(), Ok(VolumeChange::Absolute(7)));
        assert_eq!("+2".parse(), Ok(VolumeChange::Relative(2)));
        assert_eq!("-3".parse(), Ok(VolumeChange::Relative(-3)));
        assert_eq!(" 12 ".parse(), Ok(VolumeChange::Absolute(12)));
        assert!("loud".parse::<VolumeChange>().is_err());
        assert!("+".parse::<VolumeChange>().is_err());
        assert!("--2".parse::<VolumeChange>().is_err());
    }

    #[test]
    fn relative_volume_clamps_at_zero() {
        assert_eq!(VolumeChange::Relative(2).apply(12), 14);
        assert_eq!(VolumeChange::Relative(-5).apply(3), 0);
        assert_eq!(VolumeChange::Absolute(9).apply(30), 9);
        assert_eq!(VolumeChange::Relative(-2).to_string(), "-2");
        assert_eq!(VolumeChange::Relative(4).to_string(), "+4");
    }

    #[test]
    fn setting_values_follow_field_type() {
        assert_eq!(Setting::NightMode.parse_value("on").unwrap(), Value::Bool(true));
        assert_eq!(Setting::Woofer.parse_value("-3").unwrap(), Value::from(-3));
        assert_eq!(
            Setting::Name.parse_value("Living Room").unwrap(),
            Value::from("Living Room")
        );
        assert!(Setting::Drc.parse_value("maybe").is_err());
        assert!(Setting::SleepTime.parse_value("soon").is_err());
    }
}
