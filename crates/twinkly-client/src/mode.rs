use crate::error::TwinklyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceMode {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "demo")]
    Demo,
    #[serde(rename = "rt")]
    RealTime,
}

impl DeviceMode {
    pub const ALL: [DeviceMode; 4] = [
        DeviceMode::Off,
        DeviceMode::Movie,
        DeviceMode::Demo,
        DeviceMode::RealTime,
    ];

    /// Value sent in the `mode` field of `led/mode`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceMode::Off => "off",
            DeviceMode::Movie => "movie",
            DeviceMode::Demo => "demo",
            DeviceMode::RealTime => "rt",
        }
    }

    /// Name shown to people, which differs from the wire value for realtime.
    pub fn display_name(&self) -> &'static str {
        match self {
            DeviceMode::RealTime => "realtime",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceMode {
    type Err = TwinklyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(DeviceMode::Off),
            "movie" => Ok(DeviceMode::Movie),
            "demo" => Ok(DeviceMode::Demo),
            "realtime" | "rt" => Ok(DeviceMode::RealTime),
            _ => Err(TwinklyError::UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn realtime_serializes_as_rt() {
        let body = serde_json::json!({ "mode": DeviceMode::RealTime });
        assert_eq!(body.to_string(), r#"{"mode":"rt"}"#);
        assert_eq!(DeviceMode::RealTime.to_string(), "rt");
        assert_eq!(DeviceMode::RealTime.display_name(), "realtime");
    }

    #[test]
    fn parses_cli_names_case_insensitively() {
        assert_eq!("OFF".parse::<DeviceMode>().unwrap(), DeviceMode::Off);
        assert_eq!("Movie".parse::<DeviceMode>().unwrap(), DeviceMode::Movie);
        assert_eq!("demo".parse::<DeviceMode>().unwrap(), DeviceMode::Demo);
        assert_eq!(
            "RealTime".parse::<DeviceMode>().unwrap(),
            DeviceMode::RealTime
        );
        assert_eq!("rt".parse::<DeviceMode>().unwrap(), DeviceMode::RealTime);
    }

    #[test]
    fn rejects_unknown_modes() {
        let err = "color".parse::<DeviceMode>().unwrap_err();
        assert!(matches!(err, TwinklyError::UnknownMode(ref m) if m == "color"));
    }

    #[test]
    fn wire_values_round_trip_through_serde() {
        for mode in DeviceMode::ALL {
            let encoded = serde_json::to_string(&mode).unwrap();
            assert_eq!(encoded, format!("\"{}\"", mode.as_str()));
            let decoded: DeviceMode = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, mode);
        }
    }
}
