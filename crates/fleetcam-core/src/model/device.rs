// ── Device addressing: cameras, profiles, stream keys ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

/// Which camera on the unit. Carried on the wire as an integer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Camera {
    Road,
    #[strum(to_string = "driver", serialize = "cab")]
    Driver,
}

impl Camera {
    pub fn index(self) -> u8 {
        match self {
            Self::Road => 0,
            Self::Driver => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Road => "Road Camera",
            Self::Driver => "Driver Camera",
        }
    }

    /// Short name used in tables and download filenames.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Road => "Road",
            Self::Driver => "Cab",
        }
    }
}

impl From<Camera> for u8 {
    fn from(camera: Camera) -> Self {
        camera.index()
    }
}

impl TryFrom<u8> for Camera {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Road),
            1 => Ok(Self::Driver),
            other => Err(format!("unknown camera index {other}")),
        }
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Recording quality profile. Carried on the wire as an integer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Profile {
    High,
    Low,
}

impl Profile {
    pub fn index(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Low => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High Resolution",
            Self::Low => "Low Resolution",
        }
    }
}

impl From<Profile> for u8 {
    fn from(profile: Profile) -> Self {
        profile.index()
    }
}

impl TryFrom<u8> for Profile {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::High),
            1 => Ok(Self::Low),
            other => Err(format!("unknown profile index {other}")),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one live feed: `(serial, camera, profile)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamKey {
    pub serial: String,
    pub camera: Camera,
    pub profile: Profile,
}

impl StreamKey {
    pub fn new(serial: impl Into<String>, camera: Camera, profile: Profile) -> Self {
        Self {
            serial: serial.into(),
            camera,
            profile,
        }
    }

    pub(crate) fn selector(&self) -> fleetcam_api::types::StreamSelector {
        fleetcam_api::types::StreamSelector {
            camera: self.camera.index(),
            profile: self.profile.index(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let camera: &'static str = self.camera.into();
        let profile: &'static str = self.profile.into();
        write!(f, "{}/{camera}/{profile}", self.serial)
    }
}
