use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of thing an asset is.
///
/// The asset type decides which backend adapters are eligible to serve an
/// asset and which format is used when a caller stores without naming one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetType {
    /// A serialized project (JSON or a packaged archive).
    Project,
    /// A raster costume or backdrop.
    ImageBitmap,
    /// A vector costume or backdrop.
    ImageVector,
    /// An audio clip.
    Sound,
}

impl AssetType {
    /// Every asset type, in declaration order.
    pub const ALL: [AssetType; 4] = [
        Self::Project,
        Self::ImageBitmap,
        Self::ImageVector,
        Self::Sound,
    ];

    /// The format an asset of this type is stored in when none is given.
    pub fn runtime_format(&self) -> DataFormat {
        match self {
            Self::Project => DataFormat::Json,
            Self::ImageBitmap => DataFormat::Png,
            Self::ImageVector => DataFormat::Svg,
            Self::Sound => DataFormat::Wav,
        }
    }

    /// Kebab-case name, as used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::ImageBitmap => "image-bitmap",
            Self::ImageVector => "image-vector",
            Self::Sound => "sound",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = TypeError;

    /// Accepts the kebab-case names and the legacy camel-case names
    /// (`ImageBitmap`) found in older default-asset manifests.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" | "Project" => Ok(Self::Project),
            "image-bitmap" | "ImageBitmap" => Ok(Self::ImageBitmap),
            "image-vector" | "ImageVector" => Ok(Self::ImageVector),
            "sound" | "Sound" => Ok(Self::Sound),
            other => Err(TypeError::UnknownAssetType(other.to_string())),
        }
    }
}

/// File format of an asset payload. Rendered as the lowercase extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Png,
    Jpg,
    Svg,
    Json,
    Wav,
    Mp3,
    Sb,
    Sb2,
    Sb3,
}

impl DataFormat {
    /// The file extension, without a leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
            Self::Json => "json",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Sb => "sb",
            Self::Sb2 => "sb2",
            Self::Sb3 => "sb3",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DataFormat {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "svg" => Ok(Self::Svg),
            "json" => Ok(Self::Json),
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            "sb" => Ok(Self::Sb),
            "sb2" => Ok(Self::Sb2),
            "sb3" => Ok(Self::Sb3),
            _ => Err(TypeError::UnknownDataFormat(s.to_string())),
        }
    }
}
