use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Layer type discriminator shared by documents, defaults and the `layers` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "wms")]
    Wms,
    #[serde(rename = "wfs")]
    Wfs,
    #[serde(rename = "xyz")]
    Xyz,
    #[serde(rename = "switchlayer")]
    SwitchLayer,
    #[serde(rename = "arcgisrest")]
    ArcGisRest,
}

impl LayerType {
    pub const ALL: [LayerType; 5] = [
        LayerType::Wms,
        LayerType::Wfs,
        LayerType::Xyz,
        LayerType::SwitchLayer,
        LayerType::ArcGisRest,
    ];

    /// Types whose defaults must exist before a portal's layers are imported or exported
    pub const REQUIRED_DEFAULTS: [LayerType; 4] = [
        LayerType::Wms,
        LayerType::Wfs,
        LayerType::Xyz,
        LayerType::ArcGisRest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wms => "wms",
            Self::Wfs => "wfs",
            Self::Xyz => "xyz",
            Self::SwitchLayer => "switchlayer",
            Self::ArcGisRest => "arcgisrest",
        }
    }

    /// wms, wfs and arcgisrest carry server options and styles
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Wms | Self::Wfs | Self::ArcGisRest)
    }

    /// Only service layers may sit inside a switchlayer
    pub fn can_be_switch_child(&self) -> bool {
        self.is_service()
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "wms" => Ok(Self::Wms),
            "wfs" => Ok(Self::Wfs),
            "xyz" => Ok(Self::Xyz),
            "switchlayer" => Ok(Self::SwitchLayer),
            "arcgisrest" => Ok(Self::ArcGisRest),
            other => Err(format!("unknown layer type '{}'", other)),
        }
    }
}
