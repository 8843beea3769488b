//! Typed creation options per plugin kind.
//!
//! Caller payloads arrive as loose JSON objects. They are decoded into the
//! struct for their kind, with every absent field taking the documented
//! default, and any field the kind does not know is rejected.

use crate::{plugins::kind::PluginKind, MapError, Result};
use serde::{Deserialize, Serialize};

/// Corner of the map a control docks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlPosition {
    #[serde(rename = "LT")]
    LeftTop,
    #[serde(rename = "RT")]
    RightTop,
    #[serde(rename = "LB")]
    LeftBottom,
    #[default]
    #[serde(rename = "RB")]
    RightBottom,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ScaleOptions {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ToolBarOptions {
    pub position: ControlPosition,
    pub no_ip_locate: bool,
    pub locate: bool,
    pub lite_style: bool,
    pub auto_position: bool,
}

impl Default for ToolBarOptions {
    fn default() -> Self {
        Self {
            position: ControlPosition::RightBottom,
            no_ip_locate: true,
            locate: true,
            lite_style: true,
            auto_position: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct MapTypeOptions {
    pub show_road: bool,
    pub show_traffic: bool,
    /// 0 is the standard layer, 1 the satellite layer
    pub default_type: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct OverViewOptions {
    /// Left to the engine when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
}

/// Resolved creation options for one control
#[derive(Debug, Clone, PartialEq)]
pub enum PluginOptions {
    Scale(ScaleOptions),
    ToolBar(ToolBarOptions),
    MapType(MapTypeOptions),
    OverView(OverViewOptions),
}

impl PluginOptions {
    /// Defaults for a kind with no caller overrides
    pub fn defaults(kind: PluginKind) -> Self {
        match kind {
            PluginKind::Scale => Self::Scale(ScaleOptions::default()),
            PluginKind::ToolBar => Self::ToolBar(ToolBarOptions::default()),
            PluginKind::MapType => Self::MapType(MapTypeOptions::default()),
            PluginKind::OverView => Self::OverView(OverViewOptions::default()),
        }
    }

    /// Merge caller fields over the kind's defaults
    pub fn resolve(
        kind: PluginKind,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self> {
        if fields.is_empty() {
            return Ok(Self::defaults(kind));
        }

        let value = serde_json::Value::Object(fields.clone());
        let invalid = |err: serde_json::Error| MapError::InvalidPluginOptions {
            kind,
            reason: err.to_string(),
        };

        Ok(match kind {
            PluginKind::Scale => Self::Scale(serde_json::from_value(value).map_err(invalid)?),
            PluginKind::ToolBar => Self::ToolBar(serde_json::from_value(value).map_err(invalid)?),
            PluginKind::MapType => Self::MapType(serde_json::from_value(value).map_err(invalid)?),
            PluginKind::OverView => {
                Self::OverView(serde_json::from_value(value).map_err(invalid)?)
            }
        })
    }

    pub fn kind(&self) -> PluginKind {
        match self {
            Self::Scale(_) => PluginKind::Scale,
            Self::ToolBar(_) => PluginKind::ToolBar,
            Self::MapType(_) => PluginKind::MapType,
            Self::OverView(_) => PluginKind::OverView,
        }
    }

    /// Options as the engine's JSON payload
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::Scale(opts) => serde_json::to_value(opts)?,
            Self::ToolBar(opts) => serde_json::to_value(opts)?,
            Self::MapType(opts) => serde_json::to_value(opts)?,
            Self::OverView(opts) => serde_json::to_value(opts)?,
        };
        Ok(value)
    }
}
