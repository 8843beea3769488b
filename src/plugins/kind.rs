use crate::MapError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The closed set of engine plugins a host can manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PluginKind {
    Scale,
    ToolBar,
    MapType,
    OverView,
}

impl PluginKind {
    /// Canonical order, used when deciding which kinds to hide
    pub const ALL: [PluginKind; 4] = [
        PluginKind::Scale,
        PluginKind::ToolBar,
        PluginKind::MapType,
        PluginKind::OverView,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Scale => "Scale",
            Self::ToolBar => "ToolBar",
            Self::MapType => "MapType",
            Self::OverView => "OverView",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PluginKind {
    type Err = MapError;

    /// Names are matched exactly, as the engine spells them
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| MapError::InvalidPluginName(name.to_string()))
    }
}
