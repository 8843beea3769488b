pub mod kind;
pub mod options;
pub mod registry;

// Re-export the essential types
pub use kind::PluginKind;
pub use options::{
    ControlPosition, MapTypeOptions, OverViewOptions, PluginOptions, ScaleOptions, ToolBarOptions,
};
pub use registry::{PluginRegistry, PluginState};
