//! Prelude module for common mapsync types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapsync::prelude::*;`

pub use crate::core::{
    builder::MapHostBuilder,
    callback::OneShot,
    config::{MapConfig, PluginRequest},
    geo::LngLat,
    host::{Lifecycle, MapHost},
    view::{ViewAction, ViewChange, ViewState},
};

pub use crate::engine::{
    AnchorElement, CreateOptions, EngineControl, EngineHandle, EngineMap, EngineProvider,
    ListenerId, PluginLoad,
};

pub use crate::input::{
    binder::EventBinder,
    events::{EngineEvent, EventBindingSet, EventHandler},
};

pub use crate::plugins::{
    kind::PluginKind,
    options::{
        ControlPosition, MapTypeOptions, OverViewOptions, PluginOptions, ScaleOptions,
        ToolBarOptions,
    },
    registry::{PluginRegistry, PluginState},
};

pub use crate::runtime::{EngineLoader, LoaderTrigger, OperationQueue};

pub use crate::ui::overlay::{Element, OverlayContext, OverlayKind};

pub use crate::{Error as MapError, ErrorReporter, Result};

pub use std::sync::Arc;

pub use fxhash::FxHashMap as HashMap;
