//! # mapsync
//!
//! A synchronization layer that reconciles a declarative map view
//! description (center, zoom, plugins, event bindings, overlay children)
//! with one long-lived, asynchronously loaded map engine instance.
//!
//! The engine itself is external and reached only through the traits in
//! [`engine`]. A [`MapHost`] queues every configuration change until the
//! engine loader resolves, creates the engine instance exactly once, and
//! from then on turns each update into the minimal set of imperative calls.

pub mod core;
pub mod engine;
pub mod input;
pub mod plugins;
pub mod prelude;
pub mod runtime;
pub mod ui;

// Re-export public API
pub use crate::core::{
    builder::MapHostBuilder,
    config::{MapConfig, PluginRequest},
    geo::LngLat,
    host::{Lifecycle, MapHost},
    view::{ViewAction, ViewChange, ViewState},
};

pub use engine::{
    AnchorElement, CreateOptions, EngineControl, EngineHandle, EngineMap, EngineProvider,
    ListenerId, PluginLoad,
};

pub use input::{
    binder::EventBinder,
    events::{EngineEvent, EventBindingSet, EventHandler},
};

pub use plugins::{
    kind::PluginKind,
    options::{ControlPosition, PluginOptions},
    registry::{PluginRegistry, PluginState},
};

pub use runtime::{EngineLoader, LoaderTrigger};

pub use ui::overlay::{Element, OverlayContext, OverlayKind};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("invalid map plugin: {0}")]
    InvalidPluginName(String),

    #[error("invalid options for plugin {kind}: {reason}")]
    InvalidPluginOptions { kind: PluginKind, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Side channel used to report non-fatal conditions such as an unknown
/// plugin name. Reporting never interrupts the operation that hit it.
pub type ErrorReporter = std::sync::Arc<dyn Fn(&MapError) + Send + Sync>;

/// Reporter used when none is configured: logs at error level.
pub fn log_reporter() -> ErrorReporter {
    std::sync::Arc::new(|err: &MapError| log::error!("{}", err))
}

/// Initialise `env_logger` for binaries and demos. Safe to call twice.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::builder().format_timestamp_millis().try_init();
}
