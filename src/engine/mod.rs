//! Capabilities the external map engine exposes to the host.
//!
//! Nothing in this crate reaches for a process-wide engine namespace. The
//! host is handed an [`EngineProvider`] at construction and every imperative
//! call goes through the traits below, which is also how tests substitute
//! the [`headless`] engine.

pub mod headless;

use crate::{
    plugins::{kind::PluginKind, options::PluginOptions},
    input::events::EventHandler,
    Result,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Shared pointer to the created map instance.
///
/// The host owns the only strong reference that outlives a render pass;
/// overlay children and the `created` handback receive clones.
pub type EngineHandle<M> = Arc<Mutex<M>>;

/// Completion of the engine's own per-kind plugin module loader.
pub type PluginLoad = BoxFuture<'static, ()>;

/// Identifies a persistent listener bound with [`EngineMap::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// The hosting surface the engine instance attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorElement {
    pub id: String,
}

impl AnchorElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for AnchorElement {
    fn default() -> Self {
        Self::new("map-container")
    }
}

/// Options handed to [`EngineProvider::create_map`].
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOptions<P> {
    /// Caller-supplied object forwarded untouched.
    PassThrough(serde_json::Value),
    /// Built from the configuration's `center` and `zoom`.
    Derived { zoom: Option<f64>, center: Option<P> },
}

/// Entry point into a loaded engine namespace.
pub trait EngineProvider {
    type Map: EngineMap;

    /// Construct the map instance on the anchor element
    fn create_map(
        &mut self,
        anchor: &AnchorElement,
        options: CreateOptions<<Self::Map as EngineMap>::Point>,
    ) -> Result<Self::Map>;

    /// Convert a caller coordinate into the engine's native point
    fn lng_lat(&self, center: &crate::core::geo::LngLat) -> <Self::Map as EngineMap>::Point;
}

/// A created map instance.
pub trait EngineMap: Send + 'static {
    type Point: Clone + std::fmt::Debug + Send;
    type Control: EngineControl;

    /// Zoom level the engine currently reports
    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, zoom: f64);
    fn set_center(&mut self, center: Self::Point);
    fn set_zoom_and_center(&mut self, zoom: f64, center: Self::Point);

    /// Request the asynchronous module load for a plugin kind
    fn load_plugin(&mut self, kind: PluginKind) -> PluginLoad;

    /// Construct a control once its module is loaded
    fn create_control(&mut self, options: &PluginOptions) -> Result<Self::Control>;
    fn add_control(&mut self, control: &Self::Control);
    fn remove_control(&mut self, control: &Self::Control);

    /// Bind a persistent engine-level listener
    fn on(&mut self, event: &str, handler: EventHandler) -> ListenerId;
    fn off(&mut self, listener: ListenerId);

    /// Release every engine-side resource held by this instance
    fn destroy(&mut self);
}

/// A plugin control attached to the engine's control surface.
pub trait EngineControl: Send + 'static {
    fn kind(&self) -> PluginKind;
    fn show(&self);
    fn hide(&self);
}
