//! Declarative map configuration
//!
//! A [`MapConfig`] is the full description a caller hands the host on every
//! render pass. Snapshots are cheap to clone: the center sits behind an
//! `Arc` whose identity marks a change, and callbacks are shared one-shots.

use crate::{
    core::{callback::OneShot, geo::LngLat, view::ViewState},
    engine::EngineMap,
    input::events::EventBindingSet,
    plugins::options::PluginOptions,
    Result,
};
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value};
use std::{fmt, sync::Arc};

/// Option key read as the plugin's visibility instead of a creation option
const VISIBLE_KEY: &str = "visible";

/// One entry of the requested plugin list
pub struct PluginRequest<C> {
    /// Plugin name as requested; resolved against the canonical set on sync
    pub name: String,
    /// Kind-specific creation fields
    pub options: JsonMap<String, Value>,
    pub visible: bool,
    pub on_created: Option<OneShot<C>>,
}

impl<C> PluginRequest<C> {
    /// Request with default options, visible
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: JsonMap::new(),
            visible: true,
            on_created: None,
        }
    }

    /// Request carrying fully typed options
    pub fn from_options(options: &PluginOptions) -> Result<Self> {
        let mut request = Self::new(options.kind().name());
        if let Value::Object(fields) = options.to_json()? {
            request.options = fields;
        }
        Ok(request)
    }

    /// Parse either a bare name or a `{name, options}` descriptor
    pub fn from_json(value: &Value) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawRequest {
            Name(String),
            Descriptor {
                name: String,
                #[serde(default)]
                options: Option<JsonMap<String, Value>>,
            },
        }

        let request = match RawRequest::deserialize(value)? {
            RawRequest::Name(name) => Self::new(name),
            RawRequest::Descriptor { name, options } => options
                .unwrap_or_default()
                .into_iter()
                .fold(Self::new(name), |request, (key, value)| {
                    request.option(key, value)
                }),
        };
        Ok(request)
    }

    /// Set one creation field.
    ///
    /// `visible` is reserved: a boolean sets the visibility, any other value
    /// leaves the plugin visible. It is never forwarded to the engine.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        if key == VISIBLE_KEY {
            self.visible = value.as_bool().unwrap_or(true);
        } else {
            self.options.insert(key, value);
        }
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Callback handed the control right after its first creation
    pub fn on_created<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&C) + Send + 'static,
    {
        self.on_created = Some(OneShot::new(callback));
        self
    }
}

impl<C> From<&str> for PluginRequest<C> {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl<C> From<String> for PluginRequest<C> {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl<C> Clone for PluginRequest<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            options: self.options.clone(),
            visible: self.visible,
            on_created: self.on_created.clone(),
        }
    }
}

impl<C> fmt::Debug for PluginRequest<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRequest")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("visible", &self.visible)
            .field("on_created", &self.on_created.is_some())
            .finish()
    }
}

/// Declarative description of the map view
pub struct MapConfig<M: EngineMap> {
    pub center: Option<Arc<LngLat>>,
    pub zoom: Option<f64>,
    /// Opaque creation object; when present, `center` and `zoom` do not
    /// shape creation
    pub create_options: Option<Value>,
    pub plugins: Vec<PluginRequest<M::Control>>,
    pub events: EventBindingSet<M>,
}

impl<M: EngineMap> MapConfig<M> {
    pub fn new() -> Self {
        Self {
            center: None,
            zoom: None,
            create_options: None,
            plugins: Vec::new(),
            events: EventBindingSet::new(),
        }
    }

    /// Parse the callback-free part of a configuration
    pub fn from_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct DeclarativeConfig {
            center: Option<LngLat>,
            zoom: Option<f64>,
            create_options: Option<Value>,
            #[serde(default)]
            plugins: Option<Vec<Value>>,
        }

        let raw: DeclarativeConfig = serde_json::from_str(json)?;
        let plugins = raw
            .plugins
            .unwrap_or_default()
            .iter()
            .map(PluginRequest::from_json)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            center: raw.center.map(Arc::new),
            zoom: raw.zoom,
            create_options: raw.create_options,
            plugins,
            events: EventBindingSet::new(),
        })
    }

    /// Set a new center. Each call is a distinct center, even for equal
    /// coordinates.
    pub fn center(mut self, center: impl Into<LngLat>) -> Self {
        self.center = Some(Arc::new(center.into()));
        self
    }

    /// Reuse a center from an earlier snapshot, signalling "unchanged"
    pub fn shared_center(mut self, center: Arc<LngLat>) -> Self {
        self.center = Some(center);
        self
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn create_options(mut self, options: Value) -> Self {
        self.create_options = Some(options);
        self
    }

    pub fn plugin(mut self, request: impl Into<PluginRequest<M::Control>>) -> Self {
        self.plugins.push(request.into());
        self
    }

    pub fn plugins<I, R>(mut self, requests: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<PluginRequest<M::Control>>,
    {
        self.plugins = requests.into_iter().map(Into::into).collect();
        self
    }

    pub fn events(mut self, events: EventBindingSet<M>) -> Self {
        self.events = events;
        self
    }

    /// Center and zoom of this snapshot
    pub fn view(&self) -> ViewState {
        ViewState {
            center: self.center.clone(),
            zoom: self.zoom,
        }
    }
}

impl<M: EngineMap> Default for MapConfig<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: EngineMap> Clone for MapConfig<M> {
    fn clone(&self) -> Self {
        Self {
            center: self.center.clone(),
            zoom: self.zoom,
            create_options: self.create_options.clone(),
            plugins: self.plugins.clone(),
            events: self.events.clone(),
        }
    }
}

impl<M: EngineMap> fmt::Debug for MapConfig<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfig")
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("create_options", &self.create_options)
            .field("plugins", &self.plugins)
            .field("events", &self.events)
            .finish()
    }
}
