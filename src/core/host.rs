//! The map host.
//!
//! Owns the engine instance pointer and drives every other component. Each
//! public operation is queued behind the engine loader and the queue is
//! flushed, oldest first, by [`MapHost::pump`] once the loader resolves.
//! After that point operations apply as soon as they are issued.

use crate::{
    core::{
        config::MapConfig,
        view::{self, ViewState},
    },
    engine::{
        AnchorElement, CreateOptions, EngineHandle, EngineMap, EngineProvider, ListenerId,
    },
    input::binder::EventBinder,
    plugins::{
        kind::PluginKind,
        registry::{PluginRegistry, PluginState},
    },
    runtime::{EngineLoader, OperationQueue},
    ui::overlay::{inject_overlays, Element, OverlayContext},
    ErrorReporter, MapError, Result,
};
use std::sync::{Arc, Mutex, TryLockError};

type Control<P> = <<P as EngineProvider>::Map as EngineMap>::Control;

/// Where a host is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Mounted,
    Unmounted,
}

/// Work deferred until the engine has loaded
enum Operation<M: EngineMap> {
    /// Create the instance from the latest configuration, if not created yet
    Create,
    Update { prev: ViewState, next: MapConfig<M> },
}

impl<M: EngineMap> std::fmt::Debug for Operation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("Create"),
            Operation::Update { .. } => f.write_str("Update"),
        }
    }
}

/// Keeps one engine instance in step with a declarative [`MapConfig`].
///
/// `unmount()` locks the engine handle. Dropping the host only tries the
/// lock: if a cloned [`EngineHandle`] is still locked at that point, the
/// error is reported and the instance is released without `destroy()`.
pub struct MapHost<P: EngineProvider> {
    provider: P,
    loader: EngineLoader,
    anchor: AnchorElement,
    reporter: ErrorReporter,
    lifecycle: Lifecycle,
    /// Latest configuration received; creation reads it when it runs
    config: MapConfig<P::Map>,
    queue: OperationQueue<Operation<P::Map>>,
    engine: Option<EngineHandle<P::Map>>,
    view: ViewState,
    plugins: PluginRegistry<Control<P>>,
    listeners: Vec<ListenerId>,
}

impl<P: EngineProvider> MapHost<P> {
    /// Host with the default anchor; errors are logged
    pub fn new(provider: P, loader: EngineLoader) -> Self {
        Self::from_parts(
            provider,
            loader,
            AnchorElement::default(),
            crate::log_reporter(),
        )
    }

    pub(crate) fn from_parts(
        provider: P,
        loader: EngineLoader,
        anchor: AnchorElement,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            provider,
            loader,
            anchor,
            reporter,
            lifecycle: Lifecycle::Idle,
            config: MapConfig::new(),
            queue: OperationQueue::new(),
            engine: None,
            view: ViewState::default(),
            plugins: PluginRegistry::new(),
            listeners: Vec::new(),
        }
    }

    /// Schedule creation of the engine instance.
    ///
    /// Creation runs once the loader resolves and uses whatever
    /// configuration is latest at that moment. Repeated mounts never create
    /// a second instance.
    pub fn mount(&mut self, config: MapConfig<P::Map>) {
        if self.lifecycle == Lifecycle::Unmounted {
            log::warn!("mount ignored: host already unmounted");
            return;
        }
        self.lifecycle = Lifecycle::Mounted;
        self.config = config;
        self.enqueue(Operation::Create);
        self.pump();
    }

    /// Schedule an update pass from `prev` to `next`.
    ///
    /// An update that runs before the instance exists is dropped; the
    /// creation scheduled right after it picks up `next` instead.
    pub fn update_configuration(&mut self, prev: &MapConfig<P::Map>, next: MapConfig<P::Map>) {
        if self.lifecycle == Lifecycle::Unmounted {
            log::warn!("update ignored: host already unmounted");
            return;
        }
        self.lifecycle = Lifecycle::Mounted;
        self.config = next.clone();
        self.enqueue(Operation::Update {
            prev: prev.view(),
            next,
        });
        self.enqueue(Operation::Create);
        self.pump();
    }

    /// Release the engine instance and everything attached to it.
    ///
    /// Runs immediately; queued operations are discarded and in-flight
    /// plugin loads are abandoned.
    pub fn unmount(&mut self) {
        self.teardown(true);
    }

    fn teardown(&mut self, blocking: bool) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        self.lifecycle = Lifecycle::Unmounted;

        if !self.queue.is_empty() {
            log::debug!("discarding {} queued operations", self.queue.len());
            self.queue.clear();
        }

        if let Some(handle) = self.engine.take() {
            let locked = if blocking {
                handle
                    .lock()
                    .map_err(|_| MapError::LockPoisoned("engine instance"))
            } else {
                handle.try_lock().map_err(|err| match err {
                    TryLockError::Poisoned(_) => MapError::LockPoisoned("engine instance"),
                    TryLockError::WouldBlock => {
                        MapError::Engine("engine instance still locked at drop".into())
                    }
                })
            };
            match locked {
                Ok(mut map) => {
                    self.plugins.clear(&mut *map);
                    EventBinder::unbind(&mut *map, std::mem::take(&mut self.listeners));
                    map.destroy();
                    log::info!("map instance on '{}' destroyed", self.anchor.id);
                }
                Err(err) => (self.reporter)(&err),
            }
        }

        self.plugins = PluginRegistry::new();
        self.listeners.clear();
        self.view = ViewState::default();
    }

    /// Cooperative tick.
    ///
    /// Once the loader has resolved, runs every queued operation in order,
    /// then finishes plugin controls whose module load completed. Returns the
    /// number of queued operations executed.
    pub fn pump(&mut self) -> usize {
        if self.lifecycle == Lifecycle::Unmounted || !self.loader.is_ready() {
            return 0;
        }

        let operations = self.queue.drain();
        let executed = operations.len();
        for operation in operations {
            log::debug!("running queued {:?}", operation);
            if let Err(err) = self.execute(operation) {
                (self.reporter)(&err);
            }
        }

        if let Some(engine) = &self.engine {
            self.plugins.poll(engine, &self.reporter);
        }

        executed
    }

    /// Wait for the engine loader, then pump
    pub async fn ready(&mut self) -> usize {
        let loader = self.loader.clone();
        loader.wait().await;
        self.pump()
    }

    /// Wait for the engine loader, then for every in-flight plugin module
    /// load, building each control as its module arrives.
    ///
    /// Returns the number of controls created while waiting on modules.
    /// Loads requested by later operations need another `settle()` or
    /// `pump()`.
    pub async fn settle(&mut self) -> usize {
        self.ready().await;
        match self.engine.clone() {
            Some(engine) if self.lifecycle != Lifecycle::Unmounted => {
                self.plugins.settle(&engine, &self.reporter).await
            }
            _ => 0,
        }
    }

    /// Hand the instance and anchor to every overlay child.
    ///
    /// Returns false while the instance does not exist yet, in which case no
    /// child should be rendered.
    pub fn render_children(&self, children: &mut [Box<dyn Element<P::Map>>]) -> bool {
        let Some(engine) = &self.engine else {
            return false;
        };
        let context = OverlayContext {
            engine: engine.clone(),
            anchor: self.anchor.clone(),
        };
        inject_overlays(children, &context);
        true
    }

    fn enqueue(&mut self, operation: Operation<P::Map>) {
        if !self.loader.is_ready() {
            log::debug!("engine not loaded, queueing {:?}", operation);
        }
        self.queue.push(operation);
    }

    fn execute(&mut self, operation: Operation<P::Map>) -> Result<()> {
        match operation {
            Operation::Create => self.create(),
            Operation::Update { prev, next } => self.update(prev, next),
        }
    }

    fn create(&mut self) -> Result<()> {
        if self.engine.is_some() {
            return Ok(());
        }

        let config = self.config.clone();
        let options = match &config.create_options {
            Some(options) => CreateOptions::PassThrough(options.clone()),
            None => {
                if let Some(center) = config.center.as_deref().filter(|c| !c.is_valid()) {
                    log::warn!("creating map with out-of-range center {:?}", center);
                }
                CreateOptions::Derived {
                    zoom: config.zoom,
                    center: config.center.as_deref().map(|c| self.provider.lng_lat(c)),
                }
            }
        };

        let map = self.provider.create_map(&self.anchor, options)?;
        let handle = Arc::new(Mutex::new(map));
        self.engine = Some(handle.clone());
        log::info!("map instance created on '{}'", self.anchor.id);

        if config.create_options.is_none() {
            self.view = config.view();
        }

        self.listeners = EventBinder::bind(&config.events, &handle)?;
        self.plugins.sync(&config.plugins, &handle, &self.reporter);
        Ok(())
    }

    fn update(&mut self, prev: ViewState, next: MapConfig<P::Map>) -> Result<()> {
        let Some(handle) = self.engine.clone() else {
            log::debug!("update arrived before creation, dropped");
            return Ok(());
        };

        self.apply_view(&prev, &next.view(), &handle)?;
        self.plugins.sync(&next.plugins, &handle, &self.reporter);
        Ok(())
    }

    fn apply_view(
        &mut self,
        prev: &ViewState,
        next: &ViewState,
        handle: &EngineHandle<P::Map>,
    ) -> Result<()> {
        if next.same_as(&self.view) {
            return Ok(());
        }

        let mut map = handle
            .lock()
            .map_err(|_| MapError::LockPoisoned("engine instance"))?;
        let change = view::diff(prev, next, map.zoom());
        // Converted whenever requested: the combined call needs a native point
        let center = next.center.as_deref().map(|c| self.provider.lng_lat(c));
        let action = change.action(next.zoom, center);
        log::debug!("view update: {:?}", change);
        action.apply(&mut *map);
        drop(map);

        self.view = next.clone();
        Ok(())
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_created(&self) -> bool {
        self.engine.is_some()
    }

    /// The engine instance, once created
    pub fn engine(&self) -> Option<&EngineHandle<P::Map>> {
        self.engine.as_ref()
    }

    pub fn anchor(&self) -> &AnchorElement {
        &self.anchor
    }

    pub fn loader(&self) -> &EngineLoader {
        &self.loader
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Latest configuration received
    pub fn config(&self) -> &MapConfig<P::Map> {
        &self.config
    }

    /// Center and zoom last applied to the engine
    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn plugin_state(&self, kind: PluginKind) -> Option<&PluginState<Control<P>>> {
        self.plugins.state(kind)
    }

    pub fn pending_operations(&self) -> usize {
        self.queue.len()
    }
}

impl<P: EngineProvider> Drop for MapHost<P> {
    fn drop(&mut self) {
        self.teardown(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::headless::{EngineCall, HeadlessPoint, HeadlessProvider};

    #[test]
    fn test_mount_before_load_is_queued() {
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHost::new(HeadlessProvider::new(), loader);
        host.mount(MapConfig::new().zoom(8.0));

        assert!(!host.is_created());
        assert_eq!(host.pending_operations(), 1);

        trigger.fire();
        assert_eq!(host.pump(), 1);
        assert!(host.is_created());
        assert_eq!(host.pending_operations(), 0);
    }

    #[test]
    fn test_derived_create_options() {
        let mut host = MapHost::new(HeadlessProvider::new(), EngineLoader::ready());
        host.mount(MapConfig::new().center((116.4, 39.9)).zoom(11.0));

        let calls = host.provider().calls().mutations();
        assert_eq!(
            calls[0],
            EngineCall::CreateMap {
                anchor: "map-container".into(),
                options: CreateOptions::Derived {
                    zoom: Some(11.0),
                    center: Some(HeadlessPoint { lng: 116.4, lat: 39.9 }),
                },
            }
        );
        assert_eq!(host.view_state().zoom, Some(11.0));
    }

    #[test]
    fn test_pass_through_options_win() {
        let mut host = MapHost::new(HeadlessProvider::new(), EngineLoader::ready());
        let options = serde_json::json!({"zoom": 4, "viewMode": "3D"});
        host.mount(
            MapConfig::new()
                .center((1.0, 1.0))
                .zoom(9.0)
                .create_options(options.clone()),
        );

        let calls = host.provider().calls();
        assert_eq!(
            calls.mutations()[0],
            EngineCall::CreateMap {
                anchor: "map-container".into(),
                options: CreateOptions::PassThrough(options),
            }
        );
        assert_eq!(calls.count(|c| matches!(c, EngineCall::ToPoint(_))), 0);
        assert!(host.view_state().zoom.is_none());
    }

    #[test]
    fn test_unmount_releases_engine() {
        let mut host = MapHost::new(HeadlessProvider::new(), EngineLoader::ready());
        host.mount(MapConfig::new().plugin("Scale"));
        let engine = host.engine().cloned().unwrap();

        host.unmount();
        assert!(!host.is_created());
        assert_eq!(host.lifecycle(), Lifecycle::Unmounted);
        assert!(host.plugin_state(PluginKind::Scale).is_none());
        assert!(engine.lock().unwrap().is_destroyed());

        host.mount(MapConfig::new());
        assert!(!host.is_created());
    }

    #[test]
    fn test_creation_failure_is_reported() {
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let mut host = crate::core::builder::MapHostBuilder::new(
            HeadlessProvider::new().failing_create(),
        )
        .with_reporter(Arc::new(move |err: &MapError| {
            sink.lock().unwrap().push(err.to_string())
        }))
        .build();

        host.mount(MapConfig::new());
        assert!(!host.is_created());
        assert_eq!(reported.lock().unwrap().len(), 1);
    }
}
