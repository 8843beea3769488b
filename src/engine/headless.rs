//! In-memory engine that records every imperative call.
//!
//! Plugin module loads either complete immediately or wait until the
//! provider releases them, in whatever order the caller chooses. The
//! shared [`CallLog`] is what the test suite asserts against.

use crate::{
    core::geo::LngLat,
    engine::{
        AnchorElement, CreateOptions, EngineControl, EngineMap, EngineProvider, ListenerId,
        PluginLoad,
    },
    input::events::{EngineEvent, EventHandler},
    plugins::{kind::PluginKind, options::PluginOptions},
    prelude::HashMap,
    MapError, Result,
};
use futures::{channel::oneshot, FutureExt};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

/// Zoom the engine reports when created without one
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Native point type of the headless engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessPoint {
    pub lng: f64,
    pub lat: f64,
}

/// One imperative call received by the headless engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreateMap {
        anchor: String,
        options: CreateOptions<HeadlessPoint>,
    },
    ToPoint(HeadlessPoint),
    SetZoom(f64),
    SetCenter(HeadlessPoint),
    SetZoomAndCenter(f64, HeadlessPoint),
    LoadPlugin(PluginKind),
    CreateControl(PluginOptions),
    AddControl(PluginKind),
    RemoveControl(PluginKind),
    Show(PluginKind),
    Hide(PluginKind),
    On(String),
    Off(String),
    Destroy,
    /// Marker recorded by callers, used to check ordering against engine calls
    Custom(String),
}

/// Shared, append-only record of engine calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl CallLog {
    pub fn record(&self, call: EngineCall) {
        log::debug!("engine call: {:?}", call);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    pub fn snapshot(&self) -> Vec<EngineCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|call| predicate(call)).count())
            .unwrap_or(0)
    }

    /// Calls that change engine state, without point conversions or markers
    pub fn mutations(&self) -> Vec<EngineCall> {
        self.snapshot()
            .into_iter()
            .filter(|call| !matches!(call, EngineCall::ToPoint(_) | EngineCall::Custom(_)))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}

/// How plugin module loads complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluginLoadMode {
    /// Loads resolve as soon as they are requested
    #[default]
    Immediate,
    /// Loads wait for [`HeadlessProvider::release_plugin`]
    Manual,
}

type PendingLoads = Arc<Mutex<HashMap<PluginKind, Vec<oneshot::Sender<()>>>>>;

/// Completes manual plugin loads of a [`HeadlessProvider`]
#[derive(Debug, Clone)]
pub struct PluginReleaser {
    pending: PendingLoads,
}

impl PluginReleaser {
    /// Complete every outstanding module load for `kind`; returns how many
    pub fn release(&self, kind: PluginKind) -> usize {
        let senders = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&kind).unwrap_or_default(),
            Err(_) => Vec::new(),
        };
        let released = senders.len();
        for sender in senders {
            let _ = sender.send(());
        }
        released
    }
}

/// Engine namespace for the headless engine
#[derive(Debug, Default)]
pub struct HeadlessProvider {
    log: CallLog,
    mode: PluginLoadMode,
    pending: PendingLoads,
    fail_create: bool,
}

impl HeadlessProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plugin_loads(mut self, mode: PluginLoadMode) -> Self {
        self.mode = mode;
        self
    }

    /// Make `create_map` fail, to exercise creation errors
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.log.clone()
    }

    /// Complete every outstanding module load for `kind`; returns how many
    pub fn release_plugin(&self, kind: PluginKind) -> usize {
        self.releaser().release(kind)
    }

    /// Handle that releases manual loads from another task
    pub fn releaser(&self) -> PluginReleaser {
        PluginReleaser {
            pending: self.pending.clone(),
        }
    }

    pub fn pending_loads(&self, kind: PluginKind) -> usize {
        self.pending
            .lock()
            .map(|pending| pending.get(&kind).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl EngineProvider for HeadlessProvider {
    type Map = HeadlessMap;

    fn create_map(
        &mut self,
        anchor: &AnchorElement,
        options: CreateOptions<HeadlessPoint>,
    ) -> Result<HeadlessMap> {
        if self.fail_create {
            return Err(MapError::Engine(format!(
                "cannot attach map to '{}'",
                anchor.id
            )));
        }

        let (zoom, center) = match &options {
            CreateOptions::Derived { zoom, center } => (zoom.unwrap_or(DEFAULT_ZOOM), *center),
            CreateOptions::PassThrough(value) => (
                value.get("zoom").and_then(|z| z.as_f64()).unwrap_or(DEFAULT_ZOOM),
                None,
            ),
        };

        self.log.record(EngineCall::CreateMap {
            anchor: anchor.id.clone(),
            options,
        });

        Ok(HeadlessMap {
            log: self.log.clone(),
            mode: self.mode,
            pending: self.pending.clone(),
            zoom,
            center,
            listeners: BTreeMap::new(),
            next_listener: 0,
            destroyed: false,
        })
    }

    fn lng_lat(&self, center: &LngLat) -> HeadlessPoint {
        let point = HeadlessPoint {
            lng: center.longitude,
            lat: center.latitude,
        };
        self.log.record(EngineCall::ToPoint(point));
        point
    }
}

/// A created headless map instance
pub struct HeadlessMap {
    log: CallLog,
    mode: PluginLoadMode,
    pending: PendingLoads,
    zoom: f64,
    center: Option<HeadlessPoint>,
    listeners: BTreeMap<ListenerId, (String, EventHandler)>,
    next_listener: u64,
    destroyed: bool,
}

impl HeadlessMap {
    pub fn center(&self) -> Option<HeadlessPoint> {
        self.center
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver an event to every listener bound under its name
    pub fn emit(&self, event: &EngineEvent) -> usize {
        let mut delivered = 0;
        for (name, handler) in self.listeners.values() {
            if *name == event.name {
                handler(event);
                delivered += 1;
            }
        }
        delivered
    }
}

impl EngineMap for HeadlessMap {
    type Point = HeadlessPoint;
    type Control = HeadlessControl;

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.log.record(EngineCall::SetZoom(zoom));
        self.zoom = zoom;
    }

    fn set_center(&mut self, center: HeadlessPoint) {
        self.log.record(EngineCall::SetCenter(center));
        self.center = Some(center);
    }

    fn set_zoom_and_center(&mut self, zoom: f64, center: HeadlessPoint) {
        self.log.record(EngineCall::SetZoomAndCenter(zoom, center));
        self.zoom = zoom;
        self.center = Some(center);
    }

    fn load_plugin(&mut self, kind: PluginKind) -> PluginLoad {
        self.log.record(EngineCall::LoadPlugin(kind));
        match self.mode {
            PluginLoadMode::Immediate => futures::future::ready(()).boxed(),
            PluginLoadMode::Manual => {
                let (sender, receiver) = oneshot::channel();
                if let Ok(mut pending) = self.pending.lock() {
                    pending.entry(kind).or_default().push(sender);
                }
                async move {
                    // A dropped sender means the module never arrives
                    if receiver.await.is_err() {
                        futures::future::pending::<()>().await;
                    }
                }
                .boxed()
            }
        }
    }

    fn create_control(&mut self, options: &PluginOptions) -> Result<HeadlessControl> {
        self.log.record(EngineCall::CreateControl(options.clone()));
        Ok(HeadlessControl {
            kind: options.kind(),
            log: self.log.clone(),
            visible: Arc::new(AtomicBool::new(true)),
        })
    }

    fn add_control(&mut self, control: &HeadlessControl) {
        self.log.record(EngineCall::AddControl(control.kind));
    }

    fn remove_control(&mut self, control: &HeadlessControl) {
        self.log.record(EngineCall::RemoveControl(control.kind));
    }

    fn on(&mut self, event: &str, handler: EventHandler) -> ListenerId {
        self.log.record(EngineCall::On(event.to_string()));
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, (event.to_string(), handler));
        id
    }

    fn off(&mut self, listener: ListenerId) {
        if let Some((name, _)) = self.listeners.remove(&listener) {
            self.log.record(EngineCall::Off(name));
        }
    }

    fn destroy(&mut self) {
        self.log.record(EngineCall::Destroy);
        self.listeners.clear();
        self.destroyed = true;
    }
}

/// Control created by [`HeadlessMap`]
#[derive(Debug, Clone)]
pub struct HeadlessControl {
    kind: PluginKind,
    log: CallLog,
    visible: Arc<AtomicBool>,
}

impl HeadlessControl {
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl EngineControl for HeadlessControl {
    fn kind(&self) -> PluginKind {
        self.kind
    }

    fn show(&self) {
        self.log.record(EngineCall::Show(self.kind));
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.log.record(EngineCall::Hide(self.kind));
        self.visible.store(false, Ordering::SeqCst);
    }
}
