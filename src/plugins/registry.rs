use crate::{
    core::{callback::OneShot, config::PluginRequest},
    engine::{EngineControl, EngineHandle, EngineMap},
    plugins::{kind::PluginKind, options::PluginOptions},
    prelude::HashMap,
    ErrorReporter, MapError, Result,
};
use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
    FutureExt,
};
use std::fmt;

/// Lifecycle of one plugin kind on one host.
///
/// `visible` is the target visibility. While the module load is in flight
/// there is no control yet, and a hide that arrives in the meantime is
/// recorded here and applied as soon as the control is constructed.
pub struct PluginState<C> {
    kind: PluginKind,
    control: Option<C>,
    visible: bool,
    options: PluginOptions,
    loading: bool,
    on_created: Option<OneShot<C>>,
}

impl<C> PluginState<C> {
    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    pub fn control(&self) -> Option<&C> {
        self.control.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Options the control was (or is being) created with
    pub fn options(&self) -> &PluginOptions {
        &self.options
    }
}

impl<C> fmt::Debug for PluginState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginState")
            .field("kind", &self.kind)
            .field("created", &self.control.is_some())
            .field("visible", &self.visible)
            .field("loading", &self.loading)
            .finish()
    }
}

/// Tracks at most one control per [`PluginKind`] and reconciles requested
/// plugin lists against them.
///
/// In-flight module loads are kept in one [`FuturesUnordered`] that yields
/// the kind whose module arrived, in completion order.
pub struct PluginRegistry<C> {
    plugins: HashMap<PluginKind, PluginState<C>>,
    loads: FuturesUnordered<BoxFuture<'static, PluginKind>>,
}

impl<C: EngineControl> PluginRegistry<C> {
    pub fn new() -> Self {
        Self {
            plugins: HashMap::default(),
            loads: FuturesUnordered::new(),
        }
    }

    /// Reconcile against the requested plugin list.
    ///
    /// Visible requests are created or shown. Every canonical kind that ends
    /// the pass unrequested, or requested with `visible: false`, is hidden if
    /// it exists. A bad request is reported and skipped.
    pub fn sync<M>(
        &mut self,
        requests: &[PluginRequest<C>],
        map: &EngineHandle<M>,
        reporter: &ErrorReporter,
    ) where
        M: EngineMap<Control = C>,
    {
        let mut pending_removal: Vec<PluginKind> = PluginKind::ALL.to_vec();

        for request in requests {
            let kind = match request.name.parse::<PluginKind>() {
                Ok(kind) => kind,
                Err(err) => {
                    reporter(&err);
                    continue;
                }
            };

            let options = match PluginOptions::resolve(kind, &request.options) {
                Ok(options) => options,
                Err(err) => {
                    reporter(&err);
                    continue;
                }
            };

            if request.visible {
                pending_removal.retain(|pending| *pending != kind);
                if let Err(err) = self.ensure(kind, options, request.on_created.clone(), map) {
                    reporter(&err);
                }
            } else if !pending_removal.contains(&kind) {
                pending_removal.push(kind);
            }
        }

        for kind in pending_removal {
            self.hide(kind);
        }
    }

    /// Show the control for `kind`, requesting its creation if needed.
    ///
    /// Options only apply to the first creation; later requests for an
    /// existing kind route to `show()`.
    pub fn ensure<M>(
        &mut self,
        kind: PluginKind,
        options: PluginOptions,
        on_created: Option<OneShot<C>>,
        map: &EngineHandle<M>,
    ) -> Result<()>
    where
        M: EngineMap<Control = C>,
    {
        if let Some(state) = self.plugins.get_mut(&kind) {
            if state.options != options {
                log::debug!("{} already requested, new options are not applied", kind);
            }
            state.visible = true;
            match &state.control {
                Some(control) => control.show(),
                None => log::debug!("{} still loading, marked visible", kind),
            }
            return Ok(());
        }

        log::debug!("loading plugin module for {}", kind);
        let load = map
            .lock()
            .map_err(|_| MapError::LockPoisoned("engine instance"))?
            .load_plugin(kind);
        self.loads.push(load.map(move |_| kind).boxed());

        self.plugins.insert(
            kind,
            PluginState {
                kind,
                control: None,
                visible: true,
                options,
                loading: true,
                on_created,
            },
        );
        Ok(())
    }

    /// Hide an existing control. Kinds never created stay absent.
    pub fn hide(&mut self, kind: PluginKind) {
        if let Some(state) = self.plugins.get_mut(&kind) {
            state.visible = false;
            if let Some(control) = &state.control {
                control.hide();
            }
        }
    }

    /// Construct controls whose module load has already finished, without
    /// waiting. Returns how many controls were created.
    pub fn poll<M>(&mut self, map: &EngineHandle<M>, reporter: &ErrorReporter) -> usize
    where
        M: EngineMap<Control = C>,
    {
        let mut created = 0;
        while let Some(Some(kind)) = self.loads.next().now_or_never() {
            if self.complete(kind, map, reporter) {
                created += 1;
            }
        }
        created
    }

    /// Wait for every in-flight module load, constructing each control as
    /// its module arrives. Returns how many controls were created.
    pub async fn settle<M>(&mut self, map: &EngineHandle<M>, reporter: &ErrorReporter) -> usize
    where
        M: EngineMap<Control = C>,
    {
        let mut created = 0;
        while let Some(kind) = self.loads.next().await {
            if self.complete(kind, map, reporter) {
                created += 1;
            }
        }
        created
    }

    fn complete<M>(&mut self, kind: PluginKind, map: &EngineHandle<M>, reporter: &ErrorReporter) -> bool
    where
        M: EngineMap<Control = C>,
    {
        let Some(state) = self.plugins.get_mut(&kind) else {
            return false;
        };
        if !state.loading {
            return false;
        }
        state.loading = false;

        match Self::construct(map, &state.options) {
            Ok(control) => {
                if !state.visible {
                    control.hide();
                }
                log::info!("{} control created (visible: {})", kind, state.visible);
                let control = state.control.insert(control);
                if let Some(on_created) = state.on_created.take() {
                    on_created.fire(control);
                }
                true
            }
            Err(err) => {
                reporter(&err);
                self.plugins.remove(&kind);
                false
            }
        }
    }

    fn construct<M>(map: &EngineHandle<M>, options: &PluginOptions) -> Result<C>
    where
        M: EngineMap<Control = C>,
    {
        let mut map = map
            .lock()
            .map_err(|_| MapError::LockPoisoned("engine instance"))?;
        let control = map.create_control(options)?;
        map.add_control(&control);
        Ok(control)
    }

    /// Remove every control from the engine and forget all plugin state.
    ///
    /// In-flight loads are dropped; their modules are never turned into
    /// controls.
    pub fn clear<M>(&mut self, map: &mut M)
    where
        M: EngineMap<Control = C>,
    {
        self.loads = FuturesUnordered::new();
        for kind in PluginKind::ALL {
            if let Some(state) = self.plugins.remove(&kind) {
                if let Some(control) = &state.control {
                    map.remove_control(control);
                }
            }
        }
    }

    pub fn state(&self, kind: PluginKind) -> Option<&PluginState<C>> {
        self.plugins.get(&kind)
    }

    /// Kinds whose module load is still in flight
    pub fn loading(&self) -> usize {
        self.plugins.values().filter(|state| state.is_loading()).count()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<C: EngineControl> Default for PluginRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
