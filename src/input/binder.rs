use crate::{
    engine::{EngineHandle, EngineMap, ListenerId},
    input::events::EventBindingSet,
    MapError, Result,
};

/// Wires an [`EventBindingSet`] onto a freshly created engine instance.
pub struct EventBinder;

impl EventBinder {
    /// Hand the instance to the `created` handback, then bind every other
    /// handler persistently. Called once, at creation.
    pub fn bind<M: EngineMap>(
        events: &EventBindingSet<M>,
        handle: &EngineHandle<M>,
    ) -> Result<Vec<ListenerId>> {
        if let Some(created) = events.created() {
            // The engine is not locked here: the handback may lock it itself
            if created.fire(handle) {
                log::debug!("instance handed back to 'created' handler");
            }
        }

        let mut map = handle
            .lock()
            .map_err(|_| MapError::LockPoisoned("engine instance"))?;

        let listeners = events
            .handlers()
            .map(|(name, handler)| {
                log::debug!("binding engine event '{}'", name);
                map.on(name, handler.clone())
            })
            .collect();

        Ok(listeners)
    }

    /// Release listeners returned by [`EventBinder::bind`]
    pub fn unbind<M: EngineMap>(map: &mut M, listeners: Vec<ListenerId>) {
        for listener in listeners {
            map.off(listener);
        }
    }
}
