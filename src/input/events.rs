use crate::{core::callback::OneShot, engine::EngineHandle};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Event name reserved for the one-shot instance handback
pub const CREATED_EVENT: &str = "created";

/// An engine-level event as delivered to bound handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl EngineEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Persistent engine event handler
pub type EventHandler = Arc<dyn Fn(&EngineEvent) + Send + Sync>;

/// Named event handlers plus the reserved `created` handback.
///
/// Handlers bind in the order they were first declared.
pub struct EventBindingSet<M> {
    handlers: Vec<(String, EventHandler)>,
    created: Option<OneShot<EngineHandle<M>>>,
}

impl<M> EventBindingSet<M> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            created: None,
        }
    }

    /// Register a persistent handler for `event`.
    ///
    /// One handler per name: registering a name again replaces its handler
    /// and keeps its original position. The reserved `created` name cannot
    /// carry a persistent handler; use [`EventBindingSet::on_created`] for
    /// the handback.
    pub fn on<F>(mut self, event: &str, handler: F) -> Self
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        if event == CREATED_EVENT {
            log::warn!("'{}' is reserved for the instance handback, handler ignored", event);
            return self;
        }
        let handler: EventHandler = Arc::new(handler);
        match self.handlers.iter_mut().find(|(name, _)| *name == event) {
            Some((_, existing)) => {
                log::debug!("replacing handler for '{}'", event);
                *existing = handler;
            }
            None => self.handlers.push((event.to_string(), handler)),
        }
        self
    }

    /// Register the handback that receives the freshly created instance
    pub fn on_created<F>(mut self, handback: F) -> Self
    where
        F: FnOnce(&EngineHandle<M>) + Send + 'static,
    {
        self.created = Some(OneShot::new(handback));
        self
    }

    pub fn handlers(&self) -> impl Iterator<Item = (&str, &EventHandler)> {
        self.handlers.iter().map(|(name, handler)| (name.as_str(), handler))
    }

    pub(crate) fn created(&self) -> Option<&OneShot<EngineHandle<M>>> {
        self.created.as_ref()
    }

    pub fn has_handback(&self) -> bool {
        self.created.as_ref().is_some_and(|created| !created.is_spent())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.created.is_none()
    }
}

impl<M> Default for EventBindingSet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for EventBindingSet<M> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            created: self.created.clone(),
        }
    }
}

impl<M> fmt::Debug for EventBindingSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBindingSet")
            .field(
                "events",
                &self.handlers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("handback", &self.has_handback())
            .finish()
    }
}
