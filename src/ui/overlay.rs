use crate::engine::{AnchorElement, EngineHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Child kinds that draw onto the map and so need the engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverlayKind {
    Circle,
    GroundImage,
    InfoWindow,
    Markers,
    Polyline,
    Polygon,
}

/// What the host injects into overlay children
pub struct OverlayContext<M> {
    pub engine: EngineHandle<M>,
    pub anchor: AnchorElement,
}

impl<M> Clone for OverlayContext<M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            anchor: self.anchor.clone(),
        }
    }
}

impl<M> fmt::Debug for OverlayContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayContext")
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

/// A declared child of the map.
///
/// Children that report an [`OverlayKind`] receive the context on every
/// render pass; everything else passes through untouched.
pub trait Element<M> {
    fn overlay_kind(&self) -> Option<OverlayKind> {
        None
    }

    fn inject(&mut self, _context: OverlayContext<M>) {}
}

/// Inject `context` into every overlay child; returns how many received it
pub fn inject_overlays<M>(children: &mut [Box<dyn Element<M>>], context: &OverlayContext<M>) -> usize {
    let mut injected = 0;
    for child in children.iter_mut() {
        if child.overlay_kind().is_some() {
            child.inject(context.clone());
            injected += 1;
        }
    }
    injected
}
