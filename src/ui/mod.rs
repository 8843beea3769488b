pub mod overlay;

pub use overlay::{inject_overlays, Element, OverlayContext, OverlayKind};
