//! View state and the center/zoom differ

use crate::{core::geo::LngLat, engine::EngineMap};
use std::sync::Arc;

/// Center and zoom as last applied to the engine
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub center: Option<Arc<LngLat>>,
    pub zoom: Option<f64>,
}

impl ViewState {
    /// Shallow identity: same center allocation (or both unset) and equal zoom
    pub fn same_as(&self, other: &ViewState) -> bool {
        let same_center = match (&self.center, &other.center) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_center && self.zoom == other.zoom
    }
}

/// Which parts of the view an update changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewChange {
    pub zoom_changed: bool,
    pub center_changed: bool,
}

/// Compare an update against the previous snapshot.
///
/// Zoom is checked against what the engine currently reports, center
/// against the previous snapshot's center allocation.
pub fn diff(prev: &ViewState, next: &ViewState, engine_zoom: f64) -> ViewChange {
    let zoom_changed = next.zoom.is_some_and(|zoom| zoom != engine_zoom);
    let center_changed = match (&next.center, &prev.center) {
        (Some(next), Some(prev)) => !Arc::ptr_eq(next, prev),
        (Some(_), None) => true,
        (None, _) => false,
    };

    ViewChange {
        zoom_changed,
        center_changed,
    }
}

/// The imperative call an update resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum ViewAction<P> {
    Unchanged,
    SetZoom(f64),
    SetCenter(P),
    SetZoomAndCenter(f64, P),
}

impl ViewChange {
    pub fn is_unchanged(&self) -> bool {
        !self.zoom_changed && !self.center_changed
    }

    /// Pick the call for this change, given the requested zoom and the
    /// already converted center point
    pub fn action<P>(&self, zoom: Option<f64>, center: Option<P>) -> ViewAction<P> {
        let zoom = zoom.filter(|_| self.zoom_changed);
        let center = center.filter(|_| self.center_changed);

        match (zoom, center) {
            (Some(zoom), Some(center)) => ViewAction::SetZoomAndCenter(zoom, center),
            (Some(zoom), None) => ViewAction::SetZoom(zoom),
            (None, Some(center)) => ViewAction::SetCenter(center),
            (None, None) => ViewAction::Unchanged,
        }
    }
}

impl<P> ViewAction<P> {
    pub fn apply<M>(self, map: &mut M)
    where
        M: EngineMap<Point = P>,
    {
        match self {
            ViewAction::Unchanged => {}
            ViewAction::SetZoom(zoom) => map.set_zoom(zoom),
            ViewAction::SetCenter(center) => map.set_center(center),
            ViewAction::SetZoomAndCenter(zoom, center) => map.set_zoom_and_center(zoom, center),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(center: &Arc<LngLat>, zoom: f64) -> ViewState {
        ViewState {
            center: Some(center.clone()),
            zoom: Some(zoom),
        }
    }

    #[test]
    fn test_diff_table() {
        let c1 = Arc::new(LngLat::new(116.39, 39.9));
        let c2 = Arc::new(LngLat::new(121.47, 31.23));
        let prev = view(&c1, 3.0);

        let only_zoom = diff(&prev, &view(&c1, 5.0), 3.0);
        assert_eq!(only_zoom.action(Some(5.0), Some("c1")), ViewAction::SetZoom(5.0));

        let only_center = diff(&prev, &view(&c2, 3.0), 3.0);
        assert_eq!(only_center.action(Some(3.0), Some("c2")), ViewAction::SetCenter("c2"));

        let both = diff(&prev, &view(&c2, 5.0), 3.0);
        assert_eq!(
            both.action(Some(5.0), Some("c2")),
            ViewAction::SetZoomAndCenter(5.0, "c2")
        );

        let none = diff(&prev, &view(&c1, 3.0), 3.0);
        assert!(none.is_unchanged());
        assert_eq!(none.action(Some(3.0), Some("c1")), ViewAction::Unchanged);
    }

    #[test]
    fn test_equal_coordinates_in_new_allocation_count_as_change() {
        let prev = view(&Arc::new(LngLat::new(1.0, 1.0)), 3.0);
        let next = view(&Arc::new(LngLat::new(1.0, 1.0)), 3.0);
        assert!(diff(&prev, &next, 3.0).center_changed);
    }

    #[test]
    fn test_zoom_compares_against_engine() {
        let center = Arc::new(LngLat::default());
        // The engine moved on its own; the requested zoom differs from it
        let change = diff(&view(&center, 5.0), &view(&center, 5.0), 7.0);
        assert!(change.zoom_changed);
        assert!(!change.center_changed);
    }

    #[test]
    fn test_absent_fields_never_change() {
        let prev = view(&Arc::new(LngLat::default()), 3.0);
        let change = diff(&prev, &ViewState::default(), 9.0);
        assert!(change.is_unchanged());
    }

    #[test]
    fn test_same_as_is_identity() {
        let center = Arc::new(LngLat::default());
        assert!(view(&center, 3.0).same_as(&view(&center, 3.0)));
        assert!(!view(&center, 3.0).same_as(&view(&center, 4.0)));
        assert!(ViewState::default().same_as(&ViewState::default()));
    }
}
