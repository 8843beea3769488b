use mapsync::{
    engine::headless::{EngineCall, HeadlessMap, HeadlessPoint, HeadlessProvider},
    CreateOptions, EngineEvent, EngineLoader, EngineMap, EventBindingSet, LngLat, MapConfig,
    MapError, MapHost, MapHostBuilder,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Host lifecycle tests driven through the headless engine
#[cfg(test)]
mod host_tests {
    use super::*;

    type Config = MapConfig<HeadlessMap>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn loaded_host() -> MapHost<HeadlessProvider> {
        MapHost::new(HeadlessProvider::new(), EngineLoader::ready())
    }

    fn create_calls(host: &MapHost<HeadlessProvider>) -> usize {
        host.provider()
            .calls()
            .count(|call| matches!(call, EngineCall::CreateMap { .. }))
    }

    fn point(lng: f64, lat: f64) -> HeadlessPoint {
        HeadlessPoint { lng, lat }
    }

    /// Any number of mounts and updates issued before the engine loads
    /// produce exactly one instance
    #[test]
    fn test_exactly_once_creation() {
        init_logging();
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHost::new(HeadlessProvider::new(), loader);

        let first = Config::new().zoom(3.0);
        let second = first.clone().zoom(4.0);
        let third = second.clone().zoom(5.0);
        host.mount(first.clone());
        host.mount(first.clone());
        host.update_configuration(&first, second.clone());
        host.update_configuration(&second, third.clone());

        assert_eq!(create_calls(&host), 0);
        assert_eq!(host.pending_operations(), 6);

        trigger.fire();
        host.pump();
        host.mount(third.clone());
        host.update_configuration(&third, third.clone().zoom(6.0));

        assert_eq!(create_calls(&host), 1);
        assert_eq!(host.pending_operations(), 0);
    }

    /// Updates alone also lead to creation once the engine is available
    #[test]
    fn test_update_without_mount_creates() {
        let mut host = loaded_host();
        let config = Config::new().zoom(7.0);
        host.update_configuration(&Config::new(), config);
        assert!(host.is_created());
        assert_eq!(create_calls(&host), 1);
    }

    /// Creation reads the configuration current when it runs, and the stale
    /// update issued before it does not repeat the work
    #[test]
    fn test_creation_uses_latest_config() {
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHost::new(HeadlessProvider::new(), loader);

        let initial = Config::new().center((116.39, 39.9)).zoom(3.0);
        let next = initial.clone().center((121.47, 31.23)).zoom(7.0);
        host.mount(initial.clone());
        host.update_configuration(&initial, next);
        trigger.fire();
        host.pump();

        assert_eq!(
            host.provider().calls().mutations(),
            vec![EngineCall::CreateMap {
                anchor: "map-container".into(),
                options: CreateOptions::Derived {
                    zoom: Some(7.0),
                    center: Some(point(121.47, 31.23)),
                },
            }]
        );
    }

    /// Queued operations run in the order they were issued
    #[test]
    fn test_queued_updates_run_fifo() {
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHost::new(HeadlessProvider::new(), loader);

        let a = Config::new().zoom(3.0);
        let b = a.clone().zoom(5.0);
        let c = b.clone().zoom(9.0);
        host.mount(a.clone());
        host.update_configuration(&a, b.clone());
        host.update_configuration(&b, c);
        trigger.fire();
        assert_eq!(host.pump(), 5);

        let calls = host.provider().calls().mutations();
        assert_eq!(
            calls[1..].to_vec(),
            vec![EngineCall::SetZoom(5.0), EngineCall::SetZoom(9.0)]
        );
        assert_eq!(host.engine().unwrap().lock().unwrap().zoom(), 9.0);
    }

    /// Each row of the center/zoom table issues exactly one call (or none)
    #[test]
    fn test_view_diff_table() {
        let c1 = Arc::new(LngLat::new(116.39, 39.9));
        let base = Config::new().shared_center(c1.clone()).zoom(3.0);

        let cases = vec![
            (
                base.clone().zoom(5.0),
                vec![EngineCall::SetZoom(5.0)],
            ),
            (
                base.clone().center((121.47, 31.23)),
                vec![EngineCall::SetCenter(point(121.47, 31.23))],
            ),
            (
                base.clone().center((121.47, 31.23)).zoom(5.0),
                vec![EngineCall::SetZoomAndCenter(5.0, point(121.47, 31.23))],
            ),
            (base.clone().shared_center(c1.clone()), vec![]),
        ];

        for (next, expected) in cases {
            let mut host = loaded_host();
            host.mount(base.clone());
            host.provider().calls().clear();

            host.update_configuration(&base, next);
            assert_eq!(host.provider().calls().mutations(), expected);
        }
    }

    /// The engine point is produced for a requested center even when only
    /// the zoom changes
    #[test]
    fn test_center_converted_even_when_unchanged() {
        let mut host = loaded_host();
        let base = Config::new().center((10.0, 20.0)).zoom(3.0);
        host.mount(base.clone());
        host.provider().calls().clear();

        host.update_configuration(&base, base.clone().zoom(4.0));
        let calls = host.provider().calls();
        assert_eq!(calls.count(|c| *c == EngineCall::ToPoint(point(10.0, 20.0))), 1);
        assert_eq!(calls.mutations(), vec![EngineCall::SetZoom(4.0)]);
    }

    /// The handback sees the new instance once; other events stay bound
    #[test]
    fn test_handback_once() {
        let handbacks = Arc::new(AtomicUsize::new(0));
        let clicks = Arc::new(AtomicUsize::new(0));
        let (h, c) = (handbacks.clone(), clicks.clone());

        let events = EventBindingSet::new()
            .on_created(move |engine: &Arc<Mutex<HeadlessMap>>| {
                assert!(!engine.lock().unwrap().is_destroyed());
                h.fetch_add(1, Ordering::SeqCst);
            })
            .on("click", move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });

        let mut host = loaded_host();
        let config = Config::new().zoom(3.0).events(events);
        host.mount(config.clone());
        assert_eq!(handbacks.load(Ordering::SeqCst), 1);

        let next = config.clone().zoom(4.0);
        host.update_configuration(&config, next.clone());
        host.update_configuration(&next, next.clone().zoom(8.0));
        host.mount(next);
        assert_eq!(handbacks.load(Ordering::SeqCst), 1);

        let engine = host.engine().unwrap().clone();
        engine
            .lock()
            .unwrap()
            .emit(&EngineEvent::new("click", serde_json::json!({"x": 1})));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(
            host.provider()
                .calls()
                .count(|c| *c == EngineCall::On("click".into())),
            1
        );
    }

    /// Overlay children only receive the instance once it exists
    #[test]
    fn test_overlay_children_injection() {
        use mapsync::{Element, OverlayContext, OverlayKind};

        struct Polygon(Arc<AtomicUsize>);
        impl Element<HeadlessMap> for Polygon {
            fn overlay_kind(&self) -> Option<OverlayKind> {
                Some(OverlayKind::Polygon)
            }
            fn inject(&mut self, context: OverlayContext<HeadlessMap>) {
                assert_eq!(context.anchor.id, "amap");
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        struct Legend;
        impl Element<HeadlessMap> for Legend {}

        let injected = Arc::new(AtomicUsize::new(0));
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHostBuilder::new(HeadlessProvider::new())
            .with_loader(loader)
            .with_anchor(mapsync::AnchorElement::new("amap"))
            .build();
        let mut children: Vec<Box<dyn Element<HeadlessMap>>> =
            vec![Box::new(Polygon(injected.clone())), Box::new(Legend)];

        host.mount(Config::new());
        assert!(!host.render_children(&mut children));
        assert_eq!(injected.load(Ordering::SeqCst), 0);

        trigger.fire();
        host.pump();
        assert!(host.render_children(&mut children));
        assert!(host.render_children(&mut children));
        assert_eq!(injected.load(Ordering::SeqCst), 2);
    }

    /// Unmount tears down controls, listeners and the instance
    #[test]
    fn test_unmount_releases_everything() {
        let mut host = loaded_host();
        let events = EventBindingSet::new().on("zoomend", |_| {});
        host.mount(
            Config::new()
                .events(events)
                .plugins(["Scale", "ToolBar"]),
        );
        host.unmount();

        let calls = host.provider().calls().mutations();
        let tail: Vec<_> = calls[calls.len() - 4..].to_vec();
        assert_eq!(
            tail,
            vec![
                EngineCall::RemoveControl(mapsync::PluginKind::Scale),
                EngineCall::RemoveControl(mapsync::PluginKind::ToolBar),
                EngineCall::Off("zoomend".into()),
                EngineCall::Destroy,
            ]
        );
        assert!(host.engine().is_none());
    }

    /// Dropping a host destroys its instance
    #[test]
    fn test_drop_destroys_instance() {
        let provider = HeadlessProvider::new();
        let calls = provider.calls();
        {
            let mut host = MapHost::new(provider, EngineLoader::ready());
            host.mount(Config::new());
        }
        assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);
    }

    /// Unmounting before the engine loads drops the queue without creating
    #[test]
    fn test_unmount_before_load() {
        let (trigger, loader) = EngineLoader::channel();
        let mut host = MapHost::new(HeadlessProvider::new(), loader);
        host.mount(Config::new());
        host.unmount();
        trigger.fire();

        assert_eq!(host.pump(), 0);
        assert_eq!(create_calls(&host), 0);
    }

    /// A failing creation is reported and the host keeps running
    #[test]
    fn test_create_error_is_reported() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let mut host = MapHostBuilder::new(HeadlessProvider::new().failing_create())
            .with_reporter(Arc::new(move |err: &MapError| {
                sink.lock().unwrap().push(err.to_string());
            }))
            .build();

        host.mount(Config::new());
        host.update_configuration(&Config::new(), Config::new().zoom(2.0));
        assert!(!host.is_created());
        assert_eq!(errors.lock().unwrap().len(), 2);
    }

    /// `ready()` waits for an asynchronous loader and then flushes
    #[tokio::test]
    async fn test_ready_awaits_loader() {
        let loader = EngineLoader::new(async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        });
        let mut host = MapHost::new(HeadlessProvider::new(), loader);
        host.mount(Config::new().zoom(12.0));
        assert!(!host.is_created());

        let executed = tokio::time::timeout(std::time::Duration::from_secs(1), host.ready())
            .await
            .expect("loader resolves");
        assert_eq!(executed, 1);
        assert!(host.is_created());
    }

    /// Configuration parsed from JSON drives the host like a built one
    #[test]
    fn test_json_config() {
        let mut host = loaded_host();
        let config = Config::from_json(
            r#"{"zoom": 6, "plugins": ["Scale", {"name": "ToolBar", "options": {"position": "LT"}}]}"#,
        )
        .unwrap();
        host.mount(config);

        let created = host
            .provider()
            .calls()
            .count(|c| matches!(c, EngineCall::CreateControl(_)));
        assert_eq!(created, 2);
        assert!(host
            .plugin_state(mapsync::PluginKind::ToolBar)
            .unwrap()
            .is_visible());
    }

    /// Dropping the host while a caller holds the engine lock does not
    /// wait on that lock
    #[test]
    fn test_drop_with_engine_locked() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let mut host = MapHostBuilder::new(HeadlessProvider::new())
            .with_reporter(Arc::new(move |err: &MapError| {
                sink.lock().unwrap().push(err.to_string());
            }))
            .build();
        host.mount(Config::new());
        let calls = host.provider().calls();
        let engine = host.engine().unwrap().clone();

        let guard = engine.lock().unwrap();
        drop(host);
        assert!(!guard.is_destroyed());
        drop(guard);

        assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 0);
        assert_eq!(
            *errors.lock().unwrap(),
            vec!["Engine error: engine instance still locked at drop"]
        );
    }
}
