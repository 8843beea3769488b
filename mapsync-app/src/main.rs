use mapsync::{
    engine::headless::{HeadlessControl, HeadlessMap, HeadlessProvider, PluginLoadMode},
    EngineEvent, EngineLoader, EventBindingSet, MapConfig, MapHostBuilder, PluginKind,
    PluginRequest,
};
use std::time::Duration;

type Config = MapConfig<HeadlessMap>;
type Request = PluginRequest<HeadlessControl>;

/// Headless session: queue work before the engine loads, flush it, then
/// walk through a few configuration updates and print what the engine saw
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    mapsync::init_logging();

    let loader = EngineLoader::spawn(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        log::info!("engine script loaded");
    });

    let provider = HeadlessProvider::new().with_plugin_loads(PluginLoadMode::Manual);
    let mut host = MapHostBuilder::new(provider)
        .with_loader(loader)
        .with_anchor(mapsync::AnchorElement::new("demo-map"))
        .build();

    let events = EventBindingSet::<HeadlessMap>::new()
        .on_created(|_engine| log::info!("engine instance handed back"))
        .on("moveend", |event: &EngineEvent| {
            log::info!("moveend: {}", event.payload)
        });

    let initial = Config::from_json(
        r#"{
            "center": {"longitude": 116.397, "latitude": 39.909},
            "zoom": 11,
            "plugins": ["Scale", {"name": "ToolBar", "options": {"position": "LT"}}]
        }"#,
    )?
    .events(events);

    host.mount(initial.clone());
    let zoomed = initial.clone().zoom(13.0);
    host.update_configuration(&initial, zoomed.clone());
    log::info!("{} operations waiting for the engine", host.pending_operations());

    let executed = host.ready().await;
    log::info!("flushed {} queued operations", executed);

    // Plugin modules arrive out of order; ToolBar is hidden before it lands
    let trimmed = zoomed.clone().plugins([
        Request::new("Scale"),
        Request::new("ToolBar").visible(false),
    ]);
    host.update_configuration(&zoomed, trimmed.clone());
    let releaser = host.provider().releaser();
    tokio::spawn(async move {
        for kind in [PluginKind::ToolBar, PluginKind::Scale] {
            tokio::time::sleep(Duration::from_millis(20)).await;
            releaser.release(kind);
        }
    });
    let created = host.settle().await;
    log::info!("{} plugin controls created", created);

    let moved = trimmed.clone().center((121.47, 31.23)).zoom(9.0);
    host.update_configuration(&trimmed, moved);

    if let Some(engine) = host.engine() {
        if let Ok(map) = engine.lock() {
            map.emit(&EngineEvent::new(
                "moveend",
                serde_json::json!({"longitude": 121.47, "latitude": 31.23}),
            ));
        }
    }

    host.unmount();

    for (index, call) in host.provider().calls().snapshot().iter().enumerate() {
        println!("{:>3}  {:?}", index, call);
    }

    Ok(())
}
