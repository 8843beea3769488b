//! Host builder for fluent configuration
//!
//! Collects the injected engine capability, the shared loader, the anchor
//! element and the error reporter before building a [`MapHost`].

use crate::{
    core::host::MapHost,
    engine::{AnchorElement, EngineProvider},
    log_reporter,
    runtime::EngineLoader,
    ErrorReporter,
};

/// Builder for creating and configuring MapHost instances
pub struct MapHostBuilder<P> {
    provider: P,
    loader: Option<EngineLoader>,
    anchor: AnchorElement,
    reporter: Option<ErrorReporter>,
}

impl<P: EngineProvider> MapHostBuilder<P> {
    /// Create a new builder around the engine capability
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            loader: None,
            anchor: AnchorElement::default(),
            reporter: None,
        }
    }

    /// Gate operations on a shared engine loader
    pub fn with_loader(mut self, loader: EngineLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the element the map instance attaches to
    pub fn with_anchor(mut self, anchor: AnchorElement) -> Self {
        self.anchor = anchor;
        self
    }

    /// Route non-fatal errors to a custom reporter
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build the host. Without a loader the engine counts as loaded.
    pub fn build(self) -> MapHost<P> {
        MapHost::from_parts(
            self.provider,
            self.loader.unwrap_or_else(EngineLoader::ready),
            self.anchor,
            self.reporter.unwrap_or_else(log_reporter),
        )
    }
}
