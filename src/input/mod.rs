pub mod binder;
pub mod events;

// Re-export the essential types
pub use binder::EventBinder;
pub use events::{EngineEvent, EventBindingSet, EventHandler, CREATED_EVENT};
