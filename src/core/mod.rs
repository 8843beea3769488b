pub mod builder;
pub mod callback;
pub mod config;
pub mod geo;
pub mod host;
pub mod view;
