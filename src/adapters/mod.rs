// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod http_source;

pub use http_source::{build_client, HttpSource};
