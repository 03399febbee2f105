// HTTP surface

pub mod discovery;
pub mod http;

pub use discovery::DiscoveryDocument;
pub use http::{configure_routes, AppState, Server};
