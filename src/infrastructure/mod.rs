pub mod api;
pub mod http;
pub mod model;
pub mod server;
pub mod store;
