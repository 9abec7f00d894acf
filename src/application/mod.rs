pub mod agent;
pub mod api_tools;
pub mod client;
pub mod executor;
pub mod registry;
pub mod stdio;
pub mod tools;
pub mod transport;
