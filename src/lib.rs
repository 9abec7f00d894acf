pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, api_tools, client, executor, registry, stdio, tools, transport};
pub use domain::types;
pub use infrastructure::{api, http, model, server, store};
