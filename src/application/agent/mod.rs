mod directive;
mod errors;
mod models;
mod parser;
mod runner;

pub use directive::ModelIntent;
pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome, AgentStep};
pub use parser::{parse_intent, IntentError};
pub use runner::Agent;
