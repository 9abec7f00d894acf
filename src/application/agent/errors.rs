use crate::client::ChatError;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("model kept choosing the unavailable tool '{0}'")]
    InvalidToolChoice(String),
    #[error("model reply stayed malformed after corrective feedback: {0}")]
    MalformedReply(String),
    #[error("no final answer within {0} reasoning steps")]
    StepLimitExceeded(usize),
    #[error("run cancelled")]
    Cancelled,
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Chat(err) => err.user_message(),
            AgentError::Transport(err) => err.user_message(),
            AgentError::InvalidToolChoice(_) | AgentError::MalformedReply(_) => {
                "Sorry, the assistant could not settle on a usable action for this request. Please rephrase and try again."
                    .to_string()
            }
            AgentError::StepLimitExceeded(_) => {
                "Sorry, this request could not be resolved within the allowed number of steps."
                    .to_string()
            }
            AgentError::Cancelled => "The request was cancelled.".to_string(),
        }
    }
}
