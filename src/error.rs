use thiserror::Error as ThisError;

/// Failure of a single poll or pump command. None of these are retried.
#[derive(ThisError, Debug)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Network(String),

    #[error("server returned an empty body")]
    EmptyResponse,

    #[error("unable to process feed: {0}")]
    Parse(String),

    #[error("no active network with internet access")]
    Connectivity,

    #[error("command rejected with status {0}")]
    CommandRejected(u16),
}

impl From<hyper::Error> for ClientError {
    fn from(e: hyper::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Parse(e.to_string())
    }
}
