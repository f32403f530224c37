use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST request: {0}")]
    RestRequestError(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Paystack rejected the request: {0}")]
    Rejected(String),
    #[error("Paystack is rate limiting requests. Try again later.")]
    RateLimited,
    #[error("Paystack returned an empty response")]
    EmptyResponse,
}

impl PaystackApiError {
    /// The message Paystack attached to the failure, if there was one.
    pub fn gateway_message(&self) -> Option<&str> {
        match self {
            Self::QueryError { message, .. } | Self::Rejected(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
