use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use marketplace_engine::{
    traits::{AccountError, CartError, CatalogError, GatewayError},
    OrderFlowError,
    SellerApiError,
};
use thiserror::Error;

/// Errors returned by route handlers. Client-facing variants carry the message as-is, so that the `{"error": ..}`
/// body reads the same as the engine's error.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentGatewayError(String),
    #[error("{0}")]
    RateLimited(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentGatewayError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingToken,
    #[error("Insufficient permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Requests from this address are not allowed")]
    ForbiddenPeer,
}

/// Checkout and payment verification report every gateway failure as a server error. Only the seller dashboard
/// tells the caller to back off when the gateway is rate limiting.
impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        error!("💳️ Payment gateway error. {e}");
        Self::PaymentGatewayError(e.to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
            OrderFlowError::MissingSession
            | OrderFlowError::MissingFields(_)
            | OrderFlowError::InvalidQuantity
            | OrderFlowError::InsufficientStock { .. }
            | OrderFlowError::AmountTooSmall
            | OrderFlowError::ReferenceMismatch
            | OrderFlowError::PaymentNotSuccessful(_)
            | OrderFlowError::AmountMismatch { .. }
            | OrderFlowError::NotOnHold
            | OrderFlowError::SellersAlreadyPaid => Self::InvalidRequestBody(e.to_string()),
            OrderFlowError::ProductNotFound(_) | OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::NotAuthorized => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::IllegalTransition { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::Gateway(e) => e.into(),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CartError::ProductNotFound(_) | CartError::CartNotFound | CartError::ItemNotInCart(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CartError::InsufficientStock { .. }
            | CartError::InvalidQuantity
            | CartError::MissingOwner
            | CartError::EmptyItems => Self::InvalidRequestBody(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CatalogError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogError::InvalidProduct(_) => Self::InvalidRequestBody(e.to_string()),
            CatalogError::AuthenticationRequired => Self::AuthenticationError(AuthError::MissingToken),
        }
    }
}

impl From<AccountError> for ServerError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::DatabaseError(_) => Self::BackendError(e.to_string()),
            AccountError::UserNotFound(_) | AccountError::SellerNotFound(_) => Self::NoRecordFound(e.to_string()),
            AccountError::EmailInUse(_) => Self::InvalidRequestBody("Email already in use".to_string()),
            AccountError::InvalidInput(_) | AccountError::PaymentAlreadySetup => {
                Self::InvalidRequestBody(e.to_string())
            },
        }
    }
}

impl From<SellerApiError> for ServerError {
    fn from(e: SellerApiError) -> Self {
        match e {
            SellerApiError::Account(e) => e.into(),
            SellerApiError::Gateway(e @ GatewayError::RateLimited) => Self::RateLimited(e.to_string()),
            SellerApiError::Gateway(e) => e.into(),
            SellerApiError::InvalidInput(s) => Self::InvalidRequestBody(s),
        }
    }
}
