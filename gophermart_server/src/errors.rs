use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use gophermart_engine::{AccountApiError, AuthApiError, OrderFlowError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The login is already taken. {0}")]
    LoginTaken(String),
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(String),
    #[error("The order has already been uploaded by another user. {0}")]
    OrderConflict(String),
    #[error("Insufficient funds. {0}")]
    InsufficientFunds(String),
    #[error("A withdrawal has already been made against this order. {0}")]
    WithdrawalConflict(String),
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InsufficientFunds(_) => StatusCode::PAYMENT_REQUIRED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::WithdrawalConflict(_) => StatusCode::CONFLICT,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
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
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("Access token signature is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token has expired.")]
    ExpiredToken,
    #[error("Could not issue an access token. {0}")]
    TokenGeneration(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::OrderBadNumber(_) => Self::InvalidOrderNumber(e.to_string()),
            OrderFlowError::OrderAlreadyAcceptedByAnotherUser(_) => Self::OrderConflict(e.to_string()),
            OrderFlowError::InsufficientBalance { .. } => Self::InsufficientFunds(e.to_string()),
            OrderFlowError::DoubleWithdrawal(_) => Self::WithdrawalConflict(e.to_string()),
            OrderFlowError::InvalidAmount(_) => Self::InvalidAmount(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::InvalidOrderNumber(e.to_string()),
            OrderFlowError::OrderAlreadyAcceptedByUser(_)
            | OrderFlowError::OrderAlreadyFinalized(_)
            | OrderFlowError::BalanceNotFound(_)
            | OrderFlowError::ArithmeticOverflow
            | OrderFlowError::QueueClosed
            | OrderFlowError::DatabaseError(_) => {
                error!("💻️ Order flow failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        error!("💻️ Account query failure. {e}");
        Self::BackendError(e.to_string())
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::LoginTaken(login) => Self::LoginTaken(login),
            AuthApiError::InvalidCredentials => Self::InvalidCredentials,
            AuthApiError::DatabaseError(_) | AuthApiError::PasswordHashError(_) => {
                error!("💻️ Authentication backend failure. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}
