use axum::{extract::multipart::MultipartError, http::StatusCode, response::IntoResponse};
use chemviz_core::ChemvizError;
use chemviz_database::HistoryError;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    code: StatusCode,
    message: Option<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let Some(msg) = self.message {
            (self.code, msg).into_response()
        } else {
            self.code.into_response()
        }
    }
}

impl From<StatusCode> for ApiError {
    fn from(code: StatusCode) -> Self {
        Self {
            code,
            message: None,
        }
    }
}

/// Problems with the uploaded file are the caller's fault, everything else is
/// ours.
impl From<ChemvizError> for ApiError {
    fn from(err: ChemvizError) -> Self {
        match err {
            ChemvizError::MalformedInput(_)
            | ChemvizError::MissingColumn(_)
            | ChemvizError::NonNumericColumn { .. }
            | ChemvizError::EmptyTable
            | ChemvizError::EmptyColumn(_) => Self::bad_request().message(err.to_string()),
            other => {
                error!("{other}");
                Self::server_error()
            }
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NotFound(_) => Self::not_found().message("Record not found"),
            other => {
                error!("{other}");
                Self::server_error()
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::from(err.status()).message(err.body_text())
    }
}

impl ApiError {
    /// Sets the message on the error.
    pub fn message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    pub fn bad_request() -> Self {
        Self::from(StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized() -> Self {
        Self::from(StatusCode::UNAUTHORIZED)
    }

    pub fn not_found() -> Self {
        Self::from(StatusCode::NOT_FOUND)
    }

    pub fn server_error() -> Self {
        Self::from(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
