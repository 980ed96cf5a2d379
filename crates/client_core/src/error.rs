use std::time::Duration;

use thiserror::Error;

/// Generic text used when the login endpoint fails without a message.
pub const LOGIN_FAILED: &str = "로그인 실패";
pub const LOGIN_REQUIRED: &str = "로그인이 필요합니다.";
pub const REQUEST_TIMED_OUT: &str = "요청 시간이 초과되었습니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("이메일을 입력해주세요.")]
    MissingEmail,
    #[error("유효한 이메일 형식이 아닙니다.")]
    MalformedEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("로그인이 필요합니다.")]
pub struct AuthRequiredError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailedError {
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
        retry_after: Option<Duration>,
    },
    #[error("{0}")]
    Transport(String),
    #[error("요청 시간이 초과되었습니다.")]
    Timeout,
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl RequestFailedError {
    /// Text suitable for the user: the server's message for HTTP failures,
    /// otherwise a description of what went wrong locally.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Transport(detail) | Self::Decode(detail) => Some(detail),
            Self::Timeout => Some(REQUEST_TIMED_OUT),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestFailedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("login request failed: {0}")]
    RequestFailed(#[from] RequestFailedError),
    #[error("login response did not include {0}")]
    MissingToken(&'static str),
    #[error("failed to persist session: {0:#}")]
    Session(anyhow::Error),
}

impl LoginError {
    /// Inline text shown next to the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::RequestFailed(err) => {
                format!("{LOGIN_FAILED}: {}", err.message().unwrap_or(LOGIN_FAILED))
            }
            Self::MissingToken(_) => format!("{LOGIN_FAILED}: 인증 토큰을 받지 못했습니다."),
            Self::Session(_) => format!("{LOGIN_FAILED}: 세션을 저장하지 못했습니다."),
        }
    }
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    AuthRequired(#[from] AuthRequiredError),
    #[error("template listing request failed: {0}")]
    RequestFailed(#[from] RequestFailedError),
    #[error("failed to read session: {0:#}")]
    Session(anyhow::Error),
}

impl ListingError {
    /// Text for the full-pane error state of the listing page.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired(_) => LOGIN_REQUIRED.to_string(),
            Self::RequestFailed(err) => match (err.message(), err.status()) {
                (Some(message), _) => message.to_string(),
                (None, Some(status)) => {
                    format!("공용 템플릿을 불러오지 못했습니다. (HTTP {status})")
                }
                (None, None) => "공용 템플릿을 불러오지 못했습니다.".to_string(),
            },
            Self::Session(_) => "세션 정보를 읽지 못했습니다.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_error_prefers_server_message() {
        let err = LoginError::from(RequestFailedError::Status {
            status: 401,
            message: Some("bad credentials".into()),
            retry_after: None,
        });
        assert_eq!(err.user_message(), "로그인 실패: bad credentials");
    }

    #[test]
    fn login_error_falls_back_to_generic_text() {
        let err = LoginError::from(RequestFailedError::Status {
            status: 500,
            message: None,
            retry_after: None,
        });
        assert_eq!(err.user_message(), "로그인 실패: 로그인 실패");
    }

    #[test]
    fn listing_error_describes_status_without_message() {
        let err = ListingError::from(RequestFailedError::Status {
            status: 503,
            message: None,
            retry_after: None,
        });
        assert_eq!(
            err.user_message(),
            "공용 템플릿을 불러오지 못했습니다. (HTTP 503)"
        );
        assert_eq!(
            ListingError::from(AuthRequiredError).user_message(),
            LOGIN_REQUIRED
        );
    }
}
