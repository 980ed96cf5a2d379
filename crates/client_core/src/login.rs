//! Credential submission: validate, request, persist, then hand the caller a
//! route to navigate to. Each stage is a separate function so it can be driven
//! on its own.

use std::{fmt, sync::Arc, sync::LazyLock};

use regex::Regex;
use shared::{
    domain::UserRole,
    protocol::{LoginRequest, LoginResponse},
};
use storage::{save_session, Session, SessionStore};
use tracing::{debug, info, warn};

use crate::{
    api::TemplateApi,
    error::{LoginError, ValidationError},
};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::MalformedEmail);
    }
    Ok(())
}

/// `a***@example.com`, for log lines.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldError {
    pub has_error: bool,
    pub message: String,
}

impl FieldError {
    fn from_validation(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::default(),
            Err(err) => Self {
                has_error: true,
                message: err.to_string(),
            },
        }
    }
}

#[derive(Clone, Default)]
pub struct LoginForm {
    email: String,
    password: String,
    email_error: FieldError,
}

impl LoginForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the email and re-validates it, like typing into the field.
    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_error = FieldError::from_validation(validate_email(&self.email));
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn email_error(&self) -> &FieldError {
        &self.email_error
    }

    pub fn can_submit(&self) -> bool {
        !self.email_error.has_error
    }

    fn validate(&mut self) -> Result<(), ValidationError> {
        let result = validate_email(&self.email);
        self.email_error = FieldError::from_validation(result);
        result
    }

    fn credentials(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("email_error", &self.email_error)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    PublicTemplates,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::PublicTemplates => "/publicTemplate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub route: Route,
    pub role: Option<UserRole>,
    pub user_name: Option<String>,
}

/// Turns a successful login body into the session to persist. Both tokens are
/// required; nothing is persisted from a partial body.
pub fn session_from_response(
    response: LoginResponse,
) -> Result<(Session, Option<String>), LoginError> {
    let access_token = response
        .token
        .filter(|token| !token.is_empty())
        .ok_or(LoginError::MissingToken("token"))?;
    let refresh_token = response
        .refresh_token
        .filter(|token| !token.is_empty())
        .ok_or(LoginError::MissingToken("refreshToken"))?;

    Ok((
        Session {
            access_token,
            refresh_token,
            user_role: response.user_role,
        },
        response.user_name,
    ))
}

pub struct CredentialFlow {
    api: Arc<dyn TemplateApi>,
    store: Arc<dyn SessionStore>,
}

impl CredentialFlow {
    pub fn new(api: Arc<dyn TemplateApi>, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    pub async fn submit(&self, form: &mut LoginForm) -> Result<LoginOutcome, LoginError> {
        if let Err(err) = form.validate() {
            debug!("login: validation failed reason={err}");
            return Err(err.into());
        }

        let email = mask_email(form.email());
        let response = match self.request(&form.credentials()).await {
            Ok(response) => response,
            Err(err) => {
                warn!("login: rejected email={email} error={err}");
                return Err(err);
            }
        };
        let (session, user_name) = session_from_response(response)?;
        self.persist(&session).await?;

        info!(
            "login: authenticated email={email} role={}",
            session
                .user_role
                .as_ref()
                .map(UserRole::as_str)
                .unwrap_or("-")
        );

        Ok(LoginOutcome {
            route: Route::PublicTemplates,
            role: session.user_role,
            user_name,
        })
    }

    pub async fn request(&self, request: &LoginRequest) -> Result<LoginResponse, LoginError> {
        Ok(self.api.login(request).await?)
    }

    pub async fn persist(&self, session: &Session) -> Result<(), LoginError> {
        save_session(self.store.as_ref(), session)
            .await
            .map_err(LoginError::Session)
    }
}

#[cfg(test)]
#[path = "tests/login_tests.rs"]
mod tests;
