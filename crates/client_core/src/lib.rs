//! Client-side core of the template console: login and public template listing
//! against the template API.

pub mod api;
pub mod error;
pub mod listing;
pub mod login;

pub use api::{HttpTemplateApi, TemplateApi};
pub use error::{AuthRequiredError, ListingError, LoginError, RequestFailedError, ValidationError};
pub use listing::{
    FetchState, ListingController, ListingSnapshot, ListingState, QueryState,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use login::{validate_email, CredentialFlow, LoginForm, LoginOutcome, Route};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
