//! Public template listing: a pure reducer over the query state plus the async
//! driver that issues fetches and applies only the latest one.

mod controller;
mod state;

pub use controller::{ListingController, ListingSnapshot, DEFAULT_REQUEST_TIMEOUT};
pub use state::{FetchState, FetchTicket, ListingState, QueryState};
