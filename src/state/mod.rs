//! State module for tracking crawl progress
//!
//! - `RequestState`: lifecycle of one crawl request (pending, in flight, succeeded, skipped)
//! - `RequestOutcome`: what a lane reports when it finishes a request

mod request_state;

pub use request_state::{RequestOutcome, RequestState};
