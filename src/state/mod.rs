//! State module for tracking crawl request progress
//!
//! # Components
//!
//! - `RequestStatus`: the lifecycle of a crawl request
//!   (queued, processing, then completed or failed)

mod request_status;

pub use request_status::RequestStatus;
