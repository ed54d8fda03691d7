//! # Census Collector
//!
//! The HTTP service volunteers report to. It accepts one record per
//! `POST /api/v1/stats`, stamps it with the server's clock and passes it to
//! the configured sink. Nothing is kept between requests.

#[macro_use]
extern crate tracing;

pub mod error;
pub mod router;
pub mod server;
mod stats;

pub use error::AppError;
pub use router::{
    create_router,
    AppState,
};
pub use server::serve;
