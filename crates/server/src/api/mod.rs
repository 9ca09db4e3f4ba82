pub mod cache;
pub mod error;
pub mod genres;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod titles;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
