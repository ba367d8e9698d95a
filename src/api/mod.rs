pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, FETCH_FAILED_MESSAGE};
pub use handlers::{AppState, ErrorResponse, SuccessResponse};
pub use routes::create_api_router;
