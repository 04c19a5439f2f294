pub mod response;
pub mod routes;

pub use response::{ApiError, ApiResponse, Envelope};
pub use routes::{proof_to_data, router, AppState, RegisterUserRequest, Timestamp};
