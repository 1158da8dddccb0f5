pub mod router;
pub mod state;
pub mod error;
pub mod extract;
pub mod auth_handlers;
pub mod user_handlers;
pub mod middleware;

pub use error::ApiError;
pub use state::AppState;
