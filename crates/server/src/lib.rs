pub mod error;
pub mod file_logging;
pub mod middleware;
pub mod routes;
pub mod state;

pub use state::AppState;
