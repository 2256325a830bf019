pub mod auth;
pub mod model_loaders;

pub use auth::{RequestContext, require_admin, require_auth};
pub use model_loaders::{load_conversation_middleware, load_journal_middleware};
