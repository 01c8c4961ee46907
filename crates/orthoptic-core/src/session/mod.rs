mod store;
mod token;

pub use store::{Session, SessionStore};
pub use token::{token_state, SessionStatus, TokenLifecycle, TokenState};
