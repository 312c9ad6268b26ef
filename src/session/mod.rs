//! Session handling
//!
//! Every caller interacts with the vault through a session. A session owns
//! its login state, lockout guard and cipher key.

pub mod manager;
pub mod state;

pub use manager::SessionManager;
pub use state::SessionState;
