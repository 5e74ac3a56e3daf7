// ==========================================
// Asset inventory - application layer
// ==========================================
// Session state, command responses, auto-import poller
// ==========================================

pub mod commands;
pub mod poller;
pub mod state;

pub use commands::{error_code, CommandResponse};
pub use poller::{poll_once, PollerHandle};
pub use state::{get_default_db_path, AppState};
