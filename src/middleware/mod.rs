mod auth;
mod error_handler;

pub use auth::{GateDecision, LOGIN_PATH, decide, is_public_path, login_location, route_gate};
pub use error_handler::log_errors;
