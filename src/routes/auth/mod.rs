mod handler;
mod model;

pub use handler::{callback, session_info, sign_out};
pub use model::SessionInfoResponse;
