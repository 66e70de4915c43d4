mod client;
mod target;

pub use client::{
    DEFAULT_UPLOAD_NAME, OutboundBody, UpstreamClient, basic_auth_header, outbound_file_name,
};
pub use target::Target;
