pub mod http;
pub mod time;

// Re-export main utilities
pub use http::{
    empty_body, file_body, full_body, get, head, http_status_is_ok, request, BoxError, HttpBody,
    ResponseData,
};
pub use time::{elapsed_secs, format_timestamp, utc_timestamp, TIMESTAMP_FORMAT};
