pub mod error_dto;
pub mod redaction;

pub use redaction::{redact, REDACTED_KEY};
