mod file;

pub use file::{AuditError, Level, RequestLog};
