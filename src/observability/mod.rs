//! OpenTelemetry tracing with file export.
//!
//! ```text
//! tracing spans → tracing-opentelemetry → opentelemetry_sdk → JsonLinesExporter → RotatingFile
//! ```
//!
//! Every store mutation and derived view opens a `debug` span with counts and
//! hashes as fields, so a trace file at `debug` shows exactly which diffs,
//! snapshots and selection events reached the store and what they produced.
//!
//! The trace file rotates at `trace_file_max_bytes` (10 MiB by default) and
//! keeps three numbered backups.

mod export;
mod init;
mod rotation;

pub use init::{init_tracing, SERVICE_NAME, TRACE_FILE_NAME};
pub use rotation::DEFAULT_MAX_BYTES;
