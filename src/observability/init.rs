//! Subscriber setup: `tracing` macros → OpenTelemetry → JSON lines file.

use super::export;
use super::rotation::{RotatingFile, DEFAULT_MAX_BACKUPS};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const SERVICE_NAME: &str = "torrent-mirror";
pub const TRACE_FILE_NAME: &str = "torrent-mirror-spans.jsonl";

/// Installs the global subscriber and returns the trace file path.
///
/// `RUST_LOG` wins over `config.trace_level`, which defaults to `info`. The
/// trace file lives in [`config.data_dir`](crate::Config::data_dir) or the
/// platform data directory.
///
/// Tracing is optional: if no data directory can be determined or created,
/// or a subscriber is already installed, nothing happens and `None` is
/// returned.
///
/// # Example
///
/// ```rust
/// use torrent_mirror::observability::init_tracing;
/// use torrent_mirror::Config;
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     data_dir: Some(dir.path().to_path_buf()),
///     ..Config::default()
/// };
///
/// let trace_file = init_tracing(&config);
/// tracing::debug!("tracing is now active");
/// # let _ = trace_file;
/// ```
pub fn init_tracing(config: &Config) -> Option<PathBuf> {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let data_dir = config.data_dir.clone().or_else(crate::infrastructure::data_dir)?;
    std::fs::create_dir_all(&data_dir).ok()?;

    let writer = RotatingFile::new(
        data_dir.join(TRACE_FILE_NAME),
        config.trace_file_max_bytes,
        DEFAULT_MAX_BACKUPS,
    );
    let trace_file = writer.path().to_path_buf();
    let resource = Resource::new(vec![
        KeyValue::new("service.name", SERVICE_NAME),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = export::create_tracer_provider(writer, resource);

    let layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));
    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .ok()?;

    Some(trace_file)
}
