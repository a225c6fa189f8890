//! OpenTelemetry span exporter that appends one JSON object per span.
//!
//! Each finished span becomes a single line in the trace file, in a flattened
//! form of the OTLP span model: hex ids, nanosecond timestamps, attributes as
//! a key → value object. Lines are self-contained so the file can be tailed
//! or filtered with line tools.

use super::rotation::RotatingFile;
use futures_util::future::BoxFuture;
use opentelemetry::trace::{SpanId, SpanKind, Status, TraceError};
use opentelemetry::{KeyValue, Value};
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::trace::TracerProvider;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

type Attributes = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpanRecord {
    trace_id: String,
    span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_span_id: Option<String>,
    name: String,
    kind: &'static str,
    start_time_unix_nano: u128,
    end_time_unix_nano: u128,
    resource: Attributes,
    attributes: Attributes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<EventRecord>,
    status: StatusRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    name: String,
    time_unix_nano: u128,
    attributes: Attributes,
}

#[derive(Debug, Serialize)]
struct StatusRecord {
    code: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
}

fn unix_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0)
}

fn attribute_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I64(i) => serde_json::Value::from(*i),
        Value::F64(f) => serde_json::Value::from(*f),
        Value::String(s) => serde_json::Value::String(s.as_str().to_string()),
        Value::Array(_) => serde_json::Value::String(value.to_string()),
    }
}

fn attributes<'a>(pairs: impl IntoIterator<Item = &'a KeyValue>) -> Attributes {
    pairs
        .into_iter()
        .map(|kv| (kv.key.to_string(), attribute_value(&kv.value)))
        .collect()
}

const fn kind_name(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Internal => "internal",
        SpanKind::Server => "server",
        SpanKind::Client => "client",
        SpanKind::Producer => "producer",
        SpanKind::Consumer => "consumer",
    }
}

fn status_record(status: &Status) -> StatusRecord {
    match status {
        Status::Unset => StatusRecord {
            code: "unset",
            message: String::new(),
        },
        Status::Ok => StatusRecord {
            code: "ok",
            message: String::new(),
        },
        Status::Error { description } => StatusRecord {
            code: "error",
            message: description.to_string(),
        },
    }
}

fn span_record(span: &SpanData, resource: &Attributes) -> SpanRecord {
    SpanRecord {
        trace_id: format!("{:032x}", span.span_context.trace_id()),
        span_id: format!("{:016x}", span.span_context.span_id()),
        parent_span_id: (span.parent_span_id != SpanId::INVALID).then(|| format!("{:016x}", span.parent_span_id)),
        name: span.name.to_string(),
        kind: kind_name(&span.span_kind),
        start_time_unix_nano: unix_nanos(span.start_time),
        end_time_unix_nano: unix_nanos(span.end_time),
        resource: resource.clone(),
        attributes: attributes(&span.attributes),
        events: span
            .events
            .iter()
            .map(|event| EventRecord {
                name: event.name.to_string(),
                time_unix_nano: unix_nanos(event.timestamp),
                attributes: attributes(&event.attributes),
            })
            .collect(),
        status: status_record(&span.status),
    }
}

/// Span exporter writing to a [`RotatingFile`].
pub struct JsonLinesExporter {
    file: RotatingFile,
    resource: Attributes,
    is_shutdown: AtomicBool,
}

impl JsonLinesExporter {
    pub fn new(file: RotatingFile, resource: &Resource) -> Self {
        Self {
            file,
            resource: resource
                .iter()
                .map(|(key, value)| (key.to_string(), attribute_value(value)))
                .collect(),
            is_shutdown: AtomicBool::new(false),
        }
    }

    fn write_batch(&self, batch: &[SpanData]) -> ExportResult {
        for span in batch {
            let line = serde_json::to_string(&span_record(span, &self.resource))
                .map_err(|e| TraceError::from(e.to_string()))?;
            self.file
                .append_line(&line)
                .map_err(|e| TraceError::from(e.to_string()))?;
        }
        Ok(())
    }
}

impl SpanExporter for JsonLinesExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        let result = if self.is_shutdown.load(Ordering::SeqCst) {
            Err(TraceError::from("trace exporter is shut down"))
        } else {
            self.write_batch(&batch)
        };
        Box::pin(std::future::ready(result))
    }

    fn shutdown(&mut self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.resource = resource
            .iter()
            .map(|(key, value)| (key.to_string(), attribute_value(value)))
            .collect();
    }
}

impl std::fmt::Debug for JsonLinesExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesExporter")
            .field("file", &self.file)
            .field("is_shutdown", &self.is_shutdown)
            .finish_non_exhaustive()
    }
}

/// Builds a tracer provider that exports every finished span immediately.
pub fn create_tracer_provider(file: RotatingFile, resource: Resource) -> TracerProvider {
    let exporter = JsonLinesExporter::new(file, &resource);

    TracerProvider::builder()
        .with_config(opentelemetry_sdk::trace::Config::default().with_resource(resource))
        .with_simple_exporter(exporter)
        .build()
}
