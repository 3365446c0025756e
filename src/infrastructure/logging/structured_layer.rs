//! Custom `tracing_subscriber::Layer` emitting the exact structured log
//! record shape required by `spec.md` §6, which the default
//! `tracing_subscriber::fmt::json` layout does not match:
//! `{host, full_message, timestamp, level, _details, logtest, printonly?}`.

use std::io::Write;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Numeric level codes from `spec.md` §6: `1=INFO, 2=DEBUG, 3=ERROR,
/// 4=CRITICAL`. `tracing` has no CRITICAL level. The original `LEVEL_MAP`
/// has no entry for `WARNING` either and falls back to its dict-get
/// default of 1; `WARN` is reproduced here the same way, folding into INFO.
fn level_code(level: &Level) -> u8 {
    match *level {
        Level::DEBUG | Level::TRACE => 2,
        Level::ERROR => 3,
        Level::INFO | Level::WARN => 1,
    }
}

#[derive(Default)]
struct RecordVisitor {
    full_message: Option<String>,
    logtest: Map<String, Value>,
    printonly: Option<Value>,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field.name(), Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field.name(), Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field.name(), Value::from(value));
    }
}

impl RecordVisitor {
    fn record(&mut self, name: &str, value: Value) {
        if name == "message" {
            self.full_message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else if let Some(key) = name.strip_prefix("logtest.") {
            self.logtest.insert(key.to_string(), value);
        } else if name == "printonly" {
            self.printonly = Some(value);
        }
    }
}

pub struct StructuredJsonLayer {
    host: String,
}

impl StructuredJsonLayer {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl<S: Subscriber> Layer<S> for StructuredJsonLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        let mut record = Map::new();
        record.insert("host".to_string(), Value::String(self.host.clone()));
        record.insert(
            "full_message".to_string(),
            Value::String(visitor.full_message.unwrap_or_default()),
        );
        record.insert("timestamp".to_string(), Value::from(timestamp));
        record.insert(
            "level".to_string(),
            Value::from(level_code(event.metadata().level())),
        );
        record.insert("_details".to_string(), Value::Object(Map::new()));
        record.insert("logtest".to_string(), Value::Object(visitor.logtest));
        if let Some(printonly) = visitor.printonly {
            record.insert("printonly".to_string(), printonly);
        }

        let line = Value::Object(record).to_string();
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "{line}");
    }
}
