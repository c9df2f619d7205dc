use std::{collections::BTreeMap, time::SystemTime};

use crate::logging::{EventSpan, LogEvent, LogHttpRequest};
use tracing::{info, warn, Level};
use tracing_subscriber::Layer;

/// Collects the structured `event` and `request` fields logged inside INFO
/// spans into an `EventSpan` tree and emits a single log entry per root span.
#[derive(Default)]
pub struct AstraLogsLayer {
    pub prod: bool,
    pub log_type: &'static str,
}

impl<S> Layer<S> for AstraLogsLayer
where
    S: tracing::Subscriber,
    S: for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        _attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let span = match ctx.span(id) {
            Some(span) => span,
            None => return,
        };
        if *span.metadata().level() > Level::INFO {
            return;
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(EventSpan::new(span.name()));
        extensions.insert(StartTime(SystemTime::now()));
    }

    fn on_close(&self, id: tracing::span::Id, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let span = match ctx.span(&id) {
            Some(span) => span,
            None => return,
        };
        if *span.metadata().level() > Level::INFO {
            return;
        }

        let mut extensions = span.extensions_mut();
        if let Some(mut event_span) = extensions.remove::<EventSpan>() {
            event_span.latency = match extensions.remove::<StartTime>() {
                Some(start) => match SystemTime::now().duration_since(start.0) {
                    Ok(elapsed) => elapsed.as_millis() as u64,
                    Err(_) => 0,
                },
                None => 0,
            };

            match span.scope().nth(1) {
                Some(parent) => {
                    let mut extensions = parent.extensions_mut();
                    if let Some(parent_event_span) = extensions.get_mut::<EventSpan>() {
                        parent_event_span.children.push(event_span);
                    }
                }
                None => {
                    drop(extensions);
                    if event_span.is_empty() {
                        return;
                    }
                    let encoded = match self.prod {
                        true => serde_json::to_string(&event_span),
                        false => serde_json::to_string_pretty(&event_span),
                    };
                    match encoded {
                        Ok(entry) => match self.prod {
                            true => info!(
                                labels.log_type = &self.log_type,
                                labels.handler = span.name(),
                                entry = entry.as_str(),
                                "'{}' log entry",
                                span.name()
                            ),
                            false => info!("'{}' log entry ==> {entry}", span.name()),
                        },
                        Err(e) => warn!("Failed to encode '{}' log entry: {e}", span.name()),
                    }
                }
            }
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        if let Some(scope) = ctx.event_scope(event) {
            if let Some(span) = scope.into_iter().next() {
                let mut extensions = span.extensions_mut();
                if let Some(event_span) = extensions.get_mut::<EventSpan>() {
                    let collector = FieldCollector::new(event);
                    if let Some(encoded) = collector.fields.get("event") {
                        if let Ok(log) = serde_json::from_str::<LogEvent>(encoded) {
                            event_span.events.push(log);
                        }
                    } else if let Some(encoded) = collector.fields.get("request") {
                        if let Ok(log) = serde_json::from_str::<LogHttpRequest>(encoded) {
                            event_span.request = Some(log);
                        }
                    }
                }
            }
        }
    }
}

struct StartTime(SystemTime);

/// Collects the string fields of an event.
struct FieldCollector {
    fields: BTreeMap<&'static str, String>,
}

impl FieldCollector {
    fn new(event: &tracing::Event<'_>) -> Self {
        let mut collector = FieldCollector {
            fields: BTreeMap::new(),
        };
        event.record(&mut collector);
        collector
    }
}

impl tracing::field::Visit for FieldCollector {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name(), value.to_owned());
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}
