use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::envelope::Envelope;
use crate::level::Level;
use crate::logger::Logger;
use crate::value::{Context, ContextValue, ExceptionRecord};

/// Target prefix of this crate's own events.
const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `tracing_subscriber` layer that turns events into logging hub
/// envelopes and ships them from a background task.
///
/// The envelope is built on the emitting thread so it carries the event's
/// own timestamp; delivery happens on a Tokio task fed by an unbounded
/// channel. Each event gets exactly one delivery attempt; failures are
/// counted and reported through `tracing` under this crate's target,
/// which the layer itself ignores.
pub struct HubLayer {
    logger: Arc<Logger>,
    sender: mpsc::UnboundedSender<Envelope>,
    min_level: tracing::Level,
    ignored_targets: Vec<String>,
    /// Total events seen by the layer (before filtering).
    pub total_events: Arc<AtomicU64>,
    /// Envelopes accepted by the client.
    pub sent_events: Arc<AtomicU64>,
    /// Envelopes the client failed to deliver.
    pub failed_events: Arc<AtomicU64>,
}

impl HubLayer {
    /// Create a new layer and spawn the delivery task.
    ///
    /// `ignored_targets` are prefixes skipped in addition to this crate's
    /// own target, which is never shipped.
    ///
    /// Must be called from within a Tokio runtime. The task ends once the
    /// layer (and with it the channel sender) is dropped and the queue is
    /// drained.
    pub fn new(
        logger: Arc<Logger>,
        min_level: tracing::Level,
        ignored_targets: Vec<String>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();

        let total_events = Arc::new(AtomicU64::new(0));
        let sent_events = Arc::new(AtomicU64::new(0));
        let failed_events = Arc::new(AtomicU64::new(0));

        let sent_events_bg = Arc::clone(&sent_events);
        let failed_events_bg = Arc::clone(&failed_events);

        let logger_bg = Arc::clone(&logger);
        let handle = tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                match logger_bg.transmit(&envelope).await {
                    Ok(()) => {
                        sent_events_bg.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        failed_events_bg.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "failed to ship log envelope");
                    }
                }
            }
        });

        (
            Self {
                logger,
                sender: tx,
                min_level,
                ignored_targets,
                total_events,
                sent_events,
                failed_events,
            },
            handle,
        )
    }

    /// Events from this crate are dropped whatever `ignored_targets` holds.
    fn is_ignored(&self, target: &str) -> bool {
        is_own_target(target) || self.ignored_targets.iter().any(|t| target.starts_with(t.as_str()))
    }

    fn build_envelope(&self, event: &Event<'_>) -> Envelope {
        let mut context = Context::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { context: &mut context, message: &mut message };
        event.record(&mut visitor);

        let meta = event.metadata();
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            context.insert("@logPoint", format!("{file}:{line}"));
        }

        self.logger.prepare(Level::from(*meta.level()), message.unwrap_or_default(), context)
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

impl<S> Layer<S> for HubLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        // tracing orders levels by verbosity: ERROR < TRACE.
        if *meta.level() > self.min_level || self.is_ignored(meta.target()) {
            return;
        }

        let envelope = self.build_envelope(event);
        if self.sender.send(envelope).is_err() {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Collects event fields into a log [`Context`].
pub struct FieldVisitor<'a> {
    pub context: &'a mut Context,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.context.insert(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.context.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.context.insert(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.context.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.context.insert(field.name(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.context
            .insert(field.name(), ContextValue::Exception(ExceptionRecord::capture_dyn(value)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.context.insert(field.name(), format!("{:?}", value));
        }
    }
}
