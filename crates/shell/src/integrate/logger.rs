//! Surfacing log events as toasts.
//!
//! Two seams are offered. Hosts with their own logging facade wrap it in a
//! [`ToastingLogger`]. Hosts that log through `tracing` install a
//! [`ToastLayer`] next to their other layers. Use one or the other, not both,
//! or every message is shown twice.

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::notify::{Notifier, Severity};

/// Info messages containing one of these words (any case) become toasts.
pub const COMPLETION_KEYWORDS: [&str; 5] = ["completed", "finished", "done", "success", "ready"];

/// Whether an info-level message is worth a toast.
#[must_use]
pub fn is_completion_message(message: &str) -> bool {
    let message = message.to_lowercase();
    COMPLETION_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// A host application's logging facade.
pub trait HostLogger: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
}

/// [`HostLogger`] writing to `tracing`.
///
/// Success messages are info events carrying `success = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl HostLogger for TracingLogger {
    fn success(&self, message: &str) {
        tracing::info!(success = true, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Decorates a [`HostLogger`] so each call also shows a toast.
///
/// The wrapped logger always runs first. Info calls only toast when
/// [`is_completion_message`] holds.
#[derive(Debug, Clone)]
pub struct ToastingLogger<L> {
    inner: L,
    notifier: Notifier,
}

impl<L: HostLogger> ToastingLogger<L> {
    pub const fn new(inner: L, notifier: Notifier) -> Self {
        Self { inner, notifier }
    }

    pub const fn inner(&self) -> &L {
        &self.inner
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: HostLogger> HostLogger for ToastingLogger<L> {
    fn success(&self, message: &str) {
        self.inner.success(message);
        self.notifier.show_success(message, None);
    }

    fn error(&self, message: &str) {
        self.inner.error(message);
        self.notifier.show_error(message, None);
    }

    fn warn(&self, message: &str) {
        self.inner.warn(message);
        self.notifier.show_warning(message, None);
    }

    fn info(&self, message: &str) {
        self.inner.info(message);
        if is_completion_message(message) {
            self.notifier.show_info(message, None);
        }
    }
}

/// `tracing` layer that shows toasts for `ERROR`, `WARN` and selected `INFO`
/// events.
///
/// An info event toasts as success when it carries `success = true`, and as
/// info when its message passes [`is_completion_message`].
#[derive(Debug, Clone)]
pub struct ToastLayer {
    notifier: Notifier,
}

impl ToastLayer {
    #[must_use]
    pub const fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    success: bool,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "success" {
            self.success = value;
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for ToastLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::INFO {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message.filter(|m| !m.is_empty()) else {
            return;
        };

        let severity = match level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            _ if visitor.success => Severity::Success,
            _ if is_completion_message(&message) => Severity::Info,
            _ => return,
        };
        self.notifier.show(&message, severity, None);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::document::Document;
    use crate::notify::TOAST_CLASS;

    #[derive(Default)]
    struct RecordingLogger {
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingLogger {
        fn calls(&self) -> Vec<(&'static str, String)> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, level: &'static str, message: &str) {
            self.calls.lock().unwrap().push((level, message.to_owned()));
        }
    }

    impl HostLogger for RecordingLogger {
        fn success(&self, message: &str) {
            self.push("success", message);
        }

        fn error(&self, message: &str) {
            self.push("error", message);
        }

        fn warn(&self, message: &str) {
            self.push("warn", message);
        }

        fn info(&self, message: &str) {
            self.push("info", message);
        }
    }

    fn toasts(doc: &Document, severity: Severity) -> usize {
        doc.find_by_class(&format!("{TOAST_CLASS}-{}", severity.as_str()))
            .len()
    }

    #[test]
    fn test_completion_keywords() {
        assert!(is_completion_message("Transcription completed"));
        assert!(is_completion_message("Upload DONE"));
        assert!(is_completion_message("Model is Ready"));
        assert!(!is_completion_message("Fetching page 3"));
    }

    #[test]
    fn test_toasting_logger_calls_through() {
        let doc = Document::new();
        let logger = ToastingLogger::new(RecordingLogger::default(), Notifier::new(doc.clone()));

        logger.success("Saved");
        logger.error("Upload failed");
        logger.warn("Quota almost used");
        logger.info("Fetching page 3");
        logger.info("Export finished");

        assert_eq!(logger.inner().calls().len(), 5);
        assert_eq!(toasts(&doc, Severity::Success), 1);
        assert_eq!(toasts(&doc, Severity::Error), 1);
        assert_eq!(toasts(&doc, Severity::Warning), 1);
        assert_eq!(toasts(&doc, Severity::Info), 1);
        assert!(doc.render().contains("Export finished"));
    }

    #[test]
    fn test_toast_layer_maps_levels() {
        let doc = Document::new();
        let subscriber =
            tracing_subscriber::registry().with(ToastLayer::new(Notifier::new(doc.clone())));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("Disk full");
            tracing::warn!(retries = 3, "Slow response");
            tracing::info!("Polling");
            tracing::info!("Sync completed");
            tracing::info!(success = true, "Profile saved");
            tracing::debug!("Cache miss, done");
            TracingLogger.success("Logged in");
        });

        assert_eq!(toasts(&doc, Severity::Error), 1);
        assert_eq!(toasts(&doc, Severity::Warning), 1);
        assert_eq!(toasts(&doc, Severity::Info), 1);
        assert_eq!(toasts(&doc, Severity::Success), 2);
        assert!(!doc.render().contains("Polling"));
    }
}
