//! Transient toast notifications.
//!
//! A toast lives through `mounted -> leaving -> detached`. Leaving is entered
//! by its auto-dismiss timer, a close click or [`Notifier::close_all`],
//! whichever comes first. Detaching happens [`EXIT_ANIMATION`] later so the
//! exit animation can finish. Late timers find the node gone and do nothing.

use std::sync::Arc;
use std::time::Duration;

use askama::Template;

use crate::document::{ClickEvent, Document, ListenerGuard, NodeId};

/// Id of the notification stylesheet.
pub const STYLE_ID: &str = "marketplace-notification-styles";
/// Container toasts are mounted in.
pub const CONTAINER_ID: &str = "marketplace-notifications";
/// Class carried by every toast node.
pub const TOAST_CLASS: &str = "marketplace-toast";
/// Class added when a toast starts its exit animation.
pub const LEAVING_CLASS: &str = "is-leaving";
/// Auto-dismiss delay used when none is given.
pub const DEFAULT_DURATION_MS: u64 = 5000;
/// Length of the exit animation.
pub const EXIT_ANIMATION: Duration = Duration::from_millis(300);

const CLOSE_TARGET_PREFIX: &str = "toast-close:";

const STYLES: &str = "\
#marketplace-notifications{position:fixed;top:16px;right:16px;z-index:10000;display:flex;flex-direction:column;gap:8px;max-width:360px}\
.marketplace-toast{display:flex;align-items:flex-start;gap:8px;padding:12px 16px;border-radius:6px;color:#fff;box-shadow:0 4px 12px rgba(0,0,0,.15);animation:marketplace-toast-in .3s ease-out}\
.marketplace-toast.is-leaving{animation:marketplace-toast-out .3s ease-in forwards}\
.marketplace-toast-success{background:#2e7d32}\
.marketplace-toast-error{background:#c62828}\
.marketplace-toast-info{background:#1565c0}\
.marketplace-toast-warning{background:#ef6c00}\
.marketplace-toast-message{flex:1}\
.marketplace-toast-close{background:none;border:0;color:inherit;cursor:pointer;font-size:18px;line-height:1}\
@keyframes marketplace-toast-in{from{transform:translateX(110%);opacity:0}to{transform:none;opacity:1}}\
@keyframes marketplace-toast-out{from{transform:none;opacity:1}to{transform:translateX(110%);opacity:0}}";

/// Toast category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }

    const fn icon(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}",
            Self::Error => "\u{2715}",
            Self::Info => "\u{2139}",
            Self::Warning => "\u{26a0}",
        }
    }
}

#[derive(Template)]
#[template(path = "toast.html")]
struct ToastTemplate<'a> {
    class: &'a str,
    icon: &'a str,
    message: &'a str,
    close_target: &'a str,
}

/// Shows toasts in a [`Document`].
///
/// Cheaply cloneable. Timers run on the ambient tokio runtime. Without one,
/// toasts are never auto-dismissed and closing detaches immediately.
#[derive(Clone)]
pub struct Notifier {
    document: Document,
    _close_clicks: Arc<ListenerGuard>,
}

impl Notifier {
    /// Attach to `document`. The stylesheet is injected on the first toast.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let guard = document.add_click_listener(|doc, event: &ClickEvent| {
            if let Some(raw) = event.target.strip_prefix(CLOSE_TARGET_PREFIX) {
                if let Ok(raw) = raw.parse::<u64>() {
                    dismiss(doc, NodeId::from_raw(raw));
                }
            }
        });
        Self {
            document,
            _close_clicks: Arc::new(guard),
        }
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Show a toast. `duration_ms` defaults to [`DEFAULT_DURATION_MS`];
    /// `Some(0)` keeps it until closed.
    pub fn show(&self, message: &str, severity: Severity, duration_ms: Option<u64>) -> Toast {
        self.document.inject_style(STYLE_ID, STYLES);
        self.document.ensure_container(CONTAINER_ID);

        let class = format!("{TOAST_CLASS} {TOAST_CLASS}-{}", severity.as_str());
        let id = self.document.append(CONTAINER_ID, &class, String::new());
        let close_target = close_target(id);
        let html = ToastTemplate {
            class: &class,
            icon: severity.icon(),
            message,
            close_target: &close_target,
        }
        .render()
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Failed to render toast");
            String::new()
        });
        self.document.set_html(id, html);

        let duration = duration_ms.unwrap_or(DEFAULT_DURATION_MS);
        if duration > 0 {
            let document = self.document.clone();
            let scheduled = spawn_after(Duration::from_millis(duration), move || {
                dismiss(&document, id);
            });
            if !scheduled {
                tracing::debug!("No async runtime; toast will stay until closed");
            }
        }

        tracing::trace!(toast = %id, severity = severity.as_str(), "Toast shown");
        Toast {
            id,
            document: self.document.clone(),
        }
    }

    pub fn show_success(&self, message: &str, duration_ms: Option<u64>) -> Toast {
        self.show(message, Severity::Success, duration_ms)
    }

    pub fn show_error(&self, message: &str, duration_ms: Option<u64>) -> Toast {
        self.show(message, Severity::Error, duration_ms)
    }

    pub fn show_info(&self, message: &str, duration_ms: Option<u64>) -> Toast {
        self.show(message, Severity::Info, duration_ms)
    }

    pub fn show_warning(&self, message: &str, duration_ms: Option<u64>) -> Toast {
        self.show(message, Severity::Warning, duration_ms)
    }

    /// Start dismissing every mounted toast.
    pub fn close_all(&self) {
        for node in self.document.nodes(CONTAINER_ID) {
            dismiss(&self.document, node.id);
        }
    }

    /// Toasts still mounted, including those mid-exit.
    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.document.nodes(CONTAINER_ID).len()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("mounted", &self.mounted_count())
            .finish_non_exhaustive()
    }
}

/// Handle to a shown toast.
#[derive(Debug, Clone)]
pub struct Toast {
    id: NodeId,
    document: Document,
}

impl Toast {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Click target of the close button.
    #[must_use]
    pub fn close_target(&self) -> String {
        close_target(self.id)
    }

    /// Start dismissing. Repeated calls are no-ops.
    pub fn close(&self) {
        dismiss(&self.document, self.id);
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.document.contains(self.id)
    }

    #[must_use]
    pub fn is_leaving(&self) -> bool {
        self.document
            .node(self.id)
            .is_some_and(|node| node.has_class(LEAVING_CLASS))
    }
}

fn close_target(id: NodeId) -> String {
    format!("{CLOSE_TARGET_PREFIX}{id}")
}

/// Begin the exit animation, then detach. No-op if already leaving or gone.
fn dismiss(document: &Document, id: NodeId) {
    let Some(node) = document.node(id) else {
        return;
    };
    if node.has_class(LEAVING_CLASS) {
        return;
    }
    document.set_class(id, &format!("{} {LEAVING_CLASS}", node.class));

    let detach = document.clone();
    if !spawn_after(EXIT_ANIMATION, move || {
        detach.remove(id);
    }) {
        document.remove(id);
    }
}

/// Run `f` after `delay` on the current runtime. Returns `false` if there is
/// no runtime to schedule on.
fn spawn_after(delay: Duration, f: impl FnOnce() + Send + 'static) -> bool {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return false;
    };
    handle.spawn(async move {
        tokio::time::sleep(delay).await;
        f();
    });
    true
}
