//! A small, rendering-neutral mount tree.
//!
//! Components mount HTML fragments as keyed [`Node`]s inside named containers,
//! register stylesheets once by id, and listen for document-level clicks. The
//! host decides how the tree reaches the screen (`render` produces markup).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Identity of a mounted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Rebuild an id from a value previously returned by [`Self::get`].
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A mounted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub class: String,
    pub html: String,
}

impl Node {
    /// Whether the whitespace-separated class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|c| c == class)
    }
}

/// A click somewhere in the document.
///
/// `target` is the action key of the clicked element (its `data-target`), or
/// any other string for clicks outside interactive elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: String,
}

impl ClickEvent {
    #[must_use]
    pub fn on(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

type Listener = Arc<dyn Fn(&Document, &ClickEvent) + Send + Sync>;

#[derive(Debug)]
struct Container {
    id: String,
    nodes: Vec<Node>,
}

#[derive(Default)]
struct Inner {
    styles: Vec<(String, String)>,
    containers: Vec<Container>,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn container_mut(&mut self, id: &str) -> &mut Container {
        let index = match self.containers.iter().position(|c| c.id == id) {
            Some(index) => index,
            None => {
                self.containers.push(Container {
                    id: id.to_owned(),
                    nodes: Vec::new(),
                });
                self.containers.len() - 1
            }
        };
        &mut self.containers[index]
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.containers
            .iter_mut()
            .flat_map(|c| c.nodes.iter_mut())
            .find(|n| n.id == id)
    }
}

/// Shared mount tree. Clones refer to the same document.
#[derive(Clone, Default)]
pub struct Document {
    inner: Arc<Mutex<Inner>>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a stylesheet under `id`. Returns `false` if one already exists.
    pub fn inject_style(&self, id: &str, css: &str) -> bool {
        let mut inner = self.lock();
        if inner.styles.iter().any(|(existing, _)| existing == id) {
            return false;
        }
        inner.styles.push((id.to_owned(), css.to_owned()));
        true
    }

    #[must_use]
    pub fn has_style(&self, id: &str) -> bool {
        self.lock().styles.iter().any(|(existing, _)| existing == id)
    }

    #[must_use]
    pub fn style_count(&self) -> usize {
        self.lock().styles.len()
    }

    /// Find or create the container `id`. Returns `true` if it was created.
    pub fn ensure_container(&self, id: &str) -> bool {
        let mut inner = self.lock();
        if inner.containers.iter().any(|c| c.id == id) {
            return false;
        }
        inner.container_mut(id);
        true
    }

    #[must_use]
    pub fn has_container(&self, id: &str) -> bool {
        self.lock().containers.iter().any(|c| c.id == id)
    }

    /// Mount a fragment at the end of `container` (created if missing).
    pub fn append(&self, container: &str, class: &str, html: String) -> NodeId {
        let mut inner = self.lock();
        let id = NodeId(inner.next_id());
        inner.container_mut(container).nodes.push(Node {
            id,
            class: class.to_owned(),
            html,
        });
        id
    }

    /// Replace a node's class list. Returns `false` if the node is detached.
    pub fn set_class(&self, id: NodeId, class: &str) -> bool {
        self.lock().node_mut(id).is_some_and(|node| {
            class.clone_into(&mut node.class);
            true
        })
    }

    /// Replace a node's markup. Returns `false` if the node is detached.
    pub fn set_html(&self, id: NodeId, html: String) -> bool {
        self.lock().node_mut(id).is_some_and(|node| {
            node.html = html;
            true
        })
    }

    /// Detach a node. Returns `false` if it was already gone.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut inner = self.lock();
        for container in &mut inner.containers {
            if let Some(pos) = container.nodes.iter().position(|n| n.id == id) {
                container.nodes.remove(pos);
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.lock().node_mut(id).map(|n| n.clone())
    }

    /// Nodes mounted in `container`, in order.
    #[must_use]
    pub fn nodes(&self, container: &str) -> Vec<Node> {
        self.lock()
            .containers
            .iter()
            .find(|c| c.id == container)
            .map(|c| c.nodes.clone())
            .unwrap_or_default()
    }

    /// Every mounted node carrying `class`.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<Node> {
        self.lock()
            .containers
            .iter()
            .flat_map(|c| c.nodes.iter())
            .filter(|n| n.has_class(class))
            .cloned()
            .collect()
    }

    /// Listen for document-level clicks until the guard is dropped.
    pub fn add_click_listener(
        &self,
        listener: impl Fn(&Self, &ClickEvent) + Send + Sync + 'static,
    ) -> ListenerGuard {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.listeners.push((id, Arc::new(listener)));
        ListenerGuard {
            document: Arc::downgrade(&self.inner),
            id,
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Deliver a click to every listener.
    pub fn click(&self, event: &ClickEvent) {
        // Listeners mutate the document, so call them without holding the lock.
        let listeners: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(self, event);
        }
    }

    /// Markup for the whole document: stylesheets, then containers in
    /// creation order.
    #[must_use]
    pub fn render(&self) -> String {
        let inner = self.lock();
        let mut out = String::new();
        for (id, css) in &inner.styles {
            out.push_str(&format!("<style id=\"{id}\">{css}</style>\n"));
        }
        for container in &inner.containers {
            out.push_str(&format!("<div id=\"{}\">", container.id));
            for node in &container.nodes {
                out.push_str(&node.html);
            }
            out.push_str("</div>\n");
        }
        out
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Document")
            .field("styles", &inner.styles.len())
            .field("containers", &inner.containers)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

/// Keeps a click listener registered. Dropping it unregisters the listener.
#[derive(Debug)]
pub struct ListenerGuard {
    document: Weak<Mutex<Inner>>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.document.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_inject_style_is_idempotent() {
        let doc = Document::new();
        assert!(doc.inject_style("toast-css", "a{}"));
        assert!(!doc.inject_style("toast-css", "b{}"));
        assert_eq!(doc.style_count(), 1);
        assert!(doc.render().contains("a{}"));
    }

    #[test]
    fn test_append_update_remove() {
        let doc = Document::new();
        assert!(doc.ensure_container("main"));
        assert!(!doc.ensure_container("main"));

        let a = doc.append("main", "card", "<p>a</p>".to_owned());
        let b = doc.append("main", "card wide", "<p>b</p>".to_owned());
        assert_eq!(doc.nodes("main").len(), 2);
        assert_eq!(doc.find_by_class("wide").len(), 1);

        assert!(doc.set_class(a, "card wide"));
        assert_eq!(doc.find_by_class("wide").len(), 2);

        assert!(doc.remove(a));
        assert!(!doc.remove(a));
        assert!(!doc.set_html(a, String::new()));
        assert!(doc.contains(b));
        assert_eq!(doc.render(), "<div id=\"main\"><p>b</p></div>\n");
    }

    #[test]
    fn test_listener_guard_unregisters() {
        let doc = Document::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        let guard = doc.add_click_listener(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        doc.click(&ClickEvent::on("body"));
        assert_eq!(doc.listener_count(), 1);

        drop(guard);
        doc.click(&ClickEvent::on("body"));
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_mutate_document() {
        let doc = Document::new();
        let node = doc.append("main", "x", String::new());
        let _guard = doc.add_click_listener(move |doc, _| {
            doc.remove(node);
        });
        doc.click(&ClickEvent::on("anywhere"));
        assert!(!doc.contains(node));
    }
}
