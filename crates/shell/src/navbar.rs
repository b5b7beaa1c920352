//! Marketplace navigation bar.
//!
//! The bar is rendered once per [`create_navbar`] call and re-rendered in
//! place when its dropdown opens or closes. Clicks reach it through a
//! document-level listener owned by the [`Navbar`] value. Dropping the value
//! unregisters the listener; [`Navbar::unmount`] also removes the markup.

use std::sync::{Arc, Mutex, PoisonError};

use askama::Template;

use crate::auth::Auth;
use crate::document::{ClickEvent, Document, ListenerGuard, NodeId};

/// Class carried by every navbar node.
pub const NAVBAR_CLASS: &str = "marketplace-navbar";
/// Marketplace root, linked from the brand.
pub const HOME_HREF: &str = "/";
pub const PROFILE_HREF: &str = "/profile";
pub const REGISTER_HREF: &str = "/register";

type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// A custom entry in the bar's menu.
#[derive(Clone)]
pub struct MenuItem {
    pub label: String,
    pub href: String,
    pub icon: Option<String>,
    on_click: Option<ClickHandler>,
}

impl MenuItem {
    #[must_use]
    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            icon: None,
            on_click: None,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Handle clicks in-app instead of following `href`.
    #[must_use]
    pub fn on_click(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuItem")
            .field("label", &self.label)
            .field("href", &self.href)
            .field("icon", &self.icon)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

/// What activating a menu item did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuClick {
    /// The item's handler ran; no navigation.
    Intercepted,
    /// The item has no handler; the host should follow the link.
    Navigate(String),
}

/// Configuration consumed by [`create_navbar`].
#[derive(Debug, Clone)]
pub struct NavbarOptions {
    pub app_name: String,
    pub app_icon: Option<String>,
    pub menu_items: Vec<MenuItem>,
    pub container_id: String,
    pub show_home_link: bool,
    pub show_user_info: bool,
}

impl Default for NavbarOptions {
    fn default() -> Self {
        Self {
            app_name: "Application".to_owned(),
            app_icon: None,
            menu_items: Vec::new(),
            container_id: "navbar-container".to_owned(),
            show_home_link: true,
            show_user_info: true,
        }
    }
}

struct MenuItemView {
    label: String,
    href: String,
    icon: Option<String>,
    target: String,
}

#[derive(Template)]
#[template(path = "navbar.html")]
struct NavbarTemplate<'a> {
    show_home_link: bool,
    home_href: &'a str,
    app_name: &'a str,
    app_icon: Option<&'a str>,
    menu_items: Vec<MenuItemView>,
    show_user_info: bool,
    user_name: Option<&'a str>,
    dropdown_open: bool,
    toggle_target: String,
    dropdown_target: String,
    logout_target: String,
    profile_href: &'a str,
    login_href: String,
    register_href: &'a str,
}

/// Click targets of one navbar instance.
struct Targets {
    prefix: String,
}

impl Targets {
    fn new(node: NodeId) -> Self {
        Self {
            prefix: format!("navbar:{node}:"),
        }
    }

    fn toggle(&self) -> String {
        format!("{}toggle", self.prefix)
    }

    fn dropdown(&self) -> String {
        format!("{}dropdown", self.prefix)
    }

    fn logout(&self) -> String {
        format!("{}logout", self.prefix)
    }

    fn menu(&self, index: usize) -> String {
        format!("{}menu:{index}", self.prefix)
    }
}

struct Shared {
    node: NodeId,
    targets: Targets,
    options: NavbarOptions,
    /// Display name when signed in; `None` shows login/register links.
    user_name: Option<String>,
    login_href: String,
    auth: Auth,
    dropdown_open: Mutex<bool>,
}

impl Shared {
    fn is_open(&self) -> bool {
        *self
            .dropdown_open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_open(&self, document: &Document, open: bool) {
        {
            let mut current = self
                .dropdown_open
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *current == open {
                return;
            }
            *current = open;
        }
        document.set_html(self.node, self.render(open));
    }

    fn render(&self, dropdown_open: bool) -> String {
        let options = &self.options;
        NavbarTemplate {
            show_home_link: options.show_home_link,
            home_href: HOME_HREF,
            app_name: &options.app_name,
            app_icon: options.app_icon.as_deref(),
            menu_items: options
                .menu_items
                .iter()
                .enumerate()
                .map(|(index, item)| MenuItemView {
                    label: item.label.clone(),
                    href: item.href.clone(),
                    icon: item.icon.clone(),
                    target: self.targets.menu(index),
                })
                .collect(),
            show_user_info: options.show_user_info,
            user_name: self.user_name.as_deref(),
            dropdown_open,
            toggle_target: self.targets.toggle(),
            dropdown_target: self.targets.dropdown(),
            logout_target: self.targets.logout(),
            profile_href: PROFILE_HREF,
            login_href: self.login_href.clone(),
            register_href: REGISTER_HREF,
        }
        .render()
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Failed to render navbar");
            String::new()
        })
    }

    fn activate(&self, index: usize) -> Option<MenuClick> {
        let item = self.options.menu_items.get(index)?;
        Some(match &item.on_click {
            Some(handler) => {
                handler();
                MenuClick::Intercepted
            }
            None => MenuClick::Navigate(item.href.clone()),
        })
    }

    fn handle_click(&self, document: &Document, event: &ClickEvent) {
        let target = event.target.as_str();
        if target == self.targets.toggle() {
            self.set_open(document, !self.is_open());
        } else if target == self.targets.logout() {
            self.set_open(document, false);
            self.auth.logout();
        } else if target == self.targets.dropdown() {
            // Clicks inside the open dropdown keep it open.
        } else if let Some(index) = target
            .strip_prefix(&self.targets.prefix)
            .and_then(|rest| rest.strip_prefix("menu:"))
            .and_then(|raw| raw.parse::<usize>().ok())
        {
            self.set_open(document, false);
            self.activate(index);
        } else {
            self.set_open(document, false);
        }
    }
}

/// A mounted navigation bar.
pub struct Navbar {
    shared: Arc<Shared>,
    document: Document,
    _clicks: ListenerGuard,
}

/// Build a navigation bar and append it to `options.container_id`, creating
/// the container if needed.
///
/// Calling this twice for the same container mounts two bars.
pub fn create_navbar(document: &Document, auth: &Auth, options: NavbarOptions) -> Navbar {
    if document.ensure_container(&options.container_id) {
        tracing::debug!(container = %options.container_id, "Created navbar container");
    }

    let user_name = (options.show_user_info && auth.is_authenticated())
        .then(|| auth.user_info())
        .flatten()
        .map(|user| user.display_name().to_owned());

    let node = document.append(&options.container_id, NAVBAR_CLASS, String::new());
    let shared = Arc::new(Shared {
        node,
        targets: Targets::new(node),
        options,
        user_name,
        login_href: auth.login_url(None),
        auth: auth.clone(),
        dropdown_open: Mutex::new(false),
    });
    document.set_html(node, shared.render(false));

    let listener = Arc::clone(&shared);
    let clicks = document.add_click_listener(move |doc, event| listener.handle_click(doc, event));

    Navbar {
        shared,
        document: document.clone(),
        _clicks: clicks,
    }
}

impl Navbar {
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.shared.node
    }

    /// Current markup, or an empty string once unmounted.
    #[must_use]
    pub fn html(&self) -> String {
        self.document
            .node(self.shared.node)
            .map(|node| node.html)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.shared.user_name.is_some()
    }

    #[must_use]
    pub fn is_dropdown_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Click target of the user-name toggle.
    #[must_use]
    pub fn toggle_target(&self) -> String {
        self.shared.targets.toggle()
    }

    /// Click target of the open dropdown.
    #[must_use]
    pub fn dropdown_target(&self) -> String {
        self.shared.targets.dropdown()
    }

    /// Click target of the logout action.
    #[must_use]
    pub fn logout_target(&self) -> String {
        self.shared.targets.logout()
    }

    /// Click target of the menu item at `index`.
    #[must_use]
    pub fn menu_target(&self, index: usize) -> String {
        self.shared.targets.menu(index)
    }

    /// Open or close the user dropdown. No-op when signed out.
    pub fn toggle_user_menu(&self) {
        if self.is_signed_in() {
            self.shared
                .set_open(&self.document, !self.shared.is_open());
        }
    }

    /// Activate the menu item at `index`. `None` if there is no such item.
    pub fn activate_menu_item(&self, index: usize) -> Option<MenuClick> {
        self.shared.activate(index)
    }

    /// Remove the bar from the document and stop listening for clicks.
    pub fn unmount(self) {
        self.document.remove(self.shared.node);
    }
}

impl std::fmt::Debug for Navbar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navbar")
            .field("node", &self.shared.node)
            .field("app_name", &self.shared.options.app_name)
            .field("signed_in", &self.is_signed_in())
            .field("dropdown_open", &self.is_dropdown_open())
            .finish_non_exhaustive()
    }
}
