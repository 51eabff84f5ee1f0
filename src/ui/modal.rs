//! Modal dialogs owned by a `ModalManager` instance.
//!
//! Confirm callbacks live inside the modal they belong to and run at most
//! once.

use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use super::html::escape_html;

/// Button configuration for a modal.
#[derive(Debug, Clone)]
pub struct ModalOptions {
    pub show_buttons: bool,
    pub cancel_text: String,
    pub confirm_text: String,
}

impl Default for ModalOptions {
    fn default() -> Self {
        Self {
            show_buttons: true,
            cancel_text: "Cancel".to_string(),
            confirm_text: "OK".to_string(),
        }
    }
}

type ConfirmCallback = Box<dyn FnOnce() + Send>;

/// A single modal dialog.
pub struct Modal {
    pub id: String,
    /// Escaped title.
    pub title: String,
    /// Body markup, inserted as given.
    pub content: String,
    pub options: ModalOptions,
    visible: bool,
    on_confirm: Option<ConfirmCallback>,
}

impl Modal {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether a confirm button is offered.
    pub fn has_confirm(&self) -> bool {
        self.options.show_buttons && self.on_confirm.is_some()
    }
}

impl std::fmt::Debug for Modal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modal")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("visible", &self.visible)
            .field("has_confirm", &self.on_confirm.is_some())
            .finish()
    }
}

/// Owns every modal on a page.
#[derive(Debug, Default)]
pub struct ModalManager {
    modals: HashMap<String, Modal>,
}

impl ModalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a hidden modal.
    pub fn create(
        &mut self,
        id: &str,
        title: &str,
        content: &str,
        options: ModalOptions,
    ) -> &Modal {
        let modal = Modal {
            id: id.to_string(),
            title: escape_html(title),
            content: content.to_string(),
            options,
            visible: false,
            on_confirm: None,
        };
        self.modals.insert(id.to_string(), modal);
        &self.modals[id]
    }

    pub fn get(&self, id: &str) -> Option<&Modal> {
        self.modals.get(id)
    }

    pub fn show(&mut self, id: &str) -> bool {
        self.set_visible(id, true)
    }

    pub fn hide(&mut self, id: &str) -> bool {
        self.set_visible(id, false)
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.modals.get_mut(id) {
            Some(modal) => {
                modal.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.modals.remove(id).is_some()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.modals.get(id).is_some_and(Modal::is_visible)
    }

    /// Open a confirmation dialog and return its id.
    ///
    /// `on_confirm` runs when the user accepts via [`Self::handle_confirm`].
    pub fn confirm(
        &mut self,
        title: &str,
        message: &str,
        on_confirm: impl FnOnce() + Send + 'static,
    ) -> String {
        let id = format!("confirm-{}", Uuid::new_v4());
        let content = format!("<p>{}</p>", escape_html(message));
        self.create(&id, title, &content, ModalOptions::default());
        if let Some(modal) = self.modals.get_mut(&id) {
            modal.on_confirm = Some(Box::new(on_confirm));
        }
        self.show(&id);
        id
    }

    /// Run the modal's confirm callback (once) and hide it.
    pub fn handle_confirm(&mut self, id: &str) -> bool {
        let Some(modal) = self.modals.get_mut(id) else {
            return false;
        };
        let callback = modal.on_confirm.take();
        modal.visible = false;
        match callback {
            Some(callback) => {
                debug!(modal_id = %id, "Running confirm callback");
                callback();
                true
            }
            None => false,
        }
    }

    /// Escape closes the modal.
    pub fn handle_key(&mut self, id: &str, key: &str) -> bool {
        key == "Escape" && self.hide(id)
    }

    /// Clicking the backdrop closes the modal.
    pub fn handle_backdrop_click(&mut self, id: &str) -> bool {
        self.hide(id)
    }
}
