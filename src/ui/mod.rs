//! Common page helpers: toasts, loading overlay, modals, validation, storage.

pub mod html;
pub mod loading;
pub mod modal;
pub mod notification;
pub mod storage;
pub mod util;
pub mod validation;

pub use html::escape_html;
pub use loading::{LoadingGuard, LoadingIndicator, LoadingOverlay};
pub use modal::{Modal, ModalManager, ModalOptions};
pub use notification::{NotificationCenter, Notifier, Severity, Toast};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageBackend};
pub use util::{Debouncer, format_date, format_time};
pub use validation::{FormValidation, Rule, validate, validate_form};
