pub mod api;
pub mod bulk;
pub mod config;
pub mod console;
pub mod context;
pub mod debounce;
pub mod error;
pub mod executor;
pub mod filters;
pub mod history;
pub mod models;
pub mod notify;
pub mod retry;
pub mod selection;
pub mod session;
pub mod view;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use api::{HttpTranslationApi, TranslationApi};
pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use session::{Activation, ReviewSession};

/// Lock a view-owned mutex. A panic while holding one leaves plain data
/// behind, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
