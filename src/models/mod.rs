pub mod app_state;
pub mod directory;
pub mod game_state;
pub mod messages;
pub mod registry;

use std::sync::{Mutex, MutexGuard, PoisonError};

// Re-export important types
pub use app_state::AppState;
pub use messages::*;

/// Lock a mutex, carrying on with the inner value if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
