//! A poison-recovering `Mutex` wrapper.
//!
//! A panic while a lock is held (e.g. inside an event subscriber callback)
//! should not permanently wedge a session's store entry or connection
//! state; recovering the poisoned guard and carrying on is preferable to
//! propagating the poison to every future caller.

/// A `std::sync::Mutex` that recovers from poisoning instead of panicking
/// on lock.
pub struct Mutex<T>(std::sync::Mutex<T>);

impl<T> Mutex<T> {
    /// Creates a new mutex wrapping `value`.
    pub const fn new(value: T) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    /// Locks the mutex, recovering the inner value even if a previous
    /// holder panicked while holding the lock.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
