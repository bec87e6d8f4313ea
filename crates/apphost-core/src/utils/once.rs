use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, ThreadId};

/// Why [`InitOnce::get_or_try_init`] produced no value.
#[derive(Debug, PartialEq, Eq)]
pub enum InitError<E> {
    /// The initializer failed; the cell stays empty.
    Failed(E),
    /// The cell was asked for its value by its own initializer.
    Reentered,
}

impl<E: fmt::Display> fmt::Display for InitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::Failed(err) => err.fmt(f),
            InitError::Reentered => f.write_str("value requested by its own initializer"),
        }
    }
}

/// A cell written at most once by a fallible initializer.
///
/// Reads take the lock-free `OnceLock` path. Initialization is double-checked
/// behind a mutex, so concurrent first callers run the initializer exactly
/// once between them. A failed initializer leaves the cell empty and the next
/// caller tries again. An initializer that reaches back into the same cell
/// gets [`InitError::Reentered`] instead of blocking on itself.
#[derive(Debug)]
pub struct InitOnce<T> {
    value: OnceLock<T>,
    guard: Mutex<()>,
    initializer: Mutex<Option<ThreadId>>,
}

/// Clears the initializing thread when dropped, also on unwind.
struct Initializing<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for Initializing<'_> {
    fn drop(&mut self) {
        *lock(self.0) = None;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking initializer poisons the guard but never writes the cell.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> InitOnce<T> {
    /// Creates an empty cell. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
            guard: Mutex::new(()),
            initializer: Mutex::new(None),
        }
    }

    /// Returns the value if the cell has been initialized.
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Returns the value, running `init` first if the cell is empty.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<&T, InitError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let current = thread::current().id();
        if *lock(&self.initializer) == Some(current) {
            return Err(InitError::Reentered);
        }

        let _guard = lock(&self.guard);
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        *lock(&self.initializer) = Some(current);
        let _initializing = Initializing(&self.initializer);
        let value = init().map_err(InitError::Failed)?;
        Ok(self.value.get_or_init(|| value))
    }
}

impl<T> Default for InitOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}
