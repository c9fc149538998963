//! Application-wide shared state.

use std::fmt;
use std::sync::Arc;

use http::Extensions;

/// Typed values shared by every request of an application.
///
/// State is assembled once while building the application and is read-only
/// afterwards.
///
/// ```rust
/// use daedalus_core::State;
///
/// #[derive(Clone)]
/// struct DbUrl(&'static str);
///
/// let state = State::new().with(DbUrl("postgres://localhost/app"));
/// assert_eq!(state.get::<DbUrl>().unwrap().0, "postgres://localhost/app");
/// assert!(state.get::<u32>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct State {
    values: Arc<Extensions>,
}

impl State {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing any previous value of the same type.
    #[must_use]
    pub fn with<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.values).insert(value);
        self
    }

    /// Returns the value of type `T`, if present.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values.get::<T>()
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State").field("len", &self.len()).finish()
    }
}
