//! Execution environment
//!
//! [`EnvStore`] is a plain value: a fresh one (or one just [`reset`]) holds
//! only [`DEFAULT_ENV`]. [`SharedEnvStore`] is the process-wide handle; it
//! allows any number of readers but a single writing [`EnvSession`], and a
//! session always starts from a reset store so nothing leaks between
//! documents.
//!
//! [`reset`]: EnvStore::reset

use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Variables every execution starts with
pub const DEFAULT_ENV: &[(&str, &str)] = &[("PAGER", "cat"), ("GIT_PAGER", "cat")];

/// Map of variable name to value
pub type EnvMap = BTreeMap<String, String>;

/// Key/value execution environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvStore {
    vars: EnvMap,
}

impl EnvStore {
    /// Store seeded with [`DEFAULT_ENV`]
    #[must_use]
    pub fn new() -> Self {
        let mut store = Self::empty();
        store.reset();
        store
    }

    /// Store with no entries at all
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            vars: EnvMap::new(),
        }
    }

    /// Clear every entry and reseed the defaults
    pub fn reset(&mut self) {
        self.vars.clear();
        self.vars.extend(
            DEFAULT_ENV
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );
    }

    /// Set a variable, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.into(), value.into())
    }

    /// Value of a variable
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Remove a variable
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Variable names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Whether `key` is set
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Number of variables
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True when no variable is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Apply parsed env sources in order; later sources win per key
    pub fn load_sources<I, S>(&mut self, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = (String, String)>,
    {
        let mut loaded = 0usize;
        for source in sources {
            for (key, value) in source {
                self.vars.insert(key, value);
                loaded += 1;
            }
        }
        tracing::debug!("loaded {} env entries, store now holds {}", loaded, self.vars.len());
    }

    /// Apply a `KEY=VALUE` list
    pub fn extend_from_list<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vars.extend(convert_env_list(entries));
    }

    /// Copy of every variable
    #[must_use]
    pub fn snapshot(&self) -> EnvMap {
        self.vars.clone()
    }

    /// `KEY=VALUE` entries in sorted order
    #[must_use]
    pub fn to_env_list(&self) -> Vec<String> {
        self.vars.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl Default for EnvStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `KEY=VALUE` entries
///
/// Splits on the first `=`; an entry without `=` maps to an empty value.
/// Later entries override earlier ones.
#[must_use]
pub fn convert_env_list<I, S>(entries: I) -> EnvMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry.to_string(), String::new()),
            }
        })
        .collect()
}

/// Current process environment as `KEY=VALUE` entries
#[must_use]
pub fn process_environ() -> Vec<String> {
    std::env::vars_os()
        .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
        .collect()
}

/// Process-wide environment handle
///
/// Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct SharedEnvStore {
    inner: Arc<RwLock<EnvStore>>,
}

impl SharedEnvStore {
    /// Create handle over a default store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one variable
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().get(key).map(str::to_string)
    }

    /// Copy of the current store
    #[must_use]
    pub fn snapshot(&self) -> EnvStore {
        self.inner.read().clone()
    }

    /// Begin an execution session, blocking until no other session is open
    ///
    /// The store is reset before the session is handed out.
    #[must_use]
    pub fn session(&self) -> EnvSession<'_> {
        let mut guard = self.inner.write();
        guard.reset();
        tracing::debug!("env session opened");
        EnvSession { guard }
    }

    /// Begin a session if none is open
    #[must_use]
    pub fn try_session(&self) -> Option<EnvSession<'_>> {
        let mut guard = self.inner.try_write()?;
        guard.reset();
        Some(EnvSession { guard })
    }
}

/// Exclusive write access to a [`SharedEnvStore`]
pub struct EnvSession<'a> {
    guard: RwLockWriteGuard<'a, EnvStore>,
}

impl Deref for EnvSession<'_> {
    type Target = EnvStore;

    fn deref(&self) -> &EnvStore {
        &self.guard
    }
}

impl DerefMut for EnvSession<'_> {
    fn deref_mut(&mut self) -> &mut EnvStore {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_non_defaults() {
        let mut env = EnvStore::new();
        env.set("X", "1");
        env.set("PAGER", "less");
        env.reset();
        assert_eq!(env.get("X"), None);
        assert_eq!(env.get("PAGER"), Some("cat"));
    }

    #[test]
    fn later_sources_win() {
        let mut env = EnvStore::empty();
        let first = vec![("A".to_string(), "1".to_string()), ("B".to_string(), "1".to_string())];
        let second = vec![("B".to_string(), "2".to_string())];
        env.load_sources([first, second]);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), Some("2"));
    }

    #[test]
    fn env_list_split_on_first_equals() {
        let map = convert_env_list(["A=1", "B=x=y", "C", "D="]);
        assert_eq!(map.get("A").map(String::as_str), Some("1"));
        assert_eq!(map.get("B").map(String::as_str), Some("x=y"));
        assert_eq!(map.get("C").map(String::as_str), Some(""));
        assert_eq!(map.get("D").map(String::as_str), Some(""));
    }

    #[test]
    fn env_list_round_trip() {
        let mut env = EnvStore::empty();
        env.extend_from_list(["B=2", "A=1"]);
        assert_eq!(env.to_env_list(), ["A=1", "B=2"]);
    }

    #[test]
    fn session_starts_from_defaults() {
        let shared = SharedEnvStore::new();
        {
            let mut session = shared.session();
            session.set("LEAK", "yes");
        }
        assert_eq!(shared.get("LEAK").as_deref(), Some("yes"));

        let session = shared.session();
        assert_eq!(session.get("LEAK"), None);
        assert_eq!(session.get("GIT_PAGER"), Some("cat"));
    }

    #[test]
    fn single_writer() {
        let shared = SharedEnvStore::new();
        let _open = shared.session();
        assert!(shared.try_session().is_none());
    }

    #[test]
    fn process_environ_has_entries() {
        assert!(process_environ().iter().all(|e| e.contains('=')));
    }
}
