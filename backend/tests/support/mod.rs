//! Environment helpers for tests that exercise repository selection.

use std::sync::{Mutex, PoisonError};

/// Variables read by `RepositoryType::from_env` and `PostgresConfig::from_env`.
pub const REPOSITORY_ENV_KEYS: &[&str] = &["REPOSITORY_TYPE", "DATABASE_URL", "PG_DATABASE_URL"];

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Run `f` with the process environment adjusted by `changes`.
///
/// `Some(v)` sets a variable and `None` removes it. Repository selection keys
/// that `changes` does not mention are removed too, so a `DATABASE_URL` from
/// the developer's shell never leaks into a test. Everything is restored
/// afterwards, also when `f` panics. Callers are serialized; a lock poisoned
/// by an earlier failing test is taken over since the guard restores state.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let _restore = EnvSnapshot::apply(changes);
    f()
}

struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}

impl EnvSnapshot {
    fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let mut keys: Vec<&str> = REPOSITORY_ENV_KEYS.to_vec();
        keys.extend(changes.iter().map(|(key, _)| *key));
        keys.sort_unstable();
        keys.dedup();

        let saved = keys
            .iter()
            .map(|key| (key.to_string(), std::env::var(key).ok()))
            .collect();

        for key in REPOSITORY_ENV_KEYS {
            if !changes.iter().any(|(changed, _)| changed == key) {
                std::env::remove_var(key);
            }
        }
        for (key, value) in changes {
            set_or_remove(key, *value);
        }

        Self { saved }
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            set_or_remove(key, value.as_deref());
        }
    }
}

fn set_or_remove(key: &str, value: Option<&str>) {
    match value {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}
