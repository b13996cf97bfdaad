//! Save/attempt/restore over a subset of configuration keys.

use std::ops::{Deref, DerefMut};

use super::{BuildEnv, Value};

/// Values of a set of keys at one point in time. Absent keys are recorded
/// as absent so restoring removes anything a probe added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    entries: Vec<(String, Option<Value>)>,
}

impl ConfigSnapshot {
    pub fn capture(env: &BuildEnv, keys: &[&str]) -> Self {
        let mut entries: Vec<(String, Option<Value>)> = Vec::with_capacity(keys.len());
        for key in keys {
            if entries.iter().any(|(k, _)| k == key) {
                continue;
            }
            entries.push((key.to_string(), env.get(key).cloned()));
        }
        ConfigSnapshot { entries }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn restore(&self, env: &mut BuildEnv) {
        for (key, value) in &self.entries {
            match value {
                Some(value) => env.set(key.clone(), value.clone()),
                None => {
                    env.remove(key);
                }
            }
        }
    }
}

/// A scoped mutation of a [`BuildEnv`].
///
/// Dropping the guard without [`commit`](Transaction::commit) restores the
/// saved keys, including during unwinding.
#[derive(Debug)]
pub struct Transaction<'a> {
    env: &'a mut BuildEnv,
    snapshot: Option<ConfigSnapshot>,
}

impl<'a> Transaction<'a> {
    pub(super) fn begin(env: &'a mut BuildEnv, keys: &[&str]) -> Self {
        let snapshot = ConfigSnapshot::capture(env, keys);
        tracing::trace!(keys = ?keys, "begin configuration transaction");
        Transaction {
            env,
            snapshot: Some(snapshot),
        }
    }

    /// Keep the current values of the saved keys.
    pub fn commit(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            tracing::trace!(keys = ?snapshot.keys().collect::<Vec<_>>(), "commit configuration");
        }
    }

    /// Restore the saved keys now. Later commits are no-ops.
    pub fn rollback(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(self.env);
        }
    }

    pub fn is_open(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl Deref for Transaction<'_> {
    type Target = BuildEnv;

    fn deref(&self) -> &BuildEnv {
        self.env
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut BuildEnv {
        self.env
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.rollback();
    }
}
