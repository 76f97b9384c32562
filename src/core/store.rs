use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use spin_sdk::key_value::Store;

/// Key-value document store every handler runs against.
///
/// Documents are JSON blobs addressed by string keys. There are no
/// transactions: each call is one independent write or read, and callers
/// that touch several documents do so in sequence.
pub trait DocStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
    fn exists(&self, key: &str) -> anyhow::Result<bool>;
    fn get_keys(&self) -> anyhow::Result<Vec<String>>;

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()>
    where
        Self: Sized,
    {
        self.set(key, &serde_json::to_vec(value)?)
    }

    fn keys_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>>
    where
        Self: Sized,
    {
        Ok(self
            .get_keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

impl DocStore for Store {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(Store::get(self, key)?)
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        Ok(Store::set(self, key, value)?)
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        Ok(Store::delete(self, key)?)
    }

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(Store::exists(self, key)?)
    }

    fn get_keys(&self) -> anyhow::Result<Vec<String>> {
        Ok(Store::get_keys(self)?)
    }
}

/// In-process store used by the native server and the tests.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_map<R>(&self, f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>) -> R) -> anyhow::Result<R> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(f(&mut map))
    }
}

impl DocStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.with_map(|m| m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.with_map(|m| {
            m.insert(key.to_string(), value.to_vec());
        })
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.with_map(|m| {
            m.remove(key);
        })
    }

    fn exists(&self, key: &str) -> anyhow::Result<bool> {
        self.with_map(|m| m.contains_key(key))
    }

    fn get_keys(&self) -> anyhow::Result<Vec<String>> {
        self.with_map(|m| m.keys().cloned().collect())
    }
}
