//! Run-scoped pseudonym maps.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::info;

use crate::error::SiftError;

/// Kind of personally identifiable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiCategory {
    Email,
    Phone,
    Name,
}

impl PiiCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            PiiCategory::Email => "EMAIL",
            PiiCategory::Phone => "PHONE",
            PiiCategory::Name => "PERSON",
        }
    }
}

/// Anything that hands out stable pseudonyms.
pub trait TokenAssigner {
    /// Token for `original` (without brackets), assigning the next one if unseen.
    fn assign(&mut self, category: PiiCategory, original: &str) -> String;
}

/// Insertion-ordered original -> token map for one category.
#[derive(Debug, Clone, Default)]
struct Namespace {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Namespace {
    fn assign(&mut self, prefix: &str, original: &str) -> String {
        if let Some(&i) = self.index.get(original) {
            return self.entries[i].1.clone();
        }
        let token = format!("{}_{}", prefix, self.entries.len() + 1);
        self.index.insert(original.to_string(), self.entries.len());
        self.entries.push((original.to_string(), token.clone()));
        token
    }

    fn get(&self, original: &str) -> Option<&str> {
        self.index.get(original).map(|&i| self.entries[i].1.as_str())
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (original, token) in &self.entries {
            map.serialize_entry(original, token)?;
        }
        map.end()
    }
}

/// Three independent pseudonym maps: emails, phones and names.
///
/// Within one store the same original always gets the same token and
/// distinct originals never share one. Nothing is promised across stores.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct PseudonymStore {
    emails: Namespace,
    phones: Namespace,
    names: Namespace,
}

impl PseudonymStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, category: PiiCategory) -> &Namespace {
        match category {
            PiiCategory::Email => &self.emails,
            PiiCategory::Phone => &self.phones,
            PiiCategory::Name => &self.names,
        }
    }

    pub fn get(&self, category: PiiCategory, original: &str) -> Option<&str> {
        self.namespace(category).get(original)
    }

    pub fn len(&self, category: PiiCategory) -> usize {
        self.namespace(category).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.entries.is_empty() && self.phones.entries.is_empty() && self.names.entries.is_empty()
    }

    /// Write the mapping artifact as JSON.
    pub fn save(&self, path: &Path) -> Result<(), SiftError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(
            "Saved pseudonym map ({} emails, {} phones, {} names) to {}",
            self.emails.entries.len(),
            self.phones.entries.len(),
            self.names.entries.len(),
            path.display()
        );
        Ok(())
    }
}

impl TokenAssigner for PseudonymStore {
    fn assign(&mut self, category: PiiCategory, original: &str) -> String {
        let prefix = category.prefix();
        match category {
            PiiCategory::Email => self.emails.assign(prefix, original),
            PiiCategory::Phone => self.phones.assign(prefix, original),
            PiiCategory::Name => self.names.assign(prefix, original),
        }
    }
}

/// Cloneable handle to one store shared by concurrent workers.
///
/// Each assignment holds the lock for the whole check-then-insert step.
#[derive(Debug, Clone, Default)]
pub struct SharedPseudonymStore {
    inner: Arc<Mutex<PseudonymStore>>,
}

impl SharedPseudonymStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PseudonymStore> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current maps.
    pub fn snapshot(&self) -> PseudonymStore {
        self.lock().clone()
    }

    pub fn save(&self, path: &Path) -> Result<(), SiftError> {
        self.lock().save(path)
    }
}

impl From<PseudonymStore> for SharedPseudonymStore {
    fn from(store: PseudonymStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }
}

impl TokenAssigner for SharedPseudonymStore {
    fn assign(&mut self, category: PiiCategory, original: &str) -> String {
        self.lock().assign(category, original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_memoized_and_injective() {
        let mut store = PseudonymStore::new();
        let a = store.assign(PiiCategory::Phone, "9876543210");
        let b = store.assign(PiiCategory::Phone, "9123456780");
        let again = store.assign(PiiCategory::Phone, "9876543210");

        assert_eq!(a, "PHONE_1");
        assert_eq!(b, "PHONE_2");
        assert_eq!(again, a);
        assert_eq!(store.len(PiiCategory::Phone), 2);
    }

    #[test]
    fn test_categories_are_independent() {
        let mut store = PseudonymStore::new();
        assert_eq!(store.assign(PiiCategory::Email, "a@x.com"), "EMAIL_1");
        assert_eq!(store.assign(PiiCategory::Name, "Ravi"), "PERSON_1");
        assert_eq!(store.get(PiiCategory::Email, "Ravi"), None);
    }

    #[test]
    fn test_artifact_is_insertion_ordered() {
        let mut store = PseudonymStore::new();
        store.assign(PiiCategory::Name, "Zoe");
        store.assign(PiiCategory::Name, "Amit");
        store.assign(PiiCategory::Email, "ops@acme.com");

        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(
            json,
            r#"{"emails":{"ops@acme.com":"EMAIL_1"},"phones":{},"names":{"Zoe":"PERSON_1","Amit":"PERSON_2"}}"#
        );
    }

    #[test]
    fn test_shared_store_across_threads() {
        let shared = SharedPseudonymStore::new();
        let originals: Vec<String> = (0..50).map(|i| format!("user{}@example.com", i)).collect();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let mut handle = shared.clone();
                let originals = &originals;
                scope.spawn(move || {
                    for o in originals {
                        handle.assign(PiiCategory::Email, o);
                    }
                });
            }
        });

        let store = shared.snapshot();
        assert_eq!(store.len(PiiCategory::Email), 50);
        let tokens: HashSet<&str> = originals
            .iter()
            .filter_map(|o| store.get(PiiCategory::Email, o))
            .collect();
        assert_eq!(tokens.len(), 50);
    }

    #[test]
    fn test_save_writes_three_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pii_mapping.json");
        let mut store = PseudonymStore::new();
        store.assign(PiiCategory::Phone, "9876543210");
        store.save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["phones"]["9876543210"], "PHONE_1");
        assert!(value["emails"].as_object().unwrap().is_empty());
    }
}
