//! Key-value store contract used by the estimate and score stores.
//!
//! Keys are application-defined strings compared bytewise, so range scans
//! over a common prefix return every entry under that prefix in order.
//!
//! | Module     | Contents                                    |
//! |------------|---------------------------------------------|
//! | [`memory`] | `MemoryStore` (ordered, in-process)         |
//! | `sqlite`   | `SqliteStore` (feature = `"sqlite"` only)  |

mod error;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Separator between key components.
pub const KEY_SEPARATOR: char = '|';

/// Sorts after every valid UTF-8 character, used to close a prefix range.
const MAX_SENTINEL: char = char::MAX;

/// A persistent (or persistent-looking) string key-value store.
///
/// Implementations must be safe to call from many threads at once. Writes of
/// the same key with the same value are idempotent.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any existing value.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Store many entries. The default writes them one at a time.
    fn put_batch(&self, entries: &[(String, String)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// All entries with `min_key <= key <= max_key`, sorted by key.
    fn values_in_range(
        &self,
        min_key: &str,
        max_key: &str,
    ) -> Result<Vec<(String, String)>, StoreError>;
}

/// Join key components with the separator.
pub fn join_key(parts: &[&str]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(part);
    }
    key
}

/// Inclusive `(min, max)` keys covering every key that starts with
/// `prefix` followed by the separator.
pub fn prefix_range(prefix: &str) -> (String, String) {
    let min = format!("{prefix}{KEY_SEPARATOR}");
    let max = format!("{prefix}{KEY_SEPARATOR}{MAX_SENTINEL}");
    (min, max)
}
