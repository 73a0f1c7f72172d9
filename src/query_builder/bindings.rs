//! Binding store
//!
//! Parameter values are kept in fixed buckets that mirror the query section
//! they belong to. At execution time the buckets are flattened, in declared
//! order, into the single map the connection receives.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::QueryBuilderError;
use crate::connection::Bindings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingBucket {
    Select,
    Where,
    Matches,
    Join,
    Order,
    Having,
}

impl BindingBucket {
    /// Flattening order. Later buckets win on key collisions.
    pub const ALL: [BindingBucket; 6] = [
        BindingBucket::Select,
        BindingBucket::Where,
        BindingBucket::Matches,
        BindingBucket::Join,
        BindingBucket::Order,
        BindingBucket::Having,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BindingBucket::Select => "select",
            BindingBucket::Where => "where",
            BindingBucket::Matches => "matches",
            BindingBucket::Join => "join",
            BindingBucket::Order => "order",
            BindingBucket::Having => "having",
        }
    }

    fn index(&self) -> usize {
        match self {
            BindingBucket::Select => 0,
            BindingBucket::Where => 1,
            BindingBucket::Matches => 2,
            BindingBucket::Join => 3,
            BindingBucket::Order => 4,
            BindingBucket::Having => 5,
        }
    }
}

impl fmt::Display for BindingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingBucket {
    type Err = QueryBuilderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindingBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| QueryBuilderError::InvalidBindingBucket(s.to_string()))
    }
}

/// Parameter name for the Nth use of a logical column.
///
/// The first occurrence renders bare (`age`), later ones get a counter
/// suffix (`age_2`, `age_3`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BindingName {
    pub base: String,
    pub occurrence: usize,
}

impl BindingName {
    pub fn new(base: impl Into<String>, occurrence: usize) -> Self {
        Self {
            base: base.into(),
            occurrence: occurrence.max(1),
        }
    }

    pub fn first(base: impl Into<String>) -> Self {
        Self::new(base, 1)
    }
}

impl fmt::Display for BindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.occurrence > 1 {
            write!(f, "{}_{}", self.base, self.occurrence)
        } else {
            f.write_str(&self.base)
        }
    }
}

/// Hands out binding names that never repeat.
///
/// Each base continues from its own use count; a candidate already taken
/// verbatim (a column literally named `age_2`, say) is skipped.
#[derive(Debug, Clone, Default)]
pub struct NameAllocator {
    taken: HashSet<String>,
    counts: HashMap<String, usize>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an existing name as used.
    pub fn reserve(&mut self, name: &BindingName) {
        self.taken.insert(name.to_string());
        *self.counts.entry(name.base.clone()).or_insert(0) += 1;
    }

    pub fn allocate(&mut self, base: &str) -> BindingName {
        let count = self.counts.entry(base.to_string()).or_insert(0);
        *count += 1;
        let mut occurrence = *count;
        loop {
            let name = BindingName::new(base, occurrence);
            if self.taken.insert(name.to_string()) {
                return name;
            }
            occurrence += 1;
        }
    }
}

/// Keep only the trailing segment of a dotted path (`post.title` -> `title`).
pub fn strip_path(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Bucket {
    entries: Map<String, Value>,
    positional: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingStore {
    buckets: [Bucket; 6],
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to a bucket.
    ///
    /// An object merges its entries under their path-stripped keys; any other
    /// value is appended positionally.
    pub fn add(&mut self, value: Value, bucket: BindingBucket) {
        let target = &mut self.buckets[bucket.index()];
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    log::trace!("binding {}.{}", bucket, strip_path(&key));
                    target.entries.insert(strip_path(&key).to_string(), value);
                }
            }
            scalar => {
                let key = target.positional.to_string();
                target.positional += 1;
                target.entries.insert(key, scalar);
            }
        }
    }

    /// Bind `value` under `key` in a bucket.
    pub fn insert(&mut self, key: impl AsRef<str>, value: Value, bucket: BindingBucket) {
        let key = strip_path(key.as_ref()).to_string();
        log::trace!("binding {}.{}", bucket, key);
        self.buckets[bucket.index()].entries.insert(key, value);
    }

    /// String-named variant of [`BindingStore::add`].
    pub fn add_named(&mut self, value: Value, bucket: &str) -> Result<(), QueryBuilderError> {
        let bucket = bucket.parse::<BindingBucket>()?;
        self.add(value, bucket);
        Ok(())
    }

    /// Merge a whole map into a bucket.
    pub fn merge(&mut self, values: Map<String, Value>, bucket: BindingBucket) {
        self.add(Value::Object(values), bucket);
    }

    pub fn bucket(&self, bucket: BindingBucket) -> &Map<String, Value> {
        &self.buckets[bucket.index()].entries
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.entries.is_empty())
    }

    /// One ordered map over all buckets in declared order.
    pub fn flatten(&self) -> Bindings {
        let mut flat = Bindings::new();
        for bucket in BindingBucket::ALL {
            for (key, value) in self.bucket(bucket) {
                flat.insert(key.clone(), value.clone());
            }
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_merges_buckets() {
        let mut store = BindingStore::new();
        store.add(json!({"x": 1}), BindingBucket::Where);
        store.add(json!({"y": 2}), BindingBucket::Matches);

        let flat = store.flatten();
        assert_eq!(Value::Object(flat), json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_later_bucket_overwrites_collision() {
        let mut store = BindingStore::new();
        store.add(json!({"id": 1}), BindingBucket::Where);
        store.add(json!({"id": 7}), BindingBucket::Matches);

        assert_eq!(store.flatten()["id"], json!(7));

        // Declared order decides, not insertion order
        let mut store = BindingStore::new();
        store.add(json!({"id": 7}), BindingBucket::Matches);
        store.add(json!({"id": 1}), BindingBucket::Where);
        assert_eq!(store.flatten()["id"], json!(7));
    }

    #[test]
    fn test_dotted_keys_bind_bare_name() {
        let mut store = BindingStore::new();
        store.add(json!({"post.title": "Hello"}), BindingBucket::Where);

        assert_eq!(store.bucket(BindingBucket::Where)["title"], json!("Hello"));
        assert!(!store.bucket(BindingBucket::Where).contains_key("post.title"));
    }

    #[test]
    fn test_scalars_append_positionally() {
        let mut store = BindingStore::new();
        store.add(json!(10), BindingBucket::Order);
        store.add(json!([1, 2]), BindingBucket::Order);

        let order = store.bucket(BindingBucket::Order);
        assert_eq!(order["0"], json!(10));
        assert_eq!(order["1"], json!([1, 2]));
    }

    #[test]
    fn test_unknown_bucket_rejected() {
        let mut store = BindingStore::new();
        let err = store.add_named(json!(1), "groupBy").unwrap_err();
        assert!(matches!(err, QueryBuilderError::InvalidBindingBucket(name) if name == "groupBy"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_allocator_skips_names_taken_verbatim() {
        let mut names = NameAllocator::new();
        assert_eq!(names.allocate("age").to_string(), "age");
        assert_eq!(names.allocate("age_2").to_string(), "age_2");
        assert_eq!(names.allocate("age").to_string(), "age_3");
        assert_eq!(names.allocate("age_2").to_string(), "age_2_2");
    }

    #[test]
    fn test_allocator_continues_after_reserved() {
        let mut names = NameAllocator::new();
        names.reserve(&BindingName::first("id"));
        names.reserve(&BindingName::new("id", 2));
        assert_eq!(names.allocate("id").to_string(), "id_3");
        assert_eq!(names.allocate("name").to_string(), "name");
    }

    #[test]
    fn test_binding_name_suffixes_after_first() {
        assert_eq!(BindingName::first("age").to_string(), "age");
        assert_eq!(BindingName::new("age", 2).to_string(), "age_2");
        assert_eq!(BindingName::new("age", 3).to_string(), "age_3");
    }
}
