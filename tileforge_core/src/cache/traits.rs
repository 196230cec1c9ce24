use anyhow::Result;

/// A value that can be used as a cache key.
pub trait CacheKey {
	fn as_cache_key(&self) -> &str;
	fn to_cache_key(&self) -> String {
		self.as_cache_key().to_string()
	}
}

impl CacheKey for str {
	fn as_cache_key(&self) -> &str {
		self
	}
}

impl CacheKey for String {
	fn as_cache_key(&self) -> &str {
		self.as_str()
	}
}

/// A key-to-list cache, the capability the distributed-cache back-end needs
/// for the in-flight coord set and the RAWR TOI refresh. `K`
/// is intentionally decoupled from `V` so a single implementation can back
/// both string-keyed and coord-keyed uses.
pub trait Cache<K: CacheKey, V> {
	fn contains_key(&self, key: &K) -> bool;
	fn get_clone(&self, key: &K) -> Result<Option<Vec<V>>>;
	fn remove(&mut self, key: &K) -> Result<Option<Vec<V>>>;
	fn insert(&mut self, key: &K, values: Vec<V>) -> Result<()>;
	fn append(&mut self, key: &K, values: Vec<V>) -> Result<()>;
	fn clean_up(&mut self);
}
