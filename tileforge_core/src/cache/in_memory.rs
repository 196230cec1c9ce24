use super::traits::{Cache, CacheKey};
use anyhow::Result;
use std::collections::HashMap;
use std::marker::PhantomData;

/// A process-local stand-in for the distributed cache back-end.
pub struct InMemoryCache<K, V>
where
	K: CacheKey,
{
	data: HashMap<String, Vec<V>>,
	_marker: PhantomData<K>,
}

impl<K, V> Default for InMemoryCache<K, V>
where
	K: CacheKey,
{
	fn default() -> Self {
		InMemoryCache {
			data: HashMap::new(),
			_marker: PhantomData,
		}
	}
}

impl<K, V> Cache<K, V> for InMemoryCache<K, V>
where
	K: CacheKey,
	V: Clone,
{
	fn contains_key(&self, key: &K) -> bool {
		self.data.contains_key(key.as_cache_key())
	}

	fn get_clone(&self, key: &K) -> Result<Option<Vec<V>>> {
		Ok(self.data.get(key.as_cache_key()).cloned())
	}

	fn remove(&mut self, key: &K) -> Result<Option<Vec<V>>> {
		Ok(self.data.remove(key.as_cache_key()))
	}

	fn insert(&mut self, key: &K, values: Vec<V>) -> Result<()> {
		self.data.insert(key.to_cache_key(), values);
		Ok(())
	}

	fn append(&mut self, key: &K, values: Vec<V>) -> Result<()> {
		self.data.entry(key.to_cache_key()).or_default().extend(values);
		Ok(())
	}

	fn clean_up(&mut self) {
		self.data.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insert_and_get() {
		let mut cache: InMemoryCache<String, u64> = InMemoryCache::default();
		cache.insert(&"inflight".to_string(), vec![1, 2, 3]).unwrap();
		assert!(cache.contains_key(&"inflight".to_string()));
		assert_eq!(cache.get_clone(&"inflight".to_string()).unwrap(), Some(vec![1, 2, 3]));
	}

	#[test]
	fn append_extends_existing() {
		let mut cache: InMemoryCache<String, u64> = InMemoryCache::default();
		cache.insert(&"k".to_string(), vec![1]).unwrap();
		cache.append(&"k".to_string(), vec![2, 3]).unwrap();
		assert_eq!(cache.get_clone(&"k".to_string()).unwrap(), Some(vec![1, 2, 3]));
	}

	#[test]
	fn remove_and_clean_up() {
		let mut cache: InMemoryCache<String, u64> = InMemoryCache::default();
		cache.insert(&"k".to_string(), vec![1]).unwrap();
		assert_eq!(cache.remove(&"k".to_string()).unwrap(), Some(vec![1]));
		assert!(!cache.contains_key(&"k".to_string()));

		cache.insert(&"a".to_string(), vec![1]).unwrap();
		cache.clean_up();
		assert!(!cache.contains_key(&"a".to_string()));
	}
}
