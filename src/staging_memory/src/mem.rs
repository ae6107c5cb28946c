use std::collections::{btree_map, BTreeMap};
use std::convert::Infallible;

use crate::traits::{cloned_key, ClonedKeys, MapStore};

/// Plain in-memory backend. Useful as a base when the caller has no store of
/// its own, and in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InMemoryMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    inner: BTreeMap<K, V>,
}

impl<K, V> InMemoryMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn as_map(&self) -> &BTreeMap<K, V> {
        &self.inner
    }

    pub fn into_map(self) -> BTreeMap<K, V> {
        self.inner
    }
}

impl<K, V> FromIterator<(K, V)> for InMemoryMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<K, V> MapStore<K, V> for InMemoryMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    type Error = Infallible;
    type Keys<'s> = ClonedKeys<btree_map::Keys<'s, K, V>, K>
    where
        Self: 's;

    fn get(&self, k: &K) -> Result<Option<V>, Infallible> {
        Ok(self.inner.get(k).cloned())
    }

    fn put(&mut self, k: K, v: V) -> Result<(), Infallible> {
        self.inner.insert(k, v);
        Ok(())
    }

    fn remove(&mut self, k: &K) -> Result<(), Infallible> {
        self.inner.remove(k);
        Ok(())
    }

    fn keys(&self) -> Self::Keys<'_> {
        self.inner
            .keys()
            .map(cloned_key::<K> as fn(&K) -> Result<K, Infallible>)
    }

    fn contains_key(&self, k: &K) -> Result<bool, Infallible> {
        Ok(self.inner.contains_key(k))
    }

    fn len(&self) -> Result<usize, Infallible> {
        Ok(self.inner.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let mut map = InMemoryMap::new();
        map.put("a", 1).unwrap();
        map.put("b", 2).unwrap();
        assert_eq!(MapStore::get(&map, &"a").unwrap(), Some(1));
        assert_eq!(MapStore::len(&map).unwrap(), 2);

        map.remove(&"a").unwrap();
        assert!(!MapStore::contains_key(&map, &"a").unwrap());
        // removing a missing key is a no-op
        map.remove(&"a").unwrap();
        let keys: Vec<_> = MapStore::keys(&map).map(Result::unwrap).collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn test_collect() {
        let map: InMemoryMap<_, _> = [(1, "x"), (2, "y")].into_iter().collect();
        assert_eq!(map.as_map().len(), 2);
        assert!(!MapStore::is_empty(&map).unwrap());
    }
}
