use std::collections::{btree_map, hash_map, BTreeMap, HashMap};
use std::convert::Infallible;
use std::hash::Hash;

/// A key/value store an [`Overlay`](crate::overlay::Overlay) can sit on top of.
///
/// Every operation returns the backend's own error type so a persisted store
/// can report read failures instead of passing them off as missing keys.
/// Key enumeration is lazy: [`keys`](MapStore::keys) hands back an iterator
/// that pulls from the store as it is advanced.
pub trait MapStore<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    type Error: std::error::Error + Send + Sync + 'static;

    type Keys<'s>: Iterator<Item = Result<K, Self::Error>>
    where
        Self: 's;

    fn get(&self, k: &K) -> Result<Option<V>, Self::Error>;
    fn put(&mut self, k: K, v: V) -> Result<(), Self::Error>;
    fn remove(&mut self, k: &K) -> Result<(), Self::Error>;
    fn keys(&self) -> Self::Keys<'_>;

    fn contains_key(&self, k: &K) -> Result<bool, Self::Error> {
        Ok(self.get(k)?.is_some())
    }

    fn len(&self) -> Result<usize, Self::Error> {
        let mut n = 0;
        for k in self.keys() {
            k?;
            n += 1;
        }
        Ok(n)
    }

    fn is_empty(&self) -> Result<bool, Self::Error> {
        Ok(self.len()? == 0)
    }
}

pub(crate) type ClonedKeys<I, K> = std::iter::Map<I, fn(&K) -> Result<K, Infallible>>;

pub(crate) fn cloned_key<K: Clone>(k: &K) -> Result<K, Infallible> {
    Ok(k.clone())
}

impl<K, V> MapStore<K, V> for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    type Error = Infallible;
    type Keys<'s> = ClonedKeys<btree_map::Keys<'s, K, V>, K>
    where
        Self: 's;

    fn get(&self, k: &K) -> Result<Option<V>, Infallible> {
        Ok(BTreeMap::get(self, k).cloned())
    }

    fn put(&mut self, k: K, v: V) -> Result<(), Infallible> {
        self.insert(k, v);
        Ok(())
    }

    fn remove(&mut self, k: &K) -> Result<(), Infallible> {
        BTreeMap::remove(self, k);
        Ok(())
    }

    fn keys(&self) -> Self::Keys<'_> {
        BTreeMap::keys(self).map(cloned_key::<K> as fn(&K) -> Result<K, Infallible>)
    }

    fn contains_key(&self, k: &K) -> Result<bool, Infallible> {
        Ok(BTreeMap::contains_key(self, k))
    }

    fn len(&self) -> Result<usize, Infallible> {
        Ok(BTreeMap::len(self))
    }
}

impl<K, V> MapStore<K, V> for HashMap<K, V>
where
    K: Ord + Hash + Clone,
    V: Clone,
{
    type Error = Infallible;
    type Keys<'s> = ClonedKeys<hash_map::Keys<'s, K, V>, K>
    where
        Self: 's;

    fn get(&self, k: &K) -> Result<Option<V>, Infallible> {
        Ok(HashMap::get(self, k).cloned())
    }

    fn put(&mut self, k: K, v: V) -> Result<(), Infallible> {
        self.insert(k, v);
        Ok(())
    }

    fn remove(&mut self, k: &K) -> Result<(), Infallible> {
        HashMap::remove(self, k);
        Ok(())
    }

    fn keys(&self) -> Self::Keys<'_> {
        HashMap::keys(self).map(cloned_key::<K> as fn(&K) -> Result<K, Infallible>)
    }

    fn contains_key(&self, k: &K) -> Result<bool, Infallible> {
        Ok(HashMap::contains_key(self, k))
    }

    fn len(&self) -> Result<usize, Infallible> {
        Ok(HashMap::len(self))
    }
}
