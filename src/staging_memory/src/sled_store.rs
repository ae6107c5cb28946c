//! Disk-backed [`MapStore`] on a `sled::Tree`.
//!
//! Keys and values are raw bytes. Every write is flushed before it returns,
//! so a commit that fails partway leaves a durable prefix of the batch.
//! Read errors are returned as `sled::Error`, never folded into "absent".

use crate::traits::MapStore;

#[derive(Debug, Clone)]
pub struct SledMap {
    tree: sled::Tree,
}

impl SledMap {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &sled::Tree {
        &self.tree
    }
}

/// Lazy key scan over a [`SledMap`].
pub struct SledKeys {
    inner: sled::Iter,
}

impl Iterator for SledKeys {
    type Item = Result<Vec<u8>, sled::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|entry| entry.map(|(k, _)| k.to_vec()))
    }
}

impl MapStore<Vec<u8>, Vec<u8>> for SledMap {
    type Error = sled::Error;
    type Keys<'s> = SledKeys;

    fn get(&self, k: &Vec<u8>) -> Result<Option<Vec<u8>>, sled::Error> {
        Ok(self.tree.get(k)?.map(|ivec| ivec.to_vec()))
    }

    fn put(&mut self, k: Vec<u8>, v: Vec<u8>) -> Result<(), sled::Error> {
        self.tree.insert(k, v)?;
        self.tree.flush()?;
        Ok(())
    }

    fn remove(&mut self, k: &Vec<u8>) -> Result<(), sled::Error> {
        self.tree.remove(k)?;
        self.tree.flush()?;
        Ok(())
    }

    fn keys(&self) -> SledKeys {
        SledKeys {
            inner: self.tree.iter(),
        }
    }

    fn contains_key(&self, k: &Vec<u8>) -> Result<bool, sled::Error> {
        self.tree.contains_key(k)
    }

    fn len(&self) -> Result<usize, sled::Error> {
        Ok(self.tree.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Overlay;

    fn temp_map() -> SledMap {
        let db = sled::Config::new().temporary(true).open().unwrap();
        SledMap::new(db.open_tree("accounts").unwrap())
    }

    #[test]
    fn test_overlay_over_sled() {
        let mut map = temp_map();
        map.put(b"alice".to_vec(), b"10".to_vec()).unwrap();
        map.put(b"bob".to_vec(), b"20".to_vec()).unwrap();

        let mut overlay = Overlay::new(&mut map).unwrap();
        overlay.set(b"carol".to_vec(), b"30".to_vec()).unwrap();
        overlay.delete(&b"alice".to_vec()).unwrap();
        assert_eq!(overlay.len(), 2);
        // nothing written yet
        assert!(overlay.base().contains_key(&b"alice".to_vec()).unwrap());
        assert!(!overlay.base().contains_key(&b"carol".to_vec()).unwrap());

        overlay.commit().unwrap();
        drop(overlay);

        assert_eq!(map.len().unwrap(), 2);
        assert_eq!(map.get(&b"carol".to_vec()).unwrap(), Some(b"30".to_vec()));
        assert_eq!(map.get(&b"alice".to_vec()).unwrap(), None);
        let keys: Vec<Vec<u8>> = map.keys().collect::<Result<_, _>>().unwrap();
        assert_eq!(keys, vec![b"bob".to_vec(), b"carol".to_vec()]);
    }
}
