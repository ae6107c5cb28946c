//! Staged-write overlay over a [`MapStore`].
//!
//! Reads see pending edits immediately; the base store is only written on
//! [`Overlay::commit`]. Deletions are recorded as [`Staged::Tombstone`] so a
//! key removed from the view stays removed even though the base still holds it.
//!
//! ```ignore
//! let mut base = BTreeMap::from([("a", 1), ("b", 2)]);
//! let mut overlay = Overlay::new(&mut base)?;
//! overlay.set("c", 3)?;
//! overlay.delete(&"a")?;
//! assert_eq!(overlay.len(), 2);
//! overlay.commit()?;
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::{OverlayError, Result};
use crate::traits::MapStore;

/// State of a key in the staging store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staged<V> {
    Present(V),
    Tombstone,
}

impl<V> Staged<V> {
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Staged::Tombstone)
    }

    pub fn as_present(&self) -> Option<&V> {
        match self {
            Staged::Present(v) => Some(v),
            Staged::Tombstone => None,
        }
    }
}

/// A batch of uncommitted edits layered over a borrowed base store.
///
/// The overlay holds the base by `&mut`, so nothing else can touch the base
/// while edits are staged and the cached length cannot drift. Any base read
/// that fails surfaces as [`OverlayError::Base`] and leaves the overlay as it
/// was before the call.
pub struct Overlay<'a, K, V, B>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V>,
{
    base: &'a mut B,
    staged: BTreeMap<K, Staged<V>>,
    // number of keys present in the layered view
    len: usize,
}

impl<'a, K, V, B> Overlay<'a, K, V, B>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone,
    B: MapStore<K, V>,
{
    pub fn new(base: &'a mut B) -> Result<Self> {
        let len = base.len().map_err(OverlayError::base)?;
        Ok(Self {
            base,
            staged: BTreeMap::new(),
            len,
        })
    }

    pub fn base(&self) -> &B {
        &*self.base
    }

    /// Look up `k` in the layered view.
    ///
    /// A staged tombstone hides whatever the base holds for `k`.
    pub fn get(&self, k: &K) -> Result<V> {
        resolve(&self.staged, &*self.base, k)?.ok_or_else(|| OverlayError::key_not_found(k))
    }

    pub fn get_or(&self, k: &K, default: V) -> Result<V> {
        Ok(resolve(&self.staged, &*self.base, k)?.unwrap_or(default))
    }

    /// Return the visible value for `k`, staging `default` first if `k` is
    /// not in the view.
    pub fn get_or_insert(&mut self, k: K, default: V) -> Result<V> {
        if let Some(v) = resolve(&self.staged, &*self.base, &k)? {
            return Ok(v);
        }
        trace!(key = ?k, "staged write");
        self.staged.insert(k, Staged::Present(default.clone()));
        self.len += 1;
        Ok(default)
    }

    pub fn contains_key(&self, k: &K) -> Result<bool> {
        match self.staged.get(k) {
            Some(entry) => Ok(!entry.is_tombstone()),
            None => self.base.contains_key(k).map_err(OverlayError::base),
        }
    }

    /// Stage `v` for `k`. Overwrites any staged entry, including a tombstone,
    /// which brings a deleted key back into the view.
    pub fn set(&mut self, k: K, v: V) -> Result<()> {
        if !self.contains_key(&k)? {
            self.len += 1;
        }
        trace!(key = ?k, "staged write");
        self.staged.insert(k, Staged::Present(v));
        Ok(())
    }

    /// Stage every pair from `iter`, stopping at the first base read error.
    pub fn update<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.set(k, v)?;
        }
        Ok(())
    }

    /// Stage a deletion of `k`. Fails if `k` is not in the view, so deleting
    /// the same key twice fails the second time.
    pub fn delete(&mut self, k: &K) -> Result<()> {
        if !self.contains_key(k)? {
            return Err(OverlayError::key_not_found(k));
        }
        trace!(key = ?k, "staged delete");
        self.staged.insert(k.clone(), Staged::Tombstone);
        self.len -= 1;
        Ok(())
    }

    /// Like [`delete`](Self::delete) but returns the value that was visible.
    pub fn remove(&mut self, k: &K) -> Result<V> {
        let v = self.get(k)?;
        self.staged.insert(k.clone(), Staged::Tombstone);
        self.len -= 1;
        Ok(v)
    }

    /// Remove and return the first pair in enumeration order, if any.
    pub fn pop_first(&mut self) -> Result<Option<(K, V)>> {
        let Some(k) = self.keys().next().transpose()? else {
            return Ok(None);
        };
        let v = self.remove(&k)?;
        Ok(Some((k, v)))
    }

    /// Stage a deletion of every key currently in the view.
    pub fn clear(&mut self) -> Result<()> {
        let keys = self.keys().collect::<Result<Vec<K>>>()?;
        for k in keys {
            self.staged.insert(k, Staged::Tombstone);
        }
        self.len = 0;
        Ok(())
    }

    /// Apply every staged edit to the base, then empty the staging store.
    ///
    /// If the base rejects a write, edits applied so far stay applied, the
    /// staging store is left untouched and the error is returned. Retrying
    /// is safe since every staged edit is idempotent against the base.
    pub fn commit(&mut self) -> Result<()> {
        let mut written = 0usize;
        let mut removed = 0usize;
        for (k, entry) in &self.staged {
            let res = match entry {
                Staged::Present(v) => self.base.put(k.clone(), v.clone()),
                Staged::Tombstone => self.base.remove(k),
            };
            res.map_err(|e| {
                warn!(key = ?k, error = %e, written, removed, "base write failed during commit");
                OverlayError::base(e)
            })?;
            if entry.is_tombstone() {
                removed += 1;
            } else {
                written += 1;
            }
        }
        self.staged.clear();
        debug!(written, removed, len = self.len, "committed staged edits");
        Ok(())
    }

    /// Drop every staged edit. The view goes back to whatever the base holds.
    ///
    /// The base is sized before anything is dropped, so a failed read keeps
    /// the staged edits.
    pub fn discard(&mut self) -> Result<()> {
        let len = self.base.len().map_err(OverlayError::base)?;
        let dropped = self.staged.len();
        self.staged.clear();
        self.len = len;
        debug!(dropped, len, "discarded staged edits");
        Ok(())
    }

    /// Keys with a pending write (additions and overwrites).
    pub fn changed(&self) -> impl Iterator<Item = &K> + Clone + '_ {
        self.staged
            .iter()
            .filter(|(_, entry)| !entry.is_tombstone())
            .map(|(k, _)| k)
    }

    /// Keys with a pending deletion.
    pub fn deleted(&self) -> impl Iterator<Item = &K> + Clone + '_ {
        self.staged
            .iter()
            .filter(|(_, entry)| entry.is_tombstone())
            .map(|(k, _)| k)
    }

    /// Every key present in the view, each once. Order is unspecified.
    ///
    /// Base keys are pulled lazily; a failed base read is yielded as an error.
    pub fn keys(&self) -> Keys<'_, K, V, B> {
        Keys {
            base_keys: self.base.keys(),
            staged: &self.staged,
            staged_iter: self.staged.iter(),
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, B> {
        Iter {
            keys: self.keys(),
            staged: &self.staged,
            base: &*self.base,
        }
    }

    pub fn values(&self) -> impl Iterator<Item = Result<V>> + '_ {
        self.iter().map(|pair| pair.map(|(_, v)| v))
    }

    /// Copy the current view into a `BTreeMap`.
    pub fn snapshot(&self) -> Result<BTreeMap<K, V>> {
        self.iter().collect()
    }

    /// Whether the view holds exactly the pairs in `other`.
    pub fn eq_map(&self, other: &BTreeMap<K, V>) -> Result<bool>
    where
        V: PartialEq,
    {
        if self.len != other.len() {
            return Ok(false);
        }
        for (k, v) in other {
            if resolve(&self.staged, &*self.base, k)?.as_ref() != Some(v) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

fn resolve<K, V, B>(staged: &BTreeMap<K, Staged<V>>, base: &B, k: &K) -> Result<Option<V>>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V>,
{
    match staged.get(k) {
        Some(entry) => Ok(entry.as_present().cloned()),
        None => base.get(k).map_err(OverlayError::base),
    }
}

impl<'a, K, V, B> fmt::Debug for Overlay<'a, K, V, B>
where
    K: Ord + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
    B: MapStore<K, V> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("base", &self.base)
            .field("changes", &self.staged)
            .finish()
    }
}

/// Iterator over the keys of an [`Overlay`]'s view.
///
/// Yields base keys without a staged entry first, then staged keys whose
/// entry is [`Staged::Present`].
pub struct Keys<'o, K, V, B>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V> + 'o,
{
    base_keys: B::Keys<'o>,
    staged: &'o BTreeMap<K, Staged<V>>,
    staged_iter: btree_map::Iter<'o, K, Staged<V>>,
}

impl<'o, K, V, B> Iterator for Keys<'o, K, V, B>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V> + 'o,
{
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.base_keys.by_ref() {
            match item {
                Ok(k) if self.staged.contains_key(&k) => continue,
                Ok(k) => return Some(Ok(k)),
                Err(e) => return Some(Err(OverlayError::base(e))),
            }
        }
        for (k, entry) in self.staged_iter.by_ref() {
            if !entry.is_tombstone() {
                return Some(Ok(k.clone()));
            }
        }
        None
    }
}

/// Iterator over the `(key, value)` pairs of an [`Overlay`]'s view.
pub struct Iter<'o, K, V, B>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V> + 'o,
{
    keys: Keys<'o, K, V, B>,
    staged: &'o BTreeMap<K, Staged<V>>,
    base: &'o B,
}

impl<'o, K, V, B> Iterator for Iter<'o, K, V, B>
where
    K: Ord + Clone,
    V: Clone,
    B: MapStore<K, V> + 'o,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.keys.by_ref() {
            let k = match item {
                Ok(k) => k,
                Err(e) => return Some(Err(e)),
            };
            match resolve(self.staged, self.base, &k) {
                Ok(Some(v)) => return Some(Ok((k, v))),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
