use core::hash::Hash;

use im_relay_proto::{ContextId, FieldId};

use crate::relay::RelayError;
use crate::AHashMap;

pub trait TableId: Copy + Eq + Hash + Ord {
    const KIND: &'static str;

    fn from_raw(raw: u32) -> Self;
}

impl TableId for FieldId {
    const KIND: &'static str = "text field ids";

    fn from_raw(raw: u32) -> Self {
        FieldId(raw)
    }
}

impl TableId for ContextId {
    const KIND: &'static str = "relay context ids";

    fn from_raw(raw: u32) -> Self {
        ContextId(raw)
    }
}

/// Id keyed storage. Ids start at 1 and are never reused.
pub struct IdTable<K, T> {
    /// `None` once `u32::MAX` has been handed out.
    next: Option<u32>,
    inner: AHashMap<K, T>,
}

impl<K: TableId, T> IdTable<K, T> {
    pub fn new() -> Self {
        Self {
            next: Some(1),
            inner: AHashMap::default(),
        }
    }

    #[cfg(test)]
    pub fn starting_at(next: u32) -> Self {
        Self {
            next: Some(next),
            inner: AHashMap::default(),
        }
    }

    #[cfg(test)]
    pub fn exhausted() -> Self {
        Self {
            next: None,
            inner: AHashMap::default(),
        }
    }

    fn next(&mut self) -> Result<K, RelayError> {
        let ret = self.next.ok_or(RelayError::ResourceExhausted(K::KIND))?;
        self.next = ret.checked_add(1);
        Ok(K::from_raw(ret))
    }

    pub fn new_item(&mut self, f: impl FnOnce(K) -> T) -> Result<(K, &mut T), RelayError> {
        let idx = self.next()?;
        let val = self.inner.entry(idx).or_insert_with(|| f(idx));
        Ok((idx, val))
    }

    pub fn remove_item(&mut self, idx: K) -> Option<T> {
        self.inner.remove(&idx)
    }

    pub fn get_item(&self, idx: K) -> Option<&T> {
        self.inner.get(&idx)
    }

    pub fn get_item_mut(&mut self, idx: K) -> Option<&mut T> {
        self.inner.get_mut(&idx)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Live ids in creation order.
    pub fn ids(&self) -> Vec<K> {
        let mut ids: Vec<K> = self.inner.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.inner.values()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (K, T)> + '_ {
        self.inner.drain()
    }
}
