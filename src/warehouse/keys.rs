use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Dense integer key assigned during transformation
pub type SurrogateKey = u32;

/// Maps natural keys to dense surrogate keys starting at 1.
///
/// Keys are handed out in the order natural keys are first offered, so the
/// assignment depends only on the order of the input rows.
#[derive(Debug, Clone)]
pub struct SurrogateKeys<K: Ord> {
    map: BTreeMap<K, SurrogateKey>,
}

impl<K: Ord> SurrogateKeys<K> {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Key for `natural`, assigning the next one if unseen.
    /// The flag is true when a new key was assigned.
    pub fn assign(&mut self, natural: K) -> (SurrogateKey, bool) {
        let next = self.map.len() as SurrogateKey + 1;
        let key = *self.map.entry(natural).or_insert(next);
        (key, key == next)
    }

    pub fn get<Q>(&self, natural: &Q) -> Option<SurrogateKey>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.get(natural).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Ord> Default for SurrogateKeys<K> {
    fn default() -> Self {
        Self::new()
    }
}
