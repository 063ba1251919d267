use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::error::Error;
use crate::error::Result;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// A hash map implemented using the Robin Hood [`HashTable`] as the
/// underlying storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys.
///
/// Unlike `std::collections::HashMap`, [`insert`](HashMap::insert) never
/// overwrites: inserting a key that is already present keeps the stored
/// value. Use [`get_mut`](HashMap::get_mut) or the [`entry`](HashMap::entry)
/// API to replace a value.
///
/// # Capacity
///
/// The map starts with 8 slots, doubles when an insertion brings it to 70%
/// load, and halves when a removal drops it to 20% load. [`clear`] returns it
/// to 8 slots.
///
/// [`clear`]: HashMap::clear
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.table.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let map: HashMap<i32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map that holds at least `capacity` entries without
    /// growing, using the default hasher builder.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_map::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates a new hash map that holds at least `capacity` entries without
    /// growing, using the given hasher builder.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_builder,
        }
    }

    /// Returns the hasher builder supplied at construction.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots currently allocated.
    ///
    /// Always a power of two, and never less than 8.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all elements and shrinks the map back to its minimum capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut map: HashMap<u32, u32> = (0..100).map(|n| (n, n)).collect();
    /// assert!(map.capacity() > 8);
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Shrinks the capacity of the map as much as the load policy allows.
    pub fn shrink_to_fit(&mut self) {
        self.table.shrink_to_fit();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// Pairs are yielded in slot order. Any insertion or removal invalidates
    /// that order, which is why the iterator borrows the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let map = HashMap::from([(1, "a"), (2, "b")]);
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// assert_eq!(map.iter().len(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the key-value pairs of the map with mutable
    /// references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values of the map.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Returns an iterator that removes and yields all key-value pairs from the
    /// map.
    ///
    /// The map is empty, at minimum capacity, as soon as `drain` returns.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut map = HashMap::from([(1, "a"), (2, "b")]);
    ///
    /// let pairs: Vec<_> = map.drain().collect();
    /// assert!(map.is_empty());
    /// assert_eq!(pairs.len(), 2);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Computes the distribution of probe distances.
    ///
    /// Only available in tests or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Only available in tests or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.table.assert_invariants();
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a key-value pair if the key is not already present.
    ///
    /// Returns `true` if the pair was inserted. If the key was already
    /// present the map is left unchanged, the stored value is kept, and
    /// `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert!(map.insert(37, "a"));
    /// assert!(!map.insert(37, "b"));
    /// assert_eq!(map.get(&37), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                true
            }
        }
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let map = HashMap::from([(1, "a")]);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`, or `None` if it is absent.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find(hash, |(k, _)| k == key).map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_mut(hash, |(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns a reference to the value for `key`, or
    /// [`Error::KeyNotFound`] if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::Error;
    /// use robin_map::HashMap;
    ///
    /// let map = HashMap::from([("one", 1)]);
    /// assert_eq!(map.at(&"one"), Ok(&1));
    /// assert_eq!(map.at(&"two"), Err(Error::KeyNotFound));
    /// ```
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value for `key`, or
    /// [`Error::KeyNotFound`] if it is absent.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut counts: HashMap<&str, u32> = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts.get(&"a"), Some(&2));
    /// assert_eq!(counts.get(&"b"), Some(&1));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// Removing an absent key leaves the map untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut map = HashMap::from([(1, "a")]);
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, |(k, _)| k == key)
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use robin_map::HashMap;
    ///
    /// let mut map = HashMap::new();
    ///
    /// map.entry(1).or_insert("a");
    /// map.entry(2).or_insert("b");
    /// map.entry(1).or_insert("c");
    ///
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), Some(&"b"));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Index<&K> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present. Use [`HashMap::at`] for a checked
    /// lookup or [`HashMap::get_or_insert_default`] to insert on a miss.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", Error::KeyNotFound),
        }
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts every pair; for repeated keys the first value wins.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Builds a map from a literal list of pairs; for repeated keys the
    /// first value wins.
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`, in slot order.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}
impl<K, V> FusedIterator for Drain<'_, K, V> {}

#[cfg(test)]
mod tests {
    use core::hash::BuildHasher;
    use core::hash::BuildHasherDefault;
    use core::hash::Hasher;

    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use siphasher::sip::SipHasher;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Sends every key to slot 0.
    #[derive(Default)]
    struct ZeroHasher;

    impl Hasher for ZeroHasher {
        fn finish(&self) -> u64 {
            0
        }

        fn write(&mut self, _bytes: &[u8]) {}
    }

    type ZeroHashBuilder = BuildHasherDefault<ZeroHasher>;

    /// Equal and hashed by `id` alone, so `tag` tells apart two keys the map
    /// treats as the same.
    #[derive(Clone, Debug)]
    struct Tagged {
        id: u32,
        tag: &'static str,
    }

    impl PartialEq for Tagged {
        fn eq(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    impl Eq for Tagged {}

    impl Hash for Tagged {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.id.hash(state);
        }
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String, SipHashBuilder> = HashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), 8);

        let map2 = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.len(), 0);
    }

    #[test]
    fn test_hasher_accessor() {
        let builder = SipHashBuilder { k1: 7, k2: 11 };
        let map: HashMap<i32, i32, _> = HashMap::with_hasher(builder.clone());
        assert_eq!(map.hasher(), &builder);
        assert_eq!(map.hasher().hash_one(5), builder.hash_one(5));
    }

    #[test]
    fn test_with_capacity() {
        let map =
            HashMap::<i32, String, _>::with_capacity_and_hasher(200, SipHashBuilder::default());
        assert!(map.capacity() * 7 > 200 * 10);
        assert!(map.capacity().is_power_of_two());
        assert!(map.is_empty());
    }

    #[test]
    fn test_insert_keeps_existing_value() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());

        assert!(map.insert(1, "v1".to_string()));
        assert!(!map.insert(1, "v2".to_string()));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"v1".to_string()));
    }

    #[test]
    fn test_get_key_value() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("k".to_string(), 3);

        assert_eq!(map.get_key_value(&"k".to_string()), Some((&"k".to_string(), &3)));
        assert_eq!(map.get_key_value(&"x".to_string()), None);
    }

    #[test]
    fn test_at() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, 10);

        assert_eq!(map.at(&1), Ok(&10));
        assert_eq!(map.len(), 1);
        assert_eq!(map.at(&2), Err(Error::KeyNotFound));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&2));

        *map.at_mut(&1).unwrap() += 1;
        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.at_mut(&2), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_duplicate_insert_keeps_stored_key_and_value() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        let stored = Rc::new(());
        let rejected = Rc::new(());

        assert!(map.insert(Tagged { id: 1, tag: "first" }, Rc::clone(&stored)));
        assert!(!map.insert(Tagged { id: 1, tag: "second" }, Rc::clone(&rejected)));

        assert_eq!(map.len(), 1);
        assert_eq!(Rc::strong_count(&rejected), 1);
        assert_eq!(Rc::strong_count(&stored), 2);

        let (key, value) = map.get_key_value(&Tagged { id: 1, tag: "lookup" }).unwrap();
        assert_eq!(key.tag, "first");
        assert!(Rc::ptr_eq(value, &stored));
    }

    #[test]
    fn test_duplicate_insert_at_growth_edge_does_not_grow() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..5 {
            assert!(map.insert(i, i));
        }
        assert_eq!(map.capacity(), 8);

        // A sixth distinct key would reach 70% load; a repeated key must not.
        for i in 0..5 {
            assert!(!map.insert(i, -1));
        }
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.len(), 5);

        assert!(map.insert(5, 5));
        assert_eq!(map.capacity(), 16);
        map.assert_invariants();
    }

    #[test]
    fn test_entry_insert_is_the_explicit_overwrite() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("k", 1);
        assert!(!map.insert("k", 2));

        match map.entry("k") {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &"k");
                assert_eq!(entry.insert(3), 1);
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }
        assert_eq!(map.at(&"k"), Ok(&3));

        match map.entry("gone") {
            Entry::Vacant(entry) => assert_eq!(entry.into_key(), "gone"),
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }
        assert_eq!(map.len(), 1);

        *map.entry("k").and_modify(|v| *v *= 10).or_insert(0) += 1;
        assert_eq!(map[&"k"], 31);

        let removed = match map.entry("k") {
            Entry::Occupied(entry) => entry.remove_entry(),
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        };
        assert_eq!(removed, ("k", 31));
        assert!(map.is_empty());
    }

    #[test]
    fn test_at_sees_in_place_updates_and_never_inserts() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..10 {
            map.insert(i, i);
        }
        for value in map.values_mut() {
            *value *= 2;
        }
        for (_, value) in &mut map {
            *value += 1;
        }
        for i in 0..10 {
            assert_eq!(map.at(&i), Ok(&(i * 2 + 1)));
        }

        let capacity = map.capacity();
        for i in 10..100 {
            assert_eq!(map.at(&i), Err(Error::KeyNotFound));
        }
        assert_eq!(map.len(), 10);
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_removal_from_presized_map_shrinks() {
        let mut map = HashMap::with_capacity_and_hasher(1000, SipHashBuilder::default());
        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(map.capacity(), 2048);

        assert_eq!(map.remove(&1), Some("a"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.capacity(), 8);
        map.assert_invariants();
        assert_eq!(map.at(&2), Ok(&"b"));
    }

    #[test]
    fn test_shrink_after_reserve_stops_above_twenty_percent() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..40u32 {
            map.insert(i, i);
        }
        map.reserve(1000);
        assert_eq!(map.capacity(), 2048);

        assert_eq!(map.remove(&0), Some(0));
        assert_eq!(map.len(), 39);
        assert_eq!(map.capacity(), 128);
        map.assert_invariants();

        // From here on removals halve one step at a time.
        for i in 1..14u32 {
            map.remove(&i);
            assert_eq!(map.capacity(), 128);
        }
        map.remove(&14);
        assert_eq!(map.len(), 25);
        assert_eq!(map.capacity(), 64);
        map.assert_invariants();
    }

    #[test]
    fn test_absent_removal_leaves_presized_map_alone() {
        let mut map = HashMap::with_capacity_and_hasher(100, SipHashBuilder::default());
        map.insert(1, 1);
        let capacity = map.capacity();
        assert!(capacity > 8);

        assert_eq!(map.remove(&7), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.capacity(), capacity);

        assert_eq!(map.remove(&1), Some(1));
        assert_eq!(map.capacity(), 8);
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut map: HashMap<i32, Vec<i32>, _> = HashMap::with_hasher(SipHashBuilder::default());

        assert!(map.get_or_insert_default(1).is_empty());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&vec![]));

        map.get_or_insert_default(1).push(5);
        map.get_or_insert_default(1).push(6);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&vec![5, 6]));
    }

    #[test]
    fn test_index() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert("a", 1);
        assert_eq!(map[&"a"], 1);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn test_index_missing_key_panics() {
        let map: HashMap<&str, i32, _> = HashMap::with_hasher(SipHashBuilder::default());
        let _ = map[&"missing"];
    }

    #[test]
    fn test_remove_entry() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_clear() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..50 {
            map.insert(i, i.to_string());
        }
        assert!(map.capacity() > 8);

        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 8);
        assert!(!map.contains_key(&1));

        map.insert(3, "three".to_string());
        assert_eq!(map.get(&3), Some(&"three".to_string()));
    }

    #[test]
    fn test_reserve_and_shrink_to_fit() {
        let mut map = HashMap::<i32, String, _>::with_hasher(SipHashBuilder::default());
        map.reserve(1000);
        let reserved = map.capacity();
        assert!(reserved * 7 > 1000 * 10);

        map.insert(1, "one".to_string());
        map.shrink_to_fit();
        assert_eq!(map.capacity(), 8);
        assert_eq!(map.get(&1), Some(&"one".to_string()));
    }

    #[test]
    fn test_iteration_visits_each_entry_once() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..500u32 {
            map.insert(i, i);
        }
        for i in (0..500u32).step_by(3) {
            map.remove(&i);
        }

        let iter = map.iter();
        assert_eq!(iter.len(), map.len());
        let mut seen: Vec<u32> = iter
            .map(|(k, v)| {
                assert_eq!(k, v);
                *k
            })
            .collect();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..500u32).filter(|i| i % 3 != 0).collect();
        assert_eq!(seen, expected);

        // Restarting yields the same sequence.
        let first: Vec<u32> = map.keys().copied().collect();
        let second: Vec<u32> = map.keys().copied().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_into_iter_and_drain() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let drained: std::collections::HashMap<i32, String> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 8);
        assert_eq!(drained.get(&2), Some(&"two".to_string()));

        map.insert(4, "four".to_string());
        let owned: Vec<(i32, String)> = map.into_iter().collect();
        assert_eq!(owned, vec![(4, "four".to_string())]);
    }

    #[test]
    fn test_scenario_insert_find_remove() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        assert_eq!(map.capacity(), 8);
        map.insert(1, "a");
        map.insert(2, "b");
        map.insert(3, "c");
        assert_eq!(map.len(), 3);
        assert_eq!(map.get_key_value(&2), Some((&2, &"b")));

        assert_eq!(map.remove(&2), Some("b"));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_key_value(&2), None);
        assert_eq!(map.get(&1), Some(&"a"));
        assert_eq!(map.get(&3), Some(&"c"));
    }

    #[test]
    fn test_capacity_grows_and_shrinks_with_load() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        let mut capacity = map.capacity();
        assert_eq!(capacity, 8);

        for i in 0..100u64 {
            map.insert(i, i);
            let now = map.capacity();
            assert!(now.is_power_of_two());
            if now != capacity {
                assert_eq!(now, capacity * 2, "growth must double");
                assert!(map.len() * 10 >= capacity * 7, "grew early at {}", map.len());
            }
            assert!(map.len() * 10 < now * 7);
            capacity = now;
            map.table.assert_invariants();
        }
        assert_eq!(capacity, 256);

        for i in 0..99u64 {
            assert_eq!(map.remove(&i), Some(i));
            let now = map.capacity();
            if now != capacity {
                assert_eq!(now, capacity / 2, "shrink must halve");
                assert!(map.len() * 5 <= capacity, "shrank early at {}", map.len());
            } else {
                assert!(now == 8 || map.len() * 5 > now, "missed shrink at {}", map.len());
            }
            capacity = now;
            map.table.assert_invariants();
        }
        assert_eq!(map.len(), 1);
        assert_eq!(capacity, 8);
        assert_eq!(map.get(&99), Some(&99));
    }

    #[test]
    fn test_remove_everything_in_random_order() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        let mut keys: Vec<u64> = (0..2000).collect();
        for &k in &keys {
            map.insert(k, k * 3);
        }

        keys.shuffle(&mut SmallRng::seed_from_u64(0x5eed));
        for (removed, k) in keys.iter().enumerate() {
            assert_eq!(map.remove(k), Some(k * 3));
            assert_eq!(map.len(), keys.len() - removed - 1);
            if removed % 97 == 0 {
                map.table.assert_invariants();
            }
        }

        assert!(map.is_empty());
        assert_eq!(map.capacity(), 8);
        for k in &keys {
            assert_eq!(map.get(k), None);
        }
    }

    #[test]
    fn test_collision_handling() {
        let mut map: HashMap<u32, u32, ZeroHashBuilder> = HashMap::default();

        for i in 0..200 {
            map.insert(i, i * 2);
        }
        assert_eq!(map.len(), 200);
        map.table.assert_invariants();

        for i in 0..200 {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }

        for i in (0..200).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
            map.table.assert_invariants();
        }

        assert_eq!(map.len(), 100);

        for i in (1..200).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
        for i in (0..200).step_by(2) {
            assert_eq!(map.get(&i), None);
        }
    }

    #[test]
    fn test_from_iter_drops_duplicates() {
        let map: HashMap<i32, &str, SipHashBuilder> =
            [(1, "first"), (2, "two"), (1, "second")].into_iter().collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1), Some(&"first"));

        let mut extended = map.clone();
        extended.extend([(2, "ignored"), (3, "three")]);
        assert_eq!(extended.len(), 3);
        assert_eq!(extended.get(&2), Some(&"two"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    #[cfg(any(feature = "foldhash", feature = "std"))]
    fn test_from_literal_list() {
        let map = HashMap::from([(1, "a"), (2, "b"), (3, "c"), (2, "dup")]);
        assert_eq!(map.len(), 3);
        assert_eq!(map[&2], "b");

        let empty: HashMap<u8, u8> = HashMap::from([]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_equality_ignores_layout() {
        let a: HashMap<i32, i32, SipHashBuilder> = (0..50).map(|i| (i, i)).collect();
        let b: HashMap<i32, i32, SipHashBuilder> = (0..50).rev().map(|i| (i, i)).collect();
        assert_eq!(a, b);

        let mut c = b.clone();
        *c.get_mut(&7).unwrap() = -7;
        assert_ne!(a, c);
        c.remove(&7);
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_format() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "a");
        assert_eq!(format!("{:?}", map), r#"{1: "a"}"#);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = HashMap::with_hasher(SipHashBuilder::default());
        for i in 0..20 {
            map.insert(i, i);
        }
        let mut cloned = map.clone();
        cloned.remove(&0);
        *cloned.get_mut(&1).unwrap() = 100;

        assert_eq!(map.get(&0), Some(&0));
        assert_eq!(map.get(&1), Some(&1));
        assert_eq!(cloned.get(&0), None);
        assert_eq!(cloned.get(&1), Some(&100));
    }

    #[test]
    fn test_probe_histogram_counts_entries() {
        let mut map: HashMap<u32, (), ZeroHashBuilder> = HashMap::default();
        for i in 0..4 {
            map.insert(i, ());
        }
        assert_eq!(map.probe_histogram().counts(), &[1, 1, 1, 1]);
        assert_eq!(map.debug_stats().max_displacement, 3);
    }

}
