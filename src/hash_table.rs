//! A raw open-addressed hash table using Robin Hood placement and
//! backward-shift deletion.
//!
//! The table is addressed by a precomputed `u64` hash and an equality
//! predicate, which keeps it independent of any particular key type or
//! hasher. [`HashMap`](crate::HashMap) layers keyed access on top of it.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem;

/// Smallest number of slots a table ever allocates.
pub const MIN_CAPACITY: usize = 8;

/// `len / capacity >= 0.7`: the table doubles.
#[inline(always)]
fn exceeds_growth_threshold(len: usize, capacity: usize) -> bool {
    len as u128 * 10 >= capacity as u128 * 7
}

/// `len / capacity <= 0.2`: the table halves.
#[inline(always)]
fn within_shrink_threshold(len: usize, capacity: usize) -> bool {
    len as u128 * 5 <= capacity as u128
}

/// Smallest valid capacity holding `len` entries without crossing the growth
/// threshold.
fn capacity_for(len: usize) -> usize {
    let mut capacity = MIN_CAPACITY;
    while exceeds_growth_threshold(len, capacity) {
        capacity = capacity.checked_mul(2).expect("capacity overflow");
    }
    capacity
}

fn empty_slots<V>(capacity: usize) -> Box<[Slot<V>]> {
    debug_assert!(capacity.is_power_of_two() && capacity >= MIN_CAPACITY);
    (0..capacity).map(|_| Slot::Empty).collect()
}

#[derive(Clone)]
struct Bucket<V> {
    hash: u64,
    /// Forward distance from the ideal index to the slot holding this bucket.
    displacement: usize,
    value: V,
}

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied(Bucket<V>),
}

impl<V> Slot<V> {
    #[inline(always)]
    fn bucket(&self) -> Option<&Bucket<V>> {
        match self {
            Slot::Occupied(bucket) => Some(bucket),
            Slot::Empty => None,
        }
    }

    #[inline(always)]
    fn bucket_mut(&mut self) -> Option<&mut Bucket<V>> {
        match self {
            Slot::Occupied(bucket) => Some(bucket),
            Slot::Empty => None,
        }
    }

    #[inline(always)]
    fn into_bucket(self) -> Option<Bucket<V>> {
        match self {
            Slot::Occupied(bucket) => Some(bucket),
            Slot::Empty => None,
        }
    }
}

/// Distribution of entries by probe distance.
///
/// `counts()[d]` is the number of entries sitting `d` slots past their ideal
/// index. Only available in tests or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeHistogram {
    counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ProbeHistogram {
    /// Entry counts indexed by displacement.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Total number of entries counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Longest probe distance of any entry, or `None` for an empty table.
    pub fn max_displacement(&self) -> Option<usize> {
        self.counts.iter().rposition(|&count| count != 0)
    }

    /// Average probe distance across all entries.
    pub fn mean_displacement(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .counts
            .iter()
            .enumerate()
            .map(|(distance, count)| distance * count)
            .sum();
        weighted as f64 / total as f64
    }

    /// Pretty-prints the histogram as a horizontal bar chart on stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!("probe histogram ({} entries):", self.total());

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                0 => None,
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                _ => Some('▉'),
            };
            bar.extend(partial);
            bar
        };

        for (distance, &count) in self.counts.iter().enumerate() {
            println!("{:>3} | {} ({})", distance, make_bar(count), count);
        }
    }
}

/// Debug statistics for hash table analysis.
///
/// Only available in tests or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of slots allocated
    pub capacity: usize,
    /// Population at which the next insertion doubles the table
    pub growth_limit: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Longest probe distance of any entry
    pub max_displacement: usize,
    /// Average probe distance
    pub mean_displacement: f64,
    /// Total memory in bytes used by the slot array
    pub total_bytes: usize,
    /// Bytes held by empty slots
    pub wasted_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} slots ({:.2}% load factor, grows at {})",
            self.populated,
            self.capacity,
            self.load_factor * 100.0,
            self.growth_limit
        );
        println!(
            "Probe distance: max {}, mean {:.3}",
            self.max_displacement, self.mean_displacement
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
        println!(
            "Memory: {} bytes wasted ({:.02}%)",
            self.wasted_bytes,
            if self.total_bytes == 0 {
                0.0
            } else {
                (self.wasted_bytes as f64 / self.total_bytes as f64) * 100.0
            }
        );
    }
}

/// An open-addressed hash table using Robin Hood hashing.
///
/// `HashTable<V>` stores values of type `V` in a single power-of-two array
/// of slots. Like other raw tables, it requires you to provide both the hash
/// value and an equality predicate for each operation.
///
/// Insertion walks forward from the ideal slot (`hash mod capacity`) and
/// hands a slot over to whichever entry is further from home. Removal shifts
/// later entries of the same probe run backward, so the table never holds
/// tombstones. The table doubles once it reaches 70% load and halves after a
/// removal drops it to 20% load, never going below [`MIN_CAPACITY`] slots.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use robin_map::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// #
/// # fn hash_id(id: u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
/// let hash = hash_id(123);
///
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     robin_map::hash_table::Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     robin_map::hash_table::Entry::Occupied(_) => {
///         println!("Person already exists");
///     }
/// }
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: Box<[Slot<V>]>,
    populated: usize,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use alloc::format;
        use alloc::string::String;
        use alloc::string::ToString;

        f.debug_struct("HashTable")
            .field(
                "slots",
                &self
                    .slots
                    .chunks(16)
                    .map(|row| {
                        row.iter()
                            .map(|slot| match slot.bucket() {
                                Some(bucket) => format!("{:02}", bucket.displacement),
                                None => "..".to_string(),
                            })
                            .collect::<Vec<String>>()
                            .join(", ")
                    })
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`MIN_CAPACITY`] slots.
    pub fn new() -> Self {
        Self {
            slots: empty_slots(MIN_CAPACITY),
            populated: 0,
        }
    }

    /// Creates a table that can hold at least `capacity` values without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert!(table.capacity() * 7 > 100 * 10);
    /// assert!(table.capacity().is_power_of_two());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: empty_slots(capacity_for(capacity)),
            populated: 0,
        }
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline(always)]
    fn ideal_index(&self, hash: u64) -> usize {
        hash as usize & self.mask()
    }

    #[inline(always)]
    fn next_index(&self, index: usize) -> usize {
        (index + 1) & self.mask()
    }

    /// Forward distance from `from` to `to`, wrapping at the end of the
    /// table.
    #[inline(always)]
    fn distance(&self, from: usize, to: usize) -> usize {
        to.wrapping_sub(from) & self.mask()
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Values are yielded in slot order, which is neither insertion order
    /// nor any order derived from the values themselves.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_map::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table
    ///     .entry(hash_str("key1"), |s: &String| s == "key1")
    ///     .or_insert("key1".to_string());
    /// table
    ///     .entry(hash_str("key2"), |s: &String| s == "key2")
    ///     .or_insert("key2".to_string());
    ///
    /// assert_eq!(table.iter().count(), 2);
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator yielding mutable references to all values.
    ///
    /// Mutating a value must not change its hash or its equality with other
    /// values, or later lookups will miss it.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.populated,
        }
    }

    /// Removes and yields every value, leaving the table empty with
    /// [`MIN_CAPACITY`] slots.
    ///
    /// The table is emptied up front, so dropping the iterator early still
    /// drops the remaining values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..20u64 {
    ///     table.entry(n, |&v: &u64| v == n).or_insert(n);
    /// }
    ///
    /// let values: Vec<u64> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(values.len(), 20);
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        let remaining = mem::replace(&mut self.populated, 0);
        let slots = mem::replace(&mut self.slots, empty_slots(MIN_CAPACITY));
        Drain {
            inner: IntoIter {
                slots: slots.into_vec().into_iter(),
                remaining,
            },
            _table: PhantomData,
        }
    }

    /// Returns `true` if the table contains no values.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of values in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.len(), 0);
    ///
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of slots currently allocated.
    ///
    /// This is always a power of two and at least [`MIN_CAPACITY`]. The table
    /// doubles when an insertion brings the population to 70% of this value.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Removes all values and returns the table to [`MIN_CAPACITY`] slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..100u64 {
    ///     table.entry(n, |&v: &u64| v == n).or_insert(n);
    /// }
    /// assert!(table.capacity() > 8);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.capacity(), 8);
    /// ```
    pub fn clear(&mut self) {
        self.slots = empty_slots(MIN_CAPACITY);
        self.populated = 0;
    }

    /// Shrinks the table to the smallest capacity that holds its values
    /// below the growth threshold.
    pub fn shrink_to_fit(&mut self) {
        let target = capacity_for(self.populated);
        if target < self.capacity() {
            self.rehash(target);
        }
    }

    /// Reserves capacity for at least `additional` more values without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.reserve(50);
    /// let capacity = table.capacity();
    /// for n in 0..50u64 {
    ///     table.entry(n, |&v| v == n).or_insert(n);
    /// }
    /// assert_eq!(table.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        let target = capacity_for(self.populated.saturating_add(additional));
        if target > self.capacity() {
            self.rehash(target);
        }
    }

    /// Removes and returns a value from the table.
    ///
    /// The remaining entries of the probe run are shifted backward into the
    /// vacated slot, and the table shrinks if it drops to 20% load. Removing
    /// a value that is not present changes nothing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_map::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// let removed = table.remove(hash_u64(42), |&n| n == 42);
    /// assert_eq!(removed, Some(42));
    /// assert!(table.is_empty());
    ///
    /// let not_found = table.remove(hash_u64(99), |&n| n == 99);
    /// assert_eq!(not_found, None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_at(index))
    }

    /// Gets an entry for the given hash and equality predicate.
    ///
    /// The table only grows when a [`VacantEntry`] is actually filled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_map::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_str(s: &str) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     s.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// let hash = hash_str("hello");
    ///
    /// match table.entry(hash, |s: &String| s == "hello") {
    ///     robin_map::hash_table::Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string());
    ///     }
    ///     robin_map::hash_table::Entry::Occupied(mut entry) => {
    ///         entry.get_mut().push('!');
    ///     }
    /// }
    ///
    /// table
    ///     .entry(hash, |s: &String| s == "hello")
    ///     .or_insert("unused".to_string());
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        match self.find_index(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Walks the probe run from the ideal slot until the value or an empty
    /// slot is found.
    #[inline]
    fn find_index(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        if self.populated == 0 {
            return None;
        }

        // Load stays under 70%, so an empty slot always ends the walk.
        let mut index = self.ideal_index(hash);
        loop {
            let bucket = self.slots[index].bucket()?;
            if bucket.hash == hash && eq(&bucket.value) {
                return Some(index);
            }
            index = self.next_index(index);
        }
    }

    /// Finds a value in the table by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::Hash;
    /// # use core::hash::Hasher;
    /// #
    /// # use robin_map::hash_table::HashTable;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # fn hash_u64(n: u64) -> u64 {
    /// #     let mut hasher = SipHasher::new();
    /// #     n.hash(&mut hasher);
    /// #     hasher.finish()
    /// # }
    /// #
    /// let mut table = HashTable::new();
    /// table.entry(hash_u64(42), |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(hash_u64(42), |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(hash_u64(99), |&n| n == 99), None);
    /// ```
    #[inline]
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let index = self.find_index(hash, eq)?;
        self.slots[index].bucket().map(|bucket| &bucket.value)
    }

    /// Finds a value in the table by hash and equality predicate, returning a
    /// mutable reference.
    #[inline]
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let index = self.find_index(hash, eq)?;
        self.slots[index].bucket_mut().map(|bucket| &mut bucket.value)
    }

    /// Robin Hood placement of a value known to be absent. Returns the slot
    /// the value itself ended up in.
    fn place(&mut self, hash: u64, value: V) -> usize {
        let mut candidate = Bucket {
            hash,
            displacement: 0,
            value,
        };
        let mut index = self.ideal_index(hash);
        let mut landed = None;

        loop {
            let slot = &mut self.slots[index];
            match slot {
                Slot::Empty => {
                    *slot = Slot::Occupied(candidate);
                    self.populated += 1;
                    return landed.unwrap_or(index);
                }
                Slot::Occupied(resident) => {
                    if candidate.displacement > resident.displacement {
                        mem::swap(&mut candidate, resident);
                        landed.get_or_insert(index);
                    }
                }
            }

            candidate.displacement += 1;
            index = self.next_index(index);
        }
    }

    /// Places a value known to be absent, growing first if the insertion
    /// would reach the growth threshold.
    fn insert_unique(&mut self, hash: u64, value: V) -> usize {
        let capacity = self.capacity();
        if exceeds_growth_threshold(self.populated + 1, capacity) {
            self.rehash(capacity * 2);
        }
        self.place(hash, value)
    }

    fn remove_at(&mut self, index: usize) -> V {
        let removed = mem::replace(&mut self.slots[index], Slot::Empty);
        let Some(removed) = removed.into_bucket() else {
            unreachable!("remove_at on empty slot {index}");
        };
        self.populated -= 1;

        self.backward_shift(index);
        self.maybe_shrink();

        removed.value
    }

    /// Closes the hole left at `hole` by pulling later entries of the probe
    /// run backward.
    ///
    /// An entry may move into the hole only if the walk from its ideal slot
    /// to its current slot passes through the hole. Entries that moved get
    /// their displacement rewritten.
    fn backward_shift(&mut self, mut hole: usize) {
        let mut index = self.next_index(hole);

        while let Some(bucket) = self.slots[index].bucket() {
            let ideal = self.ideal_index(bucket.hash);
            let to_hole = self.distance(ideal, hole);

            if to_hole < self.distance(ideal, index) {
                self.slots.swap(hole, index);
                if let Some(moved) = self.slots[hole].bucket_mut() {
                    moved.displacement = to_hole;
                }
                hole = index;
            }

            index = self.next_index(index);
        }
    }

    /// Halves the table after a removal that left it at or below 20% load.
    ///
    /// A table presized by `with_capacity` or `reserve` can sit well below
    /// that, so halving repeats until the load is above 20% or the table is
    /// back at [`MIN_CAPACITY`]. The rehash happens once, at the final size.
    fn maybe_shrink(&mut self) {
        let capacity = self.capacity();
        let mut target = capacity;
        while target > MIN_CAPACITY && within_shrink_threshold(self.populated, target) {
            target /= 2;
        }
        if target < capacity {
            self.rehash(target);
        }
    }

    /// Moves every value into fresh storage of `capacity` slots by ordinary
    /// Robin Hood placement.
    #[cold]
    fn rehash(&mut self, capacity: usize) {
        debug_assert!(!exceeds_growth_threshold(self.populated, capacity));

        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        self.populated = 0;
        for bucket in old.into_vec().into_iter().filter_map(Slot::into_bucket) {
            self.place(bucket.hash, bucket.value);
        }
    }

    /// Computes the distribution of probe distances for the current table
    /// state.
    ///
    /// Only available in tests or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> ProbeHistogram {
        let mut counts = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(bucket) = slot.bucket() {
                let distance = self.distance(self.ideal_index(bucket.hash), index);
                if counts.len() <= distance {
                    counts.resize(distance + 1, 0);
                }
                counts[distance] += 1;
            }
        }
        ProbeHistogram { counts }
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Only available in tests or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let histogram = self.probe_histogram();
        let capacity = self.capacity();
        let slot_size = mem::size_of::<Slot<V>>();

        DebugStats {
            populated: self.populated,
            capacity,
            growth_limit: (0..=capacity)
                .find(|&len| exceeds_growth_threshold(len, capacity))
                .unwrap_or(capacity),
            load_factor: self.populated as f64 / capacity as f64,
            max_displacement: histogram.max_displacement().unwrap_or(0),
            mean_displacement: histogram.mean_displacement(),
            total_bytes: capacity * slot_size,
            wasted_bytes: (capacity - self.populated) * slot_size,
        }
    }

    /// Checks load bounds, reachability of every entry from its ideal slot,
    /// displacement bookkeeping, and the population count.
    ///
    /// A non-empty table must sit above 20% load unless it is at
    /// [`MIN_CAPACITY`]. Use [`Self::assert_presized_invariants`] for tables
    /// built by `with_capacity` or `reserve` that have not seen a removal.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let capacity = self.capacity();
        assert!(
            self.populated == 0
                || capacity == MIN_CAPACITY
                || !within_shrink_threshold(self.populated, capacity),
            "{} entries in {} slots should have shrunk",
            self.populated,
            capacity
        );
        self.assert_presized_invariants();
    }

    /// Everything [`Self::assert_invariants`] checks except the shrink side
    /// of the load bounds.
    #[cfg(test)]
    pub(crate) fn assert_presized_invariants(&self) {
        let capacity = self.capacity();
        assert!(capacity.is_power_of_two(), "capacity {capacity}");
        assert!(capacity >= MIN_CAPACITY, "capacity {capacity}");
        assert!(
            !exceeds_growth_threshold(self.populated, capacity),
            "{} entries in {} slots",
            self.populated,
            capacity
        );

        let mut occupied = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(bucket) = slot.bucket() else {
                continue;
            };
            occupied += 1;

            let ideal = self.ideal_index(bucket.hash);
            assert_eq!(
                bucket.displacement,
                self.distance(ideal, index),
                "stale displacement at slot {index}: {self:?}"
            );

            let mut probe = ideal;
            while probe != index {
                assert!(
                    self.slots[probe].bucket().is_some(),
                    "slot {index} unreachable from {ideal}, gap at {probe}: {self:?}"
                );
                probe = self.next_index(probe);
            }
        }
        assert_eq!(occupied, self.populated);
    }
}

impl<V> IntoIterator for HashTable<V> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter {
            slots: self.slots.into_vec().into_iter(),
            remaining: self.populated,
        }
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<'a, V> IntoIterator for &'a mut HashTable<V> {
    type Item = &'a mut V;
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> IterMut<'a, V> {
        self.iter_mut()
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - the value is not present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - the value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    ///
    /// An occupied entry keeps its existing value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    ///
    /// let value = table.entry(7, |&(k, _): &(u8, &str)| k == 1).or_insert((1, "a"));
    /// assert_eq!(value.1, "a");
    ///
    /// let existing = table.entry(7, |&(k, _)| k == 1).or_insert((1, "b"));
    /// assert_eq!(existing.1, "a");
    /// ```
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Applies `f` to an occupied entry's value and returns it. A vacant
    /// entry is left untouched and `None` is returned.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Option<&'a mut V> {
        match self {
            Entry::Occupied(entry) => {
                let value = entry.into_mut();
                f(value);
                Some(value)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when no
/// value matches.
///
/// [`entry`]: HashTable::entry
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Inserts a value into the vacant entry and returns a mutable reference to
    /// it.
    ///
    /// The table doubles first if this insertion brings it to 70% load, so
    /// the returned reference always points into the final storage.
    pub fn insert(self, value: V) -> &'a mut V {
        let table = self.table;
        let index = table.insert_unique(self.hash, value);
        match table.slots[index].bucket_mut() {
            Some(bucket) => &mut bucket.value,
            None => unreachable!("placed value missing from slot {index}"),
        }
    }
}

/// A view into an occupied entry in the hash table.
///
/// This struct is created by the [`entry`] method on [`HashTable`] when a
/// value matches.
///
/// [`entry`]: HashTable::entry
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    fn bucket(&self) -> &Bucket<V> {
        match self.table.slots[self.index].bucket() {
            Some(bucket) => bucket,
            None => unreachable!("occupied entry at empty slot {}", self.index),
        }
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.bucket().value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        match self.table.slots[self.index].bucket_mut() {
            Some(bucket) => &mut bucket.value,
            None => unreachable!("occupied entry at empty slot {}", self.index),
        }
    }

    /// Converts the entry into a mutable reference to the value, bound to
    /// the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        let index = self.index;
        let table = self.table;
        match table.slots[index].bucket_mut() {
            Some(bucket) => &mut bucket.value,
            None => unreachable!("occupied entry at empty slot {index}"),
        }
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        self.table.remove_at(self.index)
    }
}

/// An iterator over the values in a [`HashTable`], in slot order.
///
/// This struct is created by the [`iter`] method on [`HashTable`].
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V> {
    slots: core::slice::Iter<'a, Slot<V>>,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bucket = self.slots.find_map(Slot::bucket)?;
        self.remaining -= 1;
        Some(&bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}
impl<V> FusedIterator for Iter<'_, V> {}

/// A mutable iterator over the values in a [`HashTable`], in slot order.
pub struct IterMut<'a, V> {
    slots: core::slice::IterMut<'a, Slot<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bucket = self.slots.find_map(Slot::bucket_mut)?;
        self.remaining -= 1;
        Some(&mut bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}
impl<V> FusedIterator for IterMut<'_, V> {}

/// An owning iterator over the values of a [`HashTable`], in slot order.
pub struct IntoIter<V> {
    slots: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let bucket = self.slots.find_map(Slot::into_bucket)?;
        self.remaining -= 1;
        Some(bucket.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}
impl<V> FusedIterator for IntoIter<V> {}

/// A draining iterator over the values in a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
pub struct Drain<'a, V> {
    inner: IntoIter<V>,
    _table: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}
impl<V> FusedIterator for Drain<'_, V> {}
