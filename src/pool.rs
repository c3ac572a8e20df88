//! Tiered buffer and string pools.
//!
//! Generalizes the teacher's single-tier `utils::performance::StringPool`
//! (one `Arc<parking_lot::Mutex<Vec<String>>>` capped by a max size) into
//! three size-bucketed tiers, each with its own ceiling and counters, so a
//! caller doing lots of small allocations doesn't get crowded out of the
//! pool by a few oversized ones.

use parking_lot::Mutex;

/// Size buckets a buffer or string can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Small,
    Medium,
    Large,
}

impl Tier {
    fn of(len: usize, small_ceiling: usize, medium_ceiling: usize) -> Tier {
        if len <= small_ceiling {
            Tier::Small
        } else if len <= medium_ceiling {
            Tier::Medium
        } else {
            Tier::Large
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TierStats {
    pub gets: u64,
    pub puts: u64,
    pub allocs: u64,
    pub discards: u64,
}

struct TierPool<T> {
    ceiling: usize,
    max_entries: usize,
    items: Mutex<Vec<T>>,
    stats: Mutex<TierStats>,
}

impl<T> TierPool<T> {
    fn new(ceiling: usize, max_entries: usize) -> Self {
        TierPool {
            ceiling,
            max_entries,
            items: Mutex::new(Vec::new()),
            stats: Mutex::new(TierStats::default()),
        }
    }

    fn take(&self) -> Option<T> {
        let mut items = self.items.lock();
        let mut stats = self.stats.lock();
        stats.gets += 1;
        let item = items.pop();
        if item.is_none() {
            stats.allocs += 1;
        }
        item
    }

    fn give(&self, item: T, len: usize) {
        let mut stats = self.stats.lock();
        stats.puts += 1;
        if len > self.ceiling {
            stats.discards += 1;
            return;
        }
        let mut items = self.items.lock();
        if items.len() >= self.max_entries {
            stats.discards += 1;
            return;
        }
        items.push(item);
    }

    fn stats(&self) -> TierStats {
        *self.stats.lock()
    }
}

/// A pool of reusable `Vec<u8>` buffers split into small/medium/large tiers.
/// Each tier has its own ceiling; a buffer whose capacity grows past its
/// tier's ceiling (including the large tier's) is discarded on `put` rather
/// than pooled, per `spec.md` §4.9: "`put` returns the object only when its
/// grown capacity remains within the tier's ceiling".
pub struct BufferPool {
    small: TierPool<Vec<u8>>,
    medium: TierPool<Vec<u8>>,
    large: TierPool<Vec<u8>>,
    small_ceiling: usize,
    medium_ceiling: usize,
}

impl BufferPool {
    pub fn new(
        small_ceiling: usize,
        medium_ceiling: usize,
        large_ceiling: usize,
        max_entries_per_tier: usize,
    ) -> Self {
        BufferPool {
            small: TierPool::new(small_ceiling, max_entries_per_tier),
            medium: TierPool::new(medium_ceiling, max_entries_per_tier),
            large: TierPool::new(large_ceiling, max_entries_per_tier),
            small_ceiling,
            medium_ceiling,
        }
    }

    fn tier_for(&self, hint_len: usize) -> &TierPool<Vec<u8>> {
        match Tier::of(hint_len, self.small_ceiling, self.medium_ceiling) {
            Tier::Small => &self.small,
            Tier::Medium => &self.medium,
            Tier::Large => &self.large,
        }
    }

    /// Get a buffer with at least `hint_len` capacity from the matching tier.
    pub fn get(&self, hint_len: usize) -> Vec<u8> {
        let mut buf = self
            .tier_for(hint_len)
            .take()
            .unwrap_or_else(|| Vec::with_capacity(hint_len));
        buf.clear();
        if buf.capacity() < hint_len {
            buf.reserve(hint_len - buf.capacity());
        }
        buf
    }

    /// Return a buffer to the tier matching its capacity.
    pub fn put(&self, buf: Vec<u8>) {
        let cap = buf.capacity();
        self.tier_for(cap).give(buf, cap);
    }

    pub fn stats(&self, tier: Tier) -> TierStats {
        match tier {
            Tier::Small => self.small.stats(),
            Tier::Medium => self.medium.stats(),
            Tier::Large => self.large.stats(),
        }
    }
}

impl Default for BufferPool {
    /// Ceilings per `spec.md` §4.9: Small ≤ 2 KiB, Medium ≤ 8 KiB, Large ≤
    /// 64 KiB.
    fn default() -> Self {
        BufferPool::new(2 * 1024, 8 * 1024, 64 * 1024, 64)
    }
}

/// A pool of reusable `String`s, same tiering scheme as `BufferPool`.
pub struct StringPool {
    small: TierPool<String>,
    medium: TierPool<String>,
    large: TierPool<String>,
    small_ceiling: usize,
    medium_ceiling: usize,
}

impl StringPool {
    pub fn new(
        small_ceiling: usize,
        medium_ceiling: usize,
        large_ceiling: usize,
        max_entries_per_tier: usize,
    ) -> Self {
        StringPool {
            small: TierPool::new(small_ceiling, max_entries_per_tier),
            medium: TierPool::new(medium_ceiling, max_entries_per_tier),
            large: TierPool::new(large_ceiling, max_entries_per_tier),
            small_ceiling,
            medium_ceiling,
        }
    }

    fn tier_for(&self, hint_len: usize) -> &TierPool<String> {
        match Tier::of(hint_len, self.small_ceiling, self.medium_ceiling) {
            Tier::Small => &self.small,
            Tier::Medium => &self.medium,
            Tier::Large => &self.large,
        }
    }

    pub fn acquire(&self, hint_len: usize) -> String {
        let mut s = self
            .tier_for(hint_len)
            .take()
            .unwrap_or_else(|| String::with_capacity(hint_len));
        s.clear();
        s
    }

    pub fn release(&self, s: String) {
        let cap = s.capacity();
        self.tier_for(cap).give(s, cap);
    }

    pub fn stats(&self, tier: Tier) -> TierStats {
        match tier {
            Tier::Small => self.small.stats(),
            Tier::Medium => self.medium.stats(),
            Tier::Large => self.large.stats(),
        }
    }
}

impl Default for StringPool {
    /// Ceilings per `spec.md` §4.9: Small ≤ 256 B, Medium ≤ 1 KiB, Large ≤
    /// 4 KiB (the stringbuilder-sized tiers, distinct from `BufferPool`'s
    /// byte-buffer ceilings).
    fn default() -> Self {
        StringPool::new(256, 1024, 4 * 1024, 64)
    }
}
