use alloc::collections::VecDeque;

/// A FIFO that keeps at most `capacity` items. Pushing into a full buffer
/// evicts the oldest item and counts it as dropped.
#[derive(Debug)]
pub struct CapacityRingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
    dropped: usize,
}

impl<T> CapacityRingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self { items: VecDeque::with_capacity(capacity), capacity, dropped: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push_overwrite(&mut self, item: T) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
            self.dropped += 1;
        }
        self.items.push_back(item);
    }

    pub fn remove(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item=&T> {
        self.items.iter()
    }

    /// Number of items evicted or refused since creation.
    pub fn dropped_items(&self) -> usize {
        self.dropped
    }
}
