//! Rolling average window
//!
//! Fixed capacity FIFO of the most recent samples with a running sum, so
//! appending and averaging are both O(1). Storage is a flat array sized at
//! compile time; nothing is allocated after construction.

/// Ring buffer of the last `capacity` samples, `capacity <= N`
///
/// The logical capacity is a runtime value so the same storage can serve any
/// configured window length up to `N`.
#[derive(Clone, Debug)]
pub struct BoundedAverageWindow<const N: usize> {
    array: [i32; N],
    // index of the oldest sample
    head: usize,
    count: usize,
    capacity: usize,
    sum: i64,
}

impl<const N: usize> BoundedAverageWindow<N> {
    /// Create an empty window holding at most `capacity` samples
    ///
    /// # Panics
    /// Panics if `capacity` is zero or larger than `N`
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 1 && capacity <= N,
            "Window capacity must be within 1..=N"
        );

        Self {
            array: [0; N],
            head: 0,
            count: 0,
            capacity,
            sum: 0,
        }
    }

    /// Push `value` to the tail, evicting the oldest sample when full
    ///
    /// Returns the appended value.
    pub fn append(&mut self, value: i32) -> i32 {
        if self.count == self.capacity {
            // tail wrapped onto head: overwrite the oldest sample
            self.sum -= self.array[self.head] as i64;
            self.array[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        } else {
            let tail = (self.head + self.count) % self.capacity;
            self.array[tail] = value;
            self.count += 1;
        }
        self.sum += value as i64;

        value
    }

    /// Truncated mean of the stored samples, 0 when empty
    pub fn average(&self) -> i32 {
        if self.count == 0 {
            return 0;
        }

        (self.sum / self.count as i64) as i32
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity
    }

    /// Drop all samples, keeping the capacity
    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
        self.sum = 0;
    }

    /// Drop all samples and switch to a new logical capacity
    ///
    /// # Panics
    /// Panics if `capacity` is zero or larger than `N`
    pub fn reset(&mut self, capacity: usize) {
        assert!(
            capacity >= 1 && capacity <= N,
            "Window capacity must be within 1..=N"
        );
        self.capacity = capacity;
        self.clear();
    }
}
