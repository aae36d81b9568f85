use core::cell::UnsafeCell;
use cortex_m::interrupt::{self, CriticalSection};

/// Millisecond tick shared between the timer interrupt and the main loop
///
/// Only written inside a critical section, wraps after ~49 days. Lap times are
/// computed with wrapping arithmetic so the wrap is harmless.
pub struct CSCounter<T>(pub UnsafeCell<T>);

unsafe impl<T> Sync for CSCounter<T> {}

impl CSCounter<u32> {
    pub fn increment(&self, _cs: &CriticalSection) {
        #[allow(unsafe_code)]
        unsafe {
            let tick = self.0.get();
            *tick = (*tick).wrapping_add(1);
        }
    }

    pub fn get(&self) -> u32 {
        interrupt::free(|_cs| {
            #[allow(unsafe_code)]
            unsafe {
                *self.0.get()
            }
        })
    }
}
