//! Timestamped event records for the log transport

use serde::{Deserialize, Serialize};

use crate::event::Event;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub time_ms: u32,
    pub event: Event,
}

impl EventRecord {
    /// Upper bound of an encoded record in bytes
    pub const MAX_SIZE: usize = 16;

    pub fn new(time_ms: u32, event: Event) -> Self {
        Self { time_ms, event }
    }

    /// Encode into `buf`, returning the used part
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], postcard::Error> {
        postcard::to_slice(self, buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
