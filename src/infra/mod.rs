//! Record store implementations.
//!
//! [`RestRecordStore`] talks to the hosted record store over HTTP.
//! [`MemoryRecordStore`] keeps everything in process.

mod memory;
pub mod rest;

pub use memory::MemoryRecordStore;
pub use rest::RestRecordStore;
