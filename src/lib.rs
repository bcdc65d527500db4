#![cfg_attr(not(feature = "std"), no_std)]

//! A fixed-region heap allocator combining a buddy allocator (large, >32 KiB
//! blocks) with a segregated slab allocator (small, <=32 KiB items) over a
//! single contiguous byte range supplied by the caller.
//!
//! Everything the allocator needs to describe itself — the control block,
//! every header word, every free-list pointer — lives inside that byte
//! range. Nothing is heap-allocated by this crate, and nothing is locked:
//! callers who share one region across threads are responsible for
//! serializing their own calls.

mod bug;
mod buddy;
mod control;
mod error;
mod header;
mod list;
mod size_class;
mod slab;

#[cfg(feature = "mmap")]
mod mmap;

pub use control::Allocator;
pub use error::{Error, Result};
pub use size_class::{
    bytes_to_buddy, bytes_to_page, buddy_to_bytes, page_to_bytes, BUDDY_CLASSES, MAX_SLAB_BYTES,
    PAGE_SIZE, SLAB_CLASSES,
};

#[cfg(feature = "mmap")]
pub use mmap::open_mmap;
