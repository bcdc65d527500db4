//! Persistence over a memory-mapped file.
//!
//! The allocator itself has no notion of "first use" — that convention
//! belongs to the caller. Here it's: a file shorter than the requested
//! length, or one whose first 8 bytes are all zero, is treated as fresh and
//! initialized; anything else is assumed to already hold a live heap and is
//! attached as-is.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use memmap2::MmapMut;

use crate::Allocator;

/// Opens (creating if necessary) a `len`-byte file at `path`, memory-maps
/// it, and returns both the mapping and an `Allocator` handle over it.
///
/// The mapping must outlive the `Allocator` handle: the control block and
/// every free list point into it.
pub fn open_mmap(path: impl AsRef<Path>, len: usize) -> io::Result<(MmapMut, Allocator)> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(path)?;
    file.set_len(len as u64)?;

    let mut mapping = unsafe { MmapMut::map_mut(&file)? };
    let fresh = mapping[..8].iter().all(|&b| b == 0);

    let alloc = if fresh {
        unsafe { Allocator::init(&mut mapping[..]) }
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
    } else {
        unsafe { Allocator::attach(&mut mapping[..]) }
    };

    Ok((mapping, alloc))
}
