//! The in-band 8-byte header word every block and slab item carries.
//!
//! Laid out as bitfields the same way `libmei`'s page headers are: a packed
//! integer with named sub-fields, overlaid directly onto raw memory via a
//! pointer cast rather than parsed field-by-field.

use modular_bitfield::prelude::*;

use crate::list::ListNode;

pub(crate) const HEADER_SIZE: usize = 8;

#[bitfield(bits = 64)]
#[derive(Clone, Copy)]
pub(crate) struct HeaderWord {
    pub allocated: B1,
    pub is_buddy: B1,
    pub class: B62,
}

/// The list-node pointers of a free block start right after its header.
///
/// # Safety
/// `hdr_ptr` must point at a live header word with at least
/// `HEADER_SIZE + size_of::<ListNode>()` bytes of valid memory after it.
#[inline]
pub(crate) unsafe fn node_of(hdr_ptr: *mut u8) -> *mut ListNode {
    hdr_ptr.add(HEADER_SIZE) as *mut ListNode
}

/// The inverse of [`node_of`].
///
/// # Safety
/// `node_ptr` must have been produced by [`node_of`] on a still-valid block.
#[inline]
pub(crate) unsafe fn hdr_of(node_ptr: *mut ListNode) -> *mut u8 {
    (node_ptr as *mut u8).sub(HEADER_SIZE)
}

/// Writes a header word at `hdr_ptr`.
///
/// # Safety
/// `hdr_ptr` must be valid for writes of `HEADER_SIZE` bytes.
#[inline]
pub(crate) unsafe fn write_header(hdr_ptr: *mut u8, allocated: bool, is_buddy: bool, class: u32) {
    let mut h = HeaderWord::new();
    h.set_allocated(allocated as u8);
    h.set_is_buddy(is_buddy as u8);
    h.set_class(class as u64);
    (hdr_ptr as *mut HeaderWord).write(h);
}

/// Reads the header word at `hdr_ptr`.
///
/// # Safety
/// `hdr_ptr` must be valid for reads of `HEADER_SIZE` bytes.
#[inline]
pub(crate) unsafe fn read_header(hdr_ptr: *mut u8) -> HeaderWord {
    (hdr_ptr as *const HeaderWord).read()
}
