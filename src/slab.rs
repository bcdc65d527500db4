//! The slab subsystem: small (<= 32 KiB) allocations carved out of 64 KiB
//! buddy pages. Once sliced into a given size class, a page is never
//! returned to the buddy pool — only the items within it come and go.

use crate::control::Allocator;
use crate::header::{self, HEADER_SIZE};
use crate::list::ListNode;
use crate::size_class::{page_to_bytes, PAGE_SIZE};

/// Pops a free item of class `p` if one is already on hand.
///
/// # Safety
/// `alloc` must describe an initialized region.
pub(crate) unsafe fn try_fast_alloc(alloc: &Allocator, p: usize) -> Option<*mut u8> {
    let cb = alloc.control_ptr();
    let root = &mut (*cb).p_free[p] as *mut ListNode;
    if ListNode::is_empty(root) {
        return None;
    }

    let node = (*root).next;
    ListNode::unlink(node);
    let hdr_ptr = header::hdr_of(node);
    header::write_header(hdr_ptr, true, false, p as u32);
    Some(hdr_ptr.add(HEADER_SIZE))
}

/// Slices a freshly acquired, still buddy-class-0-headered 64 KiB page into
/// class-`p` items: every item but the first is written with a free header
/// and linked into `p_free[p]`, and the first is handed back to the caller
/// as the allocated result.
///
/// # Safety
/// `page_hdr` must be the header address of a whole, otherwise-untouched
/// 64 KiB block just obtained from [`buddy::acquire`](crate::buddy::acquire)
/// at class 0.
pub(crate) unsafe fn slice_page(alloc: &Allocator, page_hdr: *mut u8, p: usize) -> *mut u8 {
    let cb = alloc.control_ptr();
    let item_size = page_to_bytes(p);
    let root = &mut (*cb).p_free[p] as *mut ListNode;
    let page_end = page_hdr.add(PAGE_SIZE);

    let mut item = page_hdr.add(item_size);
    while item.add(item_size) <= page_end {
        header::write_header(item, false, false, p as u32);
        ListNode::link(root, header::node_of(item));
        item = item.add(item_size);
    }

    header::write_header(page_hdr, true, false, p as u32);
    page_hdr.add(HEADER_SIZE)
}
