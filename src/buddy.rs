//! The buddy subsystem: whole-page acquisition for both direct large
//! allocations and fresh slab pages, and XOR-based coalescing on free.

use crate::control::Allocator;
use crate::header::{self, read_header};
use crate::list::ListNode;
use crate::size_class::{buddy_to_bytes, BUDDY_CLASSES};

/// Finds the smallest free class `>= k`, splitting larger blocks down as
/// needed, and hands back the header address of a class-exactly-`k` block
/// that has already been unlinked from every free list. The header at the
/// returned address is in the free/class-`k` state; the caller overwrites
/// it with whatever final state (allocated buddy block, or claimed slab
/// page) it needs.
///
/// Returns `None` if no block of class `>= k` exists anywhere in the region.
///
/// # Safety
/// `alloc` must describe a region previously initialized by
/// [`Allocator::init`](crate::control::Allocator::init).
pub(crate) unsafe fn acquire(alloc: &Allocator, k: u32) -> Option<*mut u8> {
    if k as usize >= BUDDY_CLASSES {
        return None;
    }

    let cb = alloc.control_ptr();
    let mut upper = k;
    while ListNode::is_empty(&mut (*cb).b_free[upper as usize]) {
        upper += 1;
        if upper as usize >= BUDDY_CLASSES {
            return None;
        }
    }

    let root = &mut (*cb).b_free[upper as usize] as *mut ListNode;
    let node = (*root).next;
    ListNode::unlink(node);
    let mut r = header::hdr_of(node);

    while upper > k {
        upper -= 1;
        let root = &mut (*cb).b_free[upper as usize] as *mut ListNode;
        header::write_header(r, false, true, upper);
        ListNode::link(root, header::node_of(r));
        r = r.add(buddy_to_bytes(upper));
    }

    Some(r)
}

/// Releases a class-`k` block back to the buddy pool, coalescing with its
/// buddy (and that buddy's buddy, and so on) for as long as the sibling is
/// free, in range, and of the matching class.
///
/// # Safety
/// `hdr_ptr` must be the header address of a block that was allocated (as a
/// direct buddy block, or as a just-vacated whole slab page) at class `k`
/// out of `alloc`.
pub(crate) unsafe fn release(alloc: &Allocator, mut hdr_ptr: *mut u8, mut k: u32) {
    let cb = alloc.control_ptr();
    let payload_base = alloc.payload_base();
    let end = (*cb).end;

    loop {
        if (k as usize) + 1 >= BUDDY_CLASSES {
            break;
        }

        let block_off = hdr_ptr as usize - payload_base;
        let buddy_off = block_off ^ buddy_to_bytes(k);
        let buddy_addr = payload_base + buddy_off;

        if buddy_addr < payload_base || buddy_addr >= end {
            break;
        }

        let buddy_ptr = buddy_addr as *mut u8;
        let buddy_header = read_header(buddy_ptr);
        if buddy_header.allocated() != 0
            || buddy_header.is_buddy() == 0
            || buddy_header.class() as u32 != k
        {
            break;
        }

        ListNode::unlink(header::node_of(buddy_ptr));
        hdr_ptr = hdr_ptr.min(buddy_ptr);
        k += 1;
    }

    header::write_header(hdr_ptr, false, true, k);
    let root = &mut (*cb).b_free[k as usize] as *mut ListNode;
    ListNode::link(root, header::node_of(hdr_ptr));
}
