//! The control block and the public `Allocator` handle.

use core::mem::size_of;
use core::ptr::NonNull;

use crate::buddy;
use crate::error::{Error, Result};
use crate::header::{self, HEADER_SIZE};
use crate::list::ListNode;
use crate::size_class::{
    bytes_to_buddy, bytes_to_page, largest_fitting_buddy_class, BUDDY_CLASSES, MAX_SLAB_BYTES,
    PAGE_SIZE, SLAB_CLASSES,
};
use crate::slab;

#[repr(C)]
pub(crate) struct ControlBlock {
    pub(crate) end: usize,
    pub(crate) b_free: [ListNode; BUDDY_CLASSES],
    pub(crate) p_free: [ListNode; SLAB_CLASSES],
}

/// A handle to a buddy+slab heap living inside a caller-owned byte range.
///
/// The handle is a single pointer; the actual allocator state (free lists,
/// the region's end address) lives in the control block at the start of the
/// region itself, so two `Allocator` values built from the same region are
/// interchangeable. Nothing here is synchronized: callers sharing one region
/// across threads must serialize their own calls into `allocate`/`free`.
#[derive(Clone, Copy)]
pub struct Allocator {
    base: NonNull<u8>,
}

unsafe impl Send for Allocator {}

impl Allocator {
    #[inline]
    pub(crate) fn control_ptr(&self) -> *mut ControlBlock {
        self.base.as_ptr() as *mut ControlBlock
    }

    #[inline]
    pub(crate) fn payload_base(&self) -> usize {
        self.base.as_ptr() as usize + size_of::<ControlBlock>()
    }

    /// Lays a fresh control block and an initial ladder of free buddy pages
    /// over `region`, and returns a handle to it.
    ///
    /// # Safety
    /// The caller must ensure `region` is not already in use as a live heap
    /// (or must accept losing whatever was there), and that no other
    /// `Allocator` handle over an overlapping range is used concurrently.
    pub unsafe fn init(region: &mut [u8]) -> Result<Allocator> {
        let control_size = size_of::<ControlBlock>();
        let required = control_size + PAGE_SIZE;
        if region.len() < required {
            return Err(Error::RegionTooSmall {
                available: region.len(),
                required,
            });
        }

        let base = NonNull::new(region.as_mut_ptr()).expect("region slice pointer is never null");
        let base_addr = base.as_ptr() as usize;
        let end_addr = base_addr + region.len();

        let cb = base.as_ptr() as *mut ControlBlock;
        (*cb).end = end_addr;
        for root in (*cb).b_free.iter_mut() {
            ListNode::init_root(root as *mut ListNode);
        }
        for root in (*cb).p_free.iter_mut() {
            ListNode::init_root(root as *mut ListNode);
        }

        let alloc = Allocator { base };
        let payload_base = alloc.payload_base();
        let mut remaining = end_addr - payload_base;
        let mut cursor = payload_base;

        if let Some(mut k) = largest_fitting_buddy_class(remaining) {
            loop {
                let step = crate::size_class::buddy_to_bytes(k);
                while remaining >= step {
                    let hdr_ptr = cursor as *mut u8;
                    header::write_header(hdr_ptr, false, true, k);
                    let root = &mut (*cb).b_free[k as usize] as *mut ListNode;
                    ListNode::link(root, header::node_of(hdr_ptr));
                    cursor += step;
                    remaining -= step;
                    log::trace!("init: class {k} page at offset {:#x}", cursor - step - payload_base);
                }
                if k == 0 {
                    break;
                }
                k -= 1;
            }
        }

        log::debug!(
            "initialized {} byte region ({} bytes unusable remainder)",
            region.len(),
            remaining
        );
        Ok(alloc)
    }

    /// Wraps a region that already holds a previously-initialized heap
    /// (typically reattached after a process restart over the same
    /// memory-mapped file) without touching its contents.
    ///
    /// # Safety
    /// `region` must hold the unmodified bytes of a region previously
    /// initialized by [`Allocator::init`] with this same length.
    pub unsafe fn attach(region: &mut [u8]) -> Allocator {
        let base = NonNull::new(region.as_mut_ptr()).expect("region slice pointer is never null");
        Allocator { base }
    }

    /// Allocates at least `size` bytes, returning `None` if the region has
    /// no block large enough left.
    ///
    /// # Safety
    /// `alloc` must describe a region produced by [`Allocator::init`] or
    /// [`Allocator::attach`], and the caller must serialize this call
    /// against every other `allocate`/`free` on the same region.
    pub unsafe fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        assert!(size > 0, "allocation size must be non-zero");
        let normalized = (size + HEADER_SIZE + 7) & !7;

        if normalized <= MAX_SLAB_BYTES {
            let p = bytes_to_page(normalized);
            if let Some(ptr) = slab::try_fast_alloc(self, p) {
                log::trace!("slab hit: class={p} size={size}");
                return NonNull::new(ptr);
            }

            return match buddy::acquire(self, 0) {
                Some(page_hdr) => {
                    log::debug!("slab class {p} refilled with a fresh page");
                    NonNull::new(slab::slice_page(self, page_hdr, p))
                }
                None => {
                    log::warn!("allocate: exhausted refilling slab class {p} ({size} bytes)");
                    None
                }
            };
        }

        let k = bytes_to_buddy(normalized);
        match buddy::acquire(self, k) {
            Some(hdr_ptr) => {
                header::write_header(hdr_ptr, true, true, k);
                log::trace!("buddy hit: class={k} size={size}");
                NonNull::new(hdr_ptr.add(HEADER_SIZE))
            }
            None => {
                log::warn!("allocate: exhausted at buddy class {k} ({size} bytes)");
                None
            }
        }
    }

    /// Returns a pointer previously handed back by [`Allocator::allocate`]
    /// on this same region.
    ///
    /// # Safety
    /// `ptr` must be currently allocated from this region (not already
    /// freed, not foreign), and the caller must serialize this call against
    /// every other `allocate`/`free` on the same region.
    pub unsafe fn free(&self, ptr: NonNull<u8>) {
        let hdr_ptr = ptr.as_ptr().sub(HEADER_SIZE);
        let h = header::read_header(hdr_ptr);

        if h.is_buddy() == 0 {
            let p = h.class() as usize;
            header::write_header(hdr_ptr, false, false, p as u32);
            let cb = self.control_ptr();
            let root = &mut (*cb).p_free[p] as *mut ListNode;
            ListNode::link(root, header::node_of(hdr_ptr));
            log::trace!("slab free: class={p}");
            return;
        }

        let k = h.class() as u32;
        log::trace!("buddy free: class={k}");
        buddy::release(self, hdr_ptr, k);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_class::buddy_to_bytes;

    unsafe fn free_count(root: *mut ListNode) -> usize {
        let mut n = 0;
        let mut cur = (*root).next;
        while cur != root {
            n += 1;
            cur = (*cur).next;
        }
        n
    }

    #[test]
    fn splitting_a_class_3_page_fans_out_into_classes_0_1_2() {
        let control_size = size_of::<ControlBlock>();
        let region_len = control_size + buddy_to_bytes(3);
        let mut region = vec![0u8; region_len];
        unsafe {
            let alloc = Allocator::init(&mut region).unwrap();
            let cb = alloc.control_ptr();

            assert!(!ListNode::is_empty(&mut (*cb).b_free[3]));
            for k in 0..3 {
                assert!(ListNode::is_empty(&mut (*cb).b_free[k]));
            }

            let page = buddy::acquire(&alloc, 0).expect("one page should be carved out");
            assert_eq!(page as usize, alloc.payload_base() + buddy_to_bytes(3) - PAGE_SIZE);

            assert!(ListNode::is_empty(&mut (*cb).b_free[3]));
            for k in 0..3 {
                assert_eq!(free_count(&mut (*cb).b_free[k]), 1, "class {k}");
            }
        }
    }

    #[test]
    fn freeing_both_buddies_coalesces_back_to_the_parent_class() {
        let control_size = size_of::<ControlBlock>();
        let region_len = control_size + buddy_to_bytes(1);
        let mut region = vec![0u8; region_len];
        unsafe {
            let alloc = Allocator::init(&mut region).unwrap();
            let cb = alloc.control_ptr();

            let a = buddy::acquire(&alloc, 0).unwrap();
            header::write_header(a, true, true, 0);
            let b = buddy::acquire(&alloc, 0).unwrap();
            header::write_header(b, true, true, 0);
            assert!(ListNode::is_empty(&mut (*cb).b_free[0]));
            assert!(ListNode::is_empty(&mut (*cb).b_free[1]));

            buddy::release(&alloc, a, 0);
            assert_eq!(free_count(&mut (*cb).b_free[0]), 1);
            assert!(ListNode::is_empty(&mut (*cb).b_free[1]));

            buddy::release(&alloc, b, 0);
            assert!(ListNode::is_empty(&mut (*cb).b_free[0]), "both buddies should have merged");
            assert_eq!(free_count(&mut (*cb).b_free[1]), 1);
        }
    }

    #[test]
    fn region_too_small_is_reported_as_an_error() {
        let mut region = vec![0u8; size_of::<ControlBlock>()];
        let err = unsafe { Allocator::init(&mut region) }.unwrap_err();
        assert!(matches!(err, Error::RegionTooSmall { .. }));
    }
}
