//! A circular, sentinel-rooted, intrusive doubly linked list.
//!
//! Nodes live inside the free bytes of whatever block they describe — there
//! is no side allocation, and the list never owns its nodes. A root with
//! `next == prev == self` is empty. This is deliberately hand-rolled rather
//! than built on `intrusive_collections::LinkedList`: the root itself must
//! be plain, address-stable storage inside the control block so the whole
//! structure can be read back unchanged after a remap.

use core::ptr;

#[repr(C)]
pub(crate) struct ListNode {
    pub next: *mut ListNode,
    pub prev: *mut ListNode,
}

impl ListNode {
    /// Makes `root` point to itself, i.e. the empty list.
    ///
    /// # Safety
    /// `root` must be valid for reads and writes of a `ListNode`.
    pub(crate) unsafe fn init_root(root: *mut ListNode) {
        (*root).next = root;
        (*root).prev = root;
    }

    /// # Safety
    /// `root` must be a live list root or node.
    pub(crate) unsafe fn is_empty(root: *mut ListNode) -> bool {
        (*root).next == root
    }

    /// Inserts `item` right after `list` (so pushing at a root makes `item`
    /// the new head).
    ///
    /// # Safety
    /// Both pointers must be valid for reads and writes of a `ListNode`, and
    /// `item` must not already be linked into any list.
    pub(crate) unsafe fn link(list: *mut ListNode, item: *mut ListNode) {
        (*item).next = (*list).next;
        (*item).prev = list;
        (*(*item).next).prev = item;
        (*(*item).prev).next = item;
    }

    /// Removes `item` from whatever list it's in.
    ///
    /// # Safety
    /// `item` must currently be linked into a list (not a root).
    pub(crate) unsafe fn unlink(item: *mut ListNode) {
        (*(*item).next).prev = (*item).prev;
        (*(*item).prev).next = (*item).next;
        (*item).next = ptr::null_mut();
        (*item).prev = ptr::null_mut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_and_unlink_preserve_well_formedness() {
        unsafe {
            let mut root = ListNode { next: ptr::null_mut(), prev: ptr::null_mut() };
            let root_ptr = &mut root as *mut ListNode;
            ListNode::init_root(root_ptr);
            assert!(ListNode::is_empty(root_ptr));

            let mut a = ListNode { next: ptr::null_mut(), prev: ptr::null_mut() };
            let mut b = ListNode { next: ptr::null_mut(), prev: ptr::null_mut() };
            let a_ptr = &mut a as *mut ListNode;
            let b_ptr = &mut b as *mut ListNode;

            ListNode::link(root_ptr, a_ptr);
            assert!(!ListNode::is_empty(root_ptr));
            assert_eq!((*root_ptr).next, a_ptr);
            assert_eq!((*a_ptr).prev, root_ptr);

            ListNode::link(root_ptr, b_ptr);
            assert_eq!((*root_ptr).next, b_ptr);
            assert_eq!((*b_ptr).next, a_ptr);
            assert_eq!((*a_ptr).prev, b_ptr);

            ListNode::unlink(a_ptr);
            assert_eq!((*root_ptr).next, b_ptr);
            assert_eq!((*b_ptr).next, root_ptr);

            ListNode::unlink(b_ptr);
            assert!(ListNode::is_empty(root_ptr));
        }
    }
}
