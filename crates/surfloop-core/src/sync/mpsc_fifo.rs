use parking_lot::Mutex;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Node<T> {
    next: AtomicPtr<Node<T>>,
    value: Option<T>,
}

impl<T> Node<T> {
    fn alloc(value: Option<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            next: AtomicPtr::new(ptr::null_mut()),
            value,
        }))
    }
}

/// Unbounded lock-free FIFO: any number of producers, one consumer.
///
/// `head` is the read cursor (always a consumed stub node), `tail` the last
/// pushed node. Producers only touch `tail`; the cursor lock is never taken by
/// them, so it is uncontended unless two consumers misuse the queue.
pub struct MpscFifo<T> {
    head: Mutex<*mut Node<T>>,
    tail: AtomicPtr<Node<T>>,
}

// Values cross threads by ownership; nodes are only reached through the atomics
// and the cursor lock.
unsafe impl<T: Send> Send for MpscFifo<T> {}
unsafe impl<T: Send> Sync for MpscFifo<T> {}

impl<T> MpscFifo<T> {
    pub fn new() -> Self {
        let stub = Node::alloc(None);
        Self {
            head: Mutex::new(stub),
            tail: AtomicPtr::new(stub),
        }
    }

    /// Never blocks.
    pub fn push(&self, value: T) {
        let node = Node::alloc(Some(value));
        let prev = self.tail.swap(node, Ordering::AcqRel);
        // SAFETY: `prev` stays alive until its `next` is published: the consumer
        // frees a cursor node only after observing a non-null successor.
        unsafe { (*prev).next.store(node, Ordering::Release) };
    }

    /// `None` when nothing has been linked yet. Never blocks on producers.
    pub fn pop(&self) -> Option<T> {
        let mut head = self.head.lock();
        let cur = *head;
        // SAFETY: the cursor node is owned by the consumer side and alive.
        let next = unsafe { (*cur).next.load(Ordering::Acquire) };
        if next.is_null() {
            return None;
        }
        // SAFETY: `next` was fully initialised before the Release store we just
        // acquired; only the consumer reads `value`.
        let value = unsafe { (*next).value.take() };
        *head = next;
        // SAFETY: `cur` is unreachable for producers (tail moved past it).
        drop(unsafe { Box::from_raw(cur) });
        value
    }

    pub fn is_empty(&self) -> bool {
        let head = self.head.lock();
        // SAFETY: see `pop`.
        unsafe { (**head).next.load(Ordering::Acquire).is_null() }
    }
}

impl<T> Default for MpscFifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for MpscFifo<T> {
    fn drop(&mut self) {
        let mut cur = *self.head.get_mut();
        while !cur.is_null() {
            // SAFETY: `&mut self`, no producer or consumer is left.
            let node = unsafe { Box::from_raw(cur) };
            cur = node.next.load(Ordering::Relaxed);
        }
    }
}
