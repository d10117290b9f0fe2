//! One-directional message queue between two in-process sockets.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::frame::Frame;

/// Queue of complete messages.
///
/// Messages enter whole, so a reader never sees a partial message. The
/// high-water mark counts messages; zero means unbounded.
pub(super) struct Pipe {
    messages: Mutex<VecDeque<Vec<Frame>>>,
    hwm: usize,
}

impl Pipe {
    pub(super) fn new(hwm: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            hwm,
        }
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<Vec<Frame>>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn has_capacity(&self) -> bool { self.hwm == 0 || self.messages().len() < self.hwm }

    pub(super) fn is_empty(&self) -> bool { self.messages().is_empty() }

    pub(super) fn push(&self, message: Vec<Frame>) { self.messages().push_back(message); }

    /// Take the oldest message. The flag reports whether the pipe was full
    /// before the pop, i.e. whether the writer may have been blocked.
    pub(super) fn pop(&self) -> Option<(Vec<Frame>, bool)> {
        let mut messages = self.messages();
        let was_full = self.hwm != 0 && messages.len() >= self.hwm;
        messages.pop_front().map(|message| (message, was_full))
    }
}

#[cfg(test)]
mod tests {
    use super::Pipe;
    use crate::frame::Frame;

    #[test]
    fn capacity_counts_messages_not_frames() {
        let pipe = Pipe::new(1);
        assert!(pipe.has_capacity());
        pipe.push(vec![Frame::with_more("a", true), Frame::new("b")]);
        assert!(!pipe.has_capacity());
        let (message, was_full) = pipe.pop().expect("queued");
        assert_eq!(message.len(), 2);
        assert!(was_full);
        assert!(pipe.is_empty());
    }

    #[test]
    fn zero_hwm_is_unbounded() {
        let pipe = Pipe::new(0);
        for _ in 0..10_000 {
            pipe.push(vec![Frame::new("x")]);
        }
        assert!(pipe.has_capacity());
    }
}
