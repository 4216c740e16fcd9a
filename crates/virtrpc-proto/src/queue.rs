use crate::message::Message;

/// FIFO of messages awaiting transmission or dispatch.
///
/// The queue threads through the messages' own `next` links, so enqueueing
/// allocates nothing beyond the boxed message itself. Push walks to the tail;
/// per-connection queues stay short enough that the walk is not worth a
/// cached tail pointer.
#[derive(Debug, Default)]
pub struct MessageQueue {
    head: Option<Box<Message>>,
}

impl MessageQueue {
    pub const fn new() -> Self {
        Self { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of queued messages; walks the list.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut cursor = &self.head;
        while let Some(msg) = cursor {
            count += 1;
            cursor = &msg.next;
        }
        count
    }

    /// Appends `msg` at the tail.
    pub fn push(&mut self, msg: Box<Message>) {
        debug_assert!(msg.next.is_none());

        let mut cursor = &mut self.head;
        while let Some(queued) = cursor {
            cursor = &mut queued.next;
        }
        *cursor = Some(msg);
    }

    /// Removes and returns the head, or `None` when the queue is empty.
    pub fn serve(&mut self) -> Option<Box<Message>> {
        let mut msg = self.head.take()?;
        self.head = msg.next.take();
        Some(msg)
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        // Drain iteratively; dropping the head alone would already unlink
        // its successors, but serving keeps the intent obvious.
        while self.serve().is_some() {}
    }
}
