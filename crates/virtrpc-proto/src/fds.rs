use core::fmt;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

use tracing::trace;

use crate::RpcResult;

/// File descriptors owned by a message, in wire order.
///
/// Each slot is either an owned descriptor or empty: empty slots are
/// reserved ahead of an ancillary-data receive, and slots become empty again
/// once the connection layer takes their descriptor for sending. The `done`
/// counter marks the prefix of slots the connection layer has already
/// transferred in either direction, so a partially sent or received message
/// can be resumed.
///
/// Dropping the set closes exactly the descriptors still owned; taken ones
/// belong to whoever took them.
#[derive(Default)]
pub struct FdSet {
    slots: Vec<Option<OwnedFd>>,
    done: usize,
}

impl FdSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots (descriptors announced on the wire).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of descriptors already transferred by the connection layer.
    pub fn done(&self) -> usize {
        self.done
    }

    /// Whether every announced descriptor has been transferred.
    pub fn is_complete(&self) -> bool {
        self.done == self.slots.len()
    }

    /// Borrows the descriptor at `slot`, when present.
    pub fn get(&self, slot: usize) -> Option<BorrowedFd<'_>> {
        self.slots.get(slot).and_then(|s| s.as_ref()).map(AsFd::as_fd)
    }

    /// Appends a duplicate of `fd` with close-on-exec set.
    ///
    /// The duplicate is made with `F_DUPFD_CLOEXEC`, so there is no window
    /// where it could leak across an exec. The caller keeps its descriptor.
    pub fn append(&mut self, fd: BorrowedFd<'_>) -> RpcResult<()> {
        let dup = fd
            .try_clone_to_owned()
            .map_err(|e| system_err!("fdset append", e))?;

        trace!(?dup, "attached FD");
        self.slots.push(Some(dup));

        Ok(())
    }

    /// Returns a fresh close-on-exec duplicate of the descriptor at `slot`;
    /// the caller owns it.
    ///
    /// Only an out-of-range `slot` is an API-misuse error. A slot that is in
    /// range but still awaiting its descriptor fails the same way duplicating
    /// a closed descriptor would.
    pub fn duplicate(&self, slot: usize) -> RpcResult<OwnedFd> {
        let stored = self
            .slots
            .get(slot)
            .ok_or_else(|| internal_err!("fdset duplicate", "no FD available at slot"))?;

        match stored {
            Some(fd) => fd
                .as_fd()
                .try_clone_to_owned()
                .map_err(|e| system_err!("fdset duplicate", e)),
            None => Err(system_err!(
                "fdset duplicate",
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "descriptor not yet received"),
            )),
        }
    }

    /// Reserves `n` empty slots for descriptors about to be received.
    ///
    /// Left untouched when slots already exist, so resumed receives do not
    /// discard descriptors stored earlier.
    pub fn reserve_incoming(&mut self, n: usize) {
        if self.slots.is_empty() {
            self.slots = (0..n).map(|_| None).collect();
            self.done = 0;
        }
    }

    /// Takes ownership of the next descriptor to send, marking it
    /// transferred. Returns `None` once all have been taken.
    pub fn take_next(&mut self) -> Option<OwnedFd> {
        let fd = self.slots.get_mut(self.done)?.take()?;
        self.done += 1;
        Some(fd)
    }

    /// Stores a received descriptor into the next reserved slot.
    pub fn store_next(&mut self, fd: OwnedFd) -> RpcResult<()> {
        let slot = self
            .slots
            .get_mut(self.done)
            .ok_or_else(|| internal_err!("fdset store", "all FD slots already filled"))?;

        if slot.is_some() {
            return Err(internal_err!("fdset store", "FD slot already holds a descriptor"));
        }

        *slot = Some(fd);
        self.done += 1;

        Ok(())
    }

    /// Closes every owned descriptor and releases the slot storage.
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.done = 0;
    }
}

impl fmt::Debug for FdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FdSet")
            .field("len", &self.slots.len())
            .field("done", &self.done)
            .finish()
    }
}
