//! Single-slot hand-off between the request side and the tick side
//!
//! Requests overwrite each other until the player picks one up; there is no
//! queue. The slot also mirrors how many repetitions the player still has to
//! go, so both halves of "is the buzzer done" can be read in one critical
//! section.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::pattern::Request;

/// Snapshot of the hand-off slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Request waiting for the player; empty when its repetitions are 0.
    pub pending: Request,
    /// Repetitions the player has left, 0 when idle.
    pub active_repetitions: u8,
}

impl Status {
    /// Nothing pending and nothing playing.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.active_repetitions == 0
    }
}

pub struct Mailbox {
    slot: Mutex<CriticalSectionRawMutex, Cell<Status>>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Status {
                pending: Request::NONE,
                active_repetitions: 0,
            })),
        }
    }

    /// Replaces the pending request. Never touches a request already playing.
    pub fn post(&self, request: Request) {
        let discarded = self.slot.lock(|slot| {
            let mut status = slot.get();
            let discarded = core::mem::replace(&mut status.pending, request);
            slot.set(status);
            discarded
        });

        if !discarded.is_empty() {
            log::debug!(
                "Discarded pending pattern {:#010x} x{}",
                discarded.pattern,
                discarded.repetitions
            );
        }
    }

    /// Hands the pending request to the player, emptying the slot.
    ///
    /// In the same critical section the request's repetitions are recorded as
    /// active, so the slot never looks idle while a request is changing hands.
    /// A silent request is consumed but leaves the player idle.
    pub fn take(&self) -> Option<Request> {
        self.slot.lock(|slot| {
            let mut status = slot.get();
            if status.pending.is_empty() {
                return None;
            }

            let request = core::mem::take(&mut status.pending);
            status.active_repetitions = if request.is_silent() {
                0
            } else {
                request.repetitions
            };
            slot.set(status);
            Some(request)
        })
    }

    /// Records how many repetitions the player has left after a tick.
    pub fn publish_remaining(&self, repetitions: u8) {
        self.slot.lock(|slot| {
            let mut status = slot.get();
            status.active_repetitions = repetitions;
            slot.set(status);
        });
    }

    pub fn status(&self) -> Status {
        self.slot.lock(Cell::get)
    }

    pub fn is_idle(&self) -> bool {
        self.status().is_idle()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
