// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Thread-safe outbox of domain events.
//!
//! Events are appended from any thread and drained in FIFO order.

use crate::event::LedgerEvent;
use crossbeam::queue::SegQueue;

/// Lock-free FIFO of [`LedgerEvent`]s.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: SegQueue<LedgerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: SegQueue::new(),
        }
    }

    pub fn push(&self, event: LedgerEvent) {
        tracing::trace!(kind = event.kind(), "event queued");
        self.events.push(event);
    }

    /// Removes and returns every queued event, oldest first.
    pub fn drain(&self) -> Vec<LedgerEvent> {
        let mut drained = Vec::with_capacity(self.events.len());
        while let Some(event) = self.events.pop() {
            drained.push(event);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
