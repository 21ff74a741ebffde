/*
 *  Copyright (C) 2025  Markus Elias Gerber
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::collections::VecDeque;

use crate::registry::SlotIndex;

/// FIFO of clients that wait for a fault to be serviced
#[derive(Debug, Default)]
pub struct FaultQueue {
    queue: VecDeque<SlotIndex>,
}

impl FaultQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, slot: SlotIndex) {
        debug_assert!(
            !self.queue.contains(&slot),
            "slot {} is already queued",
            slot
        );
        self.queue.push_back(slot);
    }

    /// Only the head is ever considered for servicing
    #[inline]
    pub fn head(&self) -> Option<SlotIndex> {
        self.queue.front().copied()
    }

    #[inline]
    pub fn pop(&mut self) -> Option<SlotIndex> {
        self.queue.pop_front()
    }

    /// Withdraws `slot`, used if a waiting client exits
    pub fn remove(&mut self, slot: SlotIndex) -> bool {
        match self.queue.iter().position(|queued| *queued == slot) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, slot: SlotIndex) -> bool {
        self.queue.contains(&slot)
    }
}
