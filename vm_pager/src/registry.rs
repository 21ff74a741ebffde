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

use crate::{
    message::{ClientId, FrameIndex, PageNumber},
    pager_config::PAGE_COUNT,
    sim_clock::SimClock,
    PagerError,
};

pub type SlotIndex = usize;

/// Fault that is waiting to be serviced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFault {
    pub page: PageNumber,
    pub address: u32,
    pub is_write: bool,
    pub time: SimClock,
}

#[derive(Debug, Clone)]
pub struct ClientSlot {
    id: ClientId,
    spawn_time: SimClock,
    page_table: [Option<FrameIndex>; PAGE_COUNT],
    fault: Option<PendingFault>,
}

impl ClientSlot {
    fn new(id: ClientId, spawn_time: SimClock) -> Self {
        Self {
            id,
            spawn_time,
            page_table: [None; PAGE_COUNT],
            fault: None,
        }
    }

    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    #[inline]
    pub fn spawn_time(&self) -> SimClock {
        self.spawn_time
    }

    #[inline]
    pub fn page_table(&self) -> &[Option<FrameIndex>; PAGE_COUNT] {
        &self.page_table
    }

    #[inline]
    pub fn frame_of(&self, page: PageNumber) -> Option<FrameIndex> {
        self.page_table[page]
    }

    #[inline]
    pub fn is_waiting(&self) -> bool {
        self.fault.is_some()
    }

    #[inline]
    pub fn pending_fault(&self) -> Option<&PendingFault> {
        self.fault.as_ref()
    }

    pub(crate) fn map(&mut self, page: PageNumber, frame: FrameIndex) {
        self.page_table[page] = Some(frame);
    }

    pub(crate) fn unmap(&mut self, page: PageNumber) {
        self.page_table[page] = None;
    }

    pub(crate) fn begin_wait(&mut self, fault: PendingFault) {
        debug_assert!(self.fault.is_none(), "client {} already waits", self.id);
        self.fault = Some(fault);
    }

    pub(crate) fn end_wait(&mut self) -> Option<PendingFault> {
        self.fault.take()
    }
}

/// Fixed capacity table of active clients
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Option<ClientSlot>>,
    active_count: usize,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            active_count: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    #[inline]
    pub fn has_free_slot(&self) -> bool {
        self.active_count < self.slots.len()
    }

    /// Stores `id` in the first free slot
    pub fn admit(&mut self, id: ClientId, now: SimClock) -> Result<SlotIndex, PagerError> {
        let index = self
            .slots
            .iter()
            .position(|slot| slot.is_none())
            .ok_or(PagerError::RegistryFull(id))?;

        self.slots[index] = Some(ClientSlot::new(id, now));
        self.active_count += 1;

        Ok(index)
    }

    pub fn find_by_id(&self, id: ClientId) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().map_or(false, |slot| slot.id == id))
    }

    /// Clears the slot of `id` and returns its last state
    ///
    /// Owned frames are not touched, that is up to the caller.
    pub fn remove(&mut self, id: ClientId) -> Option<(SlotIndex, ClientSlot)> {
        let index = self.find_by_id(id)?;
        let slot = self.slots[index].take()?;
        self.active_count -= 1;

        Some((index, slot))
    }

    #[inline]
    pub fn get(&self, index: SlotIndex) -> Option<&ClientSlot> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    #[inline]
    pub fn get_mut(&mut self, index: SlotIndex) -> Option<&mut ClientSlot> {
        self.slots.get_mut(index).and_then(|slot| slot.as_mut())
    }

    /// Iterates over all occupied slots in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &ClientSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|slot| (i, slot)))
    }
}
