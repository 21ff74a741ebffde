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
    sim_clock::SimClock,
};

/// A physical frame of the shared pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub occupied: bool,

    /// Only used for reporting, dirty frames are never written back
    pub dirty: bool,

    pub owner: Option<ClientId>,
    pub page: Option<PageNumber>,
    pub last_ref: SimClock,
}

impl Frame {
    fn clear(&mut self) {
        self.occupied = false;
        self.dirty = false;
        self.owner = None;
        self.page = None;
    }
}

/// Mapping that was removed to make room for a new page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eviction {
    pub frame: FrameIndex,
    pub owner: ClientId,
    pub page: PageNumber,
    pub was_dirty: bool,
}

#[derive(Debug)]
pub struct FrameTable {
    frames: Vec<Frame>,
}

impl FrameTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: vec![Frame::default(); capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn get(&self, index: FrameIndex) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn occupied_count(&self) -> usize {
        self.frames.iter().filter(|frame| frame.occupied).count()
    }

    /// Lowest indexed frame that is not occupied
    pub fn first_free(&self) -> Option<FrameIndex> {
        self.frames.iter().position(|frame| !frame.occupied)
    }

    /// Updates the reference time of a resident frame
    pub fn touch(&mut self, index: FrameIndex, is_write: bool, now: SimClock) {
        let frame = &mut self.frames[index];
        debug_assert!(frame.occupied, "touched a free frame {}", index);

        frame.last_ref = now;
        frame.dirty |= is_write;
    }

    /// Clears frame `index` and returns the mapping it held
    pub fn evict(&mut self, index: FrameIndex) -> Option<Eviction> {
        let frame = &mut self.frames[index];
        if !frame.occupied {
            return None;
        }

        let eviction = match (frame.owner, frame.page) {
            (Some(owner), Some(page)) => Some(Eviction {
                frame: index,
                owner,
                page,
                was_dirty: frame.dirty,
            }),
            _ => None,
        };
        frame.clear();

        eviction
    }

    /// Loads `page` of `owner` into frame `index`
    pub fn assign(
        &mut self,
        index: FrameIndex,
        owner: ClientId,
        page: PageNumber,
        is_write: bool,
        now: SimClock,
    ) {
        let frame = &mut self.frames[index];
        debug_assert!(!frame.occupied, "frame {} still holds a page", index);

        *frame = Frame {
            occupied: true,
            dirty: is_write,
            owner: Some(owner),
            page: Some(page),
            last_ref: now,
        };
    }

    /// Frees every frame owned by `owner` and returns how many were freed
    pub fn release_owned_by(&mut self, owner: ClientId) -> usize {
        let mut released = 0;
        for frame in self.frames.iter_mut() {
            if frame.occupied && frame.owner == Some(owner) {
                frame.clear();
                released += 1;
            }
        }

        released
    }
}
