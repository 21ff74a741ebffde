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

use crate::{frame_table::Frame, message::FrameIndex};

mod lru;
pub use lru::LruReplacementModule;

/// Decides which resident frame has to make room if the pool is full
pub trait ReplacementModule {
    fn new() -> Self;

    /// Chooses the frame to evict.
    ///
    /// Only called if every frame of `frames` is occupied.
    /// Returns `None` if there is nothing to evict.
    fn select_victim(&mut self, frames: &[Frame]) -> Option<FrameIndex>;
}
