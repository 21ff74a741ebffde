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

use super::ReplacementModule;

// completely stateless, recency is stored in the frames themselves
pub struct LruReplacementModule;

impl ReplacementModule for LruReplacementModule {
    fn new() -> Self {
        Self
    }

    fn select_victim(&mut self, frames: &[Frame]) -> Option<FrameIndex> {
        let mut victim: Option<(FrameIndex, u64)> = None;

        for (i, frame) in frames.iter().enumerate() {
            if !frame.occupied {
                continue;
            }

            let last_ref = frame.last_ref.as_nanos();
            // strictly smaller, so the first minimum wins ties
            match victim {
                Some((_, oldest)) if last_ref >= oldest => {}
                _ => victim = Some((i, last_ref)),
            }
        }

        victim.map(|(i, _)| i)
    }
}
