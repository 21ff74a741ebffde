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

use core::fmt;

use crate::{
    frame_table::Eviction,
    message::{ClientId, FrameIndex, PageNumber},
    registry::SlotIndex,
    sim_clock::SimClock,
    RequestError,
};

/// Things that happened during a tick, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerEvent {
    Admitted {
        slot: SlotIndex,
        client: ClientId,
        time: SimClock,
    },
    Reaped {
        slot: SlotIndex,
        client: ClientId,
        freed_frames: usize,
        time: SimClock,
    },
    Hit {
        slot: SlotIndex,
        page: PageNumber,
        frame: FrameIndex,
        time: SimClock,
    },
    Fault {
        slot: SlotIndex,
        page: PageNumber,
        time: SimClock,
    },
    Serviced {
        slot: SlotIndex,
        page: PageNumber,
        frame: FrameIndex,
        eviction: Option<Eviction>,
        time: SimClock,
    },
    Rejected {
        client: ClientId,
        address: u32,
        reason: RequestError,
        time: SimClock,
    },
    /// The periodic report is due
    ReportDue,
}

impl fmt::Display for PagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagerEvent::Admitted { slot, client, time } => {
                write!(f, "OSS: admitted client {} as P{} at time {}", client, slot, time)
            }
            PagerEvent::Reaped {
                slot,
                client,
                freed_frames,
                time,
            } => write!(
                f,
                "OSS: P{} (client {}) terminated, freed {} frame(s) at time {}",
                slot, client, freed_frames, time
            ),
            PagerEvent::Hit {
                slot,
                page,
                frame,
                time,
            } => write!(
                f,
                "OSS: P{} page {} HIT in frame {} at time {}",
                slot, page, frame, time
            ),
            PagerEvent::Fault { slot, page, time } => write!(
                f,
                "OSS: P{} page {} FAULT at time {}... queueing",
                slot, page, time
            ),
            PagerEvent::Serviced {
                slot,
                page,
                frame,
                eviction,
                time,
            } => {
                if let Some(eviction) = eviction {
                    write!(
                        f,
                        "OSS: evicted client {} page {} from frame {}{}; ",
                        eviction.owner,
                        eviction.page,
                        eviction.frame,
                        if eviction.was_dirty { " (dirty)" } else { "" }
                    )?;
                }
                write!(
                    f,
                    "OSS: serviced P{} page {} in frame {} at time {}",
                    slot, page, frame, time
                )
            }
            PagerEvent::Rejected {
                client,
                address,
                reason,
                time,
            } => write!(
                f,
                "OSS: rejected request of client {} for address {} at time {}: {}",
                client, address, time, reason
            ),
            PagerEvent::ReportDue => Ok(()),
        }
    }
}
