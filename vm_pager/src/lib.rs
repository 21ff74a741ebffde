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

mod error;
mod frame_table;
mod message;
mod pager;
mod pager_config;
mod pager_event;
mod registry;
mod report;
mod sim_clock;
mod wait_queue;
mod watchdog;
mod worker;

#[cfg(test)]
mod test;

pub mod modules;

pub use crate::pager::Pager;
pub use error::{PagerError, RequestError};
pub use frame_table::{Eviction, Frame, FrameTable};
pub use message::{ClientId, FrameIndex, Message, MessageKind, PageNumber};
pub use pager_config::*;
pub use pager_event::PagerEvent;
pub use registry::{ClientSlot, PendingFault, Registry, SlotIndex};
pub use report::{write_periodic_report, FinalReport, PagerStats};
pub use sim_clock::{ClockView, SimClock};
pub use wait_queue::FaultQueue;
pub use watchdog::Watchdog;
pub use worker::{Worker, WorkerConfig, WorkerExit};
