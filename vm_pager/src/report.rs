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
use std::io::{self, Write};

use crate::{
    frame_table::FrameTable, pager_config::PAGE_COUNT, registry::Registry, sim_clock::SimClock,
};

/// Counters collected over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagerStats {
    /// Every request that was received, including rejected ones
    pub references: u64,
    pub hits: u64,
    pub faults: u64,
    pub evictions: u64,
    pub rejected: u64,
    pub spawned: u64,
}

impl PagerStats {
    /// Faults in percent of all references
    pub fn fault_rate(&self) -> f64 {
        if self.references == 0 {
            0.0
        } else {
            self.faults as f64 * 100.0 / self.references as f64
        }
    }

    /// Serviced references per simulated second
    pub fn references_per_second(&self, elapsed: SimClock) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.references as f64 / secs
        }
    }
}

/// Statistics printed once the simulation finished normally
#[derive(Debug, Clone, Copy)]
pub struct FinalReport {
    pub stats: PagerStats,
    pub elapsed: SimClock,
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.stats;
        writeln!(f, "===== Final Statistics =====")?;
        writeln!(f, "Simulated time: {}", self.elapsed)?;
        writeln!(f, "Clients spawned: {}", stats.spawned)?;
        writeln!(f, "Total memory references: {}", stats.references)?;
        writeln!(f, "Hits: {}", stats.hits)?;
        writeln!(f, "Page faults: {}", stats.faults)?;
        writeln!(f, "Evictions: {}", stats.evictions)?;
        writeln!(f, "Rejected requests: {}", stats.rejected)?;
        writeln!(f, "Fault rate: {:.2}%", stats.fault_rate())?;
        writeln!(
            f,
            "References per simulated second: {:.2}",
            stats.references_per_second(self.elapsed)
        )
    }
}

/// Writes the live client table, the frame table and all page tables
pub fn write_periodic_report<W: Write + ?Sized>(
    out: &mut W,
    now: SimClock,
    registry: &Registry,
    frames: &FrameTable,
) -> io::Result<()> {
    writeln!(
        out,
        "OSS SysClockS: {} SysClockNano: {}",
        now.seconds(),
        now.nanos()
    )?;

    writeln!(out, "Process Table:")?;
    writeln!(out, "Entry\tOccupied\tID\tStartS\tStartNs")?;
    for (index, slot) in registry.iter() {
        writeln!(
            out,
            "{}\t1\t\t{}\t{}\t{}",
            index,
            slot.id(),
            slot.spawn_time().seconds(),
            slot.spawn_time().nanos()
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Frame Table:")?;
    writeln!(out, "Frame\tOccupied\tDirty\tOwner\tPage\tLastRefS\tLastRefNs")?;
    for (index, frame) in frames.frames().iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t\t{}\t{}\t{}\t{}\t\t{}",
            index,
            if frame.occupied { "Yes" } else { "No" },
            frame.dirty as u8,
            frame.owner.map_or("-".to_string(), |owner| owner.to_string()),
            frame.page.map_or("-".to_string(), |page| page.to_string()),
            frame.last_ref.seconds(),
            frame.last_ref.nanos()
        )?;
    }
    writeln!(out)?;

    for (index, slot) in registry.iter() {
        write!(out, "P{} page table:", index)?;
        for page in 0..PAGE_COUNT {
            match slot.frame_of(page) {
                Some(frame) => write!(out, " {}", frame)?,
                None => write!(out, " -")?,
            }
        }
        writeln!(out)?;
    }
    writeln!(out)
}
