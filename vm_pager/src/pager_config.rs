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

use static_assertions::const_assert_eq;

use crate::PagerError;

/// Size of a single page in bytes
pub const PAGE_SIZE: u32 = 1024;

/// How many pages every client can address
pub const PAGE_COUNT: usize = 32;

/// Size of the virtual address space of a single client
pub const ADDRESS_SPACE: u32 = 32768;

/// Registry capacity, the concurrency cap can never be larger than this
pub const MAX_CLIENTS: usize = 18;

/// Upper bound for the total client budget
pub const MAX_PROCESS_BUDGET: usize = 100;

/// Upper bound for the size of the frame pool
pub const MAX_FRAME_COUNT: usize = 256;

pub const NANOS_PER_MS: u64 = 1_000_000;
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

const_assert_eq!(ADDRESS_SPACE, PAGE_SIZE * PAGE_COUNT as u32);

#[derive(Debug, Clone)]
pub struct PagerConfig {
    /// Capacity of the frame pool
    pub frame_count: usize,

    /// Capacity of the registry
    pub max_clients: usize,

    /// How many clients are spawned in total
    pub process_budget: usize,

    /// How many clients may be active at the same time
    pub concurrency_cap: usize,

    /// Minimum simulated time between two admissions
    pub spawn_interval_ns: u64,

    /// Clock step at the start of every tick
    pub tick_ns: u64,

    /// Clock cost of a hit and of servicing a fault
    pub access_overhead_ns: u64,

    /// Clock cost of admitting a new client
    pub spawn_overhead_ns: u64,

    /// Latency of a faulted read
    pub read_latency_ns: u64,

    /// Additional latency of a faulted write
    pub write_extra_latency_ns: u64,

    /// Simulated time between two periodic reports
    pub report_interval_ns: u64,

    /// Real time a tick waits for a request while some client is idle, 0 never waits
    pub request_wait_ns: u64,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            frame_count: 8,
            max_clients: MAX_CLIENTS,
            process_budget: 1,
            concurrency_cap: 1,
            spawn_interval_ns: 0,
            tick_ns: 10 * NANOS_PER_MS,
            access_overhead_ns: 1000,
            spawn_overhead_ns: 10 * NANOS_PER_MS,
            read_latency_ns: 14 * NANOS_PER_MS,
            write_extra_latency_ns: NANOS_PER_MS,
            report_interval_ns: NANOS_PER_SEC,
            request_wait_ns: 5 * NANOS_PER_MS,
        }
    }
}

impl PagerConfig {
    /// Latency a fault has to wait before it can be serviced
    #[inline]
    pub fn fault_latency_ns(&self, is_write: bool) -> u64 {
        if is_write {
            self.read_latency_ns + self.write_extra_latency_ns
        } else {
            self.read_latency_ns
        }
    }

    /// Checks that this configuration describes a runnable simulation
    pub fn validate(&self) -> Result<(), PagerError> {
        if self.frame_count == 0 || self.frame_count > MAX_FRAME_COUNT {
            return Err(PagerError::Setup(format!(
                "frame count has to be in [1, {}], got {}",
                MAX_FRAME_COUNT, self.frame_count
            )));
        }
        if self.max_clients == 0 || self.max_clients > MAX_CLIENTS {
            return Err(PagerError::Setup(format!(
                "registry capacity has to be in [1, {}], got {}",
                MAX_CLIENTS, self.max_clients
            )));
        }
        if self.concurrency_cap > self.max_clients {
            return Err(PagerError::Setup(format!(
                "concurrency cap {} exceeds registry capacity {}",
                self.concurrency_cap, self.max_clients
            )));
        }
        if self.process_budget > MAX_PROCESS_BUDGET {
            return Err(PagerError::Setup(format!(
                "process budget {} exceeds maximum {}",
                self.process_budget, MAX_PROCESS_BUDGET
            )));
        }
        if self.process_budget > 0 && self.concurrency_cap == 0 {
            return Err(PagerError::Setup(
                "concurrency cap of 0 would never admit a client".to_string(),
            ));
        }
        // the clock carries at most one second per advance
        for step in [self.tick_ns, self.access_overhead_ns, self.spawn_overhead_ns] {
            if step >= NANOS_PER_SEC {
                return Err(PagerError::Setup(format!(
                    "clock step of {}ns is too large",
                    step
                )));
            }
        }
        if self.tick_ns == 0 {
            return Err(PagerError::Setup("tick step must not be zero".to_string()));
        }

        Ok(())
    }
}
