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

use std::thread;

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    modules::{spawner::KillSwitch, transport::ClientEndpoint},
    pager_config::{ADDRESS_SPACE, NANOS_PER_MS, NANOS_PER_SEC},
    sim_clock::ClockView,
};

/// Behaviour of the simulated clients
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Upper bound for the simulated time between two requests
    pub act_bound_ns: u64,

    /// How often a client considers to terminate
    pub termination_check_ns: u64,

    /// Minimum simulated lifetime before a client may terminate
    pub min_lifetime_ns: u64,

    /// Chance in percent to terminate at a check
    pub termination_probability: u32,

    /// Chance in percent that a request is a write
    pub write_probability: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            act_bound_ns: 1000,
            termination_check_ns: 250 * NANOS_PER_MS,
            min_lifetime_ns: 2 * NANOS_PER_SEC,
            termination_probability: 40,
            write_probability: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Decided to terminate after its lifetime passed
    Finished,

    /// Stopped by the kill switch
    Killed,

    /// Coordinator went away
    Disconnected,
}

/// Client traffic generator.
///
/// Issues random requests at random simulated times and waits for every grant.
pub struct Worker<E: ClientEndpoint> {
    endpoint: E,
    clock: ClockView,
    kill_switch: KillSwitch,
    config: WorkerConfig,
    rand: Xoshiro256PlusPlus,
    granted: u64,
    rejected: u64,
}

impl<E: ClientEndpoint> Worker<E> {
    pub fn new(
        endpoint: E,
        clock: ClockView,
        kill_switch: KillSwitch,
        config: WorkerConfig,
        seed: u64,
    ) -> Self {
        // every client gets its own stream
        let seed = seed ^ (endpoint.client().0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);

        Self {
            endpoint,
            clock,
            kill_switch,
            config,
            rand: Xoshiro256PlusPlus::seed_from_u64(seed),
            granted: 0,
            rejected: 0,
        }
    }

    pub fn run(mut self) -> WorkerExit {
        let client = self.endpoint.client();
        let start = self.clock.now_nanos();
        let mut last_check = start;
        let mut next_act = start + self.random_delay();

        loop {
            if self.kill_switch.is_triggered() {
                return WorkerExit::Killed;
            }

            let now = self.clock.now_nanos();

            if now.saturating_sub(last_check) >= self.config.termination_check_ns {
                last_check = now;
                if now.saturating_sub(start) >= self.config.min_lifetime_ns
                    && self.rand.gen_range(0..100) < self.config.termination_probability
                {
                    debug!(
                        "Client {} terminates after {} requests ({} rejected)",
                        client, self.granted, self.rejected
                    );
                    return WorkerExit::Finished;
                }
            }

            if now >= next_act {
                let address = self.rand.gen_range(0..ADDRESS_SPACE);
                let is_write = self.rand.gen_range(0..100) < self.config.write_probability;

                match self.endpoint.request(address, is_write) {
                    Ok(reply) if reply.granted => self.granted += 1,
                    Ok(_) => {
                        trace!("Client {} request for {} was rejected", client, address);
                        self.rejected += 1;
                    }
                    Err(_) => {
                        return if self.kill_switch.is_triggered() {
                            WorkerExit::Killed
                        } else {
                            WorkerExit::Disconnected
                        };
                    }
                }

                next_act = now + self.random_delay();
            } else {
                thread::yield_now();
            }
        }
    }

    fn random_delay(&mut self) -> u64 {
        if self.config.act_bound_ns == 0 {
            0
        } else {
            self.rand.gen_range(0..self.config.act_bound_ns)
        }
    }
}
