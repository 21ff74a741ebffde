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
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::pager_config::NANOS_PER_SEC;

/// Simulated system time
///
/// Only the coordinator advances it, clients can observe it through a [`ClockView`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimClock {
    seconds: u32,
    nanos: u32,
}

impl SimClock {
    pub const fn new() -> Self {
        Self {
            seconds: 0,
            nanos: 0,
        }
    }

    /// Creates a clock from its two parts.
    ///
    /// `nanos` has to be smaller than one second.
    pub const fn from_parts(seconds: u32, nanos: u32) -> Self {
        debug_assert!((nanos as u64) < NANOS_PER_SEC);
        Self { seconds, nanos }
    }

    #[inline]
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    #[inline]
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Advances the clock by `delta_nanos`.
    ///
    /// Steps are always smaller than one second, so at most one carry happens.
    pub fn advance(&mut self, delta_nanos: u64) {
        debug_assert!(
            delta_nanos < NANOS_PER_SEC,
            "clock step too large: {}ns",
            delta_nanos
        );

        let mut nanos = self.nanos as u64 + delta_nanos;
        if nanos >= NANOS_PER_SEC {
            nanos -= NANOS_PER_SEC;
            self.seconds += 1;
        }
        self.nanos = nanos as u32;
    }

    /// Total amount of simulated nanoseconds
    #[inline]
    pub fn as_nanos(&self) -> u64 {
        self.seconds as u64 * NANOS_PER_SEC + self.nanos as u64
    }

    /// Time that passed between `earlier` and `self`, zero if `earlier` is later
    #[inline]
    pub fn nanos_since(&self, earlier: SimClock) -> u64 {
        self.as_nanos().saturating_sub(earlier.as_nanos())
    }

    /// Simulated time as fractional seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.nanos as f64 / NANOS_PER_SEC as f64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:09}", self.seconds, self.nanos)
    }
}

/// Read only view of the simulated clock for clients
#[derive(Debug, Clone, Default)]
pub struct ClockView {
    nanos: Arc<AtomicU64>,
}

impl ClockView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in nanoseconds
    #[inline]
    pub fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::Acquire)
    }

    /// Only the coordinator publishes new time stamps
    #[inline]
    pub(crate) fn publish(&self, clock: &SimClock) {
        self.nanos.store(clock.as_nanos(), Ordering::Release);
    }
}
