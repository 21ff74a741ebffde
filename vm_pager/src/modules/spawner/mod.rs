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

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    message::ClientId, modules::transport::ClientEndpoint, sim_clock::ClockView, PagerError,
};

mod thread;
pub use thread::ThreadSpawnerModule;

/// Creates clients and reports when they exited.
///
/// Only the mechanics live here, the coordinator decides when to spawn.
pub trait SpawnerModule<E: ClientEndpoint> {
    /// Starts a new client that talks through `endpoint`
    fn spawn(&mut self, endpoint: E, clock: ClockView) -> Result<(), PagerError>;

    /// Returns a client that exited since the last call, never blocks
    fn try_reap(&mut self) -> Option<ClientId>;

    /// Forces every client to stop
    fn kill_all(&mut self);
}

/// Shared flag that tells every client to stop immediately
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    triggered: Arc<AtomicBool>,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }
}
