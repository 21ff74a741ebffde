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

use std::{
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, error};

use crate::PagerError;

/// Wall clock deadline for the whole simulation.
///
/// Fires `on_fire` once `timeout` of real time passed, unless it was disarmed before.
/// Independent from the simulated clock.
pub struct Watchdog {
    disarm: Option<Sender<()>>,
    handle: Option<JoinHandle<bool>>,
}

impl Watchdog {
    pub fn arm<F>(timeout: Duration, on_fire: F) -> Result<Self, PagerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let (disarm, disarmed) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("watchdog".to_string())
            .spawn(move || match disarmed.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    error!("Watchdog deadline of {:?} reached", timeout);
                    on_fire();
                    true
                }
                // disarmed explicitly or dropped
                Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
            })
            .map_err(|e| PagerError::Setup(format!("could not start watchdog: {}", e)))?;

        debug!("Watchdog armed with {:?}", timeout);

        Ok(Self {
            disarm: Some(disarm),
            handle: Some(handle),
        })
    }

    /// Stops the watchdog, returns `true` if it already fired
    pub fn disarm(mut self) -> bool {
        self.stop()
    }

    fn stop(&mut self) -> bool {
        if let Some(disarm) = self.disarm.take() {
            let _ = disarm.try_send(());
        }

        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(false),
            None => false,
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}
