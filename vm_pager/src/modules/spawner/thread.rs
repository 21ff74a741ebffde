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
    collections::HashMap,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};

use crate::{
    message::ClientId,
    modules::transport::ClientEndpoint,
    sim_clock::ClockView,
    worker::{Worker, WorkerConfig, WorkerExit},
    PagerError,
};

use super::{KillSwitch, SpawnerModule};

/// Runs every client as its own thread
pub struct ThreadSpawnerModule {
    worker_config: WorkerConfig,
    seed: u64,
    kill_switch: KillSwitch,
    exit_sender: Sender<ClientId>,
    exit_receiver: Receiver<ClientId>,
    handles: HashMap<ClientId, JoinHandle<WorkerExit>>,
}

/// Reports the exit of a client, even if it panicked
struct ExitNotifier {
    client: ClientId,
    sender: Sender<ClientId>,
}

impl Drop for ExitNotifier {
    fn drop(&mut self) {
        // nobody listens anymore if the coordinator is gone
        let _ = self.sender.send(self.client);
    }
}

impl ThreadSpawnerModule {
    pub fn new(worker_config: WorkerConfig, seed: u64) -> Self {
        let (exit_sender, exit_receiver) = unbounded();
        Self {
            worker_config,
            seed,
            kill_switch: KillSwitch::new(),
            exit_sender,
            exit_receiver,
            handles: HashMap::new(),
        }
    }

    /// Handle to stop all clients from outside the coordinator
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill_switch.clone()
    }

    /// Number of client threads that were not reaped yet
    pub fn running(&self) -> usize {
        self.handles.len()
    }
}

impl<E: ClientEndpoint> SpawnerModule<E> for ThreadSpawnerModule {
    fn spawn(&mut self, endpoint: E, clock: ClockView) -> Result<(), PagerError> {
        let client = endpoint.client();
        let notifier = ExitNotifier {
            client,
            sender: self.exit_sender.clone(),
        };
        let worker = Worker::new(
            endpoint,
            clock,
            self.kill_switch.clone(),
            self.worker_config.clone(),
            self.seed,
        );

        let handle = thread::Builder::new()
            .name(format!("client-{}", client))
            .spawn(move || {
                let _notifier = notifier;
                worker.run()
            })
            .map_err(|e| PagerError::Setup(format!("could not spawn client {}: {}", client, e)))?;

        self.handles.insert(client, handle);
        Ok(())
    }

    fn try_reap(&mut self) -> Option<ClientId> {
        let client = self.exit_receiver.try_recv().ok()?;

        if let Some(handle) = self.handles.remove(&client) {
            match handle.join() {
                Ok(exit) => debug!("Client {} exited: {:?}", client, exit),
                Err(_) => warn!("Client {} panicked", client),
            }
        }

        Some(client)
    }

    fn kill_all(&mut self) {
        self.kill_switch.trigger();
    }
}

impl Drop for ThreadSpawnerModule {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.kill_switch.trigger();
        }
    }
}
