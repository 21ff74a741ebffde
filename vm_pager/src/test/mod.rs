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

use std::{collections::VecDeque, time::Duration};

use crate::{
    message::{ClientId, Message},
    modules::{
        replacement::LruReplacementModule,
        spawner::SpawnerModule,
        transport::{ClientEndpoint, TransportModule},
    },
    sim_clock::ClockView,
    Pager, PagerConfig, PagerError, PagerEvent,
};

mod faults;

/// Transport that is driven by the test itself
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub(crate) inbound: VecDeque<Message>,
    pub(crate) outbound: Vec<Message>,
    pub(crate) connected: Vec<ClientId>,
    pub(crate) waits: usize,
}

pub(crate) struct ScriptedEndpoint {
    client: ClientId,
}

impl ClientEndpoint for ScriptedEndpoint {
    fn client(&self) -> ClientId {
        self.client
    }

    fn request(&mut self, _address: u32, _is_write: bool) -> Result<Message, PagerError> {
        Err(PagerError::Communication(
            "scripted clients do not send requests themselves".to_string(),
        ))
    }
}

impl TransportModule for ScriptedTransport {
    type Endpoint = ScriptedEndpoint;

    fn connect(&mut self, client: ClientId) -> Result<Self::Endpoint, PagerError> {
        self.connected.push(client);
        Ok(ScriptedEndpoint { client })
    }

    fn disconnect(&mut self, client: ClientId) {
        self.connected.retain(|connected| *connected != client);
    }

    fn try_receive(&mut self) -> Result<Option<Message>, PagerError> {
        Ok(self.inbound.pop_front())
    }

    fn receive_timeout(&mut self, _timeout: Duration) -> Result<Option<Message>, PagerError> {
        self.waits += 1;
        Ok(self.inbound.pop_front())
    }

    fn send(&mut self, message: Message) -> Result<(), PagerError> {
        if !self.connected.contains(&message.client) {
            return Err(PagerError::Communication(format!(
                "client {} is not connected",
                message.client
            )));
        }
        self.outbound.push(message);
        Ok(())
    }
}

/// Spawner that only records what happened, exits are queued by the test
#[derive(Default)]
pub(crate) struct ScriptedSpawner {
    pub(crate) spawned: Vec<ClientId>,
    pub(crate) exits: VecDeque<ClientId>,
    pub(crate) exit_immediately: bool,
    pub(crate) killed: bool,
}

impl SpawnerModule<ScriptedEndpoint> for ScriptedSpawner {
    fn spawn(&mut self, endpoint: ScriptedEndpoint, _clock: ClockView) -> Result<(), PagerError> {
        self.spawned.push(endpoint.client());
        if self.exit_immediately {
            self.exits.push_back(endpoint.client());
        }
        Ok(())
    }

    fn try_reap(&mut self) -> Option<ClientId> {
        self.exits.pop_front()
    }

    fn kill_all(&mut self) {
        self.killed = true;
    }
}

pub(crate) type TestPager = Pager<LruReplacementModule, ScriptedTransport, ScriptedSpawner>;

pub(crate) fn get_test_pager(config: PagerConfig) -> TestPager {
    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .is_test(true)
        .format_module_path(false)
        .try_init();

    Pager::new(config, ScriptedTransport::default(), ScriptedSpawner::default()).unwrap()
}

/// Ticks until `count` clients were admitted and returns their ids
pub(crate) fn admit_clients(pager: &mut TestPager, count: usize) -> Vec<ClientId> {
    let mut clients = Vec::new();
    for _ in 0..1000 {
        for event in pager.tick().unwrap() {
            if let PagerEvent::Admitted { client, .. } = event {
                clients.push(client);
            }
        }
        if clients.len() == count {
            return clients;
        }
    }
    panic!("could only admit {} of {} clients", clients.len(), count);
}

pub(crate) fn send_request(pager: &mut TestPager, client: ClientId, address: u32, is_write: bool) {
    pager
        .transport_mut()
        .inbound
        .push_back(Message::request(client, address, is_write));
}

/// Sends a request and ticks until it was answered, returns all events of these ticks
pub(crate) fn request_and_wait(
    pager: &mut TestPager,
    client: ClientId,
    address: u32,
    is_write: bool,
) -> Vec<PagerEvent> {
    let answered = pager.transport_mut().outbound.len();
    send_request(pager, client, address, is_write);

    let mut events = Vec::new();
    for _ in 0..100 {
        events.extend(pager.tick().unwrap());
        if pager.transport_mut().outbound.len() > answered {
            return events;
        }
    }
    panic!("request of client {} for {} was never answered", client, address);
}

#[test]
fn test_run_until_finished() {
    let config = PagerConfig {
        process_budget: 3,
        concurrency_cap: 2,
        ..Default::default()
    };
    let mut pager = get_test_pager(config);
    pager.spawner_mut().exit_immediately = true;

    let mut out = Vec::new();
    let report = pager.run(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(pager.is_finished());
    assert_eq!(report.stats.spawned, 3);
    assert_eq!(pager.spawner_mut().spawned.len(), 3);
    assert!(text.contains("OSS: admitted client 3 as P0"));
    assert!(text.contains("terminated, freed 0 frame(s)"));
    assert!(pager.transport_mut().connected.is_empty());
}

#[test]
fn test_kill_all() {
    let config = PagerConfig {
        process_budget: 2,
        concurrency_cap: 2,
        ..Default::default()
    };
    let mut pager = get_test_pager(config);
    admit_clients(&mut pager, 2);

    pager.kill_all();
    assert!(pager.spawner_mut().killed);
    assert!(pager.transport_mut().connected.is_empty());
}
