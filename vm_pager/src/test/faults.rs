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

use crate::{
    message::{ClientId, MessageKind},
    pager_config::{NANOS_PER_MS, PAGE_SIZE},
    test::{admit_clients, get_test_pager, request_and_wait, send_request},
    PagerConfig, PagerEvent, RequestError, SimClock,
};

fn two_client_config() -> PagerConfig {
    PagerConfig {
        process_budget: 2,
        concurrency_cap: 2,
        ..Default::default()
    }
}

// empty pool, a write fault is serviced after its latency into frame 0
#[test]
fn test_write_fault_into_empty_pool() {
    let mut pager = get_test_pager(PagerConfig::default());
    let clients = admit_clients(&mut pager, 1);
    let a = clients[0];

    send_request(&mut pager, a, 3 * PAGE_SIZE + 17, true);

    let mut fault_time = None;
    let mut service_time = None;
    for _ in 0..10 {
        for event in pager.tick().unwrap() {
            match event {
                PagerEvent::Fault { slot, page, time } => {
                    assert_eq!((slot, page), (0, 3));
                    fault_time = Some(time);
                }
                PagerEvent::Serviced {
                    slot,
                    page,
                    frame,
                    eviction,
                    time,
                } => {
                    assert_eq!((slot, page, frame), (0, 3, 0));
                    assert!(eviction.is_none());
                    service_time = Some(time);
                }
                _ => {}
            }
        }
        if service_time.is_some() {
            break;
        }
    }

    let fault_time = fault_time.unwrap();
    let service_time = service_time.unwrap();
    assert!(service_time.nanos_since(fault_time) >= 15 * NANOS_PER_MS);

    let frame = pager.frames().get(0).unwrap();
    assert!(frame.occupied);
    assert!(frame.dirty);
    assert_eq!(frame.owner, Some(a));
    assert_eq!(frame.page, Some(3));

    let slot = pager.registry().get(0).unwrap();
    assert_eq!(slot.frame_of(3), Some(0));
    assert!(!slot.is_waiting());
    assert!(pager.queue().is_empty());

    let grant = pager.transport_mut().outbound.last().copied().unwrap();
    assert_eq!(grant.kind, MessageKind::Grant);
    assert!(grant.granted);
    assert_eq!(grant.client, a);
    assert_eq!(grant.address, 3 * PAGE_SIZE + 17);

    assert_eq!(pager.stats().faults, 1);
    assert_eq!(pager.stats().references, 1);
}

#[test]
fn test_read_fault_latency() {
    let mut pager = get_test_pager(PagerConfig::default());
    let a = admit_clients(&mut pager, 1)[0];

    let events = request_and_wait(&mut pager, a, 0, false);
    let fault_time = events
        .iter()
        .find_map(|e| match e {
            PagerEvent::Fault { time, .. } => Some(*time),
            _ => None,
        })
        .unwrap();
    let service_time = events
        .iter()
        .find_map(|e| match e {
            PagerEvent::Serviced { time, .. } => Some(*time),
            _ => None,
        })
        .unwrap();

    assert!(service_time.nanos_since(fault_time) >= 14 * NANOS_PER_MS);
    assert!(!pager.frames().get(0).unwrap().dirty);
}

// a mapped page is granted in the same tick without queueing
#[test]
fn test_hit_is_instantaneous() {
    let mut pager = get_test_pager(PagerConfig::default());
    let a = admit_clients(&mut pager, 1)[0];

    request_and_wait(&mut pager, a, 5 * PAGE_SIZE, false);
    let before = pager.frames().get(0).unwrap().last_ref;
    let answered = pager.transport_mut().outbound.len();

    send_request(&mut pager, a, 5 * PAGE_SIZE + 1000, true);
    let events = pager.tick().unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        PagerEvent::Hit {
            slot: 0,
            page: 5,
            frame: 0,
            ..
        }
    )));
    assert!(pager.queue().is_empty());
    assert_eq!(pager.transport_mut().outbound.len(), answered + 1);
    assert!(pager.transport_mut().outbound.last().unwrap().granted);

    // reference time and dirty bit follow the access
    let frame = pager.frames().get(0).unwrap();
    assert!(frame.last_ref > before);
    assert_eq!(frame.last_ref, pager.clock());
    assert!(frame.dirty);
    assert_eq!(pager.stats().hits, 1);
}

// full pool: the least recently used frame is evicted and its old mapping removed
#[test]
fn test_eviction_of_least_recently_used() {
    let mut pager = get_test_pager(two_client_config());
    let clients = admit_clients(&mut pager, 2);
    let (a, b) = (clients[0], clients[1]);

    for page in 0..4 {
        request_and_wait(&mut pager, a, page * PAGE_SIZE, page % 2 == 0);
    }
    for page in 0..4 {
        request_and_wait(&mut pager, b, page * PAGE_SIZE, false);
    }
    assert_eq!(pager.frames().occupied_count(), 8);

    // page 0 of A becomes the most recently used one
    request_and_wait(&mut pager, a, 0, false);

    let events = request_and_wait(&mut pager, b, 10 * PAGE_SIZE, true);
    let eviction = events
        .iter()
        .find_map(|e| match e {
            PagerEvent::Serviced { eviction, frame, .. } => {
                assert_eq!(*frame, 1);
                *eviction
            }
            _ => None,
        })
        .unwrap();

    assert_eq!(eviction.frame, 1);
    assert_eq!(eviction.owner, a);
    assert_eq!(eviction.page, 1);
    assert!(!eviction.was_dirty);

    let slot_a = pager.registry().find_by_id(a).unwrap();
    let slot_b = pager.registry().find_by_id(b).unwrap();
    assert_eq!(pager.registry().get(slot_a).unwrap().frame_of(1), None);
    assert_eq!(pager.registry().get(slot_a).unwrap().frame_of(0), Some(0));
    assert_eq!(pager.registry().get(slot_b).unwrap().frame_of(10), Some(1));

    let frame = pager.frames().get(1).unwrap();
    assert_eq!(frame.owner, Some(b));
    assert_eq!(frame.page, Some(10));
    assert!(frame.dirty);

    assert_eq!(pager.stats().evictions, 1);
    assert_eq!(pager.frames().occupied_count(), 8);
    assert!(pager.is_consistent());
}

// a bad address only rejects that single request
#[test]
fn test_address_out_of_range_is_rejected() {
    let mut pager = get_test_pager(PagerConfig::default());
    let a = admit_clients(&mut pager, 1)[0];

    send_request(&mut pager, a, 32800, false);
    let events = pager.tick().unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        PagerEvent::Rejected {
            reason: RequestError::AddressOutOfRange {
                address: 32800,
                page: 32
            },
            ..
        }
    )));
    let reply = pager.transport_mut().outbound.last().copied().unwrap();
    assert_eq!(reply.kind, MessageKind::Grant);
    assert!(!reply.granted);
    assert_eq!(pager.stats().rejected, 1);
    assert!(pager.queue().is_empty());

    // the simulation continues serving the client
    request_and_wait(&mut pager, a, 32767, false);
    assert!(pager.transport_mut().outbound.last().unwrap().granted);
    assert_eq!(pager.registry().get(0).unwrap().frame_of(31), Some(0));
}

#[test]
fn test_unknown_client_is_rejected_without_reply() {
    let mut pager = get_test_pager(PagerConfig::default());
    admit_clients(&mut pager, 1);

    send_request(&mut pager, ClientId(99), 0, false);
    let events = pager.tick().unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        PagerEvent::Rejected {
            reason: RequestError::UnknownClient(ClientId(99)),
            ..
        }
    )));
    assert!(pager.transport_mut().outbound.is_empty());
}

#[test]
fn test_second_request_while_waiting_is_rejected() {
    let mut pager = get_test_pager(PagerConfig::default());
    let a = admit_clients(&mut pager, 1)[0];

    send_request(&mut pager, a, 0, false);
    send_request(&mut pager, a, PAGE_SIZE, false);
    pager.tick().unwrap();
    let events = pager.tick().unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        PagerEvent::Rejected {
            reason: RequestError::RequestWhileWaiting(_),
            ..
        }
    )));
    assert_eq!(pager.queue().len(), 1);
    assert!(!pager.transport_mut().outbound[0].granted);
}

// only the head is serviced, a ready fault behind it has to wait
#[test]
fn test_head_of_line_blocking() {
    let config = PagerConfig {
        process_budget: 2,
        concurrency_cap: 2,
        tick_ns: NANOS_PER_MS,
        spawn_overhead_ns: NANOS_PER_MS,
        read_latency_ns: 14 * NANOS_PER_MS,
        write_extra_latency_ns: 5 * NANOS_PER_MS,
        ..Default::default()
    };
    let mut pager = get_test_pager(config);
    let clients = admit_clients(&mut pager, 2);

    send_request(&mut pager, clients[0], PAGE_SIZE, true);
    pager.tick().unwrap();
    send_request(&mut pager, clients[1], 2 * PAGE_SIZE, false);
    pager.tick().unwrap();

    let fault_a = pager.registry().get(0).unwrap().pending_fault().unwrap().time;
    let fault_b = pager.registry().get(1).unwrap().pending_fault().unwrap().time;
    assert!(fault_b > fault_a);

    let mut serviced: Vec<(usize, SimClock)> = Vec::new();
    let mut blocked_ticks = 0;
    while serviced.len() < 2 {
        let b_ready = pager.clock().nanos_since(fault_b) >= 14 * NANOS_PER_MS;
        let a_waiting = pager.registry().get(0).unwrap().is_waiting();
        if b_ready && a_waiting {
            blocked_ticks += 1;
        }

        for event in pager.tick().unwrap() {
            if let PagerEvent::Serviced { slot, time, .. } = event {
                serviced.push((slot, time));
            }
        }
    }

    assert!(blocked_ticks > 0, "B was never ready while A was waiting");
    assert_eq!(serviced[0].0, 0);
    assert_eq!(serviced[1].0, 1);
    assert!(serviced[0].1.nanos_since(fault_a) >= 19 * NANOS_PER_MS);
    assert!(serviced[1].1 > serviced[0].1);
}

// a client that exits while waiting leaves the queue and frees its frames
#[test]
fn test_reap_waiting_client() {
    let mut pager = get_test_pager(two_client_config());
    let clients = admit_clients(&mut pager, 2);
    let (a, b) = (clients[0], clients[1]);

    request_and_wait(&mut pager, a, 0, true);
    request_and_wait(&mut pager, a, PAGE_SIZE, false);
    send_request(&mut pager, a, 2 * PAGE_SIZE, false);
    pager.tick().unwrap();
    send_request(&mut pager, b, 0, false);
    pager.tick().unwrap();
    assert_eq!(pager.queue().len(), 2);

    pager.spawner_mut().exits.push_back(a);
    let events = pager.tick().unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        PagerEvent::Reaped {
            slot: 0,
            freed_frames: 2,
            ..
        }
    )));
    assert_eq!(pager.queue().len(), 1);
    assert_eq!(pager.queue().head(), Some(1));
    assert_eq!(pager.frames().occupied_count(), 0);
    assert!(pager.is_consistent());

    // B gets the first free frame
    while pager.registry().get(1).unwrap().is_waiting() {
        pager.tick().unwrap();
    }
    assert_eq!(pager.registry().get(1).unwrap().frame_of(0), Some(0));
}

#[test]
fn test_report_is_idempotent() {
    let mut pager = get_test_pager(two_client_config());
    let clients = admit_clients(&mut pager, 2);
    request_and_wait(&mut pager, clients[0], 7 * PAGE_SIZE, true);
    request_and_wait(&mut pager, clients[1], 0, false);

    let mut first = Vec::new();
    let mut second = Vec::new();
    pager.write_report(&mut first).unwrap();
    pager.write_report(&mut second).unwrap();

    assert_eq!(first, second);
    let text = String::from_utf8(first).unwrap();
    assert!(text.contains("P0 page table: - - - - - - - 0"));
    assert!(text.contains("P1 page table: 1 -"));
}

#[test]
fn test_periodic_report_every_simulated_second() {
    let mut pager = get_test_pager(PagerConfig::default());
    admit_clients(&mut pager, 1);

    let mut reports = Vec::new();
    while pager.clock().seconds() < 3 {
        if pager.tick().unwrap().contains(&PagerEvent::ReportDue) {
            reports.push(pager.clock());
        }
    }

    // at 1s, 2s and 3s
    assert_eq!(reports.len(), 3);
    for pair in reports.windows(2) {
        assert!(pair[1].nanos_since(pair[0]) >= 1_000_000_000);
    }
}

// real time is only spent on clients that could send a request
#[test]
fn test_tick_waits_only_for_idle_clients() {
    let mut pager = get_test_pager(PagerConfig::default());
    let a = admit_clients(&mut pager, 1)[0];

    let waits = pager.transport_mut().waits;
    pager.tick().unwrap();
    assert_eq!(pager.transport_mut().waits, waits + 1);

    send_request(&mut pager, a, 0, false);
    pager.tick().unwrap();
    assert_eq!(pager.transport_mut().waits, waits + 2);
    assert!(pager.registry().get(0).unwrap().is_waiting());

    // waiting client, head not ready yet
    pager.tick().unwrap();
    assert_eq!(pager.transport_mut().waits, waits + 2);

    // head ready, serviced without waiting
    let events = pager.tick().unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, PagerEvent::Serviced { slot: 0, .. })));
    assert_eq!(pager.transport_mut().waits, waits + 2);

    pager.tick().unwrap();
    assert_eq!(pager.transport_mut().waits, waits + 3);
}

#[test]
fn test_tick_without_request_wait() {
    let config = PagerConfig {
        request_wait_ns: 0,
        ..Default::default()
    };
    let mut pager = get_test_pager(config);
    admit_clients(&mut pager, 1);

    for _ in 0..10 {
        pager.tick().unwrap();
    }
    assert_eq!(pager.transport_mut().waits, 0);
}
