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

use std::{io::Write, time::Duration};

use log::{debug, info, trace, warn};

use crate::{
    frame_table::{Eviction, FrameTable},
    message::{ClientId, FrameIndex, Message, MessageKind},
    modules::{
        replacement::ReplacementModule,
        spawner::SpawnerModule,
        transport::{ClientEndpoint, TransportModule},
    },
    pager_config::{PagerConfig, PAGE_COUNT},
    pager_event::PagerEvent,
    registry::{PendingFault, Registry, SlotIndex},
    report::{write_periodic_report, FinalReport, PagerStats},
    sim_clock::{ClockView, SimClock},
    wait_queue::FaultQueue,
    PagerError, RequestError,
};

/// Throttles client creation
#[derive(Debug, Clone, Copy, Default)]
struct AdmissionState {
    total_spawned: usize,
    next_spawn_deadline: u64,
    next_client_id: u32,
}

/// The coordinator.
///
/// Owns every table of the simulation and is the only one that mutates them.
/// Clients talk to it through `T`, are created through `S` and `R` decides
/// which frame is evicted once the pool is full.
pub struct Pager<R, T, S>
where
    R: ReplacementModule,
    T: TransportModule,
    S: SpawnerModule<T::Endpoint>,
{
    config: PagerConfig,
    clock: SimClock,
    clock_view: ClockView,
    registry: Registry,
    frames: FrameTable,
    queue: FaultQueue,
    admission: AdmissionState,
    last_report: SimClock,
    stats: PagerStats,

    replacement: R,
    transport: T,
    spawner: S,
}

impl<R, T, S> Pager<R, T, S>
where
    R: ReplacementModule,
    T: TransportModule,
    S: SpawnerModule<T::Endpoint>,
{
    pub fn new(config: PagerConfig, transport: T, spawner: S) -> Result<Self, PagerError> {
        config.validate()?;

        info!(
            "Pager with {} frames, budget={}, concurrency cap={}, interval={}ns",
            config.frame_count,
            config.process_budget,
            config.concurrency_cap,
            config.spawn_interval_ns
        );

        let clock = SimClock::new();
        let clock_view = ClockView::new();
        clock_view.publish(&clock);

        Ok(Self {
            registry: Registry::new(config.max_clients),
            frames: FrameTable::new(config.frame_count),
            queue: FaultQueue::new(),
            admission: AdmissionState {
                total_spawned: 0,
                next_spawn_deadline: clock.as_nanos() + config.spawn_interval_ns,
                next_client_id: 1,
            },
            last_report: clock,
            stats: PagerStats::default(),
            clock,
            clock_view,
            config,
            replacement: R::new(),
            transport,
            spawner,
        })
    }

    #[inline]
    pub fn clock(&self) -> SimClock {
        self.clock
    }

    #[inline]
    pub fn clock_view(&self) -> ClockView {
        self.clock_view.clone()
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    #[inline]
    pub fn queue(&self) -> &FaultQueue {
        &self.queue
    }

    #[inline]
    pub fn stats(&self) -> &PagerStats {
        &self.stats
    }

    #[inline]
    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    #[inline]
    pub fn total_spawned(&self) -> usize {
        self.admission.total_spawned
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn spawner_mut(&mut self) -> &mut S {
        &mut self.spawner
    }

    /// The budget is used up and every client exited
    pub fn is_finished(&self) -> bool {
        self.admission.total_spawned >= self.config.process_budget
            && self.registry.active_count() == 0
    }

    fn advance_clock(&mut self, delta_nanos: u64) {
        self.clock.advance(delta_nanos);
        self.clock_view.publish(&self.clock);
    }

    /// Runs a single step of the simulation
    ///
    /// Every tick admits at most one client, handles at most one request
    /// and services at most the head of the fault queue.
    /// While a client is idle and the queue head is not ready yet, the tick
    /// waits up to `request_wait_ns` of real time for its request, so that
    /// simulated time does not run away from the clients.
    pub fn tick(&mut self) -> Result<Vec<PagerEvent>, PagerError> {
        let mut events = Vec::new();

        self.advance_clock(self.config.tick_ns);

        self.reap_exited(&mut events);

        if self.clock.nanos_since(self.last_report) >= self.config.report_interval_ns {
            self.last_report = self.clock;
            events.push(PagerEvent::ReportDue);
        }

        if let Some(event) = self.try_admit()? {
            events.push(event);
        }

        let request = if self.should_wait_for_request() {
            self.transport
                .receive_timeout(Duration::from_nanos(self.config.request_wait_ns))?
        } else {
            self.transport.try_receive()?
        };
        if let Some(request) = request {
            if let Some(event) = self.handle_request(request)? {
                events.push(event);
            }
        }

        if let Some(event) = self.service_queue_head()? {
            events.push(event);
        }

        debug_assert!(self.is_consistent(), "tables became inconsistent");

        Ok(events)
    }

    /// Ticks until the simulation is finished.
    ///
    /// Event lines and periodic reports are written to `out`.
    pub fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<FinalReport, PagerError> {
        while !self.is_finished() {
            for event in self.tick()? {
                match event {
                    PagerEvent::ReportDue => self.write_report(out)?,
                    event => writeln!(out, "{}", event)?,
                }
            }
        }

        info!("Simulation finished at {}", self.clock);
        Ok(self.final_report())
    }

    pub fn write_report<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), PagerError> {
        write_periodic_report(out, self.clock, &self.registry, &self.frames)?;
        Ok(())
    }

    pub fn final_report(&self) -> FinalReport {
        FinalReport {
            stats: self.stats,
            elapsed: self.clock,
        }
    }

    /// Stops every client and drops their connections
    pub fn kill_all(&mut self) {
        warn!("Killing {} active client(s)", self.registry.active_count());
        self.spawner.kill_all();

        let clients: Vec<ClientId> = self.registry.iter().map(|(_, slot)| slot.id()).collect();
        for client in clients {
            self.transport.disconnect(client);
        }
    }

    fn should_wait_for_request(&self) -> bool {
        self.config.request_wait_ns > 0
            && !self.queue_head_is_ready()
            && self.registry.iter().any(|(_, slot)| !slot.is_waiting())
    }

    fn queue_head_is_ready(&self) -> bool {
        self.queue
            .head()
            .and_then(|slot| self.registry.get(slot))
            .and_then(|state| state.pending_fault())
            .map_or(false, |fault| {
                self.clock.nanos_since(fault.time) >= self.config.fault_latency_ns(fault.is_write)
            })
    }

    fn reap_exited(&mut self, events: &mut Vec<PagerEvent>) {
        while let Some(client) = self.spawner.try_reap() {
            self.transport.disconnect(client);

            let Some((slot, state)) = self.registry.remove(client) else {
                warn!("Exit of unknown client {}", client);
                continue;
            };

            if state.is_waiting() {
                self.queue.remove(slot);
            }
            let freed_frames = self.frames.release_owned_by(client);
            debug!(
                "Reaped client {} from slot {}, freed {} frame(s)",
                client, slot, freed_frames
            );

            events.push(PagerEvent::Reaped {
                slot,
                client,
                freed_frames,
                time: self.clock,
            });
        }
    }

    fn try_admit(&mut self) -> Result<Option<PagerEvent>, PagerError> {
        let can_admit = self.clock.as_nanos() >= self.admission.next_spawn_deadline
            && self.admission.total_spawned < self.config.process_budget
            && self.registry.active_count() < self.config.concurrency_cap
            && self.registry.has_free_slot();
        if !can_admit {
            return Ok(None);
        }

        let client = ClientId(self.admission.next_client_id);
        self.admission.next_client_id += 1;

        let endpoint = self.transport.connect(client)?;
        debug_assert_eq!(endpoint.client(), client);
        self.spawner.spawn(endpoint, self.clock_view.clone())?;

        self.admission.total_spawned += 1;
        self.stats.spawned += 1;
        self.advance_clock(self.config.spawn_overhead_ns);

        let slot = self.registry.admit(client, self.clock)?;
        self.admission.next_spawn_deadline = self.clock.as_nanos() + self.config.spawn_interval_ns;

        debug!(
            "Admitted client {} into slot {} ({}/{})",
            client, slot, self.admission.total_spawned, self.config.process_budget
        );

        Ok(Some(PagerEvent::Admitted {
            slot,
            client,
            time: self.clock,
        }))
    }

    /// Resolves a request either as hit or by queueing a fault
    pub(crate) fn handle_request(
        &mut self,
        request: Message,
    ) -> Result<Option<PagerEvent>, PagerError> {
        if request.kind != MessageKind::Request {
            warn!("Ignoring {:?} that is not a request", request);
            return Ok(None);
        }

        self.stats.references += 1;

        let Some(slot) = self.registry.find_by_id(request.client) else {
            // there is no endpoint to answer to
            return Ok(Some(self.reject(
                request,
                RequestError::UnknownClient(request.client),
                false,
            )?));
        };

        let page = match request.page() {
            Ok(page) => page,
            Err(page) => {
                return Ok(Some(self.reject(
                    request,
                    RequestError::AddressOutOfRange {
                        address: request.address,
                        page,
                    },
                    true,
                )?));
            }
        };

        let (waiting, mapped) = match self.registry.get(slot) {
            Some(state) => (state.is_waiting(), state.frame_of(page)),
            None => unreachable!("slot {} was just found", slot),
        };
        if waiting {
            return Ok(Some(self.reject(
                request,
                RequestError::RequestWhileWaiting(request.client),
                true,
            )?));
        }

        if let Some(frame) = mapped {
            self.stats.hits += 1;
            self.advance_clock(self.config.access_overhead_ns);
            self.frames.touch(frame, request.is_write, self.clock);

            self.transport.send(Message::grant(&request))?;
            trace!("P{} page {} hit in frame {}", slot, page, frame);

            return Ok(Some(PagerEvent::Hit {
                slot,
                page,
                frame,
                time: self.clock,
            }));
        }

        self.stats.faults += 1;
        let fault = PendingFault {
            page,
            address: request.address,
            is_write: request.is_write,
            time: self.clock,
        };
        if let Some(state) = self.registry.get_mut(slot) {
            state.begin_wait(fault);
        }
        self.queue.push(slot);
        trace!("P{} page {} faulted, {} waiting", slot, page, self.queue.len());

        Ok(Some(PagerEvent::Fault {
            slot,
            page,
            time: self.clock,
        }))
    }

    fn reject(
        &mut self,
        request: Message,
        reason: RequestError,
        reply: bool,
    ) -> Result<PagerEvent, PagerError> {
        warn!("Rejecting request of client {}: {}", request.client, reason);
        self.stats.rejected += 1;

        if reply {
            self.transport.send(Message::reject(&request))?;
        }

        Ok(PagerEvent::Rejected {
            client: request.client,
            address: request.address,
            reason,
            time: self.clock,
        })
    }

    /// Services the head of the fault queue if its latency passed
    pub(crate) fn service_queue_head(&mut self) -> Result<Option<PagerEvent>, PagerError> {
        let Some(slot) = self.queue.head() else {
            return Ok(None);
        };

        let Some(fault) = self.registry.get(slot).and_then(|state| state.pending_fault().copied())
        else {
            // the queue only holds waiting slots
            self.queue.pop();
            warn!("Dropped stale queue entry for slot {}", slot);
            return Ok(None);
        };

        let latency = self.config.fault_latency_ns(fault.is_write);
        if self.clock.nanos_since(fault.time) < latency {
            // head of line blocking: later faults have to wait as well
            return Ok(None);
        }

        self.queue.pop();
        let (frame, eviction) = self.allocate(slot, fault.page, fault.is_write);

        let Some(state) = self.registry.get_mut(slot) else {
            unreachable!("slot {} is waiting", slot);
        };
        state.end_wait();
        let client = state.id();

        self.advance_clock(self.config.access_overhead_ns);

        let request = Message::request(client, fault.address, fault.is_write);
        self.transport.send(Message::grant(&request))?;

        Ok(Some(PagerEvent::Serviced {
            slot,
            page: fault.page,
            frame,
            eviction,
            time: self.clock,
        }))
    }

    /// Loads `page` of `slot` into a frame, evicting the victim of `R` if the pool is full
    fn allocate(
        &mut self,
        slot: SlotIndex,
        page: usize,
        is_write: bool,
    ) -> (FrameIndex, Option<Eviction>) {
        let mut eviction = None;

        let frame = match self.frames.first_free() {
            Some(frame) => frame,
            None => {
                let victim = self
                    .replacement
                    .select_victim(self.frames.frames())
                    .unwrap_or(0);

                if let Some(evicted) = self.frames.evict(victim) {
                    // the old mapping is dropped, dirty data is not written back
                    if let Some(owner_slot) = self.registry.find_by_id(evicted.owner) {
                        if let Some(owner) = self.registry.get_mut(owner_slot) {
                            owner.unmap(evicted.page);
                        }
                    }
                    debug!(
                        "Evicted page {} of client {} from frame {}",
                        evicted.page, evicted.owner, victim
                    );
                    self.stats.evictions += 1;
                    eviction = Some(evicted);
                }
                victim
            }
        };

        let Some(state) = self.registry.get_mut(slot) else {
            unreachable!("slot {} is allocating", slot);
        };
        self.frames.assign(frame, state.id(), page, is_write, self.clock);
        state.map(page, frame);

        (frame, eviction)
    }

    /// Checks that every occupied frame is mapped by exactly its owner and the other way round,
    /// and that exactly the waiting slots are queued
    pub fn is_consistent(&self) -> bool {
        if self.frames.occupied_count() > self.frames.capacity() {
            return false;
        }

        for (index, frame) in self.frames.frames().iter().enumerate() {
            if !frame.occupied {
                continue;
            }
            let (Some(owner), Some(page)) = (frame.owner, frame.page) else {
                return false;
            };
            let mapped = self
                .registry
                .find_by_id(owner)
                .and_then(|slot| self.registry.get(slot))
                .and_then(|state| state.frame_of(page));
            if mapped != Some(index) {
                return false;
            }
        }

        for (slot, state) in self.registry.iter() {
            for page in 0..PAGE_COUNT {
                if let Some(frame) = state.frame_of(page) {
                    let Some(frame) = self.frames.get(frame) else {
                        return false;
                    };
                    if !frame.occupied
                        || frame.owner != Some(state.id())
                        || frame.page != Some(page)
                    {
                        return false;
                    }
                }
            }

            if state.is_waiting() != self.queue.contains(slot) {
                return false;
            }
        }

        self.queue.len() == self.registry.iter().filter(|(_, s)| s.is_waiting()).count()
    }
}
