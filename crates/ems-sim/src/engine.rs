//! One simulation run.
//!
//! A [`Run`] owns everything mutable about a replay: the ambulance roster,
//! the event and call queues, per-station shift bookkeeping and the
//! responses recorded so far.  It borrows the read-only world from its
//! [`Simulator`] and is consumed by [`Run::execute`].

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use ems_core::{Allocation, AmbulanceId, Coordinate, IncidentId, ShiftType, SimTime};
use ems_incident::{Incident, UrgencyLevel};

use crate::{
    Ambulance, AmbulanceState, Call, CallQueue, DispatchContext, DispatchKey, Event, EventQueue,
    ResponseRecord, SimConfig, SimError, SimObserver, SimResult, SimulationResults, Simulator,
};

/// Units gathering at an incident whose transport leg is known.  Nobody
/// leaves before the last of them has arrived.
struct Scene {
    ambulances:   Vec<AmbulanceId>,
    /// Departure planned by the latest dispatch to the scene.
    departure:    SimTime,
    /// Arrival of the last unit sent so far.
    last_arrival: SimTime,
}

/// A job booked for a unit that is still at the hospital.
#[derive(Copy, Clone)]
struct NextCall {
    incident: IncidentId,
    hospital: Option<Coordinate>,
}

/// How a unit can take a call.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Candidate {
    Available,
    /// On its way to this other incident.
    Redirect(IncidentId),
    /// At or driving to the hospital, free in `ready_in` seconds.
    Queue { ready_in: i64 },
}

/// Outcome of one dispatch attempt.
struct Dispatch {
    /// Units sent, best first, with their travel times.
    units:    Vec<(AmbulanceId, i64)>,
    /// Whether the call's whole demand was met.
    complete: bool,
    /// Incidents whose unit was redirected to this call.
    robbed:   Vec<IncidentId>,
}

pub(crate) struct Run<'a> {
    sim:    &'a Simulator,
    config: &'a SimConfig,

    ambulances: Vec<Ambulance>,
    /// Ambulance ids per station, indexed by `StationId`.
    by_station: Vec<Vec<AmbulanceId>>,
    /// Required on-duty count per shift and station.
    required:   [Vec<u32>; 2],
    /// Busy units per station that must go off duty when next released.
    remaining_off_duty: Vec<u32>,
    shift:      ShiftType,

    scenes:     FxHashMap<IncidentId, Scene>,
    /// Indexed by `AmbulanceId`.
    next_calls: Vec<Option<NextCall>>,
    /// When a transporting unit is done at the hospital, by `AmbulanceId`.
    free_at:    Vec<Option<SimTime>>,

    events:    EventQueue,
    calls:     CallQueue,
    /// A redispatched incident clears its slot until it is served again.
    records:   Vec<Option<ResponseRecord>>,
    recorded:  FxHashMap<IncidentId, usize>,
    last_time: Option<SimTime>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(
        sim:        &'a Simulator,
        config:     &'a SimConfig,
        allocation: &Allocation,
        timeline:   &[IncidentId],
    ) -> SimResult<Self> {
        let station_count = sim.stations.len();
        let required = [
            allocation.station_counts(ShiftType::Day, station_count),
            allocation.station_counts(ShiftType::Night, station_count),
        ];
        let shift = ShiftType::at(config.start, config.day_shift_start_hour, config.night_shift_start_hour);

        // ── Roster: max(day, night) units per station ─────────────────────
        let mut ambulances: Vec<Ambulance> = Vec::new();
        let mut by_station: Vec<Vec<AmbulanceId>> = vec![Vec::new(); station_count];
        for station in sim.stations.iter() {
            let s = station.id.index();
            let size = required[0][s].max(required[1][s]) as usize;
            for k in 0..size {
                let id = AmbulanceId(ambulances.len() as u32);
                let mut ambulance = Ambulance::new(id, station.id, station.coordinate);
                if k < required[shift.index()][s] as usize {
                    ambulance.start_shift()?;
                }
                ambulances.push(ambulance);
                by_station[s].push(id);
            }
        }

        // ── Seed one NewCall per incident in the window ───────────────────
        let mut events = EventQueue::new();
        for &id in timeline {
            let incident = sim.incidents.get(id).ok_or(SimError::UnknownIncident(id))?;
            let call = Call::from_incident(id, incident, is_measurable(config, incident));
            events.push(incident.call_received, Event::NewCall(call));
        }

        debug!(
            ambulances = ambulances.len(),
            calls = events.len(),
            %shift,
            "simulation run initialised"
        );

        let fleet = ambulances.len();
        Ok(Self {
            sim,
            config,
            ambulances,
            by_station,
            required,
            remaining_off_duty: vec![0; station_count],
            shift,
            scenes: FxHashMap::default(),
            next_calls: vec![None; fleet],
            free_at: vec![None; fleet],
            events,
            calls: CallQueue::new(),
            records: Vec::new(),
            recorded: FxHashMap::default(),
            last_time: None,
        })
    }

    /// Process events until the queue is empty.
    pub(crate) fn execute<O: SimObserver>(mut self, observer: &mut O) -> SimResult<SimulationResults> {
        while let Some((time, event)) = self.events.pop() {
            if let Some(previous) = self.last_time {
                if time < previous {
                    return Err(SimError::EventOutOfOrder { previous, current: time, kind: event.kind() });
                }
            }
            self.last_time = Some(time);

            self.check_shift(time, observer)?;
            observer.on_event(time, event.kind());

            match event {
                Event::NewCall(call) => self.handle_new_call(time, call, true, observer)?,
                Event::SceneDeparture { incident, ambulances } => {
                    self.handle_scene_departure(time, incident, &ambulances)?;
                    self.serve_waiting_calls(time, observer)?;
                }
                Event::JobCompletion { incident, ambulance } => {
                    self.handle_job_completion(time, incident, ambulance)?;
                    self.serve_waiting_calls(time, observer)?;
                }
                Event::LocationUpdate { ambulance, epoch } => self.handle_location_update(time, ambulance, epoch),
            }
        }

        if let Some(last) = self.last_time {
            observer.on_sim_end(last);
        }
        debug!(
            responses = self.recorded.len(),
            unserved = self.calls.len(),
            "simulation run finished"
        );
        Ok(SimulationResults::new(self.records.into_iter().flatten().collect()))
    }

    // ── Event handlers ────────────────────────────────────────────────────

    /// Dispatch `call`.  Units are on their way once the part of the
    /// historical handling delay not already spent waiting has passed.
    fn handle_new_call<O: SimObserver>(
        &mut self,
        now:        SimTime,
        call:       Call,
        redispatch: bool,
        observer:   &mut O,
    ) -> SimResult<()> {
        let incident = *self.incident(call.incident)?;
        let Dispatch { units, complete, robbed } = self.dispatch(now, &call, &incident, redispatch)?;

        if let Some(&(_, first_travel)) = units.first() {
            let waited = now - incident.call_received;
            let handling = (incident.dispatch_delay() - waited).max(0);

            if call.measurable {
                // max(waited, historical delay) + travel
                let response_secs = waited + handling + first_travel;
                if response_secs < 0 {
                    return Err(SimError::NegativeResponseTime {
                        incident: call.incident,
                        call_received: incident.call_received,
                        response_secs,
                    });
                }
                let record = ResponseRecord {
                    call_received: incident.call_received,
                    response_secs,
                    urgency: incident.urgency,
                };
                observer.on_response(&record);
                self.record(call.incident, record);
            }
            self.schedule_job(now, handling, call.incident, &incident, &units, complete)?;
        }

        for previous in robbed {
            let old = *self.incident(previous)?;
            trace!(incident = %previous, to = %call.incident, "unit redirected, dispatching again");
            let again = Call::from_incident(previous, &old, is_measurable(self.config, &old));
            self.handle_new_call(now, again, false, observer)?;
        }
        Ok(())
    }

    /// Schedule what follows a dispatch made at `now`.  Units start driving
    /// after `handling` seconds; an aborted job ends regardless.
    fn schedule_job(
        &mut self,
        now:      SimTime,
        handling: i64,
        id:       IncidentId,
        incident: &Incident,
        units:    &[(AmbulanceId, i64)],
        complete: bool,
    ) -> SimResult<()> {
        let derived = |r: Result<i64, ems_incident::IncidentError>| {
            r.map_err(|source| SimError::Incident { incident: id, source })
        };

        let start = now.plus_secs(handling);
        let Some(historic_departure) = incident.departure_from_scene else {
            for &(ambulance, travel) in units {
                let completion = if incident.is_aborted() {
                    now.plus_secs(derived(incident.time_before_aborting())?)
                } else {
                    start.plus_secs(travel + derived(incident.time_at_scene_non_transport())?.max(0))
                };
                self.events.push(completion, Event::JobCompletion { incident: id, ambulance });
            }
            return Ok(());
        };

        let first_arrival = start.plus_secs(units.first().map_or(0, |&(_, travel)| travel));
        let on_scene = match incident.arrival_at_scene {
            Some(_) => derived(incident.time_at_scene())?,
            None    => historic_departure - first_arrival,
        };
        let departure = first_arrival.plus_secs(on_scene.max(0));
        let last_arrival = units
            .iter()
            .map(|&(_, travel)| start.plus_secs(travel))
            .max()
            .unwrap_or(first_arrival);

        let scene = self.scenes.entry(id).or_insert_with(|| Scene {
            ambulances: Vec::new(),
            departure,
            last_arrival,
        });
        scene.ambulances.extend(units.iter().map(|&(a, _)| a));
        scene.departure = scene.departure.max(departure);
        scene.last_arrival = scene.last_arrival.max(last_arrival);

        if complete {
            if let Some(scene) = self.scenes.remove(&id) {
                let leave = scene.departure.max(scene.last_arrival);
                self.events.push(leave, Event::SceneDeparture { incident: id, ambulances: scene.ambulances });
            }
        }
        Ok(())
    }

    fn handle_scene_departure(&mut self, now: SimTime, incident: IncidentId, ambulances: &[AmbulanceId]) -> SimResult<()> {
        let sim = self.sim;
        let hospital_secs = self.incident(incident)?.hospital_time(self.config.historic_hospital_time);
        for &id in ambulances {
            match self.ambulances[id.index()].state() {
                AmbulanceState::Dispatched { incident: i, hospital: Some(_) } if i == incident => {
                    let travel = self.ambulances[id.index()].begin_transport(now, sim.oracle.as_ref())?;
                    self.schedule_location_update(id, now, travel);
                    let free = now.plus_secs(travel + hospital_secs);
                    self.free_at[id.index()] = Some(free);
                    self.events.push(free, Event::JobCompletion { incident, ambulance: id });
                }
                AmbulanceState::Dispatched { incident: i, .. } if i == incident => self.release(id, now)?,
                _ => trace!(ambulance = %id, %incident, "unit no longer at this scene"),
            }
        }
        Ok(())
    }

    fn handle_job_completion(&mut self, now: SimTime, incident: IncidentId, id: AmbulanceId) -> SimResult<()> {
        if self.ambulances[id.index()].incident() == Some(incident) {
            return self.release(id, now);
        }
        // Ended before the booked unit got away from the hospital.
        let slot = &mut self.next_calls[id.index()];
        if slot.is_some_and(|next| next.incident == incident) {
            trace!(ambulance = %id, %incident, "booked job ended before it began");
            *slot = None;
        }
        Ok(())
    }

    fn handle_location_update(&mut self, now: SimTime, id: AmbulanceId, epoch: u32) {
        let ambulance = &mut self.ambulances[id.index()];
        if ambulance.epoch() != epoch {
            return;
        }
        if !ambulance.update_location(now) {
            let period = self.config.update_location_period_secs;
            self.events.push(now.plus_secs(period), Event::LocationUpdate { ambulance: id, epoch });
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Send the best-ranked units to `call`.  Unmet demand is queued.
    fn dispatch(&mut self, now: SimTime, call: &Call, incident: &Incident, redispatch: bool) -> SimResult<Dispatch> {
        let sim = self.sim;
        let redispatch = redispatch && self.config.enable_redispatch && !incident.urgency.is_regular();
        let queue_next = self.config.enable_queue_next && call.demand() == 1;

        let mut ranked: Vec<(DispatchKey, Candidate, AmbulanceId)> = {
            let candidates: Vec<(&Ambulance, Candidate)> = self
                .ambulances
                .iter()
                .filter_map(|a| Some((a, self.candidate(a, now, call.incident, redispatch, queue_next)?)))
                .collect();
            let pool: Vec<&Ambulance> = candidates.iter().map(|&(a, _)| a).collect();
            let ctx = DispatchContext {
                now,
                incident,
                demand:       call.demand(),
                available:    &pool,
                oracle:       sim.oracle.as_ref(),
                demand_table: &sim.demand,
            };
            let policy = self.config.dispatch_policy.policy();
            candidates
                .iter()
                .map(|&(a, candidate)| {
                    let mut key = policy.rank(a, &ctx);
                    if let Candidate::Queue { ready_in } = candidate {
                        key.travel += ready_in as f64;
                    }
                    (key, candidate, a.id)
                })
                .collect()
        };
        if ranked.is_empty() {
            trace!(incident = %call.incident, "no ambulance available, call queued");
            self.calls.push(incident.call_received, *call);
            return Ok(Dispatch { units: Vec::new(), complete: false, robbed: Vec::new() });
        }
        // Free units first among equals.
        ranked.sort_by(|a, b| a.0.rank_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

        let transport = (call.transport_demand as usize).min(ranked.len());
        let non_transport = (call.non_transport_demand as usize).min(ranked.len() - transport);
        let hospital: Option<Coordinate> = if transport > 0 {
            sim.hospitals.nearest(incident.location).map(|h| h.coordinate)
        } else {
            None
        };

        let mut units = Vec::with_capacity(transport + non_transport);
        let mut robbed = Vec::new();
        for (i, &(key, candidate, id)) in ranked.iter().take(transport + non_transport).enumerate() {
            let target_hospital = if i < transport { hospital } else { None };
            let oracle = sim.oracle.as_ref();
            let ambulance = &mut self.ambulances[id.index()];
            ambulance.set_coverage_penalty(key.penalty);
            let travel = match candidate {
                Candidate::Available => {
                    ambulance.dispatch(call.incident, incident.location, target_hospital, now, oracle)?
                }
                Candidate::Redirect(previous) => {
                    let travel = ambulance.redirect(call.incident, incident.location, target_hospital, now, oracle)?;
                    self.events.cancel_jobs(previous);
                    self.scenes.remove(&previous);
                    if let Some(&slot) = self.recorded.get(&previous) {
                        self.records[slot] = None;
                    }
                    robbed.push(previous);
                    travel
                }
                Candidate::Queue { ready_in } => {
                    let AmbulanceState::Transporting { hospital: at, .. } = ambulance.state() else {
                        return Err(SimError::IllegalTransition {
                            ambulance: id,
                            state:     ambulance.state().name(),
                            action:    "book a next call",
                        });
                    };
                    self.next_calls[id.index()] = Some(NextCall { incident: call.incident, hospital: target_hospital });
                    units.push((id, ready_in + oracle.travel_time(at, incident.location)));
                    continue;
                }
            };
            self.schedule_location_update(id, now, travel);
            units.push((id, travel));
        }

        let remainder = Call {
            incident:             call.incident,
            transport_demand:     call.transport_demand - transport as u32,
            non_transport_demand: call.non_transport_demand - non_transport as u32,
            measurable:           false,
        };
        let complete = remainder.demand() == 0;
        if !complete {
            trace!(incident = %call.incident, missing = remainder.demand(), "call partially served");
            self.calls.push(incident.call_received, remainder);
        }
        Ok(Dispatch { units, complete, robbed })
    }

    /// How `ambulance` could serve a call for `target`, if at all.
    fn candidate(
        &self,
        ambulance:  &Ambulance,
        now:        SimTime,
        target:     IncidentId,
        redispatch: bool,
        queue_next: bool,
    ) -> Option<Candidate> {
        match ambulance.state() {
            AmbulanceState::Available => Some(Candidate::Available),
            AmbulanceState::Dispatched { incident, .. } if redispatch && incident != target => {
                let current = self.sim.incidents.get(incident)?;
                let movable = current.urgency != UrgencyLevel::Acute
                    && current.demand() <= 1
                    && ambulance.location() != current.location;
                movable.then_some(Candidate::Redirect(incident))
            }
            AmbulanceState::Transporting { .. } if queue_next && self.next_calls[ambulance.id.index()].is_none() => {
                let free = self.free_at[ambulance.id.index()]?;
                Some(Candidate::Queue { ready_in: (free - now).max(0) })
            }
            _ => None,
        }
    }

    /// Serve waiting calls, oldest first, while any unit is free.  Runs
    /// before the event that freed the units is followed by anything else,
    /// so a waiting call is never overtaken by a later one.
    fn serve_waiting_calls<O: SimObserver>(&mut self, now: SimTime, observer: &mut O) -> SimResult<()> {
        while self.ambulances.iter().any(Ambulance::is_available) {
            let Some(call) = self.calls.pop_front() else {
                break;
            };
            self.handle_new_call(now, call, true, observer)?;
        }
        Ok(())
    }

    fn record(&mut self, incident: IncidentId, record: ResponseRecord) {
        match self.recorded.get(&incident) {
            Some(&slot) => self.records[slot] = Some(record),
            None => {
                self.recorded.insert(incident, self.records.len());
                self.records.push(Some(record));
            }
        }
    }

    // ── Ambulance bookkeeping ─────────────────────────────────────────────

    /// End the unit's job.  A unit with a booked call leaves for it;
    /// otherwise it becomes available (or goes off duty if its station owes
    /// a shift end) and drives home.
    fn release(&mut self, id: AmbulanceId, now: SimTime) -> SimResult<()> {
        let sim = self.sim;
        self.free_at[id.index()] = None;
        let travel_home = self.ambulances[id.index()].complete_job(now, sim.oracle.as_ref())?;

        if let Some(next) = self.next_calls[id.index()].take() {
            let scene = self.incident(next.incident)?.location;
            let travel = self.ambulances[id.index()].dispatch(next.incident, scene, next.hospital, now, sim.oracle.as_ref())?;
            self.schedule_location_update(id, now, travel);
            return Ok(());
        }

        let ambulance = &mut self.ambulances[id.index()];
        let station = ambulance.base_station.index();
        if self.remaining_off_duty[station] > 0 {
            ambulance.finish_shift()?;
            self.remaining_off_duty[station] -= 1;
        }
        self.schedule_location_update(id, now, travel_home);
        Ok(())
    }

    fn schedule_location_update(&mut self, id: AmbulanceId, now: SimTime, travel_secs: i64) {
        if travel_secs <= 0 {
            return;
        }
        let epoch = self.ambulances[id.index()].epoch();
        let delay = travel_secs.min(self.config.update_location_period_secs);
        self.events.push(now.plus_secs(delay), Event::LocationUpdate { ambulance: id, epoch });
    }

    // ── Shifts ────────────────────────────────────────────────────────────

    fn check_shift<O: SimObserver>(&mut self, now: SimTime, observer: &mut O) -> SimResult<()> {
        let shift = ShiftType::at(now, self.config.day_shift_start_hour, self.config.night_shift_start_hour);
        if shift == self.shift {
            return Ok(());
        }
        let previous = self.shift;
        self.shift = shift;

        let (mut finished, mut deferred, mut started) = (0u32, 0u32, 0u32);
        for s in 0..self.by_station.len() {
            let before = self.required[previous.index()][s];
            let after = self.required[shift.index()][s];

            if before > after {
                let surplus = before - after;
                let idle: Vec<AmbulanceId> = self.by_station[s]
                    .iter()
                    .copied()
                    .filter(|id| self.ambulances[id.index()].is_available())
                    .take(surplus as usize)
                    .collect();
                for &id in &idle {
                    self.ambulances[id.index()].finish_shift()?;
                }
                self.remaining_off_duty[s] = surplus - idle.len() as u32;
                finished += idle.len() as u32;
                deferred += self.remaining_off_duty[s];
            } else if after > before {
                let mut deficit = after - before;
                let cancelled = deficit.min(self.remaining_off_duty[s]);
                self.remaining_off_duty[s] -= cancelled;
                deficit -= cancelled;

                let resting: Vec<AmbulanceId> = self.by_station[s]
                    .iter()
                    .copied()
                    .filter(|id| self.ambulances[id.index()].is_off_duty())
                    .take(deficit as usize)
                    .collect();
                for &id in &resting {
                    self.ambulances[id.index()].start_shift()?;
                }
                started += resting.len() as u32;
            }
        }

        debug!(time = %now, %shift, finished, deferred, started, "shift change");
        observer.on_shift_change(now, shift);
        if started > 0 {
            self.serve_waiting_calls(now, observer)?;
        }
        Ok(())
    }

    fn incident(&self, id: IncidentId) -> SimResult<&'a Incident> {
        self.sim.incidents.get(id).ok_or(SimError::UnknownIncident(id))
    }
}

/// Whether serving an incident's call records a response time.
fn is_measurable(config: &SimConfig, incident: &Incident) -> bool {
    incident.call_received >= config.start && (config.record_regular_responses || !incident.urgency.is_regular())
}
