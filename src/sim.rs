// SpeedSim: Distributed SFC Placement Simulator written in Rust
// Copyright (C) 2023-2024 SpeedSim developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Top-level simulation module
//!
//! This module drives the distributed placement protocol: it owns the zone tree, the
//! physical infrastructure, one service manager per non-access zone, the event queue
//! and the record collector. The simulation advances in ticks. Within one tick the
//! capability aggregation runs bottom-up over the whole tree before any placement
//! decision is made, arriving requests are admitted, per-request timeouts are
//! decremented, and all placement events scheduled before the next tick are drained
//! in time order.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use log::{debug, error, warn};
use ordered_float::NotNan;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::{Event, EventQueue};
use crate::records::{PlacementRecorder, SegmentEvent, ServiceEvent};
use crate::segmentation::{enumerate_segmentations, SegmentationPlan};
use crate::service::DistributedServiceManager;
use crate::speed::Speed;
use crate::topology::Infrastructure;
use crate::types::{ConfigError, Delay, PlacementError, SfcRequest, SimError, SimTime, Tick};
use crate::zone::{ZoneTree, ZoneType};

/// The default number of ticks a distributed service waits for its assignments
/// before the placement counts as failed.
pub static DEFAULT_PLACEMENT_TIMEOUT: u64 = 100;

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of ticks to simulate.
    pub duration: Tick,
    /// Placement timeout applied to requests without their own override.
    pub placement_timeout: u64,
    /// Seed of the simulation RNG (representative nodes, plan tie-breaking).
    pub seed: u64,
    /// Default per-CPU-unit cost for nodes that do not define one.
    pub node_cpu_default_cost: Option<f64>,
    /// Default per-memory-unit cost for nodes that do not define one.
    pub node_mem_default_cost: Option<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration: 1000,
            placement_timeout: DEFAULT_PLACEMENT_TIMEOUT,
            seed: 0,
            node_cpu_default_cost: None,
            node_mem_default_cost: None,
        }
    }
}

/// The result of zone-manager selection: the coordinating zone and the plans already
/// validated against its aggregate, returned together so the caller does not
/// recompute them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneManagerSelection {
    /// The selected coordinating zone.
    pub zone_manager: String,
    /// The valid segmentation plans at that zone.
    pub plans: Vec<SegmentationPlan>,
}

/// # Simulation
///
/// The simulation using the SPEED strategy to execute distributed SFC placement. See
/// the [module documentation](self) for the per-tick structure.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    zones: ZoneTree,
    infra: Infrastructure,
    managers: HashMap<String, DistributedServiceManager>,
    domain_zone: HashMap<String, String>,
    arrivals: BTreeMap<Tick, Vec<SfcRequest>>,
    request_zone_manager: BTreeMap<String, String>,
    queue: EventQueue,
    recorder: PlacementRecorder,
    rng: StdRng,
    now: Tick,
}

impl Simulation {
    /// Build a simulation over the given zone tree and infrastructure. Runs the setup
    /// validation: default costs are resolved, every domain must own a gateway, and
    /// one service manager is created per non-access zone.
    pub fn new(
        zones: ZoneTree,
        infra: Infrastructure,
        config: SimConfig,
    ) -> Result<Self, SimError> {
        let mut sim = Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            zones,
            infra,
            managers: HashMap::new(),
            domain_zone: HashMap::new(),
            arrivals: BTreeMap::new(),
            request_zone_manager: BTreeMap::new(),
            queue: EventQueue::new(),
            recorder: PlacementRecorder::new(),
            now: 0,
        };
        sim.setup()?;
        Ok(sim)
    }

    /// Configure the components to execute the distributed simulation.
    fn setup(&mut self) -> Result<(), SimError> {
        self.infra.apply_default_costs(
            self.config.node_cpu_default_cost,
            self.config.node_mem_default_cost,
        )?;

        // every domain must have at least one gateway
        let domain_names: Vec<String> = self
            .infra
            .domains()
            .map(|d| d.name().to_string())
            .sorted()
            .collect();
        for domain_name in domain_names {
            let domain = self
                .infra
                .domain(&domain_name)
                .ok_or_else(|| PlacementError::DomainNotFound(domain_name.clone()))?;
            let has_gateway = domain
                .nodes()
                .iter()
                .any(|n| self.infra.node(n).map(|n| n.is_gateway()).unwrap_or(false));
            if !has_gateway {
                return Err(ConfigError::DomainWithoutGateway(domain_name).into());
            }
        }

        // one service manager per non-access zone; iterate in name order so that the
        // RNG consumption (representative nodes) is reproducible
        let zone_names: Vec<String> = self
            .zones
            .zones()
            .map(|z| z.name().to_string())
            .sorted()
            .collect();
        for zone_name in zone_names {
            let zone = self.zones.get(&zone_name)?;
            if zone.zone_type() == ZoneType::Access {
                continue;
            }
            if let Some(domain) = zone.domain() {
                if self.infra.domain(domain).is_none() {
                    return Err(ConfigError::UnknownDomain {
                        zone: zone_name.clone(),
                        domain: domain.to_string(),
                    }
                    .into());
                }
                self.domain_zone
                    .insert(domain.to_string(), zone_name.clone());
            }
            let manager =
                DistributedServiceManager::new(zone, &self.zones, &self.infra, &mut self.rng)?;
            self.managers.insert(zone_name, manager);
        }

        Ok(())
    }

    /// Schedule a request to arrive at the given tick. Arrivals in the past are never
    /// processed.
    pub fn queue_request(&mut self, at: Tick, request: SfcRequest) -> Result<(), PlacementError> {
        let duplicate = self
            .arrivals
            .values()
            .flatten()
            .any(|r| r.name == request.name);
        if duplicate {
            return Err(PlacementError::RequestAlreadyManaged(request.name));
        }
        self.arrivals.entry(at).or_default().push(request);
        Ok(())
    }

    /// Run the simulation until the configured duration.
    pub fn run(&mut self) -> Result<(), SimError> {
        while self.now < self.config.duration {
            self.tick()?;
        }
        Ok(())
    }

    /// Execute a single simulation tick.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let tick = self.now;

        // admit the requests arriving at this tick; the aggregation sweep runs once,
        // so every zone's capability view is consistent for the whole tick
        if let Some(arrived) = self.arrivals.get(&tick).cloned() {
            self.update_aggregated_data()?;
            for request in arrived {
                let name = request.name.clone();
                if let Err(e) = self.admit_request(request) {
                    error!("request {name} dropped: {e}");
                }
            }
        }

        // per-request bookkeeping: completion check, then timeout countdown
        self.check_requests();

        // drain every placement event scheduled before the next tick
        let horizon = (tick + 1) as f64;
        while let Some(t) = self.queue.peek_time() {
            if t.into_inner() >= horizon {
                break;
            }
            if let Some((time, event)) = self.queue.pop() {
                let request = event.sfc_request().to_string();
                if let Err(e) = self.handle_event(time, event) {
                    error!("placement of request {request} aborted: {e}");
                }
            }
        }

        self.now += 1;
        Ok(())
    }

    /// Recompute the aggregated capability data of every zone, bottom-up, so that
    /// each parent folds in the summaries its children just produced.
    pub fn update_aggregated_data(&mut self) -> Result<(), SimError> {
        for zone_name in self.zones.bottom_up() {
            self.update_zone_aggregated_data(&zone_name)?;
        }
        Ok(())
    }

    /// Recompute the aggregated capability data of one zone and report the merged
    /// summary to its parent.
    pub fn update_zone_aggregated_data(&mut self, zone_name: &str) -> Result<(), SimError> {
        let zone = self.zones.get(zone_name)?;
        if zone.zone_type() == ZoneType::Access {
            return Ok(());
        }
        let parent = zone.parent().map(|p| p.to_string());

        let manager = self
            .managers
            .get_mut(zone_name)
            .ok_or_else(|| PlacementError::UnknownZone(zone_name.to_string()))?;
        let aggregated = manager.speed_mut().aggregate_and_propagate(&self.infra)?.clone();
        self.recorder
            .aggregation_event(sim_time(self.now), zone_name, aggregated.len());

        if let Some(parent) = parent {
            if let Some(parent_manager) = self.managers.get_mut(&parent) {
                parent_manager
                    .speed_mut()
                    .record_child_summary(zone_name, &aggregated);
            }
        }
        Ok(())
    }

    /// Select the zone that manages the distributed placement of a request: the
    /// lowest common ancestor of the zones owning the source and destination domains,
    /// promoted towards the root until a zone with a valid segmentation plan is
    /// found. Returns the zone together with the valid plans for reuse.
    pub fn select_zone_manager(
        &self,
        request: &SfcRequest,
    ) -> Result<ZoneManagerSelection, PlacementError> {
        let src_zone = self
            .domain_zone
            .get(&request.src_domain)
            .ok_or_else(|| PlacementError::DomainNotFound(request.src_domain.clone()))?;
        let dst_zone = self
            .domain_zone
            .get(&request.dst_domain)
            .ok_or_else(|| PlacementError::DomainNotFound(request.dst_domain.clone()))?;

        let mut candidate = self.zones.lowest_common_ancestor(src_zone, dst_zone)?;
        loop {
            let plans = self.find_valid_plans(candidate.name(), &request.vnfs)?;
            if !plans.is_empty() {
                return Ok(ZoneManagerSelection {
                    zone_manager: candidate.name().to_string(),
                    plans,
                });
            }
            match candidate.parent() {
                Some(parent) => candidate = self.zones.get(parent)?,
                None => return Err(PlacementError::NoZoneManager(request.name.clone())),
            }
        }
    }

    /// Enqueue a placement sub-process: after `delay`, the given VNF sub-chain is
    /// processed at `zone`. Re-entrant across zones; this is the same entry point the
    /// recursive dispatch uses internally.
    pub fn distributed_sfc_placement_process(
        &mut self,
        sfc_request: &str,
        zone: &str,
        vnf_names: Vec<String>,
        delay: Delay,
    ) {
        let at = sim_time(self.now) + delay;
        self.queue.push(
            at,
            Event::Placement {
                sfc_request: sfc_request.to_string(),
                zone: zone.to_string(),
                vnf_names,
                plans: None,
            },
        );
    }

    fn admit_request(&mut self, request: SfcRequest) -> Result<(), SimError> {
        let now = sim_time(self.now);
        match self.select_zone_manager(&request) {
            Ok(selection) => {
                let timeout = request
                    .placement_timeout
                    .unwrap_or(self.config.placement_timeout);
                let manager = self
                    .managers
                    .get_mut(&selection.zone_manager)
                    .ok_or_else(|| PlacementError::UnknownZone(selection.zone_manager.clone()))?;
                manager.add_sfc_request(&request, timeout)?;
                self.request_zone_manager
                    .insert(request.name.clone(), selection.zone_manager.clone());
                self.recorder.service_event(
                    ServiceEvent::ZoneManagerSelected,
                    now,
                    &request.name,
                    &selection.zone_manager,
                );
                debug!(
                    "request {}: zone manager {} selected",
                    request.name, selection.zone_manager
                );
                self.queue.push(
                    now,
                    Event::Placement {
                        sfc_request: request.name.clone(),
                        zone: selection.zone_manager,
                        vnf_names: request.vnfs.clone(),
                        plans: Some(selection.plans),
                    },
                );
                Ok(())
            }
            Err(PlacementError::NoZoneManager(_)) => {
                // expected, recoverable outcome: the request is dropped
                warn!(
                    "request {}: the infrastructure cannot execute the service",
                    request.name
                );
                self.recorder
                    .service_event(ServiceEvent::Fail, now, &request.name, "Not Found");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_valid_plans(
        &self,
        zone: &str,
        vnf_names: &[String],
    ) -> Result<Vec<SegmentationPlan>, PlacementError> {
        let manager = self
            .managers
            .get(zone)
            .ok_or_else(|| PlacementError::UnknownZone(zone.to_string()))?;
        let plans = enumerate_segmentations(vnf_names);
        Ok(manager.speed().valid_segmentation_plans(plans))
    }

    fn handle_event(&mut self, time: SimTime, event: Event) -> Result<(), SimError> {
        let Event::Placement {
            sfc_request,
            zone,
            vnf_names,
            plans,
        } = event;

        match self.zones.get(&zone)?.zone_type() {
            ZoneType::Compute => self.arrive_at_compute_zone(time, &sfc_request, &zone, &vnf_names),
            ZoneType::Aggregation => {
                self.arrive_at_aggregation_zone(time, &sfc_request, &zone, &vnf_names, plans)
            }
            ZoneType::Access => Err(PlacementError::UnexpectedAccessZone(zone).into()),
        }
    }

    /// A segment arrived at a compute zone: report the VNF list to the managing
    /// zone's record, unless the zone can no longer host the segment or the record's
    /// timeout already expired.
    fn arrive_at_compute_zone(
        &mut self,
        time: SimTime,
        sfc_request: &str,
        zone: &str,
        vnf_names: &[String],
    ) -> Result<(), SimError> {
        self.recorder.segment_event(
            SegmentEvent::ComputeZoneSelected,
            time,
            sfc_request,
            zone,
            vnf_names,
        );

        if !self.compute_zone_can_host(zone, vnf_names)? {
            warn!("request {sfc_request}: compute zone {zone} has no resources left");
            self.recorder.service_event(
                ServiceEvent::ComputeZoneNoResource,
                time,
                sfc_request,
                zone,
            );
            return Ok(());
        }

        let manager_zone = self
            .request_zone_manager
            .get(sfc_request)
            .ok_or_else(|| PlacementError::UnknownRequest {
                sfc_request: sfc_request.to_string(),
                zone: zone.to_string(),
            })?
            .clone();
        let manager = self
            .managers
            .get_mut(&manager_zone)
            .ok_or_else(|| PlacementError::UnknownZone(manager_zone.clone()))?;
        let accepted = manager.add_segment_to_compute_zone(sfc_request, vnf_names, zone)?;

        if !accepted {
            // the report arrived after the timeout: discarded, not an error
            debug!("request {sfc_request}: late report from {zone} ignored");
            self.recorder.segment_event(
                SegmentEvent::Timeout,
                time,
                sfc_request,
                zone,
                vnf_names,
            );
        }
        Ok(())
    }

    /// A segment arrived at an aggregation zone: re-plan within this zone's subtree
    /// and dispatch each sub-segment to its cheapest candidate child.
    fn arrive_at_aggregation_zone(
        &mut self,
        time: SimTime,
        sfc_request: &str,
        zone: &str,
        vnf_names: &[String],
        plans: Option<Vec<SegmentationPlan>>,
    ) -> Result<(), SimError> {
        self.recorder.segment_event(
            SegmentEvent::AggregationZoneSelected,
            time,
            sfc_request,
            zone,
            vnf_names,
        );

        let plans = match plans {
            Some(plans) => plans,
            None => self.find_valid_plans(zone, vnf_names)?,
        };
        if plans.is_empty() {
            warn!("request {sfc_request}: zone {zone} has no valid segmentation plan");
            self.recorder.service_event(
                ServiceEvent::NoSegmentationPlans,
                time,
                sfc_request,
                zone,
            );
            return Ok(());
        }

        let selected = Speed::select_segmentation_plan(&plans, &mut self.rng)?;
        let manager = self
            .managers
            .get(zone)
            .ok_or_else(|| PlacementError::UnknownZone(zone.to_string()))?;
        let assignments = manager.select_zones_to_vnf_segments(&selected)?;

        for (child_zone, vnfs) in assignments {
            let delay = self.delay_between_managers(zone, &child_zone)?;
            debug!(
                "request {sfc_request}: segment {vnfs:?} dispatched from {zone} to \
                 {child_zone} (delay {delay})"
            );
            self.queue.push(
                time + delay,
                Event::Placement {
                    sfc_request: sfc_request.to_string(),
                    zone: child_zone,
                    vnf_names: vnfs,
                    plans: None,
                },
            );
        }
        Ok(())
    }

    /// Whether the zone's domain currently offers, for every VNF of the segment, at
    /// least one configured node with sufficient free resources.
    fn compute_zone_can_host(
        &self,
        zone: &str,
        vnf_names: &[String],
    ) -> Result<bool, PlacementError> {
        let domain_name = self
            .zones
            .get(zone)?
            .domain()
            .ok_or_else(|| PlacementError::NotComputeZone(zone.to_string()))?;
        let domain = self
            .infra
            .domain(domain_name)
            .ok_or_else(|| PlacementError::DomainNotFound(domain_name.to_string()))?;

        for vnf_name in vnf_names {
            let vnf = self
                .infra
                .vnf(vnf_name)
                .ok_or_else(|| PlacementError::UnknownVnfType(vnf_name.clone()))?;
            let available = domain.nodes().iter().any(|n| {
                self.infra
                    .node(n)
                    .map(|n| {
                        n.vnfs().iter().any(|v| v == vnf_name)
                            && n.has_resources_to_execute_vnf(vnf)
                    })
                    .unwrap_or(false)
            });
            if !available {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The propagation delay between the representative nodes of two zones' service
    /// managers.
    fn delay_between_managers(&self, zone_1: &str, zone_2: &str) -> Result<Delay, PlacementError> {
        let node_1 = self
            .managers
            .get(zone_1)
            .ok_or_else(|| PlacementError::UnknownZone(zone_1.to_string()))?
            .node();
        let node_2 = self
            .managers
            .get(zone_2)
            .ok_or_else(|| PlacementError::UnknownZone(zone_2.to_string()))?
            .node();
        self.infra.shortest_path_delay(node_1, node_2)
    }

    /// Iterate over the managed requests: latch full assignment, otherwise count the
    /// placement timeout down and record its expiry.
    fn check_requests(&mut self) {
        let now = sim_time(self.now);
        let entries: Vec<(String, String)> = self
            .request_zone_manager
            .iter()
            .map(|(r, z)| (r.clone(), z.clone()))
            .collect();

        for (request, zone) in entries {
            let manager = match self.managers.get_mut(&zone) {
                Some(m) => m,
                None => continue,
            };
            let service = match manager.service_mut(&request) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if service.is_assigned() {
                continue;
            }
            if service.check_vnfs_assigned_to_compute_zone() {
                debug!("request {request}: all VNFs assigned to compute zones");
                self.recorder.service_event(
                    ServiceEvent::VnfsAssignedToComputeZone,
                    now,
                    &request,
                    &zone,
                );
            } else if service.dec_placement_timeout() == Some(0) {
                warn!("request {request}: placement timeout expired");
                self.recorder
                    .service_event(ServiceEvent::Timeout, now, &request, &zone);
            }
        }
    }

    /// The current simulation tick.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// The simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The zone tree.
    pub fn zones(&self) -> &ZoneTree {
        &self.zones
    }

    /// The physical infrastructure.
    pub fn infrastructure(&self) -> &Infrastructure {
        &self.infra
    }

    /// The physical infrastructure, mutable. Resource changes become visible to the
    /// protocol at the next aggregation sweep.
    pub fn infrastructure_mut(&mut self) -> &mut Infrastructure {
        &mut self.infra
    }

    /// The service manager of a zone, if the zone has one.
    pub fn manager(&self, zone: &str) -> Option<&DistributedServiceManager> {
        self.managers.get(zone)
    }

    /// The zone managing a request, if one was selected.
    pub fn zone_manager_of(&self, sfc_request: &str) -> Option<&str> {
        self.request_zone_manager
            .get(sfc_request)
            .map(|z| z.as_str())
    }

    /// The records collected so far.
    pub fn recorder(&self) -> &PlacementRecorder {
        &self.recorder
    }
}

fn sim_time(tick: Tick) -> SimTime {
    NotNan::new(tick as f64).unwrap()
}
