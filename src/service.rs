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

//! # Distributed services and their per-zone managers
//!
//! When a zone is selected to coordinate the placement of an SFC request, its manager
//! registers a [`DistributedService`] record: the mapping from each VNF of the chain
//! to the compute zone that will execute it, together with the remaining placement
//! timeout. Compute zones report their assignments back to that record; the record is
//! the single authority on whether the request completed or timed out.
//!
//! One [`DistributedServiceManager`] exists per non-access zone. Besides the record
//! registry it owns the zone's [`Speed`] aggregator and a randomly chosen
//! representative node, which is only used to compute propagation delays towards the
//! representative nodes of other zones.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::segmentation::SegmentationPlan;
use crate::speed::Speed;
use crate::topology::Infrastructure;
use crate::types::{ConfigError, PlacementError, SfcRequest};
use crate::zone::{Zone, ZoneTree, ZoneType};

/// The runtime record of one SFC request under distributed placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributedService {
    sfc_request: SfcRequest,
    manager_zone: String,
    vnf_zones: BTreeMap<String, Option<String>>,
    assigned_to_zone: bool,
    placement_timeout: u64,
}

impl DistributedService {
    /// Create the record for a request managed by `manager_zone`, with the given
    /// placement-timeout budget.
    pub fn new(sfc_request: SfcRequest, manager_zone: impl Into<String>, timeout: u64) -> Self {
        let vnf_zones = sfc_request
            .vnfs
            .iter()
            .map(|v| (v.clone(), None))
            .collect();
        Self {
            sfc_request,
            manager_zone: manager_zone.into(),
            vnf_zones,
            assigned_to_zone: false,
            placement_timeout: timeout,
        }
    }

    /// The request under placement.
    pub fn sfc_request(&self) -> &SfcRequest {
        &self.sfc_request
    }

    /// The zone managing the placement.
    pub fn manager_zone(&self) -> &str {
        &self.manager_zone
    }

    /// The VNF-to-zone assignment, `None` for still-unassigned VNFs.
    pub fn vnf_zones(&self) -> &BTreeMap<String, Option<String>> {
        &self.vnf_zones
    }

    /// Whether every VNF has been assigned to a compute zone.
    pub fn is_assigned(&self) -> bool {
        self.assigned_to_zone
    }

    /// The remaining placement timeout, in ticks.
    pub fn placement_timeout(&self) -> u64 {
        self.placement_timeout
    }

    /// Decrement the remaining timeout by one tick. Returns the new value, or `None`
    /// when the timeout had already reached zero (the countdown never goes negative).
    pub fn dec_placement_timeout(&mut self) -> Option<u64> {
        if self.placement_timeout == 0 {
            return None;
        }
        self.placement_timeout -= 1;
        Some(self.placement_timeout)
    }

    /// Record that `vnf` will execute in `zone`. Double assignment is an invariant
    /// violation, as is a VNF name that does not belong to the request.
    pub fn add_vnf_to_zone(&mut self, vnf: &str, zone: &str) -> Result<(), PlacementError> {
        let slot = self
            .vnf_zones
            .get_mut(vnf)
            .ok_or_else(|| PlacementError::UnknownVnf {
                vnf: vnf.to_string(),
                sfc_request: self.sfc_request.name.clone(),
            })?;
        if slot.is_some() {
            return Err(PlacementError::VnfAlreadyAssigned {
                vnf: vnf.to_string(),
                zone: zone.to_string(),
            });
        }
        *slot = Some(zone.to_string());
        Ok(())
    }

    /// Check (and latch) whether every VNF of the request is assigned.
    pub fn check_vnfs_assigned_to_compute_zone(&mut self) -> bool {
        if self.vnf_zones.values().all(|z| z.is_some()) {
            self.assigned_to_zone = true;
        }
        self.assigned_to_zone
    }
}

/// The per-zone service manager driving distributed placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributedServiceManager {
    zone: String,
    node: String,
    speed: Speed,
    distributed_services: HashMap<String, DistributedService>,
}

impl DistributedServiceManager {
    /// Create the manager of `zone`. Chooses the representative node at random from
    /// the zone's subtree (skipping access children), so different managers spread
    /// over the physical network.
    pub fn new(
        zone: &Zone,
        zones: &ZoneTree,
        infra: &Infrastructure,
        rng: &mut impl Rng,
    ) -> Result<Self, ConfigError> {
        let node = representative_node(zone, zones, infra, rng)?;
        debug!(
            "zone {}: service manager placed on node {}",
            zone.name(),
            node
        );
        Ok(Self {
            zone: zone.name().to_string(),
            node,
            speed: Speed::new(zone.name(), zone.domain().map(|d| d.to_string())),
            distributed_services: HashMap::new(),
        })
    }

    /// The zone this manager serves.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// The representative node of the manager.
    pub fn node(&self) -> &str {
        &self.node
    }

    /// The SPEED component of the zone.
    pub fn speed(&self) -> &Speed {
        &self.speed
    }

    /// The SPEED component of the zone, mutable.
    pub fn speed_mut(&mut self) -> &mut Speed {
        &mut self.speed
    }

    /// Register a request this zone will manage.
    pub fn add_sfc_request(
        &mut self,
        sfc_request: &SfcRequest,
        placement_timeout: u64,
    ) -> Result<(), PlacementError> {
        if self.distributed_services.contains_key(&sfc_request.name) {
            return Err(PlacementError::RequestAlreadyManaged(
                sfc_request.name.clone(),
            ));
        }
        self.distributed_services.insert(
            sfc_request.name.clone(),
            DistributedService::new(sfc_request.clone(), self.zone.clone(), placement_timeout),
        );
        Ok(())
    }

    /// A compute zone reports that it will execute `vnf_names`. Returns `Ok(false)`
    /// when the record's timeout has already expired, in which case the stale report
    /// is discarded without mutating the record. Unknown requests and double
    /// assignments are hard failures.
    pub fn add_segment_to_compute_zone(
        &mut self,
        sfc_request: &str,
        vnf_names: &[String],
        compute_zone: &str,
    ) -> Result<bool, PlacementError> {
        let zone = self.zone.clone();
        let service = self
            .distributed_services
            .get_mut(sfc_request)
            .ok_or_else(|| PlacementError::UnknownRequest {
                sfc_request: sfc_request.to_string(),
                zone,
            })?;

        if service.placement_timeout() == 0 {
            return Ok(false);
        }

        for vnf in vnf_names {
            service.add_vnf_to_zone(vnf, compute_zone)?;
        }
        Ok(true)
    }

    /// Assign every segment of the selected plan to the cheapest candidate child
    /// zone. Candidates are the zones annotated during plan validation; ties resolve
    /// to the first minimum in candidate order. Returns `(zone, vnfs)` per segment,
    /// in segment order.
    pub fn select_zones_to_vnf_segments(
        &self,
        plan: &SegmentationPlan,
    ) -> Result<Vec<(String, Vec<String>)>, PlacementError> {
        let mut assignments = Vec::with_capacity(plan.segments.len());
        for segment in &plan.segments {
            let mut best: Option<(&str, f64)> = None;
            for zone in &segment.zones {
                if let Some(cost) = self.speed.segment_cost(segment, zone) {
                    match best {
                        Some((_, best_cost)) if best_cost <= cost => {}
                        _ => best = Some((zone.as_str(), cost)),
                    }
                }
            }
            let (zone, _) =
                best.ok_or_else(|| PlacementError::NoCandidateZone(segment.name.clone()))?;
            assignments.push((zone.to_string(), segment.vnfs.clone()));
        }
        Ok(assignments)
    }

    /// Look up the record of a managed request.
    pub fn service(&self, sfc_request: &str) -> Result<&DistributedService, PlacementError> {
        self.distributed_services
            .get(sfc_request)
            .ok_or_else(|| PlacementError::UnknownRequest {
                sfc_request: sfc_request.to_string(),
                zone: self.zone.clone(),
            })
    }

    /// Look up the record of a managed request, mutable.
    pub fn service_mut(
        &mut self,
        sfc_request: &str,
    ) -> Result<&mut DistributedService, PlacementError> {
        let zone = self.zone.clone();
        self.distributed_services
            .get_mut(sfc_request)
            .ok_or_else(|| PlacementError::UnknownRequest {
                sfc_request: sfc_request.to_string(),
                zone,
            })
    }

    /// Iterate over all managed records, in arbitrary order.
    pub fn services(&self) -> impl Iterator<Item = &DistributedService> {
        self.distributed_services.values()
    }
}

/// Pick one node of the zone's subtree to host the service manager: a random node of
/// the bound domain for compute zones, the choice recursing through a random
/// non-access child for aggregation zones.
fn representative_node(
    zone: &Zone,
    zones: &ZoneTree,
    infra: &Infrastructure,
    rng: &mut impl Rng,
) -> Result<String, ConfigError> {
    if zone.zone_type() == ZoneType::Compute {
        let domain_name = zone
            .domain()
            .ok_or_else(|| ConfigError::ComputeZoneWithoutDomain(zone.name().to_string()))?;
        let domain = infra.domain(domain_name).ok_or_else(|| {
            ConfigError::UnknownDomain {
                zone: zone.name().to_string(),
                domain: domain_name.to_string(),
            }
        })?;
        return domain
            .nodes()
            .choose(rng)
            .cloned()
            .ok_or_else(|| ConfigError::ZoneWithoutNodes(zone.name().to_string()));
    }

    let candidates: Vec<&str> = zone
        .children()
        .iter()
        .filter(|child| {
            zones
                .get(child)
                .map(|z| z.zone_type() != ZoneType::Access)
                .unwrap_or(false)
        })
        .map(|c| c.as_str())
        .collect();

    let selected = candidates
        .choose(rng)
        .ok_or_else(|| ConfigError::ZoneWithoutNodes(zone.name().to_string()))?;

    // the tree is validated, so the child lookup cannot fail
    let child = zones
        .get(selected)
        .map_err(|_| ConfigError::ZoneWithoutNodes(zone.name().to_string()))?;
    representative_node(child, zones, infra, rng)
}
