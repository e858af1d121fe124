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

//! # The SPEED capability aggregator
//!
//! Every non-access zone runs one [`Speed`] component. Compute zones scan their bound
//! domain and summarize, per `(gateway, VNF)` pair, the best node able to execute that
//! VNF. Aggregation zones merge the summaries reported by their children. The merged
//! view flows bottom-up through the tree once per tick; parents only ever learn
//! *which child* can reach a capability, never the deeper zone actually hosting it.
//!
//! The same component validates segmentation plans against the merged view, selects
//! the plan with the fewest segments, and prices a segment for each candidate child
//! zone.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use log::trace;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::segmentation::{Segment, SegmentationPlan};
use crate::topology::Infrastructure;
use crate::types::{Cost, Delay, PlacementError};

/// Key of an aggregation map entry: `(gateway, vnf)`.
pub type CapabilityKey = (String, String);

/// An aggregation map: at most one entry per `(gateway, vnf)` key.
pub type AggregatedMap = HashMap<CapabilityKey, AggregatedData>;

/// One capability row collected inside a compute zone's domain: a node able to
/// execute a VNF, together with its delay towards one gateway. Rebuilt from scratch
/// on every collection pass, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureData {
    /// The zone owning the capability.
    pub zone: String,
    /// The VNF type.
    pub vnf: String,
    /// The gateway the delay refers to.
    pub gw: String,
    /// Shortest-path delay from the hosting node to the gateway.
    pub delay: Delay,
    /// The hosting node.
    pub node: String,
    /// The cost of executing the VNF on the hosting node.
    pub cost: Cost,
    /// CPU currently free on the hosting node.
    pub cpu_available: u64,
    /// Memory currently free on the hosting node.
    pub mem_available: u64,
}

/// The best known capability per `(gateway, vnf)` key, as exchanged between zones.
/// The `zone` field always names the zone *reporting* the capability at the current
/// tree level, not the zone hosting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedData {
    /// The reporting zone.
    pub zone: String,
    /// The VNF type.
    pub vnf: String,
    /// The gateway the delay refers to.
    pub gw: String,
    /// Best delay towards the gateway.
    pub delay: Delay,
    /// Cost of the best entry.
    pub cost: Cost,
}

/// The per-zone SPEED component.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speed {
    name: String,
    zone: String,
    domain: Option<String>,
    infrastructure_data: Vec<InfrastructureData>,
    #[serde_as(as = "Vec<(_, _)>")]
    aggregated_infrastructure_data: AggregatedMap,
    #[serde_as(as = "HashMap<_, Vec<(_, _)>>")]
    child_zones_aggregated_data: HashMap<String, AggregatedMap>,
    #[serde_as(as = "Vec<(_, _)>")]
    aggregated_data: AggregatedMap,
}

impl Speed {
    /// Create the SPEED component of a zone. `domain` is the bound domain for compute
    /// zones and `None` otherwise.
    pub fn new(zone: impl Into<String>, domain: Option<String>) -> Self {
        let zone = zone.into();
        Self {
            name: format!("s_{zone}"),
            zone,
            domain,
            infrastructure_data: Vec::new(),
            aggregated_infrastructure_data: AggregatedMap::new(),
            child_zones_aggregated_data: HashMap::new(),
            aggregated_data: AggregatedMap::new(),
        }
    }

    /// The name of the component (`s_<zone>`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The zone the component serves.
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// The currently cached merged aggregate (local capability plus all child
    /// summaries).
    pub fn aggregated(&self) -> &AggregatedMap {
        &self.aggregated_data
    }

    /// Collect the local capability of the bound domain: one row per
    /// `(node, VNF, gateway)` triple for every node that currently has the free
    /// resources to execute the VNF. Replaces the cached row list. Read-only with
    /// respect to resource reservations.
    ///
    /// Fails with [`PlacementError::NotComputeZone`] when the zone binds no domain.
    pub fn collect_local_capability(
        &mut self,
        infra: &Infrastructure,
    ) -> Result<&[InfrastructureData], PlacementError> {
        let domain_name = self
            .domain
            .as_deref()
            .ok_or_else(|| PlacementError::NotComputeZone(self.zone.clone()))?;
        let domain = infra
            .domain(domain_name)
            .ok_or_else(|| PlacementError::DomainNotFound(domain_name.to_string()))?;

        let mut rows = Vec::new();
        for node_name in domain.nodes() {
            let node = infra
                .node(node_name)
                .ok_or_else(|| PlacementError::UnknownNode(node_name.clone()))?;
            let delay_to_gws = infra.delay_to_all_gateways(node_name)?;
            for vnf_name in node.vnfs() {
                let vnf = infra
                    .vnf(vnf_name)
                    .ok_or_else(|| PlacementError::UnknownVnfType(vnf_name.clone()))?;
                if !node.has_resources_to_execute_vnf(vnf) {
                    continue;
                }
                let cost = node.execution_cost(vnf);
                let (cpu_available, mem_available) = node.resources_available();
                for (gw, delay) in &delay_to_gws {
                    rows.push(InfrastructureData {
                        zone: self.zone.clone(),
                        vnf: vnf_name.clone(),
                        gw: gw.clone(),
                        delay: *delay,
                        node: node_name.clone(),
                        cost,
                        cpu_available,
                        mem_available,
                    });
                }
            }
        }

        self.infrastructure_data = rows;
        Ok(&self.infrastructure_data)
    }

    /// Aggregate the local capability: keep, per `(gateway, vnf)` key, the
    /// minimum-delay row. Re-collects the capability first, so the result reflects
    /// the current resource situation.
    pub fn aggregate_local(
        &mut self,
        infra: &Infrastructure,
    ) -> Result<&AggregatedMap, PlacementError> {
        self.collect_local_capability(infra)?;

        let mut aggregated = AggregatedMap::new();
        for row in &self.infrastructure_data {
            let key = (row.gw.clone(), row.vnf.clone());
            match aggregated.get(&key) {
                Some(existing) if existing.delay <= row.delay => {}
                _ => {
                    aggregated.insert(
                        key,
                        AggregatedData {
                            zone: row.zone.clone(),
                            vnf: row.vnf.clone(),
                            gw: row.gw.clone(),
                            delay: row.delay,
                            cost: row.cost,
                        },
                    );
                }
            }
        }

        self.aggregated_infrastructure_data = aggregated;
        Ok(&self.aggregated_infrastructure_data)
    }

    /// Store the summary reported by a child zone. Every entry is copied with its
    /// zone field re-tagged to `child_zone`: the parent only learns that this child
    /// can reach the capability, not which deeper zone hosts it.
    pub fn record_child_summary(&mut self, child_zone: &str, summary: &AggregatedMap) {
        let retagged = summary
            .iter()
            .map(|(key, data)| {
                (
                    key.clone(),
                    AggregatedData {
                        zone: child_zone.to_string(),
                        vnf: data.vnf.clone(),
                        gw: data.gw.clone(),
                        delay: data.delay,
                        cost: data.cost,
                    },
                )
            })
            .collect();
        self.child_zones_aggregated_data
            .insert(child_zone.to_string(), retagged);
    }

    /// Merge the local aggregate (empty for non-compute zones) with every stored
    /// child summary, keeping per key the minimum-delay entry. Caches and returns the
    /// merged result; this is the view that flows up to the parent zone.
    pub fn aggregate_and_propagate(
        &mut self,
        infra: &Infrastructure,
    ) -> Result<&AggregatedMap, PlacementError> {
        let mut aggregated = if self.domain.is_some() {
            self.aggregate_local(infra)?.clone()
        } else {
            AggregatedMap::new()
        };

        // children in name order, so equal-delay ties resolve deterministically
        for child in self.child_zones_aggregated_data.keys().sorted().cloned() {
            for (key, data) in &self.child_zones_aggregated_data[&child] {
                match aggregated.get(key) {
                    Some(existing) if existing.delay <= data.delay => {}
                    _ => {
                        aggregated.insert(key.clone(), data.clone());
                    }
                }
            }
        }

        trace!(
            "zone {}: merged aggregate holds {} entries",
            self.zone,
            aggregated.len()
        );
        self.aggregated_data = aggregated;
        Ok(&self.aggregated_data)
    }

    /// Validate segmentation plans against the current merged aggregate. Every
    /// segment is annotated with the candidate zones offering *all* of its VNFs; a
    /// plan survives only if each of its segments has at least one candidate.
    pub fn valid_segmentation_plans(
        &self,
        mut plans: Vec<SegmentationPlan>,
    ) -> Vec<SegmentationPlan> {
        let mut vnf_in_zone: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for data in self.aggregated_data.values() {
            vnf_in_zone
                .entry(data.zone.as_str())
                .or_default()
                .insert(data.vnf.as_str());
        }

        for plan in &mut plans {
            for segment in &mut plan.segments {
                for (zone, vnfs) in &vnf_in_zone {
                    let can_execute = segment.vnfs.iter().all(|v| vnfs.contains(v.as_str()));
                    if can_execute && !segment.zones.iter().any(|z| z == zone) {
                        segment.zones.push(zone.to_string());
                    }
                }
            }
        }

        plans.retain(|plan| plan.segments.iter().all(|s| !s.zones.is_empty()));
        plans
    }

    /// Select the plan to execute: the one with the fewest segments, ties broken
    /// uniformly at random. Fewer segments mean fewer cross-zone boundaries.
    ///
    /// Fails with [`PlacementError::NoSegmentationPlan`] on an empty plan set.
    pub fn select_segmentation_plan(
        plans: &[SegmentationPlan],
        rng: &mut impl Rng,
    ) -> Result<SegmentationPlan, PlacementError> {
        let min_size = plans
            .iter()
            .map(|p| p.segments.len())
            .min()
            .ok_or(PlacementError::NoSegmentationPlan)?;
        let min_plans: Vec<&SegmentationPlan> = plans
            .iter()
            .filter(|p| p.segments.len() == min_size)
            .collect();
        Ok((*min_plans
            .choose(rng)
            .expect("at least one minimal plan exists"))
        .clone())
    }

    /// The cost of executing a whole segment through one child zone: the sum, per
    /// VNF, of the cheapest matching aggregate entry. Returns `None` when the child
    /// offers no entry for some VNF, making the child non-viable for this segment.
    pub fn segment_cost(&self, segment: &Segment, child_zone: &str) -> Option<Cost> {
        let mut total = 0.0;
        for vnf in &segment.vnfs {
            let min_cost = self
                .aggregated_data
                .values()
                .filter(|d| d.vnf == *vnf && d.zone == child_zone)
                .map(|d| d.cost)
                .fold(None, |acc: Option<Cost>, c| {
                    Some(acc.map_or(c, |a| a.min(c)))
                })?;
            total += min_cost;
        }
        Some(total)
    }

    /// The VNF types reachable through this zone, according to the current merged
    /// aggregate and the local aggregate. Sorted by name.
    pub fn vnfs_available(&self) -> Vec<String> {
        self.aggregated_data
            .values()
            .chain(self.aggregated_infrastructure_data.values())
            .map(|d| d.vnf.clone())
            .sorted()
            .dedup()
            .collect()
    }
}
