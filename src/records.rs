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

//! # Structured event records
//!
//! The externally observable outcomes of the placement protocol, collected as typed
//! rows: request-level outcomes (manager selection, completion, timeout, failure),
//! segment-level outcomes (which zone a segment reached, stale reports), and one row
//! per aggregation pass. How the rows are persisted is a presentation concern left to
//! the caller; the taxonomy itself is part of the protocol contract.

use serde::{Deserialize, Serialize};

use crate::types::SimTime;

/// Request-level event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceEvent {
    /// A zone was selected to manage the request.
    ZoneManagerSelected,
    /// No zone up to the root could manage the request; the request is dropped.
    Fail,
    /// Every VNF of the request was assigned to a compute zone in time.
    VnfsAssignedToComputeZone,
    /// The placement timeout expired before full assignment.
    Timeout,
    /// A zone visited during placement found no valid segmentation plan.
    NoSegmentationPlans,
    /// The selected compute zone no longer had the resources for a segment.
    ComputeZoneNoResource,
}

/// One request-level record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// The event.
    pub event: ServiceEvent,
    /// Simulation time of the event.
    pub time: SimTime,
    /// The request concerned.
    pub sfc_request: String,
    /// The zone manager, or the zone reporting the event.
    pub zone_manager: String,
}

/// Segment-level event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentEvent {
    /// A segment reached a compute zone that will execute its VNFs.
    ComputeZoneSelected,
    /// A segment reached an aggregation zone that will subdivide it further.
    AggregationZoneSelected,
    /// A compute-zone report arrived after the managing record's timeout expired and
    /// was discarded.
    Timeout,
}

/// One segment-level record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// The event.
    pub event: SegmentEvent,
    /// Simulation time of the event.
    pub time: SimTime,
    /// The request concerned.
    pub sfc_request: String,
    /// The zone the segment arrived at.
    pub zone: String,
    /// The VNF names of the segment.
    pub vnf_names: Vec<String>,
}

/// One row per aggregation pass of a zone: when it ran and how many `(gateway, vnf)`
/// entries the merged aggregate holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRecord {
    /// Simulation time of the pass.
    pub time: SimTime,
    /// The zone that aggregated.
    pub zone: String,
    /// Entry count of the merged aggregate.
    pub size: usize,
}

/// Collects all protocol records of a simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementRecorder {
    service: Vec<ServiceRecord>,
    segment: Vec<SegmentRecord>,
    aggregation: Vec<AggregationRecord>,
}

impl PlacementRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request-level event.
    pub fn service_event(
        &mut self,
        event: ServiceEvent,
        time: SimTime,
        sfc_request: impl Into<String>,
        zone_manager: impl Into<String>,
    ) {
        self.service.push(ServiceRecord {
            event,
            time,
            sfc_request: sfc_request.into(),
            zone_manager: zone_manager.into(),
        });
    }

    /// Record a segment-level event.
    pub fn segment_event(
        &mut self,
        event: SegmentEvent,
        time: SimTime,
        sfc_request: impl Into<String>,
        zone: impl Into<String>,
        vnf_names: &[String],
    ) {
        self.segment.push(SegmentRecord {
            event,
            time,
            sfc_request: sfc_request.into(),
            zone: zone.into(),
            vnf_names: vnf_names.to_vec(),
        });
    }

    /// Record an aggregation pass.
    pub fn aggregation_event(&mut self, time: SimTime, zone: impl Into<String>, size: usize) {
        self.aggregation.push(AggregationRecord {
            time,
            zone: zone.into(),
            size,
        });
    }

    /// All request-level records, in chronological order.
    pub fn service_records(&self) -> &[ServiceRecord] {
        &self.service
    }

    /// All segment-level records, in chronological order.
    pub fn segment_records(&self) -> &[SegmentRecord] {
        &self.segment
    }

    /// All aggregation records, in chronological order.
    pub fn aggregation_records(&self) -> &[AggregationRecord] {
        &self.aggregation
    }

    /// The request-level events recorded for one request, in order.
    pub fn service_events_of(&self, sfc_request: &str) -> Vec<ServiceEvent> {
        self.service
            .iter()
            .filter(|r| r.sfc_request == sfc_request)
            .map(|r| r.event)
            .collect()
    }

    /// The segment-level records of one request, in order.
    pub fn segment_records_of(&self, sfc_request: &str) -> Vec<&SegmentRecord> {
        self.segment
            .iter()
            .filter(|r| r.sfc_request == sfc_request)
            .collect()
    }
}
