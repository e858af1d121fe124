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

//! Module containing all shared type definitions

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Propagation or network delay, expressed in simulation time units.
pub type Delay = f64;

/// Execution cost of a VNF on a node.
pub type Cost = f64;

/// Simulation time of a scheduled event. `NotNan` so that events can be ordered.
pub type SimTime = NotNan<f64>;

/// A discrete simulation tick.
pub type Tick = u64;

/// A request to place a Service Function Chain: an ordered sequence of VNFs that a
/// traffic flow between two domains must traverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SfcRequest {
    /// Unique name of the request.
    pub name: String,
    /// The ordered VNF chain.
    pub vnfs: Vec<String>,
    /// The domain where the traffic enters.
    pub src_domain: String,
    /// The domain where the traffic leaves.
    pub dst_domain: String,
    /// Request-specific placement timeout, overriding the simulation default.
    pub placement_timeout: Option<u64>,
}

impl SfcRequest {
    /// Create a new SFC request without a request-specific placement timeout.
    pub fn new(
        name: impl Into<String>,
        vnfs: impl IntoIterator<Item = impl Into<String>>,
        src_domain: impl Into<String>,
        dst_domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vnfs: vnfs.into_iter().map(|v| v.into()).collect(),
            src_domain: src_domain.into(),
            dst_domain: dst_domain.into(),
            placement_timeout: None,
        }
    }

    /// Set a request-specific placement timeout.
    pub fn with_placement_timeout(mut self, timeout: u64) -> Self {
        self.placement_timeout = Some(timeout);
        self
    }
}

/// Configuration Error
#[derive(Error, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// The zone type string is not one of `access`, `compute` or `aggregation`.
    #[error("The zone type {0} does not exist.")]
    UnknownZoneType(String),
    /// A zone references a parent that is not part of the zone set.
    #[error("The parent zone {parent} of zone {zone} does not exist.")]
    UnknownParentZone {
        /// The zone carrying the dangling reference.
        zone: String,
        /// The referenced parent name.
        parent: String,
    },
    /// No zone without a parent was found.
    #[error("The zone set does not contain a root zone.")]
    NoRootZone,
    /// More than one zone without a parent was found.
    #[error("The zone set contains multiple root zones: {0} and {1}.")]
    MultipleRootZones(String, String),
    /// A zone is not reachable from the root by following child links.
    #[error("The zone {0} is not connected to the zone tree.")]
    UnreachableZone(String),
    /// Only compute zones may bind a domain.
    #[error("The zone {0} is not a compute zone but binds a domain.")]
    DomainOnNonComputeZone(String),
    /// Every compute zone must bind a domain.
    #[error("The compute zone {0} does not bind a domain.")]
    ComputeZoneWithoutDomain(String),
    /// A compute zone binds a domain that does not exist in the infrastructure.
    #[error("The domain {domain} bound by zone {zone} does not exist.")]
    UnknownDomain {
        /// The zone binding the missing domain.
        zone: String,
        /// The missing domain name.
        domain: String,
    },
    /// Every domain must own at least one gateway node.
    #[error("The domain {0} does not have any gateway node.")]
    DomainWithoutGateway(String),
    /// A zone subtree does not contain a single node to represent the manager.
    #[error("The zone {0} does not contain any node.")]
    ZoneWithoutNodes(String),
    /// A node defines no execution cost and no simulation-wide default is configured.
    #[error("The node {0} has no {1} cost and no default cost is configured.")]
    MissingDefaultCost(String, String),
    /// A link endpoint does not exist in the topology.
    #[error("The link endpoint {0} does not exist.")]
    UnknownLinkEndpoint(String),
    /// A domain member node does not exist in the topology.
    #[error("The node {node} of domain {domain} does not exist.")]
    UnknownDomainNode {
        /// The domain listing the missing node.
        domain: String,
        /// The missing node name.
        node: String,
    },
}

/// Error raised by the distributed placement protocol.
#[derive(Error, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementError {
    /// Local capability can only be collected on a zone bound to a domain.
    #[error("The zone {0} must be a compute zone.")]
    NotComputeZone(String),
    /// The placement process reached an access zone, which never hosts segments.
    #[error("The access zone {0} cannot take part in the placement process.")]
    UnexpectedAccessZone(String),
    /// No zone up to the root has a feasible segmentation plan for the request.
    #[error("The infrastructure can not execute the requested service {0}.")]
    NoZoneManager(String),
    /// An empty plan set was passed to plan selection.
    #[error("There is no segmentation plan to select from.")]
    NoSegmentationPlan,
    /// No candidate child zone can execute a segment of the selected plan.
    #[error("The segment {0} has no candidate zone.")]
    NoCandidateZone(String),
    /// A VNF was assigned to a zone twice.
    #[error("The VNF {vnf} is already placed in the zone {zone}.")]
    VnfAlreadyAssigned {
        /// The doubly-assigned VNF.
        vnf: String,
        /// The zone of the second assignment.
        zone: String,
    },
    /// A VNF name does not belong to the request being placed.
    #[error("The VNF {vnf} is not part of the request {sfc_request}.")]
    UnknownVnf {
        /// The unknown VNF name.
        vnf: String,
        /// The request being placed.
        sfc_request: String,
    },
    /// A request name was looked up on a zone that does not manage it.
    #[error("The distributed service {sfc_request} does not exist in the zone {zone}.")]
    UnknownRequest {
        /// The unknown request name.
        sfc_request: String,
        /// The zone where the lookup happened.
        zone: String,
    },
    /// A request was registered twice on the same manager.
    #[error("The SFC request {0} was already added.")]
    RequestAlreadyManaged(String),
    /// A zone name was not found in the zone tree.
    #[error("The zone {0} does not exist.")]
    UnknownZone(String),
    /// A node name was not found in the topology.
    #[error("The node {0} does not exist.")]
    UnknownNode(String),
    /// A domain name was not found in the infrastructure.
    #[error("The domain {0} does not exist.")]
    DomainNotFound(String),
    /// A VNF type was referenced that is not part of the catalog.
    #[error("The VNF type {0} does not exist.")]
    UnknownVnfType(String),
    /// Two nodes are not connected by any path.
    #[error("There is no path between {0} and {1}.")]
    NodesNotConnected(String, String),
}

/// Top-level simulation error.
#[derive(Error, Debug)]
pub enum SimError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Placement protocol error
    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),
    /// Json error
    #[error("{0}")]
    JsonError(Box<serde_json::Error>),
}

impl From<serde_json::Error> for SimError {
    fn from(value: serde_json::Error) -> Self {
        Self::JsonError(Box::new(value))
    }
}

impl PartialEq for SimError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Config(l0), Self::Config(r0)) => l0 == r0,
            (Self::Placement(l0), Self::Placement(r0)) => l0 == r0,
            (Self::JsonError(l), Self::JsonError(r)) => l.to_string() == r.to_string(),
            _ => false,
        }
    }
}
