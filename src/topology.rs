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

//! # Physical infrastructure model
//!
//! The placement protocol treats the physical network as an external collaborator: it
//! only asks for resource availability, execution costs, gateway nodes, and
//! shortest-path delays. This module provides the minimal model answering those
//! queries: named nodes connected by delay-weighted links (stored on a petgraph
//! [`StableGraph`]), grouped into administrative domains, together with the catalog of
//! VNF types the nodes can execute.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::algo::dijkstra;
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Cost, Delay, PlacementError};

pub(crate) type IndexType = u32;
/// Index of a node in the physical graph.
pub type PhysNodeId = NodeIndex<IndexType>;
/// The physical graph: anonymous vertices, delay-weighted undirected edges.
pub type PhysicalGraph = StableGraph<(), Delay, Undirected, IndexType>;

/// A VNF type: a computational service with a CPU and memory demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vnf {
    /// Name of the VNF type.
    pub name: String,
    /// CPU demand of one instance.
    pub cpu: u64,
    /// Memory demand of one instance.
    pub mem: u64,
}

/// A physical node that may host VNF instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    name: String,
    id: PhysNodeId,
    cpu: u64,
    mem: u64,
    cpu_used: u64,
    mem_used: u64,
    gateway: bool,
    cpu_cost: Option<Cost>,
    mem_cost: Option<Cost>,
    vnfs: Vec<String>,
}

impl Node {
    /// The name of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The graph index of the node.
    pub fn id(&self) -> PhysNodeId {
        self.id
    }

    /// Whether the node is a domain boundary (gateway) node.
    pub fn is_gateway(&self) -> bool {
        self.gateway
    }

    /// The VNF types this node is configured to execute.
    pub fn vnfs(&self) -> &[String] {
        &self.vnfs
    }

    /// Currently free CPU and memory.
    pub fn resources_available(&self) -> (u64, u64) {
        (self.cpu - self.cpu_used, self.mem - self.mem_used)
    }

    /// Whether the node currently has enough free resources to execute `vnf`.
    pub fn has_resources_to_execute_vnf(&self, vnf: &Vnf) -> bool {
        let (cpu, mem) = self.resources_available();
        cpu >= vnf.cpu && mem >= vnf.mem
    }

    /// The cost of executing one instance of `vnf` on this node. The per-unit costs
    /// must have been resolved (see [`Infrastructure::apply_default_costs`]).
    pub fn execution_cost(&self, vnf: &Vnf) -> Cost {
        let cpu_cost = self.cpu_cost.unwrap_or_default();
        let mem_cost = self.mem_cost.unwrap_or_default();
        vnf.cpu as Cost * cpu_cost + vnf.mem as Cost * mem_cost
    }
}

/// An administrative domain: a named group of nodes bound to one compute zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    name: String,
    nodes: Vec<String>,
}

impl Domain {
    /// The name of the domain.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The names of the nodes belonging to the domain.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }
}

/// # Infrastructure
///
/// Owns the physical graph, the node records, the domains, and the VNF catalog, and
/// answers the queries the placement protocol needs. Constructed imperatively:
///
/// ```
/// use speedsim::topology::Infrastructure;
///
/// # fn main() -> Result<(), speedsim::types::ConfigError> {
/// let mut infra = Infrastructure::new();
/// infra.add_vnf("vnf_fw", 2, 4);
/// infra.add_node("n0", 8, 16);
/// infra.add_node("gw0", 4, 8);
/// infra.set_gateway("gw0", true);
/// infra.set_supported_vnfs("n0", ["vnf_fw"]);
/// infra.add_link("n0", "gw0", 2.0)?;
/// infra.add_domain("dom_a", ["n0", "gw0"])?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Infrastructure {
    pub(crate) graph: PhysicalGraph,
    indices: HashMap<String, PhysNodeId>,
    nodes: HashMap<String, Node>,
    domains: HashMap<String, Domain>,
    vnfs: HashMap<String, Vnf>,
}

impl Infrastructure {
    /// Create an empty infrastructure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a VNF type with its CPU and memory demand.
    pub fn add_vnf(&mut self, name: impl Into<String>, cpu: u64, mem: u64) {
        let name = name.into();
        self.vnfs.insert(
            name.clone(),
            Vnf {
                name,
                cpu,
                mem,
            },
        );
    }

    /// Add a node with the given CPU and memory capacity. The node starts without
    /// gateway flag, without supported VNFs and without per-unit costs.
    pub fn add_node(&mut self, name: impl Into<String>, cpu: u64, mem: u64) -> PhysNodeId {
        let name = name.into();
        let id = self.graph.add_node(());
        self.indices.insert(name.clone(), id);
        self.nodes.insert(
            name.clone(),
            Node {
                name,
                id,
                cpu,
                mem,
                cpu_used: 0,
                mem_used: 0,
                gateway: false,
                cpu_cost: None,
                mem_cost: None,
                vnfs: Vec::new(),
            },
        );
        id
    }

    /// Flag (or unflag) a node as a gateway. Unknown nodes are ignored.
    pub fn set_gateway(&mut self, name: &str, gateway: bool) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.gateway = gateway;
        }
    }

    /// Set the per-unit execution costs of a node. Unknown nodes are ignored.
    pub fn set_node_costs(&mut self, name: &str, cpu_cost: Cost, mem_cost: Cost) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.cpu_cost = Some(cpu_cost);
            node.mem_cost = Some(mem_cost);
        }
    }

    /// Set the VNF types a node is configured to execute. Unknown nodes are ignored.
    pub fn set_supported_vnfs(
        &mut self,
        name: &str,
        vnfs: impl IntoIterator<Item = impl Into<String>>,
    ) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.vnfs = vnfs.into_iter().map(|v| v.into()).collect();
        }
    }

    /// Connect two nodes with an undirected link of the given delay.
    pub fn add_link(&mut self, a: &str, b: &str, delay: Delay) -> Result<(), ConfigError> {
        let a = *self
            .indices
            .get(a)
            .ok_or_else(|| ConfigError::UnknownLinkEndpoint(a.to_string()))?;
        let b = *self
            .indices
            .get(b)
            .ok_or_else(|| ConfigError::UnknownLinkEndpoint(b.to_string()))?;
        self.graph.add_edge(a, b, delay);
        Ok(())
    }

    /// Group nodes into an administrative domain.
    pub fn add_domain(
        &mut self,
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        let nodes: Vec<String> = nodes.into_iter().map(|n| n.into()).collect();
        for node in &nodes {
            if !self.nodes.contains_key(node) {
                return Err(ConfigError::UnknownDomainNode {
                    domain: name,
                    node: node.clone(),
                });
            }
        }
        self.domains.insert(
            name.clone(),
            Domain {
                name,
                nodes,
            },
        );
        Ok(())
    }

    /// Look up a node by name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Look up a domain by name.
    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.get(name)
    }

    /// Look up a VNF type by name.
    pub fn vnf(&self, name: &str) -> Option<&Vnf> {
        self.vnfs.get(name)
    }

    /// Iterate over all domains, in arbitrary order.
    pub fn domains(&self) -> impl Iterator<Item = &Domain> {
        self.domains.values()
    }

    /// All gateway nodes of the environment, sorted by name.
    pub fn gateways(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.is_gateway())
            .sorted_by_key(|n| n.name.as_str())
            .collect()
    }

    /// Reserve resources on a node, e.g. when a VNF instance is placed there.
    pub fn reserve(&mut self, name: &str, cpu: u64, mem: u64) -> Result<(), PlacementError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| PlacementError::UnknownNode(name.to_string()))?;
        node.cpu_used = (node.cpu_used + cpu).min(node.cpu);
        node.mem_used = (node.mem_used + mem).min(node.mem);
        Ok(())
    }

    /// Release previously reserved resources on a node.
    pub fn release(&mut self, name: &str, cpu: u64, mem: u64) -> Result<(), PlacementError> {
        let node = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| PlacementError::UnknownNode(name.to_string()))?;
        node.cpu_used = node.cpu_used.saturating_sub(cpu);
        node.mem_used = node.mem_used.saturating_sub(mem);
        Ok(())
    }

    /// Apply the simulation-wide default per-unit costs to every node that does not
    /// define its own. Fails when a node lacks a cost and no default is configured,
    /// mirroring the original hard failure at setup time.
    pub fn apply_default_costs(
        &mut self,
        cpu_default: Option<Cost>,
        mem_default: Option<Cost>,
    ) -> Result<(), ConfigError> {
        for node in self.nodes.values_mut() {
            if node.cpu_cost.is_none() {
                node.cpu_cost = Some(cpu_default.ok_or_else(|| {
                    ConfigError::MissingDefaultCost(node.name.clone(), "cpu".to_string())
                })?);
            }
            if node.mem_cost.is_none() {
                node.mem_cost = Some(mem_default.ok_or_else(|| {
                    ConfigError::MissingDefaultCost(node.name.clone(), "mem".to_string())
                })?);
            }
        }
        Ok(())
    }

    /// Shortest-path delay between two named nodes, weighted by per-link delay.
    pub fn shortest_path_delay(&self, from: &str, to: &str) -> Result<Delay, PlacementError> {
        let src = self.node_id(from)?;
        let dst = self.node_id(to)?;
        let distances = dijkstra(&self.graph, src, Some(dst), |e| *e.weight());
        distances
            .get(&dst)
            .copied()
            .ok_or_else(|| PlacementError::NodesNotConnected(from.to_string(), to.to_string()))
    }

    /// Shortest-path delay from one node to every gateway of the environment.
    /// Unreachable gateways are omitted.
    pub fn delay_to_all_gateways(&self, from: &str) -> Result<Vec<(String, Delay)>, PlacementError> {
        let src = self.node_id(from)?;
        let distances = dijkstra(&self.graph, src, None, |e| *e.weight());
        Ok(self
            .gateways()
            .into_iter()
            .filter_map(|gw| distances.get(&gw.id).map(|d| (gw.name.clone(), *d)))
            .collect())
    }

    fn node_id(&self, name: &str) -> Result<PhysNodeId, PlacementError> {
        self.indices
            .get(name)
            .copied()
            .ok_or_else(|| PlacementError::UnknownNode(name.to_string()))
    }
}
