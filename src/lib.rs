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

#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # SpeedSim
//!
//! This is a library for simulating the decentralized placement of Service Function
//! Chains (SFCs) across a hierarchical multi-domain network.
//!
//! NFV operators must decide, for each incoming service request (an ordered chain of
//! VNFs), which administrative domain hosts each VNF, without a single global
//! controller holding complete state. SpeedSim models the SPEED protocol: a static
//! tree of *zones* whose [`speed::Speed`] components aggregate infrastructure
//! capability bottom-up, while service requests are recursively cut into segments
//! ([`segmentation`]) and pushed top-down to the cheapest capable subtree, under
//! propagation delays and a per-request placement timeout.
//!
//! ## Main concepts
//!
//! The [`sim::Simulation`] is the main structure to operate on. It owns the
//! [`zone::ZoneTree`] (the static coordination hierarchy), the
//! [`topology::Infrastructure`] (nodes, links, domains and the VNF catalog), one
//! [`service::DistributedServiceManager`] per non-access zone, and a single
//! time-ordered [`event::EventQueue`] on which placement sub-processes are scheduled.
//! The simulation advances in ticks; all protocol outcomes are collected as typed
//! rows in a [`records::PlacementRecorder`].
//!
//! ## Example usage
//!
//! The following example places a two-VNF chain over two domains that can each only
//! execute one of the VNFs, so the selected plan has to cut the chain in two:
//!
//! ```
//! use speedsim::prelude::*;
//! use std::collections::BTreeMap;
//!
//! fn main() -> Result<(), SimError> {
//!     // two domains with one gateway node each
//!     let mut infra = Infrastructure::new();
//!     infra.add_vnf("vnf_1", 2, 2);
//!     infra.add_vnf("vnf_2", 2, 2);
//!     infra.add_node("a0", 8, 8);
//!     infra.add_node("b0", 8, 8);
//!     infra.set_gateway("a0", true);
//!     infra.set_gateway("b0", true);
//!     infra.set_supported_vnfs("a0", ["vnf_1"]);
//!     infra.set_supported_vnfs("b0", ["vnf_2"]);
//!     infra.add_link("a0", "b0", 1.0)?;
//!     infra.add_domain("dom_a", ["a0"])?;
//!     infra.add_domain("dom_b", ["b0"])?;
//!
//!     // one aggregation zone coordinating the two compute zones
//!     let mut specs = BTreeMap::new();
//!     specs.insert(
//!         "z1".to_string(),
//!         ZoneSpec { zone_type: "aggregation".into(), parent_zone: None, domain: None },
//!     );
//!     specs.insert(
//!         "z2".to_string(),
//!         ZoneSpec {
//!             zone_type: "compute".into(),
//!             parent_zone: Some("z1".into()),
//!             domain: Some("dom_a".into()),
//!         },
//!     );
//!     specs.insert(
//!         "z3".to_string(),
//!         ZoneSpec {
//!             zone_type: "compute".into(),
//!             parent_zone: Some("z1".into()),
//!             domain: Some("dom_b".into()),
//!         },
//!     );
//!     let zones = ZoneTree::from_specs(&specs)?;
//!
//!     let config = SimConfig {
//!         duration: 10,
//!         node_cpu_default_cost: Some(1.0),
//!         node_mem_default_cost: Some(1.0),
//!         ..Default::default()
//!     };
//!     let mut sim = Simulation::new(zones, infra, config)?;
//!     sim.queue_request(0, SfcRequest::new("r0", ["vnf_1", "vnf_2"], "dom_a", "dom_b"))?;
//!     sim.run()?;
//!
//!     // the aggregation zone managed the request, and both VNFs found a zone
//!     let service = sim.manager("z1").unwrap().service("r0")?;
//!     assert!(service.is_assigned());
//!     assert_eq!(
//!         service.vnf_zones().get("vnf_1").unwrap().as_deref(),
//!         Some("z2")
//!     );
//!     assert_eq!(
//!         service.vnf_zones().get("vnf_2").unwrap().as_deref(),
//!         Some("z3")
//!     );
//!     Ok(())
//! }
//! ```

pub mod event;
pub mod prelude;
pub mod records;
pub mod segmentation;
pub mod service;
pub mod sim;
pub mod speed;
pub mod topology;
pub mod types;
pub mod zone;

#[cfg(test)]
mod test;
