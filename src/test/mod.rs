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

use std::collections::BTreeMap;

use crate::prelude::*;

mod test_segmentation;
mod test_speed;
mod test_zone;

pub(crate) fn spec(zone_type: &str, parent: Option<&str>, domain: Option<&str>) -> ZoneSpec {
    ZoneSpec {
        zone_type: zone_type.to_string(),
        parent_zone: parent.map(|p| p.to_string()),
        domain: domain.map(|d| d.to_string()),
    }
}

/// The zone tree `z0 (agg) -> z1 (agg) -> {z2 (compute, dom_a), z3 (compute, dom_b)}`.
pub(crate) fn pair_tree() -> ZoneTree {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", None, None));
    specs.insert("z1".to_string(), spec("aggregation", Some("z0"), None));
    specs.insert("z2".to_string(), spec("compute", Some("z1"), Some("dom_a")));
    specs.insert("z3".to_string(), spec("compute", Some("z1"), Some("dom_b")));
    ZoneTree::from_specs(&specs).unwrap()
}

/// Two single-node domains, one gateway node each, connected by one link. `a_vnfs`
/// and `b_vnfs` configure which VNF types each domain can execute.
pub(crate) fn pair_infra(a_vnfs: &[&str], b_vnfs: &[&str], link_delay: f64) -> Infrastructure {
    let mut infra = Infrastructure::new();
    infra.add_vnf("vnf_1", 2, 2);
    infra.add_vnf("vnf_2", 2, 2);
    infra.add_vnf("vnf_3", 2, 2);
    infra.add_node("a0", 8, 8);
    infra.add_node("b0", 8, 8);
    infra.set_gateway("a0", true);
    infra.set_gateway("b0", true);
    infra.set_supported_vnfs("a0", a_vnfs.iter().copied());
    infra.set_supported_vnfs("b0", b_vnfs.iter().copied());
    infra.add_link("a0", "b0", link_delay).unwrap();
    infra.add_domain("dom_a", ["a0"]).unwrap();
    infra.add_domain("dom_b", ["b0"]).unwrap();
    infra
}

pub(crate) fn pair_config() -> SimConfig {
    SimConfig {
        duration: 50,
        seed: 1,
        node_cpu_default_cost: Some(1.0),
        node_mem_default_cost: Some(1.0),
        ..Default::default()
    }
}

/// A ready simulation over [`pair_tree`] and [`pair_infra`] with a link delay of 1.
pub(crate) fn pair_sim(a_vnfs: &[&str], b_vnfs: &[&str]) -> Simulation {
    Simulation::new(pair_tree(), pair_infra(a_vnfs, b_vnfs, 1.0), pair_config()).unwrap()
}
