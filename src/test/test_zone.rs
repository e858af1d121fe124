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

use pretty_assertions::assert_eq;

use super::{pair_tree, spec};
use crate::types::ConfigError;
use crate::zone::{ZoneTree, ZoneType};

#[test]
fn load_valid_tree() {
    let tree = pair_tree();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.root().name(), "z0");
    assert_eq!(tree.get("z1").unwrap().children(), &["z2", "z3"]);
    assert_eq!(tree.get("z2").unwrap().zone_type(), ZoneType::Compute);
    assert_eq!(tree.get("z2").unwrap().domain(), Some("dom_a"));
    assert_eq!(tree.get("z3").unwrap().parent(), Some("z1"));

    // every non-root zone's parent exists, and exactly one zone has no parent
    let mut roots = 0;
    for zone in tree.zones() {
        match zone.parent() {
            Some(parent) => assert!(tree.get(parent).is_ok()),
            None => roots += 1,
        }
    }
    assert_eq!(roots, 1);
}

#[test]
fn unknown_parent() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", None, None));
    specs.insert("z1".to_string(), spec("compute", Some("nope"), Some("dom_a")));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::UnknownParentZone {
            zone: "z1".to_string(),
            parent: "nope".to_string()
        })
    );
}

#[test]
fn multiple_roots() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", None, None));
    specs.insert("z1".to_string(), spec("aggregation", None, None));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::MultipleRootZones(
            "z0".to_string(),
            "z1".to_string()
        ))
    );
}

#[test]
fn no_root() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", Some("z1"), None));
    specs.insert("z1".to_string(), spec("aggregation", Some("z0"), None));
    assert_eq!(ZoneTree::from_specs(&specs), Err(ConfigError::NoRootZone));
}

#[test]
fn disconnected_cycle() {
    let mut specs = BTreeMap::new();
    specs.insert("a".to_string(), spec("aggregation", Some("b"), None));
    specs.insert("b".to_string(), spec("aggregation", Some("a"), None));
    specs.insert("r".to_string(), spec("aggregation", None, None));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::UnreachableZone("a".to_string()))
    );
}

#[test]
fn malformed_zone_type() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("computing", None, Some("dom_a")));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::UnknownZoneType("computing".to_string()))
    );
}

#[test]
fn domain_on_aggregation_zone() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", None, Some("dom_a")));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::DomainOnNonComputeZone("z0".to_string()))
    );
}

#[test]
fn compute_zone_without_domain() {
    let mut specs = BTreeMap::new();
    specs.insert("z0".to_string(), spec("aggregation", None, None));
    specs.insert("z1".to_string(), spec("compute", Some("z0"), None));
    assert_eq!(
        ZoneTree::from_specs(&specs),
        Err(ConfigError::ComputeZoneWithoutDomain("z1".to_string()))
    );
}

#[test]
fn from_json() {
    let data = r#"{
        "z0": {"zone_type": "aggregation"},
        "z1": {"zone_type": "compute", "parent_zone": "z0", "domain": "dom_a"}
    }"#;
    let tree = ZoneTree::from_json(data).unwrap();
    assert_eq!(tree.root().name(), "z0");
    assert_eq!(tree.get("z1").unwrap().domain(), Some("dom_a"));
}

#[test]
fn lowest_common_ancestor() {
    // root -> {a, b}, a -> {c}, b -> {d}
    let mut specs = BTreeMap::new();
    specs.insert("root".to_string(), spec("aggregation", None, None));
    specs.insert("a".to_string(), spec("aggregation", Some("root"), None));
    specs.insert("b".to_string(), spec("aggregation", Some("root"), None));
    specs.insert("c".to_string(), spec("compute", Some("a"), Some("dom_c")));
    specs.insert("d".to_string(), spec("compute", Some("b"), Some("dom_d")));
    let tree = ZoneTree::from_specs(&specs).unwrap();

    assert_eq!(tree.lowest_common_ancestor("c", "d").unwrap().name(), "root");
    assert_eq!(tree.lowest_common_ancestor("c", "a").unwrap().name(), "a");
    assert_eq!(tree.lowest_common_ancestor("c", "c").unwrap().name(), "c");
    assert_eq!(tree.lowest_common_ancestor("a", "b").unwrap().name(), "root");
}

#[test]
fn bottom_up_order() {
    let tree = pair_tree();
    let order = tree.bottom_up();
    assert_eq!(order, vec!["z2", "z3", "z1", "z0"]);

    // generic invariant: every zone appears after all of its children
    for zone in tree.zones() {
        let pos = order.iter().position(|n| n == zone.name()).unwrap();
        for child in zone.children() {
            let child_pos = order.iter().position(|n| n == child).unwrap();
            assert!(child_pos < pos);
        }
    }
}
