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

use approx::assert_abs_diff_eq;
use maplit::hashmap;
use pretty_assertions::assert_eq;
use rand::prelude::*;

use crate::segmentation::enumerate_segmentations;
use crate::speed::{AggregatedData, AggregatedMap, Speed};
use crate::topology::Infrastructure;
use crate::types::PlacementError;

/// One gateway `g0`, two hosting nodes at delays 10 and 20. Both run `vnf_1`, only
/// the far one runs `vnf_2`.
fn star_infra() -> Infrastructure {
    let mut infra = Infrastructure::new();
    infra.add_vnf("vnf_1", 2, 2);
    infra.add_vnf("vnf_2", 4, 4);
    infra.add_node("g0", 4, 4);
    infra.add_node("n1", 8, 8);
    infra.add_node("n2", 8, 8);
    infra.set_gateway("g0", true);
    infra.set_supported_vnfs("n1", ["vnf_1"]);
    infra.set_supported_vnfs("n2", ["vnf_1", "vnf_2"]);
    infra.add_link("n1", "g0", 10.0).unwrap();
    infra.add_link("n2", "g0", 20.0).unwrap();
    infra.add_domain("dom", ["g0", "n1", "n2"]).unwrap();
    infra.apply_default_costs(Some(1.0), Some(1.0)).unwrap();
    infra
}

fn agg(zone: &str, vnf: &str, gw: &str, delay: f64, cost: f64) -> ((String, String), AggregatedData) {
    (
        (gw.to_string(), vnf.to_string()),
        AggregatedData {
            zone: zone.to_string(),
            vnf: vnf.to_string(),
            gw: gw.to_string(),
            delay,
            cost,
        },
    )
}

#[test]
fn collect_emits_one_row_per_node_vnf_gateway() {
    let infra = star_infra();
    let mut speed = Speed::new("z", Some("dom".to_string()));
    let rows = speed.collect_local_capability(&infra).unwrap();

    // g0 runs nothing; n1 offers vnf_1, n2 offers vnf_1 and vnf_2, one gateway
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.zone == "z" && r.gw == "g0"));
    let n1_row = rows.iter().find(|r| r.node == "n1").unwrap();
    assert_abs_diff_eq!(n1_row.delay, 10.0);
    assert_abs_diff_eq!(n1_row.cost, 4.0);
    assert_eq!(n1_row.cpu_available, 8);
}

#[test]
fn collect_skips_nodes_without_free_resources() {
    let mut infra = star_infra();
    infra.reserve("n1", 8, 8).unwrap();
    let mut speed = Speed::new("z", Some("dom".to_string()));
    let rows = speed.collect_local_capability(&infra).unwrap();
    assert!(rows.iter().all(|r| r.node == "n2"));
}

#[test]
fn local_aggregate_keeps_minimum_delay() {
    let infra = star_infra();
    let mut speed = Speed::new("z", Some("dom".to_string()));
    let aggregated = speed.aggregate_local(&infra).unwrap();

    // vnf_1 is reachable through n1 (delay 10) and n2 (delay 20): 10 must win
    let entry = &aggregated[&("g0".to_string(), "vnf_1".to_string())];
    assert_abs_diff_eq!(entry.delay, 10.0);
    let entry = &aggregated[&("g0".to_string(), "vnf_2".to_string())];
    assert_abs_diff_eq!(entry.delay, 20.0);
}

#[test]
fn aggregation_on_non_compute_zone_fails() {
    let infra = star_infra();
    let mut speed = Speed::new("agg", None);
    assert_eq!(
        speed.collect_local_capability(&infra).unwrap_err(),
        PlacementError::NotComputeZone("agg".to_string())
    );
    assert_eq!(
        speed.aggregate_local(&infra).unwrap_err(),
        PlacementError::NotComputeZone("agg".to_string())
    );
}

#[test]
fn aggregate_and_propagate_is_idempotent() {
    let infra = star_infra();
    let mut speed = Speed::new("z", Some("dom".to_string()));
    let first = speed.aggregate_and_propagate(&infra).unwrap().clone();
    let second = speed.aggregate_and_propagate(&infra).unwrap().clone();
    assert_eq!(first, second);
}

#[test]
fn child_summaries_are_retagged() {
    let mut speed = Speed::new("parent", None);
    let summary: AggregatedMap = hashmap! {
        agg("deep_zone", "vnf_1", "g0", 10.0, 4.0).0 => agg("deep_zone", "vnf_1", "g0", 10.0, 4.0).1,
    };
    speed.record_child_summary("child", &summary);
    let merged = speed.aggregate_and_propagate(&Infrastructure::new()).unwrap();

    // the deeper zone identity is masked: the parent only sees "child"
    assert!(merged.values().all(|d| d.zone == "child"));
}

#[test]
fn merge_keeps_minimum_delay_across_children() {
    let mut speed = Speed::new("parent", None);
    let (key, far) = agg("child_x", "vnf_1", "g0", 5.0, 4.0);
    let (_, near) = agg("child_y", "vnf_1", "g0", 3.0, 9.0);
    speed.record_child_summary("child_x", &hashmap! { key.clone() => far });
    speed.record_child_summary("child_y", &hashmap! { key.clone() => near });
    let merged = speed.aggregate_and_propagate(&Infrastructure::new()).unwrap();

    let entry = &merged[&key];
    assert_abs_diff_eq!(entry.delay, 3.0);
    assert_eq!(entry.zone, "child_y");
}

#[test]
fn plan_validation_annotates_candidates() {
    let mut speed = Speed::new("parent", None);
    let (k1, d1) = agg("child_y", "vnf_1", "g0", 1.0, 4.0);
    let (k2, d2) = agg("child_x", "vnf_2", "g0", 1.0, 8.0);
    speed.record_child_summary("child_y", &hashmap! { k1 => d1 });
    speed.record_child_summary("child_x", &hashmap! { k2 => d2 });
    speed.aggregate_and_propagate(&Infrastructure::new()).unwrap();

    let chain = vec!["vnf_1".to_string(), "vnf_2".to_string()];
    let valid = speed.valid_segmentation_plans(enumerate_segmentations(&chain));

    // no single child offers both VNFs, so only the two-segment plan survives
    assert_eq!(valid.len(), 1);
    assert_eq!(valid[0].segments.len(), 2);
    assert_eq!(valid[0].segments[0].zones, vec!["child_y"]);
    assert_eq!(valid[0].segments[1].zones, vec!["child_x"]);
}

#[test]
fn plan_validation_rejects_everything_without_capability() {
    let speed = Speed::new("parent", None);
    let chain = vec!["vnf_1".to_string()];
    assert!(speed
        .valid_segmentation_plans(enumerate_segmentations(&chain))
        .is_empty());
}

#[test]
fn plan_selection_prefers_fewest_segments() {
    let chain = vec![
        "vnf_1".to_string(),
        "vnf_2".to_string(),
        "vnf_3".to_string(),
    ];
    let plans = enumerate_segmentations(&chain);
    let mut rng = StdRng::seed_from_u64(42);
    let selected = Speed::select_segmentation_plan(&plans, &mut rng).unwrap();
    assert_eq!(selected.segments.len(), 1);
}

#[test]
fn plan_selection_tie_break_is_seeded() {
    let chain = vec![
        "vnf_1".to_string(),
        "vnf_2".to_string(),
        "vnf_3".to_string(),
    ];
    // keep only the two 2-segment plans, so the tie-break has to pick one
    let plans: Vec<_> = enumerate_segmentations(&chain)
        .into_iter()
        .filter(|p| p.segments.len() == 2)
        .collect();
    assert_eq!(plans.len(), 2);

    let a = Speed::select_segmentation_plan(&plans, &mut StdRng::seed_from_u64(7)).unwrap();
    let b = Speed::select_segmentation_plan(&plans, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn plan_selection_fails_on_empty_input() {
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(
        Speed::select_segmentation_plan(&[], &mut rng).unwrap_err(),
        PlacementError::NoSegmentationPlan
    );
}

#[test]
fn segment_cost_sums_cheapest_entries() {
    let mut speed = Speed::new("parent", None);
    let (k1, d1) = agg("child_x", "vnf_1", "g0", 1.0, 4.0);
    let (k2, d2) = agg("child_x", "vnf_1", "g1", 1.0, 6.0);
    let (k3, d3) = agg("child_x", "vnf_2", "g0", 1.0, 8.0);
    speed.record_child_summary("child_x", &hashmap! { k1 => d1, k2 => d2, k3 => d3 });
    speed.aggregate_and_propagate(&Infrastructure::new()).unwrap();

    let chain = vec!["vnf_1".to_string(), "vnf_2".to_string()];
    let plans = speed.valid_segmentation_plans(enumerate_segmentations(&chain));
    let one_segment = plans.iter().find(|p| p.segments.len() == 1).unwrap();

    // vnf_1 has entries at cost 4 and 6, the cheaper one counts; vnf_2 adds 8
    let cost = speed.segment_cost(&one_segment.segments[0], "child_x").unwrap();
    assert_abs_diff_eq!(cost, 12.0);

    // a zone missing one of the VNFs is not viable at all
    assert_eq!(speed.segment_cost(&one_segment.segments[0], "child_y"), None);
}

#[test]
fn vnfs_available_lists_the_merged_view() {
    let mut speed = Speed::new("parent", None);
    let (k1, d1) = agg("child_x", "vnf_2", "g0", 1.0, 8.0);
    let (k2, d2) = agg("child_y", "vnf_1", "g1", 1.0, 4.0);
    speed.record_child_summary("child_x", &hashmap! { k1 => d1 });
    speed.record_child_summary("child_y", &hashmap! { k2 => d2 });
    speed.aggregate_and_propagate(&Infrastructure::new()).unwrap();
    assert_eq!(speed.vnfs_available(), vec!["vnf_1", "vnf_2"]);
}
