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

use pretty_assertions::assert_eq;

use crate::segmentation::enumerate_segmentations;

fn chain(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("vnf_{i}")).collect()
}

#[test]
fn plan_count_is_two_to_the_n_minus_one() {
    for n in 1..=6 {
        let plans = enumerate_segmentations(&chain(n));
        assert_eq!(plans.len(), 1 << (n - 1));
    }
}

#[test]
fn empty_chain_has_no_plan() {
    assert!(enumerate_segmentations(&[]).is_empty());
}

#[test]
fn single_vnf_chain() {
    let plans = enumerate_segmentations(&chain(1));
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].name, "plan_0");
    assert_eq!(plans[0].segments.len(), 1);
    assert_eq!(plans[0].segments[0].vnfs, vec!["vnf_1"]);
}

#[test]
fn plans_partition_the_chain() {
    let vnfs = chain(4);
    for plan in enumerate_segmentations(&vnfs) {
        // segments concatenate back to the original chain, in order
        assert_eq!(plan.vnf_names(), vnfs.iter().collect::<Vec<_>>());
        // no plan has an empty segment
        for segment in &plan.segments {
            assert!(!segment.vnfs.is_empty());
            // candidate zones are only filled in by plan validation
            assert!(segment.zones.is_empty());
        }
    }
}

#[test]
fn names_are_deterministic() {
    let plans = enumerate_segmentations(&chain(3));
    let names: Vec<&str> = plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["plan_0", "plan_1", "plan_2", "plan_3"]);

    // the one-segment plan comes first (no cuts), the fully-cut plan last
    assert_eq!(plans[0].segments.len(), 1);
    assert_eq!(plans[3].segments.len(), 3);
    for plan in &plans {
        for (j, segment) in plan.segments.iter().enumerate() {
            assert_eq!(segment.name, format!("seg_{j}"));
        }
    }
}
