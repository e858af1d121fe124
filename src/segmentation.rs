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

//! # VNF chain segmentation
//!
//! A segmentation plan is one complete way to cut an ordered VNF chain into
//! contiguous, non-overlapping segments. All the VNFs of one segment are placed in the
//! same zone. For a chain of length `n` there are `2^(n-1)` plans, one per choice of
//! cut positions between consecutive VNFs (the integer compositions of `n`).

use serde::{Deserialize, Serialize};

/// A contiguous sub-chain of VNFs placed in a single zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Generated name of the segment (`seg_<j>` within its plan).
    pub name: String,
    /// The ordered VNF names of the segment.
    pub vnfs: Vec<String>,
    /// The child zones known to be able to execute the whole segment. Empty until the
    /// plan passes validation against a zone's aggregated capability view.
    pub zones: Vec<String>,
}

/// One complete partition of a VNF chain into segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationPlan {
    /// Generated name of the plan (`plan_<i>`).
    pub name: String,
    /// The segments, in chain order.
    pub segments: Vec<Segment>,
}

impl SegmentationPlan {
    /// The VNF names of the plan, in chain order.
    pub fn vnf_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .flat_map(|s| s.vnfs.iter().map(|v| v.as_str()))
            .collect()
    }
}

/// Enumerate every segmentation plan of the given chain.
///
/// Each plan corresponds to one subset of the `n - 1` cut positions: bit `j` of the
/// plan index decides whether the chain is cut between VNF `j` and VNF `j + 1`. An
/// empty chain yields no plan.
pub fn enumerate_segmentations(vnf_names: &[String]) -> Vec<SegmentationPlan> {
    let n = vnf_names.len();
    if n == 0 {
        return Vec::new();
    }

    let mut plans = Vec::with_capacity(1 << (n - 1));
    for cuts in 0usize..(1 << (n - 1)) {
        let mut segments: Vec<Segment> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for (i, vnf) in vnf_names.iter().enumerate() {
            current.push(vnf.clone());
            let cut_here = i + 1 == n || cuts & (1 << i) != 0;
            if cut_here {
                segments.push(Segment {
                    name: format!("seg_{}", segments.len()),
                    vnfs: std::mem::take(&mut current),
                    zones: Vec::new(),
                });
            }
        }
        plans.push(SegmentationPlan {
            name: format!("plan_{}", plans.len()),
            segments,
        });
    }

    plans
}
