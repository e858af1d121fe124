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

//! Convenience re-export of common members

pub use crate::records::{PlacementRecorder, SegmentEvent, ServiceEvent};
pub use crate::segmentation::{enumerate_segmentations, Segment, SegmentationPlan};
pub use crate::service::{DistributedService, DistributedServiceManager};
pub use crate::sim::{SimConfig, Simulation, ZoneManagerSelection, DEFAULT_PLACEMENT_TIMEOUT};
pub use crate::speed::{AggregatedData, AggregatedMap, InfrastructureData, Speed};
pub use crate::topology::{Domain, Infrastructure, Node, Vnf};
pub use crate::types::{
    ConfigError, Cost, Delay, PlacementError, SfcRequest, SimError, SimTime, Tick,
};
pub use crate::zone::{Zone, ZoneSpec, ZoneTree, ZoneType};
