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

//! Module for defining the placement events and the event queue
//!
//! The cooperative placement sub-processes of the original protocol are modeled as
//! explicitly scheduled events on a single time-ordered queue: dispatching a segment
//! to a child zone schedules a [`Event::Placement`] at the current time plus the
//! propagation delay between the two zones' representative nodes.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::segmentation::SegmentationPlan;
use crate::types::SimTime;

/// Event to handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A placement sub-process arrives at a zone, carrying the VNF sub-chain it has
    /// to place there. The entry event at the managing zone additionally carries the
    /// plans already validated during zone-manager selection, so they are not
    /// recomputed.
    Placement {
        /// The request being placed.
        sfc_request: String,
        /// The zone where the sub-process runs.
        zone: String,
        /// The VNF names of the segment.
        vnf_names: Vec<String>,
        /// Pre-validated plans, only set on the entry event.
        plans: Option<Vec<SegmentationPlan>>,
    },
}

impl Event {
    /// The zone where the event is processed.
    pub fn zone(&self) -> &str {
        match self {
            Event::Placement { zone, .. } => zone,
        }
    }

    /// The request the event belongs to.
    pub fn sfc_request(&self) -> &str {
        match self {
            Event::Placement { sfc_request, .. } => sfc_request,
        }
    }
}

#[derive(Debug, Clone)]
struct ScheduledEvent {
    time: SimTime,
    seq: u64,
    event: Event,
}

// ordering ignores the payload: by time, then by insertion sequence (FIFO for equal
// times)
impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.cmp(&other.time).then(self.seq.cmp(&other.seq))
    }
}

/// Time-ordered event queue. Events with equal times are popped in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    seq: u64,
}

impl EventQueue {
    /// Create a new empty event queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event at the given time.
    pub fn push(&mut self, time: SimTime, event: Event) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, event }));
    }

    /// Pop the earliest event together with its scheduled time.
    pub fn pop(&mut self) -> Option<(SimTime, Event)> {
        self.heap.pop().map(|Reverse(s)| (s.time, s.event))
    }

    /// The time of the earliest enqueued event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(s)| s.time)
    }

    /// The number of enqueued events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Return `true` if no event is enqueued.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove all events from the queue.
    pub fn clear(&mut self) {
        self.heap.clear()
    }
}
