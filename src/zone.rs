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

//! # The zone hierarchy
//!
//! Zones form a static tree loaded once before the simulation starts. Compute zones
//! sit at the leaves and bind an administrative domain; aggregation zones coordinate
//! their children; access zones are traffic entry points that never take part in the
//! placement process. The tree is stored as a flat name-to-record map with parent and
//! child relationships expressed as name lookups, so zones can be referenced from
//! logs, events and managers without ownership cycles.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, PlacementError, SimError};

/// The role of a zone in the placement hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    /// Zone where users attach; never takes part in the placement process.
    Access,
    /// Zone providing computational resources through a bound domain.
    Compute,
    /// Zone aggregating the capability data of its child zones.
    Aggregation,
}

impl FromStr for ZoneType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Self::Access),
            "compute" => Ok(Self::Compute),
            "aggregation" => Ok(Self::Aggregation),
            _ => Err(ConfigError::UnknownZoneType(s.to_string())),
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Compute => write!(f, "compute"),
            Self::Aggregation => write!(f, "aggregation"),
        }
    }
}

/// The declarative description of a single zone, as it appears in the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// The zone type string (`access`, `compute` or `aggregation`).
    pub zone_type: String,
    /// The name of the parent zone; absent for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_zone: Option<String>,
    /// The bound domain; only valid on compute zones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// A zone record inside the loaded tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    name: String,
    zone_type: ZoneType,
    parent: Option<String>,
    children: Vec<String>,
    domain: Option<String>,
}

impl Zone {
    /// The name of the zone.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type of the zone.
    pub fn zone_type(&self) -> ZoneType {
        self.zone_type
    }

    /// The name of the parent zone, `None` for the root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// The names of the child zones, in declaration order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// The bound domain of a compute zone, `None` otherwise.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}

/// The static, immutable-after-load zone tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTree {
    zones: HashMap<String, Zone>,
    root: String,
}

impl ZoneTree {
    /// Build the tree from a declarative zone map. The map is ordered by zone name so
    /// that child lists (and thus all tie-breaking that follows declaration order) are
    /// deterministic. Validates the tree invariants: a single root, resolvable parent
    /// references, domains only (and always) on compute zones, and connectivity.
    pub fn from_specs(specs: &BTreeMap<String, ZoneSpec>) -> Result<Self, ConfigError> {
        let mut zones: HashMap<String, Zone> = HashMap::new();

        for (name, spec) in specs {
            let zone_type = ZoneType::from_str(&spec.zone_type)?;
            match zone_type {
                ZoneType::Compute if spec.domain.is_none() => {
                    return Err(ConfigError::ComputeZoneWithoutDomain(name.clone()))
                }
                ZoneType::Access | ZoneType::Aggregation if spec.domain.is_some() => {
                    return Err(ConfigError::DomainOnNonComputeZone(name.clone()))
                }
                _ => {}
            }
            zones.insert(
                name.clone(),
                Zone {
                    name: name.clone(),
                    zone_type,
                    parent: spec.parent_zone.clone(),
                    children: Vec::new(),
                    domain: spec.domain.clone(),
                },
            );
        }

        // resolve parent references and find the root
        let mut root: Option<String> = None;
        for (name, spec) in specs {
            match &spec.parent_zone {
                Some(parent) => {
                    let parent_zone = zones.get_mut(parent).ok_or_else(|| {
                        ConfigError::UnknownParentZone {
                            zone: name.clone(),
                            parent: parent.clone(),
                        }
                    })?;
                    parent_zone.children.push(name.clone());
                }
                None => match &root {
                    Some(r) => {
                        return Err(ConfigError::MultipleRootZones(r.clone(), name.clone()))
                    }
                    None => root = Some(name.clone()),
                },
            }
        }
        let root = root.ok_or(ConfigError::NoRootZone)?;

        let tree = Self { zones, root };
        tree.check_connected()?;
        Ok(tree)
    }

    /// Load the tree from its JSON representation: an object mapping zone names to
    /// [`ZoneSpec`]s.
    pub fn from_json(data: &str) -> Result<Self, SimError> {
        let specs: BTreeMap<String, ZoneSpec> = serde_json::from_str(data)?;
        Ok(Self::from_specs(&specs)?)
    }

    fn check_connected(&self) -> Result<(), ConfigError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![self.root.as_str()];
        while let Some(name) = stack.pop() {
            seen.insert(name);
            if let Some(zone) = self.zones.get(name) {
                stack.extend(zone.children.iter().map(|c| c.as_str()));
            }
        }
        for name in self.zones.keys().sorted() {
            if !seen.contains(name.as_str()) {
                return Err(ConfigError::UnreachableZone(name.clone()));
            }
        }
        Ok(())
    }

    /// The number of zones in the tree.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// The root zone.
    pub fn root(&self) -> &Zone {
        &self.zones[&self.root]
    }

    /// Look up a zone by name.
    pub fn get(&self, name: &str) -> Result<&Zone, PlacementError> {
        self.zones
            .get(name)
            .ok_or_else(|| PlacementError::UnknownZone(name.to_string()))
    }

    /// Iterate over all zones, in arbitrary order.
    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.values()
    }

    /// The chain of ancestors of a zone, starting with the zone itself and ending at
    /// the root.
    pub fn ancestors(&self, name: &str) -> Result<Vec<&str>, PlacementError> {
        let mut chain = Vec::new();
        let mut current = self.get(name)?;
        loop {
            chain.push(current.name());
            match current.parent() {
                Some(parent) => current = self.get(parent)?,
                None => break,
            }
        }
        Ok(chain)
    }

    /// The lowest common ancestor of two zones.
    pub fn lowest_common_ancestor(&self, a: &str, b: &str) -> Result<&Zone, PlacementError> {
        let ancestors_a: HashSet<&str> = self.ancestors(a)?.into_iter().collect();
        for candidate in self.ancestors(b)? {
            if ancestors_a.contains(candidate) {
                return self.get(candidate);
            }
        }
        // both chains end at the root, so this is unreachable on a valid tree
        self.get(&self.root)
    }

    /// Zone names in bottom-up order: every zone appears before its parent. This is
    /// the order in which the per-tick aggregation sweep runs.
    pub fn bottom_up(&self) -> Vec<String> {
        let mut order = Vec::with_capacity(self.zones.len());
        self.post_order(&self.root, &mut order);
        order
    }

    fn post_order(&self, name: &str, order: &mut Vec<String>) {
        if let Some(zone) = self.zones.get(name) {
            for child in &zone.children {
                self.post_order(child, order);
            }
            order.push(name.to_string());
        }
    }
}
