//! Exact all-pairs neighbor search over named spaces.
//!
//! [`ProximitySpace`] keeps every registration's last published position
//! and rebuilds all neighbor lists on [`refresh`](SpatialIndex::refresh).
//! Between refreshes the lists are frozen, which is what the act-phase
//! needs: every behavior in one tick sees the same neighborhood.
//!
//! Cost is quadratic in the number of registrations per space.

use indexmap::IndexMap;
use murmur_core::{
    GroupHandle, NeighborQuery, NeighborRelation, NeighborSource, ParamRef, SpaceError,
    SpatialIndex,
};
use smallvec::SmallVec;

#[derive(Clone, Debug)]
struct Entry {
    space: usize,
    param: ParamRef,
    position: SmallVec<[f32; 4]>,
    query: NeighborQuery,
    neighbors: Vec<NeighborRelation>,
}

/// Reference [`SpatialIndex`] computing exact neighbor lists.
///
/// Neighbor lists are sorted by ascending distance; ties keep registration
/// order. Registrations owned by the same entity never see each other.
#[derive(Debug, Default)]
pub struct ProximitySpace {
    /// Space name to position dimension, fixed by the first registration.
    spaces: IndexMap<String, usize>,
    entries: IndexMap<GroupHandle, Entry>,
    next_group: u32,
}

impl ProximitySpace {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live registrations across all spaces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no registrations.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of every space that has ever had a registration.
    pub fn space_names(&self) -> impl Iterator<Item = &str> {
        self.spaces.keys().map(String::as_str)
    }

    /// Last published position of a registration.
    pub fn position(&self, group: GroupHandle) -> Option<&[f32]> {
        self.entries.get(&group).map(|e| e.position.as_slice())
    }

    fn candidates(&self, group: GroupHandle, entry: &Entry) -> Vec<NeighborRelation> {
        let radius = entry.query.radius;
        self.entries
            .iter()
            .filter(|(g, other)| {
                **g != group
                    && other.space == entry.space
                    && other.query.visible
                    && other.param.owner != entry.param.owner
            })
            .filter_map(|(_, other)| {
                let mut direction: SmallVec<[f32; 4]> = other
                    .position
                    .iter()
                    .zip(&entry.position)
                    .map(|(o, s)| o - s)
                    .collect();
                let distance = murmur_core::math::length(&direction);
                if radius > 0.0 && distance > radius {
                    return None;
                }
                if !murmur_core::math::normalize(&mut direction) {
                    direction.iter_mut().for_each(|d| *d = 0.0);
                }
                Some(NeighborRelation {
                    neighbor: other.param,
                    distance,
                    direction,
                })
            })
            .collect()
    }
}

fn by_distance(a: &NeighborRelation, b: &NeighborRelation) -> std::cmp::Ordering {
    a.distance.total_cmp(&b.distance)
}

impl NeighborSource for ProximitySpace {
    fn neighbors(&self, group: GroupHandle) -> &[NeighborRelation] {
        self.entries
            .get(&group)
            .map(|e| e.neighbors.as_slice())
            .unwrap_or(&[])
    }
}

impl SpatialIndex for ProximitySpace {
    fn register(
        &mut self,
        param: ParamRef,
        space: &str,
        position: &[f32],
        query: &NeighborQuery,
    ) -> Result<GroupHandle, SpaceError> {
        if space.is_empty() {
            return Err(SpaceError::EmptyName);
        }
        if let Some(&dim) = self.spaces.get(space) {
            if dim != position.len() {
                return Err(SpaceError::Dimension {
                    space: space.to_string(),
                    expected: dim,
                    actual: position.len(),
                });
            }
        }
        let (space_index, _) = self.spaces.insert_full(space.to_string(), position.len());
        if self
            .entries
            .values()
            .any(|e| e.space == space_index && e.param == param)
        {
            return Err(SpaceError::AlreadyRegistered {
                space: space.to_string(),
                param,
            });
        }

        let group = GroupHandle(self.next_group);
        self.next_group += 1;
        self.entries.insert(
            group,
            Entry {
                space: space_index,
                param,
                position: SmallVec::from_slice(position),
                query: query.clone(),
                neighbors: Vec::new(),
            },
        );
        tracing::debug!(%param, space, %group, "registered in space");
        Ok(group)
    }

    fn publish(&mut self, group: GroupHandle, position: &[f32]) -> Result<(), SpaceError> {
        let entry = self
            .entries
            .get_mut(&group)
            .ok_or(SpaceError::UnknownGroup(group))?;
        entry.position.clear();
        entry.position.extend_from_slice(position);
        Ok(())
    }

    fn deregister(&mut self, group: GroupHandle) -> Result<(), SpaceError> {
        let entry = self
            .entries
            .shift_remove(&group)
            .ok_or(SpaceError::UnknownGroup(group))?;
        // Drop stale relations immediately so nothing dereferences the
        // retracted parameter before the next refresh.
        for other in self.entries.values_mut() {
            other.neighbors.retain(|r| r.neighbor != entry.param);
        }
        tracing::debug!(param = %entry.param, %group, "deregistered");
        Ok(())
    }

    fn refresh(&mut self) {
        let lists: Vec<Vec<NeighborRelation>> = self
            .entries
            .iter()
            .map(|(&group, entry)| {
                let mut found = self.candidates(group, entry);
                let max = entry.query.max_neighbors;
                if max > 0 && found.len() > max {
                    if entry.query.replace_when_full {
                        found.sort_by(by_distance);
                    }
                    found.truncate(max);
                }
                found.sort_by(by_distance);
                found
            })
            .collect();
        for (entry, list) in self.entries.values_mut().zip(lists) {
            entry.neighbors = list;
        }
    }
}
