use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GridError;
use crate::observation::element_observation::{ElementObservation, LoadObservation};
use crate::observation::one_hot_map::OneHotMap;

/// Everything the agent observes at one timestamp, sorted by element id so
/// arrays built from snapshots of the same network line up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSnapshotObservation {
    timestamp: DateTime<Utc>,
    observations: Vec<ElementObservation>,
}

impl NetworkSnapshotObservation {
    pub fn new(timestamp: DateTime<Utc>, mut observations: Vec<ElementObservation>) -> Self {
        observations.sort_by(|a, b| a.id().cmp(b.id()));
        Self { timestamp, observations }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn observations(&self) -> &[ElementObservation] {
        &self.observations
    }

    pub fn get_observation(&self, element_id: &str) -> Option<&ElementObservation> {
        self.observations
            .binary_search_by(|o| o.id().cmp(element_id))
            .ok()
            .map(|i| &self.observations[i])
    }

    pub fn loads(&self) -> impl Iterator<Item = &LoadObservation> {
        self.observations.iter().filter_map(|o| match o {
            ElementObservation::Load(load) => Some(load),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn to_array(&self, map: &OneHotMap) -> Result<Vec<f64>, GridError> {
        let mut out = Vec::new();
        for observation in &self.observations {
            out.extend(observation.to_array(map)?);
        }
        Ok(out)
    }
}

/// Bounded history of snapshots, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkObservation {
    max_length: usize,
    history: VecDeque<NetworkSnapshotObservation>,
}

impl NetworkObservation {
    pub fn new(max_length: usize, initial: NetworkSnapshotObservation) -> Self {
        let max_length = max_length.max(1);
        let mut history = VecDeque::with_capacity(max_length);
        history.push_back(initial);
        Self { max_length, history }
    }

    /// Appends a snapshot, dropping the oldest once the history is full.
    pub fn push(&mut self, snapshot: NetworkSnapshotObservation) {
        if self.history.len() == self.max_length {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }

    pub fn latest(&self) -> Option<&NetworkSnapshotObservation> {
        self.history.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkSnapshotObservation> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn to_array(&self, map: &OneHotMap) -> Result<Vec<f64>, GridError> {
        let mut out = Vec::new();
        for snapshot in &self.history {
            out.extend(snapshot.to_array(map)?);
        }
        Ok(out)
    }
}
