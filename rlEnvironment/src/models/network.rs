use std::collections::HashSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::models::element::Element;

/// A set of elements, possibly spanning several timestamps. Each
/// (id, timestamp) pair appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkData")]
pub struct Network {
    pub id: String,
    elements: Vec<Element>,
}

// Deserialization goes through `Network::new` so files get the same checks
#[derive(Deserialize)]
struct NetworkData {
    id: String,
    elements: Vec<Element>,
}

impl TryFrom<NetworkData> for Network {
    type Error = GridError;

    fn try_from(data: NetworkData) -> Result<Self, Self::Error> {
        Network::new(data.id, data.elements)
    }
}

impl Network {
    pub fn new(id: impl Into<String>, elements: Vec<Element>) -> Result<Self, GridError> {
        let mut seen = HashSet::with_capacity(elements.len());
        for element in &elements {
            if !seen.insert((element.id.as_str(), element.timestamp)) {
                return Err(GridError::DuplicateElement {
                    id: element.id.clone(),
                    timestamp: element.timestamp,
                });
            }
        }
        Ok(Self { id: id.into(), elements })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sorted, de-duplicated timestamps present in the network.
    pub fn list_timestamps(&self) -> Vec<DateTime<Utc>> {
        let mut timestamps: Vec<DateTime<Utc>> = self.elements.iter().map(|e| e.timestamp).collect();
        timestamps.sort();
        timestamps.dedup();
        timestamps
    }

    pub fn is_single_timestamp(&self) -> bool {
        self.list_timestamps().len() == 1
    }

    /// Sub-network holding only the elements at `timestamp`.
    pub fn timestamp_network(&self, timestamp: DateTime<Utc>) -> Network {
        Network {
            id: self.id.clone(),
            elements: self
                .elements
                .iter()
                .filter(|e| e.timestamp == timestamp)
                .cloned()
                .collect(),
        }
    }

    /// First element with the given id. On a single-timestamp network ids are unique.
    pub fn get_element(&self, element_id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == element_id)
    }

    pub fn get_element_mut(&mut self, element_id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == element_id)
    }
}
