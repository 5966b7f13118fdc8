use std::collections::BTreeSet;
use std::fmt::Display;
use serde::Serialize;

use crate::error::GridError;
use crate::models::element::{BranchSide, ConstraintType, ElementStatus, ElementType};
use crate::observation::network_observation::NetworkSnapshotObservation;

/// Sorted set of categories, each encoded as a one-hot row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEncoding<T: Ord> {
    name: &'static str,
    categories: Vec<T>,
}

impl<T: Ord + Clone + Display> CategoryEncoding<T> {
    pub fn new(name: &'static str, values: impl IntoIterator<Item = T>) -> Self {
        let categories: BTreeSet<T> = values.into_iter().collect();
        Self { name, categories: categories.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[T] {
        &self.categories
    }

    /// Fails on a category that wasn't seen when the map was built.
    pub fn encode(&self, value: &T) -> Result<Vec<f64>, GridError> {
        let position = self
            .categories
            .binary_search(value)
            .map_err(|_| GridError::UnknownCategory { mapping: self.name, value: value.to_string() })?;
        let mut row = vec![0.0; self.categories.len()];
        row[position] = 1.0;
        Ok(row)
    }

    pub fn encode_into(&self, value: &T, out: &mut Vec<f64>) -> Result<(), GridError> {
        out.extend(self.encode(value)?);
        Ok(())
    }
}

/// Category universes fitted once on the initial snapshot and kept fixed for
/// the episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneHotMap {
    pub types: CategoryEncoding<ElementType>,
    pub statuses: CategoryEncoding<ElementStatus>,
    pub buses: CategoryEncoding<String>,
    pub voltage_levels: CategoryEncoding<String>,
    pub constraint_sides: CategoryEncoding<BranchSide>,
    pub constraint_types: CategoryEncoding<ConstraintType>,
    pub affected_elements: CategoryEncoding<String>,
}

impl OneHotMap {
    pub fn from_snapshot(snapshot: &NetworkSnapshotObservation) -> Self {
        let observations = snapshot.observations();
        let constraints = || observations.iter().flat_map(|o| o.operational_constraints());

        Self {
            types: CategoryEncoding::new("types", observations.iter().map(|o| o.element_type())),
            // Every status is part of the universe so out-of-service lines stay encodable
            statuses: CategoryEncoding::new(
                "statuses",
                [ElementStatus::On, ElementStatus::Off, ElementStatus::Outage, ElementStatus::Maintenance],
            ),
            buses: CategoryEncoding::new(
                "buses",
                observations.iter().flat_map(|o| o.bus_ids()).map(str::to_string),
            ),
            voltage_levels: CategoryEncoding::new(
                "voltage_levels",
                observations.iter().flat_map(|o| o.voltage_level_ids()).map(str::to_string),
            ),
            constraint_sides: CategoryEncoding::new("constraint_sides", constraints().map(|c| c.side)),
            constraint_types: CategoryEncoding::new("constraint_types", constraints().map(|c| c.constraint_type)),
            affected_elements: CategoryEncoding::new(
                "affected_elements",
                constraints().map(|c| c.affected_element.clone()),
            ),
        }
    }
}
