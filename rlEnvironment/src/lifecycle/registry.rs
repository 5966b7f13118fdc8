use std::collections::HashMap;
use tracing::debug;

use crate::config::environment_config::LifecycleConfig;
use crate::error::GridError;
use crate::lifecycle::handler::{ElementLifecycleHandler, Granularity, LifecycleState};
use crate::models::element::ElementType;
use crate::models::network::Network;

/// Owns one lifecycle handler per covered element.
#[derive(Debug, Clone, Default)]
pub struct LifecycleRegistry {
    handlers: Vec<ElementLifecycleHandler>,
    index: HashMap<String, usize>,
    covered_types: Vec<ElementType>,
}

impl LifecycleRegistry {
    pub fn new(handlers: Vec<ElementLifecycleHandler>, covered_types: Vec<ElementType>) -> Result<Self, GridError> {
        let mut index = HashMap::with_capacity(handlers.len());
        for (position, handler) in handlers.iter().enumerate() {
            if !covered_types.contains(&handler.element_type()) {
                return Err(GridError::UncoveredElementType {
                    element_id: handler.element_id().to_string(),
                    element_type: handler.element_type(),
                });
            }
            if index.insert(handler.element_id().to_string(), position).is_some() {
                return Err(GridError::DuplicateHandler(handler.element_id().to_string()));
            }
        }
        Ok(Self { handlers, index, covered_types })
    }

    /// Registry with no managed elements.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds one handler per element whose type is covered by `config`.
    /// The network must hold a single timestamp.
    pub fn from_network(network: &Network, config: &LifecycleConfig, granularity: Granularity) -> Result<Self, GridError> {
        let mut handlers = Vec::new();
        if config.enabled {
            let covered = network.elements().iter().filter(|e| config.covers(e.element_type()));
            for (position, element) in covered.enumerate() {
                let element_config = config.element_config(&element.id, position);
                handlers.push(ElementLifecycleHandler::new(
                    element,
                    &element_config,
                    granularity,
                    config.maintenance_duration,
                )?);
            }
        }
        debug!(handlers = handlers.len(), network_id = %network.id, "lifecycle registry built");
        Self::new(handlers, config.covered_types.clone())
    }

    pub fn step(&mut self) {
        for handler in self.handlers.iter_mut() {
            handler.step();
        }
    }

    pub fn reset(&mut self) {
        for handler in self.handlers.iter_mut() {
            handler.reset();
        }
    }

    /// `None` means the element is not lifecycle-managed.
    pub fn get_handler(&self, element_id: &str) -> Option<&ElementLifecycleHandler> {
        self.index.get(element_id).map(|&i| &self.handlers[i])
    }

    pub fn get_handler_mut(&mut self, element_id: &str) -> Option<&mut ElementLifecycleHandler> {
        match self.index.get(element_id) {
            Some(&i) => self.handlers.get_mut(i),
            None => None,
        }
    }

    pub fn handlers(&self) -> &[ElementLifecycleHandler] {
        &self.handlers
    }

    pub fn covered_types(&self) -> &[ElementType] {
        &self.covered_types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// States in registry order, for comparing registries.
    pub fn snapshot(&self) -> Vec<(String, LifecycleState)> {
        self.handlers
            .iter()
            .map(|h| (h.element_id().to_string(), *h.state()))
            .collect()
    }
}
