use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use serde_json::Value;
use tracing::info;

use crate::error::GridError;
use crate::models::network::Network;
use crate::utils::logging::{self, FileIOType, OperationCategory};
use crate::utils::traits::NetworkRepository;

/// In-memory repository filled from JSON network files.
#[derive(Debug, Clone, Default)]
pub struct JsonNetworkRepository {
    networks: BTreeMap<String, Network>,
}

impl JsonNetworkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let mut repository = Self::new();
        repository.load_file(path)?;
        Ok(repository)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GridError> {
        let mut repository = Self::new();
        repository.load_reader(reader)?;
        Ok(repository)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, GridError> {
        let _timing = logging::start_timing(
            "JsonNetworkRepository::load_file",
            OperationCategory::FileIO { subcategory: FileIOType::NetworkLoad },
        );
        let file = File::open(path.as_ref())?;
        let loaded = self.load_reader(BufReader::new(file))?;
        info!(path = %path.as_ref().display(), networks = loaded, "network file loaded");
        Ok(loaded)
    }

    /// Returns how many networks were read. Later networks replace earlier
    /// ones with the same id.
    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<usize, GridError> {
        // A network file holds either one network or a list of them
        let networks = match serde_json::from_reader::<_, Value>(reader)? {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value::<Network>)
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![serde_json::from_value::<Network>(single)?],
        };
        let loaded = networks.len();
        for network in networks {
            self.insert(network);
        }
        Ok(loaded)
    }

    pub fn insert(&mut self, network: Network) {
        self.networks.insert(network.id.clone(), network);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

impl NetworkRepository for JsonNetworkRepository {
    fn get(&self, network_id: &str) -> Result<Network, GridError> {
        self.networks
            .get(network_id)
            .cloned()
            .ok_or_else(|| GridError::NetworkNotFound(network_id.to_string()))
    }
}
