/// Cluster tab records and their per-tab cache
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::models::{Hpa, Namespace, NodePool};

/// Stable tab identifier, never reused after removal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("cluster-tab-{}", sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Last-known selection and fetched lists of one tab
///
/// An empty list means "nothing cached"; there is no separate "not fetched"
/// state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabCache {
    pub selected_namespace: String,
    pub selected_hpa: Option<Hpa>,
    pub selected_node_pool: Option<NodePool>,
    pub hpas: Vec<Hpa>,
    pub namespaces: Vec<Namespace>,
    pub node_pools: Vec<NodePool>,
}

/// Partial cache update; only `Some` fields are written
///
/// `selected_hpa: Some(None)` clears the selection.
#[derive(Debug, Clone, Default)]
pub struct TabCacheUpdate {
    pub selected_namespace: Option<String>,
    pub selected_hpa: Option<Option<Hpa>>,
    pub selected_node_pool: Option<Option<NodePool>>,
    pub hpas: Option<Vec<Hpa>>,
    pub namespaces: Option<Vec<Namespace>>,
    pub node_pools: Option<Vec<NodePool>>,
}

impl TabCache {
    pub fn apply(&mut self, update: TabCacheUpdate) {
        if let Some(namespace) = update.selected_namespace {
            self.selected_namespace = namespace;
        }
        if let Some(hpa) = update.selected_hpa {
            self.selected_hpa = hpa;
        }
        if let Some(pool) = update.selected_node_pool {
            self.selected_node_pool = pool;
        }
        if let Some(hpas) = update.hpas {
            self.hpas = hpas;
        }
        if let Some(namespaces) = update.namespaces {
            self.namespaces = namespaces;
        }
        if let Some(pools) = update.node_pools {
            self.node_pools = pools;
        }
    }
}

/// One independently addressable cluster workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterTab {
    pub id: TabId,
    pub label: String,
    /// Bound cluster context; empty when no cluster was available
    pub cluster: String,
    pub cache: TabCache,
}

impl ClusterTab {
    pub fn new(sequence: u64, cluster: String) -> Self {
        Self {
            id: TabId::from_sequence(sequence),
            label: format!("Cluster {}", sequence),
            cluster,
            cache: TabCache::default(),
        }
    }
}
