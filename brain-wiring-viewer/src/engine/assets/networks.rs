use crate::engine::assets::pack_manifest::parse_color;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Functional network node in RAS millimetre space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub label: String,
    pub position: [f32; 3],
}

/// Built-in functional network: nodes plus undirected edges by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefinition {
    pub id: String,
    pub name: String,
    pub color: String,
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

impl NetworkDefinition {
    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn display_color(&self) -> Color {
        parse_color(&self.color).unwrap_or(Color::srgb(0.9, 0.9, 0.9))
    }
}

/// Catalogue shipped with the viewer, loaded as a JSON asset.
#[derive(Asset, TypePath, Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkCatalog {
    pub networks: Vec<NetworkDefinition>,
}

impl NetworkCatalog {
    pub fn get(&self, id: &str) -> Option<&NetworkDefinition> {
        self.networks.iter().find(|n| n.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.networks.iter().map(|n| n.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_file_parses_and_edges_resolve() {
        let text = include_str!("../../../assets/networks/functional.networks.json");
        let catalog: NetworkCatalog = serde_json::from_str(text).unwrap();
        assert!(catalog.get("dmn").is_some());
        for network in &catalog.networks {
            for (from, to) in &network.edges {
                assert!(network.node(from).is_some(), "{}: {from}", network.id);
                assert!(network.node(to).is_some(), "{}: {to}", network.id);
            }
        }
    }
}
