use std::collections::HashMap;

use hedron::{DataSet, NodeIndex};

use crate::{Bin, Error};

/// Which nodes instance each mesh, by mesh name.
///
/// Built once per run so that bins (which hold names) can be turned back into scene nodes.
#[derive(Debug, Clone, Default)]
pub struct MeshOwners {
    by_name: HashMap<String, Vec<NodeIndex>>,
}

impl MeshOwners {
    pub fn new(data: &DataSet) -> Self {
        let mut by_name: HashMap<String, Vec<NodeIndex>> = HashMap::new();
        for (index, node) in data.nodes().iter().enumerate() {
            if let Some(mesh) = node.mesh.and_then(|m| data.mesh(m)) {
                by_name.entry(mesh.name.clone()).or_default().push(index);
            }
        }
        Self { by_name }
    }

    /// The nodes instancing the named mesh, in node order.
    ///
    /// # Errors
    ///
    /// * [`UnresolvedMeshOwner`](Error::UnresolvedMeshOwner) if no node instances the mesh
    pub fn resolve(&self, mesh: &str) -> Result<&[NodeIndex], Error> {
        self.by_name
            .get(mesh)
            .map(Vec::as_slice)
            .filter(|owners| !owners.is_empty())
            .ok_or_else(|| Error::UnresolvedMeshOwner(mesh.to_owned()))
    }
}

/// Build one data set per bin, holding the nodes that instance the bin's meshes along with every
/// camera node of the source.
///
/// A camera node that does not instance one of the bin's meshes is copied without its mesh, so
/// each mesh lands in exactly one document.
pub fn materialize(data: &DataSet, bins: &[Bin<String>]) -> Result<Vec<DataSet>, Error> {
    let owners = MeshOwners::new(data);
    let cameras: Vec<NodeIndex> = data.camera_nodes().collect();
    bins.iter()
        .enumerate()
        .map(|(index, bin)| {
            let mut nodes = Vec::new();
            for mesh in &bin.items {
                nodes.extend_from_slice(owners.resolve(mesh)?);
            }
            let owned = nodes.len();
            for &camera in &cameras {
                if !nodes.contains(&camera) {
                    nodes.push(camera);
                }
            }
            let doc = data.copy_subgraph_with(&nodes, |n| nodes[..owned].contains(&n))?;
            tracing::debug!(
                bin = index,
                meshes = bin.items.len(),
                nodes = doc.nodes().len(),
                size = bin.size,
                "materialized bin"
            );
            Ok(doc)
        })
        .collect()
}
