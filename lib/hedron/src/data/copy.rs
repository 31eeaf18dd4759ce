use std::collections::HashMap;

use super::{DataError, DataSet, Node, NodeIndex, Scene};

/// Assigns dense new indices to source indices in first-seen order.
#[derive(Debug, Default)]
struct IndexRemap {
    map: HashMap<usize, usize>,
    order: Vec<usize>,
}

impl IndexRemap {
    fn insert(&mut self, old: usize) -> usize {
        *self.map.entry(old).or_insert_with(|| {
            self.order.push(old);
            self.order.len() - 1
        })
    }
}

fn fetch<'d, T>(
    items: &'d [T],
    index: usize,
    kind: &'static str,
    referrer: impl FnOnce() -> String,
) -> Result<&'d T, DataError> {
    items.get(index).ok_or_else(|| DataError::DanglingReference {
        kind,
        index,
        referrer: referrer(),
    })
}

impl DataSet {
    /// Copy a set of nodes, and everything they depend on, into a new data set.
    ///
    /// The result has one scene (its default) whose roots are the copied nodes, in the given
    /// order. Each copy carries its source node's world transform; children are not copied.
    /// Meshes, cameras, materials, textures, samplers, and images are carried over only if
    /// reachable from the copied nodes, and are shared between copies that reference the same
    /// source item.
    pub fn copy_subgraph(&self, nodes: &[NodeIndex]) -> Result<DataSet, DataError> {
        self.copy_subgraph_with(nodes, |_| true)
    }

    /// As [DataSet::copy_subgraph], but a copied node carries its mesh only if `keep_mesh`
    /// returns true for its source index. Its camera is always carried.
    pub fn copy_subgraph_with(
        &self,
        nodes: &[NodeIndex],
        mut keep_mesh: impl FnMut(NodeIndex) -> bool,
    ) -> Result<DataSet, DataError> {
        let mut out = DataSet::empty();
        let mut meshes = IndexRemap::default();
        let mut cameras = IndexRemap::default();
        let mut materials = IndexRemap::default();
        let mut textures = IndexRemap::default();
        let mut samplers = IndexRemap::default();
        let mut images = IndexRemap::default();

        let mut roots = Vec::with_capacity(nodes.len());
        for &index in nodes {
            let src = self.node(index).ok_or(DataError::InvalidNode(index))?;
            roots.push(out.nodes.len());
            out.nodes.push(Node {
                name: src.name.clone(),
                parent: None,
                children: Vec::new(),
                transform: self.world_transform(index),
                mesh: src
                    .mesh
                    .filter(|_| keep_mesh(index))
                    .map(|m| meshes.insert(m)),
                camera: src.camera.map(|c| cameras.insert(c)),
            });
        }

        for &m in &meshes.order {
            let mut mesh = fetch(&self.meshes, m, "mesh", || "a copied node".to_owned())?.clone();
            for prim in &mut mesh.primitives {
                prim.material = prim.material.map(|i| materials.insert(i));
            }
            out.meshes.push(mesh);
        }

        for &c in &cameras.order {
            out.cameras
                .push(fetch(&self.cameras, c, "camera", || "a copied node".to_owned())?.clone());
        }

        for &m in &materials.order {
            let mut material = fetch(&self.materials, m, "material", || {
                "a copied mesh".to_owned()
            })?
            .clone();
            for tex in material.texture_refs_mut() {
                tex.texture = textures.insert(tex.texture);
            }
            out.materials.push(material);
        }

        for &t in &textures.order {
            let mut texture = fetch(&self.textures, t, "texture", || "a copied material".to_owned())?
                .clone();
            texture.sampler = texture.sampler.map(|s| samplers.insert(s));
            texture.source = images.insert(texture.source);
            out.textures.push(texture);
        }

        for &s in &samplers.order {
            out.samplers.push(
                fetch(&self.samplers, s, "sampler", || "a copied texture".to_owned())?.clone(),
            );
        }

        for &i in &images.order {
            out.images
                .push(fetch(&self.images, i, "image", || "a copied texture".to_owned())?.clone());
        }

        out.scenes.push(Scene {
            name: self.default_scene().and_then(|s| s.name.clone()),
            nodes: roots,
        });
        out.default_scene = Some(0);
        Ok(out)
    }
}
