//! # See Also
//!
//! * [glTF 2.0 Spec](https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html)

mod camera;
mod copy;
mod material;
mod mesh;
mod prepare;

pub use camera::*;
pub use material::*;
pub use mesh::*;

use nalgebra::Matrix4;

pub type NodeIndex = usize;
pub type MeshIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("no node at index {0}")]
    InvalidNode(NodeIndex),
    #[error("no mesh at index {0}")]
    InvalidMesh(MeshIndex),
    #[error("no scene at index {0}")]
    InvalidScene(usize),
    #[error("{kind} index {index} referenced by {referrer} is out of range")]
    DanglingReference {
        kind: &'static str,
        index: usize,
        referrer: String,
    },
}

/// A set of scenes and associated data, which may be shared between scenes.
///
/// All cross references are plain indices into the vectors held here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    /// If extant, the index of the default scene
    pub default_scene: Option<usize>,
    pub(crate) scenes: Vec<Scene>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) cameras: Vec<Camera>,
    pub(crate) materials: Vec<Material>,
    pub(crate) textures: Vec<Texture>,
    pub(crate) samplers: Vec<Sampler>,
    pub(crate) images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub name: Option<String>,
    /// Root nodes of this scene
    pub nodes: Vec<NodeIndex>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
    /// Transformation from the parent node (or scene) to this node
    pub transform: Matrix4<f32>,
    pub mesh: Option<MeshIndex>,
    pub camera: Option<usize>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            children: Vec::new(),
            transform: Matrix4::identity(),
            mesh: None,
            camera: None,
        }
    }
}

impl Node {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_mesh(mut self, mesh: MeshIndex) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_camera(mut self, camera: usize) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl DataSet {
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    #[inline]
    pub fn mesh(&self, index: MeshIndex) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    #[inline]
    pub fn mesh_mut(&mut self, index: MeshIndex) -> Option<&mut Mesh> {
        self.meshes.get_mut(index)
    }

    #[inline]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    #[inline]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[inline]
    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    #[inline]
    pub fn samplers(&self) -> &[Sampler] {
        &self.samplers
    }

    #[inline]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn default_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.default_scene?)
    }

    pub fn add_scene(&mut self, scene: Scene) -> usize {
        self.scenes.push(scene);
        self.scenes.len() - 1
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshIndex {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_texture(&mut self, texture: Texture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn add_sampler(&mut self, sampler: Sampler) -> usize {
        self.samplers.push(sampler);
        self.samplers.len() - 1
    }

    pub fn add_image(&mut self, image: Image) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    /// Add a parentless node. It is not part of any scene until passed to [DataSet::add_root].
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Make `node` a root of `scene`.
    pub fn add_root(&mut self, scene: usize, node: NodeIndex) -> Result<(), DataError> {
        if node >= self.nodes.len() {
            return Err(DataError::InvalidNode(node));
        }
        let scene = self
            .scenes
            .get_mut(scene)
            .ok_or(DataError::InvalidScene(scene))?;
        if !scene.nodes.contains(&node) {
            scene.nodes.push(node);
        }
        Ok(())
    }

    /// Attach `child` beneath `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), DataError> {
        if parent >= self.nodes.len() {
            return Err(DataError::InvalidNode(parent));
        }
        let node = self
            .nodes
            .get_mut(child)
            .ok_or(DataError::InvalidNode(child))?;
        node.parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Copy `node` (without its children) into a new sibling node carrying `mesh`.
    ///
    /// The copy sits next to the original: under the same parent, or in every scene that lists
    /// the original as a root.
    pub fn duplicate_node(
        &mut self,
        node: NodeIndex,
        mesh: Option<MeshIndex>,
    ) -> Result<NodeIndex, DataError> {
        let src = self.node(node).ok_or(DataError::InvalidNode(node))?;
        let copy = Node {
            name: src.name.clone(),
            parent: src.parent,
            children: Vec::new(),
            transform: src.transform,
            mesh,
            camera: None,
        };
        let index = self.nodes.len();
        self.nodes.push(copy);
        match self.nodes[node].parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => {
                for scene in &mut self.scenes {
                    if scene.nodes.contains(&node) {
                        scene.nodes.push(index);
                    }
                }
            }
        }
        Ok(index)
    }

    /// The transformation from scene space to the space of `node`.
    pub fn world_transform(&self, node: NodeIndex) -> Matrix4<f32> {
        let mut res = Matrix4::identity();
        let mut cursor = Some(node);
        // bounded by the node count in case of a malformed (cyclic) hierarchy
        for _ in 0..=self.nodes.len() {
            let Some(n) = cursor.and_then(|i| self.nodes.get(i)) else {
                break;
            };
            res = n.transform * res;
            cursor = n.parent;
        }
        res
    }

    /// Every node reachable from the default scene, paired with its world transform, in
    /// depth-first order.
    pub fn instances(&self) -> Vec<(NodeIndex, Matrix4<f32>)> {
        let mut res = Vec::new();
        let Some(scene) = self.default_scene() else {
            return res;
        };
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(NodeIndex, Matrix4<f32>)> = scene
            .nodes
            .iter()
            .rev()
            .map(|&n| (n, Matrix4::identity()))
            .collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            if std::mem::replace(&mut visited[index], true) {
                continue;
            }
            let world = parent * node.transform;
            res.push((index, world));
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }
        res
    }

    /// Indices of every node referencing `mesh`, in node order.
    pub fn owners_of(&self, mesh: MeshIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.mesh == Some(mesh))
            .map(|(i, _)| i)
    }

    /// Indices of every node carrying a camera, in node order.
    pub fn camera_nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.camera.is_some())
            .map(|(i, _)| i)
    }

    /// Number of accessors a glTF encoding of this data set would hold.
    pub fn accessor_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.attributes.len() + usize::from(p.indices.is_some()))
            .sum()
    }

    /// Total number of vertices across every primitive of every mesh.
    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.vertex_count())
            .sum()
    }
}
