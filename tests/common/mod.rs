#![allow(dead_code)]

use binfold::hedron::{
    primitive::{
        attribute::{Attribute, AttributeType, AttributeUsage},
        Mode, Primitive,
    },
    Camera, DataSet, Mesh, Node, Projection, Scene,
};

/// A non-indexed point cloud with the given positions.
pub fn points(positions: &[[f32; 3]]) -> Primitive {
    let flat: Vec<f32> = positions.iter().flatten().copied().collect();
    Primitive::new(Mode::Points).with_attr(
        AttributeUsage::Position,
        Attribute::new(AttributeType::Vec3, flat).unwrap(),
    )
}

/// A point cloud whose vertices lie along the X axis at `xs`.
pub fn points_x(xs: &[f32]) -> Primitive {
    let positions: Vec<[f32; 3]> = xs.iter().map(|&x| [x, 0.0, 0.0]).collect();
    points(&positions)
}

/// A mesh whose attributes total exactly `bytes` bytes.
pub fn mesh_of_size(name: &str, bytes: usize) -> Mesh {
    let prim = Primitive::new(Mode::Points).with_attr(
        AttributeUsage::Custom("PAYLOAD".into()),
        Attribute::new(AttributeType::Scalar, vec![0u8; bytes]).unwrap(),
    );
    Mesh::new(name).with_primitive(prim)
}

/// A data set with one root node per mesh, in order, all in the default scene.
pub fn scene_of(meshes: Vec<Mesh>) -> DataSet {
    let mut data = DataSet::empty();
    let scene = data.add_scene(Scene::default());
    data.default_scene = Some(scene);
    for mesh in meshes {
        let name = mesh.name.clone();
        let mesh = data.add_mesh(mesh);
        let node = data.add_node(Node::named(name).with_mesh(mesh));
        data.add_root(scene, node).unwrap();
    }
    data
}

/// Add a perspective camera on its own root node.
pub fn add_camera(data: &mut DataSet) -> usize {
    let camera = data.add_camera(Camera {
        name: Some("camera".into()),
        projection: Projection::Perspective {
            aspect_ratio: None,
            yfov: 1.0,
            znear: 0.1,
            zfar: None,
        },
    });
    let node = data.add_node(Node::named("camera").with_camera(camera));
    data.add_root(0, node).unwrap();
    node
}
