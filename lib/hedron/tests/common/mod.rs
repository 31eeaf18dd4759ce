#![allow(dead_code)]

use hedron::{
    primitive::{
        attribute::{Attribute, AttributeType, AttributeUsage},
        Mode, Primitive,
    },
    DataSet, Mesh, Node, Scene,
};
use nalgebra::{Matrix4, Vector3};

/// A single triangle spanning `[x, x + 1]` on the X axis.
pub fn triangle(x: f32) -> Primitive {
    let positions = vec![x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0];
    Primitive::new(Mode::Triangles)
        .with_attr(
            AttributeUsage::Position,
            Attribute::new(AttributeType::Vec3, positions).unwrap(),
        )
        .with_indices(vec![0, 1, 2])
}

/// A scene with one root that has a translated child, both instancing their own mesh.
pub fn parent_child() -> DataSet {
    let mut data = DataSet::empty();
    let scene = data.add_scene(Scene::default());
    data.default_scene = Some(scene);
    let a = data.add_mesh(Mesh::new("a").with_primitive(triangle(0.0)));
    let b = data.add_mesh(Mesh::new("b").with_primitive(triangle(2.0)));
    let root = data.add_node(
        Node::named("root")
            .with_mesh(a)
            .with_transform(Matrix4::new_translation(&Vector3::new(0.0, 1.0, 0.0))),
    );
    let child = data.add_node(
        Node::named("child")
            .with_mesh(b)
            .with_transform(Matrix4::new_translation(&Vector3::new(3.0, 0.0, 0.0))),
    );
    data.add_root(scene, root).unwrap();
    data.add_child(root, child).unwrap();
    data
}
