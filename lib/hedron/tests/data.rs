use hedron::{DataError, DataSet, Mesh, Node, Scene};
use nalgebra::{Matrix4, Vector3};

mod common;
use common::{parent_child, triangle};

#[test]
fn world_transform_composes_parents() {
    let data = parent_child();
    let world = data.world_transform(1);
    assert_eq!(
        world,
        Matrix4::new_translation(&Vector3::new(3.0, 1.0, 0.0))
    );
}

#[test]
fn instances_are_depth_first() {
    let data = parent_child();
    let order: Vec<_> = data.instances().into_iter().map(|(n, _)| n).collect();
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn add_child_rejects_missing_nodes() {
    let mut data = parent_child();
    assert_eq!(data.add_child(0, 99), Err(DataError::InvalidNode(99)));
    assert_eq!(data.add_child(99, 0), Err(DataError::InvalidNode(99)));
}

#[test]
fn duplicate_node_becomes_sibling() {
    let mut data = parent_child();
    let copy = data.duplicate_node(1, Some(0)).unwrap();
    assert_eq!(data.nodes()[copy].parent, Some(0));
    assert_eq!(data.nodes()[0].children, vec![1, copy]);
    assert_eq!(data.nodes()[copy].mesh, Some(0));

    let root_copy = data.duplicate_node(0, None).unwrap();
    assert_eq!(data.scenes()[0].nodes, vec![0, root_copy]);
}

#[test]
fn default_scene_created_from_roots() {
    let mut data = DataSet::empty();
    let mesh = data.add_mesh(Mesh::new("m").with_primitive(triangle(0.0)));
    let a = data.add_node(Node::named("a").with_mesh(mesh));
    let b = data.add_node(Node::named("b"));
    data.add_child(a, b).unwrap();

    assert_eq!(data.ensure_default_scene(), 0);
    assert_eq!(data.scenes()[0].nodes, vec![a]);
}

#[test]
fn dangling_default_scene_is_reset() {
    let mut data = parent_child();
    data.default_scene = Some(7);
    assert_eq!(data.ensure_default_scene(), 0);
    assert_eq!(data.default_scene, Some(0));
}

#[test]
fn loose_nodes_are_adopted_by_their_topmost_ancestor() {
    let mut data = parent_child();
    let mesh = data.add_mesh(Mesh::new("loose").with_primitive(triangle(5.0)));
    let top = data.add_node(Node::named("top"));
    let leaf = data.add_node(Node::named("leaf").with_mesh(mesh));
    data.add_child(top, leaf).unwrap();

    assert_eq!(data.adopt_loose_nodes(), vec![top]);
    assert_eq!(data.scenes()[0].nodes, vec![0, top]);
    assert!(data.adopt_loose_nodes().is_empty());
}

#[test]
fn meshes_named_after_nodes_and_deduplicated() {
    let mut data = DataSet::empty();
    let scene = data.add_scene(Scene::default());
    let unnamed = data.add_mesh(Mesh::new(""));
    let orphan = data.add_mesh(Mesh::new(""));
    let dup_a = data.add_mesh(Mesh::new("dup"));
    let dup_b = data.add_mesh(Mesh::new("dup"));
    let node = data.add_node(Node::named("wall").with_mesh(unnamed));
    data.add_root(scene, node).unwrap();

    data.name_meshes();
    assert_eq!(data.meshes()[unnamed].name, "wall");
    assert_eq!(data.meshes()[orphan].name, format!("mesh_{orphan}"));
    assert_eq!(data.meshes()[dup_a].name, "dup");
    assert_eq!(data.meshes()[dup_b].name, "dup.1");
}

#[test]
fn unreferenced_meshes_are_pruned() {
    let mut data = parent_child();
    data.add_mesh(Mesh::new("unused"));
    let kept = data.add_mesh(Mesh::new("kept").with_primitive(triangle(9.0)));
    let node = data.add_node(Node::named("n").with_mesh(kept));
    data.add_root(0, node).unwrap();

    assert_eq!(data.prune_meshes(), 1);
    let names: Vec<_> = data.meshes().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["a", "b", "kept"]);
    assert_eq!(data.nodes()[node].mesh, Some(2));
}

#[test]
fn subgraph_copy_bakes_world_transforms() {
    let data = parent_child();
    let copy = data.copy_subgraph(&[1]).unwrap();

    assert_eq!(copy.nodes().len(), 1);
    assert_eq!(copy.meshes().len(), 1);
    assert_eq!(copy.meshes()[0].name, "b");
    assert_eq!(copy.nodes()[0].mesh, Some(0));
    assert_eq!(copy.nodes()[0].transform, data.world_transform(1));
    assert_eq!(copy.default_scene().unwrap().nodes, vec![0]);
}

#[test]
fn subgraph_copy_shares_meshes() {
    let mut data = parent_child();
    let twin = data.duplicate_node(0, Some(0)).unwrap();
    let copy = data.copy_subgraph(&[0, twin]).unwrap();
    assert_eq!(copy.meshes().len(), 1);
    assert_eq!(copy.nodes()[1].mesh, Some(0));
}

#[test]
fn subgraph_copy_can_leave_meshes_behind() {
    let data = parent_child();
    let copy = data.copy_subgraph_with(&[0, 1], |n| n == 1).unwrap();
    assert_eq!(copy.nodes().len(), 2);
    assert_eq!(copy.nodes()[0].mesh, None);
    assert_eq!(copy.nodes()[1].mesh, Some(0));
    let names: Vec<_> = copy.meshes().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["b"]);
}

#[test]
fn subgraph_copy_reports_dangling_meshes() {
    let mut data = parent_child();
    let bad = data.add_node(Node::named("bad").with_mesh(42));
    assert!(matches!(
        data.copy_subgraph(&[bad]),
        Err(DataError::DanglingReference { kind: "mesh", index: 42, .. })
    ));
    assert_eq!(data.copy_subgraph(&[77]), Err(DataError::InvalidNode(77)));
}
