use binfold::{
    hedron::{
        primitive::{
            attribute::{Attribute, AttributeData, AttributeError, AttributeType, AttributeUsage},
            Mode, Primitive,
        },
        Mesh,
    },
    split_along_axis, split_mesh, Axis, Error, Side,
};
use quickcheck_macros::quickcheck;

mod common;
use common::{points, points_x};

fn xs(prim: &Primitive) -> Vec<f32> {
    let pos = prim.position().unwrap();
    (0..pos.vertex_count()).map(|v| pos.get_f32(v, 0)).collect()
}

#[test]
fn stable_split_at_midpoint() {
    let prim = points_x(&[1.0, 5.0, 2.0, 9.0]).with_attr(
        AttributeUsage::Custom("ID".into()),
        Attribute::new(AttributeType::Scalar, vec![10u16, 11, 12, 13]).unwrap(),
    );
    let split = split_along_axis(&prim, Axis::X, 5.0).unwrap();

    assert_eq!(xs(&split.left), vec![1.0, 2.0]);
    assert_eq!(xs(&split.right), vec![5.0, 9.0]);

    let id = AttributeUsage::Custom("ID".into());
    assert_eq!(
        split.side(Side::Left).get_attr(&id).unwrap().data,
        AttributeData::U16(vec![10, 12])
    );
    assert_eq!(
        split.side(Side::Right).get_attr(&id).unwrap().data,
        AttributeData::U16(vec![11, 13])
    );
    assert_eq!(split.straddling, 0);
}

#[test]
fn attribute_layout_is_preserved() {
    let normals = Attribute::new(AttributeType::Vec3, vec![0i8, 127, 0, 0, -127, 0])
        .unwrap()
        .with_normalized(true);
    let prim = points_x(&[-1.0, 1.0])
        .with_attr(AttributeUsage::Normal, normals)
        .with_material(3);
    let split = split_along_axis(&prim, Axis::X, 0.0).unwrap();

    let left = split.left.get_attr(&AttributeUsage::Normal).unwrap();
    assert_eq!(left.ty, AttributeType::Vec3);
    assert!(left.normalized);
    assert_eq!(left.data, AttributeData::I8(vec![0, 127, 0]));
    assert_eq!(split.left.material(), Some(3));
    assert_eq!(split.right.mode(), Mode::Points);
}

#[test]
fn split_on_other_axes() {
    let prim = points(&[[0.0, 3.0, -1.0], [0.0, -3.0, 1.0]]);
    let by_y = split_along_axis(&prim, Axis::Y, 0.0).unwrap();
    assert_eq!(by_y.left.vertex_count(), 1);
    assert_eq!(by_y.left.position().unwrap().get_f32(0, 1), -3.0);
    let by_z = split_along_axis(&prim, Axis::Z, 0.0).unwrap();
    assert_eq!(by_z.left.position().unwrap().get_f32(0, 2), -1.0);
}

#[test]
fn one_sided_split_leaves_empty_half() {
    let prim = points_x(&[1.0, 2.0]);
    let split = split_along_axis(&prim, Axis::X, 10.0).unwrap();
    assert_eq!(split.left.vertex_count(), 2);
    let right = split.right.position().unwrap();
    assert_eq!(right.vertex_count(), 0);
    assert!(right.data.is_empty());
}

#[test]
fn indexed_triangles_keep_whole_triangles() {
    let prim = points_x(&[0.0, 1.0, 2.0, 10.0, 11.0, 12.0])
        .with_indices(vec![0, 1, 2, 3, 4, 5, 0, 3, 4, 5, 4, 3]);
    let prim = Primitive {
        mode: Mode::Triangles,
        ..prim
    };
    let split = split_along_axis(&prim, Axis::X, 5.0).unwrap();
    assert_eq!(split.left.indices(), Some(&[0, 1, 2][..]));
    assert_eq!(split.right.indices(), Some(&[0, 1, 2, 2, 1, 0][..]));
    assert_eq!(split.straddling, 1);
}

#[test]
fn indexed_strips_cannot_split() {
    let prim = Primitive {
        mode: Mode::TriangleStrip,
        ..points_x(&[0.0, 1.0, 2.0]).with_indices(vec![0, 1, 2])
    };
    assert!(matches!(
        split_along_axis(&prim, Axis::X, 1.0),
        Err(Error::UnsplittableTopology(Mode::TriangleStrip))
    ));
}

#[test]
fn bad_indices_are_reported() {
    let prim = points_x(&[0.0, 1.0]).with_indices(vec![0, 7]);
    let prim = Primitive {
        mode: Mode::Lines,
        ..prim
    };
    assert!(matches!(
        split_along_axis(&prim, Axis::X, 1.0),
        Err(Error::IndexOutOfRange {
            index: 7,
            vertex_count: 2
        })
    ));
}

#[test]
fn position_is_required() {
    let prim = Primitive::new(Mode::Points).with_attr(
        AttributeUsage::Normal,
        Attribute::new(AttributeType::Vec3, vec![0.0f32; 3]).unwrap(),
    );
    assert!(matches!(
        split_along_axis(&prim, Axis::X, 0.0),
        Err(Error::MissingPosition)
    ));

    let flat = Primitive::new(Mode::Points).with_attr(
        AttributeUsage::Position,
        Attribute::new(AttributeType::Vec2, vec![0.0f32; 2]).unwrap(),
    );
    assert!(matches!(
        split_along_axis(&flat, Axis::Z, 0.0),
        Err(Error::MissingPosition)
    ));
}

#[test]
fn mismatched_attributes_are_reported() {
    let prim = points_x(&[0.0, 1.0]).with_attr(
        AttributeUsage::Texcoord(0),
        Attribute::new(AttributeType::Vec2, vec![0.0f32; 6]).unwrap(),
    );
    assert!(matches!(
        split_along_axis(&prim, Axis::X, 0.5),
        Err(Error::VertexCountMismatch {
            expected: 2,
            actual: 3,
            ..
        })
    ));
}

#[test]
fn ragged_attributes_are_reported_as_malformed() {
    let prim = points_x(&[0.0, 1.0]).with_attr(
        AttributeUsage::Normal,
        Attribute {
            ty: AttributeType::Vec3,
            data: AttributeData::F32(vec![0.0; 7]),
            normalized: false,
        },
    );
    let err = split_along_axis(&prim, Axis::X, 0.5).unwrap_err();
    assert!(matches!(
        &err,
        Error::InvalidAttribute {
            semantic,
            source: AttributeError::Width { len: 7, width: 3 },
        } if semantic == "NORMAL"
    ));
    assert!(err.to_string().contains("NORMAL"));
}

#[test]
fn mesh_halves_are_named_and_pruned() {
    let mesh = Mesh::new("rock")
        .with_primitive(points_x(&[0.0, 9.0]))
        .with_primitive(points_x(&[1.0, 2.0]));
    let halves = split_mesh(&mesh, Axis::X, 5.0).unwrap();

    let left = halves.left.unwrap();
    assert_eq!(left.name, "rock.left");
    assert_eq!(left.primitives.len(), 2);
    let right = halves.right.unwrap();
    assert_eq!(right.name, "rock.right");
    // the second primitive has nothing on the right
    assert_eq!(right.primitives.len(), 1);

    let one_sided = split_mesh(&mesh, Axis::X, 100.0).unwrap();
    assert!(one_sided.left.is_some());
    assert!(one_sided.right.is_none());
}

#[test]
fn mesh_split_errors_name_the_primitive() {
    let mesh = Mesh::new("broken")
        .with_primitive(points_x(&[0.0]))
        .with_primitive(Primitive::new(Mode::Points));
    let err = split_mesh(&mesh, Axis::X, 0.0).unwrap_err();
    assert!(matches!(
        &err,
        Error::InPrimitive { mesh, primitive: 1, .. } if mesh == "broken"
    ));
    assert!(err.to_string().contains("broken"));
}

#[quickcheck]
fn split_conserves_vertices(coords: Vec<i16>, mid: i16) -> bool {
    let prim = points_x(&coords.iter().map(|&c| f32::from(c)).collect::<Vec<_>>());
    let split = split_along_axis(&prim, Axis::X, f32::from(mid)).unwrap();
    let (l, r) = (split.left.position().unwrap(), split.right.position().unwrap());
    l.vertex_count() + r.vertex_count() == coords.len()
        && l.data.len() + r.data.len() == prim.position().unwrap().data.len()
}

#[quickcheck]
fn split_respects_midpoint(coords: Vec<i16>, mid: i16) -> bool {
    let mid = f32::from(mid);
    let prim = points_x(&coords.iter().map(|&c| f32::from(c)).collect::<Vec<_>>());
    let split = split_along_axis(&prim, Axis::X, mid).unwrap();
    xs(&split.left).iter().all(|&x| x < mid) && xs(&split.right).iter().all(|&x| x >= mid)
}

#[quickcheck]
fn split_keeps_relative_order(coords: Vec<i16>, mid: i16) -> bool {
    let mid = f32::from(mid);
    let values: Vec<f32> = coords.iter().map(|&c| f32::from(c)).collect();
    let split = split_along_axis(&points_x(&values), Axis::X, mid).unwrap();
    let left: Vec<f32> = values.iter().copied().filter(|&x| x < mid).collect();
    let right: Vec<f32> = values.iter().copied().filter(|&x| x >= mid).collect();
    xs(&split.left) == left && xs(&split.right) == right
}
