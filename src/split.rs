//! Dividing primitives in two along a coordinate axis.

use std::fmt;

use hedron::{
    primitive::{
        attribute::{Attribute, AttributeData},
        Primitive,
    },
    Mesh,
};

use crate::{Axis, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Below the split plane
    Left,
    /// At or above the split plane
    Right,
}

impl Side {
    /// Which side of `mid` a coordinate lies on. Coordinates equal to `mid` fall to the right.
    #[inline]
    pub fn of(coord: f32, mid: f32) -> Self {
        if coord < mid {
            Side::Left
        } else {
            Side::Right
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Left => "left",
            Side::Right => "right",
        })
    }
}

/// Both halves of a split primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPrimitive {
    pub left: Primitive,
    pub right: Primitive,
    /// Number of indexed points, lines, or triangles dropped for having vertices on both sides
    pub straddling: usize,
}

impl SplitPrimitive {
    #[inline]
    pub fn side(&self, side: Side) -> &Primitive {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    pub fn into_side(self, side: Side) -> Primitive {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Copy each `width`-wide element of `src` into the buffer for its vertex's side, keeping the
/// original relative order within each side.
fn partition_elements<T: Copy + Default>(
    src: &[T],
    width: usize,
    position: &Attribute,
    axis: usize,
    mid: f32,
    counts: [usize; 2],
    semantic: &dyn fmt::Display,
) -> Result<(Vec<T>, Vec<T>), Error> {
    let mut left = vec![T::default(); counts[0] * width];
    let mut right = vec![T::default(); counts[1] * width];
    let (mut l, mut r) = (0usize, 0usize);
    for (vertex, element) in src.chunks_exact(width).enumerate() {
        let side = Side::of(position.get_f32(vertex, axis), mid);
        let (buf, cursor) = match side {
            Side::Left => (&mut left, &mut l),
            Side::Right => (&mut right, &mut r),
        };
        let capacity = buf.len() / width;
        let dst = buf
            .get_mut(*cursor * width..(*cursor + 1) * width)
            .ok_or_else(|| Error::SplitOverflow {
                semantic: semantic.to_string(),
                side,
                index: *cursor,
                capacity,
            })?;
        dst.copy_from_slice(element);
        *cursor += 1;
    }
    Ok((left, right))
}

/// Split the index list of `prim` between both sides, remapped to each side's vertex numbering.
///
/// Returns the left and right index lists and the number of straddling primitives dropped.
fn split_indices(
    prim: &Primitive,
    indices: &[u32],
    position: &Attribute,
    axis: usize,
    mid: f32,
) -> Result<(Vec<u32>, Vec<u32>, usize), Error> {
    let stride = prim
        .mode()
        .list_stride()
        .ok_or(Error::UnsplittableTopology(prim.mode()))?;

    let vertex_count = position.vertex_count();
    let mut next = [0u32; 2];
    let slots: Vec<(Side, u32)> = (0..vertex_count)
        .map(|v| {
            let side = Side::of(position.get_f32(v, axis), mid);
            let n = &mut next[side as usize];
            *n += 1;
            (side, *n - 1)
        })
        .collect();

    let (mut left, mut right) = (Vec::new(), Vec::new());
    let mut straddling = 0;
    for group in indices.chunks_exact(stride) {
        let mut resolved = Vec::with_capacity(stride);
        for &index in group {
            let slot = slots
                .get(index as usize)
                .ok_or(Error::IndexOutOfRange {
                    index,
                    vertex_count,
                })?;
            resolved.push(*slot);
        }
        let side = resolved[0].0;
        if resolved.iter().any(|(s, _)| *s != side) {
            straddling += 1;
            continue;
        }
        let out = match side {
            Side::Left => &mut left,
            Side::Right => &mut right,
        };
        out.extend(resolved.iter().map(|(_, slot)| *slot));
    }
    Ok((left, right, straddling))
}

/// Split one primitive into the vertices below `mid` on `axis` and those at or above it.
///
/// Every attribute is divided, keeping its component type and the original vertex order within
/// each side. An indexed primitive keeps, on each side, the points, lines, or triangles lying
/// wholly on that side.
///
/// # Errors
///
/// * [`MissingPosition`](Error::MissingPosition) if the primitive has no position with a
///   component for `axis`
/// * [`InvalidAttribute`](Error::InvalidAttribute) if an attribute is not a whole number of
///   elements
/// * [`VertexCountMismatch`](Error::VertexCountMismatch) if an attribute disagrees with the
///   position's vertex count
/// * [`UnsplittableTopology`](Error::UnsplittableTopology) for indexed strips, loops, and fans
/// * [`IndexOutOfRange`](Error::IndexOutOfRange) if an index names a missing vertex
/// * [`SplitOverflow`](Error::SplitOverflow) if the sides disagree between the counting and
///   copying passes
pub fn split_along_axis(prim: &Primitive, axis: Axis, mid: f32) -> Result<SplitPrimitive, Error> {
    let axis = axis.index();
    let position = prim
        .position()
        .filter(|p| axis < p.width())
        .ok_or(Error::MissingPosition)?;
    let vertex_count = position.vertex_count();

    let mut counts = [0usize; 2];
    for v in 0..vertex_count {
        counts[Side::of(position.get_f32(v, axis), mid) as usize] += 1;
    }

    let mut left = Primitive::new(prim.mode());
    let mut right = Primitive::new(prim.mode());
    left.material = prim.material();
    right.material = prim.material();

    for (usage, attr) in prim.attributes() {
        attr.validate().map_err(|source| Error::InvalidAttribute {
            semantic: usage.to_string(),
            source,
        })?;
        if attr.vertex_count() != vertex_count {
            return Err(Error::VertexCountMismatch {
                semantic: usage.to_string(),
                expected: vertex_count,
                actual: attr.vertex_count(),
            });
        }
        let width = attr.width();
        let (l, r): (AttributeData, AttributeData) = hedron::with_attribute_data!(&attr.data, v => {
            let (l, r) = partition_elements(v, width, position, axis, mid, counts, usage)?;
            (l.into(), r.into())
        });
        for (out, data) in [(&mut left, l), (&mut right, r)] {
            out.attributes.insert(
                usage.clone(),
                Attribute {
                    ty: attr.ty,
                    data,
                    normalized: attr.normalized,
                },
            );
        }
    }

    let mut straddling = 0;
    if let Some(indices) = prim.indices() {
        let (l, r, s) = split_indices(prim, indices, position, axis, mid)?;
        left.indices = Some(l);
        right.indices = Some(r);
        straddling = s;
    }

    Ok(SplitPrimitive {
        left,
        right,
        straddling,
    })
}

/// Both halves of a split mesh. A half with nothing to draw is `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitMesh {
    pub left: Option<Mesh>,
    pub right: Option<Mesh>,
    pub straddling: usize,
}

fn is_drawable(prim: &Primitive) -> bool {
    prim.vertex_count() > 0 && prim.indices().map_or(true, |i| !i.is_empty())
}

/// Split every primitive of a mesh, gathering the halves into meshes named `<name>.left` and
/// `<name>.right`.
pub fn split_mesh(mesh: &Mesh, axis: Axis, mid: f32) -> Result<SplitMesh, Error> {
    let mut left = Mesh::new(format!("{}.left", mesh.name));
    let mut right = Mesh::new(format!("{}.right", mesh.name));
    let mut straddling = 0;
    for (index, prim) in mesh.primitives().iter().enumerate() {
        let split =
            split_along_axis(prim, axis, mid).map_err(|e| e.in_primitive(&mesh.name, index))?;
        if split.straddling > 0 {
            tracing::warn!(
                mesh = %mesh.name,
                primitive = index,
                dropped = split.straddling,
                "dropped primitives straddling the split plane"
            );
        }
        straddling += split.straddling;
        left.primitives.extend(Some(split.left).filter(is_drawable));
        right.primitives.extend(Some(split.right).filter(is_drawable));
    }
    tracing::debug!(
        mesh = %mesh.name,
        %axis,
        mid,
        left = left.primitives.len(),
        right = right.primitives.len(),
        "split mesh"
    );
    let keep = |m: Mesh| Some(m).filter(|m| !m.primitives.is_empty());
    Ok(SplitMesh {
        left: keep(left),
        right: keep(right),
        straddling,
    })
}
