use hedron::{primitive::attribute::AttributeError, primitive::Mode, DataError};

use crate::Side;

/// Errors raised while sizing, packing, splitting, or materializing a scene.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("attribute {semantic} of primitive {primitive} of mesh {mesh:?} is malformed: {source}")]
    MalformedAttribute {
        mesh: String,
        primitive: usize,
        semantic: String,
        #[source]
        source: AttributeError,
    },
    #[error("attribute {semantic} is malformed: {source}")]
    InvalidAttribute {
        semantic: String,
        #[source]
        source: AttributeError,
    },
    #[error("attribute {semantic} has {actual} vertices, but the primitive's POSITION has {expected}")]
    VertexCountMismatch {
        semantic: String,
        expected: usize,
        actual: usize,
    },
    #[error("split of attribute {semantic} overflowed the {side} side at vertex slot {index} of {capacity}")]
    SplitOverflow {
        semantic: String,
        side: Side,
        index: usize,
        capacity: usize,
    },
    #[error("no usable POSITION attribute to split by")]
    MissingPosition,
    #[error("{0:?} topology cannot be split while indexed")]
    UnsplittableTopology(Mode),
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("in primitive {primitive} of mesh {mesh:?}: {source}")]
    InPrimitive {
        mesh: String,
        primitive: usize,
        #[source]
        source: Box<Error>,
    },
    #[error("mesh {0:?} is not instanced by any node")]
    UnresolvedMeshOwner(String),
    #[error("byte budget must be greater than zero")]
    ZeroBudget,
    #[error(transparent)]
    Data(#[from] DataError),
}

impl Error {
    /// Attach the mesh and primitive in which `self` occurred.
    pub fn in_primitive(self, mesh: impl Into<String>, primitive: usize) -> Self {
        Self::InPrimitive {
            mesh: mesh.into(),
            primitive,
            source: Box::new(self),
        }
    }
}
