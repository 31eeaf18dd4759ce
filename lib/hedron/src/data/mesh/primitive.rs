use std::collections::BTreeMap;

use crate::primitive::attribute::{Attribute, AttributeUsage};

pub mod attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    Points = 0,
    Lines = 1,
    LineLoop = 2,
    LineStrip = 3,
    #[default]
    Triangles = 4,
    TriangleStrip = 5,
    TriangleFan = 6,
}

impl Mode {
    pub fn to_gltf(self) -> u32 {
        self as u32
    }

    pub fn from_gltf(val: u32) -> Result<Self, &'static str> {
        match val {
            0 => Ok(Self::Points),
            1 => Ok(Self::Lines),
            2 => Ok(Self::LineLoop),
            3 => Ok(Self::LineStrip),
            4 => Ok(Self::Triangles),
            5 => Ok(Self::TriangleStrip),
            6 => Ok(Self::TriangleFan),
            _ => Err("invalid primitive mode"),
        }
    }

    /// Number of consecutive indices forming one topological primitive, for list topologies.
    ///
    /// `None` for strips, loops, and fans, whose primitives share indices.
    pub fn list_stride(self) -> Option<usize> {
        match self {
            Self::Points => Some(1),
            Self::Lines => Some(2),
            Self::Triangles => Some(3),
            Self::LineLoop | Self::LineStrip | Self::TriangleStrip | Self::TriangleFan => None,
        }
    }
}

/// A single drawable batch of vertices.
///
/// Attributes are kept in semantic order so that iteration (and therefore output) is
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitive {
    /// The method by which vertices are interpreted as topological primitives
    pub mode: Mode,
    /// Indices of each vertex within each attribute. If `None`, equivalent to [0, 1, 2, 3, ...]
    pub indices: Option<Vec<u32>>,
    /// Vertex attribute data
    pub attributes: BTreeMap<AttributeUsage, Attribute>,
    /// Index of the material with which this primitive is rendered
    pub material: Option<usize>,
}

impl Primitive {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, usage: AttributeUsage, attr: Attribute) -> Self {
        self.attributes.insert(usage, attr);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    #[inline]
    pub fn attributes(&self) -> &BTreeMap<AttributeUsage, Attribute> {
        &self.attributes
    }

    #[inline]
    pub fn material(&self) -> Option<usize> {
        self.material
    }

    #[inline]
    pub fn get_attr(&self, attr: &AttributeUsage) -> Option<&Attribute> {
        self.attributes.get(attr)
    }

    #[inline]
    pub fn get_attr_mut(&mut self, attr: &AttributeUsage) -> Option<&mut Attribute> {
        self.attributes.get_mut(attr)
    }

    #[inline]
    pub fn semantics(&self) -> impl Iterator<Item = &AttributeUsage> {
        self.attributes.keys()
    }

    #[inline]
    pub fn position(&self) -> Option<&Attribute> {
        self.get_attr(&AttributeUsage::Position)
    }

    /// Number of vertices, as given by the position attribute (or, lacking one, any attribute).
    pub fn vertex_count(&self) -> usize {
        self.position()
            .or_else(|| self.attributes.values().next())
            .map_or(0, Attribute::vertex_count)
    }
}
