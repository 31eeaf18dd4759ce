use std::fmt;

use num_traits::AsPrimitive;

mod data;
pub use data::*;

/// The semantic of a vertex attribute; i.e. what the per-vertex data channel means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeUsage {
    Position,
    Normal,
    Tangent,
    Texcoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
    /// Application-specific semantic; stored without its leading underscore.
    Custom(String),
}

impl AttributeUsage {
    /// Parse a glTF attribute semantic name, ex. `TEXCOORD_1`.
    pub fn from_gltf(name: &str) -> Option<Self> {
        fn indexed(name: &str, prefix: &str) -> Option<u32> {
            name.strip_prefix(prefix)?.parse().ok()
        }
        match name {
            "POSITION" => Some(Self::Position),
            "NORMAL" => Some(Self::Normal),
            "TANGENT" => Some(Self::Tangent),
            _ => {
                if let Some(custom) = name.strip_prefix('_') {
                    return Some(Self::Custom(custom.to_owned()));
                }
                indexed(name, "TEXCOORD_")
                    .map(Self::Texcoord)
                    .or_else(|| indexed(name, "COLOR_").map(Self::Color))
                    .or_else(|| indexed(name, "JOINTS_").map(Self::Joints))
                    .or_else(|| indexed(name, "WEIGHTS_").map(Self::Weights))
            }
        }
    }
}

impl fmt::Display for AttributeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position => f.write_str("POSITION"),
            Self::Normal => f.write_str("NORMAL"),
            Self::Tangent => f.write_str("TANGENT"),
            Self::Texcoord(i) => write!(f, "TEXCOORD_{i}"),
            Self::Color(i) => write!(f, "COLOR_{i}"),
            Self::Joints(i) => write!(f, "JOINTS_{i}"),
            Self::Weights(i) => write!(f, "WEIGHTS_{i}"),
            Self::Custom(name) => write!(f, "_{name}"),
        }
    }
}

/// The inner components of an [AttributeType]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeComponent {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
}

impl AttributeComponent {
    pub const fn size(self) -> usize {
        use std::mem::size_of;
        match self {
            AttributeComponent::U8 => size_of::<u8>(),
            AttributeComponent::I8 => size_of::<i8>(),
            AttributeComponent::U16 => size_of::<u16>(),
            AttributeComponent::I16 => size_of::<i16>(),
            AttributeComponent::U32 => size_of::<u32>(),
            AttributeComponent::I32 => size_of::<i32>(),
            AttributeComponent::F32 => size_of::<f32>(),
        }
    }

    /// The glTF `componentType` code, if glTF can express this component.
    pub const fn to_gltf(self) -> Option<u32> {
        match self {
            AttributeComponent::I8 => Some(5120),
            AttributeComponent::U8 => Some(5121),
            AttributeComponent::I16 => Some(5122),
            AttributeComponent::U16 => Some(5123),
            AttributeComponent::U32 => Some(5125),
            AttributeComponent::F32 => Some(5126),
            AttributeComponent::I32 => None,
        }
    }
}

/// The type of value stored in an [Attribute].
///
/// Values taken from the [glTF specification](https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html#accessor-data-types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AttributeType {
    /// Number of components per element; the "width" of one vertex's value.
    pub const fn size_elements(self) -> usize {
        match self {
            AttributeType::Scalar => 1,
            AttributeType::Vec2 => 2,
            AttributeType::Vec3 => 3,
            AttributeType::Vec4 => 4,
            AttributeType::Mat2 => 4,
            AttributeType::Mat3 => 9,
            AttributeType::Mat4 => 16,
        }
    }

    pub const fn size_bytes(self, comp: AttributeComponent) -> usize {
        comp.size() * self.size_elements()
    }

    pub const fn to_gltf(self) -> &'static str {
        match self {
            AttributeType::Scalar => "SCALAR",
            AttributeType::Vec2 => "VEC2",
            AttributeType::Vec3 => "VEC3",
            AttributeType::Vec4 => "VEC4",
            AttributeType::Mat2 => "MAT2",
            AttributeType::Mat3 => "MAT3",
            AttributeType::Mat4 => "MAT4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("buffer of {len} components is not a whole number of {width}-wide elements")]
    Width { len: usize, width: usize },
    #[error("byte length of {len} {comp:?} components overflows usize")]
    Overflow {
        len: usize,
        comp: AttributeComponent,
    },
}

/// One per-vertex data channel of a primitive.
///
/// # Invariants
///
/// * `data.len() == vertex_count * ty.size_elements()`
///
/// The fields are public so that loaders can build attributes directly; [Attribute::validate]
/// and [Attribute::byte_length] re-check the invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    pub data: AttributeData,
    pub normalized: bool,
}

impl Attribute {
    pub fn new(ty: AttributeType, data: impl Into<AttributeData>) -> Result<Self, AttributeError> {
        let res = Self {
            ty,
            data: data.into(),
            normalized: false,
        };
        res.validate()?;
        Ok(res)
    }

    #[inline]
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    #[inline]
    pub fn component(&self) -> AttributeComponent {
        self.data.component()
    }

    /// Components per vertex.
    #[inline]
    pub fn width(&self) -> usize {
        self.ty.size_elements()
    }

    pub fn validate(&self) -> Result<(), AttributeError> {
        let (len, width) = (self.data.len(), self.width());
        if len % width != 0 {
            return Err(AttributeError::Width { len, width });
        }
        Ok(())
    }

    /// Number of vertices described by this attribute.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.width()
    }

    /// `vertex_count * width * component size`, after checking the length invariant.
    pub fn byte_length(&self) -> Result<usize, AttributeError> {
        self.validate()?;
        let comp = self.component();
        self.data
            .len()
            .checked_mul(comp.size())
            .ok_or(AttributeError::Overflow {
                len: self.data.len(),
                comp,
            })
    }

    /// Read one component of one vertex as an `f32`, whatever the storage type.
    ///
    /// # Panics
    ///
    /// * `vertex * width + component` is out of bounds
    #[inline]
    pub fn get_f32(&self, vertex: usize, component: usize) -> f32 {
        self.data.get_f32(vertex * self.width() + component)
    }

    /// Per-component minimum and maximum, as glTF wants them on position accessors.
    pub fn bounds(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        let width = self.width();
        if self.vertex_count() == 0 {
            return None;
        }
        let mut mins = vec![f32::INFINITY; width];
        let mut maxs = vec![f32::NEG_INFINITY; width];
        for v in 0..self.vertex_count() {
            for c in 0..width {
                let x = self.get_f32(v, c);
                mins[c] = mins[c].min(x);
                maxs[c] = maxs[c].max(x);
            }
        }
        Some((mins, maxs))
    }
}

/// Numeric types that can back an [AttributeData] buffer.
pub trait AttributeElement: Copy + Default + bytemuck::Pod + AsPrimitive<f32> {
    const COMPONENT: AttributeComponent;
}

mod _impl_elem {
    use super::{AttributeComponent, AttributeData, AttributeElement};

    macro_rules! impl_element {
        ($Target:ident: $comp:ident) => {
            impl AttributeElement for $Target {
                const COMPONENT: AttributeComponent = AttributeComponent::$comp;
            }

            impl From<Vec<$Target>> for AttributeData {
                #[inline]
                fn from(v: Vec<$Target>) -> Self {
                    AttributeData::$comp(v)
                }
            }
        };
    }

    impl_element!(u8: U8);
    impl_element!(i8: I8);
    impl_element!(u16: U16);
    impl_element!(i16: I16);
    impl_element!(u32: U32);
    impl_element!(i32: I32);
    impl_element!(f32: F32);
}
