use bytemuck::Pod;
use num_traits::AsPrimitive;

use super::{AttributeComponent, AttributeElement};

/// Typed storage behind an [Attribute](super::Attribute), one variant per component kind.
///
/// Components are stored flat: vertex `i` of a `width`-wide attribute occupies
/// `[i * width, (i + 1) * width)`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

/// Evaluate `$body` with `$v` bound to the typed vector inside an [AttributeData], whatever its
/// component type.
///
/// `$data` may be an owned value, a reference, or a mutable reference; `$v` binds accordingly.
#[macro_export]
macro_rules! with_attribute_data {
    ($data:expr, $v:ident => $body:expr) => {{
        use $crate::primitive::attribute::AttributeData as __Data;
        match $data {
            __Data::U8($v) => $body,
            __Data::I8($v) => $body,
            __Data::U16($v) => $body,
            __Data::I16($v) => $body,
            __Data::U32($v) => $body,
            __Data::I32($v) => $body,
            __Data::F32($v) => $body,
        }
    }};
}

impl AttributeData {
    /// An empty buffer of the given component type.
    pub fn empty(comp: AttributeComponent) -> Self {
        Self::zeroed(comp, 0)
    }

    /// A buffer of `len` zero components.
    pub fn zeroed(comp: AttributeComponent, len: usize) -> Self {
        match comp {
            AttributeComponent::U8 => Self::U8(vec![0; len]),
            AttributeComponent::I8 => Self::I8(vec![0; len]),
            AttributeComponent::U16 => Self::U16(vec![0; len]),
            AttributeComponent::I16 => Self::I16(vec![0; len]),
            AttributeComponent::U32 => Self::U32(vec![0; len]),
            AttributeComponent::I32 => Self::I32(vec![0; len]),
            AttributeComponent::F32 => Self::F32(vec![0.0; len]),
        }
    }

    pub fn component(&self) -> AttributeComponent {
        fn comp_of<T: AttributeElement>(_: &[T]) -> AttributeComponent {
            T::COMPONENT
        }
        with_attribute_data!(self, v => comp_of(v))
    }

    /// Number of components (not vertices) stored.
    #[inline]
    pub fn len(&self) -> usize {
        with_attribute_data!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the component at flat index `i` as an `f32`.
    ///
    /// # Panics
    ///
    /// * `i >= self.len()`
    #[inline]
    pub fn get_f32(&self, i: usize) -> f32 {
        with_attribute_data!(self, v => v[i].as_())
    }

    /// Little-endian bytes of the stored components.
    pub fn as_bytes(&self) -> &[u8] {
        with_attribute_data!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    /// Decode `count` components of type `comp` from tightly packed little-endian bytes.
    ///
    /// Returns `None` if `bytes` is shorter than `count` components.
    pub fn from_bytes(comp: AttributeComponent, bytes: &[u8], count: usize) -> Option<Self> {
        fn decode<T: Pod>(bytes: &[u8], count: usize) -> Option<Vec<T>> {
            let size = std::mem::size_of::<T>();
            let bytes = bytes.get(..count.checked_mul(size)?)?;
            Some(
                bytes
                    .chunks_exact(size)
                    .map(bytemuck::pod_read_unaligned::<T>)
                    .collect(),
            )
        }
        Some(match comp {
            AttributeComponent::U8 => Self::U8(decode(bytes, count)?),
            AttributeComponent::I8 => Self::I8(decode(bytes, count)?),
            AttributeComponent::U16 => Self::U16(decode(bytes, count)?),
            AttributeComponent::I16 => Self::I16(decode(bytes, count)?),
            AttributeComponent::U32 => Self::U32(decode(bytes, count)?),
            AttributeComponent::I32 => Self::I32(decode(bytes, count)?),
            AttributeComponent::F32 => Self::F32(decode(bytes, count)?),
        })
    }
}
