pub mod primitive;

use primitive::Primitive;

/// A named drawable unit composed of one or more [Primitives](Primitive).
///
/// # Characteristics
///
/// * A mesh is identified by its name once [DataSet::name_meshes](crate::DataSet::name_meshes)
///   has run; before that, names may be empty or repeated, as glTF allows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitives: Vec::new(),
        }
    }

    pub fn with_primitive(mut self, prim: Primitive) -> Self {
        self.primitives.push(prim);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }
}
