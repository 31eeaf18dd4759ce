use hedron::{DataSet, Mesh};

use crate::Error;

/// The byte footprint of a mesh: the byte length of every attribute of every primitive.
///
/// Index lists are not counted. A primitive with no attributes contributes nothing.
///
/// # Errors
///
/// * [`MalformedAttribute`](Error::MalformedAttribute) if an attribute's length is not a whole
///   number of elements, or its byte length is not representable.
pub fn size_of_mesh(mesh: &Mesh) -> Result<u64, Error> {
    let mut total = 0u64;
    for (index, prim) in mesh.primitives().iter().enumerate() {
        for (usage, attr) in prim.attributes() {
            let malformed = |source| Error::MalformedAttribute {
                mesh: mesh.name.clone(),
                primitive: index,
                semantic: usage.to_string(),
                source,
            };
            let bytes = attr.byte_length().map_err(malformed)?;
            total = u64::try_from(bytes)
                .ok()
                .and_then(|b| total.checked_add(b))
                .ok_or_else(|| {
                    malformed(hedron::primitive::attribute::AttributeError::Overflow {
                        len: attr.data.len(),
                        comp: attr.component(),
                    })
                })?;
        }
    }
    Ok(total)
}

/// Size every mesh of a data set, in document order.
pub fn size_meshes(data: &DataSet) -> Result<Vec<(&Mesh, u64)>, Error> {
    data.meshes()
        .iter()
        .map(|mesh| {
            let size = size_of_mesh(mesh)?;
            tracing::trace!(mesh = %mesh.name, size, "sized mesh");
            Ok((mesh, size))
        })
        .collect()
}
