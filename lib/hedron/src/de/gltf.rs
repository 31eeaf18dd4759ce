//! Utilities for deserializing glTF data as a [DataSet].
//!
//! # Notes
//!
//! * Coordinate system: right-handed; the same as is used elsewhere in this library.
//! * glTF data *may* contain scenes, and it *may* specify a default scene, but these aren't required by the format.
//!   * Use [DataSet::ensure_default_scene] after loading if a scene is needed.
//! * Buffer data is supplied by the caller, indexed by glTF buffer index, so that it can come
//!   from a GLB binary chunk, memory-mapped files, or anywhere else.
//!
//! # See Also
//!
//! * [glTF 2.0 Spec](https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html)
//! * [glTF Reference Guide](https://www.khronos.org/files/gltf20-reference-guide.pdf)

use gltf::accessor::{DataType, Dimensions};

use crate::{
    primitive::{
        attribute::{Attribute, AttributeComponent, AttributeData, AttributeType, AttributeUsage},
        Mode, Primitive,
    },
    AlphaMode, Camera, DataSet, Image, ImageSource, Material, Mesh, Node, Projection, Sampler,
    Scene, Texture, TextureRef,
};

#[derive(Debug, thiserror::Error)]
pub enum DeError {
    #[error("buffer {0} was not provided")]
    MissingBuffer(usize),
    #[error("accessor {0} is sparse; sparse accessors are unsupported")]
    Sparse(usize),
    #[error("accessor {accessor} reads past the end of buffer view {view}")]
    OutOfBounds { accessor: usize, view: usize },
    #[error("buffer view {0} reads past the end of its buffer")]
    ViewOutOfBounds(usize),
    #[error("accessor {0} cannot be used as an index list; expected unsigned scalars")]
    InvalidIndices(usize),
    #[error("invalid primitive mode {0}")]
    InvalidMode(u32),
    #[error("glTF document references an external buffer; load it and use DataSet::from_gltf")]
    ExternalBuffer,
}

fn component(ty: DataType) -> AttributeComponent {
    match ty {
        DataType::I8 => AttributeComponent::I8,
        DataType::U8 => AttributeComponent::U8,
        DataType::I16 => AttributeComponent::I16,
        DataType::U16 => AttributeComponent::U16,
        DataType::U32 => AttributeComponent::U32,
        DataType::F32 => AttributeComponent::F32,
    }
}

fn attr_type(dim: Dimensions) -> AttributeType {
    match dim {
        Dimensions::Scalar => AttributeType::Scalar,
        Dimensions::Vec2 => AttributeType::Vec2,
        Dimensions::Vec3 => AttributeType::Vec3,
        Dimensions::Vec4 => AttributeType::Vec4,
        Dimensions::Mat2 => AttributeType::Mat2,
        Dimensions::Mat3 => AttributeType::Mat3,
        Dimensions::Mat4 => AttributeType::Mat4,
    }
}

fn usage(semantic: &gltf::Semantic) -> AttributeUsage {
    use gltf::Semantic as S;
    match semantic {
        S::Positions => AttributeUsage::Position,
        S::Normals => AttributeUsage::Normal,
        S::Tangents => AttributeUsage::Tangent,
        S::Colors(i) => AttributeUsage::Color(*i),
        S::TexCoords(i) => AttributeUsage::Texcoord(*i),
        S::Joints(i) => AttributeUsage::Joints(*i),
        S::Weights(i) => AttributeUsage::Weights(*i),
        // application-specific, ex. `_BATCHID`; the leading underscore is already stripped
        S::Extras(name) => AttributeUsage::Custom(name.clone()),
    }
}

fn texture_ref(info: gltf::texture::Info<'_>) -> TextureRef {
    TextureRef {
        texture: info.texture().index(),
        tex_coord: info.tex_coord(),
    }
}

/// The bytes of a buffer view.
fn view_bytes<'b>(view: &gltf::buffer::View<'_>, buffers: &[&'b [u8]]) -> Result<&'b [u8], DeError> {
    let buffer = buffers
        .get(view.buffer().index())
        .ok_or(DeError::MissingBuffer(view.buffer().index()))?;
    buffer
        .get(view.offset()..view.offset() + view.length())
        .ok_or(DeError::ViewOutOfBounds(view.index()))
}

/// Copy the data behind an accessor into a typed buffer, resolving byte strides.
fn read_accessor(
    acc: &gltf::Accessor<'_>,
    buffers: &[&[u8]],
) -> Result<(AttributeType, AttributeData), DeError> {
    if acc.sparse().is_some() {
        return Err(DeError::Sparse(acc.index()));
    }
    let comp = component(acc.data_type());
    let ty = attr_type(acc.dimensions());
    let len = acc.count() * ty.size_elements();

    // per the glTF spec, an accessor without a view reads as zeros
    let Some(view) = acc.view() else {
        return Ok((ty, AttributeData::zeroed(comp, len)));
    };

    let out_of_bounds = || DeError::OutOfBounds {
        accessor: acc.index(),
        view: view.index(),
    };
    let bytes = view_bytes(&view, buffers)?
        .get(acc.offset()..)
        .ok_or_else(out_of_bounds)?;
    let elem = ty.size_bytes(comp);
    let stride = view.stride().unwrap_or(elem);

    let data = if stride == elem {
        AttributeData::from_bytes(comp, bytes, len)
    } else {
        let mut packed = Vec::with_capacity(acc.count() * elem);
        for i in 0..acc.count() {
            let start = i * stride;
            packed.extend_from_slice(bytes.get(start..start + elem).ok_or_else(out_of_bounds)?);
        }
        AttributeData::from_bytes(comp, &packed, len)
    };
    Ok((ty, data.ok_or_else(out_of_bounds)?))
}

fn read_indices(acc: &gltf::Accessor<'_>, buffers: &[&[u8]]) -> Result<Vec<u32>, DeError> {
    let (ty, data) = read_accessor(acc, buffers)?;
    if ty != AttributeType::Scalar {
        return Err(DeError::InvalidIndices(acc.index()));
    }
    Ok(match data {
        AttributeData::U8(v) => v.into_iter().map(u32::from).collect(),
        AttributeData::U16(v) => v.into_iter().map(u32::from).collect(),
        AttributeData::U32(v) => v,
        _ => return Err(DeError::InvalidIndices(acc.index())),
    })
}

fn read_primitive(prim: &gltf::Primitive<'_>, buffers: &[&[u8]]) -> Result<Primitive, DeError> {
    let gl_mode = prim.mode().as_gl_enum();
    let mut res = Primitive::new(Mode::from_gltf(gl_mode).map_err(|_| DeError::InvalidMode(gl_mode))?);
    res.material = prim.material().index();
    res.indices = prim
        .indices()
        .map(|acc| read_indices(&acc, buffers))
        .transpose()?;
    for (semantic, acc) in prim.attributes() {
        let usage = usage(&semantic);
        let (ty, data) = read_accessor(&acc, buffers)?;
        res.attributes.insert(
            usage,
            Attribute {
                ty,
                data,
                normalized: acc.normalized(),
            },
        );
    }
    Ok(res)
}

fn read_material(m: &gltf::Material<'_>) -> Material {
    let pbr = m.pbr_metallic_roughness();
    let normal = m.normal_texture();
    let occlusion = m.occlusion_texture();
    Material {
        name: m.name().map(str::to_owned),
        base_color_factor: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(texture_ref),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(texture_ref),
        normal_texture: normal.as_ref().map(|n| TextureRef {
            texture: n.texture().index(),
            tex_coord: n.tex_coord(),
        }),
        normal_scale: normal.as_ref().map_or(1.0, |n| n.scale()),
        occlusion_texture: occlusion.as_ref().map(|o| TextureRef {
            texture: o.texture().index(),
            tex_coord: o.tex_coord(),
        }),
        occlusion_strength: occlusion.as_ref().map_or(1.0, |o| o.strength()),
        emissive_texture: m.emissive_texture().map(texture_ref),
        emissive_factor: m.emissive_factor(),
        alpha_mode: match m.alpha_mode() {
            gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
            gltf::material::AlphaMode::Mask => AlphaMode::Mask,
            gltf::material::AlphaMode::Blend => AlphaMode::Blend,
        },
        alpha_cutoff: m.alpha_cutoff(),
        double_sided: m.double_sided(),
    }
}

fn read_camera(c: &gltf::Camera<'_>) -> Camera {
    let projection = match c.projection() {
        gltf::camera::Projection::Perspective(p) => Projection::Perspective {
            aspect_ratio: p.aspect_ratio(),
            yfov: p.yfov(),
            znear: p.znear(),
            zfar: p.zfar(),
        },
        gltf::camera::Projection::Orthographic(o) => Projection::Orthographic {
            xmag: o.xmag(),
            ymag: o.ymag(),
            znear: o.znear(),
            zfar: o.zfar(),
        },
    };
    Camera {
        name: c.name().map(str::to_owned),
        projection,
    }
}

fn read_image(img: &gltf::Image<'_>, buffers: &[&[u8]]) -> Result<Image, DeError> {
    let (source, mime_type) = match img.source() {
        gltf::image::Source::View { view, mime_type } => (
            ImageSource::Bytes(view_bytes(&view, buffers)?.to_vec()),
            Some(mime_type.to_owned()),
        ),
        gltf::image::Source::Uri { uri, mime_type } => {
            (ImageSource::Uri(uri.to_owned()), mime_type.map(str::to_owned))
        }
    };
    Ok(Image {
        name: img.name().map(str::to_owned),
        mime_type,
        source,
    })
}

impl DataSet {
    /// Read every scene, node, mesh, camera, and material of a glTF document.
    ///
    /// `buffers[i]` must hold the data of the document's `i`th buffer.
    pub fn from_gltf(doc: &gltf::Document, buffers: &[&[u8]]) -> Result<Self, DeError> {
        let mut res = DataSet::empty();

        res.scenes = doc
            .scenes()
            .map(|s| Scene {
                name: s.name().map(str::to_owned),
                nodes: s.nodes().map(|n| n.index()).collect(),
            })
            .collect();
        res.default_scene = doc.default_scene().map(|s| s.index());

        res.nodes = doc
            .nodes()
            .map(|n| Node {
                name: n.name().map(str::to_owned),
                parent: None,
                children: n.children().map(|c| c.index()).collect(),
                transform: n.transform().matrix().into(),
                mesh: n.mesh().map(|m| m.index()),
                camera: n.camera().map(|c| c.index()),
            })
            .collect();
        for parent in 0..res.nodes.len() {
            for child in res.nodes[parent].children.clone() {
                if let Some(node) = res.nodes.get_mut(child) {
                    node.parent = Some(parent);
                }
            }
        }

        for mesh in doc.meshes() {
            let primitives = mesh
                .primitives()
                .map(|p| read_primitive(&p, buffers))
                .collect::<Result<_, _>>()?;
            tracing::trace!(
                index = mesh.index(),
                name = mesh.name(),
                "read mesh"
            );
            res.meshes.push(Mesh {
                name: mesh.name().unwrap_or_default().to_owned(),
                primitives,
            });
        }

        res.cameras = doc.cameras().map(|c| read_camera(&c)).collect();
        res.materials = doc.materials().map(|m| read_material(&m)).collect();
        res.textures = doc
            .textures()
            .map(|t| Texture {
                name: t.name().map(str::to_owned),
                sampler: t.sampler().index(),
                source: t.source().index(),
            })
            .collect();
        res.samplers = doc
            .samplers()
            .map(|s| Sampler {
                name: s.name().map(str::to_owned),
                mag_filter: s.mag_filter().map(|f| f.as_gl_enum()),
                min_filter: s.min_filter().map(|f| f.as_gl_enum()),
                wrap_s: s.wrap_s().as_gl_enum(),
                wrap_t: s.wrap_t().as_gl_enum(),
            })
            .collect();
        res.images = doc
            .images()
            .map(|i| read_image(&i, buffers))
            .collect::<Result<_, _>>()?;

        tracing::debug!(
            scenes = res.scenes.len(),
            nodes = res.nodes.len(),
            meshes = res.meshes.len(),
            materials = res.materials.len(),
            "read glTF document"
        );
        Ok(res)
    }
}

/// Reads self-contained documents, whose only buffer (if any) is the GLB binary chunk.
impl TryFrom<&gltf::Gltf> for DataSet {
    type Error = DeError;
    fn try_from(doc: &gltf::Gltf) -> Result<Self, Self::Error> {
        let mut buffers = Vec::new();
        for buffer in doc.buffers() {
            match buffer.source() {
                gltf::buffer::Source::Bin => {
                    buffers.push(doc.blob.as_deref().ok_or(DeError::MissingBuffer(buffer.index()))?)
                }
                gltf::buffer::Source::Uri(_) => return Err(DeError::ExternalBuffer),
            }
        }
        Self::from_gltf(doc, &buffers)
    }
}
