//! Utilities for serializing a [DataSet] as binary glTF.
//!
//! Every accessor gets its own buffer view, and all views share the one GLB binary chunk. Index
//! lists are narrowed to `u16` when every index fits.
//!
//! # See Also
//!
//! * [GLB File Format Specification](https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html#glb-file-format-specification)

use serde_json::{json, Map, Value};

use crate::{
    primitive::{
        attribute::{Attribute, AttributeError, AttributeUsage},
        Mode, Primitive,
    },
    Camera, DataSet, Image, ImageSource, Material, Mesh, Node, Projection, Sampler, Scene,
    Texture, TextureRef,
};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;

#[derive(Debug, thiserror::Error)]
pub enum SerError {
    #[error("attribute {semantic} of mesh {mesh:?} has a component type glTF cannot store")]
    UnsupportedComponent { mesh: String, semantic: String },
    #[error("invalid attribute {semantic} of mesh {mesh:?}")]
    Attribute {
        mesh: String,
        semantic: String,
        #[source]
        source: AttributeError,
    },
    #[error("GLB output of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(usize),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Pad `buf` with `byte` to a multiple of 4 bytes.
fn pad(buf: &mut Vec<u8>, byte: u8) {
    buf.resize(buf.len().next_multiple_of(4), byte);
}

/// Insert `items` under `key`, unless there are none; glTF forbids empty top-level arrays.
fn insert_list(obj: &mut Map<String, Value>, key: &str, items: Vec<Value>) {
    if !items.is_empty() {
        obj.insert(key.to_owned(), Value::Array(items));
    }
}

fn insert_opt<T: Into<Value>>(obj: &mut Map<String, Value>, key: &str, val: Option<T>) {
    if let Some(val) = val {
        obj.insert(key.to_owned(), val.into());
    }
}

/// Collects the binary chunk along with the views and accessors describing it.
#[derive(Debug, Default)]
struct BinWriter {
    bin: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl BinWriter {
    fn push_view(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        pad(&mut self.bin, 0);
        let mut view = Map::new();
        view.insert("buffer".into(), json!(0));
        view.insert("byteOffset".into(), json!(self.bin.len()));
        view.insert("byteLength".into(), json!(bytes.len()));
        insert_opt(&mut view, "target", target);
        self.bin.extend_from_slice(bytes);
        self.views.push(Value::Object(view));
        self.views.len() - 1
    }

    fn push_attribute(
        &mut self,
        mesh: &Mesh,
        usage: &AttributeUsage,
        attr: &Attribute,
    ) -> Result<usize, SerError> {
        let component_type =
            attr.component()
                .to_gltf()
                .ok_or_else(|| SerError::UnsupportedComponent {
                    mesh: mesh.name.clone(),
                    semantic: usage.to_string(),
                })?;
        attr.byte_length().map_err(|source| SerError::Attribute {
            mesh: mesh.name.clone(),
            semantic: usage.to_string(),
            source,
        })?;

        let view = self.push_view(attr.data.as_bytes(), Some(ARRAY_BUFFER));
        let mut acc = Map::new();
        acc.insert("bufferView".into(), json!(view));
        acc.insert("componentType".into(), json!(component_type));
        acc.insert("count".into(), json!(attr.vertex_count()));
        acc.insert("type".into(), json!(attr.ty.to_gltf()));
        if attr.normalized {
            acc.insert("normalized".into(), json!(true));
        }
        // required on positions by the glTF spec
        if *usage == AttributeUsage::Position {
            if let Some((min, max)) = attr.bounds() {
                acc.insert("min".into(), json!(min));
                acc.insert("max".into(), json!(max));
            }
        }
        self.accessors.push(Value::Object(acc));
        Ok(self.accessors.len() - 1)
    }

    fn push_indices(&mut self, indices: &[u32]) -> usize {
        let narrow = indices.iter().all(|&i| i <= u32::from(u16::MAX));
        let (bytes, component_type): (Vec<u8>, _) = if narrow {
            let bytes = indices
                .iter()
                .flat_map(|&i| (i as u16).to_le_bytes())
                .collect();
            (bytes, COMPONENT_U16)
        } else {
            let bytes = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
            (bytes, COMPONENT_U32)
        };
        let view = self.push_view(&bytes, Some(ELEMENT_ARRAY_BUFFER));
        self.accessors.push(json!({
            "bufferView": view,
            "componentType": component_type,
            "count": indices.len(),
            "type": "SCALAR",
        }));
        self.accessors.len() - 1
    }

    fn primitive(&mut self, mesh: &Mesh, prim: &Primitive) -> Result<Value, SerError> {
        let mut attributes = Map::new();
        for (usage, attr) in &prim.attributes {
            let acc = self.push_attribute(mesh, usage, attr)?;
            attributes.insert(usage.to_string(), json!(acc));
        }
        let mut res = Map::new();
        res.insert("attributes".into(), Value::Object(attributes));
        insert_opt(
            &mut res,
            "indices",
            prim.indices.as_deref().map(|i| self.push_indices(i)),
        );
        insert_opt(&mut res, "material", prim.material);
        if prim.mode != Mode::Triangles {
            res.insert("mode".into(), json!(prim.mode.to_gltf()));
        }
        Ok(Value::Object(res))
    }

    fn image(&mut self, image: &Image) -> Value {
        let mut res = Map::new();
        insert_opt(&mut res, "name", image.name.clone());
        match &image.source {
            ImageSource::Bytes(bytes) => {
                let view = self.push_view(bytes, None);
                res.insert("bufferView".into(), json!(view));
                // a view-backed image must declare its type
                let mime = image.mime_type.clone().unwrap_or_else(|| sniff_mime(bytes).to_owned());
                res.insert("mimeType".into(), json!(mime));
            }
            ImageSource::Uri(uri) => {
                res.insert("uri".into(), json!(uri));
                insert_opt(&mut res, "mimeType", image.mime_type.clone());
            }
        }
        Value::Object(res)
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else {
        "image/jpeg"
    }
}

fn scene(scene: &Scene) -> Value {
    let mut res = Map::new();
    insert_opt(&mut res, "name", scene.name.clone());
    res.insert("nodes".into(), json!(scene.nodes));
    Value::Object(res)
}

fn node(node: &Node) -> Value {
    let mut res = Map::new();
    insert_opt(&mut res, "name", node.name.clone());
    if !node.children.is_empty() {
        res.insert("children".into(), json!(node.children));
    }
    if node.transform != nalgebra::Matrix4::identity() {
        // column-major, as glTF expects
        res.insert("matrix".into(), json!(node.transform.as_slice()));
    }
    insert_opt(&mut res, "mesh", node.mesh);
    insert_opt(&mut res, "camera", node.camera);
    Value::Object(res)
}

fn camera(camera: &Camera) -> Value {
    let mut res = Map::new();
    insert_opt(&mut res, "name", camera.name.clone());
    match camera.projection {
        Projection::Perspective {
            aspect_ratio,
            yfov,
            znear,
            zfar,
        } => {
            let mut p = Map::new();
            insert_opt(&mut p, "aspectRatio", aspect_ratio);
            p.insert("yfov".into(), json!(yfov));
            p.insert("znear".into(), json!(znear));
            insert_opt(&mut p, "zfar", zfar);
            res.insert("type".into(), json!("perspective"));
            res.insert("perspective".into(), Value::Object(p));
        }
        Projection::Orthographic {
            xmag,
            ymag,
            znear,
            zfar,
        } => {
            res.insert("type".into(), json!("orthographic"));
            res.insert(
                "orthographic".into(),
                json!({ "xmag": xmag, "ymag": ymag, "znear": znear, "zfar": zfar }),
            );
        }
    }
    Value::Object(res)
}

fn texture_info(tex: &TextureRef) -> Map<String, Value> {
    let mut res = Map::new();
    res.insert("index".into(), json!(tex.texture));
    if tex.tex_coord != 0 {
        res.insert("texCoord".into(), json!(tex.tex_coord));
    }
    res
}

fn material(m: &Material) -> Value {
    let mut pbr = Map::new();
    pbr.insert("baseColorFactor".into(), json!(m.base_color_factor));
    pbr.insert("metallicFactor".into(), json!(m.metallic_factor));
    pbr.insert("roughnessFactor".into(), json!(m.roughness_factor));
    insert_opt(&mut pbr, "baseColorTexture", m.base_color_texture.as_ref().map(texture_info));
    insert_opt(
        &mut pbr,
        "metallicRoughnessTexture",
        m.metallic_roughness_texture.as_ref().map(texture_info),
    );

    let mut res = Map::new();
    insert_opt(&mut res, "name", m.name.clone());
    res.insert("pbrMetallicRoughness".into(), Value::Object(pbr));
    if let Some(tex) = &m.normal_texture {
        let mut info = texture_info(tex);
        info.insert("scale".into(), json!(m.normal_scale));
        res.insert("normalTexture".into(), Value::Object(info));
    }
    if let Some(tex) = &m.occlusion_texture {
        let mut info = texture_info(tex);
        info.insert("strength".into(), json!(m.occlusion_strength));
        res.insert("occlusionTexture".into(), Value::Object(info));
    }
    insert_opt(&mut res, "emissiveTexture", m.emissive_texture.as_ref().map(texture_info));
    res.insert("emissiveFactor".into(), json!(m.emissive_factor));
    res.insert("alphaMode".into(), json!(m.alpha_mode.to_gltf()));
    insert_opt(&mut res, "alphaCutoff", m.alpha_cutoff);
    if m.double_sided {
        res.insert("doubleSided".into(), json!(true));
    }
    Value::Object(res)
}

fn texture(t: &Texture) -> Value {
    let mut res = Map::new();
    insert_opt(&mut res, "name", t.name.clone());
    insert_opt(&mut res, "sampler", t.sampler);
    res.insert("source".into(), json!(t.source));
    Value::Object(res)
}

fn sampler(s: &Sampler) -> Value {
    let mut res = Map::new();
    insert_opt(&mut res, "name", s.name.clone());
    insert_opt(&mut res, "magFilter", s.mag_filter);
    insert_opt(&mut res, "minFilter", s.min_filter);
    res.insert("wrapS".into(), json!(s.wrap_s));
    res.insert("wrapT".into(), json!(s.wrap_t));
    Value::Object(res)
}

impl DataSet {
    /// Build the glTF JSON document for this data set, along with the binary buffer it refers to.
    pub fn to_gltf_json(&self) -> Result<(Value, Vec<u8>), SerError> {
        let mut writer = BinWriter::default();

        let mut meshes = Vec::with_capacity(self.meshes.len());
        for mesh in &self.meshes {
            let primitives = mesh
                .primitives
                .iter()
                .map(|p| writer.primitive(mesh, p))
                .collect::<Result<Vec<_>, _>>()?;
            meshes.push(json!({ "name": mesh.name, "primitives": primitives }));
        }
        let images = self.images.iter().map(|i| writer.image(i)).collect();

        let mut root = Map::new();
        root.insert(
            "asset".into(),
            json!({
                "version": "2.0",
                "generator": concat!("hedron ", env!("CARGO_PKG_VERSION")),
            }),
        );
        insert_opt(&mut root, "scene", self.default_scene);
        insert_list(&mut root, "scenes", self.scenes.iter().map(scene).collect());
        insert_list(&mut root, "nodes", self.nodes.iter().map(node).collect());
        insert_list(&mut root, "meshes", meshes);
        insert_list(&mut root, "cameras", self.cameras.iter().map(camera).collect());
        insert_list(&mut root, "materials", self.materials.iter().map(material).collect());
        insert_list(&mut root, "textures", self.textures.iter().map(texture).collect());
        insert_list(&mut root, "samplers", self.samplers.iter().map(sampler).collect());
        insert_list(&mut root, "images", images);
        insert_list(&mut root, "accessors", writer.accessors);
        insert_list(&mut root, "bufferViews", writer.views);
        if !writer.bin.is_empty() {
            root.insert(
                "buffers".into(),
                json!([{ "byteLength": writer.bin.len() }]),
            );
        }
        Ok((Value::Object(root), writer.bin))
    }

    /// Encode this data set as a self-contained GLB file.
    pub fn to_glb(&self) -> Result<Vec<u8>, SerError> {
        let (doc, mut bin) = self.to_gltf_json()?;
        let mut json = serde_json::to_vec(&doc)?;
        pad(&mut json, b' ');
        pad(&mut bin, 0);

        let mut total = GLB_HEADER_LEN + CHUNK_HEADER_LEN + json.len();
        if !bin.is_empty() {
            total += CHUNK_HEADER_LEN + bin.len();
        }
        let total_u32 = u32::try_from(total).map_err(|_| SerError::TooLarge(total))?;

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&total_u32.to_le_bytes());
        // chunk lengths fit, as the total does
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            out.extend_from_slice(&bin);
        }
        tracing::trace!(bytes = out.len(), "encoded GLB");
        Ok(out)
    }
}
