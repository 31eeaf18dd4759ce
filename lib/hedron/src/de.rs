//! Deserialization of scene data from various storage formats.

#[cfg(feature = "de_gltf")]
pub mod gltf;
