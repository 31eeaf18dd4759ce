//! Serialization of scene data to various storage formats.

#[cfg(feature = "ser_gltf")]
pub mod gltf;
