use std::path::Path;

use binfold::{hedron::DataSet, Partition};
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Summary of one conversion, written next to its outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub input_file: String,
    pub converter_application: &'static str,
    pub converter_application_version: &'static str,
    pub conversion_date: String,
    pub gltf_out_files: Vec<String>,
    pub num_gltf_nodes: usize,
    pub num_gltf_meshes: usize,
    pub num_gltf_accessors: usize,
    pub num_gltf_vertices: usize,
    pub total_attribute_bytes: u128,
    pub budget: u64,
    pub model_bounds_min: Option<[f32; 3]>,
    pub model_bounds_max: Option<[f32; 3]>,
    pub bins: Vec<ManifestBin>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestBin {
    pub file: String,
    pub meshes: Vec<String>,
    pub size: u64,
}

impl Manifest {
    /// Describe `partition` of `input`, whose outputs were written as `files`.
    pub fn new(
        input: &Path,
        data: &DataSet,
        partition: &Partition,
        budget: u64,
        files: Vec<String>,
    ) -> Result<Self, time::error::Format> {
        let bins = partition
            .bins
            .iter()
            .zip(&files)
            .map(|(bin, file)| ManifestBin {
                file: file.clone(),
                meshes: bin.items.clone(),
                size: bin.size,
            })
            .collect();
        Ok(Self {
            input_file: input.display().to_string(),
            converter_application: env!("CARGO_PKG_NAME"),
            converter_application_version: env!("CARGO_PKG_VERSION"),
            conversion_date: OffsetDateTime::now_utc().format(&Rfc3339)?,
            gltf_out_files: files,
            num_gltf_nodes: data.nodes().len(),
            num_gltf_meshes: data.meshes().len(),
            num_gltf_accessors: data.accessor_count(),
            num_gltf_vertices: data.vertex_count(),
            total_attribute_bytes: partition.plan.total,
            budget,
            model_bounds_min: partition.bounds.map(|b| b.mins.into()),
            model_bounds_max: partition.bounds.map(|b| b.maxs.into()),
            bins,
            warnings: Vec::new(),
        })
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
