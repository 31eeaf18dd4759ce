use std::{fs, io, path::Path};

use binfold::{hedron::DataSet, Partitioner};
use clap::Parser;
use hedron::{de::gltf::DeError, ser::gltf::SerError};

mod buffer;
mod cli;
mod manifest;

use buffer::{BufferCache, BufferError, MappedFile};
use cli::Cli;
use manifest::Manifest;

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("invalid glTF document: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("failed to read glTF document: {0}")]
    Read(#[from] DeError),
    #[error("failed to write GLB document: {0}")]
    Write(#[from] SerError),
    #[error(transparent)]
    Partition(#[from] binfold::Error),
    #[error("failed to write manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error(transparent)]
    Time(#[from] time::error::Format),
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    cli.init_logging();

    let manifest = run(&cli)?;
    tracing::info!(
        outputs = manifest.gltf_out_files.len(),
        warnings = manifest.warnings.len(),
        "done"
    );
    log_memory();
    Ok(())
}

/// Read a glTF or GLB document, memory-mapping its buffers.
#[tracing::instrument]
fn load(path: &Path) -> Result<DataSet, Error> {
    let file = MappedFile::open(path)?;
    let (doc, blob) = if file.starts_with(b"glTF") {
        let glb = gltf::binary::Glb::from_slice(&file)?;
        let root = gltf::json::Root::from_slice(&glb.json).map_err(gltf::Error::Deserialize)?;
        (gltf::Document::from_json(root)?, glb.bin)
    } else {
        let root = gltf::json::Root::from_slice(&file).map_err(gltf::Error::Deserialize)?;
        (gltf::Document::from_json(root)?, None)
    };

    let cache = BufferCache::new(blob.as_deref(), path)?;
    let buffers = cache.buffers(&doc)?;
    let buffers: Vec<&[u8]> = buffers.iter().map(|b| -> &[u8] { b }).collect();
    let data = DataSet::from_gltf(&doc, &buffers)?;
    tracing::info!(
        nodes = data.nodes().len(),
        meshes = data.meshes().len(),
        "loaded document"
    );
    Ok(data)
}

/// Split the input named by `cli`, writing each output and the manifest.
fn run(cli: &Cli) -> Result<Manifest, Error> {
    let mut data = load(&cli.input)?;
    data.ensure_default_scene();
    let adopted = data.adopt_loose_nodes();
    data.name_meshes();
    let pruned = data.prune_meshes();

    let config = cli.partition_config();
    let partition = Partitioner::new(config.clone()).partition(&data)?;

    // encode everything before writing anything, so a failure leaves no partial output set
    let encoded = partition
        .documents
        .iter()
        .map(DataSet::to_glb)
        .collect::<Result<Vec<_>, _>>()?;

    fs::create_dir_all(&cli.output)?;
    let name = cli.output_name();
    let mut files = Vec::with_capacity(encoded.len());
    for (index, glb) in encoded.iter().enumerate() {
        let file = format!("{name}_{index}.glb");
        fs::write(cli.output.join(&file), glb)?;
        tracing::info!(%file, bytes = glb.len(), "wrote output");
        files.push(file);
    }

    let mut manifest = Manifest::new(&cli.input, &data, &partition, config.budget, files)?;
    if !adopted.is_empty() {
        manifest.warn(format!(
            "{} node tree(s) outside the default scene were attached to it",
            adopted.len()
        ));
    }
    if pruned > 0 {
        manifest.warn(format!("{pruned} unreferenced mesh(es) were dropped"));
    }
    for mesh in &partition.split {
        manifest.warn(format!("mesh {mesh:?} exceeded the budget and was split"));
    }
    if partition.straddling > 0 {
        manifest.warn(format!(
            "{} primitive(s) straddling a split plane were dropped",
            partition.straddling
        ));
    }
    for (index, bin) in partition.over_budget(config.budget) {
        tracing::warn!(bin = index, size = bin.size, budget = config.budget, "output exceeds budget");
        manifest.warn(format!(
            "{} holds {} bytes, over the {} byte budget",
            manifest.gltf_out_files[index], bin.size, config.budget
        ));
    }

    let path = cli.output.join(format!("{name}.manifest.json"));
    fs::write(&path, serde_json::to_vec_pretty(&manifest)?)?;
    tracing::info!(path = %path.display(), "wrote manifest");
    Ok(manifest)
}

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
fn log_memory() {
    use tikv_jemalloc_ctl::{epoch, stats};
    if epoch::advance().is_err() {
        return;
    }
    if let (Ok(allocated), Ok(resident)) = (stats::allocated::read(), stats::resident::read()) {
        tracing::debug!(allocated, resident, "memory usage");
    }
}

#[cfg(not(all(feature = "jemalloc", not(target_env = "msvc"))))]
fn log_memory() {}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use binfold::hedron::{
        primitive::{
            attribute::{Attribute, AttributeType, AttributeUsage},
            Mode, Primitive,
        },
        Mesh, Node, Scene,
    };

    use super::*;

    /// A scene of `count` point meshes, each of 4 vertices (48 bytes of positions).
    fn scene(count: usize) -> DataSet {
        let mut data = DataSet::empty();
        let scene = data.add_scene(Scene::default());
        data.default_scene = Some(scene);
        for i in 0..count {
            let x = i as f32 * 10.0;
            let positions = vec![x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0, x + 1.0, 1.0, 0.0];
            let prim = Primitive::new(Mode::Points).with_attr(
                AttributeUsage::Position,
                Attribute::new(AttributeType::Vec3, positions).unwrap(),
            );
            let mesh = data.add_mesh(Mesh::new(format!("m{i}")).with_primitive(prim));
            let node = data.add_node(Node::named(format!("n{i}")).with_mesh(mesh));
            data.add_root(scene, node).unwrap();
        }
        data
    }

    fn cli(input: &Path, output: &Path, extra: &[&str]) -> Cli {
        let mut args = vec![
            "glb-split".to_owned(),
            input.display().to_string(),
            "-o".to_owned(),
            output.display().to_string(),
        ];
        args.extend(extra.iter().map(|&s| s.to_owned()));
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["glb-split", "dir/scene.glb"]).unwrap();
        assert_eq!(cli.threshold, binfold::DEFAULT_BUDGET);
        assert_eq!(cli.axis, binfold::Axis::Y);
        assert_eq!(cli.output, PathBuf::from("./"));
        assert_eq!(cli.output_name(), "scene");
        assert_eq!(cli.partition_config(), binfold::PartitionConfig::default());
    }

    #[test]
    fn splits_glb_into_budgeted_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.glb");
        fs::write(&input, scene(3).to_glb().unwrap()).unwrap();
        let out = dir.path().join("out");

        let manifest = run(&cli(&input, &out, &["-m", "100"])).unwrap();
        assert_eq!(manifest.gltf_out_files, vec!["scene_0.glb", "scene_1.glb"]);
        assert_eq!(manifest.num_gltf_meshes, 3);
        assert_eq!(manifest.total_attribute_bytes, 144);
        assert_eq!(manifest.model_bounds_max, Some([21.0, 1.0, 0.0]));
        assert!(manifest.warnings.is_empty());

        let first = load(&out.join("scene_0.glb")).unwrap();
        let names: Vec<_> = first.meshes().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["m0", "m1"]);
        let second = load(&out.join("scene_1.glb")).unwrap();
        assert_eq!(second.meshes()[0].name, "m2");

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join("scene.manifest.json")).unwrap()).unwrap();
        assert_eq!(written["converterApplication"], "glb-split");
        assert_eq!(written["bins"][1]["meshes"][0], "m2");
        assert_eq!(written["budget"], 100);
    }

    #[test]
    fn reads_gltf_with_external_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let (mut json, bin) = scene(2).to_gltf_json().unwrap();
        json["buffers"][0]["uri"] = "scene.bin".into();
        fs::write(dir.path().join("scene.bin"), bin).unwrap();
        let input = dir.path().join("scene.gltf");
        fs::write(&input, serde_json::to_vec(&json).unwrap()).unwrap();

        let data = load(&input).unwrap();
        assert_eq!(data.meshes().len(), 2);
        assert_eq!(data.vertex_count(), 8);
    }

    #[test]
    fn rejects_non_file_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let (mut json, _) = scene(1).to_gltf_json().unwrap();
        json["buffers"][0]["uri"] = "https://example.com/scene.bin".into();
        let input = dir.path().join("scene.gltf");
        fs::write(&input, serde_json::to_vec(&json).unwrap()).unwrap();

        assert!(matches!(
            load(&input),
            Err(Error::Buffer(BufferError::UnsupportedUriScheme(scheme))) if scheme == "https"
        ));
    }

    #[test]
    fn oversized_meshes_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("big.glb");
        fs::write(&input, scene(1).to_glb().unwrap()).unwrap();
        let out = dir.path().join("out");

        let manifest = run(&cli(&input, &out, &["-m", "10", "-n", "piece"])).unwrap();
        assert_eq!(manifest.gltf_out_files, vec!["piece_0.glb"]);
        assert_eq!(manifest.warnings.len(), 1);
        assert!(out.join("piece.manifest.json").exists());

        let out = dir.path().join("split");
        let manifest = run(&cli(
            &input,
            &out,
            &["-m", "30", "--split-oversized", "-a", "x"],
        ))
        .unwrap();
        assert_eq!(manifest.gltf_out_files.len(), 2);
        let meshes: Vec<_> = manifest.bins.iter().flat_map(|b| b.meshes.clone()).collect();
        assert_eq!(meshes, vec!["m0.left", "m0.right"]);
    }
}
