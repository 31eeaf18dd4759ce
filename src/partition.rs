use std::collections::HashSet;

use hedron::DataSet;

use crate::{
    materialize, pack_by_budget, scene_bounds, size_meshes, size_of_mesh, split_mesh, Aabb, Axis,
    Bin, BinPlan, Error,
};

/// The default byte budget per output document.
pub const DEFAULT_BUDGET: u64 = 40_000_000;

/// What to do with meshes that alone exceed the byte budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverflowPolicy {
    /// Give the mesh a bin of its own, over budget.
    #[default]
    Absorb,
    /// Split the mesh once at the scene's midpoint on the configured axis, then pack the halves.
    Split,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionConfig {
    /// Target byte size of each output
    pub budget: u64,
    /// Axis along which oversized meshes are split
    pub axis: Axis,
    pub overflow: OverflowPolicy,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            axis: Axis::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// The result of partitioning a scene.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Mesh names per output, in output order
    pub bins: Vec<Bin<String>>,
    pub plan: BinPlan,
    /// World-space bounds of the input scene
    pub bounds: Option<Aabb>,
    /// Meshes replaced by their halves
    pub split: Vec<String>,
    /// Indexed primitives dropped while splitting
    pub straddling: usize,
    /// One document per bin
    pub documents: Vec<DataSet>,
}

impl Partition {
    /// Bins whose size exceeds `budget`, by index.
    pub fn over_budget(&self, budget: u64) -> impl Iterator<Item = (usize, &Bin<String>)> + '_ {
        self.bins
            .iter()
            .enumerate()
            .filter(move |(_, b)| b.size > budget)
    }
}

/// Size, pack, and materialize a scene under a byte budget.
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    config: PartitionConfig,
}

impl Partitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Partition `data`, whose meshes must have unique names.
    ///
    /// Nothing is produced unless every step succeeds.
    pub fn partition(&self, data: &DataSet) -> Result<Partition, Error> {
        let PartitionConfig {
            budget,
            axis,
            overflow,
        } = self.config;
        if budget == 0 {
            return Err(Error::ZeroBudget);
        }
        let bounds = scene_bounds(data);

        let mut split = Vec::new();
        let mut straddling = 0;
        let split_data;
        let data = match (overflow, bounds) {
            (OverflowPolicy::Split, Some(bounds)) => {
                split_data = self.split_oversized(data, bounds.mid(axis), &mut split, &mut straddling)?;
                &split_data
            }
            _ => data,
        };

        let sizes = size_meshes(data)?;
        let plan = BinPlan::new(sizes.iter().map(|(_, s)| u128::from(*s)).sum(), budget)?;
        let bins = pack_by_budget(
            sizes.into_iter().map(|(mesh, size)| (mesh.name.clone(), size)),
            budget,
        )?;
        tracing::info!(
            total = %plan.total,
            bins = bins.len(),
            target = %plan.target,
            budget,
            "partitioned meshes"
        );
        for (index, bin) in bins.iter().enumerate() {
            let share = if plan.total == 0 {
                0.0
            } else {
                bin.size as f64 / plan.total as f64
            };
            tracing::debug!(bin = index, meshes = bin.len(), size = bin.size, share, "bin");
        }

        let documents = materialize(data, &bins)?;
        Ok(Partition {
            bins,
            plan,
            bounds,
            split,
            straddling,
            documents,
        })
    }

    /// Replace every mesh larger than the budget by its halves about `mid`.
    ///
    /// Each owner of a split mesh keeps the left half; a sibling copy of the owner takes the
    /// right half. Meshes that lie wholly on one side are left alone. A half whose name is
    /// already taken gets a `.<n>` suffix.
    fn split_oversized(
        &self,
        data: &DataSet,
        mid: f32,
        split: &mut Vec<String>,
        straddling: &mut usize,
    ) -> Result<DataSet, Error> {
        let mut out = data.clone();
        let mut taken: HashSet<String> = data.meshes().iter().map(|m| m.name.clone()).collect();
        for (index, mesh) in data.meshes().iter().enumerate() {
            if size_of_mesh(mesh)? <= self.config.budget {
                continue;
            }
            let halves = split_mesh(mesh, self.config.axis, mid)?;
            let (Some(mut left), Some(mut right)) = (halves.left, halves.right) else {
                tracing::debug!(mesh = %mesh.name, "oversized mesh lies on one side of the split plane");
                continue;
            };
            left.name = unique_name(&mut taken, left.name);
            right.name = unique_name(&mut taken, right.name);
            *straddling += halves.straddling;
            split.push(mesh.name.clone());

            let right = out.add_mesh(right);
            if let Some(slot) = out.mesh_mut(index) {
                *slot = left;
            }
            for owner in data.owners_of(index) {
                out.duplicate_node(owner, Some(right))?;
            }
        }
        if !split.is_empty() {
            tracing::info!(count = split.len(), "split oversized meshes");
        }
        Ok(out)
    }
}

/// Reserve `base` in `taken`, or the first free `<base>.<n>` if it is already in use.
fn unique_name(taken: &mut HashSet<String>, base: String) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{base}.{n}");
        if taken.insert(candidate.clone()) {
            tracing::debug!(mesh = %base, renamed = %candidate, "split half name already in use");
            return candidate;
        }
        n += 1;
    }
}
