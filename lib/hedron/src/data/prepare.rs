//! Normalization passes run on freshly loaded data before it is partitioned.

use std::collections::HashSet;

use super::{DataSet, NodeIndex, Scene};

impl DataSet {
    /// Make sure a valid default scene exists.
    ///
    /// If the default scene is unset (or dangling), the first scene becomes the default. If there
    /// are no scenes at all, one is created from every parentless node.
    pub fn ensure_default_scene(&mut self) -> usize {
        if let Some(index) = self.default_scene.filter(|&i| i < self.scenes.len()) {
            return index;
        }
        if self.scenes.is_empty() {
            let roots = (0..self.nodes.len())
                .filter(|&i| self.nodes[i].parent.is_none())
                .collect();
            tracing::debug!("no scenes in data set; creating one from parentless nodes");
            self.scenes.push(Scene {
                name: None,
                nodes: roots,
            });
        }
        self.default_scene = Some(0);
        0
    }

    /// Which nodes the default scene reaches, indexed by node.
    pub fn reachable_from_default(&self) -> Vec<bool> {
        let mut reached = vec![false; self.nodes.len()];
        for (index, _) in self.instances() {
            reached[index] = true;
        }
        reached
    }

    /// Attach mesh-carrying nodes that the default scene cannot reach.
    ///
    /// The topmost ancestor of each such node becomes a root of the default scene. Returns the
    /// adopted roots.
    pub fn adopt_loose_nodes(&mut self) -> Vec<NodeIndex> {
        let scene = self.ensure_default_scene();
        let reached = self.reachable_from_default();
        let mut adopted = Vec::new();
        for index in 0..self.nodes.len() {
            if reached[index] || self.nodes[index].mesh.is_none() {
                continue;
            }
            let mut root = index;
            for _ in 0..self.nodes.len() {
                match self.nodes[root].parent {
                    Some(p) if p < self.nodes.len() => root = p,
                    _ => break,
                }
            }
            if !adopted.contains(&root) && !reached[root] {
                tracing::warn!(
                    node = self.nodes[root].name.as_deref(),
                    index = root,
                    "attaching loose node to default scene"
                );
                adopted.push(root);
            }
        }
        self.scenes[scene].nodes.extend(&adopted);
        adopted
    }

    /// Give every mesh a unique, non-empty name.
    ///
    /// Unnamed meshes take the name of the first node instantiating them, or `mesh_<index>` if
    /// that node is unnamed too. Repeated names get a `.<n>` suffix, in mesh order.
    pub fn name_meshes(&mut self) {
        for index in 0..self.meshes.len() {
            if !self.meshes[index].name.is_empty() {
                continue;
            }
            let from_node = self
                .owners_of(index)
                .find_map(|n| self.nodes[n].name.clone())
                .filter(|n| !n.is_empty());
            self.meshes[index].name = from_node.unwrap_or_else(|| format!("mesh_{index}"));
        }

        let mut seen = HashSet::with_capacity(self.meshes.len());
        for mesh in &mut self.meshes {
            if seen.insert(mesh.name.clone()) {
                continue;
            }
            let base = mesh.name.clone();
            let mut n = 1usize;
            while !seen.insert(format!("{base}.{n}")) {
                n += 1;
            }
            tracing::debug!(mesh = %base, suffix = n, "renaming duplicate mesh");
            mesh.name = format!("{base}.{n}");
        }
    }

    /// Remove meshes no node references, returning the number removed.
    pub fn prune_meshes(&mut self) -> usize {
        let mut used = vec![false; self.meshes.len()];
        for node in &self.nodes {
            if let Some(m) = node.mesh.filter(|&m| m < used.len()) {
                used[m] = true;
            }
        }

        let mut remap = vec![None; self.meshes.len()];
        let mut next = 0;
        for (old, &keep) in used.iter().enumerate() {
            if keep {
                remap[old] = Some(next);
                next += 1;
            }
        }
        let removed = self.meshes.len() - next;
        if removed == 0 {
            return 0;
        }

        let mut index = 0;
        self.meshes.retain(|_| {
            let keep = used[index];
            index += 1;
            keep
        });
        for node in &mut self.nodes {
            node.mesh = node.mesh.and_then(|m| remap.get(m).copied().flatten());
        }
        tracing::debug!(removed, "pruned unreferenced meshes");
        removed
    }
}
