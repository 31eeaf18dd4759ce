//! Bounding volumes in the world space of a scene.

mod axis;
mod bounding_box;

pub use axis::*;
pub use bounding_box::*;

use hedron::DataSet;
use nalgebra::Point3;

/// The world-space bounds of every vertex of every mesh instance reachable from the default
/// scene, or `None` if there are no such vertices.
pub fn scene_bounds(data: &DataSet) -> Option<Aabb> {
    let mut res: Option<Aabb> = None;
    for (node, world) in data.instances() {
        let Some(mesh) = data.nodes()[node].mesh.and_then(|m| data.mesh(m)) else {
            continue;
        };
        for prim in mesh.primitives() {
            let Some(pos) = prim.position().filter(|p| p.width() >= 3) else {
                continue;
            };
            let points = (0..pos.vertex_count()).map(|v| {
                world.transform_point(&Point3::new(
                    pos.get_f32(v, 0),
                    pos.get_f32(v, 1),
                    pos.get_f32(v, 2),
                ))
            });
            if let Some(bounds) = Aabb::from_points(points) {
                match &mut res {
                    Some(res) => res.merge(&bounds),
                    None => res = Some(bounds),
                }
            }
        }
    }
    res
}
