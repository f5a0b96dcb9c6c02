//! Tree placement on the island top.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

/// One placed tree, relative to the island top center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePlacement {
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
}

/// Scatter `count` trees in the annulus `[inner_radius, outer_radius)` on the y = 0 plane.
///
/// Azimuths are evenly spaced and jittered by at most a quarter slot, so neighbours
/// can never swap order or overlap the same slot.
pub fn scatter_trees<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    inner_radius: f32,
    outer_radius: f32,
) -> Vec<TreePlacement> {
    let (inner, outer) = if inner_radius <= outer_radius {
        (inner_radius.max(0.0), outer_radius.max(0.0))
    } else {
        (outer_radius.max(0.0), inner_radius.max(0.0))
    };
    let slot = TAU / count.max(1) as f32;
    let start = rng.gen::<f32>() * TAU;

    (0..count)
        .map(|i| {
            let jitter = (rng.gen::<f32>() - 0.5) * 0.5 * slot;
            let angle = start + i as f32 * slot + jitter;
            let radius = inner + rng.gen::<f32>() * (outer - inner);
            TreePlacement {
                position: Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius),
                yaw: rng.gen::<f32>() * TAU,
                scale: 0.8 + rng.gen::<f32>() * 0.4,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn trees_land_inside_annulus() {
        let mut rng = StdRng::seed_from_u64(99);
        let trees = scatter_trees(&mut rng, 3, 1.2, 1.8);
        assert_eq!(trees.len(), 3);
        for t in &trees {
            let r = t.position.length();
            assert!(r >= 1.2 - 1e-4 && r < 1.8 + 1e-4);
            assert_eq!(t.position.y, 0.0);
            assert!(t.scale >= 0.8 && t.scale < 1.2);
        }
    }

    #[test]
    fn trees_are_angularly_separated() {
        let mut rng = StdRng::seed_from_u64(5);
        let trees = scatter_trees(&mut rng, 3, 1.5, 1.5);
        // Min separation with quarter-slot jitter is half a slot (60 degrees) of arc.
        for a in 0..trees.len() {
            for b in (a + 1)..trees.len() {
                let d = trees[a].position.distance(trees[b].position);
                assert!(d > 1.4, "trees {} and {} too close: {}", a, b, d);
            }
        }
    }

    #[test]
    fn swapped_radii_are_tolerated() {
        let mut rng = StdRng::seed_from_u64(1);
        let trees = scatter_trees(&mut rng, 4, 2.0, 1.0);
        assert!(trees.iter().all(|t| (1.0 - 1e-4..2.0 + 1e-4).contains(&t.position.length())));
    }
}
