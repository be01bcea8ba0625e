use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadTree;

#[derive(Clone, Copy)]
pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct Collision {
    /// Centers closer than this are pushed apart.
    pub(super) min_distance: f32,
    pub(super) strength: f32,
}

/// Direction from `b` to `a`, with a deterministic fallback for coincident points.
fn separation(a: Vec2, b: Vec2, a_index: usize, b_index: usize) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance > 0.0001 {
        return (delta / distance, distance);
    }

    let angle =
        ((a_index as f32) * 0.618_034 + (b_index as f32) * 0.414_214) * std::f32::consts::TAU;
    (vec2(angle.cos(), angle.sin()), 0.0)
}

fn inverse_square(delta: Vec2, mass: f32, params: Repulsion) -> Vec2 {
    let distance_sq = delta.length_sq();
    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (params.strength * mass / (distance_sq + params.softening))
}

/// Adds the many-body repulsion felt by node `index`, approximating distant clusters by their
/// centroid.
pub(super) fn repulsion_on(
    tree: &QuadTree,
    index: usize,
    positions: &[Vec2],
    params: Repulsion,
    force: &mut Vec2,
) {
    if tree.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if tree.is_leaf() {
        for &other in &tree.members {
            if other != index {
                *force += inverse_square(point - positions[other], 1.0, params);
            }
        }
        return;
    }

    let delta = point - tree.centroid;
    let distance = delta.length().max(0.01);
    let far_enough = !tree.region.contains(point)
        && tree.mass > 1.0
        && tree.region.side() / distance < params.theta;
    if far_enough {
        *force += inverse_square(delta, tree.mass, params);
        return;
    }

    for child in &tree.children {
        repulsion_on(child, index, positions, params, force);
    }
}

fn push_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    params: Collision,
    forces: &mut [Vec2],
) {
    let (direction, distance) = separation(positions[from], positions[to], from, to);
    if distance < params.min_distance {
        let push = direction * (params.min_distance - distance) * params.strength * 0.5;
        forces[from] += push;
        forces[to] -= push;
    }
}

/// Pushes apart every pair of nodes closer than the collision distance. Subtrees further apart
/// than that distance are pruned.
pub(super) fn collide(
    a: &QuadTree,
    b: &QuadTree,
    same: bool,
    positions: &[Vec2],
    params: Collision,
    forces: &mut [Vec2],
) {
    if a.region.gap_sq(b.region) > params.min_distance * params.min_distance {
        return;
    }

    match (a.is_leaf(), b.is_leaf()) {
        (true, true) if same => {
            for (offset, &from) in a.members.iter().enumerate() {
                for &to in &a.members[offset + 1..] {
                    push_pair(from, to, positions, params, forces);
                }
            }
        }
        (true, true) => {
            for &from in &a.members {
                for &to in &b.members {
                    push_pair(from, to, positions, params, forces);
                }
            }
        }
        _ if same => {
            for (offset, first) in a.children.iter().enumerate() {
                collide(first, first, true, positions, params, forces);
                for second in &a.children[offset + 1..] {
                    collide(first, second, false, positions, params, forces);
                }
            }
        }
        (false, true) => {
            for child in &a.children {
                collide(child, b, false, positions, params, forces);
            }
        }
        (true, false) => {
            for child in &b.children {
                collide(a, child, false, positions, params, forces);
            }
        }
        (false, false) => {
            if a.region.half >= b.region.half {
                for child in &a.children {
                    collide(child, b, false, positions, params, forces);
                }
            } else {
                for child in &b.children {
                    collide(a, child, false, positions, params, forces);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPULSION: Repulsion = Repulsion {
        strength: 60_000.0,
        softening: 620.0,
        theta: 0.72,
    };

    fn brute_force_repulsion(positions: &[Vec2], index: usize) -> Vec2 {
        positions
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .fold(Vec2::ZERO, |sum, (_, other)| {
                sum + inverse_square(positions[index] - *other, 1.0, REPULSION)
            })
    }

    #[test]
    fn repulsion_matches_exact_sum_for_small_sets() {
        let positions = vec![
            vec2(0.0, 0.0),
            vec2(100.0, 0.0),
            vec2(0.0, 80.0),
            vec2(-60.0, -40.0),
        ];
        let tree = QuadTree::build(&positions).expect("tree");

        for index in 0..positions.len() {
            let mut force = Vec2::ZERO;
            repulsion_on(&tree, index, &positions, REPULSION, &mut force);
            let exact = brute_force_repulsion(&positions, index);
            assert!((force - exact).length() < 1e-3, "{force:?} vs {exact:?}");
        }
    }

    #[test]
    fn collision_separates_overlapping_nodes_only() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(500.0, 0.0)];
        let tree = QuadTree::build(&positions).expect("tree");
        let mut forces = vec![Vec2::ZERO; positions.len()];
        let params = Collision {
            min_distance: 92.0,
            strength: 0.7,
        };

        collide(&tree, &tree, true, &positions, params, &mut forces);

        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
        assert_eq!(forces[2], Vec2::ZERO);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }
}
