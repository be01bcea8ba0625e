use eframe::egui::Vec2;

use crate::config::{
    ALPHA_DECAY, ALPHA_MIN, COLLISION_RADIUS, COLLISION_STRENGTH, LINK_DISTANCE, LINK_STRENGTH,
    REPULSION_SOFTENING, REPULSION_STRENGTH, VELOCITY_DECAY,
};

use super::forces::{Collision, Repulsion, collide, repulsion_on};
use super::quadtree::QuadTree;

const BARNES_HUT_THETA: f32 = 0.72;
const GRAVITY: f32 = 0.012;
const MAX_SPEED: f32 = 40.0;

pub(super) struct Body {
    pub(super) position: Vec2,
    pub(super) velocity: Vec2,
    /// Fixed position while a drag holds the node.
    pub(super) pin: Option<Vec2>,
}

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

/// One run of the force simulation over a fixed node/edge set.
pub(super) struct Simulation {
    pub(super) bodies: Vec<Body>,
    pub(super) links: Vec<(usize, usize)>,
    /// Per-link share of the correction applied to the source node.
    link_bias: Vec<f32>,
    pub(super) alpha: f32,
    pub(super) alpha_target: f32,
    scratch: Scratch,
}

impl Simulation {
    pub(super) fn new(bodies: Vec<Body>, links: Vec<(usize, usize)>, alpha: f32) -> Self {
        let mut degree = vec![0usize; bodies.len()];
        for &(source, target) in &links {
            degree[source] += 1;
            degree[target] += 1;
        }
        let link_bias = links
            .iter()
            .map(|&(source, target)| {
                degree[source] as f32 / (degree[source] + degree[target]).max(1) as f32
            })
            .collect();

        Self {
            bodies,
            links,
            link_bias,
            alpha,
            alpha_target: 0.0,
            scratch: Scratch::default(),
        }
    }

    pub(super) fn is_running(&self) -> bool {
        self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN
    }

    pub(super) fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    /// Advances one tick. Returns whether any node moved.
    pub(super) fn step(&mut self, center: Vec2) -> bool {
        if !self.is_running() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
        let alpha = self.alpha;
        let count = self.bodies.len();

        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(count, Vec2::ZERO);
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.bodies.iter().map(|body| body.position));

        if count >= 2
            && let Some(tree) = QuadTree::build(&scratch.positions)
        {
            let repulsion = Repulsion {
                strength: REPULSION_STRENGTH,
                softening: REPULSION_SOFTENING,
                theta: BARNES_HUT_THETA,
            };
            for (index, force) in scratch.forces.iter_mut().enumerate() {
                let mut push = Vec2::ZERO;
                repulsion_on(&tree, index, &scratch.positions, repulsion, &mut push);
                *force += push * alpha;
            }

            collide(
                &tree,
                &tree,
                true,
                &scratch.positions,
                Collision {
                    min_distance: COLLISION_RADIUS * 2.0,
                    strength: COLLISION_STRENGTH,
                },
                &mut scratch.forces,
            );
        }

        for (&(source, target), &bias) in self.links.iter().zip(&self.link_bias) {
            let delta = (self.bodies[target].position + self.bodies[target].velocity)
                - (self.bodies[source].position + self.bodies[source].velocity);
            let distance = delta.length();
            if distance <= 0.0001 {
                continue;
            }
            let stretch = (distance - LINK_DISTANCE) / distance * alpha * LINK_STRENGTH;
            let shift = delta * stretch;
            scratch.forces[target] -= shift * bias;
            scratch.forces[source] += shift * (1.0 - bias);
        }

        for (body, force) in self.bodies.iter().zip(scratch.forces.iter_mut()) {
            *force += (center - body.position) * GRAVITY * alpha;
        }

        let mut moved = false;
        for (body, force) in self.bodies.iter_mut().zip(&scratch.forces) {
            if let Some(pin) = body.pin {
                moved |= body.position != pin;
                body.position = pin;
                body.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (body.velocity + *force) * (1.0 - VELOCITY_DECAY);
            if velocity.length_sq() > MAX_SPEED * MAX_SPEED {
                velocity = velocity.normalized() * MAX_SPEED;
            }
            body.velocity = velocity;
            body.position += velocity;
            moved |= velocity.length_sq() > 1e-6;
        }

        if self.bodies.iter().all(|body| body.pin.is_none()) {
            self.recenter(center);
        }

        moved
    }

    fn recenter(&mut self, center: Vec2) {
        if self.bodies.is_empty() {
            return;
        }

        let centroid = self
            .bodies
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / self.bodies.len() as f32;
        let shift = center - centroid;
        if shift.length_sq() > 1e-6 {
            for body in &mut self.bodies {
                body.position += shift;
            }
        }
    }
}
