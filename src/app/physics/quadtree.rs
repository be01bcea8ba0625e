use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square region of the world.
#[derive(Clone, Copy, Debug)]
pub(super) struct Square {
    pub(super) center: Vec2,
    pub(super) half: f32,
}

impl Square {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (
                vec2(f32::INFINITY, f32::INFINITY),
                vec2(f32::NEG_INFINITY, f32::NEG_INFINITY),
            ),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );

        if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half: span.max_elem() * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        (point.x - self.center.x).abs() <= self.half && (point.y - self.center.y).abs() <= self.half
    }

    pub(super) fn side(self) -> f32 {
        self.half * 2.0
    }

    fn quadrant(self, index: usize) -> Self {
        let quarter = self.half * 0.5;
        let dx = if index & 1 == 0 { -quarter } else { quarter };
        let dy = if index & 2 == 0 { -quarter } else { quarter };
        Self {
            center: self.center + vec2(dx, dy),
            half: quarter,
        }
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    /// Squared gap between two squares; zero when they overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half + other.half;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }
}

/// Barnes-Hut quadtree over a slice of node positions. Leaves hold node indices.
pub(super) struct QuadTree {
    pub(super) region: Square,
    pub(super) centroid: Vec2,
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    pub(super) children: Vec<QuadTree>,
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let region = Square::enclosing(positions)?;
        Some(Self::subdivide(
            region,
            (0..positions.len()).collect(),
            positions,
            0,
        ))
    }

    fn subdivide(region: Square, members: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = members.len() as f32;
        let centroid = if members.is_empty() {
            region.center
        } else {
            members
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut tree = Self {
            region,
            centroid,
            mass,
            members,
            children: Vec::new(),
        };
        if depth >= MAX_DEPTH || tree.members.len() <= LEAF_CAPACITY {
            return tree;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &tree.members {
            buckets[region.quadrant_of(positions[index])].push(index);
        }
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            // Coincident points: splitting would never separate them.
            return tree;
        }

        tree.children = buckets
            .into_iter()
            .enumerate()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(quadrant, bucket)| {
                Self::subdivide(region.quadrant(quadrant), bucket, positions, depth + 1)
            })
            .collect();
        tree.members.clear();
        tree
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
