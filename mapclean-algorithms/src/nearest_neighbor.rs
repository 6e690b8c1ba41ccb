//! Radius neighbor search implementations

use mapclean_core::{validate_radius, Point3d, PointCloud, RadiusSearch, Result, Spatial};

/// Maximum number of points stored in a leaf bucket.
///
/// A leaf may exceed this when all of its points share one position, since
/// such a bucket cannot be split.
pub const LEAF_SIZE: usize = 16;

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// Balanced 3-d tree for fixed-radius queries.
///
/// Built once by median partitioning along the axis of widest spread, then
/// read-only. Coordinates are stored in leaf order so a bucket scan walks
/// contiguous memory; `indices` maps each stored slot back to the position
/// of the point in the input sequence.
#[derive(Debug, Clone)]
pub struct KdTree {
    coords: Vec<[f64; 3]>,
    indices: Vec<usize>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl KdTree {
    /// Build a tree over `points`. An empty slice gives an empty tree.
    pub fn build(points: &[Point3d]) -> Self {
        let input: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
        let mut order: Vec<usize> = (0..input.len()).collect();
        let mut nodes = Vec::new();

        let root = if input.is_empty() {
            None
        } else {
            Some(build_node(&input, &mut order, 0, &mut nodes))
        };

        let coords = order.iter().map(|&i| input[i]).collect();

        Self {
            coords,
            indices: order,
            nodes,
            root,
        }
    }

    /// Build a tree over the positions of any spatial point cloud
    pub fn from_cloud<T: Spatial>(cloud: &PointCloud<T>) -> Self {
        Self::build(&cloud.positions())
    }

    /// Number of tree nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Call `visit` with the slot of every stored point within `radius` of `query`
    fn for_each_within<F: FnMut(usize)>(&self, query: &Point3d, radius: f64, mut visit: F) {
        let Some(root) = self.root else {
            return;
        };
        let q = [query.x, query.y, query.z];
        let radius_sq = radius * radius;

        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.nodes[node] {
                Node::Leaf { start, end } => {
                    for slot in start..end {
                        if squared_distance(&self.coords[slot], &q) <= radius_sq {
                            visit(slot);
                        }
                    }
                }
                Node::Split { axis, value, left, right } => {
                    // Left holds coordinates <= value, right holds >= value.
                    let diff = q[axis] - value;
                    let (near, far) = if diff <= 0.0 { (left, right) } else { (right, left) };
                    if diff * diff <= radius_sq {
                        stack.push(far);
                    }
                    stack.push(near);
                }
            }
        }
    }
}

impl RadiusSearch for KdTree {
    fn len(&self) -> usize {
        self.coords.len()
    }

    fn query_radius(&self, query: &Point3d, radius: f64) -> Result<Vec<usize>> {
        validate_radius(radius)?;
        let mut found = Vec::new();
        self.for_each_within(query, radius, |slot| found.push(self.indices[slot]));
        Ok(found)
    }

    fn count_within(&self, query: &Point3d, radius: f64) -> Result<usize> {
        validate_radius(radius)?;
        let mut count = 0;
        self.for_each_within(query, radius, |_| count += 1);
        Ok(count)
    }
}

fn build_node(
    coords: &[[f64; 3]],
    order: &mut [usize],
    offset: usize,
    nodes: &mut Vec<Node>,
) -> usize {
    let len = order.len();
    let split_axis = if len > LEAF_SIZE {
        widest_axis(coords, order)
    } else {
        None
    };

    let Some(axis) = split_axis else {
        nodes.push(Node::Leaf {
            start: offset,
            end: offset + len,
        });
        return nodes.len() - 1;
    };

    let mid = len / 2;
    order.select_nth_unstable_by(mid, |&a, &b| coords[a][axis].total_cmp(&coords[b][axis]));
    let value = coords[order[mid]][axis];

    // Reserve the slot so the parent precedes its children
    let slot = nodes.len();
    nodes.push(Node::Leaf { start: 0, end: 0 });

    let (lower, upper) = order.split_at_mut(mid);
    let left = build_node(coords, lower, offset, nodes);
    let right = build_node(coords, upper, offset + mid, nodes);
    nodes[slot] = Node::Split { axis, value, left, right };
    slot
}

/// Axis with the largest extent, or `None` when every point coincides
fn widest_axis(coords: &[[f64; 3]], order: &[usize]) -> Option<usize> {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for &i in order {
        for axis in 0..3 {
            min[axis] = min[axis].min(coords[i][axis]);
            max[axis] = max[axis].max(coords[i][axis]);
        }
    }

    (0..3)
        .map(|axis| (axis, max[axis] - min[axis]))
        .filter(|(_, spread)| *spread > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(axis, _)| axis)
}

#[inline]
fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Simple brute force search for small datasets and as a reference
pub struct BruteForceSearch {
    points: Vec<[f64; 3]>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Self {
        Self {
            points: points.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }
}

impl RadiusSearch for BruteForceSearch {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn query_radius(&self, query: &Point3d, radius: f64) -> Result<Vec<usize>> {
        validate_radius(radius)?;
        let q = [query.x, query.y, query.z];
        let radius_sq = radius * radius;
        Ok(self
            .points
            .iter()
            .enumerate()
            .filter(|(_, point)| squared_distance(point, &q) <= radius_sq)
            .map(|(idx, _)| idx)
            .collect())
    }
}
