//! # Quad tree over flat points
//!
//! A point-region quad tree used to find, for every trace point, the other points within
//! the loop-closure range without comparing all pairs.
//!
//! Nodes live in an arena (`Vec`) and refer to their children by index. The root square
//! starts around the first inserted point and doubles towards any point that falls outside
//! of it, so the tree never needs to know the extent of the data up front.

use crate::geo::FlatGeoPoint;

/// Maximum number of items in a leaf before it is split.
const LEAF_CAPACITY: usize = 16;

/// Half-open square `[x, x + size) × [y, y + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quad {
    x: i64,
    y: i64,
    size: i64,
}

impl Quad {
    fn contains(&self, point: &FlatGeoPoint) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        px >= self.x && px < self.x + self.size && py >= self.y && py < self.y + self.size
    }

    /// Index of the child quadrant holding `point`: bit 0 for east, bit 1 for north.
    fn quadrant(&self, point: &FlatGeoPoint) -> usize {
        let half = self.size / 2;
        usize::from(i64::from(point.x) >= self.x + half) | (usize::from(i64::from(point.y) >= self.y + half) << 1)
    }

    fn child(&self, quadrant: usize) -> Quad {
        let half = self.size / 2;
        Quad {
            x: self.x + if quadrant & 1 != 0 { half } else { 0 },
            y: self.y + if quadrant & 2 != 0 { half } else { 0 },
            size: half,
        }
    }

    /// Squared distance from `point` to the closest point of the square.
    fn distance_squared(&self, point: &FlatGeoPoint) -> u64 {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let dx = (self.x - px).max(px - (self.x + self.size - 1)).max(0);
        let dy = (self.y - py).max(py - (self.y + self.size - 1)).max(0);
        (dx * dx + dy * dy) as u64
    }
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(Vec<(FlatGeoPoint, T)>),
    Branch([usize; 4]),
}

#[derive(Debug, Clone)]
struct Node<T> {
    quad: Quad,
    kind: NodeKind<T>,
}

/// Spatial index of items located on the flat projection plane.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    nodes: Vec<Node<T>>,
    root: usize,
    len: usize,
}

impl<T> Default for QuadTree<T> {
    fn default() -> Self {
        QuadTree {
            nodes: Vec::new(),
            root: 0,
            len: 0,
        }
    }
}

impl<T> QuadTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = 0;
        self.len = 0;
    }

    pub fn insert(&mut self, location: FlatGeoPoint, value: T) {
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                quad: Quad {
                    x: i64::from(location.x) - 512,
                    y: i64::from(location.y) - 512,
                    size: 1024,
                },
                kind: NodeKind::Leaf(Vec::new()),
            });
            self.root = 0;
        }

        while !self.nodes[self.root].quad.contains(&location) {
            self.grow_towards(&location);
        }

        let mut index = self.root;
        loop {
            match &self.nodes[index].kind {
                NodeKind::Branch(children) => {
                    index = children[self.nodes[index].quad.quadrant(&location)];
                }
                NodeKind::Leaf(_) => break,
            }
        }

        if let NodeKind::Leaf(items) = &mut self.nodes[index].kind {
            items.push((location, value));
        }
        self.len += 1;
        self.split_if_full(index);
    }

    /// Double the root square in the direction of `location`.
    fn grow_towards(&mut self, location: &FlatGeoPoint) {
        let old = self.nodes[self.root].quad;
        let x = if i64::from(location.x) < old.x { old.x - old.size } else { old.x };
        let y = if i64::from(location.y) < old.y { old.y - old.size } else { old.y };
        let quad = Quad {
            x,
            y,
            size: old.size * 2,
        };

        let old_position = usize::from(old.x != x) | (usize::from(old.y != y) << 1);
        let mut children = [0; 4];
        for (quadrant, child) in children.iter_mut().enumerate() {
            if quadrant == old_position {
                *child = self.root;
            } else {
                *child = self.nodes.len();
                self.nodes.push(Node {
                    quad: quad.child(quadrant),
                    kind: NodeKind::Leaf(Vec::new()),
                });
            }
        }

        self.nodes.push(Node {
            quad,
            kind: NodeKind::Branch(children),
        });
        self.root = self.nodes.len() - 1;
    }

    fn split_if_full(&mut self, index: usize) {
        let quad = self.nodes[index].quad;
        let full = matches!(&self.nodes[index].kind, NodeKind::Leaf(items) if items.len() > LEAF_CAPACITY);
        if !full || quad.size < 2 {
            return;
        }

        let first_child = self.nodes.len();
        for quadrant in 0..4 {
            self.nodes.push(Node {
                quad: quad.child(quadrant),
                kind: NodeKind::Leaf(Vec::new()),
            });
        }
        let children = [first_child, first_child + 1, first_child + 2, first_child + 3];

        let NodeKind::Leaf(items) = std::mem::replace(&mut self.nodes[index].kind, NodeKind::Branch(children)) else {
            return;
        };
        for (location, value) in items {
            let child = children[quad.quadrant(&location)];
            if let NodeKind::Leaf(child_items) = &mut self.nodes[child].kind {
                child_items.push((location, value));
            }
        }
        for child in children {
            self.split_if_full(child);
        }
    }

    /// Call `visitor` for every item within `range` (inclusive) of `center`.
    pub fn visit_within_range<F>(&self, center: &FlatGeoPoint, range: u32, mut visitor: F)
    where
        F: FnMut(&FlatGeoPoint, &T),
    {
        if self.nodes.is_empty() {
            return;
        }
        let square_range = u64::from(range) * u64::from(range);

        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.quad.distance_squared(center) > square_range {
                continue;
            }
            match &node.kind {
                NodeKind::Branch(children) => stack.extend_from_slice(children),
                NodeKind::Leaf(items) => {
                    for (location, value) in items {
                        if location.distance_squared(center) <= square_range {
                            visitor(location, value);
                        }
                    }
                }
            }
        }
    }
}
