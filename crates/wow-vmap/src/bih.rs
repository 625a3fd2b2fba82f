//! Bounding interval hierarchy over axis aligned boxes.
//!
//! The tree is a flat `u32` array. Every node takes three words:
//!
//! ```text
//! word 0   axis (2 bits) << 30 | bvh2 (1 bit) << 29 | offset (29 bits)
//! word 1   interior: left clip plane as f32 bits   leaf: object count
//! word 2   interior: right clip plane as f32 bits
//! ```
//!
//! Interior nodes point at their left child, the right child follows three
//! words later. BVH2 nodes clip empty space on both sides and have a single
//! child. Leaves (`axis == 3`) reference a run of the `objects` array.

use std::io::Write;

use glam::Vec3;
use log::{error, trace, warn};

use wow_data::{AaBox, ByteCursor, WriteExt};

use crate::error::{Result, VmapError};

/// Deepest traversal stack; trees are forced to leaves at this depth.
pub const MAX_STACK_SIZE: usize = 64;

const LEAF_AXIS: u32 = 3;
const BVH2_BIT: u32 = 1 << 29;
const OFFSET_MASK: u32 = !(7 << 29);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bih {
    bounds: AaBox,
    tree: Vec<u32>,
    objects: Vec<u32>,
}

impl Default for Bih {
    /// A single empty leaf.
    fn default() -> Self {
        Self {
            bounds: AaBox::zero(),
            tree: vec![LEAF_AXIS << 30, 0, 0],
            objects: Vec::new(),
        }
    }
}

impl Bih {
    /// Build over `primitives`, leaves holding at most `leaf_size` objects
    /// unless they cannot be split further.
    pub fn build<T>(primitives: &[T], bounds_of: impl Fn(&T) -> AaBox, leaf_size: usize) -> Self {
        let prim_bounds: Vec<AaBox> = primitives.iter().map(bounds_of).collect();
        let Some((first, rest)) = prim_bounds.split_first() else {
            return Self::default();
        };
        let bounds = rest.iter().fold(*first, |mut b, p| {
            b.merge(p);
            b
        });

        let mut builder = Builder {
            indices: (0..prim_bounds.len() as u32).collect(),
            bounds: &prim_bounds,
            max_prims: leaf_size.max(1) as i64,
            tree: vec![LEAF_AXIS << 30, 0, 0],
        };
        builder.subdivide(0, prim_bounds.len() as i64 - 1, bounds, bounds, 0, 1);
        trace!(
            "BIH over {} primitives: {} node words",
            prim_bounds.len(),
            builder.tree.len()
        );

        Self {
            bounds,
            tree: builder.tree,
            objects: builder.indices,
        }
    }

    pub fn bounds(&self) -> AaBox {
        self.bounds
    }

    pub fn tree(&self) -> &[u32] {
        &self.tree
    }

    pub fn objects(&self) -> &[u32] {
        &self.objects
    }

    pub fn primitive_count(&self) -> usize {
        self.objects.len()
    }

    /// For every primitive index, its slot in the `objects` array.
    pub fn object_slots(&self) -> Vec<u32> {
        let mut slots = vec![0; self.objects.len()];
        for (slot, &object) in self.objects.iter().enumerate() {
            if let Some(s) = slots.get_mut(object as usize) {
                *s = slot as u32;
            }
        }
        slots
    }

    fn plane(&self, at: usize) -> Option<f32> {
        self.tree.get(at).map(|&w| f32::from_bits(w))
    }

    /// Report every primitive whose leaf region contains `point`.
    pub fn intersect_point(&self, point: Vec3, mut callback: impl FnMut(Vec3, u32)) {
        if !self.bounds.contains(point) {
            return;
        }

        let mut stack = [0usize; MAX_STACK_SIZE];
        let mut depth = 0;
        let mut node = 0;

        loop {
            loop {
                let Some(&word) = self.tree.get(node) else {
                    return;
                };
                let axis = (word >> 30) as usize;
                let offset = (word & OFFSET_MASK) as usize;

                if word & BVH2_BIT == 0 {
                    if axis < 3 {
                        let (Some(tl), Some(tr)) = (self.plane(node + 1), self.plane(node + 2)) else {
                            return;
                        };
                        // between the clip planes
                        if tl < point[axis] && tr > point[axis] {
                            break;
                        }
                        let right = offset + 3;
                        node = right;
                        if tl < point[axis] {
                            continue;
                        }
                        node = offset;
                        if tr > point[axis] {
                            continue;
                        }
                        push(&mut stack, &mut depth, right);
                        continue;
                    }

                    let count = self.tree.get(node + 1).copied().unwrap_or(0) as usize;
                    for &object in self.objects.iter().skip(offset).take(count) {
                        callback(point, object);
                    }
                    break;
                }

                if axis > 2 {
                    return;
                }
                let (Some(tl), Some(tr)) = (self.plane(node + 1), self.plane(node + 2)) else {
                    return;
                };
                node = offset;
                if tl > point[axis] || tr < point[axis] {
                    break;
                }
            }

            if depth == 0 {
                return;
            }
            depth -= 1;
            node = stack[depth];
        }
    }

    /// Walk the leaves hit by `ray` front to back. The callback receives
    /// the ray, the primitive, the current maximum distance (which it may
    /// shorten) and `stop_at_first`; it returns whether it hit.
    pub fn intersect_ray<F>(&self, ray: &Ray, max_dist: &mut f32, stop_at_first: bool, mut callback: F)
    where
        F: FnMut(&Ray, u32, &mut f32, bool) -> bool,
    {
        let org = ray.origin;
        let dir = ray.direction;
        let mut interval_min = -1.0f32;
        let mut interval_max = -1.0f32;
        let mut inv_dir = Vec3::ZERO;

        for i in 0..3 {
            inv_dir[i] = 1.0 / dir[i];
            if !fuzzy_eq(dir[i], 0.0) {
                let mut t1 = (self.bounds.low[i] - org[i]) * inv_dir[i];
                let mut t2 = (self.bounds.high[i] - org[i]) * inv_dir[i];
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                if t1 > interval_min {
                    interval_min = t1;
                }
                if t2 < interval_max || interval_max < 0.0 {
                    interval_max = t2;
                }
                if interval_max <= 0.0 || interval_min >= *max_dist {
                    return;
                }
            }
        }

        if interval_min > interval_max {
            return;
        }
        interval_min = interval_min.max(0.0);
        interval_max = interval_max.min(*max_dist);

        // Child order from the sign of each direction component.
        let mut front = [0usize; 3];
        let mut back = [0usize; 3];
        let mut front3 = [0usize; 3];
        let mut back3 = [0usize; 3];
        for i in 0..3 {
            let sign = (dir[i].to_bits() >> 31) as usize;
            front3[i] = sign * 3;
            back3[i] = (sign ^ 1) * 3;
            front[i] = sign + 1;
            back[i] = (sign ^ 1) + 1;
        }

        let mut stack = [(0usize, 0.0f32, 0.0f32); MAX_STACK_SIZE];
        let mut depth = 0;
        let mut node = 0;

        loop {
            loop {
                let Some(&word) = self.tree.get(node) else {
                    return;
                };
                let axis = (word >> 30) as usize;
                let offset = (word & OFFSET_MASK) as usize;

                if word & BVH2_BIT == 0 {
                    if axis < 3 {
                        let (Some(pf), Some(pb)) =
                            (self.plane(node + front[axis]), self.plane(node + back[axis]))
                        else {
                            return;
                        };
                        let tf = (pf - org[axis]) * inv_dir[axis];
                        let tb = (pb - org[axis]) * inv_dir[axis];
                        // passes between the clip planes
                        if tf < interval_min && tb > interval_max {
                            break;
                        }
                        let back_node = offset + back3[axis];
                        node = back_node;
                        // far child only
                        if tf < interval_min {
                            interval_min = if tb >= interval_min { tb } else { interval_min };
                            continue;
                        }
                        node = offset + front3[axis];
                        // near child only
                        if tb > interval_max {
                            interval_max = if tf <= interval_max { tf } else { interval_max };
                            continue;
                        }
                        push(
                            &mut stack,
                            &mut depth,
                            (
                                back_node,
                                if tb >= interval_min { tb } else { interval_min },
                                interval_max,
                            ),
                        );
                        interval_max = if tf <= interval_max { tf } else { interval_max };
                        continue;
                    }

                    let count = self.tree.get(node + 1).copied().unwrap_or(0) as usize;
                    for &object in self.objects.iter().skip(offset).take(count) {
                        let hit = callback(ray, object, max_dist, stop_at_first);
                        if stop_at_first && hit {
                            return;
                        }
                    }
                    break;
                }

                if axis > 2 {
                    return;
                }
                let (Some(pf), Some(pb)) =
                    (self.plane(node + front[axis]), self.plane(node + back[axis]))
                else {
                    return;
                };
                let tf = (pf - org[axis]) * inv_dir[axis];
                let tb = (pb - org[axis]) * inv_dir[axis];
                node = offset;
                interval_min = if tf >= interval_min { tf } else { interval_min };
                interval_max = if tb <= interval_max { tb } else { interval_max };
                if interval_min > interval_max {
                    break;
                }
            }

            loop {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                let (next, near, far) = stack[depth];
                interval_min = near;
                if *max_dist < interval_min {
                    continue;
                }
                node = next;
                interval_max = far;
                break;
            }
        }
    }

    /// Root bounds, then the node and object arrays, each `u32` length
    /// prefixed.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_aabox(&self.bounds)?;
        writer.write_u32_le(self.tree.len() as u32)?;
        writer.write_u32_slice(&self.tree)?;
        writer.write_u32_le(self.objects.len() as u32)?;
        writer.write_u32_slice(&self.objects)?;
        Ok(())
    }

    /// Inverse of [`Bih::write_to`].
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let bounds = cursor.read_aabox()?;
        let tree = read_words(cursor)?;
        let objects = read_words(cursor)?;
        if tree.len() < 3 {
            return Err(VmapError::CorruptTree(format!(
                "{} node words, a tree needs at least one node",
                tree.len()
            )));
        }
        Ok(Self {
            bounds,
            tree,
            objects,
        })
    }
}

fn read_words(cursor: &mut ByteCursor<'_>) -> Result<Vec<u32>> {
    let count = cursor.read_u32()? as usize;
    if count > cursor.remaining() / 4 {
        return Err(VmapError::CorruptTree(format!(
            "{count} words declared, {} bytes left",
            cursor.remaining()
        )));
    }
    Ok((0..count)
        .map(|_| cursor.read_u32())
        .collect::<wow_data::Result<_>>()?)
}

/// Push a pending branch. A full stack drops the branch, so the query may
/// miss primitives behind it; that is reported as an error.
fn push<T: Copy>(stack: &mut [T; MAX_STACK_SIZE], depth: &mut usize, entry: T) -> bool {
    if *depth >= MAX_STACK_SIZE {
        error!("BIH traversal stack is full ({MAX_STACK_SIZE}), skipping a branch");
        return false;
    }
    stack[*depth] = entry;
    *depth += 1;
    true
}

/// Relative float comparison used to detect a stalled split.
fn fuzzy_eq(a: f32, b: f32) -> bool {
    const EPSILON: f32 = 0.000_01;
    a == b || (a - b).abs() <= EPSILON * (a.abs() + 1.0)
}

/// Index of the largest component.
fn primary_axis(d: Vec3) -> usize {
    let (x, y, z) = (d.x.abs(), d.y.abs(), d.z.abs());
    if x > y {
        if x > z { 0 } else { 2 }
    } else if y > z {
        1
    } else {
        2
    }
}

struct Builder<'a> {
    indices: Vec<u32>,
    bounds: &'a [AaBox],
    max_prims: i64,
    tree: Vec<u32>,
}

impl Builder<'_> {
    fn leaf(&mut self, node_index: usize, left: i64, right: i64) {
        self.tree[node_index] = (LEAF_AXIS << 30) | left as u32;
        self.tree[node_index + 1] = (right - left + 1) as u32;
    }

    fn alloc(&mut self) -> usize {
        let index = self.tree.len();
        self.tree.extend_from_slice(&[0, 0, 0]);
        index
    }

    fn interior(&mut self, node_index: usize, head: u32, low: f32, high: f32) {
        self.tree[node_index] = head;
        self.tree[node_index + 1] = low.to_bits();
        self.tree[node_index + 2] = high.to_bits();
    }

    fn subdivide(
        &mut self,
        left: i64,
        mut right: i64,
        mut grid: AaBox,
        mut node: AaBox,
        mut node_index: usize,
        mut depth: usize,
    ) {
        if right - left + 1 <= self.max_prims || depth >= MAX_STACK_SIZE {
            self.leaf(node_index, left, right);
            return;
        }

        let mut axis = usize::MAX;
        let mut split = f32::NAN;
        let mut clip_l;
        let mut clip_r;
        let mut prev_clip = f32::NAN;
        let mut was_left = true;
        let mut right_orig;

        loop {
            let prev_axis = axis;
            let prev_split = split;

            let extent = grid.extent();
            let overlaps = (0..3).all(|i| node.high[i] >= grid.low[i] && node.low[i] <= grid.high[i]);
            if extent.cmplt(Vec3::ZERO).any() || !overlaps {
                warn!("Degenerate BIH node with {} objects, making a leaf", right - left + 1);
                self.leaf(node_index, left, right);
                return;
            }

            axis = primary_axis(extent);
            split = 0.5 * (grid.low[axis] + grid.high[axis]);

            clip_l = f32::NEG_INFINITY;
            clip_r = f32::INFINITY;
            right_orig = right;
            let mut node_l = f32::INFINITY;
            let mut node_r = f32::NEG_INFINITY;
            let mut i = left;
            while i <= right {
                let object = self.bounds[self.indices[i as usize] as usize];
                let (min_b, max_b) = (object.low[axis], object.high[axis]);
                if (min_b + max_b) * 0.5 <= split {
                    i += 1;
                    if clip_l < max_b {
                        clip_l = max_b;
                    }
                } else {
                    self.indices.swap(i as usize, right as usize);
                    right -= 1;
                    if clip_r > min_b {
                        clip_r = min_b;
                    }
                }
                node_l = node_l.min(min_b);
                node_r = node_r.max(max_b);
            }

            // Cut off empty space around the primitives.
            if node_l > node.low[axis] && node_r < node.high[axis] {
                let node_box_w = node.high[axis] - node.low[axis];
                let node_new_w = node_r - node_l;
                if 1.3 * node_new_w < node_box_w {
                    let next = self.alloc();
                    self.interior(
                        node_index,
                        ((axis as u32) << 30) | BVH2_BIT | next as u32,
                        node_l,
                        node_r,
                    );
                    node.low[axis] = node_l;
                    node.high[axis] = node_r;
                    self.subdivide(left, right_orig, grid, node, next, depth + 1);
                    return;
                }
            }

            if right == right_orig {
                // everything went left
                if prev_axis == axis && fuzzy_eq(prev_split, split) {
                    self.leaf(node_index, left, right);
                    return;
                }
                grid.high[axis] = split;
                if clip_l <= split {
                    prev_clip = clip_l;
                    was_left = true;
                    continue;
                }
                prev_clip = f32::NAN;
            } else if left > right {
                // everything went right
                right = right_orig;
                if prev_axis == axis && fuzzy_eq(prev_split, split) {
                    self.leaf(node_index, left, right);
                    return;
                }
                grid.low[axis] = split;
                if clip_r >= split {
                    prev_clip = clip_r;
                    was_left = false;
                    continue;
                }
                prev_clip = f32::NAN;
            } else {
                if prev_axis != usize::MAX && !prev_clip.is_nan() {
                    // The previous split left one side empty: emit it now.
                    let next = self.alloc();
                    let head = (prev_axis as u32) << 30;
                    if was_left {
                        self.interior(node_index, head | next as u32, prev_clip, f32::INFINITY);
                    } else {
                        self.interior(
                            node_index,
                            head | (next - 3) as u32,
                            f32::NEG_INFINITY,
                            prev_clip,
                        );
                    }
                    depth += 1;
                    node_index = next;
                }
                break;
            }
        }

        let left_count = right - left + 1;
        let right_count = right_orig - right;
        let mut next = self.tree.len();
        if left_count > 0 {
            self.alloc();
        } else {
            next -= 3;
        }
        if right_count > 0 {
            self.alloc();
        }
        self.interior(node_index, ((axis as u32) << 30) | next as u32, clip_l, clip_r);

        let (mut grid_l, mut grid_r) = (grid, grid);
        let (mut node_box_l, mut node_box_r) = (node, node);
        grid_l.high[axis] = split;
        grid_r.low[axis] = split;
        node_box_l.high[axis] = clip_l;
        node_box_r.low[axis] = clip_r;

        if left_count > 0 {
            self.subdivide(left, right, grid_l, node_box_l, next, depth + 1);
        }
        if right_count > 0 {
            self.subdivide(right + 1, right_orig, grid_r, node_box_r, next + 3, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit_box(at: Vec3) -> AaBox {
        AaBox::new(at, at + Vec3::ONE)
    }

    fn row_of_boxes(n: usize) -> Vec<AaBox> {
        (0..n).map(|i| unit_box(Vec3::new(i as f32 * 2.0, 0.0, 0.0))).collect()
    }

    fn hits_at(bih: &Bih, p: Vec3) -> Vec<u32> {
        let mut hits = Vec::new();
        bih.intersect_point(p, |_, obj| hits.push(obj));
        hits.sort_unstable();
        hits
    }

    #[test]
    fn empty_tree_is_a_single_leaf() {
        let bih = Bih::build(&[] as &[AaBox], |b| *b, 3);
        assert_eq!(bih.tree(), &[3 << 30, 0, 0]);
        assert!(bih.objects().is_empty());
        assert!(hits_at(&bih, Vec3::ZERO).is_empty());
    }

    #[test]
    fn small_sets_stay_in_one_leaf() {
        let boxes = row_of_boxes(3);
        let bih = Bih::build(&boxes, |b| *b, 3);
        assert_eq!(bih.tree(), &[3 << 30, 3, 0]);
        assert_eq!(bih.bounds(), AaBox::new(Vec3::ZERO, Vec3::new(5.0, 1.0, 1.0)));
    }

    #[test]
    fn point_query_finds_each_box() {
        let boxes = row_of_boxes(40);
        let bih = Bih::build(&boxes, |b| *b, 1);
        assert_eq!(bih.primitive_count(), 40);
        for (i, b) in boxes.iter().enumerate() {
            let centre = (b.low + b.high) * 0.5;
            assert!(hits_at(&bih, centre).contains(&(i as u32)), "box {i}");
        }
        assert!(hits_at(&bih, Vec3::new(-5.0, 0.5, 0.5)).is_empty());
    }

    #[test]
    fn ray_walks_boxes_front_to_back() {
        let boxes = row_of_boxes(16);
        let bih = Bih::build(&boxes, |b| *b, 1);
        let ray = Ray::new(Vec3::new(-10.0, 0.5, 0.5), Vec3::X);
        let mut order = Vec::new();
        let mut max_dist = f32::INFINITY;
        bih.intersect_ray(&ray, &mut max_dist, false, |_, obj, _, _| {
            order.push(obj);
            false
        });
        let mut sorted = order.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, (0..16).collect::<Vec<u32>>());
        assert_eq!(order.first(), Some(&0));
    }

    #[test]
    fn ray_stops_at_first_hit() {
        let boxes = row_of_boxes(16);
        let bih = Bih::build(&boxes, |b| *b, 1);
        let ray = Ray::new(Vec3::new(100.0, 0.5, 0.5), Vec3::NEG_X);
        let mut calls = 0;
        let mut max_dist = f32::INFINITY;
        bih.intersect_ray(&ray, &mut max_dist, true, |_, _, _, _| {
            calls += 1;
            true
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn ray_missing_the_bounds_reports_nothing() {
        let bih = Bih::build(&row_of_boxes(8), |b| *b, 1);
        let ray = Ray::new(Vec3::new(-10.0, 50.0, 0.5), Vec3::X);
        let mut max_dist = f32::INFINITY;
        let mut calls = 0;
        bih.intersect_ray(&ray, &mut max_dist, false, |_, _, _, _| {
            calls += 1;
            false
        });
        assert_eq!(calls, 0);
    }

    #[test]
    fn identical_boxes_terminate() {
        let boxes = vec![unit_box(Vec3::ZERO); 20];
        let bih = Bih::build(&boxes, |b| *b, 1);
        assert_eq!(hits_at(&bih, Vec3::splat(0.5)).len(), 20);
    }

    #[test]
    fn serialized_tree_reads_back() {
        let bih = Bih::build(&row_of_boxes(10), |b| *b, 2);
        let mut out = Vec::new();
        bih.write_to(&mut out).unwrap();
        assert_eq!(out.len(), 24 + 4 + bih.tree().len() * 4 + 4 + 40);
        let back = Bih::read(&mut ByteCursor::new(&out)).unwrap();
        assert_eq!(back, bih);
    }

    #[test]
    fn object_slots_invert_objects() {
        let bih = Bih::build(&row_of_boxes(9), |b| *b, 1);
        let slots = bih.object_slots();
        for (primitive, &slot) in slots.iter().enumerate() {
            assert_eq!(bih.objects()[slot as usize], primitive as u32);
        }
    }

    #[test]
    fn full_traversal_stack_drops_the_branch() {
        let mut stack = [0usize; MAX_STACK_SIZE];
        let mut depth = 0;
        for i in 0..MAX_STACK_SIZE {
            assert!(push(&mut stack, &mut depth, i));
        }
        assert!(!push(&mut stack, &mut depth, 999));
        assert_eq!(depth, MAX_STACK_SIZE);
        assert_eq!(stack[MAX_STACK_SIZE - 1], MAX_STACK_SIZE - 1);
    }
}
