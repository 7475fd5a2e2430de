//! Polyline shaping (jitter, Chaikin subdivision) and budgeted A* routing.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::types::Pos;

use super::seed::StageRng;

/// Continuous `(x, y)` point in cell units.
pub(crate) type Point = (f32, f32);

pub(crate) fn to_point(pos: Pos) -> Point {
    (pos.x as f32, pos.y as f32)
}

pub(crate) fn to_pos(point: Point) -> Pos {
    Pos { y: point.1.round() as i32, x: point.0.round() as i32 }
}

/// Start, two perpendicularly offset interior points at 1/3 and 2/3, end.
pub(crate) fn jittered_polyline(
    start: Pos,
    end: Pos,
    jitter_fraction: f32,
    rng: &mut StageRng,
) -> Vec<Point> {
    let (sx, sy) = to_point(start);
    let (ex, ey) = to_point(end);
    let (dx, dy) = (ex - sx, ey - sy);
    let length = (dx * dx + dy * dy).sqrt();
    if length < 1.0 {
        return vec![(sx, sy), (ex, ey)];
    }

    let normal = (-dy / length, dx / length);
    let max_offset = length * jitter_fraction;
    let mut polyline = vec![(sx, sy)];
    for third in [1.0_f32 / 3.0, 2.0 / 3.0] {
        let offset = rng.range_f32(-max_offset, max_offset);
        polyline.push((sx + dx * third + normal.0 * offset, sy + dy * third + normal.1 * offset));
    }
    polyline.push((ex, ey));
    polyline
}

/// Chaikin corner cutting; endpoints are kept in place.
pub(crate) fn chaikin(points: &[Point], iterations: usize) -> Vec<Point> {
    let mut current = points.to_vec();
    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }
        let mut next = Vec::with_capacity(current.len() * 2);
        next.push(current[0]);
        for pair in current.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            next.push((0.75 * p.0 + 0.25 * q.0, 0.75 * p.1 + 0.25 * q.1));
            next.push((0.25 * p.0 + 0.75 * q.0, 0.25 * p.1 + 0.75 * q.1));
        }
        if let Some(&last) = current.last() {
            next.push(last);
        }
        current = next;
    }
    current
}

/// Every `stride`-th cell of `path` as a point, always ending on the final cell.
pub(crate) fn resample(path: &[Pos], stride: usize) -> Vec<Point> {
    let stride = stride.max(1);
    let mut points: Vec<Point> = path.iter().step_by(stride).copied().map(to_point).collect();
    if let Some(&last) = path.last()
        && (path.len() - 1) % stride != 0
    {
        points.push(to_point(last));
    }
    points
}

/// Cheapest 4-connected route from `start` to `goal`, both included.
///
/// `step_cost` must return at least `min_step_cost` for the heuristic to stay admissible.
/// Returns `None` when the goal is unreachable or more than `budget` nodes get expanded.
pub(crate) fn astar(
    start: Pos,
    goal: Pos,
    budget: usize,
    min_step_cost: u32,
    passable: impl Fn(Pos) -> bool,
    step_cost: impl Fn(Pos) -> u32,
) -> Option<Vec<Pos>> {
    if start == goal {
        return Some(vec![start]);
    }
    if !passable(goal) {
        return None;
    }

    let heuristic = |pos: Pos| pos.manhattan(goal) * min_step_cost;
    let mut open = BinaryHeap::new();
    let mut g_score = BTreeMap::from([(start, 0_u32)]);
    let mut came_from: BTreeMap<Pos, Pos> = BTreeMap::new();
    let mut closed = BTreeSet::new();
    let mut insertion_order = 0_u64;
    let mut expanded = 0_usize;
    open.push(Reverse((heuristic(start), insertion_order, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        if !closed.insert(current) {
            continue;
        }
        expanded += 1;
        if expanded > budget {
            return None;
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);
        for next in current.cardinal_neighbors() {
            if !passable(next) {
                continue;
            }
            let tentative = current_g.saturating_add(step_cost(next));
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                insertion_order += 1;
                open.push(Reverse((tentative + heuristic(next), insertion_order, next)));
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => current = previous,
            None => break,
        }
        path.push(current);
    }
    path.reverse();
    path
}
