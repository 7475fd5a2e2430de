//! 4-connected component labeling of open cells.

use std::collections::VecDeque;

use crate::types::Pos;

use super::grid::WorldGrid;

/// Component label per cell (`0` for closed cells) and the size of every component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMap {
    width: usize,
    labels: Vec<u32>,
    /// `sizes[label]`; slot 0 is unused.
    sizes: Vec<usize>,
    center: Option<(u32, Pos)>,
}

impl ComponentMap {
    pub(crate) fn label(grid: &WorldGrid) -> Self {
        let mut labels = vec![0_u32; grid.cell_count()];
        let mut sizes = vec![0_usize];
        let mut queue = VecDeque::new();

        for start in grid.positions() {
            if !grid.is_open(start) || labels[grid.index(start)] != 0 {
                continue;
            }
            let label = sizes.len() as u32;
            labels[grid.index(start)] = label;
            queue.push_back(start);
            let mut size = 0;
            // Cells are labeled when queued, so each open cell is visited exactly once.
            while let Some(pos) = queue.pop_front() {
                size += 1;
                for next in pos.cardinal_neighbors() {
                    if !grid.is_open(next) {
                        continue;
                    }
                    let index = grid.index(next);
                    if labels[index] == 0 {
                        labels[index] = label;
                        queue.push_back(next);
                    }
                }
            }
            sizes.push(size);
        }

        let center = center_anchor(grid).map(|anchor| (labels[grid.index(anchor)], anchor));
        Self { width: grid.width(), labels, sizes, center }
    }

    pub fn label_at(&self, pos: Pos) -> u32 {
        if pos.x < 0 || pos.y < 0 || pos.x as usize >= self.width {
            return 0;
        }
        self.labels.get((pos.y as usize) * self.width + pos.x as usize).copied().unwrap_or(0)
    }

    pub fn size_of(&self, label: u32) -> usize {
        if label == 0 {
            return 0;
        }
        self.sizes.get(label as usize).copied().unwrap_or(0)
    }

    pub fn component_count(&self) -> usize {
        self.sizes.len() - 1
    }

    /// Sizes of labels `1..=component_count()`, in label order.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes[1..]
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label of the component holding the map center, or of the open cell nearest to it.
    pub fn center_label(&self) -> Option<u32> {
        self.center.map(|(label, _)| label)
    }

    /// The cell [`Self::center_label`] was read from.
    pub fn center_anchor(&self) -> Option<Pos> {
        self.center.map(|(_, anchor)| anchor)
    }
}

/// Grid center if open; otherwise the closest open cell found ring by ring.
///
/// Within a ring the smallest squared Euclidean distance wins, ties broken row-major.
fn center_anchor(grid: &WorldGrid) -> Option<Pos> {
    let center = grid.center();
    if grid.is_open(center) {
        return Some(center);
    }
    let max_ring = grid.width().max(grid.height()) as i32;
    for ring in 1..=max_ring {
        let mut best: Option<(u64, Pos)> = None;
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                let pos = center.offset(dx, dy);
                if !grid.is_open(pos) {
                    continue;
                }
                let key = (center.distance_squared(pos), pos);
                if best.is_none_or(|current| key < current) {
                    best = Some(key);
                }
            }
        }
        if let Some((_, pos)) = best {
            return Some(pos);
        }
    }
    None
}
