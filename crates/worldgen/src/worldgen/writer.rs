//! Tile output seam between the generator and whatever draws the map.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Pos, TileId};

/// Receives the finished map one cell at a time.
///
/// The generator never reads back through this trait; it only stamps.
pub trait TileWriter {
    fn write_floor(&mut self, pos: Pos, tile: TileId);
    fn write_wall(&mut self, pos: Pos, tile: TileId);
    fn erase_wall(&mut self, pos: Pos);
}

/// In-memory writer for tests and text dumps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingWriter {
    pub floors: BTreeMap<Pos, TileId>,
    pub walls: BTreeMap<Pos, TileId>,
    pub erased: BTreeSet<Pos>,
}

impl TileWriter for RecordingWriter {
    fn write_floor(&mut self, pos: Pos, tile: TileId) {
        self.floors.insert(pos, tile);
    }

    fn write_wall(&mut self, pos: Pos, tile: TileId) {
        self.walls.insert(pos, tile);
    }

    fn erase_wall(&mut self, pos: Pos) {
        self.walls.remove(&pos);
        self.erased.insert(pos);
    }
}
