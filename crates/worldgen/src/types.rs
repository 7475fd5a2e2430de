use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn distance_squared(self, other: Self) -> u64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        (dx * dx + dy * dy) as u64
    }

    pub fn distance(self, other: Self) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    pub fn cardinal_neighbors(self) -> [Self; 4] {
        [
            Self { y: self.y - 1, x: self.x },
            Self { y: self.y, x: self.x + 1 },
            Self { y: self.y + 1, x: self.x },
            Self { y: self.y, x: self.x - 1 },
        ]
    }
}

/// Passability state of one grid cell.
///
/// `Open` covers both carved rooms and corridors; nothing downstream tells them apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileState {
    #[default]
    Background,
    Open,
    Wall,
}

impl TileState {
    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BiomeId(pub u16);

impl BiomeId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Opaque tile identifier handed to the [`TileWriter`](crate::TileWriter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u16);
