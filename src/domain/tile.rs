/// Tile kinds and movement directions.
/// Walkability is queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    /// Walkable, carries a pellet until eaten.
    Path,
    Wall,
    /// Walkable, no pellet (tunnels, eaten cells, house surroundings).
    Empty,
    /// Walkable, carries a power pellet until eaten.
    Power,
    /// Interior of the enemy pen. Enemies only.
    GhostHouse,
    /// The pen door. Enemies only.
    GhostDoor,
}

impl Tile {
    /// Does this tile currently hold a pellet of either kind?
    pub fn has_pellet(self) -> bool {
        matches!(self, Tile::Path | Tile::Power)
    }

    /// Is this tile part of the enemy pen (door or interior)?
    pub fn is_house(self) -> bool {
        matches!(self, Tile::GhostHouse | Tile::GhostDoor)
    }
}

/// What the player just ate, if anything.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pellet {
    Dot,
    Power,
}

/// Cardinal movement direction. "No direction" is `Option::<Dir>::None`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

/// Fixed scan order for enumerating directions. AI tie-breaking depends
/// on this order being stable.
pub const SCAN_ORDER: [Dir; 4] = [Dir::Up, Dir::Left, Dir::Down, Dir::Right];

impl Dir {
    /// (row delta, col delta) for one tile step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Right => (0, 1),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involutive() {
        for d in SCAN_ORDER {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn deltas_cancel_with_opposite() {
        for d in SCAN_ORDER {
            let (dr, dc) = d.delta();
            let (or, oc) = d.opposite().delta();
            assert_eq!((dr + or, dc + oc), (0, 0));
        }
    }
}
