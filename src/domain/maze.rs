/// Maze state: the mutable tile grid plus pellet bookkeeping.
///
/// Columns wrap modulo the grid width (the tunnel); rows do not wrap and
/// out-of-range rows read as Wall. Both policies are deliberate: AI
/// candidate generation probes neighbors that may be off-grid, and those
/// probes must degrade gracefully instead of failing.

use super::tile::{Dir, Pellet, Tile, SCAN_ORDER};

pub struct Maze {
    /// Working copy, mutated as pellets are eaten. Replaced on every load.
    grid: Vec<Vec<Tile>>,
    rows: i32,
    cols: i32,
    pellets_left: u32,
    total_pellets: u32,
    /// The pen door tile, discovered from the grid at load.
    door: (i32, i32),
}

impl Maze {
    pub fn new() -> Self {
        Maze {
            grid: vec![],
            rows: 0,
            cols: 0,
            pellets_left: 0,
            total_pellets: 0,
            door: (0, 0),
        }
    }

    /// Replace the grid with a deep copy of static level data and tally
    /// pellets. Callable repeatedly (next level, retry).
    pub fn load(&mut self, src: &[Vec<Tile>]) {
        self.grid = src.to_vec();
        self.rows = self.grid.len() as i32;
        self.cols = self.grid.first().map_or(0, |r| r.len() as i32);
        self.pellets_left = self
            .grid
            .iter()
            .flatten()
            .filter(|t| t.has_pellet())
            .count() as u32;
        self.total_pellets = self.pellets_left;
        self.door = self
            .grid
            .iter()
            .enumerate()
            .find_map(|(r, row)| {
                row.iter()
                    .position(|&t| t == Tile::GhostDoor)
                    .map(|c| (r as i32, c as i32))
            })
            .unwrap_or((0, 0));
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn pellets_left(&self) -> u32 {
        self.pellets_left
    }

    pub fn total_pellets(&self) -> u32 {
        self.total_pellets
    }

    /// Pen door tile (row, col). Enemy exit and return motion anchors here.
    pub fn door(&self) -> (i32, i32) {
        self.door
    }

    /// Normalize a column index onto the torus.
    pub fn wrap_col(&self, col: i32) -> i32 {
        if col < 0 {
            self.cols - 1
        } else if col >= self.cols {
            0
        } else {
            col
        }
    }

    /// Tile kind at (row, col). Columns wrap; out-of-range rows are Wall.
    pub fn tile_at(&self, row: i32, col: i32) -> Tile {
        if row < 0 || row >= self.rows {
            return Tile::Wall;
        }
        let c = self.wrap_col(col);
        self.grid[row as usize][c as usize]
    }

    /// Can an entity occupy (row, col)? The pen door and interior admit
    /// enemies only; this single predicate enforces the enemies-only zone
    /// for every caller.
    pub fn is_walkable(&self, row: i32, col: i32, is_enemy: bool) -> bool {
        match self.tile_at(row, col) {
            Tile::Wall => false,
            t if t.is_house() => is_enemy,
            _ => true,
        }
    }

    /// Consume the pellet at (row, col), demoting the tile to Empty.
    /// Returns what was eaten; a tile without a pellet is a no-op.
    pub fn eat_pellet(&mut self, row: i32, col: i32) -> Option<Pellet> {
        if row < 0 || row >= self.rows {
            return None;
        }
        let c = self.wrap_col(col) as usize;
        let cell = &mut self.grid[row as usize][c];
        let ate = match *cell {
            Tile::Path => Pellet::Dot,
            Tile::Power => Pellet::Power,
            _ => return None,
        };
        *cell = Tile::Empty;
        self.pellets_left -= 1;
        Some(ate)
    }

    pub fn is_cleared(&self) -> bool {
        self.pellets_left == 0
    }

    /// Tunnel columns: the outermost one-tile-wide columns. Enemies take a
    /// speed penalty here.
    pub fn is_tunnel(&self, _row: i32, col: i32) -> bool {
        col < 1 || col >= self.cols - 1
    }

    /// Directions from (row, col) leading to a walkable neighbor, in fixed
    /// scan order (UP, LEFT, DOWN, RIGHT) so AI tie-breaking is
    /// deterministic. `exclude` forbids one direction (the reverse of
    /// travel, normally).
    pub fn available_dirs(
        &self,
        row: i32,
        col: i32,
        is_enemy: bool,
        exclude: Option<Dir>,
    ) -> Vec<Dir> {
        let mut dirs = Vec::with_capacity(4);
        for d in SCAN_ORDER {
            if Some(d) == exclude {
                continue;
            }
            let (dr, dc) = d.delta();
            if self.is_walkable(row + dr, self.wrap_col(col + dc), is_enemy) {
                dirs.push(d);
            }
        }
        dirs
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Helper: build a maze from a string diagram.
    /// Legend:  '#'=Wall  '.'=Path  'o'=Power  ' '=Empty
    ///          'H'=GhostHouse  '='=GhostDoor
    pub(crate) fn maze_from(rows: &[&str]) -> Maze {
        let grid: Vec<Vec<Tile>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| match ch {
                        '#' => Tile::Wall,
                        '.' => Tile::Path,
                        'o' => Tile::Power,
                        'H' => Tile::GhostHouse,
                        '=' => Tile::GhostDoor,
                        _ => Tile::Empty,
                    })
                    .collect()
            })
            .collect();
        let mut maze = Maze::new();
        maze.load(&grid);
        maze
    }

    #[test]
    fn load_counts_pellets() {
        let m = maze_from(&[
            "#####",
            "#.o.#",
            "#####",
        ]);
        assert_eq!(m.pellets_left(), 3);
        assert_eq!(m.total_pellets(), 3);
        assert!(!m.is_cleared());
    }

    #[test]
    fn tile_at_wraps_columns_not_rows() {
        let m = maze_from(&[
            "     ",
            ".   o",
            "     ",
        ]);
        assert_eq!(m.tile_at(1, -1), Tile::Power); // wraps to last col
        assert_eq!(m.tile_at(1, 5), Tile::Path); // wraps to col 0
        assert_eq!(m.tile_at(-1, 2), Tile::Wall);
        assert_eq!(m.tile_at(3, 2), Tile::Wall);
    }

    #[test]
    fn walkability_enforces_enemy_only_zones() {
        let m = maze_from(&[
            "#=#",
            "#H#",
            "#.#",
        ]);
        assert!(!m.is_walkable(0, 1, false));
        assert!(m.is_walkable(0, 1, true));
        assert!(!m.is_walkable(1, 1, false));
        assert!(m.is_walkable(1, 1, true));
        assert!(m.is_walkable(2, 1, false));
        assert!(!m.is_walkable(0, 0, true)); // wall blocks everyone
    }

    #[test]
    fn eat_pellet_demotes_and_decrements() {
        let mut m = maze_from(&[
            "#####",
            "#.o #",
            "#####",
        ]);
        assert_eq!(m.eat_pellet(1, 1), Some(Pellet::Dot));
        assert_eq!(m.tile_at(1, 1), Tile::Empty);
        assert_eq!(m.pellets_left(), 1);

        assert_eq!(m.eat_pellet(1, 2), Some(Pellet::Power));
        assert_eq!(m.pellets_left(), 0);
        assert!(m.is_cleared());

        // Re-eating an already-empty tile is a no-op
        assert_eq!(m.eat_pellet(1, 1), None);
        assert_eq!(m.eat_pellet(1, 3), None);
        assert_eq!(m.eat_pellet(-1, 1), None);
        assert_eq!(m.pellets_left(), 0);
    }

    #[test]
    fn tunnel_is_outermost_columns() {
        let m = maze_from(&["     ", "     "]);
        assert!(m.is_tunnel(0, 0));
        assert!(m.is_tunnel(1, 4));
        assert!(!m.is_tunnel(0, 1));
        assert!(!m.is_tunnel(0, 3));
    }

    #[test]
    fn available_dirs_scan_order_and_exclude() {
        // Open cross centered at (1,1)
        let m = maze_from(&[
            "# #",
            "   ",
            "# #",
        ]);
        let dirs = m.available_dirs(1, 1, false, None);
        assert_eq!(dirs, vec![Dir::Up, Dir::Left, Dir::Down, Dir::Right]);

        let dirs = m.available_dirs(1, 1, false, Some(Dir::Down));
        assert_eq!(dirs, vec![Dir::Up, Dir::Left, Dir::Right]);
    }

    #[test]
    fn available_dirs_never_points_into_walls_or_pen() {
        let m = maze_from(&[
            "###",
            "= .",
            "###",
        ]);
        // For the player at (1,1) the door on the left is off limits,
        // leaving only the Path tile on the right.
        let dirs = m.available_dirs(1, 1, false, None);
        assert_eq!(dirs, vec![Dir::Right]);
        // Enemy may take the door as well
        let dirs = m.available_dirs(1, 1, true, None);
        assert_eq!(dirs, vec![Dir::Left, Dir::Right]);
    }

    #[test]
    fn door_discovered_at_load() {
        let m = maze_from(&[
            "#####",
            "##=##",
            "#HHH#",
        ]);
        assert_eq!(m.door(), (1, 2));
    }
}
