/// Shared tile-locked movement: a continuous pixel position interpolating
/// between tile centers, with the discrete (row, col) as the authoritative
/// logical position. Player and Enemy both embed a `Mover` and differ only
/// in how they pick the next direction.
///
/// At most ONE tile transition is resolved per `advance` call; any budget
/// left after a crossing is dropped for that tick. This caps travel at one
/// tile per tick, which configured speeds never reach at a steady frame
/// rate (the caller clamps dt to 50 ms).

use super::maze::Maze;
use super::tile::Dir;

pub const TILE_SIZE: f32 = 16.0;

/// Outcome of one `advance` call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    /// No direction; nothing moved.
    Idle,
    /// Moved within the current tile; no crossing.
    Moved,
    /// Crossed onto a new tile center; (row, col) updated and pixel
    /// position snapped. The caller handles tile-entry side effects and
    /// re-derives the direction.
    EnteredTile,
    /// Next tile is not walkable; pixel position snapped back to the
    /// current tile center. The caller must resolve the direction.
    Blocked,
}

#[derive(Clone, Debug)]
pub struct Mover {
    pub row: i32,
    pub col: i32,
    /// Continuous position, pixels. Within one tile of the center implied
    /// by (row, col) except transiently during a tunnel crossing.
    pub px: f32,
    pub py: f32,
    pub dir: Option<Dir>,
}

impl Mover {
    pub fn at_tile(row: i32, col: i32) -> Self {
        let (px, py) = tile_center(row, col);
        Mover {
            row,
            col,
            px,
            py,
            dir: None,
        }
    }

    /// Re-sync the pixel position exactly onto the current tile center.
    pub fn snap_to_center(&mut self) {
        let (px, py) = tile_center(self.row, self.col);
        self.px = px;
        self.py = py;
    }

    /// Advance up to `budget` pixels along the current direction.
    pub fn advance(&mut self, budget: f32, maze: &Maze, is_enemy: bool) -> Step {
        let dir = match self.dir {
            Some(d) => d,
            None => return Step::Idle,
        };
        let (dr, dc) = dir.delta();
        let tgt_row = self.row + dr;
        let tgt_col = maze.wrap_col(self.col + dc);

        if !maze.is_walkable(tgt_row, tgt_col, is_enemy) {
            self.snap_to_center();
            return Step::Blocked;
        }

        // Pixel target: the next tile's center, except across the tunnel
        // seam, where it sits half a tile beyond the canvas edge so the
        // sprite visibly exits one side before reappearing on the other.
        let (mut tx, ty) = tile_center(tgt_row, tgt_col);
        if dc == -1 && tgt_col == maze.cols() - 1 && self.col == 0 {
            tx = -TILE_SIZE / 2.0;
        }
        if dc == 1 && tgt_col == 0 && self.col == maze.cols() - 1 {
            tx = maze.cols() as f32 * TILE_SIZE + TILE_SIZE / 2.0;
        }

        let dist = (tx - self.px).abs() + (ty - self.py).abs();

        let step = if budget >= dist {
            self.row = tgt_row;
            self.col = tgt_col;
            self.snap_to_center();
            Step::EnteredTile
        } else {
            self.px += dc as f32 * budget;
            self.py += dr as f32 * budget;
            Step::Moved
        };

        self.rewrap_pixels(maze);
        step
    }

    /// Re-wrap the pixel position once it is more than half a tile past
    /// either horizontal canvas edge (keeps the sprite visible for the
    /// whole tunnel crossing).
    fn rewrap_pixels(&mut self, maze: &Maze) {
        let total = maze.cols() as f32 * TILE_SIZE;
        if self.px < -TILE_SIZE / 2.0 {
            self.px += total;
        } else if self.px > total + TILE_SIZE / 2.0 {
            self.px -= total;
        }
    }
}

/// Pixel center of a tile. Pixel x grows with columns, y with rows.
pub fn tile_center(row: i32, col: i32) -> (f32, f32) {
    (
        col as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        row as f32 * TILE_SIZE + TILE_SIZE / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::maze::tests::maze_from;

    #[test]
    fn partial_advance_moves_pixels_only() {
        let m = maze_from(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 1);
        mv.dir = Some(Dir::Right);
        assert_eq!(mv.advance(6.0, &m, false), Step::Moved);
        assert_eq!((mv.row, mv.col), (1, 1));
        assert!((mv.px - (tile_center(1, 1).0 + 6.0)).abs() < 1e-4);
    }

    #[test]
    fn full_advance_snaps_to_next_center() {
        let m = maze_from(&[
            "#####",
            "#...#",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 1);
        mv.dir = Some(Dir::Right);
        assert_eq!(mv.advance(16.0, &m, false), Step::EnteredTile);
        assert_eq!((mv.row, mv.col), (1, 2));
        assert_eq!((mv.px, mv.py), tile_center(1, 2));
    }

    #[test]
    fn blocked_snaps_back_to_center() {
        let m = maze_from(&[
            "#####",
            "#.. #",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 1);
        mv.dir = Some(Dir::Up);
        mv.px += 3.0; // drifted off-center
        assert_eq!(mv.advance(5.0, &m, false), Step::Blocked);
        assert_eq!((mv.px, mv.py), tile_center(1, 1));
        assert_eq!((mv.row, mv.col), (1, 1));
    }

    #[test]
    fn tunnel_crossing_left_resolves_to_far_column() {
        let m = maze_from(&[
            "#####",
            ".....",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 0);
        mv.dir = Some(Dir::Left);
        // Target is half a tile past the left edge: 16 px away.
        assert_eq!(mv.advance(16.0, &m, false), Step::EnteredTile);
        assert_eq!((mv.row, mv.col), (1, 4));
        assert_eq!((mv.px, mv.py), tile_center(1, 4));
    }

    #[test]
    fn tunnel_crossing_right_resolves_to_column_zero() {
        let m = maze_from(&[
            "#####",
            ".....",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 4);
        mv.dir = Some(Dir::Right);
        assert_eq!(mv.advance(16.0, &m, false), Step::EnteredTile);
        assert_eq!((mv.row, mv.col), (1, 0));
        assert_eq!((mv.px, mv.py), tile_center(1, 0));
    }

    #[test]
    fn seam_exit_is_visible_before_rewrap() {
        let m = maze_from(&[
            "#####",
            ".....",
            "#####",
        ]);
        let mut mv = Mover::at_tile(1, 0);
        mv.dir = Some(Dir::Left);
        // Partial step toward the seam: pixel x goes negative but stays
        // within half a tile of the edge, so no rewrap yet.
        assert_eq!(mv.advance(10.0, &m, false), Step::Moved);
        assert!(mv.px < 0.0 && mv.px >= -TILE_SIZE / 2.0);
        assert_eq!(mv.col, 0);
    }

    #[test]
    fn vertical_off_grid_is_blocked() {
        let m = maze_from(&[
            ".....",
            ".....",
        ]);
        let mut mv = Mover::at_tile(0, 2);
        mv.dir = Some(Dir::Up);
        assert_eq!(mv.advance(8.0, &m, false), Step::Blocked);
        assert_eq!(mv.row, 0);
    }
}
