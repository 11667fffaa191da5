/// Player entity: tile-locked motion plus a buffered "next direction" so a
/// turn can be entered before the intersection is reached.

use super::maze::Maze;
use super::mover::{Mover, Step};
use super::tile::{Dir, Pellet};

#[derive(Clone, Debug)]
pub struct Player {
    pub mover: Mover,
    /// Desired direction from input, applied at the next legal opportunity.
    pub next_dir: Option<Dir>,
    /// Pixels per second; the session swaps in the frightened-phase boost.
    pub speed: f32,
    pub moving: bool,
    /// Mouth animation phase, 0..1. Presentation only.
    pub mouth: f32,
    anim_timer: f32,
}

impl Player {
    pub fn new(row: i32, col: i32) -> Self {
        Player {
            mover: Mover::at_tile(row, col),
            next_dir: None,
            speed: 0.0,
            moving: false,
            mouth: 0.0,
            anim_timer: 0.0,
        }
    }

    /// Re-place at a start tile, clearing motion state. Speed is left for
    /// the session to set from the level tables.
    pub fn reset(&mut self, row: i32, col: i32) {
        let speed = self.speed;
        *self = Player::new(row, col);
        self.speed = speed;
    }

    /// Record the desired direction from input. Takes effect at a tile
    /// center, or immediately when it reverses the current direction.
    pub fn set_direction(&mut self, d: Dir) {
        self.next_dir = Some(d);
    }

    pub fn row(&self) -> i32 {
        self.mover.row
    }

    pub fn col(&self) -> i32 {
        self.mover.col
    }

    pub fn dir(&self) -> Option<Dir> {
        self.mover.dir
    }

    fn can_move(&self, d: Dir, maze: &Maze) -> bool {
        let (dr, dc) = d.delta();
        maze.is_walkable(self.mover.row + dr, self.mover.col + dc, false)
    }

    /// Advance one tick. Returns the pellet kind eaten on a tile crossing,
    /// for the session to score.
    pub fn update(&mut self, dt: f32, maze: &mut Maze) -> Option<Pellet> {
        self.anim_timer += dt * if self.moving { 10.0 } else { 4.0 };
        self.mouth = (self.anim_timer.sin() + 1.0) / 2.0;

        // Start moving from standstill once the buffered direction is legal.
        if self.mover.dir.is_none() {
            match self.next_dir {
                Some(d) if self.can_move(d, maze) => self.mover.dir = Some(d),
                _ => {
                    self.moving = false;
                    return None;
                }
            }
        }

        // Reversal never waits for an intersection.
        if let (Some(next), Some(cur)) = (self.next_dir, self.mover.dir) {
            if next == cur.opposite() {
                self.mover.dir = Some(next);
            }
        }

        self.moving = true;
        match self.mover.advance(self.speed * dt, maze, false) {
            Step::Blocked => {
                self.mover.dir = None;
                self.moving = false;
                None
            }
            Step::EnteredTile => {
                let ate = maze.eat_pellet(self.mover.row, self.mover.col);

                // At the tile center: prefer the buffered turn, else keep
                // going straight, else stop.
                let cur = self.mover.dir;
                if let Some(next) = self.next_dir {
                    if Some(next) != cur && self.can_move(next, maze) {
                        self.mover.dir = Some(next);
                        return ate;
                    }
                }
                if let Some(d) = cur {
                    if !self.can_move(d, maze) {
                        self.mover.dir = None;
                        self.moving = false;
                    }
                }
                ate
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::maze::tests::maze_from;
    use crate::domain::mover::tile_center;

    fn open_room() -> Maze {
        maze_from(&[
            "#####",
            "#...#",
            "#.#.#",
            "#...#",
            "#####",
        ])
    }

    #[test]
    fn idle_until_buffered_direction_is_walkable() {
        let mut maze = open_room();
        let mut p = Player::new(1, 1);
        p.speed = 60.0;

        // Up leads into a wall: stays put.
        p.set_direction(Dir::Up);
        assert_eq!(p.update(0.1, &mut maze), None);
        assert_eq!((p.row(), p.col()), (1, 1));
        assert!(!p.moving);

        // Right is open: starts moving.
        p.set_direction(Dir::Right);
        p.update(0.1, &mut maze);
        assert_eq!(p.dir(), Some(Dir::Right));
        assert!(p.moving);
    }

    #[test]
    fn eats_pellet_on_tile_crossing() {
        let mut maze = maze_from(&[
            "#####",
            "# .o#",
            "#####",
        ]);
        let mut p = Player::new(1, 1);
        p.speed = 160.0;
        p.set_direction(Dir::Right);

        let before = maze.pellets_left();
        let ate = p.update(0.1, &mut maze); // 16 px: exactly one tile
        assert_eq!(ate, Some(Pellet::Dot));
        assert_eq!((p.row(), p.col()), (1, 2));
        assert_eq!(maze.pellets_left(), before - 1);
        assert_eq!(maze.tile_at(1, 2), crate::domain::tile::Tile::Empty);

        let ate = p.update(0.1, &mut maze);
        assert_eq!(ate, Some(Pellet::Power));
    }

    #[test]
    fn immediate_reversal_mid_tile() {
        let mut maze = open_room();
        let mut p = Player::new(1, 2);
        p.speed = 60.0;
        p.set_direction(Dir::Right);
        p.update(0.1, &mut maze); // 6 px toward (1,3)
        let drifted_px = p.mover.px;

        p.set_direction(Dir::Left);
        p.update(0.05, &mut maze); // reverses without waiting for a center
        assert_eq!(p.dir(), Some(Dir::Left));
        assert_eq!((p.row(), p.col()), (1, 2));
        assert!(p.mover.px < drifted_px);
    }

    #[test]
    fn buffered_turn_taken_at_tile_center() {
        let mut maze = open_room();
        // Moving right along the top corridor with Down buffered: the turn
        // is illegal mid-corridor (wall below (1,2)) and becomes legal at
        // the (1,3) intersection.
        let mut p = Player::new(1, 2);
        p.mover.dir = Some(Dir::Right);
        p.speed = 160.0;
        p.set_direction(Dir::Down);
        p.update(0.1, &mut maze); // crosses into (1,3); down is open there
        assert_eq!((p.row(), p.col()), (1, 3));
        assert_eq!(p.dir(), Some(Dir::Down));
    }

    #[test]
    fn stops_and_snaps_at_wall() {
        let mut maze = open_room();
        let mut p = Player::new(1, 3);
        p.mover.dir = Some(Dir::Right); // wall at (1,4)
        p.speed = 60.0;
        p.update(0.1, &mut maze);
        assert_eq!(p.dir(), None);
        assert!(!p.moving);
        assert_eq!((p.mover.px, p.mover.py), tile_center(1, 3));
    }

    #[test]
    fn cannot_enter_pen() {
        let mut maze = maze_from(&[
            "#=#",
            "# #",
            "###",
        ]);
        let mut p = Player::new(1, 1);
        p.speed = 60.0;
        p.set_direction(Dir::Up);
        p.update(0.1, &mut maze);
        assert_eq!(p.dir(), None);
        assert_eq!((p.row(), p.col()), (1, 1));
    }
}
