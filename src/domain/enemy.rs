/// Enemy entity: a six-state machine over the shared tile-locked mover,
/// with four targeting personalities.
///
/// Mode graph:
///   InHouse → Exiting → {Scatter ⇄ Chase} ⇄ Frightened
///   any active mode → Returning → Exiting  (after being eaten)
///
/// Scatter/Chase flips are driven by the session's phase clock; Frightened
/// entry comes from the session when a power pellet is eaten. The machine
/// never terminates within a level.

use rand::Rng;

use super::maze::Maze;
use super::mover::{tile_center, Mover, Step, TILE_SIZE};
use super::tile::Dir;

/// AI personality, fixed per enemy slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    /// Red: targets the player's tile directly.
    Chase,
    /// Pink: targets 4 tiles ahead of the player's facing.
    Ambush,
    /// Cyan: doubles the vector from the red enemy through a point 2 tiles
    /// ahead of the player.
    Whimsy,
    /// Orange: chases when far (> 8 tiles Manhattan), retreats to its
    /// scatter corner when close.
    Shy,
}

pub const ENEMY_KINDS: [EnemyKind; 4] =
    [EnemyKind::Chase, EnemyKind::Ambush, EnemyKind::Whimsy, EnemyKind::Shy];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyMode {
    InHouse,
    Exiting,
    Scatter,
    Chase,
    Frightened,
    Returning,
}

/// Per-level speed table, pixels per second.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnemySpeeds {
    pub normal: f32,
    pub frightened: f32,
    pub tunnel: f32,
    pub returning: f32,
}

/// Everything an enemy needs to know about the rest of the world when
/// picking a chase target. Built by the session each tick; keeps the
/// enemies borrowable one at a time.
#[derive(Clone, Copy, Debug)]
pub struct TargetContext {
    pub player_tile: (i32, i32),
    pub player_dir: Option<Dir>,
    /// Current tile of the Chase-kind enemy (the Whimsy anchor).
    pub anchor_tile: (i32, i32),
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub mover: Mover,
    pub mode: EnemyMode,
    pub speeds: EnemySpeeds,
    /// Remaining frightened time; also armed while housed so the fright is
    /// applied on exit.
    pub fright_timer: f32,
    /// Last-two-seconds warning flash. Presentation only.
    pub flashing: bool,
    /// Time left before leaving the pen.
    pub exit_timer: f32,
    pub scatter_target: (i32, i32),
    start: (i32, i32),
    /// Suppresses the no-reversal rule for exactly one direction choice
    /// after a forced reversal.
    just_reversed: bool,
    /// Bob/wave animation clock. Presentation only.
    pub anim_timer: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, row: i32, col: i32) -> Self {
        let mut mover = Mover::at_tile(row, col);
        mover.dir = Some(Dir::Up);
        Enemy {
            kind,
            mover,
            mode: EnemyMode::InHouse,
            speeds: EnemySpeeds::default(),
            fright_timer: 0.0,
            flashing: false,
            exit_timer: 0.0,
            scatter_target: (0, 0),
            start: (row, col),
            just_reversed: false,
            anim_timer: 0.0,
        }
    }

    /// Back to the start tile and InHouse, keeping kind and speed table.
    pub fn reset(&mut self) {
        let (row, col) = self.start;
        self.mover = Mover::at_tile(row, col);
        self.mover.dir = Some(Dir::Up);
        self.mode = EnemyMode::InHouse;
        self.fright_timer = 0.0;
        self.flashing = false;
        self.just_reversed = false;
        self.anim_timer = 0.0;
    }

    /// Place directly on a tile in an active mode (used for the red enemy,
    /// which starts outside the pen).
    pub fn place_active(&mut self, row: i32, col: i32, mode: EnemyMode) {
        self.mover = Mover::at_tile(row, col);
        self.mover.dir = Some(Dir::Left);
        self.mode = mode;
    }

    pub fn row(&self) -> i32 {
        self.mover.row
    }

    pub fn col(&self) -> i32 {
        self.mover.col
    }

    /// Force a direction reversal (mode switches always flip direction).
    pub fn reverse(&mut self) {
        if let Some(d) = self.mover.dir {
            self.mover.dir = Some(d.opposite());
            self.just_reversed = true;
        }
    }

    /// Enter frightened mode. While housed or exiting only the timer is
    /// armed; the mode applies once the enemy emerges. Returning enemies
    /// ignore the fright entirely.
    pub fn frighten(&mut self, duration: f32) {
        match self.mode {
            EnemyMode::Returning => {}
            EnemyMode::InHouse | EnemyMode::Exiting => {
                self.fright_timer = duration;
            }
            _ => {
                self.mode = EnemyMode::Frightened;
                self.fright_timer = duration;
                self.flashing = false;
                self.reverse();
            }
        }
    }

    /// Eaten by the player: head home. Overrides any fright state.
    pub fn start_returning(&mut self) {
        self.mode = EnemyMode::Returning;
        self.fright_timer = 0.0;
        self.flashing = false;
    }

    /// Collision is active only once the enemy is out in the maze, and is
    /// a forgiving pixel-radius test rather than exact tile overlap.
    pub fn touches(&self, px: f32, py: f32) -> bool {
        if matches!(self.mode, EnemyMode::InHouse | EnemyMode::Exiting) {
            return false;
        }
        let dx = self.mover.px - px;
        let dy = self.mover.py - py;
        dx * dx + dy * dy < (TILE_SIZE * 0.8) * (TILE_SIZE * 0.8)
    }

    /// The tile this enemy is steering toward, or None for the random walk
    /// of frightened mode.
    fn target_tile(&self, maze: &Maze, ctx: &TargetContext) -> Option<(i32, i32)> {
        match self.mode {
            EnemyMode::Scatter => Some(self.scatter_target),
            EnemyMode::Frightened => None,
            EnemyMode::Returning => Some(maze.door()),
            _ => Some(self.chase_target(ctx)),
        }
    }

    fn chase_target(&self, ctx: &TargetContext) -> (i32, i32) {
        let (pr, pc) = ctx.player_tile;
        let (dr, dc) = ctx.player_dir.map_or((0, 0), Dir::delta);
        match self.kind {
            EnemyKind::Chase => (pr, pc),
            EnemyKind::Ambush => (pr + dr * 4, pc + dc * 4),
            EnemyKind::Whimsy => {
                // Reflect the anchor through the point 2 tiles ahead of the
                // player. Deliberately unclamped: the nearest-direction
                // heuristic degrades gracefully for off-grid targets.
                let ahead = (pr + dr * 2, pc + dc * 2);
                let (ar, ac) = ctx.anchor_tile;
                (ahead.0 + (ahead.0 - ar), ahead.1 + (ahead.1 - ac))
            }
            EnemyKind::Shy => {
                let dist = (self.row() - pr).abs() + (self.col() - pc).abs();
                if dist > 8 {
                    (pr, pc)
                } else {
                    self.scatter_target
                }
            }
        }
    }

    /// Pick the best direction at a tile center. Reversal is excluded
    /// unless nothing else is legal; ties go to the fixed scan order.
    fn choose_direction(
        &mut self,
        maze: &Maze,
        ctx: &TargetContext,
        rng: &mut impl Rng,
    ) -> Option<Dir> {
        let exclude = if self.just_reversed {
            None
        } else {
            self.mover.dir.map(Dir::opposite)
        };
        self.just_reversed = false;

        let available = maze.available_dirs(self.row(), self.col(), true, exclude);
        if available.is_empty() {
            // Dead end: reversal is the fallback.
            let all = maze.available_dirs(self.row(), self.col(), true, None);
            return all.first().copied().or(self.mover.dir);
        }
        if available.len() == 1 {
            return Some(available[0]);
        }

        let target = match self.target_tile(maze, ctx) {
            Some(t) => t,
            None => return Some(available[rng.gen_range(0..available.len())]),
        };

        let mut best = available[0];
        let mut best_dist = i64::MAX;
        for d in available {
            let (dr, dc) = d.delta();
            let nr = self.row() + dr;
            let nc = maze.wrap_col(self.col() + dc);
            let dist = i64::from(nr - target.0).pow(2) + i64::from(nc - target.1).pow(2);
            if dist < best_dist {
                best_dist = dist;
                best = d;
            }
        }
        Some(best)
    }

    /// Speed for this tick, by mode priority: returning > frightened >
    /// tunnel > normal.
    fn current_speed(&self, maze: &Maze) -> f32 {
        match self.mode {
            EnemyMode::Returning => self.speeds.returning,
            EnemyMode::Frightened => self.speeds.frightened,
            _ if maze.is_tunnel(self.row(), self.col()) => self.speeds.tunnel,
            _ => self.speeds.normal,
        }
    }

    /// Advance one tick.
    pub fn update(&mut self, dt: f32, maze: &Maze, ctx: &TargetContext, rng: &mut impl Rng) {
        self.anim_timer += dt * 5.0;
        let speed = self.current_speed(maze);

        if self.mode == EnemyMode::InHouse {
            self.exit_timer -= dt;
            if self.exit_timer <= 0.0 {
                self.mode = EnemyMode::Exiting;
            } else {
                // Bob in place while waiting.
                let (_, cy) = tile_center(self.start.0, self.start.1);
                self.mover.py = cy + (self.anim_timer * 2.0).sin() * 3.0;
                return;
            }
        }

        if self.mode == EnemyMode::Exiting {
            self.update_exiting(dt, maze);
            return;
        }

        if self.mode == EnemyMode::Returning && self.update_returning(dt, maze) {
            return;
        }

        if self.mode == EnemyMode::Frightened {
            self.fright_timer -= dt;
            self.flashing = self.fright_timer < 2.0;
            if self.fright_timer <= 0.0 {
                // The session reconciles to the live scatter/chase phase.
                self.mode = EnemyMode::Scatter;
                self.fright_timer = 0.0;
                self.flashing = false;
            }
        }

        if self.mover.dir.is_none() {
            self.mover.dir = self.choose_direction(maze, ctx, rng);
        }

        match self.mover.advance(speed * dt, maze, true) {
            Step::EnteredTile | Step::Blocked => {
                self.mover.dir = self.choose_direction(maze, ctx, rng);
            }
            _ => {}
        }
    }

    /// Scripted pen exit: align to the door column, rise through the door
    /// to the tile just above it, then go live.
    fn update_exiting(&mut self, dt: f32, maze: &Maze) {
        let (door_row, door_col) = maze.door();
        let (door_x, _) = tile_center(door_row, door_col);
        let (_, above_y) = tile_center(door_row - 1, door_col);
        let exit_speed = self.speeds.normal * 0.7;

        if (self.mover.px - door_x).abs() > 1.0 {
            let sign = if door_x > self.mover.px { 1.0 } else { -1.0 };
            self.mover.px += sign * exit_speed * dt;
            return;
        }
        self.mover.px = door_x;

        if self.mover.py > above_y + 1.0 {
            self.mover.py -= exit_speed * dt;
            return;
        }

        self.mover.py = above_y;
        self.mover.row = door_row - 1;
        self.mover.col = door_col;
        self.mover.dir = Some(Dir::Left);
        self.mode = if self.fright_timer > 0.0 {
            EnemyMode::Frightened
        } else {
            EnemyMode::Scatter
        };
    }

    /// Scripted pen re-entry once the returning enemy reaches the door:
    /// sink into the house, then immediately queue for exit with no delay.
    /// Returns true when the scripted motion consumed this tick.
    fn update_returning(&mut self, dt: f32, maze: &Maze) -> bool {
        let (door_row, door_col) = maze.door();
        let (door_x, door_y) = tile_center(door_row, door_col);
        let (_, inside_y) = tile_center(door_row + 1, door_col);

        if (self.mover.px - door_x).abs() < 2.0 && (self.mover.py - door_y).abs() < 2.0 {
            if self.mover.py < inside_y - 1.0 {
                self.mover.py += self.speeds.returning * dt;
                return true;
            }
            self.mover.py = inside_y;
            self.mover.row = door_row + 1;
            self.mover.col = door_col;
            self.mode = EnemyMode::Exiting;
            self.exit_timer = 0.0;
            return true;
        }
        false
    }
}
