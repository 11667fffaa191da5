/// Game session: the state machine driving one run of the game.
///
/// States:
///   Title → Ready → Playing ⇄ Paused
///   Playing → Dying → Ready (lives left) | GameOver
///   Playing → LevelComplete → Ready (next level) | Win
///   GameOver / Win → Title
///
/// `tick` is the single simulation entry point; the caller supplies a
/// clamped dt and the frame's input, and consumes the returned events.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::domain::enemy::{Enemy, EnemyMode, EnemySpeeds, TargetContext, ENEMY_KINDS};
use crate::domain::maze::Maze;
use crate::domain::player::Player;
use crate::domain::tile::{Dir, Pellet};
use crate::sim::event::GameEvent;
use crate::sim::level::LevelData;
use crate::sim::tuning::{
    by_level, scatter_chase, DEATH_TIME, ENEMY_FRIGHT_SPEED, ENEMY_NORMAL_SPEED,
    ENEMY_RETURN_SPEED, ENEMY_TUNNEL_SPEED, EXIT_DELAY, EXTRA_LIFE_SCORE, FRIGHT_TIME,
    GAME_OVER_TIME, LEVEL_CLEAR_TIME, MAX_LIVES, PLAYER_FRIGHT_SPEED, PLAYER_SPEED, READY_TIME,
    SCORE_ENEMY_BASE, SCORE_PELLET, SCORE_POWER, START_LIVES,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Title,
    Ready,
    Playing,
    Dying,
    LevelComplete,
    GameOver,
    Win,
    Paused,
}

/// One frame of player input, already mapped from device events.
#[derive(Clone, Copy, Default)]
pub struct FrameInput {
    pub dir: Option<Dir>,
    pub start: bool,
    pub pause: bool,
}

/// Floating score text shown where an enemy was eaten.
#[derive(Clone, Debug)]
pub struct ScorePopup {
    pub text: String,
    pub px: f32,
    pub py: f32,
    pub age: f32,
}

pub struct GameSession {
    pub maze: Maze,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub popups: Vec<ScorePopup>,

    pub state: GameState,
    pub state_timer: f32,
    pub game_time: f32,
    /// 0-based; displayed as level + 1.
    pub level: usize,
    pub score: u32,
    pub lives: u32,
    pub high_score: u32,
    extra_life_awarded: bool,
    enemies_eaten_this_power: u32,

    // Scatter/chase phase clock
    phase_index: usize,
    phase_timer: f32,
    pub scatter_phase: bool,

    levels: Vec<LevelData>,
    rng: SmallRng,
}

impl GameSession {
    pub fn new(levels: Vec<LevelData>, high_score: u32) -> Self {
        GameSession {
            maze: Maze::new(),
            player: Player::new(0, 0),
            enemies: vec![],
            popups: vec![],
            state: GameState::Title,
            state_timer: 0.0,
            game_time: 0.0,
            level: 0,
            score: 0,
            lives: START_LIVES,
            high_score,
            extra_life_awarded: false,
            enemies_eaten_this_power: 0,
            phase_index: 0,
            phase_timer: 0.0,
            scatter_phase: true,
            levels,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level_name(&self) -> &str {
        &self.levels[self.level].name
    }

    // ── Level setup ──

    fn load_level(&mut self) {
        let data = self.levels[self.level].clone();
        self.maze.load(&data.grid);

        let (pr, pc) = data.player_start;
        self.player.reset(pr, pc);
        self.player.speed = by_level(&PLAYER_SPEED, self.level);

        let speeds = EnemySpeeds {
            normal: by_level(&ENEMY_NORMAL_SPEED, self.level),
            frightened: by_level(&ENEMY_FRIGHT_SPEED, self.level),
            tunnel: by_level(&ENEMY_TUNNEL_SPEED, self.level),
            returning: by_level(&ENEMY_RETURN_SPEED, self.level),
        };
        self.enemies = ENEMY_KINDS
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let (r, c) = data.enemy_starts[i];
                let mut e = Enemy::new(kind, r, c);
                e.scatter_target = data.scatter_targets[i];
                e.speeds = speeds;
                e.exit_timer = EXIT_DELAY[i];
                e
            })
            .collect();

        // The red enemy starts live, on the tile just above the pen door.
        let (dr, dc) = self.maze.door();
        self.enemies[0].place_active(dr - 1, dc, EnemyMode::Scatter);

        self.phase_index = 0;
        self.phase_timer = 0.0;
        self.scatter_phase = true;
        self.enemies_eaten_this_power = 0;
        self.popups.clear();
    }

    /// Re-place entities after a death. Pellets and the phase clock are
    /// left as they are.
    fn reset_positions(&mut self) {
        let data = self.levels[self.level].clone();
        let (pr, pc) = data.player_start;
        self.player.reset(pr, pc);
        self.player.speed = by_level(&PLAYER_SPEED, self.level);

        for (i, e) in self.enemies.iter_mut().enumerate() {
            e.reset();
            e.exit_timer = EXIT_DELAY[i];
        }
        let (dr, dc) = self.maze.door();
        self.enemies[0].place_active(dr - 1, dc, EnemyMode::Scatter);

        self.enemies_eaten_this_power = 0;
        self.popups.clear();
    }

    // ── Main tick ──

    pub fn tick(&mut self, dt: f32, input: FrameInput) -> Vec<GameEvent> {
        let mut events = vec![];
        self.game_time += dt;

        self.popups.retain_mut(|p| {
            p.age += dt;
            p.age < 1.0
        });

        match self.state {
            GameState::Title => self.tick_title(input, &mut events),
            GameState::Ready => self.tick_ready(dt, &mut events),
            GameState::Playing => self.tick_playing(dt, input, &mut events),
            GameState::Dying => self.tick_dying(dt, &mut events),
            GameState::LevelComplete => self.tick_level_complete(dt, &mut events),
            GameState::GameOver | GameState::Win => self.tick_end_screen(dt, input),
            GameState::Paused => {
                if input.pause || input.start {
                    self.enter(GameState::Playing);
                    events.push(GameEvent::PlayingStarted);
                }
            }
        }

        events
    }

    fn tick_title(&mut self, input: FrameInput, events: &mut Vec<GameEvent>) {
        if input.start {
            self.score = 0;
            self.lives = START_LIVES;
            self.level = 0;
            self.extra_life_awarded = false;
            self.load_level();
            self.enter(GameState::Ready);
            events.push(GameEvent::ReadyStarted);
        }
    }

    fn tick_ready(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.state_timer += dt;
        if self.state_timer >= READY_TIME {
            self.enter(GameState::Playing);
            events.push(GameEvent::PlayingStarted);
        }
    }

    fn tick_playing(&mut self, dt: f32, input: FrameInput, events: &mut Vec<GameEvent>) {
        if input.pause {
            self.enter(GameState::Paused);
            return;
        }
        if let Some(d) = input.dir {
            self.player.set_direction(d);
        }

        self.update_phase(dt);

        // Player movement and pellets
        match self.player.update(dt, &mut self.maze) {
            Some(Pellet::Dot) => {
                self.add_score(SCORE_PELLET, events);
                events.push(GameEvent::PelletEaten);
            }
            Some(Pellet::Power) => {
                self.add_score(SCORE_POWER, events);
                events.push(GameEvent::PowerPelletEaten);
                self.enemies_eaten_this_power = 0;
                let duration = by_level(&FRIGHT_TIME, self.level);
                for e in &mut self.enemies {
                    e.frighten(duration);
                }
                self.player.speed = by_level(&PLAYER_FRIGHT_SPEED, self.level);
            }
            None => {}
        }

        // The speed boost lasts only while some enemy is still frightened.
        if !self.enemies.iter().any(|e| e.mode == EnemyMode::Frightened) {
            self.player.speed = by_level(&PLAYER_SPEED, self.level);
        }

        // Enemy movement
        let ctx = TargetContext {
            player_tile: (self.player.row(), self.player.col()),
            player_dir: self.player.dir(),
            anchor_tile: (self.enemies[0].row(), self.enemies[0].col()),
        };
        for e in &mut self.enemies {
            e.update(dt, &self.maze, &ctx, &mut self.rng);
        }

        // Collisions
        let (px, py) = (self.player.mover.px, self.player.mover.py);
        for i in 0..self.enemies.len() {
            if !self.enemies[i].touches(px, py) {
                continue;
            }
            match self.enemies[i].mode {
                EnemyMode::Frightened => {
                    self.enemies_eaten_this_power += 1;
                    let points =
                        SCORE_ENEMY_BASE * 2u32.pow(self.enemies_eaten_this_power - 1);
                    self.add_score(points, events);
                    self.popups.push(ScorePopup {
                        text: points.to_string(),
                        px: self.enemies[i].mover.px,
                        py: self.enemies[i].mover.py,
                        age: 0.0,
                    });
                    self.enemies[i].start_returning();
                    events.push(GameEvent::EnemyEaten { points });
                }
                EnemyMode::Returning => {}
                _ => {
                    self.lives -= 1;
                    self.enter(GameState::Dying);
                    events.push(GameEvent::PlayerDied);
                    return;
                }
            }
        }

        if self.maze.is_cleared() {
            self.enter(GameState::LevelComplete);
            events.push(GameEvent::LevelCleared);
        }
    }

    fn tick_dying(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.state_timer += dt;
        if self.state_timer >= DEATH_TIME {
            if self.lives == 0 {
                self.enter(GameState::GameOver);
                events.push(GameEvent::GameOver);
                self.commit_high_score(events);
            } else {
                self.reset_positions();
                self.enter(GameState::Ready);
                events.push(GameEvent::ReadyStarted);
            }
        }
    }

    fn tick_level_complete(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        self.state_timer += dt;
        if self.state_timer >= LEVEL_CLEAR_TIME {
            if self.level + 1 >= self.levels.len() {
                self.enter(GameState::Win);
                events.push(GameEvent::GameWon);
                self.commit_high_score(events);
            } else {
                self.level += 1;
                self.load_level();
                self.enter(GameState::Ready);
                events.push(GameEvent::ReadyStarted);
            }
        }
    }

    fn tick_end_screen(&mut self, dt: f32, input: FrameInput) {
        self.state_timer += dt;
        if self.state_timer >= GAME_OVER_TIME && input.start {
            self.enter(GameState::Title);
        }
    }

    fn enter(&mut self, state: GameState) {
        self.state = state;
        self.state_timer = 0.0;
    }

    // ── Scatter / chase phase clock ──

    fn update_phase(&mut self, dt: f32) {
        let phases = scatter_chase(self.level);

        // Past the end of the table the mode is permanently chase.
        if self.phase_index < phases.len() {
            self.phase_timer += dt;
            if self.phase_timer >= phases[self.phase_index] {
                self.phase_timer = 0.0;
                self.phase_index += 1;
                self.scatter_phase = self.phase_index % 2 == 0 && self.phase_index < phases.len();

                let new_mode = if self.scatter_phase {
                    EnemyMode::Scatter
                } else {
                    EnemyMode::Chase
                };
                for e in &mut self.enemies {
                    if matches!(e.mode, EnemyMode::Scatter | EnemyMode::Chase) {
                        e.mode = new_mode;
                        e.reverse();
                    }
                }
            }
        }

        // Reconcile enemies that re-entered scatter/chase this tick (fright
        // expiry, pen exit) with the live phase.
        let expected = if self.scatter_phase {
            EnemyMode::Scatter
        } else {
            EnemyMode::Chase
        };
        for e in &mut self.enemies {
            if matches!(e.mode, EnemyMode::Scatter | EnemyMode::Chase) {
                e.mode = expected;
            }
        }
    }

    // ── Scoring ──

    fn add_score(&mut self, points: u32, events: &mut Vec<GameEvent>) {
        self.score += points;
        if !self.extra_life_awarded && self.score >= EXTRA_LIFE_SCORE {
            self.extra_life_awarded = true;
            if self.lives < MAX_LIVES {
                self.lives += 1;
                events.push(GameEvent::ExtraLife);
            }
        }
    }

    fn commit_high_score(&mut self, events: &mut Vec<GameEvent>) {
        if self.score > self.high_score {
            self.high_score = self.score;
            events.push(GameEvent::HighScore(self.score));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mover::tile_center;
    use crate::sim::level::parse_level_file;

    fn tiny_level() -> LevelData {
        let text = "\
# Test Maze
@player 1,1
@enemy 3,3
@enemy 3,2
@enemy 3,3
@enemy 3,4
@scatter 0,6
@scatter 0,1
@scatter 4,6
@scatter 4,1
#######
#.o...#
###=###
##HHH##
#######
";
        parse_level_file(text, "test.txt").unwrap()
    }

    fn started_session() -> GameSession {
        let mut s = GameSession::new(vec![tiny_level()], 0);
        s.tick(0.0, FrameInput { start: true, ..Default::default() });
        assert_eq!(s.state, GameState::Ready);
        s.tick(READY_TIME, FrameInput::default());
        assert_eq!(s.state, GameState::Playing);
        s
    }

    fn park_enemy_on_player(s: &mut GameSession, idx: usize, mode: EnemyMode) {
        let (px, py) = (s.player.mover.px, s.player.mover.py);
        s.enemies[idx].mode = mode;
        s.enemies[idx].mover.px = px;
        s.enemies[idx].mover.py = py;
        s.enemies[idx].mover.row = s.player.row();
        s.enemies[idx].mover.col = s.player.col();
    }

    #[test]
    fn start_places_red_outside_above_door() {
        let s = started_session();
        let door = s.maze.door();
        assert_eq!(door, (2, 3));
        assert_eq!((s.enemies[0].row(), s.enemies[0].col()), (1, 3));
        assert_eq!(s.enemies[0].mode, EnemyMode::Scatter);
        for e in &s.enemies[1..] {
            assert_eq!(e.mode, EnemyMode::InHouse);
        }
        assert_eq!(s.lives, START_LIVES);
    }

    #[test]
    fn power_pellet_frightens_and_boosts_player() {
        let mut s = started_session();
        // Player at (1,1); the power pellet sits at (1,2).
        let events = s.tick(
            0.25,
            FrameInput { dir: Some(Dir::Right), ..Default::default() },
        );
        assert!(events.contains(&GameEvent::PowerPelletEaten));
        assert_eq!(s.score, SCORE_POWER);
        assert_eq!(s.player.speed, PLAYER_FRIGHT_SPEED[0]);
        // Housed enemies only arm the timer; the red one is live.
        assert_eq!(s.enemies[0].mode, EnemyMode::Frightened);
        for e in &s.enemies[1..] {
            assert!(matches!(e.mode, EnemyMode::InHouse | EnemyMode::Exiting));
            assert!(e.fright_timer > 0.0);
        }
    }

    #[test]
    fn eaten_enemy_scores_double_per_pellet() {
        let mut s = started_session();
        s.score = 0;

        park_enemy_on_player(&mut s, 0, EnemyMode::Frightened);
        s.enemies[0].fright_timer = 5.0;
        let events = s.tick(0.001, FrameInput::default());
        assert!(events.contains(&GameEvent::EnemyEaten { points: 200 }));
        assert_eq!(s.enemies[0].mode, EnemyMode::Returning);
        assert_eq!(s.popups.len(), 1);
        assert_eq!(s.popups[0].text, "200");

        // Second enemy under the same power pellet is worth double.
        park_enemy_on_player(&mut s, 1, EnemyMode::Frightened);
        s.enemies[1].fright_timer = 5.0;
        let events = s.tick(0.001, FrameInput::default());
        assert!(events.contains(&GameEvent::EnemyEaten { points: 400 }));
        assert_eq!(s.score, 600);
    }

    #[test]
    fn touching_active_enemy_costs_a_life_and_keeps_pellets() {
        let mut s = started_session();
        s.maze.eat_pellet(1, 1); // pellet progress to survive the reset
        let pellets = s.maze.pellets_left();

        park_enemy_on_player(&mut s, 0, EnemyMode::Chase);
        let events = s.tick(0.001, FrameInput::default());
        assert!(events.contains(&GameEvent::PlayerDied));
        assert_eq!(s.state, GameState::Dying);
        assert_eq!(s.lives, START_LIVES - 1);

        let events = s.tick(DEATH_TIME, FrameInput::default());
        assert!(events.contains(&GameEvent::ReadyStarted));
        assert_eq!(s.state, GameState::Ready);
        assert_eq!((s.player.row(), s.player.col()), (1, 1));
        assert_eq!(s.maze.pellets_left(), pellets);
        // Red back outside, the rest housed again.
        assert_eq!(s.enemies[0].mode, EnemyMode::Scatter);
        assert_eq!(s.enemies[1].mode, EnemyMode::InHouse);
    }

    #[test]
    fn returning_enemy_is_harmless() {
        let mut s = started_session();
        park_enemy_on_player(&mut s, 0, EnemyMode::Returning);
        // Keep it parked: returning motion only runs near the door.
        let events = s.tick(0.001, FrameInput::default());
        assert!(!events.contains(&GameEvent::PlayerDied));
        assert_eq!(s.state, GameState::Playing);
    }

    #[test]
    fn last_life_ends_the_game_and_commits_high_score() {
        let mut s = started_session();
        s.lives = 1;
        s.score = 1234;

        park_enemy_on_player(&mut s, 0, EnemyMode::Chase);
        s.tick(0.001, FrameInput::default());
        assert_eq!(s.state, GameState::Dying);

        let events = s.tick(DEATH_TIME, FrameInput::default());
        assert_eq!(s.state, GameState::GameOver);
        assert!(events.contains(&GameEvent::GameOver));
        assert!(events.contains(&GameEvent::HighScore(1234)));
        assert_eq!(s.high_score, 1234);

        // Start only works after the dwell time.
        s.tick(GAME_OVER_TIME, FrameInput { start: true, ..Default::default() });
        assert_eq!(s.state, GameState::Title);
    }

    #[test]
    fn phase_flip_reverses_active_enemies() {
        let mut s = started_session();
        assert!(s.scatter_phase);
        let dir_before = s.enemies[0].mover.dir;

        // Level 1 scatter lasts 7 s.
        s.update_phase(7.0);
        assert!(!s.scatter_phase);
        assert_eq!(s.enemies[0].mode, EnemyMode::Chase);
        assert_eq!(
            s.enemies[0].mover.dir,
            dir_before.map(|d| d.opposite())
        );
        // Housed enemies are untouched by the flip.
        assert_eq!(s.enemies[1].mode, EnemyMode::InHouse);
    }

    #[test]
    fn phase_table_exhaustion_means_permanent_chase() {
        let mut s = started_session();
        let total: f32 = scatter_chase(0).iter().sum();
        let mut elapsed = 0.0;
        while elapsed < total + 1.0 {
            s.update_phase(1.0);
            elapsed += 1.0;
        }
        assert!(!s.scatter_phase);
        // Long after the table ends, still chase.
        s.update_phase(100.0);
        assert!(!s.scatter_phase);
        assert_eq!(s.enemies[0].mode, EnemyMode::Chase);
    }

    #[test]
    fn clearing_pellets_wins_on_last_level() {
        let mut s = started_session();
        for col in 1..=5 {
            s.maze.eat_pellet(1, col);
        }

        let events = s.tick(0.001, FrameInput::default());
        assert!(events.contains(&GameEvent::LevelCleared));
        assert_eq!(s.state, GameState::LevelComplete);

        // Only one level in this set: clearing it wins the game.
        let events = s.tick(LEVEL_CLEAR_TIME, FrameInput::default());
        assert!(events.contains(&GameEvent::GameWon));
        assert_eq!(s.state, GameState::Win);
    }

    #[test]
    fn clearing_advances_to_next_level() {
        let mut s = GameSession::new(vec![tiny_level(), tiny_level()], 0);
        s.tick(0.0, FrameInput { start: true, ..Default::default() });
        s.tick(READY_TIME, FrameInput::default());
        for col in 1..=5 {
            s.maze.eat_pellet(1, col);
        }
        s.tick(0.001, FrameInput::default());

        s.tick(LEVEL_CLEAR_TIME, FrameInput::default());
        assert_eq!(s.state, GameState::Ready);
        assert_eq!(s.level, 1);
        assert_eq!(s.maze.pellets_left(), 5); // fresh pellets
    }

    #[test]
    fn extra_life_awarded_once_and_capped() {
        let mut s = started_session();
        let mut events = vec![];
        s.add_score(EXTRA_LIFE_SCORE, &mut events);
        assert_eq!(s.lives, START_LIVES + 1);
        assert!(events.contains(&GameEvent::ExtraLife));

        // Never a second one.
        let mut events = vec![];
        s.add_score(EXTRA_LIFE_SCORE, &mut events);
        assert_eq!(s.lives, START_LIVES + 1);
        assert!(events.is_empty());
    }

    #[test]
    fn playing_entry_is_signalled() {
        let mut s = GameSession::new(vec![tiny_level()], 0);
        let events = s.tick(0.0, FrameInput { start: true, ..Default::default() });
        assert!(events.contains(&GameEvent::ReadyStarted));
        assert!(!events.contains(&GameEvent::PlayingStarted));

        let events = s.tick(READY_TIME, FrameInput::default());
        assert_eq!(s.state, GameState::Playing);
        assert!(events.contains(&GameEvent::PlayingStarted));

        // Releasing a pause is a Playing entry too.
        s.tick(0.1, FrameInput { pause: true, ..Default::default() });
        let events = s.tick(0.1, FrameInput { pause: true, ..Default::default() });
        assert_eq!(s.state, GameState::Playing);
        assert!(events.contains(&GameEvent::PlayingStarted));
    }

    #[test]
    fn pause_freezes_play() {
        let mut s = started_session();
        let time_before = s.player.mover.px;
        s.tick(0.1, FrameInput { pause: true, ..Default::default() });
        assert_eq!(s.state, GameState::Paused);

        s.tick(0.1, FrameInput { dir: Some(Dir::Right), ..Default::default() });
        assert_eq!(s.player.mover.px, time_before);

        s.tick(0.1, FrameInput { pause: true, ..Default::default() });
        assert_eq!(s.state, GameState::Playing);
    }

    #[test]
    fn popups_expire_after_a_second() {
        let mut s = started_session();
        s.popups.push(ScorePopup {
            text: "200".into(),
            px: tile_center(1, 1).0,
            py: tile_center(1, 1).1,
            age: 0.0,
        });
        s.tick(0.5, FrameInput::default());
        assert_eq!(s.popups.len(), 1);
        s.tick(0.6, FrameInput::default());
        assert!(s.popups.is_empty());
    }
}
