/// Balance tables. Everything is indexed by the 0-based level; the last
/// entry repeats for levels past the end of a table.

/// Player speed, pixels per second, by level.
pub const PLAYER_SPEED: [f32; 3] = [76.0, 82.0, 88.0];
/// Player speed while any enemy is frightened.
pub const PLAYER_FRIGHT_SPEED: [f32; 3] = [82.0, 88.0, 94.0];

pub const ENEMY_NORMAL_SPEED: [f32; 3] = [66.0, 72.0, 80.0];
pub const ENEMY_FRIGHT_SPEED: [f32; 3] = [40.0, 42.0, 44.0];
pub const ENEMY_TUNNEL_SPEED: [f32; 3] = [36.0, 38.0, 40.0];
pub const ENEMY_RETURN_SPEED: [f32; 3] = [130.0, 140.0, 150.0];

/// Power pellet duration, seconds, by level.
pub const FRIGHT_TIME: [f32; 3] = [7.0, 6.0, 4.0];

/// Seconds each enemy waits in the pen before its first exit, by slot.
pub const EXIT_DELAY: [f32; 4] = [0.0, 0.0, 3.0, 6.0];

/// Scatter/chase phase durations, seconds, by level. Even indices are
/// scatter, odd are chase; past the end of the table the mode is
/// permanently chase.
const SCATTER_CHASE_1: [f32; 7] = [7.0, 20.0, 7.0, 20.0, 5.0, 20.0, 5.0];
const SCATTER_CHASE_2: [f32; 5] = [5.0, 20.0, 5.0, 20.0, 5.0];
const SCATTER_CHASE_3: [f32; 5] = [3.0, 20.0, 3.0, 20.0, 3.0];

pub fn scatter_chase(level: usize) -> &'static [f32] {
    match level {
        0 => &SCATTER_CHASE_1,
        1 => &SCATTER_CHASE_2,
        _ => &SCATTER_CHASE_3,
    }
}

/// Index a per-level table, clamping to the last entry.
pub fn by_level<T: Copy>(table: &[T], level: usize) -> T {
    table[level.min(table.len() - 1)]
}

pub const SCORE_PELLET: u32 = 10;
pub const SCORE_POWER: u32 = 50;
/// First eaten enemy per power pellet; doubles for each subsequent one.
pub const SCORE_ENEMY_BASE: u32 = 200;
/// Crossing this score awards one extra life, once per game.
pub const EXTRA_LIFE_SCORE: u32 = 10_000;

pub const START_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 5;

/// Fixed state dwell times, seconds.
pub const READY_TIME: f32 = 2.0;
pub const DEATH_TIME: f32 = 1.5;
pub const LEVEL_CLEAR_TIME: f32 = 2.0;
pub const GAME_OVER_TIME: f32 = 3.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_level_clamps_to_last_entry() {
        assert_eq!(by_level(&PLAYER_SPEED, 0), 76.0);
        assert_eq!(by_level(&PLAYER_SPEED, 2), 88.0);
        assert_eq!(by_level(&PLAYER_SPEED, 9), 88.0);
    }

    #[test]
    fn scatter_chase_tables_end_on_scatter() {
        // Odd length means the final timed phase is scatter; everything
        // after is permanent chase.
        for level in 0..3 {
            assert_eq!(scatter_chase(level).len() % 2, 1);
        }
        assert_eq!(scatter_chase(0)[0], 7.0);
        assert_eq!(scatter_chase(5), scatter_chase(2));
    }
}
