/// Events emitted during a simulation tick.
/// The presentation layer consumes these for sound and persistence.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PelletEaten,
    PowerPelletEaten,
    EnemyEaten { points: u32 },
    ExtraLife,
    PlayerDied,
    LevelCleared,
    ReadyStarted,
    /// The ready countdown finished or a pause was released.
    PlayingStarted,
    GameOver,
    GameWon,
    /// New high score; carries the value to persist.
    HighScore(u32),
}
