/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::enemy::EnemyMode;
use domain::tile::Dir;
use sim::event::GameEvent;
use sim::highscore;
use sim::level::load_levels;
use sim::session::{FrameInput, GameSession, GameState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::{LoopCue, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    let levels = load_levels(&config.levels_dir);
    let high_score = highscore::load();
    let mut session = GameSession::new(levels, high_score);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Pixel Maze!");
    println!("Final Score: {}", session.score);
}

fn game_loop(
    session: &mut GameSession,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let mut muted = config.general.mute;
    let max_frame = Duration::from_millis(config.general.max_frame_ms);
    let mut last_frame = Instant::now();
    let mut pad_was_connected = gp.connected;

    loop {
        kb.drain_events();
        gp.update();

        // A pad yanked mid-game counts as a pause request.
        let pad_lost = pad_was_connected && !gp.connected;
        pad_was_connected = gp.connected;

        if kb.ctrl_c_pressed() {
            break;
        }
        // Q quits from the meta screens only.
        if kb.any_pressed(KEYS_QUIT)
            && matches!(
                session.state,
                GameState::Title | GameState::GameOver | GameState::Win
            )
        {
            break;
        }
        if kb.any_pressed(KEYS_MUTE) {
            muted = !muted;
        }

        // Clamp the frame delta so a stalled frame (window drag, suspend)
        // cannot teleport entities through walls.
        let dt = last_frame.elapsed().min(max_frame).as_secs_f32();
        last_frame = Instant::now();

        let input = FrameInput {
            dir: detect_steering(&kb, &gp),
            start: kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed(),
            pause: kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() || pad_lost,
        };

        let events = session.tick(dt, input);
        process_events(sound, muted, &events);

        // Background loop upkeep. Fright expiry emits no event, so the
        // cue is reconciled against the live session every frame.
        if let Some(s) = sound {
            let cue = if muted || session.state != GameState::Playing {
                None
            } else if session.enemies.iter().any(|e| e.mode == EnemyMode::Frightened) {
                Some(LoopCue::Fright)
            } else {
                Some(LoopCue::Siren)
            };
            s.set_loop(cue);
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, muted: bool, events: &[GameEvent]) {
    for event in events {
        // The high score is persisted even with sound off.
        if let GameEvent::HighScore(score) = event {
            if let Err(e) = highscore::save(*score) {
                eprintln!("Warning: could not save high score: {e}");
            }
        }
    }

    let sfx = match sound {
        Some(s) if !muted => s,
        _ => return,
    };
    for event in events {
        match event {
            GameEvent::PelletEaten => sfx.play_chomp(),
            GameEvent::PowerPelletEaten => sfx.play_power(),
            GameEvent::EnemyEaten { .. } => sfx.play_eat_enemy(),
            GameEvent::ExtraLife => sfx.play_extra_life(),
            GameEvent::PlayerDied => sfx.play_death(),
            GameEvent::LevelCleared => sfx.play_clear(),
            GameEvent::GameOver => sfx.play_game_over(),
            GameEvent::GameWon => sfx.play_win(),
            GameEvent::ReadyStarted => sfx.play_ready(),
            GameEvent::PlayingStarted => sfx.set_loop(Some(LoopCue::Siren)),
            GameEvent::HighScore(_) => {}
        }
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::Esc];
const KEYS_MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Steering intent for this frame. Held keys keep the buffered turn fresh,
/// so pre-turning before an intersection works like the original cabinet.
fn detect_steering(kb: &InputState, gp: &GamepadState) -> Option<Dir> {
    if let Some(d) = gp.dir_pressed() {
        return Some(d);
    }
    if kb.any_pressed(KEYS_UP) || kb.any_held(KEYS_UP) {
        Some(Dir::Up)
    } else if kb.any_pressed(KEYS_DOWN) || kb.any_held(KEYS_DOWN) {
        Some(Dir::Down)
    } else if kb.any_pressed(KEYS_LEFT) || kb.any_held(KEYS_LEFT) {
        Some(Dir::Left)
    } else if kb.any_pressed(KEYS_RIGHT) || kb.any_held(KEYS_RIGHT) {
        Some(Dir::Right)
    } else {
        None
    }
}
