/// Level loader.
///
/// ## Sources (priority order):
///   1. Levels directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1: `# Level Name`
///   Metadata: `@player r,c`
///             `@enemy r,c` (×4, in slot order: red pink cyan orange)
///             `@scatter r,c` (×4, same order)
///   Lines: map rows (equal width)
///
/// ## Tile legend:
///   '#' = Wall      '.' = Path (pellet)    'o' = Power pellet
///   ' ' = Empty     'H' = Pen interior     '=' = Pen door
///
/// A directory that yields no valid levels falls back to the embedded set.

use std::path::Path;

use thiserror::Error;

use crate::domain::tile::Tile;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level '{0}': rows have unequal widths")]
    RaggedGrid(String),
    #[error("level '{0}': no pellets")]
    NoPellets(String),
    #[error("level '{0}': missing or malformed @{1} metadata")]
    BadMetadata(String, &'static str),
    #[error("level '{0}': no pen door tile")]
    NoDoor(String),
    #[error("level '{0}': player start ({1}, {2}) is not walkable")]
    BadPlayerStart(String, i32, i32),
    #[error("level '{0}': enemy start ({1}, {2}) is out of bounds")]
    BadEnemyStart(String, i32, i32),
}

/// Static per-level data; the session copies the grid into the live maze.
#[derive(Clone, Debug)]
pub struct LevelData {
    pub name: String,
    pub grid: Vec<Vec<Tile>>,
    pub player_start: (i32, i32),
    /// Slot order: red (starts outside), pink, cyan, orange.
    pub enemy_starts: [(i32, i32); 4],
    pub scatter_targets: [(i32, i32); 4],
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load the level set: directory first, embedded fallback. Never empty.
pub fn load_levels(dir: &Path) -> Vec<LevelData> {
    if dir.is_dir() {
        let levels = load_from_directory(dir);
        if !levels.is_empty() {
            return levels;
        }
    }
    embedded_levels()
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelData> {
    let mut named: Vec<(String, LevelData)> = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            if let Ok(content) = std::fs::read_to_string(&path) {
                let filename = path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                match parse_level_file(&content, &filename) {
                    Ok(def) => named.push((filename, def)),
                    Err(e) => eprintln!("Rejected level file {}: {e}", path.display()),
                }
            }
        }
    }

    named.sort_by(|a, b| a.0.cmp(&b.0));
    named.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse and validate one level from text content.
pub fn parse_level_file(content: &str, fallback_name: &str) -> Result<LevelData, LevelError> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];
    let mut player_start: Option<(i32, i32)> = None;
    let mut enemy_starts: Vec<(i32, i32)> = vec![];
    let mut scatter_targets: Vec<(i32, i32)> = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(val) = line.strip_prefix("@player") {
            player_start = parse_coord(val);
        } else if let Some(val) = line.strip_prefix("@enemy") {
            if let Some(rc) = parse_coord(val) {
                enemy_starts.push(rc);
            }
        } else if let Some(val) = line.strip_prefix("@scatter") {
            if let Some(rc) = parse_coord(val) {
                scatter_targets.push(rc);
            }
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    let grid: Vec<Vec<Tile>> = rows.iter().map(|r| parse_row(r)).collect();

    let player_start =
        player_start.ok_or(LevelError::BadMetadata(name.clone(), "player"))?;
    let enemy_starts: [(i32, i32); 4] = enemy_starts
        .try_into()
        .map_err(|_| LevelError::BadMetadata(name.clone(), "enemy"))?;
    let scatter_targets: [(i32, i32); 4] = scatter_targets
        .try_into()
        .map_err(|_| LevelError::BadMetadata(name.clone(), "scatter"))?;

    let def = LevelData {
        name,
        grid,
        player_start,
        enemy_starts,
        scatter_targets,
    };
    validate(&def)?;
    Ok(def)
}

/// Distinguish `# Level Name` from a `#####...` map row: a name line
/// contains at least one letter after the hash.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic())
}

fn parse_coord(val: &str) -> Option<(i32, i32)> {
    let mut it = val.trim().split(',');
    let r = it.next()?.trim().parse().ok()?;
    let c = it.next()?.trim().parse().ok()?;
    Some((r, c))
}

fn parse_row(row: &str) -> Vec<Tile> {
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
}

fn validate(def: &LevelData) -> Result<(), LevelError> {
    let name = &def.name;
    let rows = def.grid.len() as i32;
    let cols = def.grid.first().map_or(0, |r| r.len()) as i32;

    if def.grid.iter().any(|r| r.len() as i32 != cols) || rows == 0 {
        return Err(LevelError::RaggedGrid(name.clone()));
    }
    if !def.grid.iter().flatten().any(|t| t.has_pellet()) {
        return Err(LevelError::NoPellets(name.clone()));
    }
    if !def.grid.iter().flatten().any(|&t| t == Tile::GhostDoor) {
        return Err(LevelError::NoDoor(name.clone()));
    }

    let in_bounds = |(r, c): (i32, i32)| r >= 0 && r < rows && c >= 0 && c < cols;

    let (pr, pc) = def.player_start;
    let start_ok = in_bounds((pr, pc))
        && !matches!(
            def.grid[pr as usize][pc as usize],
            Tile::Wall | Tile::GhostHouse | Tile::GhostDoor
        );
    if !start_ok {
        return Err(LevelError::BadPlayerStart(name.clone(), pr, pc));
    }

    for &(r, c) in &def.enemy_starts {
        if !in_bounds((r, c)) || def.grid[r as usize][c as usize] == Tile::Wall {
            return Err(LevelError::BadEnemyStart(name.clone(), r, c));
        }
    }

    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelData> {
    vec![
        make_embedded("Maze 1", &[
            "###################",
            "#........#........#",
            "#.##.###.#.###.##.#",
            "#o...............o#",
            "#.##.#.#####.#.##.#",
            "#....#...#...#....#",
            "####.### # ###.####",
            "   #.#       #.#   ",
            "####.# ##=## #.####",
            "    .  #HHH#  .    ",
            "####.# ##### #.####",
            "   #.#       #.#   ",
            "####.# ##### #.####",
            "#........#........#",
            "#.##.###.#.###.##.#",
            "#o.#..... .....#.o#",
            "##.#.#.#####.#.#.##",
            "#....#...#...#....#",
            "#.######.#.######.#",
            "#.................#",
            "###################",
        ]),
        make_embedded("Maze 2", &[
            "###################",
            "#.................#",
            "#.###.#.###.#.###.#",
            "#o....#..#..#....o#",
            "#.#.#.##.#.##.#.#.#",
            "#.#.............#.#",
            "###.#.## # ##.#.###",
            "   .#.#     #.#.   ",
            "###.#.# #=# #.#.###",
            "   ... #HHH# ...   ",
            "###.#.# ### #.#.###",
            "   .#.#     #.#.   ",
            "###.#.#######.#.###",
            "#........#........#",
            "#.##.#.#.#.#.#.##.#",
            "#o...#... ...#...o#",
            "#.##.#.#####.#.##.#",
            "#......#.#.#......#",
            "#.####.......####.#",
            "#......#...#......#",
            "###################",
        ]),
        make_embedded("Maze 3", &[
            "###################",
            "#.................#",
            "#.#.###.###.###.#.#",
            "#o#......#......#o#",
            "#.#.#.#.###.#.#.#.#",
            "#...#.........#...#",
            "###.#### # ####.###",
            "   ...#     #...   ",
            "###.#.# #=# #.#.###",
            "   .#. #HHH# .#.   ",
            "###.#.# ### #.#.###",
            "   ...#     #...   ",
            "###.###########.###",
            "#........#........#",
            "#.#.##.#.#.#.##.#.#",
            "#o....... .......o#",
            "#.#.#.##.#.##.#.#.#",
            "#.#.#.........#.#.#",
            "#.....#.###.#.....#",
            "#.###.........###.#",
            "###################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelData {
    LevelData {
        name: name.to_string(),
        grid: map.iter().map(|r| parse_row(r)).collect(),
        player_start: (15, 9),
        enemy_starts: [(9, 9), (9, 8), (9, 9), (9, 10)],
        scatter_targets: [(0, 17), (0, 1), (20, 17), (20, 1)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_levels_validate() {
        let levels = embedded_levels();
        assert_eq!(levels.len(), 3);
        for def in &levels {
            validate(def).unwrap();
            assert_eq!(def.grid.len(), 21);
            assert!(def.grid.iter().all(|r| r.len() == 19));
        }
    }

    #[test]
    fn embedded_starts_sit_on_expected_tiles() {
        for def in embedded_levels() {
            let (pr, pc) = def.player_start;
            assert_eq!(def.grid[pr as usize][pc as usize], Tile::Empty);
            // Pink/orange in the pen interior; red/cyan share the center
            // tile (red is relocated outside at spawn).
            for &(r, c) in &def.enemy_starts[1..] {
                assert_eq!(def.grid[r as usize][c as usize], Tile::GhostHouse);
            }
        }
    }

    #[test]
    fn parse_level_file_roundtrip() {
        let text = "\
# Test Maze
@player 3,1
@enemy 1,2
@enemy 2,2
@enemy 2,2
@enemy 2,3
@scatter 0,4
@scatter 0,1
@scatter 4,4
@scatter 4,1
######
#.o..#
##=HH#
#....#
######
";
        let def = parse_level_file(text, "test.txt").unwrap();
        assert_eq!(def.name, "Test Maze");
        assert_eq!(def.player_start, (3, 1));
        assert_eq!(def.enemy_starts[3], (2, 3));
        assert_eq!(def.grid[2][2], Tile::GhostDoor);
    }

    #[test]
    fn parse_rejects_missing_metadata() {
        let text = "\
# Broken
@player 1,1
####
#.=#
####
";
        let err = parse_level_file(text, "broken.txt").unwrap_err();
        assert!(matches!(err, LevelError::BadMetadata(_, "enemy")));
    }

    #[test]
    fn parse_rejects_player_start_in_wall() {
        let text = "\
# Walled
@player 0,0
@enemy 1,2
@enemy 1,2
@enemy 1,2
@enemy 1,2
#=##
#.H#
####
";
        let err = parse_level_file(
            &format!("{}{}", text, "@scatter 0,1\n".repeat(4)),
            "walled.txt",
        )
        .unwrap_err();
        assert!(matches!(err, LevelError::BadPlayerStart(_, 0, 0)));
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let levels = load_levels(Path::new("/nonexistent/levels"));
        assert_eq!(levels.len(), 3);
    }
}
