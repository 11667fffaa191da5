/// High score persistence: a single number in `hiscore.dat`.

use std::path::PathBuf;

const FILENAME: &str = "hiscore.dat";

fn data_dir() -> PathBuf {
    // 1. Exe directory (portable installs), if writable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_pixelmaze");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/pixelmaze) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/pixelmaze");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn load() -> u32 {
    let candidates = [data_dir().join(FILENAME), PathBuf::from(FILENAME)];
    for path in &candidates {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(v) = content.trim().parse() {
                return v;
            }
        }
    }
    0
}

pub fn save(score: u32) -> Result<(), String> {
    let path = data_dir().join(FILENAME);
    std::fs::write(&path, score.to_string())
        .map_err(|e| format!("High score save failed: {}", e))
}
