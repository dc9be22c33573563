use std::env;
use std::path::PathBuf;

pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .or_else(|| {
            let drive = env::var("HOMEDRIVE").ok()?;
            let path = env::var("HOMEPATH").ok()?;
            Some(PathBuf::from(format!("{drive}{path}")))
        })
}

/// Root for atelier state: `$ATELIER_DIR`, else `~/.atelier`, else `./.atelier`.
pub fn atelier_dir() -> PathBuf {
    if let Some(dir) = env::var_os("ATELIER_DIR") {
        return PathBuf::from(dir);
    }
    home_dir()
        .map(|home| home.join(".atelier"))
        .unwrap_or_else(|| PathBuf::from(".atelier"))
}
