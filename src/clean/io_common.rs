use std::path::{Path, PathBuf};

/// Resolves a path of the configuration file against the directory of this file.
pub fn resolve_path(root_path: &Path, path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        return path.to_string();
    }
    let res: PathBuf = root_path.join(p);
    res.as_path().display().to_string()
}

/// Resolves a path given on the command line.
pub fn from_working_dir(path: &str) -> String {
    match std::env::current_dir() {
        Ok(cwd) => resolve_path(cwd.as_path(), path),
        Err(_) => path.to_string(),
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}
