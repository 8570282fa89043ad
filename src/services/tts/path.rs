use std::path::{Path, PathBuf};

/// Resolve a binary: an explicit path wins when it exists, otherwise the
/// first of `names` found on `PATH`.
pub fn find_binary(explicit: Option<&Path>, names: &[&str]) -> Option<PathBuf> {
    if let Some(p) = explicit {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        // Bare names like "espeak-ng" are still searched on PATH.
        if let Some(found) = p.to_str().and_then(search_path) {
            return Some(found);
        }
    }
    names.iter().find_map(|name| search_path(name))
}

fn search_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return p.exists().then_some(p);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}
