//! Path helpers for user-supplied locations such as `log.output`.

use std::path::PathBuf;

/// Resolve a `~` or `~/...` log location against the home directory.
///
/// `~user` forms are not supported and, like every path without a leading
/// `~`, come back as given. So does the input when no home directory can be
/// determined.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}
