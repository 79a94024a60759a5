//! Default values for `TmuxConfig` fields, referenced from `#[serde(default = ...)]`.

/// Locate the tmux executable.
///
/// Searches `PATH` first, then well-known install locations for environments
/// where `PATH` is incomplete (e.g. macOS app bundles launched from Finder).
pub fn tmux_path() -> String {
    if let Ok(path_env) = std::env::var("PATH") {
        let separator = if cfg!(windows) { ';' } else { ':' };
        let executable = if cfg!(windows) { "tmux.exe" } else { "tmux" };

        for dir in path_env.split(separator) {
            let candidate = std::path::Path::new(dir).join(executable);
            if candidate.exists() {
                return candidate.to_string_lossy().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let macos_paths = ["/opt/homebrew/bin/tmux", "/usr/local/bin/tmux"];
        for path in macos_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let linux_paths = ["/usr/bin/tmux", "/usr/local/bin/tmux", "/snap/bin/tmux"];
        for path in linux_paths {
            if std::path::Path::new(path).exists() {
                return path.to_string();
            }
        }
    }

    "tmux".to_string()
}

pub fn default_session() -> Option<String> {
    None
}

pub fn auto_attach_session() -> Option<String> {
    None
}

pub fn prefix_key() -> String {
    "C-b".to_string() // Standard tmux prefix (Ctrl+B)
}

pub fn bool_true() -> bool {
    true
}

pub fn bool_false() -> bool {
    false
}

pub fn initial_client_size() -> Option<(usize, usize)> {
    None
}
