//! Shader sources and hot-reload
//!
//! The mesh shader is embedded at compile time. Debug builds can watch the
//! source directory and rebuild pipelines when a `.wgsl` file is saved.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::time::{Duration, Instant};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

/// The embedded scene mesh shader
pub const VIEWER_SHADER: &str = include_str!("viewer.wgsl");

/// Get the path to the shaders directory
pub fn shaders_dir() -> PathBuf {
    // Relative to the manifest so it only resolves in a source checkout
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("src").join("shaders")
}

pub fn viewer_shader_path() -> PathBuf {
    shaders_dir().join("viewer.wgsl")
}

/// Load the mesh shader source from disk
pub fn load_viewer_shader() -> Result<String, std::io::Error> {
    std::fs::read_to_string(viewer_shader_path())
}

/// Watches shader files for changes and signals when reloading is needed
pub struct ShaderWatcher {
    /// Kept alive to maintain the watch
    _watcher: RecommendedWatcher,
    receiver: Receiver<Result<Event, notify::Error>>,
    /// Last time we detected a change (for debouncing)
    last_change: Option<Instant>,
    debounce_duration: Duration,
    pending_path: Option<PathBuf>,
}

impl ShaderWatcher {
    /// Watch `dir` for changes to `.wgsl` files
    pub fn new(dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Shader hot-reload enabled, watching: {}", dir.display());

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            last_change: None,
            debounce_duration: Duration::from_millis(100),
            pending_path: None,
        })
    }

    /// Poll for shader changes
    ///
    /// Returns `Some(path)` once a `.wgsl` file changed and the debounce
    /// window has passed.
    pub fn poll(&mut self) -> Option<PathBuf> {
        loop {
            match self.receiver.try_recv() {
                Ok(Ok(event)) => {
                    for path in event.paths {
                        if is_shader(&path) {
                            self.last_change = Some(Instant::now());
                            self.pending_path = Some(path);
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!("Shader watcher error: {:?}", e);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::error!("Shader watcher channel disconnected");
                    break;
                }
            }
        }

        if let (Some(last), Some(path)) = (self.last_change, self.pending_path.take()) {
            if last.elapsed() >= self.debounce_duration {
                self.last_change = None;
                tracing::info!("Shader changed: {}", path.display());
                return Some(path);
            }
            // Not ready yet
            self.pending_path = Some(path);
        }

        None
    }
}

fn is_shader(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "wgsl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_shader_path() {
        let path = viewer_shader_path();
        assert!(path.exists(), "Viewer shader should exist at {:?}", path);
    }

    #[test]
    fn test_embedded_shader_entry_points() {
        assert!(VIEWER_SHADER.contains("fn vs_main"));
        assert!(VIEWER_SHADER.contains("fn fs_main"));
        assert!(VIEWER_SHADER.contains("aces_filmic"));
    }

    #[test]
    fn test_disk_copy_matches_embedded() {
        let source = load_viewer_shader().expect("Failed to load shader");
        assert_eq!(source, VIEWER_SHADER);
    }

    #[test]
    fn test_only_wgsl_counts() {
        assert!(is_shader(Path::new("src/shaders/viewer.wgsl")));
        assert!(!is_shader(Path::new("src/shaders/mod.rs")));
    }
}
