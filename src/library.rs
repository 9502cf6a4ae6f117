//! Script files on disk.
//!
//! A script's name is its file stem: `scripts/heart.txt` is `heart`.

use std::path::{Path, PathBuf};

use cube_core::{compile_with, CompileOptions, CubeError, CubeResult, Script};
use tracing::debug;

use crate::config::CubeConfig;

/// A directory of script files sharing one extension.
#[derive(Debug, Clone)]
pub struct ScriptLibrary {
    dir: PathBuf,
    extension: String,
    options: CompileOptions,
}

impl ScriptLibrary {
    /// Library over `dir`, matching files ending in `.extension`.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            options: CompileOptions::default(),
        }
    }

    /// Library and compile options from the `[scripts]` and `[render]` sections.
    pub fn from_config(config: &CubeConfig) -> Self {
        Self::new(&config.scripts.dir, &config.scripts.extension).with_options(config.render)
    }

    /// Compile with `options` instead of the defaults.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Directory searched for scripts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Script names, sorted.
    pub fn list(&self) -> CubeResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// File backing `name`. Names containing path components are rejected.
    pub fn path_for(&self, name: &str) -> CubeResult<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !plain {
            return Err(CubeError::ScriptNotFound(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, self.extension)))
    }

    /// Read and compile `name`.
    pub fn load(&self, name: &str) -> CubeResult<Script> {
        let path = self.path_for(name)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CubeError::ScriptNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        debug!(script = name, path = %path.display(), "Loaded script");
        compile_with(name, &text, &self.options)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}
