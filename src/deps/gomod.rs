// src/deps/gomod.rs

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{GomonError, Result};
use crate::fs::FileSystem;

/// The Go module being supervised: its import path (from `go.mod`) and the
/// directory that import path maps to on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    path: String,
    root: PathBuf,
}

fn module_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*module\s+"?([^\s"/][^\s"]*)"?\s*(?://.*)?$"#)
            .expect("module directive regex is valid")
    })
}

impl GoModule {
    pub fn new(path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Read `<root>/go.mod` and extract the `module` directive.
    pub fn discover(fs: &dyn FileSystem, root: &Path) -> Result<Self> {
        let go_mod = root.join("go.mod");
        let contents = fs.read_to_string(&go_mod).map_err(|e| GomonError::GoModule {
            path: go_mod.clone(),
            reason: e.to_string(),
        })?;

        let path = parse_module_path(&contents).ok_or_else(|| GomonError::GoModule {
            path: go_mod.clone(),
            reason: "no `module` directive found".to_string(),
        })?;

        Ok(Self::new(path, root))
    }

    /// Module import path, e.g. `github.com/acme/shop`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a module-internal import path to its package directory.
    ///
    /// Returns `None` for anything outside this module (stdlib, third-party,
    /// or a different module that merely shares a string prefix).
    pub fn local_dir(&self, import: &str) -> Option<PathBuf> {
        if import == self.path {
            return Some(self.root.clone());
        }
        let rest = import.strip_prefix(&self.path)?.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }
        Some(rest.split('/').fold(self.root.clone(), |dir, part| dir.join(part)))
    }
}

/// Extract the module path from the contents of a `go.mod` file.
pub fn parse_module_path(contents: &str) -> Option<String> {
    module_directive()
        .captures(contents)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn reads_bare_and_quoted_module_paths() {
        assert_eq!(
            parse_module_path("module github.com/acme/shop\n\ngo 1.22\n").as_deref(),
            Some("github.com/acme/shop")
        );
        assert_eq!(
            parse_module_path("// header\nmodule \"example.com/x\" // comment\n").as_deref(),
            Some("example.com/x")
        );
        assert_eq!(parse_module_path("go 1.22\n"), None);
    }

    #[test]
    fn directive_must_start_a_line() {
        let contents = "require example.com/module v1.0.0\nmodule example.com/real\n";
        assert_eq!(parse_module_path(contents).as_deref(), Some("example.com/real"));
    }

    #[test]
    fn local_dir_respects_path_boundaries() {
        let module = GoModule::new("example.com/shop", "/src/shop");
        assert_eq!(
            module.local_dir("example.com/shop/pkg/shared"),
            Some(PathBuf::from("/src/shop/pkg/shared"))
        );
        assert_eq!(module.local_dir("example.com/shop"), Some(PathBuf::from("/src/shop")));
        assert_eq!(module.local_dir("example.com/shopping/pkg"), None);
        assert_eq!(module.local_dir("fmt"), None);
        assert_eq!(module.local_dir("github.com/other/lib"), None);
    }

    #[test]
    fn discover_fails_without_go_mod() {
        let fs = MockFileSystem::new();
        let err = GoModule::discover(&fs, Path::new("/nowhere")).unwrap_err();
        assert!(matches!(err, GomonError::GoModule { .. }));
    }

    #[test]
    fn discover_reads_go_mod_from_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/src/shop/go.mod", "module example.com/shop\n");
        let module = GoModule::discover(&fs, Path::new("/src/shop")).unwrap();
        assert_eq!(module.path(), "example.com/shop");
        assert_eq!(module.root(), Path::new("/src/shop"));
    }
}
