//! Build backend that "compiles" an application into a shell script.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use gomon::errors::GomonError;
use gomon::exec::backend::{BuildBackend, BuildFuture, BuildRequest};
use gomon::exec::output::{AppLog, LineScope, Stream};
use tempfile::TempDir;

/// Each configured app gets a pre-written `sh` script; a build links the
/// requested output path to it. Scripts are written once, up front, so the
/// file being exec'd is never open for writing.
#[derive(Debug, Clone)]
pub struct ScriptToolchain {
    dir: Arc<TempDir>,
    scripts: Arc<Mutex<BTreeMap<String, PathBuf>>>,
    failing: Arc<Mutex<BTreeSet<String>>>,
    builds: Arc<Mutex<BTreeMap<String, usize>>>,
}

impl ScriptToolchain {
    pub fn new() -> Self {
        Self {
            dir: Arc::new(tempfile::tempdir().expect("create script dir")),
            scripts: Arc::default(),
            failing: Arc::default(),
            builds: Arc::default(),
        }
    }

    /// Register the body of `app`'s "binary".
    pub fn script(self, app: &str, body: &str) -> Self {
        let path = self.dir.path().join(format!("{app}.sh"));
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
        self.scripts.lock().unwrap().insert(app.to_string(), path);
        self
    }

    /// Make builds of `app` fail (or succeed again).
    pub fn set_failing(&self, app: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(app.to_string());
        } else {
            set.remove(app);
        }
    }

    pub fn builds(&self, app: &str) -> usize {
        self.builds.lock().unwrap().get(app).copied().unwrap_or(0)
    }

    fn link(&self, app: &str, output: &Path) -> io::Result<bool> {
        let Some(script) = self.scripts.lock().unwrap().get(app).cloned() else {
            return Ok(false);
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        match fs::remove_file(output) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        symlink(script, output)?;
        Ok(true)
    }
}

impl Default for ScriptToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildBackend for ScriptToolchain {
    fn build<'a>(&'a self, request: BuildRequest<'a>, log: &'a AppLog) -> BuildFuture<'a> {
        Box::pin(async move {
            *self
                .builds
                .lock()
                .unwrap()
                .entry(request.app.to_string())
                .or_default() += 1;
            log.line(None, Stream::Stdout, LineScope::Build, "compiling");

            if self.failing.lock().unwrap().contains(request.app) {
                log.line(None, Stream::Stderr, LineScope::Build, "syntax error");
                return Err(GomonError::BuildFailed {
                    app: request.app.to_string(),
                    code: 1,
                });
            }
            if !self.link(request.app, request.output)? {
                return Err(GomonError::BuildFailed {
                    app: request.app.to_string(),
                    code: 1,
                });
            }
            Ok(())
        })
    }
}
