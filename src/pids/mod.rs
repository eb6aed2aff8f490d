// src/pids/mod.rs

//! Registry of the OS processes the supervisor currently owns.
//!
//! The in-memory map (app name → pid) is written to
//! [`StateDir::pid_file`] periodically and at shutdown. Because the state
//! directory is namespaced by the configuration fingerprint, a supervisor
//! restarted after a crash finds exactly the pids its previous generation
//! left behind and can kill them before spawning anything new.

pub mod codec;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::errors::{GomonError, Result};
use crate::exec::signal::kill_group;
use crate::paths::StateDir;
use crate::types::AppName;

#[derive(Debug, Default)]
pub struct PidRegistry {
    pids: Mutex<BTreeMap<AppName, u32>>,
}

impl PidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<AppName, u32>> {
        self.pids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `pid` as the live process of `name`, replacing any older entry.
    pub fn add(&self, name: &str, pid: u32) {
        debug!(app = %name, pid, "tracking pid");
        self.map().insert(name.to_string(), pid);
    }

    /// Forget `name`, but only while it still points at `pid`.
    pub fn remove(&self, name: &str, pid: u32) {
        let mut map = self.map();
        if map.get(name) == Some(&pid) {
            map.remove(name);
            debug!(app = %name, pid, "untracking pid");
        }
    }

    pub fn snapshot(&self) -> BTreeMap<AppName, u32> {
        self.map().clone()
    }

    /// Write the current snapshot to the state directory.
    pub fn persist(&self, state: &StateDir) -> Result<()> {
        let bytes = codec::encode(&self.snapshot());
        write_pid_file(state, &bytes)
    }

    /// Read the mapping last persisted under `state`, without side effects.
    ///
    /// A missing file is an empty mapping.
    pub fn load(state: &StateDir) -> Result<BTreeMap<AppName, u32>> {
        let path = state.pid_file();
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("reading pid file {:?}", path))
                    .into());
            }
        };
        codec::decode(&bytes).map_err(|reason| GomonError::CorruptRegistry { path, reason })
    }

    /// Kill every process group recorded by a previous run under `state`.
    ///
    /// Unreadable or corrupt files count as "nothing to reap". Processes that
    /// no longer exist are ignored. The file is emptied afterwards so the same
    /// pids are never signalled twice. Returns the entries that were found.
    pub fn reap_stale(state: &StateDir) -> BTreeMap<AppName, u32> {
        let stale = match Self::load(state) {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable pid registry");
                BTreeMap::new()
            }
        };

        for (name, pid) in &stale {
            let Ok(raw) = i32::try_from(*pid) else {
                continue;
            };
            match kill_group(raw) {
                Ok(()) => info!(app = %name, pid, "killed leftover process from a previous run"),
                Err(errno) => debug!(app = %name, pid, %errno, "leftover process already gone"),
            }
        }

        if let Err(err) = write_pid_file(state, &codec::encode(&BTreeMap::new())) {
            warn!(error = %err, "failed to clear pid registry after reaping");
        }

        stale
    }
}

fn write_pid_file(state: &StateDir, bytes: &[u8]) -> Result<()> {
    let path = state.pid_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating pid directory at {:?}", parent))?;
    }
    // Readers only ever see a complete file: stage, then rename over.
    let staging = staging_path(&path);
    fs::write(&staging, bytes).with_context(|| format!("writing pid file at {:?}", staging))?;
    fs::rename(&staging, &path)
        .with_context(|| format!("replacing pid file at {:?}", path))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
