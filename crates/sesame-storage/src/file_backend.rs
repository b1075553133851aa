use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sesame_core::session::{BackendError, SessionBackend};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Directory-backed session area. One file per entry; removing the directory
/// ends the session.
#[derive(Debug, Clone)]
pub struct FileSessionBackend {
    root: PathBuf,
}

impl FileSessionBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deletes the session directory and everything in it.
    #[instrument(skip_all, fields(root = %self.root.display()))]
    pub fn destroy(&self) -> Result<(), BackendError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(err)),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(encode_name(name))
    }
}

impl SessionBackend for FileSessionBackend {
    fn get(&self, name: &str) -> Result<Option<String>, BackendError> {
        let bytes = match fs::read(self.path_for(name)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(err)),
        };

        // Entries are always written as text; anything else is corruption.
        match String::from_utf8(bytes) {
            Ok(contents) => Ok(Some(contents)),
            Err(_) => {
                debug!(name, "discarding non-utf8 session entry");
                Ok(None)
            }
        }
    }

    #[instrument(skip_all, fields(name))]
    fn set(&self, name: &str, value: &str) -> Result<(), BackendError> {
        fs::create_dir_all(&self.root).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(self.path_for(name))
            .map_err(|e| io_err(e.error))?;
        Ok(())
    }

    #[instrument(skip_all, fields(name))]
    fn remove(&self, name: &str) -> Result<(), BackendError> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(err)),
        }
    }

    fn names(&self) -> Result<Vec<String>, BackendError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_err)?;
            if !entry.file_type().map_err(io_err)?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            // Temp files from interrupted writes never decode.
            match file_name.to_str().and_then(decode_name) {
                Some(name) => names.push(name),
                None => debug!(file = ?file_name, "skipping foreign file in session dir"),
            }
        }
        Ok(names)
    }
}

fn encode_name(name: &str) -> String {
    URL_SAFE_NO_PAD.encode(name)
}

fn decode_name(file_name: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(file_name).ok()?;
    String::from_utf8(bytes).ok()
}

fn io_err<E: ToString>(err: E) -> BackendError {
    BackendError::Io {
        reason: err.to_string(),
    }
}
