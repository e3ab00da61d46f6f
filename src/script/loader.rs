// Reads the dump resource from disk
use crate::error::InputError;
use crate::types::RawScript;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Load a dump file. Missing files and files without meaningful content are errors.
pub async fn load_dump(path: impl AsRef<Path>) -> Result<RawScript, InputError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading dump file");

    let text = fs::read_to_string(path).await.map_err(|source| match source.kind() {
        ErrorKind::NotFound => InputError::FileNotFound { path: path.to_path_buf() },
        _ => InputError::Read { path: path.to_path_buf(), source },
    })?;

    let script = RawScript::from_text(text).ok_or_else(|| InputError::Empty {
        path: path.to_path_buf(),
    })?;

    info!(path = %path.display(), bytes = script.byte_len(), "Dump file loaded");
    Ok(script)
}
