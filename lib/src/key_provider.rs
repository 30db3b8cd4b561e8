use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::crypto::PrivateKey;
use crate::error::{NodeError, Result};

/// Loads the node's private key from `path`, generating and persisting a
/// fresh one if the file does not yet exist. Read once at wallet init;
/// never rewritten by the core afterward.
pub fn load_or_generate(path: impl AsRef<Path>) -> Result<PrivateKey> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(hex) => PrivateKey::from_hex(hex.trim()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let key = PrivateKey::new();
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .map_err(|e| NodeError::StructureInvalid(e.to_string()))?;
                }
            }
            fs::write(path, key.to_hex()).map_err(|e| NodeError::StructureInvalid(e.to_string()))?;
            Ok(key)
        }
        Err(e) => Err(NodeError::StructureInvalid(e.to_string())),
    }
}

/// Deletes the key file, if present — an explicit operation for tests.
pub fn delete(path: impl AsRef<Path>) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(NodeError::StructureInvalid(e.to_string())),
    }
}
