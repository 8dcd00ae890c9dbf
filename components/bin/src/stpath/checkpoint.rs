use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use proto::crypto::BlockNumber;

#[derive(Debug)]
pub enum CheckpointError {
    ReadError(io::Error),
    WriteError(atomicwrites::Error<io::Error>),
    DeserializeError(serde_json::error::Error),
    SerializeError(serde_json::error::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    latest_block: BlockNumber,
}

/// Load the last processed block number.
/// A missing checkpoint file means nothing was processed yet.
pub fn load_checkpoint(path: &Path) -> Result<BlockNumber, CheckpointError> {
    if !path.exists() {
        return Ok(0);
    }
    let serialized_str = fs::read_to_string(path).map_err(CheckpointError::ReadError)?;
    let checkpoint_file: CheckpointFile =
        serde_json::from_str(&serialized_str).map_err(CheckpointError::DeserializeError)?;
    Ok(checkpoint_file.latest_block)
}

/// Store the last processed block number, atomically.
pub fn store_checkpoint(path: &Path, latest_block: BlockNumber) -> Result<(), CheckpointError> {
    let serialized_str = serde_json::to_string(&CheckpointFile { latest_block })
        .map_err(CheckpointError::SerializeError)?;

    let af = atomicwrites::AtomicFile::new(path, atomicwrites::AllowOverwrite);
    af.write(|fw| fw.write_all(serialized_str.as_bytes()))
        .map_err(CheckpointError::WriteError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_checkpoint_store_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        assert_eq!(load_checkpoint(&path).unwrap(), 0);

        store_checkpoint(&path, 17).unwrap();
        assert_eq!(load_checkpoint(&path).unwrap(), 17);

        store_checkpoint(&path, 0x1_0000_0000).unwrap();
        assert_eq!(load_checkpoint(&path).unwrap(), 0x1_0000_0000);
    }

    #[test]
    fn test_checkpoint_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "latest_block: 3").unwrap();

        match load_checkpoint(&path) {
            Err(CheckpointError::DeserializeError(_)) => {}
            _ => unreachable!(),
        }
    }
}
