//! Staging of string bodies on disk.
//!
//! String entities are written to a fresh file in the platform temp dir and
//! streamed from there, so string and file bodies share one send path. The
//! file lives exactly as long as the `StagedBody` that owns it.

use std::io::Write;
use std::path::Path;

use rand::Rng;
use tempfile::NamedTempFile;

const NAME_LEN: usize = 15;
const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Random alphabetic file name, never reused across calls in practice.
pub fn random_file_name() -> String {
    let mut rng = rand::thread_rng();
    (0..NAME_LEN)
        .map(|_| LETTERS[rng.gen_range(0..LETTERS.len())] as char)
        .collect()
}

/// A string body written to a temp file; deleted on drop.
#[derive(Debug)]
pub struct StagedBody {
    file: NamedTempFile,
}

impl StagedBody {
    pub fn write(body: &str) -> std::io::Result<Self> {
        Self::write_in(&std::env::temp_dir(), body)
    }

    pub fn write_in(dir: &Path, body: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(&random_file_name())
            .suffix("")
            .rand_bytes(0)
            .tempfile_in(dir)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
