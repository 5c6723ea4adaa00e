use chrono::Utc;
use log::{ debug, info };
use std::io;
use std::path::{ Path, PathBuf };
use tokio::fs::{ self, OpenOptions };
use tokio::io::AsyncWriteExt;

/// Writes uploaded files under a single directory as `<unix-millis>-<name>`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        info!("Uploads will be stored in: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores `bytes` and returns the path written. A name already taken by
    /// an earlier upload in the same millisecond moves to the next one.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let base = stored_basename(original_name);
        let mut stamp = Utc::now().timestamp_millis();

        loop {
            let path = self.dir.join(format!("{}-{}", stamp, base));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    debug!("Stored {} bytes at {}", bytes.len(), path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    stamp += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Last path component of a client-supplied filename.
fn stored_basename(original_name: &str) -> String {
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => "upload".to_string(),
        name => name.to_string(),
    }
}
