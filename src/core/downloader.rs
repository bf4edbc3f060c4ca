// Streams organized entries to their target paths

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::data::Entry;
use crate::core::transport::Transport;
use crate::error::{Result, RuvError};
use crate::ui::format_size;

const CHUNK_SIZE: usize = 64 * 1024;

pub struct Downloader<'t, T: Transport + ?Sized> {
    transport: &'t T,
}

impl<'t, T: Transport + ?Sized> Downloader<'t, T> {
    pub fn new(transport: &'t T) -> Self {
        Self { transport }
    }

    /// Download `entry` to its target path.
    ///
    /// Returns `false` without touching the network when the target already
    /// exists, and when the server refuses the request.
    pub fn download(&self, entry: &Entry) -> Result<bool> {
        let target = entry
            .target_path()
            .ok_or_else(|| RuvError::MissingTargetPath(entry.filename.clone()))?;
        if target.exists() {
            log::info!("Skipping {} - {} because it already exists.", target.display(), entry.url);
            return Ok(false);
        }
        log::warn!("Downloading {} to {}", entry.url, target.display());

        let mut download = self.transport.fetch(&entry.url)?;
        if !download.ok {
            log::warn!("Error {} for {}", download.status_code, entry.url);
            return Ok(false);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path(target);
        let start = Instant::now();
        let written = match stream_to(&mut download.body, &partial, download.content_length, start) {
            Ok(written) => written,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    log::debug!("Could not remove {}: {}", partial.display(), cleanup);
                }
                return Err(e);
            }
        };
        fs::rename(&partial, target)?;

        log::warn!(
            "{} ({}) downloaded in {}s!",
            target.display(),
            format_size(written),
            start.elapsed().as_secs()
        );
        Ok(true)
    }
}

/// `<target>.part`, where the body lands until it is complete
pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

fn stream_to(body: &mut dyn Read, path: &Path, total: Option<u64>, start: Instant) -> Result<u64> {
    let name = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut out = BufWriter::new(File::create(path)?);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    let mut tenths: u64 = 0;

    loop {
        let n = body.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        written += n as u64;

        if let Some(total) = total.filter(|t| *t > 0) {
            let current = written * 10 / total;
            if current > tenths {
                tenths = current;
                let secs = start.elapsed().as_secs_f64().max(0.001);
                log::info!("{} {}% ({}kbps)", name, tenths * 10, (written as f64 / secs / 1024.0) as u64);
            }
        }
    }
    out.flush()?;
    Ok(written)
}
