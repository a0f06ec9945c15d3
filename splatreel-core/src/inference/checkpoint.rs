// ============================================================================
// splatreel-core/src/inference/checkpoint.rs
// ============================================================================
//
// CHECKPOINT CACHE: Local Cache of the Pretrained Model Weights
//
// The predictor needs one checkpoint file. It is looked up in a cache
// directory and, when absent, downloaded once from a fixed HTTPS URL.
//
// KEY COMPONENTS:
// - CheckpointCache: Location of the cached file and where to fetch it from
// - CheckpointFetcher: Trait for the download transport (mockable)
// - HttpFetcher: reqwest-based transport, HTTPS only, TLS verified
//
// VERIFICATION:
// A download is accepted only if the body is non-empty and its length matches
// the advertised Content-Length. Anything else is ModelUnavailable and leaves
// nothing behind in the cache: the body is streamed into a temporary file in
// the cache directory and renamed into place only after it verifies.
//
// AI-ASSISTANT-INFO: Checkpoint resolution, download and verification

// ---- Internal crate imports ----
use super::DEFAULT_CHECKPOINT_URL;
use crate::error::{CoreError, CoreResult};

// ---- External crate imports ----
use log::{debug, info};
use tempfile::Builder as TempFileBuilder;

// ---- Standard library imports ----
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Result of streaming a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchedBody {
    pub bytes_written: u64,
    /// Length advertised by the server, if any.
    pub expected_len: Option<u64>,
}

/// Transport used to download a checkpoint.
pub trait CheckpointFetcher {
    /// Streams the body at `url` into `dest`.
    fn fetch(&self, url: &str, dest: &mut dyn Write) -> CoreResult<FetchedBody>;
}

/// HTTPS download via a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    connect_timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &mut dyn Write) -> CoreResult<FetchedBody> {
        let unavailable = |e: reqwest::Error| CoreError::ModelUnavailable(format!("download from {url} failed: {e}"));

        // No overall timeout: checkpoints are several gigabytes.
        let client = reqwest::blocking::Client::builder()
            .https_only(true)
            .connect_timeout(self.connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(unavailable)?;

        let mut response = client.get(url).send().and_then(|r| r.error_for_status()).map_err(unavailable)?;
        let expected_len = response.content_length();

        let bytes_written = io::copy(&mut response, dest)
            .map_err(|e| CoreError::ModelUnavailable(format!("download from {url} interrupted: {e}")))?;

        Ok(FetchedBody {
            bytes_written,
            expected_len,
        })
    }
}

/// Where the checkpoint lives locally and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointCache {
    pub dir: PathBuf,
    pub file_name: String,
    pub url: String,
}

impl CheckpointCache {
    /// Cache for `url`, named after the URL's last path segment.
    pub fn new(dir: impl Into<PathBuf>, url: impl Into<String>) -> CoreResult<Self> {
        let url = url.into();
        let file_name = url
            .split(['?', '#'])
            .next()
            .and_then(|u| u.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| CoreError::InvalidInput(format!("checkpoint URL has no file name: {url}")))?
            .to_string();

        Ok(Self {
            dir: dir.into(),
            file_name,
            url,
        })
    }

    /// Default SHARP checkpoint in the default cache directory.
    pub fn default_location() -> CoreResult<Self> {
        Self::new(default_cache_dir()?, DEFAULT_CHECKPOINT_URL)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Returns the cached checkpoint path if a non-empty file is present.
    pub fn cached(&self) -> Option<PathBuf> {
        let path = self.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Some(path),
            _ => None,
        }
    }

    /// Returns the checkpoint path, downloading it first if needed.
    ///
    /// # Errors
    ///
    /// `ModelUnavailable` if the URL is not HTTPS, the download fails, or the
    /// downloaded body does not verify.
    pub fn ensure(&self, fetcher: &dyn CheckpointFetcher) -> CoreResult<PathBuf> {
        if let Some(path) = self.cached() {
            debug!("Using cached checkpoint {}", path.display());
            return Ok(path);
        }

        if !self.url.starts_with("https://") {
            return Err(CoreError::ModelUnavailable(format!(
                "refusing to download checkpoint over an unverified transport: {}",
                self.url
            )));
        }

        let unavailable = |e: io::Error| {
            CoreError::ModelUnavailable(format!("cannot write to cache directory {}: {}", self.dir.display(), e))
        };

        fs::create_dir_all(&self.dir).map_err(unavailable)?;
        let mut temp = TempFileBuilder::new()
            .prefix(&format!(".{}-", self.file_name))
            .suffix(".part")
            .tempfile_in(&self.dir)
            .map_err(unavailable)?;

        info!("Downloading checkpoint {} to {}", self.url, self.dir.display());
        let body = {
            let mut writer = io::BufWriter::new(temp.as_file_mut());
            let body = fetcher.fetch(&self.url, &mut writer).map_err(|e| match e {
                CoreError::ModelUnavailable(_) => e,
                other => CoreError::ModelUnavailable(format!("download from {} failed: {}", self.url, other)),
            })?;
            writer.flush().map_err(unavailable)?;
            body
        };
        verify_body(&self.url, body)?;

        temp.as_file().sync_all().map_err(unavailable)?;
        let path = self.path();
        temp.persist(&path).map_err(|e| unavailable(e.error))?;

        info!("Checkpoint saved to {} ({} bytes)", path.display(), body.bytes_written);
        Ok(path)
    }
}

fn verify_body(url: &str, body: FetchedBody) -> CoreResult<()> {
    if body.bytes_written == 0 {
        return Err(CoreError::ModelUnavailable(format!("download from {url} returned an empty body")));
    }
    if let Some(expected) = body.expected_len {
        if expected != body.bytes_written {
            return Err(CoreError::ModelUnavailable(format!(
                "download from {url} failed verification: expected {expected} bytes, got {}",
                body.bytes_written
            )));
        }
    }
    Ok(())
}

/// Default checkpoint cache directory, shared with the PyTorch hub cache:
/// `$TORCH_HOME/hub/checkpoints`, else `<user cache dir>/torch/hub/checkpoints`.
pub fn default_cache_dir() -> CoreResult<PathBuf> {
    let torch_home = std::env::var_os("TORCH_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::cache_dir().map(|cache| cache.join("torch")))
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache").join("torch")))
        .ok_or_else(|| CoreError::PathError("cannot determine a cache directory for checkpoints".to_string()))?;

    Ok(torch_home.join("hub").join("checkpoints"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct StaticFetcher {
        body: Vec<u8>,
        advertised: Option<u64>,
    }

    impl CheckpointFetcher for StaticFetcher {
        fn fetch(&self, _url: &str, dest: &mut dyn Write) -> CoreResult<FetchedBody> {
            dest.write_all(&self.body)?;
            Ok(FetchedBody {
                bytes_written: self.body.len() as u64,
                expected_len: self.advertised,
            })
        }
    }

    fn cache(dir: &Path) -> CheckpointCache {
        CheckpointCache::new(dir.join("ckpt"), "https://example.com/models/sharp.pt?sig=1").unwrap()
    }

    #[test]
    fn test_default_cache_dir_is_torch_hub_layout() {
        if let Ok(dir) = default_cache_dir() {
            assert!(dir.ends_with(Path::new("hub").join("checkpoints")));
        }
    }

    #[test]
    fn test_file_name_from_url() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(cache(dir.path()).file_name, "sharp.pt");
        assert!(CheckpointCache::new(dir.path(), "https://example.com/").is_err());
    }

    #[test]
    fn test_download_then_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let fetcher = StaticFetcher {
            body: b"weights".to_vec(),
            advertised: Some(7),
        };

        let path = cache.ensure(&fetcher).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"weights");

        // Second call never touches the fetcher.
        let failing = StaticFetcher {
            body: Vec::new(),
            advertised: None,
        };
        assert_eq!(cache.ensure(&failing).unwrap(), path);
    }

    #[test]
    fn test_length_mismatch_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        let fetcher = StaticFetcher {
            body: b"trunc".to_vec(),
            advertised: Some(100),
        };

        assert!(matches!(cache.ensure(&fetcher), Err(CoreError::ModelUnavailable(_))));
        assert_eq!(fs::read_dir(&cache.dir).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_body_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = StaticFetcher {
            body: Vec::new(),
            advertised: None,
        };
        assert!(matches!(cache(dir.path()).ensure(&fetcher), Err(CoreError::ModelUnavailable(_))));
    }

    #[test]
    fn test_plain_http_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CheckpointCache::new(dir.path(), "http://example.com/sharp.pt").unwrap();
        let fetcher = StaticFetcher {
            body: b"weights".to_vec(),
            advertised: None,
        };
        assert!(matches!(cache.ensure(&fetcher), Err(CoreError::ModelUnavailable(_))));
        assert!(cache.cached().is_none());
    }
}
