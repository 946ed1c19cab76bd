use crate::model::Track;
use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The fixed relative path the manifest is expected at when no override is
/// given.
pub const DEFAULT_MANIFEST_PATH: &str = "tracks.json";

const HTTP_READ_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_MANIFEST_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    Http { addr: String, path: String },
}

impl ManifestSource {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            anyhow::bail!("manifest location cannot be empty");
        }

        if let Some(rest) = trimmed.strip_prefix("http://") {
            let (addr, path) = match rest.split_once('/') {
                Some((addr, path)) => (addr.to_string(), format!("/{path}")),
                None => (rest.to_string(), String::from("/")),
            };
            if addr.is_empty() {
                anyhow::bail!("manifest url is missing a host");
            }
            let addr = if addr.contains(':') {
                addr
            } else {
                format!("{addr}:80")
            };
            return Ok(Self::Http { addr, path });
        }

        if trimmed.starts_with("https://") {
            anyhow::bail!("https manifests are not supported, use http or a local path");
        }

        Ok(Self::File(PathBuf::from(trimmed)))
    }

    /// Directory relative media paths resolve against: the manifest's own
    /// directory for file sources, the working directory for http sources.
    pub fn asset_base(&self) -> PathBuf {
        match self {
            Self::File(path) => path.parent().map(PathBuf::from).unwrap_or_default(),
            Self::Http { .. } => PathBuf::new(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Http { addr, path } => format!("http://{addr}{path}"),
        }
    }

    fn fetch(&self) -> Result<Vec<Track>> {
        let raw = match self {
            Self::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read manifest {}", path.display()))?,
            Self::Http { addr, path } => http_get(addr, path)?,
        };
        let tracks: Vec<Track> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse track manifest {}", self.describe()))?;
        Ok(tracks)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

/// Fetches the track catalog at most once per session. A failed load is
/// terminal: the stored message is shown in place of the track list and no
/// retry happens.
#[derive(Debug)]
pub struct CatalogLoader {
    source: ManifestSource,
    status: LoadStatus,
    tracks: Vec<Track>,
}

impl CatalogLoader {
    pub fn new(source: ManifestSource) -> Self {
        Self {
            source,
            status: LoadStatus::Idle,
            tracks: Vec::new(),
        }
    }

    pub fn source(&self) -> &ManifestSource {
        &self.source
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Idempotent by status: only an `Idle` loader fetches. Calls after a
    /// success or failure are no-ops.
    pub fn load(&mut self) {
        if self.status != LoadStatus::Idle {
            return;
        }

        self.status = LoadStatus::Loading;
        match self.source.fetch() {
            Ok(tracks) => {
                self.tracks = tracks;
                self.status = LoadStatus::Succeeded;
            }
            Err(err) => {
                self.tracks.clear();
                self.status = LoadStatus::Failed(format!("{err:#}"));
            }
        }
    }

    pub fn track_path(&self, index: usize) -> Option<PathBuf> {
        self.tracks.get(index).map(|track| {
            let file = Path::new(&track.file);
            if file.is_absolute() {
                file.to_path_buf()
            } else {
                self.source.asset_base().join(file)
            }
        })
    }
}

fn http_get(addr: &str, path: &str) -> Result<String> {
    let mut stream = TcpStream::connect(addr)
        .with_context(|| format!("failed to connect to manifest host {addr}"))?;
    stream
        .set_read_timeout(Some(HTTP_READ_TIMEOUT))
        .context("failed to set manifest read timeout")?;

    let host = addr.strip_suffix(":80").unwrap_or(addr);
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {host}\r\nAccept: application/json\r\nConnection: close\r\n\r\n"
    );
    stream
        .write_all(request.as_bytes())
        .context("failed to send manifest request")?;
    stream.flush().context("failed to flush manifest request")?;

    let mut reader = BufReader::new(stream);
    let mut status_line = String::new();
    reader
        .read_line(&mut status_line)
        .context("failed to read manifest response")?;
    let code = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|field| field.parse::<u16>().ok())
        .with_context(|| format!("malformed response status line: {}", status_line.trim()))?;
    if !(200..300).contains(&code) {
        anyhow::bail!("manifest request to http://{addr}{path} failed with status {code}");
    }

    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .context("failed to read manifest response headers")?;
        if read == 0 {
            anyhow::bail!("connection closed before manifest body");
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse::<usize>().ok();
        }
    }

    let mut body = Vec::new();
    match content_length {
        Some(length) => {
            if length > MAX_MANIFEST_BYTES {
                anyhow::bail!("manifest body too large: {length} bytes");
            }
            body.resize(length, 0);
            reader
                .read_exact(&mut body)
                .context("failed to read manifest body")?;
        }
        None => {
            reader
                .take(MAX_MANIFEST_BYTES as u64 + 1)
                .read_to_end(&mut body)
                .context("failed to read manifest body")?;
            if body.len() > MAX_MANIFEST_BYTES {
                anyhow::bail!("manifest body too large");
            }
        }
    }

    String::from_utf8(body).context("manifest body is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_file_and_http_sources() {
        assert_eq!(
            ManifestSource::parse("music/tracks.json").expect("file source"),
            ManifestSource::File(PathBuf::from("music/tracks.json"))
        );
        assert_eq!(
            ManifestSource::parse("http://127.0.0.1:8080/tracks.json").expect("http source"),
            ManifestSource::Http {
                addr: String::from("127.0.0.1:8080"),
                path: String::from("/tracks.json"),
            }
        );
        assert_eq!(
            ManifestSource::parse("http://example.local").expect("bare host"),
            ManifestSource::Http {
                addr: String::from("example.local:80"),
                path: String::from("/"),
            }
        );
        assert!(ManifestSource::parse("").is_err());
        assert!(ManifestSource::parse("https://example.local/tracks.json").is_err());
    }

    #[test]
    fn load_reads_manifest_and_resolves_media_against_its_directory() {
        let dir = tempdir().expect("tempdir");
        let manifest = dir.path().join("tracks.json");
        fs::write(
            &manifest,
            r#"[{"title":"First","file":"audio/first.mp3"},{"title":"Second","file":"second.mp3"}]"#,
        )
        .expect("write manifest");

        let mut loader = CatalogLoader::new(ManifestSource::File(manifest));
        loader.load();

        assert_eq!(loader.status(), &LoadStatus::Succeeded);
        assert_eq!(loader.tracks().len(), 2);
        assert_eq!(loader.tracks()[0].title, "First");
        assert_eq!(
            loader.track_path(0),
            Some(dir.path().join("audio/first.mp3"))
        );
        assert_eq!(loader.track_path(2), None);
    }

    #[test]
    fn missing_manifest_fails_with_message_and_does_not_retry() {
        let dir = tempdir().expect("tempdir");
        let mut loader =
            CatalogLoader::new(ManifestSource::File(dir.path().join("tracks.json")));

        loader.load();
        let LoadStatus::Failed(message) = loader.status().clone() else {
            panic!("expected failed load, got {:?}", loader.status());
        };
        assert!(message.contains("failed to read manifest"));
        assert!(loader.tracks().is_empty());

        // Writing the manifest afterwards must not resurrect the loader:
        // failure is terminal for the session.
        fs::write(dir.path().join("tracks.json"), "[]").expect("write manifest");
        loader.load();
        assert_eq!(loader.status(), &LoadStatus::Failed(message));
    }

    #[test]
    fn successful_load_is_not_repeated() {
        let dir = tempdir().expect("tempdir");
        let manifest = dir.path().join("tracks.json");
        fs::write(&manifest, r#"[{"title":"Only","file":"only.mp3"}]"#).expect("write manifest");

        let mut loader = CatalogLoader::new(ManifestSource::File(manifest.clone()));
        loader.load();
        assert_eq!(loader.tracks().len(), 1);

        fs::write(&manifest, "[]").expect("rewrite manifest");
        loader.load();
        assert_eq!(loader.tracks().len(), 1, "load must run at most once");
    }

    #[test]
    fn malformed_manifest_fails() {
        let dir = tempdir().expect("tempdir");
        let manifest = dir.path().join("tracks.json");
        fs::write(&manifest, "{not json").expect("write manifest");

        let mut loader = CatalogLoader::new(ManifestSource::File(manifest));
        loader.load();
        assert!(loader.error().is_some_and(|m| m.contains("parse")));
    }

    #[test]
    fn absolute_media_paths_are_kept_as_is() {
        let dir = tempdir().expect("tempdir");
        let manifest = dir.path().join("tracks.json");
        let absolute = dir.path().join("elsewhere/song.mp3");
        fs::write(
            &manifest,
            format!(r#"[{{"title":"Abs","file":"{}"}}]"#, absolute.display()),
        )
        .expect("write manifest");

        let mut loader = CatalogLoader::new(ManifestSource::File(manifest));
        loader.load();
        assert_eq!(loader.track_path(0), Some(absolute));
    }
}
