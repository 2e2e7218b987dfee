//! Where a model comes from, and how remote bytes are fetched.

use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use super::AssetError;

/// Upper bound on establishing a connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on a whole request, body included. A stalled server must not
/// hold the loader thread past this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A model location: a local file or an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetSource {
    /// Local `.gltf` / `.glb` file.
    Path(PathBuf),
    /// Remote `.gltf` / `.glb` file.
    Url(String),
}

impl AssetSource {
    /// Interpret a catalog location: `http://` and `https://` prefixes are
    /// URLs, anything else is a filesystem path.
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if is_remote(location) {
            Self::Url(location.to_owned())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    /// Last path segment, used as a display name.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| {
                    n.to_string_lossy().into_owned()
                }),
            Self::Url(url) => url_file_name(url).to_owned(),
        }
    }

    /// Lowercase file extension, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

impl std::fmt::Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Whether `location` is an `http(s)` URL.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last path segment of a URL, ignoring query and fragment.
#[must_use]
pub fn url_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve `relative` against the directory of `base`.
///
/// # Errors
///
/// Returns [`AssetError::UnsafeUri`] for absolute or scheme-qualified
/// references and for references that climb above the base directory.
pub fn resolve_relative(base: &str, relative: &str) -> Result<String, AssetError> {
    let rel_path = safe_relative_path(relative)?;
    let base_path = base.split(['?', '#']).next().unwrap_or(base);
    let dir = base_path.rfind('/').map_or(base_path, |i| &base_path[..=i]);
    let joined = rel_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    Ok(format!("{dir}{joined}"))
}

/// Validate a resource URI as a path below the asset's directory.
///
/// # Errors
///
/// Returns [`AssetError::UnsafeUri`] for absolute paths, URIs with a scheme,
/// and `..` components.
pub fn safe_relative_path(uri: &str) -> Result<PathBuf, AssetError> {
    let unsafe_uri = || AssetError::UnsafeUri(uri.to_owned());
    if uri.is_empty() || uri.contains("://") || uri.starts_with('/') {
        return Err(unsafe_uri());
    }
    let path = PathBuf::from(uri.replace('\\', "/"));
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(unsafe_uri()),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(unsafe_uri());
    }
    Ok(clean)
}

fn http_agent(global: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_global(Some(global))
        .build()
        .into()
}

fn shared_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| http_agent(REQUEST_TIMEOUT))
}

fn request(url: &str) -> Result<ureq::http::Response<ureq::Body>, AssetError> {
    request_with(shared_agent(), url)
}

fn request_with(
    agent: &ureq::Agent,
    url: &str,
) -> Result<ureq::http::Response<ureq::Body>, AssetError> {
    agent.get(url).call().map_err(|e| match e {
        ureq::Error::StatusCode(status) => AssetError::Http {
            url: url.to_owned(),
            status,
        },
        other => AssetError::Fetch {
            url: url.to_owned(),
            message: other.to_string(),
        },
    })
}

/// Download `url` into `dest`, reporting `(bytes_loaded, total_bytes)` after
/// each chunk. The body is written to a `.part` sibling first and renamed
/// into place once complete.
///
/// # Errors
///
/// Returns [`AssetError::Http`] / [`AssetError::Fetch`] for network
/// failures and [`AssetError::Io`] for local write failures.
pub fn download_to_file(
    url: &str,
    dest: &Path,
    progress: &mut dyn FnMut(u64, Option<u64>),
) -> Result<(), AssetError> {
    log::info!("Downloading {url}");
    let response = request(url)?;
    let total = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let partial = dest.with_extension("part");
    let mut file = std::fs::File::create(&partial)?;
    let mut reader = response.into_body().into_reader();
    let mut buf = vec![0_u8; 64 * 1024];
    let mut loaded = 0_u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        loaded += n as u64;
        progress(loaded, total);
    }
    file.flush()?;
    drop(file);
    std::fs::rename(&partial, dest)?;
    log::debug!("Saved {loaded} bytes to {}", dest.display());
    Ok(())
}

/// Fetch a small resource (e.g. a thumbnail) fully into memory.
///
/// # Errors
///
/// Returns [`AssetError::Http`] / [`AssetError::Fetch`] for network
/// failures and [`AssetError::Io`] if the body cannot be read.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    request(url)?
        .into_body()
        .read_to_vec()
        .map_err(|e| AssetError::Fetch {
            url: url.to_owned(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_classified() {
        assert_eq!(
            AssetSource::from_location("https://example.com/a.glb"),
            AssetSource::Url("https://example.com/a.glb".into())
        );
        assert_eq!(
            AssetSource::from_location("models/chair.gltf"),
            AssetSource::Path(PathBuf::from("models/chair.gltf"))
        );
        assert!(is_remote("HTTP://EXAMPLE.COM/x"));
        assert!(!is_remote("ftp://example.com/x"));
    }

    #[test]
    fn file_name_and_extension() {
        let src = AssetSource::Url(
            "https://example.com/models/Chair/Chair.gltf?v=2".into(),
        );
        assert_eq!(src.file_name(), "Chair.gltf");
        assert_eq!(src.extension().as_deref(), Some("gltf"));

        let local = AssetSource::Path(PathBuf::from("/tmp/Robot.GLB"));
        assert_eq!(local.extension().as_deref(), Some("glb"));
    }

    #[test]
    fn relative_uris_resolve_against_base_directory() {
        let base = "https://example.com/models/Chair/Chair.gltf";
        assert_eq!(
            resolve_relative(base, "Chair.bin").unwrap(),
            "https://example.com/models/Chair/Chair.bin"
        );
        assert_eq!(
            resolve_relative(base, "./textures/wood.jpg").unwrap(),
            "https://example.com/models/Chair/textures/wood.jpg"
        );
    }

    #[test]
    fn stalled_server_times_out() {
        // Connections queue in the backlog but nothing ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/model.glb", listener.local_addr().unwrap());
        let agent = http_agent(Duration::from_millis(300));

        let started = std::time::Instant::now();
        let result = request_with(&agent, &url);
        assert!(matches!(result, Err(AssetError::Fetch { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn escaping_uris_are_rejected() {
        for uri in ["../secret.bin", "/etc/passwd", "https://evil/x.bin", ""] {
            assert!(
                matches!(safe_relative_path(uri), Err(AssetError::UnsafeUri(_))),
                "{uri} should be rejected"
            );
        }
        assert_eq!(
            safe_relative_path("a/./b.bin").unwrap(),
            PathBuf::from("a/b.bin")
        );
    }
}
