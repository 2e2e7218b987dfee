//! On-disk cache for downloaded models.
//!
//! Each remote model gets a directory keyed by a hash of its parent URL, so
//! a `.gltf` and its relative `.bin`/texture references land side by side
//! exactly as `gltf::import` expects to find them.

use std::path::{Path, PathBuf};

use super::source::{
    download_to_file, resolve_relative, safe_relative_path, url_file_name,
};
use super::AssetError;

/// Directory where downloaded models are kept between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetCache {
    root: PathBuf,
}

impl AssetCache {
    /// Cache rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache under the per-user cache directory (`~/.cache/vitrine` on
    /// Linux).
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NoCacheDir`] if the platform has none.
    pub fn user_default() -> Result<Self, AssetError> {
        dirs::cache_dir()
            .map(|dir| Self::new(dir.join("vitrine")))
            .ok_or(AssetError::NoCacheDir)
    }

    /// Cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local directory for everything fetched relative to `url`.
    #[must_use]
    pub fn dir_for(&self, url: &str) -> PathBuf {
        let base = url.split(['?', '#']).next().unwrap_or(url);
        let parent = base.rfind('/').map_or(base, |i| &base[..i]);
        let hash = blake3::hash(parent.as_bytes()).to_hex();
        self.root.join("models").join(&hash.as_str()[..16])
    }

    /// Make `url` (and, for `.gltf`, its external buffers and images)
    /// available locally and return the path of the main file. Files already
    /// in the cache are not downloaded again.
    ///
    /// `progress` receives `(bytes_loaded, total_bytes)` for the main file.
    ///
    /// # Errors
    ///
    /// Propagates download, I/O and glTF parse failures.
    pub fn materialize(
        &self,
        url: &str,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<PathBuf, AssetError> {
        let dir = self.dir_for(url);
        let main = dir.join(safe_relative_path(url_file_name(url))?);

        if is_cached(&main) {
            log::debug!("Cache hit for {url}");
            progress(1, Some(1));
        } else {
            download_to_file(url, &main, progress)?;
        }

        let is_gltf_json = main
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("gltf"));
        if is_gltf_json {
            for uri in external_uris(&main)? {
                let (relative, remote) = resource_location(url, &uri)?;
                let local = dir.join(relative);
                if !is_cached(&local) {
                    download_to_file(&remote, &local, &mut |_, _| {})?;
                }
            }
        }
        Ok(main)
    }
}

/// Where an external `uri` of the document at `url` is stored locally
/// (decoded, as `gltf::import` looks it up) and fetched from (still encoded).
fn resource_location(url: &str, uri: &str) -> Result<(PathBuf, String), AssetError> {
    let local = safe_relative_path(&percent_decode(uri))?;
    let remote = resolve_relative(url, uri)?;
    Ok((local, remote))
}

fn is_cached(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() > 0)
}

/// Buffer and image URIs of a `.gltf` document that are neither embedded
/// `data:` URIs nor GLB chunks.
fn external_uris(gltf_path: &Path) -> Result<Vec<String>, AssetError> {
    let bytes = std::fs::read(gltf_path)?;
    let document = gltf::Gltf::from_slice(&bytes)?;

    let buffers = document.buffers().filter_map(|b| match b.source() {
        gltf::buffer::Source::Uri(uri) => Some(uri.to_owned()),
        gltf::buffer::Source::Bin => None,
    });
    let images = document.images().filter_map(|i| match i.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri.to_owned()),
        gltf::image::Source::View { .. } => None,
    });

    let mut uris: Vec<String> = buffers
        .chain(images)
        .filter(|uri| !uri.starts_with("data:"))
        .collect();
    uris.sort();
    uris.dedup();
    Ok(uris)
}

/// Decode `%XX` escapes so the cached file name matches what
/// `gltf::import` looks for on disk.
fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_share_a_directory() {
        let cache = AssetCache::new("/tmp/cache");
        let a = cache.dir_for("https://example.com/models/Chair/Chair.gltf");
        let b = cache.dir_for("https://example.com/models/Chair/Chair.bin");
        let c = cache.dir_for("https://example.com/models/Robot.glb");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("/tmp/cache/models"));
    }

    #[test]
    fn cached_files_skip_download() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = AssetCache::new(tmp.path());
        let url = "https://invalid.example/models/cube.glb";
        let dir = cache.dir_for(url);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cube.glb"), b"glTF").unwrap();

        let mut reported = Vec::new();
        let path = cache
            .materialize(url, &mut |loaded, total| reported.push((loaded, total)))
            .unwrap();
        assert_eq!(path, dir.join("cube.glb"));
        assert_eq!(reported, vec![(1, Some(1))]);
    }

    #[test]
    fn external_uris_skip_embedded_data() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scene.gltf");
        std::fs::write(
            &path,
            r#"{
                "asset": {"version": "2.0"},
                "buffers": [
                    {"uri": "mesh%20data.bin", "byteLength": 4},
                    {"uri": "data:application/octet-stream;base64,AAAAAA==", "byteLength": 4}
                ],
                "images": [{"uri": "tex/albedo.png"}]
            }"#,
        )
        .unwrap();
        let uris = external_uris(&path).unwrap();
        assert_eq!(uris, vec!["mesh%20data.bin".to_owned(), "tex/albedo.png".to_owned()]);
    }

    #[test]
    fn escaped_uris_stay_encoded_remotely() {
        let (local, remote) = resource_location(
            "https://example.com/models/Chair/Chair.gltf",
            "Chair%20Wood.jpg",
        )
        .unwrap();
        assert_eq!(local, PathBuf::from("Chair Wood.jpg"));
        assert_eq!(remote, "https://example.com/models/Chair/Chair%20Wood.jpg");
    }

    #[test]
    fn cache_keys_are_short_hex() {
        let cache = AssetCache::new("/tmp/cache");
        let dir = cache.dir_for("https://example.com/models/Robot.glb");
        let key = dir.file_name().and_then(|n| n.to_str()).unwrap();
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn percent_decoding_leaves_plain_text_alone() {
        assert_eq!(percent_decode("a%20b%2"), "a b%2");
        assert_eq!(percent_decode("plain.bin"), "plain.bin");
    }
}
