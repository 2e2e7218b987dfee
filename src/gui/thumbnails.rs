//! Carousel thumbnails, fetched and decoded off the main thread.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

use crate::asset::source::{fetch_bytes, is_remote};

/// Longest edge of a decoded thumbnail.
const MAX_THUMBNAIL_EDGE: u32 = 256;

/// A decoded RGBA8 image.
pub(crate) struct DecodedThumbnail {
    pub(crate) size: [usize; 2],
    pub(crate) rgba: Vec<u8>,
}

type FetchResult = (String, Result<DecodedThumbnail, String>);

/// Owns the `thumbnail-fetcher` thread and the textures it has produced.
pub(crate) struct ThumbnailCache {
    request_tx: Option<mpsc::Sender<String>>,
    result_rx: mpsc::Receiver<FetchResult>,
    requested: HashSet<String>,
    textures: HashMap<String, egui::TextureHandle>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ThumbnailCache {
    pub(crate) fn new() -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (result_tx, result_rx) = mpsc::channel::<FetchResult>();
        let thread = std::thread::Builder::new()
            .name("thumbnail-fetcher".into())
            .spawn(move || {
                while let Ok(location) = request_rx.recv() {
                    let result = load_thumbnail(&location);
                    if result_tx.send((location, result)).is_err() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            requested: HashSet::new(),
            textures: HashMap::new(),
            thread: Some(thread),
        })
    }

    /// Queue `location` unless it was requested before.
    pub(crate) fn request(&mut self, location: &str) {
        if !self.requested.insert(location.to_owned()) {
            return;
        }
        if let Some(tx) = &self.request_tx {
            let _ = tx.send(location.to_owned());
        }
    }

    /// Turn finished downloads into egui textures. Returns `true` if any
    /// arrived.
    pub(crate) fn poll(&mut self, ctx: &egui::Context) -> bool {
        let mut arrived = false;
        while let Ok((location, result)) = self.result_rx.try_recv() {
            match result {
                Ok(image) => {
                    let color = egui::ColorImage::from_rgba_unmultiplied(image.size, &image.rgba);
                    let handle = ctx.load_texture(
                        format!("thumb:{location}"),
                        color,
                        egui::TextureOptions::LINEAR,
                    );
                    let _ = self.textures.insert(location, handle);
                    arrived = true;
                }
                Err(e) => log::warn!("Thumbnail {location} unavailable: {e}"),
            }
        }
        arrived
    }

    /// Texture for `location`, once loaded.
    pub(crate) fn get(&self, location: &str) -> Option<&egui::TextureHandle> {
        self.textures.get(location)
    }
}

impl Drop for ThumbnailCache {
    fn drop(&mut self) {
        // Closing the channel ends the thread after its current fetch.
        self.request_tx = None;
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

fn load_thumbnail(location: &str) -> Result<DecodedThumbnail, String> {
    let bytes = if is_remote(location) {
        fetch_bytes(location).map_err(|e| e.to_string())?
    } else {
        std::fs::read(location).map_err(|e| e.to_string())?
    };
    decode_thumbnail(&bytes).map_err(|e| e.to_string())
}

/// Decode a PNG/JPEG/WebP image, shrinking it to fit a thumbnail box.
pub(crate) fn decode_thumbnail(bytes: &[u8]) -> Result<DecodedThumbnail, image::ImageError> {
    let mut image = image::load_from_memory(bytes)?;
    if image.width() > MAX_THUMBNAIL_EDGE || image.height() > MAX_THUMBNAIL_EDGE {
        image = image.thumbnail(MAX_THUMBNAIL_EDGE, MAX_THUMBNAIL_EDGE);
    }
    let rgba = image.to_rgba8();
    Ok(DecodedThumbnail {
        size: [rgba.width() as usize, rgba.height() as usize],
        rgba: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn small_images_keep_their_size() {
        let decoded = decode_thumbnail(&png(4, 2)).unwrap();
        assert_eq!(decoded.size, [4, 2]);
        assert_eq!(decoded.rgba.len(), 4 * 2 * 4);
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn large_images_are_shrunk_preserving_aspect() {
        let decoded = decode_thumbnail(&png(1024, 512)).unwrap();
        assert_eq!(decoded.size, [256, 128]);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_thumbnail(b"not an image").is_err());
    }

    #[test]
    fn missing_local_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(load_thumbnail(&path.to_string_lossy()).is_err());
    }
}
