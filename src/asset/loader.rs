//! Background model loader.
//!
//! Fetching and parsing run on a dedicated thread so the render loop never
//! blocks on the network or on glTF decoding. Requests carry a
//! [`LoadTicket`]; when several requests queue up before the thread gets to
//! them only the newest is processed.

use std::sync::mpsc;

use super::cache::AssetCache;
use super::import::import_file;
use super::source::AssetSource;
use super::{AssetError, ModelData};

/// Identifies one `load` call. Tickets increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

/// Message from the loader thread.
#[derive(Debug)]
pub enum LoadEvent {
    /// Download progress in `[0, 1]`.
    Progress {
        /// Request this belongs to.
        ticket: LoadTicket,
        /// Fraction loaded.
        fraction: f32,
    },
    /// The request completed.
    Finished {
        /// Request this belongs to.
        ticket: LoadTicket,
        /// Imported model or the reason it failed.
        result: Result<ModelData, AssetError>,
    },
}

enum LoadRequest {
    Load {
        ticket: LoadTicket,
        source: AssetSource,
    },
    Shutdown,
}

/// Owns the `asset-loader` thread and its channels.
pub struct AssetLoader {
    request_tx: mpsc::Sender<LoadRequest>,
    /// Lets `submit` report a request the thread can no longer accept.
    event_tx: mpsc::Sender<LoadEvent>,
    event_rx: mpsc::Receiver<LoadEvent>,
    next_ticket: u64,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl AssetLoader {
    /// Spawn the background loader thread.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the background thread fails to spawn.
    pub fn new(cache: AssetCache) -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (event_tx, event_rx) = mpsc::channel::<LoadEvent>();
        let thread_event_tx = event_tx.clone();

        let thread = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                Self::thread_loop(&request_rx, &thread_event_tx, &cache);
            })?;

        Ok(Self {
            request_tx,
            event_tx,
            event_rx,
            next_ticket: 0,
            thread: Some(thread),
        })
    }

    /// Queue a load and return its ticket (non-blocking).
    ///
    /// If the loader thread is gone the ticket finishes immediately with
    /// [`AssetError::LoaderStopped`].
    pub fn submit(&mut self, source: AssetSource) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        log::debug!("Queue load #{} for {source}", ticket.0);
        if self
            .request_tx
            .send(LoadRequest::Load { ticket, source })
            .is_err()
        {
            log::error!("Asset loader thread has exited; load #{} dropped", ticket.0);
            let _ = self.event_tx.send(LoadEvent::Finished {
                ticket,
                result: Err(AssetError::LoaderStopped),
            });
        }
        ticket
    }

    /// Non-blocking poll for the next event.
    pub fn try_recv(&self) -> Option<LoadEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<LoadEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Shut down the background thread and wait for it to finish.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(LoadRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    fn thread_loop(
        request_rx: &mpsc::Receiver<LoadRequest>,
        event_tx: &mpsc::Sender<LoadEvent>,
        cache: &AssetCache,
    ) {
        while let Ok(request) = request_rx.recv() {
            match drain_latest(request, request_rx) {
                LoadRequest::Shutdown => break,
                LoadRequest::Load { ticket, source } => {
                    let mut report = |fraction: f32| {
                        let _ = event_tx.send(LoadEvent::Progress { ticket, fraction });
                    };
                    let result = load_source(cache, &source, &mut report);
                    if let Err(e) = &result {
                        log::warn!("Load #{} of {source} failed: {e}", ticket.0);
                    }
                    if event_tx.send(LoadEvent::Finished { ticket, result }).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drain all pending requests, keeping only the latest. A queued shutdown
/// always wins.
fn drain_latest(
    first: LoadRequest,
    rx: &mpsc::Receiver<LoadRequest>,
) -> LoadRequest {
    let mut latest = first;
    while let Ok(next) = rx.try_recv() {
        if matches!(latest, LoadRequest::Shutdown) {
            continue;
        }
        latest = next;
    }
    latest
}

/// Fetch (if remote) and import one model. `report` receives
/// `loaded / (total or 1)`, clamped to `[0, 1]`.
fn load_source(
    cache: &AssetCache,
    source: &AssetSource,
    report: &mut dyn FnMut(f32),
) -> Result<ModelData, AssetError> {
    let name = source.file_name();
    match source {
        AssetSource::Path(path) => {
            report(1.0);
            import_file(path, &name)
        }
        AssetSource::Url(url) => {
            let path = cache.materialize(url, &mut |loaded, total| {
                let total = total.filter(|&t| t > 0).unwrap_or(1);
                report((loaded as f32 / total as f32).clamp(0.0, 1.0));
            })?;
            import_file(&path, &name)
        }
    }
}
