//! Background document loading.
//!
//! Reading and parsing happen on a worker thread. GPU uploads stay on the
//! render thread, which drains finished documents at the start of a frame.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use umbra_core::{GeometryError, LayerEntry, parse_document, read_document};

/// Requests handled by the worker
#[derive(Debug)]
enum LoaderCommand {
    /// Read and parse a file.
    File(PathBuf),
    /// Parse an in-memory document.
    Text { source: String, text: String },
    /// Stop the worker thread.
    Stop,
}

/// A parsed document waiting to be uploaded
#[derive(Debug)]
pub struct LoadedDocument {
    /// File path or caller-supplied label.
    pub source: String,
    /// Per-layer entries, or the whole-document failure.
    pub result: Result<Vec<LayerEntry>, GeometryError>,
}

/// Worker thread that parses geometry documents
pub struct LayerLoader {
    command_tx: Sender<LoaderCommand>,
    result_rx: Receiver<LoadedDocument>,
    worker: Option<JoinHandle<()>>,
    pending: usize,
}

impl LayerLoader {
    /// Spawn the worker thread.
    pub fn spawn() -> std::io::Result<Self> {
        let (command_tx, command_rx) = unbounded::<LoaderCommand>();
        let (result_tx, result_rx) = unbounded::<LoadedDocument>();

        let worker = thread::Builder::new()
            .name("umbra-loader".to_string())
            .spawn(move || Self::worker_loop(command_rx, result_tx))?;

        Ok(Self {
            command_tx,
            result_rx,
            worker: Some(worker),
            pending: 0,
        })
    }

    fn worker_loop(command_rx: Receiver<LoaderCommand>, result_tx: Sender<LoadedDocument>) {
        while let Ok(command) = command_rx.recv() {
            let document = match command {
                LoaderCommand::File(path) => {
                    tracing::debug!("Loading geometry from {}", path.display());
                    LoadedDocument {
                        source: path.display().to_string(),
                        result: read_document(&path),
                    }
                }
                LoaderCommand::Text { source, text } => LoadedDocument {
                    result: parse_document(&text),
                    source,
                },
                LoaderCommand::Stop => break,
            };
            if result_tx.send(document).is_err() {
                break;
            }
        }
        tracing::debug!("Loader worker stopped");
    }

    /// Queue a file for loading.
    pub fn load_file(&mut self, path: impl Into<PathBuf>) {
        self.submit(LoaderCommand::File(path.into()));
    }

    /// Queue an in-memory document.
    pub fn load_text(&mut self, source: impl Into<String>, text: impl Into<String>) {
        self.submit(LoaderCommand::Text {
            source: source.into(),
            text: text.into(),
        });
    }

    fn submit(&mut self, command: LoaderCommand) {
        if self.command_tx.send(command).is_ok() {
            self.pending += 1;
        } else {
            tracing::error!("Loader worker is gone; request dropped");
        }
    }

    /// Number of requests not yet collected.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Take one finished document without blocking.
    pub fn try_recv(&mut self) -> Option<LoadedDocument> {
        let document = self.result_rx.try_recv().ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(document)
    }

    /// Take every finished document without blocking.
    pub fn drain(&mut self) -> Vec<LoadedDocument> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Block until one document is ready or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<LoadedDocument> {
        let document = self.result_rx.recv_timeout(timeout).ok()?;
        self.pending = self.pending.saturating_sub(1);
        Some(document)
    }
}

impl Drop for LayerLoader {
    fn drop(&mut self) {
        let _ = self.command_tx.send(LoaderCommand::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"surface": {{"coordinates": [0,0,0,1,0,0,0,1,0], "indices": [0,1,2], "color": [1,1,1,1]}}}}"#
        )
        .unwrap();

        let mut loader = LayerLoader::spawn().unwrap();
        loader.load_file(file.path());
        assert_eq!(loader.pending(), 1);

        let document = loader.wait(TIMEOUT).unwrap();
        let entries = document.result.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "surface");
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let mut loader = LayerLoader::spawn().unwrap();
        loader.load_file("/definitely/not/here.json");
        let document = loader.wait(TIMEOUT).unwrap();
        assert!(matches!(document.result, Err(GeometryError::Io(_))));
    }

    #[test]
    fn test_results_arrive_in_request_order() {
        let mut loader = LayerLoader::spawn().unwrap();
        loader.load_text("first", "{}");
        loader.load_text("second", "[]");

        let first = loader.wait(TIMEOUT).unwrap();
        let second = loader.wait(TIMEOUT).unwrap();
        assert_eq!(first.source, "first");
        assert!(first.result.unwrap().is_empty());
        assert_eq!(second.source, "second");
        assert_eq!(second.result.unwrap_err(), GeometryError::NotAnObject);
    }

    #[test]
    fn test_drain_without_requests_is_empty() {
        let mut loader = LayerLoader::spawn().unwrap();
        assert!(loader.drain().is_empty());
        assert!(loader.try_recv().is_none());
    }
}
