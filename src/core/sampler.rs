//! FrameSampler: exclusive owner of the frame source while active
//!
//! The sampler never captures on its own schedule; the play loop asks for the
//! next frame only after the previous recognition round trip has finished,
//! which keeps at most one frame in flight.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::types::EngineError;

lazy_static! {
    static ref FRAME_NAME: Regex = Regex::new(r"(?i)^frame[_-]?(\d+)\.(jpe?g|png)$").unwrap();
}

/// One encoded still frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub mime: String,
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
            sequence: 0,
            captured_at: Utc::now(),
        }
    }

    /// `data:<mime>;base64,<payload>` as the recognizer expects it
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.data))
    }
}

/// A device (or stand-in) that yields encoded frames
pub trait FrameSource: Send {
    /// Open the device; fails with `DeviceUnavailable`
    fn acquire(&mut self) -> Result<(), EngineError>;

    /// Next frame, or `None` once the source is exhausted
    fn capture(&mut self) -> Result<Option<Frame>, EngineError>;

    /// Give the device back; must be safe to call more than once
    fn release(&mut self);

    fn describe(&self) -> String {
        "frame source".to_string()
    }
}

/// Replays `frame_<n>.jpg|jpeg|png` files from a directory in numeric order
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    looping: bool,
    files: Vec<PathBuf>,
    cursor: usize,
    acquired: bool,
}

impl DirectorySource {
    pub fn new(dir: impl AsRef<Path>, looping: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            looping,
            files: Vec::new(),
            cursor: 0,
            acquired: false,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    fn scan(&self) -> Result<Vec<PathBuf>, EngineError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            EngineError::DeviceUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let mut numbered: Vec<(u64, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let index = FRAME_NAME.captures(&name)?.get(1)?.as_str().parse().ok()?;
                Some((index, entry.path()))
            })
            .collect();
        numbered.sort_by_key(|(index, _)| *index);
        Ok(numbered.into_iter().map(|(_, path)| path).collect())
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        _ => "image/jpeg",
    }
}

impl FrameSource for DirectorySource {
    fn acquire(&mut self) -> Result<(), EngineError> {
        let files = self.scan()?;
        if files.is_empty() {
            return Err(EngineError::DeviceUnavailable(format!(
                "no frame_<n> images in {}",
                self.dir.display()
            )));
        }
        debug!(dir = %self.dir.display(), frames = files.len(), "frame directory opened");
        self.files = files;
        self.cursor = 0;
        self.acquired = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<Frame>, EngineError> {
        if !self.acquired {
            return Err(EngineError::DeviceUnavailable("source not acquired".into()));
        }
        if self.cursor >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.cursor = 0;
        }
        let path = &self.files[self.cursor];
        self.cursor += 1;
        let data = std::fs::read(path)
            .map_err(|e| EngineError::DeviceUnavailable(format!("{}: {}", path.display(), e)))?;
        Ok(Some(Frame::new(data, mime_for(path))))
    }

    fn release(&mut self) {
        self.acquired = false;
        self.files.clear();
        self.cursor = 0;
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

/// Cloneable handle that deactivates a running sampler
#[derive(Debug, Clone)]
pub struct StopHandle {
    active: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Bounded-rate frame producer with an active flag
pub struct FrameSampler<S: FrameSource> {
    source: S,
    active: Arc<AtomicBool>,
    acquired: bool,
    next_sequence: u64,
}

impl<S: FrameSource> FrameSampler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: Arc::new(AtomicBool::new(false)),
            acquired: false,
            next_sequence: 0,
        }
    }

    /// Acquire the source and become active
    ///
    /// On `DeviceUnavailable` the sampler stays inactive.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.is_active() {
            return Ok(());
        }
        if let Err(e) = self.source.acquire() {
            warn!(code = e.code(), "{}", e);
            return Err(e);
        }
        self.acquired = true;
        self.active.store(true, Ordering::SeqCst);
        info!(source = %self.source.describe(), "sampler started");
        Ok(())
    }

    /// Deactivate and release the source; idempotent
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if self.acquired {
            self.source.release();
            self.acquired = false;
            info!(source = %self.source.describe(), "sampler stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            active: Arc::clone(&self.active),
        }
    }

    /// Capture the next frame; `None` while inactive or once the source is exhausted
    pub fn capture(&mut self) -> Result<Option<Frame>, EngineError> {
        if !self.is_active() {
            // stopped through a handle: release here
            self.stop();
            return Ok(None);
        }
        match self.source.capture()? {
            Some(mut frame) => {
                frame.sequence = self.next_sequence;
                self.next_sequence += 1;
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: FrameSource> Drop for FrameSampler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
