//! FeedbackChannel: side effects → announcements, overlay and persistence
//!
//! Every outlet is best effort. A failed announcement or a failed progress
//! upload is logged and play continues. Progress writes run off the play
//! loop; `ProgressSink::flush` waits for them before shutdown.

use chrono::Utc;
use colored::Colorize;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::core::phrase;
use crate::types::{Cue, EngineError, Language, ProgressRecord, SideEffect, Tone};
use crate::{Millis, RESULT_DISPLAY_MS};

/// Speaks or prints a localized cue
pub trait Announcer: Send + Sync {
    fn announce(&self, cue: Cue, text: &str, tone: Option<Tone>);
}

/// Prints cues to stdout
#[derive(Debug, Clone, Copy)]
pub struct TerminalAnnouncer {
    pub use_color: bool,
}

impl Announcer for TerminalAnnouncer {
    fn announce(&self, _cue: Cue, text: &str, tone: Option<Tone>) {
        if !self.use_color {
            println!("» {}", text);
            return;
        }
        let line = match tone {
            Some(Tone::Success) => text.green().bold(),
            Some(Tone::Warning) => text.yellow().bold(),
            Some(Tone::Retry) => text.red(),
            None => text.cyan(),
        };
        println!("» {}", line);
    }
}

/// Drops every cue (JSON output, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce(&self, _cue: Cue, _text: &str, _tone: Option<Tone>) {}
}

/// Accepts progress records without blocking the caller
pub trait ProgressSink: Send + Sync {
    fn submit(&self, record: ProgressRecord);

    /// Wait up to `deadline` for submitted records to land
    fn flush(&self, _deadline: Duration) -> BoxFuture<'_, ()> {
        Box::pin(std::future::ready(()))
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn submit(&self, record: ProgressRecord) {
        (**self).submit(record)
    }

    fn flush(&self, deadline: Duration) -> BoxFuture<'_, ()> {
        (**self).flush(deadline)
    }
}

/// Background writes a sink has started and not yet seen finish
#[derive(Debug, Default)]
struct Inflight {
    tasks: Mutex<JoinSet<()>>,
}

impl Inflight {
    /// Run `task` on the current runtime; false when there is none
    fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (Ok(handle), Ok(mut tasks)) = (Handle::try_current(), self.tasks.lock()) else {
            return false;
        };
        while tasks.try_join_next().is_some() {}
        tasks.spawn_on(task, &handle);
        true
    }

    fn spawn_blocking<F>(&self, work: F) -> Result<(), F>
    where
        F: FnOnce() + Send + 'static,
    {
        let (Ok(handle), Ok(mut tasks)) = (Handle::try_current(), self.tasks.lock()) else {
            return Err(work);
        };
        while tasks.try_join_next().is_some() {}
        tasks.spawn_blocking_on(work, &handle);
        Ok(())
    }

    fn take(&self) -> JoinSet<()> {
        self.tasks
            .lock()
            .map(|mut tasks| std::mem::take(&mut *tasks))
            .unwrap_or_default()
    }

    /// Await every tracked task; whatever is left at `deadline` is aborted
    async fn wait(&self, deadline: Duration) {
        let mut tasks = self.take();
        let finished = tokio::time::timeout(deadline, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();
        if !finished {
            warn!(
                code = "PERSISTENCE_ERROR",
                dropped = tasks.len(),
                "progress still in flight at shutdown"
            );
        }
    }
}

/// `POST {base}/progress/` in the background
#[derive(Debug, Clone)]
pub struct HttpProgressSink {
    client: Client,
    base_url: String,
    inflight: Arc<Inflight>,
}

impl HttpProgressSink {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            inflight: Arc::default(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/progress/", self.base_url)
    }

    pub async fn send(&self, record: &ProgressRecord) -> Result<(), EngineError> {
        post_record(&self.client, &self.endpoint(), record).await
    }
}

async fn post_record(client: &Client, url: &str, record: &ProgressRecord) -> Result<(), EngineError> {
    let response = client
        .post(url)
        .json(record)
        .send()
        .await
        .map_err(|e| EngineError::Persistence(e.to_string()))?;
    if !response.status().is_success() {
        return Err(EngineError::Persistence(format!(
            "backend answered {}",
            response.status()
        )));
    }
    Ok(())
}

impl ProgressSink for HttpProgressSink {
    fn submit(&self, record: ProgressRecord) {
        let (client, url) = (self.client.clone(), self.endpoint());
        let started = self.inflight.spawn(async move {
            match post_record(&client, &url, &record).await {
                Ok(()) => debug!(score = record.score, "progress uploaded"),
                Err(e) => warn!(code = e.code(), "{}", e),
            }
        });
        if !started {
            warn!(code = "PERSISTENCE_ERROR", "no runtime to upload progress on");
        }
    }

    fn flush(&self, deadline: Duration) -> BoxFuture<'_, ()> {
        Box::pin(self.inflight.wait(deadline))
    }
}

/// Appends records as JSON lines to `<dir>/progress.jsonl`
#[derive(Debug, Clone)]
pub struct FileProgressSink {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
    inflight: Arc<Inflight>,
}

impl FileProgressSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Arc::default(),
            inflight: Arc::default(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("progress.jsonl")
    }

    pub fn append(&self, record: &ProgressRecord) -> Result<PathBuf, EngineError> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| EngineError::Persistence(format!("serialize: {}", e)))?;
        line.push('\n');
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| EngineError::Persistence("progress writer poisoned".into()))?;
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| EngineError::Persistence(format!("{}: {}", self.dir.display(), e)))?;

        let path = self.path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| EngineError::Persistence(format!("{}: {}", path.display(), e)))?;
        file.write_all(line.as_bytes())
            .map_err(|e| EngineError::Persistence(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// Read every record back
    pub fn load(&self) -> Result<Vec<ProgressRecord>, EngineError> {
        let text = std::fs::read_to_string(self.path())
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(|e| EngineError::Persistence(e.to_string())))
            .collect()
    }
}

impl FileProgressSink {
    fn write(&self, record: &ProgressRecord) {
        match self.append(record) {
            Ok(path) => debug!(path = %path.display(), "progress saved"),
            Err(e) => warn!(code = e.code(), "{}", e),
        }
    }
}

impl ProgressSink for FileProgressSink {
    fn submit(&self, record: ProgressRecord) {
        let sink = self.clone();
        // Outside a runtime there is no loop to keep unblocked
        if let Err(write) = self.inflight.spawn_blocking(move || sink.write(&record)) {
            write();
        }
    }

    fn flush(&self, deadline: Duration) -> BoxFuture<'_, ()> {
        Box::pin(self.inflight.wait(deadline))
    }
}

/// Keeps records in memory (play server history, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressSink {
    records: Arc<Mutex<Vec<ProgressRecord>>>,
}

impl MemoryProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ProgressRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ProgressSink for MemoryProgressSink {
    fn submit(&self, record: ProgressRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Localized transient message shown over the game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub cue: Cue,
    pub text: String,
    pub tone: Tone,
    pub expires_at: Millis,
}

/// Session facts a progress record needs besides the side effect itself
#[derive(Debug, Clone)]
pub struct ProgressContext {
    pub time_spent_secs: u64,
    pub gestures_used: Value,
}

pub struct FeedbackChannel {
    language: Language,
    announcer: Box<dyn Announcer>,
    sink: Option<Box<dyn ProgressSink>>,
    user_id: u32,
    game_id: u32,
    overlay: Option<Overlay>,
}

impl FeedbackChannel {
    pub fn new(language: Language, announcer: Box<dyn Announcer>) -> Self {
        Self {
            language,
            announcer,
            sink: None,
            user_id: 1,
            game_id: 0,
            overlay: None,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Who and what the progress records are about
    pub fn for_game(mut self, user_id: u32, game_id: u32) -> Self {
        self.user_id = user_id;
        self.game_id = game_id;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Announce a cue that does not come from a session (camera on/off)
    pub fn cue(&self, cue: Cue) {
        self.announcer.announce(cue, phrase(cue, self.language), None);
    }

    pub fn dispatch(&mut self, effect: &SideEffect, context: &ProgressContext, now: Millis) {
        let cue = effect.cue();
        let text = phrase(cue, self.language);
        let tone = match effect {
            SideEffect::Scored { .. } => Some(Tone::Success),
            SideEffect::AttemptFailed { .. } => Some(Tone::Retry),
            SideEffect::Warning { .. } => Some(Tone::Warning),
            SideEffect::ChallengeStarted { .. } => None,
        };

        self.announcer.announce(cue, text, tone);
        if let Some(tone) = tone {
            self.overlay = Some(Overlay {
                cue,
                text: text.to_string(),
                tone,
                expires_at: now + RESULT_DISPLAY_MS,
            });
        }

        if let SideEffect::Scored { outcome, total, detail, .. } = effect {
            let mut data = json!({ "type": outcome.code() });
            if let (Some(map), Value::Object(extra)) = (data.as_object_mut(), detail) {
                map.extend(extra.clone());
            }
            let record = ProgressRecord {
                user_id: self.user_id,
                game_id: self.game_id,
                score: *total,
                time_spent: context.time_spent_secs,
                completed: true,
                gestures_used: context.gestures_used.clone(),
                game_specific_data: Some(data),
                recorded_at: Utc::now(),
            };
            match &self.sink {
                Some(sink) => sink.submit(record),
                None => debug!(outcome = outcome.code(), "no progress sink configured"),
            }
        }
    }

    /// Overlay still on screen at `now`
    pub fn overlay(&mut self, now: Millis) -> Option<&Overlay> {
        if self.overlay.as_ref().map(|o| now >= o.expires_at).unwrap_or(false) {
            self.overlay = None;
        }
        self.overlay.as_ref()
    }
}
