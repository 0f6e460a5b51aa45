//! Gesture Quest CLI
//!
//! Usage:
//!   gesture-quest --subject physics --frames ./captures      # Play from captured frames
//!   gesture-quest --subject chemistry --replay session.jsonl # Replay recorded reports
//!   gesture-quest --serve                                    # HTTP + WebSocket play server
//!   gesture-quest --subject math --replay r.jsonl --json     # JSON output

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gesture_quest::config::EngineConfig;
use gesture_quest::core::{
    builtin_catalog, find_game, run_server, Announcer, AppState, CatalogClient, ClassifierChoice,
    DirectorySource, FeedbackChannel, FileProgressSink, FrameSampler, GameRegistry, GameSession,
    GestureClient, GestureNormalizer, HttpProgressSink, PlayLoop, PlayerAction, ProgressContext,
    ProgressSink, SilentAnnouncer, StepOutcome, TerminalAnnouncer,
};
use gesture_quest::types::{
    GameDescriptor, GestureTally, InteractionEvent, Language, Phase, SessionSnapshot, SideEffect,
    Subject,
};
use gesture_quest::{Millis, FRAME_INTERVAL_MS, PROGRESS_FLUSH_GRACE_MS, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "gesture-quest",
    version = VERSION,
    about = "Gesture Quest - hand-gesture STEM mini-games",
    long_about = "Gesture Quest turns hand gestures into play for five STEM mini-games.\n\n\
                  Frames are classified by a gesture recognition service, normalized\n\
                  into interaction events and applied to the selected game.\n\n\
                  Modes:\n  \
                  --frames DIR   Play from a directory of captured frames\n  \
                  --replay FILE  Replay recorded recognizer reports (JSON lines)\n  \
                  --serve        HTTP + WebSocket play server\n\n\
                  Subjects:\n  \
                  physics      - Drag objects onto the target\n  \
                  mathematics  - Draw the shape the problem asks for\n  \
                  chemistry    - Pour between beakers, mix acid and base\n  \
                  biology      - Rotate, zoom and identify body parts\n  \
                  coding       - Arrange blocks into a program"
)]
struct Args {
    /// Game to play
    #[arg(short = 'g', long, value_parser = parse_subject)]
    subject: Option<Subject>,

    /// Directory of frame_<n>.jpg / .png captures
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// Start over at the first frame when the directory runs out
    #[arg(long)]
    loop_frames: bool,

    /// Replay recognizer reports from a JSON-lines file
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Run as HTTP play server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gesture recognition service base URL
    #[arg(long)]
    recognizer: Option<String>,

    /// Catalog / progress backend base URL
    #[arg(long)]
    backend: Option<String>,

    /// Append progress records to DIR/progress.jsonl instead of posting them
    #[arg(long)]
    progress_dir: Option<PathBuf>,

    /// Announcement language (odia, hindi, english)
    #[arg(short, long, value_parser = parse_language)]
    language: Option<Language>,

    /// Player id recorded with progress
    #[arg(long)]
    user_id: Option<u32>,

    /// Shape classifier for mathematics (geometric, point_count)
    #[arg(long, value_parser = parse_classifier)]
    classifier: Option<ClassifierChoice>,

    /// Stop after this many processed frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Debug logging
    #[arg(long)]
    verbose: bool,
}

fn parse_subject(s: &str) -> Result<Subject, String> {
    Subject::parse(s).ok_or_else(|| format!("unknown subject '{}'", s))
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("unknown language '{}'", s))
}

fn parse_classifier(s: &str) -> Result<ClassifierChoice, String> {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "geometric" => Ok(ClassifierChoice::Geometric),
        "point_count" | "points" => Ok(ClassifierChoice::PointCount),
        _ => Err(format!("unknown classifier '{}'", s)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = resolve_config(&args)?;

    if args.serve {
        run_serve(&args, &config).await
    } else if let Some(ref path) = args.replay {
        run_replay(path, &args, &config).await
    } else if let Some(ref dir) = args.frames {
        run_frames(dir, &args, &config).await
    } else {
        print_catalog(&builtin_catalog(), args.json)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gesture_quest=debug" } else { "gesture_quest=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or defaults) with command line overrides applied
fn resolve_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(url) = &args.recognizer {
        config.recognizer_url = url.clone();
    }
    if let Some(url) = &args.backend {
        config.backend_url = url.clone();
    }
    if let Some(dir) = &args.progress_dir {
        config.progress_dir = Some(dir.clone());
    }
    if let Some(language) = args.language {
        config.language = language;
    }
    if let Some(user_id) = args.user_id {
        config.user_id = user_id;
    }
    if let Some(classifier) = args.classifier {
        config.classifier = classifier;
    }
    config.validate()?;
    Ok(config)
}

fn progress_sink(config: &EngineConfig) -> Result<Arc<dyn ProgressSink>> {
    let sink: Arc<dyn ProgressSink> = match &config.progress_dir {
        Some(dir) => Arc::new(FileProgressSink::new(dir)),
        None => Arc::new(HttpProgressSink::new(&config.backend_url, config.request_timeout())?),
    };
    Ok(sink)
}

/// How long to wait for outstanding progress writes before exiting
fn progress_deadline(config: &EngineConfig) -> Duration {
    config.request_timeout() + Duration::from_millis(PROGRESS_FLUSH_GRACE_MS)
}

fn announcer(args: &Args, config: &EngineConfig) -> Box<dyn Announcer> {
    if args.json || !config.audio_feedback {
        Box::new(SilentAnnouncer)
    } else {
        Box::new(TerminalAnnouncer {
            use_color: !args.no_color,
        })
    }
}

async fn load_catalog(config: &EngineConfig) -> Result<Vec<GameDescriptor>> {
    let client = CatalogClient::new(&config.backend_url, config.request_timeout())?;
    Ok(client.fetch_or_builtin().await)
}

fn selected_game(args: &Args, catalog: &[GameDescriptor]) -> Result<(Subject, GameDescriptor)> {
    let subject = args
        .subject
        .ok_or_else(|| anyhow!("--subject is required to play"))?;
    let game = find_game(catalog, subject)
        .cloned()
        .ok_or_else(|| anyhow!("{} is not in the catalog", subject))?;
    Ok((subject, game))
}

/// Play from captured frames through the recognition service
async fn run_frames(dir: &Path, args: &Args, config: &EngineConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let (subject, game) = selected_game(args, &catalog)?;

    let registry = GameRegistry::new(config.classifier);
    let session = registry.create(subject);
    let sink = progress_sink(config)?;
    let feedback = FeedbackChannel::new(config.language, announcer(args, config))
        .with_sink(Box::new(Arc::clone(&sink)))
        .for_game(config.user_id, game.id);
    let recognizer = GestureClient::new(&config.recognizer_url, config.request_timeout())?;
    let sampler = FrameSampler::new(DirectorySource::new(dir, args.loop_frames));

    let mut play = PlayLoop::new(sampler, recognizer, session, feedback)
        .with_timing(config.frame_interval(), config.request_timeout())
        .with_normalizer(GestureNormalizer::new(config.frame_width, config.frame_height));

    if !args.json {
        print_header(&game, args.no_color);
    }
    play.start()
        .with_context(|| format!("cannot open frames in {}", dir.display()))?;

    let stop = play.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    let json = args.json;
    let no_color = args.no_color;
    let processed = play
        .run(args.max_frames, |outcome| {
            if let StepOutcome::Applied { event, effects } = outcome {
                if json {
                    print_json_step(Some(event), effects);
                } else {
                    print_effects(effects, no_color);
                }
            }
        })
        .await?;
    sink.flush(progress_deadline(config)).await;

    let snapshot = play.session().current_state();
    info!(processed, score = snapshot.score, "frames done");
    print_summary(&snapshot, processed, json, no_color);
    Ok(())
}

/// One line of a replay file: a player action or a raw recognizer report
#[derive(Debug)]
enum ReplayLine {
    Action(PlayerAction),
    Report { raw: Value, at: Option<Millis> },
}

fn parse_replay_line(line: &str) -> Result<ReplayLine> {
    let raw: Value = serde_json::from_str(line).context("malformed replay line")?;
    if raw.get("action").is_some() {
        let action = serde_json::from_value(raw).context("unknown player action")?;
        return Ok(ReplayLine::Action(action));
    }
    let at = raw.get("at_ms").and_then(Value::as_u64);
    Ok(ReplayLine::Report { raw, at })
}

/// Feed recorded reports through the normalizer into a session
///
/// Reports without `at_ms` are spaced one frame interval apart.
async fn run_replay(path: &Path, args: &Args, config: &EngineConfig) -> Result<()> {
    let catalog = match &args.backend {
        Some(_) => load_catalog(config).await?,
        None => builtin_catalog(),
    };
    let (subject, game) = selected_game(args, &catalog)?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open replay {}", path.display()))?;

    let registry = GameRegistry::new(config.classifier);
    let mut session: Box<dyn GameSession> = registry.create(subject);
    let mut feedback = FeedbackChannel::new(config.language, announcer(args, config))
        .for_game(config.user_id, game.id);
    let sink = if args.progress_dir.is_some() || args.backend.is_some() {
        let sink = progress_sink(config)?;
        feedback = feedback.with_sink(Box::new(Arc::clone(&sink)));
        Some(sink)
    } else {
        None
    };
    let normalizer = GestureNormalizer::new(config.frame_width, config.frame_height);
    let mut tally = GestureTally::new();

    if !args.json {
        print_header(&game, args.no_color);
    }

    let mut now: Millis = 0;
    let mut processed = 0u64;
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if args.max_frames.map(|max| processed >= max).unwrap_or(false) {
            break;
        }

        let (event, effects) = match parse_replay_line(&line)
            .with_context(|| format!("{}:{}", path.display(), number + 1))?
        {
            ReplayLine::Action(action) => match session.perform(&action, now) {
                Ok(effects) => (None, effects),
                Err(e) => {
                    warn!(code = e.code(), line = number + 1, "{}", e);
                    continue;
                }
            },
            ReplayLine::Report { raw, at } => {
                now = at.unwrap_or(now + FRAME_INTERVAL_MS);
                let event = normalizer.normalize(&raw);
                tally.record(&event);
                let effects = session.apply_event(&event, now);
                processed += 1;
                (Some(event), effects)
            }
        };

        let context = ProgressContext {
            time_spent_secs: now / 1000,
            gestures_used: tally.to_value(),
        };
        for effect in &effects {
            feedback.dispatch(effect, &context, now);
        }

        if args.json {
            print_json_step(event.as_ref(), &effects);
        } else {
            print_effects(&effects, args.no_color);
        }
    }

    if let Some(sink) = &sink {
        sink.flush(progress_deadline(config)).await;
    }
    print_summary(&session.current_state(), processed, args.json, args.no_color);
    Ok(())
}

/// Run HTTP play server
async fn run_serve(args: &Args, config: &EngineConfig) -> Result<()> {
    let catalog = load_catalog(config).await?;
    let mut state = AppState::new(GameRegistry::new(config.classifier), catalog, config.language)
        .with_user(config.user_id);
    if args.progress_dir.is_some() || args.backend.is_some() {
        state = state.with_sink(progress_sink(config)?);
    }
    state.normalizer = GestureNormalizer::new(config.frame_width, config.frame_height);

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║  ✋ Gesture Quest Play Server                     ║");
    println!("║  Version: {}                                  ║", VERSION);
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = run_server(&args.addr, Arc::new(state)).await {
        bail!("server error: {}", e);
    }
    Ok(())
}

fn print_catalog(catalog: &[GameDescriptor], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog)?);
        return Ok(());
    }
    println!("Available games (choose one with --subject):");
    for game in catalog {
        println!(
            "  {:<2} {:<18} {:<12} {}",
            game.id, game.title, game.difficulty, game.description
        );
    }
    Ok(())
}

/// Print header
fn print_header(game: &GameDescriptor, no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  Gesture Quest v{} - {}", VERSION, game.title);
        println!("========================================");
    } else {
        println!("\x1b[1m╔══════════════════════════════════════════════════╗\x1b[0m");
        println!("\x1b[1m║  Gesture Quest v{} - {:<28}║\x1b[0m", VERSION, game.title);
        println!("\x1b[1m╚══════════════════════════════════════════════════╝\x1b[0m");
    }
    println!();
}

fn print_json_step(event: Option<&InteractionEvent>, effects: &[SideEffect]) {
    #[derive(Serialize)]
    struct StepLine<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        event: Option<&'a InteractionEvent>,
        effects: &'a [SideEffect],
    }

    if effects.is_empty() {
        return;
    }
    match serde_json::to_string(&StepLine { event, effects }) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("cannot serialize step: {}", e),
    }
}

fn print_effects(effects: &[SideEffect], no_color: bool) {
    for effect in effects {
        let line = match effect {
            SideEffect::Scored { outcome, points, total, .. } => {
                format!("+{} {} (score {})", points, outcome.code(), total)
            }
            SideEffect::AttemptFailed { outcome, .. } => format!("✗ {}", outcome.code()),
            SideEffect::Warning { cue, .. } => format!("⚠ {:?}", cue),
            SideEffect::ChallengeStarted { round } => format!("→ round {}", round),
        };
        if no_color {
            println!("  {}", line);
        } else {
            let color = match effect {
                SideEffect::Scored { .. } => Phase::Completed.color_code(),
                SideEffect::AttemptFailed { .. } => Phase::FailedAttempt.color_code(),
                SideEffect::Warning { .. } => Phase::Interacting.color_code(),
                SideEffect::ChallengeStarted { .. } => Phase::Selecting.color_code(),
            };
            println!("  {}{}{}", color, line, Phase::color_reset());
        }
    }
}

fn print_summary(snapshot: &SessionSnapshot, processed: u64, json: bool, no_color: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("cannot serialize snapshot: {}", e),
        }
        return;
    }
    println!();
    if no_color {
        println!(
            "[{}] {} frames | score {} | round {}",
            snapshot.phase, processed, snapshot.score, snapshot.round
        );
    } else {
        println!(
            "{}{} [{}]{} {} frames | score {} | round {}",
            snapshot.phase.color_code(),
            snapshot.phase.emoji(),
            snapshot.phase,
            Phase::color_reset(),
            processed,
            snapshot.score,
            snapshot.round
        );
    }
}
