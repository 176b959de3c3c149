//! readalong main entry point
//!
//! Narrates a manuscript against a simulated clock. Highlight changes are
//! printed as they happen; transport commands are read from stdin, one per
//! line (`pause`, `resume`, `rate 1.5`, `faster`, `slower`, `seek s2-0`,
//! `wait 500`, `stop`, `status`, `quit`). At end of input the narration runs
//! to completion.

use anyhow::{bail, Context};
use log::{debug, error, info, warn};
use readalong::alignment::SpanId;
use readalong::clock::{Clock, ManualClock};
use readalong::config::Config;
use readalong::control::Command;
use readalong::manuscript::{Manuscript, ManuscriptState};
use readalong::playback::backends::SimulatedFactory;
use readalong::playback::{HighlightSink, Narrator, Rate, TransportState};
use std::cell::Cell;
use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

/// Simulated time advanced per poll
const TICK_MS: u64 = 10;
/// Length of the simulated outro clip
const OUTRO_MS: u64 = 2500;
/// Speaking time estimate for sections without alignment
const MS_PER_CHAR: u64 = 60;
/// Silence after the last aligned span of a section
const TAIL_MS: u64 = 500;
/// Give up running to completion after this much simulated time
const RUN_LIMIT_MS: u64 = 60 * 60 * 1000;

struct Args {
    manuscript: PathBuf,
    outro: Option<String>,
    rate: Option<f64>,
    debug: bool,
}

fn usage() -> ! {
    eprintln!("Usage: readalong <manuscript.json> [--outro LOCATOR] [--rate R] [--debug]");
    process::exit(2);
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut manuscript = None;
    let mut outro = None;
    let mut rate = None;
    let mut debug = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--debug" | "-d" => debug = true,
            "--outro" => outro = Some(args.next().context("--outro needs a locator")?),
            "--rate" => {
                let r = args.next().context("--rate needs a value")?;
                rate = Some(r.parse().with_context(|| format!("invalid rate: {}", r))?);
            }
            "--help" | "-h" => usage(),
            _ if manuscript.is_none() && !arg.starts_with('-') => {
                manuscript = Some(PathBuf::from(arg))
            }
            _ => bail!("unexpected argument: {}", arg),
        }
    }

    match manuscript {
        Some(manuscript) => Ok(Args {
            manuscript,
            outro,
            rate,
            debug,
        }),
        None => usage(),
    }
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            usage();
        }
    };

    // Initialize logger
    if args.debug {
        // Debug mode: write to readalong.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("readalong.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open readalong.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "readalong version {} starting (debug mode, logging to readalong.log)",
            readalong::VERSION
        );
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    if let Err(e) = run(args) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Prints highlight changes with the span text
struct PrintSink {
    clock: ManualClock,
    texts: HashMap<SpanId, String>,
}

impl HighlightSink for PrintSink {
    fn activate(&mut self, span: &SpanId, _scroll: bool) {
        let text = self.texts.get(span).map_or("", String::as_str);
        println!("[{:>8}ms] > {:<8} {}", self.clock.now_ms(), span, text);
    }

    fn deactivate(&mut self, span: &SpanId) {
        println!("[{:>8}ms] < {}", self.clock.now_ms(), span);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    debug!("Initializing readalong");

    let config = Config::load().context("loading configuration")?;
    info!("Configuration loaded from {:?}", config.path());

    let manuscript = Manuscript::load(&args.manuscript)
        .with_context(|| format!("loading {}", args.manuscript.display()))?;
    println!("{}", manuscript.title);
    if manuscript.shows_progress() {
        println!(
            "This article is still being generated ({:.0}% done)",
            manuscript.progress * 100.0
        );
    }
    if matches!(
        manuscript.state,
        ManuscriptState::Error | ManuscriptState::Disallowed
    ) {
        warn!("Manuscript state is {:?}", manuscript.state);
    }

    let clock = ManualClock::new();
    let factory = SimulatedFactory::new(clock.clone());
    for section in &manuscript.sections {
        if let Some(audio) = &section.audio_url {
            let duration = match &section.alignment {
                Some(entries) if !entries.is_empty() => {
                    entries.iter().map(|e| e.start + e.length).max().unwrap_or(0) + TAIL_MS
                }
                _ => {
                    let chars: usize = section.spans.iter().map(|s| s.text.len()).sum();
                    (chars as u64 * MS_PER_CHAR).max(1000) + TAIL_MS
                }
            };
            factory.add_track(audio, duration);
        }
    }

    let outro = args
        .outro
        .or_else(|| config.outro())
        .or_else(|| manuscript.outro_url().map(str::to_string));
    if let Some(outro) = &outro {
        factory.add_track(outro, OUTRO_MS);
    }

    let narration = manuscript.to_narration(outro);
    info!("{} clips to narrate", narration.clips.len());

    let mut options = config.narrator_options();
    if let Some(r) = args.rate {
        options.rate = Rate::new(config.clamp_rate(r))?;
    }

    let sink = PrintSink {
        clock: clock.clone(),
        texts: manuscript
            .span_texts()
            .into_iter()
            .map(|(id, text)| (id, text.to_string()))
            .collect(),
    };

    let mut narrator = Narrator::new(
        narration,
        Box::new(factory),
        Box::new(sink),
        Box::new(clock.clone()),
        options,
    );

    let finished = Rc::new(Cell::new(false));
    let flag = Rc::clone(&finished);
    narrator.set_on_finished(move || {
        flag.set(true);
        println!("-- end of narration --");
    });

    if config.autoplay() {
        narrator.start();
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match cmd {
            Command::Quit => return Ok(()),
            Command::Wait(ms) => run_for(&mut narrator, &clock, ms),
            Command::Status => print_status(&narrator, &clock),
            other => {
                if let Err(e) = other.apply(&mut narrator, config.rate_step()) {
                    eprintln!("{}", e);
                }
            }
        }
    }

    // Input exhausted: let the narration play out
    let mut waited = 0;
    while narrator.state() == TransportState::Playing && waited < RUN_LIMIT_MS {
        run_for(&mut narrator, &clock, TICK_MS);
        waited += TICK_MS;
    }
    if !finished.get() {
        debug!("Stopped in state {:?}", narrator.state());
    }

    Ok(())
}

/// Advance simulated time by `ms`, polling every tick
fn run_for(narrator: &mut Narrator, clock: &ManualClock, ms: u64) {
    let mut left = ms;
    while left > 0 {
        let step = left.min(TICK_MS);
        clock.advance(step);
        narrator.poll();
        left -= step;
    }
}

fn print_status(narrator: &Narrator, clock: &ManualClock) {
    let clip = match narrator.current_clip() {
        Some(i) => format!("clip {}", i),
        None if narrator.in_outro() => "outro".to_string(),
        None => "-".to_string(),
    };
    println!(
        "[{:>8}ms] {:?} {} at {}ms, rate {}, {} cues pending",
        clock.now_ms(),
        narrator.state(),
        clip,
        narrator.position_ms(),
        narrator.rate(),
        narrator.pending_cues().len()
    );
}
