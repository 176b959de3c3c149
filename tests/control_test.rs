//! Transport command tests
//!
//! Parse command lines and apply them to a narrator running on a manual clock

use readalong::alignment::{ClipAlignment, HighlightSpan, SpanId};
use readalong::clock::ManualClock;
use readalong::control::Command;
use readalong::narration::{ClipSource, Narration};
use readalong::playback::backends::SimulatedFactory;
use readalong::playback::{Narrator, NarratorOptions, RecordingSink, TransportState};

const RATE_STEP: f64 = 0.25;

fn narrator() -> (Narrator, ManualClock) {
    let clock = ManualClock::new();
    let factory = SimulatedFactory::new(clock.clone());
    factory.add_track("one.mp3", 4000);
    factory.add_track("two.mp3", 4000);

    let clip = |audio: &str, span: &str| {
        let alignment: ClipAlignment = vec![HighlightSpan::new(span, 0, 2000)]
            .into_iter()
            .collect();
        ClipSource::new(audio, vec![SpanId::from(span)], Some(alignment))
    };
    let narration = Narration::new(
        vec![clip("one.mp3", "s0-0"), clip("two.mp3", "s1-0")],
        None,
    );

    let narrator = Narrator::new(
        narration,
        Box::new(factory),
        Box::new(RecordingSink::new()),
        Box::new(clock.clone()),
        NarratorOptions::default(),
    );
    (narrator, clock)
}

fn run(narrator: &mut Narrator, line: &str) {
    let cmd = Command::parse(line)
        .expect("command should parse")
        .expect("command should not be blank");
    cmd.apply(narrator, RATE_STEP).expect("command should apply");
}

#[test]
fn test_toggle_switches_between_pause_and_play() {
    let (mut narrator, _clock) = narrator();
    narrator.start();

    run(&mut narrator, "space");
    assert_eq!(narrator.state(), TransportState::Paused);
    run(&mut narrator, "toggle");
    assert_eq!(narrator.state(), TransportState::Playing);
}

#[test]
fn test_resume_from_idle_starts_playback() {
    let (mut narrator, _clock) = narrator();
    assert_eq!(narrator.state(), TransportState::Idle);

    run(&mut narrator, "play");
    assert_eq!(narrator.state(), TransportState::Playing);
    assert_eq!(narrator.current_clip(), Some(0));
}

#[test]
fn test_rate_commands() {
    let (mut narrator, _clock) = narrator();
    narrator.start();

    run(&mut narrator, "rate 1.5");
    assert_eq!(narrator.rate().get(), 1.5);
    run(&mut narrator, "faster");
    assert_eq!(narrator.rate().get(), 1.75);
    run(&mut narrator, "-");
    run(&mut narrator, "-");
    assert_eq!(narrator.rate().get(), 1.25);
}

#[test]
fn test_rate_command_is_clamped_like_stepping() {
    let (mut narrator, clock) = narrator();
    narrator.start();

    run(&mut narrator, "rate 10");
    assert_eq!(narrator.rate().get(), 4.0);
    run(&mut narrator, "rate 1e-20");
    assert_eq!(narrator.rate().get(), 0.25);

    clock.advance(100);
    narrator.poll();
    assert_eq!(narrator.position_ms(), 25);
}

#[test]
fn test_invalid_rate_is_reported() {
    let (mut narrator, _clock) = narrator();
    let cmd = Command::parse("rate -2").unwrap().unwrap();

    assert!(cmd.apply(&mut narrator, RATE_STEP).is_err());
    assert_eq!(narrator.rate().get(), 1.0);
}

#[test]
fn test_click_seeks_to_span() {
    let (mut narrator, _clock) = narrator();
    narrator.start();

    run(&mut narrator, "click s1-0");
    assert_eq!(narrator.current_clip(), Some(1));
    assert_eq!(narrator.lit(), vec![SpanId::from("s1-0")]);

    // Unknown spans leave playback alone
    run(&mut narrator, "seek s9-9");
    assert_eq!(narrator.current_clip(), Some(1));
}

#[test]
fn test_stop_returns_to_idle() {
    let (mut narrator, clock) = narrator();
    narrator.start();
    clock.advance(500);
    narrator.poll();

    run(&mut narrator, "stop");
    assert_eq!(narrator.state(), TransportState::Idle);
    assert_eq!(narrator.current_clip(), None);
    assert!(narrator.pending_cues().is_empty());
}

#[test]
fn test_loop_commands_do_nothing_when_applied() {
    let (mut narrator, _clock) = narrator();
    narrator.start();
    let cues = narrator.pending_cues();

    for line in ["wait 100", "status", "quit"] {
        run(&mut narrator, line);
    }
    assert_eq!(narrator.state(), TransportState::Playing);
    assert_eq!(narrator.pending_cues(), cues);
}
