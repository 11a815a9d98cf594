use anyhow::{Context, Result};
use async_channel::{Receiver, Sender};
use openscopes::mixer::{
    ChannelSync, EditorLink, SampleData, SampleHeader, SyncChannel, UpdateStatus, VoiceState,
};
use openscopes::scope::timing::TickClock;
use openscopes::scope::{MAX_VOICES, MouseButtons, ScopeEngine, ScopeView};
use openscopes::settings::{ScopeSettings, SettingsManager};
use openscopes::video::Framebuffer;
use std::f64::consts::TAU;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const RUN_TIME: Duration = Duration::from_secs(4);
const SYNC_QUEUE_CAPACITY: usize = 16;
const DUMP_ENV: &str = "OPENSCOPES_DUMP";

/// Frame number, pointer position and buttons of a scripted click.
const CLICKS: [(u64, u16, u16, MouseButtons); 4] = [
    (60, 10, 100, MouseButtons::LEFT),
    (120, 80, 150, MouseButtons::RIGHT),
    (150, 80, 100, MouseButtons::BOTH),
    (200, 80, 100, MouseButtons::BOTH),
];

fn main() -> Result<()> {
    init_logging();

    let settings = SettingsManager::load_or_default().settings().clone();
    info!(
        "[scopes] {} channels, {:.1} Hz tracking, {} scopes",
        settings.channel_count,
        settings.tick_rate_hz,
        if settings.lined_scopes { "lined" } else { "pixel" }
    );

    let mut engine = ScopeEngine::spawn(&settings).context("failed to start scope engine")?;
    let (sender, receiver) = async_channel::bounded(SYNC_QUEUE_CAPACITY);
    let replayer = spawn_replayer(sender, &settings).context("failed to spawn replayer thread")?;

    let fb = run_display(&engine, &receiver, &settings);

    receiver.close();
    if replayer.join().is_err() {
        warn!("[replayer] thread panicked");
    }
    engine.shutdown();

    if let Some(path) = std::env::var_os(DUMP_ENV) {
        std::fs::write(&path, fb.to_ppm())
            .with_context(|| format!("failed to write framebuffer dump to {path:?}"))?;
        info!("[scopes] framebuffer written to {path:?}");
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Display-thread loop: drains sync snapshots, replays scripted clicks and renders.
fn run_display(
    engine: &ScopeEngine,
    syncs: &Receiver<ChannelSync>,
    settings: &ScopeSettings,
) -> Framebuffer {
    let bank = engine.bank();
    let mut view = ScopeView::new(settings);
    let mut fb = Framebuffer::default();
    let mut voices = vec![VoiceState::default(); MAX_VOICES];
    let mut editor = EditorLink {
        current_instrument: 1,
        current_sample: 0,
        ..EditorLink::default()
    };

    let mut clock = TickClock::new(
        settings.tick_rate_hz,
        Duration::from_micros(settings.spin_margin_us),
    );
    let frames = (RUN_TIME.as_secs_f64() * settings.tick_rate_hz) as u64;

    for frame in 0..frames {
        while let Ok(sync) = syncs.try_recv() {
            bank.handle_channel_sync(&sync, &mut editor);
        }

        for &(_, x, y, buttons) in CLICKS.iter().filter(|(at, ..)| *at == frame) {
            let consumed =
                view.handle_mouse_down(bank.channel_count(), x, y, buttons, &mut voices[..]);
            debug!("[scopes] click at ({x}, {y}) {buttons:?} consumed={consumed}");
        }

        view.render_frame(bank, &mut fb);

        if frame % 60 == 0
            && let Some(channel) = editor.live_channel
        {
            debug!(
                "[scopes] live channel {channel} cursor {:?}",
                bank.query_cursor(channel)
            );
        }
        clock.wait_next();
    }

    let muted: Vec<_> = view.muted_channels().collect();
    info!("[scopes] rendered {frames} frames; muted channels {muted:?}");
    fb
}

fn spawn_replayer(
    sender: Sender<ChannelSync>,
    settings: &ScopeSettings,
) -> std::io::Result<JoinHandle<()>> {
    let channels = settings.channel_count;
    let tick = Duration::from_secs_f64(1.0 / settings.tick_rate_hz);
    thread::Builder::new()
        .name("openscopes-replayer".into())
        .spawn(move || replay_loop(sender, channels, tick))
}

fn test_samples() -> [SampleHeader; 3] {
    let sine: Vec<i8> = (0..256)
        .map(|i| ((i as f64 / 256.0 * TAU).sin() * 120.0) as i8)
        .collect();
    let saw: Vec<i16> = (0..2_048).map(|i| (i * 32 - 32_768) as i16).collect();
    let decay: Vec<i8> = (0..8_000)
        .map(|i| {
            let env = 1.0 - i as f64 / 8_000.0;
            ((i as f64 * 0.31).sin() * 127.0 * env) as i8
        })
        .collect();

    [
        SampleHeader::from_data(SampleData::Pcm8(sine.into()), 0, 256, 1),
        SampleHeader::from_data(SampleData::Pcm16(saw.into()), 512, 1_536, 2),
        SampleHeader::from_data(SampleData::Pcm8(decay.into()), 0, 0, 0),
    ]
}

/// Simulated replayer: retriggers notes on a fixed pattern and reports each tick.
fn replay_loop(sender: Sender<ChannelSync>, channels: usize, tick: Duration) {
    let samples = test_samples();
    let mut row = 0u64;

    info!("[replayer] started with {channels} channels");
    loop {
        let channels = (0..channels)
            .map(|ch| {
                let step = row + ch as u64 * 3;
                let mut status = UpdateStatus::VOLUME;
                let trigger = step % 24 == 0;
                if trigger {
                    status = status | UpdateStatus::PERIOD | UpdateStatus::TRIGGER;
                }
                let sample = ch % samples.len();
                SyncChannel {
                    status,
                    final_volume: (256 - (step % 24) * 8) as u16,
                    frequency_hz: 4_181 << (ch % 4),
                    sample: trigger.then(|| samples[sample].clone()),
                    instrument: 1,
                    sample_number: sample as u8,
                    start_offset: 0,
                }
            })
            .collect();

        if sender.send_blocking(ChannelSync { channels }).is_err() {
            break;
        }
        row += 1;
        thread::sleep(tick);
    }
    info!("[replayer] sync queue closed after {row} rows");
}
