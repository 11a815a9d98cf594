//! Per-channel sample scopes.
//!
//! The replayer publishes triggers and rate/volume changes into a shared
//! [`ScopeBank`]; a dedicated tracking thread advances every channel's cursor
//! at a fixed tick rate; the display thread renders snapshots through a
//! [`ScopeView`] once per frame.

pub mod bank;
pub mod error;
pub mod interaction;
pub mod latch;
pub mod layout;
pub mod position;
pub mod render;
pub mod state;
pub mod timing;
pub mod tracker;
pub mod view;

pub use bank::ScopeBank;
pub use error::{ScopeError, ScopeResult};
pub use interaction::MouseButtons;
pub use latch::Trigger;
pub use layout::{HitTarget, ScopeLayout};
pub use view::ScopeView;

use crate::settings::ScopeSettings;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use timing::TickClock;
use tracing::{info, warn};

/// Maximum number of simultaneously tracked channels.
pub const MAX_VOICES: usize = 32;
/// Height of a scope slot in pixels.
pub const SCOPE_HEIGHT: usize = 36;
/// Outstanding triggers a channel can hold before older ones are overwritten.
pub const NUM_LATCH_BUFFERS: usize = 4;

/// Owns the shared bank and the tracking thread.
#[derive(Debug)]
pub struct ScopeEngine {
    bank: Arc<ScopeBank>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    spin_margin: Duration,
}

impl ScopeEngine {
    /// Builds an engine from settings without starting the tracker.
    pub fn new(settings: &ScopeSettings) -> ScopeResult<Self> {
        let settings = settings.clone().sanitized();
        let bank = ScopeBank::new(settings.tick_rate_hz);
        bank.set_channel_count(settings.channel_count)?;

        Ok(Self {
            bank: Arc::new(bank),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            spin_margin: Duration::from_micros(settings.spin_margin_us),
        })
    }

    /// Builds an engine and starts its tracking thread.
    pub fn spawn(settings: &ScopeSettings) -> ScopeResult<Self> {
        let mut engine = Self::new(settings)?;
        engine.start()?;
        Ok(engine)
    }

    pub fn start(&mut self) -> ScopeResult<()> {
        if self.handle.is_some() {
            return Err(ScopeError::AlreadyRunning);
        }

        self.running.store(true, Ordering::Release);
        let clock = TickClock::new(self.bank.tick_rate_hz(), self.spin_margin);
        let bank = Arc::clone(&self.bank);
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("openscopes-tracker".into())
            .spawn(move || tracker::run(bank, running, clock));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::Release);
                Err(err.into())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn bank(&self) -> &Arc<ScopeBank> {
        &self.bank
    }

    /// Applies changed settings, restarting the tracker if its rate changed.
    pub fn apply_settings(&mut self, settings: &ScopeSettings) -> ScopeResult<()> {
        let settings = settings.clone().sanitized();
        self.bank.set_channel_count(settings.channel_count)?;

        let spin_margin = Duration::from_micros(settings.spin_margin_us);
        let rate_changed = (self.bank.tick_rate_hz() - settings.tick_rate_hz).abs() > f64::EPSILON;
        if !rate_changed && spin_margin == self.spin_margin {
            return Ok(());
        }

        self.spin_margin = spin_margin;
        self.bank.set_tick_rate_hz(settings.tick_rate_hz);
        if self.is_running() {
            info!("[scopes] restarting tracker at {:.2} Hz", settings.tick_rate_hz);
            self.shutdown();
            self.start()?;
        }
        Ok(())
    }

    /// Stops the tracking thread and waits for it to exit.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("[scopes] tracking thread panicked");
        }
    }
}

impl Drop for ScopeEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
