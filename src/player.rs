use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;

use crate::catalog::TrackKind;
use crate::error::Result;

/// One embedded third-party player. All transport calls are fire-and-forget
/// on the embed side; the queries return `None` when the embed has no
/// numeric answer yet.
#[async_trait]
pub trait PlayerHandle: Sync + Send {
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn seek_to(&self, seconds: f64) -> Result<()>;
    async fn set_volume(&self, volume: u8) -> Result<()>;
    async fn set_playback_rate(&self, rate: f64) -> Result<()>;
    async fn current_time(&self) -> Result<Option<f64>>;
    async fn duration(&self) -> Result<Option<f64>>;
}

/// Creates embeds. Readiness is reported later as [`PlayerEvent::Ready`].
#[async_trait]
pub trait PlayerHost: Sync + Send {
    async fn mount(
        &self,
        kind: TrackKind,
        generation: u64,
        track_id: &str,
        options: EmbedOptions,
    ) -> Result<()>;
}

pub enum PlayerEvent {
    Ready {
        kind: TrackKind,
        generation: u64,
        handle: Arc<dyn PlayerHandle>,
    },
}

impl fmt::Debug for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerEvent::Ready {
                kind, generation, ..
            } => f
                .debug_struct("Ready")
                .field("kind", kind)
                .field("generation", generation)
                .finish(),
        }
    }
}

/// `playerVars` of the iframe embed.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub autoplay: u8,
    pub controls: u8,
    pub mute: u8,
    pub disablekb: u8,
    pub modestbranding: u8,
    pub rel: u8,
}

impl EmbedOptions {
    /// The video embed is visible and muted; the audio embed is hidden and
    /// carries the sound.
    pub fn for_kind(kind: TrackKind) -> Self {
        let base = EmbedOptions {
            autoplay: 0,
            controls: 0,
            mute: 0,
            disablekb: 1,
            modestbranding: 1,
            rel: 0,
        };
        match kind {
            TrackKind::Video => EmbedOptions {
                controls: 1,
                mute: 1,
                ..base
            },
            TrackKind::Audio => EmbedOptions {
                autoplay: 1,
                ..base
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(u8),
    SetPlaybackRate(f64),
}

impl PlayerCommand {
    pub async fn send(self, player: &dyn PlayerHandle) -> Result<()> {
        match self {
            PlayerCommand::Play => player.play().await,
            PlayerCommand::Pause => player.pause().await,
            PlayerCommand::SeekTo(seconds) => player.seek_to(seconds).await,
            PlayerCommand::SetVolume(volume) => player.set_volume(volume).await,
            PlayerCommand::SetPlaybackRate(rate) => player.set_playback_rate(rate).await,
        }
    }
}

/// The audio and video handles of the current mix.
///
/// Transport commands are held back until both embeds have reported ready
/// and are then delivered in the order they were issued.
#[derive(Default)]
pub struct PlayerPair {
    audio: Option<Arc<dyn PlayerHandle>>,
    video: Option<Arc<dyn PlayerHandle>>,
    queued: Vec<(TrackKind, PlayerCommand)>,
}

impl PlayerPair {
    pub fn reset(&mut self) {
        self.audio = None;
        self.video = None;
        self.queued.clear();
    }

    pub fn handle(&self, kind: TrackKind) -> Option<&Arc<dyn PlayerHandle>> {
        match kind {
            TrackKind::Audio => self.audio.as_ref(),
            TrackKind::Video => self.video.as_ref(),
        }
    }

    pub fn is_ready(&self, kind: TrackKind) -> bool {
        self.handle(kind).is_some()
    }

    pub fn both_ready(&self) -> bool {
        self.audio.is_some() && self.video.is_some()
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn attach(&mut self, kind: TrackKind, handle: Arc<dyn PlayerHandle>) {
        match kind {
            TrackKind::Audio => self.audio = Some(handle),
            TrackKind::Video => self.video = Some(handle),
        }
    }

    pub async fn dispatch(&mut self, kind: TrackKind, command: PlayerCommand) {
        if self.both_ready() {
            self.send_if_ready(kind, command).await;
        } else {
            debug!("Queueing {:?} for {} player", command, kind);
            self.queued.push((kind, command));
        }
    }

    pub async fn dispatch_both(&mut self, command: PlayerCommand) {
        self.dispatch(TrackKind::Audio, command).await;
        self.dispatch(TrackKind::Video, command).await;
    }

    /// Bypasses the queue. Used for per-embed settings that do not need the
    /// other player.
    pub async fn send_if_ready(&self, kind: TrackKind, command: PlayerCommand) {
        if let Some(handle) = self.handle(kind) {
            if let Err(e) = command.send(handle.as_ref()).await {
                warn!("{} player rejected {:?}: {}", kind, command, e);
            }
        }
    }

    pub async fn flush(&mut self) {
        if !self.both_ready() {
            return;
        }
        let queued = std::mem::take(&mut self.queued);
        if !queued.is_empty() {
            debug!("Flushing {} queued player commands", queued.len());
        }
        for (kind, command) in queued {
            self.send_if_ready(kind, command).await;
        }
    }
}

impl fmt::Debug for PlayerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerPair")
            .field("audio_ready", &self.audio.is_some())
            .field("video_ready", &self.video.is_some())
            .field("queued", &self.queued)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::Error;

    /// Records every command it receives; queries answer from fixed values.
    /// With `stall` set, queries hang that long and then fail the way a
    /// bridge query does when the page stops answering.
    #[derive(Default)]
    pub struct RecordingPlayer {
        pub calls: Mutex<Vec<PlayerCommand>>,
        pub elapsed: Mutex<Option<f64>>,
        pub total: Mutex<Option<f64>>,
        pub stall: Mutex<Option<Duration>>,
    }

    impl RecordingPlayer {
        pub fn with_times(elapsed: Option<f64>, total: Option<f64>) -> Arc<Self> {
            let player = RecordingPlayer::default();
            *player.elapsed.lock().unwrap() = elapsed;
            *player.total.lock().unwrap() = total;
            Arc::new(player)
        }

        pub fn calls(&self) -> Vec<PlayerCommand> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn record(&self, command: PlayerCommand) -> Result<()> {
            self.calls.lock().unwrap().push(command);
            Ok(())
        }

        async fn answer(&self, value: Option<f64>) -> Result<Option<f64>> {
            let stall = *self.stall.lock().unwrap();
            match stall {
                Some(delay) => {
                    tokio::time::sleep(delay).await;
                    Err(Error::Bridge("query timed out".into()))
                }
                None => Ok(value),
            }
        }
    }

    #[async_trait]
    impl PlayerHandle for RecordingPlayer {
        async fn play(&self) -> Result<()> {
            self.record(PlayerCommand::Play)
        }
        async fn pause(&self) -> Result<()> {
            self.record(PlayerCommand::Pause)
        }
        async fn seek_to(&self, seconds: f64) -> Result<()> {
            self.record(PlayerCommand::SeekTo(seconds))
        }
        async fn set_volume(&self, volume: u8) -> Result<()> {
            self.record(PlayerCommand::SetVolume(volume))
        }
        async fn set_playback_rate(&self, rate: f64) -> Result<()> {
            self.record(PlayerCommand::SetPlaybackRate(rate))
        }
        async fn current_time(&self) -> Result<Option<f64>> {
            let elapsed = *self.elapsed.lock().unwrap();
            self.answer(elapsed).await
        }
        async fn duration(&self) -> Result<Option<f64>> {
            let total = *self.total.lock().unwrap();
            self.answer(total).await
        }
    }
}
