use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::catalog::{CatalogList, Selection, TrackKind};
use crate::config::Config;
use crate::error::{Result, UserError};
use crate::infrastructure::client::mix_client::MixApi;
use crate::infrastructure::mix_client::model::mix_model::{CatalogEntry, Mix};
use crate::player::{EmbedOptions, PlayerCommand, PlayerHandle, PlayerHost, PlayerPair};

pub const AUDIO_PLACEHOLDER: &str = "TRACK 1";
pub const VIDEO_PLACEHOLDER: &str = "TRACK 2";

type Times = (Result<Option<f64>>, Result<Option<f64>>);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackProgress {
    pub elapsed: f64,
    pub duration: f64,
}

/// Everything the UI renders. Only [`MashupController`] mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub catalog: Vec<CatalogEntry>,
    pub selected_audio: Option<Selection>,
    pub selected_video: Option<Selection>,
    pub current_mix: Option<Mix>,
    pub error: Option<UserError>,
    pub playing: bool,
    pub volume: u8,
    pub audio: TrackProgress,
    pub video: TrackProgress,
    pub audio_ready: bool,
    pub video_ready: bool,
}

impl ControllerState {
    fn new(volume: u8) -> Self {
        ControllerState {
            catalog: Vec::new(),
            selected_audio: None,
            selected_video: None,
            current_mix: None,
            error: None,
            playing: false,
            volume: volume.min(100),
            audio: TrackProgress::default(),
            video: TrackProgress::default(),
            audio_ready: false,
            video_ready: false,
        }
    }

    pub fn list(&self, kind: TrackKind) -> CatalogList {
        let selected = self.selection(kind).map(|s| s.id.as_str());
        CatalogList::new(&self.catalog, kind, selected)
    }

    pub fn selection(&self, kind: TrackKind) -> Option<&Selection> {
        match kind {
            TrackKind::Audio => self.selected_audio.as_ref(),
            TrackKind::Video => self.selected_video.as_ref(),
        }
    }

    pub fn progress(&self, kind: TrackKind) -> TrackProgress {
        match kind {
            TrackKind::Audio => self.audio,
            TrackKind::Video => self.video,
        }
    }

    fn progress_mut(&mut self, kind: TrackKind) -> &mut TrackProgress {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Video => &mut self.video,
        }
    }

    pub fn can_submit_custom(&self) -> bool {
        self.selected_audio.is_some() && self.selected_video.is_some()
    }

    /// Catalog title of the playing track, else the last picked title, else
    /// a placeholder.
    pub fn now_playing_title(&self, kind: TrackKind) -> String {
        let from_catalog = self.current_mix.as_ref().and_then(|mix| {
            let id = match kind {
                TrackKind::Audio => &mix.audio_id,
                TrackKind::Video => &mix.video_id,
            };
            self.catalog
                .iter()
                .find(|entry| &entry.youtube_link == id)
                .and_then(|entry| entry.title.clone())
                .filter(|title| !title.is_empty())
        });

        from_catalog
            .or_else(|| {
                self.selection(kind)
                    .and_then(|s| s.title.clone())
                    .filter(|title| !title.is_empty())
            })
            .unwrap_or_else(|| match kind {
                TrackKind::Audio => AUDIO_PLACEHOLDER.to_string(),
                TrackKind::Video => VIDEO_PLACEHOLDER.to_string(),
            })
    }
}

pub struct MashupController {
    api: Arc<dyn MixApi>,
    host: Arc<dyn PlayerHost>,
    video_rate: f64,
    /// Upper bound on one round of time queries, kept below the poll interval.
    query_budget: Duration,
    state: ControllerState,
    players: PlayerPair,
    generation: u64,
}

impl MashupController {
    pub fn new(api: Arc<dyn MixApi>, host: Arc<dyn PlayerHost>, config: &Config) -> Self {
        MashupController {
            api,
            host,
            video_rate: config.video_playback_rate,
            query_budget: config.poll_interval.mul_f64(0.8),
            state: ControllerState::new(config.default_volume),
            players: PlayerPair::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Bumped every time a mix is adopted.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn load_catalog(&mut self) {
        match self.api.sources().await {
            Ok(entries) => {
                info!("Loaded {} catalog entries", entries.len());
                self.state.catalog = entries;
            }
            Err(e) => {
                warn!("Loading catalog failed: {}", e);
                self.state.error = Some(UserError::BackendUnreachable);
            }
        }
    }

    pub fn select(&mut self, selection: Selection) {
        debug!("Selected {} source {}", selection.kind, selection.id);
        match selection.kind {
            TrackKind::Audio => self.state.selected_audio = Some(selection),
            TrackKind::Video => self.state.selected_video = Some(selection),
        }
        self.state.error = None;
    }

    pub async fn request_random_mix(&mut self) {
        match self.api.random_mix().await {
            Ok(mix) => self.start_mix(mix).await,
            Err(e) => {
                warn!("Random mix request failed: {}", e);
                self.state.error = Some(UserError::EmptyRandomPool);
            }
        }
    }

    pub async fn request_custom_mix(&mut self) {
        let request = match (&self.state.selected_audio, &self.state.selected_video) {
            (Some(audio), Some(video)) => Some(Mix {
                audio_id: audio.id.clone(),
                video_id: video.id.clone(),
            }),
            _ => None,
        };
        let Some(request) = request else {
            self.state.error = Some(UserError::ChooseBoth);
            return;
        };

        match self.api.custom_mix(&request).await {
            Ok(mix) => self.start_mix(mix).await,
            Err(e) => {
                warn!("Custom mix request failed: {}", e);
                self.state.error = Some(UserError::CustomMixFailed);
            }
        }
    }

    async fn start_mix(&mut self, mix: Mix) {
        self.generation += 1;
        info!(
            "Starting mix {} (audio {}, video {})",
            self.generation, mix.audio_id, mix.video_id
        );

        self.players.reset();
        self.state.audio = TrackProgress::default();
        self.state.video = TrackProgress::default();
        self.state.audio_ready = false;
        self.state.video_ready = false;
        self.state.playing = true;

        for (kind, track_id) in [
            (TrackKind::Audio, mix.audio_id.as_str()),
            (TrackKind::Video, mix.video_id.as_str()),
        ] {
            if let Err(e) = self
                .host
                .mount(kind, self.generation, track_id, EmbedOptions::for_kind(kind))
                .await
            {
                warn!("Mounting {} player for {} failed: {}", kind, track_id, e);
            }
        }
        self.state.current_mix = Some(mix);

        self.players.dispatch_both(PlayerCommand::Play).await;
        self.players
            .dispatch(TrackKind::Video, PlayerCommand::SetPlaybackRate(self.video_rate))
            .await;
    }

    pub async fn toggle_play(&mut self) {
        if self.state.current_mix.is_none() {
            return;
        }
        self.state.playing = !self.state.playing;
        let command = if self.state.playing {
            PlayerCommand::Play
        } else {
            PlayerCommand::Pause
        };
        self.players.dispatch_both(command).await;
    }

    pub async fn stop(&mut self) {
        if self.state.current_mix.is_none() {
            return;
        }
        self.state.playing = false;
        for kind in [TrackKind::Audio, TrackKind::Video] {
            self.players.dispatch(kind, PlayerCommand::Pause).await;
            self.players.dispatch(kind, PlayerCommand::SeekTo(0.0)).await;
        }
        self.state.audio.elapsed = 0.0;
        self.state.video.elapsed = 0.0;
    }

    /// Only the given track moves; the other keeps its position.
    pub async fn seek(&mut self, kind: TrackKind, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        let seconds = seconds.max(0.0);
        self.state.progress_mut(kind).elapsed = seconds;
        if self.state.current_mix.is_some() {
            self.players.dispatch(kind, PlayerCommand::SeekTo(seconds)).await;
        }
    }

    /// Volume only ever applies to the audio embed.
    pub async fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.state.volume = volume;
        self.players
            .send_if_ready(TrackKind::Audio, PlayerCommand::SetVolume(volume))
            .await;
    }

    pub async fn poll_progress(&mut self) {
        if !self.state.playing {
            return;
        }
        let audio = self.players.handle(TrackKind::Audio).cloned();
        let video = self.players.handle(TrackKind::Video).cloned();
        let (audio_times, video_times) = futures_util::join!(
            read_times(TrackKind::Audio, audio.as_deref(), self.query_budget),
            read_times(TrackKind::Video, video.as_deref(), self.query_budget),
        );
        if let Some(times) = audio_times {
            self.apply_times(TrackKind::Audio, times, false);
        }
        if let Some(times) = video_times {
            self.apply_times(TrackKind::Video, times, false);
        }
    }

    pub async fn player_ready(
        &mut self,
        kind: TrackKind,
        generation: u64,
        handle: Arc<dyn PlayerHandle>,
    ) {
        if self.state.current_mix.is_none() || generation != self.generation {
            debug!(
                "Ignoring stale {} player ready (generation {}, current {})",
                kind, generation, self.generation
            );
            return;
        }
        info!("{} player ready", kind);

        let init = match kind {
            TrackKind::Audio => PlayerCommand::SetVolume(self.state.volume),
            TrackKind::Video => PlayerCommand::SetPlaybackRate(self.video_rate),
        };
        if let Err(e) = init.send(handle.as_ref()).await {
            warn!("{} player rejected {:?}: {}", kind, init, e);
        }
        if let Some(times) = read_times(kind, Some(handle.as_ref()), self.query_budget).await {
            self.apply_times(kind, times, true);
        }

        let was_waiting = !self.players.both_ready();
        self.players.attach(kind, handle.clone());
        match kind {
            TrackKind::Audio => self.state.audio_ready = true,
            TrackKind::Video => self.state.video_ready = true,
        }

        if was_waiting {
            self.players.flush().await;
        } else if self.state.playing {
            // The embed was recreated after the pair had already started.
            if let Err(e) = handle.play().await {
                warn!("{} player rejected play: {}", kind, e);
            }
        }
    }

    /// On ready a zero duration is accepted; while polling only a positive
    /// one replaces the last known value.
    fn apply_times(&mut self, kind: TrackKind, (elapsed, duration): Times, initial: bool) {
        let progress = self.state.progress_mut(kind);

        match elapsed {
            Ok(Some(t)) if t.is_finite() => progress.elapsed = t,
            Ok(_) => {}
            Err(e) => debug!("Reading {} elapsed time failed: {}", kind, e),
        }
        match duration {
            Ok(Some(d)) if d.is_finite() && (initial || d > 0.0) => progress.duration = d,
            Ok(_) => {}
            Err(e) => debug!("Reading {} duration failed: {}", kind, e),
        }
    }
}

/// Asks for elapsed time and duration at once. `None` when there is no
/// handle or the embed did not answer within `budget`.
async fn read_times(
    kind: TrackKind,
    handle: Option<&dyn PlayerHandle>,
    budget: Duration,
) -> Option<Times> {
    let handle = handle?;
    let queries = async { futures_util::join!(handle.current_time(), handle.duration()) };
    match tokio::time::timeout(budget, queries).await {
        Ok(times) => Some(times),
        Err(_) => {
            debug!("{} player did not answer within {:?}", kind, budget);
            None
        }
    }
}
