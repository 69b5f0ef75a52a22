use std::time::Duration;

use futures_channel::oneshot;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::catalog::{Selection, TrackKind};
use crate::controller::{ControllerState, MashupController};
use crate::error::{Error, Result};
use crate::player::PlayerEvent;

#[derive(Debug)]
pub enum Command {
    Select(Selection),
    RandomMix,
    CustomMix,
    TogglePlay,
    Stop,
    Seek(TrackKind, f64),
    Volume(u8),
    Snapshot(oneshot::Sender<ControllerState>),
    Shutdown,
}

/// Cheap to clone; the controller task ends once every handle is dropped or
/// [`ControllerHandle::shutdown`] is called.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl ControllerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::ControllerClosed)
    }

    pub fn select(&self, selection: Selection) -> Result<()> {
        self.send(Command::Select(selection))
    }

    pub fn random_mix(&self) -> Result<()> {
        self.send(Command::RandomMix)
    }

    pub fn custom_mix(&self) -> Result<()> {
        self.send(Command::CustomMix)
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(Command::TogglePlay)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    pub fn seek(&self, kind: TrackKind, seconds: f64) -> Result<()> {
        self.send(Command::Seek(kind, seconds))
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        self.send(Command::Volume(volume))
    }

    /// Answered after every command sent before it has been handled.
    pub async fn snapshot(&self) -> Result<ControllerState> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| Error::ControllerClosed)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}

/// Runs `controller` on its own task: loads the catalog once, then handles
/// commands and player events one at a time and polls progress every
/// `poll_interval` while playing.
pub fn spawn(
    controller: MashupController,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    poll_interval: Duration,
) -> (ControllerHandle, JoinHandle<MashupController>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(controller, rx, events, poll_interval));
    (ControllerHandle { commands: tx }, task)
}

async fn run(
    mut controller: MashupController,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<PlayerEvent>,
    poll_interval: Duration,
) -> MashupController {
    controller.load_catalog().await;

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let playing = controller.state().playing;
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(command) => handle(&mut controller, command).await,
            },
            Some(event) = events.recv() => match event {
                PlayerEvent::Ready { kind, generation, handle } => {
                    controller.player_ready(kind, generation, handle).await
                }
            },
            _ = ticker.tick(), if playing => controller.poll_progress().await,
        }
    }

    info!("Controller stopped");
    controller
}

async fn handle(controller: &mut MashupController, command: Command) {
    debug!("Handling {:?}", command);
    match command {
        Command::Select(selection) => controller.select(selection),
        Command::RandomMix => controller.request_random_mix().await,
        Command::CustomMix => controller.request_custom_mix().await,
        Command::TogglePlay => controller.toggle_play().await,
        Command::Stop => controller.stop().await,
        Command::Seek(kind, seconds) => controller.seek(kind, seconds).await,
        Command::Volume(volume) => controller.set_volume(volume).await,
        Command::Snapshot(reply) => {
            let _ = reply.send(controller.state().clone());
        }
        Command::Shutdown => {}
    }
}
