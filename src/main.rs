use std::sync::Arc;

use anyhow::{bail, Context};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use mashup_player::catalog::{format_time, TrackKind};
use mashup_player::config::Config;
use mashup_player::controller::{ControllerState, MashupController};
use mashup_player::infrastructure::bridge::player_bridge::PlayerBridge;
use mashup_player::infrastructure::client::mix_client::MixClient;
use mashup_player::service::{self, ControllerHandle};

const HELP: &str = "\
commands:
  list                     show the audio and video catalogs
  pick audio|video <id>    choose a source
  random                   play a random mix
  mix                      play the chosen audio and video
  play                     toggle play/pause
  stop                     stop and rewind both tracks
  seek audio|video <secs>  move one track
  volume <0-100>           audio volume
  status                   show what is playing
  quit";

#[derive(Debug, Clone, PartialEq)]
enum Input {
    List,
    Pick(TrackKind, String),
    Random,
    Mix,
    Toggle,
    Stop,
    Seek(TrackKind, f64),
    Volume(u8),
    Status,
    Help,
    Quit,
}

fn parse_kind(word: Option<&str>) -> anyhow::Result<TrackKind> {
    match word {
        Some("audio") => Ok(TrackKind::Audio),
        Some("video") => Ok(TrackKind::Video),
        other => bail!("expected audio or video, got {:?}", other.unwrap_or("")),
    }
}

fn parse_input(line: &str) -> anyhow::Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some(command) => command,
        None => return Ok(None),
    };

    let input = match command {
        "list" | "ls" => Input::List,
        "pick" => {
            let kind = parse_kind(words.next())?;
            let id = words.next().context("missing source id")?;
            Input::Pick(kind, id.to_string())
        }
        "random" => Input::Random,
        "mix" => Input::Mix,
        "play" | "pause" => Input::Toggle,
        "stop" => Input::Stop,
        "seek" => {
            let kind = parse_kind(words.next())?;
            let seconds = words
                .next()
                .context("missing position")?
                .parse::<f64>()
                .context("position must be a number of seconds")?;
            Input::Seek(kind, seconds)
        }
        "volume" | "vol" => {
            let volume = words
                .next()
                .context("missing volume")?
                .parse::<u8>()
                .context("volume must be between 0 and 100")?;
            if volume > 100 {
                bail!("volume must be between 0 and 100");
            }
            Input::Volume(volume)
        }
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => bail!("unknown command {:?}, try help", other),
    };
    Ok(Some(input))
}

fn print_status(state: &ControllerState) {
    if let Some(error) = &state.error {
        println!("! {}", error);
    }
    for kind in [TrackKind::Audio, TrackKind::Video] {
        let progress = state.progress(kind);
        println!(
            "{}: {}  {} / {}",
            kind.to_string().to_uppercase(),
            state.now_playing_title(kind),
            format_time(progress.elapsed),
            format_time(progress.duration)
        );
    }
    let transport = match (&state.current_mix, state.playing) {
        (None, _) => "no mix",
        (Some(_), true) => "playing",
        (Some(_), false) => "paused",
    };
    println!("[{}] volume {}", transport, state.volume);
}

async fn dispatch(controller: &ControllerHandle, input: Input) -> anyhow::Result<()> {
    match input {
        Input::List => {
            let state = controller.snapshot().await?;
            print!("{}", state.list(TrackKind::Audio));
            print!("{}", state.list(TrackKind::Video));
        }
        Input::Pick(kind, id) => {
            let state = controller.snapshot().await?;
            let list = state.list(kind);
            match list.find(&id) {
                Some(row) => controller.select(list.select(row))?,
                None => println!("no {} source {}", kind, id),
            }
        }
        Input::Random => controller.random_mix()?,
        Input::Mix => controller.custom_mix()?,
        Input::Toggle => controller.toggle_play()?,
        Input::Stop => controller.stop()?,
        Input::Seek(kind, seconds) => controller.seek(kind, seconds)?,
        Input::Volume(volume) => controller.set_volume(volume)?,
        Input::Status => print_status(&controller.snapshot().await?),
        Input::Help => println!("{}", HELP),
        Input::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().context("reading configuration")?;
    info!("Using mix backend at {}", config.api_base_url);

    let api = Arc::new(MixClient::new(&config)?);
    let (bridge, events) = PlayerBridge::connect(&config.bridge_url)
        .await
        .with_context(|| format!("connecting to player bridge at {}", config.bridge_url))?;

    let controller = MashupController::new(api, Arc::new(bridge.clone()), &config);
    let (handle, task) = service::spawn(controller, events, config.poll_interval);

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => dispatch(&handle, input).await?,
            Ok(None) => {}
            Err(e) => println!("{:#}", e),
        }
    }

    handle.shutdown()?;
    task.await?;
    if let Err(e) = bridge.close().await {
        warn!("Closing player bridge failed: {}", e);
    }
    Ok(())
}
