use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mashup_player::catalog::TrackKind;
use mashup_player::config::Config;
use mashup_player::controller::MashupController;
use mashup_player::infrastructure::client::mix_client::{MixApi, MixClient};
use mashup_player::infrastructure::mix_client::model::mix_model::{CatalogEntry, Mix};
use mashup_player::player::{EmbedOptions, PlayerHost};
use mashup_player::{Error, UserError};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Backend {
    empty_pool: bool,
    custom_bodies: Arc<Mutex<Vec<Value>>>,
}

async fn sources() -> Json<Value> {
    Json(json!([
        {"id": 1, "youtubeLink": "abc", "title": "A", "artist": "X", "durationSec": 125, "isVideo": false},
        {"id": 2, "youtubeLink": "xyz", "title": "B", "artist": "Y", "durationSec": 200, "isVideo": true},
    ]))
}

async fn random(State(backend): State<Backend>) -> Result<Json<Mix>, StatusCode> {
    if backend.empty_pool {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(Mix {
        audio_id: "abc".into(),
        video_id: "xyz".into(),
    }))
}

async fn custom(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.custom_bodies.lock().unwrap().push(body.clone());
    Json(body)
}

async fn serve(backend: Backend) -> SocketAddr {
    let app = Router::new()
        .route("/api/mix/sources", get(sources))
        .route("/api/mix/random", get(random))
        .route("/api/mix/custom", post(custom))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(addr: SocketAddr) -> Config {
    let base = format!("http://{}/api/mix", addr);
    Config::from_vars(HashMap::from([("MASHUP_API_BASE_URL".to_string(), base)])).unwrap()
}

#[tokio::test]
async fn fetches_sources() {
    let addr = serve(Backend::default()).await;
    let client = MixClient::new(&config_for(addr)).unwrap();

    let entries = client.sources().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1],
        CatalogEntry {
            id: 2,
            youtube_link: "xyz".into(),
            title: Some("B".into()),
            artist: Some("Y".into()),
            duration_sec: 200,
            is_video: true,
        }
    );
}

#[tokio::test]
async fn random_and_custom_mix() {
    let backend = Backend::default();
    let addr = serve(backend.clone()).await;
    let client = MixClient::new(&config_for(addr)).unwrap();

    let mix = client.random_mix().await.unwrap();
    assert_eq!(mix.audio_id, "abc");
    assert_eq!(mix.video_id, "xyz");

    let request = Mix {
        audio_id: "xyz".into(),
        video_id: "xyz".into(),
    };
    assert_eq!(client.custom_mix(&request).await.unwrap(), request);
    assert_eq!(
        *backend.custom_bodies.lock().unwrap(),
        vec![json!({"audioId": "xyz", "videoId": "xyz"})]
    );
}

#[tokio::test]
async fn empty_pool_is_an_error_status() {
    let addr = serve(Backend {
        empty_pool: true,
        ..Default::default()
    })
    .await;
    let client = MixClient::new(&config_for(addr)).unwrap();

    match client.random_mix().await {
        Err(Error::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MixClient::new(&config_for(addr)).unwrap();
    assert!(matches!(client.sources().await, Err(Error::Http { .. })));
}

#[derive(Default)]
struct MountLog(Mutex<Vec<(TrackKind, String)>>);

#[async_trait]
impl PlayerHost for MountLog {
    async fn mount(
        &self,
        kind: TrackKind,
        _generation: u64,
        track_id: &str,
        _options: EmbedOptions,
    ) -> mashup_player::Result<()> {
        self.0.lock().unwrap().push((kind, track_id.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn controller_adopts_random_mix_from_backend() {
    let addr = serve(Backend::default()).await;
    let config = config_for(addr);
    let host = Arc::new(MountLog::default());
    let mut controller =
        MashupController::new(Arc::new(MixClient::new(&config).unwrap()), host.clone(), &config);

    controller.load_catalog().await;
    assert_eq!(controller.state().list(TrackKind::Video).rows().len(), 1);
    assert_eq!(controller.state().list(TrackKind::Audio).rows().len(), 2);

    controller.request_random_mix().await;
    let state = controller.state();
    assert_eq!(
        state.current_mix,
        Some(Mix {
            audio_id: "abc".into(),
            video_id: "xyz".into()
        })
    );
    assert!(state.playing);
    assert_eq!(state.audio.elapsed, 0.0);
    assert_eq!(state.video.elapsed, 0.0);
    assert_eq!(state.now_playing_title(TrackKind::Audio), "A");
    assert_eq!(
        *host.0.lock().unwrap(),
        vec![
            (TrackKind::Audio, "abc".to_string()),
            (TrackKind::Video, "xyz".to_string())
        ]
    );
}

#[tokio::test]
async fn controller_maps_backend_failures_to_messages() {
    let addr = serve(Backend {
        empty_pool: true,
        ..Default::default()
    })
    .await;
    let config = config_for(addr);
    let mut controller = MashupController::new(
        Arc::new(MixClient::new(&config).unwrap()),
        Arc::new(MountLog::default()),
        &config,
    );

    controller.request_random_mix().await;
    assert_eq!(controller.state().error, Some(UserError::EmptyRandomPool));
    assert!(controller.state().current_mix.is_none());
}
