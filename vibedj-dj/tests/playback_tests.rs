//! Playback driver tests against a recording surface

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use vibedj_common::events::{EventBus, VibeEvent};
use vibedj_common::PlaybackState;
use vibedj_dj::models::{Playlist, TrackId};
use vibedj_dj::playback::{PlaybackError, PlaybackSurface, SessionRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SurfaceCall {
    Load(String),
    Play,
    Pause,
    Stop,
}

#[derive(Default)]
struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    fn take(&self) -> Vec<SurfaceCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

#[async_trait]
impl PlaybackSurface for RecordingSurface {
    async fn load(&self, track: &TrackId) {
        self.calls
            .lock()
            .unwrap()
            .push(SurfaceCall::Load(track.as_str().to_string()));
    }

    async fn play(&self) {
        self.calls.lock().unwrap().push(SurfaceCall::Play);
    }

    async fn pause(&self) {
        self.calls.lock().unwrap().push(SurfaceCall::Pause);
    }

    async fn stop(&self) {
        self.calls.lock().unwrap().push(SurfaceCall::Stop);
    }
}

fn playlist(ids: &[&str]) -> Playlist {
    Playlist::new(ids.iter().map(|id| TrackId::parse(id).unwrap()).collect())
}

async fn session(
    bus: EventBus,
) -> (
    SessionRegistry,
    vibedj_dj::playback::PlaybackHandle,
    Arc<RecordingSurface>,
) {
    let registry = SessionRegistry::new(bus);
    let surface = Arc::new(RecordingSurface::default());
    let for_driver = surface.clone();
    let handle = registry
        .create_with(move |_| for_driver as Arc<dyn PlaybackSurface>)
        .await
        .unwrap();
    (registry, handle, surface)
}

#[tokio::test]
async fn test_install_loads_and_plays_first_track() {
    let (_registry, handle, surface) = session(EventBus::new(32)).await;

    let snapshot = handle.install(playlist(&["track01", "track02"])).await.unwrap();

    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(
        surface.take(),
        vec![SurfaceCall::Load("track01".to_string()), SurfaceCall::Play]
    );
}

#[tokio::test]
async fn test_toggle_pauses_and_resumes_surface() {
    let (_registry, handle, surface) = session(EventBus::new(32)).await;
    handle.install(playlist(&["track01"])).await.unwrap();
    surface.take();

    assert_eq!(handle.toggle().await.unwrap().state, PlaybackState::Paused);
    assert_eq!(handle.toggle().await.unwrap().state, PlaybackState::Playing);
    assert_eq!(surface.take(), vec![SurfaceCall::Pause, SurfaceCall::Play]);
}

#[tokio::test]
async fn test_track_end_advances_then_exhausts() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let (_registry, handle, surface) = session(bus).await;
    handle.install(playlist(&["track01", "track02"])).await.unwrap();
    surface.take();

    let outcome = handle.track_ended().await.unwrap();
    assert!(!outcome.need_more_tracks);
    assert_eq!(outcome.snapshot.index, 1);
    assert_eq!(
        surface.take(),
        vec![SurfaceCall::Load("track02".to_string()), SurfaceCall::Play]
    );

    let outcome = handle.track_ended().await.unwrap();
    assert!(outcome.need_more_tracks);
    assert_eq!(outcome.snapshot.state, PlaybackState::Exhausted);
    assert_eq!(surface.take(), vec![SurfaceCall::Stop]);

    let mut exhausted = false;
    let mut started = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            VibeEvent::TrackStarted { index, .. } => started.push(index),
            VibeEvent::PlaylistExhausted { track_count, .. } => {
                assert_eq!(track_count, 2);
                exhausted = true;
            }
            _ => {}
        }
    }
    assert_eq!(started, vec![0, 1]);
    assert!(exhausted);
}

#[tokio::test]
async fn test_failed_tracks_are_reported_and_skipped() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let (_registry, handle, surface) = session(bus).await;
    handle.install(playlist(&["track01", "track02"])).await.unwrap();
    surface.take();

    let outcome = handle
        .track_failed(Some("video unavailable".to_string()))
        .await
        .unwrap();
    assert!(!outcome.need_more_tracks);
    assert_eq!(outcome.snapshot.index, 1);
    assert_eq!(
        surface.take(),
        vec![SurfaceCall::Load("track02".to_string()), SurfaceCall::Play]
    );

    // Failure on the last track behaves like its end
    let outcome = handle.track_failed(None).await.unwrap();
    assert!(outcome.need_more_tracks);
    assert_eq!(outcome.snapshot.state, PlaybackState::Exhausted);
    assert_eq!(surface.take(), vec![SurfaceCall::Stop]);

    let mut failed = Vec::new();
    let mut exhausted = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            VibeEvent::TrackFailed {
                index,
                track_id,
                reason,
                ..
            } => failed.push((index, track_id, reason)),
            VibeEvent::PlaylistExhausted { .. } => exhausted = true,
            _ => {}
        }
    }
    assert_eq!(
        failed,
        vec![
            (0, "track01".to_string(), Some("video unavailable".to_string())),
            (1, "track02".to_string(), None),
        ]
    );
    assert!(exhausted);

    // Nothing current any more: rejected, nothing reported
    assert!(matches!(
        handle.track_failed(None).await,
        Err(PlaybackError::InvalidTransition {
            state: PlaybackState::Exhausted,
            ..
        })
    ));
    assert!(!matches!(rx.try_recv(), Ok(VibeEvent::TrackFailed { .. })));
}

#[tokio::test]
async fn test_rejected_event_touches_nothing() {
    let (_registry, handle, surface) = session(EventBus::new(32)).await;

    let err = handle.skip().await.unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::InvalidTransition {
            state: PlaybackState::Idle,
            ..
        }
    ));
    assert!(surface.take().is_empty());
    assert_eq!(handle.snapshot().await.unwrap().state, PlaybackState::Idle);
}

#[tokio::test]
async fn test_empty_install_stops_surface() {
    let (_registry, handle, surface) = session(EventBus::new(32)).await;
    handle.install(playlist(&["track01"])).await.unwrap();
    surface.take();

    let snapshot = handle.install(Playlist::empty()).await.unwrap();
    assert_eq!(snapshot.state, PlaybackState::Idle);
    assert_eq!(surface.take(), vec![SurfaceCall::Stop]);
}

#[tokio::test]
async fn test_commands_from_many_tasks_are_serialized() {
    let (_registry, handle, _surface) = session(EventBus::new(256)).await;
    let ids: Vec<String> = (0..20).map(|i| format!("track{i:02}")).collect();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    handle.install(playlist(&ids)).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move { handle.skip().await.unwrap() }));
    }
    let mut indices: Vec<usize> = Vec::new();
    for task in tasks {
        indices.push(task.await.unwrap().snapshot.index);
    }
    indices.sort_unstable();

    assert_eq!(indices, (1..=10).collect::<Vec<_>>());
    assert_eq!(handle.snapshot().await.unwrap().index, 10);
}

#[tokio::test]
async fn test_removed_session_stops_surface() {
    let (registry, handle, surface) = session(EventBus::new(32)).await;
    handle.install(playlist(&["track01"])).await.unwrap();
    surface.take();

    registry.remove(handle.session_id()).await.unwrap();

    assert_eq!(surface.take(), vec![SurfaceCall::Stop]);
    assert!(matches!(
        handle.toggle().await,
        Err(PlaybackError::DriverClosed)
    ));
}
