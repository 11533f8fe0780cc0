use super::*;
use crate::aspect::AspectRatio;
use crate::config::ReccamConfig;
use crate::device::{LensFacing, Rotation, SimulatedCameraProvider};
use crate::error::ReccamError;
use crate::events::{EventBus, ReccamEvent};
use crate::gesture::TouchEvent;
use crate::session::{RecordingState, TokioScheduler};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

fn test_config(dir: &Path) -> ReccamConfig {
    let mut config = ReccamConfig::default();
    config.recording.output_path = dir.display().to_string();
    config.recording.tick_interval_ms = 50;
    config
}

fn video_screen(
    config: ReccamConfig,
    provider: Arc<SimulatedCameraProvider>,
    permitted: bool,
) -> (VideoScreen, broadcast::Receiver<ReccamEvent>) {
    let event_bus = EventBus::new(256);
    let events = event_bus.subscribe();
    let (scheduler, _ticks) = TokioScheduler::new();
    let screen = VideoScreen::new(
        config,
        provider,
        event_bus,
        Box::new(StaticPermissions(permitted)),
        scheduler,
    );
    (screen, events)
}

fn drain(events: &mut broadcast::Receiver<ReccamEvent>) -> Vec<ReccamEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

async fn wait_for<F>(events: &mut broadcast::Receiver<ReccamEvent>, mut predicate: F) -> ReccamEvent
where
    F: FnMut(&ReccamEvent) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_set_up_camera_binds_preferred_lens() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, mut events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);

    screen.update_camera_ui().await.unwrap();
    assert!(!screen.switch_enabled());

    screen.set_up_camera().await.unwrap();
    assert!(screen.has_device());
    assert!(screen.switch_enabled());
    assert_eq!(screen.lens(), LensFacing::Back);

    let bound = provider.state().bound.unwrap();
    assert_eq!(bound.aspect_ratio, AspectRatio::Ratio16x9);

    let events = drain(&mut events);
    assert!(events.contains(&ReccamEvent::CameraSwitchEnabled { enabled: true }));
    assert!(events.contains(&ReccamEvent::CameraBound {
        lens: LensFacing::Back,
        aspect_ratio: AspectRatio::Ratio16x9,
        rotation: Rotation::Rotate0,
    }));
}

#[tokio::test]
async fn test_set_up_camera_falls_back_to_front() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(false, true));
    let mut config = test_config(dir.path());
    config.camera.viewport = (1000, 750);
    let (mut screen, _events) = video_screen(config, Arc::clone(&provider), true);

    screen.set_up_camera().await.unwrap();
    assert_eq!(screen.lens(), LensFacing::Front);
    assert!(!screen.switch_enabled());
    assert_eq!(
        provider.state().bound.unwrap().aspect_ratio,
        AspectRatio::Ratio4x3
    );
}

#[tokio::test]
async fn test_record_without_camera_is_device_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, _events) = video_screen(test_config(dir.path()), provider, true);

    assert!(matches!(
        screen.record_video(),
        Err(ReccamError::DeviceUnavailable)
    ));
    assert_eq!(screen.session().state(), RecordingState::Idle);
}

#[tokio::test]
async fn test_record_start_stop_saves_video() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, mut events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);
    screen.set_up_camera().await.unwrap();
    drain(&mut events);

    let pending = screen.record_video().unwrap().unwrap();
    assert!(screen.session().is_recording());
    assert!(screen.record_video().unwrap().is_none());
    assert!(!screen.session().is_recording());

    let result = pending.completion.await;
    let saved = result.clone().unwrap();
    assert!(saved.location.starts_with(dir.path()));
    assert!(saved.location.exists());

    screen.on_recording_finished(pending.recording_id, result);
    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(e, ReccamEvent::RecordingStarted { recording_id: 1, .. })));
    assert!(events.contains(&ReccamEvent::RecordingStopped { recording_id: 1 }));
    assert!(events.contains(&ReccamEvent::TimerVisibility { visible: false }));
    assert!(events.contains(&ReccamEvent::ThumbnailUpdated {
        location: saved.location.clone()
    }));
}

#[tokio::test]
async fn test_device_failure_resets_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, mut events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);
    screen.set_up_camera().await.unwrap();
    provider.fail_next_recording("no space left");

    let pending = screen.record_video().unwrap().unwrap();
    let result = pending.completion.await;
    assert!(result.is_err());

    screen.on_recording_finished(pending.recording_id, result);
    assert_eq!(screen.session().state(), RecordingState::Idle);

    let events = drain(&mut events);
    assert!(events.contains(&ReccamEvent::RecordingFailed {
        recording_id: 1,
        message: "no space left".to_string(),
    }));
    assert!(events.contains(&ReccamEvent::UserMessage {
        message: RECORD_FAILED_MESSAGE.to_string(),
    }));

    // The next press starts a new recording
    assert!(screen.record_video().unwrap().is_some());
}

#[tokio::test]
async fn test_volume_down_clicks_capture_button() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, _events) = video_screen(test_config(dir.path()), provider, true);
    screen.set_up_camera().await.unwrap();

    assert!(screen.on_key(HostKey::VolumeUp).unwrap().is_none());
    assert!(!screen.session().is_recording());

    assert!(screen.on_key(HostKey::VolumeDown).unwrap().is_some());
    assert!(screen.session().is_recording());
    assert!(screen.on_key(HostKey::VolumeDown).unwrap().is_none());
    assert!(!screen.session().is_recording());
}

#[tokio::test]
async fn test_switch_camera() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, _events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);
    screen.set_up_camera().await.unwrap();

    assert!(screen.switch_camera().await.unwrap());
    assert_eq!(screen.lens(), LensFacing::Front);
    assert_eq!(provider.state().bound.unwrap().lens, LensFacing::Front);

    screen.record_video().unwrap();
    assert!(!screen.switch_camera().await.unwrap());
    assert_eq!(screen.lens(), LensFacing::Front);
}

#[tokio::test]
async fn test_rotation_follows_attached_display_only() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, _events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);
    screen.attach(0, Rotation::Rotate0);
    screen.set_up_camera().await.unwrap();

    screen.on_display_changed(7, Rotation::Rotate90);
    assert_eq!(provider.state().rotation, Rotation::Rotate0);

    screen.on_display_changed(0, Rotation::Rotate270);
    assert_eq!(provider.state().rotation, Rotation::Rotate270);
    assert_eq!(screen.helper().rotation(), Rotation::Rotate270);
}

#[tokio::test]
async fn test_missing_permissions_redirect() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (screen, mut events) = video_screen(test_config(dir.path()), provider, false);

    assert!(!screen.resume());
    assert_eq!(
        drain(&mut events),
        vec![ReccamEvent::NavigationRequested {
            destination: Destination::Permissions
        }]
    );
}

#[tokio::test]
async fn test_swipe_left_navigates_to_photo() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, _events) = video_screen(test_config(dir.path()), provider, true);

    let start = Instant::now();
    assert!(screen.on_touch(TouchEvent::press(600.0, 400.0, start)).is_none());
    let destination = screen.on_touch(TouchEvent::release(
        100.0,
        410.0,
        start + Duration::from_millis(150),
    ));
    assert_eq!(destination, Some(Destination::Photo));
}

#[tokio::test]
async fn test_flash_selection_drives_torch() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, mut events) =
        video_screen(test_config(dir.path()), Arc::clone(&provider), true);
    screen.set_up_camera().await.unwrap();
    drain(&mut events);

    screen.show_flash_options();
    screen.close_flash_options_and_select(true).unwrap();
    assert!(screen.torch());
    assert!(provider.state().torch);

    assert_eq!(
        drain(&mut events),
        vec![
            ReccamEvent::FlashOptionsVisible { visible: true },
            ReccamEvent::FlashOptionsVisible { visible: false },
            ReccamEvent::TorchChanged { enabled: true },
        ]
    );
}

#[tokio::test]
async fn test_gallery_requires_media() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (screen, mut events) = video_screen(test_config(dir.path()), provider, true);

    assert!(!screen.show_gallery().await.unwrap());
    std::fs::write(dir.path().join("2024-01-01-00-00-00-000.mp4"), b"x").unwrap();
    assert!(screen.show_gallery().await.unwrap());

    assert_eq!(
        drain(&mut events),
        vec![ReccamEvent::NavigationRequested {
            destination: Destination::Gallery {
                directory: dir.path().to_path_buf()
            }
        }]
    );
}

#[tokio::test]
async fn test_update_camera_ui_loads_thumbnail() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("2024-01-01-00-00-00-000.mp4");
    std::fs::write(&existing, b"x").unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let (mut screen, mut events) = video_screen(test_config(dir.path()), provider, true);

    screen.update_camera_ui().await.unwrap();
    assert!(drain(&mut events).contains(&ReccamEvent::ThumbnailUpdated { location: existing }));
}

#[tokio::test]
async fn test_key_subscription_lifecycle() {
    let key_events = HostKeyEvents::new(8);
    assert_eq!(key_events.dispatch(HostKey::VolumeDown), 0);

    let resources = ScreenResources::acquire(&key_events);
    assert_eq!(key_events.subscriber_count(), 1);
    assert_eq!(key_events.dispatch(HostKey::VolumeDown), 1);

    drop(resources);
    assert_eq!(key_events.subscriber_count(), 0);
}

#[tokio::test]
async fn test_resources_abort_tasks_on_drop() {
    let key_events = HostKeyEvents::new(8);
    let mut resources = ScreenResources::acquire(&key_events);
    let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
    resources.spawn(async move {
        let _alive = alive_tx;
        std::future::pending::<()>().await;
    });
    assert_eq!(resources.pending_tasks(), 1);

    drop(resources);
    // The sender is dropped only when the task is aborted
    let closed = timeout(Duration::from_secs(1), alive_rx).await.unwrap();
    assert!(closed.is_err());
}

#[tokio::test]
async fn test_resources_settle_waits_for_tasks() {
    let key_events = HostKeyEvents::new(8);
    let mut resources = ScreenResources::acquire(&key_events);
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let task_done = Arc::clone(&done);
    resources.spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        task_done.store(true, std::sync::atomic::Ordering::SeqCst);
    });

    assert!(resources.settle(Duration::from_secs(1)).await);
    assert!(done.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(resources.pending_tasks(), 0);
}

#[tokio::test]
async fn test_resources_settle_gives_up_after_limit() {
    let key_events = HostKeyEvents::new(8);
    let mut resources = ScreenResources::acquire(&key_events);
    resources.spawn(std::future::pending());

    assert!(!resources.settle(Duration::from_millis(20)).await);
    assert_eq!(resources.pending_tasks(), 1);
}

#[tokio::test]
async fn test_runtime_records_with_timer_and_keys() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let event_bus = EventBus::new(512);
    let mut events = event_bus.subscribe();
    let key_events = HostKeyEvents::new(8);

    let (runtime, handle) = ScreenRuntime::new(
        test_config(dir.path()),
        Arc::clone(&provider) as Arc<dyn crate::device::CameraProvider>,
        event_bus,
        Box::new(StaticPermissions(true)),
        key_events.clone(),
    );
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(runtime.run(shutdown.clone()));

    wait_for(&mut events, |e| matches!(e, ReccamEvent::CameraBound { .. })).await;
    assert_eq!(key_events.subscriber_count(), 1);

    handle.send(ScreenCommand::CaptureButton).await.unwrap();
    wait_for(&mut events, |e| {
        matches!(e, ReccamEvent::TimerUpdated { formatted, .. } if formatted == "00:00:02")
    })
    .await;

    // Volume down stops the recording through the key channel
    key_events.dispatch(HostKey::VolumeDown);
    wait_for(&mut events, |e| matches!(e, ReccamEvent::RecordingStopped { recording_id: 1 })).await;
    let saved = wait_for(&mut events, |e| matches!(e, ReccamEvent::VideoSaved { .. })).await;
    let ReccamEvent::VideoSaved { location, .. } = saved else {
        unreachable!();
    };
    assert!(location.exists());

    handle.send(ScreenCommand::Exit).await.unwrap();
    timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(key_events.subscriber_count(), 0);
    assert!(provider.state().bound.is_none());
}

#[tokio::test]
async fn test_runtime_exit_stops_active_recording() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(SimulatedCameraProvider::new(true, true));
    let event_bus = EventBus::new(512);
    let mut events = event_bus.subscribe();

    let (runtime, handle) = ScreenRuntime::new(
        test_config(dir.path()),
        Arc::clone(&provider) as Arc<dyn crate::device::CameraProvider>,
        event_bus,
        Box::new(StaticPermissions(true)),
        HostKeyEvents::new(8),
    );
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(runtime.run(shutdown.clone()));

    wait_for(&mut events, |e| matches!(e, ReccamEvent::CameraBound { .. })).await;
    handle.send(ScreenCommand::CaptureButton).await.unwrap();
    wait_for(&mut events, |e| matches!(e, ReccamEvent::RecordingStarted { .. })).await;

    shutdown.cancel();
    timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let remaining = drain(&mut events);
    assert!(remaining.contains(&ReccamEvent::RecordingStopped { recording_id: 1 }));
    // The recording is written before the runtime returns
    let saved = remaining.iter().find_map(|e| match e {
        ReccamEvent::VideoSaved { location, .. } => Some(location.clone()),
        _ => None,
    });
    assert!(saved.unwrap().exists());
    assert_eq!(provider.state().recordings_finalized, 1);
    assert!(handle.send(ScreenCommand::CaptureButton).await.is_err());
}
