// tests/banish_tests.rs
//
// Orchestrator behavior against mock collaborators: single-flight lock,
// teardown on every path, restoration skip rules.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, UserMarker};

use holodeck_common::Error;
use holodeck_common::models::Scene;
use holodeck_common::traits::platform_traits::{
    BanishAnnouncer, VoiceControl, VoiceGateway, VoiceSession,
};
use holodeck_common::traits::repository_traits::SceneRepository;
use holodeck_core::repositories::SceneStore;
use holodeck_core::services::{BanishRequest, BanishService};

const GUILD: u64 = 1;
const TARGET: u64 = 42;
const ORIGIN: u64 = 100;
const DEST: u64 = 200;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Connect(u64),
    Move(u64),
    Play,
    Announce,
    Disconnect,
}

#[derive(Default)]
struct CallLog(Mutex<Vec<Call>>);

impl CallLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }
    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct MemSceneRepository {
    scenes: Mutex<HashMap<String, Scene>>,
}

#[async_trait]
impl SceneRepository for MemSceneRepository {
    async fn upsert_scene(&self, scene: &Scene) -> Result<(), Error> {
        self.scenes
            .lock()
            .unwrap()
            .insert(scene.name.clone(), scene.clone());
        Ok(())
    }
    async fn get_scene(&self, name: &str) -> Result<Option<Scene>, Error> {
        Ok(self.scenes.lock().unwrap().get(name).cloned())
    }
    async fn list_scenes(&self) -> Result<Vec<Scene>, Error> {
        Ok(self.scenes.lock().unwrap().values().cloned().collect())
    }
}

struct MockVoiceControl {
    log: Arc<CallLog>,
    current: Mutex<Option<Id<ChannelMarker>>>,
    /// Target drops from voice as soon as they land in the destination.
    leave_after_move: bool,
    fail_moves: bool,
}

impl MockVoiceControl {
    fn in_channel(log: Arc<CallLog>, channel: u64) -> Self {
        Self {
            log,
            current: Mutex::new(Some(Id::new(channel))),
            leave_after_move: false,
            fail_moves: false,
        }
    }
}

#[async_trait]
impl VoiceControl for MockVoiceControl {
    async fn voice_channel_of(
        &self,
        _guild_id: Id<GuildMarker>,
        _user_id: Id<UserMarker>,
    ) -> Result<Option<Id<ChannelMarker>>, Error> {
        Ok(*self.current.lock().unwrap())
    }

    async fn move_member(
        &self,
        _guild_id: Id<GuildMarker>,
        _user_id: Id<UserMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<(), Error> {
        if self.fail_moves {
            return Err(Error::Platform("move rejected".into()));
        }
        self.log.push(Call::Move(channel_id.get()));
        let mut current = self.current.lock().unwrap();
        *current = if self.leave_after_move {
            None
        } else {
            Some(channel_id)
        };
        Ok(())
    }
}

struct MockSession {
    log: Arc<CallLog>,
    fail_play: bool,
}

#[async_trait]
impl VoiceSession for MockSession {
    async fn play_clip(
        &self,
        _audio_path: &Path,
        _start_millis: i64,
        _runtime_millis: i64,
    ) -> Result<(), Error> {
        if self.fail_play {
            return Err(Error::Platform("decode failed".into()));
        }
        self.log.push(Call::Play);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), Error> {
        self.log.push(Call::Disconnect);
        Ok(())
    }
}

struct MockGateway {
    log: Arc<CallLog>,
    fail_play: bool,
}

#[async_trait]
impl VoiceGateway for MockGateway {
    async fn connect(
        &self,
        _guild_id: Id<GuildMarker>,
        channel_id: Id<ChannelMarker>,
    ) -> Result<Arc<dyn VoiceSession>, Error> {
        self.log.push(Call::Connect(channel_id.get()));
        Ok(Arc::new(MockSession {
            log: self.log.clone(),
            fail_play: self.fail_play,
        }))
    }
}

struct MockAnnouncer {
    log: Arc<CallLog>,
}

#[async_trait]
impl BanishAnnouncer for MockAnnouncer {
    async fn announce(&self, _scene: &Scene, _target_id: Id<UserMarker>) -> Result<(), Error> {
        self.log.push(Call::Announce);
        Ok(())
    }
}

fn scene(name: &str, runtime_millis: i64) -> Scene {
    Scene {
        name: name.to_string(),
        creator_user_id: "1234".to_string(),
        audio_url: Some("https://youtu.be/XXXX".to_string()),
        audio_path: "data/media/youtube-XXXX-cave.webm".to_string(),
        start_time_millis: 5_000,
        runtime_millis,
        image_url: "https://img/cave.png".to_string(),
        created_at: Utc::now(),
    }
}

async fn store_with(scenes: Vec<Scene>) -> Arc<SceneStore> {
    let store = Arc::new(SceneStore::new(Arc::new(MemSceneRepository::default())));
    for s in scenes {
        store.put(s).await.unwrap();
    }
    store
}

fn request(scene_name: &str) -> BanishRequest {
    BanishRequest {
        guild_id: Id::new(GUILD),
        target_id: Id::new(TARGET),
        scene_name: scene_name.to_string(),
        dest_channel_id: Id::new(DEST),
    }
}

#[tokio::test]
async fn happy_path_runs_the_full_protocol_in_order() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(MockVoiceControl::in_channel(log.clone(), ORIGIN)),
    );

    service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap();

    assert_eq!(
        log.calls(),
        vec![
            Call::Connect(DEST),
            Call::Move(DEST),
            Call::Play,
            Call::Announce,
            Call::Move(ORIGIN),
            Call::Disconnect,
        ]
    );
}

#[tokio::test]
async fn unknown_scene_touches_nothing_and_leaves_the_lock_free() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(MockVoiceControl::in_channel(log.clone(), ORIGIN)),
    );

    let err = service
        .banish(request("nowhere"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownScene(_)));
    assert!(log.calls().is_empty());

    // Lock must be free: a valid banishment still goes through.
    service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap();
    assert!(log.calls().contains(&Call::Disconnect));
}

#[tokio::test]
async fn target_outside_voice_is_rejected_before_any_connect() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let control = MockVoiceControl {
        log: log.clone(),
        current: Mutex::new(None),
        leave_after_move: false,
        fail_moves: false,
    };
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(control),
    );

    let err = service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotInVoice(_)));
    assert!(log.calls().is_empty());
}

#[tokio::test]
async fn second_request_in_flight_observes_busy_and_does_nothing() {
    let log = Arc::new(CallLog::default());
    // Long enough that the second request lands mid-playback.
    let store = store_with(vec![scene("cave", 300)]).await;
    let service = Arc::new(BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(MockVoiceControl::in_channel(log.clone(), ORIGIN)),
    ));

    let first = {
        let service = Arc::clone(&service);
        let log = log.clone();
        tokio::spawn(async move {
            service
                .banish(request("cave"), &MockAnnouncer { log })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Busy));

    first.await.unwrap().unwrap();

    // Exactly one connect: the rejected request never reached voice.
    let connects = log
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Connect(_)))
        .count();
    assert_eq!(connects, 1);
}

#[tokio::test]
async fn play_failure_still_restores_and_disconnects() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: true,
        }),
        Arc::new(MockVoiceControl::in_channel(log.clone(), ORIGIN)),
    );

    let err = service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Platform(_)));

    assert_eq!(
        log.calls(),
        vec![
            Call::Connect(DEST),
            Call::Move(DEST),
            Call::Move(ORIGIN),
            Call::Disconnect,
        ]
    );

    // And the lock came back: a retry succeeds after the fault clears.
    let retry_log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: retry_log.clone(),
            fail_play: false,
        }),
        Arc::new(MockVoiceControl::in_channel(retry_log.clone(), ORIGIN)),
    );
    service
        .banish(request("cave"), &MockAnnouncer { log: retry_log.clone() })
        .await
        .unwrap();
}

#[tokio::test]
async fn move_rejection_disconnects_and_frees_the_lock() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let control = MockVoiceControl {
        log: log.clone(),
        current: Mutex::new(Some(Id::new(ORIGIN))),
        leave_after_move: false,
        fail_moves: true,
    };
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(control),
    );

    let err = service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Platform(_)));

    // Nothing was relocated, so restoration has nothing to undo; the
    // session still gets torn down.
    assert_eq!(log.calls(), vec![Call::Connect(DEST), Call::Disconnect]);
}

#[tokio::test]
async fn target_leaving_voice_during_playback_skips_the_restore() {
    let log = Arc::new(CallLog::default());
    let store = store_with(vec![scene("cave", 20)]).await;
    let control = MockVoiceControl {
        log: log.clone(),
        current: Mutex::new(Some(Id::new(ORIGIN))),
        leave_after_move: true,
        fail_moves: false,
    };
    let service = BanishService::new(
        store,
        Arc::new(MockGateway {
            log: log.clone(),
            fail_play: false,
        }),
        Arc::new(control),
    );

    service
        .banish(request("cave"), &MockAnnouncer { log: log.clone() })
        .await
        .unwrap();

    // One move in, no move back, no error.
    assert_eq!(
        log.calls(),
        vec![
            Call::Connect(DEST),
            Call::Move(DEST),
            Call::Play,
            Call::Announce,
            Call::Disconnect,
        ]
    );
}
