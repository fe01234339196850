use std::io::Read;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use client::{Client, ClientConfig, ClientEvent, LoginError};
use crossbeam_channel::Receiver;
use library::{DatabaseId, LibraryEvent, Revision, Track, TrackId};
use server::{Server, ServerConfig};
use transport::{AuthMethod, Credential};

fn config() -> ServerConfig {
    ServerConfig {
        bind_address: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        ..ServerConfig::named("Shared Music")
    }
}

fn client_config() -> ClientConfig {
    ClientConfig::default()
        .with_update_backoff(Duration::from_millis(100))
        .with_connect_timeout(Duration::from_secs(5))
}

fn start(config: ServerConfig) -> (Server, SocketAddr, DatabaseId) {
    let mut server = Server::new(config).unwrap();
    let db = {
        let mut library = server.library();
        let db = library.add_database("Music");
        let music = library.database_mut(db).unwrap();
        let mut one = Track::new("One");
        one.artist = "Band".into();
        one.format = "mp3".into();
        let one = music.add_track(one);
        let two = music.add_track(Track::new("Two"));
        let mix = music.add_playlist("Mix");
        music.playlist_add_track(mix, two).unwrap();
        music.playlist_add_track(mix, one).unwrap();
        db
    };
    let addr = server.start().unwrap();
    (server, addr, db)
}

/// Collects events until the mirror reports `revision`.
fn until_revision(events: &Receiver<ClientEvent>, revision: i32) -> Vec<ClientEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut seen = Vec::new();
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = events.recv_timeout(left).expect("timed out waiting for revision");
        let done = event == ClientEvent::Revision(Revision::new(revision));
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[test]
fn login_mirrors_the_library() {
    let (_server, addr, db) = start(config());
    let client = Client::connect(addr, client_config()).unwrap();
    assert_eq!(client.name(), "Shared Music");
    assert!(client.info().supports_update);
    assert!(!client.is_logged_in());

    client.login().unwrap();
    assert!(client.is_logged_in());
    assert!(client.is_updating());
    assert_eq!(client.revision(), Revision::new(1));

    let databases = client.databases();
    assert_eq!(databases.len(), 1);
    let music = &databases[0];
    assert_eq!(music.id(), db);
    assert_eq!(music.name(), "Music");
    let titles: Vec<&str> = music.tracks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["One", "Two"]);
    assert_eq!(music.tracks()[0].artist, "Band");

    assert_eq!(music.playlist_count(), 1);
    let mix = &music.playlists()[0];
    assert_eq!(mix.name(), "Mix");
    assert_eq!(
        mix.track_ids().collect::<Vec<_>>(),
        [TrackId::new(2), TrackId::new(1)]
    );
    assert_eq!(music.base_playlist().len(), 2);
}

#[test]
fn commits_reach_subscribers_in_order() {
    let (server, addr, db) = start(config());
    let client = Client::connect(addr, client_config()).unwrap();
    client.login().unwrap();
    let events = client.subscribe();

    let three = server
        .library()
        .database_mut(db)
        .unwrap()
        .add_track(Track::new("Three"));
    assert_eq!(server.commit().unwrap(), Revision::new(2));

    let seen = until_revision(&events, 2);
    assert_eq!(
        seen,
        [
            ClientEvent::Library {
                database: db,
                event: LibraryEvent::TrackAdded(three),
            },
            ClientEvent::Revision(Revision::new(2)),
        ]
    );

    server.library().database_mut(db).unwrap().remove_track(TrackId::new(1));
    server.commit().unwrap();
    let seen = until_revision(&events, 3);
    assert!(seen.contains(&ClientEvent::Library {
        database: db,
        event: LibraryEvent::TrackRemoved(TrackId::new(1)),
    }));

    let mirror = client.database(db).unwrap();
    let titles: Vec<&str> = mirror.tracks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Two", "Three"]);
    let mix = &mirror.playlists()[0];
    assert_eq!(mix.track_ids().collect::<Vec<_>>(), [TrackId::new(2)]);
    assert_eq!(client.revision(), Revision::new(3));
}

#[test]
fn playlist_changes_are_mirrored() {
    let (server, addr, db) = start(config());
    let client = Client::connect(addr, client_config()).unwrap();
    client.login().unwrap();
    let events = client.subscribe();

    {
        let mut library = server.library();
        let music = library.database_mut(db).unwrap();
        let mix = music.playlists()[0].id();
        music.playlist_remove_at(mix, 0).unwrap();
        music.playlist_add_track(mix, TrackId::new(2)).unwrap();
        music.rename_playlist(mix, "Remix");
        let fresh = music.add_playlist("Fresh");
        music.playlist_add_track(fresh, TrackId::new(1)).unwrap();
    }
    server.commit().unwrap();
    until_revision(&events, 2);

    let mirror = client.database(db).unwrap();
    let playlists = mirror.playlists();
    assert_eq!(playlists.len(), 2);
    assert_eq!(playlists[0].name(), "Remix");
    assert_eq!(
        playlists[0].track_ids().collect::<Vec<_>>(),
        [TrackId::new(1), TrackId::new(2)]
    );
    assert_eq!(playlists[1].name(), "Fresh");
    assert_eq!(playlists[1].track_ids().collect::<Vec<_>>(), [TrackId::new(1)]);
}

#[test]
fn authentication_failures_are_distinguished() {
    let (_server, addr, _) = start(ServerConfig {
        auth_method: AuthMethod::UserAndPassword,
        credentials: vec![Credential::user("alice", "secret")],
        ..config()
    });
    let client = Client::connect(addr, client_config()).unwrap();
    assert!(client.info().login_required);

    let err = client.login_with_user("alice", "wrong").unwrap_err();
    assert!(matches!(err, LoginError::Authentication), "{err:?}");
    assert!(!client.is_logged_in());

    client.login_with_user("alice", "secret").unwrap();
    assert!(client.is_logged_in());
}

#[test]
fn too_many_users_is_a_login_failure() {
    let (_server, addr, _) = start(ServerConfig {
        max_users: 1,
        ..config()
    });
    let first = Client::connect(addr, client_config()).unwrap();
    first.login().unwrap();

    let second = Client::connect(addr, client_config()).unwrap();
    let err = second.login().unwrap_err();
    let LoginError::Failed(source) = &err else {
        panic!("expected a failed login, got {err:?}");
    };
    assert_eq!(source.status(), Some(503));
}

#[test]
fn logout_stops_polling_promptly() {
    let (server, addr, _) = start(config());
    let client = Client::connect(addr, client_config()).unwrap();
    client.login().unwrap();
    assert_eq!(server.sessions().len(), 1);

    let started = Instant::now();
    client.logout();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!client.is_logged_in());
    assert!(!client.is_updating());
    assert!(client.databases().is_empty());
    assert!(server.sessions().is_empty());
}

#[test]
fn downloads_and_resumes_tracks() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("one.mp3");
    let audio: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::write(&source, &audio).unwrap();

    let (server, addr, db) = start(config());
    server
        .library()
        .database_mut(db)
        .unwrap()
        .update_track(TrackId::new(1), |track| track.file = Some(source.clone()));
    server.commit().unwrap();

    let client = Client::connect(addr, client_config()).unwrap();
    client.login().unwrap();

    let target = dir.path().join("copy.mp3");
    let written = client.download_track(db, TrackId::new(1), &target).unwrap();
    assert_eq!(written, 20_000);
    assert_eq!(std::fs::read(&target).unwrap(), audio);

    let mut stream = client
        .stream_track(db, TrackId::new(1), Some(15_000))
        .unwrap();
    assert_eq!(stream.len(), 5_000);
    let mut tail = Vec::new();
    stream.read_to_end(&mut tail).unwrap();
    assert_eq!(tail, &audio[15_000..]);

    let err = client
        .stream_track(db, TrackId::new(2), None)
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(client.stream_track(db, TrackId::new(99), None).is_err());
}

#[test]
fn mirror_is_kept_when_the_server_goes_away() {
    let (mut server, addr, db) = start(config());
    let client = Client::connect(addr, client_config()).unwrap();
    client.login().unwrap();

    server.stop();
    std::thread::sleep(Duration::from_millis(300));
    assert!(client.is_logged_in());
    assert_eq!(client.database(db).unwrap().track_count(), 2);
}
