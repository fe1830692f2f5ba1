//! End-to-end: build a bundle, bootstrap a working copy, apply a remote
//! changeset, and reopen the store in a fresh process state.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use recnik_core::storage::snapshot::{build_snapshot, parse_changes};
use recnik_core::{
    Bootstrapper, Config, EntryRepository, Loaded, Script, StoreLocation, SyncClient, SyncState,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const BUNDLE: &str = r#"[
    { "action": "add", "cyrillic_word": "кућа", "cyrillic_part": "именица",
      "latin_word": "kuća", "latin_part": "imenica",
      "english_word": "house", "english_part": "noun", "english_def": "a building" },
    { "action": "add", "cyrillic_word": "књига", "latin_word": "knjiga", "english_word": "book" },
    { "action": "add", "cyrillic_word": "вода", "latin_word": "voda", "english_word": "water" }
]"#;

/// Serve the same canned changeset to every request until dropped
async fn serve(body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/changes.json", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    url
}

struct Fixture {
    _temp_dir: TempDir,
    config: Config,
}

impl Fixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let bundle = temp_dir.path().join("app").join("dictionary.db");
        build_snapshot(&parse_changes(BUNDLE).unwrap(), &bundle).unwrap();
        // Installed bundles are read-only
        let mut permissions = fs::metadata(&bundle).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&bundle, permissions).unwrap();

        let config = Config {
            data_dir: Some(temp_dir.path().join("shared")),
            bundle_path: Some(bundle),
            sync_url: None,
            sync_enabled: false,
            sync_timeout_secs: 5,
        };

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    fn store_path(&self) -> PathBuf {
        self.config.store_path().unwrap()
    }
}

fn english_words(repo: &EntryRepository) -> Vec<String> {
    repo.load_all()
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.english.word)
        .collect()
}

#[test]
fn first_launch_seeds_shared_copy_once() {
    let fixture = Fixture::new();
    assert!(!fixture.store_path().exists());

    let bootstrapper = Bootstrapper::from_config(&fixture.config);
    let repo = bootstrapper.repository();

    assert!(repo.is_ready());
    assert_eq!(repo.location(), &StoreLocation::Seeded(fixture.store_path()));
    assert!(fixture.store_path().exists());
    assert_eq!(english_words(&repo), vec!["house", "book", "water"]);

    let before = fs::metadata(fixture.store_path()).unwrap().modified().unwrap();
    let again = bootstrapper.repository();
    assert_eq!(again.location(), repo.location());
    assert_eq!(
        fs::metadata(fixture.store_path()).unwrap().modified().unwrap(),
        before
    );
}

#[test]
fn nothing_available_reads_are_empty() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: None,
        bundle_path: Some(temp_dir.path().join("nowhere.db")),
        sync_url: None,
        sync_enabled: false,
        sync_timeout_secs: 5,
    };

    let repo = EntryRepository::open(&config);

    assert!(!repo.is_ready());
    assert!(!repo.diagnostic().unwrap_or_default().is_empty());
    assert_eq!(repo.load_all(), Loaded::NotReady);
    assert!(repo.load_all().unwrap_or_default().is_empty());
    assert!(repo
        .load_by_prefix(Script::Cyrillic, "к")
        .unwrap_or_default()
        .is_empty());
    assert!(repo.load_by_id(1).unwrap_or_default().is_none());
}

#[tokio::test]
async fn newer_changeset_is_applied_once_and_survives_restart() {
    let fixture = Fixture::new();
    let repo = Bootstrapper::from_config(&fixture.config).repository();
    let book = repo
        .load_by_prefix(Script::English, "book")
        .unwrap_or_default()[0]
        .id;
    let water = repo
        .load_by_prefix(Script::English, "water")
        .unwrap_or_default()[0]
        .id;

    let body = format!(
        r#"{{ "version": 2, "entries": [
            {{ "action": "update", "id": {book}, "english_def": "bound pages" }},
            {{ "action": "delete", "id": {water} }},
            {{ "action": "add", "cyrillic_word": "ватра", "latin_word": "vatra", "english_word": "fire" }}
        ] }}"#
    );
    let url = serve(body).await;
    let client = SyncClient::new(&url, Duration::from_secs(5)).unwrap();

    let mut state = SyncState::with_path(fixture.config.sync_state_path()).unwrap();
    assert_eq!(client.check_for_updates(&repo, &mut state).await, 3);
    assert_eq!(state.version(), 2);
    assert_eq!(english_words(&repo), vec!["house", "book", "fire"]);

    // Same version again changes nothing
    assert_eq!(client.check_for_updates(&repo, &mut state).await, 0);
    assert_eq!(english_words(&repo), vec!["house", "book", "fire"]);
    drop(repo);

    // A new process finds the updated working copy and the recorded version
    let repo = Bootstrapper::from_config(&fixture.config).repository();
    assert_eq!(repo.location(), &StoreLocation::Existing(fixture.store_path()));
    assert_eq!(
        repo.load_by_id(book).ready().unwrap().unwrap().english.definition,
        "bound pages"
    );
    assert_eq!(repo.load_by_id(water), Loaded::Ready(None));
    let fire = repo
        .load_by_prefix(Script::English, "fire")
        .unwrap_or_default()[0]
        .id;
    assert!(fire > water);

    let mut state = SyncState::with_path(fixture.config.sync_state_path()).unwrap();
    assert_eq!(state.version(), 2);
    assert_eq!(client.check_for_updates(&repo, &mut state).await, 0);
}

#[test]
fn sync_state_survives_store_recopy() {
    let fixture = Fixture::new();
    {
        let repo = Bootstrapper::from_config(&fixture.config).repository();
        assert!(repo.is_ready());
        let mut state = SyncState::with_path(fixture.config.sync_state_path()).unwrap();
        state.set_version(5).unwrap();
    }

    fs::remove_file(fixture.store_path()).unwrap();
    let repo = Bootstrapper::from_config(&fixture.config).repository();
    assert_eq!(repo.location(), &StoreLocation::Seeded(fixture.store_path()));

    let state = SyncState::with_path(fixture.config.sync_state_path()).unwrap();
    assert_eq!(state.version(), 5);
}
