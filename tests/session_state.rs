mod common;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use common::{temp_path, ScriptedPage};
use company_scrape::infrastructure::session::load_state;
use company_scrape::infrastructure::{BrowserSession, OriginStorage, StorageEntry, StorageState};

fn saved_state() -> StorageState {
    StorageState {
        cookies: vec![json!({
            "name": "sid",
            "value": "abc",
            "domain": ".wirescreen.ai",
            "path": "/",
            "expires": -1
        })],
        origins: vec![OriginStorage {
            origin: "https://platform.wirescreen.ai".to_string(),
            local_storage: vec![StorageEntry {
                name: "token".to_string(),
                value: "t-1".to_string(),
            }],
        }],
    }
}

#[tokio::test]
async fn test_open_restores_saved_state() {
    let path = temp_path("session", "restore.json");
    tokio::fs::write(&path, serde_json::to_string(&saved_state()).unwrap())
        .await
        .unwrap();

    let session = BrowserSession::open(ScriptedPage::new(), &path).await.unwrap();
    let restored = session.page().state.lock().unwrap().clone();
    tokio::fs::remove_file(&path).await.ok();

    assert_eq!(restored, saved_state());
}

#[tokio::test]
async fn test_missing_file_starts_fresh() {
    let path = temp_path("session", "missing.json");

    let session = BrowserSession::open(ScriptedPage::new(), &path).await.unwrap();

    assert_eq!(*session.page().state.lock().unwrap(), StorageState::default());
    assert_eq!(session.state_path(), path.as_path());
}

#[tokio::test]
async fn test_corrupt_file_is_ignored() {
    let path = temp_path("session", "corrupt.json");
    tokio::fs::write(&path, "{\"cookies\": [").await.unwrap();

    let session = BrowserSession::open(ScriptedPage::new(), &path).await;
    tokio::fs::remove_file(&path).await.ok();

    let session = assert_ok!(session);
    assert_eq!(*session.page().state.lock().unwrap(), StorageState::default());
}

#[tokio::test]
async fn test_close_persists_current_state() {
    let path = temp_path("session", "persist.json");
    let page = ScriptedPage::new().with_state(saved_state());

    let session = BrowserSession::open(page, &path).await.unwrap();
    assert_ok!(session.close().await);

    let written = load_state(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    assert_eq!(written, Some(saved_state()));
}

#[tokio::test]
async fn test_persist_to_directory_path_fails() {
    let dir = temp_path("session", "as_dir");
    tokio::fs::create_dir_all(&dir).await.unwrap();

    let session = BrowserSession::open(ScriptedPage::new(), &dir).await.unwrap();
    let persisted = session.persist().await;
    tokio::fs::remove_dir_all(&dir).await.ok();

    assert_err!(persisted);
}
