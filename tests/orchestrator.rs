mod common;

use std::time::Duration;

use serde_json::json;
use tokio_test::assert_err;

use common::{fast_policy, temp_path, ScriptedPage};
use company_scrape::infrastructure::session::load_state;
use company_scrape::infrastructure::{BrowserSession, StorageState};
use company_scrape::models::BasicCompanyInfo;
use company_scrape::orchestrator::{run_site_rows, select_rows, RowStats};
use company_scrape::sites::wirescreen::{LAYOUT, LOGIN_FORM};
use company_scrape::sites::{site, SiteAdapter};
use company_scrape::storage::RecordStore;
use company_scrape::Config;

const LOGIN_URL: &str = "https://platform.wirescreen.ai/signin";

fn wirescreen() -> &'static dyn SiteAdapter {
    site("wirescreen").expect("wirescreen 应已注册")
}

fn company(index: usize) -> BasicCompanyInfo {
    BasicCompanyInfo {
        original_chinese_name: format!("公司{}", index),
        translated_name: format!("Company {:03}", index),
        location_eng: "Beijing".to_string(),
    }
}

fn signed_in_page() -> ScriptedPage {
    ScriptedPage::new()
        .with_present(LOGIN_FORM.signed_in_marker)
        .with_present(LAYOUT.no_results)
        .with_state(StorageState {
            cookies: vec![json!({"name": "sid", "value": "abc", "domain": ".wirescreen.ai"})],
            origins: Vec::new(),
        })
}

fn test_config() -> Config {
    let mut timeouts = fast_policy();
    timeouts.row_delay = Duration::ZERO;
    Config {
        timeouts,
        ..Config::default()
    }
}

fn memory_store() -> RecordStore {
    let store = RecordStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    store
}

#[test]
fn test_select_rows_caps_in_file_order() {
    let rows: Vec<_> = (1..=201).map(company).collect();

    let selected = select_rows(&rows, 200);
    assert_eq!(selected.len(), 200);
    assert_eq!(selected[0].translated_name, "Company 001");
    assert_eq!(selected[199].translated_name, "Company 200");

    assert_eq!(select_rows(&rows[..3], 200).len(), 3);
}

#[tokio::test]
async fn test_site_rows_login_then_rows_in_order() {
    let rows: Vec<_> = (1..=201).map(company).collect();
    let config = test_config();
    let store = memory_store();
    let session_file = temp_path("orchestrator", "session.json");
    let session = BrowserSession::open(signed_in_page(), &session_file).await.unwrap();

    let mut stats = RowStats::default();
    run_site_rows(
        &session,
        wirescreen(),
        select_rows(&rows, config.max_rows),
        &store,
        &config,
        &mut stats,
    )
    .await
    .unwrap();

    let persisted = load_state(&session_file).await.unwrap();
    tokio::fs::remove_file(&session_file).await.ok();

    assert_eq!(stats.inserted, 200);
    assert_eq!(stats.no_data, 200);

    let records = store.all_records().unwrap();
    assert_eq!(records.len(), 200);
    let names: Vec<_> = records.iter().map(|r| r.translated_name.clone()).collect();
    let expected: Vec<_> = (1..=200).map(|i| format!("Company {:03}", i)).collect();
    assert_eq!(names, expected);

    let visited = session.page().visited();
    assert_eq!(visited.len(), 201);
    assert_eq!(visited[0], LOGIN_URL);
    assert_eq!(
        visited[1],
        "https://platform.wirescreen.ai/search?q=%22Company%20001%22"
    );
    assert_eq!(
        visited[200],
        "https://platform.wirescreen.ai/search?q=%22Company%20200%22"
    );

    let persisted = persisted.expect("登录后应写入会话文件");
    assert_eq!(persisted.cookies.len(), 1);
}

#[tokio::test]
async fn test_session_save_failure_stops_before_first_row() {
    let dir = temp_path("orchestrator", "session_dir");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let store = memory_store();
    let session = BrowserSession::open(signed_in_page(), &dir).await.unwrap();

    let mut stats = RowStats::default();
    let result = run_site_rows(
        &session,
        wirescreen(),
        &[company(1)],
        &store,
        &test_config(),
        &mut stats,
    )
    .await;
    tokio::fs::remove_dir_all(&dir).await.ok();

    assert_err!(result);
    assert_eq!(session.page().visited(), vec![LOGIN_URL.to_string()]);
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(stats, RowStats::default());
}

#[tokio::test]
async fn test_no_delay_after_last_row() {
    let mut config = test_config();
    config.timeouts.row_delay = Duration::from_secs(3600);
    let store = memory_store();
    let session_file = temp_path("orchestrator", "single.json");
    let session = BrowserSession::open(signed_in_page(), &session_file).await.unwrap();

    let mut stats = RowStats::default();
    let finished = tokio::time::timeout(
        Duration::from_secs(10),
        run_site_rows(&session, wirescreen(), &[company(1)], &store, &config, &mut stats),
    )
    .await;
    tokio::fs::remove_file(&session_file).await.ok();

    assert!(finished.is_ok(), "单行处理后不应再等待行间隔");
    assert_eq!(store.count().unwrap(), 1);
}
