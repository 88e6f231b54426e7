mod common;

use chrono::NaiveDate;
use serde_json::json;

use common::{detail_hit, fast_policy, json_response, temp_path, ScriptedPage};
use company_scrape::models::{BasicCompanyInfo, CompanyFinancialsAndRelations};
use company_scrape::orchestrator::{process_row, run_export};
use company_scrape::sites::wirescreen::LAYOUT;
use company_scrape::sites::{site, SiteAdapter};
use company_scrape::storage::{RecordStore, UpsertOutcome};
use company_scrape::tabular::{export_records, load_input};
use company_scrape::workflow::{ExtractionOutcome, RowCtx};
use company_scrape::Config;

fn wirescreen() -> &'static dyn SiteAdapter {
    site("wirescreen").expect("wirescreen 应已注册")
}

fn acme() -> BasicCompanyInfo {
    BasicCompanyInfo {
        original_chinese_name: "阿克米有限公司".to_string(),
        translated_name: "Acme Co".to_string(),
        location_eng: "Shanghai".to_string(),
    }
}

fn test_config() -> Config {
    Config {
        timeouts: fast_policy(),
        ..Config::default()
    }
}

fn ctx() -> RowCtx {
    RowCtx::new("wirescreen", 1, 1, "Acme Co")
}

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(String::from).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

fn cell<'a>(headers: &[String], row: &'a [String], column: &str) -> &'a str {
    let index = headers.iter().position(|h| h == column).unwrap();
    &row[index]
}

#[tokio::test]
async fn test_row_searches_quoted_name_and_stores_result() {
    let store = RecordStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    let page = ScriptedPage::new()
        .with_present(LAYOUT.results)
        .with_present(LAYOUT.detail_heading)
        .with_hits(vec![detail_hit("ACME")])
        .with_responses(vec![json_response(
            "https://api.wirescreen.ai/v2/entity/42/owns",
            json!({"data": {"owned": [{"entity": {"name_en": "Sub"}, "fraction": 0.5}]}}),
        )]);

    let result = process_row(&page, wirescreen(), &acme(), &ctx(), &store, &test_config())
        .await
        .unwrap();

    assert_eq!(result.outcome, ExtractionOutcome::Completed);
    assert_eq!(result.upsert, UpsertOutcome::Inserted);
    assert_eq!(
        page.visited()[0],
        "https://platform.wirescreen.ai/search?q=%22Acme%20Co%22"
    );

    let stored = store.find_by_key("Acme Co").unwrap().unwrap();
    assert_eq!(stored.original_chinese_name, "阿克米有限公司");
    let decoded = stored.decode_result();
    assert_eq!(decoded.investments.len(), 1);
    assert_eq!(decoded.investments[0].name, "Sub");
}

#[tokio::test]
async fn test_rescrape_with_no_results_overwrites_previous_data() {
    let store = RecordStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    let previous = CompanyFinancialsAndRelations {
        display_name: "ACME CO LTD".to_string(),
        flags: vec!["Sanctioned".to_string()],
        ..Default::default()
    };
    store.upsert(&acme(), &previous).unwrap();

    let page = ScriptedPage::new().with_present(LAYOUT.no_results);
    let result = process_row(&page, wirescreen(), &acme(), &ctx(), &store, &test_config())
        .await
        .unwrap();

    assert_eq!(result.outcome, ExtractionOutcome::NoResults);
    assert_eq!(result.upsert, UpsertOutcome::Updated);
    assert_eq!(store.count().unwrap(), 1);
    let stored = store.find_by_key("Acme Co").unwrap().unwrap();
    assert_eq!(stored.display_name, "");
    assert_eq!(stored.flags, "");
    assert_eq!(stored.location_eng, "Shanghai");
}

#[tokio::test]
async fn test_search_navigation_failure_stores_empty_record() {
    let store = RecordStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    let page = ScriptedPage::new().failing_goto("https://platform.wirescreen.ai/search");

    let result = process_row(&page, wirescreen(), &acme(), &ctx(), &store, &test_config())
        .await
        .unwrap();

    assert_eq!(result.outcome, ExtractionOutcome::Failed);
    assert_eq!(result.upsert, UpsertOutcome::Inserted);
    assert!(store.find_by_key("Acme Co").unwrap().unwrap().decode_result().is_empty());
}

#[test]
fn test_flags_and_history_flatten_on_export() {
    let store = RecordStore::open_in_memory().unwrap();
    store.ensure_schema().unwrap();
    let result = CompanyFinancialsAndRelations {
        display_name: "ACME CO LTD".to_string(),
        flags: vec!["A".to_string(), "B".to_string()],
        historical_shareholders: vec![serde_json::from_value(
            json!({"name": "X", "2020": 0.1, "2021": 0.2}),
        )
        .unwrap()],
        ..Default::default()
    };
    store.upsert(&acme(), &result).unwrap();

    let path = temp_path("pipeline", "flatten.csv");
    export_records(&path, &store.all_records().unwrap()).unwrap();
    let (headers, rows) = read_csv(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(rows.len(), 1);
    assert_eq!(cell(&headers, &rows[0], "flags"), "A; B");
    assert_eq!(
        cell(&headers, &rows[0], "historical_shareholders"),
        "\"X\" (2020: 0.1, 2021: 0.2)"
    );
    assert_eq!(cell(&headers, &rows[0], "investments"), "");
    assert_eq!(cell(&headers, &rows[0], "translated_name"), "Acme Co");
}

#[test]
fn test_input_rows_flow_through_to_dated_export() {
    let input = temp_path("pipeline", "input.csv");
    std::fs::write(
        &input,
        "original_chinese_name,translated_name,location_eng\n\
         甲公司,Alpha Ltd,Beijing\n\
         乙公司,Beta Ltd,Shenzhen\n",
    )
    .unwrap();
    let database = temp_path("pipeline", "export.db");
    let output_dir = temp_path("pipeline", "output");

    {
        let store = RecordStore::open(&database).unwrap();
        store.ensure_schema().unwrap();
        for row in load_input(&input).unwrap() {
            store
                .upsert(&row, &CompanyFinancialsAndRelations::default())
                .unwrap();
        }
    }

    let config = Config {
        database_path: database.clone(),
        output_dir: output_dir.clone(),
        ..Config::default()
    };
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let path = run_export(&config, date).unwrap();
    let (headers, rows) = read_csv(&path);

    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&database).ok();
    std::fs::remove_dir_all(&output_dir).ok();

    assert_eq!(path, output_dir.join("search_results-2024-05-01.csv"));
    assert_eq!(headers.len(), 14);
    let names: Vec<&str> = rows
        .iter()
        .map(|row| cell(&headers, row, "translated_name"))
        .collect();
    assert_eq!(names, vec!["Alpha Ltd", "Beta Ltd"]);
}
