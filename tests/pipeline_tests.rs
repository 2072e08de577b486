use collection_binder::pipeline::collect;
use collection_binder::{run, Config, Error, ExportView, ReferenceSource, RunReport, ValueTier};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Test fixtures - a mock collection-board API

fn record(
    name: &str,
    tla: &str,
    qty: serde_json::Value,
    foil: serde_json::Value,
    price: &str,
) -> serde_json::Value {
    json!({
        "amount": {"qty": 1},
        "card": format!(
            "<a class=\"card-link\" data-name=\"{name}\" data-tla=\"{tla}\">{name}</a>"
        ),
        "market_price": format!("<span>${price}</span>"),
        "edit": {"qty": qty, "foil": foil}
    })
}

async fn mount_inventory(
    server: &MockServer,
    pages: Vec<Vec<serde_json::Value>>,
    page_size: usize,
) {
    let count = pages.len();
    for (i, data) in pages.into_iter().enumerate() {
        Mock::given(method("GET"))
            .and(path("/inventory"))
            .and(query_param("start", (i * page_size).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/inventory"))
        .and(query_param("start", (count * page_size).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(server)
        .await;
}

fn reference_file() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    let reference = json!({
        "Lightning Bolt": {
            "mana_cost": "{R}", "cmc": 1, "type": "Instant",
            "is_land": false, "avg_price": 1.50, "foil_price": 6.00
        },
        "Counterspell": {
            "mana_cost": "{U}{U}", "cmc": 2, "type": "Instant",
            "is_land": false, "avg_price": 0.80
        },
        "Steam Vents": {
            "mana_cost": "", "cmc": 0, "type": "Land — Island Mountain",
            "is_land": true, "avg_price": 12.00
        },
        "Island": {
            "mana_cost": "", "cmc": 0, "type": "Basic Land — Island",
            "is_land": true, "avg_price": 0.05
        }
    });
    write!(tmp, "{reference}").unwrap();
    tmp
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

async fn run_blocking(config: Config) -> collection_binder::Result<RunReport> {
    tokio::task::spawn_blocking(move || run(&config))
        .await
        .unwrap()
}

// End-to-end tests

#[tokio::test]
async fn single_island_exports_one_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "amount": {"qty": 2},
                "card": "<a data-name='Island'>Island</a>",
                "market_price": "0.10",
                "edit": {"qty": 2, "foil": null}
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("start", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(server.uri())
        .with_output(&output);

    let report = run_blocking(config).await.unwrap();

    assert_eq!(report.records_fetched, 1);
    assert_eq!(report.rows_exported, 1);
    assert_eq!(read(&output), "Name,Edition,Qty,Foil\nIsland,,2,No\n");
    // 0.10 is below the bulk threshold
    assert!(report.binder.is_empty());
}

#[tokio::test]
async fn full_run_with_reference_and_binder() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        vec![
            vec![
                record("Island", "M19", json!(20), json!(null), "0.05"),
                record("Lightning Bolt", "M10", json!(4), json!(null), "1.40"),
            ],
            vec![
                record("Lightning Bolt", "M10", json!(1), json!(true), "5.00"),
                record("Counterspell", "TMP", json!(null), json!(null), "0.90"),
            ],
            vec![
                record("Steam Vents", "GRN", json!(1), json!(null), "11.00"),
                record("Fire/Ice", "APC", json!(2), json!(null), "0.45"),
            ],
        ],
        2,
    )
    .await;

    let reference = reference_file();
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let binder_output = dir.path().join("binder.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(format!("{}/inventory", server.uri()))
        .with_page_size(2)
        .with_reference(ReferenceSource::File(reference.path().to_path_buf()))
        .with_output(&output)
        .with_binder_output(&binder_output);

    let report = run_blocking(config).await.unwrap();

    assert_eq!(report.records_fetched, 6);
    // Counterspell is a deck-only placement
    assert_eq!(report.rows_exported, 5);
    // Fire//Ice has no reference entry
    assert_eq!(report.join_misses, 1);
    assert!(report.skipped.is_empty());

    let csv = read(&output);
    assert!(csv.contains("Lightning Bolt,M10,1,Yes\n"));
    assert!(csv.contains("Fire//Ice,APC,2,No\n"));
    assert!(!csv.contains("Counterspell"));

    let binder: Vec<(&str, bool, ValueTier)> = report
        .binder
        .iter()
        .map(|e| (e.name.as_str(), e.foil, e.value_tier))
        .collect();
    assert_eq!(
        binder,
        vec![
            ("Lightning Bolt", false, ValueTier::Large),
            ("Lightning Bolt", true, ValueTier::Large),
            ("Steam Vents", false, ValueTier::Large),
            ("Fire//Ice", false, ValueTier::Medium),
        ]
    );

    let binder_csv = read(&binder_output);
    assert!(binder_csv.starts_with("Name,Edition,Qty,Foil,Price,Tier,Cost,Type,CMC,P/T\n"));
    assert!(binder_csv.contains("Lightning Bolt,M10,1,Yes,6.00,large,Red,Instant,1.0,\n"));
}

#[tokio::test]
async fn raw_view_keeps_deck_only_rows() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        vec![vec![
            record("Opt", "XLN", json!(3), json!(null), "0.10"),
            record("Counterspell", "TMP", json!(null), json!(null), "0.90"),
        ]],
        10,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(format!("{}/inventory", server.uri()))
        .with_page_size(10)
        .with_output(&output)
        .with_view(ExportView::Raw);

    let report = run_blocking(config).await.unwrap();

    assert_eq!(report.rows_exported, 2);
    assert_eq!(
        read(&output),
        "Name,Edition,Qty,Foil\nOpt,XLN,3,No\nCounterspell,TMP,,No\n"
    );
}

#[tokio::test]
async fn malformed_records_are_skipped_and_reported() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        vec![vec![
            record("Opt", "XLN", json!(1), json!(null), "0.10"),
            json!({"card": "Opt (no link)", "edit": {"qty": 1}}),
        ]],
        10,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(format!("{}/inventory", server.uri()))
        .with_page_size(10)
        .with_output(&output);

    let report = run_blocking(config).await.unwrap();

    assert_eq!(report.records_fetched, 2);
    assert_eq!(report.rows_exported, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert!(matches!(report.skipped[0].error, Error::MalformedRecord(_)));
}

#[tokio::test]
async fn transport_failure_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"card": "<a data-name='Opt'>Opt</a>", "edit": {"qty": 1}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(server.uri())
        .with_page_size(1)
        .with_output(&output);

    let err = run_blocking(config).await.unwrap_err();

    assert!(err.is_transport());
    assert!(!output.exists());
}

#[tokio::test]
async fn reference_fetch_failure_aborts_run() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        vec![vec![record("Opt", "XLN", json!(1), json!(null), "0.10")]],
        10,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/reference.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(format!("{}/inventory", server.uri()))
        .with_page_size(10)
        .with_reference(ReferenceSource::Url(format!("{}/reference.json", server.uri())))
        .with_output(&output);

    let err = run_blocking(config).await.unwrap_err();

    match err {
        Error::Transport { status, .. } => assert_eq!(status.as_u16(), 200),
        other => panic!("Expected Error::Transport, got: {other:?}"),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn invalid_config_is_rejected_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config::new("ndlambo")
        .with_inventory_url(server.uri())
        .with_thresholds(5.0, 1.0);

    let result = tokio::task::spawn_blocking(move || collect(&config))
        .await
        .unwrap();

    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn failed_binder_write_leaves_no_export() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        vec![vec![record("Opt", "XLN", json!(1), json!(null), "0.10")]],
        10,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("inventory.csv");
    let binder_output = dir.path().join("missing_dir").join("binder.csv");
    let config = Config::new("ndlambo")
        .with_inventory_url(format!("{}/inventory", server.uri()))
        .with_page_size(10)
        .with_output(&output)
        .with_binder_output(&binder_output);

    let err = run_blocking(config).await.unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(!output.exists());
    assert!(!binder_output.exists());
    // no staging files left behind
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
