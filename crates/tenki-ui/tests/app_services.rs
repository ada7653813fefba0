//! AppServices bootstrap against a mock JMA server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use tenki_core::{Config, RegionConfig, SelectionOutcome};
use tenki_forecast::RegionCode;
use tenki_store::ForecastStore;
use tenki_ui::{AppServices, TextPresenter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn area_json() -> serde_json::Value {
    serde_json::json!({
        "centers": {"010300": {"name": "関東甲信地方", "children": ["130000"]}},
        "offices": {"130000": {"name": "東京都"}}
    })
}

fn forecast_json() -> serde_json::Value {
    serde_json::json!([{
        "publishingOffice": "気象庁",
        "timeSeries": [
            {
                "timeDefines": [
                    "2024-11-20T11:00:00+09:00",
                    "2024-11-21T00:00:00+09:00",
                    "2024-11-22T00:00:00+09:00"
                ],
                "areas": [{
                    "area": {"name": "東京地方", "code": "130010"},
                    "weatherCodes": ["100", "300", "201"],
                    "weathers": ["晴れ", "雨", "くもり　時々　晴れ"]
                }]
            },
            {
                "timeDefines": [
                    "2024-11-20T00:00:00+09:00",
                    "2024-11-21T00:00:00+09:00",
                    "2024-11-22T00:00:00+09:00"
                ],
                "areas": [{
                    "area": {"name": "東京", "code": "44132"},
                    "tempsMax": ["18", "15", "16"],
                    "tempsMin": ["9", "10", ""]
                }]
            }
        ]
    }])
}

fn config_for(server: &MockServer, dir: &std::path::Path) -> Config {
    let mut config = Config {
        config_dir: dir.to_path_buf(),
        ..Default::default()
    };
    config.forecast.catalog_url = format!("{}/const/area.json", server.uri());
    config.forecast.forecast_base_url = format!("{}/forecast", server.uri());
    config.forecast.request_timeout_secs = 5;
    config.regions = vec![RegionConfig {
        code: "kanto".into(),
        name: "関東甲信地方".into(),
        areas: vec!["130000".into()],
    }];
    config
}

#[test]
fn test_bootstrap_and_select() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/const/area.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(area_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/forecast/130000.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json()))
            .mount(&server)
            .await;
        server
    });

    let dir = tempfile::tempdir().unwrap();
    let services = AppServices::init(&config_for(&server, dir.path())).unwrap();
    assert_eq!(services.catalog().regions().len(), 1);

    let mut coordinator = services.coordinator(TextPresenter::new(Vec::new()));
    let generation = coordinator.select(&RegionCode::new("kanto"));
    let outcome = coordinator.pump(Duration::from_secs(10)).unwrap();

    assert_eq!(
        outcome,
        SelectionOutcome::Delivered {
            generation,
            rendered: 3,
            failed: 0
        }
    );
    assert_eq!(services.store().count().unwrap(), 3);

    let rows = services.store().list().unwrap();
    assert_eq!(rows[0].entry.location, "東京都 - 東京地方");
    assert_eq!(rows[0].entry.temperature_max, Some(18.0));
    assert_eq!(rows[2].entry.condition, "くもり時々晴れ");
    assert_eq!(rows[2].entry.temperature_min, None);
    assert!(dir.path().join("weather.db").exists());

    drop(coordinator);
    services.shutdown();
}

#[test]
fn test_catalog_failure_is_fatal() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/const/area.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        server
    });

    let dir = tempfile::tempdir().unwrap();
    let err = AppServices::init(&config_for(&server, dir.path()))
        .err()
        .expect("catalog failure must stop startup");
    assert!(format!("{:#}", err).contains("catalog"));
}
