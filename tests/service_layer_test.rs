use anyhow::Result;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use item_master_updater::core::ConnectionParams;
use item_master_updater::domain::model::ServerKind;
use item_master_updater::{
    BatchUpdater, LoadOptions, ServiceLayerCompany, TomlConfig, UpdateEngine, UpdaterError,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn params(server: String) -> ConnectionParams {
    ConnectionParams {
        server,
        server_kind: ServerKind::Mssql2016,
        db_user: "sa".to_string(),
        db_password: "db-secret".to_string(),
        company_db: "SBODEMOUS".to_string(),
        api_user: "manager".to_string(),
        api_password: "api-secret".to_string(),
    }
}

fn engine(server: &MockServer, csv: &NamedTempFile) -> Result<UpdateEngine<ServiceLayerCompany>> {
    Ok(UpdateEngine::new(
        ServiceLayerCompany::new(false)?,
        params(server.url("/b1s/v1")),
        csv.path(),
        LoadOptions::default(),
        BatchUpdater::new(TomlConfig::default().update.strategy()),
    ))
}

#[tokio::test]
async fn test_batch_against_service_layer() -> Result<()> {
    let server = MockServer::start();

    let login = server.mock(|when, then| {
        when.method(POST).path("/b1s/v1/Login");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"SessionId": "sess-1", "Version": "1000190", "SessionTimeout": 30}));
    });
    let get_a100 = server.mock(|when, then| {
        when.method(GET)
            .path("/b1s/v1/Items('A100')")
            .header("Cookie", "B1SESSION=sess-1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"ItemCode": "A100"}));
    });
    let patch_a100 = server.mock(|when, then| {
        when.method(PATCH)
            .path("/b1s/v1/Items('A100')")
            .json_body(serde_json::json!({
                "SalesUnitLength1": 10.0,
                "SalesUnitWidth1": 5.0,
                "SalesUnitHeight1": 2.0,
                "SalesUnitWeight1": 1.0
            }));
        then.status(204);
    });
    let get_b200 = server.mock(|when, then| {
        when.method(GET).path("/b1s/v1/Items('B200')");
        then.status(404)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "error": {"code": -2028, "message": {"lang": "en-us", "value": "No matching records found (ODBC -2028)"}}
            }));
    });
    let patch_b200 = server.mock(|when, then| {
        when.method(PATCH).path("/b1s/v1/Items('B200')");
        then.status(204);
    });
    let logout = server.mock(|when, then| {
        when.method(POST)
            .path("/b1s/v1/Logout")
            .header("Cookie", "B1SESSION=sess-1");
        then.status(204);
    });

    let mut csv = NamedTempFile::new()?;
    csv.write_all(b"A100,10,5,2,1\nB200,,,,\n")?;
    let mut engine = engine(&server, &csv)?;
    let mut out = Vec::new();

    let report = engine.run(&mut out).await?;

    login.assert();
    get_a100.assert();
    patch_a100.assert();
    get_b200.assert();
    patch_b200.assert_hits(0);
    logout.assert();

    assert_eq!(report.updated(), 1);
    assert_eq!(report.not_found(), 1);
    let text = String::from_utf8(out)?;
    assert!(text.contains("[1 or 2] OK for [A100]"));
    assert!(text.contains("[2 or 2] could not load [B200]"));
    Ok(())
}

#[tokio::test]
async fn test_rejected_login_stops_before_reading_items() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/b1s/v1/Login");
        then.status(401)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "error": {"code": 100000027, "message": {"lang": "en-us", "value": "Login failed"}}
            }));
    });
    let any_item = server.mock(|when, then| {
        when.method(GET).path_contains("/Items");
        then.status(200);
    });
    let logout = server.mock(|when, then| {
        when.method(POST).path("/b1s/v1/Logout");
        then.status(204);
    });

    let mut csv = NamedTempFile::new()?;
    csv.write_all(b"A100,10,5,2,1\n")?;
    let mut engine = engine(&server, &csv)?;
    let mut out = Vec::new();

    let result = engine.run(&mut out).await;

    match result {
        Err(UpdaterError::ConnectionFailed { reason, .. }) => assert_eq!(reason, "Login failed"),
        other => panic!("expected connection failure, got {:?}", other),
    }
    any_item.assert_hits(0);
    logout.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_commit_error_text_reaches_status_line() -> Result<()> {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/b1s/v1/Login");
        then.status(200).json_body(serde_json::json!({"SessionId": "sess-2"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/b1s/v1/Items('C300')");
        then.status(200).json_body(serde_json::json!({"ItemCode": "C300"}));
    });
    server.mock(|when, then| {
        when.method(PATCH).path("/b1s/v1/Items('C300')");
        then.status(400).json_body(serde_json::json!({
            "error": {"code": -1116, "message": {"lang": "en-us", "value": "Internal error (-1116) occurred"}}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/b1s/v1/Logout");
        then.status(204);
    });

    let mut csv = NamedTempFile::new()?;
    csv.write_all(b"C300,7\n")?;
    let mut engine = engine(&server, &csv)?;
    let mut out = Vec::new();

    let report = engine.run(&mut out).await?;

    assert_eq!(report.failed(), 1);
    assert!(String::from_utf8(out)?
        .contains("[1 or 1] remote error: Internal error (-1116) occurred"));
    Ok(())
}
