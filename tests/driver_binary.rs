use aleto::services::driver::{DriverCommand, Payload, TransportKind};
use aleto::{
    Column, ConnectionConfig, Database, DatabaseError, DriverClient, DriverOptions, TableSchema,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn driver() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aleto-driver"))
}

fn client(dir: &TempDir, transport: TransportKind) -> DriverClient {
    let options = DriverOptions::default()
        .with_driver_path(driver())
        .with_transport(transport);
    DriverClient::new(ConnectionConfig::sqlite(dir.path().join("driver.db")), options).unwrap()
}

fn users() -> TableSchema {
    TableSchema::new(
        "users",
        vec![
            Column::new("id", "INTEGER").with_primary_key(true),
            Column::new("name", "TEXT").with_nullable(true),
        ],
    )
}

async fn exercise(db: &DriverClient) {
    db.create_table(&users()).await.unwrap();
    db.add_row("users", &[("id", "1"), ("name", "Alice")])
        .await
        .unwrap();

    let mut named = BTreeMap::new();
    named.insert("name".to_string(), "Bob \"the builder\"".to_string());
    db.add_row_with("users", &["2".to_string()], &named)
        .await
        .unwrap();

    let page = db.get("users", 1).await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(
        page.data,
        vec![vec!["1", "Alice"], vec!["2", "Bob \"the builder\""]]
    );

    let hits = db.search("users", "name", "ALI", 10).await.unwrap();
    assert_eq!(hits.data, vec![vec!["1", "Alice"]]);

    assert_eq!(db.connect().await.unwrap(), vec![users()]);

    let err = db.get("ghosts", 1).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<DatabaseError>(),
        Some(&DatabaseError::Driver(Some("Table not found: ghosts".to_string())))
    );
}

#[test]
fn one_shot_driver() {
    smol::block_on(async {
        let dir = TempDir::new().unwrap();
        let db = client(&dir, TransportKind::OneShot);
        exercise(&db).await;
        db.shutdown().await.unwrap();
    });
}

#[test]
fn persistent_driver() {
    smol::block_on(async {
        let dir = TempDir::new().unwrap();
        let db = client(&dir, TransportKind::Persistent);
        exercise(&db).await;
        db.shutdown().await.unwrap();

        // a new worker is started on demand after shutdown
        assert!(matches!(
            db.call(DriverCommand::Connect).await.unwrap(),
            Payload::SchemaList(_)
        ));
        db.shutdown().await.unwrap();
    });
}

#[test]
fn one_shot_output_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.db");
    let output = std::process::Command::new(driver())
        .arg("--db=sqlite")
        .arg(format!("--path={}", path.display()))
        .arg("connect")
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ok"], true);
    assert_eq!(value["data_type"], "SchemaListData");
    assert_eq!(value["data"]["items"], serde_json::json!([]));

    let output = std::process::Command::new(driver())
        .arg("--db=sqlite")
        .arg("connect")
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ok"], false);
    assert!(value["error_message"].as_str().is_some_and(|m| m.contains("path")));
}
