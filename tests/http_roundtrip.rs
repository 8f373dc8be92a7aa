#![cfg(feature = "web")]

use project_dashboard::app;
use project_dashboard::config::DEFAULT_ROUTE;
use project_dashboard::store::{FileRange, MemoryRange, RangeStore};
use project_dashboard::sync::LoadOutcome;
use project_dashboard::{Collection, Field, HttpGateway, RowField, SyncConfig, Synchronizer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn serve(store: Box<dyn RangeStore>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app::router(store, DEFAULT_ROUTE);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn synchronizer(addr: SocketAddr, config: SyncConfig) -> Synchronizer {
    let url = format!("http://{addr}{DEFAULT_ROUTE}");
    let gateway = HttpGateway::new(url, Duration::from_secs(5)).unwrap();
    Synchronizer::new(Arc::new(gateway), config)
}

#[tokio::test]
async fn edits_survive_a_reload_through_the_server() {
    let addr = serve(Box::new(MemoryRange::with_header())).await;

    let session = synchronizer(addr, SyncConfig::default()).load().await;
    assert_eq!(
        session.status().borrow().load_outcome,
        Some(LoadOutcome::Empty)
    );
    session.set_field(Field::ProjectCode, "DT-104");
    session.set_field(Field::ContractValue, "007");
    session
        .set_row_field(Collection::ProgramRows, 0, RowField::Stage, "Concept Design")
        .unwrap();
    session.flush().await.unwrap();
    session.close();

    let reloaded = synchronizer(addr, SyncConfig::default()).load().await;
    let report = reloaded.snapshot();
    assert_eq!(
        reloaded.status().borrow().load_outcome,
        Some(LoadOutcome::Restored)
    );
    assert_eq!(report.project_code, "DT-104");
    assert_eq!(report.contract_value, "007");
    assert_eq!(report.program_rows[0].stage, "Concept Design");
    assert_eq!(*report, *session.snapshot());
}

#[tokio::test]
async fn autosave_reaches_a_file_backed_server() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.bin.gz");
    let addr = serve(Box::new(FileRange::open(&path).unwrap())).await;

    let config = SyncConfig {
        quiet_period: Duration::from_millis(50),
        ..SyncConfig::default()
    };
    let session = synchronizer(addr, config).load().await;
    let mut status = session.status();
    session.set_field(Field::Client, "Aldar");

    tokio::time::timeout(Duration::from_secs(5), async {
        while status.borrow_and_update().saved_at.is_none() {
            status.changed().await.unwrap();
        }
    })
    .await
    .unwrap();

    let stored = FileRange::open(&path).unwrap().read_rows().unwrap();
    assert!(stored.contains(&vec!["client".to_string(), "Aldar".to_string()]));
}

#[tokio::test]
async fn unreachable_gateway_loads_defaults() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = synchronizer(addr, SyncConfig::default()).load().await;
    assert_eq!(
        session.status().borrow().load_outcome,
        Some(LoadOutcome::Failed)
    );
    assert_eq!(session.snapshot().project_code, "");

    session.set_field(Field::ProjectCode, "offline");
    assert!(session.flush().await.is_err());
    assert!(session.status().borrow().saved_at.is_none());
}

#[tokio::test]
async fn error_status_counts_as_a_failed_load() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app::router(Box::new(MemoryRange::with_header()), "/somewhere-else");
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let session = synchronizer(addr, SyncConfig::default()).load().await;
    assert_eq!(
        session.status().borrow().load_outcome,
        Some(LoadOutcome::Failed)
    );
}
