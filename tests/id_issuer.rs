use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;
use tempfile::TempDir;
use watchlist::config::DatabaseConfig;
use watchlist::database::{open_for_provisioning, run_sql_script};
use watchlist::{IdIssuer, IssuanceError, SqliteIdIssuer};

fn provisioned_store(dir: &TempDir) -> DatabaseConfig {
    let path = dir.path().join("ids.sqlite");
    let script = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sql/watchlist.sql");
    let conn = open_for_provisioning(&path).unwrap();
    run_sql_script(&conn, &script).unwrap();

    DatabaseConfig {
        path: path_str(&path),
        ..DatabaseConfig::default()
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn sequential_calls_on_an_empty_store_return_one_two_three() {
    let dir = TempDir::new().unwrap();
    let issuer = SqliteIdIssuer::open(&provisioned_store(&dir)).unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(issuer.issue("jcrew").await.unwrap().get());
    }
    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_yield_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let issuer = Arc::new(SqliteIdIssuer::open(&provisioned_store(&dir)).unwrap());

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let issuer = issuer.clone();
            let label = if n % 2 == 0 { "jcrew" } else { "burberry" };
            tokio::spawn(async move { issuer.issue(label).await.unwrap().get() })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()));
    }
    assert_eq!(ids.len(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn separate_issuers_on_one_store_never_collide() {
    let dir = TempDir::new().unwrap();
    let config = provisioned_store(&dir);
    let first = Arc::new(SqliteIdIssuer::open(&config).unwrap());
    let second = Arc::new(SqliteIdIssuer::open(&config).unwrap());

    let handles: Vec<_> = (0..40)
        .map(|n| {
            let issuer = if n % 2 == 0 { first.clone() } else { second.clone() };
            tokio::spawn(async move { issuer.issue("anntaylor").await.unwrap().get() })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()));
    }
    assert_eq!(ids.len(), 40);
}

#[tokio::test]
async fn ids_survive_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    let config = provisioned_store(&dir);

    let before = SqliteIdIssuer::open(&config).unwrap().issue("jcrew").await.unwrap();
    let after = SqliteIdIssuer::open(&config).unwrap().issue("jcrew").await.unwrap();
    assert!(after > before);
}

#[test]
fn missing_store_is_never_created() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.sqlite");
    let config = DatabaseConfig {
        path: path_str(&path),
        ..DatabaseConfig::default()
    };

    assert!(matches!(SqliteIdIssuer::open(&config), Err(IssuanceError::Store(_))));
    assert!(!path.exists());
}

#[test]
fn unknown_table_is_rejected_at_open() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        table: "product_ids".to_string(),
        ..provisioned_store(&dir)
    };
    assert!(matches!(SqliteIdIssuer::open(&config), Err(IssuanceError::Store(_))));

    let config = DatabaseConfig {
        table: "object where 1".to_string(),
        ..config
    };
    assert!(matches!(
        SqliteIdIssuer::open(&config),
        Err(IssuanceError::InvalidTableName(_))
    ));
}

#[tokio::test]
async fn locked_store_gives_up_after_bounded_retries() {
    let dir = TempDir::new().unwrap();
    let config = DatabaseConfig {
        timeout_ms: 100,
        max_attempts: 2,
        retry_delay_ms: 10,
        ..provisioned_store(&dir)
    };
    let issuer = SqliteIdIssuer::open(&config).unwrap();

    let blocker = Connection::open(&config.path).unwrap();
    blocker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    match issuer.issue("jcrew").await {
        Err(IssuanceError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, 2);
            assert!(last.is_transient());
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }

    blocker.execute_batch("ROLLBACK;").unwrap();
    assert!(issuer.issue("jcrew").await.is_ok());
}
