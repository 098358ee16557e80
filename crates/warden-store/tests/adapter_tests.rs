//! Integration tests for SqliteAdapter
//!
//! These tests verify all IPolicyAdapter methods using an in-memory
//! SQLite database. Each test function creates a fresh database to
//! ensure test isolation.

use warden_core::domain::policy::PolicyRule;
use warden_core::ports::policy_adapter::IPolicyAdapter;
use warden_store::{SqliteAdapter, StoreError, StorePool};

// ============================================================================
// Test helpers
// ============================================================================

/// Create a fresh in-memory adapter for each test
async fn setup() -> SqliteAdapter {
    let pool = StorePool::in_memory()
        .await
        .expect("Failed to create in-memory database");
    SqliteAdapter::new(pool.pool().clone())
}

fn rule(values: &[&str]) -> PolicyRule {
    PolicyRule::new(values.iter().copied())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fresh_database_loads_empty() {
    let adapter = setup().await;
    assert!(adapter.load_policy().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_then_load_preserves_order() {
    let adapter = setup().await;
    let rules = vec![
        ("p".to_string(), rule(&["alice", "data1", "read"])),
        ("p".to_string(), rule(&["bob", "data2", "write"])),
        ("g".to_string(), rule(&["alice", "admin"])),
    ];

    adapter.save_policy(&rules).await.unwrap();
    assert_eq!(adapter.load_policy().await.unwrap(), rules);
}

#[tokio::test]
async fn test_save_replaces_previous_rules() {
    let adapter = setup().await;
    adapter
        .save_policy(&[("p".to_string(), rule(&["alice", "data1", "read"]))])
        .await
        .unwrap();

    let replacement = vec![("p".to_string(), rule(&["bob", "data2", "write"]))];
    adapter.save_policy(&replacement).await.unwrap();

    assert_eq!(adapter.load_policy().await.unwrap(), replacement);
}

#[tokio::test]
async fn test_add_rule_appends() {
    let adapter = setup().await;

    adapter
        .add_rule("p", &rule(&["alice", "data1", "read"]))
        .await
        .unwrap();
    adapter
        .add_rule("g", &rule(&["alice", "admin"]))
        .await
        .unwrap();

    let rules = adapter.load_policy().await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].0, "p");
    assert_eq!(rules[1].0, "g");
}

#[tokio::test]
async fn test_remove_rule_matches_exact_row() {
    let adapter = setup().await;
    adapter
        .save_policy(&[
            ("p".to_string(), rule(&["alice", "data1", "read"])),
            ("p".to_string(), rule(&["alice", "data1", "read", "extra"])),
        ])
        .await
        .unwrap();

    // Null-safe matching: the three-value rule must not remove the
    // four-value row
    adapter
        .remove_rule("p", &rule(&["alice", "data1", "read"]))
        .await
        .unwrap();

    let remaining = adapter.load_policy().await.unwrap();
    assert_eq!(
        remaining,
        vec![("p".to_string(), rule(&["alice", "data1", "read", "extra"]))]
    );
}

#[tokio::test]
async fn test_remove_rule_respects_ptype() {
    let adapter = setup().await;
    adapter
        .save_policy(&[
            ("p".to_string(), rule(&["alice", "admin"])),
            ("g".to_string(), rule(&["alice", "admin"])),
        ])
        .await
        .unwrap();

    adapter
        .remove_rule("g", &rule(&["alice", "admin"]))
        .await
        .unwrap();

    let remaining = adapter.load_policy().await.unwrap();
    assert_eq!(remaining, vec![("p".to_string(), rule(&["alice", "admin"]))]);
}

#[tokio::test]
async fn test_remove_missing_rule_is_a_noop() {
    let adapter = setup().await;
    adapter
        .save_policy(&[("p".to_string(), rule(&["alice", "data1", "read"]))])
        .await
        .unwrap();

    adapter
        .remove_rule("p", &rule(&["nobody", "nothing", "never"]))
        .await
        .unwrap();

    assert_eq!(adapter.load_policy().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rule_wider_than_schema_is_rejected() {
    let adapter = setup().await;
    let wide = rule(&["a", "b", "c", "d", "e", "f", "g"]);

    let err = adapter.add_rule("p", &wide).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::RuleTooWide(7))
    ));
}

#[tokio::test]
async fn test_six_value_rule_round_trips() {
    let adapter = setup().await;
    let widest = rule(&["a", "b", "c", "d", "e", "f"]);

    adapter.add_rule("p", &widest).await.unwrap();

    let rules = adapter.load_policy().await.unwrap();
    assert_eq!(rules, vec![("p".to_string(), widest)]);
}

#[tokio::test]
async fn test_file_backed_pool_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("policy.db");

    {
        let pool = StorePool::new(&db_path).await.unwrap();
        let adapter = SqliteAdapter::new(pool.pool().clone());
        adapter
            .add_rule("p", &rule(&["alice", "data1", "read"]))
            .await
            .unwrap();
    }

    let pool = StorePool::new(&db_path).await.unwrap();
    let adapter = SqliteAdapter::new(pool.pool().clone());
    let rules = adapter.load_policy().await.unwrap();

    assert_eq!(rules, vec![("p".to_string(), rule(&["alice", "data1", "read"]))]);
}
