use std::sync::Arc;

use nosqlayer::{cosmos::CosmosDbService, memory::InMemoryBackend, prelude::*, serde_json::json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Timer {
    timer_id: String,
    user_id: String,
    label: String,
    minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_deleted: Option<bool>,
}

impl Document for Timer {
    fn container_name() -> &'static str {
        "timers"
    }
}

fn timer(id: &str, label: &str, minutes: i64) -> Timer {
    Timer {
        timer_id: id.to_string(),
        user_id: "u1".to_string(),
        label: label.to_string(),
        minutes,
        is_deleted: None,
    }
}

async fn store() -> DataStore<CosmosDbService<InMemoryBackend>> {
    let registry = StaticSchemaRegistry::from_json_str(
        r#"[
            {
                "containerName": "timers",
                "aliasProcessingEnabled": true,
                "schema": {
                    "keyConfiguration": { "partitionKeyPath": "/userId" },
                    "attributes": [{ "name": "timerId", "dbName": "id", "type": "String" }]
                }
            }
        ]"#,
    )
    .unwrap();

    let service = CosmosDbService::connect(
        &InMemoryBackend::builder().page_size(2),
        &ConnectionConfig::new("https://localhost:8081", "timers-db", "secret"),
        Arc::new(registry),
    )
    .await
    .unwrap();

    DataStore::new(service)
}

#[tokio::test]
async fn test_should_round_trip_typed_documents() {
    let store = store().await;
    let timers = store.typed_container::<Timer>();

    let created = timers
        .create(vec![timer("t1", "tea", 3), timer("t2", "eggs", 7), timer("t3", "pasta", 10)])
        .await
        .unwrap();
    assert_eq!(created[1], timer("t2", "eggs", 7));

    let found = timers
        .find_by_ids(&["t3".to_string(), "t1".to_string()], "u1")
        .await
        .unwrap();
    assert_eq!(found.len(), 2);

    let stored = store
        .service()
        .backend()
        .read_item("timers", "t1", "u1")
        .await
        .unwrap();
    assert_eq!(stored.get("id"), Some(&json!("t1")));
    assert!(!stored.contains_key("timerId"));
}

#[tokio::test]
async fn test_should_search_with_parsed_criteria() {
    let store = store().await;
    let timers = store.typed_container::<Timer>();
    timers
        .create(vec![timer("t1", "tea", 3), timer("t2", "eggs", 7), timer("t3", "pasta", 10)])
        .await
        .unwrap();

    let criteria = parser::parse_str(
        r#"{
            "op": "And",
            "searchTerms": [
                { "op": "Gte", "left": "minutes", "right": 5 },
                { "op": "In", "left": "timerId", "right": ["t1", "t2", "t3"] }
            ]
        }"#,
    )
    .unwrap()
    .unwrap();
    let options = FindOptions::builder()
        .sort("minutes", SortDirection::Descending)
        .build();

    let found = timers.find("u1", &criteria, Some(&options)).await.unwrap();
    let labels = found.iter().map(|timer| timer.label.as_str()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["pasta", "eggs"]);

    assert_eq!(timers.untyped().count("u1", Some(&criteria)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_should_soft_delete_through_untyped_handle() {
    let store = store().await;
    let timers = store.typed_container::<Timer>();
    timers
        .create(vec![timer("t1", "tea", 3), timer("t2", "eggs", 7)])
        .await
        .unwrap();

    let raw = store.container("timers");
    raw.soft_delete(&["t1".to_string()], "u1", None).await.unwrap();

    let visible = SearchExpression::and([SearchExpression::not_deleted(), SearchExpression::gt("minutes", 0)]);
    let found = timers.find("u1", &visible, None).await.unwrap();
    assert_eq!(found, vec![timer("t2", "eggs", 7)]);

    let restored = raw.undelete(&["t1".to_string()], "u1", None).await.unwrap();
    assert_eq!(restored[0].get("isDeleted"), Some(&json!(false)));
    assert_eq!(timers.find("u1", &visible, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_should_update_and_delete() {
    let store = store().await;
    let timers = store.typed_container::<Timer>();
    timers
        .create(vec![timer("t1", "tea", 3), timer("t2", "eggs", 7)])
        .await
        .unwrap();

    let raw = store.container("timers");
    let result = raw
        .update(
            "t1",
            "u1",
            json!({ "label": "green tea" }).as_object().cloned().unwrap(),
            ReturnValueOption::UpdatedNew,
        )
        .await
        .unwrap();
    assert!(result.old.is_none());
    assert_eq!(result.new.unwrap().get("label"), Some(&json!("green tea")));

    let deleted = timers
        .delete_by_ids("u1", &["t1".to_string(), "nope".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].label, "green tea");

    raw.delete_by_key_value("userId", &json!("u1"), 0).await.unwrap();
    assert_eq!(raw.count("u1", None).await.unwrap(), 0);
}
