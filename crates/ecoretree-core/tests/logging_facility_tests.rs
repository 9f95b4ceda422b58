#![allow(clippy::unwrap_used, clippy::expect_used)]

use ecoretree_core::errors::SyncError;
use ecoretree_core::logging_facility::test_capture::init_test_capture;
use ecoretree_core::mirror::PushMessage;
use ecoretree_core::{log_op_end, log_op_error, log_op_start, EcoreLabelResolver, Mirror};
use ecoretree_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DOCUMENT_ID, FIELD_ERR_CODE, FIELD_ERR_KIND,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let start_events = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    assert!(start_events >= 1, "Should have captured at least one start event");
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = SyncError::NodeNotFound {
        node_id: "n1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let error_events: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(error_events.len(), 1, "Should have exactly one error event");
    assert_eq!(error_events[0].field(FIELD_ERR_CODE), Some("ERR_NOT_FOUND"));
    assert_eq!(error_events[0].field(FIELD_ERR_KIND), Some("NotFound"));
}

#[test]
fn test_handle_push_logs_start_and_end() {
    let capture = init_test_capture();
    let document_id = "logging_unique_start_end.ecore";

    let mut mirror = Mirror::new(document_id, Arc::new(EcoreLabelResolver));
    mirror.handle_push(PushMessage::FullUpdate(json!({"name": "pkg"})));

    let events: Vec<_> = capture
        .events_for_op("handle_push")
        .into_iter()
        .filter(|e| e.field(FIELD_DOCUMENT_ID) == Some(document_id))
        .collect();
    let kinds: Vec<_> = events.iter().filter_map(|e| e.event.clone()).collect();
    assert_eq!(kinds, vec![EVENT_START.to_string(), EVENT_END.to_string()]);
}

#[test]
fn test_dropped_push_logs_end_error() {
    let capture = init_test_capture();
    let document_id = "logging_unique_dropped.ecore";

    let mut mirror = Mirror::new(document_id, Arc::new(EcoreLabelResolver));
    mirror.handle_push(PushMessage::IncrementalUpdate(json!({
        "type": "set",
        "owner": {"$ref": "x#//A"},
        "feature": "name",
        "dataValues": ["B"]
    })));

    let errors: Vec<_> = capture
        .events_for_op("handle_push")
        .into_iter()
        .filter(|e| {
            e.field(FIELD_DOCUMENT_ID) == Some(document_id)
                && e.event.as_deref() == Some(EVENT_END_ERROR)
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_MIRROR_UNAVAILABLE"));
}
