//! Idempotent file registration tests.

use super::helpers::{Orchestrator, orchestrator};
use atelier::task::{
    domain::{FileKey, TaskFileData},
    services::RegisterTaskFileRequest,
};
use rstest::rstest;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_registrations_of_one_key_store_one_row(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "make a chart").await;
    let key = FileKey::new("abc").expect("valid key");
    let shared = Arc::new(orchestrator);

    let spawn_registration = |core: Arc<Orchestrator>| {
        let request = RegisterTaskFileRequest::new(
            key.clone(),
            topic.id(),
            task.id(),
            TaskFileData::new("chart.png", 4096),
        );
        tokio::spawn(async move {
            core.tasks
                .save_or_create_task_file_by_file_key(&core.isolation, request)
                .await
        })
    };
    let first_handle = spawn_registration(Arc::clone(&shared));
    let second_handle = spawn_registration(Arc::clone(&shared));

    let first = first_handle
        .await
        .expect("registration task should join")
        .expect("first registration should succeed");
    let second = second_handle
        .await
        .expect("registration task should join")
        .expect("second registration should succeed");

    assert_eq!(first, second);
    assert_eq!(first.file_key().as_str(), "abc");
    assert_eq!(shared.file_rows.row_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn later_metadata_does_not_overwrite_the_first_record(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "write notes").await;
    let key = FileKey::new("notes/summary.md").expect("valid key");

    let original = orchestrator
        .tasks
        .save_or_create_task_file_by_file_key(
            &orchestrator.isolation,
            RegisterTaskFileRequest::new(
                key.clone(),
                topic.id(),
                task.id(),
                TaskFileData::new("summary.md", 10),
            ),
        )
        .await
        .expect("registration should succeed");
    let replay = orchestrator
        .tasks
        .save_or_create_task_file_by_file_key(
            &orchestrator.isolation,
            RegisterTaskFileRequest::new(
                key,
                topic.id(),
                task.id(),
                TaskFileData::new("summary-v2.md", 99),
            ),
        )
        .await
        .expect("replay should succeed");

    assert_eq!(replay, original);
    assert_eq!(replay.file_size(), 10);
}
