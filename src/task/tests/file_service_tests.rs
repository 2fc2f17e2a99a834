//! Tests for idempotent task file registration.

use crate::test_support::Harness;
use crate::task::{
    domain::{FileKey, StorageType, TaskFileData, TaskFileType, TaskId},
    services::{InitTopicTaskRequest, RegisterTaskFileRequest, TaskServiceError},
};
use crate::topic::domain::{ChatTopicId, TopicId};
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

type Owner = (TopicId, TaskId);

fn request(file_key: &FileKey, (topic_id, task_id): Owner) -> RegisterTaskFileRequest {
    RegisterTaskFileRequest::new(
        file_key.clone(),
        topic_id,
        task_id,
        TaskFileData::new("summary.md", 2048).with_storage_type(StorageType::ObjectStorage),
    )
    .with_file_type(TaskFileType::Final)
}

async fn seeded_task(harness: &Harness) -> Owner {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(
                ChatTopicId::new("chat-1").expect("valid chat topic id"),
                "Write the summary",
            ),
        )
        .await
        .expect("task creation should succeed");
    (topic.id(), task.id())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registering_the_same_key_twice_returns_the_first_record(harness: Harness) {
    let owner = seeded_task(&harness).await;
    let key = FileKey::new("workspace/out/summary.md").expect("valid key");

    let first = harness
        .service
        .save_or_create_task_file_by_file_key(&harness.isolation, request(&key, owner))
        .await
        .expect("first registration should succeed");
    let second = harness
        .service
        .save_or_create_task_file_by_file_key(&harness.isolation, request(&key, owner))
        .await
        .expect("second registration should succeed");

    assert_eq!(first.id(), second.id());
    assert_eq!(first.file_extension(), "md");
    assert_eq!(harness.files.row_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_registrations_converge_on_one_row(harness: Harness) {
    let owner = seeded_task(&harness).await;
    let key = FileKey::new("workspace/out/chart.png").expect("valid key");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let worker = Arc::clone(&harness.service);
            let isolation = harness.isolation.clone();
            let registration = request(&key, owner);
            tokio::spawn(async move {
                worker
                    .save_or_create_task_file_by_file_key(&isolation, registration)
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        let file = handle
            .await
            .expect("task should join")
            .expect("registration should succeed");
        ids.push(file.id());
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(harness.files.row_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_files_are_listed_per_task(harness: Harness) {
    let owner = seeded_task(&harness).await;
    for raw in ["workspace/a.txt", "workspace/b.txt"] {
        harness
            .service
            .save_or_create_task_file_by_file_key(
                &harness.isolation,
                request(&FileKey::new(raw).expect("valid key"), owner),
            )
            .await
            .expect("registration should succeed");
    }

    let files = harness
        .service
        .list_task_files(&harness.isolation, owner.1)
        .await
        .expect("listing should succeed");

    assert_eq!(files.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_file_name_is_rejected(harness: Harness) {
    let (topic_id, task_id) = seeded_task(&harness).await;

    let result = harness
        .service
        .save_or_create_task_file_by_file_key(
            &harness.isolation,
            RegisterTaskFileRequest::new(
                FileKey::new("workspace/blank").expect("valid key"),
                topic_id,
                task_id,
                TaskFileData::new(" ", 0),
            ),
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::Domain(_))));
}
