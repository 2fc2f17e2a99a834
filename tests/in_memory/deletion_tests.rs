//! Topic and workspace deletion tests, including interrupt handshakes.

use super::helpers::{Orchestrator, orchestrator};
use atelier::sandbox::{
    adapters::ScriptedReply,
    domain::{SandboxId, SandboxStatus},
};
use atelier::task::{domain::TaskStatus, services::TaskServiceError};
use atelier::topic::services::TopicServiceError;
use atelier::workspace::services::WorkspaceDeletion;
use rstest::rstest;

fn sandbox(id: &str) -> SandboxId {
    SandboxId::new(id).expect("valid sandbox id")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exited_sandbox_interrupt_succeeds_without_connecting(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "hi").await;
    let running = orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;
    orchestrator
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Exited)
        .expect("gateway update");

    let satisfied = orchestrator
        .tasks
        .handle_interrupt_instruction(&running)
        .await
        .expect("interrupt should succeed");

    assert!(satisfied);
    assert_eq!(orchestrator.connector.connection_count().expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn silent_sandbox_blocks_topic_deletion(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "hi").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;
    orchestrator
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Running)
        .expect("gateway update");
    orchestrator
        .connector
        .set_reply(ScriptedReply::Silent)
        .expect("connector update");

    let result = orchestrator
        .topics
        .delete_topic(&orchestrator.isolation, topic.id())
        .await;

    assert!(matches!(
        result,
        Err(TopicServiceError::Task(TaskServiceError::InterruptTimeout { .. }))
    ));
    let survivor = orchestrator
        .topic_rows
        .find_including_deleted(topic.id())
        .expect("topic lookup")
        .expect("topic should still exist");
    assert!(survivor.deleted_at().is_none());
    let still_running = orchestrator
        .task_rows
        .find_including_deleted(task.id())
        .expect("task lookup")
        .expect("task should still exist");
    assert_eq!(still_running.status(), TaskStatus::Running);
    assert!(still_running.deleted_at().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn acknowledged_interrupt_lets_topic_deletion_cascade(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let finished = orchestrator.new_task(&topic, "first").await;
    orchestrator.report(&finished, TaskStatus::Running, "sbx-1").await;
    orchestrator.report(&finished, TaskStatus::Finished, "sbx-1").await;
    let running = orchestrator.new_task(&topic, "second").await;
    orchestrator.report(&running, TaskStatus::Running, "sbx-1").await;
    orchestrator
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Running)
        .expect("gateway update");

    let deleted = orchestrator
        .topics
        .delete_topic(&orchestrator.isolation, topic.id())
        .await
        .expect("deletion should succeed");

    assert_eq!(deleted, 2);
    assert_eq!(orchestrator.connector.connection_count().expect("count"), 1);
    assert_eq!(orchestrator.connector.closed_count().expect("count"), 1);
    let sent = orchestrator.connector.sent_payloads().expect("payloads");
    assert_eq!(sent.len(), 1);
    let lookup = orchestrator
        .topics
        .get_topic(&orchestrator.isolation, topic.id())
        .await;
    assert!(matches!(lookup, Err(TopicServiceError::TopicNotFound(_))));
    assert!(
        orchestrator
            .task_rows
            .all_for_topic(topic.id())
            .expect("task listing")
            .iter()
            .all(|task| task.deleted_at().is_some())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn idle_workspace_deletion_reports_counts(orchestrator: Orchestrator) {
    let first = orchestrator.topic("chat-1").await;
    let second = orchestrator.topic("chat-2").await;
    let task = orchestrator.new_task(&first, "one").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;
    orchestrator.report(&task, TaskStatus::Finished, "sbx-1").await;
    orchestrator.new_task(&second, "two").await;

    let deletion = orchestrator
        .workspaces
        .delete_workspace(&orchestrator.isolation, first.workspace_id())
        .await
        .expect("deletion should succeed");

    assert_eq!(deletion, WorkspaceDeletion { topics: 2, tasks: 2 });
}
