//! Service orchestration tests for task creation, status reports and
//! interrupts.

use crate::test_support::Harness;
use crate::sandbox::{
    adapters::ScriptedReply,
    domain::{SandboxId, SandboxStatus},
};
use crate::task::{
    domain::{
        ExternalTaskId, MessageRole, MessageType, Task, TaskDomainError, TaskInstruction,
        TaskMode, TaskStatus,
    },
    ports::{TaskMessageRepository, TaskRepository},
    services::{AiMessageRequest, InitTopicTaskRequest, TaskServiceError, UpdateTaskStatusRequest},
};
use crate::topic::{
    domain::{ChatTopicId, Topic},
    ports::TopicRepository,
};
use crate::workspace::{domain::ArchiveStatus, ports::WorkspaceRepository};
use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

fn chat_topic(raw: &str) -> ChatTopicId {
    ChatTopicId::new(raw).expect("valid chat topic id")
}

fn sandbox(raw: &str) -> SandboxId {
    SandboxId::new(raw).expect("valid sandbox id")
}

async fn start_task(harness: &Harness, topic: &Topic, sandbox_id: &str) -> Task {
    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(topic.chat().topic_id().clone(), "Draft the summary"),
        )
        .await
        .expect("task creation should succeed");
    harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), task.id(), TaskStatus::Running)
                .with_sandbox_id(sandbox(sandbox_id)),
        )
        .await
        .expect("task should start")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn normal_instruction_creates_waiting_task_and_points_topic(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;

    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Summarise the report")
                .with_attachments(json!([{"file_key": "uploads/report.pdf"}])),
        )
        .await
        .expect("task creation should succeed");

    assert_eq!(task.status(), TaskStatus::Waiting);
    assert_eq!(task.prompt(), "Summarise the report");
    assert_eq!(task.work_dir(), topic.work_dir());
    let stored_topic = harness
        .topics
        .find_by_id(topic.id())
        .await
        .expect("lookup should succeed")
        .expect("topic should exist");
    assert_eq!(stored_topic.current_task_id(), Some(task.id()));
    assert_eq!(stored_topic.current_task_status(), Some(TaskStatus::Waiting));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn absent_task_mode_falls_back_to_topic_mode(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;

    let planned = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Plan it")
                .with_task_mode(TaskMode::Plan),
        )
        .await
        .expect("task creation should succeed");
    harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), planned.id(), TaskStatus::Stopped),
        )
        .await
        .expect("waiting task may stop");
    let next = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Continue"),
        )
        .await
        .expect("task creation should succeed");

    assert_eq!(next.task_mode(), TaskMode::Plan);
}

#[rstest]
#[case(TaskInstruction::FollowUp)]
#[case(TaskInstruction::Interrupted)]
#[tokio::test(flavor = "multi_thread")]
async fn attaching_instructions_reuse_the_running_task(
    harness: Harness,
    #[case] instruction: TaskInstruction,
) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;

    let attached = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Also add a chart")
                .with_instruction(instruction),
        )
        .await
        .expect("attach should succeed");

    assert_eq!(attached.id(), running.id());
    let all = harness
        .tasks
        .list_by_topic(topic.id())
        .await
        .expect("listing should succeed");
    assert_eq!(all.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn follow_up_without_running_task_is_rejected(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;

    let result = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "more")
                .with_instruction(TaskInstruction::FollowUp),
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::NoRunningTask(id)) if id == topic.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn chat_topic_of_another_user_is_not_found(harness: Harness) {
    harness.seed_topic("chat-1").await;
    let stranger = crate::isolation::DataIsolation::from_parts("usi_2", "DT001")
        .expect("valid isolation");

    let result = harness
        .service
        .init_topic_task(&stranger, InitTopicTaskRequest::new(chat_topic("chat-1"), "hi"))
        .await;

    let err = result.expect_err("foreign topic must be invisible");
    assert!(err.is_not_found());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archived_workspace_rejects_new_tasks(harness: Harness) {
    let (mut workspace, _) = harness.seed_topic("chat-1").await;
    workspace.set_archive_status(ArchiveStatus::Archived, &DefaultClock);
    harness
        .workspaces
        .update(&workspace)
        .await
        .expect("archive should persist");

    let result = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "hi"),
        )
        .await;

    assert!(matches!(result, Err(TaskServiceError::Workspace(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_report_binds_sandbox_and_mirrors_topic(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;

    let running = start_task(&harness, &topic, "sbx-7").await;

    assert_eq!(running.sandbox_id(), Some(&sandbox("sbx-7")));
    let stored_topic = harness
        .topics
        .find_by_id(topic.id())
        .await
        .expect("lookup should succeed")
        .expect("topic should exist");
    assert_eq!(stored_topic.sandbox_id(), Some(&sandbox("sbx-7")));
    assert!(stored_topic.has_running_task());

    let next = harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), running.id(), TaskStatus::Finished),
        )
        .await
        .expect("finish should apply");
    assert_eq!(next.sandbox_id(), Some(&sandbox("sbx-7")));
    let followup = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Next question"),
        )
        .await
        .expect("task creation should succeed");
    assert_eq!(followup.sandbox_id(), Some(&sandbox("sbx-7")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_task_cannot_run_while_topic_is_busy(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;
    let waiting = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "Another"),
        )
        .await
        .expect("waiting task may be created");

    let result = harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), waiting.id(), TaskStatus::Running),
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskServiceError::TopicBusy { running_task_id, .. }) if running_task_id == running.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_transition_leaves_task_untouched(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "go"),
        )
        .await
        .expect("task creation should succeed");

    let result = harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), task.id(), TaskStatus::Finished),
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskServiceError::Domain(TaskDomainError::InvalidStatusTransition { .. }))
    ));
    let stored = harness
        .tasks
        .find_by_id(task.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.status(), TaskStatus::Waiting);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_ping_by_external_id_updates_only_known_tasks(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "go"),
        )
        .await
        .expect("task creation should succeed");
    let external = ExternalTaskId::new("ext-42").expect("valid external id");
    harness
        .service
        .update_task_status(
            &harness.isolation,
            UpdateTaskStatusRequest::new(topic.id(), task.id(), TaskStatus::Running)
                .with_external_task_id(external.clone()),
        )
        .await
        .expect("start should apply");

    let finished = harness
        .service
        .update_task_status_by_external_id(&external, TaskStatus::Finished)
        .await
        .expect("ping should apply");
    let unknown = harness
        .service
        .update_task_status_by_external_id(
            &ExternalTaskId::new("ext-missing").expect("valid external id"),
            TaskStatus::Finished,
        )
        .await
        .expect("ping should not fail");

    assert!(finished);
    assert!(!unknown);
    let stored = harness
        .tasks
        .find_by_external_id(&external)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.status(), TaskStatus::Finished);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_sweep_uses_a_strict_threshold(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;

    let at_threshold = harness
        .service
        .update_stale_running_tasks(running.updated_at())
        .await
        .expect("sweep should succeed");
    assert_eq!(at_threshold, 0);

    let past_threshold = harness
        .service
        .update_stale_running_tasks(running.updated_at() + TimeDelta::milliseconds(1))
        .await
        .expect("sweep should succeed");
    assert_eq!(past_threshold, 1);
    let stored = harness
        .tasks
        .find_by_id(running.id())
        .await
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.status(), TaskStatus::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_sweep_ignores_waiting_tasks(harness: Harness) {
    harness.seed_topic("chat-1").await;
    harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "go"),
        )
        .await
        .expect("task creation should succeed");

    let reclaimed = harness
        .service
        .update_stale_running_tasks(Utc::now() + TimeDelta::hours(1))
        .await
        .expect("sweep should succeed");

    assert_eq!(reclaimed, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_task_cannot_be_deleted(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;

    let result = harness
        .service
        .delete_task(&harness.isolation, running.id())
        .await;

    assert!(matches!(result, Err(TaskServiceError::TaskRunning(id)) if id == running.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interrupt_without_sandbox_is_not_satisfied(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let task = harness
        .service
        .init_topic_task(
            &harness.isolation,
            InitTopicTaskRequest::new(chat_topic("chat-1"), "go"),
        )
        .await
        .expect("task creation should succeed");

    let satisfied = harness
        .service
        .handle_interrupt_instruction(&task)
        .await
        .expect("interrupt should not fail");

    assert!(!satisfied);
    assert_eq!(harness.connector.connection_count().expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interrupt_of_exited_sandbox_skips_the_session(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;
    harness
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Exited)
        .expect("gateway update");

    let satisfied = harness
        .service
        .handle_interrupt_instruction(&running)
        .await
        .expect("interrupt should not fail");

    assert!(satisfied);
    assert_eq!(harness.connector.connection_count().expect("count"), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn interrupt_of_running_sandbox_sends_control_message(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;
    harness
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Running)
        .expect("gateway update");

    let satisfied = harness
        .service
        .handle_interrupt_instruction(&running)
        .await
        .expect("interrupt should be acknowledged");

    assert!(satisfied);
    let sent = harness.connector.sent_payloads().expect("payloads");
    assert_eq!(sent.len(), 1);
    assert_eq!(harness.connector.closed_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn silent_sandbox_surfaces_interrupt_timeout(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;
    harness
        .gateway
        .set_status(sandbox("sbx-1"), SandboxStatus::Running)
        .expect("gateway update");
    harness
        .connector
        .set_reply(ScriptedReply::Silent)
        .expect("script update");

    let result = harness.service.handle_interrupt_instruction(&running).await;

    match result {
        Err(TaskServiceError::InterruptTimeout { sandbox_id, .. }) => {
            assert_eq!(sandbox_id, sandbox("sbx-1"));
        }
        other => panic!("expected interrupt timeout, got {other:?}"),
    }
    assert_eq!(harness.connector.closed_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transcript_keeps_insertion_order(harness: Harness) {
    let (_, topic) = harness.seed_topic("chat-1").await;
    let running = start_task(&harness, &topic, "sbx-1").await;

    harness
        .service
        .record_user_message(&running, "Draft the summary", None)
        .await
        .expect("user message should append");
    harness
        .service
        .record_ai_message(
            &running,
            AiMessageRequest::new(MessageType::Tool, "Opened report.pdf")
                .with_tool(json!({"name": "read_file"}))
                .with_status(TaskStatus::Running),
        )
        .await
        .expect("ai message should append");

    let transcript = harness
        .service
        .list_task_messages(&harness.isolation, running.id())
        .await
        .expect("listing should succeed");
    let senders: Vec<MessageRole> = transcript.iter().map(|entry| entry.sender()).collect();
    assert_eq!(senders, vec![MessageRole::User, MessageRole::Assistant]);
    assert_eq!(
        transcript.last().and_then(|entry| entry.tool()),
        Some(&json!({"name": "read_file"}))
    );
    assert_eq!(
        harness.messages.list_by_task(running.id()).await.expect("listing").len(),
        2
    );
}
