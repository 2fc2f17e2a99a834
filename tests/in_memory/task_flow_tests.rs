//! Instruction handling and status report tests.

use super::helpers::{Orchestrator, orchestrator};
use atelier::task::{
    domain::{ExternalTaskId, TaskInstruction, TaskStatus},
    services::{InitTopicTaskRequest, TaskServiceError, UpdateTaskStatusRequest},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn normal_instruction_creates_waiting_task(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    assert!(topic.sandbox_id().is_none());

    let task = orchestrator.new_task(&topic, "hi").await;

    assert_eq!(task.status(), TaskStatus::Waiting);
    let refreshed = orchestrator
        .topics
        .get_topic(&orchestrator.isolation, topic.id())
        .await
        .expect("topic lookup should succeed");
    assert_eq!(refreshed.current_task_status(), Some(TaskStatus::Waiting));
    assert_eq!(refreshed.current_task_id(), Some(task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn follow_up_returns_the_running_task(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "hi").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;

    let attached = orchestrator
        .tasks
        .init_topic_task(
            &orchestrator.isolation,
            InitTopicTaskRequest::new(topic.chat().topic_id().clone(), "and also this")
                .with_instruction(TaskInstruction::FollowUp),
        )
        .await
        .expect("follow-up should attach");

    assert_eq!(attached.id(), task.id());
    let all = orchestrator
        .tasks
        .list_topic_tasks(&orchestrator.isolation, topic.id())
        .await
        .expect("listing should succeed");
    assert_eq!(all.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn at_most_one_task_runs_per_topic(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let first = orchestrator.new_task(&topic, "first").await;
    let second = orchestrator.new_task(&topic, "second").await;
    orchestrator.report(&first, TaskStatus::Running, "sbx-1").await;

    let refused = orchestrator
        .tasks
        .update_task_status(
            &orchestrator.isolation,
            UpdateTaskStatusRequest::new(topic.id(), second.id(), TaskStatus::Running),
        )
        .await;
    assert!(matches!(refused, Err(TaskServiceError::TopicBusy { .. })));

    orchestrator.report(&first, TaskStatus::Finished, "sbx-1").await;
    let started = orchestrator.report(&second, TaskStatus::Running, "sbx-1").await;
    assert_eq!(started.status(), TaskStatus::Running);

    let running: Vec<_> = orchestrator
        .tasks
        .list_topic_tasks(&orchestrator.isolation, topic.id())
        .await
        .expect("listing should succeed")
        .into_iter()
        .filter(|task| task.is_running())
        .collect();
    assert_eq!(running.len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_ping_cannot_start_a_second_task_on_the_topic(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let first = orchestrator.new_task(&topic, "first").await;
    let second = orchestrator.new_task(&topic, "second").await;
    orchestrator.report(&first, TaskStatus::Running, "sbx-1").await;
    let external = ExternalTaskId::new("ext-b").expect("valid external id");
    orchestrator
        .tasks
        .update_task_status(
            &orchestrator.isolation,
            UpdateTaskStatusRequest::new(topic.id(), second.id(), TaskStatus::Waiting)
                .with_external_task_id(external.clone()),
        )
        .await
        .expect("binding the external id should apply");

    let refused = orchestrator
        .tasks
        .update_task_status_by_external_id(&external, TaskStatus::Running)
        .await;

    assert!(matches!(
        refused,
        Err(TaskServiceError::TopicBusy { running_task_id, .. }) if running_task_id == first.id()
    ));
    let running = orchestrator
        .tasks
        .list_topic_tasks(&orchestrator.isolation, topic.id())
        .await
        .expect("listing should succeed")
        .into_iter()
        .filter(|task| task.is_running())
        .count();
    assert_eq!(running, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn suspended_task_can_resume(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "long job").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;
    orchestrator.report(&task, TaskStatus::Suspended, "sbx-1").await;

    let resumed = orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;

    assert_eq!(resumed.status(), TaskStatus::Running);
}
