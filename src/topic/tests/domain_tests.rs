//! Domain tests for the topic aggregate.

use crate::isolation::DataIsolation;
use crate::sandbox::domain::SandboxId;
use crate::task::domain::{TaskId, TaskMode, TaskStatus};
use crate::topic::domain::{ChatBinding, Topic, TopicDomainError, TopicName};
use crate::workspace::domain::WorkspaceId;
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn topic() -> Topic {
    let isolation = DataIsolation::from_parts("usi_1", "DT001").expect("valid isolation");
    Topic::new(
        &isolation,
        WorkspaceId::new(),
        ChatBinding::from_parts("conv-1", "chat-topic-1").expect("valid chat binding"),
        TopicName::new("  Weekly sync ").expect("valid name"),
        &DefaultClock,
    )
}

#[rstest]
fn new_topic_has_no_task_or_sandbox(topic: Topic) {
    assert_eq!(topic.name().as_str(), "Weekly sync");
    assert!(topic.current_task_id().is_none());
    assert!(topic.sandbox_id().is_none());
    assert_eq!(topic.task_mode(), TaskMode::Chat);
    assert!(!topic.has_running_task());
}

#[rstest]
fn overlong_name_is_rejected() {
    let name = "x".repeat(TopicName::MAX_LENGTH + 1);
    assert_eq!(
        TopicName::new(name),
        Err(TopicDomainError::NameTooLong {
            max: TopicName::MAX_LENGTH
        })
    );
}

#[rstest]
fn sandbox_binding_is_sticky(mut topic: Topic) {
    let task_id = TaskId::new();
    let sandbox = SandboxId::new("sbx-1").expect("valid sandbox id");
    topic.point_at_task(task_id, TaskStatus::Waiting, TaskMode::Chat, &DefaultClock);

    topic.mirror_task_status(task_id, Some(sandbox.clone()), TaskStatus::Running, &DefaultClock);
    topic.mirror_task_status(task_id, None, TaskStatus::Finished, &DefaultClock);

    assert_eq!(topic.sandbox_id(), Some(&sandbox));
    assert_eq!(topic.current_task_status(), Some(TaskStatus::Finished));
}

#[rstest]
fn reports_from_older_tasks_do_not_move_the_pointer(mut topic: Topic) {
    let older = TaskId::new();
    let current = TaskId::new();
    topic.point_at_task(older, TaskStatus::Waiting, TaskMode::Chat, &DefaultClock);
    topic.point_at_task(current, TaskStatus::Waiting, TaskMode::Plan, &DefaultClock);

    topic.mirror_task_status(older, None, TaskStatus::Error, &DefaultClock);

    assert_eq!(topic.current_task_id(), Some(current));
    assert_eq!(topic.current_task_status(), Some(TaskStatus::Waiting));
    assert_eq!(topic.task_mode(), TaskMode::Plan);
}
