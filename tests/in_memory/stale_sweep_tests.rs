//! Stale running task sweep tests.

use super::helpers::{Orchestrator, orchestrator};
use atelier::sandbox::domain::SandboxId;
use atelier::task::{
    domain::{ExternalTaskId, TaskStatus},
    services::UpdateTaskStatusRequest,
};
use chrono::TimeDelta;
use rstest::rstest;
use std::time::Duration;

const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn idle_running_task_is_moved_to_error(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "crunch numbers").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;

    orchestrator.clock.advance(TimeDelta::minutes(10));
    let reclaimed = orchestrator
        .tasks
        .sweep_stale_running_tasks(FIVE_MINUTES)
        .await
        .expect("sweep should succeed");

    assert_eq!(reclaimed, 1);
    let swept = orchestrator
        .tasks
        .get_task(&orchestrator.isolation, task.id())
        .await
        .expect("task lookup should succeed");
    assert_eq!(swept.status(), TaskStatus::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn recently_updated_task_survives_the_sweep(orchestrator: Orchestrator) {
    let stale_topic = orchestrator.topic("chat-1").await;
    let stale = orchestrator.new_task(&stale_topic, "old work").await;
    orchestrator.report(&stale, TaskStatus::Running, "sbx-1").await;

    orchestrator.clock.advance(TimeDelta::minutes(10));
    let fresh_topic = orchestrator.topic("chat-2").await;
    let fresh = orchestrator.new_task(&fresh_topic, "new work").await;
    orchestrator.report(&fresh, TaskStatus::Running, "sbx-2").await;

    let reclaimed = orchestrator
        .tasks
        .sweep_stale_running_tasks(FIVE_MINUTES)
        .await
        .expect("sweep should succeed");

    assert_eq!(reclaimed, 1);
    let untouched = orchestrator
        .tasks
        .get_task(&orchestrator.isolation, fresh.id())
        .await
        .expect("task lookup should succeed");
    assert_eq!(untouched.status(), TaskStatus::Running);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_running_reports_keep_a_task_alive(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "long job").await;
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;

    orchestrator.clock.advance(TimeDelta::minutes(4));
    orchestrator.report(&task, TaskStatus::Running, "sbx-1").await;
    orchestrator.clock.advance(TimeDelta::minutes(4));

    let reclaimed = orchestrator
        .tasks
        .sweep_stale_running_tasks(FIVE_MINUTES)
        .await
        .expect("sweep should succeed");

    assert_eq!(reclaimed, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_running_pings_keep_a_task_alive(orchestrator: Orchestrator) {
    let topic = orchestrator.topic("chat-1").await;
    let task = orchestrator.new_task(&topic, "long job").await;
    let external = ExternalTaskId::new("ext-1").expect("valid external id");
    orchestrator
        .tasks
        .update_task_status(
            &orchestrator.isolation,
            UpdateTaskStatusRequest::new(topic.id(), task.id(), TaskStatus::Running)
                .with_sandbox_id(SandboxId::new("sbx-1").expect("valid sandbox id"))
                .with_external_task_id(external.clone()),
        )
        .await
        .expect("start should apply");

    orchestrator.clock.advance(TimeDelta::minutes(4));
    let refreshed = orchestrator
        .tasks
        .update_task_status_by_external_id(&external, TaskStatus::Running)
        .await
        .expect("ping should apply");
    orchestrator.clock.advance(TimeDelta::minutes(4));

    let reclaimed = orchestrator
        .tasks
        .sweep_stale_running_tasks(FIVE_MINUTES)
        .await
        .expect("sweep should succeed");

    assert!(refreshed);
    assert_eq!(reclaimed, 0);
}
