//! Then steps for topic deletion BDD scenarios.

use super::world::{TopicDeletionWorld, run_async};
use atelier::task::{domain::TaskStatus, services::TaskServiceError};
use atelier::topic::services::TopicServiceError;
use eyre::WrapErr;
use rstest_bdd_macros::then;

#[then("the deletion succeeds with {count:u64} deleted task")]
fn deletion_succeeds(world: &TopicDeletionWorld, count: u64) -> Result<(), eyre::Report> {
    let result = world
        .deletion_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing deletion result"))?;
    match result {
        Ok(deleted) if *deleted == count => Ok(()),
        other => Err(eyre::eyre!("expected {count} deleted tasks, got {other:?}")),
    }
}

#[then("the deletion fails with an interrupt timeout")]
fn deletion_fails_with_timeout(world: &TopicDeletionWorld) -> Result<(), eyre::Report> {
    let result = world
        .deletion_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing deletion result"))?;
    if !matches!(
        result,
        Err(TopicServiceError::Task(TaskServiceError::InterruptTimeout { .. }))
    ) {
        return Err(eyre::eyre!("expected InterruptTimeout error, got {result:?}"));
    }
    Ok(())
}

#[then("the topic is no longer visible")]
fn topic_not_visible(world: &TopicDeletionWorld) -> Result<(), eyre::Report> {
    let topic_id = world.topic()?.id();
    let lookup = run_async(world.topics.get_topic(&world.isolation, topic_id));
    if !matches!(lookup, Err(TopicServiceError::TopicNotFound(_))) {
        return Err(eyre::eyre!("expected topic to be hidden, got {lookup:?}"));
    }
    Ok(())
}

#[then("the topic is still visible")]
fn topic_still_visible(world: &TopicDeletionWorld) -> Result<(), eyre::Report> {
    let topic_id = world.topic()?.id();
    run_async(world.topics.get_topic(&world.isolation, topic_id))
        .wrap_err("topic should survive a refused deletion")?;
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TopicDeletionWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let task = run_async(world.tasks.get_task(&world.isolation, task_id))
        .wrap_err("reload task after deletion attempt")?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            task.status().as_str()
        ));
    }
    Ok(())
}

#[then("{count:usize} interrupts were sent")]
fn interrupts_sent(world: &TopicDeletionWorld, count: usize) -> Result<(), eyre::Report> {
    let sent = world
        .connector
        .sent_payloads()
        .wrap_err("read sent payloads")?
        .len();
    if sent != count {
        return Err(eyre::eyre!("expected {count} interrupts, found {sent}"));
    }
    Ok(())
}
