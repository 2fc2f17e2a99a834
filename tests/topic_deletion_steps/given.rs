//! Given steps for topic deletion BDD scenarios.

use super::world::{TopicDeletionWorld, run_async};
use atelier::sandbox::{
    adapters::ScriptedReply,
    domain::{SandboxId, SandboxStatus},
};
use atelier::task::{
    domain::TaskStatus,
    services::{InitTopicTaskRequest, UpdateTaskStatusRequest},
};
use atelier::topic::{domain::ChatBinding, services::CreateTopicRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a topic bound to chat topic "{chat_topic_id}""#)]
fn topic_bound_to_chat_topic(
    world: &mut TopicDeletionWorld,
    chat_topic_id: String,
) -> Result<(), eyre::Report> {
    let workspace = run_async(world.workspaces.ensure_default_workspace(&world.isolation))
        .wrap_err("ensure default workspace")?;
    let chat = ChatBinding::from_parts("conv-1", chat_topic_id)
        .map_err(|err| eyre::eyre!("invalid chat binding in scenario: {err}"))?;
    let topic = run_async(
        world
            .topics
            .create_topic(&world.isolation, CreateTopicRequest::new(workspace.id(), chat)),
    )
    .wrap_err("create topic for deletion scenario")?;
    world.topic = Some(topic);
    Ok(())
}

#[given(r#"a task on the topic running in sandbox "{sandbox_id}""#)]
fn running_task_in_sandbox(
    world: &mut TopicDeletionWorld,
    sandbox_id: String,
) -> Result<(), eyre::Report> {
    let topic = world.topic()?.clone();
    let sandbox = SandboxId::new(sandbox_id)
        .map_err(|err| eyre::eyre!("invalid sandbox id in scenario: {err}"))?;
    let created = run_async(world.tasks.init_topic_task(
        &world.isolation,
        InitTopicTaskRequest::new(topic.chat().topic_id().clone(), "summarise the quarter"),
    ))
    .wrap_err("create task for deletion scenario")?;
    let running = run_async(world.tasks.update_task_status(
        &world.isolation,
        UpdateTaskStatusRequest::new(topic.id(), created.id(), TaskStatus::Running)
            .with_sandbox_id(sandbox),
    ))
    .wrap_err("start task for deletion scenario")?;
    world.task = Some(running);
    Ok(())
}

#[given(r#"the task reports "{status}""#)]
fn task_reports(world: &mut TopicDeletionWorld, status: String) -> Result<(), eyre::Report> {
    let task = world.task()?.clone();
    let next = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid task status in scenario: {err}"))?;
    let updated = run_async(world.tasks.update_task_status(
        &world.isolation,
        UpdateTaskStatusRequest::new(task.topic_id(), task.id(), next),
    ))
    .wrap_err("report task status in scenario setup")?;
    world.task = Some(updated);
    Ok(())
}

#[given(r#"sandbox "{sandbox_id}" has status "{status}""#)]
fn sandbox_has_status(
    world: &mut TopicDeletionWorld,
    sandbox_id: String,
    status: String,
) -> Result<(), eyre::Report> {
    let sandbox = SandboxId::new(sandbox_id)
        .map_err(|err| eyre::eyre!("invalid sandbox id in scenario: {err}"))?;
    world
        .gateway
        .set_status(sandbox, SandboxStatus::from_wire(&status))
        .wrap_err("register sandbox status")?;
    Ok(())
}

#[given("the sandbox never answers")]
fn sandbox_never_answers(world: &mut TopicDeletionWorld) -> Result<(), eyre::Report> {
    world
        .connector
        .set_reply(ScriptedReply::Silent)
        .wrap_err("script silent sandbox")?;
    Ok(())
}
