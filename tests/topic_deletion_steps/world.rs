//! Shared world state for topic deletion BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use atelier::isolation::DataIsolation;
use atelier::sandbox::{
    adapters::{InMemorySandboxGateway, ScriptedConnector, ScriptedReply},
    services::InterruptDispatcher,
};
use atelier::task::{
    adapters::memory::{
        InMemoryTaskFileRepository, InMemoryTaskMessageRepository, InMemoryTaskRepository,
    },
    domain::Task,
    services::TaskDomainService,
};
use atelier::topic::{
    adapters::memory::InMemoryTopicRepository,
    domain::Topic,
    services::{TopicDomainService, TopicServiceError},
};
use atelier::workspace::{
    adapters::memory::InMemoryWorkspaceRepository, services::WorkspaceDomainService,
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;

/// Scenario world for topic deletion behaviour tests.
pub struct TopicDeletionWorld {
    pub tasks: Arc<TaskDomainService<DefaultClock>>,
    pub topics: TopicDomainService<DefaultClock>,
    pub workspaces: WorkspaceDomainService<DefaultClock>,
    pub gateway: InMemorySandboxGateway,
    pub connector: ScriptedConnector,
    pub isolation: DataIsolation,
    pub topic: Option<Topic>,
    pub task: Option<Task>,
    pub deletion_result: Option<Result<u64, TopicServiceError>>,
}

impl TopicDeletionWorld {
    /// Creates a world wired to in-memory adapters.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let topic_rows = InMemoryTopicRepository::new();
        let workspace_rows = InMemoryWorkspaceRepository::new();
        let gateway = InMemorySandboxGateway::new();
        let connector = ScriptedConnector::new(ScriptedReply::Acknowledge(json!({
            "type": "interrupt_ack"
        })));

        let tasks = Arc::new(TaskDomainService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(InMemoryTaskFileRepository::new()),
            Arc::new(InMemoryTaskMessageRepository::new()),
            Arc::new(topic_rows.clone()),
            Arc::new(workspace_rows.clone()),
            InterruptDispatcher::new(
                Arc::new(gateway.clone()),
                Arc::new(connector.clone()),
                Duration::from_millis(200),
            ),
            Arc::clone(&clock),
        ));
        let topics = TopicDomainService::new(
            Arc::new(topic_rows.clone()),
            Arc::new(workspace_rows.clone()),
            Arc::clone(&tasks),
            Arc::clone(&clock),
        );
        let workspaces = WorkspaceDomainService::new(
            Arc::new(workspace_rows),
            Arc::new(topic_rows),
            Arc::clone(&tasks),
            clock,
        );

        Self {
            tasks,
            topics,
            workspaces,
            gateway,
            connector,
            isolation: DataIsolation::from_parts("usi_1", "DT001").expect("valid isolation"),
            topic: None,
            task: None,
            deletion_result: None,
        }
    }

    /// Returns the topic created by a given step.
    pub fn topic(&self) -> Result<&Topic, eyre::Report> {
        self.topic
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing topic in scenario world"))
    }

    /// Returns the task created by a given step.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TopicDeletionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TopicDeletionWorld {
    TopicDeletionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
