//! In-memory wiring shared by the service unit tests.

use std::sync::Arc;

use crate::isolation::DataIsolation;
use crate::sandbox::{
    adapters::{InMemorySandboxGateway, ScriptedConnector, ScriptedReply},
    services::InterruptDispatcher,
};
use crate::task::{
    adapters::memory::{
        InMemoryTaskFileRepository, InMemoryTaskMessageRepository, InMemoryTaskRepository,
    },
    services::TaskDomainService,
};
use crate::topic::{
    adapters::memory::InMemoryTopicRepository,
    domain::{ChatBinding, Topic, TopicName},
    ports::TopicRepository,
    services::TopicDomainService,
};
use crate::workspace::{
    adapters::memory::InMemoryWorkspaceRepository,
    domain::{Workspace, WorkspaceName},
    ports::WorkspaceRepository,
    services::WorkspaceDomainService,
};
use mockable::DefaultClock;
use serde_json::json;
use std::time::Duration;

pub(crate) type TestService = TaskDomainService<DefaultClock>;

/// In-memory wiring with handles on every adapter.
pub(crate) struct Harness {
    pub(crate) service: Arc<TestService>,
    pub(crate) topic_service: TopicDomainService<DefaultClock>,
    pub(crate) workspace_service: WorkspaceDomainService<DefaultClock>,
    pub(crate) tasks: InMemoryTaskRepository,
    pub(crate) files: InMemoryTaskFileRepository,
    pub(crate) messages: InMemoryTaskMessageRepository,
    pub(crate) topics: InMemoryTopicRepository,
    pub(crate) workspaces: InMemoryWorkspaceRepository,
    pub(crate) gateway: InMemorySandboxGateway,
    pub(crate) connector: ScriptedConnector,
    pub(crate) isolation: DataIsolation,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let tasks = InMemoryTaskRepository::new();
        let files = InMemoryTaskFileRepository::new();
        let messages = InMemoryTaskMessageRepository::new();
        let topics = InMemoryTopicRepository::new();
        let workspaces = InMemoryWorkspaceRepository::new();
        let gateway = InMemorySandboxGateway::new();
        let connector = ScriptedConnector::new(ScriptedReply::Acknowledge(
            json!({"type": "interrupt_ack"}),
        ));
        let service = Arc::new(TaskDomainService::new(
            Arc::new(tasks.clone()),
            Arc::new(files.clone()),
            Arc::new(messages.clone()),
            Arc::new(topics.clone()),
            Arc::new(workspaces.clone()),
            InterruptDispatcher::new(
                Arc::new(gateway.clone()),
                Arc::new(connector.clone()),
                Duration::from_secs(1),
            ),
            Arc::new(DefaultClock),
        ));
        let topic_service = TopicDomainService::new(
            Arc::new(topics.clone()),
            Arc::new(workspaces.clone()),
            Arc::clone(&service),
            Arc::new(DefaultClock),
        );
        let workspace_service = WorkspaceDomainService::new(
            Arc::new(workspaces.clone()),
            Arc::new(topics.clone()),
            Arc::clone(&service),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            topic_service,
            workspace_service,
            tasks,
            files,
            messages,
            topics,
            workspaces,
            gateway,
            connector,
            isolation: DataIsolation::from_parts("usi_1", "DT001").expect("valid isolation"),
        }
    }

    /// Stores a workspace and a topic bound to `chat_topic_id`.
    pub(crate) async fn seed_topic(&self, chat_topic_id: &str) -> (Workspace, Topic) {
        let workspace = Workspace::new(
            &self.isolation,
            WorkspaceName::new("Research").expect("valid workspace name"),
            &DefaultClock,
        );
        self.workspaces
            .store(&workspace)
            .await
            .expect("workspace store should succeed");
        let topic = Topic::new(
            &self.isolation,
            workspace.id(),
            ChatBinding::from_parts("conv-1", chat_topic_id).expect("valid chat binding"),
            TopicName::new("Quarterly report").expect("valid topic name"),
            &DefaultClock,
        );
        self.topics
            .store(&topic)
            .await
            .expect("topic store should succeed");
        (workspace, topic)
    }
}
