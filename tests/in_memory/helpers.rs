//! Shared test helpers for in-memory orchestration integration tests.

use atelier::isolation::DataIsolation;
use atelier::sandbox::{
    adapters::{InMemorySandboxGateway, ScriptedConnector, ScriptedReply},
    domain::SandboxId,
    services::InterruptDispatcher,
};
use atelier::task::{
    adapters::memory::{
        InMemoryTaskFileRepository, InMemoryTaskMessageRepository, InMemoryTaskRepository,
    },
    domain::{Task, TaskStatus},
    services::{InitTopicTaskRequest, TaskDomainService, UpdateTaskStatusRequest},
};
use atelier::topic::{
    adapters::memory::InMemoryTopicRepository,
    domain::{ChatBinding, Topic},
    services::{CreateTopicRequest, TopicDomainService},
};
use atelier::workspace::{
    adapters::memory::InMemoryWorkspaceRepository, services::WorkspaceDomainService,
};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Clock that only moves when a test advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current wall time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fully wired in-memory orchestration core.
pub struct Orchestrator {
    pub clock: Arc<ManualClock>,
    pub tasks: Arc<TaskDomainService<ManualClock>>,
    pub topics: TopicDomainService<ManualClock>,
    pub workspaces: WorkspaceDomainService<ManualClock>,
    pub task_rows: InMemoryTaskRepository,
    pub file_rows: InMemoryTaskFileRepository,
    pub topic_rows: InMemoryTopicRepository,
    pub gateway: InMemorySandboxGateway,
    pub connector: ScriptedConnector,
    pub isolation: DataIsolation,
}

/// Provides a fresh orchestrator for each test.
#[fixture]
pub fn orchestrator() -> Orchestrator {
    let clock = Arc::new(ManualClock::new());
    let task_rows = InMemoryTaskRepository::new();
    let file_rows = InMemoryTaskFileRepository::new();
    let topic_rows = InMemoryTopicRepository::new();
    let workspace_rows = InMemoryWorkspaceRepository::new();
    let gateway = InMemorySandboxGateway::new();
    let connector = ScriptedConnector::new(ScriptedReply::Acknowledge(json!({
        "type": "interrupt_ack"
    })));

    let tasks = Arc::new(TaskDomainService::new(
        Arc::new(task_rows.clone()),
        Arc::new(file_rows.clone()),
        Arc::new(InMemoryTaskMessageRepository::new()),
        Arc::new(topic_rows.clone()),
        Arc::new(workspace_rows.clone()),
        InterruptDispatcher::new(
            Arc::new(gateway.clone()),
            Arc::new(connector.clone()),
            Duration::from_secs(1),
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
        Arc::new(topic_rows.clone()),
        Arc::clone(&tasks),
        Arc::clone(&clock),
    );

    Orchestrator {
        clock,
        tasks,
        topics,
        workspaces,
        task_rows,
        file_rows,
        topic_rows,
        gateway,
        connector,
        isolation: DataIsolation::from_parts("usi_1", "DT001").expect("valid isolation"),
    }
}

impl Orchestrator {
    /// Creates a topic bound to `chat_topic_id` in the caller's default
    /// workspace.
    pub async fn topic(&self, chat_topic_id: &str) -> Topic {
        let workspace = self
            .workspaces
            .ensure_default_workspace(&self.isolation)
            .await
            .expect("default workspace should be available");
        self.topics
            .create_topic(
                &self.isolation,
                CreateTopicRequest::new(
                    workspace.id(),
                    ChatBinding::from_parts("conv-1", chat_topic_id).expect("valid binding"),
                ),
            )
            .await
            .expect("topic creation should succeed")
    }

    /// Creates a waiting task on `topic` with the normal instruction.
    pub async fn new_task(&self, topic: &Topic, prompt: &str) -> Task {
        self.tasks
            .init_topic_task(
                &self.isolation,
                InitTopicTaskRequest::new(topic.chat().topic_id().clone(), prompt),
            )
            .await
            .expect("task creation should succeed")
    }

    /// Reports `status` for `task` from sandbox `sandbox_id`.
    pub async fn report(&self, task: &Task, status: TaskStatus, sandbox_id: &str) -> Task {
        self.tasks
            .update_task_status(
                &self.isolation,
                UpdateTaskStatusRequest::new(task.topic_id(), task.id(), status)
                    .with_sandbox_id(SandboxId::new(sandbox_id).expect("valid sandbox id")),
            )
            .await
            .expect("status report should apply")
    }
}
