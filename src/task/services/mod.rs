//! Application services for task orchestration.

mod domain_service;
mod requests;

pub use domain_service::{TaskDomainService, TaskServiceError, TaskServiceResult};
pub use requests::{
    AiMessageRequest, InitTopicTaskRequest, RegisterTaskFileRequest, UpdateTaskStatusRequest,
};
