//! Unit tests for the task module.

mod file_service_tests;
mod service_tests;
