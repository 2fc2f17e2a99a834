//! In-memory orchestration integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `task_flow_tests`: Instruction handling and status reports
//! - `file_registration_tests`: Idempotent registration by file key
//! - `stale_sweep_tests`: Reclaiming silent running tasks
//! - `deletion_tests`: Interrupt-then-delete and soft-delete cascades

mod in_memory {
    pub mod helpers;

    mod deletion_tests;
    mod file_registration_tests;
    mod stale_sweep_tests;
    mod task_flow_tests;
}
