//! Unit tests for the workspace module.

mod domain_tests;
