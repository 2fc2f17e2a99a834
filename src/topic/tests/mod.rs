//! Unit tests for the topic module.

mod domain_tests;
