//! Unit tests for the sandbox module.
