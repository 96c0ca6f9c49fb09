//! Library integration tests for lambdapack-lib.

mod workflow_tests;
