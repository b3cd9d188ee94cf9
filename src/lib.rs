//! End-to-end test harness for the `kubectl-shovel` diagnostics plugin.
//!
//! Each [test_case::TestCase] describes a target pod topology and the extra arguments for the tool
//! under test. The [harness::Harness] deploys the pod, waits until it is ready, invokes the tool
//! and always deletes the pod afterwards.
pub mod args;
pub mod cases;
pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod k8s;
pub mod logging;
pub mod staging;
pub mod subject;
pub mod test_case;
pub mod topology;
