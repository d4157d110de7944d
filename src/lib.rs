//! `maven_itf` - integration-test harness for Maven plugins.
//!
//! Every test unit (one case of one suite) gets its own directory tree, a
//! fresh copy of its fixture project and a private local repository. Maven is
//! run as a subprocess in that tree and everything it leaves behind (exit
//! code, output, project, repository) is packaged into an
//! [`ExecutionResult`](model::ExecutionResult).
//!
//! ```no_run
//! use maven_itf::config::HarnessConfig;
//! use maven_itf::lifecycle::Harness;
//! use maven_itf::model::{CaseDirectives, SuiteDirectives};
//!
//! # fn main() -> maven_itf::Result<()> {
//! let harness = Harness::new(HarnessConfig::for_project("."));
//! let suite = SuiteDirectives::new("com.example.BasicIT").with_goals(["verify"]);
//! let result = harness.run(&suite, &CaseDirectives::new("first"))?;
//! result.assert_successful();
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fixture;
pub mod invocation;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod process;
pub mod project;
pub mod provision;
pub mod resources;

pub use error::{ErrorCode, ItfError, Result, StructuredError};
