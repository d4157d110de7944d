//! Test unit lifecycle.
//!
//! A [`TestUnit`] walks through
//! `Initial → Provisioned → Materialized → Executed → Resulted`.
//! Each step requires the state before it. A failed step leaves the unit where
//! it was and nothing is retried. Finished results land in the harness'
//! [`ResultStore`], where test bodies pick up the projection they need.

use crate::config::HarnessConfig;
use crate::error::{ItfError, Result};
use crate::fixture::{
    self, CacheSeedLocator, DirectoryCacheSeedLocator, DirectoryFixtureLocator, FixtureLocator,
    MaterializeReport,
};
use crate::invocation::InvocationSpec;
use crate::model::{
    CacheResult, CaseDirectives, DirectorySet, ExecutionResult, MavenLog, ProjectResult,
    ResolvedResult, ResultKind, ResultProjection, SuiteDirectives, TestUnitIdentity,
};
use crate::process::{self, CommandSpec, DefaultProcessRunner, ProcessOutput, ProcessRunner};
use crate::project::{POM_FILE, PomParser, ProjectModel, ProjectModelParser};
use crate::provision;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Where a test unit is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Initial,
    Provisioned,
    Materialized,
    Executed,
    Resulted,
}

impl LifecycleState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Provisioned => "provisioned",
            Self::Materialized => "materialized",
            Self::Executed => "executed",
            Self::Resulted => "resulted",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finished results keyed by test unit, shareable between threads.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Mutex<HashMap<TestUnitIdentity, ExecutionResult>>,
}

impl ResultStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity: TestUnitIdentity, result: ExecutionResult) {
        self.lock().insert(identity, result);
    }

    /// Projection of the stored result selected by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::ResultNotAvailable`] if the unit has no result.
    pub fn resolve(&self, identity: &TestUnitIdentity, kind: ResultKind) -> Result<ResolvedResult> {
        self.lock()
            .get(identity)
            .map(|result| kind.project(result))
            .ok_or_else(|| ItfError::ResultNotAvailable {
                identity: identity.clone(),
                kind,
            })
    }

    /// Typed lookup: `store.get::<MavenLog>(&id)`.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::ResultNotAvailable`] if the unit has no result.
    pub fn get<T: ResultProjection>(&self, identity: &TestUnitIdentity) -> Result<T> {
        self.lock()
            .get(identity)
            .map(T::from_result)
            .ok_or_else(|| ItfError::ResultNotAvailable {
                identity: identity.clone(),
                kind: T::KIND,
            })
    }

    /// End the scope of a unit, returning its result if it had one.
    pub fn remove(&self, identity: &TestUnitIdentity) -> Option<ExecutionResult> {
        self.lock().remove(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TestUnitIdentity, ExecutionResult>> {
        // Entries are only ever inserted or removed whole.
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collaborators shared by every test unit of a run.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    fixtures: Box<dyn FixtureLocator>,
    seeds: Box<dyn CacheSeedLocator>,
    parser: Box<dyn ProjectModelParser>,
    runner: Box<dyn ProcessRunner>,
    store: Arc<ResultStore>,
}

impl Harness {
    /// Harness with directory-based locators, the `pom.xml` parser and real processes.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            fixtures: Box::new(DirectoryFixtureLocator::new(config.fixtures_dir.clone())),
            seeds: Box::new(DirectoryCacheSeedLocator::new(config.cache_seed_dir.clone())),
            parser: Box::new(PomParser),
            runner: Box::new(DefaultProcessRunner),
            store: Arc::new(ResultStore::new()),
            config,
        }
    }

    #[must_use]
    pub fn with_fixture_locator(mut self, locator: impl FixtureLocator + 'static) -> Self {
        self.fixtures = Box::new(locator);
        self
    }

    #[must_use]
    pub fn with_seed_locator(mut self, locator: impl CacheSeedLocator + 'static) -> Self {
        self.seeds = Box::new(locator);
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: impl ProjectModelParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: impl ProcessRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<ResultStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// A fresh unit for step-wise driving.
    #[must_use]
    pub fn unit(&self, suite: &SuiteDirectives, case: &CaseDirectives) -> TestUnit<'_> {
        TestUnit {
            harness: self,
            identity: TestUnitIdentity::new(&suite.qualified_name, &case.name),
            suite: suite.clone(),
            case: case.clone(),
            state: LifecycleState::Initial,
            dirs: None,
            output: None,
            result: None,
        }
    }

    /// Drive one unit through every step and store its result.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step. A build that ran but
    /// exited non-zero is not an error.
    pub fn run(&self, suite: &SuiteDirectives, case: &CaseDirectives) -> Result<ExecutionResult> {
        let mut unit = self.unit(suite, case);
        info!(unit = %unit.identity, "Starting test unit");
        unit.provision()?;
        unit.materialize()?;
        unit.execute()?;
        let result = unit.assemble()?.clone();
        info!(
            unit = %unit.identity,
            outcome = %result.outcome,
            exit_code = result.exit_code,
            "Finished test unit"
        );
        Ok(result)
    }
}

/// One test case of one suite, moving through its lifecycle.
#[derive(Debug)]
pub struct TestUnit<'h> {
    harness: &'h Harness,
    identity: TestUnitIdentity,
    suite: SuiteDirectives,
    case: CaseDirectives,
    state: LifecycleState,
    dirs: Option<DirectorySet>,
    output: Option<ProcessOutput>,
    result: Option<ExecutionResult>,
}

impl TestUnit<'_> {
    #[must_use]
    pub const fn identity(&self) -> &TestUnitIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub const fn directories(&self) -> Option<&DirectorySet> {
        self.dirs.as_ref()
    }

    /// `Initial → Provisioned`: create the unit's directories.
    ///
    /// # Errors
    ///
    /// Fails when called out of order, for an unusable identity, or on I/O errors.
    pub fn provision(&mut self) -> Result<&DirectorySet> {
        self.expect_state(LifecycleState::Initial)?;
        let dirs = provision::provision(
            &self.identity,
            self.suite.cache_mode,
            &self.harness.config.it_dir,
        )?;
        self.state = LifecycleState::Provisioned;
        Ok(&*self.dirs.insert(dirs))
    }

    /// `Provisioned → Materialized`: copy the fixture and seed the cache.
    ///
    /// # Errors
    ///
    /// Fails when called out of order, when the fixture is missing, or on I/O errors.
    pub fn materialize(&mut self) -> Result<MaterializeReport> {
        self.expect_state(LifecycleState::Provisioned)?;
        let dirs = self.dirs()?;
        let source = self.harness.fixtures.locate(&self.identity);
        let seed = self.harness.seeds.locate(self.identity.suite());
        let report = fixture::materialize(&source, &dirs.project_dir, seed.as_deref(), &dirs.cache_dir)?;
        self.state = LifecycleState::Materialized;
        Ok(report)
    }

    /// `Materialized → Executed`: build the command line and run Maven.
    ///
    /// Goals are checked before the executable is resolved, so a unit
    /// without goals never launches anything.
    ///
    /// # Errors
    ///
    /// Fails when called out of order, without goals, without an executable,
    /// or when the process cannot be run to completion.
    pub fn execute(&mut self) -> Result<&ProcessOutput> {
        self.expect_state(LifecycleState::Materialized)?;
        let dirs = self.dirs()?;
        let config = &self.harness.config;

        let invocation =
            InvocationSpec::resolve(&self.suite, &self.case, &dirs.cache_dir, &config.extra_flags)?;
        let executable = process::resolve_executable(
            config.build_tool_home.as_deref(),
            config.default_build_tool_home.as_deref(),
        )?;
        let command = CommandSpec::new(&executable, &invocation.arguments(), &dirs.project_dir);

        let output = self.harness.runner.run(&command, config.timeout)?;
        debug!(
            unit = %self.identity,
            exit_code = output.exit_code,
            elapsed_ms = output.duration.as_millis(),
            "Build finished"
        );
        self.state = LifecycleState::Executed;
        Ok(&*self.output.insert(output))
    }

    /// `Executed → Resulted`: package the observations and store them.
    ///
    /// # Errors
    ///
    /// Fails when called out of order or when the project descriptor is malformed.
    pub fn assemble(&mut self) -> Result<&ExecutionResult> {
        self.expect_state(LifecycleState::Executed)?;
        let dirs = self.dirs()?.clone();
        let Some(output) = self.output.as_ref() else {
            return Err(self.out_of_order(LifecycleState::Executed));
        };

        let model = if dirs.project_dir.join(POM_FILE).is_file() {
            self.harness.parser.parse(&dirs.project_dir)?
        } else {
            debug!(unit = %self.identity, "Project has no descriptor; using an empty model");
            ProjectModel::default()
        };

        let result = ExecutionResult::assemble(
            output.exit_code,
            MavenLog::new(output.stdout.clone(), output.stderr.clone()),
            CacheResult::new(dirs.cache_dir),
            ProjectResult {
                base_dir: dirs.case_dir,
                project_dir: dirs.project_dir,
                model,
            },
        );

        self.harness
            .store
            .insert(self.identity.clone(), result.clone());
        self.state = LifecycleState::Resulted;
        Ok(&*self.result.insert(result))
    }

    fn dirs(&self) -> Result<&DirectorySet> {
        self.dirs
            .as_ref()
            .ok_or_else(|| self.out_of_order(LifecycleState::Provisioned))
    }

    fn expect_state(&self, expected: LifecycleState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.out_of_order(expected))
        }
    }

    fn out_of_order(&self, expected: LifecycleState) -> ItfError {
        ItfError::LifecycleOutOfOrder {
            identity: self.identity.clone(),
            expected: expected.as_str(),
            actual: self.state.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CacheMode;
    use crate::process::executable_in;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    const SUITE: &str = "com.example.BasicIT";

    /// Records every command instead of launching it.
    #[derive(Debug, Default)]
    struct RecordingRunner {
        exit_code: i32,
        timeout: bool,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl ProcessRunner for RecordingRunner {
        fn run(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<ProcessOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            if self.timeout {
                return Err(ItfError::Timeout {
                    command: spec.to_string(),
                    timeout: timeout.unwrap_or_default(),
                });
            }
            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: "[INFO] BUILD DONE\n".to_string(),
                stderr: String::new(),
                duration: Duration::from_millis(5),
            })
        }
    }

    struct Fixture {
        temp: TempDir,
        config: HarnessConfig,
    }

    impl Fixture {
        fn new(cases: &[&str]) -> Self {
            let temp = TempDir::new().expect("temp dir");
            let maven_home = temp.path().join("maven");
            fs::create_dir_all(maven_home.join("bin")).unwrap();
            fs::write(executable_in(&maven_home), "").unwrap();

            let config = HarnessConfig::for_project(temp.path()).with_build_tool_home(&maven_home);
            for case in cases {
                let dir = config
                    .fixtures_dir
                    .join(provision::suite_path(SUITE))
                    .join(case);
                fs::create_dir_all(&dir).unwrap();
                fs::write(
                    dir.join(POM_FILE),
                    "<project><groupId>com.example</groupId><artifactId>demo</artifactId><version>1.0</version></project>",
                )
                .unwrap();
            }
            Self { temp, config }
        }

        fn harness(&self, runner: RecordingRunner) -> Harness {
            Harness::new(self.config.clone()).with_runner(runner)
        }
    }

    fn suite() -> SuiteDirectives {
        SuiteDirectives::new(SUITE).with_goals(["verify"])
    }

    #[test]
    fn run_stores_successful_result() {
        let fixture = Fixture::new(&["first"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let harness = fixture.harness(RecordingRunner {
            calls: Arc::clone(&calls),
            ..RecordingRunner::default()
        });

        let result = harness.run(&suite(), &CaseDirectives::new("first")).unwrap();
        assert!(result.is_successful());
        assert_eq!(result.project.model.artifact_id.as_deref(), Some("demo"));
        assert!(result.project.project_dir.join(POM_FILE).is_file());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cwd, result.project.project_dir);
        assert_eq!(calls[0].args.last().map(String::as_str), Some("verify"));
        assert!(
            calls[0].args[0].ends_with(".m2/repository"),
            "first argument was {}",
            calls[0].args[0]
        );

        let id = TestUnitIdentity::new(SUITE, "first");
        let log: MavenLog = harness.store().get(&id).unwrap();
        assert!(log.contains_info("BUILD DONE"));
        assert_eq!(
            harness.store().resolve(&id, ResultKind::Cache).unwrap(),
            ResolvedResult::Cache(result.cache.clone())
        );
    }

    #[test]
    fn non_zero_exit_is_failure_outcome() {
        let fixture = Fixture::new(&["first"]);
        let harness = fixture.harness(RecordingRunner {
            exit_code: 1,
            ..RecordingRunner::default()
        });

        let result = harness.run(&suite(), &CaseDirectives::new("first")).unwrap();
        assert!(result.is_failure());
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn shared_cache_is_the_same_directory_for_every_case() {
        let fixture = Fixture::new(&["first", "second"]);
        let harness = fixture.harness(RecordingRunner::default());
        let suite = suite().with_cache_mode(CacheMode::Shared);

        let first = harness.run(&suite, &CaseDirectives::new("first")).unwrap();
        let second = harness.run(&suite, &CaseDirectives::new("second")).unwrap();
        assert_eq!(first.cache.cache_dir, second.cache.cache_dir);
        assert_ne!(first.project.project_dir, second.project.project_dir);
    }

    #[test]
    fn lookup_before_result_fails() {
        let fixture = Fixture::new(&["first"]);
        let harness = fixture.harness(RecordingRunner::default());
        let mut unit = harness.unit(&suite(), &CaseDirectives::new("first"));
        unit.provision().unwrap();
        unit.materialize().unwrap();

        let err = harness
            .store()
            .get::<ProjectResult>(unit.identity())
            .unwrap_err();
        assert!(matches!(
            err,
            ItfError::ResultNotAvailable {
                kind: ResultKind::Project,
                ..
            }
        ));
    }

    #[test]
    fn steps_out_of_order_leave_state_unchanged() {
        let fixture = Fixture::new(&["first"]);
        let harness = fixture.harness(RecordingRunner::default());
        let mut unit = harness.unit(&suite(), &CaseDirectives::new("first"));

        let err = unit.execute().unwrap_err();
        assert!(matches!(
            err,
            ItfError::LifecycleOutOfOrder {
                expected: "materialized",
                actual: "initial",
                ..
            }
        ));
        assert_eq!(unit.state(), LifecycleState::Initial);

        unit.provision().unwrap();
        assert!(unit.provision().is_err());
        assert_eq!(unit.state(), LifecycleState::Provisioned);
    }

    #[test]
    fn no_goals_fails_before_launch() {
        let fixture = Fixture::new(&["first"]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let harness = fixture.harness(RecordingRunner {
            calls: Arc::clone(&calls),
            ..RecordingRunner::default()
        });

        let err = harness
            .run(&SuiteDirectives::new(SUITE), &CaseDirectives::new("first"))
            .unwrap_err();
        assert!(matches!(err, ItfError::NoGoalsSpecified { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_executable_is_reported() {
        let fixture = Fixture::new(&["first"]);
        let mut config = fixture.config.clone();
        config.build_tool_home = Some(fixture.temp.path().join("nowhere"));
        let harness = Harness::new(config).with_runner(RecordingRunner::default());

        let err = harness.run(&suite(), &CaseDirectives::new("first")).unwrap_err();
        assert!(matches!(err, ItfError::ExecutableNotFound { .. }));
    }

    #[test]
    fn missing_fixture_is_reported() {
        let fixture = Fixture::new(&[]);
        let harness = fixture.harness(RecordingRunner::default());
        let err = harness.run(&suite(), &CaseDirectives::new("absent")).unwrap_err();
        assert!(matches!(err, ItfError::FixtureNotFound { .. }));
    }

    #[test]
    fn timeout_is_an_error_not_a_failure() {
        let fixture = Fixture::new(&["first"]);
        let harness = fixture.harness(RecordingRunner {
            timeout: true,
            ..RecordingRunner::default()
        });
        let mut unit = harness.unit(&suite(), &CaseDirectives::new("first"));
        unit.provision().unwrap();
        unit.materialize().unwrap();

        assert!(matches!(unit.execute(), Err(ItfError::Timeout { .. })));
        assert_eq!(unit.state(), LifecycleState::Materialized);
        assert!(harness.store().is_empty());
    }

    #[test]
    fn removing_a_result_ends_its_scope() {
        let fixture = Fixture::new(&["first"]);
        let harness = fixture.harness(RecordingRunner::default());
        harness.run(&suite(), &CaseDirectives::new("first")).unwrap();

        let id = TestUnitIdentity::new(SUITE, "first");
        assert!(harness.store().remove(&id).is_some());
        assert!(harness.store().get::<ExecutionResult>(&id).is_err());
    }

    #[test]
    fn project_without_descriptor_gets_empty_model() {
        let fixture = Fixture::new(&[]);
        let dir: PathBuf = fixture
            .config
            .fixtures_dir
            .join(provision::suite_path(SUITE))
            .join("bare");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("README"), "no pom here").unwrap();

        let harness = fixture.harness(RecordingRunner::default());
        let result = harness.run(&suite(), &CaseDirectives::new("bare")).unwrap();
        assert_eq!(result.project.model, ProjectModel::default());
        assert!(Path::new(&result.project.project_dir).join("README").is_file());
    }
}
