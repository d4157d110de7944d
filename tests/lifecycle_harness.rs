//! Library-level tests driving the harness against a fake Maven.
#![cfg(unix)]

mod common;

use common::maven::{MavenProject, SUITE, write};
use common::test_log;
use maven_itf::ItfError;
use maven_itf::config::HarnessConfig;
use maven_itf::lifecycle::{Harness, LifecycleState};
use maven_itf::model::{
    CacheMode, CacheResult, CaseDirectives, ExecutionResult, MavenLog, SuiteDirectives,
    TestUnitIdentity,
};
use std::time::Duration;

fn harness(project: &MavenProject) -> Harness {
    Harness::new(
        HarnessConfig::for_project(&project.root)
            .with_build_tool_home(&project.maven_home)
            .with_timeout(Some(Duration::from_secs(20))),
    )
}

#[test]
fn stepwise_lifecycle_with_seeded_cache() {
    let _log = test_log("stepwise_lifecycle_with_seeded_cache");
    let project = MavenProject::new();
    project.add_case("first", &[]);
    write(
        &project.root.join("target/invoker-repo/org/seed/seed/1/seed-1.pom"),
        "<project/>",
    );

    let harness = harness(&project);
    let suite = SuiteDirectives::new(SUITE).with_goals(["verify"]);
    let case = CaseDirectives::new("first");
    let mut unit = harness.unit(&suite, &case);
    assert_eq!(unit.state(), LifecycleState::Initial);

    let cache_dir = unit.provision().unwrap().cache_dir.clone();
    let report = unit.materialize().unwrap();
    assert_eq!(report.project_files, 2);
    assert_eq!(report.cache_files, 1);
    assert!(cache_dir.join("org/seed/seed/1/seed-1.pom").is_file());

    let output = unit.execute().unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("[INFO] args: -Dmaven.repo.local="));

    let result = unit.assemble().unwrap();
    result.assert_successful();
    assert_eq!(result.project.model.artifact_id.as_deref(), Some("demo"));
    assert!(result.project.has_target_file("out.txt"));
    assert!(result.cache.contains_artifact("com.example", "demo", "1.0"));
    assert!(result.cache.contains_artifact("org.seed", "seed", "1"));
    assert_eq!(unit.state(), LifecycleState::Resulted);
}

#[test]
fn shared_cache_carries_artifacts_between_cases() {
    let _log = test_log("shared_cache_carries_artifacts_between_cases");
    let project = MavenProject::new();
    project.add_case("first", &[]);
    project.add_case("second", &["fail.marker"]);

    let harness = harness(&project);
    let suite = SuiteDirectives::new(SUITE)
        .with_goals(["install"])
        .with_cache_mode(CacheMode::Shared);

    harness
        .run(&suite, &CaseDirectives::new("first"))
        .unwrap()
        .assert_successful();

    // The second build fails before touching the repository.
    let second = harness.run(&suite, &CaseDirectives::new("second")).unwrap();
    second.assert_failure();
    assert_eq!(second.exit_code, 3);
    assert!(second.log.contains_error("BUILD FAILURE"));
    assert!(second.cache.contains_artifact("com.example", "demo", "1.0"));
}

#[test]
fn per_case_caches_are_isolated() {
    let _log = test_log("per_case_caches_are_isolated");
    let project = MavenProject::new();
    project.add_case("first", &[]);
    project.add_case("second", &["fail.marker"]);

    let harness = harness(&project);
    let suite = SuiteDirectives::new(SUITE).with_goals(["install"]);
    let first = harness.run(&suite, &CaseDirectives::new("first")).unwrap();
    let second = harness.run(&suite, &CaseDirectives::new("second")).unwrap();

    assert_ne!(first.cache.cache_dir, second.cache.cache_dir);
    assert!(!second.cache.contains_artifact("com.example", "demo", "1.0"));
}

#[test]
fn concurrent_units_share_one_store() {
    let _log = test_log("concurrent_units_share_one_store");
    let project = MavenProject::new();
    let cases = ["alpha", "beta", "gamma", "delta"];
    for case in cases {
        project.add_case(case, &[]);
    }

    let harness = harness(&project);
    let suite = SuiteDirectives::new(SUITE).with_goals(["verify"]);
    std::thread::scope(|scope| {
        for case in cases {
            let harness = &harness;
            let suite = &suite;
            scope.spawn(move || {
                harness
                    .run(suite, &CaseDirectives::new(case))
                    .unwrap()
                    .assert_successful();
            });
        }
    });

    assert_eq!(harness.store().len(), cases.len());
    for case in cases {
        let identity = TestUnitIdentity::new(SUITE, case);
        let log: MavenLog = harness.store().get(&identity).unwrap();
        assert!(log.contains_info(&format!("BasicIT/{case}/project")));
        let cache: CacheResult = harness.store().get(&identity).unwrap();
        assert!(cache.cache_dir.ends_with(format!("{case}/.m2/repository")));
    }
}

#[test]
fn results_are_unavailable_until_assembled() {
    let _log = test_log("results_are_unavailable_until_assembled");
    let project = MavenProject::new();
    project.add_case("first", &[]);

    let harness = harness(&project);
    let suite = SuiteDirectives::new(SUITE).with_goals(["verify"]);
    let case = CaseDirectives::new("first");
    let identity = TestUnitIdentity::new(SUITE, "first");

    let mut unit = harness.unit(&suite, &case);
    unit.provision().unwrap();
    unit.materialize().unwrap();
    unit.execute().unwrap();

    let err = harness.store().get::<ExecutionResult>(&identity).unwrap_err();
    assert!(matches!(err, ItfError::ResultNotAvailable { .. }));

    unit.assemble().unwrap();
    assert!(harness.store().get::<ExecutionResult>(&identity).is_ok());
}

#[test]
fn timeout_reports_the_limit() {
    let _log = test_log("timeout_reports_the_limit");
    let project = MavenProject::new();
    project.add_case("slow", &["sleep.marker"]);

    let harness = Harness::new(
        HarnessConfig::for_project(&project.root)
            .with_build_tool_home(&project.maven_home)
            .with_timeout(Some(Duration::from_millis(300))),
    );
    let suite = SuiteDirectives::new(SUITE).with_goals(["verify"]);
    let start = std::time::Instant::now();
    let err = harness.run(&suite, &CaseDirectives::new("slow")).unwrap_err();

    assert!(matches!(err, ItfError::Timeout { .. }), "{err:?}");
    assert!(start.elapsed() < Duration::from_secs(20));
    assert!(harness.store().is_empty());
}

#[test]
fn timeout_stops_processes_forked_by_the_launcher() {
    let _log = test_log("timeout_stops_processes_forked_by_the_launcher");
    let project = MavenProject::new();
    project.add_case("forking", &["fork.marker"]);

    let harness = Harness::new(
        HarnessConfig::for_project(&project.root)
            .with_build_tool_home(&project.maven_home)
            .with_timeout(Some(Duration::from_millis(500))),
    );
    let suite = SuiteDirectives::new(SUITE).with_goals(["verify"]);
    let case = CaseDirectives::new("forking");
    let mut unit = harness.unit(&suite, &case);
    let project_dir = unit.provision().unwrap().project_dir.clone();
    unit.materialize().unwrap();

    let err = unit.execute().unwrap_err();
    assert!(matches!(err, ItfError::Timeout { .. }), "{err:?}");

    std::thread::sleep(Duration::from_secs(3));
    assert!(
        !project_dir.join("leaked.txt").exists(),
        "a forked build process kept writing into the project"
    );
}
