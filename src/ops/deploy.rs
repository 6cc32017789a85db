//! Implementation of a deploy run.
//!
//! A run moves through these phases:
//!
//! ```text
//! Idle -> Planning -> CompilingDependencies -> Deploying -> Done
//!             \______________\_____________________\______-> Failed
//! ```
//!
//! Every classpath module accepted by the must-compile policy is packaged as
//! a dependency library first, in classpath order. The main target is then
//! deployed for all selected platforms while the package manifest lists
//! those libraries. The manifest is restored whether or not that succeeds.

use std::cell::Cell;

use serde::Serialize;

use crate::builder::invoker::DeployInvoker;
use crate::builder::manifest::ManifestTransaction;
use crate::core::classpath::ClasspathResolver;
use crate::core::config::BuildConfiguration;
use crate::core::naming::{to_library_artifact_name, to_manifest_reference_name};
use crate::core::platform::PlatformTarget;
use crate::util::errors::{DeployError, DeployResult};
use crate::util::process::{ProcessRunner, SystemRunner};

/// Phase of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPhase {
    Idle,
    Planning,
    CompilingDependencies,
    Deploying,
    Done,
    Failed,
}

/// What a planned packager call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationKind {
    /// A dependency library compiled from one classpath module.
    Dependency,
    /// The main target, for every selected platform.
    Main,
}

/// One packager call, as it would be run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInvocation {
    pub kind: InvocationKind,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    pub program: String,
    pub args: Vec<String>,
    pub platforms: Vec<PlatformTarget>,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Libraries generated, in generation order.
    pub libraries: Vec<String>,
    pub main_target: String,
    /// Number of packager processes run.
    pub invocations: usize,
}

/// Coordinates dependency compilation and the final deploy.
pub struct BuildOrchestrator<R = SystemRunner> {
    config: BuildConfiguration,
    classpath: ClasspathResolver,
    runner: R,
    phase: Cell<BuildPhase>,
}

impl BuildOrchestrator<SystemRunner> {
    /// Create an orchestrator that spawns real packager processes.
    pub fn new(config: BuildConfiguration, classpath: ClasspathResolver) -> Self {
        Self::with_runner(config, classpath, SystemRunner)
    }
}

impl<R: ProcessRunner> BuildOrchestrator<R> {
    /// Create an orchestrator with a custom process runner.
    pub fn with_runner(config: BuildConfiguration, classpath: ClasspathResolver, runner: R) -> Self {
        BuildOrchestrator {
            config,
            classpath,
            runner,
            phase: Cell::new(BuildPhase::Idle),
        }
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase.get()
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Classpath modules that will be compiled as dependency libraries.
    pub fn dependency_modules(&self) -> Vec<&str> {
        let policy = self.config.must_compile();
        self.classpath
            .resolve()
            .iter()
            .map(String::as_str)
            .filter(|m| policy.test(m))
            .collect()
    }

    /// Arguments for compiling `library`: the configured ones plus `/n <file>`.
    fn library_args(&self, library: &str) -> Vec<String> {
        let mut args = self.config.args().to_vec();
        args.push("/n".to_string());
        args.push(to_manifest_reference_name(library));
        args
    }

    /// Describe every packager call a build would make, without running any.
    pub fn plan(&self) -> DeployResult<Vec<PlannedInvocation>> {
        let main_target = self.main_target()?;
        let invoker = DeployInvoker::new(&self.config, &self.classpath, &self.runner);

        let mut plan: Vec<PlannedInvocation> = self
            .dependency_modules()
            .into_iter()
            .map(|module| {
                let library = to_library_artifact_name(module);
                let cmd = invoker.command(module, &self.library_args(&library), &[]);
                PlannedInvocation {
                    kind: InvocationKind::Dependency,
                    target: module.to_string(),
                    library: Some(library),
                    program: cmd.get_program().to_string(),
                    args: cmd.get_args().to_vec(),
                    platforms: Vec::new(),
                }
            })
            .collect();

        let cmd = invoker.command(main_target, self.config.args(), self.config.platforms());
        plan.push(PlannedInvocation {
            kind: InvocationKind::Main,
            target: main_target.to_string(),
            library: None,
            program: cmd.get_program().to_string(),
            args: cmd.get_args().to_vec(),
            platforms: self.config.platforms().to_vec(),
        });

        Ok(plan)
    }

    /// Run the whole build.
    pub fn build(&self) -> DeployResult<BuildReport> {
        match self.run() {
            Ok(report) => {
                self.phase.set(BuildPhase::Done);
                tracing::info!(
                    "deployed `{}` with {} dependency librar{}",
                    report.main_target,
                    report.libraries.len(),
                    if report.libraries.len() == 1 { "y" } else { "ies" }
                );
                Ok(report)
            }
            Err(err) => {
                tracing::debug!("build failed during {:?}", self.phase.get());
                self.phase.set(BuildPhase::Failed);
                Err(err)
            }
        }
    }

    fn main_target(&self) -> DeployResult<&str> {
        match self.config.main_target() {
            "" => Err(DeployError::MissingTarget),
            target => Ok(target),
        }
    }

    fn run(&self) -> DeployResult<BuildReport> {
        self.phase.set(BuildPhase::Planning);
        let main_target = self.main_target()?;
        let modules = self.dependency_modules();
        tracing::debug!(
            "{} classpath entries, {} to compile",
            self.classpath.resolve().len(),
            modules.len()
        );

        let invoker = DeployInvoker::new(&self.config, &self.classpath, &self.runner);

        self.phase.set(BuildPhase::CompilingDependencies);
        let mut libraries = Vec::with_capacity(modules.len());
        for module in modules {
            let library = to_library_artifact_name(module);
            tracing::info!("compiling `{}` into `{}`", module, library);
            invoker
                .invoke(module, &self.library_args(&library), &[])
                .map_err(|source| DeployError::Dependency {
                    module: module.to_string(),
                    source: Box::new(source),
                })?;
            libraries.push(library);
        }

        self.phase.set(BuildPhase::Deploying);
        let txn = ManifestTransaction::begin(self.config.manifest_path(), &libraries)?;
        tracing::info!(
            "deploying `{}` for [{}]",
            main_target,
            self.config
                .platforms()
                .iter()
                .map(PlatformTarget::flag)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let deployed = invoker
            .invoke(main_target, self.config.args(), self.config.platforms())
            .map_err(|source| DeployError::Deploy {
                target: main_target.to_string(),
                source: Box::new(source),
            });

        match deployed {
            Ok(_) => txn.end()?,
            Err(err) => {
                if let Err(release_err) = txn.end() {
                    tracing::error!("{:#}", anyhow::Error::new(release_err));
                }
                return Err(err);
            }
        }

        Ok(BuildReport {
            invocations: libraries.len() + 1,
            libraries,
            main_target: main_target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::core::classpath::HostFamily;
    use crate::core::config::{ExitStatusPolicy, MustCompile};
    use crate::test_support::RecordingRunner;

    fn orchestrator(
        tmp: &TempDir,
        classpath: &[&str],
        policy: MustCompile,
        runner: RecordingRunner,
    ) -> BuildOrchestrator<RecordingRunner> {
        let manifest = tmp.path().join("all.pkg");
        let config = BuildConfiguration::builder()
            .key("KEY")
            .main_target("target/App.jar")
            .must_compile(policy)
            .platforms([PlatformTarget::Android, PlatformTarget::Ios])
            .manifest_path(&manifest)
            .build()
            .unwrap();
        let cp = ClasspathResolver::new(classpath.iter().copied()).with_host(HostFamily::Unix);
        BuildOrchestrator::with_runner(config, cp, runner.watch_manifest(manifest))
    }

    fn only(name: &'static str) -> MustCompile {
        MustCompile::new(move |m| m == name)
    }

    #[test]
    fn test_dependency_then_main_deploy() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(&tmp, &["A.jar", "B.jar"], only("B.jar"), RecordingRunner::new());

        assert_eq!(orch.phase(), BuildPhase::Idle);
        let report = orch.build().unwrap();
        assert_eq!(orch.phase(), BuildPhase::Done);
        assert_eq!(report.libraries, vec!["BLib.tcz"]);
        assert_eq!(report.invocations, 2);

        let calls = orch.runner().calls();
        assert_eq!(calls.len(), 2);

        assert_eq!(calls[0].target(), "B.jar");
        assert!(calls[0].platform_flags().is_empty());
        assert_eq!(
            calls[0].args,
            &["-cp", "A.jar:B.jar", "tc.Deploy", "B.jar", "/r", "KEY", "/n", "BLib.tcz"]
        );
        assert_eq!(calls[0].manifest, None);

        assert_eq!(calls[1].target(), "target/App.jar");
        assert_eq!(calls[1].platform_flags(), vec!["android", "ios"]);
        assert_eq!(calls[1].manifest.as_deref(), Some("[L] BLib.tcz\n"));

        assert!(!tmp.path().join("all.pkg").exists());
    }

    #[test]
    fn test_existing_manifest_restored_after_deploy() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("all.pkg"), "[G] res/icon.png").unwrap();
        let orch = orchestrator(
            &tmp,
            &["A.jar", "B.jar"],
            MustCompile::new(|_| true),
            RecordingRunner::new(),
        );

        orch.build().unwrap();

        let calls = orch.runner().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[2].manifest.as_deref(),
            Some("[G] res/icon.png\n[L] ALib.tcz\n[L] BLib.tcz\n")
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("all.pkg")).unwrap(),
            "[G] res/icon.png"
        );
    }

    #[test]
    fn test_nothing_to_compile_leaves_manifest_alone() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(&tmp, &["A.jar"], MustCompile::never(), RecordingRunner::new());

        let report = orch.build().unwrap();
        assert!(report.libraries.is_empty());

        let calls = orch.runner().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].manifest, None);
        assert!(!tmp.path().join("all.pkg").exists());
    }

    #[test]
    fn test_dependency_failure_aborts_remaining() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().exit_code_for("A.jar", 1);
        let orch = orchestrator(&tmp, &["A.jar", "B.jar"], MustCompile::new(|_| true), runner);

        let err = orch.build().unwrap_err();
        assert_eq!(orch.phase(), BuildPhase::Failed);
        match err {
            DeployError::Dependency { module, source } => {
                assert_eq!(module, "A.jar");
                assert!(matches!(*source, DeployError::ExitStatus { code: Some(1), .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(orch.runner().calls().len(), 1);
        assert!(!tmp.path().join("all.pkg").exists());
    }

    #[test]
    fn test_main_failure_still_restores_manifest() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("all.pkg"), "before\n").unwrap();
        let runner = RecordingRunner::new().spawn_failure_for("target/App.jar");
        let orch = orchestrator(&tmp, &["A.jar", "B.jar"], only("A.jar"), runner);

        let err = orch.build().unwrap_err();
        assert!(matches!(err, DeployError::Deploy { .. }));
        assert!(!err.is_manifest_io());
        assert_eq!(orch.phase(), BuildPhase::Failed);

        let calls = orch.runner().calls();
        assert_eq!(calls[1].manifest.as_deref(), Some("before\n\n[L] ALib.tcz\n"));
        assert_eq!(fs::read_to_string(tmp.path().join("all.pkg")).unwrap(), "before\n");
        assert!(!tmp.path().join("all.pkg-bkp").exists());
    }

    #[test]
    fn test_lenient_exit_status_continues() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join("all.pkg");
        let config = BuildConfiguration::builder()
            .key("KEY")
            .main_target("target/App.jar")
            .must_compile(MustCompile::new(|_| true))
            .manifest_path(&manifest)
            .exit_status(ExitStatusPolicy::Ignore)
            .build()
            .unwrap();
        let cp = ClasspathResolver::new(["A.jar"]).with_host(HostFamily::Unix);
        let runner = RecordingRunner::new().exit_code_for("A.jar", 9);
        let orch = BuildOrchestrator::with_runner(config, cp, runner);

        let report = orch.build().unwrap();
        assert_eq!(report.libraries, vec!["ALib.tcz"]);
        assert_eq!(orch.runner().calls().len(), 2);
    }

    #[test]
    fn test_qualified_module_paths() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(
            &tmp,
            &["/home/me/libs/Util.jar"],
            MustCompile::new(|_| true),
            RecordingRunner::new(),
        );

        let report = orch.build().unwrap();
        assert_eq!(report.libraries, vec!["/home/me/libs/UtilLib.tcz"]);

        let calls = orch.runner().calls();
        assert_eq!(calls[0].args[6..], ["/n", "UtilLib.tcz"]);
        assert_eq!(
            calls[1].manifest.as_deref(),
            Some("[L] /home/me/libs/UtilLib.tcz\n")
        );
    }

    #[test]
    fn test_missing_target_fails_before_spawning() {
        let config = BuildConfiguration::builder().key("KEY").build().unwrap();
        let cp = ClasspathResolver::new(["A.jar"]);
        let orch = BuildOrchestrator::with_runner(config, cp, RecordingRunner::new());

        assert!(matches!(orch.build(), Err(DeployError::MissingTarget)));
        assert!(orch.runner().calls().is_empty());
    }

    #[test]
    fn test_plan_does_not_run_anything() {
        let tmp = TempDir::new().unwrap();
        let orch = orchestrator(&tmp, &["A.jar", "B.jar"], only("B.jar"), RecordingRunner::new());

        let plan = orch.plan().unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].kind, InvocationKind::Dependency);
        assert_eq!(plan[0].library.as_deref(), Some("BLib.tcz"));
        assert_eq!(plan[1].kind, InvocationKind::Main);
        assert_eq!(
            plan[1].platforms,
            vec![PlatformTarget::Android, PlatformTarget::Ios]
        );
        assert!(plan[1].args.ends_with(&["-android".to_string(), "-ios".to_string()]));

        assert!(orch.runner().calls().is_empty());
        assert_eq!(orch.phase(), BuildPhase::Idle);

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json[0]["kind"], "dependency");
        assert_eq!(json[1]["platforms"][0], "android");
    }
}
