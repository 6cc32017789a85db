//! Packager command assembly and invocation.
//!
//! Every packager call has the same shape:
//!
//! ```text
//! <runtime> -cp <classpath> <entry-point> <target> /r <key> [-<platform> ...] [args ...]
//! ```

use std::process::ExitStatus;

use crate::core::classpath::ClasspathResolver;
use crate::core::config::{BuildConfiguration, ExitStatusPolicy, HOME_ENV_VAR};
use crate::core::platform::PlatformTarget;
use crate::util::errors::{DeployError, DeployResult};
use crate::util::process::{ProcessBuilder, ProcessRunner};

/// Flag preceding the deploy key.
pub const KEY_FLAG: &str = "/r";

/// Builds and runs packager commands for one configuration.
pub struct DeployInvoker<'a, R> {
    config: &'a BuildConfiguration,
    classpath: &'a ClasspathResolver,
    runner: R,
}

impl<'a, R: ProcessRunner> DeployInvoker<'a, R> {
    pub fn new(config: &'a BuildConfiguration, classpath: &'a ClasspathResolver, runner: R) -> Self {
        DeployInvoker {
            config,
            classpath,
            runner,
        }
    }

    /// Assemble the command line and environment for one packager call.
    pub fn command(
        &self,
        target: &str,
        args: &[String],
        platforms: &[PlatformTarget],
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(self.config.runtime())
            .arg("-cp")
            .arg(self.classpath.joined())
            .arg(self.config.entry_point())
            .arg(target)
            .arg(KEY_FLAG)
            .arg(self.config.key())
            .args(platforms.iter().map(|p| format!("-{}", p.flag())))
            .args(args);

        if let Some(home) = self.config.home() {
            cmd = cmd.env(HOME_ENV_VAR, home);
        }
        for (key, value) in self.config.env() {
            cmd = cmd.env(key, value);
        }

        cmd
    }

    /// Run the packager for `target` and wait for it to exit.
    pub fn invoke(
        &self,
        target: &str,
        args: &[String],
        platforms: &[PlatformTarget],
    ) -> DeployResult<ExitStatus> {
        if self.config.key().is_empty() {
            return Err(DeployError::MissingKey);
        }

        let cmd = self.command(target, args, platforms);
        tracing::debug!("running `{}`", cmd.display_command());

        let status = self.runner.run(&cmd)?;
        if !status.success() {
            match self.config.exit_status() {
                ExitStatusPolicy::Strict => {
                    return Err(DeployError::ExitStatus {
                        program: cmd.get_program().to_string(),
                        code: status.code(),
                    });
                }
                ExitStatusPolicy::Ignore => {
                    tracing::warn!("packager exited with {} for `{}`, ignoring", status, target);
                }
            }
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classpath::HostFamily;
    use crate::test_support::RecordingRunner;

    fn config() -> BuildConfiguration {
        BuildConfiguration::builder()
            .key("SECRET")
            .name("App")
            .build()
            .unwrap()
    }

    fn classpath() -> ClasspathResolver {
        ClasspathResolver::new(["/libs/A.jar", "/libs/B.jar"]).with_host(HostFamily::Unix)
    }

    #[test]
    fn test_command_order() {
        let config = config();
        let cp = classpath();
        let runner = RecordingRunner::new();
        let invoker = DeployInvoker::new(&config, &cp, &runner);

        let cmd = invoker.command(
            "target/App.jar",
            config.args(),
            &[PlatformTarget::Android, PlatformTarget::WinMobile],
        );

        assert_eq!(cmd.get_program(), "java");
        assert_eq!(
            cmd.get_args(),
            &[
                "-cp",
                "/libs/A.jar:/libs/B.jar",
                "tc.Deploy",
                "target/App.jar",
                "/r",
                "SECRET",
                "-android",
                "-winmo",
                "/n",
                "App"
            ]
        );
    }

    #[test]
    fn test_no_platforms_means_no_flags() {
        let config = config();
        let cp = classpath();
        let invoker = DeployInvoker::new(&config, &cp, RecordingRunner::new());

        let cmd = invoker.command("A.jar", &[], &[]);
        assert_eq!(
            cmd.get_args(),
            &["-cp", "/libs/A.jar:/libs/B.jar", "tc.Deploy", "A.jar", "/r", "SECRET"]
        );
    }

    #[test]
    fn test_environment_overrides_home() {
        let config = BuildConfiguration::builder()
            .key("K")
            .home("/opt/totalcross")
            .env("JAVA_OPTS", "-Xmx1g")
            .env(HOME_ENV_VAR, "/custom/tc")
            .build()
            .unwrap();
        let cp = classpath();
        let invoker = DeployInvoker::new(&config, &cp, RecordingRunner::new());

        let cmd = invoker.command("t.jar", &[], &[]);
        assert_eq!(
            cmd.get_envs(),
            &[
                (HOME_ENV_VAR.to_string(), "/opt/totalcross".to_string()),
                ("JAVA_OPTS".to_string(), "-Xmx1g".to_string()),
                (HOME_ENV_VAR.to_string(), "/custom/tc".to_string()),
            ]
        );
        assert_eq!(cmd.get_env(HOME_ENV_VAR), Some("/custom/tc"));
    }

    #[test]
    fn test_home_unset_is_inherited() {
        let config = config();
        let cp = classpath();
        let invoker = DeployInvoker::new(&config, &cp, RecordingRunner::new());
        assert!(invoker.command("t.jar", &[], &[]).get_envs().is_empty());
    }

    #[test]
    fn test_non_zero_exit_is_failure_when_strict() {
        let config = config();
        let cp = classpath();
        let runner = RecordingRunner::new().exit_code_for("t.jar", 2);
        let invoker = DeployInvoker::new(&config, &cp, &runner);

        let err = invoker.invoke("t.jar", &[], &[]).unwrap_err();
        assert!(matches!(err, DeployError::ExitStatus { code: Some(2), .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_non_zero_exit_is_ignored_when_lenient() {
        let config = BuildConfiguration::builder()
            .key("K")
            .exit_status(ExitStatusPolicy::Ignore)
            .build()
            .unwrap();
        let cp = classpath();
        let runner = RecordingRunner::new().exit_code_for("t.jar", 2);
        let invoker = DeployInvoker::new(&config, &cp, &runner);

        let status = invoker.invoke("t.jar", &[], &[]).unwrap();
        assert_eq!(status.code(), Some(2));
    }

    #[test]
    fn test_spawn_failure_propagates() {
        let config = config();
        let cp = classpath();
        let runner = RecordingRunner::new().spawn_failure_for("t.jar");
        let invoker = DeployInvoker::new(&config, &cp, &runner);

        let err = invoker.invoke("t.jar", &[], &[]).unwrap_err();
        assert!(matches!(err, DeployError::Spawn { .. }));
    }
}
