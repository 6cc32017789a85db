//! `tcdeploy build` command

use anyhow::{Context, Result};

use crate::cli::BuildArgs;
use tcdeploy::util::config::{global_config_path, load_config, Config, PROJECT_CONFIG_FILE};
use tcdeploy::{BuildOrchestrator, ClasspathResolver, ExitStatusPolicy};

/// Command-line settings, layered over the config files.
fn cli_overrides(args: &BuildArgs) -> Config {
    Config {
        key: args.key.clone(),
        home: args.home.clone(),
        runtime: args.runtime.clone(),
        manifest: args.manifest.clone(),
        main_target: args.target.clone(),
        main_class: args.main_class.clone(),
        classpath: args.classpath.clone(),
        platforms: args.platforms.clone(),
        args: args.extra_args.clone(),
        must_compile: args.must_compile.clone(),
        env: args.env.iter().cloned().collect(),
        exit_status: args.ignore_exit_status.then_some(ExitStatusPolicy::Ignore),
        ..Default::default()
    }
}

pub fn execute(args: BuildArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;

    let global = global_config_path();
    let mut config = load_config(global.as_deref(), &cwd.join(PROJECT_CONFIG_FILE))?;
    config.merge(cli_overrides(&args));

    let mut builder = config.to_builder()?;
    if let Some(name) = args.name {
        builder = builder.name(name);
    }
    if let Some(dir) = args.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(cmd) = args.command {
        builder = builder.command(cmd);
    }
    if let Some(path) = args.mobile_provision {
        builder = builder.mobile_provision(path);
    }
    if args.single_package {
        builder = builder.single_package();
    }
    let build_config = builder.build()?;

    let classpath = if config.classpath.is_empty() {
        ClasspathResolver::from_env()
    } else {
        ClasspathResolver::new(config.classpath.iter().cloned())
    };
    if classpath.is_empty() {
        tracing::warn!("classpath is empty; pass --classpath or set CLASSPATH");
    }

    let orchestrator = BuildOrchestrator::new(build_config, classpath);

    if args.plan {
        let plan = orchestrator.plan()?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let report = orchestrator.build()?;
    for library in &report.libraries {
        eprintln!("   Generated {}", library);
    }
    eprintln!(
        "    Finished `{}` ({} packager run{})",
        report.main_target,
        report.invocations,
        if report.invocations == 1 { "" } else { "s" }
    );

    Ok(())
}
