//! KeeperFX installer CLI entrypoint.
//!
//! This binary resolves settings from the configuration file, the
//! environment, and the command line, then hands the chosen subcommand its
//! collaborators.

use clap::Parser;
use kfx_installer::api::HttpManifestFetcher;
use kfx_installer::archive::SevenZipEngine;
use kfx_installer::cli::{Cli, Command, GlobalArgs};
use kfx_installer::commands::{run_check, run_files_to_remove, run_install, run_update, run_verify};
use kfx_installer::config::LauncherConfig;
use kfx_installer::dirs::{BaseDirs, SystemBaseDirs};
use kfx_installer::download::HttpDownloader;
use kfx_installer::error::CommandError;
use kfx_installer::output::{TerminalObserver, format_duration, write_stderr_line};
use kfx_installer::pipeline::{PipelineContext, UpdatePipeline};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Settings resolved from every source, highest precedence last.
struct Settings {
    config: LauncherConfig,
    install_root: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.global.log_filter())
        .parse_default_env()
        .init();

    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), CommandError> {
    let dirs = SystemBaseDirs;
    let settings = resolve_settings(&cli.global, &dirs)?;
    let fetcher = fetcher_for(&settings.config);
    let mut stdout = std::io::stdout();

    match &cli.command {
        Command::Check(args) => run_check(&fetcher, &settings.install_root, args, &mut stdout),
        Command::FilesToRemove(args) => {
            run_files_to_remove(&settings.config, &settings.install_root, args, &mut stdout)
        }
        Command::Verify(args) => run_verify(&fetcher, &settings.install_root, args, &mut stdout),
        Command::Install(args) => {
            let started = Instant::now();
            let mut pipeline = pipeline_for(&settings);
            let installed = {
                let mut observer = observer_for(&cli.global, args.yes, stderr);
                run_install(&mut pipeline, args, &mut observer)?
            };
            report_finished(cli, stderr, &format!("Installed KeeperFX {installed}"), started);
            Ok(())
        }
        Command::Update(args) => {
            let started = Instant::now();
            let mut pipeline = pipeline_for(&settings);
            let updated = {
                let mut observer = observer_for(&cli.global, args.yes, stderr);
                run_update(&fetcher, &mut pipeline, args, &mut observer)?
            };
            if let Some(updated) = updated {
                report_finished(cli, stderr, &format!("Updated to KeeperFX {updated}"), started);
            }
            Ok(())
        }
    }
}

/// Merge configuration file, environment, and command-line settings.
fn resolve_settings(global: &GlobalArgs, dirs: &dyn BaseDirs) -> Result<Settings, CommandError> {
    let config = match &global.config {
        Some(path) => LauncherConfig::load(path.as_std_path())?,
        None => LauncherConfig::load_default(dirs)?,
    };
    let mut config = config.with_env_overrides();
    if let Some(endpoint) = &global.api_endpoint {
        config.api_endpoint.clone_from(endpoint);
    }
    if let Some(root) = &global.install_root {
        config.install_root = Some(root.clone().into_std_path_buf());
    }

    let install_root = config
        .resolve_install_root(dirs)
        .ok_or(CommandError::NoInstallRoot)?;
    Ok(Settings {
        config,
        install_root,
    })
}

fn fetcher_for(config: &LauncherConfig) -> HttpManifestFetcher {
    HttpManifestFetcher::new(config.api_endpoint.as_str(), config.api_timeout())
}

fn pipeline_for(settings: &Settings) -> UpdatePipeline {
    let root = &settings.install_root;
    let mut context = PipelineContext::new(root);
    if let Some(manifest) = settings.config.removal_manifest_path(root) {
        context = context.with_removal_manifest(manifest);
    }
    UpdatePipeline::new(
        context,
        Box::new(fetcher_for(&settings.config)),
        Arc::new(HttpDownloader::new(settings.config.connect_timeout())),
        Arc::new(SevenZipEngine::new()),
    )
}

fn observer_for<'a>(
    global: &GlobalArgs,
    assume_yes: bool,
    stderr: &'a mut dyn Write,
) -> TerminalObserver<&'a mut dyn Write, std::io::StdinLock<'static>> {
    TerminalObserver::new(stderr, std::io::stdin().lock())
        .quiet(global.quiet)
        .assume_yes(assume_yes)
}

fn report_finished(cli: &Cli, stderr: &mut dyn Write, message: &str, started: Instant) {
    if !cli.global.quiet {
        write_stderr_line(
            stderr,
            format!("{message} in {}", format_duration(started.elapsed())),
        );
    }
}

fn exit_code_for_run_result(result: Result<(), CommandError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use kfx_installer::config::{API_ENDPOINT_ENV, CONFIG_FILE_NAME};
    use std::path::Path;

    struct FixedDirs {
        config_dir: Option<PathBuf>,
        install_root: Option<PathBuf>,
    }

    impl BaseDirs for FixedDirs {
        fn config_dir(&self) -> Option<PathBuf> {
            self.config_dir.clone()
        }

        fn default_install_root(&self) -> Option<PathBuf> {
            self.install_root.clone()
        }
    }

    fn no_dirs() -> FixedDirs {
        FixedDirs {
            config_dir: None,
            install_root: None,
        }
    }

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(CommandError::NoInstallRoot), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.starts_with("error: could not determine an installation root"));
    }

    #[test]
    fn missing_install_root_is_reported() {
        temp_env::with_var_unset(API_ENDPOINT_ENV, || {
            let result = resolve_settings(&GlobalArgs::default(), &no_dirs());
            assert!(matches!(result, Err(CommandError::NoInstallRoot)));
        });
    }

    #[test]
    fn command_line_overrides_environment_and_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "api_endpoint = \"https://file.example.test/api\"\ninstall_root = \"/from/file\"\n",
        )
        .expect("write config");
        let dirs = FixedDirs {
            config_dir: Some(dir.path().to_path_buf()),
            install_root: Some(PathBuf::from("/platform/default")),
        };
        let global = GlobalArgs {
            install_root: Some(Utf8PathBuf::from("/from/cli")),
            api_endpoint: Some("https://cli.example.test/api".to_owned()),
            ..GlobalArgs::default()
        };

        temp_env::with_var(API_ENDPOINT_ENV, Some("https://env.example.test/api"), || {
            let settings = resolve_settings(&global, &dirs).expect("settings");
            assert_eq!(settings.install_root, Path::new("/from/cli"));
            assert_eq!(settings.config.api_endpoint, "https://cli.example.test/api");
        });
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("custom.toml");
        std::fs::write(&config_path, "api_endpoint = \"https://file.example.test/api\"\n")
            .expect("write config");
        let global = GlobalArgs {
            config: Utf8PathBuf::from_path_buf(config_path).ok(),
            ..GlobalArgs::default()
        };
        let dirs = FixedDirs {
            config_dir: None,
            install_root: Some(PathBuf::from("/platform/default")),
        };

        temp_env::with_var(API_ENDPOINT_ENV, Some("https://env.example.test/api"), || {
            let settings = resolve_settings(&global, &dirs).expect("settings");
            assert_eq!(settings.config.api_endpoint, "https://env.example.test/api");
            assert_eq!(settings.install_root, Path::new("/platform/default"));
        });
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("custom.toml");
        std::fs::write(&config_path, "unknown_key = 1\n").expect("write config");
        let global = GlobalArgs {
            config: Utf8PathBuf::from_path_buf(config_path).ok(),
            ..GlobalArgs::default()
        };

        let result = resolve_settings(&global, &no_dirs());
        assert!(matches!(result, Err(CommandError::Config(_))));
    }
}
