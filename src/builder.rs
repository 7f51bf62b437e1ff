use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::debug;
use thiserror::Error;
use which::which;

use crate::cli::Target;

/// Path the apphub npm package installs its build tool under.
pub const APPHUB_PROGRAM: &str = "./node_modules/.bin/apphub";

/// Flags forwarded to `apphub build`.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    pub plist_file: Option<PathBuf>,
    pub entry_file: Option<PathBuf>,
    pub target: Option<Target>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "apphub build tool not found at {}: is the apphub npm package installed?",
        .program.display()
    )]
    ToolNotFound { program: PathBuf },
    #[error("running {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("apphub build failed with {status}: {stderr}")]
    CommandFailed { status: ExitStatus, stderr: String },
}

/// Assemble the argument list for `apphub build`. The `--dev` switch is
/// tied to the debug target; every other flag passes through as given.
pub fn build_command_args(config: &BuildConfig, output_zip: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["build".into(), "--verbose".into()];
    if let Some(plist_file) = &config.plist_file {
        args.push("--plist-file".into());
        args.push(plist_file.into());
    }
    if let Some(entry_file) = &config.entry_file {
        args.push("--entry-file".into());
        args.push(entry_file.into());
    }
    if config.target == Some(Target::Debug) {
        args.push("--dev".into());
    }
    args.push("--output-zip".into());
    args.push(output_zip.into());
    args
}

/// Run the build tool to completion and return its captured stdout.
pub fn run_build(
    program: &Path,
    config: &BuildConfig,
    output_zip: &str,
) -> Result<String, BuildError> {
    if which(program).is_err() {
        return Err(BuildError::ToolNotFound {
            program: program.to_path_buf(),
        });
    }

    let args = build_command_args(config, output_zip);
    debug!("build command: {} {:?}", program.display(), args);

    let output = Command::new(program)
        .args(&args)
        .output()
        .map_err(|source| BuildError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(BuildError::CommandFailed {
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::{BuildConfig, BuildError, build_command_args, run_build};
    use crate::cli::Target;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn to_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn minimal_build_command() {
        let args = build_command_args(&BuildConfig::default(), "AppHubBuild_1.zip");
        assert_eq!(
            to_strings(&args),
            ["build", "--verbose", "--output-zip", "AppHubBuild_1.zip"]
        );
    }

    #[test]
    fn full_build_command_keeps_flag_order() {
        let config = BuildConfig {
            plist_file: Some(PathBuf::from("ios/Info.plist")),
            entry_file: Some(PathBuf::from("index.ios.js")),
            target: Some(Target::Debug),
        };
        let args = build_command_args(&config, "AppHubBuild_2.zip");
        assert_eq!(
            to_strings(&args),
            [
                "build",
                "--verbose",
                "--plist-file",
                "ios/Info.plist",
                "--entry-file",
                "index.ios.js",
                "--dev",
                "--output-zip",
                "AppHubBuild_2.zip",
            ]
        );
    }

    #[test]
    fn dev_flag_only_for_debug_target() {
        for target in [Some(Target::All), Some(Target::None), None] {
            let config = BuildConfig {
                target,
                ..BuildConfig::default()
            };
            let args = build_command_args(&config, "out.zip");
            assert!(
                !args.contains(&OsString::from("--dev")),
                "--dev should be absent for {target:?}"
            );
        }
    }

    #[test]
    fn missing_tool_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let program = dir.path().join("apphub");

        let err = run_build(&program, &BuildConfig::default(), "out.zip")
            .expect_err("build should fail");
        assert!(matches!(err, BuildError::ToolNotFound { .. }));
        assert!(err.to_string().contains("apphub npm package"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_is_reported_with_status() {
        let err = run_build(std::path::Path::new("false"), &BuildConfig::default(), "out.zip")
            .expect_err("build should fail");
        match err {
            BuildError::CommandFailed { status, .. } => assert_eq!(status.code(), Some(1)),
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_of_successful_build() {
        let stdout = run_build(std::path::Path::new("echo"), &BuildConfig::default(), "out.zip")
            .expect("echo should succeed");
        assert!(stdout.contains("--output-zip out.zip"));
    }
}
