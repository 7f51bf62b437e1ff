use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, error::ErrorKind};
use log::{Level, LevelFilter, debug, log_enabled, warn};
use serde::Serialize;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use thiserror::Error;

use crate::artifact::BuildArtifact;
use crate::builder::{APPHUB_PROGRAM, BuildConfig, run_build};
use crate::credentials::{self, CREDENTIALS_FILE};
use crate::metadata::BuildMetadata;
use crate::uploader::{DASHBOARD_URL_BASE, UploadClient};

/// Audience classification for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    All,
    Debug,
    None,
}

#[derive(Debug, Error)]
#[error("--target must be one of all, debug, none (got '{0}')")]
pub struct InvalidTargetError(String);

impl FromStr for Target {
    type Err = InvalidTargetError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(Target::All),
            "debug" => Ok(Target::Debug),
            "none" => Ok(Target::None),
            other => Err(InvalidTargetError(other.to_string())),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "apphub-deploy",
    version,
    about = "Build a React Native app with the apphub CLI and deploy it to AppHub"
)]
pub struct Cli {
    /// Comma separated list of app versions the build targets
    #[arg(short, long)]
    app_versions: Option<String>,

    /// Description for the build shown on the AppHub dashboard
    #[arg(short = 'd', long)]
    build_description: Option<String>,

    /// React Native entry file passed to the build
    #[arg(short, long)]
    entry_file: Option<PathBuf>,

    /// Open the AppHub dashboard in a browser after deploying
    #[arg(short, long)]
    open_build_url: bool,

    /// Name for the build shown on the AppHub dashboard
    #[arg(short = 'n', long)]
    build_name: Option<String>,

    /// Info.plist file passed to the build
    #[arg(short, long)]
    plist_file: Option<PathBuf>,

    /// Keep the build zip instead of deleting it after deploy
    #[arg(short, long)]
    retain_build: bool,

    /// Audience for the build: all, debug or none
    #[arg(short, long)]
    target: Option<String>,

    /// Print debug detail while running
    #[arg(short, long)]
    verbose: bool,

    /// Prompt for AppHub credentials and save them before deploying
    #[arg(short, long)]
    configure: bool,
}

impl Cli {
    pub fn parsed_target(&self) -> Result<Option<Target>, InvalidTargetError> {
        self.target.as_deref().map(Target::from_str).transpose()
    }
}

pub fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            return 1;
        }
    };

    if let Err(err) = init_logger(cli.verbose) {
        eprintln!("Error: failed to initialize logging: {err}");
        return 1;
    }

    match execute(&cli) {
        Ok(()) => 0,
        Err(err) => {
            println!();
            eprintln!("Error: {err:#}");
            1
        }
    }
}

fn init_logger(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("apphub_deploy")
        .build();
    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn execute(cli: &Cli) -> anyhow::Result<()> {
    let target = cli.parsed_target()?;

    let credentials_path = Path::new(CREDENTIALS_FILE);
    let credentials = if cli.configure {
        credentials::configure(credentials_path)?
    } else {
        credentials::load(credentials_path)?
    };
    let build_url = format!("{DASHBOARD_URL_BASE}{}", credentials.app_hub_id);

    let artifact = BuildArtifact::new(Utc::now())?;
    debug!("build artifact: {}", artifact.path.display());

    let config = BuildConfig {
        plist_file: cli.plist_file.clone(),
        entry_file: cli.entry_file.clone(),
        target,
    };

    println!();
    print!("Building... ");
    io::stdout().flush().context("flushing progress output")?;
    let build_output = run_build(Path::new(APPHUB_PROGRAM), &config, &artifact.file_name)?;
    println!("Done!");
    debug!("apphub build output:\n{build_output}");

    if !artifact.path.exists() {
        bail!("apphub build did not produce {}", artifact.path.display());
    }
    if log_enabled!(Level::Debug) {
        debug!("artifact sha256: {}", artifact.sha256()?);
    }

    let metadata = BuildMetadata::from_options(
        target,
        cli.build_name.as_deref(),
        cli.build_description.as_deref(),
        cli.app_versions.as_deref(),
    );

    println!();
    print!("Deploying... ");
    io::stdout().flush().context("flushing progress output")?;
    let client = UploadClient::new(credentials)?;
    let upload_url = client.request_upload_url(metadata.as_ref())?;
    client.upload_archive(&upload_url, &artifact.path)?;
    println!("Done!");

    println!();
    println!("SUCCESSFULLY BUILT AND DEPLOYED TO APPHUB!");
    println!();
    println!("You can see your build here: {build_url}");

    cleanup(&artifact, cli.retain_build)?;

    if cli.open_build_url {
        debug!("opening {build_url} in the default browser");
        if let Err(err) = open::that(&build_url) {
            warn!("could not open {build_url}: {err}");
        }
    }

    Ok(())
}

/// Delete the build archive unless the user asked to keep it.
fn cleanup(artifact: &BuildArtifact, retain: bool) -> anyhow::Result<()> {
    if retain {
        return Ok(());
    }

    println!();
    print!("Removing Build File... ");
    io::stdout().flush().context("flushing progress output")?;
    artifact.remove()?;
    println!("Done!");
    Ok(())
}
