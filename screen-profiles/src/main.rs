mod app;
mod core;
mod error;
mod platform;
mod profile_store;

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;
use screen_profiles_ipc::HostTopology;
use tracing_subscriber::EnvFilter;

use crate::core::{
    default_registry_path, derive_key, sample, strip_settings_file, Config, ProfileKey,
    DEFAULT_EXTENSION, DEFAULT_HOST_TIMEOUT_SECS, DEFAULT_IDE_VERSION,
};
use crate::platform::JsonConfigStore;
use crate::profile_store::SettingsLocator;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// screen-profiles - switch IDE window layouts with the monitor setup
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Run(RunCmd),
    Strip(StripCmd),
    Key(KeyCmd),
    Path(PathCmd),
    Version(VersionCmd),
}

/// Run the daemon, reading host events from stdin
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCmd {
    /// IDE version used as configuration store namespace (default: 11.0)
    #[argh(option, default = "DEFAULT_IDE_VERSION.to_string()")]
    ide_version: String,
    /// configuration store file (default: <config dir>/screen-profiles/registry.json)
    #[argh(option)]
    registry: Option<PathBuf>,
    /// settings file extension (default: vssettings)
    #[argh(option, default = "DEFAULT_EXTENSION.to_string()")]
    extension: String,
    /// seconds to wait for one import or export (default: 120)
    #[argh(option, default = "DEFAULT_HOST_TIMEOUT_SECS")]
    host_timeout_secs: u64,
    /// settings import/export command; "import|export <path>" is appended
    #[argh(positional, greedy)]
    host_command: Vec<String>,
}

/// Strip a settings file down to its window layout, in place
#[derive(FromArgs)]
#[argh(subcommand, name = "strip")]
struct StripCmd {
    /// settings file to rewrite
    #[argh(positional)]
    file: PathBuf,
}

/// Print the profile key for a topology read as JSON from stdin
#[derive(FromArgs)]
#[argh(subcommand, name = "key")]
struct KeyCmd {}

/// Print the settings file path for a profile key
#[derive(FromArgs)]
#[argh(subcommand, name = "path")]
struct PathCmd {
    /// profile key
    #[argh(positional)]
    key: String,
    /// IDE version used as configuration store namespace (default: 11.0)
    #[argh(option, default = "DEFAULT_IDE_VERSION.to_string()")]
    ide_version: String,
    /// configuration store file (default: <config dir>/screen-profiles/registry.json)
    #[argh(option)]
    registry: Option<PathBuf>,
    /// settings file extension (default: vssettings)
    #[argh(option, default = "DEFAULT_EXTENSION.to_string()")]
    extension: String,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["screen-profiles", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Run(cmd)) => {
            init_tracing();
            let config = Config {
                ide_version: cmd.ide_version,
                extension: cmd.extension,
                registry_path: cmd.registry.unwrap_or_else(default_registry_path),
                host_command: cmd.host_command,
                host_timeout: Duration::from_secs(cmd.host_timeout_secs),
            };
            tracing::info!("screen-profiles starting: {:?}", config);
            app::App::run(config)
        }
        Some(SubCommand::Strip(cmd)) => {
            init_tracing();
            strip_settings_file(&cmd.file)
                .with_context(|| format!("Failed to strip {}", cmd.file.display()))
        }
        Some(SubCommand::Key(_)) => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let topology: HostTopology =
                serde_json::from_str(&input).context("Failed to parse topology")?;
            println!("{}", derive_key(&sample(&topology)));
            Ok(())
        }
        Some(SubCommand::Path(cmd)) => {
            let config = Config {
                ide_version: cmd.ide_version,
                extension: cmd.extension,
                registry_path: cmd.registry.unwrap_or_else(default_registry_path),
                ..Config::default()
            };
            let locator =
                SettingsLocator::new(&config, JsonConfigStore::new(config.registry_path.clone()));
            let path = locator.path_for(&ProfileKey::new(cmd.key))?;
            println!("{}", path.display());
            Ok(())
        }
        Some(SubCommand::Version(_)) => {
            println!("screen-profiles {}", VERSION);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries replies to the host.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
