use anyhow::{Result, bail};
use clap::Parser;
use pacspec::commands::{export, inspect, strategies};
use std::path::PathBuf;

/// pacspec - package manifest synthesizer
///
/// Generate .nuspec manifests from MSBuild project files.
///
/// Examples:
///   pacspec export "src/**/*.csproj"      # Write a manifest next to every project
///   pacspec inspect src/App/App.csproj    # Show the synthesized package as JSON
#[derive(Parser, Debug)]
#[command(author, version = env!("PACSPEC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Export manifests for all project files matching a pattern
    Export(ExportArgs),

    /// Print the package synthesized from a project file as JSON
    Inspect(InspectArgs),

    /// List the project formats in probe order
    Strategies,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Glob pattern of project files, matched case-insensitively
    #[arg(value_name = "PATTERN")]
    pub pattern: String,

    /// Directory relative patterns are resolved against (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Directory receiving all manifests (default: next to each project)
    #[arg(long, env = "PACSPEC_TARGET", value_name = "DIR")]
    pub target: Option<PathBuf>,

    /// Pre-release identifier stamped onto package versions
    #[arg(long = "pre-release", env = "PACSPEC_PRE_RELEASE", value_name = "ID")]
    pub pre_release: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// Project file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Pre-release identifier stamped onto the package version
    #[arg(long = "pre-release", env = "PACSPEC_PRE_RELEASE", value_name = "ID")]
    pub pre_release: Option<String>,
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(cli.verbose, cli.quiet)))
        .init();
    let runtime = pacspec::runtime::RealRuntime;

    match cli.command {
        Commands::Export(args) => {
            let summary = export(runtime, &args.pattern, args.base, args.target, args.pre_release)?;
            if summary.failed > 0 {
                bail!("{} project file(s) could not be exported", summary.failed);
            }
        }
        Commands::Inspect(args) => inspect(runtime, &args.file, args.pre_release)?,
        Commands::Strategies => strategies()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_export_parsing() {
        let cli = Cli::try_parse_from(["pacspec", "export", "src/**/*.csproj"]).unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.pattern, "src/**/*.csproj");
                assert_eq!(args.base, None);
            }
            _ => panic!("Expected Export command"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_export_options_parsing() {
        let cli = Cli::try_parse_from([
            "pacspec",
            "export",
            "*.csproj",
            "--base",
            "/work",
            "--target",
            "/out",
            "--pre-release",
            "beta.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.base, Some(PathBuf::from("/work")));
                assert_eq!(args.target, Some(PathBuf::from("/out")));
                assert_eq!(args.pre_release.as_deref(), Some("beta.1"));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_inspect_parsing() {
        let cli = Cli::try_parse_from(["pacspec", "-vv", "inspect", "App.csproj"]).unwrap();
        match cli.command {
            Commands::Inspect(args) => assert_eq!(args.file, PathBuf::from("App.csproj")),
            _ => panic!("Expected Inspect command"),
        }
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_global_quiet_parsing() {
        let cli = Cli::try_parse_from(["pacspec", "strategies", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Strategies));
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pacspec", "-q", "-v", "strategies"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["pacspec", "App.csproj"]).is_err());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(0, false), "info");
        assert_eq!(log_filter(1, false), "debug");
        assert_eq!(log_filter(3, false), "trace");
        assert_eq!(log_filter(0, true), "error");
    }
}
