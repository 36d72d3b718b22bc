use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "EWOKS CLI - Simulate protein separation workflows and render the resulting SDS-PAGE gels.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for gel rendering.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a separation workflow and write one gel image per step.
    Run(RunArgs),
    /// Print the derived properties of every protein in a FASTA file.
    Inspect(InspectArgs),
    /// Apply a tab-separated abundance table to a FASTA population.
    Abundance(AbundanceArgs),
    /// List the available workflow modules and their settings.
    Modules(ModulesArgs),
    /// Manage locally cached signal-peptide annotations.
    Data(DataArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the workflow file in TOML format.
    #[arg(required = true, value_name = "WORKFLOW")]
    pub workflow: PathBuf,

    /// Directory receiving gel images and the final population.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Directory of additional module definitions (TOML), layered over the built-in ones.
    #[arg(long, value_name = "DIR")]
    pub catalog: Option<PathBuf>,

    /// Directory of cached UniProt signal-peptide annotations.
    /// Overrides `signal-peptides.directory` in the workflow file.
    #[arg(long, value_name = "DIR")]
    pub signal_dir: Option<PathBuf>,

    // --- Gel Overrides ---
    /// Override the gel height in pixels.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Override the lightest weight resolved by the gel, in kDa.
    #[arg(long, value_name = "KDA")]
    pub min_kda: Option<f64>,

    /// Override the heaviest weight resolved by the gel, in kDa.
    #[arg(long, value_name = "KDA")]
    pub max_kda: Option<f64>,

    /// Render gels without the molecular-weight marker lane.
    #[arg(long)]
    pub no_marker: bool,

    /// Set a specific configuration value, overriding the workflow file.
    /// Can be used multiple times. Example: -S gel.lane-width=120
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the FASTA file to inspect.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Only list proteins with a non-zero abundance.
    #[arg(long)]
    pub present_only: bool,
}

/// Key used to match abundance table rows against proteins.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbundanceKeyArg {
    /// Match on the UniProt entry name (e.g. ALBU_HUMAN).
    EntryName,
    /// Match on the gene name (the `GN` header field).
    GeneName,
}

/// Arguments for the `abundance` subcommand.
#[derive(Args, Debug)]
pub struct AbundanceArgs {
    /// Path to the input FASTA file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the tab-separated abundance table (identifier, value).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub table: PathBuf,

    /// Path for the output FASTA file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Which protein identifier the table's first column holds.
    #[arg(long, value_enum, default_value_t = AbundanceKeyArg::EntryName)]
    pub key: AbundanceKeyArg,
}

/// Arguments for the `modules` subcommand.
#[derive(Args, Debug)]
pub struct ModulesArgs {
    /// Directory of additional module definitions (TOML), layered over the built-in ones.
    #[arg(long, value_name = "DIR")]
    pub catalog: Option<PathBuf>,

    /// Only describe the module with this id.
    #[arg(value_name = "MODULE")]
    pub module: Option<String>,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for signal-peptide data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Download signal-peptide annotations for one or more UniProt proteomes.
    Download {
        /// UniProt proteome identifiers (e.g. UP000005640).
        #[arg(required = true, value_name = "PROTEOME")]
        proteomes: Vec<String>,
        /// Re-download proteomes that are already cached.
        #[arg(long)]
        force: bool,
    },
    /// Show the absolute path to the local signal-peptide directory.
    Path,
    /// Set a custom absolute path for the local signal-peptide directory.
    SetPath {
        /// The new path to use for storing annotation files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the directory to its default, OS-specific location.
    ResetPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse_with_overrides() {
        let cli = Cli::parse_from([
            "ewoks", "-vv", "run", "wf.toml", "-o", "out", "--height", "300", "--no-marker",
            "-S", "gel.lane-width=120",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.workflow, PathBuf::from("wf.toml"));
        assert_eq!(args.height, Some(300));
        assert!(args.no_marker);
        assert_eq!(args.set_values, vec!["gel.lane-width=120".to_string()]);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["ewoks", "-q", "-v", "modules"]);
        assert!(result.is_err());
    }

    #[test]
    fn abundance_key_defaults_to_entry_name() {
        let cli = Cli::parse_from([
            "ewoks", "abundance", "-i", "in.fasta", "-t", "ab.tsv", "-o", "out.fasta",
        ]);
        let Commands::Abundance(args) = cli.command else {
            panic!("Expected 'abundance' subcommand");
        };
        assert_eq!(args.key, AbundanceKeyArg::EntryName);
    }

    #[test]
    fn data_download_requires_a_proteome() {
        assert!(Cli::try_parse_from(["ewoks", "data", "download"]).is_err());
        let cli = Cli::parse_from(["ewoks", "data", "download", "UP000005640", "--force"]);
        let Commands::Data(DataArgs {
            command: DataCommands::Download { proteomes, force },
        }) = cli.command
        else {
            panic!("Expected 'data download' subcommand");
        };
        assert_eq!(proteomes, vec!["UP000005640".to_string()]);
        assert!(force);
    }
}
