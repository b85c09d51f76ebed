use crate::tracing::{LogLevel, TracingFormat};
use c3i_engine::DEFAULT_BUILD_SUBDIR;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "c3i")]
#[command(about = "Plan CI builds for a directory of conda recipes")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        env = "C3I_LOG_LEVEL",
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(
        long,
        global = true,
        env = "C3I_LOG_FORMAT",
        help = "Log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Compute the ordered build plan for changed recipes")]
    Examine(ExamineArgs),
    #[command(about = "List recipe directories changed between two revisions")]
    Changed(ChangedArgs),
}

/// Revision range shared by both commands.
#[derive(Args, Debug, Clone)]
pub struct RevisionArgs {
    #[arg(
        long,
        env = "C3I_GIT_REV",
        help = "Revision whose changes seed the plan",
        default_value = "HEAD"
    )]
    pub git_rev: String,

    #[arg(
        long,
        env = "C3I_STOP_REV",
        help = "End of the revision range (git_rev..stop_rev)"
    )]
    pub stop_rev: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExamineArgs {
    #[arg(
        env = "C3I_RECIPES",
        help = "Directory holding one subdirectory per recipe",
        default_value = "."
    )]
    pub path: PathBuf,

    #[arg(
        long,
        num_args = 1..,
        value_delimiter = ',',
        help = "Recipe directories to plan instead of asking git"
    )]
    pub folders: Vec<PathBuf>,

    #[command(flatten)]
    pub revisions: RevisionArgs,

    #[arg(
        long,
        env = "C3I_STEPS",
        help = "Downstream expansion passes (0 disables, negative runs to completion)",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub steps: i64,

    #[arg(
        long,
        env = "C3I_MAX_DOWNSTREAM",
        help = "Downstream packages added per platform (negative is unlimited)",
        default_value_t = 5,
        allow_negative_numbers = true
    )]
    pub max_downstream: i64,

    #[arg(
        long,
        env = "C3I_MATRIX_BASE_DIR",
        help = "Directory with versions.yml and build_platforms.d/ (defaults to PATH)"
    )]
    pub matrix_base_dir: Option<PathBuf>,

    #[arg(
        long = "variants-file",
        env = "C3I_VARIANTS_FILES",
        value_delimiter = ',',
        help = "Variants file merged over <matrix-base-dir>/versions.yml; later files win"
    )]
    pub variants_files: Vec<PathBuf>,

    #[arg(
        long = "variant",
        value_name = "KEY=VALUE",
        value_parser = parse_variant_pin,
        help = "Pin a variant key on every platform; repeat a key for several values"
    )]
    pub variant_pins: Vec<(String, String)>,

    #[arg(
        long = "platform-filter",
        env = "C3I_PLATFORM_FILTERS",
        value_delimiter = ',',
        help = "Glob over platform file names to keep",
        default_value = "*"
    )]
    pub platform_filters: Vec<String>,

    #[arg(
        long = "channel",
        env = "C3I_CHANNELS",
        value_delimiter = ',',
        help = "Local channel directory consulted for installable dependencies"
    )]
    pub channels: Vec<PathBuf>,

    #[arg(
        long,
        env = "C3I_NOARCH_BUILD_SUBDIR",
        help = "Platform subdir that builds noarch packages",
        default_value = DEFAULT_BUILD_SUBDIR
    )]
    pub noarch_build_subdir: String,

    #[arg(
        short = 'o',
        long,
        env = "C3I_OUTPUT",
        help = "Write the plan here instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

/// Split `python=3.11` into its key and value.
fn parse_variant_pin(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[derive(Args, Debug, Clone)]
pub struct ChangedArgs {
    #[arg(
        env = "C3I_RECIPES",
        help = "Directory holding one subdirectory per recipe",
        default_value = "."
    )]
    pub path: PathBuf,

    #[command(flatten)]
    pub revisions: RevisionArgs,
}
