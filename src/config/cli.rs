use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Tessera binary.
#[derive(Debug, Parser)]
#[command(name = "tessera", version, about = "Tessera settings and page store tool")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "TESSERA_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the content language used to select pages.
    #[arg(long = "language", value_name = "CODE", global = true)]
    pub language: Option<String>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Surface spam provider failures instead of treating them as "not spam".
    #[arg(
        long = "debug",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub debug: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read or write a single module setting.
    Setting(SettingArgs),
    /// Print every setting of one module.
    Settings(ModuleArgs),
    /// Print an assembled page as JSON.
    Page(PageArgs),
    /// Classify a piece of user content with the spam provider.
    #[command(name = "spam-check")]
    SpamCheck(SpamCheckArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SettingArgs {
    #[command(subcommand)]
    pub command: SettingCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SettingCommand {
    /// Read a setting, storing the default when it is missing.
    Get(SettingGetArgs),
    /// Write a setting.
    Set(SettingSetArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SettingGetArgs {
    pub module: String,
    pub name: String,

    /// JSON value stored and returned when the setting does not exist.
    #[arg(long, value_name = "JSON", default_value = "null")]
    pub default: String,
}

#[derive(Debug, Args, Clone)]
pub struct SettingSetArgs {
    pub module: String,
    pub name: String,

    /// JSON value to store.
    #[arg(value_name = "JSON")]
    pub value: String,
}

#[derive(Debug, Args, Clone)]
pub struct ModuleArgs {
    pub module: String,
}

#[derive(Debug, Args, Clone)]
pub struct PageArgs {
    /// Numeric page identifier.
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct SpamCheckArgs {
    #[arg(long)]
    pub content: String,

    #[arg(long, value_hint = ValueHint::Url)]
    pub permalink: String,

    #[arg(long)]
    pub author: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, value_hint = ValueHint::Url)]
    pub url: Option<String>,

    /// comment, trackback, pingback, registration or a custom type.
    #[arg(long, default_value = "comment")]
    pub kind: String,

    #[arg(long = "user-ip", value_name = "IP")]
    pub user_ip: Option<String>,

    #[arg(long = "user-agent", value_name = "AGENT")]
    pub user_agent: Option<String>,
}
