use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use shared_prefs::PrefValue;

use crate::{color::Color, config::DATA_DIR_ENV, render::Output};

pub(crate) const DEFAULT_FILE_NAME: &str = "app_preferences";

#[derive(Parser, Clone)]
#[command(name = "prefs", version, about = "Shared preferences demo", long_about = None)]
pub(crate) struct Cli {
    // Optional as a workaround for https://github.com/clap-rs/clap/issues/3572
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(
        long,
        global = true,
        env = DATA_DIR_ENV,
        help = "Directory holding the preferences files."
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        global = true,
        default_value = DEFAULT_FILE_NAME,
        help = "Name of the preferences file to operate on."
    )]
    pub file: String,

    #[arg(short = 'o', long, global = true, value_enum, default_value_t = Output::Plain)]
    pub output: Output,

    #[arg(short = 'c', long, global = true, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
}

#[derive(Subcommand, Clone)]
pub(crate) enum Commands {
    /// Store the app settings record.
    Save(SaveArgs),

    /// Show the stored app settings record.
    Show,

    /// Store a single value.
    Put {
        key: String,
        value: String,

        #[arg(short, long, value_enum, default_value_t = Kind::String)]
        kind: Kind,
    },

    /// Read a single value.
    Get {
        key: String,

        #[arg(short, long, value_enum, default_value_t = Kind::String)]
        kind: Kind,

        #[arg(short, long, help = "Value returned when the key is missing or has another type.")]
        default: Option<String>,
    },

    /// Delete a single value.
    Remove { key: String },
}

#[derive(Args, Clone)]
pub(crate) struct SaveArgs {
    #[arg(long, default_value_t = 13)]
    pub main_id: i32,

    #[arg(long, default_value_t = 1)]
    pub open_count: i32,

    #[arg(long, default_value = "This is the Home message.")]
    pub home_message: String,

    #[arg(long, default_value = "Hello there my friend!")]
    pub greeting_message: String,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sound_enabled: bool,

    #[arg(long, help = "Write synchronously instead of in the background.")]
    pub commit: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub(crate) enum Kind {
    Bool,
    Int,
    Long,
    Float,
    String,
    /// Comma separated list of strings.
    Set,
}

impl Kind {
    /// Parse command line text into a value of this kind.
    pub(crate) fn parse(self, text: &str) -> color_eyre::eyre::Result<PrefValue> {
        Ok(match self {
            Kind::Bool => PrefValue::Bool(text.parse()?),
            Kind::Int => PrefValue::Int(text.parse()?),
            Kind::Long => PrefValue::Long(text.parse()?),
            Kind::Float => PrefValue::Float(text.parse()?),
            Kind::String => PrefValue::String(text.to_owned()),
            Kind::Set => PrefValue::StringSet(
                text.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
        })
    }

    /// The value reported for a missing key when no default is given.
    pub(crate) fn zero(self) -> PrefValue {
        match self {
            Kind::Bool => PrefValue::Bool(false),
            Kind::Int => PrefValue::Int(0),
            Kind::Long => PrefValue::Long(0),
            Kind::Float => PrefValue::Float(0.0),
            Kind::String => PrefValue::String(String::new()),
            Kind::Set => PrefValue::StringSet(Default::default()),
        }
    }
}
