#![doc = include_str!("../README.md")]

use clap::{CommandFactory, Parser};
use color_eyre::eyre::{eyre, Result};
use shared_prefs::{ManagerError, PrefValue, PreferencesManager, PreferencesRegistry};

use crate::{
    color::install_color_eyre,
    command::*,
    render::{plain_value, render_result, CommandOutput, CommandResult, Output},
    settings::AppSettings,
};

mod color;
mod command;
mod config;
mod render;
mod settings;

fn main() -> Result<()> {
    // the log level hierarchy is determined by:
    //    - if RUST_LOG is detected at runtime
    //    - default to WARN
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let cli = Cli::parse();
    install_color_eyre(cli.color)?;

    let Some(command) = cli.command.clone() else {
        let mut cmd = Cli::command();
        cmd.print_help()?;
        return Ok(());
    };

    let configuration = config::store_configuration(cli.data_dir.clone())?;
    let registry = PreferencesRegistry::from_configuration(configuration);

    let result = process_commands(&registry, &cli, command);

    // Background writes must land before the process exits
    registry.wait_for_pending_writes();

    render_result(cli.output, result)
}

fn process_commands(registry: &PreferencesRegistry, cli: &Cli, command: Commands) -> CommandResult {
    let prefs = registry.get(&cli.file)?;

    match command {
        Commands::Save(args) => {
            let settings = AppSettings {
                main_id: args.main_id,
                open_count: args.open_count,
                home_message: args.home_message,
                greeting_message: args.greeting_message,
                is_sound_enabled: args.sound_enabled,
            };

            if args.commit {
                if !prefs.put_record_and_commit(&settings)? {
                    return Err(eyre!("Failed to write app settings to {:?}", cli.file));
                }
            } else {
                prefs.put_record_and_apply(&settings)?;
            }
            Ok("Successfully saved the app settings!".into())
        }

        Commands::Show => {
            let Some(settings) = prefs.get_record::<AppSettings>()? else {
                return Err(eyre!("No app settings stored in {:?}", cli.file));
            };

            match cli.output {
                Output::Json => Ok(CommandOutput::Object(serde_json::to_value(&settings)?)),
                _ => Ok(settings.to_string().into()),
            }
        }

        Commands::Put { key, value, kind } => {
            let value = kind.parse(&value)?;
            if !prefs.put_and_commit(key.as_str(), value)? {
                return Err(eyre!("Failed to write {key:?} to {:?}", cli.file));
            }
            Ok(format!("Stored {key}").into())
        }

        Commands::Get { key, kind, default } => {
            let default = match default {
                Some(text) => kind.parse(&text)?,
                None => kind.zero(),
            };
            let value = read_value(&prefs, &key, default)?;

            match cli.output {
                Output::Json => Ok(CommandOutput::Object(serde_json::json!({
                    "key": key,
                    "value": value,
                }))),
                _ => Ok(plain_value(&value).into()),
            }
        }

        Commands::Remove { key } => {
            if !prefs.remove_and_commit(key.as_str())? {
                return Err(eyre!("Failed to remove {key:?} from {:?}", cli.file));
            }
            Ok(format!("Removed {key}").into())
        }
    }
}

/// Read `key` as the type of `default`, falling back to `default` itself.
fn read_value(
    prefs: &PreferencesManager,
    key: &str,
    default: PrefValue,
) -> Result<PrefValue, ManagerError> {
    Ok(match default {
        PrefValue::Bool(d) => PrefValue::Bool(prefs.get(key, d)?),
        PrefValue::Int(d) => PrefValue::Int(prefs.get(key, d)?),
        PrefValue::Long(d) => PrefValue::Long(prefs.get(key, d)?),
        PrefValue::Float(d) => PrefValue::Float(prefs.get(key, d)?),
        PrefValue::String(d) => PrefValue::String(prefs.get(key, d)?),
        PrefValue::StringSet(d) => PrefValue::StringSet(prefs.get(key, d)?),
    })
}
