use clap::ValueEnum;
use shared_prefs::PrefValue;

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub(crate) enum Output {
    Plain,
    Json,
    None,
}

pub(crate) enum CommandOutput {
    Plain(String),
    Object(serde_json::Value),
}
pub(crate) type CommandResult = color_eyre::eyre::Result<CommandOutput>;

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        CommandOutput::Plain(text.to_owned())
    }
}
impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Plain(text)
    }
}

/// Plain text form of a value, as accepted back by `prefs put`.
pub(crate) fn plain_value(value: &PrefValue) -> String {
    match value {
        PrefValue::Bool(v) => v.to_string(),
        PrefValue::Int(v) => v.to_string(),
        PrefValue::Long(v) => v.to_string(),
        PrefValue::Float(v) => v.to_string(),
        PrefValue::String(v) => v.clone(),
        PrefValue::StringSet(v) => v.iter().cloned().collect::<Vec<_>>().join(","),
    }
}

pub(crate) fn render_result(output: Output, result: CommandResult) -> color_eyre::eyre::Result<()> {
    match result {
        // Errors will be passed through to the caller, and rendered by the main function
        Err(e) => Err(e),

        Ok(_) if output == Output::None => Ok(()),

        Ok(CommandOutput::Plain(text)) => {
            if output == Output::Json {
                println!("{}", serde_json::to_string_pretty(&text)?);
            } else {
                println!("{text}");
            }
            Ok(())
        }

        Ok(CommandOutput::Object(obj)) => {
            println!("{}", serde_json::to_string_pretty(&obj)?);
            Ok(())
        }
    }
}
