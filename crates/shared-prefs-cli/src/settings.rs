use serde::Serialize;
use shared_prefs::register_record;

/// The settings record the demo stores and shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppSettings {
    pub main_id: i32,
    pub open_count: i32,
    pub home_message: String,
    pub greeting_message: String,
    pub is_sound_enabled: bool,
}

register_record!(AppSettings, "AppSettings" {
    main_id => "mainId",
    open_count => "openCount",
    home_message => "homeMessage",
    greeting_message => "greetingMessage",
    is_sound_enabled => "isSoundEnabled",
});

impl std::fmt::Display for AppSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "mainId: {}", self.main_id)?;
        writeln!(f, "openCount: {}", self.open_count)?;
        writeln!(f, "homeMessage: {}", self.home_message)?;
        writeln!(f, "greetingMessage: {}", self.greeting_message)?;
        write!(f, "isSoundEnabled: {}", self.is_sound_enabled)
    }
}
