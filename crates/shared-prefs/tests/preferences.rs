//! End-to-end behaviour of registries, managers and records over both backends.

use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};
use shared_prefs::{
    register_record, store::MemoryBackend, Json, Preference, PreferencesContext,
    PreferencesRegistry, StoreConfiguration,
};

const PREFERENCES_FILE_NAME: &str = "app_preferences";

#[derive(Debug, Clone, PartialEq)]
struct AppSettings {
    main_id: i32,
    open_count: i32,
    home_message: String,
    greeting_message: String,
    is_sound_enabled: bool,
}

register_record!(AppSettings, "AppSettings" {
    main_id => "mainId",
    open_count => "openCount",
    home_message => "homeMessage",
    greeting_message => "greetingMessage",
    is_sound_enabled => "isSoundEnabled",
});

fn demo_settings() -> AppSettings {
    AppSettings {
        main_id: 13,
        open_count: 1,
        home_message: "This is the Home message.".to_string(),
        greeting_message: "Hello there my friend!".to_string(),
        is_sound_enabled: true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Window {
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, PartialEq)]
struct Layout {
    window: Json<Window>,
    theme: Option<String>,
    pinned: BTreeSet<String>,
}

register_record!(Layout, "Layout" {
    window => "window",
    theme => "theme",
    pinned => "pinned",
});

#[test]
fn test_record_round_trip() {
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::InMemory);
    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();

    assert_eq!(prefs.get_record::<AppSettings>().unwrap(), None);

    assert!(prefs.put_record_and_commit(&demo_settings()).unwrap());
    assert_eq!(
        prefs.get_record::<AppSettings>().unwrap(),
        Some(demo_settings())
    );
    assert_eq!(prefs.get("AppSettings.mainId", 0).unwrap(), 13);
}

#[test]
fn test_record_with_nested_and_optional_fields() {
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::InMemory);
    let prefs = registry.get("layout").unwrap();

    let layout = Layout {
        window: Json(Window {
            width: 1280,
            height: 720,
        }),
        theme: Some("dark".to_string()),
        pinned: ["inbox", "drafts"].into_iter().map(String::from).collect(),
    };
    prefs.put_record_and_commit(&layout).unwrap();
    assert_eq!(prefs.get_record::<Layout>().unwrap(), Some(layout.clone()));

    // Clearing an optional field removes its key
    let without_theme = Layout {
        theme: None,
        ..layout
    };
    prefs.put_record_and_commit(&without_theme).unwrap();
    assert!(!prefs.contains("Layout.theme").unwrap());
    assert_eq!(prefs.get_record::<Layout>().unwrap(), Some(without_theme));
}

#[test]
fn test_partial_record_is_rejected() {
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::InMemory);
    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();

    prefs.put_record_and_commit(&demo_settings()).unwrap();
    prefs.remove_and_commit("AppSettings.homeMessage").unwrap();
    assert_eq!(prefs.get_record::<AppSettings>().unwrap(), None);

    // A mistyped field rejects the record as well
    prefs
        .put_and_commit("AppSettings.homeMessage", 42)
        .unwrap();
    assert_eq!(prefs.get_record::<AppSettings>().unwrap(), None);
}

#[test]
fn test_fresh_registry_sees_committed_values() {
    let backend = Arc::new(MemoryBackend::new());

    let first = PreferencesRegistry::new(backend.clone());
    first
        .get(PREFERENCES_FILE_NAME)
        .unwrap()
        .put_and_commit("mainId", 13)
        .unwrap();

    let second = PreferencesRegistry::new(backend);
    let prefs = second.get(PREFERENCES_FILE_NAME).unwrap();
    assert_eq!(prefs.get("mainId", 0).unwrap(), 13);
}

#[test]
fn test_sqlite_survives_new_registry() {
    let dir = tempfile::tempdir().unwrap();
    let configuration = StoreConfiguration::Sqlite {
        folder_path: dir.path().to_path_buf(),
    };

    {
        let registry = PreferencesRegistry::from_configuration(configuration.clone());
        let prefs = registry.shared_preferences_manager(PREFERENCES_FILE_NAME).unwrap();
        prefs
            .put_all([
                Preference::value("mainId", 13),
                Preference::value("lastSync", 1_700_000_000_i64),
                Preference::record(&demo_settings()).unwrap(),
            ])
            .unwrap();
        prefs.apply().unwrap();
        registry.wait_for_pending_writes();
    }

    let registry = PreferencesRegistry::from_configuration(configuration);
    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    assert_eq!(prefs.get("mainId", 0).unwrap(), 13);
    assert_eq!(prefs.get("lastSync", 0_i64).unwrap(), 1_700_000_000);
    assert_eq!(
        prefs.get_record::<AppSettings>().unwrap(),
        Some(demo_settings())
    );
}

#[test]
fn test_files_do_not_share_keys() {
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::InMemory);

    registry
        .get("app_preferences")
        .unwrap()
        .put_and_commit("k", "app")
        .unwrap();
    let other = registry.get("other_file").unwrap();

    assert_eq!(other.get("k", String::from("unset")).unwrap(), "unset");
}

#[test]
fn test_edge_values_survive_sqlite_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let configuration = StoreConfiguration::Sqlite {
        folder_path: dir.path().to_path_buf(),
    };
    let empty = BTreeSet::<String>::new();
    let tags: BTreeSet<String> = ["", "ünïcødé", "a,b"].into_iter().map(String::from).collect();

    {
        let registry = PreferencesRegistry::from_configuration(configuration.clone());
        let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
        prefs
            .put_all([
                Preference::value("intMin", i32::MIN),
                Preference::value("intMax", i32::MAX),
                Preference::value("longMin", i64::MIN),
                Preference::value("longMax", i64::MAX),
                Preference::value("floatNan", f32::NAN),
                Preference::value("floatInf", f32::INFINITY),
                Preference::value("floatNegInf", f32::NEG_INFINITY),
                Preference::value("floatTiny", f32::MIN_POSITIVE),
                Preference::value("floatMax", f32::MAX),
                Preference::value("emptyString", ""),
                Preference::value("quoted", "\"{}\"\n"),
                Preference::value("emptySet", empty.clone()),
                Preference::value("tags", tags.clone()),
            ])
            .unwrap();
        assert!(prefs.commit().unwrap());
    }

    let registry = PreferencesRegistry::from_configuration(configuration);
    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    assert_eq!(prefs.get("intMin", 0).unwrap(), i32::MIN);
    assert_eq!(prefs.get("intMax", 0).unwrap(), i32::MAX);
    assert_eq!(prefs.get("longMin", 0_i64).unwrap(), i64::MIN);
    assert_eq!(prefs.get("longMax", 0_i64).unwrap(), i64::MAX);
    assert!(prefs.get("floatNan", 0.0_f32).unwrap().is_nan());
    assert_eq!(prefs.get("floatInf", -1.0_f32).unwrap(), f32::INFINITY);
    assert_eq!(prefs.get("floatNegInf", -1.0_f32).unwrap(), f32::NEG_INFINITY);
    assert_eq!(prefs.get("floatTiny", -1.0_f32).unwrap(), f32::MIN_POSITIVE);
    assert_eq!(prefs.get("floatMax", -1.0_f32).unwrap(), f32::MAX);
    assert_eq!(prefs.get("emptyString", String::from("unset")).unwrap(), "");
    assert_eq!(prefs.get("quoted", String::new()).unwrap(), "\"{}\"\n");
    assert!(prefs.contains("emptySet").unwrap());
    assert_eq!(prefs.get("emptySet", tags.clone()).unwrap(), empty);
    assert_eq!(prefs.get("tags", BTreeSet::<String>::new()).unwrap(), tags);
}

#[test]
fn test_lookup_after_manager_recycle() {
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::InMemory);

    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    prefs.put_record(&demo_settings()).unwrap();
    prefs.recycle();

    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    assert_eq!(
        prefs.get_record::<AppSettings>().unwrap(),
        Some(demo_settings())
    );
    assert!(prefs.put_and_commit("AppSettings.openCount", 2).unwrap());
}

#[test]
fn test_applied_values_survive_registry_recycle() {
    let dir = tempfile::tempdir().unwrap();
    let registry = PreferencesRegistry::from_configuration(StoreConfiguration::Sqlite {
        folder_path: dir.path().to_path_buf(),
    });

    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    prefs.put_record_and_apply(&demo_settings()).unwrap();
    registry.recycle();

    let prefs = registry.get(PREFERENCES_FILE_NAME).unwrap();
    assert_eq!(prefs.get("AppSettings.mainId", 0).unwrap(), 13);
    assert_eq!(
        prefs.get_record::<AppSettings>().unwrap(),
        Some(demo_settings())
    );
}
