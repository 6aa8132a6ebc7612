use std::sync::Arc;

use super::*;
use crate::core::config::{ApiConfig, DEFAULT_BASE_URL};
use crate::core::storage::MemoryStore;

mod test_helpers {
    use super::*;

    pub(super) fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    pub(super) fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    pub(super) fn config_store() -> ConfigStore<Arc<MemoryStore>> {
        ConfigStore::new(Arc::new(MemoryStore::new()))
    }
}

use test_helpers::{config_store, parse_args, strings};

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["deepchat"]);
    assert!(args.command.is_none());
    assert!(args.model.is_none());
}

#[test]
fn model_flag_is_global() {
    let cases: [&[&str]; 3] = [
        &["deepchat", "-m", "deepseek-coder"],
        &["deepchat", "say", "-m", "deepseek-coder", "hello"],
        &["deepchat", "--model", "deepseek-coder", "models"],
    ];
    for argv in cases {
        let args = parse_args(argv);
        assert_eq!(
            args.model.as_deref(),
            Some("deepseek-coder"),
            "unexpected model for argv={argv:?}"
        );
    }
}

#[test]
fn say_collects_the_whole_prompt() {
    let args = parse_args(&["deepchat", "say", "what", "is", "--verbose", "mode?"]);
    match args.command {
        Some(Commands::Say { prompt }) => {
            assert_eq!(prompt, strings(&["what", "is", "--verbose", "mode?"]));
        }
        _ => panic!("expected say subcommand"),
    }
}

#[test]
fn set_and_delete_take_arguments() {
    match parse_args(&["deepchat", "set", "base-url", "https://example.com/v1"]).command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key, "base-url");
            assert_eq!(value, strings(&["https://example.com/v1"]));
        }
        _ => panic!("expected set subcommand"),
    }
    match parse_args(&["deepchat", "delete", "abc"]).command {
        Some(Commands::Delete { id }) => assert_eq!(id, "abc"),
        _ => panic!("expected delete subcommand"),
    }
    assert!(Args::try_parse_from(["deepchat", "delete"]).is_err());
}

#[test]
fn set_writes_each_key() {
    let store = config_store();

    let message = apply_setting(&store, "api-key", &strings(&["sk-abcdef123"]), SetAction::Set)
        .unwrap();
    assert_eq!(message, "✅ Set api-key to: ********f123");

    apply_setting(
        &store,
        "base-url",
        &strings(&["https://example.com/v1/"]),
        SetAction::Set,
    )
    .unwrap();
    apply_setting(&store, "model", &strings(&["deepseek-coder"]), SetAction::Set).unwrap();
    apply_setting(&store, "stream", &strings(&["off"]), SetAction::Set).unwrap();

    assert_eq!(
        store.get(),
        ApiConfig {
            api_key: "sk-abcdef123".to_string(),
            base_url: "https://example.com/v1".to_string(),
            model: "deepseek-coder".to_string(),
            stream: false,
        }
    );
}

#[test]
fn unset_restores_defaults() {
    let store = config_store();
    apply_setting(&store, "base-url", &strings(&["http://localhost:9"]), SetAction::Set).unwrap();
    apply_setting(&store, "stream", &strings(&["no"]), SetAction::Set).unwrap();

    apply_setting(&store, "base-url", &[], SetAction::Unset).unwrap();
    apply_setting(&store, "stream", &[], SetAction::Unset).unwrap();

    let config = store.get();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert!(config.stream);
}

#[test]
fn invalid_settings_write_nothing() {
    let store = config_store();

    assert!(matches!(
        apply_setting(&store, "colour", &strings(&["blue"]), SetAction::Set),
        Err(SettingError::UnknownKey(key)) if key == "colour"
    ));
    assert!(matches!(
        apply_setting(&store, "stream", &strings(&["maybe"]), SetAction::Set),
        Err(SettingError::InvalidBoolean(_))
    ));
    assert!(matches!(
        apply_setting(&store, "model", &[], SetAction::Set),
        Err(SettingError::MissingArgs { .. })
    ));

    assert_eq!(store.get(), ApiConfig::default());
}

#[test]
fn config_listing_masks_the_key() {
    let store = config_store();
    assert_eq!(
        format_config(&store),
        vec![
            "  api-key: (not set)".to_string(),
            format!("  base-url: {DEFAULT_BASE_URL}"),
            "  model: deepseek-chat".to_string(),
            "  stream: on".to_string(),
        ]
    );

    apply_setting(&store, "api-key", &strings(&["sk-1234567890"]), SetAction::Set).unwrap();
    assert_eq!(format_config(&store)[0], "  api-key: *********7890");
}

#[test]
fn session_model_override_is_not_saved() {
    let shared: SharedStore = Arc::new(MemoryStore::new());
    let controller = load_controller(Arc::clone(&shared), Some(" deepseek-math ".to_string()));
    assert_eq!(controller.config().model, "deepseek-math");
    assert_eq!(ConfigStore::new(shared).get().model, "deepseek-chat");
}
