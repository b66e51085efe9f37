//! Property-based tests for settings persistence through `ConfigManager`

use keepmerge_core::config::{ConfigManager, LoggingSettings, MergeSettings, OutputSettings};
use keepmerge_core::WriteOptions;
use proptest::prelude::*;
use tempfile::TempDir;

// ========== Generators ==========

// Doctype names, including blank ones that disable the doctype line
fn arb_doctype() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[A-Z][A-Z_]{0,23}",
    ]
}

fn arb_level() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("error".to_string()),
        Just("warn".to_string()),
        Just("info".to_string()),
        Just("keepmerge_core=debug".to_string()),
    ]
}

fn arb_settings() -> impl Strategy<Value = MergeSettings> {
    (any::<bool>(), arb_doctype(), arb_level()).prop_map(|(xml_declaration, doctype, level)| {
        MergeSettings {
            output: OutputSettings {
                xml_declaration,
                doctype: Some(doctype),
            },
            logging: LoggingSettings { level },
        }
    })
}

// ========== Properties ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Saved settings load back unchanged
    #[test]
    fn prop_settings_round_trip(settings in arb_settings()) {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp.path().to_path_buf());

        manager.save_settings(&settings).unwrap();
        let loaded = manager.load_settings().unwrap();

        prop_assert_eq!(loaded, settings);
    }

    /// A doctype line is written exactly when the configured name is not blank
    #[test]
    fn prop_blank_doctype_disables_line(settings in arb_settings()) {
        let options = WriteOptions::from(&settings.output);
        let configured = settings.output.doctype.as_deref().unwrap_or_default();

        prop_assert_eq!(options.doctype.is_some(), !configured.trim().is_empty());
        prop_assert_eq!(options.xml_declaration, settings.output.xml_declaration);
    }
}
