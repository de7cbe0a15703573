//! Tests for the scraper configuration system.

use vermeer_core::{AssetKind, ScraperConfig, SourceId};

#[test]
fn test_load_bundled_defaults() {
    let config = ScraperConfig::load().unwrap();

    // Bundled defaults configure the network sources
    assert!(config.sources.contains_key(&SourceId::Igdb));
    assert!(config.sources.contains_key(&SourceId::SteamGridDb));

    // SteamGridDB leads for icons, IGDB for titles
    let grid = config.source(SourceId::SteamGridDb);
    assert_eq!(grid.priority(AssetKind::Icon), 1);
    assert!(grid.square_icon_priority);

    let igdb = config.source(SourceId::Igdb);
    assert_eq!(igdb.priority(AssetKind::Title), 1);
    assert!(!igdb.is_enabled(AssetKind::Logo));

    assert!(config.title_as_icon);
}

#[test]
fn test_config_from_file() {
    use std::io::Write;
    use tempfile::Builder;

    // Create a temporary config file with .toml extension
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
title_as_icon = false

[sources.igdb.rules.hero]
enabled = true
priority = 7
only_if_none_found = true

[sources.igdb.limits]
query_capacity = 9
"#
    )
    .unwrap();

    let config = ScraperConfig::from_file(temp_file.path()).unwrap();

    assert!(!config.title_as_icon);
    let igdb = config.source(SourceId::Igdb);
    assert_eq!(igdb.priority(AssetKind::Hero), 7);
    assert!(igdb.only_if_none_found(AssetKind::Hero));
    assert_eq!(igdb.limits.query_capacity, 9);
    // Unspecified limit fields keep their defaults
    assert_eq!(igdb.limits.download_capacity, 2);
}

#[test]
fn test_unknown_source_falls_back_to_defaults() {
    let config = ScraperConfig::default();
    let paste = config.source(SourceId::Paste);

    // Default rule: enabled, no fallback flag, priority 10, all styles
    assert!(paste.is_enabled(AssetKind::Icon));
    assert!(!paste.only_if_none_found(AssetKind::Icon));
    assert_eq!(paste.priority(AssetKind::Icon), 10);
    assert!(paste.allows_style(AssetKind::Icon, Some("anything")));
}

#[test]
fn test_style_list_filters_only_tagged_candidates() {
    let mut config = ScraperConfig::default();
    let mut grid = vermeer_core::SourceConfig::default();
    grid.rules.insert(
        AssetKind::Logo,
        vermeer_core::KindRule {
            enabled: true,
            only_if_none_found: false,
            priority: 1,
            styles: vec!["white".into()],
        },
    );
    config.sources.insert(SourceId::SteamGridDb, grid);

    let grid = config.source(SourceId::SteamGridDb);
    assert!(grid.allows_style(AssetKind::Logo, Some("white")));
    assert!(!grid.allows_style(AssetKind::Logo, Some("black")));
    // Untagged candidates always pass; not every provider reports styles
    assert!(grid.allows_style(AssetKind::Logo, None));
}

#[test]
fn test_platform_translation_passes_unknown_names_through() {
    let config = ScraperConfig::load().unwrap();
    let igdb = config.source(SourceId::Igdb);

    assert_eq!(
        igdb.translate_platform("Sega Genesis"),
        "Sega Mega Drive/Genesis"
    );
    assert_eq!(igdb.translate_platform("PC"), "PC");
}
