//! Reconciling per-source results into one ranked context.
//!
//! Rule order is fixed: style filter, then the fallback rule, then a stable
//! ascending priority sort, then square-icon promotion within each
//! (source, priority) tier, then title-as-icon substitution. Promotion runs
//! inside tiers only, so it can never override an explicit priority win.

use strum::IntoEnumIterator;
use tracing::debug;
use vermeer_core::{AssetKind, Media, MediaContext, ScraperConfig, SourceId};
use vermeer_sources::SourceResult;

/// Merge all per-source results into a ranked context.
///
/// `results` must be in the order the sources were queried; within one
/// source, candidates are in provider arrival order. The output ordering is
/// deterministic for a fixed input arrival.
pub(crate) fn merge_context(
    config: &ScraperConfig,
    results: &[(SourceId, SourceResult)],
) -> MediaContext {
    let mut context = MediaContext::new();
    for kind in AssetKind::iter() {
        *context.list_mut(kind) = merge_kind(config, results, kind);
    }

    // Cross-kind substitution: a title can stand in for a missing icon.
    // The candidate is duplicated, not moved, and keeps its source.
    if config.title_as_icon && context.icons.is_empty() {
        if let Some(best_title) = context.titles.first().cloned() {
            debug!("No icon candidates; duplicating best title into icons");
            context.icons.push(best_title);
        }
    }

    context
}

/// Merge one asset kind across all sources.
fn merge_kind(
    config: &ScraperConfig,
    results: &[(SourceId, SourceResult)],
    kind: AssetKind,
) -> Vec<Media> {
    struct Ranked {
        priority: u32,
        source: SourceId,
        promoted: bool,
        media: Media,
    }

    let mut regular: Vec<Ranked> = Vec::new();
    let mut fallback: Vec<Ranked> = Vec::new();

    for (source, result) in results {
        let source_config = config.source(*source);
        let rule = source_config.rule(kind);
        if !rule.enabled {
            continue;
        }

        let bucket = if rule.only_if_none_found {
            &mut fallback
        } else {
            &mut regular
        };

        for media in result.get(kind) {
            // Style filter runs before everything else.
            if !source_config.allows_style(kind, media.record().style.as_deref()) {
                continue;
            }
            let promoted = kind == AssetKind::Icon
                && source_config.square_icon_priority
                && media.is_square();
            bucket.push(Ranked {
                priority: rule.priority,
                source: *source,
                promoted,
                media: media.clone(),
            });
        }
    }

    // Fallback-only sources contribute only when nobody else did.
    let mut merged = if regular.is_empty() { fallback } else { regular };

    // Stable ascending priority sort; ties keep source arrival order, and
    // promoted squares move to the front of their own (source, priority)
    // tier only. The source component of the key pins the arrival grouping
    // inside a priority tie.
    let arrival_rank: Vec<SourceId> = merged.iter().map(|r| r.source).collect();
    let source_order = |s: SourceId| arrival_rank.iter().position(|&x| x == s).unwrap_or(0);
    merged.sort_by_key(|r| (r.priority, source_order(r.source), !r.promoted as u8));

    merged.into_iter().map(|r| r.media).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vermeer_core::{Image, KindRule, MediaRecord, SourceConfig};

    fn image(source: SourceId, url: &str, w: u32, h: u32) -> Media {
        Media::Image(Image::new(MediaRecord::new(url, "png", source), w, h))
    }

    fn styled_image(source: SourceId, url: &str, style: &str) -> Media {
        Media::Image(Image::new(
            MediaRecord::new(url, "png", source).with_style(style),
            600,
            600,
        ))
    }

    fn config_with(sources: Vec<(SourceId, SourceConfig)>) -> ScraperConfig {
        ScraperConfig {
            sources: sources.into_iter().collect(),
            title_as_icon: false,
            max_concurrent_sources: None,
        }
    }

    fn source_config(priority: u32, only_if_none_found: bool) -> SourceConfig {
        let mut config = SourceConfig::default();
        config.rules.insert(
            AssetKind::Icon,
            KindRule {
                enabled: true,
                only_if_none_found,
                priority,
                styles: Vec::new(),
            },
        );
        config
    }

    #[test]
    fn priority_sort_is_stable_on_ties() {
        let config = config_with(vec![
            (SourceId::Igdb, source_config(1, false)),
            (SourceId::SteamGridDb, source_config(1, false)),
        ]);

        let mut igdb = SourceResult::new();
        igdb.push(AssetKind::Icon, image(SourceId::Igdb, "a", 10, 20));
        igdb.push(AssetKind::Icon, image(SourceId::Igdb, "b", 10, 20));
        let mut grid = SourceResult::new();
        grid.push(AssetKind::Icon, image(SourceId::SteamGridDb, "c", 10, 20));

        let results = vec![(SourceId::Igdb, igdb), (SourceId::SteamGridDb, grid)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        let urls: Vec<_> = merged.iter().map(|m| m.record().url.as_str()).collect();
        assert_eq!(urls, vec!["a", "b", "c"]);
    }

    #[test]
    fn lower_priority_number_wins() {
        let config = config_with(vec![
            (SourceId::Igdb, source_config(5, false)),
            (SourceId::SteamGridDb, source_config(1, false)),
        ]);

        let mut igdb = SourceResult::new();
        igdb.push(AssetKind::Icon, image(SourceId::Igdb, "late", 10, 20));
        let mut grid = SourceResult::new();
        grid.push(AssetKind::Icon, image(SourceId::SteamGridDb, "first", 10, 20));

        let results = vec![(SourceId::Igdb, igdb), (SourceId::SteamGridDb, grid)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        assert_eq!(merged[0].record().url, "first");
        assert_eq!(merged[1].record().url, "late");
    }

    #[test]
    fn fallback_source_excluded_when_regular_supplied() {
        // Source A: priority 1, two icons. Source B: priority 2, fallback
        // only, one icon. Merged icons must be A's two in original order.
        let config = config_with(vec![
            (SourceId::Igdb, source_config(1, false)),
            (SourceId::SteamGridDb, source_config(2, true)),
        ]);

        let mut a = SourceResult::new();
        a.push(AssetKind::Icon, image(SourceId::Igdb, "a1", 10, 20));
        a.push(AssetKind::Icon, image(SourceId::Igdb, "a2", 10, 20));
        let mut b = SourceResult::new();
        b.push(AssetKind::Icon, image(SourceId::SteamGridDb, "b1", 10, 20));

        let results = vec![(SourceId::Igdb, a), (SourceId::SteamGridDb, b)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        let urls: Vec<_> = merged.iter().map(|m| m.record().url.as_str()).collect();
        assert_eq!(urls, vec!["a1", "a2"]);
    }

    #[test]
    fn fallback_source_used_when_nobody_else_found_anything() {
        let config = config_with(vec![
            (SourceId::Igdb, source_config(1, false)),
            (SourceId::SteamGridDb, source_config(2, true)),
        ]);

        let a = SourceResult::new();
        let mut b = SourceResult::new();
        b.push(AssetKind::Icon, image(SourceId::SteamGridDb, "b1", 10, 20));

        let results = vec![(SourceId::Igdb, a), (SourceId::SteamGridDb, b)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].record().url, "b1");
    }

    #[test]
    fn style_filter_runs_before_ranking() {
        let mut source = source_config(1, false);
        source.rules.get_mut(&AssetKind::Icon).unwrap().styles = vec!["official".into()];
        let config = config_with(vec![(SourceId::SteamGridDb, source)]);

        let mut result = SourceResult::new();
        result.push(
            AssetKind::Icon,
            styled_image(SourceId::SteamGridDb, "keep", "official"),
        );
        result.push(
            AssetKind::Icon,
            styled_image(SourceId::SteamGridDb, "drop", "alternate"),
        );

        let results = vec![(SourceId::SteamGridDb, result)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].record().url, "keep");
    }

    #[test]
    fn square_icons_promoted_within_their_tier() {
        let mut promoting = source_config(1, false);
        promoting.square_icon_priority = true;
        let config = config_with(vec![
            (SourceId::SteamGridDb, promoting),
            (SourceId::Igdb, source_config(2, false)),
        ]);

        let mut grid = SourceResult::new();
        grid.push(AssetKind::Icon, image(SourceId::SteamGridDb, "wide", 300, 200));
        grid.push(AssetKind::Icon, image(SourceId::SteamGridDb, "square", 256, 256));
        let mut igdb = SourceResult::new();
        igdb.push(AssetKind::Icon, image(SourceId::Igdb, "igdb-square", 64, 64));

        let results = vec![(SourceId::SteamGridDb, grid), (SourceId::Igdb, igdb)];
        let merged = merge_kind(&config, &results, AssetKind::Icon);

        let urls: Vec<_> = merged.iter().map(|m| m.record().url.as_str()).collect();
        // Square jumps ahead of wide within SteamGridDb's tier; IGDB's
        // square stays behind because its priority number is higher and it
        // has no promotion flag anyway.
        assert_eq!(urls, vec!["square", "wide", "igdb-square"]);
    }

    #[test]
    fn disabled_kind_contributes_nothing() {
        let mut source = source_config(1, false);
        source.rules.get_mut(&AssetKind::Icon).unwrap().enabled = false;
        let config = config_with(vec![(SourceId::Igdb, source)]);

        let mut result = SourceResult::new();
        result.push(AssetKind::Icon, image(SourceId::Igdb, "a", 10, 20));

        let results = vec![(SourceId::Igdb, result)];
        assert!(merge_kind(&config, &results, AssetKind::Icon).is_empty());
    }

    #[test]
    fn title_as_icon_duplicates_best_title() {
        let mut config = config_with(vec![(SourceId::Igdb, {
            let mut c = source_config(1, false);
            c.rules.insert(AssetKind::Title, KindRule::default());
            c
        })]);
        config.title_as_icon = true;

        let mut result = SourceResult::new();
        result.push(AssetKind::Title, image(SourceId::Igdb, "boxart", 600, 800));

        let results = vec![(SourceId::Igdb, result)];
        let context = merge_context(&config, &results);

        // The title list still owns its candidate; icons got a copy with
        // the source field unchanged.
        assert_eq!(context.titles.len(), 1);
        assert_eq!(context.icons.len(), 1);
        assert_eq!(context.icons[0], context.titles[0]);
        assert_eq!(context.icons[0].record().source, SourceId::Igdb);
    }

    #[test]
    fn title_as_icon_disabled_leaves_icons_empty() {
        let config = config_with(vec![(SourceId::Igdb, source_config(1, false))]);

        let mut result = SourceResult::new();
        result.push(AssetKind::Title, image(SourceId::Igdb, "boxart", 600, 800));

        let results = vec![(SourceId::Igdb, result)];
        let context = merge_context(&config, &results);
        assert!(context.icons.is_empty());
    }
}
