//! Media assets and their color bindings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use maison_core::{AssetId, Color, DomainError, DomainResult, Entity};

/// What a media asset is, presentation-wise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    AnimatedImage,
}

impl MediaKind {
    /// Motion media sorts before stills in color-scoped views.
    pub fn is_motion(self) -> bool {
        matches!(self, Self::Video | Self::AnimatedImage)
    }
}

/// One media asset owned by a product.
///
/// Identity is the surrogate [`AssetId`] assigned at creation; URLs are not
/// unique and must never be used as keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    id: AssetId,
    url: String,
    kind: MediaKind,
    color: Option<Color>,
    display_order: u32,
}

impl MediaAsset {
    /// Stage a fresh asset. Rejects a blank URL/handle.
    pub fn new(
        url: impl Into<String>,
        kind: MediaKind,
        color: Option<Color>,
        display_order: u32,
    ) -> DomainResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(DomainError::empty("media url"));
        }
        Ok(Self {
            id: AssetId::new(),
            url,
            kind,
            color,
            display_order,
        })
    }

    /// Rehydrate a persisted asset under its durable identity.
    pub fn from_persisted(
        id: AssetId,
        url: impl Into<String>,
        kind: MediaKind,
        color: Option<Color>,
        display_order: u32,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            kind,
            color,
            display_order,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn color(&self) -> Option<&Color> {
        self.color.as_ref()
    }

    pub fn display_order(&self) -> u32 {
        self.display_order
    }
}

impl Entity for MediaAsset {
    type Id = AssetId;

    fn id(&self) -> &AssetId {
        &self.id
    }
}

/// Set or clear the color tag on one asset.
pub fn assign_color(
    assets: &mut [MediaAsset],
    id: AssetId,
    color: Option<Color>,
) -> DomainResult<()> {
    let asset = assets
        .iter_mut()
        .find(|a| *a.id() == id)
        .ok_or(DomainError::NotFound)?;
    asset.color = color;
    Ok(())
}

/// Stable grouping by color tag: groups appear in first-seen order and each
/// group preserves the original asset order.
pub fn group_by_color(assets: &[MediaAsset]) -> Vec<(Option<Color>, Vec<MediaAsset>)> {
    let mut groups: Vec<(Option<Color>, Vec<MediaAsset>)> = Vec::new();
    for asset in assets {
        match groups.iter_mut().find(|(tag, _)| *tag == asset.color) {
            Some((_, members)) => members.push(asset.clone()),
            None => groups.push((asset.color.clone(), vec![asset.clone()])),
        }
    }
    groups
}

/// Assets visible in the view scoped to `selected`.
///
/// Tagged assets match case-insensitively (colors normalize at
/// construction). Untagged assets are *default-visible*: they show for every
/// color exactly until the product has at least one tagged asset, then only
/// in the all-media view. Motion media sorts before stills, ties broken by
/// display order.
pub fn filter_for_color(assets: &[MediaAsset], selected: &Color) -> Vec<MediaAsset> {
    let any_tagged = assets.iter().any(|a| a.color.is_some());
    let mut visible: Vec<MediaAsset> = assets
        .iter()
        .filter(|a| match &a.color {
            Some(tag) => tag == selected,
            None => !any_tagged,
        })
        .cloned()
        .collect();
    visible.sort_by_key(|a| (!a.kind.is_motion(), a.display_order));
    visible
}

/// Reconcile previously persisted assets with the ones staged this session.
///
/// `replace_all` discards the existing set in favor of the staged one;
/// otherwise existing assets survive with any color reassignments applied
/// (keyed by [`AssetId`]) and staged assets follow. Display order is
/// renumbered sequentially over the result.
pub fn reconcile(
    existing: Vec<MediaAsset>,
    staged: Vec<MediaAsset>,
    color_overrides: &HashMap<AssetId, Option<Color>>,
    replace_all: bool,
) -> Vec<MediaAsset> {
    let mut merged = if replace_all {
        staged
    } else {
        let mut kept = existing;
        for asset in &mut kept {
            if let Some(tag) = color_overrides.get(asset.id()) {
                asset.color = tag.clone();
            }
        }
        kept.extend(staged);
        kept
    };
    for (order, asset) in merged.iter_mut().enumerate() {
        asset.display_order = order as u32;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(label: &str) -> Color {
        Color::parse(label).unwrap()
    }

    fn asset(url: &str, kind: MediaKind, tag: Option<&str>, order: u32) -> MediaAsset {
        MediaAsset::new(url, kind, tag.map(color), order).unwrap()
    }

    #[test]
    fn blank_url_is_rejected() {
        assert!(MediaAsset::new("  ", MediaKind::Image, None, 0).is_err());
    }

    #[test]
    fn assign_color_sets_and_clears_one_tag() {
        let mut assets = vec![
            asset("a.jpg", MediaKind::Image, None, 0),
            asset("b.jpg", MediaKind::Image, None, 1),
        ];
        let id = *assets[0].id();

        assign_color(&mut assets, id, Some(color("Red"))).unwrap();
        assert_eq!(assets[0].color(), Some(&color("red")));
        assert_eq!(assets[1].color(), None);

        assign_color(&mut assets, id, None).unwrap();
        assert_eq!(assets[0].color(), None);
    }

    #[test]
    fn assign_color_to_unknown_asset_is_not_found() {
        let mut assets = vec![asset("a.jpg", MediaKind::Image, None, 0)];
        let err = assign_color(&mut assets, AssetId::new(), None).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn grouping_is_stable_and_first_seen() {
        let assets = vec![
            asset("a.jpg", MediaKind::Image, Some("Red"), 0),
            asset("b.jpg", MediaKind::Image, None, 1),
            asset("c.jpg", MediaKind::Image, Some("red"), 2),
            asset("d.jpg", MediaKind::Image, Some("Blue"), 3),
        ];
        let groups = group_by_color(&assets);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, Some(color("red")));
        let reds: Vec<&str> = groups[0].1.iter().map(|a| a.url()).collect();
        assert_eq!(reds, vec!["a.jpg", "c.jpg"]);
        assert_eq!(groups[1].0, None);
        assert_eq!(groups[2].0, Some(color("blue")));
    }

    #[test]
    fn untagged_assets_are_default_visible_until_any_tagging() {
        // Scenario: nothing tagged; every color sees everything.
        let assets = vec![
            asset("a.jpg", MediaKind::Image, None, 0),
            asset("b.jpg", MediaKind::Image, None, 1),
        ];
        let visible = filter_for_color(&assets, &color("Red"));
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn tagging_anything_suppresses_untagged_in_color_views() {
        // Scenario: one Red-tagged, one untagged.
        let assets = vec![
            asset("red.jpg", MediaKind::Image, Some("Red"), 0),
            asset("any.jpg", MediaKind::Image, None, 1),
        ];

        let blue_view = filter_for_color(&assets, &color("Blue"));
        assert!(blue_view.is_empty());

        let red_view = filter_for_color(&assets, &color("Red"));
        assert_eq!(red_view.len(), 1);
        assert_eq!(red_view[0].url(), "red.jpg");
    }

    #[test]
    fn color_match_is_case_insensitive() {
        let assets = vec![asset("r.jpg", MediaKind::Image, Some("#FF0000"), 0)];
        let visible = filter_for_color(&assets, &color("#ff0000"));
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn motion_media_sorts_before_stills() {
        let assets = vec![
            asset("1.jpg", MediaKind::Image, Some("Red"), 0),
            asset("2.mp4", MediaKind::Video, Some("Red"), 1),
            asset("3.gif", MediaKind::AnimatedImage, Some("Red"), 2),
            asset("4.jpg", MediaKind::Image, Some("Red"), 3),
        ];
        let visible = filter_for_color(&assets, &color("Red"));
        let urls: Vec<&str> = visible.iter().map(|a| a.url()).collect();
        assert_eq!(urls, vec!["2.mp4", "3.gif", "1.jpg", "4.jpg"]);
    }

    #[test]
    fn reconcile_appends_staged_after_existing() {
        let existing = vec![asset("old.jpg", MediaKind::Image, None, 0)];
        let staged = vec![asset("new.jpg", MediaKind::Image, Some("Red"), 0)];
        let merged = reconcile(existing, staged, &HashMap::new(), false);
        let urls: Vec<&str> = merged.iter().map(|a| a.url()).collect();
        assert_eq!(urls, vec!["old.jpg", "new.jpg"]);
        let orders: Vec<u32> = merged.iter().map(|a| a.display_order()).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn reconcile_replace_all_keeps_staged_only() {
        let existing = vec![asset("old.jpg", MediaKind::Image, None, 0)];
        let staged = vec![asset("new.jpg", MediaKind::Image, None, 7)];
        let merged = reconcile(existing, staged, &HashMap::new(), true);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].url(), "new.jpg");
        assert_eq!(merged[0].display_order(), 0);
    }

    #[test]
    fn reconcile_applies_overrides_by_identity_not_url() {
        // Two existing assets share a URL; only the targeted one changes.
        let first = asset("same.jpg", MediaKind::Image, None, 0);
        let second = asset("same.jpg", MediaKind::Image, None, 1);
        let target = *second.id();

        let mut overrides = HashMap::new();
        overrides.insert(target, Some(color("Blue")));

        let merged = reconcile(vec![first, second], Vec::new(), &overrides, false);
        assert_eq!(merged[0].color(), None);
        assert_eq!(merged[1].color(), Some(&color("blue")));
    }

    #[test]
    fn reconcile_can_clear_a_tag() {
        let existing = asset("a.jpg", MediaKind::Image, Some("Red"), 0);
        let id = *existing.id();
        let mut overrides = HashMap::new();
        overrides.insert(id, None);

        let merged = reconcile(vec![existing], Vec::new(), &overrides, false);
        assert_eq!(merged[0].color(), None);
    }
}
