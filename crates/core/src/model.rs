//! Content documents as published by the content backend.
//!
//! The player only ever holds read-only snapshots of these documents.
//! Deserialization is fail-soft: `null` or missing optional fields and
//! lists become `None` / empty, and unknown enum values map to a
//! catch-all variant instead of failing the whole fetch.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::DocumentId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default seconds before a secondary screen returns to the menu.
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Lower bound for the global default timeout.
pub const MIN_TIMEOUT_SECS: u32 = 5;

/// Upper bound for the global default timeout.
pub const MAX_TIMEOUT_SECS: u32 = 300;

/// Treat `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Convert a backend number of seconds into a usable whole-second value.
///
/// Non-finite and non-positive values are treated as absent.
fn whole_seconds(value: Option<f64>) -> Option<u32> {
    match value {
        Some(v) if v.is_finite() && v >= 1.0 => Some(v.round().min(u32::MAX as f64) as u32),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Shared small types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "nullable")]
    pub current: String,
}

/// `image { asset-> { url } }` projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub asset: Option<AssetRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(default)]
    pub url: Option<String>,
}

impl ImageRef {
    pub fn url(&self) -> Option<&str> {
        self.asset.as_ref().and_then(|a| a.url.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietaryTag {
    #[serde(rename = "VE")]
    Vegan,
    #[serde(rename = "V")]
    Vegetarian,
    #[serde(rename = "GF")]
    GlutenFree,
    #[serde(rename = "N")]
    Nuts,
    #[serde(rename = "ALC")]
    Alcohol,
    #[serde(other)]
    Unknown,
}

impl DietaryTag {
    /// Short label shown next to an item.
    pub fn label(self) -> &'static str {
        match self {
            DietaryTag::Vegan => "VE",
            DietaryTag::Vegetarian => "V",
            DietaryTag::GlutenFree => "GF",
            DietaryTag::Nuts => "N",
            DietaryTag::Alcohol => "ALC",
            DietaryTag::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityOverride {
    #[default]
    UseInventory,
    AlwaysAvailable,
    ForceUnavailable,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetaCategory {
    DrinkMe,
    EatMe,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Inline,
    #[default]
    #[serde(other)]
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenType {
    SectionLinked,
    ItemLinked,
    #[default]
    #[serde(other)]
    Independent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenLayout {
    Overlay,
    Split,
    #[default]
    #[serde(other)]
    Fullscreen,
}

// ---------------------------------------------------------------------------
// Secondary screens
// ---------------------------------------------------------------------------

/// Lightweight direct reference from a section or item to a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRef {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_key: String,
}

/// A span inside a rich content block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSpan {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub marks: Vec<String>,
}

/// Rich content block (`block` paragraphs or inline `image`s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "_type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(rename = "_key", default, deserialize_with = "nullable")]
    pub key: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub children: Vec<ContentSpan>,
    #[serde(default)]
    pub asset: Option<AssetRef>,
}

impl ContentBlock {
    /// Concatenated text of all spans (empty for image blocks).
    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|span| span.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryScreen {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: Slug,
    #[serde(default, deserialize_with = "nullable")]
    pub trigger_key: String,
    #[serde(default, deserialize_with = "nullable")]
    pub screen_type: ScreenType,
    #[serde(default, deserialize_with = "nullable")]
    pub layout: ScreenLayout,
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    #[serde(default)]
    pub hero_image: Option<ImageRef>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub subheading: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Vec<ContentBlock>,
    #[serde(default, deserialize_with = "nullable")]
    pub bullet_points: Vec<String>,
    #[serde(default)]
    pub linked_item: Option<SingleItem>,
    #[serde(default)]
    pub linked_section_heading: Option<String>,
}

impl SecondaryScreen {
    /// Per-screen timeout override in whole seconds, if usable.
    pub fn timeout_override(&self) -> Option<u32> {
        whole_seconds(self.timeout_seconds)
    }

    pub fn hero_image_url(&self) -> Option<&str> {
        self.hero_image.as_ref().and_then(ImageRef::url)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleItem {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub price: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub is_available: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub availability_override: AvailabilityOverride,
    #[serde(default)]
    pub marketing_description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub dietary_tags: Vec<DietaryTag>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub linked_secondary_screen: Option<ScreenRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    #[serde(default, deserialize_with = "nullable")]
    pub min_price: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub max_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroup {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    /// Freeform comma-joined names, e.g. `"Earl Grey, Chamomile"`.
    #[serde(default, deserialize_with = "nullable")]
    pub item_names: String,
    #[serde(default, deserialize_with = "nullable")]
    pub price_range: PriceRange,
    #[serde(default, deserialize_with = "nullable")]
    pub dietary_tags: Vec<DietaryTag>,
    #[serde(default)]
    pub linked_secondary_screen: Option<ScreenRef>,
}

/// A section entry: either a single priced item or a group of items
/// sharing a price range.
///
/// Tagged on the wire by `_type`; an untagged entry is a single item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", try_from = "serde_json::Value")]
pub enum Item {
    #[serde(rename = "menuItem")]
    Single(SingleItem),
    #[serde(rename = "menuItemGroup")]
    Group(ItemGroup),
}

impl TryFrom<serde_json::Value> for Item {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let is_group = value.get("_type").and_then(|t| t.as_str()) == Some("menuItemGroup");
        if is_group {
            serde_json::from_value(value).map(Item::Group)
        } else {
            serde_json::from_value(value).map(Item::Single)
        }
    }
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Item::Single(item) => &item.id,
            Item::Group(group) => &group.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Item::Single(item) => &item.title,
            Item::Group(group) => &group.title,
        }
    }

    pub fn dietary_tags(&self) -> &[DietaryTag] {
        match self {
            Item::Single(item) => &item.dietary_tags,
            Item::Group(group) => &group.dietary_tags,
        }
    }

    pub fn linked_secondary_screen(&self) -> Option<&ScreenRef> {
        match self {
            Item::Single(item) => item.linked_secondary_screen.as_ref(),
            Item::Group(group) => group.linked_secondary_screen.as_ref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOption {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modifier {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub display_style: DisplayStyle,
    /// Flat add-on price; when set it overrides every option's own price.
    #[serde(default)]
    pub global_price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub options: Vec<ModifierOption>,
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(default, deserialize_with = "nullable")]
    pub heading: String,
    #[serde(default)]
    pub meta_category: Option<MetaCategory>,
    #[serde(default, deserialize_with = "nullable")]
    pub items: Vec<Item>,
    #[serde(default, deserialize_with = "nullable")]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub linked_secondary_screen: Option<ScreenRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuBoard {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: Slug,
    #[serde(default, deserialize_with = "nullable")]
    pub sections: Vec<Section>,
}

/// Singleton kiosk configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KioskSettings {
    #[serde(default)]
    pub announcement_bar: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub ignore_stock_levels: bool,
    #[serde(default)]
    pub active_board: Option<MenuBoard>,
    /// Externally forced secondary screen.
    #[serde(default)]
    pub active_secondary_screen: Option<SecondaryScreen>,
    #[serde(default)]
    pub default_timeout_seconds: Option<f64>,
}

impl KioskSettings {
    /// Global auto-return timeout, clamped to the allowed range.
    pub fn default_timeout(&self) -> u32 {
        whole_seconds(self.default_timeout_seconds)
            .map(|secs| secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Announcement text, ignoring blank values.
    pub fn announcement(&self) -> Option<&str> {
        self.announcement_bar
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Everything one menu query returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuDocuments {
    #[serde(default)]
    pub settings: Option<KioskSettings>,
    #[serde(default, deserialize_with = "nullable")]
    pub secondary_screens: Vec<SecondaryScreen>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn item_without_type_is_single() {
        let item: Item = serde_json::from_value(json!({
            "_id": "latte",
            "title": "Latte",
            "price": 4.5,
            "isAvailable": true
        }))
        .unwrap();

        assert_matches!(item, Item::Single(ref single) if single.title == "Latte");
    }

    #[test]
    fn item_group_is_recognised_by_type() {
        let item: Item = serde_json::from_value(json!({
            "_type": "menuItemGroup",
            "_id": "teas",
            "title": "Teas",
            "itemNames": "Earl Grey, Chamomile",
            "priceRange": { "minPrice": 3.75, "maxPrice": 5.5 }
        }))
        .unwrap();

        assert_matches!(item, Item::Group(ref group) if group.price_range.max_price == 5.5);
    }

    #[test]
    fn null_lists_and_unknown_enums_are_fail_soft() {
        let section: Section = serde_json::from_value(json!({
            "heading": "Coffee",
            "metaCategory": "sleep-me",
            "items": [{
                "_id": "mocha",
                "title": "Mocha",
                "price": null,
                "isAvailable": null,
                "availabilityOverride": null,
                "dietaryTags": ["VE", "XYZ"]
            }],
            "modifiers": null
        }))
        .unwrap();

        assert_eq!(section.meta_category, Some(MetaCategory::Other));
        assert!(section.modifiers.is_empty());
        let Item::Single(item) = &section.items[0] else {
            panic!("expected a single item");
        };
        assert_eq!(item.price, 0.0);
        assert!(!item.is_available);
        assert_eq!(item.availability_override, AvailabilityOverride::UseInventory);
        assert_eq!(item.dietary_tags, vec![DietaryTag::Vegan, DietaryTag::Unknown]);
    }

    #[test]
    fn unknown_screen_layout_falls_back_to_fullscreen() {
        let screen: SecondaryScreen = serde_json::from_value(json!({
            "_id": "s1",
            "triggerKey": "a",
            "layout": "carousel"
        }))
        .unwrap();
        assert_eq!(screen.layout, ScreenLayout::Fullscreen);

        let screen: SecondaryScreen =
            serde_json::from_value(json!({ "_id": "s2", "layout": "split" })).unwrap();
        assert_eq!(screen.layout, ScreenLayout::Split);
        assert_eq!(serde_json::to_value(screen.layout).unwrap(), json!("split"));
    }

    #[test]
    fn default_timeout_is_clamped() {
        let mut settings = KioskSettings::default();
        assert_eq!(settings.default_timeout(), DEFAULT_TIMEOUT_SECS);

        settings.default_timeout_seconds = Some(2.0);
        assert_eq!(settings.default_timeout(), MIN_TIMEOUT_SECS);

        settings.default_timeout_seconds = Some(900.0);
        assert_eq!(settings.default_timeout(), MAX_TIMEOUT_SECS);

        settings.default_timeout_seconds = Some(45.0);
        assert_eq!(settings.default_timeout(), 45);
    }

    #[test]
    fn screen_timeout_override_ignores_unusable_values() {
        let mut screen: SecondaryScreen =
            serde_json::from_value(json!({ "_id": "s1", "triggerKey": "a" })).unwrap();
        assert_eq!(screen.timeout_override(), None);

        screen.timeout_seconds = Some(0.0);
        assert_eq!(screen.timeout_override(), None);

        screen.timeout_seconds = Some(12.0);
        assert_eq!(screen.timeout_override(), Some(12));
    }

    #[test]
    fn blank_announcement_is_absent() {
        let settings = KioskSettings {
            announcement_bar: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(settings.announcement(), None);
    }
}
