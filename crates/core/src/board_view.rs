//! Presentation-neutral view of the primary menu.
//!
//! The rendering layer draws this; all display decisions that depend on
//! data (grouping, availability, price text, linked screens) are made
//! here so every renderer shows the same menu.

use serde::Serialize;

use crate::model::{
    DietaryTag, DisplayStyle, Item, KioskSettings, MenuBoard, MetaCategory, Modifier, Section,
};
use crate::pricing::{format_addon, format_price, format_price_range};
use crate::screens::ScreenDirectory;

/// Display columns in left-to-right order with their layout column counts.
const COLUMNS: [(MetaCategory, &str, u8); 2] = [
    (MetaCategory::DrinkMe, "DRINK ME", 3),
    (MetaCategory::EatMe, "EAT ME", 1),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub title: String,
    pub announcement: Option<String>,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub meta_category: MetaCategory,
    pub label: &'static str,
    pub layout_columns: u8,
    /// Empty means "No sections configured".
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub items: Vec<ItemView>,
    pub modifiers: Vec<ModifierView>,
    pub linked_screen_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub id: String,
    pub title: String,
    /// Marketing description, or the member names of an item group.
    pub description: Option<String>,
    pub price: String,
    pub sold_out: bool,
    /// ALC is surfaced as a separate indicator rather than a tag label.
    pub spicy: bool,
    pub dietary_labels: Vec<&'static str>,
    pub linked_screen_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifierView {
    pub title: String,
    pub style: DisplayStyle,
    /// Flat add-on price shown next to the title / option list.
    pub global_price: Option<String>,
    /// Inline style: all option names joined with `", "`.
    pub inline_options: Option<String>,
    /// List style: one row per option with its own add-on price.
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub name: String,
    pub price: Option<String>,
}

impl BoardView {
    /// Build the view, or `None` when no board is active.
    pub fn build(settings: &KioskSettings, directory: &ScreenDirectory) -> Option<Self> {
        let board = settings.active_board.as_ref()?;
        Some(Self::from_board(
            board,
            settings.announcement(),
            settings.ignore_stock_levels,
            directory,
        ))
    }

    pub fn from_board(
        board: &MenuBoard,
        announcement: Option<&str>,
        ignore_stock_levels: bool,
        directory: &ScreenDirectory,
    ) -> Self {
        let columns = COLUMNS
            .iter()
            .map(|&(category, label, layout_columns)| ColumnView {
                meta_category: category,
                label,
                layout_columns,
                sections: board
                    .sections
                    .iter()
                    .filter(|s| s.meta_category == Some(category))
                    .map(|s| section_view(s, ignore_stock_levels, directory))
                    .collect(),
            })
            .collect();

        Self {
            title: board.title.clone(),
            announcement: announcement.map(str::to_string),
            columns,
        }
    }

    /// Iterate every rendered section across all columns.
    pub fn sections(&self) -> impl Iterator<Item = &SectionView> {
        self.columns.iter().flat_map(|c| c.sections.iter())
    }
}

fn section_view(section: &Section, ignore_stock: bool, directory: &ScreenDirectory) -> SectionView {
    SectionView {
        heading: section.heading.clone(),
        items: section
            .items
            .iter()
            .map(|item| item_view(item, ignore_stock, directory))
            .collect(),
        modifiers: section.modifiers.iter().map(modifier_view).collect(),
        linked_screen_id: directory.screen_for_section(section).map(|s| s.id.clone()),
    }
}

fn item_view(item: &Item, ignore_stock: bool, directory: &ScreenDirectory) -> ItemView {
    let (description, price) = match item {
        Item::Single(single) => (
            single.marketing_description.clone(),
            format_price(single.price),
        ),
        Item::Group(group) => (
            Some(group.item_names.clone()).filter(|names| !names.is_empty()),
            format_price_range(&group.price_range),
        ),
    };

    let tags = item.dietary_tags();
    ItemView {
        id: item.id().to_string(),
        title: item.title().to_string(),
        description,
        price,
        sold_out: !item.is_effectively_available(ignore_stock),
        spicy: tags.contains(&DietaryTag::Alcohol),
        dietary_labels: tags
            .iter()
            .filter(|t| !matches!(t, DietaryTag::Alcohol | DietaryTag::Unknown))
            .map(|t| t.label())
            .collect(),
        linked_screen_id: directory.screen_for_item(item).map(|s| s.id.clone()),
    }
}

fn modifier_view(modifier: &Modifier) -> ModifierView {
    let global_price = modifier.global_price.map(format_addon);

    match modifier.display_style {
        DisplayStyle::Inline => ModifierView {
            title: modifier.title.clone(),
            style: DisplayStyle::Inline,
            global_price,
            inline_options: Some(
                modifier
                    .options
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            options: Vec::new(),
        },
        DisplayStyle::List => ModifierView {
            title: modifier.title.clone(),
            style: DisplayStyle::List,
            options: modifier
                .options
                .iter()
                .map(|option| OptionView {
                    name: option.name.clone(),
                    // The flat price is shown once beside the title instead.
                    price: if modifier.global_price.is_some() {
                        None
                    } else {
                        modifier.option_price(option).map(format_addon)
                    },
                })
                .collect(),
            global_price,
            inline_options: None,
        },
    }
}
