//! GROQ queries issued by the player.

/// Document types whose changes can affect what the player shows.
pub const WATCHED_TYPES: [&str; 6] = [
    "kioskSettings",
    "menuBoard",
    "menuItem",
    "menuItemGroup",
    "menuModifier",
    "secondaryScreen",
];

/// Listener filter covering every [`WATCHED_TYPES`] document.
pub fn listen_query() -> String {
    let types = WATCHED_TYPES
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("*[_type in [{types}]]")
}

/// Projection shared by every secondary-screen reference.
const SCREEN_REF: &str = "linkedSecondaryScreen-> { _id, title, triggerKey }";

/// Full secondary-screen projection.
const SCREEN_FIELDS: &str = r#"
    _id,
    title,
    slug,
    triggerKey,
    screenType,
    layout,
    timeoutSeconds,
    heroImage { asset-> { url } },
    backgroundColor,
    heading,
    subheading,
    content[] { ..., asset-> { url } },
    bulletPoints,
    linkedItem-> {
      _id, title, price, isAvailable, availabilityOverride,
      marketingDescription, dietaryTags, image { asset-> { url } }
    },
    linkedSectionHeading
"#;

/// The single query that loads everything the player renders.
///
/// Returns `{ settings, secondaryScreens }`; `settings` is `null` when no
/// kiosk settings document has been published.
pub fn menu_query() -> String {
    format!(
        r#"{{
  "settings": *[_type == "kioskSettings"][0] {{
    announcementBar,
    ignoreStockLevels,
    defaultTimeoutSeconds,
    activeSecondaryScreen-> {{ {SCREEN_FIELDS} }},
    activeBoard-> {{
      title,
      slug,
      sections[] {{
        heading,
        metaCategory,
        {SCREEN_REF},
        items[]-> {{
          _type,
          _id,
          title,
          price,
          isAvailable,
          availabilityOverride,
          marketingDescription,
          dietaryTags,
          image {{ asset-> {{ url }} }},
          itemNames,
          priceRange,
          {SCREEN_REF}
        }},
        modifiers[]-> {{
          _id,
          title,
          displayStyle,
          globalPrice,
          options[] {{ name, price }}
        }}
      }}
    }}
  }},
  "secondaryScreens": *[_type == "secondaryScreen"] | order(title asc) {{ {SCREEN_FIELDS} }}
}}"#
    )
}
