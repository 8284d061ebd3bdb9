//! Price formatting for menu display.

use crate::model::{Modifier, ModifierOption, PriceRange};

/// Format a price with two decimals, e.g. `$4.25`.
pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// Format a modifier add-on price, e.g. `+$0.50`.
pub fn format_addon(price: f64) -> String {
    format!("+${price:.2}")
}

/// Format a price range.
///
/// Equal bounds collapse into a single value. Reversed bounds are a
/// content-authoring mistake; they are displayed low-to-high.
pub fn format_price_range(range: &PriceRange) -> String {
    let (low, high) = if range.min_price <= range.max_price {
        (range.min_price, range.max_price)
    } else {
        (range.max_price, range.min_price)
    };

    let low_text = format_price(low);
    let high_text = format_price(high);
    if low_text == high_text {
        low_text
    } else {
        format!("{low_text}-{high_text}")
    }
}

impl Modifier {
    /// Price charged for an option: the flat global price when set,
    /// otherwise the option's own price.
    pub fn option_price(&self, option: &ModifierOption) -> Option<f64> {
        self.global_price.or(option.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DisplayStyle;

    #[test]
    fn single_price_has_two_decimals() {
        assert_eq!(format_price(4.25), "$4.25");
        assert_eq!(format_price(5.0), "$5.00");
    }

    #[test]
    fn equal_range_collapses() {
        let range = PriceRange {
            min_price: 5.0,
            max_price: 5.0,
        };
        assert_eq!(format_price_range(&range), "$5.00");
    }

    #[test]
    fn distinct_range_shows_both_bounds() {
        let range = PriceRange {
            min_price: 3.75,
            max_price: 5.5,
        };
        assert_eq!(format_price_range(&range), "$3.75-$5.50");
    }

    #[test]
    fn reversed_range_is_displayed_low_to_high() {
        let range = PriceRange {
            min_price: 6.0,
            max_price: 4.0,
        };
        assert_eq!(format_price_range(&range), "$4.00-$6.00");
    }

    #[test]
    fn global_price_overrides_option_prices() {
        let option = ModifierOption {
            name: "Oat".into(),
            price: Some(0.8),
        };
        let mut modifier = Modifier {
            id: "milk".into(),
            title: "Milk".into(),
            display_style: DisplayStyle::List,
            global_price: None,
            options: vec![option.clone()],
        };
        assert_eq!(modifier.option_price(&option), Some(0.8));

        modifier.global_price = Some(0.5);
        assert_eq!(modifier.option_price(&option), Some(0.5));
        assert_eq!(format_addon(0.5), "+$0.50");
    }
}
