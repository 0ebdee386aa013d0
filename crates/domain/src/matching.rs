//! Preference-based order matching.
//!
//! Stored preference blobs come in two shapes: the legacy flat tag array and
//! the structured filter object. The variant is decided once at parse time
//! rather than by inspecting the shape at every use site. Legacy blobs never
//! match: their free-form tags pre-date the structured format and would
//! produce false-positive recommendations.

use common::OrderType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored runner preference blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Preference {
    /// Legacy flat tag list, kept readable but inert for matching.
    Legacy(Vec<String>),
    /// Structured filter object.
    Filter(PreferenceFilter),
}

/// Structured matching criteria.
///
/// Field names follow the stored JSON shape (`priceMin`/`priceMax`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferenceFilter {
    /// Accepted order types; an empty or absent list places no constraint
    /// but also counts as "no criteria configured".
    pub types: Option<Vec<OrderType>>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    /// Free-form tags. Stored and served back, but not consulted when
    /// matching; whether they should be is an open product decision.
    pub tags: Option<Vec<String>>,
}

impl PreferenceFilter {
    /// True when no matching criterion is configured. Tags deliberately do
    /// not count as criteria.
    pub fn is_empty(&self) -> bool {
        self.types.as_ref().is_none_or(|types| types.is_empty())
            && self.price_min.is_none()
            && self.price_max.is_none()
    }
}

impl Preference {
    /// Parses a stored blob. Callers running a matching pass skip candidates
    /// whose blobs fail to parse instead of aborting the pass.
    pub fn parse(value: &serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value.clone())
    }

    /// Whether a new order with the given type and price should be
    /// recommended to the owner of this preference.
    ///
    /// Every configured constraint must hold; a preference with no
    /// configured criteria matches nothing.
    pub fn matches(&self, order_type: OrderType, price: Decimal) -> bool {
        match self {
            Preference::Legacy(_) => false,
            Preference::Filter(filter) => {
                if filter.is_empty() {
                    return false;
                }
                if let Some(types) = &filter.types
                    && !types.is_empty()
                    && !types.contains(&order_type)
                {
                    return false;
                }
                if let Some(min) = filter.price_min
                    && price < min
                {
                    return false;
                }
                if let Some(max) = filter.price_max
                    && price > max
                {
                    return false;
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> Preference {
        Preference::parse(&value).unwrap()
    }

    #[test]
    fn structured_filter_matches_when_all_constraints_hold() {
        let pref = parse(json!({
            "types": ["takeout", "express"],
            "priceMin": 10,
            "priceMax": 30
        }));
        assert!(pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn type_mismatch_fails() {
        let pref = parse(json!({"types": ["send"]}));
        assert!(!pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let pref = parse(json!({"priceMin": 10, "priceMax": 30}));
        assert!(pref.matches(OrderType::Errand, Decimal::from(10)));
        assert!(pref.matches(OrderType::Errand, Decimal::from(30)));
        assert!(!pref.matches(OrderType::Errand, Decimal::new(999, 2)));
        assert!(!pref.matches(OrderType::Errand, Decimal::new(3001, 2)));
    }

    #[test]
    fn empty_object_never_matches() {
        let pref = parse(json!({}));
        assert!(!pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn empty_type_list_counts_as_no_criteria() {
        let pref = parse(json!({"types": []}));
        assert!(!pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn tags_alone_are_not_criteria() {
        let pref = parse(json!({"tags": ["campus-only", "light"]}));
        assert!(!pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn legacy_tag_array_never_matches() {
        let pref = parse(json!(["仅校内"]));
        assert_eq!(pref, Preference::Legacy(vec!["仅校内".to_string()]));
        assert!(!pref.matches(OrderType::Takeout, Decimal::from(20)));
    }

    #[test]
    fn empty_legacy_array_parses_and_never_matches() {
        let pref = parse(json!([]));
        assert!(matches!(pref, Preference::Legacy(ref tags) if tags.is_empty()));
        assert!(!pref.matches(OrderType::Other, Decimal::ONE));
    }

    #[test]
    fn malformed_blob_is_a_parse_error() {
        assert!(Preference::parse(&json!(42)).is_err());
        assert!(Preference::parse(&json!([1, 2, 3])).is_err());
        assert!(Preference::parse(&json!({"types": ["no-such-type"]})).is_err());
    }

    #[test]
    fn fractional_prices_compare_exactly() {
        let pref = parse(json!({"priceMax": 15.5}));
        assert!(pref.matches(OrderType::Takeout, Decimal::new(1550, 2)));
        assert!(!pref.matches(OrderType::Takeout, Decimal::new(1551, 2)));
    }
}
