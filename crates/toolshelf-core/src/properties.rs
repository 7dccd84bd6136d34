//! Property schema builder.
//!
//! Scans every loaded catalog item and folds the free-form
//! [`PropertyValue`]s into one [`PropertyDefinition`] per property key.
//! Definitions are never persisted; they are rebuilt from scratch whenever
//! the item collection changes.
//!
//! # Merge rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `filter_priority` | minimum over all declarations |
//! | `display_name`, `icon`, `property_type` | taken from the smallest item id that declares it |
//! | `options` | union of choice-typed tokens, sorted, deduplicated |
//!
//! Taking labels from the smallest item id keeps the result independent of
//! the order in which the loader returned items.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{CatalogItem, FilterPriority, PropertyType};

/// Catalog-wide view of one property class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub key: String,
    pub display_name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub filter_priority: FilterPriority,
    /// Distinct option tokens, sorted. Empty for non-choice types.
    pub options: Vec<String>,
}

impl PropertyDefinition {
    /// Whether the facet UI renders this definition.
    pub fn is_facet(&self) -> bool {
        self.property_type.is_choice()
    }
}

/// A value plus the id of the item that contributed it.
type Sourced<'a, T> = Option<(&'a str, T)>;

struct Accumulator<'a> {
    display_name: Sourced<'a, &'a str>,
    icon: Sourced<'a, &'a str>,
    property_type: Sourced<'a, PropertyType>,
    filter_priority: FilterPriority,
    options: BTreeSet<&'a str>,
}

impl<'a> Accumulator<'a> {
    fn new(priority: FilterPriority) -> Self {
        Self {
            display_name: None,
            icon: None,
            property_type: None,
            filter_priority: priority,
            options: BTreeSet::new(),
        }
    }
}

/// Replace `slot` when `candidate` exists and comes from a smaller item id.
/// Ties keep the earlier declaration.
fn offer<'a, T>(slot: &mut Sourced<'a, T>, item_id: &'a str, candidate: Option<T>) {
    let Some(value) = candidate else { return };
    let replace = match slot {
        Some((current, _)) => item_id < *current,
        None => true,
    };
    if replace {
        *slot = Some((item_id, value));
    }
}

/// Derive the unified, sorted set of property definitions for `items`.
///
/// Malformed entries (no key) are skipped. Output is sorted by
/// `filter_priority`, then `display_name`, then `key`.
pub fn build_property_definitions(items: &[CatalogItem]) -> Vec<PropertyDefinition> {
    let mut acc: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();

    for item in items {
        for (key, prop) in item.well_formed_properties() {
            let entry = acc
                .entry(key)
                .or_insert_with(|| Accumulator::new(prop.filter_priority));

            entry.filter_priority = entry.filter_priority.min(prop.filter_priority);
            offer(&mut entry.display_name, &item.id, prop.display_name());
            offer(&mut entry.icon, &item.id, prop.icon());
            offer(&mut entry.property_type, &item.id, prop.property_type);

            if prop.value_type().is_choice() {
                entry.options.extend(prop.tokens());
            }
        }
    }

    let mut defs: Vec<PropertyDefinition> = acc
        .into_iter()
        .map(|(key, a)| {
            let property_type = a.property_type.map(|(_, t)| t).unwrap_or_default();
            let options = if property_type.is_choice() {
                a.options.into_iter().map(str::to_string).collect()
            } else {
                Vec::new()
            };
            PropertyDefinition {
                key: key.to_string(),
                display_name: a
                    .display_name
                    .map(|(_, n)| n)
                    .unwrap_or(key)
                    .to_string(),
                property_type,
                icon: a.icon.map(|(_, i)| i.to_string()),
                filter_priority: a.filter_priority,
                options,
            }
        })
        .collect();

    defs.sort_by(|a, b| {
        a.filter_priority
            .cmp(&b.filter_priority)
            .then_with(|| a.display_name.cmp(&b.display_name))
            .then_with(|| a.key.cmp(&b.key))
    });

    tracing::debug!(
        items = items.len(),
        definitions = defs.len(),
        "built property definitions"
    );

    defs
}

/// Definitions the facet UI renders (select and multiselect), order kept.
pub fn facet_definitions(defs: &[PropertyDefinition]) -> Vec<&PropertyDefinition> {
    defs.iter().filter(|d| d.is_facet()).collect()
}

/// Facets split by visibility tier.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FacetTiers<'a> {
    pub main: Vec<&'a PropertyDefinition>,
    pub secondary: Vec<&'a PropertyDefinition>,
    pub advanced: Vec<&'a PropertyDefinition>,
}

impl FacetTiers<'_> {
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.secondary.is_empty() && self.advanced.is_empty()
    }
}

/// Group facet definitions into main / secondary / advanced tiers.
pub fn group_by_priority(defs: &[PropertyDefinition]) -> FacetTiers<'_> {
    let mut tiers = FacetTiers::default();
    for def in facet_definitions(defs) {
        match def.filter_priority {
            FilterPriority::Main => tiers.main.push(def),
            FilterPriority::Secondary => tiers.secondary.push(def),
            FilterPriority::Advanced => tiers.advanced.push(def),
        }
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PropertyValue;

    fn prop(key: &str, ty: PropertyType, value: &str, priority: FilterPriority) -> PropertyValue {
        PropertyValue {
            filter_priority: priority,
            ..PropertyValue::new(key, ty, value)
        }
    }

    fn labelled(key: &str, name: &str, icon: Option<&str>) -> PropertyValue {
        PropertyValue {
            display_name: Some(name.to_string()),
            icon: icon.map(str::to_string),
            ..PropertyValue::new(key, PropertyType::Select, "x")
        }
    }

    #[test]
    fn test_empty_catalog() {
        assert!(build_property_definitions(&[]).is_empty());
        let bare = vec![CatalogItem::new("a", "A")];
        assert!(build_property_definitions(&bare).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let items = vec![
            CatalogItem::new("a", "A")
                .with_property(PropertyValue::new("pricing", PropertyType::Select, "free"))
                .with_property(PropertyValue::new("platform", PropertyType::Multiselect, "web")),
            CatalogItem::new("b", "B")
                .with_property(PropertyValue::new("pricing", PropertyType::Select, "paid")),
        ];
        assert_eq!(
            build_property_definitions(&items),
            build_property_definitions(&items)
        );
    }

    #[test]
    fn test_priority_is_minimum() {
        let items = vec![
            CatalogItem::new("a", "A").with_property(prop(
                "pricing",
                PropertyType::Select,
                "free",
                FilterPriority::Advanced,
            )),
            CatalogItem::new("b", "B").with_property(prop(
                "pricing",
                PropertyType::Select,
                "paid",
                FilterPriority::Main,
            )),
        ];
        let defs = build_property_definitions(&items);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].filter_priority, FilterPriority::Main);
    }

    #[test]
    fn test_options_deduplicated_and_sorted() {
        let items = vec![
            CatalogItem::new("a", "A").with_property(PropertyValue::new(
                "platform",
                PropertyType::Multiselect,
                "web,ios,web",
            )),
            CatalogItem::new("b", "B").with_property(PropertyValue::new(
                "platform",
                PropertyType::Multiselect,
                "android",
            )),
        ];
        let defs = build_property_definitions(&items);
        assert_eq!(defs[0].options, vec!["android", "ios", "web"]);
    }

    #[test]
    fn test_options_case_sensitive() {
        let items = vec![CatalogItem::new("a", "A").with_property(PropertyValue::new(
            "platform",
            PropertyType::Multiselect,
            "Web,web",
        ))];
        let defs = build_property_definitions(&items);
        assert_eq!(defs[0].options, vec!["Web", "web"]);
    }

    #[test]
    fn test_non_choice_types_have_no_options() {
        let items = vec![CatalogItem::new("a", "A")
            .with_property(PropertyValue::new("seats", PropertyType::Number, "10"))
            .with_property(PropertyValue::new("launched", PropertyType::Date, "2024-01-01"))];
        let defs = build_property_definitions(&items);
        assert_eq!(defs.len(), 2);
        assert!(defs.iter().all(|d| d.options.is_empty()));
        assert!(facet_definitions(&defs).is_empty());
    }

    #[test]
    fn test_display_name_defaults_to_key() {
        let items = vec![CatalogItem::new("a", "A")
            .with_property(PropertyValue::new("pricing", PropertyType::Select, "free"))];
        let defs = build_property_definitions(&items);
        assert_eq!(defs[0].display_name, "pricing");
        assert_eq!(defs[0].icon, None);
    }

    #[test]
    fn test_label_independent_of_item_order() {
        let a = CatalogItem::new("a", "A").with_property(labelled("pricing", "Pricing", None));
        let b = CatalogItem::new("b", "B")
            .with_property(labelled("pricing", "Plans", Some("$")));
        let c = CatalogItem::new("c", "C")
            .with_property(PropertyValue::new("pricing", PropertyType::Select, "paid"));

        let forward = build_property_definitions(&[a.clone(), b.clone(), c.clone()]);
        let reverse = build_property_definitions(&[c, b, a]);

        assert_eq!(forward, reverse);
        assert_eq!(forward[0].display_name, "Pricing");
        // Only "b" declares an icon, so it is backfilled from there.
        assert_eq!(forward[0].icon.as_deref(), Some("$"));
    }

    #[test]
    fn test_type_taken_from_items_that_declare_one() {
        let mut untyped = PropertyValue::new("platform", PropertyType::Select, "web");
        untyped.property_type = None;
        let a = CatalogItem::new("a", "A").with_property(untyped);
        let b = CatalogItem::new("b", "B").with_property(PropertyValue::new(
            "platform",
            PropertyType::Multiselect,
            "ios, web",
        ));

        let defs = build_property_definitions(&[a, b]);
        assert_eq!(defs[0].property_type, PropertyType::Multiselect);
        assert_eq!(defs[0].options, vec!["ios", "web"]);
    }

    #[test]
    fn test_sorted_by_priority_then_name() {
        let items = vec![CatalogItem::new("a", "A")
            .with_property(labelled("zeta", "Zeta", None))
            .with_property(labelled("alpha", "Alpha", None))
            .with_property(prop(
                "later",
                PropertyType::Select,
                "x",
                FilterPriority::Main,
            ))];
        let keys: Vec<String> = build_property_definitions(&items)
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["later", "alpha", "zeta"]);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let mut item = CatalogItem::new("a", "A")
            .with_property(PropertyValue::new("pricing", PropertyType::Select, "free"));
        item.properties.push(PropertyValue {
            key: Some("   ".into()),
            value: "ignored".into(),
            ..Default::default()
        });
        item.properties.push(PropertyValue::default());
        let defs = build_property_definitions(&[item]);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].key, "pricing");
    }

    #[test]
    fn test_group_by_priority() {
        let items = vec![CatalogItem::new("a", "A")
            .with_property(prop("p1", PropertyType::Select, "x", FilterPriority::Main))
            .with_property(prop("p2", PropertyType::Multiselect, "x", FilterPriority::Secondary))
            .with_property(prop("p3", PropertyType::Select, "x", FilterPriority::Advanced))
            .with_property(prop("p4", PropertyType::Text, "x", FilterPriority::Main))];
        let defs = build_property_definitions(&items);
        let tiers = group_by_priority(&defs);
        assert_eq!(tiers.main.len(), 1);
        assert_eq!(tiers.main[0].key, "p1");
        assert_eq!(tiers.secondary[0].key, "p2");
        assert_eq!(tiers.advanced[0].key, "p3");
    }
}
