//! Core data models used throughout Toolshelf.
//!
//! These types describe catalog items exactly as the headless CMS returns
//! them. Deserialization is deliberately lenient at this boundary: the CMS
//! lets editors attach ad hoc properties to any document, so heterogeneous
//! and partially filled records are the normal case. Anything that cannot be
//! interpreted is defaulted or dropped here, so the pipeline stages never
//! have to deal with malformed input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Value type of a property class.
///
/// Only [`Select`](PropertyType::Select) and
/// [`Multiselect`](PropertyType::Multiselect) participate in faceted
/// filtering. Unknown or missing type strings fall back to `Select`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyType {
    #[default]
    Select,
    Multiselect,
    Text,
    Number,
    Boolean,
    Date,
    PriceRange,
}

impl PropertyType {
    /// Parse the CMS type string. Never fails: unknown values become `Select`.
    pub fn from_cms(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "multiselect" | "multi-select" | "multi_select" => Self::Multiselect,
            "text" => Self::Text,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "pricerange" | "price-range" | "price_range" => Self::PriceRange,
            _ => Self::Select,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::PriceRange => "priceRange",
        }
    }

    /// True for the choice types that produce facet options.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Multiselect)
    }
}

impl Serialize for PropertyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PropertyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::from_cms(&s),
            _ => Self::default(),
        })
    }
}

/// Facet visibility tier. Lower tiers surface more prominently.
///
/// Ordering follows the rank: `Main < Secondary < Advanced`, so the most
/// prominent of several declarations is simply the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FilterPriority {
    /// Rank 1: always-visible main filter.
    Main,
    /// Rank 2: secondary, collapsible.
    #[default]
    Secondary,
    /// Rank 3: advanced, hidden by default.
    Advanced,
}

impl FilterPriority {
    /// Map an integer rank into a tier, clamping out-of-range ranks.
    pub fn from_rank(rank: i64) -> Self {
        match rank {
            i64::MIN..=1 => Self::Main,
            2 => Self::Secondary,
            _ => Self::Advanced,
        }
    }

    pub fn rank(&self) -> u8 {
        match self {
            Self::Main => 1,
            Self::Secondary => 2,
            Self::Advanced => 3,
        }
    }
}

impl Serialize for FilterPriority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.rank())
    }
}

impl<'de> Deserialize<'de> for FilterPriority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rank = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Ok(rank.map(Self::from_rank).unwrap_or_default())
    }
}

/// One attribute instance attached to a catalog item.
///
/// The same `key` may appear more than once on a single item. Display paths
/// take the first entry ([`CatalogItem::property`]); filtering unions all of
/// them ([`CatalogItem::values_for`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Declared type. `None` when the entry carries no `type`; read through
    /// [`PropertyValue::value_type`].
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    /// Raw value. For multiselect, a comma-separated list of tokens.
    #[serde(default, deserialize_with = "loose_string")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub filter_priority: FilterPriority,
}

impl PropertyValue {
    /// Convenience constructor used by tests and in-memory fixtures.
    pub fn new(key: &str, property_type: PropertyType, value: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            property_type: Some(property_type),
            value: value.to_string(),
            ..Default::default()
        }
    }

    /// Effective type: the declared one, `Select` when absent.
    pub fn value_type(&self) -> PropertyType {
        self.property_type.unwrap_or_default()
    }

    /// The trimmed property key, or `None` for malformed entries.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Non-empty display name, if the entry declares one.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(self.display_name.as_deref())
    }

    /// Non-empty icon, if the entry declares one.
    pub fn icon(&self) -> Option<&str> {
        non_empty(self.icon.as_deref())
    }

    /// Label to show for this entry: the display name, or the key verbatim.
    pub fn label(&self) -> &str {
        self.display_name().or_else(|| self.key()).unwrap_or_default()
    }

    /// Normalized value tokens.
    ///
    /// Multiselect values are split on commas; every other type yields the
    /// whole trimmed value as one token. Empty tokens are never returned.
    pub fn tokens(&self) -> Vec<&str> {
        match self.value_type() {
            PropertyType::Multiselect => self
                .value
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect(),
            _ => {
                let t = self.value.trim();
                if t.is_empty() {
                    Vec::new()
                } else {
                    vec![t]
                }
            }
        }
    }
}

/// One entry in the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCatalogItem")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Legacy free-text labels.
    pub tags: Vec<String>,
    pub properties: Vec<PropertyValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub views: u64,
    pub likes: u64,
}

/// Wire shape of a CMS record. `id` wins over `_id` when both are present;
/// either may be a string or a number. A record with neither gets an empty
/// id, which loaders reject.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalogItem {
    #[serde(default, deserialize_with = "loose_string")]
    id: String,
    #[serde(rename = "_id", default, deserialize_with = "loose_string")]
    document_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_properties")]
    properties: Vec<PropertyValue>,
    #[serde(default, deserialize_with = "lenient_slug")]
    slug: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    views: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    likes: u64,
}

impl From<RawCatalogItem> for CatalogItem {
    fn from(raw: RawCatalogItem) -> Self {
        let id = if raw.id.trim().is_empty() {
            raw.document_id
        } else {
            raw.id
        };
        Self {
            id: id.trim().to_string(),
            name: raw.name,
            short_description: raw.short_description,
            price: raw.price,
            tags: raw.tags,
            properties: raw.properties,
            slug: raw.slug,
            website: raw.website,
            views: raw.views,
            likes: raw.likes,
        }
    }
}

impl CatalogItem {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builder-style helper for attaching a property.
    pub fn with_property(mut self, value: PropertyValue) -> Self {
        self.properties.push(value);
        self
    }

    /// Well-formed property entries (entries without a key are skipped).
    pub fn well_formed_properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties
            .iter()
            .filter_map(|p| p.key().map(|k| (k, p)))
    }

    /// Union of all normalized tokens the item declares for `key`.
    ///
    /// Every entry with that key contributes, in declaration order, without
    /// duplicates. This is the filtering and search view of the item.
    pub fn values_for(&self, key: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (k, p) in self.well_formed_properties() {
            if k != key {
                continue;
            }
            for token in p.tokens() {
                if !out.contains(&token) {
                    out.push(token);
                }
            }
        }
        out
    }

    /// First entry declared for `key`. This is the display view of the item.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.well_formed_properties()
            .find(|(k, _)| *k == key)
            .map(|(_, p)| p)
    }

    /// One entry per key, first declaration wins, in declaration order.
    pub fn display_properties(&self) -> Vec<&PropertyValue> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for (k, p) in self.well_formed_properties() {
            if seen.contains(&k) {
                continue;
            }
            seen.push(k);
            out.push(p);
        }
        out
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts strings, numbers, booleans and arrays of those. Arrays are joined
/// with commas so a structured multiselect reads like the string form.
fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    fn scalar(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
    let v = Value::deserialize(deserializer)?;
    Ok(match &v {
        Value::Array(items) => items.iter().filter_map(scalar).collect::<Vec<_>>().join(","),
        other => scalar(other).unwrap_or_default(),
    })
}

/// Drops property entries that are not objects or fail to parse, instead of
/// rejecting the whole item.
fn lenient_properties<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<PropertyValue>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect())
}

/// Accepts a plain string or a `{ "current": "..." }` slug object.
fn lenient_slug<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get("current")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
