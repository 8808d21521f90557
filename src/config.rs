//! Per-source extraction configuration.
//!
//! [`SourceConfig`] describes one watched site: where it lives, how to find
//! its item containers, which nodes to ignore and, for JSON feeds, where
//! the item list sits and what its fields are called. [`Settings`] is the
//! whole site list as loaded from YAML.
//!
//! # Example
//!
//! ```rust
//! use feedsift::{Settings, SourceType};
//!
//! let yaml = r#"
//! websites:
//!   - name: notices
//!     url: https://example.com/notices/
//!     selector: "ul.list li"
//!     exclude:
//!       - class: "ad banner"
//!       - attr: { name: data-kind, value: promo }
//!   - name: api
//!     url: https://example.com/api/list
//!     type: json
//!     json_path: data.list
//!     field_map: { title: name, date: ctime, date_format: timestamp }
//! "#;
//!
//! let settings = Settings::from_yaml_str(yaml)?;
//! assert_eq!(settings.websites.len(), 2);
//! assert_eq!(settings.websites[1].source_type, SourceType::Json);
//! # Ok::<(), feedsift::Error>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Kind of document a source serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// HTML listing page.
    #[default]
    #[serde(alias = "html")]
    Markup,
    /// JSON feed or API response.
    Json,
}

/// How the mapped date field of a JSON item is represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateFormat {
    /// Unix epoch seconds, formatted as `YYYY-MM-DD`.
    Timestamp,
    /// Used as given.
    #[default]
    Raw,
}

impl From<String> for DateFormat {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("timestamp") {
            Self::Timestamp
        } else {
            Self::Raw
        }
    }
}

impl From<DateFormat> for String {
    fn from(value: DateFormat) -> Self {
        match value {
            DateFormat::Timestamp => "timestamp".to_string(),
            DateFormat::Raw => "raw".to_string(),
        }
    }
}

fn default_title_key() -> String {
    "title".to_string()
}

fn default_url_key() -> String {
    "url".to_string()
}

fn default_date_key() -> String {
    "date".to_string()
}

/// Maps a JSON feed's native field names onto `title`, `url` and `date`.
///
/// Unmapped roles keep their canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    /// Key holding the item title.
    #[serde(default = "default_title_key")]
    pub title: String,

    /// Key holding the item URL.
    #[serde(default = "default_url_key")]
    pub url: String,

    /// Key holding the item date.
    #[serde(default = "default_date_key")]
    pub date: String,

    /// Representation of the date value.
    #[serde(default)]
    pub date_format: DateFormat,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            title: default_title_key(),
            url: default_url_key(),
            date: default_date_key(),
            date_format: DateFormat::Raw,
        }
    }
}

impl FieldMap {
    /// Builds a field map from a plain string mapping, the way it is written
    /// in configuration (`title`, `url`, `date`, `date_format`).
    #[must_use]
    pub fn from_mapping(mapping: &BTreeMap<String, String>) -> Self {
        let mut map = Self::default();
        if let Some(title) = mapping.get("title") {
            map.title.clone_from(title);
        }
        if let Some(url) = mapping.get("url") {
            map.url.clone_from(url);
        }
        if let Some(date) = mapping.get("date") {
            map.date.clone_from(date);
        }
        if let Some(format) = mapping.get("date_format") {
            map.date_format = DateFormat::from(format.clone());
        }
        map
    }
}

/// A rule that marks a container as noise.
///
/// A container is excluded when it, or one of its nearest ancestors,
/// satisfies any rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionRule {
    /// Every listed class is present on the node.
    Class {
        /// Classes that must all be present.
        classes: BTreeSet<String>,
    },
    /// Node id equals the value.
    Id {
        /// Expected id.
        id: String,
    },
    /// Named attribute equals the value.
    Attribute {
        /// Attribute name.
        name: String,
        /// Expected attribute value.
        value: String,
    },
    /// Node text contains the substring.
    Text {
        /// Substring to look for.
        substring: String,
    },
}

impl ExclusionRule {
    /// Class rule from a space-separated class list.
    #[must_use]
    pub fn class(classes: &str) -> Self {
        Self::Class {
            classes: classes.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Id rule.
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id { id: id.into() }
    }

    /// Attribute rule.
    #[must_use]
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Text rule.
    #[must_use]
    pub fn text(substring: impl Into<String>) -> Self {
        Self::Text {
            substring: substring.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AttrSpec {
    name: Option<String>,
    value: Option<String>,
}

/// Exclusion entry as written in configuration. One entry may carry several
/// keys and then yields one rule per key.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSpec {
    class: Option<String>,
    id: Option<String>,
    attr: Option<AttrSpec>,
    text: Option<String>,
}

impl RuleSpec {
    fn into_rules(self) -> Result<Vec<ExclusionRule>> {
        let mut rules = Vec::new();

        if let Some(class) = self.class {
            let rule = ExclusionRule::class(&class);
            if matches!(&rule, ExclusionRule::Class { classes } if classes.is_empty()) {
                return Err(Error::Configuration(
                    "exclusion `class` must name at least one class".to_string(),
                ));
            }
            rules.push(rule);
        }
        if let Some(id) = self.id {
            rules.push(ExclusionRule::id(id));
        }
        if let Some(attr) = self.attr {
            match (attr.name, attr.value) {
                (Some(name), Some(value)) if !name.is_empty() => {
                    rules.push(ExclusionRule::attribute(name, value));
                }
                _ => {
                    return Err(Error::Configuration(
                        "exclusion `attr` needs both `name` and `value`".to_string(),
                    ))
                }
            }
        }
        if let Some(text) = self.text {
            if text.is_empty() {
                return Err(Error::Configuration(
                    "exclusion `text` must not be empty".to_string(),
                ));
            }
            rules.push(ExclusionRule::text(text));
        }

        if rules.is_empty() {
            return Err(Error::Configuration(
                "exclusion entry has none of `class`, `id`, `attr`, `text`".to_string(),
            ));
        }
        Ok(rules)
    }
}

fn deserialize_rules<'de, D>(deserializer: D) -> std::result::Result<Vec<ExclusionRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let specs = Option::<Vec<RuleSpec>>::deserialize(deserializer)?.unwrap_or_default();
    let mut rules = Vec::new();
    for spec in specs {
        rules.extend(spec.into_rules().map_err(serde::de::Error::custom)?);
    }
    Ok(rules)
}

fn default_enabled() -> bool {
    true
}

/// Extraction configuration for one source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Source name; keys the snapshot in storage.
    pub name: String,

    /// Page URL, also the base for resolving relative links.
    pub url: String,

    /// CSS selector for item containers. Defaults to every `li`, `div` and
    /// `article`.
    #[serde(default)]
    pub selector: Option<String>,

    /// Noise rules applied to containers.
    #[serde(default, rename = "exclude", alias = "exclusion_rules", deserialize_with = "deserialize_rules")]
    pub exclusion_rules: Vec<ExclusionRule>,

    /// Markup or JSON.
    #[serde(default, rename = "type", alias = "source_type")]
    pub source_type: SourceType,

    /// Dot-separated path to the item list in a JSON document.
    #[serde(default, alias = "jsonPath")]
    pub json_path: Option<String>,

    /// Field names of JSON items.
    #[serde(default, alias = "fieldMap")]
    pub field_map: FieldMap,

    /// Disabled sources are skipped by the pipeline.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Extra request headers handed to the page fetcher.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SourceConfig {
    /// Markup source with default container selection and no exclusions.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: None,
            exclusion_rules: Vec::new(),
            source_type: SourceType::Markup,
            json_path: None,
            field_map: FieldMap::default(),
            enabled: true,
            headers: BTreeMap::new(),
        }
    }

    /// Sets the container selector.
    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Replaces the exclusion rules.
    #[must_use]
    pub fn with_exclusions(mut self, rules: Vec<ExclusionRule>) -> Self {
        self.exclusion_rules = rules;
        self
    }

    /// Turns the source into a JSON source reading items at `path`.
    #[must_use]
    pub fn with_json_path(mut self, path: impl Into<String>) -> Self {
        self.source_type = SourceType::Json;
        self.json_path = Some(path.into());
        self
    }

    /// Sets the JSON field map.
    #[must_use]
    pub fn with_field_map(mut self, field_map: FieldMap) -> Self {
        self.field_map = field_map;
        self
    }
}

fn default_max_workers() -> usize {
    4
}

/// The site list plus global options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Configured sources, in file order.
    #[serde(default, alias = "sources")]
    pub websites: Vec<SourceConfig>,

    /// Upper bound on sources processed at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Settings {
    /// Parses settings from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for malformed YAML or invalid exclusion rules,
    /// and [`Error::Configuration`] for duplicate source names or a zero
    /// worker count.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a YAML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, otherwise the
    /// errors of [`Settings::from_yaml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Sources with `enabled: true`.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.websites.iter().filter(|s| s.enabled)
    }

    /// Looks a source up by name.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.websites.iter().find(|s| s.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::Configuration("max_workers must be at least 1".to_string()));
        }
        let mut seen = BTreeSet::new();
        for source in &self.websites {
            if !seen.insert(source.name.as_str()) {
                return Err(Error::Configuration(format!(
                    "duplicate source name `{}`",
                    source.name
                )));
            }
        }
        Ok(())
    }
}
