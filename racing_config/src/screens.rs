//! Screens config domain: widget instances with data bindings and
//! thresholds, plus the display-routing rule table (`spec.md` §3.5, §4.10).

use racing_core::alerts::Comparator;
use racing_core::display::DisplayRule;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorTag {
    Lt,
    Gt,
    Lte,
    Gte,
    Stale,
}

impl From<ComparatorTag> for Comparator {
    fn from(tag: ComparatorTag) -> Self {
        match tag {
            ComparatorTag::Lt => Comparator::Lt,
            ComparatorTag::Gt => Comparator::Gt,
            ComparatorTag::Lte => Comparator::Lte,
            ComparatorTag::Gte => Comparator::Gte,
            ComparatorTag::Stale => Comparator::Stale,
        }
    }
}

/// One widget's data binding, bound to a channel by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub channel_name: String,
    #[serde(default)]
    pub warn_threshold: Option<f64>,
    #[serde(default)]
    pub critical_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub id: u16,
    pub name: String,
    #[serde(default, rename = "widget")]
    pub widget: Vec<WidgetConfig>,
}

/// One priority-ranked display routing rule, persisted form of
/// [`DisplayRule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayRuleConfig {
    pub id: u16,
    pub priority: i32,
    pub channel_name: String,
    pub comparator: ComparatorTag,
    pub threshold: f64,
    pub target_screen_id: u16,
}

impl DisplayRuleConfig {
    pub fn to_display_rule(&self) -> DisplayRule {
        DisplayRule {
            id: self.id,
            priority: self.priority,
            channel_name: heapless::String::try_from(self.channel_name.as_str())
                .unwrap_or_default(),
            comparator: self.comparator.into(),
            threshold: self.threshold,
            target_screen_id: self.target_screen_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreensFile {
    pub format_version: u32,
    #[serde(default, rename = "screen")]
    pub screen: Vec<ScreenConfig>,
    #[serde(default, rename = "rule")]
    pub rule: Vec<DisplayRuleConfig>,
    pub default_screen_id: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_screens_with_nested_widgets() {
        let toml_str = r#"
            format_version = 1
            default_screen_id = 1

            [[screen]]
            id = 1
            name = "main"

            [[screen.widget]]
            channel_name = "rpm"
            warn_threshold = 6500.0

            [[rule]]
            id = 1
            priority = 10
            channel_name = "coolant_temp"
            comparator = "gte"
            threshold = 110.0
            target_screen_id = 2
        "#;
        let file: ScreensFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.screen.len(), 1);
        assert_eq!(file.screen[0].widget.len(), 1);
        assert_eq!(file.rule[0].to_display_rule().target_screen_id, 2);
    }
}
