//! Visual themes for the rendered Sankey figure.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConfigurationError;

/// Names of the built-in themes.
pub const THEME_NAMES: [&str; 3] = ["default", "d3", "simple"];

/// Styling applied to the figure. `node` and `link` are merged into the
/// Plotly sankey `node` / `link` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub label_style: Option<String>,
    #[serde(default)]
    pub title_style: Option<String>,
    #[serde(default = "empty_object")]
    pub node: Value,
    #[serde(default = "empty_object")]
    pub link: Value,
}

fn empty_object() -> Value {
    json!({})
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            label_style: Some(
                "color: #fff; font-weight: 600; letter-spacing: -1px; \
                 text-shadow: 0 0 4px black, -1px 1px 0 #76777a, 1px 1px 0 #76777a, \
                 1px -1px 0 #76777a, -1px -1px 0 #76777a;"
                    .into(),
            ),
            title_style: Some(
                "color: #fff; font-weight: 900; word-spacing: 10px; letter-spacing: 3px; \
                 text-shadow: 0 0 1px black, 0 0 2px black, 0 0 4px black;"
                    .into(),
            ),
            node: json!({"pad": 30, "thickness": 10, "line": {"color": "#505050", "width": 1.5}}),
            link: json!({"line": {"color": "#909090", "width": 1}}),
        }
    }
}

impl Theme {
    pub fn d3() -> Self {
        Self {
            label_style: None,
            title_style: None,
            node: json!({"line": {"width": 1}, "pad": 20, "thickness": 15}),
            link: json!({"color": "rgba(120, 120, 120, 0.25)"}),
        }
    }

    pub fn simple() -> Self {
        Self {
            label_style: Some("color: #666666; font-size: 18px;".into()),
            title_style: Some("color: #666666; font-size: 24px; font-weight: 900;".into()),
            node: json!({"line": {"width": 0}, "pad": 60, "thickness": 30}),
            link: json!({"color": "rgba(120, 120, 120, 0.25)"}),
        }
    }

    /// Look up a built-in theme by name.
    pub fn load(name: &str) -> Result<Self, ConfigurationError> {
        match name {
            "default" => Ok(Self::default()),
            "d3" => Ok(Self::d3()),
            "simple" => Ok(Self::simple()),
            other => Err(ConfigurationError::UnknownTheme(
                other.to_string(),
                THEME_NAMES.iter().map(|s| s.to_string()).collect(),
            )),
        }
    }

    /// Wrap text in a styled span, or return it unchanged without a style.
    pub fn style_label(&self, text: &str) -> String {
        styled(self.label_style.as_deref(), text)
    }

    pub fn style_title(&self, text: &str) -> String {
        styled(self.title_style.as_deref(), text)
    }
}

fn styled(style: Option<&str>, text: &str) -> String {
    match style {
        Some(s) => format!("<span style='{s}'>{text}</span>"),
        None => text.to_string(),
    }
}
