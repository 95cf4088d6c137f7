//! HTML fragments for vehicle map markers.
//!
//! Markers are a fixed vehicle silhouette SVG in an `my-div-icon__inner`
//! container, optionally followed by a `my-div-icon__name` label.

use crate::utils::escape_html;

/// Vehicle silhouette: body, four wheels, four windows.
const VEHICLE_SVG: &str = concat!(
    r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="30" viewBox="0 0 24 24" preserveAspectRatio="xMidYMid meet">"#,
    r##"<path fill="#000000" stroke="#000" stroke-width="0.5" d="M16 6H4c-1 0-1.5.5-1.5 1.5v8h1.5c0 1 .5 1.5 1.5 1.5s1.5-.5 1.5-1.5h6c0 1 .5 1.5 1.5 1.5s1.5-.5 1.5-1.5h1.5v-6l-4-3.5z"/>"##,
    r##"<circle fill="#333" cx="7" cy="16" r="1.2"/>"##,
    r##"<circle fill="#666" cx="7" cy="16" r="0.8"/>"##,
    r##"<circle fill="#333" cx="15" cy="16" r="1.2"/>"##,
    r##"<circle fill="#666" cx="15" cy="16" r="0.8"/>"##,
    r##"<rect fill="#ffffff" stroke="#cccccc" stroke-width="0.1" x="5" y="8.5" width="2" height="1.5" rx="0.2"/>"##,
    r##"<rect fill="#ffffff" stroke="#cccccc" stroke-width="0.1" x="7.5" y="8.5" width="2" height="1.5" rx="0.2"/>"##,
    r##"<rect fill="#ffffff" stroke="#cccccc" stroke-width="0.1" x="10" y="8.5" width="2" height="1.5" rx="0.2"/>"##,
    r##"<rect fill="#ffffff" stroke="#cccccc" stroke-width="0.1" x="12.5" y="8.5" width="2" height="1.5" rx="0.2"/>"##,
    "</svg>",
);

pub const INNER_CLASS: &str = "my-div-icon__inner";
pub const NAME_CLASS: &str = "my-div-icon__name";

/// A marker render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub name: String,
    /// Accepted for callers that pass a device color; not used in the markup.
    pub color: String,
    pub need_names: bool,
}

impl MarkerIcon {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            need_names: true,
        }
    }

    pub fn with_names(mut self, need_names: bool) -> Self {
        self.need_names = need_names;
        self
    }

    pub fn render(&self) -> String {
        icon_html(&self.name, &self.color, self.need_names)
    }
}

/// Render the marker fragment. Output is deterministic for given inputs.
pub fn icon_html(name: &str, _color: &str, need_names: bool) -> String {
    let mut html = format!(r#"<div class="{}">{}</div>"#, INNER_CLASS, VEHICLE_SVG);
    if need_names {
        html.push_str(&format!(r#"<div class="{}">{}</div>"#, NAME_CLASS, escape_html(name)));
    }
    html
}
