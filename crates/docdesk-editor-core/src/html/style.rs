//! Inline `style` attribute handling.

use crate::types::{Alignment, StyleAttr, TextStyle};

/// Split an inline style into `(property, value)` pairs. Properties are
/// lowercased, values trimmed; malformed or empty declarations are skipped.
pub fn declarations(style: &str) -> impl Iterator<Item = (String, &str)> {
    style.split(';').filter_map(|decl| {
        let (prop, value) = decl.split_once(':')?;
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim();
        (!prop.is_empty() && !value.is_empty()).then_some((prop, value))
    })
}

/// Whether `value` fits in one declaration: it cannot end the declaration,
/// start another, or leave the attribute.
pub fn is_safe_value(value: &str) -> bool {
    !value.trim().is_empty()
        && !value
            .chars()
            .any(|c| matches!(c, ';' | ':' | '"' | '<' | '>' | '{' | '}' | '\\') || c.is_control())
}

/// `text-align` from an inline style.
pub fn alignment(style: &str) -> Option<Alignment> {
    declarations(style)
        .filter(|(prop, _)| prop == "text-align")
        .find_map(|(_, value)| Alignment::from_css(value))
}

/// Text-style attributes present in an inline style, whether or not the
/// schema allows them.
pub fn text_style(style: &str) -> Vec<(StyleAttr, &str)> {
    declarations(style)
        .filter_map(|(prop, value)| {
            StyleAttr::ALL
                .into_iter()
                .find(|attr| attr.css_property() == prop)
                .map(|attr| (attr, value))
        })
        .collect()
}

/// Serialize the text-style mark in fixed attribute order.
pub fn render_text_style(style: &TextStyle) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(color) = &style.color {
        parts.push(format!("color: {color}"));
    }
    if let Some(family) = &style.font_family {
        parts.push(format!("font-family: {family}"));
    }
    if let Some(size) = &style.font_size {
        parts.push(crate::extensions::font_size::render(size));
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_skip_garbage() {
        let decls: Vec<_> = declarations(" Color : Red ;;nonsense; font-size:  ;max-width:50%").collect();
        assert_eq!(
            decls,
            vec![("color".to_string(), "Red"), ("max-width".to_string(), "50%")]
        );
    }

    #[test]
    fn test_unsafe_values() {
        assert!(is_safe_value("#e03131"));
        assert!(is_safe_value("'Open Sans', sans-serif"));
        assert!(is_safe_value("rgb(0, 0, 0)"));
        assert!(!is_safe_value("12px; color: red"));
        assert!(!is_safe_value("red\" onclick=\"x"));
        assert!(!is_safe_value("</span>"));
        assert!(!is_safe_value("a\nb"));
        assert!(!is_safe_value(" "));
    }

    #[test]
    fn test_alignment_from_style() {
        assert_eq!(alignment("margin: 0; text-align: right"), Some(Alignment::Right));
        assert_eq!(alignment("text-align: inherit"), None);
    }

    #[test]
    fn test_text_style_order_is_fixed() {
        let style = TextStyle {
            color: Some("#ff0000".into()),
            font_family: Some("Inter".into()),
            font_size: Some("18px".into()),
        };
        assert_eq!(
            render_text_style(&style),
            "color: #ff0000; font-family: Inter; font-size: 18px"
        );
        let parsed = text_style("font-size: 18px; color: #ff0000; font-weight: bold");
        assert_eq!(
            parsed,
            vec![(StyleAttr::FontSize, "18px"), (StyleAttr::Color, "#ff0000")]
        );
    }
}
