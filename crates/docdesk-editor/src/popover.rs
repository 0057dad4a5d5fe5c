//! Popover geometry and link input handling.
//!
//! Coordinates are CSS pixels relative to the viewport's top-left corner.

use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Edges inclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Where a popover ends up relative to its trigger.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Placement {
    pub rect: Rect,
    /// True when there was no room below and the popover opened above.
    pub above: bool,
}

/// Place a popover of `size` next to `trigger` inside `viewport`.
///
/// Opens below the trigger, flips above when it would overflow the bottom
/// edge, shifts left when it would overflow the right edge, and finally
/// clamps to `margin` from the top-left corner.
pub fn place(trigger: Rect, size: Size, viewport: Size, gap: f64, margin: f64) -> Placement {
    let mut x = trigger.x;
    let mut y = trigger.bottom() + gap;
    let mut above = false;

    if y + size.height > viewport.height - margin {
        y = trigger.y - gap - size.height;
        above = true;
    }
    if x + size.width > viewport.width - margin {
        x = viewport.width - margin - size.width;
    }

    Placement {
        rect: Rect::new(x.max(margin), y.max(margin), size.width, size.height),
        above,
    }
}

/// Prepend `https://` unless the input already names a scheme, then check
/// the result parses. Empty input yields `None`.
pub fn normalize_url(input: &str) -> Option<Result<String, url::ParseError>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let candidate = if has_scheme(input) {
        input.to_owned()
    } else {
        format!("https://{input}")
    };
    Some(url::Url::parse(&candidate).map(|_| candidate))
}

/// A leading `scheme:` before the first `/`, `?` or `#`. `host:port` is not
/// a scheme.
fn has_scheme(input: &str) -> bool {
    let authority_end = input.find(['/', '?', '#']).unwrap_or(input.len());
    let Some((scheme, rest)) = input[..authority_end].split_once(':') else {
        return false;
    };
    let valid_scheme = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let is_port = !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit());
    valid_scheme && !is_port
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    fn place_default(trigger: Rect, size: Size) -> Placement {
        place(trigger, size, VIEWPORT, 4.0, 8.0)
    }

    #[test]
    fn test_opens_below_trigger() {
        let placed = place_default(Rect::new(100.0, 50.0, 32.0, 32.0), Size::new(200.0, 120.0));
        assert_eq!(placed.rect, Rect::new(100.0, 86.0, 200.0, 120.0));
        assert!(!placed.above);
    }

    #[test]
    fn test_flips_above_on_bottom_overflow() {
        let placed = place_default(Rect::new(100.0, 500.0, 32.0, 32.0), Size::new(200.0, 120.0));
        assert_eq!(placed.rect.y, 376.0);
        assert!(placed.above);
    }

    #[test]
    fn test_shifts_left_on_right_overflow() {
        let placed = place_default(Rect::new(760.0, 50.0, 32.0, 32.0), Size::new(200.0, 120.0));
        assert_eq!(placed.rect.x, 592.0);
    }

    #[test]
    fn test_clamped_to_margin() {
        // Too tall for either side: pinned to the top margin.
        let placed = place_default(Rect::new(2.0, 100.0, 32.0, 32.0), Size::new(200.0, 590.0));
        assert_eq!(placed.rect.x, 8.0);
        assert_eq!(placed.rect.y, 8.0);
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(!rect.contains(Point::new(9.9, 15.0)));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("example.com/a").unwrap().unwrap(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_url(" http://example.com ").unwrap().unwrap(),
            "http://example.com"
        );
        assert_eq!(
            normalize_url("MAILTO:me@example.com").unwrap().unwrap(),
            "MAILTO:me@example.com"
        );
        assert_eq!(
            normalize_url("example.com/?next=https://other.org").unwrap().unwrap(),
            "https://example.com/?next=https://other.org"
        );
        assert_eq!(
            normalize_url("localhost:8080/admin").unwrap().unwrap(),
            "https://localhost:8080/admin"
        );
        assert_eq!(
            normalize_url("tel:+15550100").unwrap().unwrap(),
            "tel:+15550100"
        );
        assert!(normalize_url("   ").is_none());
        assert!(normalize_url("exa mple.com").unwrap().is_err());
    }
}
