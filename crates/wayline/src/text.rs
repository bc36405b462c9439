//! Text width estimation for edge labels.
//!
//! Labels are sized before any font is available, so widths come from a
//! per-character heuristic tuned for a proportional sans-serif face.

use wayline_core::geometry::Size;

/// Estimates the rendered width of `text` at `font_size`.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.28,
        'M' | 'W' | '@' | '#' | '%' | '&' => 0.75,
        c if c.is_uppercase() => 0.62,
        _ => 0.56,
    }
}

/// Size of a label box: estimated width plus horizontal padding, rounded up.
pub fn label_size(text: &str, font_size: f32, horizontal_padding: f32, height: f32) -> Size {
    let width = (estimate_width(text, font_size) + horizontal_padding).ceil();
    Size::new(width, height)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(estimate_width("", 12.0), 0.0);
    }

    #[test]
    fn test_character_classes() {
        assert_approx_eq!(f32, estimate_width(" ", 10.0), 2.8);
        assert_approx_eq!(f32, estimate_width("W", 10.0), 7.5);
        assert_approx_eq!(f32, estimate_width("A", 10.0), 6.2);
        assert_approx_eq!(f32, estimate_width("a", 10.0), 5.6);
    }

    #[test]
    fn test_label_size_rounds_up() {
        // "ab" -> 2 * 0.56 * 12 = 13.44, plus 12 padding = 25.44
        let size = label_size("ab", 12.0, 12.0, 18.0);
        assert_eq!(size, Size::new(26.0, 18.0));
    }
}
