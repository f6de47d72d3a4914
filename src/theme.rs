//! Theme colors loaded from the Omarchy/Hyprland system theme
//! Reads colors from ~/.config/omarchy/current/theme/kitty.conf

use ratatui::style::Color;
use std::collections::HashMap;
use std::fs;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, current page, edit cursor
    pub danger: Color,      // Destructive actions
    pub success: Color,     // Checked rows
    pub warning: Color,     // Status messages, confirm popup
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Hints, unselected checkboxes, counts
    pub bg_selected: Color, // Cursor row background
    pub inactive: Color,    // Inactive borders
    pub header: Color,      // Table header text
}

impl Default for Theme {
    fn default() -> Self {
        // Fallback to Catppuccin-inspired colors if theme can't be loaded
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(250, 179, 135),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Load theme from the Omarchy system theme, falling back to defaults
    pub fn load() -> Self {
        Self::load_omarchy_theme().unwrap_or_default()
    }

    /// Load colors from the Omarchy kitty.conf theme file
    fn load_omarchy_theme() -> Option<Self> {
        let home = dirs::home_dir()?;
        let theme_path = home.join(".config/omarchy/current/theme/kitty.conf");

        let content = fs::read_to_string(&theme_path).ok()?;
        let colors = Self::parse_kitty_conf(&content);

        if colors.is_empty() {
            return None;
        }

        let fallback = Theme::default();

        let accent = colors
            .get("color2")
            .or(colors.get("color10"))
            .copied()
            .unwrap_or(fallback.accent);

        let danger = colors.get("color1").copied().unwrap_or(fallback.danger);

        let warning = colors
            .get("color4")
            .or(colors.get("color12"))
            .copied()
            .unwrap_or(fallback.warning);

        let text = colors
            .get("foreground")
            .copied()
            .unwrap_or(fallback.text);

        let text_dim = colors.get("color8").copied().unwrap_or(fallback.text_dim);

        let bg_selected = colors
            .get("selection_background")
            .or(colors.get("color0"))
            .copied()
            .unwrap_or(fallback.bg_selected);

        let inactive = colors
            .get("inactive_border_color")
            .or(colors.get("color8"))
            .copied()
            .unwrap_or(fallback.inactive);

        Some(Self {
            accent,
            danger,
            success: accent, // Omarchy Matte Black maps green to the gold accent
            warning,
            text,
            text_dim,
            bg_selected,
            inactive,
            header: danger, // Red/danger for headers (contrast)
        })
    }

    /// Parse kitty.conf format: `key value` or `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        let mut colors = HashMap::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.splitn(2, char::is_whitespace).collect();
            if parts.len() == 2 {
                let key = parts[0].trim();
                let value = parts[1].trim();

                if let Some(color) = Self::parse_hex_color(value) {
                    colors.insert(key.to_string(), color);
                }
            }
        }

        colors
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(
            Theme::parse_hex_color("#ffc107"),
            Some(Color::Rgb(255, 193, 7))
        );
        assert_eq!(Theme::parse_hex_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("not a color"), None);
    }

    #[test]
    fn test_parse_kitty_conf_skips_comments() {
        let conf = "# a comment\nforeground #bebebe\ncolor1 #d35f5f\nfont_size 11\n";
        let colors = Theme::parse_kitty_conf(conf);
        assert_eq!(colors.get("foreground"), Some(&Color::Rgb(190, 190, 190)));
        assert_eq!(colors.get("color1"), Some(&Color::Rgb(211, 95, 95)));
        assert!(!colors.contains_key("font_size"));
    }
}
