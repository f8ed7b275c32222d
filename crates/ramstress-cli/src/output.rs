//! Output formatting for CLI.

use clap::ValueEnum;

/// Width of banners and rules.
pub const WIDTH: usize = 74;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable tables and banners.
    #[default]
    Table,
    /// JSON output.
    Json,
    /// Raw values (for scripting).
    Raw,
}

/// A boxed, centered title.
pub fn banner(title: &str) -> String {
    let inner = WIDTH - 2;
    format!(
        "╔{bar}╗\n║{title:^inner$}║\n╚{bar}╝",
        bar = "═".repeat(inner)
    )
}

/// A thin horizontal rule.
pub fn rule() -> String {
    "─".repeat(WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_lines_have_equal_width() {
        let text = banner("ALLOCATION COMPLETE");
        let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths, vec![WIDTH; 3]);
        assert!(text.contains("ALLOCATION COMPLETE"));
    }

    #[test]
    fn test_rule_width() {
        assert_eq!(rule().chars().count(), WIDTH);
    }
}
