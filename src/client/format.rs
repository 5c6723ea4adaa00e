use lazy_static::lazy_static;
use regex::Regex;

/// Deepest indent level a paragraph line keeps.
pub const MAX_INDENT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedLine {
    Spacer,
    ListItem { marker: String, content: String },
    Header(String),
    Paragraph { text: String, indent: usize },
}

#[derive(Clone, Copy)]
enum MarkerKind {
    Bullet,
    Ordinal,
}

lazy_static! {
    // Checked in order; lettered items win over roman numerals.
    static ref LIST_PATTERNS: Vec<(Regex, MarkerKind)> = vec![
        (Regex::new(r"^[•·▪▫‣⁃]\s*(.+)$").unwrap(), MarkerKind::Bullet),
        (Regex::new(r"^[-*+]\s*(.+)$").unwrap(), MarkerKind::Bullet),
        (Regex::new(r"^(\d+)[.)]\s*(.+)$").unwrap(), MarkerKind::Ordinal),
        (Regex::new(r"^([a-zA-Z])[.)]\s*(.+)$").unwrap(), MarkerKind::Ordinal),
        (Regex::new(r"^([ivxIVX]+)[.)]\s*(.+)$").unwrap(), MarkerKind::Ordinal),
    ];
}

fn list_item(trimmed: &str) -> Option<FormattedLine> {
    LIST_PATTERNS.iter().find_map(|(pattern, kind)| {
        let caps = pattern.captures(trimmed)?;
        let (marker, content) = match kind {
            MarkerKind::Bullet => ("•".to_string(), caps[1].to_string()),
            MarkerKind::Ordinal => (format!("{}.", &caps[1]), caps[2].to_string()),
        };
        Some(FormattedLine::ListItem { marker, content })
    })
}

/// Splits a reply into display lines for the chat window.
pub fn format_message_text(text: &str) -> Vec<FormattedLine> {
    text.split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return FormattedLine::Spacer;
            }
            if let Some(item) = list_item(trimmed) {
                return item;
            }
            if trimmed.ends_with(':') && trimmed.chars().count() > 1 {
                return FormattedLine::Header(trimmed.to_string());
            }
            let indent = line.chars().take_while(|c| c.is_whitespace()).count();
            FormattedLine::Paragraph {
                text: trimmed.to_string(),
                indent: indent.min(MAX_INDENT),
            }
        })
        .collect()
}
