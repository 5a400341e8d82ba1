use serde::{Deserialize, Serialize};

/// Character budget of one wrapped summary line in the visual layout.
pub const SUMMARY_WIDTH: usize = 77;
/// Width of each concept column in the visual layout.
pub const COLUMN_WIDTH: usize = 35;
/// Concepts drawn in the network layout before it is cut short.
pub const NETWORK_CONCEPT_LIMIT: usize = 8;
pub const MORE_CONCEPTS_MARKER: &str = "...and more concepts";

const CENTER_COLUMN: usize = 40;
/// Room left for a concept once the branch glyphs are drawn.
const COLUMN_CONCEPT_WIDTH: usize = COLUMN_WIDTH - 6;
const BOX_INNER_WIDTH: usize = SUMMARY_WIDTH + 1;
const NETWORK_BOX_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapSet {
    pub visual: String,
    pub network: String,
    pub hierarchical: String,
}

pub fn render(title: &str, summary: &str, concepts: &[String]) -> MindMapSet {
    MindMapSet {
        visual: visual(title, summary, concepts),
        network: network(title, concepts),
        hierarchical: hierarchical(title, concepts),
    }
}

/// Title box on top, concepts in two columns, boxed summary below.
pub fn visual(title: &str, summary: &str, concepts: &[String]) -> String {
    let upper = title.to_uppercase();
    let title_len = upper.chars().count();
    let indent = " ".repeat(CENTER_COLUMN.saturating_sub(title_len / 2));

    let mut lines = vec![
        String::new(),
        format!("{indent}╔{}╗", "═".repeat(title_len + 4)),
        format!("{indent}║  {upper}  ║"),
        format!("{indent}╚{}╝", "═".repeat(title_len + 4)),
        String::new(),
    ];

    if !concepts.is_empty() {
        lines.push(format!("{}│", " ".repeat(CENTER_COLUMN)));
        lines.push(format!("{}┌─────┴─────┐", " ".repeat(CENTER_COLUMN - 5)));
        lines.push(format!("{}│           │", " ".repeat(CENTER_COLUMN - 5)));

        let (left, right) = concepts.split_at(concepts.len() / 2);
        for row in 0..left.len().max(right.len()) {
            let left_text = left.get(row).map(|c| format!("├── 📌 {}", fit_column(c)));
            let right_text = right.get(row).map(|c| format!("📌 {} ──┤", fit_column(c)));
            let line = match (left_text, right_text) {
                (Some(l), Some(r)) => format!("{l:<COLUMN_WIDTH$}│{r:>COLUMN_WIDTH$}"),
                (Some(l), None) => format!("{l:<COLUMN_WIDTH$}│"),
                (None, Some(r)) => format!("{:<COLUMN_WIDTH$}│{r:>COLUMN_WIDTH$}", ""),
                (None, None) => format!("{:<COLUMN_WIDTH$}│", ""),
            };
            lines.push(line);
        }
    }

    lines.push(String::new());
    lines.push(format!("┌{}┐", "─".repeat(BOX_INNER_WIDTH)));
    lines.push(format!("│{:^BOX_INNER_WIDTH$}│", " SUMMARY "));
    lines.push(format!("├{}┤", "─".repeat(BOX_INNER_WIDTH)));
    for line in wrap_words(summary, SUMMARY_WIDTH) {
        lines.push(format!("│ {line:<SUMMARY_WIDTH$}│"));
    }
    lines.push(format!("└{}┘", "─".repeat(BOX_INNER_WIDTH)));

    lines.join("\n")
}

fn fit_column(concept: &str) -> String {
    if concept.chars().count() <= COLUMN_CONCEPT_WIDTH {
        return concept.to_string();
    }
    let mut cut: String = concept.chars().take(COLUMN_CONCEPT_WIDTH - 1).collect();
    cut.push('…');
    cut
}

/// Root node with up to eight concepts hanging off a central trunk.
pub fn network(title: &str, concepts: &[String]) -> String {
    let mut lines = vec![
        String::new(),
        format!("╔{}╗", "═".repeat(NETWORK_BOX_WIDTH)),
        format!("║{:^NETWORK_BOX_WIDTH$}║", "NETWORK MIND MAP"),
        format!("╠{}╣", "═".repeat(NETWORK_BOX_WIDTH)),
        format!("║{title:^NETWORK_BOX_WIDTH$}║"),
        format!("╚{}╝", "═".repeat(NETWORK_BOX_WIDTH)),
        String::new(),
        format!("        🔵 {title}"),
        "        │".to_string(),
        "   ┌────┴────┐".to_string(),
    ];

    for (i, concept) in concepts.iter().take(NETWORK_CONCEPT_LIMIT).enumerate() {
        if i % 2 == 0 {
            lines.push("   │         │".to_string());
            lines.push(format!("   ├─ 🔸 {concept}"));
        } else {
            lines.push(format!("   │         └─ 🔸 {concept}"));
        }
    }

    if concepts.len() > NETWORK_CONCEPT_LIMIT {
        lines.push("   │".to_string());
        lines.push(format!("   └─ 🔸 {MORE_CONCEPTS_MARKER}"));
    }

    lines.join("\n")
}

/// Root line followed by one branch per concept.
pub fn hierarchical(title: &str, concepts: &[String]) -> String {
    let mut lines = vec![format!("🌳 {}", title.to_uppercase())];
    for (i, concept) in concepts.iter().enumerate() {
        let glyph = if i + 1 == concepts.len() { "└──" } else { "├──" };
        lines.push(format!("{glyph} 🌿 {concept}"));
    }
    lines.join("\n")
}

/// Greedy word wrap; no returned line is longer than `width` characters.
/// Words longer than `width` are split across lines.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();

        while chars.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        if chars.is_empty() {
            continue;
        }

        let needed = if current_len == 0 { chars.len() } else { current_len + 1 + chars.len() };
        if needed > width {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current_len += chars.len();
        current.extend(chars);
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}
