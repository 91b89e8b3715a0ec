//! Pure rendering of chat turns into terminal text.

use owo_colors::OwoColorize;
use verdant_core::conversation::{ChatRole, ChatTurn};

const BAR_CHAR: &str = "▎";

pub fn banner() -> String {
    format!(
        "🌿 {} v{} — plant identification & care chat",
        "Verdant".bright_green().bold(),
        env!("CARGO_PKG_VERSION")
    )
}

/// Renders a single turn. The role determines the gutter color and
/// icon; the text is rendered verbatim, line breaks preserved, with
/// every line carrying the gutter.
pub fn render_turn(turn: &ChatTurn) -> String {
    let bar = match turn.role {
        ChatRole::User => BAR_CHAR.bright_yellow().to_string(),
        ChatRole::Assistant => BAR_CHAR.bright_cyan().to_string(),
    };
    let icon = match turn.role {
        ChatRole::User => "🧑",
        ChatRole::Assistant => "🤖",
    };

    let mut out = String::new();
    for (idx, line) in turn.text.split('\n').enumerate() {
        if idx == 0 {
            out.push_str(&format!("{bar}{icon} {line}"));
        } else {
            out.push_str(&format!("\n{bar}   {line}"));
        }
    }
    out
}
