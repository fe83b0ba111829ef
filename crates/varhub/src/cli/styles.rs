//! Terminal styles.
//!
//! `console` drops the escape codes by itself when stdout is not a terminal, so piped
//! output and tests see plain text.

use console::Style;
use once_cell::sync::Lazy;
use varhubapp::status::Tone;

pub static HEADER: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static MUTED: Lazy<Style> = Lazy::new(|| Style::new().dim());
pub static GROUP: Lazy<Style> = Lazy::new(|| Style::new().cyan().bold());
pub static SECRET: Lazy<Style> = Lazy::new(|| Style::new().magenta());
pub static DELETED: Lazy<Style> = Lazy::new(|| Style::new().dim().strikethrough());
pub static SUCCESS: Lazy<Style> = Lazy::new(|| Style::new().green());
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow().bold());
pub static ERROR: Lazy<Style> = Lazy::new(|| Style::new().red().bold());

pub fn tone(tone: Tone) -> &'static Style {
    match tone {
        Tone::Success => &*SUCCESS,
        Tone::Warning => &*WARNING,
        Tone::Error => &*ERROR,
    }
}
