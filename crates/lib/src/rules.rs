//! Reply rules: when a text asks what to eat, and how a picked place is rendered.

use crate::places::Place;

/// Eating cue; must appear somewhere in the text.
pub const EAT_CUE: &str = "吃";
/// "What" cues; any one of them must appear alongside the eating cue.
pub const WHAT_CUES: [&str; 2] = ["什麼", "啥"];

/// True when `text` contains the eating cue and at least one "what" cue (substring match).
pub fn asks_what_to_eat(text: &str) -> bool {
    text.contains(EAT_CUE) && WHAT_CUES.iter().any(|cue| text.contains(cue))
}

/// Shortest decimal that round-trips: 4.5 -> "4.5", 4.0 -> "4".
pub fn format_rating(rating: f64) -> String {
    format!("{}", rating)
}

/// `<name>(<rating>)\n<vicinity>`
pub fn format_place(place: &Place) -> String {
    format!(
        "{}({})\n{}",
        place.name,
        format_rating(place.rating),
        place.vicinity
    )
}
