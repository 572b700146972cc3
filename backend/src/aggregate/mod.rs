//! Pure aggregation over loaded records. Nothing here touches I/O, so every
//! function can be called (and cached) independently per slide.

pub mod engagement;
pub mod ranking;
pub mod sentiment;

/// Entity names compare trimmed and case-insensitively.
pub fn same_entity(value: &str, wanted: &str) -> bool {
    value.trim().to_lowercase() == wanted.trim().to_lowercase()
}
