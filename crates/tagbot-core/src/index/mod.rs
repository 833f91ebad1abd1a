//! Tag index pages: parsing lines into entries and rendering the document.

mod entry;
mod render;

pub use entry::{
    CATEGORY_MARKERS, IndexEntry, ParsedLine, list_items, parse_line, sort_key_for_title,
};
pub use render::{collapse_entries, parse_index, render_index, rerender};
