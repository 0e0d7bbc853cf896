use crate::note::Note;

/// `needle` is already lowercased; an empty needle matches every note.
fn matches_lowered(note: &Note, needle: &str) -> bool {
    needle.is_empty()
        || note.text.to_lowercase().contains(needle)
        || note.tag.to_lowercase().contains(needle)
}

/// Presentation order for `notes`: filtered by `search`, pinned notes first,
/// canonical order kept inside each pin group.
pub fn view<'a>(notes: &'a [Note], search: &str) -> Vec<&'a Note> {
    let needle = search.to_lowercase();
    let mut visible: Vec<&Note> = notes
        .iter()
        .filter(|note| matches_lowered(note, &needle))
        .collect();
    // sort_by_key is stable
    visible.sort_by_key(|note| !note.is_pinned);
    visible
}
