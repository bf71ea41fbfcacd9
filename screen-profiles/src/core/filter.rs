//! Pruning of exported settings documents down to the window layout.
//!
//! The filter never re-serializes anything. It walks the export with a
//! streaming reader, records the byte ranges to leave out, and copies every
//! other byte straight from the input, so whatever is kept comes out
//! identical to the export.

use std::ops::Range;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ProfileError;

/// Top-level category that holds the window layout
pub const WINDOW_LAYOUT_GROUP: &str = "Environment_Group";
/// Category inside the group that is the window layout itself
pub const WINDOW_LAYOUT_CATEGORY: &str = "Environment_WindowLayout";

const ROOT_ELEMENT: &[u8] = b"UserSettings";
const CATEGORY_ELEMENT: &[u8] = b"Category";
const NAME_ATTRIBUTE: &[u8] = b"name";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What happens to a direct child of the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildAction {
    /// A window layout group, pruned one level down
    Group,
    /// Left exactly as exported
    Keep,
    /// Kept as an element with no content
    Hollow,
    Remove,
}

/// One `Environment_Group` child of the root after pruning
struct GroupCandidate {
    /// The whole element plus the indentation before it
    span: Range<usize>,
    /// Removed children, when this group is the one kept
    cuts: Vec<Range<usize>>,
    has_window_layout: bool,
}

/// Return a copy of `input` that only carries the window layout category.
///
/// Documents whose root is not `UserSettings` come back unchanged.
pub fn filter_document(input: &[u8]) -> Result<Vec<u8>, ProfileError> {
    let (bom, body) = match input.strip_prefix(UTF8_BOM) {
        Some(rest) => (UTF8_BOM, rest),
        None => (&b""[..], input),
    };

    let mut reader = Reader::from_reader(body);
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == ROOT_ELEMENT => break,
            Event::Start(_) | Event::Empty(_) | Event::Eof => {
                tracing::debug!("No UserSettings children to filter, leaving document as is");
                return Ok(input.to_vec());
            }
            _ => {}
        }
    }

    let cuts = filter_root_children(&mut reader)?;

    let mut output = Vec::with_capacity(input.len());
    output.extend_from_slice(bom);
    let mut copied = 0;
    for cut in cuts {
        output.extend_from_slice(&body[copied..cut.start]);
        copied = cut.end;
    }
    output.extend_from_slice(&body[copied..]);
    Ok(output)
}

/// Filter the settings file at `path` in place.
pub fn strip_settings_file(path: &Path) -> Result<(), ProfileError> {
    let original = std::fs::read(path)?;
    let filtered = filter_document(&original)?;
    std::fs::write(path, &filtered)?;

    tracing::debug!(
        "Stripped {} to window layout ({} -> {} bytes)",
        path.display(),
        original.len(),
        filtered.len()
    );
    Ok(())
}

/// Ranges of the root's content to leave out, sorted by offset.
fn filter_root_children(reader: &mut Reader<&[u8]>) -> Result<Vec<Range<usize>>, ProfileError> {
    let mut cuts = Vec::new();
    let mut groups = Vec::new();
    let mut whitespace_start = None;

    loop {
        let start = position(reader);
        let event = reader.read_event()?;
        // A removed node takes the indentation before it along.
        let removal_start = whitespace_start.take().unwrap_or(start);

        match event {
            Event::Start(e) => match classify_child(&e) {
                ChildAction::Group => groups.push(prune_group(reader, removal_start)?),
                ChildAction::Keep => {
                    skip_subtree(reader)?;
                }
                ChildAction::Hollow => {
                    let content_start = position(reader);
                    let content_end = skip_subtree(reader)?;
                    cuts.push(content_start..content_end);
                }
                ChildAction::Remove => {
                    skip_subtree(reader)?;
                    cuts.push(removal_start..position(reader));
                }
            },
            Event::Empty(e) => match classify_child(&e) {
                ChildAction::Group => groups.push(GroupCandidate {
                    span: removal_start..position(reader),
                    cuts: Vec::new(),
                    has_window_layout: false,
                }),
                ChildAction::Keep | ChildAction::Hollow => {}
                ChildAction::Remove => cuts.push(removal_start..position(reader)),
            },
            Event::Text(text) if is_whitespace(&text) => whitespace_start = Some(removal_start),
            Event::End(_) => break,
            Event::Eof => return Err(ProfileError::TruncatedDocument),
            // Comments, processing instructions and stray text stay.
            _ => {}
        }
    }

    cuts.extend(resolve_groups(groups));
    cuts.sort_by_key(|cut| cut.start);
    Ok(cuts)
}

/// Walk the children of a window layout group whose start tag was just read.
fn prune_group(
    reader: &mut Reader<&[u8]>,
    span_start: usize,
) -> Result<GroupCandidate, ProfileError> {
    let mut cuts = Vec::new();
    let mut has_window_layout = false;
    let mut whitespace_start = None;

    loop {
        let start = position(reader);
        let event = reader.read_event()?;
        let removal_start = whitespace_start.take().unwrap_or(start);

        match event {
            Event::Start(e) => {
                let keep = is_window_layout(&e);
                skip_subtree(reader)?;
                if keep {
                    has_window_layout = true;
                } else {
                    cuts.push(removal_start..position(reader));
                }
            }
            Event::Empty(e) => {
                if is_window_layout(&e) {
                    has_window_layout = true;
                } else {
                    cuts.push(removal_start..position(reader));
                }
            }
            Event::Text(text) if is_whitespace(&text) => whitespace_start = Some(removal_start),
            Event::End(_) => {
                return Ok(GroupCandidate {
                    span: span_start..position(reader),
                    cuts,
                    has_window_layout,
                });
            }
            Event::Eof => return Err(ProfileError::TruncatedDocument),
            // Anything without a name attribute cannot be the window layout.
            _ => cuts.push(removal_start..position(reader)),
        }
    }
}

/// At most one group survives: the first one still holding the window
/// layout, or the first one overall when none does.
fn resolve_groups(groups: Vec<GroupCandidate>) -> Vec<Range<usize>> {
    let kept = groups
        .iter()
        .position(|group| group.has_window_layout)
        .unwrap_or(0);

    let mut cuts = Vec::new();
    for (index, group) in groups.into_iter().enumerate() {
        if index == kept {
            cuts.extend(group.cuts);
        } else {
            tracing::debug!("Dropping duplicate {} category", WINDOW_LAYOUT_GROUP);
            cuts.push(group.span);
        }
    }
    cuts
}

fn classify_child(element: &BytesStart) -> ChildAction {
    if !element.name().as_ref().eq_ignore_ascii_case(CATEGORY_ELEMENT)
        || !has_attributes(element)
    {
        return ChildAction::Hollow;
    }

    match name_attribute(element) {
        None => ChildAction::Keep,
        Some(name) if name.eq_ignore_ascii_case(WINDOW_LAYOUT_GROUP) => ChildAction::Group,
        Some(_) => ChildAction::Remove,
    }
}

fn is_window_layout(element: &BytesStart) -> bool {
    name_attribute(element).is_some_and(|name| name.eq_ignore_ascii_case(WINDOW_LAYOUT_CATEGORY))
}

fn has_attributes(element: &BytesStart) -> bool {
    element.attributes().any(|attr| attr.is_ok())
}

/// Value of the `name` attribute; malformed attributes count as absent.
fn name_attribute(element: &BytesStart) -> Option<String> {
    element
        .attributes()
        .filter_map(Result::ok)
        .find(|attr| attr.key.as_ref() == NAME_ATTRIBUTE)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

fn is_whitespace(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

/// Offset of the next unread byte. The input is an in-memory slice, so it
/// always fits in usize.
fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

/// Consume events through the end tag matching the start tag just read,
/// returning the offset where that end tag begins.
fn skip_subtree(reader: &mut Reader<&[u8]>) -> Result<usize, ProfileError> {
    let mut depth = 0usize;
    loop {
        let start = position(reader);
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(start),
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(ProfileError::TruncatedDocument),
            _ => {}
        }
    }
}
