//! Listing response parser.
//!
//! Reads `EnumerationResults/Entries/{Directory,File}/Name` and takes the
//! text of the last direct child of the root element as the continuation
//! marker (the provider always emits `NextMarker` last). Any other root
//! element, or a listing without `Entries`, is rejected. Entry names are
//! kept byte for byte; only the marker is trimmed.

use crate::listing::error::{ListingError, ListingResult};
use crate::listing::types::ListingPage;
use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT_ELEMENT: &str = "EnumerationResults";
const ENTRIES_ELEMENT: &str = "Entries";

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

pub fn parse_listing(body: &str) -> ListingResult<ListingPage> {
    let body = body.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(body);

    let mut page = ListingPage::default();
    let mut stack: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut saw_entries = false;
    let mut trailing_text = String::new();
    let mut current_name: Option<(EntryKind, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.local_name().as_ref())?;
                open_element(&stack, &name, &mut saw_root, &mut saw_entries)?;
                if stack.len() == 1 {
                    trailing_text.clear();
                }
                stack.push(name);
                if let Some(kind) = entry_name_kind(&stack) {
                    current_name = Some((kind, String::new()));
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.local_name().as_ref())?;
                open_element(&stack, &name, &mut saw_root, &mut saw_entries)?;
                if stack.len() == 1 {
                    trailing_text.clear();
                }
                stack.push(name);
                if let Some(kind) = entry_name_kind(&stack) {
                    push_entry(&mut page, kind, String::new());
                }
                stack.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| ListingError::Parse(format!("bad text content: {}", e)))?;
                append_text(&stack, &text, &mut trailing_text, &mut current_name);
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|_| ListingError::Parse("Invalid UTF-8 in CDATA".into()))?;
                append_text(&stack, text, &mut trailing_text, &mut current_name);
            }
            Ok(Event::End(_)) => {
                if entry_name_kind(&stack).is_some() {
                    if let Some((kind, name)) = current_name.take() {
                        push_entry(&mut page, kind, name);
                    }
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ListingError::Parse(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(ListingError::Parse("response contains no root element".into()));
    }
    if !stack.is_empty() {
        return Err(ListingError::Parse(format!(
            "unexpected end of document inside <{}>",
            stack.join("/")
        )));
    }
    if !saw_entries {
        return Err(ListingError::Parse(format!(
            "<{}> has no <{}> element",
            ROOT_ELEMENT, ENTRIES_ELEMENT
        )));
    }

    let marker = trailing_text.trim();
    if !marker.is_empty() {
        page.next_marker = Some(marker.to_string());
    }

    Ok(page)
}

fn local_name(raw: &[u8]) -> ListingResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| ListingError::Parse("Invalid UTF-8 in tag name".into()))
}

fn open_element(
    stack: &[String],
    name: &str,
    saw_root: &mut bool,
    saw_entries: &mut bool,
) -> ListingResult<()> {
    match stack.len() {
        0 if name != ROOT_ELEMENT => Err(ListingError::Parse(format!(
            "expected <{}> root, found <{}>",
            ROOT_ELEMENT, name
        ))),
        0 => {
            *saw_root = true;
            Ok(())
        }
        1 => {
            if name == ENTRIES_ELEMENT {
                *saw_entries = true;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// `[root, Entries, Directory|File, Name]`
fn entry_name_kind(stack: &[String]) -> Option<EntryKind> {
    match stack {
        [_, entries, kind, name] if entries == ENTRIES_ELEMENT && name == "Name" => {
            match kind.as_str() {
                "Directory" => Some(EntryKind::Directory),
                "File" => Some(EntryKind::File),
                _ => None,
            }
        }
        _ => None,
    }
}

fn append_text(
    stack: &[String],
    text: &str,
    trailing_text: &mut String,
    current_name: &mut Option<(EntryKind, String)>,
) {
    if stack.len() == 2 {
        trailing_text.push_str(text);
    } else if entry_name_kind(stack).is_some() {
        if let Some((_, name)) = current_name.as_mut() {
            name.push_str(text);
        }
    }
}

fn push_entry(page: &mut ListingPage, kind: EntryKind, name: String) {
    if name.is_empty() {
        tracing::warn!("Skipping listing entry with empty name");
        return;
    }
    match kind {
        EntryKind::Directory => page.directories.push(name),
        EntryKind::File => page.files.push(name),
    }
}
