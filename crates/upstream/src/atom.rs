//! Minimal Atom reader for GitHub's public activity feed.

use folio_core::{ActivityItem, ActivityKind, repo_from_github_url};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: String,
    pub updated: String,
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Published,
    Updated,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Field::Id),
            b"title" => Some(Field::Title),
            b"published" => Some(Field::Published),
            b"updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

/// Collects every `<entry>` of an Atom document. Text is entity-decoded.
pub fn parse_atom_entries(xml: &str) -> Result<Vec<AtomEntry>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<AtomEntry> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                let name = start.local_name();
                if name.as_ref() == b"entry" {
                    current = Some(AtomEntry::default());
                } else if let Some(entry) = current.as_mut() {
                    if name.as_ref() == b"link" {
                        read_link(&start, entry)?;
                    }
                    field = Field::from_name(name.as_ref());
                }
            }
            Event::Empty(start) => {
                if let Some(entry) = current.as_mut()
                    && start.local_name().as_ref() == b"link"
                {
                    read_link(&start, entry)?;
                }
            }
            Event::Text(text) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    push_text(entry, field, &text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field) {
                    push_text(entry, field, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(end) => {
                if end.local_name().as_ref() == b"entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn read_link(start: &BytesStart<'_>, entry: &mut AtomEntry) -> Result<(), quick_xml::Error> {
    if !entry.link.is_empty() {
        return Ok(());
    }
    if let Some(href) = start.try_get_attribute("href")? {
        entry.link = href.unescape_value()?.into_owned();
    }
    Ok(())
}

fn push_text(entry: &mut AtomEntry, field: Field, text: &str) {
    let target = match field {
        Field::Id => &mut entry.id,
        Field::Title => &mut entry.title,
        Field::Published => &mut entry.published,
        Field::Updated => &mut entry.updated,
    };
    target.push_str(text);
}

pub fn atom_items(entries: &[AtomEntry]) -> Vec<ActivityItem> {
    entries
        .iter()
        .filter(|entry| !entry.link.is_empty())
        .map(|entry| {
            let kind = if entry.link.contains("/pull/") {
                ActivityKind::PullRequest
            } else {
                ActivityKind::Commit
            };
            let created_at = if entry.published.is_empty() {
                entry.updated.clone()
            } else {
                entry.published.clone()
            };
            ActivityItem {
                id: if entry.id.is_empty() {
                    entry.link.clone()
                } else {
                    entry.id.clone()
                },
                kind,
                title: entry.title.trim().to_string(),
                url: entry.link.clone(),
                repo: repo_from_github_url(&entry.link).unwrap_or_default(),
                created_at,
            }
        })
        .collect()
}
