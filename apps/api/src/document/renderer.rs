//! Document renderer — fills a `.docx` template with mapped deal data.
//!
//! Two template features only:
//! - `{field}` placeholders, substituted wherever they appear in a paragraph.
//!   A placeholder inside one run is replaced in place. One that Word split
//!   across runs is written into the run where it starts; the runs it spills
//!   into lose only the placeholder's characters. Other runs are untouched.
//! - `{#flag}` / `{/flag}` markers, each alone in a body-level paragraph. The
//!   blocks between them are kept only when `flag` is truthy. Regions do not nest.
//!
//! `word/document.xml` gets both; headers and footers get placeholders only.
//! Every other package part is copied through untouched.

use std::io::{Cursor, Read, Write};
use std::ops::Range;
use std::sync::LazyLock;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::mapper::TemplateData;

pub const DOCUMENT_PART: &str = "word/document.xml";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("valid placeholder regex")
});

static REGION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\{([#/])([A-Za-z_][A-Za-z0-9_.]*)\}$").expect("valid marker regex")
});

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid template package: {0}")]
    InvalidTemplate(String),

    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("failed to write document package: {0}")]
    Package(String),

    #[error("conditional region '{{#{0}}}' is never closed")]
    UnclosedRegion(String),

    #[error("'{{/{0}}}' closes no open region")]
    UnopenedRegion(String),

    #[error("conditional region '{{#{inner}}}' is nested inside '{{#{outer}}}'")]
    NestedRegion { outer: String, inner: String },

    #[error("conditional region '{{#{open}}}' is closed by '{{/{close}}}'")]
    MismatchedRegion { open: String, close: String },
}

/// Renders `template` (a `.docx` package) with `data`. Pure: the same inputs
/// always produce the same bytes.
pub fn render(template: &[u8], data: &TemplateData) -> Result<Vec<u8>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| RenderError::InvalidTemplate(e.to_string()))?;

    if archive.by_name(DOCUMENT_PART).is_err() {
        return Err(RenderError::InvalidTemplate(format!(
            "missing {DOCUMENT_PART}"
        )));
    }

    // Fixed timestamp so identical inputs give identical archives.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| RenderError::InvalidTemplate(e.to_string()))?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| RenderError::Package(e.to_string()))?;
            continue;
        }

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|e| RenderError::InvalidTemplate(format!("{name}: {e}")))?;

        let contents = match PartKind::of(&name) {
            PartKind::Body => render_body_part(&name, &contents, data)?,
            PartKind::HeaderFooter => render_header_part(&name, &contents, data)?,
            PartKind::Other => contents,
        };

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| RenderError::Package(e.to_string()))?;
        writer
            .write_all(&contents)
            .map_err(|e| RenderError::Package(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| RenderError::Package(e.to_string()))?;
    Ok(cursor.into_inner())
}

enum PartKind {
    Body,
    HeaderFooter,
    Other,
}

impl PartKind {
    fn of(name: &str) -> Self {
        if name == DOCUMENT_PART {
            PartKind::Body
        } else if (name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml")
        {
            PartKind::HeaderFooter
        } else {
            PartKind::Other
        }
    }
}

fn render_body_part(part: &str, xml: &[u8], data: &TemplateData) -> Result<Vec<u8>, RenderError> {
    let events = read_events(part, xml)?;
    let events = apply_regions(events, data)?;
    let events = substitute_placeholders(events, data);
    write_events(part, events)
}

fn render_header_part(
    part: &str,
    xml: &[u8],
    data: &TemplateData,
) -> Result<Vec<u8>, RenderError> {
    let events = read_events(part, xml)?;
    let events = substitute_placeholders(events, data);
    write_events(part, events)
}

fn xml_error(part: &str, e: impl std::fmt::Display) -> RenderError {
    RenderError::Xml {
        part: part.to_string(),
        message: e.to_string(),
    }
}

fn read_events(part: &str, xml: &[u8]) -> Result<Vec<Event<'static>>, RenderError> {
    let xml = std::str::from_utf8(xml).map_err(|e| xml_error(part, e))?;
    let mut reader = Reader::from_str(xml);
    let mut events = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => events.push(event.into_owned()),
            Err(e) => return Err(xml_error(part, e)),
        }
    }
    Ok(events)
}

fn write_events(part: &str, events: Vec<Event<'static>>) -> Result<Vec<u8>, RenderError> {
    let mut writer = Writer::new(Vec::new());
    for event in events {
        writer
            .write_event(event)
            .map_err(|e| xml_error(part, e))?;
    }
    Ok(writer.into_inner())
}

fn has_name(start: &BytesStart<'_>, name: &[u8]) -> bool {
    start.name().as_ref() == name
}

fn is_paragraph_start(event: &Event<'_>) -> bool {
    matches!(event, Event::Start(s) if has_name(s, b"w:p"))
}

fn is_paragraph_end(event: &Event<'_>) -> bool {
    matches!(event, Event::End(e) if e.name().as_ref() == b"w:p")
}

/// Text of each `w:t` element in the outermost paragraph of `events`, in
/// order, ignoring nested paragraphs (text boxes).
fn text_segments(events: &[Event<'_>]) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut in_text = false;
    for event in events {
        match event {
            Event::Start(s) if has_name(s, b"w:p") => depth += 1,
            Event::End(e) if e.name().as_ref() == b"w:p" => depth = depth.saturating_sub(1),
            Event::Start(s) if depth == 1 && has_name(s, b"w:t") => {
                in_text = true;
                segments.push(String::new());
            }
            Event::End(e) if depth == 1 && e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if depth == 1 && in_text => {
                if let Some(segment) = segments.last_mut() {
                    match t.unescape() {
                        Ok(s) => segment.push_str(&s),
                        Err(_) => segment.push_str(&String::from_utf8_lossy(t)),
                    }
                }
            }
            _ => {}
        }
    }
    segments
}

fn paragraph_text(events: &[Event<'_>]) -> String {
    text_segments(events).concat()
}

enum Marker {
    Open(String),
    Close(String),
}

fn region_marker(text: &str) -> Option<Marker> {
    let caps = REGION_MARKER.captures(text.trim())?;
    let flag = caps[2].to_string();
    Some(if &caps[1] == "#" {
        Marker::Open(flag)
    } else {
        Marker::Close(flag)
    })
}

/// Open region: flag name and whether its blocks are kept.
type OpenRegion = Option<(String, bool)>;

/// Drops marker paragraphs and the body blocks of falsy regions.
fn apply_regions(
    events: Vec<Event<'static>>,
    data: &TemplateData,
) -> Result<Vec<Event<'static>>, RenderError> {
    let Some(body_start) = events
        .iter()
        .position(|e| matches!(e, Event::Start(s) if has_name(s, b"w:body")))
    else {
        return Ok(events);
    };

    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();
    out.extend(iter.by_ref().take(body_start + 1));

    let mut open: OpenRegion = None;
    let mut block = Vec::new();
    let mut depth = 0usize;

    for event in iter.by_ref() {
        if matches!(event, Event::Start(_)) {
            depth += 1;
        } else if matches!(event, Event::End(_)) {
            if depth == 0 {
                // </w:body>
                if let Some((flag, _)) = open.take() {
                    return Err(RenderError::UnclosedRegion(flag));
                }
                out.push(event);
                break;
            }
            depth -= 1;
        }
        block.push(event);
        if depth == 0 {
            place_block(std::mem::take(&mut block), &mut open, &mut out, data)?;
        }
    }

    out.extend(iter);
    Ok(out)
}

fn place_block(
    block: Vec<Event<'static>>,
    open: &mut OpenRegion,
    out: &mut Vec<Event<'static>>,
    data: &TemplateData,
) -> Result<(), RenderError> {
    let first = block.first();
    if first.is_some_and(is_paragraph_start) {
        if let Some(marker) = region_marker(&paragraph_text(&block)) {
            match marker {
                Marker::Open(flag) => {
                    if let Some((outer, _)) = open.as_ref() {
                        return Err(RenderError::NestedRegion {
                            outer: outer.clone(),
                            inner: flag,
                        });
                    }
                    let keep = data.is_truthy(&flag);
                    debug!(flag = %flag, keep, "Conditional region");
                    *open = Some((flag, keep));
                }
                Marker::Close(flag) => match open.take() {
                    Some((current, _)) if current == flag => {}
                    Some((current, _)) => {
                        return Err(RenderError::MismatchedRegion {
                            open: current,
                            close: flag,
                        })
                    }
                    None => return Err(RenderError::UnopenedRegion(flag)),
                },
            }
            return Ok(());
        }
    }

    let is_section_properties =
        matches!(first, Some(Event::Start(s) | Event::Empty(s)) if has_name(s, b"w:sectPr"));
    let keep = open.as_ref().map_or(true, |(_, keep)| *keep);
    if keep || is_section_properties {
        out.extend(block);
    }
    Ok(())
}

/// Rewrites every paragraph that contains a `{placeholder}`.
fn substitute_placeholders(
    events: Vec<Event<'static>>,
    data: &TemplateData,
) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(events.len());
    let mut stack: Vec<Vec<Event<'static>>> = Vec::new();

    for event in events {
        if is_paragraph_start(&event) {
            stack.push(vec![event]);
            continue;
        }
        let ends_paragraph = is_paragraph_end(&event);
        let Some(current) = stack.last_mut() else {
            out.push(event);
            continue;
        };
        current.push(event);
        if !ends_paragraph {
            continue;
        }
        if let Some(paragraph) = stack.pop() {
            let rendered = substitute_paragraph(paragraph, data);
            match stack.last_mut() {
                Some(parent) => parent.extend(rendered),
                None => out.extend(rendered),
            }
        }
    }

    // Unbalanced input; pass it through as read.
    for leftover in stack {
        out.extend(leftover);
    }
    out
}

/// Value for a placeholder. Unknown keys render empty.
fn placeholder_value(key: &str, data: &TemplateData) -> String {
    match data.get(key) {
        Some(value) => value.as_text(),
        None => {
            warn!(placeholder = key, "No data for template placeholder; rendering empty");
            String::new()
        }
    }
}

/// New text for each segment. A placeholder's value goes into the segment
/// where the token starts; other segments it covers keep only their text
/// outside the token.
fn fill_segments(segments: &[String], data: &TemplateData) -> Vec<String> {
    let text = segments.concat();
    let replacements: Vec<(Range<usize>, String)> = PLACEHOLDER
        .captures_iter(&text)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            Some((token.range(), placeholder_value(&caps[1], data)))
        })
        .collect();

    let mut filled = Vec::with_capacity(segments.len());
    let mut start = 0;
    for segment in segments {
        let end = start + segment.len();
        let mut out = String::new();
        let mut pos = start;
        for (token, value) in &replacements {
            if token.end <= start || token.start >= end {
                continue;
            }
            if token.start > pos {
                out.push_str(&text[pos..token.start]);
            }
            if token.start >= start {
                out.push_str(value);
            }
            pos = pos.max(token.end.min(end));
        }
        if pos < end {
            out.push_str(&text[pos..end]);
        }
        filled.push(out);
        start = end;
    }
    filled
}

fn preserved_text_start() -> BytesStart<'static> {
    BytesStart::new("w:t").with_attributes([("xml:space", "preserve")])
}

/// Text events for `text`, turning newlines into `<w:br/>` inside the run.
fn text_with_breaks(text: &str) -> Vec<Event<'static>> {
    let mut events = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            events.push(Event::End(BytesEnd::new("w:t")));
            events.push(Event::Empty(BytesStart::new("w:br")));
            events.push(Event::Start(preserved_text_start()));
        }
        if !line.is_empty() {
            events.push(Event::Text(BytesText::new(line).into_owned()));
        }
    }
    events
}

fn substitute_paragraph(paragraph: Vec<Event<'static>>, data: &TemplateData) -> Vec<Event<'static>> {
    let segments = text_segments(&paragraph);
    if !PLACEHOLDER.is_match(&segments.concat()) {
        return paragraph;
    }
    let filled = fill_segments(&segments, data);

    let mut out = Vec::with_capacity(paragraph.len() + 4);
    let mut depth = 0usize;
    let mut segment = 0usize;
    // Inside a `w:t` whose text is being replaced.
    let mut replacing = false;

    for event in paragraph {
        if is_paragraph_start(&event) {
            depth += 1;
        } else if is_paragraph_end(&event) {
            depth = depth.saturating_sub(1);
        }
        if depth != 1 {
            out.push(event);
            continue;
        }

        match event {
            Event::Start(s) if has_name(&s, b"w:t") => {
                let index = segment;
                segment += 1;
                match (segments.get(index), filled.get(index)) {
                    (Some(original), Some(text)) if original != text => {
                        replacing = true;
                        out.push(Event::Start(preserved_text_start()));
                        out.extend(text_with_breaks(text));
                    }
                    _ => out.push(Event::Start(s)),
                }
            }
            Event::Text(_) if replacing => {}
            Event::End(e) if e.name().as_ref() == b"w:t" => {
                replacing = false;
                out.push(Event::End(e));
            }
            other => out.push(other),
        }
    }
    out
}
