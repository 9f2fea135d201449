// src/ingest/parser.rs
//! Streaming parser for RSS 2.0, RSS 1.0 (RDF) and Atom documents.
//!
//! Every dialect is normalized into [`RawEntry`] right here, so the rest of
//! the pipeline works on one typed shape. Namespaced extensions are matched on
//! their conventional prefixes (`media:`, `content:`, `dc:`).

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::ingest::types::{Enclosure, EntryLink, MediaContent, RawEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    buf: String,
}

/// Parse a syndication document into entries, in document order.
///
/// Errors on malformed XML or when the root element is not a feed.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>> {
    let mut reader = Reader::from_str(xml);

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut entry: Option<(usize, RawEntry)> = None;
    let mut capture: Option<Capture> = None;

    loop {
        let ev = reader.read_event().context("reading feed xml")?;
        match ev {
            Event::Start(e) => {
                depth += 1;
                if !saw_root {
                    check_root(&e)?;
                    saw_root = true;
                    continue;
                }
                let name = e.name();
                let qname = name.as_ref();

                if let Some(cap) = capture.as_mut() {
                    cap.buf.push('<');
                    cap.buf.push_str(&String::from_utf8_lossy(&e));
                    cap.buf.push('>');
                    continue;
                }

                match entry.as_mut() {
                    None => {
                        if is_entry_tag(qname) {
                            entry = Some((depth, RawEntry::default()));
                        }
                    }
                    Some((entry_depth, cur)) => {
                        if apply_media_attrs(qname, &e, cur) {
                            continue;
                        }
                        if depth != *entry_depth + 1 {
                            continue;
                        }
                        if local(qname) == b"link" && apply_link_attrs(&e, cur) {
                            continue;
                        }
                        if let Some(field) = field_for(qname) {
                            capture = Some(Capture {
                                field,
                                depth,
                                buf: String::new(),
                            });
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if !saw_root {
                    check_root(&e)?;
                    saw_root = true;
                    continue;
                }
                if let Some(cap) = capture.as_mut() {
                    cap.buf.push('<');
                    cap.buf.push_str(&String::from_utf8_lossy(&e));
                    cap.buf.push_str("/>");
                    continue;
                }
                if let Some((entry_depth, cur)) = entry.as_mut() {
                    let name = e.name();
                    let qname = name.as_ref();
                    if apply_media_attrs(qname, &e, cur) {
                        continue;
                    }
                    if depth == *entry_depth && local(qname) == b"link" {
                        apply_link_attrs(&e, cur);
                    }
                }
            }
            Event::End(e) => {
                let name = e.name();
                let qname = name.as_ref();

                let finished = match capture.as_mut() {
                    Some(cap) if cap.depth == depth => true,
                    Some(cap) => {
                        cap.buf.push_str("</");
                        cap.buf.push_str(&String::from_utf8_lossy(qname));
                        cap.buf.push('>');
                        false
                    }
                    None => false,
                };
                if finished {
                    if let (Some(cap), Some((_, cur))) = (capture.take(), entry.as_mut()) {
                        store_capture(cur, cap);
                    }
                }

                if matches!(&entry, Some((d, _)) if *d == depth) {
                    if let Some((_, done)) = entry.take() {
                        entries.push(done);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                if let Some(cap) = capture.as_mut() {
                    let raw = t.into_inner();
                    let text = String::from_utf8_lossy(&raw);
                    cap.buf.push_str(&html_escape::decode_html_entities(&text));
                }
            }
            Event::CData(c) => {
                if let Some(cap) = capture.as_mut() {
                    cap.buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(anyhow!("empty document"));
    }
    Ok(entries)
}

fn check_root(e: &BytesStart<'_>) -> Result<()> {
    let name = e.name();
    match local(name.as_ref()) {
        b"rss" | b"feed" | b"RDF" => Ok(()),
        other => Err(anyhow!(
            "not a syndication document (root <{}>)",
            String::from_utf8_lossy(other)
        )),
    }
}

fn local(qname: &[u8]) -> &[u8] {
    match qname.iter().rposition(|&b| b == b':') {
        Some(i) => &qname[i + 1..],
        None => qname,
    }
}

fn is_entry_tag(qname: &[u8]) -> bool {
    matches!(local(qname), b"item" | b"entry")
}

fn field_for(qname: &[u8]) -> Option<Field> {
    let f = match qname {
        b"title" | b"atom:title" => Field::Title,
        b"link" => Field::Link,
        b"description" | b"summary" | b"atom:summary" => Field::Summary,
        b"content:encoded" | b"content" | b"atom:content" => Field::Content,
        b"pubDate" | b"dc:date" | b"published" | b"atom:published" | b"issued" => {
            Field::Published
        }
        _ => return None,
    };
    Some(f)
}

fn attr_map(e: &BytesStart<'_>) -> Vec<(Vec<u8>, String)> {
    let mut out = Vec::new();
    for a in e.attributes().with_checks(false).flatten() {
        let key = a.key.as_ref().to_vec();
        let raw = String::from_utf8_lossy(&a.value);
        out.push((key, html_escape::decode_html_entities(&raw).into_owned()));
    }
    out
}

fn attr(attrs: &[(Vec<u8>, String)], key: &[u8]) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Handle media/enclosure elements that carry everything in attributes.
/// Returns true when the element was consumed.
fn apply_media_attrs(qname: &[u8], e: &BytesStart<'_>, cur: &mut RawEntry) -> bool {
    match qname {
        b"media:content" => {
            let attrs = attr_map(e);
            cur.media_content.push(MediaContent {
                url: attr(&attrs, b"url"),
                mime_type: attr(&attrs, b"type"),
                medium: attr(&attrs, b"medium"),
            });
            true
        }
        b"media:thumbnail" => {
            if let Some(url) = attr(&attr_map(e), b"url") {
                cur.media_thumbnails.push(url);
            }
            true
        }
        b"enclosure" => {
            let attrs = attr_map(e);
            let href = attr(&attrs, b"url");
            let mime_type = attr(&attrs, b"type");
            if let Some(h) = &href {
                cur.links.push(EntryLink {
                    href: h.clone(),
                    rel: Some("enclosure".to_string()),
                    mime_type: mime_type.clone(),
                });
            }
            cur.enclosures.push(Enclosure { href, mime_type });
            true
        }
        _ => false,
    }
}

/// Atom-style `<link href=".." rel=".." type=".."/>`. Returns false when the
/// element has no `href` (RSS `<link>` carrying its URL as text).
fn apply_link_attrs(e: &BytesStart<'_>, cur: &mut RawEntry) -> bool {
    let attrs = attr_map(e);
    let Some(href) = attr(&attrs, b"href") else {
        return false;
    };
    let rel = attr(&attrs, b"rel").unwrap_or_else(|| "alternate".to_string());
    if rel == "alternate" && cur.link.is_none() {
        cur.link = Some(href.clone());
    }
    cur.links.push(EntryLink {
        href,
        rel: Some(rel),
        mime_type: attr(&attrs, b"type"),
    });
    true
}

fn store_capture(cur: &mut RawEntry, cap: Capture) {
    let text = cap.buf.trim().to_string();
    if text.is_empty() {
        return;
    }
    match cap.field {
        Field::Title => {
            cur.title.get_or_insert(text);
        }
        Field::Summary => {
            cur.summary.get_or_insert(text);
        }
        Field::Content => cur.content.push(text),
        Field::Published => {
            cur.published.get_or_insert(text);
        }
        Field::Link => {
            if cur.link.is_none() {
                cur.link = Some(text.clone());
            }
            cur.links.push(EntryLink {
                href: text,
                rel: Some("alternate".to_string()),
                mime_type: Some("text/html".to_string()),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example</title>
    <link>https://example.com</link>
    <item>
      <title>Markets &amp; mayhem</title>
      <link>https://example.com/a</link>
      <description><![CDATA[<p>Lead <img src="https://img.example/a.jpg"></p>]]></description>
      <pubDate>Tue, 10 Jun 2025 10:00:00 GMT</pubDate>
      <media:group>
        <media:content url="https://img.example/m.jpg" type="image/jpeg"/>
      </media:group>
      <media:thumbnail url="https://img.example/t.jpg"/>
      <enclosure url="https://audio.example/a.mp3" type="audio/mpeg" length="1"/>
      <content:encoded><![CDATA[<div>full</div>]]></content:encoded>
    </item>
    <item>
      <title>Second</title>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <entry>
    <title type="html">Atom &lt;b&gt;headline&lt;/b&gt;</title>
    <link rel="alternate" type="text/html" href="https://atom.example/1"/>
    <link rel="enclosure" type="image/png" href="https://atom.example/1.png"/>
    <summary>Short</summary>
    <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml"><img src="http://atom.example/inline.gif"/></div></content>
    <published>2025-06-10T10:00:00Z</published>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_with_extensions() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);
        let a = &entries[0];
        assert_eq!(a.title.as_deref(), Some("Markets & mayhem"));
        assert_eq!(a.link.as_deref(), Some("https://example.com/a"));
        assert!(a.summary.as_deref().unwrap().contains("<img src="));
        assert_eq!(a.published.as_deref(), Some("Tue, 10 Jun 2025 10:00:00 GMT"));
        assert_eq!(a.media_content.len(), 1);
        assert_eq!(a.media_content[0].mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(a.media_thumbnails, vec!["https://img.example/t.jpg".to_string()]);
        assert_eq!(a.enclosures.len(), 1);
        assert_eq!(a.content, vec!["<div>full</div>".to_string()]);
        // <link> text + enclosure both show up as links
        assert_eq!(a.links.len(), 2);
        assert_eq!(a.links[1].rel.as_deref(), Some("enclosure"));

        assert_eq!(entries[1].title.as_deref(), Some("Second"));
        assert!(entries[1].link.is_none());
    }

    #[test]
    fn channel_level_fields_do_not_leak_into_items() {
        let entries = parse_feed(RSS).unwrap();
        assert!(entries.iter().all(|e| e.title.as_deref() != Some("Example")));
    }

    #[test]
    fn parses_atom_entries() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.title.as_deref(), Some("Atom <b>headline</b>"));
        assert_eq!(e.link.as_deref(), Some("https://atom.example/1"));
        assert_eq!(e.links.len(), 2);
        assert_eq!(e.summary.as_deref(), Some("Short"));
        assert_eq!(e.published.as_deref(), Some("2025-06-10T10:00:00Z"));
        assert_eq!(e.content.len(), 1);
        assert!(e.content[0].contains(r#"src="http://atom.example/inline.gif""#));
    }

    #[test]
    fn parses_rdf_items() {
        let rdf = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel><title>RDF</title></channel>
  <item rdf:about="https://rdf.example/1">
    <title>RDF item</title>
    <link>https://rdf.example/1</link>
    <dc:date>2025-06-10</dc:date>
  </item>
</rdf:RDF>"#;
        let entries = parse_feed(rdf).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].published.as_deref(), Some("2025-06-10"));
    }

    #[test]
    fn html_entities_are_tolerated() {
        let xml = "<rss><channel><item><title>Caf&eacute;&nbsp;owner slams city</title></item></channel></rss>";
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].title.as_deref(), Some("Café\u{a0}owner slams city"));
    }

    #[test]
    fn malformed_or_foreign_documents_are_errors() {
        assert!(parse_feed("<rss><channel><item></channel></rss>").is_err());
        assert!(parse_feed("<html><body>nope</body></html>").is_err());
        assert!(parse_feed("").is_err());
    }

    #[test]
    fn feed_without_items_is_empty() {
        let entries = parse_feed("<rss version=\"2.0\"><channel><title>x</title></channel></rss>").unwrap();
        assert!(entries.is_empty());
    }
}
