//! Decoding of the portal news feed (RSS 2.0)
//!
//! The portal feed advertises a Latin charset while its content actually is UTF-8, so text decoded according to the
//! feed's declaration is garbled. Every chunk of text goes through [`repair_encoding`] to undo this, before its
//! entities are resolved.

use std::borrow::Cow;

use encoding_rs::{Encoding, ISO_8859_15, UTF_8};
use quick_xml::escape::unescape_with;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};
use crate::resource::Resource;
use crate::PubDate;

/// A news entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub pub_date: PubDate,
    pub link: String,
}

/// The `item` sub-elements a [`FeedItem`] is made of
const FIELDS: [&[u8]; 3] = [b"title", b"pubDate", b"link"];

/// Iterate over the items of a feed.
///
/// Parsing is lazy, and calling this function again restarts from the beginning of `raw_xml`.
/// Text is assumed to have been mis-decoded as ISO-8859-15.
pub fn parse(raw_xml: &str) -> FeedItems<'_> {
    FeedItems::new(raw_xml, Some(ISO_8859_15))
}

/// Decode a feed as it was received, honouring its declared encoding, and collect its items
pub fn parse_bytes(raw: &[u8]) -> Result<Vec<FeedItem>> {
    let declared = declared_encoding(raw).unwrap_or(UTF_8);
    let (text, actual, had_errors) = declared.decode(raw);
    if had_errors {
        log::warn!("News feed is not valid {}, some characters were replaced", actual.name());
    }

    let mis_decoding = if actual == UTF_8 || actual.is_ascii_compatible() == false {
        None
    } else {
        Some(actual)
    };
    FeedItems::new(&text, mis_decoding).collect()
}

/// Re-encode text that was decoded with the wrong charset, and decode it again as UTF-8.
///
/// Text that cannot have been produced by such a mistake is returned unchanged.
pub fn repair_encoding<'a>(text: &'a str, mis_decoding: &'static Encoding) -> Cow<'a, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let (bytes, _, had_unmappable) = mis_decoding.encode(text);
    if had_unmappable {
        return Cow::Borrowed(text);
    }
    match String::from_utf8(bytes.into_owned()) {
        Ok(repaired) => Cow::Owned(repaired),
        Err(_) => Cow::Borrowed(text),
    }
}

/// Items of a feed, see [`parse`]
///
/// Items that lack a title, a date or a link are skipped. An XML error ends the iteration.
pub struct FeedItems<'a> {
    reader: Reader<&'a [u8]>,
    mis_decoding: Option<&'static Encoding>,
    finished: bool,
}

impl<'a> FeedItems<'a> {
    fn new(raw_xml: &'a str, mis_decoding: Option<&'static Encoding>) -> Self {
        let mut reader = Reader::from_str(raw_xml);
        reader.config_mut().trim_text(true);
        Self { reader, mis_decoding, finished: false }
    }

    fn malformed<E: std::fmt::Display>(&self, err: E) -> PortalError {
        PortalError::malformed(Resource::NewsFeed, format!("{} (at byte {})", err, self.reader.buffer_position()))
    }

    /// Read the content of an `item` element, whose start tag has just been consumed
    fn read_item(&mut self) -> Result<Option<FeedItem>> {
        let mut values: [Option<String>; 3] = [None, None, None];
        let mut current: Option<usize> = None;
        let mut text = String::new();
        let mut depth = 0;

        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    depth += 1;
                    if depth == 1 {
                        current = FIELDS.iter().position(|f| *f == e.name().as_ref());
                        text.clear();
                    }
                },
                Ok(Event::End(_)) => {
                    if depth == 0 {
                        break;
                    }
                    if depth == 1 {
                        if let Some(i) = current.take() {
                            if values[i].is_none() && text.is_empty() == false {
                                values[i] = Some(text.clone());
                            }
                        }
                    }
                    depth -= 1;
                },
                Ok(Event::Text(t)) => {
                    if depth == 1 && current.is_some() {
                        let raw = String::from_utf8_lossy(&t);
                        let repaired = self.repaired(&raw);
                        let unescaped = unescape_with(&repaired, resolve_entity).map_err(|err| self.malformed(err))?;
                        text.push_str(&unescaped);
                    }
                },
                Ok(Event::CData(c)) => {
                    if depth == 1 && current.is_some() {
                        let raw = String::from_utf8_lossy(&c.into_inner()).into_owned();
                        text.push_str(&self.repaired(&raw));
                    }
                },
                Ok(Event::Eof) => return Err(self.malformed("feed ends inside an item")),
                Ok(_) => {},
                Err(err) => return Err(self.malformed(err)),
            }
        }

        let [title, pub_date, link] = values;
        match (title, pub_date, link) {
            (Some(title), Some(pub_date), Some(link)) => Ok(Some(FeedItem {
                title,
                pub_date: PubDate::verbatim(&pub_date),
                link,
            })),
            (title, _, _) => {
                log::debug!("Skipping incomplete feed item {:?}", title);
                Ok(None)
            },
        }
    }

    fn repaired<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.mis_decoding {
            None => Cow::Borrowed(text),
            Some(encoding) => repair_encoding(text, encoding),
        }
    }
}

impl<'a> Iterator for FeedItems<'a> {
    type Item = Result<FeedItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) if e.name().as_ref() == b"item" => {
                    match self.read_item() {
                        Ok(Some(item)) => return Some(Ok(item)),
                        Ok(None) => continue,
                        Err(err) => {
                            self.finished = true;
                            return Some(Err(err));
                        },
                    }
                },
                Ok(Event::Eof) => {
                    self.finished = true;
                    return None;
                },
                Ok(_) => continue,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(self.malformed(err)));
                },
            }
        }
    }
}

/// XML entities, plus the HTML ones the portal is known to emit
fn resolve_entity(name: &str) -> Option<&'static str> {
    match name {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        "nbsp" => Some("\u{a0}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        _ => None,
    }
}

/// The encoding named in the XML declaration, if any
fn declared_encoding(raw: &[u8]) -> Option<&'static Encoding> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let mut reader = Reader::from_reader(raw);
    loop {
        match reader.read_event() {
            Ok(Event::Decl(decl)) => {
                let label = decl.encoding()?.ok()?;
                return Encoding::for_label(&label);
            },
            Ok(Event::Text(_)) => continue,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Notícies FIB</title>
    <link>https://www.fib.upc.edu</link>
    <atom:link href="https://raco.fib.upc.edu/api-v1/noticies.rss" rel="self"/>
    <item>
      <title>Obertes les inscripcions</title>
      <pubDate>Wed, 02 Oct 2019 13:00:00 +0200</pubDate>
      <link>https://www.fib.upc.edu/noticies/1</link>
      <description>Some text &amp; more</description>
    </item>
    <item>
      <title><![CDATA[Jornada d'empreses & recerca]]></title>
      <link>https://www.fib.upc.edu/noticies/2</link>
      <pubDate>Thu, 03 Oct 2019 09:30:00 +0200</pubDate>
    </item>
    <item>
      <title>Item without date</title>
      <link>https://www.fib.upc.edu/noticies/3</link>
    </item>
    <item>
      <title>Item&nbsp;with an empty link</title>
      <pubDate>Fri, 04 Oct 2019 09:30:00 +0200</pubDate>
      <link></link>
    </item>
    <item>
      <title>Last &ndash; but not least</title>
      <pubDate>Sat, 05 Oct 2019 10:00:00 +0200</pubDate>
      <link>https://www.fib.upc.edu/noticies/5</link>
    </item>
  </channel>
</rss>
"#;

    #[test]
    fn test_rss_parsing() {
        let items: Vec<FeedItem> = parse(EXAMPLE_FEED).collect::<Result<_>>().unwrap();

        // 5 items, 2 of them incomplete
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Obertes les inscripcions");
        assert_eq!(items[0].link, "https://www.fib.upc.edu/noticies/1");
        assert_eq!(items[0].pub_date.text(), "Wed, 02 Oct 2019 13:00:00 +0200");
        assert!(items[0].pub_date.parsed().is_some());
        assert_eq!(items[1].title, "Jornada d'empreses & recerca");
        assert_eq!(items[2].title, "Last \u{2013} but not least");
    }

    #[test]
    fn parsing_is_restartable() {
        let mut first = parse(EXAMPLE_FEED);
        let head = first.next().unwrap().unwrap();
        let again: Vec<FeedItem> = parse(EXAMPLE_FEED).map(|r| r.unwrap()).collect();
        assert_eq!(again[0], head);
        assert_eq!(first.count(), 2);
    }

    #[test]
    fn garbled_text_is_repaired() {
        // UTF-8 content read as ISO-8859-15
        let garbled = "Not\u{c3}\u{ad}cies de la Facultat d'Inform\u{c3}\u{a0}tica";
        assert_eq!(repair_encoding(garbled, ISO_8859_15), "Notícies de la Facultat d'Informàtica");

        // Text that was correctly decoded is left alone
        assert_eq!(repair_encoding("Notícies", ISO_8859_15), "Notícies");
        assert_eq!(repair_encoding("Plain ascii", ISO_8859_15), "Plain ascii");
        assert_eq!(repair_encoding("Ελληνικά", ISO_8859_15), "Ελληνικά");
    }

    #[test]
    fn feed_with_misleading_declaration() {
        let feed = r#"<?xml version="1.0" encoding="ISO-8859-15"?>
<rss version="2.0"><channel>
  <item><title>Exàmens finals</title><pubDate>Mon, 13 Jan 2020 08:00:00 +0100</pubDate><link>https://www.fib.upc.edu/e</link></item>
</channel></rss>"#;

        let items = parse_bytes(feed.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Exàmens finals");
    }

    #[test]
    fn misleading_declaration_and_entities() {
        let feed = r#"<?xml version="1.0" encoding="ISO-8859-15"?>
<rss version="2.0"><channel>
  <item><title>Matrícula &ndash; 2n quadrimestre</title><pubDate>Mon, 13 Jan 2020 08:00:00 +0100</pubDate><link>https://www.fib.upc.edu/m?a=1&amp;b=2</link></item>
  <item><title><![CDATA[Calendari d'exàmens]]></title><pubDate>Tue, 14 Jan 2020 08:00:00 +0100</pubDate><link>https://www.fib.upc.edu/c</link></item>
</channel></rss>"#;

        let items = parse_bytes(feed.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Matrícula \u{2013} 2n quadrimestre");
        assert_eq!(items[0].link, "https://www.fib.upc.edu/m?a=1&b=2");
        assert_eq!(items[1].title, "Calendari d'exàmens");
    }

    #[test]
    fn genuine_latin_feed() {
        let mut feed = b"<?xml version='1.0' encoding='ISO-8859-1'?><rss><channel><item><title>Ex".to_vec();
        feed.push(0xE0);
        feed.extend_from_slice(b"mens</title><pubDate>Mon, 13 Jan 2020 08:00:00 +0100</pubDate><link>l</link></item></channel></rss>");

        let items = parse_bytes(&feed).unwrap();
        assert_eq!(items[0].title, "Exàmens");
    }

    #[test]
    fn declared_encodings() {
        assert_eq!(declared_encoding(br#"<?xml version="1.0" encoding="ISO-8859-15"?><rss/>"#), Some(ISO_8859_15));
        assert_eq!(declared_encoding(b"<?xml version='1.0' encoding = 'utf-8' ?><rss/>"), Some(UTF_8));
        assert_eq!(declared_encoding(br#"<?xml version="1.0"?><rss/>"#), None);
        assert_eq!(declared_encoding(b"<rss/>"), None);
        assert_eq!(declared_encoding(b"\xEF\xBB\xBF<?xml version=\"1.0\" encoding=\"windows-1252\"?><rss/>"), Some(encoding_rs::WINDOWS_1252));
    }

    #[test]
    fn malformed_feeds() {
        let truncated = "<rss><channel><item><title>t</title><pubDate>d</pubDate>";
        let results: Vec<Result<FeedItem>> = parse(truncated).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());

        assert!(parse_bytes(b"<rss><channel><item><title>a</link></item></channel></rss>").is_err());
        assert_eq!(parse_bytes(b"<rss><channel></channel></rss>").unwrap(), Vec::new());
    }
}
