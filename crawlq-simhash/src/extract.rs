//! Plain text extraction from HTML, word tokenization and the breadcrumb
//! section heuristic.

use crate::error::{Result, SimhashError};
use crate::fingerprint::Fingerprint;
use crate::shingle::FingerprintBuilder;
use chardetng::EncodingDetector;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Elements whose text never counts as page content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "applet", "noframe", "noscript", "audio", "video", "canvas",
];

/// Elements followed by a line break in the body text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "audio", "blockquote", "canvas", "dd", "div", "dl",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "ol", "li", "p", "pre", "section", "table", "td", "tr", "th",
    "tfoot", "ul", "span",
];

/// Bytes looked at when guessing a page charset.
const DETECTION_WINDOW: usize = 128 * 1024;

const BREADCRUMB_PATTERN: &str = "(bread.*crumb|ariane|fil)";

/// Title and body text of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageText {
    pub title: String,
    pub body: String,
}

impl PageText {
    /// Title tokens followed by body tokens.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = tokenize(&self.title);
        tokens.extend(tokenize(&self.body));
        tokens
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SimhashError::Extraction(format!("bad selector {}: {}", css, e)))
}

/// Splits text into lower-cased Unicode words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Extracts the `<title>` text and the visible `<body>` text of a document.
///
/// Text nodes are joined as they come, so inline markup inside a word keeps
/// the word whole. A line break goes in front of the first text following
/// the end of a block element.
pub fn extract_text(html: &str) -> Result<PageText> {
    let document = Html::parse_document(html);
    let mut title = TextAppender::default();
    let mut body = TextAppender::default();
    let mut after_body_start = false;
    let mut after_block = false;

    let mut stack = vec![(document.tree.root(), false)];
    while let Some((node, leaving)) = stack.pop() {
        match node.value() {
            Node::Element(element) if leaving => {
                if after_body_start && BLOCK_ELEMENTS.contains(&element.name()) {
                    after_block = true;
                }
            }
            Node::Element(element) => {
                if !after_body_start {
                    after_body_start = element.name() == "body";
                } else if SKIPPED_ELEMENTS.contains(&element.name()) {
                    continue;
                }
                stack.push((node, true));
                stack.extend(node.children().rev().map(|child| (child, false)));
            }
            Node::Text(text) => {
                if !after_body_start {
                    let parent = node.parent().and_then(|p| p.value().as_element().map(|e| e.name()));
                    if parent == Some("title") {
                        title.append(text);
                    }
                } else {
                    if after_block {
                        body.append("\n");
                    }
                    body.append(text);
                }
                after_block = false;
            }
            _ if !leaving => stack.extend(node.children().rev().map(|child| (child, false))),
            _ => {}
        }
    }

    Ok(PageText {
        title: title.buf,
        body: body.buf,
    })
}

/// Accumulates text with every whitespace run (U+00A0 included) collapsed to
/// one separator: a newline when the run held one, else a space.
#[derive(Debug, Default)]
struct TextAppender {
    buf: String,
    last_is_space: bool,
    contains_newline: bool,
}

impl TextAppender {
    fn append(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                self.last_is_space = true;
                self.contains_newline |= c == '\n';
                continue;
            }
            if self.last_is_space && !self.buf.is_empty() {
                self.buf.push(if self.contains_newline { '\n' } else { ' ' });
            }
            self.last_is_space = false;
            self.contains_newline = false;
            self.buf.push(c);
        }
    }
}

/// Decodes a raw page. The charset is guessed from the first bytes of the
/// payload; a byte order mark overrides the guess.
pub fn decode_html(data: &[u8]) -> Result<String> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(SimhashError::Extraction("empty payload".to_string()));
    }
    let window = &data[..data.len().min(DETECTION_WINDOW)];
    let mut detector = EncodingDetector::new();
    detector.feed(window, window.len() == data.len());
    let (text, encoding, had_errors) = detector.guess(None, true).decode(data);
    if had_errors {
        debug!("Replaced undecodable bytes while decoding as {}", encoding.name());
    }
    Ok(text.into_owned())
}

/// Fingerprint of a decoded HTML document: title tokens then body tokens.
pub fn fingerprint_document(html: &str) -> Result<Fingerprint> {
    let text = extract_text(html)?;
    Ok(FingerprintBuilder::new().fingerprint(&text.tokens()))
}

/// Fingerprint of a raw HTML payload in any charset.
pub fn fingerprint_html(data: &[u8]) -> Result<Fingerprint> {
    fingerprint_document(&decode_html(data)?)
}

/// Guesses the section head of a page from its breadcrumb trail.
///
/// Looks at elements whose class (then id) looks like a breadcrumb and picks
/// the first useful link: a lone link, a first link that is not the site root,
/// or else the second link.
pub fn breadcrumb_section(html: &str, page_url: &str) -> Result<Option<String>> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(e) => {
            debug!("Could not parse page URL {}: {}", page_url, e);
            return Ok(None);
        }
    };
    let pattern = Regex::new(BREADCRUMB_PATTERN)
        .map_err(|e| SimhashError::Extraction(format!("bad breadcrumb pattern: {}", e)))?;
    let document = Html::parse_document(html);
    let anchor_selector = selector("a[href]")?;

    let mut candidates: Vec<ElementRef<'_>> = Vec::new();
    for attribute in ["class", "id"] {
        let attr_selector = selector(&format!("[{}]", attribute))?;
        candidates.extend(document.select(&attr_selector).filter(|e| {
            e.value()
                .attr(attribute)
                .is_some_and(|value| pattern.is_match(value))
        }));
    }

    for element in candidates {
        let anchors: Vec<Url> = element
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .collect();
        match anchors.as_slice() {
            [only] => return Ok(Some(only.to_string())),
            [first, ..] if first.path() != "/" => return Ok(Some(first.to_string())),
            [_, second, ..] => return Ok(Some(second.to_string())),
            _ => continue,
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_words() {
        assert_eq!(tokenize("Hello, World! It's 2017."), vec!["hello", "world", "it's", "2017"]);
    }

    #[test]
    fn test_extract_text_skips_scripts() {
        let html = r#"<html><head><title>My Page</title><script>var x = 1;</script></head>
            <body><h1>Header</h1><script>ignored()</script><p>Some <b>bold</b> text</p>
            <noscript>enable js</noscript></body></html>"#;
        let text = extract_text(html).unwrap();
        assert_eq!(text.title, "My Page");
        assert!(text.body.contains("Header"));
        assert!(text.body.contains("bold"));
        assert!(!text.body.contains("ignored"));
        assert!(!text.body.contains("enable js"));
        assert_eq!(
            text.tokens(),
            vec!["my", "page", "header", "some", "bold", "text"]
        );
    }

    #[test]
    fn test_inline_markup_keeps_words_whole() {
        let html = "<html><head><title>T</title></head><body><p>Hel<b>lo</b> wor<i>ld</i></p></body></html>";
        let text = extract_text(html).unwrap();
        assert_eq!(text.body, "Hello world");
        assert_eq!(text.tokens(), vec!["t", "hello", "world"]);
    }

    #[test]
    fn test_block_elements_break_lines() {
        let html = "<html><body><div>one</div>two <span>three</span><b>four</b>\u{a0}\u{a0} five</body></html>";
        let text = extract_text(html).unwrap();
        assert_eq!(text.body, "one\ntwo three\nfour five");
    }

    #[test]
    fn test_title_text_is_collapsed() {
        let html = "<html><head><title>  A\n\n  page </title></head><body></body></html>";
        assert_eq!(extract_text(html).unwrap().title, "A\npage");
    }

    #[test]
    fn test_decode_html_rejects_empty_payload() {
        assert!(matches!(decode_html(b""), Err(SimhashError::Extraction(_))));
        assert!(matches!(fingerprint_html(b" \r\n\t"), Err(SimhashError::Extraction(_))));
    }

    #[test]
    fn test_decode_html_detects_latin1() {
        let utf8 = "<html><head><title>Le café de l'été</title></head>\
            <body><p>Le café est servi à la terrasse près de la mer pendant tout l'été.</p></body></html>";
        let latin1: Vec<u8> = utf8.chars().map(|c| c as u32 as u8).collect();
        assert!(std::str::from_utf8(&latin1).is_err());

        assert_eq!(decode_html(&latin1).unwrap(), utf8);
        assert_eq!(fingerprint_html(&latin1).unwrap(), fingerprint_html(utf8.as_bytes()).unwrap());
    }

    #[test]
    fn test_fingerprint_html_matches_token_fingerprint() {
        let html = b"<html><head><title>A b</title></head><body>c d e</body></html>";
        let fp = fingerprint_html(html).unwrap();
        let expected = FingerprintBuilder::new().fingerprint(&["a", "b", "c", "d", "e"]);
        assert_eq!(fp, expected);
    }

    #[test]
    fn test_breadcrumb_single_anchor() {
        let html = r#"<html><body><div class="breadcrumb"><a href="/news/">News</a></div></body></html>"#;
        let section = breadcrumb_section(html, "http://example.com/news/today.html").unwrap();
        assert_eq!(section.as_deref(), Some("http://example.com/news/"));
    }

    #[test]
    fn test_breadcrumb_skips_root_link() {
        let html = r#"<html><body><ul id="fil-ariane">
            <li><a href="/">Home</a></li><li><a href="/sport/">Sport</a></li><li><a href="/sport/foot">Foot</a></li>
            </ul></body></html>"#;
        let section = breadcrumb_section(html, "http://example.com/sport/foot/match").unwrap();
        assert_eq!(section.as_deref(), Some("http://example.com/sport/"));
    }

    #[test]
    fn test_breadcrumb_first_link_not_root() {
        let html = r#"<html><body><nav class="bread-crumbs">
            <a href="/shop/">Shop</a><a href="/shop/shoes/">Shoes</a></nav></body></html>"#;
        let section = breadcrumb_section(html, "http://example.com/shop/shoes/1").unwrap();
        assert_eq!(section.as_deref(), Some("http://example.com/shop/"));
    }

    #[test]
    fn test_breadcrumb_absent() {
        let html = r#"<html><body><div class="menu"><a href="/a">A</a></div></body></html>"#;
        assert_eq!(breadcrumb_section(html, "http://example.com/").unwrap(), None);
    }
}
