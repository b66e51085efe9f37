//! Element tree over an XML database export.
//!
//! The tree records, for every element, the byte range it occupies in the
//! source text. Field values are decoded on demand and whole elements can be
//! handed out verbatim, so content that is never inspected is never
//! re-encoded.

use std::borrow::Cow;
use std::fs;
use std::ops::Range;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{MergeError, MergeResult, ParseError, ParseResult};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const PI_OPEN: &str = "<?";
const PI_CLOSE: &str = "?>";

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    /// Whole element, from `<` of the start tag to `>` of the end tag
    span: Range<usize>,
    /// Content between the start and end tags
    inner: Range<usize>,
    children: Vec<NodeData>,
}

/// A parsed XML document that keeps its source text.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    source: String,
    root: NodeData,
}

impl Document {
    /// Parses a document from its source text.
    ///
    /// `name` identifies the document in error messages, usually the file path.
    /// A leading UTF-8 byte order mark is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed XML or has no root element.
    pub fn parse(name: impl Into<String>, mut source: String) -> ParseResult<Self> {
        let name = name.into();
        if source.starts_with('\u{feff}') {
            source.drain(..'\u{feff}'.len_utf8());
        }
        let root = build_tree(&name, &source)?;
        Ok(Self { name, source, root })
    }

    /// Reads and parses a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not UTF-8 or is not
    /// a well-formed document.
    pub fn open(path: &Path) -> MergeResult<Self> {
        let bytes = fs::read(path).map_err(|source| MergeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path.display().to_string();
        let source = String::from_utf8(bytes).map_err(|e| ParseError::NotUtf8 {
            source_name: name.clone(),
            reason: e.utf8_error().to_string(),
        })?;
        Ok(Self::parse(name, source)?)
    }

    /// Returns the name used for this document in error messages
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source text the document was parsed from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the root element
    #[must_use]
    pub fn root(&self) -> Node<'_> {
        Node {
            document: self,
            data: &self.root,
        }
    }
}

/// A borrowed view of one element of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'d> {
    document: &'d Document,
    data: &'d NodeData,
}

impl<'d> Node<'d> {
    /// Returns the element name
    #[must_use]
    pub fn name(&self) -> &'d str {
        &self.data.name
    }

    /// Returns the document this element belongs to
    #[must_use]
    pub fn document(&self) -> &'d Document {
        self.document
    }

    /// Iterates over all direct child elements
    #[must_use]
    pub fn children(&self) -> Children<'d> {
        Children {
            document: self.document,
            inner: self.data.children.iter(),
            name: None,
        }
    }

    /// Iterates over the direct child elements with the given name
    #[must_use]
    pub fn children_named(&self, name: &'d str) -> Children<'d> {
        Children {
            document: self.document,
            inner: self.data.children.iter(),
            name: Some(name),
        }
    }

    /// Returns the first direct child element with the given name
    #[must_use]
    pub fn child(&self, name: &'d str) -> Option<Self> {
        self.children_named(name).next()
    }

    /// Returns the first direct child element with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingElement`] if there is no such child.
    pub fn required_child(&self, name: &'d str) -> ParseResult<Self> {
        self.child(name).ok_or_else(|| ParseError::MissingElement {
            source_name: self.document.name.clone(),
            parent: self.data.name.clone(),
            element: name.to_string(),
        })
    }

    /// Returns the decoded text of a required child element.
    ///
    /// # Errors
    ///
    /// Returns an error if the child is missing or its text cannot be decoded.
    pub fn required_text(&self, name: &'d str) -> ParseResult<Cow<'d, str>> {
        self.required_child(name)?.text()
    }

    /// Returns the element source text exactly as it appears in the document
    #[must_use]
    pub fn raw(&self) -> &'d str {
        &self.document.source[self.data.span.clone()]
    }

    /// Returns the raw content between the start and end tags
    #[must_use]
    pub fn raw_inner(&self) -> &'d str {
        &self.document.source[self.data.inner.clone()]
    }

    /// Returns the character content with entity references resolved.
    ///
    /// CDATA sections are taken literally and comments are skipped. An empty
    /// element yields an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content contains an unknown entity reference.
    pub fn text(&self) -> ParseResult<Cow<'d, str>> {
        decode_text(self.raw_inner()).map_err(|reason| ParseError::Xml {
            source_name: self.document.name.clone(),
            reason: format!("invalid text in <{}>: {reason}", self.data.name),
        })
    }
}

/// Iterator over the direct children of a [`Node`].
#[derive(Debug, Clone)]
pub struct Children<'d> {
    document: &'d Document,
    inner: std::slice::Iter<'d, NodeData>,
    name: Option<&'d str>,
}

impl<'d> Iterator for Children<'d> {
    type Item = Node<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.name;
        let data = self
            .inner
            .by_ref()
            .find(|data| name.is_none_or(|name| data.name == name))?;
        Some(Node {
            document: self.document,
            data,
        })
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Returns the offset of the `<` that opens the tag ending at `end`.
///
/// Attribute values cannot contain a raw `<`, so the last one before the end
/// of a tag is its first byte.
fn tag_start(source: &str, end: usize) -> usize {
    source
        .get(..end)
        .and_then(|before| before.rfind('<'))
        .unwrap_or(0)
}

/// Builds the element tree with one pass over the reader events.
fn build_tree(source_name: &str, source: &str) -> ParseResult<NodeData> {
    let xml_error = |reason: String| ParseError::Xml {
        source_name: source_name.to_string(),
        reason,
    };

    let mut reader = Reader::from_str(source);
    let mut stack: Vec<NodeData> = Vec::new();
    let mut root: Option<NodeData> = None;

    loop {
        let node = match reader.read_event() {
            Ok(Event::Start(e)) => {
                let inner = position(&reader);
                stack.push(NodeData {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    span: tag_start(source, inner)..inner,
                    inner: inner..inner,
                    children: Vec::new(),
                });
                continue;
            }
            Ok(Event::Empty(e)) => {
                let end = position(&reader);
                NodeData {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    span: tag_start(source, end)..end,
                    inner: end..end,
                    children: Vec::new(),
                }
            }
            Ok(Event::End(_)) => {
                let end = position(&reader);
                let start = tag_start(source, end);
                let Some(mut node) = stack.pop() else {
                    return Err(xml_error(format!("unexpected end tag at position {start}")));
                };
                node.inner.end = start;
                node.span.end = end;
                node
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => {
                return Err(xml_error(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                )))
            }
        };

        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        } else if root.is_none() {
            root = Some(node);
        } else {
            return Err(xml_error(format!(
                "second root element <{}> at position {}",
                node.name, node.span.start
            )));
        }
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    root.ok_or_else(|| ParseError::MissingRoot(source_name.to_string()))
}

/// Resolves entity references and unwraps CDATA sections.
///
/// Comments and processing instructions are dropped. Text ends at the first
/// child element.
fn decode_text(raw: &str) -> Result<Cow<'_, str>, String> {
    let unescape = |text: &str| -> Result<String, String> {
        quick_xml::escape::unescape(text)
            .map(Cow::into_owned)
            .map_err(|e| e.to_string())
    };

    if !raw.contains('<') {
        return quick_xml::escape::unescape(raw).map_err(|e| e.to_string());
    }

    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('<') {
        text.push_str(&unescape(&rest[..open])?);
        let markup = &rest[open..];

        rest = if let Some(body) = markup.strip_prefix(CDATA_OPEN) {
            let close = find_close(body, CDATA_CLOSE, "CDATA section")?;
            text.push_str(&body[..close]);
            &body[close + CDATA_CLOSE.len()..]
        } else if let Some(body) = markup.strip_prefix(COMMENT_OPEN) {
            let close = find_close(body, COMMENT_CLOSE, "comment")?;
            &body[close + COMMENT_CLOSE.len()..]
        } else if let Some(body) = markup.strip_prefix(PI_OPEN) {
            let close = find_close(body, PI_CLOSE, "processing instruction")?;
            &body[close + PI_CLOSE.len()..]
        } else {
            return Ok(Cow::Owned(text));
        };
    }
    text.push_str(&unescape(rest)?);
    Ok(Cow::Owned(text))
}

fn find_close(body: &str, close: &str, what: &str) -> Result<usize, String> {
    body.find(close).ok_or_else(|| format!("unterminated {what}"))
}
