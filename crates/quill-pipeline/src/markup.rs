//! Markup rendering stages.
//!
//! [`MarkupProcessor`] converts Markdown (GFM) into an HTML fragment by
//! walking pulldown-cmark events directly; the preview needs a fragment,
//! not a page, so there is no surrounding document scaffolding. The
//! caret marker travels through rendering as ordinary text.

use std::collections::VecDeque;
use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::processor::{ProcessError, Processor};

/// Escape text for inclusion in HTML.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Converts Markdown into an HTML fragment.
///
/// GFM extensions (tables, strikethrough, task lists) are enabled by
/// default and can be disabled with [`with_gfm`](Self::with_gfm).
pub struct MarkupProcessor {
    gfm: bool,
}

impl MarkupProcessor {
    /// Create a renderer with GFM enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }
}

impl Default for MarkupProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for MarkupProcessor {
    fn name(&self) -> &'static str {
        "markup"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let parser = Parser::new_ext(&text, self.parser_options());
        let mut renderer = HtmlWriter::new(text.len());

        for event in parser {
            renderer.event(event);
        }

        Ok(Some(renderer.finish()))
    }
}

/// Event-to-HTML writer covering the fragment subset the preview needs.
struct HtmlWriter {
    output: String,
    /// Pending image (src, title) while alt text is collected.
    pending_image: Option<(String, String)>,
    image_alt: String,
    in_image: bool,
    in_table_head: bool,
    /// Closing tags for open table cells.
    cell_tags: VecDeque<&'static str>,
}

impl HtmlWriter {
    fn new(input_len: usize) -> Self {
        Self {
            output: String::with_capacity(input_len * 3 / 2),
            pending_image: None,
            image_alt: String::new(),
            in_image: false,
            in_table_head: false,
            cell_tags: VecDeque::new(),
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let _ = write!(self.output, "<code>{}</code>", escape_html(&code));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.output.push('\n'),
            Event::HardBreak => self.output.push_str("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked {
                    r#"<input type="checkbox" checked disabled>"#
                } else {
                    r#"<input type="checkbox" disabled>"#
                });
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported in the preview fragment.
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                let _ = write!(self.output, "<{level}>");
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        let language = info.split_whitespace().next().unwrap_or("");
                        let _ = write!(
                            self.output,
                            r#"<pre><code class="language-{}">"#,
                            escape_html(language)
                        );
                    }
                    _ => self.output.push_str("<pre><code>"),
                }
            }
            Tag::List(Some(1)) => self.output.push_str("<ol>"),
            Tag::List(Some(start)) => {
                let _ = write!(self.output, r#"<ol start="{start}">"#);
            }
            Tag::List(None) => self.output.push_str("<ul>"),
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(_) => self.output.push_str("<table>"),
            Tag::TableHead => {
                self.in_table_head = true;
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => self.output.push_str("<tr>"),
            Tag::TableCell => {
                let (open, close) = if self.in_table_head {
                    ("<th>", "</th>")
                } else {
                    ("<td>", "</td>")
                };
                self.output.push_str(open);
                self.cell_tags.push_back(close);
            }
            Tag::Emphasis => self.output.push_str("<em>"),
            Tag::Strong => self.output.push_str("<strong>"),
            Tag::Strikethrough => self.output.push_str("<s>"),
            Tag::Link { dest_url, .. } => {
                let _ = write!(self.output, r#"<a href="{}">"#, escape_html(&dest_url));
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.in_image = true;
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Superscript => self.output.push_str("<sup>"),
            Tag::Subscript => self.output.push_str("<sub>"),
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(level) => {
                let _ = write!(self.output, "</{level}>");
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.output.push_str("</code></pre>"),
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.output.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                if let Some(close) = self.cell_tags.pop_front() {
                    self.output.push_str(close);
                }
            }
            TagEnd::Emphasis => self.output.push_str("</em>"),
            TagEnd::Strong => self.output.push_str("</strong>"),
            TagEnd::Strikethrough => self.output.push_str("</s>"),
            TagEnd::Link => self.output.push_str("</a>"),
            TagEnd::Image => {
                self.in_image = false;
                let alt = std::mem::take(&mut self.image_alt);
                if let Some((src, title)) = self.pending_image.take() {
                    if title.is_empty() {
                        let _ = write!(
                            self.output,
                            r#"<img src="{}" alt="{}">"#,
                            escape_html(&src),
                            escape_html(&alt)
                        );
                    } else {
                        let _ = write!(
                            self.output,
                            r#"<img src="{}" alt="{}" title="{}">"#,
                            escape_html(&src),
                            escape_html(&alt),
                            escape_html(&title)
                        );
                    }
                }
            }
            TagEnd::Superscript => self.output.push_str("</sup>"),
            TagEnd::Subscript => self.output.push_str("</sub>"),
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_image {
            self.image_alt.push_str(text);
        } else {
            self.output.push_str(&escape_html(text));
        }
    }
}

/// HTML-escapes the document and wraps it in `<pre>`; the fallback for
/// dialects the pipeline does not understand.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreformattedProcessor;

impl PreformattedProcessor {
    /// Create the processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Processor for PreformattedProcessor {
    fn name(&self) -> &'static str {
        "preformatted"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        let mut out = String::with_capacity(text.len() + 11);
        out.push_str("<pre>");
        out.push_str(&escape_html(&text));
        out.push_str("</pre>");
        Ok(Some(out))
    }
}

/// Returns its input unchanged; the tail of plain-Markdown export chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityProcessor;

impl IdentityProcessor {
    /// Create the processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Processor for IdentityProcessor {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&mut self, text: String) -> Result<Option<String>, ProcessError> {
        Ok(Some(text))
    }
}
