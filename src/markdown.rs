//! Markdown to styled blocks, using pulldown-cmark.
//!
//! The output is renderer-agnostic; `view` turns it into iced rich text. HTML in the
//! source is carried through as literal text and never interpreted.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub link: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
    Quote,
    ListItem { depth: usize },
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub spans: Vec<StyledSpan>,
}

/// Wraps text that must not be interpreted as markdown (user messages).
pub fn literal(text: &str) -> Vec<Block> {
    vec![Block {
        kind: BlockKind::Paragraph,
        spans: vec![StyledSpan {
            text: text.to_string(),
            style: SpanStyle::default(),
        }],
    }]
}

pub fn parse(input: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(input, options) {
        builder.handle_event(event);
    }
    builder.flush();
    builder.blocks
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    List,
    Quote,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    kind: Option<BlockKind>,
    spans: Vec<StyledSpan>,
    strong: usize,
    emphasis: usize,
    strikethrough: usize,
    link: usize,
    in_code_block: bool,
    /// Open lists and quotes, innermost last.
    containers: Vec<Container>,
    /// Next ordinal per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    /// List marker waiting for the item's first content.
    pending_marker: Option<String>,
}

impl BlockBuilder {
    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => self.flush(),
            Event::End(Tag::Paragraph) => self.flush(),

            Event::Start(Tag::Heading(level, ..)) => {
                self.flush();
                self.kind = Some(BlockKind::Heading(heading_level(level)));
            }
            Event::End(Tag::Heading(..)) => self.flush(),

            Event::Start(Tag::BlockQuote) => {
                self.flush();
                self.containers.push(Container::Quote);
            }
            Event::End(Tag::BlockQuote) => {
                self.flush();
                self.containers.pop();
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush();
                self.kind = Some(BlockKind::CodeBlock);
                self.in_code_block = true;
            }
            Event::End(Tag::CodeBlock(_)) => {
                self.flush();
                self.in_code_block = false;
            }

            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
                self.containers.push(Container::List);
            }
            Event::End(Tag::List(_)) => {
                self.flush();
                self.lists.pop();
                self.containers.pop();
            }

            Event::Start(Tag::Item) => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.kind = Some(BlockKind::ListItem { depth });
                // An item that opens straight into a nested list keeps both markers.
                self.pending_marker = Some(match self.pending_marker.take() {
                    Some(outer) => outer + &marker,
                    None => marker,
                });
            }
            Event::End(Tag::Item) => {
                if let Some(marker) = self.pending_marker.take() {
                    self.append(marker, SpanStyle::default());
                }
                self.flush();
            }

            Event::Start(Tag::Emphasis) => self.emphasis += 1,
            Event::End(Tag::Emphasis) => self.emphasis = self.emphasis.saturating_sub(1),
            Event::Start(Tag::Strong) => self.strong += 1,
            Event::End(Tag::Strong) => self.strong = self.strong.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strikethrough += 1,
            Event::End(Tag::Strikethrough) => {
                self.strikethrough = self.strikethrough.saturating_sub(1)
            }
            Event::Start(Tag::Link(..)) => self.link += 1,
            Event::End(Tag::Link(..)) => self.link = self.link.saturating_sub(1),

            Event::Text(text) | Event::Html(text) => {
                let style = self.current_style();
                self.push(text.to_string(), style);
            }
            Event::Code(code) => {
                let style = SpanStyle {
                    code: true,
                    ..self.current_style()
                };
                self.push(code.to_string(), style);
            }
            Event::SoftBreak => self.push_plain(" ".to_string()),
            Event::HardBreak => self.push_plain("\n".to_string()),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block {
                    kind: BlockKind::Rule,
                    spans: Vec::new(),
                });
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_plain(marker.to_string());
            }
            Event::FootnoteReference(label) => self.push_plain(format!("[{}]", &*label)),

            _ => {}
        }
    }

    fn current_style(&self) -> SpanStyle {
        SpanStyle {
            strong: self.strong > 0,
            emphasis: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            code: self.in_code_block,
            link: self.link > 0,
        }
    }

    fn push_plain(&mut self, text: String) {
        let style = SpanStyle {
            code: self.in_code_block,
            ..SpanStyle::default()
        };
        self.push(text, style);
    }

    fn push(&mut self, text: String, style: SpanStyle) {
        if text.is_empty() {
            return;
        }
        if let Some(marker) = self.pending_marker.take() {
            self.append(marker, SpanStyle::default());
        }
        self.append(text, style);
    }

    fn append(&mut self, text: String, style: SpanStyle) {
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(StyledSpan { text, style }),
        }
    }

    fn context_kind(&self) -> BlockKind {
        match self.containers.last() {
            Some(Container::Quote) => BlockKind::Quote,
            Some(Container::List) => BlockKind::ListItem {
                depth: self.lists.len().saturating_sub(1),
            },
            None => BlockKind::Paragraph,
        }
    }

    fn flush(&mut self) {
        let kind = self.kind.take().unwrap_or_else(|| self.context_kind());

        // Code blocks and HTML blocks arrive newline-terminated.
        if let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end_matches('\n').len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.spans.pop();
            }
        }

        if self.spans.is_empty() {
            return;
        }

        self.blocks.push(Block {
            kind,
            spans: std::mem::take(&mut self.spans),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Block {
        fn plain_text(&self) -> String {
            self.spans.iter().map(|s| s.text.as_str()).collect()
        }
    }

    fn strong() -> SpanStyle {
        SpanStyle {
            strong: true,
            ..SpanStyle::default()
        }
    }

    #[test]
    fn test_strong_reply() {
        let blocks = parse("Click **Forgot password**.");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);

        let spans = &blocks[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].text, "Click ");
        assert_eq!(spans[0].style, SpanStyle::default());
        assert_eq!(spans[1].text, "Forgot password");
        assert_eq!(spans[1].style, strong());
        assert_eq!(spans[2].text, ".");
    }

    #[test]
    fn test_nested_inline_styles() {
        let blocks = parse("***both*** and ~~gone~~ and `code`");
        let spans = &blocks[0].spans;

        assert_eq!(spans[0].text, "both");
        assert!(spans[0].style.strong && spans[0].style.emphasis);

        let gone = spans.iter().find(|s| s.text == "gone").unwrap();
        assert!(gone.style.strikethrough);

        let code = spans.iter().find(|s| s.text == "code").unwrap();
        assert!(code.style.code);
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let blocks = parse("# Title\n\nFirst line\nsame paragraph\n\n### Sub");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Heading(1));
        assert_eq!(blocks[0].plain_text(), "Title");
        assert_eq!(blocks[1].plain_text(), "First line same paragraph");
        assert_eq!(blocks[2].kind, BlockKind::Heading(3));
    }

    #[test]
    fn test_lists() {
        let blocks = parse("1. Open settings\n2. Click **Reset**\n   - nested\n\n- [x] done");
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::ListItem { depth: 0 },
                BlockKind::ListItem { depth: 0 },
                BlockKind::ListItem { depth: 1 },
                BlockKind::ListItem { depth: 0 },
            ]
        );
        assert_eq!(blocks[0].plain_text(), "1. Open settings");
        assert_eq!(blocks[1].plain_text(), "2. Click Reset");
        assert_eq!(blocks[2].plain_text(), "• nested");
        assert_eq!(blocks[3].plain_text(), "• [x] done");
    }

    #[test]
    fn test_loose_list_keeps_marker_with_text() {
        let blocks = parse("- first\n\n- second\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "• first");
        assert_eq!(blocks[1].plain_text(), "• second");
    }

    #[test]
    fn test_item_opening_with_block_keeps_marker() {
        let blocks = parse("- ```\n  x = 1\n  ```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::CodeBlock);
        assert_eq!(blocks[0].plain_text(), "• x = 1");
        assert!(!blocks[0].spans[0].style.code);

        let blocks = parse("1. # Title\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Heading(1));
        assert_eq!(blocks[0].plain_text(), "1. Title");
    }

    #[test]
    fn test_quote_inside_item_keeps_quote_kind() {
        let blocks = parse("- > quoted\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Quote);
        assert_eq!(blocks[0].plain_text(), "• quoted");

        let blocks = parse("> - inside\n");
        assert_eq!(blocks[0].kind, BlockKind::ListItem { depth: 0 });
        assert_eq!(blocks[0].plain_text(), "• inside");
    }

    #[test]
    fn test_empty_item_still_shows_marker() {
        let blocks = parse("- first\n-\n- third\n");
        let texts: Vec<String> = blocks.iter().map(|b| b.plain_text()).collect();
        assert_eq!(texts, vec!["• first", "• ", "• third"]);
    }

    #[test]
    fn test_code_block() {
        let blocks = parse("```sh\nsudo reboot\nexit\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::CodeBlock);
        assert_eq!(blocks[0].plain_text(), "sudo reboot\nexit");
        assert!(blocks[0].spans.iter().all(|s| s.style.code));
    }

    #[test]
    fn test_quote_and_rule() {
        let blocks = parse("> careful\n\n---\n\nafter");
        assert_eq!(blocks[0].kind, BlockKind::Quote);
        assert_eq!(blocks[1].kind, BlockKind::Rule);
        assert_eq!(blocks[2].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_link_text_is_marked() {
        let blocks = parse("See [the docs](https://example.com).");
        let link = blocks[0].spans.iter().find(|s| s.style.link).unwrap();
        assert_eq!(link.text, "the docs");
    }

    #[test]
    fn test_html_is_shown_verbatim() {
        let blocks = parse("Hello <script>alert(1)</script> there");
        assert!(blocks[0].plain_text().contains("<script>alert(1)</script>"));

        let blocks = parse("<div onclick=\"x()\">hi</div>\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].plain_text(), "<div onclick=\"x()\">hi</div>");
    }

    #[test]
    fn test_literal_skips_markdown() {
        let blocks = literal("I typed **this** myself");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].spans.len(), 1);
        assert_eq!(blocks[0].plain_text(), "I typed **this** myself");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }
}
