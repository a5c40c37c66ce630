//! Style registry.
//!
//! Every style the engine knows about is identified by a [`StyleKind`]. The registry maps each
//! kind to its [`StyleCategory`], to whether it coalesces across paragraphs, to its typing
//! shortcut, and to the [`MergingConfig`] used to resolve conflicts when the style is enabled.

use std::fmt;
use std::str::FromStr;

use crate::config::HtmlStyle;

/// Identity of a style, independent of any payload it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKind {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Inline code.
    InlineCode,
    /// Text color.
    Color,
    /// Heading level 1.
    H1,
    /// Heading level 2.
    H2,
    /// Heading level 3.
    H3,
    /// Heading level 4.
    H4,
    /// Heading level 5.
    H5,
    /// Heading level 6.
    H6,
    /// Block quote.
    BlockQuote,
    /// Code block.
    CodeBlock,
    /// Ordered (numbered) list item.
    OrderedList,
    /// Unordered (bulleted) list item.
    UnorderedList,
    /// Checkbox list item.
    CheckboxList,
    /// Hyperlink.
    Link,
    /// Inline image.
    Image,
    /// Mention token.
    Mention,
}

/// How a style addresses the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleCategory {
    /// Character ranges.
    Inline,
    /// Whole paragraphs (headings, block quote, code block).
    Paragraph,
    /// Whole paragraphs, one list item per paragraph.
    List,
    /// Atomic ranges carrying a payload (link, image, mention).
    Parametrized,
}

impl StyleKind {
    /// Number of style kinds.
    pub const COUNT: usize = 20;

    /// Every style kind, in declaration order.
    pub const ALL: [StyleKind; Self::COUNT] = [
        StyleKind::Bold,
        StyleKind::Italic,
        StyleKind::Underline,
        StyleKind::Strikethrough,
        StyleKind::InlineCode,
        StyleKind::Color,
        StyleKind::H1,
        StyleKind::H2,
        StyleKind::H3,
        StyleKind::H4,
        StyleKind::H5,
        StyleKind::H6,
        StyleKind::BlockQuote,
        StyleKind::CodeBlock,
        StyleKind::OrderedList,
        StyleKind::UnorderedList,
        StyleKind::CheckboxList,
        StyleKind::Link,
        StyleKind::Image,
        StyleKind::Mention,
    ];

    /// Inline kinds that are toggled through the typing state.
    pub const TOGGLEABLE_INLINE: [StyleKind; 5] = [
        StyleKind::Bold,
        StyleKind::Italic,
        StyleKind::Underline,
        StyleKind::Strikethrough,
        StyleKind::InlineCode,
    ];

    /// Paragraph kinds, headings first.
    pub const PARAGRAPH: [StyleKind; 8] = [
        StyleKind::H1,
        StyleKind::H2,
        StyleKind::H3,
        StyleKind::H4,
        StyleKind::H5,
        StyleKind::H6,
        StyleKind::BlockQuote,
        StyleKind::CodeBlock,
    ];

    /// List kinds, in the order their text-change hooks run.
    pub const LIST: [StyleKind; 3] = [
        StyleKind::OrderedList,
        StyleKind::UnorderedList,
        StyleKind::CheckboxList,
    ];

    /// Parametrized kinds.
    pub const PARAMETRIZED: [StyleKind; 3] =
        [StyleKind::Link, StyleKind::Image, StyleKind::Mention];

    /// Dense index of this kind, usable for table lookups.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase name, as used by hosts and in state payloads.
    pub const fn name(self) -> &'static str {
        match self {
            StyleKind::Bold => "bold",
            StyleKind::Italic => "italic",
            StyleKind::Underline => "underline",
            StyleKind::Strikethrough => "strikethrough",
            StyleKind::InlineCode => "inline_code",
            StyleKind::Color => "color",
            StyleKind::H1 => "h1",
            StyleKind::H2 => "h2",
            StyleKind::H3 => "h3",
            StyleKind::H4 => "h4",
            StyleKind::H5 => "h5",
            StyleKind::H6 => "h6",
            StyleKind::BlockQuote => "block_quote",
            StyleKind::CodeBlock => "code_block",
            StyleKind::OrderedList => "ordered_list",
            StyleKind::UnorderedList => "unordered_list",
            StyleKind::CheckboxList => "checkbox_list",
            StyleKind::Link => "link",
            StyleKind::Image => "image",
            StyleKind::Mention => "mention",
        }
    }

    /// Category of this kind.
    pub const fn category(self) -> StyleCategory {
        match self {
            StyleKind::Bold
            | StyleKind::Italic
            | StyleKind::Underline
            | StyleKind::Strikethrough
            | StyleKind::InlineCode
            | StyleKind::Color => StyleCategory::Inline,
            StyleKind::H1
            | StyleKind::H2
            | StyleKind::H3
            | StyleKind::H4
            | StyleKind::H5
            | StyleKind::H6
            | StyleKind::BlockQuote
            | StyleKind::CodeBlock => StyleCategory::Paragraph,
            StyleKind::OrderedList | StyleKind::UnorderedList | StyleKind::CheckboxList => {
                StyleCategory::List
            }
            StyleKind::Link | StyleKind::Image | StyleKind::Mention => StyleCategory::Parametrized,
        }
    }

    /// Whether one annotation of this kind spans adjacent paragraphs.
    pub const fn is_continuous(self) -> bool {
        matches!(self, StyleKind::BlockQuote | StyleKind::CodeBlock)
    }

    /// Whether [`toggle_style`](crate::EnrichedEditor::toggle_style) accepts this kind.
    pub const fn is_toggleable(self) -> bool {
        !matches!(self.category(), StyleCategory::Parametrized)
            && !matches!(self, StyleKind::Color)
    }

    /// Typed prefix that turns a paragraph into a list item.
    pub const fn shortcut(self) -> Option<&'static str> {
        match self {
            StyleKind::UnorderedList => Some("- "),
            StyleKind::OrderedList => Some("1. "),
            _ => None,
        }
    }

    /// Heading level (1..=6) for heading kinds.
    pub const fn heading_level(self) -> Option<u8> {
        match self {
            StyleKind::H1 => Some(1),
            StyleKind::H2 => Some(2),
            StyleKind::H3 => Some(3),
            StyleKind::H4 => Some(4),
            StyleKind::H5 => Some(5),
            StyleKind::H6 => Some(6),
            _ => None,
        }
    }

    /// Heading kind for a level in `1..=6`.
    pub const fn heading(level: u8) -> Option<StyleKind> {
        match level {
            1 => Some(StyleKind::H1),
            2 => Some(StyleKind::H2),
            3 => Some(StyleKind::H3),
            4 => Some(StyleKind::H4),
            5 => Some(StyleKind::H5),
            6 => Some(StyleKind::H6),
            _ => None,
        }
    }

    /// Conflict-resolution rules for enabling this kind.
    ///
    /// Returns `None` for kinds that never conflict with anything (color, image).
    pub fn merging_config(self, style: &HtmlStyle) -> Option<MergingConfig> {
        use StyleKind::*;

        const HEADINGS: [StyleKind; 6] = [H1, H2, H3, H4, H5, H6];

        let config = match self {
            Bold => {
                let mut blocking = vec![CodeBlock];
                blocking.extend(HEADINGS.into_iter().filter(|h| style.is_heading_bold(*h)));
                MergingConfig::blocking(blocking)
            }
            Italic | Underline | Strikethrough => MergingConfig::blocking(vec![CodeBlock]),
            InlineCode => MergingConfig {
                blocking: vec![CodeBlock],
                conflicting: vec![Mention, Link],
            },
            H1 | H2 | H3 | H4 | H5 | H6 => {
                let mut conflicting: Vec<StyleKind> =
                    HEADINGS.into_iter().filter(|h| *h != self).collect();
                conflicting.extend([OrderedList, UnorderedList, CheckboxList, BlockQuote, CodeBlock]);
                if style.is_heading_bold(self) {
                    conflicting.push(Bold);
                }
                MergingConfig::conflicting(conflicting)
            }
            BlockQuote => MergingConfig::conflicting(
                HEADINGS
                    .into_iter()
                    .chain([CodeBlock, OrderedList, UnorderedList, CheckboxList])
                    .collect(),
            ),
            CodeBlock => MergingConfig::conflicting(
                HEADINGS
                    .into_iter()
                    .chain([
                        Bold,
                        Italic,
                        Underline,
                        Strikethrough,
                        UnorderedList,
                        OrderedList,
                        CheckboxList,
                        BlockQuote,
                        InlineCode,
                    ])
                    .collect(),
            ),
            OrderedList | UnorderedList | CheckboxList => MergingConfig::conflicting(
                HEADINGS
                    .into_iter()
                    .chain(
                        [OrderedList, UnorderedList, CheckboxList]
                            .into_iter()
                            .filter(|l| *l != self),
                    )
                    .chain([CodeBlock, BlockQuote])
                    .collect(),
            ),
            Link => MergingConfig::blocking(vec![InlineCode, CodeBlock, Mention]),
            Mention => MergingConfig::blocking(vec![InlineCode, CodeBlock, Link]),
            Color | Image => return None,
        };
        Some(config)
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown style name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown style `{0}`")]
pub struct UnknownStyle(pub String);

impl FromStr for StyleKind {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// Blocking and conflicting styles of a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergingConfig {
    /// Styles that, while active, prevent the kind from being enabled.
    pub blocking: Vec<StyleKind>,
    /// Styles removed from the affected range when the kind is enabled.
    pub conflicting: Vec<StyleKind>,
}

impl MergingConfig {
    fn blocking(blocking: Vec<StyleKind>) -> Self {
        Self {
            blocking,
            conflicting: Vec::new(),
        }
    }

    fn conflicting(conflicting: Vec<StyleKind>) -> Self {
        Self {
            blocking: Vec::new(),
            conflicting,
        }
    }
}
