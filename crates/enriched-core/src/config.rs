//! Editor configuration.
//!
//! [`HtmlStyle`] mirrors the style object a host hands to the editor. It is deserialized with
//! `serde_json` and validated eagerly: a missing or `null` required key is a [`ConfigError`],
//! never a silent default. [`EditorConfig`] bundles the style with mention indicators and the
//! link detection settings.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::styles::StyleKind;

/// Pattern used when link detection is left at its default.
pub const DEFAULT_LINK_PATTERN: &str = r"(?:[a-zA-Z][a-zA-Z0-9+.\-]*://)?(?:www\.)?[\p{L}\p{N}\-]+(?:\.[\p{L}\p{N}\-]+)*\.[a-zA-Z]{2,}(?::\d{1,5})?(?:[/?#]\S*)?";

/// A color packed as `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawColor", into = "String")]
pub struct Rgba(pub u32);

impl Rgba {
    /// Opaque black.
    pub const BLACK: Rgba = Rgba(0x0000_00ff);

    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Build a color from an Android-style `0xAARRGGBB` integer.
    pub const fn from_argb(argb: u32) -> Self {
        Self(argb.rotate_left(8))
    }

    /// The color as `0xAARRGGBB`.
    pub const fn to_argb(self) -> u32 {
        self.0.rotate_right(8)
    }

    /// Alpha channel.
    pub const fn alpha(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(value.to_string());
        let digits = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let parsed = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        match digits.len() {
            3 => {
                let expand = |nibble: u32| ((nibble & 0xf) * 0x11) as u8;
                Ok(Rgba::new(
                    expand(parsed >> 8),
                    expand(parsed >> 4),
                    expand(parsed),
                    0xff,
                ))
            }
            6 => Ok(Rgba((parsed << 8) | 0xff)),
            8 => Ok(Rgba(parsed)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColor {
    Hex(String),
    Packed(u32),
}

impl TryFrom<RawColor> for Rgba {
    type Error = ConfigError;

    fn try_from(raw: RawColor) -> Result<Self, Self::Error> {
        match raw {
            RawColor::Hex(hex) => Rgba::from_hex(&hex),
            RawColor::Packed(argb) => Ok(Rgba::from_argb(argb)),
        }
    }
}

/// `textDecorationLine` values accepted for links and mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDecorationLine {
    /// Underlined.
    #[default]
    Underline,
    /// No decoration.
    None,
}

/// Heading metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingStyle {
    /// Font size in points.
    pub font_size: f32,
    /// Whether the heading renders bold by default.
    #[serde(default)]
    pub bold: bool,
}

/// Block quote decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockquoteStyle {
    /// Text color override.
    #[serde(default)]
    pub color: Option<Rgba>,
    /// Color of the leading border.
    pub border_color: Rgba,
    /// Gap between border and text.
    pub gap_width: f32,
    /// Border width.
    pub border_width: f32,
}

/// Ordered list marker layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedListStyle {
    /// Gap between marker and text.
    pub gap_width: f32,
    /// Leading margin.
    pub margin_left: f32,
    /// Marker font weight.
    #[serde(default)]
    pub marker_font_weight: Option<String>,
    /// Marker color.
    #[serde(default)]
    pub marker_color: Option<Rgba>,
}

/// Unordered list bullet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnorderedListStyle {
    /// Bullet color.
    pub bullet_color: Rgba,
    /// Gap between bullet and text.
    pub gap_width: f32,
    /// Leading margin.
    pub margin_left: f32,
    /// Bullet diameter.
    pub bullet_size: f32,
}

/// Default image box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Link rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStyle {
    /// Text color.
    pub color: Rgba,
    /// Decoration.
    pub text_decoration_line: TextDecorationLine,
}

/// Code block rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlockStyle {
    /// Text color.
    pub color: Rgba,
    /// Background color.
    pub background_color: Rgba,
    /// Corner radius of the background.
    pub border_radius: f32,
}

/// Inline code rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineCodeStyle {
    /// Text color.
    pub color: Rgba,
    /// Background color.
    pub background_color: Rgba,
}

/// Mention rendering for one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionStyle {
    /// Text color.
    pub color: Rgba,
    /// Background color.
    pub background_color: Rgba,
    /// Decoration.
    pub text_decoration_line: TextDecorationLine,
}

/// Full style description handed over by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlStyle {
    /// Heading 1.
    pub h1: HeadingStyle,
    /// Heading 2.
    pub h2: HeadingStyle,
    /// Heading 3.
    pub h3: HeadingStyle,
    /// Heading 4.
    pub h4: HeadingStyle,
    /// Heading 5.
    pub h5: HeadingStyle,
    /// Heading 6.
    pub h6: HeadingStyle,
    /// Block quote.
    pub blockquote: BlockquoteStyle,
    /// Ordered list.
    pub ol: OrderedListStyle,
    /// Unordered list.
    pub ul: UnorderedListStyle,
    /// Images.
    pub img: ImageStyle,
    /// Links.
    pub a: LinkStyle,
    /// Code block.
    pub codeblock: CodeBlockStyle,
    /// Inline code.
    pub code: InlineCodeStyle,
    /// Mention rendering keyed by indicator.
    #[serde(default)]
    pub mention: BTreeMap<String, MentionStyle>,
}

impl HtmlStyle {
    /// Parse and validate a JSON style object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let style: HtmlStyle = serde_json::from_str(json)?;
        style.validate()?;
        Ok(style)
    }

    /// Heading metrics for a heading kind.
    pub fn heading(&self, kind: StyleKind) -> Option<&HeadingStyle> {
        match kind {
            StyleKind::H1 => Some(&self.h1),
            StyleKind::H2 => Some(&self.h2),
            StyleKind::H3 => Some(&self.h3),
            StyleKind::H4 => Some(&self.h4),
            StyleKind::H5 => Some(&self.h5),
            StyleKind::H6 => Some(&self.h6),
            _ => None,
        }
    }

    /// Whether a heading kind renders bold by default.
    pub fn is_heading_bold(&self, kind: StyleKind) -> bool {
        self.heading(kind).is_some_and(|h| h.bold)
    }

    /// Rendering for mentions started with `indicator`.
    pub fn mention_style(&self, indicator: &str) -> Option<&MentionStyle> {
        self.mention.get(indicator)
    }

    /// Reject metrics that are negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let metrics = [
            ("h1.fontSize", self.h1.font_size),
            ("h2.fontSize", self.h2.font_size),
            ("h3.fontSize", self.h3.font_size),
            ("h4.fontSize", self.h4.font_size),
            ("h5.fontSize", self.h5.font_size),
            ("h6.fontSize", self.h6.font_size),
            ("blockquote.gapWidth", self.blockquote.gap_width),
            ("blockquote.borderWidth", self.blockquote.border_width),
            ("ol.gapWidth", self.ol.gap_width),
            ("ol.marginLeft", self.ol.margin_left),
            ("ul.gapWidth", self.ul.gap_width),
            ("ul.marginLeft", self.ul.margin_left),
            ("ul.bulletSize", self.ul.bullet_size),
            ("img.width", self.img.width),
            ("img.height", self.img.height),
            ("codeblock.borderRadius", self.codeblock.border_radius),
        ];
        for (field, value) in metrics {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for HtmlStyle {
    fn default() -> Self {
        let heading = |font_size| HeadingStyle {
            font_size,
            bold: false,
        };
        let translucent = Rgba::new(0, 0, 0, 0x1a);
        Self {
            h1: heading(32.0),
            h2: heading(24.0),
            h3: heading(20.0),
            h4: heading(16.0),
            h5: heading(14.0),
            h6: heading(12.0),
            blockquote: BlockquoteStyle {
                color: None,
                border_color: Rgba::new(0xa9, 0xa9, 0xa9, 0xff),
                gap_width: 16.0,
                border_width: 4.0,
            },
            ol: OrderedListStyle {
                gap_width: 16.0,
                margin_left: 16.0,
                marker_font_weight: None,
                marker_color: None,
            },
            ul: UnorderedListStyle {
                bullet_color: Rgba::BLACK,
                gap_width: 16.0,
                margin_left: 16.0,
                bullet_size: 8.0,
            },
            img: ImageStyle {
                width: 80.0,
                height: 80.0,
            },
            a: LinkStyle {
                color: Rgba::new(0, 0, 0xff, 0xff),
                text_decoration_line: TextDecorationLine::Underline,
            },
            codeblock: CodeBlockStyle {
                color: Rgba::BLACK,
                background_color: translucent,
                border_radius: 8.0,
            },
            code: InlineCodeStyle {
                color: Rgba::new(0xff, 0, 0, 0xff),
                background_color: translucent,
            },
            mention: BTreeMap::new(),
        }
    }
}

/// Link detection settings as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkRegexConfig {
    /// Pattern source; ignored unless neither `is_disabled` nor `is_default` is set.
    pub pattern: String,
    /// Case-insensitive matching.
    pub case_insensitive: bool,
    /// `^`/`$` match at line boundaries.
    pub multiline: bool,
    /// `.` matches newlines.
    pub dot_all: bool,
    /// Unicode-aware classes.
    pub unicode: bool,
    /// Turn detection off.
    pub is_disabled: bool,
    /// Use [`DEFAULT_LINK_PATTERN`].
    pub is_default: bool,
}

impl Default for LinkRegexConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            case_insensitive: false,
            multiline: false,
            dot_all: false,
            unicode: true,
            is_disabled: false,
            is_default: true,
        }
    }
}

impl LinkRegexConfig {
    /// Detection turned off.
    pub fn disabled() -> Self {
        Self {
            is_disabled: true,
            is_default: false,
            ..Self::default()
        }
    }

    /// A custom pattern with default flags.
    pub fn custom(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            is_default: false,
            ..Self::default()
        }
    }

    /// Compile into a matcher. Custom patterns must match a whole word.
    pub fn compile(&self) -> Result<LinkMatcher, ConfigError> {
        if self.is_disabled {
            return Ok(LinkMatcher::Disabled);
        }
        let (pattern, builder_flags) = if self.is_default {
            (DEFAULT_LINK_PATTERN, LinkRegexConfig::default())
        } else {
            (self.pattern.as_str(), self.clone())
        };
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(builder_flags.case_insensitive)
            .multi_line(builder_flags.multiline)
            .dot_matches_new_line(builder_flags.dot_all)
            .unicode(builder_flags.unicode)
            .build()
            .map_err(|source| ConfigError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(if self.is_default {
            LinkMatcher::Default(regex)
        } else {
            LinkMatcher::Custom(regex)
        })
    }
}

/// Compiled link detection.
#[derive(Debug, Clone)]
pub enum LinkMatcher {
    /// No automatic links.
    Disabled,
    /// The built-in URL pattern.
    Default(Regex),
    /// A host-supplied pattern.
    Custom(Regex),
}

impl LinkMatcher {
    /// Whether `word` should become a link.
    pub fn matches(&self, word: &str) -> bool {
        match self {
            LinkMatcher::Disabled => false,
            LinkMatcher::Default(regex) | LinkMatcher::Custom(regex) => regex.is_match(word),
        }
    }

    /// Whether detection is turned off.
    pub fn is_disabled(&self) -> bool {
        matches!(self, LinkMatcher::Disabled)
    }
}

fn default_mention_indicators() -> Vec<String> {
    vec!["@".to_string()]
}

/// Everything needed to construct an editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Rendering and merge-rule inputs.
    pub html_style: HtmlStyle,
    /// Prefixes that start a mention.
    #[serde(default = "default_mention_indicators")]
    pub mention_indicators: Vec<String>,
    /// Link detection settings.
    #[serde(default)]
    pub link_regex: LinkRegexConfig,
}

impl EditorConfig {
    /// Parse and validate a JSON editor configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate nested settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.html_style.validate()?;
        if self.mention_indicators.iter().any(|i| i.is_empty()) {
            return Err(ConfigError::EmptyMentionIndicator);
        }
        self.link_regex.compile()?;
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            html_style: HtmlStyle::default(),
            mention_indicators: default_mention_indicators(),
            link_regex: LinkRegexConfig::default(),
        }
    }
}
