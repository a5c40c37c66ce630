//! Command interface.
//!
//! Hosts that drive the editor from a toolbar or a message bridge can express every operation
//! as a [`Command`] and dispatch it through [`EnrichedEditor::execute`]. Commands carrying
//! offsets are checked against the document: a reversed or out-of-range span is reported as
//! [`CommandError::InvalidRange`] instead of being clamped.
//!
//! # Example
//!
//! ```rust
//! use enriched_core::{
//!     Command, CommandResult, EditCommand, EditorConfig, EnrichedEditor, StyleCommand, StyleKind,
//! };
//!
//! let mut editor = EnrichedEditor::new(EditorConfig::default()).unwrap();
//!
//! let commands = vec![
//!     Command::Edit(EditCommand::Replace { start: 0, end: 0, text: "Title".to_string() }),
//!     Command::Style(StyleCommand::Toggle(StyleKind::H1)),
//! ];
//! let results = editor.execute_batch(commands).unwrap();
//! assert_eq!(results[1], CommandResult::Applied(true));
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{HtmlStyle, LinkRegexConfig, Rgba};
use crate::editor::EnrichedEditor;
use crate::error::CommandError;
use crate::selection::Selection;
use crate::styles::StyleKind;

/// Text editing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Replace `[start, end)` with `text`, as typed by the user
    Replace {
        /// Start offset.
        start: usize,
        /// End offset (exclusive).
        end: usize,
        /// Replacement text.
        text: String,
    },
    /// Replace the selection with `text`
    InsertText {
        /// Text to insert.
        text: String,
    },
    /// Delete the selection or the char before the caret
    Backspace,
}

/// Selection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Select `[start, end)` in buffer offsets
    Set {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
    /// Select using offsets that skip zero-width markers
    SetVisible {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
}

/// Style commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleCommand {
    /// Toggle a toggleable style for the selection
    Toggle(StyleKind),
    /// Toggle a checkbox list
    ToggleCheckboxList {
        /// Initial state of new items.
        checked: bool,
    },
    /// Flip the checkbox of the item containing `offset`
    ToggleChecked {
        /// Offset inside the item.
        offset: usize,
    },
    /// Remove `kind` from `[start, end)`
    Remove {
        /// Style kind to remove.
        kind: StyleKind,
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
    /// Paint the selection, or set the typing color
    SetColor(Rgba),
    /// Remove color from the selection
    RemoveColor,
    /// Replace `[start, end)` with `text` linked to `url`
    SetLink {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
        /// Link text.
        text: String,
        /// Link target.
        url: String,
    },
    /// Insert an image at the selection
    SetImage {
        /// Image source.
        src: String,
        /// Width in points.
        width: u32,
        /// Height in points.
        height: u32,
    },
    /// Type a mention indicator at the selection
    StartMention {
        /// Indicator to type.
        indicator: String,
    },
    /// Resolve the pending mention
    SetMention {
        /// Indicator of the mention.
        indicator: String,
        /// Displayed text.
        text: String,
        /// Host attributes.
        attributes: BTreeMap<String, String>,
    },
}

/// Configuration commands
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Replace the style configuration
    SetHtmlStyle(Box<HtmlStyle>),
    /// Replace the link detection settings
    SetLinkRegex(LinkRegexConfig),
    /// Replace the mention indicators
    SetMentionIndicators(Vec<String>),
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Text editing commands
    Edit(EditCommand),
    /// Selection commands
    Selection(SelectionCommand),
    /// Style commands
    Style(StyleCommand),
    /// Configuration commands
    Config(ConfigCommand),
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Success, no return value
    Success,
    /// Whether the command changed anything; `false` for routine no-ops
    Applied(bool),
    /// Success, returns the selection after the command
    Selection(Selection),
}

impl EnrichedEditor {
    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        debug!(?command, "executing command");
        match command {
            Command::Edit(edit) => self.execute_edit(edit),
            Command::Selection(selection) => self.execute_selection(selection),
            Command::Style(style) => self.execute_style(style),
            Command::Config(config) => self.execute_config(config),
        }
    }

    /// Execute commands in order, stopping at the first error.
    ///
    /// Events are delivered once, after the last command.
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, CommandError> {
        let mut op = self.operation();
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            results.push(op.execute(command)?);
        }
        Ok(results)
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), CommandError> {
        if start > end || end > self.doc.len() {
            return Err(CommandError::InvalidRange { start, end });
        }
        Ok(())
    }

    fn execute_edit(&mut self, command: EditCommand) -> Result<CommandResult, CommandError> {
        let selection = match command {
            EditCommand::Replace { start, end, text } => {
                self.check_range(start, end)?;
                self.replace_text(start, end, &text)
            }
            EditCommand::InsertText { text } => self.insert_text(&text),
            EditCommand::Backspace => self.backspace(),
        };
        Ok(CommandResult::Selection(selection))
    }

    fn execute_selection(
        &mut self,
        command: SelectionCommand,
    ) -> Result<CommandResult, CommandError> {
        let selection = match command {
            SelectionCommand::Set { start, end } => {
                self.check_range(start.min(end), start.max(end))?;
                self.on_selection_changed(start, end)
            }
            SelectionCommand::SetVisible { start, end } => self.set_custom_selection(start, end),
        };
        Ok(CommandResult::Selection(selection))
    }

    fn execute_style(&mut self, command: StyleCommand) -> Result<CommandResult, CommandError> {
        let applied = match command {
            StyleCommand::Toggle(kind) => {
                if !kind.is_toggleable() {
                    return Err(CommandError::UnsupportedStyle(kind));
                }
                self.toggle_style(kind)
            }
            StyleCommand::ToggleCheckboxList { checked } => self.toggle_checkbox_list(checked),
            StyleCommand::ToggleChecked { offset } => {
                if offset > self.doc.len() {
                    return Err(CommandError::InvalidRange {
                        start: offset,
                        end: offset,
                    });
                }
                self.toggle_checked(offset)
            }
            StyleCommand::Remove { kind, start, end } => {
                self.check_range(start, end)?;
                self.remove_style(kind, start, end)
            }
            StyleCommand::SetColor(color) => {
                self.set_color(color);
                true
            }
            StyleCommand::RemoveColor => self.remove_color(),
            StyleCommand::SetLink {
                start,
                end,
                text,
                url,
            } => {
                self.check_range(start, end)?;
                self.set_link(start, end, &text, &url)
            }
            StyleCommand::SetImage { src, width, height } => self.set_image(&src, width, height),
            StyleCommand::StartMention { indicator } => {
                if !self.mentions.indicators().contains(&indicator) {
                    return Err(CommandError::UnsupportedStyle(StyleKind::Mention));
                }
                self.start_mention(&indicator)
            }
            StyleCommand::SetMention {
                indicator,
                text,
                attributes,
            } => self.set_mention(&indicator, &text, attributes),
        };
        Ok(CommandResult::Applied(applied))
    }

    fn execute_config(&mut self, command: ConfigCommand) -> Result<CommandResult, CommandError> {
        match command {
            ConfigCommand::SetHtmlStyle(style) => self.set_html_style(*style)?,
            ConfigCommand::SetLinkRegex(config) => self.set_link_regex(&config)?,
            ConfigCommand::SetMentionIndicators(indicators) => {
                self.set_mention_indicators(indicators)?
            }
        }
        Ok(CommandResult::Success)
    }
}
