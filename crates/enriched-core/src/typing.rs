//! Typing state: styles pending at the caret.
//!
//! A non-empty entry for a kind means the style is active for the current selection; for the
//! inline kinds it also marks where newly typed text starts being wrapped.

use std::collections::BTreeMap;

use crate::config::{HtmlStyle, Rgba};
use crate::styles::StyleKind;

/// Per-kind pending offsets plus the pending text color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypingState {
    starts: [Option<usize>; StyleKind::COUNT],
    color: Option<PendingColor>,
}

/// A text color waiting to be applied to typed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingColor {
    /// Offset typed text starts from.
    pub start: usize,
    /// Color to paint.
    pub color: Rgba,
}

impl TypingState {
    /// Pending offset for `kind`.
    pub fn get(&self, kind: StyleKind) -> Option<usize> {
        self.starts[kind.index()]
    }

    /// Set or clear the pending offset for `kind`.
    pub fn set(&mut self, kind: StyleKind, start: Option<usize>) {
        self.starts[kind.index()] = start;
    }

    /// Whether `kind` is pending.
    pub fn is_active(&self, kind: StyleKind) -> bool {
        self.get(kind).is_some()
    }

    /// Pending text color.
    pub fn color(&self) -> Option<PendingColor> {
        self.color
    }

    /// Set or clear the pending text color.
    pub fn set_color(&mut self, color: Option<PendingColor>) {
        self.color = color;
    }

    /// Kinds currently pending.
    pub fn active(&self) -> impl Iterator<Item = StyleKind> + '_ {
        StyleKind::ALL
            .into_iter()
            .filter(|kind| self.is_active(*kind))
    }

    /// Build the toolbar snapshot for this state.
    pub fn snapshot(&self, style: &HtmlStyle) -> StyleStateSnapshot {
        let mut states = BTreeMap::new();
        for kind in StyleKind::ALL {
            let is_active = match kind {
                StyleKind::Color => self.color.is_some(),
                _ => self.is_active(kind),
            };
            let (is_blocking, is_conflicting) = match kind.merging_config(style) {
                Some(config) => (
                    config.blocking.iter().any(|k| self.is_active(*k)),
                    config.conflicting.iter().any(|k| self.is_active(*k)),
                ),
                None => (false, false),
            };
            states.insert(
                kind,
                StyleState {
                    is_active,
                    is_blocking,
                    is_conflicting,
                },
            );
        }
        StyleStateSnapshot { states }
    }
}

/// Toolbar-facing state of one style kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleState {
    /// The style applies to the selection or is pending at the caret.
    pub is_active: bool,
    /// A style that blocks this one is active.
    pub is_blocking: bool,
    /// A style that conflicts with this one is active.
    pub is_conflicting: bool,
}

/// State of every style kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleStateSnapshot {
    states: BTreeMap<StyleKind, StyleState>,
}

impl StyleStateSnapshot {
    /// State of one kind.
    pub fn get(&self, kind: StyleKind) -> StyleState {
        self.states.get(&kind).copied().unwrap_or_default()
    }

    /// Kinds that are active.
    pub fn active(&self) -> Vec<StyleKind> {
        self.states
            .iter()
            .filter(|(_, state)| state.is_active)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Iterate over every kind and its state.
    pub fn iter(&self) -> impl Iterator<Item = (StyleKind, StyleState)> + '_ {
        self.states.iter().map(|(kind, state)| (*kind, *state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut typing = TypingState::default();
        typing.set(StyleKind::Bold, Some(3));
        typing.set(StyleKind::Bold, Some(7));
        assert_eq!(typing.get(StyleKind::Bold), Some(7));
        typing.set(StyleKind::Bold, None);
        assert!(!typing.is_active(StyleKind::Bold));
    }

    #[test]
    fn test_snapshot_flags() {
        let mut typing = TypingState::default();
        typing.set(StyleKind::CodeBlock, Some(0));
        typing.set_color(Some(PendingColor {
            start: 0,
            color: Rgba::BLACK,
        }));
        let snapshot = typing.snapshot(&HtmlStyle::default());

        assert!(snapshot.get(StyleKind::CodeBlock).is_active);
        assert!(snapshot.get(StyleKind::Color).is_active);
        let bold = snapshot.get(StyleKind::Bold);
        assert!(bold.is_blocking && !bold.is_active);
        assert!(snapshot.get(StyleKind::H1).is_conflicting);
        assert!(!snapshot.get(StyleKind::Image).is_conflicting);
        assert_eq!(
            snapshot.active(),
            vec![StyleKind::Color, StyleKind::CodeBlock]
        );
    }
}
