//! Pane list, selection and focus, and the full-screen sidebar redraw.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::{DiffRenderer, fit, visible_width};
use crate::error::MosaicError;
use crate::pane::{Area, Pane, VirtualTerminal};
use crate::style::{SEPARATOR, Theme};

// ─── Layout ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Sidebar columns, including the border column.
    pub sidebar_width: u16,
    /// Rows above the pane area.
    pub pad_height: u16,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            sidebar_width: 24,
            pad_height: 0,
        }
    }
}

// ─── Keys ─────────────────────────────────────────────────────────

/// Keys the sidebar reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Up,
    Down,
    Enter,
    CtrlZ,
    /// Half page back in the selected pane's scrollback.
    CtrlU,
    /// Half page forward.
    CtrlD,
    Char(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Enter => f.write_str("enter"),
            Self::CtrlZ => f.write_str("ctrl-z"),
            Self::CtrlU => f.write_str("ctrl-u"),
            Self::CtrlD => f.write_str("ctrl-d"),
            Self::Char(c) => write!(f, "{c}"),
        }
    }
}

impl FromStr for Key {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "↑" => Ok(Self::Up),
            "down" | "↓" => Ok(Self::Down),
            "enter" => Ok(Self::Enter),
            "ctrl-z" => Ok(Self::CtrlZ),
            "ctrl-u" => Ok(Self::CtrlU),
            "ctrl-d" => Ok(Self::CtrlD),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Self::Char(c)),
                    _ => Err(MosaicError::UnknownKey(s.to_string())),
                }
            }
        }
    }
}

impl TryFrom<String> for Key {
    type Error = MosaicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Work the registry hands back to whoever owns the processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneRequest {
    Kill(String),
    Start(String),
    /// Copy the pane's current selection to the clipboard.
    Copy(String),
    /// Input for the focused process.
    Forward { key: String, input: Key },
}

// ─── Registry ─────────────────────────────────────────────────────

/// Ordered panes plus selection and focus. Every mutation marks the
/// registry dirty; [`PaneRegistry::draw`] clears the flag.
pub struct PaneRegistry<V> {
    panes: Vec<Pane<V>>,
    selected: Option<usize>,
    focused: bool,
    dirty: bool,
    layout: Layout,
    sidebar: DiffRenderer,
    /// Terminal size at the last draw; a change forces a full clear.
    size: (u16, u16),
}

impl<V: VirtualTerminal> PaneRegistry<V> {
    pub fn new(layout: Layout) -> Self {
        Self {
            panes: Vec::new(),
            selected: None,
            focused: false,
            dirty: false,
            layout,
            sidebar: DiffRenderer::region(layout.sidebar_width),
            size: (0, 0),
        }
    }

    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn panes(&self) -> &[Pane<V>] {
        &self.panes
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Pane<V>> {
        self.panes.iter_mut().find(|p| p.key == key)
    }

    /// Register a pane. A key that is already present is left alone.
    pub fn add(&mut self, pane: Pane<V>) {
        if self.panes.iter().any(|p| p.key == pane.key) {
            debug!(key = %pane.key, "pane already registered");
            return;
        }
        debug!(key = %pane.key, title = %pane.title, "pane added");
        self.panes.push(pane);
        self.sort();
        if self.selected.is_none() {
            self.selected = Some(0);
        }
    }

    /// Drop a pane. Selection stays on the same pane, or on the same row
    /// when the selected pane itself was removed.
    pub fn remove(&mut self, key: &str) -> Option<Pane<V>> {
        let index = self.panes.iter().position(|p| p.key == key)?;
        let selected_key = self.selected_process().map(|p| p.key.clone());
        let pane = self.panes.remove(index);
        self.selected = match selected_key {
            Some(k) if k != key => self.panes.iter().position(|p| p.key == k),
            _ if self.panes.is_empty() => None,
            _ => self.selected.map(|i| i.min(self.panes.len() - 1)),
        };
        self.dirty = true;
        Some(pane)
    }

    pub fn mark_dead(&mut self, key: &str) {
        self.set_dead(key, true);
    }

    pub fn mark_alive(&mut self, key: &str) {
        self.set_dead(key, false);
    }

    fn set_dead(&mut self, key: &str, dead: bool) {
        if let Some(pane) = self.get_mut(key) {
            pane.dead = dead;
            self.sort();
        }
    }

    /// Shift the selection by `offset`, clamped to the list.
    pub fn move_by(&mut self, offset: isize) {
        self.dirty = true;
        if self.panes.is_empty() {
            self.selected = None;
            return;
        }
        let last = self.panes.len() as isize - 1;
        let current = self.selected.unwrap_or(0) as isize;
        self.selected = Some(current.saturating_add(offset).clamp(0, last) as usize);
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.dirty = true;
    }

    /// Return to the sidebar. The pane drops back to its live view and the
    /// cursor is hidden on the next draw.
    pub fn blur(&mut self) {
        self.focused = false;
        if let Some(pane) = self.selected_process_mut() {
            pane.vt.scroll_reset();
        }
        self.dirty = true;
    }

    /// Order: non-killable first, then live before dead, then shorter
    /// titles. Stable, and the selected pane stays selected.
    pub fn sort(&mut self) {
        let key = self.selected_process().map(|p| p.key.clone());
        self.panes
            .sort_by_key(|p| (p.killable, p.dead, p.title.chars().count()));
        self.selected = key.and_then(|k| self.panes.iter().position(|p| p.key == k));
        self.dirty = true;
    }

    pub fn selected_process(&self) -> Option<&Pane<V>> {
        self.selected.and_then(|i| self.panes.get(i))
    }

    pub fn selected_process_mut(&mut self) -> Option<&mut Pane<V>> {
        self.selected.and_then(|i| self.panes.get_mut(i))
    }

    // ─── Input ────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: Key) -> Option<PaneRequest> {
        let (pane_key, killable, dead, scrolling, selecting) = match self.selected_process() {
            Some(p) => (
                p.key.clone(),
                p.killable,
                p.dead,
                p.vt.is_scrolling(),
                p.vt.has_selection(),
            ),
            None => return None,
        };

        if self.focused {
            return match key {
                Key::CtrlZ => {
                    self.blur();
                    None
                }
                Key::Enter if selecting => Some(PaneRequest::Copy(pane_key)),
                Key::Enter if scrolling => {
                    self.reset_scroll();
                    None
                }
                input => Some(PaneRequest::Forward {
                    key: pane_key,
                    input,
                }),
            };
        }

        match key {
            Key::Up | Key::Char('k') => self.move_by(-1),
            Key::Down | Key::Char('j') => self.move_by(1),
            Key::Enter if selecting => return Some(PaneRequest::Copy(pane_key)),
            Key::Enter if scrolling && !killable => self.reset_scroll(),
            Key::Enter if killable && dead => return Some(PaneRequest::Start(pane_key)),
            Key::Enter if killable => self.focus(),
            Key::Char('x') if killable && !dead => return Some(PaneRequest::Kill(pane_key)),
            _ => {}
        }
        None
    }

    fn reset_scroll(&mut self) {
        if let Some(pane) = self.selected_process_mut() {
            pane.vt.scroll_reset();
        }
        self.dirty = true;
    }

    /// Key hints for the current selection and focus, shortest key first.
    pub fn hotkeys(&self) -> Vec<(&'static str, &'static str)> {
        let mut hotkeys: HashMap<&'static str, &'static str> = HashMap::new();
        let selected = self.selected_process();
        if let Some(pane) = selected.filter(|p| p.killable && !self.focused) {
            if pane.dead {
                hotkeys.insert("enter", "start");
            } else {
                hotkeys.insert("x", "kill");
                hotkeys.insert("enter", "focus");
            }
        }
        if self.focused {
            hotkeys.insert("ctrl-z", "sidebar");
        } else {
            hotkeys.insert("j/k/↓/↑", "up/down");
        }
        if let Some(pane) = selected {
            if pane.vt.is_scrolling() && (self.focused || !pane.killable) {
                hotkeys.insert("enter", "reset");
            }
            if pane.vt.has_selection() {
                hotkeys.insert("enter", "copy");
            }
        }
        hotkeys.insert("ctrl-u/d", "scroll");

        let mut hotkeys: Vec<_> = hotkeys.into_iter().collect();
        hotkeys.sort_by(|a, b| {
            a.0.chars()
                .count()
                .cmp(&b.0.chars().count())
                .then_with(|| a.0.cmp(b.0))
        });
        hotkeys
    }

    // ─── Rendering ────────────────────────────────────────────────

    /// The sidebar as `height` lines, each exactly `sidebar_width` columns
    /// wide including the border. `footer` lines sit above the key hints.
    pub fn sidebar_frame(&self, height: u16, footer: &[String], theme: Theme) -> Vec<String> {
        let inner = self.layout.sidebar_width.saturating_sub(1) as usize;

        let mut lines = Vec::new();
        for (index, pane) in self.panes.iter().enumerate() {
            if index > 0 && !self.panes[index - 1].dead && pane.dead {
                lines.push(theme.dim(SEPARATOR));
            }
            let text = format!(" {} {}", pane.icon, pane.title);
            let line = if self.selected == Some(index) {
                if self.focused {
                    theme.bold(&text)
                } else {
                    theme.highlight(&text)
                }
            } else if pane.dead {
                theme.dim(&text)
            } else {
                text
            };
            lines.push(line);
        }

        let hints = self.hotkeys().into_iter().map(|(key, label)| {
            let left = format!(" {key}");
            let right = format!("{label}  ");
            let gap = inner.saturating_sub(visible_width(&left) + visible_width(&right));
            format!("{}{}{}", theme.dim_bold(&left), " ".repeat(gap), theme.dim(&right))
        });
        let bottom: Vec<String> = footer.iter().cloned().chain(hints).collect();

        let height = height as usize;
        let filler = height.saturating_sub(lines.len() + bottom.len());
        lines.extend(std::iter::repeat_n(String::new(), filler));
        lines.extend(bottom);
        lines.truncate(height);

        let border = theme.dim("│");
        lines
            .iter()
            .map(|line| format!("{}{border}", fit(line, inner)))
            .collect()
    }

    /// Redraw the whole screen: sidebar, then the selected pane, then the
    /// cursor. Written to `out` in one piece.
    pub fn draw<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        (cols, rows): (u16, u16),
        footer: &[String],
        theme: Theme,
    ) -> io::Result<()> {
        let frame = self.sidebar_frame(rows, footer, theme);
        let mut buf: Vec<u8> = Vec::new();

        if self.size != (cols, rows) {
            self.sidebar.reset();
            queue!(buf, Clear(ClearType::All))?;
            self.size = (cols, rows);
        }
        let anchor = self.sidebar.previous().len().saturating_sub(1) as u16;
        queue!(buf, MoveTo(0, anchor))?;
        self.sidebar.render(&mut buf, cols, frame)?;

        let x = self.layout.sidebar_width.saturating_add(1);
        let area = Area {
            x,
            y: self.layout.pad_height,
            width: cols.saturating_sub(x),
            height: rows.saturating_sub(self.layout.pad_height),
        };
        let focused = self.focused;
        match self.selected_process_mut() {
            Some(pane) => {
                pane.vt.draw(&mut buf, area)?;
                let cursor = pane.vt.cursor();
                if focused && cursor.visible {
                    let col = area.x.saturating_add(cursor.col);
                    let row = area.y.saturating_add(cursor.row);
                    queue!(buf, MoveTo(col, row), Show)?;
                } else {
                    queue!(buf, Hide)?;
                }
            }
            None => queue!(buf, Hide)?,
        }

        out.write_all(&buf)?;
        out.flush()?;
        self.dirty = false;
        Ok(())
    }

    /// Forget what was drawn; the next draw starts from a cleared screen.
    pub fn invalidate(&mut self) {
        self.sidebar.reset();
        self.size = (0, 0);
        self.dirty = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::pane::Cursor;

    /// Scriptable terminal that prints a marker into its area.
    #[derive(Debug, Default, Clone)]
    pub struct FakeTerminal {
        pub output: String,
        pub cursor: Cursor,
        pub selection: bool,
        pub scrolling: bool,
        pub scroll_resets: usize,
        pub draws: usize,
    }

    impl FakeTerminal {
        pub fn showing(output: &str) -> Self {
            Self {
                output: output.to_string(),
                ..Self::default()
            }
        }
    }

    impl VirtualTerminal for FakeTerminal {
        fn draw(&mut self, out: &mut dyn Write, area: Area) -> io::Result<()> {
            self.draws += 1;
            write!(out, "\x1b[{};{}H{}", area.y + 1, area.x + 1, self.output)
        }

        fn cursor(&self) -> Cursor {
            self.cursor
        }

        fn has_selection(&self) -> bool {
            self.selection
        }

        fn is_scrolling(&self) -> bool {
            self.scrolling
        }

        fn scroll_reset(&mut self) {
            self.scrolling = false;
            self.scroll_resets += 1;
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::fake::FakeTerminal;
    use super::*;
    use proptest::prelude::*;

    fn arb_pane() -> impl Strategy<Value = (String, bool, bool)> {
        ("[a-z]{1,8}", any::<bool>(), any::<bool>())
    }

    fn build(rows: &[(String, bool, bool)]) -> PaneRegistry<FakeTerminal> {
        let mut reg = PaneRegistry::new(Layout::default());
        for (i, (title, killable, dead)) in rows.iter().enumerate() {
            let key = format!("p{i}");
            reg.add(Pane::new(key.clone(), title.clone(), "●", FakeTerminal::default()).killable(*killable));
            if *dead {
                reg.mark_dead(&key);
            }
        }
        reg
    }

    proptest! {
        #[test]
        fn move_stays_in_bounds(
            rows in proptest::collection::vec(arb_pane(), 0..8),
            offsets in proptest::collection::vec(-20isize..20, 1..10),
        ) {
            let mut reg = build(&rows);
            for offset in offsets {
                reg.move_by(offset);
                match reg.selected() {
                    Some(i) => prop_assert!(i < reg.len()),
                    None => prop_assert!(reg.is_empty()),
                }
            }
        }

        #[test]
        fn sort_preserves_selected_key(
            rows in proptest::collection::vec(arb_pane(), 1..8),
            pick in 0usize..8,
            flips in proptest::collection::vec(0usize..8, 0..6),
        ) {
            let mut reg = build(&rows);
            reg.move_by(pick as isize);
            let before = reg.selected_process().map(|p| p.key.clone());
            prop_assert!(before.is_some());
            for flip in flips {
                let key = format!("p{}", flip % rows.len());
                let dead = reg.panes().iter().find(|p| p.key == key).is_some_and(|p| p.dead);
                if dead { reg.mark_alive(&key) } else { reg.mark_dead(&key) }
                let after = reg.selected_process().map(|p| p.key.clone());
                prop_assert_eq!(&after, &before);
            }
        }

        #[test]
        fn sort_order_respects_precedence(rows in proptest::collection::vec(arb_pane(), 0..8)) {
            let reg = build(&rows);
            for pair in reg.panes().windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(!(a.killable && !b.killable));
                if a.killable == b.killable {
                    prop_assert!(!(a.dead && !b.dead));
                    if a.dead == b.dead {
                        prop_assert!(a.title.len() <= b.title.len());
                    }
                }
            }
        }
    }
}
