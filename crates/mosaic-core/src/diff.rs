//! Line-granular frame diffing for in-place terminal redraws.
//!
//! A frame is a list of text lines. [`DiffRenderer::render`] assumes the
//! cursor sits on the last line of the previously rendered frame, walks back
//! up to its first line, and rewrites every line of the next frame in place.
//! Nothing is compared character by character: truncation is recomputed on
//! each call so a resize between renders never leaves stale cells behind.

use std::borrow::Cow;
use std::io::{self, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::style::ELLIPSIS;

/// How far a rendered line reaches to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extent {
    /// Up to the terminal edge; stale text is erased to end-of-line.
    Line,
    /// A fixed-width column region; lines are space padded so cells right
    /// of the region are never touched.
    Columns(u16),
}

#[derive(Debug, Clone)]
pub struct DiffRenderer {
    previous: Vec<String>,
    extent: Extent,
}

impl Default for DiffRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffRenderer {
    pub fn new() -> Self {
        Self {
            previous: Vec::new(),
            extent: Extent::Line,
        }
    }

    /// Renderer confined to the leftmost `width` columns.
    pub fn region(width: u16) -> Self {
        Self {
            previous: Vec::new(),
            extent: Extent::Columns(width),
        }
    }

    /// The last frame written.
    pub fn previous(&self) -> &[String] {
        &self.previous
    }

    /// Forget the previous frame without writing anything, e.g. after the
    /// whole screen was cleared by someone else.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Rewrite the previous frame as `next`.
    ///
    /// `width` is the terminal's current column count.
    pub fn render<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        width: u16,
        next: Vec<String>,
    ) -> io::Result<()> {
        let width = self.line_width(width);
        let mut buf: Vec<u8> = Vec::new();

        let old = self.previous.len();
        let surplus = old.saturating_sub(next.len());
        for i in 0..old {
            if i < surplus {
                self.erase_line(&mut buf, width)?;
            }
            if i + 1 < old {
                queue!(buf, MoveUp(1))?;
            }
        }

        for (i, line) in next.iter().enumerate() {
            if i == 0 {
                buf.push(b'\r');
            }
            let fitted = truncate(line, width, ELLIPSIS);
            buf.extend_from_slice(fitted.as_bytes());
            match self.extent {
                Extent::Line => queue!(buf, Clear(ClearType::UntilNewLine))?,
                Extent::Columns(_) => {
                    let fill = width.saturating_sub(visible_width(&fitted));
                    buf.extend(std::iter::repeat_n(b' ', fill));
                }
            }
            if i + 1 < next.len() {
                buf.extend_from_slice(b"\r\n");
            }
        }
        queue!(buf, MoveToColumn(0))?;

        out.write_all(&buf)?;
        out.flush()?;
        self.previous = next;
        Ok(())
    }

    /// Erase the previous frame and leave the cursor on its first line.
    pub fn clear<W: Write + ?Sized>(&mut self, out: &mut W, width: u16) -> io::Result<()> {
        let width = self.line_width(width);
        let mut buf: Vec<u8> = Vec::new();
        let old = self.previous.len();
        for i in 0..old {
            self.erase_line(&mut buf, width)?;
            if i + 1 < old {
                queue!(buf, MoveUp(1))?;
            }
        }
        queue!(buf, MoveToColumn(0))?;
        out.write_all(&buf)?;
        out.flush()?;
        self.previous.clear();
        Ok(())
    }

    fn line_width(&self, terminal_width: u16) -> usize {
        match self.extent {
            Extent::Line => terminal_width as usize,
            Extent::Columns(cols) => cols.min(terminal_width) as usize,
        }
    }

    fn erase_line(&self, buf: &mut Vec<u8>, width: usize) -> io::Result<()> {
        match self.extent {
            Extent::Line => queue!(buf, Clear(ClearType::CurrentLine)),
            Extent::Columns(_) => {
                buf.push(b'\r');
                buf.extend(std::iter::repeat_n(b' ', width));
                buf.push(b'\r');
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Width helpers
// ---------------------------------------------------------------------------

/// Byte length of the escape sequence at the start of `s` (which begins
/// with ESC). CSI sequences run to their final byte in `@..=~`.
fn escape_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.get(1) {
        Some(b'[') => bytes[2..]
            .iter()
            .position(|b| (0x40..=0x7e).contains(b))
            .map_or(bytes.len(), |p| p + 3),
        Some(_) => 1 + s[1..].chars().next().map_or(0, char::len_utf8),
        None => 1,
    }
}

/// Display width of `s`, ignoring escape sequences.
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut i = 0;
    while i < s.len() {
        let rest = &s[i..];
        if rest.starts_with('\x1b') {
            i += escape_len(rest);
            continue;
        }
        let Some(c) = rest.chars().next() else { break };
        width += c.width().unwrap_or(0);
        i += c.len_utf8();
    }
    width
}

/// Cut `line` to at most `width` display columns, ending in `tail` when
/// anything was dropped. Escape sequences pass through untouched; a cut
/// styled line gets a trailing SGR reset.
pub fn truncate<'a>(line: &'a str, width: usize, tail: &str) -> Cow<'a, str> {
    if visible_width(line) <= width {
        return Cow::Borrowed(line);
    }
    let tail_width = UnicodeWidthStr::width(tail);
    let (tail, budget) = if tail_width > width {
        ("", width)
    } else {
        (tail, width - tail_width)
    };

    let mut out = String::with_capacity(line.len());
    let mut used = 0;
    let mut styled = false;
    let mut i = 0;
    while i < line.len() {
        let rest = &line[i..];
        if rest.starts_with('\x1b') {
            let len = escape_len(rest);
            out.push_str(&rest[..len]);
            styled = true;
            i += len;
            continue;
        }
        let Some(c) = rest.chars().next() else { break };
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
        i += c.len_utf8();
    }
    out.push_str(tail);
    if styled {
        out.push_str("\x1b[0m");
    }
    Cow::Owned(out)
}

/// Make child output safe to paint inside a pane: tabs become spaces, SGR
/// (`ESC[...m`) styling is kept, every other escape sequence and control
/// character is dropped. OSC strings run to BEL or `ESC \\`.
pub fn sanitize(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut i = 0;
    while i < line.len() {
        let rest = &line[i..];
        if rest.starts_with("\x1b]") {
            let body = &rest[2..];
            let end = [
                body.find('\x07').map(|p| p + 1),
                body.find('\u{9c}').map(|p| p + '\u{9c}'.len_utf8()),
                body.find("\x1b\\").map(|p| p + 2),
            ]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(body.len());
            i += 2 + end;
            continue;
        }
        if rest.starts_with('\x1b') {
            let len = escape_len(rest);
            let seq = &rest[..len];
            if seq.starts_with("\x1b[") && seq.ends_with('m') {
                out.push_str(seq);
            }
            i += len;
            continue;
        }
        let Some(c) = rest.chars().next() else { break };
        match c {
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
        i += c.len_utf8();
    }
    out
}

/// Truncate and right-pad `line` to exactly `width` display columns.
pub fn fit(line: &str, width: usize) -> String {
    let fitted = truncate(line, width, ELLIPSIS);
    let fill = width.saturating_sub(visible_width(&fitted));
    let mut out = fitted.into_owned();
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::screen::Screen;
    use super::*;

    fn frame(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn render(renderer: &mut DiffRenderer, screen: &mut Screen, width: u16, lines: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        renderer.render(&mut out, width, frame(lines)).unwrap();
        screen.feed(&out);
        out
    }

    // -----------------------------------------------------------------------
    // render
    // -----------------------------------------------------------------------

    #[test]
    fn first_render_writes_all_lines() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["one", "two", "three"]);
        assert_eq!(screen.text(), frame(&["one", "two", "three"]));
        assert_eq!(screen.position(), (2, 0));
        assert_eq!(r.previous(), frame(&["one", "two", "three"]).as_slice());
    }

    #[test]
    fn rerender_starts_at_frame_top() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["a", "b", "c"]);
        render(&mut r, &mut screen, 80, &["x", "y", "z"]);
        assert_eq!(screen.text(), frame(&["x", "y", "z"]));
    }

    #[test]
    fn shorter_line_erases_stale_tail() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["hello world"]);
        render(&mut r, &mut screen, 80, &["hi"]);
        assert_eq!(screen.text(), frame(&["hi"]));
    }

    #[test]
    fn fewer_lines_erase_surplus() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["a", "b", "c", "d"]);
        render(&mut r, &mut screen, 80, &["x"]);
        assert_eq!(screen.text(), frame(&["x"]));
        assert_eq!(screen.position(), (0, 0));
    }

    #[test]
    fn empty_frame_erases_everything() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["a", "b"]);
        render(&mut r, &mut screen, 80, &[]);
        assert!(screen.text().is_empty());
        assert!(r.previous().is_empty());

        render(&mut r, &mut screen, 80, &["again"]);
        assert_eq!(screen.text(), frame(&["again"]));
    }

    #[test]
    fn growing_frame_appends_lines() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["a"]);
        render(&mut r, &mut screen, 80, &["a", "b", "c"]);
        assert_eq!(screen.text(), frame(&["a", "b", "c"]));
        assert_eq!(screen.position(), (2, 0));
    }

    #[test]
    fn same_frame_twice_is_idempotent() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["Creating  api", "Deploying"]);
        let first = screen.text();
        let bytes_a = render(&mut r, &mut screen, 80, &["Creating  api", "Deploying"]);
        let second = screen.text();
        let bytes_b = render(&mut r, &mut screen, 80, &["Creating  api", "Deploying"]);
        assert_eq!(first, second);
        assert_eq!(second, screen.text());
        assert!(!bytes_a.is_empty());
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn lines_are_truncated_to_width() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 5, &["abcdefgh", "abc"]);
        assert_eq!(screen.text(), frame(&["abcd…", "abc"]));
    }

    #[test]
    fn width_change_recomputes_truncation() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 5, &["abcdefgh"]);
        render(&mut r, &mut screen, 80, &["abcdefgh"]);
        assert_eq!(screen.text(), frame(&["abcdefgh"]));
    }

    #[test]
    fn clear_erases_and_forgets() {
        let mut r = DiffRenderer::new();
        let mut screen = Screen::new();
        render(&mut r, &mut screen, 80, &["a", "b", "c"]);
        let mut out = Vec::new();
        r.clear(&mut out, 80).unwrap();
        screen.feed(&out);
        assert!(screen.text().is_empty());
        assert_eq!(screen.position(), (0, 0));
        assert!(r.previous().is_empty());
    }

    #[test]
    fn region_mode_preserves_cells_to_the_right() {
        let mut screen = Screen::new();
        screen.feed(b"..........pane output\r\n..........more output");
        screen.feed(b"\x1b[1A\r");

        let mut r = DiffRenderer::region(10);
        render(&mut r, &mut screen, 80, &["api", "a very long title"]);
        assert_eq!(
            screen.text(),
            frame(&["api       pane output", "a very lo…more output"])
        );
    }

    #[test]
    fn region_mode_blanks_surplus_without_erasing_right_side() {
        let mut screen = Screen::new();
        let mut r = DiffRenderer::region(4);
        render(&mut r, &mut screen, 80, &["aaaa", "bbbb"]);
        screen.feed(b"\x1b[5GXY\r");
        render(&mut r, &mut screen, 80, &["cc"]);
        assert_eq!(screen.text(), frame(&["cc", "    XY"]));
    }

    // -----------------------------------------------------------------------
    // truncate / visible_width
    // -----------------------------------------------------------------------

    #[test]
    fn truncate_short_line_is_borrowed() {
        assert!(matches!(truncate("abc", 3, "…"), Cow::Borrowed("abc")));
    }

    #[test]
    fn truncate_keeps_escapes_and_resets() {
        let line = "\x1b[1mabcdef\x1b[0m";
        assert_eq!(visible_width(line), 6);
        assert_eq!(truncate(line, 4, "…"), "\x1b[1mabc…\x1b[0m");
    }

    #[test]
    fn truncate_wide_characters() {
        assert_eq!(visible_width("日本語"), 6);
        assert_eq!(truncate("日本語", 4, "…"), "日…");
    }

    #[test]
    fn truncate_to_zero_width() {
        assert_eq!(truncate("abc", 0, "…"), "");
    }

    #[test]
    fn sanitize_keeps_only_sgr() {
        assert_eq!(sanitize("\x1b[2J\x1b[1;1Hpwned"), "pwned");
        assert_eq!(sanitize("\x1b[31mred\x1b[0m"), "\x1b[31mred\x1b[0m");
        assert_eq!(sanitize("a\tb\r\x07"), "a    b");
        assert_eq!(sanitize("\x1b]0;title\x07done"), "done");
        assert_eq!(sanitize("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(sanitize("\x1b[?1049h\x1b7x\x1b[5;20r"), "x");
    }

    #[test]
    fn fit_pads_to_width() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }
}
