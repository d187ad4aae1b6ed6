/*
 * SPDX-FileCopyrightText: Copyright (c) 2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

//! Interactive line input. Completion is supplied per call by the caller, so
//! nothing about the current menu is kept between prompts.
//!
//! On a terminal, lines are edited in raw mode with [`TerminalLineReader`].
//! Anything else, like a pipe, is read line by line with [`StdinLineReader`].

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use pxe_config::BootMenu;

pub trait Completer {
    /// Candidates starting with `partial`.
    fn complete(&self, partial: &str) -> Vec<String>;
}

impl Completer for BootMenu {
    fn complete(&self, partial: &str) -> Vec<String> {
        BootMenu::complete(self, partial)
    }
}

pub trait LineReader {
    /// Reads one line without its line terminator. `None` on end of input.
    fn read_line(
        &mut self,
        prompt: &str,
        completer: Option<&dyn Completer>,
    ) -> io::Result<Option<String>>;

    /// Lets the operator edit `initial` and returns the result. Returns
    /// `initial` unchanged when the edit is aborted.
    fn edit_line(&mut self, prompt: &str, initial: &str) -> io::Result<String>;
}

/// The terminal reader if stdin is a terminal, the plain one otherwise.
pub fn stdio_reader() -> Box<dyn LineReader> {
    if io::stdin().is_terminal() {
        Box::new(TerminalLineReader::new())
    } else {
        Box::new(StdinLineReader::stdio())
    }
}

/// Longest prefix shared by all `words`.
pub fn common_prefix(words: &[String]) -> &str {
    let Some((first, rest)) = words.split_first() else {
        return "";
    };
    let mut len = first.len();
    for word in rest {
        len = first
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}

/// What a key press did to the line being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Continue,
    /// Tab found several completions. The line holds their common prefix.
    ShowMatches(Vec<String>),
    Accept(String),
    /// Ctrl-C, or Ctrl-D on an empty line.
    Abort,
}

/// A line with a cursor, changed by key events with the usual shell bindings.
#[derive(Debug, Clone, Default)]
pub struct LineEditor {
    line: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    /// Starts with `initial` and the cursor at its end.
    pub fn new(initial: &str) -> Self {
        let line: Vec<char> = initial.chars().collect();
        Self {
            cursor: line.len(),
            line,
        }
    }

    pub fn line(&self) -> String {
        self.line.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent, completer: Option<&dyn Completer>) -> EditAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => return EditAction::Abort,
            KeyCode::Char('d') if ctrl && self.line.is_empty() => return EditAction::Abort,
            KeyCode::Char('d') if ctrl => self.delete(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.line.len(),
            KeyCode::Char('b') if ctrl => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Char('f') if ctrl => self.cursor = (self.cursor + 1).min(self.line.len()),
            KeyCode::Char('u') if ctrl => {
                self.line.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Char('k') if ctrl => self.line.truncate(self.cursor),
            KeyCode::Char('w') if ctrl => self.delete_word(),
            // Swallow all other control keys.
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Char(c) => {
                self.line.insert(self.cursor, c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.line.remove(self.cursor);
                }
            }
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.line.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.line.len(),
            KeyCode::Tab => {
                if let Some(completer) = completer {
                    return self.complete(completer);
                }
            }
            KeyCode::Enter => return EditAction::Accept(self.line()),
            _ => {}
        }
        EditAction::Continue
    }

    fn delete(&mut self) {
        if self.cursor < self.line.len() {
            self.line.remove(self.cursor);
        }
    }

    fn delete_word(&mut self) {
        let mut start = self.cursor;
        while start > 0 && self.line[start - 1].is_whitespace() {
            start -= 1;
        }
        while start > 0 && !self.line[start - 1].is_whitespace() {
            start -= 1;
        }
        self.line.drain(start..self.cursor);
        self.cursor = start;
    }

    fn replace(&mut self, line: &str) {
        *self = Self::new(line);
    }

    fn complete(&mut self, completer: &dyn Completer) -> EditAction {
        let partial = self.line();
        let matches = completer.complete(&partial);
        tracing::trace!(partial, ?matches, "Completing");
        match matches.as_slice() {
            [] => EditAction::Continue,
            [only] => {
                self.replace(only);
                EditAction::Continue
            }
            _ => {
                let prefix = common_prefix(&matches).to_string();
                if prefix.chars().count() > self.line.len() {
                    self.replace(&prefix);
                }
                EditAction::ShowMatches(matches)
            }
        }
    }

    /// The part of the line that fits in `width` columns, and the cursor
    /// column within it. Long lines scroll so the cursor stays visible.
    pub fn view(&self, width: usize) -> (String, usize) {
        let width = width.max(1);
        let start = (self.cursor + 1).saturating_sub(width);
        let end = (start + width).min(self.line.len());
        (self.line[start..end].iter().collect(), self.cursor - start)
    }
}

/// Leaves raw mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "Unable to leave raw terminal mode");
        }
    }
}

/// Line reader for a terminal. The terminal is in raw mode only while a line
/// is read, and each key goes through a [`LineEditor`].
pub struct TerminalLineReader {
    output: Stdout,
}

impl Default for TerminalLineReader {
    fn default() -> Self {
        Self {
            output: io::stdout(),
        }
    }
}

impl TerminalLineReader {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&mut self, prompt: &str, editor: &LineEditor) -> io::Result<()> {
        let columns = terminal::size().map_or(80, |(columns, _)| usize::from(columns));
        let prompt_width = prompt.chars().count();
        let (text, cursor) = editor.view(columns.saturating_sub(prompt_width + 1));
        let column = u16::try_from(prompt_width + cursor).unwrap_or(u16::MAX);
        self.output
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?
            .queue(Print(prompt))?
            .queue(Print(text))?
            .queue(MoveToColumn(column))?;
        self.output.flush()
    }

    fn edit(
        &mut self,
        prompt: &str,
        mut editor: LineEditor,
        completer: Option<&dyn Completer>,
    ) -> io::Result<Option<String>> {
        let _raw_mode = RawMode::enable()?;
        self.render(prompt, &editor)?;

        loop {
            let key = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => key,
                Event::Resize(..) => {
                    self.render(prompt, &editor)?;
                    continue;
                }
                _ => continue,
            };

            match editor.handle_key(key, completer) {
                EditAction::Continue => {}
                EditAction::ShowMatches(matches) => {
                    self.output
                        .queue(Print("\r\n"))?
                        .queue(Print(matches.join("  ")))?
                        .queue(Print("\r\n"))?;
                }
                EditAction::Accept(line) => {
                    self.output.queue(Print("\r\n"))?.flush()?;
                    return Ok(Some(line));
                }
                EditAction::Abort => {
                    self.output.queue(Print("\r\n"))?.flush()?;
                    return Ok(None);
                }
            }
            self.render(prompt, &editor)?;
        }
    }
}

impl LineReader for TerminalLineReader {
    fn read_line(
        &mut self,
        prompt: &str,
        completer: Option<&dyn Completer>,
    ) -> io::Result<Option<String>> {
        self.edit(prompt, LineEditor::default(), completer)
    }

    fn edit_line(&mut self, prompt: &str, initial: &str) -> io::Result<String> {
        Ok(self
            .edit(prompt, LineEditor::new(initial), None)?
            .unwrap_or_else(|| initial.to_string()))
    }
}

/// Line reader on plain byte streams, for input that is not a terminal.
/// Typing a tab at the end of the line and pressing enter asks for completion:
/// a single match is filled in, several matches are listed and their common
/// prefix is filled in. Lines cannot be edited in place, so `edit_line` takes
/// a replacement and keeps the current value on a blank line.
pub struct StdinLineReader<R, W> {
    input: R,
    output: W,
}

impl StdinLineReader<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdinLineReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_raw(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

impl<R: BufRead, W: Write> LineReader for StdinLineReader<R, W> {
    fn read_line(
        &mut self,
        prompt: &str,
        completer: Option<&dyn Completer>,
    ) -> io::Result<Option<String>> {
        let mut filled = String::new();
        loop {
            write!(self.output, "{prompt}{filled}")?;
            self.output.flush()?;

            let Some(typed) = self.read_raw()? else {
                return Ok(None);
            };
            let line = format!("{filled}{typed}");

            let (Some(completer), Some(partial)) = (completer, line.strip_suffix('\t')) else {
                return Ok(Some(line));
            };

            let matches = completer.complete(partial);
            tracing::trace!(partial, ?matches, "Completing");
            filled = match matches.as_slice() {
                [] => partial.to_string(),
                [only] => only.clone(),
                _ => {
                    writeln!(self.output, "{}", matches.join("  "))?;
                    let prefix = common_prefix(&matches);
                    if prefix.len() > partial.len() {
                        prefix.to_string()
                    } else {
                        partial.to_string()
                    }
                }
            };
        }
    }

    fn edit_line(&mut self, prompt: &str, initial: &str) -> io::Result<String> {
        writeln!(self.output, "{prompt}{initial}")?;
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        Ok(match self.read_raw()? {
            Some(line) if !line.trim().is_empty() => line,
            _ => initial.to_string(),
        })
    }
}
