use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{anyhow, bail};
use bytedit_buffer::{parse_needle, unhex, Buffer, Direction, PasteMode};
use bytedit_utils::sat;

const DEFAULT_DUMP_LEN: u64 = 64;
const DUMP_WIDTH: usize = 16;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Goto(u64),
    Forward(u64),
    Back(u64),
    Overwrite(Vec<u8>),
    Insert(Vec<u8>),
    Delete(u64),
    Yank(u64),
    Paste(PasteMode),
    Undo,
    Redo,
    Search(Vec<u8>),
    Next(Direction),
    Dump(u64),
    Write(Option<PathBuf>),
    WriteQuit(Option<PathBuf>),
    Quit { force: bool },
    Info,
}

impl Command {
    /// Parse a command line, empty lines are `None`
    pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, arg) = match line.strip_prefix('/') {
            Some(rest) => ("/", rest.trim()),
            None => match line.split_once(char::is_whitespace) {
                Some((name, arg)) => (name, arg.trim()),
                None => (line, ""),
            },
        };

        let count = |default: u64| {
            if arg.is_empty() {
                Ok(default)
            } else {
                parse_offset(arg)
            }
        };
        let path = || (!arg.is_empty()).then(|| PathBuf::from(arg));

        let cmd = match name {
            "g" => Command::Goto(parse_offset(arg)?),
            "+" => Command::Forward(count(1)?),
            "-" => Command::Back(count(1)?),
            "o" => Command::Overwrite(unhex(arg)?),
            "i" => Command::Insert(unhex(arg)?),
            "x" => Command::Delete(count(1)?),
            "y" => Command::Yank(count(1)?),
            "p" => Command::Paste(PasteMode::Overwrite),
            "P" => Command::Paste(PasteMode::Insert),
            "u" => Command::Undo,
            "r" => Command::Redo,
            "/" => Command::Search(parse_needle(arg)?),
            "n" => Command::Next(Direction::Forward),
            "N" => Command::Next(Direction::Backward),
            "d" => Command::Dump(count(DEFAULT_DUMP_LEN)?),
            "w" => Command::Write(path()),
            "wq" => Command::WriteQuit(path()),
            "q" => Command::Quit { force: false },
            "q!" => Command::Quit { force: true },
            "info" => Command::Info,
            _ => bail!("unknown command: {name}"),
        };

        Ok(Some(cmd))
    }
}

/// Parse an offset given as hex with `0x`, octal with a leading zero or
/// decimal.
pub(crate) fn parse_offset(s: &str) -> anyhow::Result<u64> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8)
    } else {
        s.parse::<u64>()
    };

    parsed.map_err(|e| anyhow!("invalid offset {s:?}: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Continue,
    Quit,
}

/// Line oriented editing session over a single buffer
#[derive(Debug)]
pub(crate) struct Session {
    buf: Buffer,
    /// Cursor is kept in `0..=len` so that bytes can be appended
    cursor: u64,
    needle: Option<Vec<u8>>,
}

impl Session {
    pub fn new(buf: Buffer) -> Session {
        Session {
            buf,
            cursor: 0,
            needle: None,
        }
    }

    /// Execute commands from `input` until it ends or a quit command
    /// succeeds. Failed commands print their error and the session goes on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let result = Command::parse(&line).and_then(|cmd| match cmd {
                Some(cmd) => self.execute(cmd, &mut out),
                None => Ok(Outcome::Continue),
            });

            match result {
                Ok(Outcome::Quit) => break,
                Ok(Outcome::Continue) => {}
                Err(e) => {
                    log::debug!("{line:?} failed: {e}");
                    writeln!(out, "{e}")?;
                }
            }

            out.flush()?;
        }

        Ok(())
    }

    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> anyhow::Result<Outcome> {
        match cmd {
            Command::Goto(offset) => self.cursor = sat::clamp(offset, 0, self.buf.len()),
            Command::Forward(n) => self.advance(n),
            Command::Back(n) => self.cursor = sat::satsub(self.cursor, n, 0),
            Command::Overwrite(bytes) => {
                self.buf.replace_at(self.cursor, &bytes, true)?;
                self.advance(bytes.len() as u64);
            }
            Command::Insert(bytes) => {
                self.buf.insert_at(self.cursor, &bytes, true)?;
                self.advance(bytes.len() as u64);
            }
            Command::Delete(n) => self.buf.delete_at(self.cursor, n, true)?,
            Command::Yank(n) => {
                self.buf.yank(self.cursor, n)?;
                writeln!(out, "yanked {n} bytes")?;
            }
            Command::Paste(mode) => {
                let n = self.buf.paste(self.cursor, mode)?;
                self.advance(n);
                writeln!(out, "pasted {n} bytes")?;
            }
            Command::Undo => match self.buf.undo()? {
                Some(pos) => self.jump(pos, out)?,
                None => writeln!(out, "nothing to undo")?,
            },
            Command::Redo => match self.buf.redo()? {
                Some(pos) => self.jump(pos, out)?,
                None => writeln!(out, "nothing to redo")?,
            },
            Command::Search(needle) => {
                let found = self.buf.search_next(&needle, self.cursor, Direction::Forward);
                self.needle = Some(needle);
                self.found(found, out)?;
            }
            Command::Next(dir) => {
                let needle = self
                    .needle
                    .as_deref()
                    .ok_or_else(|| anyhow!("no search pattern"))?;
                let found = self.buf.search_next(needle, self.cursor, dir);
                self.found(found, out)?;
            }
            Command::Dump(n) => self.dump(n, out)?,
            Command::Write(path) => self.save(path, out)?,
            Command::WriteQuit(path) => {
                self.save(path, out)?;
                return Ok(Outcome::Quit);
            }
            Command::Quit { force } => {
                if !force && !self.buf.is_saved() {
                    bail!("unsaved changes, use q! to quit anyway");
                }

                return Ok(Outcome::Quit);
            }
            Command::Info => self.info(out)?,
        }

        Ok(Outcome::Continue)
    }

    fn advance(&mut self, n: u64) {
        self.cursor = sat::satadd(self.cursor, n, self.buf.len() + 1);
    }

    fn jump<W: Write>(&mut self, pos: u64, out: &mut W) -> io::Result<()> {
        self.cursor = sat::clamp(pos, 0, self.buf.len());
        writeln!(out, "at {:#x}", self.cursor)
    }

    fn found<W: Write>(&mut self, found: Option<u64>, out: &mut W) -> io::Result<()> {
        match found {
            Some(pos) => self.jump(pos, out),
            None => writeln!(out, "pattern not found"),
        }
    }

    fn save<W: Write>(&mut self, path: Option<PathBuf>, out: &mut W) -> anyhow::Result<()> {
        self.buf.save(path.as_deref())?;
        let name = self
            .buf
            .filename()
            .map(|name| name.display().to_string())
            .unwrap_or_default();
        writeln!(out, "saved {name}, {} bytes", self.buf.len())?;
        Ok(())
    }

    /// Hexdump `n` bytes from the cursor, modified bytes are followed by `*`
    fn dump<W: Write>(&self, n: u64, out: &mut W) -> io::Result<()> {
        let start = self.cursor;
        let end = start.saturating_add(n).min(self.buf.len());
        let bytes = &self.buf.lookup(start)[..end.saturating_sub(start) as usize];

        for (row, chunk) in bytes.chunks(DUMP_WIDTH).enumerate() {
            let offset = start + (row * DUMP_WIDTH) as u64;
            write!(out, "{offset:08x} ")?;

            for (i, byte) in chunk.iter().enumerate() {
                let mark = if self.buf.is_modified_at(offset + i as u64) {
                    '*'
                } else {
                    ' '
                };
                write!(out, " {byte:02x}{mark}")?;
            }

            for _ in chunk.len()..DUMP_WIDTH {
                write!(out, "    ")?;
            }

            let text: String = chunk
                .iter()
                .map(|&b| {
                    if b.is_ascii_graphic() || b == b' ' {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            writeln!(out, "  |{text}|")?;
        }

        Ok(())
    }

    fn info<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let backing = if self.buf.is_file_backed() {
            "mapped"
        } else {
            "memory"
        };
        let state = if self.buf.is_saved() {
            "saved"
        } else {
            "modified"
        };
        let name = self
            .buf
            .filename()
            .map(|name| name.display().to_string())
            .unwrap_or_else(|| "[no name]".to_string());

        writeln!(
            out,
            "{name}: {} bytes, {backing}, {state}, cursor {:#x}",
            self.buf.len(),
            self.cursor
        )
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    fn run(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn offsets() {
        assert_eq!(255, parse_offset("0xff").unwrap());
        assert_eq!(255, parse_offset("0XFF").unwrap());
        assert_eq!(8, parse_offset("010").unwrap());
        assert_eq!(0, parse_offset("0").unwrap());
        assert_eq!(42, parse_offset("42").unwrap());
        assert!(parse_offset("09").is_err());
        assert!(parse_offset("abc").is_err());
        assert!(parse_offset("").is_err());
    }

    #[test]
    fn parse_commands() {
        assert_eq!(None, Command::parse("   ").unwrap());
        assert_eq!(Some(Command::Goto(16)), Command::parse("g 0x10").unwrap());
        assert_eq!(Some(Command::Delete(1)), Command::parse("x").unwrap());
        assert_eq!(Some(Command::Dump(64)), Command::parse("d").unwrap());
        assert_eq!(
            Some(Command::Insert(vec![0xde, 0xad])),
            Command::parse("i de ad").unwrap()
        );
        assert_eq!(
            Some(Command::Search(b"abc".to_vec())),
            Command::parse("/s abc").unwrap()
        );
        assert_eq!(
            Some(Command::Write(Some(PathBuf::from("out.bin")))),
            Command::parse("w out.bin").unwrap()
        );
        assert_eq!(Some(Command::Write(None)), Command::parse("w").unwrap());
        assert_eq!(
            Some(Command::Quit { force: true }),
            Command::parse("q!").unwrap()
        );
        assert!(Command::parse("zz").is_err());
        assert!(Command::parse("o").is_err());
        assert!(Command::parse("g").is_err());
    }

    #[test]
    fn edit_and_undo() {
        let mut session = Session::new(Buffer::from_bytes("hello"));
        let out = run(&mut session, "g 5\ni 2121\ng 0\no 48\nu\nq!\n");
        assert_eq!("at 0x0\n", out);
        assert_eq!(b"hello!!", session.buf.lookup(0));
        assert_eq!(0, session.cursor);
    }

    #[test]
    fn cursor_is_clamped() {
        let mut session = Session::new(Buffer::from_bytes("abc"));
        run(&mut session, "g 100\n");
        assert_eq!(3, session.cursor);
        run(&mut session, "- 10\n");
        assert_eq!(0, session.cursor);
        run(&mut session, "+ 2\n+ 5\n");
        assert_eq!(3, session.cursor);
    }

    #[test]
    fn yank_and_paste() {
        let mut session = Session::new(Buffer::from_bytes("abcdef"));
        let out = run(&mut session, "y 3\ng 4\np\n");
        assert_eq!("yanked 3 bytes\npasted 2 bytes\n", out);
        assert_eq!(b"abcdab", session.buf.lookup(0));
        assert_eq!(6, session.cursor);

        run(&mut session, "g 0\nP\n");
        assert_eq!(b"abcabcdab", session.buf.lookup(0));
        assert_eq!(3, session.cursor);
    }

    #[test]
    fn search_and_next() {
        let mut session = Session::new(Buffer::from_bytes("abXabXab"));
        // A match at the cursor is skipped
        let out = run(&mut session, "/s ab\nn\nn\nn\nN\n");
        assert_eq!("at 0x3\nat 0x6\nat 0x0\nat 0x3\nat 0x0\n", out);

        let out = run(&mut session, "/zz\n");
        assert_eq!("pattern not found\n", out);

        let mut session = Session::new(Buffer::from_bytes("abc"));
        assert_eq!("no search pattern\n", run(&mut session, "n\n"));
    }

    #[test]
    fn errors_keep_session_going() {
        let mut session = Session::new(Buffer::from_bytes("abc"));
        let out = run(&mut session, "x 5\nfoo\nx\ninfo\n");
        assert_eq!(
            "out of bounds: 5 bytes at 0 exceed buffer length 3\n\
             unknown command: foo\n\
             [no name]: 2 bytes, memory, modified, cursor 0x0\n",
            out
        );
    }

    #[test]
    fn quit_refuses_unsaved() {
        let mut session = Session::new(Buffer::from_bytes("abc"));
        let out = run(&mut session, "x\nq\ninfo\n");
        assert!(out.starts_with("unsaved changes"));
        assert!(out.ends_with("modified, cursor 0x0\n"));

        // Input after a successful quit is not executed
        let out = run(&mut session, "q!\ninfo\n");
        assert_eq!("", out);
    }

    #[test]
    fn dump_marks_modified() {
        let mut session = Session::new(Buffer::from_bytes("ab\x00"));
        let out = run(&mut session, "o 41\ng 0\nd\n");
        assert_eq!(
            format!("00000000  41* 62  00 {}  |Ab.|\n", "    ".repeat(13)),
            out
        );
    }

    #[test]
    fn write_and_quit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut session = Session::new(Buffer::from_bytes("abc"));

        let out = run(&mut session, "w\n");
        assert_eq!("can't save: no filename.\n", out);

        let script = format!("o 7a\nwq {}\ninfo\n", path.display());
        let out = run(&mut session, &script);
        assert_eq!(format!("saved {}, 3 bytes\n", path.display()), out);
        assert_eq!(b"zbc", fs::read(&path).unwrap().as_slice());
        assert!(session.buf.is_saved());
    }
}
