//! Byte cursor over one layer segment.
//!
//! Positions reported in faults are offsets into the whole identifier, so
//! every cursor remembers where its segment started.

use crate::inchi::error::Fault;
use crate::inchi::state::Encoding;
use crate::options::MAX_ATOMS;

#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    offset: usize,
    encoding: Encoding,
    /// 0-based component entry being read.
    component: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str, offset: usize, encoding: Encoding) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            offset,
            encoding,
            component: 0,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Absolute offset of the next byte.
    pub fn pos(&self) -> usize {
        self.offset + self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    pub fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, b: u8) -> Result<(), Fault> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Fault for the byte under the cursor, or for running off the end.
    pub fn unexpected(&self) -> Fault {
        match self.peek() {
            Some(b) => Fault::UnexpectedChar {
                pos: self.pos(),
                ch: b as char,
            },
            None => Fault::UnexpectedEnd { pos: self.pos() },
        }
    }

    /// Fail unless the whole segment has been consumed.
    pub fn finish(&self) -> Result<(), Fault> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Unread bytes.
    pub fn rest(&self) -> &'a str {
        // segments are split on ASCII separators, so any position is a
        // char boundary of the ASCII grammar we accept
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }

    /// A cursor over `len` bytes starting here; this cursor skips them.
    pub fn split(&mut self, len: usize) -> Cursor<'a> {
        let end = (self.pos + len).min(self.bytes.len());
        let sub = Cursor {
            bytes: &self.bytes[self.pos..end],
            pos: 0,
            offset: self.pos(),
            encoding: self.encoding,
            component: self.component,
        };
        self.pos = end;
        sub
    }

    pub fn component(&self) -> usize {
        self.component
    }

    pub fn set_component(&mut self, component: usize) {
        self.component = component;
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// Whether atom numbers here are alphabetic, judging by the next byte
    /// while the encoding is still open.
    pub fn alphabetic_mode(&self) -> bool {
        match self.encoding {
            Encoding::Alphabetic => true,
            Encoding::Decimal => false,
            Encoding::Undetermined => self.peek().is_some_and(|b| b.is_ascii_uppercase()),
        }
    }

    pub fn at_digit(&self) -> bool {
        self.peek().is_some_and(|b| b.is_ascii_digit())
    }

    /// Unsigned decimal numeral, bounded by [`MAX_ATOMS`].
    pub fn number(&mut self) -> Result<u32, Fault> {
        let start = self.pos();
        if !self.at_digit() {
            return Err(self.unexpected());
        }
        if self.peek() == Some(b'0') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            return Err(Fault::UnexpectedChar { pos: start, ch: '0' });
        }
        let mut value: u32 = 0;
        while let Some(b) = self.peek().filter(u8::is_ascii_digit) {
            value = value * 10 + (b - b'0') as u32;
            if value > MAX_ATOMS {
                return Err(Fault::NumberTooLarge { pos: start });
            }
            self.pos += 1;
        }
        Ok(value)
    }

    pub fn opt_number(&mut self) -> Result<Option<u32>, Fault> {
        if self.at_digit() {
            self.number().map(Some)
        } else {
            Ok(None)
        }
    }

    /// `+n` or `-n`; a bare sign means one.
    pub fn signed(&mut self) -> Result<i32, Fault> {
        let sign = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;
        Ok(sign * self.opt_number()?.unwrap_or(1) as i32)
    }

    /// Whether the next byte can begin an atom number.
    pub fn at_atom(&self) -> bool {
        match (self.encoding, self.peek()) {
            (_, None) => false,
            (Encoding::Decimal, Some(b)) => b.is_ascii_digit(),
            (Encoding::Alphabetic, Some(b)) => b.is_ascii_uppercase(),
            (Encoding::Undetermined, Some(b)) => b.is_ascii_digit() || b.is_ascii_uppercase(),
        }
    }

    /// Canonical atom number in the identifier's encoding, 1..=`count`.
    ///
    /// The first atom number read decides the encoding.
    pub fn atom(&mut self, count: u32) -> Result<u32, Fault> {
        let atom = self.raw_atom(false)?;
        check_atom(atom, count)
    }

    /// Like [`atom`](Self::atom), for an atom directly followed by a
    /// stereo parity character. In alphabetic encoding a trailing `u` may
    /// be either the last digit or the parity; it is the parity unless
    /// another parity character follows it.
    pub fn atom_before_parity(&mut self, count: u32) -> Result<u32, Fault> {
        let atom = self.raw_atom(true)?;
        check_atom(atom, count)
    }

    fn raw_atom(&mut self, parity_follows: bool) -> Result<u32, Fault> {
        let start = self.pos();
        let first = self.peek().ok_or(Fault::UnexpectedEnd { pos: start })?;
        let class = if first.is_ascii_digit() {
            Encoding::Decimal
        } else if first.is_ascii_uppercase() {
            Encoding::Alphabetic
        } else {
            return Err(self.unexpected());
        };
        match self.encoding {
            Encoding::Undetermined => self.encoding = class,
            e if e != class => return Err(Fault::EncodingMismatch { pos: start }),
            _ => {}
        }
        match class {
            Encoding::Alphabetic => self.alphabetic(parity_follows),
            _ => self.number(),
        }
    }

    fn alphabetic(&mut self, parity_follows: bool) -> Result<u32, Fault> {
        let start = self.pos();
        let mut end = self.pos + 1;
        while self
            .bytes
            .get(end)
            .is_some_and(|&b| b.is_ascii_lowercase() || b == b'@')
        {
            end += 1;
        }
        if parity_follows
            && end > self.pos + 1
            && self.bytes[end - 1] == b'u'
            && !self.bytes.get(end).copied().is_some_and(is_parity)
        {
            end -= 1;
        }
        let mut value: u32 = 0;
        for (i, &b) in self.bytes[self.pos..end].iter().enumerate() {
            let digit = match b {
                b'A'..=b'Z' if i == 0 => (b - b'A' + 1) as u32,
                b'a'..=b'z' => (b - b'a' + 1) as u32,
                _ => 0,
            };
            value = value * 27 + digit;
            if value > MAX_ATOMS {
                return Err(Fault::NumberTooLarge { pos: start });
            }
        }
        self.pos = end;
        Ok(value)
    }

    /// Atom list `a[-b](,a[-b])*` in decimal or `a[-b](a[-b])*` in
    /// alphabetic encoding. Stops before anything that cannot continue it.
    pub fn atom_ranges(&mut self, count: u32, into: &mut Vec<u32>) -> Result<(), Fault> {
        loop {
            let first = self.atom(count)?;
            if self.peek() == Some(b'-') && self.peek_at(1).is_some_and(|b| self.starts_atom(b)) {
                self.pos += 1;
                let pos = self.pos();
                let last = self.atom(count)?;
                if last <= first {
                    return Err(Fault::NotAscending { pos });
                }
                into.extend(first..=last);
            } else {
                into.push(first);
            }
            match self.encoding {
                Encoding::Alphabetic if self.at_atom() => continue,
                Encoding::Decimal
                    if self.peek() == Some(b',')
                        && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) =>
                {
                    self.pos += 1;
                }
                _ => return Ok(()),
            }
        }
    }

    fn starts_atom(&self, b: u8) -> bool {
        match self.encoding {
            Encoding::Alphabetic => b.is_ascii_uppercase(),
            _ => b.is_ascii_digit(),
        }
    }
}

pub(crate) fn is_parity(b: u8) -> bool {
    matches!(b, b'-' | b'+' | b'u' | b'?')
}

fn check_atom(atom: u32, count: u32) -> Result<u32, Fault> {
    if atom == 0 || atom > count {
        Err(Fault::AtomOutOfRange { atom, count })
    } else {
        Ok(atom)
    }
}

/// Alphabetic spelling of an atom number.
pub(crate) fn alphabetic(mut n: u32) -> String {
    let mut digits = Vec::new();
    while n >= 27 {
        digits.push(n % 27);
        n /= 27;
    }
    let mut out = String::with_capacity(digits.len() + 1);
    out.push((b'A' + n as u8 - 1) as char);
    for &d in digits.iter().rev() {
        out.push(if d == 0 { '@' } else { (b'a' + d as u8 - 1) as char });
    }
    out
}
