// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use smallvec::SmallVec;

/// Stdin hands out bytes in arbitrary chunks, so a multi-byte character can be split
/// across two reads. This holds the partial character between reads.
///
/// Malformed input never stops the stream: each bad sequence becomes one
/// [`char::REPLACEMENT_CHARACTER`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utf8UnitDecoder {
    pending: SmallVec<[u8; 4]>,
}

/// Encoded length announced by a lead byte, or `None` if it can't start a character.
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn is_continuation(byte: u8) -> bool { byte & 0b1100_0000 == 0b1000_0000 }

impl Utf8UnitDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn has_partial(&self) -> bool { !self.pending.is_empty() }

    /// Decode `bytes` and append the complete characters to `acc`.
    pub fn decode_into(&mut self, bytes: &[u8], acc: &mut Vec<char>) {
        for &byte in bytes {
            self.push_byte(byte, acc);
        }
    }

    /// A partial character at end of input is malformed.
    pub fn finish(&mut self, acc: &mut Vec<char>) {
        if self.has_partial() {
            self.pending.clear();
            acc.push(char::REPLACEMENT_CHARACTER);
        }
    }

    fn push_byte(&mut self, byte: u8, acc: &mut Vec<char>) {
        if let Some(&lead) = self.pending.first() {
            if is_continuation(byte) {
                self.pending.push(byte);
                if Some(self.pending.len()) == sequence_len(lead) {
                    let decoded = std::str::from_utf8(&self.pending)
                        .ok()
                        .and_then(|it| it.chars().next())
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    acc.push(decoded);
                    self.pending.clear();
                }
                return;
            }
            // Truncated sequence. `byte` starts something new.
            self.pending.clear();
            acc.push(char::REPLACEMENT_CHARACTER);
        }

        match sequence_len(byte) {
            Some(1) => acc.push(char::from(byte)),
            Some(_) => self.pending.push(byte),
            None => acc.push(char::REPLACEMENT_CHARACTER),
        }
    }
}
