//! Extended Inquiry Response (EIR) codec
//!
//! EIR data is a sequence of `[length][type][data...]` structures where `length` counts
//! the type byte plus the data. A zero length byte terminates the sequence. A structure
//! whose declared length runs past the end of the buffer is malformed; parsing stops
//! there and everything before it is still honoured. None of the functions here fail on
//! bad input.

/// EIR data type: shortened local name
pub const EIR_SHORT_NAME: u8 = 0x08;

/// EIR data type: complete local name
pub const EIR_COMPLETE_NAME: u8 = 0x09;

/// One well-formed EIR structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EirStructure<'a> {
    /// EIR data type
    pub data_type: u8,
    /// Payload following the type byte (may be empty)
    pub data: &'a [u8],
}

/// Iterator over the well-formed structures of an EIR buffer
#[derive(Debug, Clone)]
pub struct EirStructures<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for EirStructures<'a> {
    type Item = EirStructure<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (len, data_type, rest) = match self.remaining {
            [0, ..] | [] | [_] => return None,
            [len, data_type, rest @ ..] => (usize::from(*len), *data_type, rest),
        };

        if len > self.remaining.len() - 1 {
            self.remaining = &[];
            return None;
        }

        let (data, tail) = rest.split_at(len - 1);
        self.remaining = tail;
        Some(EirStructure { data_type, data })
    }
}

/// Iterate over the well-formed structures of `eir`
#[must_use]
pub fn structures(eir: &[u8]) -> EirStructures<'_> {
    EirStructures { remaining: eir }
}

/// Check whether `eir` carries a non-empty short or complete name
#[must_use]
pub fn has_name(eir: &[u8]) -> bool {
    structures(eir).any(|s| is_name_type(s.data_type) && !s.data.is_empty())
}

/// Get the device name carried in `eir`, preferring the complete name
#[must_use]
pub fn name(eir: &[u8]) -> Option<&[u8]> {
    let mut short = None;
    for s in structures(eir) {
        match s.data_type {
            EIR_COMPLETE_NAME if !s.data.is_empty() => return Some(s.data),
            EIR_SHORT_NAME if !s.data.is_empty() && short.is_none() => short = Some(s.data),
            _ => {}
        }
    }
    short
}

/// Append a shortened-name structure at the first terminator of `eir`
///
/// `name` is taken up to its first NUL byte (or its full length) and silently truncated
/// to the space left after the terminator. Returns `false` and leaves `eir` untouched
/// when no terminator is found within bounds or fewer than two bytes remain there.
pub fn synthesize_short_name(eir: &mut [u8], name: &[u8]) -> bool {
    let Some(offset) = terminator_offset(eir) else {
        return false;
    };

    let name = until_nul(name);
    let space = eir.len() - offset - 2;
    let copy_len = name.len().min(space);
    let Ok(len_byte) = u8::try_from(copy_len + 1) else {
        return false;
    };

    eir[offset] = len_byte;
    eir[offset + 1] = EIR_SHORT_NAME;
    eir[offset + 2..offset + 2 + copy_len].copy_from_slice(&name[..copy_len]);
    true
}

/// Offset of the first terminator with at least two bytes left, if any
fn terminator_offset(eir: &[u8]) -> Option<usize> {
    let mut offset = 0;
    loop {
        let remaining = eir.len() - offset;
        if remaining < 2 {
            return None;
        }

        let len = usize::from(eir[offset]);
        if len == 0 {
            return Some(offset);
        }
        if len > remaining - 1 {
            return None;
        }
        offset += len + 1;
    }
}

fn is_name_type(data_type: u8) -> bool {
    matches!(data_type, EIR_SHORT_NAME | EIR_COMPLETE_NAME)
}

fn until_nul(bytes: &[u8]) -> &[u8] {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..len]
}
