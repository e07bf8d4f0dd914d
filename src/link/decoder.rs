//! # Streaming Frame Decoder
//!
//! Reassembles frames from an arbitrary byte stream. A window is a candidate
//! frame when its first octet is an axis id the receiver accepts and its last
//! octet is the terminator.
//!
//! Negative values carry `0xFF` as their high octet, so a single candidate is
//! not proof of alignment. While searching, the decoder only locks on when
//! two candidates sit back to back. Once locked it reads fixed 4-octet frames
//! and drops back to searching on the first window that fails the check.

use bytes::{Buf, BytesMut};

use super::frame::{FRAME_LEN, FRAME_TERMINATOR};
use crate::event::Event;
use crate::profile::Profile;

/// Incremental decoder over received bytes
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    buffer: BytesMut,
    /// Restricts accepted axis ids; `None` accepts any id but `0xFF`.
    profile: Option<Profile>,
    locked: bool,
    discarded: u64,
}

impl FrameDecoder {
    /// Decoder that only accepts axis ids known to `profile`.
    pub fn new(profile: Profile) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64),
            profile: Some(profile),
            locked: false,
            discarded: 0,
        }
    }

    /// Decoder that accepts any axis id.
    pub fn permissive() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64),
            profile: None,
            locked: false,
            discarded: 0,
        }
    }

    /// Append received bytes.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete frame, or `None` until more bytes arrive.
    ///
    /// Before alignment is found the first frame is held back until the
    /// following one has arrived too.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_link::event::Event;
    /// use gamepad_link::link::decoder::FrameDecoder;
    ///
    /// let mut decoder = FrameDecoder::permissive();
    /// decoder.push(&[3, 1, 44, 0xFF]);
    /// assert_eq!(decoder.next_frame(), None);
    /// decoder.push(&[9, 0xFF, 0xD6, 0xFF]);
    /// assert_eq!(decoder.next_frame(), Some(Event::new(3, 300)));
    /// assert_eq!(decoder.next_frame(), Some(Event::new(9, -42)));
    /// ```
    pub fn next_frame(&mut self) -> Option<Event> {
        loop {
            if self.locked {
                if self.buffer.len() < FRAME_LEN {
                    return None;
                }
                if self.is_frame_at(0) {
                    return Some(self.take_frame());
                }
                self.locked = false;
            }

            if self.buffer.len() < 2 * FRAME_LEN {
                return None;
            }
            if self.is_frame_at(0) && self.is_frame_at(FRAME_LEN) {
                self.locked = true;
                continue;
            }
            self.buffer.advance(1);
            self.discarded += 1;
        }
    }

    /// Drain every complete frame currently buffered.
    pub fn frames(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Bytes thrown away while searching for frame alignment.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes waiting for the rest of their frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether frame alignment has been established.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn take_frame(&mut self) -> Event {
        let frame = self.buffer.split_to(FRAME_LEN);
        Event::new(frame[0], i16::from_be_bytes([frame[1], frame[2]]))
    }

    fn is_frame_at(&self, offset: usize) -> bool {
        let axis = self.buffer[offset];
        if axis == FRAME_TERMINATOR || self.buffer[offset + FRAME_LEN - 1] != FRAME_TERMINATOR {
            return false;
        }
        match &self.profile {
            Some(profile) => profile.is_known_axis(axis),
            None => true,
        }
    }
}
