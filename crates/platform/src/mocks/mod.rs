//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]
#![allow(clippy::cast_possible_truncation, clippy::missing_panics_doc)]

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use embedded_graphics::{pixelcolor::Rgb565, prelude::*};

use crate::decoder::{DecoderError, DecoderLink, MAX_TRANSFER_SIZE};
use crate::display::{DisplaySurface, Icon, IconStyle, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::input::{TouchCalibration, TouchPanel};
use crate::storage::{file_name, DirEntry, Directory, File, Storage, StorageError};
use crate::vs1053::{SCI_MODE, SCI_STATUS, SCI_WRAM, SCI_WRAMADDR, SM_CANCEL, SM_RESET};

// ── Decoder ─────────────────────────────────────────────────────────────────

/// Register-level VS1053 model.
///
/// SCI registers are plain storage with a few behaviours layered on top:
/// - `SM_RESET` clears itself as soon as it is written
/// - `SM_CANCEL` clears itself on the k-th `SCI_MODE` read after it was set
///   (see [`cancel_ack_after`](Self::cancel_ack_after)), or never
/// - `SCI_WRAM` reads and writes go to a parameter map at the address in
///   `SCI_WRAMADDR`, which auto-increments
pub struct MockDecoder {
    regs: [u16; 16],
    sticky: [Option<u16>; 16],
    params: HashMap<u16, u16>,
    wram_addr: u16,
    control_writes: Vec<(u8, u16)>,
    audio: Vec<u8>,
    chunk_lens: Vec<usize>,
    cancel_ack_after: Option<u32>,
    cancel_reads_left: Option<u32>,
    mode_reads: u32,
    mode_reads_with_cancel: u32,
    fail_audio_after: Option<usize>,
    unresponsive: bool,
    decode_time_every: Option<usize>,
    bytes_since_tick: usize,
}

impl MockDecoder {
    /// A freshly reset VS1053 that acknowledges cancel on the first poll.
    pub fn new() -> Self {
        let mut regs = [0u16; 16];
        regs[usize::from(SCI_STATUS)] = 0x0040;
        Self {
            regs,
            sticky: [None; 16],
            params: HashMap::new(),
            wram_addr: 0,
            control_writes: Vec::new(),
            audio: Vec::new(),
            chunk_lens: Vec::new(),
            cancel_ack_after: Some(1),
            cancel_reads_left: None,
            mode_reads: 0,
            mode_reads_with_cancel: 0,
            fail_audio_after: None,
            unresponsive: false,
            decode_time_every: None,
            bytes_since_tick: 0,
        }
    }

    /// Clear `SM_CANCEL` on the `k`-th mode read after it is set;
    /// `None` keeps it set forever.
    pub fn cancel_ack_after(mut self, k: Option<u32>) -> Self {
        self.cancel_ack_after = k;
        self
    }

    /// Fail every audio write after `chunks` successful ones.
    pub fn fail_audio_after(mut self, chunks: usize) -> Self {
        self.fail_audio_after = Some(chunks);
        self
    }

    /// Advance `SCI_DECODE_TIME` by one second every `bytes` audio bytes.
    pub fn decode_time_every(mut self, bytes: usize) -> Self {
        self.decode_time_every = Some(bytes);
        self
    }

    /// Make every transaction fail with [`DecoderError::Unresponsive`].
    pub fn set_unresponsive(&mut self, unresponsive: bool) {
        self.unresponsive = unresponsive;
    }

    /// Current value of an SCI register.
    pub fn register(&self, addr: u8) -> u16 {
        self.regs[usize::from(addr & 0x0F)]
    }

    /// Preload an SCI register without logging a write.
    pub fn set_register(&mut self, addr: u8, value: u16) {
        self.regs[usize::from(addr & 0x0F)] = value;
    }

    /// Make a register read back `value` regardless of what is written.
    pub fn stick_register(&mut self, addr: u8, value: u16) {
        self.sticky[usize::from(addr & 0x0F)] = Some(value);
    }

    /// Current value of a parameter-memory word (0 if never written).
    pub fn parameter(&self, addr: u16) -> u16 {
        self.params.get(&addr).copied().unwrap_or(0)
    }

    /// Preload a parameter-memory word.
    pub fn set_parameter(&mut self, addr: u16, value: u16) {
        self.params.insert(addr, value);
    }

    /// Every SCI write in order, including `SCI_WRAMADDR`/`SCI_WRAM`.
    pub fn control_writes(&self) -> &[(u8, u16)] {
        &self.control_writes
    }

    /// Values written to one SCI register, in order.
    pub fn writes_to(&self, addr: u8) -> Vec<u16> {
        self.control_writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Values written to one parameter-memory word, in order.
    pub fn parameter_writes(&self, addr: u16) -> Vec<u16> {
        self.control_writes
            .windows(2)
            .filter(|w| w[0] == (SCI_WRAMADDR, addr) && w[1].0 == SCI_WRAM)
            .map(|w| w[1].1)
            .collect()
    }

    /// Every audio byte received, concatenated.
    pub fn audio(&self) -> &[u8] {
        &self.audio
    }

    /// Length of every audio chunk received.
    pub fn chunk_lens(&self) -> &[usize] {
        &self.chunk_lens
    }

    /// Total `SCI_MODE` reads.
    pub fn mode_reads(&self) -> u32 {
        self.mode_reads
    }

    /// `SCI_MODE` reads that happened while `SM_CANCEL` was set.
    pub fn cancel_polls(&self) -> u32 {
        self.mode_reads_with_cancel
    }

    fn check(&self) -> Result<(), DecoderError> {
        if self.unresponsive {
            return Err(DecoderError::Unresponsive);
        }
        Ok(())
    }
}

impl Default for MockDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderLink for MockDecoder {
    fn write_control(&mut self, addr: u8, value: u16) -> Result<(), DecoderError> {
        self.check()?;
        self.control_writes.push((addr, value));
        match addr {
            SCI_WRAMADDR => self.wram_addr = value,
            SCI_WRAM => {
                self.params.insert(self.wram_addr, value);
                self.wram_addr = self.wram_addr.wrapping_add(1);
            }
            SCI_MODE => {
                let was_cancel = self.regs[usize::from(SCI_MODE)] & SM_CANCEL != 0;
                if value & SM_CANCEL != 0 && !was_cancel {
                    self.cancel_reads_left = self.cancel_ack_after;
                }
                self.regs[usize::from(SCI_MODE)] = value & !SM_RESET;
            }
            _ => self.regs[usize::from(addr & 0x0F)] = value,
        }
        Ok(())
    }

    fn read_control(&mut self, addr: u8) -> Result<u16, DecoderError> {
        self.check()?;
        let idx = usize::from(addr & 0x0F);
        if let Some(value) = self.sticky[idx] {
            return Ok(value);
        }
        match addr {
            SCI_WRAM => {
                let value = self.parameter(self.wram_addr);
                self.wram_addr = self.wram_addr.wrapping_add(1);
                Ok(value)
            }
            SCI_MODE => {
                self.mode_reads += 1;
                let mode = self.regs[idx];
                if mode & SM_CANCEL != 0 {
                    self.mode_reads_with_cancel += 1;
                    if let Some(left) = self.cancel_reads_left.as_mut() {
                        *left = left.saturating_sub(1);
                        if *left == 0 {
                            self.cancel_reads_left = None;
                            self.regs[idx] = mode & !SM_CANCEL;
                        }
                    }
                }
                Ok(self.regs[idx])
            }
            _ => Ok(self.regs[idx]),
        }
    }

    fn write_audio(&mut self, chunk: &[u8]) -> Result<(), DecoderError> {
        self.check()?;
        if chunk.len() > MAX_TRANSFER_SIZE {
            return Err(DecoderError::TransferTooLarge(chunk.len()));
        }
        if self.fail_audio_after.is_some_and(|n| self.chunk_lens.len() >= n) {
            return Err(DecoderError::Bus);
        }
        self.audio.extend_from_slice(chunk);
        self.chunk_lens.push(chunk.len());
        if let Some(every) = self.decode_time_every {
            self.bytes_since_tick += chunk.len();
            while self.bytes_since_tick >= every {
                self.bytes_since_tick -= every;
                let t = &mut self.regs[usize::from(crate::vs1053::SCI_DECODE_TIME)];
                *t = t.wrapping_add(1);
            }
        }
        Ok(())
    }
}

// ── Storage ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MockCard {
    files: BTreeMap<String, Vec<u8>>,
    reported_size: HashMap<String, u64>,
    fail_at: HashMap<String, u64>,
    dirs: BTreeMap<String, Vec<DirEntry>>,
}

/// Counters and card presence shared between a [`MockStorage`] and the
/// handles it opened.
struct Shared {
    present: Cell<bool>,
    reads_until_removal: Cell<Option<usize>>,
    reads: Cell<usize>,
    dir_opens: Cell<usize>,
}

/// In-memory card with a directory tree.
///
/// Non-root directories list `.` and `..` first, then entries in the order
/// they were added.
pub struct MockStorage {
    card: MockCard,
    shared: Rc<Shared>,
}

impl MockStorage {
    /// An inserted, empty card.
    pub fn new() -> Self {
        let mut card = MockCard::default();
        card.dirs.insert(String::from("/"), Vec::new());
        Self {
            card,
            shared: Rc::new(Shared {
                present: Cell::new(true),
                reads_until_removal: Cell::new(None),
                reads: Cell::new(0),
                dir_opens: Cell::new(0),
            }),
        }
    }

    fn split(path: &str) -> (&str, &str) {
        match path.rfind('/') {
            Some(0) => ("/", &path[1..]),
            Some(i) => (&path[..i], &path[i + 1..]),
            None => ("/", path),
        }
    }

    fn ensure_dir(&mut self, path: &str) {
        if self.card.dirs.contains_key(path) {
            return;
        }
        let (parent, name) = Self::split(path);
        self.ensure_dir(parent);
        let mut listing = Vec::new();
        for dot in [".", ".."] {
            if let Ok(name) = file_name(dot) {
                listing.push(DirEntry { name, is_dir: true });
            }
        }
        self.card.dirs.insert(String::from(path), listing);
        if let (Some(entries), Ok(name)) = (self.card.dirs.get_mut(parent), file_name(name)) {
            entries.push(DirEntry { name, is_dir: true });
        }
    }

    /// Add a directory (and its parents).
    pub fn with_dir(mut self, path: &str) -> Self {
        self.ensure_dir(path);
        self
    }

    /// Add a file (creating parent directories).
    pub fn with_file(mut self, path: &str, data: &[u8]) -> Self {
        let (parent, name) = Self::split(path);
        self.ensure_dir(parent);
        if let (Some(entries), Ok(name)) = (self.card.dirs.get_mut(parent), file_name(name)) {
            entries.push(DirEntry { name, is_dir: false });
        }
        self.card.files.insert(String::from(path), data.to_vec());
        self
    }

    /// Make `size()` report `size` for `path` while the data stays shorter.
    pub fn with_reported_size(mut self, path: &str, size: u64) -> Self {
        self.card.reported_size.insert(String::from(path), size);
        self
    }

    /// Fail reads of `path` with [`StorageError::Io`] once the read position
    /// reaches `offset`.
    pub fn with_read_failure(mut self, path: &str, offset: u64) -> Self {
        self.card.fail_at.insert(String::from(path), offset);
        self
    }

    /// Pull the card during the `n`-th file read from now.
    pub fn remove_after_reads(&self, n: usize) {
        self.shared.reads_until_removal.set(Some(n));
    }

    /// Insert or pull the card.
    pub fn set_present(&self, present: bool) {
        self.shared.present.set(present);
    }

    /// A handle that can pull the card after the storage was moved away.
    pub fn slot(&self) -> MockCardSlot {
        MockCardSlot { shared: Rc::clone(&self.shared) }
    }

    /// Number of `open_dir` calls so far.
    pub fn dir_opens(&self) -> usize {
        self.shared.dir_opens.get()
    }

    /// Number of file reads so far.
    pub fn reads(&self) -> usize {
        self.shared.reads.get()
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// The card slot of a [`MockStorage`], shared with it.
pub struct MockCardSlot {
    shared: Rc<Shared>,
}

impl MockCardSlot {
    /// Insert or pull the card.
    pub fn set_present(&self, present: bool) {
        self.shared.present.set(present);
    }
}

/// File handle opened from a [`MockStorage`].
pub struct MockFile {
    data: Vec<u8>,
    size: u64,
    pos: u64,
    fail_at: Option<u64>,
    shared: Rc<Shared>,
}

impl File for MockFile {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        self.shared.reads.set(self.shared.reads.get() + 1);
        if let Some(left) = self.shared.reads_until_removal.get() {
            if left <= 1 {
                self.shared.reads_until_removal.set(None);
                self.shared.present.set(false);
                return Err(StorageError::Removed);
            }
            self.shared.reads_until_removal.set(Some(left - 1));
        }
        if self.fail_at.is_some_and(|at| self.pos >= at) {
            return Err(StorageError::Io);
        }
        let start = usize::try_from(self.pos).unwrap_or(usize::MAX).min(self.data.len());
        let mut end = start.saturating_add(buf.len()).min(self.data.len());
        if let Some(at) = self.fail_at {
            end = end.min(usize::try_from(at).unwrap_or(usize::MAX).max(start));
        }
        let n = end - start;
        buf[..n].copy_from_slice(&self.data[start..end]);
        self.pos += n as u64;
        Ok(n)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        self.pos = pos.min(self.size);
        Ok(self.pos)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

/// Directory scan opened from a [`MockStorage`].
pub struct MockDir {
    entries: VecDeque<DirEntry>,
    shared: Rc<Shared>,
}

impl Directory for MockDir {
    async fn next_entry(&mut self) -> Result<Option<DirEntry>, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        Ok(self.entries.pop_front())
    }
}

impl Storage for MockStorage {
    type File = MockFile;
    type Dir = MockDir;

    async fn open_file(&mut self, path: &str) -> Result<Self::File, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        let data = self.card.files.get(path).ok_or(StorageError::NotFound)?.clone();
        let size = self
            .card
            .reported_size
            .get(path)
            .copied()
            .unwrap_or(data.len() as u64);
        Ok(MockFile {
            data,
            size,
            pos: 0,
            fail_at: self.card.fail_at.get(path).copied(),
            shared: Rc::clone(&self.shared),
        })
    }

    async fn open_dir(&mut self, path: &str) -> Result<Self::Dir, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        self.shared.dir_opens.set(self.shared.dir_opens.get() + 1);
        let entries = self.card.dirs.get(path).ok_or(StorageError::NotFound)?;
        Ok(MockDir {
            entries: entries.iter().cloned().collect(),
            shared: Rc::clone(&self.shared),
        })
    }

    async fn exists(&mut self, path: &str) -> Result<bool, StorageError> {
        if !self.shared.present.get() {
            return Err(StorageError::Removed);
        }
        Ok(self.card.files.contains_key(path) || self.card.dirs.contains_key(path))
    }

    fn is_present(&mut self) -> bool {
        self.shared.present.get()
    }
}

// ── Touch ───────────────────────────────────────────────────────────────────

/// Scripted touch controller: one entry is consumed per `poll_event`.
pub struct MockTouch {
    script: VecDeque<Option<(u16, u16)>>,
    current: Option<(u16, u16)>,
    queue_extra: u8,
    resets: usize,
}

impl MockTouch {
    /// A panel nobody touches.
    pub fn new() -> Self {
        Self { script: VecDeque::new(), current: None, queue_extra: 0, resets: 0 }
    }

    /// Queue a press on screen pixel `(x, y)`.
    pub fn tap(&mut self, x: u16, y: u16) -> &mut Self {
        let raw = TouchCalibration::DEFAULT.raw_for_pixel(x, y);
        self.script.push_back(raw);
        self
    }

    /// Queue a press with a raw controller sample.
    pub fn tap_raw(&mut self, x: u16, y: u16) -> &mut Self {
        self.script.push_back(Some((x, y)));
        self
    }

    /// Queue `ticks` polls without a touch.
    pub fn idle(&mut self, ticks: usize) -> &mut Self {
        self.script.extend(core::iter::repeat(None).take(ticks));
        self
    }

    /// Report this many extra samples behind each press.
    pub fn with_queue_extra(mut self, extra: u8) -> Self {
        self.queue_extra = extra;
        self
    }

    /// Number of `reset_queue` calls.
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Scripted polls not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Default for MockTouch {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchPanel for MockTouch {
    fn poll_event(&mut self) -> bool {
        self.current = self.script.pop_front().flatten();
        self.current.is_some()
    }

    fn queue_depth(&mut self) -> u8 {
        if self.current.is_some() {
            self.queue_extra.saturating_add(1)
        } else {
            0
        }
    }

    fn read_coordinate(&mut self) -> (u16, u16) {
        self.current.unwrap_or((0, 0))
    }

    fn reset_queue(&mut self) {
        self.resets += 1;
        self.current = None;
    }
}

// ── Delay ───────────────────────────────────────────────────────────────────

/// Delay that returns immediately and accumulates the requested time.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    /// Zero elapsed time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nanoseconds requested so far.
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Whole milliseconds requested so far.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

impl embedded_hal_async::delay::DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

// ── Display ─────────────────────────────────────────────────────────────────

/// Error returned by a [`MockSurface`] told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDrawError;

/// RGB565 framebuffer that also logs icon blits.
pub struct MockSurface {
    pixels: Vec<Rgb565>,
    icons: Vec<(Icon, IconStyle, Point)>,
    failing: bool,
}

impl MockSurface {
    /// A black 480×272 surface.
    pub fn new() -> Self {
        Self {
            pixels: vec![Rgb565::BLACK; (SCREEN_WIDTH * SCREEN_HEIGHT) as usize],
            icons: Vec::new(),
            failing: false,
        }
    }

    /// Make every draw call fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Colour at `(x, y)`, `None` off screen.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb565> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        self.pixels.get((y * SCREEN_WIDTH + x) as usize).copied()
    }

    /// Every icon blit so far.
    pub fn icons(&self) -> &[(Icon, IconStyle, Point)] {
        &self.icons
    }

    /// Forget logged icon blits.
    pub fn clear_icons(&mut self) {
        self.icons.clear();
    }

    /// Count pixels of `color` inside a rectangle.
    pub fn count_in(&self, area: &embedded_graphics::primitives::Rectangle, color: Rgb565) -> usize {
        area.points()
            .filter(|p| {
                u32::try_from(p.x).ok().zip(u32::try_from(p.y).ok())
                    .and_then(|(x, y)| self.pixel(x, y))
                    == Some(color)
            })
            .count()
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for MockSurface {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for MockSurface {
    type Color = Rgb565;
    type Error = MockDrawError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        if self.failing {
            return Err(MockDrawError);
        }
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
                continue;
            };
            if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
                self.pixels[(y * SCREEN_WIDTH + x) as usize] = color;
            }
        }
        Ok(())
    }
}

impl DisplaySurface for MockSurface {
    fn draw_icon(
        &mut self,
        icon: Icon,
        style: IconStyle,
        top_left: Point,
    ) -> Result<(), Self::Error> {
        if self.failing {
            return Err(MockDrawError);
        }
        self.icons.push((icon, style, top_left));
        Ok(())
    }
}
