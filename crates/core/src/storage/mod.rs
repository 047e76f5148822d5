//! Durable slots holding one recorded song and its best score each.
//!
//! Every slot is a flat binary record, little-endian, with no version tag:
//!
//! ```text
//! [event count : u24]
//! [best score  : u24]        may be missing in legacy records, read as 0
//! [events      : count x { timestamp: u24, lane: u8 }]
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::{
    song::{EventStore, Lane},
    LanebeatError, Result,
};

/// Largest value a 24-bit field can hold.
pub const U24_MAX: u32 = 0xFF_FFFF;

/// One-based slot number, validated against the configured slot count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    pub fn new(number: u8, slot_count: u8) -> Result<Self> {
        if (1..=slot_count).contains(&number) {
            Ok(Self(number))
        } else {
            Err(LanebeatError::InvalidSlot(number))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Name of the storage unit backing this slot.
    pub fn unit_name(self) -> String {
        format!("Song{}", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage subsystem that maps slots onto durable units.
pub trait SlotStorage {
    type Reader: Read;
    type Writer: Write;

    fn slot_count(&self) -> u8;

    /// Opens a slot for reading, or `None` when the slot holds nothing.
    fn open_read(&self, slot: SlotId) -> io::Result<Option<Self::Reader>>;

    /// Opens a slot for writing, discarding any previous contents.
    fn open_write(&self, slot: SlotId) -> io::Result<Self::Writer>;

    /// Flushes and closes a writer, asking for non-volatile retention.
    fn mark_durable(&self, writer: Self::Writer) -> io::Result<()>;

    fn slot(&self, number: u8) -> Result<SlotId> {
        SlotId::new(number, self.slot_count())
    }

    fn slots(&self) -> Vec<SlotId> {
        (1..=self.slot_count()).map(SlotId).collect()
    }
}

/// Slots stored as files named `Song{n}` inside a directory.
#[derive(Debug, Clone)]
pub struct FileSlots {
    directory: PathBuf,
    slot_count: u8,
}

impl FileSlots {
    pub fn new(directory: impl Into<PathBuf>, slot_count: u8) -> Self {
        Self {
            directory: directory.into(),
            slot_count,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, slot: SlotId) -> PathBuf {
        self.directory.join(slot.unit_name())
    }
}

impl SlotStorage for FileSlots {
    type Reader = BufReader<File>;
    type Writer = BufWriter<File>;

    fn slot_count(&self) -> u8 {
        self.slot_count
    }

    fn open_read(&self, slot: SlotId) -> io::Result<Option<Self::Reader>> {
        match File::open(self.path_for(slot)) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn open_write(&self, slot: SlotId) -> io::Result<Self::Writer> {
        fs::create_dir_all(&self.directory)?;
        let file = File::create(self.path_for(slot))?;
        Ok(BufWriter::new(file))
    }

    fn mark_durable(&self, writer: Self::Writer) -> io::Result<()> {
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()
    }
}

/// Best score recorded for a slot, `None` when the slot is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSummary {
    pub slot: SlotId,
    pub best_score: Option<u32>,
}

/// Replaces a slot's contents with `store` and `best_score`.
pub fn save_slot<S: SlotStorage>(
    storage: &S,
    slot: SlotId,
    store: &EventStore,
    best_score: u32,
) -> Result<()> {
    let mut writer = storage
        .open_write(slot)
        .map_err(|err| LanebeatError::storage(slot, err))?;
    encode(&mut writer, store, best_score).map_err(|err| LanebeatError::storage(slot, err))?;
    storage
        .mark_durable(writer)
        .map_err(|err| LanebeatError::storage(slot, err))?;

    tracing::debug!(%slot, events = store.len(), best_score, "saved slot");
    Ok(())
}

/// Loads a slot into `store`, returning the slot's best score.
///
/// On any error `store` is left untouched.
pub fn load_slot<S: SlotStorage>(storage: &S, slot: SlotId, store: &mut EventStore) -> Result<u32> {
    let mut reader = storage
        .open_read(slot)
        .map_err(|err| LanebeatError::storage(slot, err))?
        .ok_or(LanebeatError::SlotEmpty(slot))?;

    let mut loaded = EventStore::with_capacity(store.capacity());
    let best_score =
        decode(&mut reader, &mut loaded).map_err(|err| LanebeatError::storage(slot, err))?;
    *store = loaded;

    tracing::debug!(%slot, events = store.len(), best_score, "loaded slot");
    Ok(best_score)
}

/// Reads only the header of a slot. `None` means the slot is empty.
pub fn peek_best_score<S: SlotStorage>(storage: &S, slot: SlotId) -> Result<Option<u32>> {
    let Some(mut reader) = storage
        .open_read(slot)
        .map_err(|err| LanebeatError::storage(slot, err))?
    else {
        return Ok(None);
    };

    let header = read_header(&mut reader).map_err(|err| LanebeatError::storage(slot, err))?;
    Ok(Some(header.best_score))
}

/// Peeks every slot, reporting unreadable ones as empty.
pub fn slot_overview<S: SlotStorage>(storage: &S) -> Vec<SlotSummary> {
    storage
        .slots()
        .into_iter()
        .map(|slot| {
            let best_score = peek_best_score(storage, slot).unwrap_or_else(|err| {
                tracing::warn!(%slot, error = %err, "could not read slot header");
                None
            });
            SlotSummary { slot, best_score }
        })
        .collect()
}

/// Writes the binary slot record.
pub fn encode<W: Write>(writer: &mut W, store: &EventStore, best_score: u32) -> io::Result<()> {
    write_u24(writer, store.len() as u32)?;
    write_u24(writer, best_score)?;
    for event in store.events() {
        write_u24(writer, event.timestamp)?;
        writer.write_all(&[u8::from(event.lane)])?;
    }
    writer.flush()
}

/// Reads a slot record into an empty `store`, returning the best score.
///
/// Short records are tolerated: a missing header field reads as 0, events
/// beyond the store's capacity are dropped, and a truncated body keeps the
/// events that were read in full.
pub fn decode<R: Read>(reader: &mut R, store: &mut EventStore) -> io::Result<u32> {
    let header = read_header(reader)?;
    store.clear();

    let count = header.event_count as usize;
    if count > store.capacity() {
        tracing::warn!(
            stored = count,
            capacity = store.capacity(),
            "slot holds more events than fit, dropping the excess"
        );
    }

    for _ in 0..count.min(store.capacity()) {
        let mut raw = [0u8; 4];
        if read_full(reader, &mut raw)? < raw.len() {
            tracing::warn!(read = store.len(), expected = count, "slot body is truncated");
            break;
        }
        let timestamp = u32::from_le_bytes([raw[0], raw[1], raw[2], 0]);
        match Lane::new(raw[3]) {
            Some(lane) => {
                store.append(timestamp, lane);
            }
            None => tracing::warn!(lane = raw[3], timestamp, "skipping event with unknown lane"),
        }
    }

    Ok(header.best_score)
}

struct Header {
    event_count: u32,
    best_score: u32,
}

fn read_header<R: Read>(reader: &mut R) -> io::Result<Header> {
    let event_count = read_u24(reader)?.unwrap_or(0);
    let best_score = read_u24(reader)?.unwrap_or(0);
    Ok(Header {
        event_count,
        best_score,
    })
}

fn write_u24<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    let bytes = value.min(U24_MAX).to_le_bytes();
    writer.write_all(&bytes[..3])
}

fn read_u24<R: Read>(reader: &mut R) -> io::Result<Option<u32>> {
    let mut raw = [0u8; 3];
    if read_full(reader, &mut raw)? < raw.len() {
        return Ok(None);
    }
    Ok(Some(u32::from_le_bytes([raw[0], raw[1], raw[2], 0])))
}

/// Like `read_exact`, but reports how much was read instead of failing at EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
