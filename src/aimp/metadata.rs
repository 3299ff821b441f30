//! Decoding of the shared memory track info block.
//!
//! Layout: an 84-byte little-endian header followed by a UTF-16 text blob. The
//! header declares the length, in UTF-16 units, of six strings that are packed
//! back-to-back in the blob in a fixed order.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use super::error::AimpError;

pub const HEADER_LEN: usize = 84;

/// Information about the track currently loaded in AIMP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
  pub bit_rate: u32,
  pub channels: u32,
  /// Milliseconds; 0 for streams.
  pub duration: u32,
  /// Bytes; 0 for streams.
  pub file_size: i32,
  pub file_mark: u32,
  pub sample_rate: u32,
  pub track_number: u32,
  pub album: String,
  pub artist: String,
  pub year: String,
  /// Path to the file or URL of the stream.
  pub filename: String,
  pub genre: String,
  pub title: String,
}

/// Fixed part of the block.
#[derive(Debug, Clone)]
struct RemoteFileInfo {
  bit_rate: u32,
  channels: u32,
  duration: u32,
  file_size: i32,
  file_mark: u32,
  sample_rate: u32,
  track_number: u32,
  /// album, artist, year, filename, genre, title
  lengths: [u32; 6],
}

impl RemoteFileInfo {
  fn read_from<R: Read>(r: &mut R) -> std::io::Result<Self> {
    let _deprecated1 = r.read_u32::<LittleEndian>()?;
    let _active = r.read_u32::<LittleEndian>()?;
    let bit_rate = r.read_u32::<LittleEndian>()?;
    let channels = r.read_u32::<LittleEndian>()?;
    let duration = r.read_u32::<LittleEndian>()?;
    let file_size = r.read_i32::<LittleEndian>()?;
    let file_mark = r.read_u32::<LittleEndian>()?;
    let mut deprecated2 = [0u32; 6];
    r.read_u32_into::<LittleEndian>(&mut deprecated2)?;
    let sample_rate = r.read_u32::<LittleEndian>()?;
    let track_number = r.read_u32::<LittleEndian>()?;
    let mut lengths = [0u32; 6];
    r.read_u32_into::<LittleEndian>(&mut lengths)?;

    Ok(Self {
      bit_rate,
      channels,
      duration,
      file_size,
      file_mark,
      sample_rate,
      track_number,
      lengths,
    })
  }
}

/// Sequential reader over the text blob.
struct TextFields<'a> {
  units: &'a [u16],
  pos: usize,
}

impl<'a> TextFields<'a> {
  fn next_field(&mut self, name: &str, len: u32) -> Result<String, AimpError> {
    let len = len as usize;
    let end = self
      .pos
      .checked_add(len)
      .filter(|&end| end <= self.units.len())
      .ok_or_else(|| {
        AimpError::MetadataCorrupt(format!(
          "{} needs {} characters at offset {}, only {} available",
          name,
          len,
          self.pos,
          self.units.len() - self.pos
        ))
      })?;

    let slice = &self.units[self.pos..end];
    self.pos = end;
    String::from_utf16(slice)
      .map_err(|_| AimpError::MetadataCorrupt(format!("{} is not valid UTF-16", name)))
  }
}

/// Decode a track info block.
///
/// `capacity` bounds the text region in addition to the buffer length.
pub fn decode_track_metadata(raw: &[u8], capacity: usize) -> Result<TrackMetadata, AimpError> {
  let bound = raw.len().min(capacity);
  if bound < HEADER_LEN {
    return Err(AimpError::MetadataCorrupt(format!(
      "block is {} bytes, header needs {}",
      bound, HEADER_LEN
    )));
  }

  let mut cursor = Cursor::new(&raw[..bound]);
  let info = RemoteFileInfo::read_from(&mut cursor)
    .map_err(|e| AimpError::MetadataCorrupt(e.to_string()))?;

  // A trailing odd byte is half a code unit; fields cannot reach into it.
  let units: Vec<u16> = raw[HEADER_LEN..bound]
    .chunks_exact(2)
    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    .collect();

  let [album, artist, year, filename, genre, title] = info.lengths;
  let mut text = TextFields {
    units: &units,
    pos: 0,
  };

  Ok(TrackMetadata {
    bit_rate: info.bit_rate,
    channels: info.channels,
    duration: info.duration,
    file_size: info.file_size,
    file_mark: info.file_mark,
    sample_rate: info.sample_rate,
    track_number: info.track_number,
    album: text.next_field("album", album)?,
    artist: text.next_field("artist", artist)?,
    year: text.next_field("year", year)?,
    filename: text.next_field("filename", filename)?,
    genre: text.next_field("genre", genre)?,
    title: text.next_field("title", title)?,
  })
}

/// Build a raw block the way AIMP lays it out. Test helper.
#[cfg(test)]
pub(crate) fn encode_track_metadata(track: &TrackMetadata, capacity: usize) -> Vec<u8> {
  use byteorder::WriteBytesExt;

  let fields = [
    &track.album,
    &track.artist,
    &track.year,
    &track.filename,
    &track.genre,
    &track.title,
  ];
  let encoded: Vec<Vec<u16>> = fields.iter().map(|s| s.encode_utf16().collect()).collect();

  let mut w = Vec::with_capacity(capacity);
  w.write_u32::<LittleEndian>(0xDEAD_BEEF).unwrap();
  w.write_u32::<LittleEndian>(1).unwrap();
  w.write_u32::<LittleEndian>(track.bit_rate).unwrap();
  w.write_u32::<LittleEndian>(track.channels).unwrap();
  w.write_u32::<LittleEndian>(track.duration).unwrap();
  w.write_i32::<LittleEndian>(track.file_size).unwrap();
  w.write_u32::<LittleEndian>(track.file_mark).unwrap();
  for _ in 0..6 {
    w.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
  }
  w.write_u32::<LittleEndian>(track.sample_rate).unwrap();
  w.write_u32::<LittleEndian>(track.track_number).unwrap();
  for units in &encoded {
    w.write_u32::<LittleEndian>(units.len() as u32).unwrap();
  }
  for unit in encoded.iter().flatten() {
    w.write_u16::<LittleEndian>(*unit).unwrap();
  }
  w.resize(capacity.max(w.len()), 0);
  w
}
