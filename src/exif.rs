//! EXIF datetime extraction, limited to the three timestamp tags the upload
//! annotator cares about. Handles a bare TIFF byte stream or a JPEG with an
//! `Exif` APP1 segment; everything else decodes to nothing.

use time::{format_description::FormatItem, OffsetDateTime, PrimitiveDateTime};

// "ModifyDate" lives in IFD0, the other two in the EXIF sub-IFD.
const TAG_MODIFY: u16 = 0x0132;
const TAG_ORIGINAL: u16 = 0x9003;
const TAG_CREATE: u16 = 0x9004;
const TAG_EXIF_IFD: u16 = 0x8769;

const ASCII: u16 = 2;
const LONG: u16 = 4;

const EXIF_DATETIME: &[FormatItem<'static>] =
    time::macros::format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExifTimestamps {
    pub create: Option<OffsetDateTime>,
    pub modify: Option<OffsetDateTime>,
    pub original: Option<OffsetDateTime>,
}

impl ExifTimestamps {
    /// The first usable timestamp in create, modify, original priority.
    /// Zero-valued and malformed tags never parse, so they are skipped here
    /// by construction.
    pub fn first_usable(&self) -> Option<OffsetDateTime> {
        self.create.or(self.modify).or(self.original)
    }
}

/// Decode the EXIF timestamps out of an uploaded image, if it carries any.
pub fn decode_timestamps(data: &[u8]) -> Option<ExifTimestamps> {
    let tiff_bytes = if data.starts_with(&[0xFF, 0xD8]) {
        exif_segment(data)?
    } else {
        data
    };
    let tiff = Tiff::parse(tiff_bytes)?;

    let mut timestamps = ExifTimestamps::default();
    let mut exif_ifd = None;

    for entry in &read_ifd(&tiff, tiff.u32_at(4)? as usize) {
        match entry.tag {
            TAG_MODIFY => timestamps.modify = ascii_value(&tiff, entry).and_then(parse_datetime),
            TAG_EXIF_IFD => exif_ifd = long_value(&tiff, entry),
            _ => {},
        }
    }

    if let Some(offset) = exif_ifd {
        for entry in &read_ifd(&tiff, offset as usize) {
            match entry.tag {
                TAG_CREATE => {
                    timestamps.create = ascii_value(&tiff, entry).and_then(parse_datetime)
                },
                TAG_ORIGINAL => {
                    timestamps.original = ascii_value(&tiff, entry).and_then(parse_datetime)
                },
                _ => {},
            }
        }
    }

    Some(timestamps)
}

/// Walk the JPEG segment chain up to SOS looking for an APP1 segment with
/// the `Exif\0\0` preamble, and return the TIFF stream inside it.
fn exif_segment(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        // SOS or EOI: no metadata segments past this point.
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }

        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            return None;
        }

        let segment = &data[pos + 4..pos + 2 + length];
        if marker == 0xE1 && segment.starts_with(b"Exif\0\0") {
            return Some(&segment[6..]);
        }

        pos += 2 + length;
    }

    None
}

struct Tiff<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl<'a> Tiff<'a> {
    fn parse(bytes: &'a [u8]) -> Option<Tiff<'a>> {
        let big_endian = match bytes.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };

        let tiff = Tiff { bytes, big_endian };
        if tiff.u16_at(2)? != 42 {
            return None;
        }
        Some(tiff)
    }

    fn u16_at(&self, pos: usize) -> Option<u16> {
        let bytes = self.bytes.get(pos..pos + 2)?;
        Some(if self.big_endian {
            u16::from_be_bytes([bytes[0], bytes[1]])
        } else {
            u16::from_le_bytes([bytes[0], bytes[1]])
        })
    }

    fn u32_at(&self, pos: usize) -> Option<u32> {
        let bytes = self.bytes.get(pos..pos + 4)?;
        Some(if self.big_endian {
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        } else {
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
        })
    }
}

struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    /// Absolute position of the entry's 4-byte value-or-offset field.
    value_pos: usize,
}

fn read_ifd(tiff: &Tiff<'_>, offset: usize) -> Vec<Entry> {
    let mut entries = Vec::new();

    let count = match tiff.u16_at(offset) {
        Some(count) => count as usize,
        None => return entries,
    };

    for index in 0..count {
        let base = offset + 2 + index * 12;
        match (
            tiff.u16_at(base),
            tiff.u16_at(base + 2),
            tiff.u32_at(base + 4),
        ) {
            (Some(tag), Some(kind), Some(value_count)) => entries.push(Entry {
                tag,
                kind,
                count: value_count,
                value_pos: base + 8,
            }),
            _ => break,
        }
    }

    entries
}

fn ascii_value<'a>(tiff: &Tiff<'a>, entry: &Entry) -> Option<&'a str> {
    if entry.kind != ASCII {
        return None;
    }

    let length = entry.count as usize;
    let bytes = if length <= 4 {
        tiff.bytes.get(entry.value_pos..entry.value_pos + length)?
    } else {
        let offset = tiff.u32_at(entry.value_pos)? as usize;
        tiff.bytes.get(offset..offset + length)?
    };

    std::str::from_utf8(bytes).ok()
}

fn long_value(tiff: &Tiff<'_>, entry: &Entry) -> Option<u32> {
    if entry.kind != LONG || entry.count != 1 {
        return None;
    }
    tiff.u32_at(entry.value_pos)
}

fn parse_datetime(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim_matches(|c| c == '\0' || c == ' ');
    PrimitiveDateTime::parse(trimmed, EXIF_DATETIME)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

#[cfg(test)]
pub(crate) mod testutil {
    /// A little-endian TIFF stream carrying the given datetime strings as
    /// ModifyDate (IFD0), DateTimeOriginal and DateTimeDigitized (sub-IFD).
    pub(crate) fn tiff_fixture(
        modify: Option<&str>,
        original: Option<&str>,
        create: Option<&str>,
    ) -> Vec<u8> {
        let mut ifd0_tags: Vec<(u16, &str)> = Vec::new();
        if let Some(value) = modify {
            ifd0_tags.push((super::TAG_MODIFY, value));
        }
        let mut sub_tags: Vec<(u16, &str)> = Vec::new();
        if let Some(value) = original {
            sub_tags.push((super::TAG_ORIGINAL, value));
        }
        if let Some(value) = create {
            sub_tags.push((super::TAG_CREATE, value));
        }

        let ifd0_entries = ifd0_tags.len() + if sub_tags.is_empty() { 0 } else { 1 };
        let ifd0_offset = 8;
        let sub_offset = ifd0_offset + 2 + ifd0_entries * 12 + 4;
        let data_offset = if sub_tags.is_empty() {
            sub_offset
        } else {
            sub_offset + 2 + sub_tags.len() * 12 + 4
        };

        let mut strings: Vec<u8> = Vec::new();
        let mut string_offsets: Vec<u32> = Vec::new();
        for (_, value) in ifd0_tags.iter().chain(sub_tags.iter()) {
            string_offsets.push((data_offset + strings.len()) as u32);
            strings.extend_from_slice(value.as_bytes());
            strings.push(0);
        }
        let mut offsets = string_offsets.into_iter();

        let mut out = Vec::new();
        out.extend_from_slice(b"II");
        out.extend_from_slice(&42u16.to_le_bytes());
        out.extend_from_slice(&(ifd0_offset as u32).to_le_bytes());

        out.extend_from_slice(&(ifd0_entries as u16).to_le_bytes());
        for (tag, value) in &ifd0_tags {
            push_ascii_entry(&mut out, *tag, value, offsets.next().unwrap());
        }
        if !sub_tags.is_empty() {
            out.extend_from_slice(&super::TAG_EXIF_IFD.to_le_bytes());
            out.extend_from_slice(&super::LONG.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
            out.extend_from_slice(&(sub_offset as u32).to_le_bytes());
        }
        out.extend_from_slice(&0u32.to_le_bytes());

        if !sub_tags.is_empty() {
            out.extend_from_slice(&(sub_tags.len() as u16).to_le_bytes());
            for (tag, value) in &sub_tags {
                push_ascii_entry(&mut out, *tag, value, offsets.next().unwrap());
            }
            out.extend_from_slice(&0u32.to_le_bytes());
        }

        out.extend_from_slice(&strings);
        out
    }

    /// Wrap a TIFF stream in a minimal JPEG: SOI, a JFIF APP0 stub, the
    /// `Exif` APP1 segment, EOI.
    pub(crate) fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46]);

        let length = (2 + 6 + tiff.len()) as u16;
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(tiff);

        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    fn push_ascii_entry(out: &mut Vec<u8>, tag: u16, value: &str, offset: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&super::ASCII.to_le_bytes());
        out.extend_from_slice(&((value.len() + 1) as u32).to_le_bytes());
        out.extend_from_slice(&offset.to_le_bytes());
    }
}
