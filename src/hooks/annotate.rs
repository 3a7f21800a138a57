//! The upload annotator: stamps a creation timestamp and embeds image
//! dimensions into uploaded filenames before the record is persisted.

use std::collections::HashMap;
use std::io::Cursor;

use time::OffsetDateTime;

use super::{HookError, RecordCreateEvent, RecordUpdateEvent, UploadedFile};
use crate::exif;

pub(crate) fn before_create(event: &mut RecordCreateEvent<'_>) -> Result<(), HookError> {
    if event.embed_dimensions {
        rename_uploads(event.files, &mut event.record.images);
    }
    event.record.datetime = Some(creation_timestamp(event.files));
    Ok(())
}

/// Filenames are annotated exactly like on create; `datetime` keeps the
/// original upload moment.
pub(crate) fn before_update(event: &mut RecordUpdateEvent<'_>) -> Result<(), HookError> {
    if event.embed_dimensions {
        rename_uploads(event.files, &mut event.record.images);
    }
    Ok(())
}

/// The timestamp for a new record: the first usable EXIF datetime of the
/// first uploaded image (create date, modify date, date-time-original, in
/// that priority), or the current UTC wall-clock time.
fn creation_timestamp(files: &[UploadedFile]) -> OffsetDateTime {
    files
        .first()
        .and_then(|file| exif::decode_timestamps(&file.data))
        .and_then(|timestamps| timestamps.first_usable())
        .unwrap_or_else(OffsetDateTime::now_utc)
}

/// Prefix every decodable uploaded file with `[WxH]_` and substitute the
/// new names into the record's images sequence in place. Files whose header
/// doesn't decode keep their name; images not part of this upload batch are
/// left untouched.
fn rename_uploads(files: &mut [UploadedFile], images: &mut Vec<String>) {
    let mut renamed = HashMap::new();

    for file in files.iter_mut() {
        let (width, height) = match probe_dimensions(&file.data) {
            Some(dimensions) => dimensions,
            None => continue,
        };

        let new_name = format!("[{}x{}]_{}", width, height, file.name);
        let old_name = std::mem::replace(&mut file.name, new_name.clone());
        renamed.insert(old_name, new_name);
    }

    for image in images.iter_mut() {
        if let Some(new_name) = renamed.get(image) {
            *image = new_name.clone();
        }
    }
}

/// Width and height from the image header alone, without decoding pixel
/// data.
fn probe_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::exif::testutil::{jpeg_with_exif, tiff_fixture};
    use crate::models::photos::Photo;

    /// Headers-only BMP; enough for a dimension probe, no pixel data.
    fn bmp_fixture(width: i32, height: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&54u32.to_le_bytes()); // file size
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(&54u32.to_le_bytes()); // pixel data offset
        out.extend_from_slice(&40u32.to_le_bytes()); // BITMAPINFOHEADER size
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // planes
        out.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
        out.extend_from_slice(&0u32.to_le_bytes()); // compression (BI_RGB)
        out.extend_from_slice(&0u32.to_le_bytes()); // image size
        out.extend_from_slice(&0i32.to_le_bytes()); // x pixels per meter
        out.extend_from_slice(&0i32.to_le_bytes()); // y pixels per meter
        out.extend_from_slice(&0u32.to_le_bytes()); // palette size
        out.extend_from_slice(&0u32.to_le_bytes()); // important colors
        out
    }

    fn record(images: &[&str]) -> Photo {
        Photo {
            id: 0,
            images: images.iter().map(|s| s.to_string()).collect(),
            tags: vec!["t1".to_string()],
            datetime: None,
        }
    }

    #[test]
    fn decodable_uploads_are_renamed_in_place() {
        let mut record = record(&["keep.jpg", "img1.png"]);
        let mut files = vec![UploadedFile {
            name: "img1.png".to_string(),
            data: bmp_fixture(1024, 768),
        }];

        before_create(&mut RecordCreateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: true,
        })
        .unwrap();

        assert_eq!(files[0].name, "[1024x768]_img1.png");
        assert_eq!(record.images, vec!["keep.jpg", "[1024x768]_img1.png"]);
    }

    #[test]
    fn undecodable_uploads_keep_their_name() {
        let mut record = record(&["bad.jpg"]);
        let mut files = vec![UploadedFile {
            name: "bad.jpg".to_string(),
            data: b"junk".to_vec(),
        }];

        before_create(&mut RecordCreateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: true,
        })
        .unwrap();

        assert_eq!(files[0].name, "bad.jpg");
        assert_eq!(record.images, vec!["bad.jpg"]);
        assert!(record.datetime.is_some());
    }

    #[test]
    fn create_stamps_exif_create_date() {
        let mut record = record(&["img1.jpg"]);
        let mut files = vec![UploadedFile {
            name: "img1.jpg".to_string(),
            data: jpeg_with_exif(&tiff_fixture(None, None, Some("2021:05:01 00:00:00"))),
        }];

        before_create(&mut RecordCreateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: true,
        })
        .unwrap();

        assert_eq!(record.datetime, Some(datetime!(2021-05-01 00:00:00 UTC)));
    }

    #[test]
    fn create_without_exif_falls_back_to_now() {
        let mut record = record(&["img1.png"]);
        let mut files = vec![UploadedFile {
            name: "img1.png".to_string(),
            data: bmp_fixture(2, 2),
        }];

        before_create(&mut RecordCreateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: true,
        })
        .unwrap();

        assert!(record.datetime.unwrap().year() >= 2024);
    }

    #[test]
    fn update_never_restamps_datetime() {
        let stamped = datetime!(2019-03-03 12:00:00 UTC);
        let mut record = record(&["img1.png"]);
        record.datetime = Some(stamped);
        let mut files = vec![UploadedFile {
            name: "img1.png".to_string(),
            data: bmp_fixture(640, 480),
        }];

        before_update(&mut RecordUpdateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: true,
        })
        .unwrap();

        assert_eq!(record.datetime, Some(stamped));
        assert_eq!(record.images, vec!["[640x480]_img1.png"]);
    }

    #[test]
    fn disabled_profile_skips_renaming_but_still_stamps() {
        let mut record = record(&["img1.png"]);
        let mut files = vec![UploadedFile {
            name: "img1.png".to_string(),
            data: bmp_fixture(1024, 768),
        }];

        before_create(&mut RecordCreateEvent {
            record: &mut record,
            files: &mut files[..],
            embed_dimensions: false,
        })
        .unwrap();

        assert_eq!(files[0].name, "img1.png");
        assert_eq!(record.images, vec!["img1.png"]);
        assert!(record.datetime.is_some());
    }
}
