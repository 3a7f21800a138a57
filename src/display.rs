use photoshare_api_structs::DisplayPhoto;

use crate::models::photos::Photo;

/// Dimensions reported for images without a usable size token.
pub const FALLBACK_WIDTH: u32 = 500;
pub const FALLBACK_HEIGHT: u32 = 500;

/// One DisplayPhoto per stored image filename, preserving the photo order
/// and each photo's image order. URLs are `{base}/{photo id}/{filename}`.
///
/// With `size_tokens` off the width/height fields are omitted entirely;
/// with it on they come from the filename's `[WxH]` token, falling back to
/// 500x500 when no token parses.
pub fn display_photos(
    asset_base_url: &str,
    photos: &[Photo],
    size_tokens: bool,
) -> Vec<DisplayPhoto> {
    let mut display = Vec::new();

    for photo in photos {
        for image in &photo.images {
            let (width, height) = if size_tokens {
                let (w, h) =
                    parse_size_token(image).unwrap_or((FALLBACK_WIDTH, FALLBACK_HEIGHT));
                (Some(w), Some(h))
            } else {
                (None, None)
            };

            display.push(DisplayPhoto {
                url: format!("{}/{}/{}", asset_base_url, photo.id, image),
                width,
                height,
            });
        }
    }

    display
}

/// Find a `[<digits>x<digits>]` token anywhere in the filename.
///
/// The token is matched as a strict grammar rather than a loose bracket
/// search, so `[cover]` or `[axb]` never count. The first grammatically
/// complete token decides; if either number overflows a u32 the token is
/// unusable and the caller falls back to the defaults.
pub fn parse_size_token(filename: &str) -> Option<(u32, u32)> {
    let bytes = filename.as_bytes();
    let mut start = 0;

    while let Some(offset) = bytes[start..].iter().position(|&b| b == b'[') {
        let open = start + offset;
        if let Some((width, height)) = token_body(&filename[open + 1..]) {
            return width.parse().ok().zip(height.parse().ok());
        }
        start = open + 1;
    }

    None
}

/// Match `<digits>x<digits>]` at the start of `rest`, returning the two
/// digit runs.
fn token_body(rest: &str) -> Option<(&str, &str)> {
    let bytes = rest.as_bytes();

    let width_len = bytes.iter().position(|b| !b.is_ascii_digit())?;
    if width_len == 0 || bytes[width_len] != b'x' {
        return None;
    }

    let height_start = width_len + 1;
    let height_len = bytes[height_start..]
        .iter()
        .position(|b| !b.is_ascii_digit())?;
    if height_len == 0 || bytes[height_start + height_len] != b']' {
        return None;
    }

    Some((&rest[..width_len], &rest[height_start..height_start + height_len]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(id: i32, images: &[&str]) -> Photo {
        Photo {
            id,
            images: images.iter().map(|s| s.to_string()).collect(),
            tags: vec!["t1".to_string()],
            datetime: None,
        }
    }

    #[test]
    fn token_is_parsed_from_prefixed_filename() {
        assert_eq!(parse_size_token("[800x600]_beach.jpg"), Some((800, 600)));
    }

    #[test]
    fn token_anywhere_in_filename_counts() {
        assert_eq!(parse_size_token("beach_[1024x768].jpg"), Some((1024, 768)));
    }

    #[test]
    fn missing_token_yields_none() {
        assert_eq!(parse_size_token("beach.jpg"), None);
    }

    #[test]
    fn non_numeric_token_yields_none() {
        assert_eq!(parse_size_token("[abcx600]_x.jpg"), None);
    }

    #[test]
    fn bracketed_words_are_not_tokens() {
        assert_eq!(parse_size_token("[cover]_beach.jpg"), None);
        assert_eq!(parse_size_token("[12x]_beach.jpg"), None);
        assert_eq!(parse_size_token("[x34]_beach.jpg"), None);
    }

    #[test]
    fn later_token_is_found_after_a_false_start() {
        assert_eq!(parse_size_token("[draft]_[640x480]_a.jpg"), Some((640, 480)));
    }

    #[test]
    fn overflowing_numbers_invalidate_the_token() {
        assert_eq!(parse_size_token("[99999999999x600]_a.jpg"), None);
    }

    #[test]
    fn url_is_base_slash_id_slash_filename() {
        let photos = [photo(0, &["a.jpg"])];
        let display = display_photos("https://cdn.example.com/files/photos", &photos, true);
        assert_eq!(display[0].url, "https://cdn.example.com/files/photos/0/a.jpg");
    }

    #[test]
    fn one_entry_per_image_in_order() {
        let photos = [
            photo(1, &["[800x600]_a.jpg", "b.jpg"]),
            photo(2, &["c.jpg"]),
        ];

        let display = display_photos("http://localhost/api/files/photos", &photos, true);

        assert_eq!(display.len(), 3);
        assert_eq!(display[0].url, "http://localhost/api/files/photos/1/[800x600]_a.jpg");
        assert_eq!(display[0].width, Some(800));
        assert_eq!(display[0].height, Some(600));
        assert_eq!(display[1].url, "http://localhost/api/files/photos/1/b.jpg");
        assert_eq!(display[1].width, Some(FALLBACK_WIDTH));
        assert_eq!(display[1].height, Some(FALLBACK_HEIGHT));
        assert_eq!(display[2].url, "http://localhost/api/files/photos/2/c.jpg");
    }

    #[test]
    fn disabled_profile_omits_dimensions() {
        let photos = [photo(1, &["[800x600]_a.jpg"])];
        let display = display_photos("http://localhost/api/files/photos", &photos, false);

        assert_eq!(display[0].width, None);
        assert_eq!(display[0].height, None);

        let json = serde_json::to_value(&display[0]).unwrap();
        assert!(json.get("width").is_none());
        assert!(json.get("height").is_none());
    }
}
