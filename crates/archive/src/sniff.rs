use crate::Mime;

/// Whether magic-byte sniffing was compiled in (the `sniff` feature).
pub const SNIFFING: bool = cfg!(feature = "sniff");

#[cfg(feature = "sniff")]
mod magic {
    pub(super) const JPEG: [u8; 3] = [0xFF, 0xD8, 0xFF];
    pub(super) const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    pub(super) const GIF87: &[u8] = b"GIF87a";
    pub(super) const GIF89: &[u8] = b"GIF89a";
    pub(super) const RIFF: &[u8] = b"RIFF";
    pub(super) const WEBP: &[u8] = b"WEBP";
    pub(super) const TIFF_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
    pub(super) const TIFF_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];
    pub(super) const PDF: &[u8] = b"%PDF-";
    pub(super) const ZIP: [&[u8]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];
    pub(super) const CFB: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    pub(super) const FTYP: &[u8] = b"ftyp";
    pub(super) const ID3: &[u8] = b"ID3";
}

/// How much of a blob is inspected when deciding whether it is text.
#[cfg(feature = "sniff")]
const TEXT_SAMPLE_BYTES: usize = 8192;

impl Mime {
    /// Detects a content type from magic bytes.
    ///
    /// Returns `None` if nothing matches, if the input is empty, or if the
    /// crate was built without the `sniff` feature.
    #[must_use]
    #[cfg(feature = "sniff")]
    pub fn sniff(bytes: &[u8]) -> Option<Mime> {
        use magic::*;
        if bytes.starts_with(&JPEG) {
            return Some(Mime::Jpeg);
        }
        if bytes.starts_with(&PNG) {
            return Some(Mime::Png);
        }
        if bytes.starts_with(GIF87) || bytes.starts_with(GIF89) {
            return Some(Mime::Gif);
        }
        if bytes.starts_with(RIFF) && bytes.get(8..12) == Some(WEBP) {
            return Some(Mime::Webp);
        }
        if bytes.starts_with(&TIFF_LE) || bytes.starts_with(&TIFF_BE) {
            return Some(Mime::Tiff);
        }
        if bytes.starts_with(PDF) {
            return Some(Mime::Pdf);
        }
        if ZIP.iter().any(|magic| bytes.starts_with(magic)) {
            return Some(Mime::Zip);
        }
        if bytes.starts_with(&CFB) {
            return compound_file_kind(bytes);
        }
        if bytes.get(4..8) == Some(FTYP) {
            // Audio-only brands (M4A, M4B) are not video; leave them unnamed.
            return match bytes.get(8..11) {
                Some(b"M4A") | Some(b"M4B") => None,
                _ => Some(Mime::Mp4),
            };
        }
        if bytes.starts_with(ID3) || is_mpeg_frame(bytes) {
            return Some(Mime::Mpeg);
        }
        if is_text(bytes) {
            return Some(Mime::Text);
        }
        None
    }

    #[must_use]
    #[cfg(not(feature = "sniff"))]
    pub fn sniff(_bytes: &[u8]) -> Option<Mime> {
        None
    }
}

/// Legacy office formats share one compound-file container; the stream
/// names in its directory tell them apart. Directory entry names are stored
/// as UTF-16LE.
#[cfg(feature = "sniff")]
fn compound_file_kind(bytes: &[u8]) -> Option<Mime> {
    let utf16 = |s: &str| s.encode_utf16().flat_map(u16::to_le_bytes).collect::<Vec<u8>>();
    let contains = |needle: &str| memchr::memmem::find(bytes, &utf16(needle)).is_some();
    if contains("WordDocument") {
        Some(Mime::Msword)
    } else if contains("Workbook") || contains("Book") {
        Some(Mime::MsExcel)
    } else if contains("PowerPoint Document") {
        Some(Mime::MsPowerpoint)
    } else {
        None
    }
}

/// An MPEG audio frame header starts with 11 set sync bits.
#[cfg(feature = "sniff")]
fn is_mpeg_frame(bytes: &[u8]) -> bool {
    matches!(bytes, [0xFF, second, ..] if second & 0xE0 == 0xE0)
}

#[cfg(feature = "sniff")]
fn is_text(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(TEXT_SAMPLE_BYTES)];
    if sample.is_empty() || memchr::memchr(0, sample).is_some() {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        // Only tolerate a multi-byte character cut off by the sample window.
        Err(e) => e.error_len().is_none(),
    }
}

#[cfg(all(test, feature = "sniff"))]
mod tests {
    use super::*;
    use crate::office::tests::zip_with;
    use rstest::rstest;

    #[rstest]
    #[case(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], Some(Mime::Jpeg))]
    #[case(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00], Some(Mime::Png))]
    #[case(b"GIF89a....", Some(Mime::Gif))]
    #[case(b"RIFF\x10\x00\x00\x00WEBPVP8 ", Some(Mime::Webp))]
    #[case(b"RIFF\x10\x00\x00\x00WAVEfmt ", None)]
    #[case(&[0x49, 0x49, 0x2A, 0x00, 0x08], Some(Mime::Tiff))]
    #[case(b"%PDF-1.7\n", Some(Mime::Pdf))]
    #[case(b"PK\x03\x04\x14\x00", Some(Mime::Zip))]
    #[case(b"\x00\x00\x00\x18ftypmp42\x00\x00", Some(Mime::Mp4))]
    #[case(b"\x00\x00\x00\x18ftypM4A \x00\x00", None)]
    #[case(b"ID3\x04\x00", Some(Mime::Mpeg))]
    #[case(&[0xFF, 0xFB, 0x90, 0x00], Some(Mime::Mpeg))]
    #[case(b"just some notes\n", Some(Mime::Text))]
    #[case("テキスト".as_bytes(), Some(Mime::Text))]
    #[case(b"\x00\x01\x02\x03", None)]
    #[case(b"", None)]
    fn test_sniff(#[case] bytes: &[u8], #[case] expected: Option<Mime>) {
        assert_eq!(Mime::sniff(bytes), expected);
    }

    #[test]
    fn test_sniff_truncated_utf8_is_text() {
        let mut bytes = "a".repeat(TEXT_SAMPLE_BYTES - 1).into_bytes();
        bytes.extend_from_slice("é".as_bytes());
        assert_eq!(Mime::sniff(&bytes), Some(Mime::Text));
    }

    #[rstest]
    #[case("WordDocument", Some(Mime::Msword))]
    #[case("Workbook", Some(Mime::MsExcel))]
    #[case("PowerPoint Document", Some(Mime::MsPowerpoint))]
    #[case("Something Else", None)]
    fn test_sniff_compound_files(#[case] stream: &str, #[case] expected: Option<Mime>) {
        let mut bytes = magic::CFB.to_vec();
        bytes.extend(std::iter::repeat_n(0u8, 64));
        bytes.extend(stream.encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(Mime::sniff(&bytes), expected);
    }

    #[test]
    fn test_sniff_real_zip() {
        assert_eq!(Mime::sniff(&zip_with(&["a.txt"])), Some(Mime::Zip));
    }
}
