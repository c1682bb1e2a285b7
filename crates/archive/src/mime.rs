use crate::{Mime, OfficeKind};
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for Mime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Mime {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl From<OfficeKind> for Mime {
    fn from(kind: OfficeKind) -> Self {
        match kind {
            OfficeKind::Document => Mime::Docx,
            OfficeKind::Workbook => Mime::Xlsx,
            OfficeKind::Presentation => Mime::Pptx,
        }
    }
}

impl Mime {
    /// The registered media type string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mime::Jpeg => "image/jpeg",
            Mime::Png => "image/png",
            Mime::Gif => "image/gif",
            Mime::Webp => "image/webp",
            Mime::Tiff => "image/tiff",
            Mime::Pdf => "application/pdf",
            Mime::Msword => "application/msword",
            Mime::MsExcel => "application/vnd.ms-excel",
            Mime::MsPowerpoint => "application/vnd.ms-powerpoint",
            Mime::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Mime::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Mime::Pptx => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            Mime::Zip => "application/zip",
            Mime::Mp4 => "video/mp4",
            Mime::Mpeg => "audio/mpeg",
            Mime::Text => "text/plain",
        }
    }

    /// The file extension (with its dot) conventionally used for this type.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Mime::Jpeg => ".jpg",
            Mime::Png => ".png",
            Mime::Gif => ".gif",
            Mime::Webp => ".webp",
            Mime::Tiff => ".tif",
            Mime::Pdf => ".pdf",
            Mime::Msword => ".doc",
            Mime::MsExcel => ".xls",
            Mime::MsPowerpoint => ".ppt",
            Mime::Docx => ".docx",
            Mime::Xlsx => ".xlsx",
            Mime::Pptx => ".pptx",
            Mime::Zip => ".zip",
            Mime::Mp4 => ".mp4",
            Mime::Mpeg => ".mp3",
            Mime::Text => ".txt",
        }
    }

    /// Whether this is a bare archive, as opposed to a document that
    /// happens to be stored in an archive container.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        matches!(self, Mime::Zip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Mime::Jpeg, "image/jpeg", ".jpg")]
    #[case(Mime::Tiff, "image/tiff", ".tif")]
    #[case(Mime::Msword, "application/msword", ".doc")]
    #[case(Mime::Mpeg, "audio/mpeg", ".mp3")]
    #[case(Mime::Text, "text/plain", ".txt")]
    fn test_type_table(#[case] mime: Mime, #[case] name: &str, #[case] ext: &str) {
        assert_eq!(mime.as_str(), name);
        assert_eq!(mime.to_string(), name);
        assert_eq!(mime.extension(), ext);
    }

    #[test]
    fn test_office_kinds_map_to_ooxml() {
        assert_eq!(Mime::from(OfficeKind::Workbook).extension(), ".xlsx");
        assert!(!Mime::from(OfficeKind::Document).is_archive());
        assert!(Mime::Zip.is_archive());
    }
}
