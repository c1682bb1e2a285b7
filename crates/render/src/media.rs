use exhume_storage::extension;

const VIDEO: &[&str] = &[".mp4", ".webm", ".ogv", ".ogg", ".m4v"];
const AUDIO: &[&str] = &[".mp3", ".wav", ".m4a", ".ogg"];
const IMAGE: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".svg"];
/// URL suffixes embedded directly as video.
const STREAMABLE: &[&str] = &[".mp4", ".webm"];

/// How a referenced file is presented on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Media {
    Video,
    Audio,
    Image,
    File,
}

impl Media {
    /// Classifies a filename by extension. `.ogg` counts as video.
    pub fn classify(filename: &str) -> Self {
        let Some(ext) = extension(filename) else {
            return Media::File;
        };
        let ext = ext.as_str();
        if VIDEO.contains(&ext) {
            Media::Video
        } else if AUDIO.contains(&ext) {
            Media::Audio
        } else if IMAGE.contains(&ext) {
            Media::Image
        } else {
            Media::File
        }
    }

    /// Whether an external URL points straight at a playable video.
    pub fn is_streamable(url: &str) -> bool {
        let url = url.to_ascii_lowercase();
        STREAMABLE.iter().any(|ext| url.ends_with(ext))
    }

    /// The `type` attribute for a `<source>` element.
    pub(crate) fn source_type(self, filename: &str) -> Option<String> {
        let ext = extension(filename)?;
        let ext = ext.trim_start_matches('.');
        match self {
            Media::Video => Some(format!("video/{ext}")),
            Media::Audio => Some(format!("audio/{ext}")),
            Media::Image | Media::File => None,
        }
    }
}
