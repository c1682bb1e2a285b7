use crate::consts;
use crate::record::Record;

/// One logical attachment, independent of how many versions it has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub title: Option<String>,
    /// The owning page.
    pub page_id: Option<String>,
}

impl Attachment {
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.pick(consts::ID)?,
            title: record.pick(consts::TITLE),
            page_id: record.pick(consts::ATTACHMENT_CONTAINER),
        })
    }
}

/// A stored revision of an attachment, carrying its original filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentVersion {
    pub attachment_id: String,
    pub file_name: String,
    pub version: Option<u64>,
}

impl AttachmentVersion {
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            attachment_id: record.pick(consts::VERSION_ATTACHMENT)?,
            file_name: record.pick(consts::VERSION_FILE_NAME)?,
            version: record.pick(consts::VERSION_NUMBER).and_then(|v| v.parse().ok()),
        })
    }

    /// Whether this row should replace `current` as the attachment's
    /// filename source: the higher version number wins, numbered rows beat
    /// unnumbered ones, and on a tie the row parsed later wins.
    pub(crate) fn supersedes(&self, current: Option<u64>) -> bool {
        self.version >= current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(2), Some(1), true)]
    #[case(Some(1), Some(2), false)]
    #[case(Some(3), Some(3), true)]
    #[case(None, Some(1), false)]
    #[case(Some(1), None, true)]
    #[case(None, None, true)]
    fn test_supersedes(#[case] new: Option<u64>, #[case] current: Option<u64>, #[case] expected: bool) {
        let row = AttachmentVersion { attachment_id: "1".into(), file_name: "a".into(), version: new };
        assert_eq!(row.supersedes(current), expected);
    }
}
