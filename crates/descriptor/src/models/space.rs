use crate::consts;
use crate::record::Record;

/// A top-level content collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub key: String,
}

impl Space {
    /// Both the id and the key are required; a space without either cannot
    /// name anything.
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        Some(Self { id: record.pick(consts::ID)?, key: record.pick(consts::SPACE_KEY)? })
    }
}
