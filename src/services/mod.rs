pub mod namesilo;

use std::fmt;
use std::ops::Index;

use thiserror::Error;

use crate::ip::PublicAddresses;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum DdnsUpdateError {
    // used when the registrar answered, but said no
    #[error("NameSilo returned error code {0} \"{1}\"")]
    Api(Box<str>, Box<str>),

    #[error("received malformed XML: {0}")]
    Xml(Box<str>),

    #[error("record {0} has no <{1}> element")]
    MissingField(Box<str>, &'static str),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("HTTP transport error: {0}")]
    TransportError(Box<str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Aaaa,
    Other(Box<str>),
}

impl From<&str> for RecordKind {
    fn from(kind: &str) -> Self {
        match kind {
            "A" => RecordKind::A,
            "AAAA" => RecordKind::Aaaa,
            other => RecordKind::Other(other.into()),
        }
    }
}

/// A resource record as the registrar lists it. Every child element of the
/// record is kept, in order, with its text untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(Box<str>, Box<str>)>,
}

pub(crate) const UNKNOWN_HOST: &str = "(unknown host)";

/// Listed records keyed by their `record_id`, in the order the registrar
/// listed them. A repeated ID replaces the earlier record in its place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    records: Vec<Record>,
}

impl Records {
    pub fn insert(&mut self, record: Record) {
        match self.records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(Record::id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for Records {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut records = Records::default();
        for record in iter {
            records.insert(record);
        }
        records
    }
}

impl Index<&str> for Records {
    type Output = Record;

    fn index(&self, id: &str) -> &Record {
        match self.get(id) {
            Some(record) => record,
            None => panic!("no record with ID {}", id),
        }
    }
}

impl Record {
    /// Builds a record out of `(element, text)` pairs. A repeated element
    /// overwrites the earlier one. Fails if there is no `record_id`.
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Result<Self, DdnsUpdateError>
    where
        K: Into<Box<str>>,
        V: Into<Box<str>>,
    {
        let mut record = Record { fields: Vec::new() };

        for (name, text) in fields {
            let (name, text) = (name.into(), text.into());
            match record.fields.iter_mut().find(|(n, _)| *n == name) {
                Some(field) => field.1 = text,
                None => record.fields.push((name, text)),
            }
        }

        if record.get("record_id").is_none() {
            let host = record.get("host").unwrap_or(UNKNOWN_HOST);
            return Err(DdnsUpdateError::MissingField(host.into(), "record_id"));
        }

        Ok(record)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, text)| text.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, t)| (n.as_ref(), t.as_ref()))
    }

    pub fn id(&self) -> &str {
        // from_fields() refuses records without an ID
        self.get("record_id").unwrap_or_default()
    }

    pub fn kind(&self) -> RecordKind {
        RecordKind::from(self.kind_name())
    }

    /// The record type exactly as listed, e.g. `"CNAME"`.
    pub fn kind_name(&self) -> &str {
        self.get("type").unwrap_or_default()
    }

    pub fn value(&self) -> &str {
        self.get("value").unwrap_or_default()
    }

    pub fn host(&self) -> Result<&str, DdnsUpdateError> {
        self.require("host")
    }

    pub fn ttl(&self) -> Result<&str, DdnsUpdateError> {
        self.require("ttl")
    }

    fn require(&self, name: &'static str) -> Result<&str, DdnsUpdateError> {
        self.get(name)
            .ok_or_else(|| DdnsUpdateError::MissingField(self.id().into(), name))
    }
}

/// What happened to a single record during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
    NoAddress,
    DryRun,
    Skipped,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated => write!(f, "updated successfully"),
            UpdateOutcome::Unchanged => write!(f, "is already up to date"),
            UpdateOutcome::NoAddress => write!(f, "skipped (no public address)"),
            UpdateOutcome::DryRun => write!(f, "skipped (dry run)"),
            UpdateOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

pub trait DdnsService {
    /// Fetch every resource record of the configured domain.
    fn list_records(&self) -> Result<Records, DdnsUpdateError>;

    /// Point the given record at the matching public address. Records other
    /// than A and AAAA are left alone.
    fn update_record(
        &self,
        record: &Record,
        addresses: &PublicAddresses,
    ) -> Result<UpdateOutcome, DdnsUpdateError>;
}
