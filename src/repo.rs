use std::fmt::Display;

use tracing::debug;

use crate::error::{Error, Result};

/// A record with a stable identifier, unique within its collection.
pub trait Record {
    type Id: PartialEq + Display + Clone;

    fn id(&self) -> &Self::Id;
}

/// Data access used by the screens, independent of where the records
/// live.
pub trait Repository<R: Record> {
    /// All records in insertion order.
    fn list(&self) -> &[R];

    fn get(&self, id: &R::Id) -> Option<&R>;

    /// Appends `record`. Fails with `DuplicateId` if the id is taken.
    fn create(&mut self, record: R) -> Result<()>;

    /// Replaces the record carrying the same id, keeping its position.
    fn update(&mut self, record: R) -> Result<()>;

    /// Removes and returns the record with the given id.
    fn delete(&mut self, id: &R::Id) -> Result<R>;
}

/// A repository backed by a `Vec`, used for mock data and tests.
#[derive(Debug, Clone)]
pub struct InMemory<R> {
    records: Vec<R>,
}

impl<R> Default for InMemory<R> {
    fn default() -> Self {
        InMemory {
            records: Vec::new(),
        }
    }
}

impl<R: Record> InMemory<R> {
    /// Builds a repository from `records`, rejecting duplicated ids.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Result<InMemory<R>> {
        let mut repo = InMemory::default();
        for r in records {
            repo.create(r)?;
        }
        Ok(repo)
    }

    fn position(&self, id: &R::Id) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

impl<R: Record> Repository<R> for InMemory<R> {
    fn list(&self) -> &[R] {
        &self.records
    }

    fn get(&self, id: &R::Id) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    fn create(&mut self, record: R) -> Result<()> {
        if self.position(record.id()).is_some() {
            return Err(Error::DuplicateId(record.id().to_string()));
        }
        debug!(id = %record.id(), "record created");
        self.records.push(record);
        Ok(())
    }

    fn update(&mut self, record: R) -> Result<()> {
        let Some(pos) = self.position(record.id()) else {
            return Err(Error::UnknownRecord(record.id().to_string()));
        };
        debug!(id = %record.id(), "record updated");
        self.records[pos] = record;
        Ok(())
    }

    fn delete(&mut self, id: &R::Id) -> Result<R> {
        let Some(pos) = self.position(id) else {
            return Err(Error::UnknownRecord(id.to_string()));
        };
        debug!(%id, "record deleted");
        Ok(self.records.remove(pos))
    }
}
