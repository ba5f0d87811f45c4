use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::{Filter, PAGE_SIZES, Page, Searchable};
use crate::grn::GrnRecord;
use crate::notice::Notice;
use crate::repo::{Record, Repository};

/// A record that can be named in a confirmation prompt.
pub trait Labelled {
    /// Singular noun for the kind of record, e.g. `GRN`.
    const KIND: &'static str;

    fn label(&self) -> &str;
}

impl Labelled for GrnRecord {
    const KIND: &'static str = "GRN";

    fn label(&self) -> &str {
        &self.grn_number
    }
}

/// A list screen: records from a repository, a filter, a page size and a
/// delete awaiting confirmation.
pub struct ListPage<R: Record + Searchable, P> {
    repo: P,
    pub filter: Filter<R>,
    per_page: usize,
    pending_delete: Option<R::Id>,
}

impl<R, P> ListPage<R, P>
where
    R: Record + Searchable + Labelled,
    P: Repository<R>,
{
    pub fn new(repo: P) -> ListPage<R, P> {
        ListPage {
            repo,
            filter: Filter::new(),
            per_page: PAGE_SIZES[0],
            pending_delete: None,
        }
    }

    pub fn repo(&self) -> &P {
        &self.repo
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Only the sizes in `PAGE_SIZES` are accepted.
    pub fn set_per_page(&mut self, n: usize) -> Result<()> {
        if !PAGE_SIZES.contains(&n) {
            return Err(Error::InvalidPageSize(n));
        }
        self.per_page = n;
        Ok(())
    }

    pub fn page(&self) -> Page<'_, R> {
        Page::first(self.filter.apply(self.repo.list()), self.per_page)
    }

    /// Asks for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: &R::Id) -> Result<&R> {
        let record = self
            .repo
            .get(id)
            .ok_or_else(|| Error::UnknownRecord(id.to_string()))?;
        self.pending_delete = Some(id.clone());
        Ok(record)
    }

    pub fn pending_delete(&self) -> Option<&R> {
        self.pending_delete.as_ref().and_then(|id| self.repo.get(id))
    }

    /// Deletes the record awaiting confirmation. Returns `None` if no
    /// delete was requested.
    pub fn confirm_delete(&mut self) -> Result<Option<Notice>> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(None);
        };
        let gone = self.repo.delete(&id)?;
        debug!(%id, "delete confirmed");
        Ok(Some(Notice::destructive(
            format!("{} Deleted", R::KIND),
            format!("{} {} has been deleted successfully.", R::KIND, gone.label()),
        )))
    }

    pub fn cancel_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            debug!(%id, "delete cancelled");
        }
    }
}
