use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Identifier of a row within one line-item list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId(s)
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out fresh row ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> RowId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> RowId {
        RowId(Uuid::new_v4().to_string())
    }
}

/// `"1"`, `"2"`, ... in order.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds { next: 1 }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> RowId {
        let id = self.next;
        self.next += 1;
        RowId(id.to_string())
    }
}

/// A row of a line-item list.
pub trait LineRow: Clone {
    /// A row with every input empty.
    fn blank(id: RowId) -> Self;

    fn id(&self) -> &RowId;
}

/// The ordered rows of a form. There is always at least one row.
#[derive(Debug, Clone)]
pub struct LineItems<R, G = UuidIds> {
    rows: Vec<R>,
    ids: G,
}

impl<R: LineRow, G: IdGenerator + Default> Default for LineItems<R, G> {
    fn default() -> Self {
        LineItems::with_ids(G::default())
    }
}

impl<R: LineRow, G: IdGenerator> LineItems<R, G> {
    /// One blank row, with ids drawn from `ids`.
    pub fn with_ids(mut ids: G) -> LineItems<R, G> {
        let first = R::blank(ids.next_id());
        LineItems {
            rows: vec![first],
            ids,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A list always keeps at least one row.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &RowId) -> Option<&R> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Appends a blank row and returns its id.
    pub fn add(&mut self) -> RowId {
        let id = self.ids.next_id();
        debug!(%id, "line added");
        self.rows.push(R::blank(id.clone()));
        id
    }

    /// Runs `edit` on a copy of the row and keeps the copy only if `edit`
    /// succeeds, so a rejected input leaves the row as it was.
    pub fn update<F>(&mut self, id: &RowId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut R) -> Result<()>,
    {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Error::UnknownRow(id.to_string()))?;

        let mut draft = row.clone();
        edit(&mut draft)?;
        *row = draft;
        debug!(%id, "line updated");
        Ok(())
    }

    /// Removes the row with `id`. When it is the only row left nothing
    /// happens and `false` is returned.
    pub fn remove(&mut self, id: &RowId) -> Result<bool> {
        let pos = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Error::UnknownRow(id.to_string()))?;

        if self.rows.len() == 1 {
            warn!(%id, "refusing to remove the last line");
            return Ok(false);
        }

        self.rows.remove(pos);
        debug!(%id, "line removed");
        Ok(true)
    }

    /// Drops every row and starts over with a single blank one.
    pub fn reset(&mut self) {
        let first = R::blank(self.ids.next_id());
        self.rows = vec![first];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Line {
        id: RowId,
        text: String,
        n: u32,
    }

    impl LineRow for Line {
        fn blank(id: RowId) -> Self {
            Line {
                id,
                text: String::new(),
                n: 0,
            }
        }

        fn id(&self) -> &RowId {
            &self.id
        }
    }

    type Lines = LineItems<Line, SequentialIds>;

    #[test]
    fn starts_with_one_blank_row() {
        let lines = Lines::default();
        assert_eq!(lines.rows(), &[Line::blank("1".into())]);
    }

    #[test]
    fn last_row_cannot_be_removed() {
        let mut lines = Lines::default();
        assert!(!lines.remove(&"1".into()).unwrap());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.rows()[0].id.as_str(), "1");
    }

    #[test]
    fn add_update_remove_by_id() {
        let mut lines = Lines::default();
        let second = lines.add();
        let third = lines.add();
        assert_eq!(second.as_str(), "2");

        lines
            .update(&second, |l| {
                l.text = "cable".to_string();
                Ok(())
            })
            .unwrap();
        assert_eq!(lines.get(&second).unwrap().text, "cable");
        assert_eq!(lines.get(&second).unwrap().n, 0);

        assert!(lines.remove(&"1".into()).unwrap());
        let ids: Vec<_> = lines.rows().iter().map(|l| l.id.clone()).collect();
        assert_eq!(ids, vec![second, third]);
    }

    #[test]
    fn failed_edit_leaves_row_unchanged() {
        let mut lines = Lines::default();
        let id: RowId = "1".into();
        let res = lines.update(&id, |l| {
            l.n = 99;
            Err(Error::InvalidAmount("x".to_string()))
        });
        assert!(res.is_err());
        assert_eq!(lines.get(&id).unwrap().n, 0);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut lines = Lines::default();
        let ghost: RowId = "42".into();
        assert!(matches!(lines.update(&ghost, |_| Ok(())), Err(Error::UnknownRow(_))));
        assert!(matches!(lines.remove(&ghost), Err(Error::UnknownRow(_))));
    }

    #[test]
    fn uuid_ids_are_distinct() {
        let mut lines: LineItems<Line> = LineItems::default();
        let a = lines.add();
        let b = lines.add();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn reset_keeps_a_single_fresh_row() {
        let mut lines = Lines::default();
        lines.add();
        lines.reset();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.rows()[0].id.as_str(), "3");
    }
}
