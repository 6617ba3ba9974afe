//! Bidirectional sparse matrix
//!
//! Cells are owned by the row-major map `row -> col -> T`. The column index
//! `col -> set of rows` keeps keys only and resolves cells through the
//! row-major map, so every lookup works on borrowed keys.
//!
//! A row is present iff it owns at least one cell, and likewise for a
//! column. Both maps agree on membership after every `apply`.

use std::cell::Ref;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::codec::{self, Cell, CodecError, CodecResult, IndexKey};
use crate::policy::{InMemory, Journaled, Policy};

use super::bound::Bound;
use super::errors::StorageResult;

const ADD: &str = "add";
const DELETE: &str = "delete";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", bound = "T: Cell")]
pub enum MatrixMutation<T: Cell> {
    Add { cell: T },
    Delete { row: T::Row, col: T::Col },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixStorage<T: Cell> {
    rows: BTreeMap<T::Row, BTreeMap<T::Col, T>>,
    cols: BTreeMap<T::Col, BTreeSet<T::Row>>,
    len: usize,
}

impl<T: Cell> Default for MatrixStorage<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            cols: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<T: Cell> MatrixStorage<T> {
    fn cell(&self, row: &T::Row, col: &T::Col) -> Option<&T> {
        self.rows.get(row)?.get(col)
    }

    fn add(&mut self, cell: T) {
        let row = cell.row();
        let col = cell.col();

        self.cols.entry(col.clone()).or_default().insert(row.clone());
        if self.rows.entry(row).or_default().insert(col, cell).is_none() {
            self.len += 1;
        }
    }

    fn delete(&mut self, row: T::Row, col: T::Col) {
        let cells = match self.rows.get_mut(&row) {
            Some(cells) => cells,
            None => return,
        };
        if cells.remove(&col).is_none() {
            return;
        }
        self.len -= 1;

        if cells.is_empty() {
            self.rows.remove(&row);
        }
        if let Some(rows) = self.cols.get_mut(&col) {
            rows.remove(&row);
            if rows.is_empty() {
                self.cols.remove(&col);
            }
        }
    }
}

impl<T: Cell> Journaled for MatrixStorage<T> {
    type Mutation = MatrixMutation<T>;

    const OPERATIONS: &'static [&'static str] = &[ADD, DELETE];

    fn encode(mutation: &Self::Mutation) -> CodecResult<(&'static str, String)> {
        match mutation {
            MatrixMutation::Add { cell } => Ok((ADD, codec::encode(cell)?)),
            MatrixMutation::Delete { row, col } => Ok((
                DELETE,
                format!("{}\t{}", codec::encode(row)?, codec::encode(col)?),
            )),
        }
    }

    fn decode(operation: &str, payload: &str) -> CodecResult<Self::Mutation> {
        match operation {
            ADD => Ok(MatrixMutation::Add {
                cell: codec::decode(payload)?,
            }),
            DELETE => {
                let fields: Vec<&str> = payload.split('\t').collect();
                match fields.as_slice() {
                    [row, col] => Ok(MatrixMutation::Delete {
                        row: codec::decode(row)?,
                        col: codec::decode(col)?,
                    }),
                    _ => Err(CodecError::malformed(
                        payload,
                        format!("expected 2 tab-separated fields, found {}", fields.len()),
                    )),
                }
            }
            other => Err(CodecError::unknown_operation(other, payload)),
        }
    }

    fn apply(&mut self, mutation: Self::Mutation) -> StorageResult<()> {
        match mutation {
            MatrixMutation::Add { cell } => self.add(cell),
            MatrixMutation::Delete { row, col } => self.delete(row, col),
        }
        Ok(())
    }
}

/// Which map a view walks, and how a line of it reaches its cells.
pub trait Axis<T: Cell>: 'static {
    type Outer: IndexKey;
    type Inner: IndexKey;
    /// What the outer map holds per key
    type Members: 'static;

    fn index(storage: &MatrixStorage<T>) -> &BTreeMap<Self::Outer, Self::Members>;

    fn len(members: &Self::Members) -> usize;

    fn has(members: &Self::Members, inner: &Self::Inner) -> bool;

    fn get<'s>(
        storage: &'s MatrixStorage<T>,
        outer: &Self::Outer,
        members: &'s Self::Members,
        inner: &Self::Inner,
    ) -> Option<&'s T>;

    fn iter<'s>(
        storage: &'s MatrixStorage<T>,
        outer: &'s Self::Outer,
        members: &'s Self::Members,
    ) -> Box<dyn Iterator<Item = (&'s Self::Inner, &'s T)> + 's>;

    fn keys(members: &Self::Members) -> Box<dyn Iterator<Item = &Self::Inner> + '_>;
}

/// Row-major traversal: row -> col -> cell.
pub enum ByRow {}

/// Column-major traversal: col -> row -> cell.
pub enum ByCol {}

impl<T: Cell> Axis<T> for ByRow {
    type Outer = T::Row;
    type Inner = T::Col;
    type Members = BTreeMap<T::Col, T>;

    fn index(storage: &MatrixStorage<T>) -> &BTreeMap<T::Row, BTreeMap<T::Col, T>> {
        &storage.rows
    }

    fn len(cells: &BTreeMap<T::Col, T>) -> usize {
        cells.len()
    }

    fn has(cells: &BTreeMap<T::Col, T>, col: &T::Col) -> bool {
        cells.contains_key(col)
    }

    fn get<'s>(
        _storage: &'s MatrixStorage<T>,
        _row: &T::Row,
        cells: &'s BTreeMap<T::Col, T>,
        col: &T::Col,
    ) -> Option<&'s T> {
        cells.get(col)
    }

    fn iter<'s>(
        _storage: &'s MatrixStorage<T>,
        _row: &'s T::Row,
        cells: &'s BTreeMap<T::Col, T>,
    ) -> Box<dyn Iterator<Item = (&'s T::Col, &'s T)> + 's> {
        Box::new(cells.iter())
    }

    fn keys(cells: &BTreeMap<T::Col, T>) -> Box<dyn Iterator<Item = &T::Col> + '_> {
        Box::new(cells.keys())
    }
}

impl<T: Cell> Axis<T> for ByCol {
    type Outer = T::Col;
    type Inner = T::Row;
    type Members = BTreeSet<T::Row>;

    fn index(storage: &MatrixStorage<T>) -> &BTreeMap<T::Col, BTreeSet<T::Row>> {
        &storage.cols
    }

    fn len(rows: &BTreeSet<T::Row>) -> usize {
        rows.len()
    }

    fn has(rows: &BTreeSet<T::Row>, row: &T::Row) -> bool {
        rows.contains(row)
    }

    fn get<'s>(
        storage: &'s MatrixStorage<T>,
        col: &T::Col,
        _rows: &'s BTreeSet<T::Row>,
        row: &T::Row,
    ) -> Option<&'s T> {
        storage.cell(row, col)
    }

    fn iter<'s>(
        storage: &'s MatrixStorage<T>,
        col: &'s T::Col,
        rows: &'s BTreeSet<T::Row>,
    ) -> Box<dyn Iterator<Item = (&'s T::Row, &'s T)> + 's> {
        Box::new(
            rows.iter()
                .filter_map(move |row| storage.cell(row, col).map(|cell| (row, cell))),
        )
    }

    fn keys(rows: &BTreeSet<T::Row>) -> Box<dyn Iterator<Item = &T::Row> + '_> {
        Box::new(rows.iter())
    }
}

/// Read-only two-level view over one axis of a matrix.
pub struct AxisView<'a, T: Cell, A: Axis<T>> {
    storage: Ref<'a, MatrixStorage<T>>,
    _axis: PhantomData<A>,
}

pub type Rows<'a, T> = AxisView<'a, T, ByRow>;
pub type Cols<'a, T> = AxisView<'a, T, ByCol>;

impl<'a, T: Cell, A: Axis<T>> AxisView<'a, T, A> {
    fn new(storage: Ref<'a, MatrixStorage<T>>) -> Self {
        Self {
            storage,
            _axis: PhantomData,
        }
    }

    /// Number of outer keys with at least one cell.
    pub fn len(&self) -> usize {
        A::index(&self.storage).len()
    }

    pub fn is_empty(&self) -> bool {
        A::index(&self.storage).is_empty()
    }

    pub fn has(&self, outer: &A::Outer) -> bool {
        A::index(&self.storage).contains_key(outer)
    }

    pub fn get(&self, outer: &A::Outer) -> Option<Line<'_, T, A>> {
        let storage: &MatrixStorage<T> = &self.storage;
        A::index(storage)
            .get_key_value(outer)
            .map(|(key, members)| Line::new(key, members, storage))
    }

    /// Lines in ascending outer-key order.
    pub fn iter(&self) -> impl Iterator<Item = Line<'_, T, A>> + '_ {
        let storage: &MatrixStorage<T> = &self.storage;
        A::index(storage)
            .iter()
            .map(move |(key, members)| Line::new(key, members, storage))
    }

    pub fn keys(&self) -> impl Iterator<Item = &A::Outer> + '_ {
        A::index(&self.storage).keys()
    }
}

/// All cells sharing one outer key.
pub struct Line<'s, T: Cell, A: Axis<T>> {
    key: &'s A::Outer,
    members: &'s A::Members,
    storage: &'s MatrixStorage<T>,
}

impl<'s, T: Cell, A: Axis<T>> Line<'s, T, A> {
    fn new(key: &'s A::Outer, members: &'s A::Members, storage: &'s MatrixStorage<T>) -> Self {
        Self {
            key,
            members,
            storage,
        }
    }

    pub fn key(&self) -> &'s A::Outer {
        self.key
    }

    pub fn len(&self) -> usize {
        A::len(self.members)
    }

    pub fn is_empty(&self) -> bool {
        A::len(self.members) == 0
    }

    pub fn has(&self, inner: &A::Inner) -> bool {
        A::has(self.members, inner)
    }

    pub fn get(&self, inner: &A::Inner) -> Option<&'s T> {
        A::get(self.storage, self.key, self.members, inner)
    }

    /// `(inner key, cell)` pairs in ascending inner-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&'s A::Inner, &'s T)> + 's {
        A::iter(self.storage, self.key, self.members)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'s A::Inner> + 's {
        A::keys(self.members)
    }
}

/// Persisted sparse `(row, col) -> T` matrix with row and column indices.
pub struct Matrix<T: Cell, P: Policy = InMemory> {
    bound: Bound<MatrixStorage<T>, P>,
}

impl<T: Cell, P: Policy> Matrix<T, P> {
    pub fn new(name: &str, instance: &P::Instance) -> StorageResult<Self> {
        Ok(Self {
            bound: Bound::new(MatrixStorage::default(), name, instance)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bound.read().len == 0
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.bound.read().len
    }

    pub fn has(&self, row: &T::Row, col: &T::Col) -> bool {
        self.bound.read().cell(row, col).is_some()
    }

    pub fn get(&self, row: &T::Row, col: &T::Col) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.bound.read(), |storage| storage.cell(row, col)).ok()
    }

    pub fn rows(&self) -> Rows<'_, T> {
        AxisView::new(self.bound.read())
    }

    pub fn cols(&self) -> Cols<'_, T> {
        AxisView::new(self.bound.read())
    }

    /// Stores `cell` at its `(row, col)`, replacing any previous cell there.
    pub fn add(&mut self, cell: T) -> StorageResult<()> {
        self.bound.commit(MatrixMutation::Add { cell })
    }

    /// Removes the cell at `(row, col)`. Journaled even if absent.
    pub fn delete(&mut self, row: T::Row, col: T::Col) -> StorageResult<()> {
        self.bound.commit(MatrixMutation::Delete { row, col })
    }
}

/// Many-to-many relation between rows and columns.
pub type ManyToMany<T, P = InMemory> = Matrix<T, P>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::InMemoryInstance;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Edge {
        from: String,
        to: u32,
        weight: f64,
    }

    impl Cell for Edge {
        type Row = String;
        type Col = u32;

        fn row(&self) -> String {
            self.from.clone()
        }

        fn col(&self) -> u32 {
            self.to
        }
    }

    fn edge(from: &str, to: u32, weight: f64) -> Edge {
        Edge {
            from: from.to_string(),
            to,
            weight,
        }
    }

    fn matrix() -> Matrix<Edge> {
        Matrix::new("m", &InMemoryInstance::new()).unwrap()
    }

    #[test]
    fn test_add_then_delete_clears_both_indices() {
        let mut m = matrix();
        m.add(edge("r", 1, 0.5)).unwrap();
        assert!(m.has(&"r".to_string(), &1));

        m.delete("r".to_string(), 1).unwrap();

        assert!(m.is_empty());
        assert!(!m.rows().has(&"r".to_string()));
        assert!(!m.cols().has(&1));
        assert!(m.rows().is_empty());
        assert!(m.cols().is_empty());
    }

    #[test]
    fn test_shared_row_groups_columns() {
        let mut m = matrix();
        m.add(edge("r", 1, 0.1)).unwrap();
        m.add(edge("r", 2, 0.2)).unwrap();

        let rows = m.rows();
        assert_eq!(rows.len(), 1);
        let line = rows.get(&"r".to_string()).unwrap();
        assert_eq!(line.key(), "r");
        assert_eq!(line.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(line.get(&2).unwrap().weight, 0.2);

        let cols = m.cols();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols.get(&1).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_keeps_sibling_cells() {
        let mut m = matrix();
        m.add(edge("a", 1, 1.0)).unwrap();
        m.add(edge("a", 2, 2.0)).unwrap();
        m.add(edge("b", 1, 3.0)).unwrap();

        m.delete("a".to_string(), 1).unwrap();

        assert_eq!(m.len(), 2);
        let rows: Vec<(String, Vec<u32>)> = m
            .rows()
            .iter()
            .map(|line| (line.key().clone(), line.keys().copied().collect()))
            .collect();
        assert_eq!(
            rows,
            vec![("a".to_string(), vec![2]), ("b".to_string(), vec![1])]
        );

        let col_one: Vec<(String, f64)> = m
            .cols()
            .get(&1)
            .unwrap()
            .iter()
            .map(|(row, cell)| (row.clone(), cell.weight))
            .collect();
        assert_eq!(col_one, vec![("b".to_string(), 3.0)]);
    }

    #[test]
    fn test_add_replaces_existing_cell() {
        let mut m = matrix();
        m.add(edge("r", 1, 0.1)).unwrap();
        m.add(edge("r", 1, 0.9)).unwrap();

        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&"r".to_string(), &1).unwrap().weight, 0.9);
        assert_eq!(m.rows().get(&"r".to_string()).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_absent_cell_is_noop() {
        let mut m = matrix();
        m.add(edge("r", 1, 0.1)).unwrap();
        m.delete("r".to_string(), 7).unwrap();
        m.delete("x".to_string(), 1).unwrap();

        assert_eq!(m.len(), 1);
        assert!(m.rows().has(&"r".to_string()));
        assert!(!m.rows().has(&"x".to_string()));
        assert!(!m.cols().has(&7));
    }

    #[test]
    fn test_delete_payload_is_two_fields() {
        let delete = MatrixMutation::<Edge>::Delete {
            row: "r".to_string(),
            col: 3,
        };
        let (operation, payload) = MatrixStorage::<Edge>::encode(&delete).unwrap();
        assert_eq!(operation, "delete");
        assert_eq!(payload, "\"r\"\t3");

        assert_eq!(
            MatrixStorage::<Edge>::decode("delete", &payload).unwrap(),
            delete
        );
    }

    #[test]
    fn test_delete_payload_field_count_is_checked() {
        let err = MatrixStorage::<Edge>::decode("delete", "\"r\"").unwrap_err();
        assert!(matches!(err, CodecError::Malformed { .. }));
        assert!(MatrixStorage::<Edge>::decode("delete", "\"r\"\t1\t2").is_err());
    }

    thread_local! {
        static KEY_CLONES: std::cell::Cell<usize> = std::cell::Cell::new(0);
    }

    /// Axis key that counts how often it is cloned.
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
    struct Tag(String);

    impl Clone for Tag {
        fn clone(&self) -> Self {
            KEY_CLONES.with(|count| count.set(count.get() + 1));
            Tag(self.0.clone())
        }
    }

    fn tag(name: &str) -> Tag {
        Tag(name.to_string())
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Grant {
        user: Tag,
        group: Tag,
    }

    impl Cell for Grant {
        type Row = Tag;
        type Col = Tag;

        fn row(&self) -> Tag {
            self.user.clone()
        }

        fn col(&self) -> Tag {
            self.group.clone()
        }
    }

    #[test]
    fn test_lookups_borrow_keys() {
        let mut m: Matrix<Grant> = Matrix::new("grants", &InMemoryInstance::new()).unwrap();
        for (user, group) in [("ann", "ops"), ("ann", "dev"), ("bo", "ops")] {
            m.add(Grant {
                user: tag(user),
                group: tag(group),
            })
            .unwrap();
        }

        let (ann, ops, dev) = (tag("ann"), tag("ops"), tag("dev"));
        KEY_CLONES.with(|count| count.set(0));

        assert!(m.has(&ann, &ops));
        assert!(m.get(&ann, &dev).is_some());
        assert!(!m.has(&tag("bo"), &dev));

        let rows = m.rows();
        let row = rows.get(&ann).unwrap();
        assert!(row.get(&ops).is_some());
        assert_eq!(row.iter().count(), 2);

        let cols = m.cols();
        let col = cols.get(&ops).unwrap();
        assert!(col.get(&ann).is_some());
        assert_eq!(col.iter().count(), 2);
        assert_eq!(cols.iter().map(|line| line.len()).sum::<usize>(), 3);

        assert_eq!(KEY_CLONES.with(|count| count.get()), 0);
    }
}
