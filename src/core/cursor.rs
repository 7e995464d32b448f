// Random-access cursor over a buffered result set with a single cached raw row.
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::core::column::{Column, ColumnType};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::record::Record;
use crate::core::source::{Cell, RawRow, RowSource};
use crate::core::value::{self, DecodePolicy, Value};

/// Typed, indexable view over a buffered row source.
///
/// Only one raw row is materialized at a time. Reading an index other than the cached one
/// re-seeks the source, so every read takes `&mut self`.
#[derive(Debug)]
pub struct ResultSet<S: RowSource> {
    source: S,
    columns: Vec<Column>,
    names: Arc<[String]>,
    row_count: usize,
    policy: DecodePolicy,
    current: Option<(usize, RawRow)>,
}

impl<S: RowSource> ResultSet<S> {
    /// Wraps `source`, or returns `None` when it holds no rows or no fields.
    pub fn new(source: S) -> Result<Option<Self>> {
        Self::with_policy(source, DecodePolicy::default())
    }

    pub fn with_policy(mut source: S, policy: DecodePolicy) -> Result<Option<Self>> {
        let row_count = source.row_count();
        let field_count = source.field_count();
        if row_count == 0 || field_count == 0 {
            debug!(row_count, field_count, "statement produced no result");
            return Ok(None);
        }

        let columns = source
            .take_fields()
            .into_iter()
            .map(Column::from)
            .collect::<Vec<_>>();
        if columns.len() != field_count {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "source reported {field_count} fields but described {}",
                columns.len()
            )));
        }
        let names = columns
            .iter()
            .map(|column| column.name.clone())
            .collect::<Vec<_>>()
            .into();

        debug!(row_count, field_count, "captured result set metadata");
        Ok(Some(Self {
            source,
            columns,
            names,
            row_count,
            policy,
            current: None,
        }))
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Index of the materialized row, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|(index, _)| *index)
    }

    pub fn get(&mut self, index: usize) -> Result<Record> {
        self.check_index(index)?;
        let row = load(&mut self.source, &mut self.current, self.columns.len(), index)?;
        let values = self
            .columns
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| decode_cell(column, cell, self.policy, index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Record::new(Arc::clone(&self.names), values))
    }

    /// Decodes one column across every row, in row order.
    ///
    /// A failure part way through leaves no row cached.
    pub fn column(&mut self, name: &str) -> Result<Vec<Value>> {
        let idx = self.column_index(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("unknown field")
                .with_column(name)
        })?;

        self.current = None;
        let width = self.columns.len();
        let mut values = Vec::with_capacity(self.row_count);
        for index in 0..self.row_count {
            let decoded = load(&mut self.source, &mut self.current, width, index)
                .and_then(|row| decode_cell(&self.columns[idx], &row[idx], self.policy, index));
            match decoded {
                Ok(value) => values.push(value),
                Err(err) => {
                    self.current = None;
                    return Err(err);
                }
            }
        }
        Ok(values)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|field| field == name)
    }

    /// Restartable iteration over all records in row order.
    pub fn iter(&mut self) -> Records<'_, S> {
        Records { set: self, next: 0 }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.row_count {
            return Err(Error::new(ErrorKind::OutOfRange)
                .with_message(format!("row out of range (row count {})", self.row_count))
                .with_row(index));
        }
        Ok(())
    }
}

/// Converts a signed index from an outer surface; negatives are out of range.
pub fn row_index(index: i64, row_count: usize) -> Result<usize> {
    let err = Error::new(ErrorKind::OutOfRange)
        .with_message(format!("row {index} out of range (row count {row_count})"));
    match usize::try_from(index) {
        Ok(index) if index < row_count => Ok(index),
        Ok(index) => Err(err.with_row(index)),
        Err(_) => Err(err),
    }
}

/// Returns the raw row at `index`, seeking only when it is not already cached.
fn load<'a, S: RowSource>(
    source: &mut S,
    current: &'a mut Option<(usize, RawRow)>,
    width: usize,
    index: usize,
) -> Result<&'a RawRow> {
    let cached = matches!(current, Some((at, _)) if *at == index);
    if !cached {
        *current = None;
        trace!(index, "seek");
        source.seek(index)?;
        let row = source.fetch_next()?.ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message("row source returned no row")
                .with_row(index)
        })?;
        if row.len() != width {
            return Err(Error::new(ErrorKind::Internal)
                .with_message(format!("row has {} cells, expected {width}", row.len()))
                .with_row(index));
        }
        *current = Some((index, row));
    }
    match current {
        Some((_, row)) => Ok(row),
        None => Err(Error::new(ErrorKind::Internal).with_message("cursor lost its row")),
    }
}

fn decode_cell(column: &Column, cell: &Cell, policy: DecodePolicy, row: usize) -> Result<Value> {
    match value::decode(cell.as_deref(), column.column_type) {
        Ok(value) => Ok(value),
        Err(err)
            if policy == DecodePolicy::Lenient
                && matches!(column.column_type, ColumnType::Integer | ColumnType::Float) =>
        {
            warn!(row, column = %column.name, error = %err, "substituting null for undecodable cell");
            Ok(Value::Null)
        }
        Err(err) => Err(err.with_row(row).with_column(&column.name)),
    }
}

pub struct Records<'a, S: RowSource> {
    set: &'a mut ResultSet<S>,
    next: usize,
}

impl<S: RowSource> Iterator for Records<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.set.row_count {
            return None;
        }
        let record = self.set.get(self.next);
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.set.row_count.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<S: RowSource> ExactSizeIterator for Records<'_, S> {}

impl<'a, S: RowSource> IntoIterator for &'a mut ResultSet<S> {
    type Item = Result<Record>;
    type IntoIter = Records<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{ResultSet, row_index};
    use crate::core::column::{FieldMeta, NativeType, mysql};
    use crate::core::error::{ErrorKind, Result};
    use crate::core::source::{BufferedRows, RawRow, RowSource};
    use crate::core::value::{DecodePolicy, Value};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Counters {
        seeks: Cell<usize>,
        fetches: Cell<usize>,
        drops: Cell<usize>,
    }

    struct CountingSource {
        inner: BufferedRows,
        counters: Rc<Counters>,
    }

    impl RowSource for CountingSource {
        fn field_count(&self) -> usize {
            self.inner.field_count()
        }

        fn row_count(&self) -> usize {
            self.inner.row_count()
        }

        fn take_fields(&mut self) -> Vec<FieldMeta> {
            self.inner.take_fields()
        }

        fn seek(&mut self, index: usize) -> Result<()> {
            self.counters.seeks.set(self.counters.seeks.get() + 1);
            self.inner.seek(index)
        }

        fn fetch_next(&mut self) -> Result<Option<RawRow>> {
            self.counters.fetches.set(self.counters.fetches.get() + 1);
            self.inner.fetch_next()
        }
    }

    impl Drop for CountingSource {
        fn drop(&mut self) {
            self.counters.drops.set(self.counters.drops.get() + 1);
        }
    }

    fn cell(text: &str) -> Option<Vec<u8>> {
        Some(text.as_bytes().to_vec())
    }

    fn people(rows: usize) -> (CountingSource, Rc<Counters>) {
        let fields = vec![
            FieldMeta::new("id", NativeType::Mysql(mysql::LONG)),
            FieldMeta::new("name", NativeType::Mysql(mysql::VAR_STRING)),
            FieldMeta::new("born", NativeType::Mysql(mysql::DATE)),
        ];
        let data = (0..rows)
            .map(|i| {
                let born = if i % 2 == 0 {
                    cell(&format!("19{:02}-0{}-1{}", 50 + i, 1 + i % 9, i % 10))
                } else {
                    None
                };
                vec![cell(&i.to_string()), cell(&format!("person-{i}")), born]
            })
            .collect();
        let counters = Rc::new(Counters::default());
        let source = CountingSource {
            inner: BufferedRows::new(fields, data).expect("rows"),
            counters: Rc::clone(&counters),
        };
        (source, counters)
    }

    fn open(rows: usize) -> (ResultSet<CountingSource>, Rc<Counters>) {
        let (source, counters) = people(rows);
        let set = ResultSet::new(source).expect("new").expect("some result");
        (set, counters)
    }

    #[test]
    fn record_keys_match_field_names() {
        let (mut set, _) = open(4);
        assert_eq!(set.field_names(), ["id", "name", "born"]);
        for i in 0..set.row_count() {
            let record = set.get(i).expect("get");
            assert_eq!(record.names(), set.field_names());
            assert_eq!(record.len(), set.field_count());
        }
    }

    #[test]
    fn repeated_get_reuses_cached_row() {
        let (mut set, counters) = open(3);
        let first = set.get(1).expect("get");
        let second = set.get(1).expect("get again");
        assert_eq!(first, second);
        assert_eq!(counters.seeks.get(), 1);
        assert_eq!(counters.fetches.get(), 1);
        assert_eq!(set.current_index(), Some(1));
    }

    #[test]
    fn sequential_access_seeks_once_per_row() {
        let (mut set, counters) = open(5);
        for i in 0..5 {
            set.get(i).expect("get");
            set.get(i).expect("get cached");
        }
        assert_eq!(counters.seeks.get(), 5);
    }

    #[test]
    fn backward_access_reseeks() {
        let (mut set, counters) = open(3);
        set.get(2).expect("get");
        let record = set.get(0).expect("get back");
        assert_eq!(record["id"], Value::Int(0));
        assert_eq!(counters.seeks.get(), 2);
    }

    #[test]
    fn out_of_range_has_no_side_effect() {
        let (mut set, counters) = open(2);
        set.get(1).expect("get");
        let err = set.get(2).expect_err("out of range");
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.row(), Some(2));
        assert_eq!(set.current_index(), Some(1));
        assert_eq!(counters.seeks.get(), 1);

        let err = row_index(-1, set.row_count()).expect_err("negative");
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(row_index(1, set.row_count()).expect("index"), 1);
    }

    #[test]
    fn single_row_result_reads_index_zero() {
        let (mut set, _) = open(1);
        let record = set.get(0).expect("get");
        assert_eq!(record["name"], Value::Str("person-0".into()));
        assert_eq!(set.get(1).expect_err("past end").kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn column_matches_row_access() {
        let (mut set, _) = open(6);
        for name in ["id", "name", "born"] {
            let column = set.column(name).expect("column");
            assert_eq!(column.len(), set.row_count());
            for (i, value) in column.iter().enumerate() {
                let record = set.get(i).expect("get");
                assert_eq!(&record[name], value);
            }
        }
    }

    #[test]
    fn column_walk_seeks_every_row_and_leaves_last_cached() {
        let (mut set, counters) = open(4);
        set.get(0).expect("get");
        set.column("id").expect("column");
        assert_eq!(counters.seeks.get(), 5);
        assert_eq!(set.current_index(), Some(3));
    }

    #[test]
    fn unknown_column_keeps_set_usable() {
        let (mut set, counters) = open(3);
        let err = set.column("nonexistent").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.column(), Some("nonexistent"));
        assert_eq!(counters.seeks.get(), 0);
        assert_eq!(set.get(2).expect("get")["id"], Value::Int(2));
    }

    #[test]
    fn null_cells_decode_to_null() {
        let (mut set, _) = open(2);
        assert!(set.get(1).expect("get")["born"].is_null());
        assert!(!set.get(0).expect("get")["born"].is_null());
    }

    #[test]
    fn empty_results_are_no_result() {
        let (source, counters) = people(0);
        assert!(ResultSet::new(source).expect("new").is_none());
        assert_eq!(counters.drops.get(), 1);

        let mut source = BufferedRows::new(Vec::new(), vec![Vec::new()]).expect("rows");
        assert_eq!(source.take_fields().len(), 0);
        assert!(ResultSet::new(source).expect("new").is_none());
    }

    #[test]
    fn source_is_released_once_on_drop() {
        let (mut set, counters) = open(3);
        set.get(0).expect("get");
        assert_eq!(counters.drops.get(), 0);
        drop(set);
        assert_eq!(counters.drops.get(), 1);

        let (set, counters) = open(3);
        drop(set);
        assert_eq!(counters.drops.get(), 1);
    }

    #[test]
    fn iteration_is_restartable() {
        let (mut set, counters) = open(4);
        let ids = set
            .iter()
            .map(|record| record.expect("record")["id"].as_i64().expect("int"))
            .collect::<Vec<_>>();
        assert_eq!(ids, [0, 1, 2, 3]);
        assert_eq!(counters.seeks.get(), 4);

        assert_eq!(set.iter().len(), 4);
        let again = (&mut set).into_iter().count();
        assert_eq!(again, 4);
    }

    fn bad_integer_set(policy: DecodePolicy) -> ResultSet<BufferedRows> {
        let fields = vec![
            FieldMeta::new("n", NativeType::Mysql(mysql::LONGLONG)),
            FieldMeta::new("label", NativeType::Mysql(mysql::STRING)),
        ];
        let rows = vec![
            vec![cell("1"), cell("ok")],
            vec![cell("not-a-number"), cell("bad")],
        ];
        let source = BufferedRows::new(fields, rows).expect("rows");
        ResultSet::with_policy(source, policy).expect("new").expect("some")
    }

    #[test]
    fn strict_policy_fails_the_whole_row() {
        let mut set = bad_integer_set(DecodePolicy::Strict);
        let err = set.get(1).expect_err("decode");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.row(), Some(1));
        assert_eq!(err.column(), Some("n"));
        assert_eq!(set.column("n").expect_err("column").kind(), ErrorKind::Decode);
        assert_eq!(set.column("label").expect("labels").len(), 2);
    }

    #[test]
    fn failed_projection_clears_cached_row() {
        let fields = vec![FieldMeta::new("n", NativeType::Mysql(mysql::LONGLONG))];
        let rows = vec![vec![cell("1")], vec![cell("bad")], vec![cell("3")]];
        let source = BufferedRows::new(fields, rows).expect("rows");
        let mut set = ResultSet::new(source).expect("new").expect("some");

        set.get(0).expect("row 0");
        assert_eq!(set.current_index(), Some(0));

        let err = set.column("n").expect_err("decode");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.row(), Some(1));
        assert_eq!(set.current_index(), None);

        assert_eq!(set.get(2).expect("row 2")["n"], Value::Int(3));
        assert_eq!(set.current_index(), Some(2));
    }

    #[test]
    fn duplicate_names_resolve_to_first_column() {
        let fields = vec![
            FieldMeta::new("a", NativeType::Mysql(mysql::LONGLONG)),
            FieldMeta::new("a", NativeType::Mysql(mysql::STRING)),
        ];
        let source = BufferedRows::new(fields, vec![vec![cell("1"), cell("x")]]).expect("rows");
        let mut set = ResultSet::new(source).expect("new").expect("some");

        assert_eq!(set.column_index("a"), Some(0));
        assert_eq!(set.column("a").expect("column"), [Value::Int(1)]);
        let record = set.get(0).expect("row");
        assert_eq!(record["a"], Value::Int(1));
        assert_eq!(record.get_index(1).and_then(Value::as_bytes), Some(&b"x"[..]));
        assert_eq!(record.into_values().len(), 2);
    }

    #[test]
    fn lenient_policy_substitutes_null() {
        let mut set = bad_integer_set(DecodePolicy::Lenient);
        let record = set.get(1).expect("get");
        assert!(record["n"].is_null());
        assert_eq!(set.column("n").expect("column"), [Value::Int(1), Value::Null]);
    }
}
