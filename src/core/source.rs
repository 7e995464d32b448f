// Collaborator seams: buffered row sources, connections, and the in-memory buffered source.
use crate::core::column::FieldMeta;
use crate::core::error::{Error, ErrorKind, Result};

/// One raw cell: bytes as the server sent them, or `None` for SQL NULL.
pub type Cell = Option<Vec<u8>>;
pub type RawRow = Vec<Cell>;

/// A fully buffered result that can only be read forward from a seek position.
///
/// Dropping the source releases its buffers; owners drop it exactly once.
pub trait RowSource {
    fn field_count(&self) -> usize;

    fn row_count(&self) -> usize;

    /// Field descriptors in reported order. The metadata is consumed: later calls return
    /// an empty list.
    fn take_fields(&mut self) -> Vec<FieldMeta>;

    /// Repositions the read cursor; backward seeks are allowed.
    fn seek(&mut self, index: usize) -> Result<()>;

    /// Reads the row at the current position and advances past it.
    fn fetch_next(&mut self) -> Result<Option<RawRow>>;
}

/// A session that runs SQL text and hands back buffered results.
pub trait Connection {
    type Rows: RowSource;

    fn execute_query(&mut self, sql: &str) -> Result<Self::Rows>;

    /// Runs a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, sql: &str) -> Result<u64>;
}

#[derive(Debug)]
pub struct BufferedRows {
    fields: Vec<FieldMeta>,
    field_count: usize,
    rows: Vec<RawRow>,
    position: usize,
}

impl BufferedRows {
    pub fn new(fields: Vec<FieldMeta>, rows: Vec<RawRow>) -> Result<Self> {
        let field_count = fields.len();
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != field_count)
        {
            return Err(Error::new(ErrorKind::Internal)
                .with_message(format!(
                    "row has {} cells, expected {field_count}",
                    row.len()
                ))
                .with_row(index));
        }
        Ok(Self {
            fields,
            field_count,
            rows,
            position: 0,
        })
    }
}

impl RowSource for BufferedRows {
    fn field_count(&self) -> usize {
        self.field_count
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn take_fields(&mut self) -> Vec<FieldMeta> {
        std::mem::take(&mut self.fields)
    }

    fn seek(&mut self, index: usize) -> Result<()> {
        self.position = index;
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<RawRow>> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        Ok(row)
    }
}

impl Drop for BufferedRows {
    fn drop(&mut self) {
        tracing::trace!(rows = self.rows.len(), "released buffered rows");
    }
}
