/// One source file as read from disk: renamed headers, untyped cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Bare file name of the source, stamped into `source_file` downstream.
    pub source_file: String,
    /// Header cells after trimming and the era rename. Unmapped headers keep their raw text.
    pub headers: Vec<String>,
    /// Each data record, padded or truncated to `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Cells of column `idx`, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    pub fn position(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}
