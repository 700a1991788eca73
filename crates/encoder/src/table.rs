use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use component::ComponentError;
use fxhash::FxHashMap;
use tracing::debug;

/// Token -> fixed-length vector lookup loaded from a plain-text table.
///
/// Each line is `<token> <v1> ... <vD>`, separated by whitespace. Rows with
/// fewer than `D` values, an unparsable or non-finite value, or invalid UTF-8
/// are skipped; extra values past `D` are ignored. A token that appears twice
/// keeps its last row.
#[derive(Debug, Clone)]
pub struct VectorTable {
    dimension: usize,
    vectors: FxHashMap<String, Vec<f32>>,
    zero: Vec<f32>,
}

impl VectorTable {
    /// Read a table from disk, skipping the first `skip_rows` lines.
    pub fn load(path: &Path, skip_rows: usize, dimension: usize) -> Result<Self, ComponentError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), skip_rows, dimension)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
        skip_rows: usize,
        dimension: usize,
    ) -> Result<Self, ComponentError> {
        let start = Instant::now();
        let mut vectors = FxHashMap::default();
        let mut skipped = 0usize;
        for line in reader.split(b'\n').skip(skip_rows) {
            let line = line?;
            let row = std::str::from_utf8(&line)
                .ok()
                .and_then(|text| parse_row(text, dimension));
            match row {
                Some((token, vector)) => {
                    vectors.insert(token.to_string(), vector);
                }
                None => skipped += 1,
            }
        }
        debug!(
            dimension,
            kept = vectors.len(),
            skipped,
            elapsed_micros = start.elapsed().as_micros(),
            "vector_table_parsed"
        );
        Ok(Self {
            dimension,
            vectors,
            zero: vec![0.0; dimension],
        })
    }

    /// The stored vector, or the zero vector for unknown tokens.
    pub fn lookup(&self, token: &str) -> &[f32] {
        self.vectors
            .get(token)
            .map(Vec::as_slice)
            .unwrap_or(&self.zero)
    }

    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.vectors.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn parse_row(line: &str, dimension: usize) -> Option<(&str, Vec<f32>)> {
    let mut fields = line.split_whitespace();
    let token = fields.next()?;
    let mut vector = Vec::with_capacity(dimension);
    for field in fields.take(dimension) {
        vector.push(field.parse::<f32>().ok().filter(|v| v.is_finite())?);
    }
    (vector.len() == dimension).then_some((token, vector))
}
