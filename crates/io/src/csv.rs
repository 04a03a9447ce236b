// CSV/TSV import

use panelmerge_engine::{ConsolidateError, Table, Value};

use crate::header_label;

/// Parse delimited text into a table. First record is the header row.
///
/// `delimiter` of `None` sniffs it from the first lines. Rows shorter than
/// the header are padded with blanks; longer rows are rejected.
pub fn load_delimited(name: &str, bytes: &[u8], delimiter: Option<u8>) -> Result<Table, ConsolidateError> {
    let content = decode_to_utf8(bytes);
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    table_from_str(name, &content, delimiter)
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to Windows-1252
/// (common for Excel-exported CSVs).
pub fn decode_to_utf8(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across the first few records.
///
/// For each candidate (comma, tab, semicolon, pipe), count fields per record, ignoring
/// delimiters inside double quotes. The delimiter that produces the most consistent field
/// count (>1 field) wins; ties go to the earlier candidate, so comma beats the others.
/// Single-column files fall back to comma.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b',', b'\t', b';', b'|'];
    let sample = sample_records(content, 10);

    if sample.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample.iter().map(|record| field_count(record, delim)).collect();

        // Must produce >1 field on the header record to be viable
        if counts[0] <= 1 {
            continue;
        }

        // Score: (records with the header's field count) * field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// First `limit` non-empty records. Line breaks inside quotes don't end a record.
fn sample_records(content: &str, limit: usize) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, b) in content.bytes().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                let record = content[start..i].trim_end_matches('\r');
                if !record.is_empty() {
                    records.push(record);
                    if records.len() == limit {
                        return records;
                    }
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = content[start..].trim_end_matches('\r');
    if !tail.is_empty() {
        records.push(tail);
    }
    records
}

fn field_count(record: &str, delim: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 1;
    for b in record.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            count += 1;
        }
    }
    count
}

fn table_from_str(name: &str, content: &str, delimiter: u8) -> Result<Table, ConsolidateError> {
    let parse_err = |message: String| ConsolidateError::Parse { name: name.to_string(), message };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();

    let header_record = match records.next() {
        Some(r) => r.map_err(|e| parse_err(e.to_string()))?,
        None => return Err(parse_err("no columns to parse from file".into())),
    };
    let headers: Vec<String> = header_record
        .iter()
        .enumerate()
        .map(|(i, h)| header_label(h, i))
        .collect();
    let width = headers.len();

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| parse_err(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() > width {
            return Err(parse_err(format!(
                "line {line}: expected {width} field(s), saw {}",
                record.len()
            )));
        }

        let mut row: Vec<Value> = record.iter().map(Value::from_text).collect();
        row.resize(width, Value::Blank);
        rows.push(row);
    }

    Table::new(headers, rows)
}
