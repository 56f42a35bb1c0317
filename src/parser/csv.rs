//! Lenient RFC 4180 record reader for email exports.
//!
//! Quoted fields may contain commas, doubled quotes and line breaks (email
//! bodies nearly always do). Malformed input never aborts the read: stray
//! quotes are kept literally and an unterminated quoted field at end of
//! input closes the last record and is reported.

/// One CSV record with the physical line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    /// 1-based line number of the record's first character.
    pub line: usize,
    pub fields: Vec<String>,
}

/// A problem noticed while reading records. The record is still returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvIssue {
    /// A quoted field ran to the end of input without a closing quote.
    UnterminatedQuote { line: usize },
}

impl CsvIssue {
    /// Line the problem was found on.
    pub fn line(&self) -> usize {
        match self {
            Self::UnterminatedQuote { line } => *line,
        }
    }
}

impl std::fmt::Display for CsvIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnterminatedQuote { line } => {
                write!(f, "quoted field starting on line {line} is never closed")
            }
        }
    }
}

/// All records of a document plus any issues found.
#[derive(Debug, Default)]
pub struct CsvDocument {
    pub records: Vec<CsvRecord>,
    pub issues: Vec<CsvIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Just saw a `"` inside a quoted field: either an escape or the close.
    QuoteInQuoted,
}

struct Reader {
    state: State,
    line: usize,
    record_line: usize,
    quote_line: usize,
    field: String,
    fields: Vec<String>,
    /// Whether anything (even an empty quoted field) has been read for this record.
    started: bool,
    doc: CsvDocument,
}

impl Reader {
    fn new() -> Self {
        Self {
            state: State::FieldStart,
            line: 1,
            record_line: 1,
            quote_line: 1,
            field: String::new(),
            fields: Vec::new(),
            started: false,
            doc: CsvDocument::default(),
        }
    }

    fn end_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.field));
        self.state = State::FieldStart;
    }

    fn end_record(&mut self) {
        if self.started || !self.field.is_empty() || !self.fields.is_empty() {
            self.end_field();
            self.doc.records.push(CsvRecord {
                line: self.record_line,
                fields: std::mem::take(&mut self.fields),
            });
        }
        self.state = State::FieldStart;
        self.started = false;
        self.record_line = self.line;
    }

    fn feed(&mut self, c: char) {
        if !self.started && self.fields.is_empty() && self.field.is_empty() {
            self.record_line = self.line;
        }

        match (self.state, c) {
            (State::Quoted, '"') => self.state = State::QuoteInQuoted,
            (State::Quoted, _) => self.field.push(c),
            (State::QuoteInQuoted, '"') => {
                self.field.push('"');
                self.state = State::Quoted;
            }
            (State::FieldStart, '"') => {
                self.started = true;
                self.quote_line = self.line;
                self.state = State::Quoted;
            }
            (_, ',') => {
                self.started = true;
                self.end_field();
            }
            (_, '\n') => self.end_record(),
            // A bare CR is dropped; CRLF ends the record on the LF.
            (_, '\r') => {}
            (State::QuoteInQuoted, _) => {
                // Text after a closing quote is kept as-is.
                self.field.push(c);
                self.state = State::Unquoted;
            }
            (State::FieldStart | State::Unquoted, _) => {
                self.started = true;
                self.field.push(c);
                self.state = State::Unquoted;
            }
        }

        if c == '\n' {
            self.line += 1;
        }
    }

    fn finish(mut self) -> CsvDocument {
        if self.state == State::Quoted {
            self.doc.issues.push(CsvIssue::UnterminatedQuote {
                line: self.quote_line,
            });
        }
        self.end_record();
        self.doc
    }
}

/// Read every record from `input`. Blank lines between records are skipped.
pub fn read_records(input: &str) -> CsvDocument {
    let mut reader = Reader::new();
    for c in input.chars() {
        reader.feed(c);
    }
    reader.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(doc: &CsvDocument) -> Vec<Vec<&str>> {
        doc.records
            .iter()
            .map(|r| r.fields.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_simple_records() {
        let doc = read_records("a,b,c\n1,2,3\n");
        assert_eq!(fields(&doc), vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn test_quoted_multiline_field() {
        let doc = read_records("Subject,Body\r\n\"Hi\",\"line one\r\nline, two\"\r\nNext,x\r\n");
        assert_eq!(
            fields(&doc),
            vec![
                vec!["Subject", "Body"],
                vec!["Hi", "line one\r\nline, two"],
                vec!["Next", "x"]
            ]
        );
        assert_eq!(doc.records[1].line, 2);
        assert_eq!(doc.records[2].line, 4);
    }

    #[test]
    fn test_escaped_quotes() {
        let doc = read_records("\"say \"\"hi\"\"\",b");
        assert_eq!(fields(&doc), vec![vec!["say \"hi\"", "b"]]);
    }

    #[test]
    fn test_empty_fields_and_blank_lines() {
        let doc = read_records("a,,c\n\n,\n\"\"\n");
        assert_eq!(
            fields(&doc),
            vec![vec!["a", "", "c"], vec!["", ""], vec![""]]
        );
    }

    #[test]
    fn test_no_trailing_newline() {
        let doc = read_records("a,b");
        assert_eq!(fields(&doc), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let doc = read_records("a,b\n1,\"never closed\nmore");
        assert_eq!(doc.records.len(), 2);
        assert_eq!(doc.records[1].fields[1], "never closed\nmore");
        assert_eq!(doc.issues, vec![CsvIssue::UnterminatedQuote { line: 2 }]);
    }

    #[test]
    fn test_stray_quote_kept_literally() {
        let doc = read_records("ab\"c,\"d\"e\n");
        assert_eq!(fields(&doc), vec![vec!["ab\"c", "de"]]);
    }
}
