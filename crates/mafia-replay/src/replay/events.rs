use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One event line with its 1-based position in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLine {
    pub line_number: usize,
    pub text: String,
}

/// Reads every event line, skipping blank lines and `#` comments.
pub fn load_events(path: &Path) -> std::io::Result<Vec<EventLine>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        events.push(EventLine {
            line_number: index + 1,
            text: text.to_string(),
        });
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_comments_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "# day one\n1s7\n\n  2: 1,3  \n# night\n9e\n").expect("write events");

        let events = load_events(file.path()).expect("load");
        let texts: Vec<&str> = events.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["1s7", "2: 1,3", "9e"]);
        assert_eq!(events[1].line_number, 4);
        assert_eq!(events[2].line_number, 6);
    }
}
