#![allow(dead_code)]

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Field separator for delimited text, one string or a set of characters
pub enum Delimiter {
    Str(String),
    Chars(Vec<char>),
}

impl From<&str> for Delimiter {
    fn from(s: &str) -> Self {
        Delimiter::Str(s.to_string())
    }
}

impl From<Vec<char>> for Delimiter {
    fn from(chars: Vec<char>) -> Self {
        Delimiter::Chars(chars)
    }
}

impl From<&[char]> for Delimiter {
    fn from(chars: &[char]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

impl<const N: usize> From<&[char; N]> for Delimiter {
    fn from(chars: &[char; N]) -> Self {
        Delimiter::Chars(chars.to_vec())
    }
}

fn is_gzipped(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|x| x.to_str())
        .map(|x| x == "gz")
        .unwrap_or(false)
}

/// Buffered reader over a plain or gzipped file, decided by extension
pub fn open_buf_reader(input_file: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(input_file)?;
    if is_gzipped(input_file) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Buffered writer to a plain or gzipped file, decided by extension.
/// The names `stdout` and `stderr` redirect to the console streams.
pub fn open_buf_writer(output_file: &str) -> anyhow::Result<Box<dyn Write>> {
    if output_file.eq_ignore_ascii_case("stdout") {
        return Ok(Box::new(BufWriter::new(std::io::stdout())));
    }
    if output_file.eq_ignore_ascii_case("stderr") {
        return Ok(Box::new(BufWriter::new(std::io::stderr())));
    }

    let file = File::create(output_file)?;
    if is_gzipped(output_file) {
        let encoder = GzEncoder::new(file, flate2::Compression::default());
        Ok(Box::new(BufWriter::new(encoder)))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Rows of a delimited file split into words, with the header row kept
/// apart when one was requested
pub struct ParsedLines<T> {
    pub rows: Vec<Vec<T>>,
    pub header: Vec<Box<str>>,
}

/// Read a delimited text file into rows of words.
///
/// Lines starting with `#` or `%` are dropped, as are the empty words
/// produced by runs of consecutive delimiters.
///
/// * `input_file` - plain or gzipped
/// * `delim` - field separator
/// * `hdr_line` - index of the header row among the non-comment lines,
///   or a negative value when there is none
pub fn read_lines_of_words_delim(
    input_file: &str,
    delim: impl Into<Delimiter>,
    hdr_line: i64,
) -> anyhow::Result<ParsedLines<Box<str>>> {
    let delim = delim.into();

    let split = |line: &str| -> Vec<Box<str>> {
        let words: Vec<&str> = match &delim {
            Delimiter::Str(s) => line.split(s.as_str()).collect(),
            Delimiter::Chars(cs) => line.split(cs.as_slice()).collect(),
        };
        words
            .into_iter()
            .filter(|w| !w.is_empty())
            .map(|w| w.to_owned().into_boxed_str())
            .collect()
    };

    let mut header = vec![];
    let mut rows = vec![];

    let reader = open_buf_reader(input_file)?;
    let mut data_line = 0_i64;
    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        if data_line == hdr_line {
            header = split(&line);
        } else {
            rows.push(split(&line));
        }
        data_line += 1;
    }

    if hdr_line >= 0 && data_line <= hdr_line {
        return Err(anyhow::anyhow!(
            "{}: no line {} to take a header from",
            input_file,
            hdr_line
        ));
    }

    Ok(ParsedLines { rows, header })
}

/// Write one `Display` value per line; a broken pipe ends the output
/// quietly so piping into `head` works
pub fn write_types<T>(lines: &Vec<T>, output_file: &str) -> anyhow::Result<()>
where
    T: std::fmt::Display,
{
    let mut buf = open_buf_writer(output_file)?;
    for line in lines {
        match writeln!(buf, "{}", line) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
    buf.flush()?;
    Ok(())
}

/// Write pre-rendered lines to a plain or gzipped file
pub fn write_lines(lines: &Vec<Box<str>>, output_file: &str) -> anyhow::Result<()> {
    write_types(lines, output_file)
}

/// Create the parent directory of `file` when it does not exist yet
pub fn mkdir(file: &str) -> anyhow::Result<()> {
    let dir = Path::new(file)
        .parent()
        .ok_or(anyhow::anyhow!("no parent directory in {}", file))?;
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Suggest a writable file path with the given suffix inside a fresh
/// temporary directory
pub fn create_temp_dir_file(suffix: &str) -> anyhow::Result<std::path::PathBuf> {
    let temp_dir = tempfile::tempdir()?.path().to_path_buf();
    std::fs::create_dir_all(&temp_dir)?;
    let temp_file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile_in(temp_dir)?
        .path()
        .to_owned();
    Ok(temp_file)
}

/// Remove a file or directory tree if present
pub fn remove_file(file: &str) -> anyhow::Result<()> {
    let path = Path::new(file);
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
