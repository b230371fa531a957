//! Plain text format (`# 1`)
//!
//! ```text
//! # 1
//! file:/work/classes/Foo.class 8127346512
//! file:/work/classes/Bar.class 1203948
//! ```

use std::io::{BufRead, Write};

use super::Lines;
use crate::mode::Mode;
use crate::regdata::RegDataSet;
use crate::Result;

pub fn write<W: Write>(writer: &mut W, records: &RegDataSet) -> Result<()> {
    writeln!(writer, "{}", Mode::Txt.magic())?;
    super::write_record_lines(writer, records)
}

pub fn read<R: BufRead>(reader: R) -> Result<RegDataSet> {
    let mut lines = Lines::new(reader, Mode::Txt);
    lines.expect_header()?;
    super::read_record_lines(&mut lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_record_without_separator_is_malformed() {
        let input = b"# 1\nfile:/a/b.class 1\nbroken\n";
        let err = read(&input[..]).unwrap_err();
        match err {
            Error::Format { mode, reason } => {
                assert_eq!(mode, Mode::Txt);
                assert!(reason.contains("line 3"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let input = b"# 1\n\nfile:/a/b.class 1\n\n";
        assert_eq!(read(&input[..]).unwrap().len(), 1);
    }

    #[test]
    fn test_wrong_header() {
        assert!(read(&b"# 9\n"[..]).is_err());
    }
}
