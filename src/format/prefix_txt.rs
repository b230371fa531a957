//! Prefix-compressed text format (`# 4`)
//!
//! Dependencies of one test unit usually share a handful of class-path
//! roots. Each distinct directory prefix is written once in a table and
//! records refer to it by index:
//!
//! ```text
//! # 4
//! @0 file:/work/target/classes/com/example/
//! @1 jar:file:/m2/junit.jar!/org/junit/
//! 0 Foo.class 8127346512
//! 0 Bar.class 1203948
//! 1 Assert.class 77
//! ```
//!
//! Prefixes, suffixes and hashes are escaped like the other text formats.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};

use super::{escape, Lines};
use crate::mode::Mode;
use crate::regdata::{self, RegData, RegDataSet};
use crate::Result;

/// Split a URL after its last `/`.
fn split_prefix(url: &str) -> (&str, &str) {
    match url.rfind('/') {
        Some(idx) => url.split_at(idx + 1),
        None => ("", url),
    }
}

pub fn write<W: Write>(writer: &mut W, records: &RegDataSet) -> Result<()> {
    writeln!(writer, "{}", Mode::PrefixTxt.magic())?;

    let sorted = regdata::sorted(records);
    let mut table: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &sorted {
        let (prefix, _) = split_prefix(record.url());
        let next = table.len();
        table.entry(prefix).or_insert(next);
    }

    let mut by_index: Vec<(&str, usize)> = table.iter().map(|(p, i)| (*p, *i)).collect();
    by_index.sort_by_key(|(_, i)| *i);
    for (prefix, index) in by_index {
        writeln!(writer, "@{} {}", index, escape(prefix))?;
    }

    for record in sorted {
        let (prefix, suffix) = split_prefix(record.url());
        writeln!(
            writer,
            "{} {} {}",
            table[prefix],
            escape(suffix),
            escape(record.hash())
        )?;
    }
    Ok(())
}

pub fn read<R: BufRead>(reader: R) -> Result<RegDataSet> {
    let mut lines = Lines::new(reader, Mode::PrefixTxt);
    lines.expect_header()?;

    let mut prefixes: Vec<String> = Vec::new();
    let mut records = RegDataSet::new();
    while let Some(line) = lines.next_line()? {
        if line.is_empty() {
            continue;
        }

        if let Some(entry) = line.strip_prefix('@') {
            let (index, prefix) = entry
                .split_once(' ')
                .filter(|(_, prefix)| !prefix.contains(' '))
                .ok_or_else(|| lines.error("expected `@<index> <prefix>`"))?;
            let index: usize = index
                .parse()
                .map_err(|_| lines.error(format!("bad prefix index {:?}", index)))?;
            if index != prefixes.len() {
                return Err(lines.error(format!("prefix index {} out of sequence", index)));
            }
            prefixes.push(lines.field(prefix)?.into_owned());
            continue;
        }

        let fields: Vec<&str> = line.split(' ').collect();
        let [index, suffix, hash] = fields[..] else {
            return Err(lines.error("expected `<index> <suffix> <hash>`"));
        };
        let prefix = index
            .parse::<usize>()
            .ok()
            .and_then(|i| prefixes.get(i))
            .ok_or_else(|| lines.error(format!("unknown prefix index {:?}", index)))?;
        let url = format!("{}{}", prefix, lines.field(suffix)?);
        records.insert(RegData::new(url, lines.field(hash)?));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_prefix_written_once() {
        let records: RegDataSet = [
            RegData::new("file:/work/classes/Foo.class", "1"),
            RegData::new("file:/work/classes/Bar.class", "2"),
        ]
        .into_iter()
        .collect();

        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "# 4\n@0 file:/work/classes/\n0 Bar.class 2\n0 Foo.class 1\n"
        );
    }

    #[test]
    fn test_url_without_slash() {
        let records: RegDataSet = [RegData::new("opaque", "9")].into_iter().collect();
        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();
        assert_eq!(read(buf.as_slice()).unwrap(), records);
    }

    #[test]
    fn test_spaces_in_prefix_and_hash_are_escaped() {
        let records: RegDataSet = [RegData::new("file:/my dir/B.class", "12 34")]
            .into_iter()
            .collect();
        let mut buf = Vec::new();
        write(&mut buf, &records).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text, "# 4\n@0 file:/my\\sdir/\n0 B.class 12\\s34\n");
        assert_eq!(read(buf.as_slice()).unwrap(), records);
    }

    #[test]
    fn test_extra_field_is_malformed() {
        let input = b"# 4\n@0 file:/a/\n0 B.class 12 34\n";
        assert!(read(&input[..]).is_err());
    }

    #[test]
    fn test_unknown_prefix_index_is_malformed() {
        let input = b"# 4\n@0 file:/a/\n3 B.class 1\n";
        assert!(read(&input[..]).is_err());
    }

    #[test]
    fn test_out_of_sequence_prefix_is_malformed() {
        let input = b"# 4\n@1 file:/a/\n";
        assert!(read(&input[..]).is_err());
    }
}
