use crate::fetcher::FetchResult;
use std::io::{self, Write};

/// Print the collected metadata, one block per logical name.
pub fn write_report<W: Write>(out: &mut W, result: &FetchResult) -> io::Result<()> {
    if result.metadata.is_empty() {
        writeln!(out, "No metadata found.")?;
    } else {
        for (name, data) in result.metadata.iter() {
            writeln!(out, "Meta Data for: {}", name)?;
            writeln!(out, "{}", data)?;
            writeln!(out)?;
        }
    }

    if !result.skipped.is_empty() {
        writeln!(out, "Skipped objects:")?;
        for (key, error) in &result.skipped {
            writeln!(out, "- {}: {}", key, error)?;
        }
    }

    Ok(())
}
