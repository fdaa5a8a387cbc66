use crate::import::FileDescriptor;

const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Binary multiples; plain bytes are shown whole, larger units with
/// `precision` decimals.
pub fn pretty_bytes(size: u64, precision: usize) -> String {
    if size < 1024 {
        return format!("{} B", size);
    }

    let mut value = size as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.*} {}", precision, value, unit)
}

pub fn describe_file(file: &FileDescriptor) -> String {
    format!("{} ({})", file.name, pretty_bytes(file.size, 0))
}

/// Heading for a picked selection: a single file is named, several are counted.
pub fn describe_selection(files: &[FileDescriptor]) -> Option<String> {
    match files {
        [] => None,
        [file] => Some(describe_file(file)),
        files => {
            let total = files.iter().map(|file| file.size).sum();
            Some(format!("{} files ({})", files.len(), pretty_bytes(total, 1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(pretty_bytes(512, 0), "512 B");
        assert_eq!(pretty_bytes(1023, 2), "1023 B");
        assert_eq!(pretty_bytes(1024, 0), "1 KB");
        assert_eq!(pretty_bytes(1700, 0), "2 KB");
        assert_eq!(pretty_bytes(1700, 2), "1.66 KB");
        assert_eq!(pretty_bytes(5 * 1024 * 1024, 1), "5.0 MB");
    }

    #[test]
    fn selection_names_one_file_and_counts_several() {
        assert_eq!(describe_selection(&[]), None);

        let report = FileDescriptor::from_bytes("report.pdf", vec![0u8; 2048]);
        assert_eq!(
            describe_selection(std::slice::from_ref(&report)),
            Some("report.pdf (2 KB)".to_string())
        );

        let notes = FileDescriptor::from_bytes("notes.txt", vec![0u8; 1024]);
        assert_eq!(
            describe_selection(&[report, notes]),
            Some("2 files (3.0 KB)".to_string())
        );
    }
}
