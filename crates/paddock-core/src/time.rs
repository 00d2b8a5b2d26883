use chrono::Local;

/// Local wall-clock time as `YYYY-mm-dd HH:MM:SS`, used in exports.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Compact local time as `YYYYmmdd_HHMMSS`, used in backup file names.
pub fn file_stamp_now() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_have_expected_shape() {
        let ts = timestamp_now();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        let stamp = file_stamp_now();
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
    }
}
