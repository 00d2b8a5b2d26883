use std::collections::BTreeSet;

use paddock_core::GameError;
use paddock_core::RaceSnapshot;
use paddock_core::driver::DriverCode;

use crate::config::LiveTimingConfig;

/// Reduce an HTML page to its visible text. Script and style bodies are
/// dropped and tags become single spaces.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let Some(close) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = after[1..close].trim_start().to_ascii_lowercase();
        rest = &after[close + 1..];
        for skipped in ["script", "style"] {
            if tag.starts_with(skipped) {
                let end = format!("</{skipped}");
                rest = match rest.to_ascii_lowercase().find(&end) {
                    Some(at) => &rest[at..],
                    None => "",
                };
            }
        }
        out.push(' ');
    }
    out.push_str(rest);
    out.replace("&nbsp;", " ").replace("&amp;", "&")
}

/// Offset of the first standalone occurrence of `code` in `text`.
fn find_code(text: &str, code: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(rel) = text[from..].find(code) {
        let at = from + rel;
        let end = at + code.len();
        let before_ok = at == 0 || !bytes[at - 1].is_ascii_alphabetic();
        let after_ok = end >= bytes.len() || !bytes[end].is_ascii_alphabetic();
        if before_ok && after_ok {
            return Some(at);
        }
        from = end;
    }
    None
}

/// Turn dashboard text into a snapshot.
///
/// Drivers are ordered by where their code first appears. With
/// `detect_dnf`, a driver whose stretch of text (up to the next driver,
/// or `tail_window` characters for the last one) contains the DNF marker
/// is retired. Classification stops once `max_drivers` are ranked.
pub fn scan_classification(
    text: &str,
    detect_dnf: bool,
    config: &LiveTimingConfig,
) -> Result<RaceSnapshot, GameError> {
    let mut found: Vec<(usize, DriverCode)> = DriverCode::ALL
        .into_iter()
        .filter_map(|d| find_code(text, d.code()).map(|at| (at, d)))
        .collect();
    found.sort_by_key(|&(at, _)| at);

    if found.is_empty() {
        return Err(GameError::source_unavailable(
            "no driver codes found on the dashboard",
        ));
    }

    let mut order = Vec::new();
    let mut dnf = BTreeSet::new();
    for (i, &(at, driver)) in found.iter().enumerate() {
        if order.len() >= config.max_drivers {
            break;
        }
        if detect_dnf {
            let end = match found.get(i + 1) {
                Some(&(next, _)) => next,
                None => floor_char_boundary(text, at + config.tail_window),
            };
            if text[at..end].contains(config.dnf_marker.as_str()) {
                dnf.insert(driver);
                continue;
            }
        }
        order.push(driver);
    }

    RaceSnapshot::from_classification(&order, &dnf)
        .map_err(|e| GameError::source_unavailable(format!("malformed dashboard data: {e}")))
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::driver::Team;

    fn config() -> LiveTimingConfig {
        LiveTimingConfig::default()
    }

    #[test]
    fn strips_markup_and_scripts() {
        let html = "<html><head><script>var VER = 1;</script><style>.x{}</style></head>\
                    <body><div>NOR</div><span>PIA&nbsp;+1.2</span></body></html>";
        let text = strip_tags(html);
        assert!(!text.contains("VER"));
        assert!(text.contains("NOR"));
        assert!(text.contains("PIA +1.2"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn orders_by_first_occurrence() {
        let text = "1 NOR McLaren 2 VER Red Bull 3 LEC Ferrari";
        let snap = scan_classification(text, false, &config()).unwrap();
        assert_eq!(snap.position(DriverCode::Nor), Some(1));
        assert_eq!(snap.position(DriverCode::Ver), Some(2));
        assert_eq!(snap.position(DriverCode::Lec), Some(3));
        assert_eq!(snap.points_for(Team::McLaren), 25.0);
    }

    #[test]
    fn marker_retires_driver_only_when_detecting() {
        let text = "NOR lap 40 VER STOPPED HAM lap 40 LEC STOPPED";
        let live = scan_classification(text, true, &config()).unwrap();
        assert!(live.is_dnf(DriverCode::Ver));
        assert!(live.is_dnf(DriverCode::Lec));
        assert_eq!(live.position(DriverCode::Ham), Some(2));

        let grid = scan_classification(text, false, &config()).unwrap();
        assert_eq!(grid.dnf_count(), 0);
        assert_eq!(grid.position(DriverCode::Lec), Some(4));
    }

    #[test]
    fn tail_window_bounds_last_driver() {
        let padding = " ".repeat(300);
        let text = format!("NOR VER{padding}STOPPED");
        let snap = scan_classification(&text, true, &config()).unwrap();
        assert!(!snap.is_dnf(DriverCode::Ver));
    }

    #[test]
    fn ignores_codes_inside_words() {
        let text = "STRATEGY NOR then STR";
        let snap = scan_classification(text, false, &config()).unwrap();
        assert_eq!(snap.position(DriverCode::Nor), Some(1));
        assert_eq!(snap.position(DriverCode::Str), Some(2));
    }

    #[test]
    fn caps_classified_drivers() {
        let text = "VER HAM LEC NOR";
        let capped = LiveTimingConfig {
            max_drivers: 2,
            ..config()
        };
        let snap = scan_classification(text, false, &capped).unwrap();
        assert_eq!(snap.positions().len(), 2);
    }

    #[test]
    fn empty_page_is_source_unavailable() {
        let err = scan_classification("loading...", true, &config()).unwrap_err();
        assert!(matches!(err, GameError::SourceUnavailable(_)));
    }
}
