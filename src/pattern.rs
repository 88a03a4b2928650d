use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(lo|hi)(?::0(\d))?\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Lo { width: usize },
    Hi { width: usize },
}

/// Index page address template, e.g. `.../Gallery_S{lo:02}-S{hi:02}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    segments: Vec<Segment>,
}

impl PageTemplate {
    pub fn parse(template: &str) -> Result<PageTemplate, ConfigError> {
        let mut segments = Vec::new();
        let mut last = 0;
        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let whole = caps.get(0).unwrap();
            if whole.start() > last {
                segments.push(Segment::Literal(template[last..whole.start()].to_string()));
            }
            let width = caps
                .get(2)
                .and_then(|w| w.as_str().parse::<usize>().ok())
                .unwrap_or(0);
            segments.push(match &caps[1] {
                "lo" => Segment::Lo { width },
                _ => Segment::Hi { width },
            });
            last = whole.end();
        }
        if last < template.len() {
            segments.push(Segment::Literal(template[last..].to_string()));
        }

        let literal_braces = segments.iter().any(|s| match s {
            Segment::Literal(l) => l.contains('{') || l.contains('}'),
            _ => false,
        });
        if literal_braces {
            return Err(ConfigError::Template {
                template: template.to_string(),
                reason: "unknown placeholder; expected {lo}, {hi}, {lo:0N} or {hi:0N}".into(),
            });
        }
        Ok(PageTemplate { segments })
    }

    pub fn render(&self, lo: usize, hi: usize) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(l) => out.push_str(l),
                Segment::Lo { width } => out.push_str(&format!("{:0width$}", lo, width = *width)),
                Segment::Hi { width } => out.push_str(&format!("{:0width$}", hi, width = *width)),
            }
        }
        out
    }
}

/// One index page of a pattern: `[window*i + 1, window*(i + 1)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub index: usize,
    pub lo: usize,
    pub hi: usize,
    pub url: String,
}

/// Enumerate the index pages a pattern covers, in iteration order.
pub fn page_windows(
    template: &PageTemplate,
    window: usize,
    start: usize,
    count: usize,
) -> impl Iterator<Item = PageWindow> + '_ {
    (start..start + count).map(move |index| {
        let lo = window * index + 1;
        let hi = window * (index + 1);
        PageWindow {
            index,
            lo,
            hi,
            url: template.render(lo, hi),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_padded_windows() {
        let t = PageTemplate::parse("http://x/wiki/Gallery_S{lo:02}-S{hi:02}").unwrap();
        let urls: Vec<_> = page_windows(&t, 50, 0, 3).map(|w| w.url).collect();
        assert_eq!(
            urls,
            [
                "http://x/wiki/Gallery_S01-S50",
                "http://x/wiki/Gallery_S51-S100",
                "http://x/wiki/Gallery_S101-S150",
            ]
        );
    }

    #[test]
    fn three_digit_windows() {
        let t = PageTemplate::parse("Gallery_{lo:03}-{hi:03}").unwrap();
        let w: Vec<_> = page_windows(&t, 50, 0, 36).collect();
        assert_eq!(w.len(), 36);
        assert_eq!(w[0].url, "Gallery_001-050");
        assert_eq!(w[35].url, "Gallery_1751-1800");
    }

    #[test]
    fn start_offsets_the_window() {
        let t = PageTemplate::parse("p{lo}-{hi}").unwrap();
        let w: Vec<_> = page_windows(&t, 10, 2, 1).collect();
        assert_eq!(w[0].lo, 21);
        assert_eq!(w[0].hi, 30);
        assert_eq!(w[0].url, "p21-30");
    }

    #[test]
    fn unknown_placeholder_is_rejected() {
        assert!(PageTemplate::parse("Gallery_{page}").is_err());
        assert!(PageTemplate::parse("Gallery_{lo:2}").is_err());
    }
}
