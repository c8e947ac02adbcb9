//! Canonical domain keys shared by the lead list and map workflows.

const SCHEME_PREFIXES: [&str; 2] = ["https://", "http://"];
const WWW_PREFIX: &str = "www.";

/// Reduces a URL, bare domain or blank cell to the lowercase host used as the
/// join key for history lookups and deduplication.
///
/// Prefixes are stripped repeatedly so the result is a fixed point:
/// `canonical_domain(Some(&canonical_domain(x))) == canonical_domain(x)`.
pub fn canonical_domain(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let lowered = raw.trim().to_lowercase();
    let mut rest = lowered.as_str();
    loop {
        let before = rest.len();
        for prefix in SCHEME_PREFIXES {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
            }
        }
        if let Some(stripped) = rest.strip_prefix(WWW_PREFIX) {
            rest = stripped;
        }
        rest = rest.trim_start();
        if rest.len() == before {
            break;
        }
    }

    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim();

    host.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_www_path_and_query() {
        assert_eq!(
            canonical_domain(Some("https://www.Acme-Fleet.com/about?ref=1")),
            "acme-fleet.com"
        );
        assert_eq!(canonical_domain(Some("http://acme.com")), "acme.com");
        assert_eq!(canonical_domain(Some("WWW.acme.com/")), "acme.com");
        assert_eq!(canonical_domain(Some("acme.com?x=1")), "acme.com");
        assert_eq!(canonical_domain(Some("acme.com#contact")), "acme.com");
        assert_eq!(canonical_domain(Some("  acme.com  ")), "acme.com");
    }

    #[test]
    fn missing_and_blank_inputs_are_empty() {
        assert_eq!(canonical_domain(None), "");
        assert_eq!(canonical_domain(Some("")), "");
        assert_eq!(canonical_domain(Some("   ")), "");
        assert_eq!(canonical_domain(Some("https://")), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "https://www.acme.com/path",
            "www.www.acme.com",
            "https://www.http://acme.com",
            "http://https://acme.com",
            "acme.com /careers",
            "Fleet Co",
            "",
            "www. ",
            "HTTPS://WWW.EXAMPLE.CO.UK?q=1",
            "ftp://files.example.com/x",
        ];

        for sample in samples {
            let once = canonical_domain(Some(sample));
            let twice = canonical_domain(Some(once.as_str()));
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }
}
