use url::Url;

/// Query parameters that never change what a page shows.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "mc_cid",
    "mc_eid",
];

/// Strip tracking parameters. Unparseable input is returned unchanged.
pub fn sanitize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    strip_tracking(&mut parsed);
    parsed.to_string()
}

fn strip_tracking(parsed: &mut Url) {
    if parsed.query().is_none() {
        return;
    }

    let clean_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(clean_pairs);
    }
}

/// Resolve `raw` against `base` and canonicalize it into a record identity:
/// http(s) only, fragment dropped, tracking params dropped, and a trailing
/// `index.html` folded into its directory so both spellings of a page merge.
pub fn canonical_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("mailto:") || raw.starts_with("tel:") || raw.starts_with("javascript:") {
        return None;
    }

    let mut parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw).ok()?
    } else {
        base?.join(raw).ok()?
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }

    parsed.set_fragment(None);
    strip_tracking(&mut parsed);

    if let Some(dir) = parsed.path().strip_suffix("index.html").map(str::to_string) {
        parsed.set_path(&dir);
    }

    Some(parsed.to_string())
}
