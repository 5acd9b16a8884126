//! Click-through URL construction with UTM attribution parameters.

use adpulse_core::types::Banner;
use url::Url;

/// Build the banner's outbound click URL.
///
/// Attaches `utm_source`, `utm_medium`, `utm_campaign`, and `utm_content`
/// from the banner's click settings, overwriting parameters of the same
/// name already present. Empty settings leave any existing parameter
/// untouched. Returns an empty string when the banner has no target URL
/// (house ads), and the target unchanged when it does not parse as an
/// absolute URL. Idempotent: re-applying to its own output is a no-op.
pub fn build_utm_url(banner: &Banner) -> String {
    let click = &banner.click;
    if click.target_url.is_empty() {
        return String::new();
    }
    let mut url = match Url::parse(&click.target_url) {
        Ok(url) => url,
        Err(_) => return click.target_url.clone(),
    };

    let overrides = [
        ("utm_source", click.utm_source.as_str()),
        ("utm_medium", click.utm_medium.as_str()),
        ("utm_campaign", click.utm_campaign.as_str()),
        ("utm_content", click.utm_content.as_str()),
    ];

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            !overrides
                .iter()
                .any(|(name, value)| !value.is_empty() && key == name)
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    for (name, value) in overrides {
        if !value.is_empty() {
            pairs.push((name.to_string(), value.to_string()));
        }
    }

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        drop(serializer);
    }

    url.to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────────────
