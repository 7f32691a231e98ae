// src/utils/url.rs

//! URL normalization for article identity.

use url::Url;

/// Canonicalizes listing links into stable identity keys.
///
/// Links are resolved against the forum base, session parameters are
/// dropped, and the fragment is discarded. Remaining query parameters keep
/// their order.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    base: Url,
    session_params: Vec<String>,
}

impl UrlNormalizer {
    pub fn new(base: Url, session_params: Vec<String>) -> Self {
        Self {
            base,
            session_params,
        }
    }

    /// Normalize a possibly relative link.
    ///
    /// Returns `None` for empty links and for links that do not resolve to
    /// an http(s) URL.
    pub fn normalize(&self, href: &str) -> Option<String> {
        normalize_url(&self.base, href, &self.session_params)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

/// Resolve `href` against `base` and strip session query parameters.
///
/// # Examples
/// ```
/// use forum_watch::utils::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://yoyo.club.tw/").unwrap();
/// let sid = vec!["sid".to_string()];
/// assert_eq!(
///     normalize_url(&base, "./viewtopic.php?f=2&t=7&sid=abc", &sid).as_deref(),
///     Some("https://yoyo.club.tw/viewtopic.php?f=2&t=7")
/// );
/// ```
pub fn normalize_url(base: &Url, href: &str, session_params: &[String]) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !session_params.iter().any(|p| p.as_str() == &**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.set_fragment(None);
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Some(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> UrlNormalizer {
        UrlNormalizer::new(
            Url::parse("https://yoyo.club.tw/").unwrap(),
            vec!["sid".to_string()],
        )
    }

    #[test]
    fn test_relative_link_is_resolved() {
        assert_eq!(
            normalizer().normalize("./viewtopic.php?f=2&t=101").as_deref(),
            Some("https://yoyo.club.tw/viewtopic.php?f=2&t=101")
        );
        assert_eq!(
            normalizer().normalize("/viewtopic.php?t=5").as_deref(),
            Some("https://yoyo.club.tw/viewtopic.php?t=5")
        );
    }

    #[test]
    fn test_session_param_is_removed() {
        let n = normalizer();
        let with_sid = n.normalize("./viewtopic.php?f=2&t=101&sid=0a1b2c3d").unwrap();
        let other_sid = n.normalize("./viewtopic.php?f=2&sid=ffff&t=101").unwrap();
        let without = n.normalize("./viewtopic.php?f=2&t=101").unwrap();
        assert_eq!(with_sid, without);
        assert_eq!(other_sid, without);
    }

    #[test]
    fn test_query_dropped_when_only_session_remains() {
        assert_eq!(
            normalizer().normalize("./index.php?sid=abc").as_deref(),
            Some("https://yoyo.club.tw/index.php")
        );
    }

    #[test]
    fn test_parameter_order_preserved() {
        assert_eq!(
            normalizer().normalize("viewtopic.php?t=9&f=2&p=3").as_deref(),
            Some("https://yoyo.club.tw/viewtopic.php?t=9&f=2&p=3")
        );
    }

    #[test]
    fn test_fragment_is_dropped() {
        assert_eq!(
            normalizer().normalize("viewtopic.php?t=9#p123").as_deref(),
            Some("https://yoyo.club.tw/viewtopic.php?t=9")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        for href in [
            "./viewtopic.php?f=2&t=101&sid=abc",
            "viewtopic.php?title=a+b&t=1",
            "https://yoyo.club.tw/viewtopic.php?t=%E4%B8%AD",
            "https://other.example/page",
        ] {
            let once = n.normalize(href).unwrap();
            let twice = n.normalize(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {href}");
        }
    }

    #[test]
    fn test_absolute_link_keeps_host() {
        assert_eq!(
            normalizer().normalize("https://other.example/x?sid=1").as_deref(),
            Some("https://other.example/x")
        );
    }

    #[test]
    fn test_unusable_links() {
        let n = normalizer();
        assert_eq!(n.normalize(""), None);
        assert_eq!(n.normalize("   "), None);
        assert_eq!(n.normalize("javascript:void(0)"), None);
        assert_eq!(n.normalize("mailto:admin@yoyo.club.tw"), None);
    }
}
