//! Anchor link extraction, optionally limited to executable/archive downloads.
//!
//! Download events do not say which page started them, so every outbound
//! link on a page is recorded and later matched against the download URL.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Extensions treated as dangerous (executables, installers, archives).
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "apk", "jar", "ahk", "bms", "oxe", "sk", "xbe", "workflow", "elf", "app", "out", "dmg", "exe",
    "bat", "com", "cmd", "inf", "ipa", "osx", "pif", "run", "msi", "pkg", "iso", "zip", "tar.xz",
    "tar.gz", "tar.bz2", "tar.bz", "tar", "rar", "deb", "rpm", "appimage", "flatpakref", "flatpak",
    "snap",
];

/// `<a ... href=...>` with double-, single- or un-quoted values.
/// The attribute name must follow whitespace so `data-href` is not taken for `href`.
static ANCHOR_HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("anchor regex is valid")
});

/// Named and numeric character references that can appear in an href.
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&(?:#x([0-9a-f]{1,6})|#([0-9]{1,7})|(amp|quot|apos|lt|gt));")
        .expect("entity regex is valid")
});

/// Which links to keep: everything, or only links to dangerous file types.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub only_dangerous: bool,
    /// Additional extensions (without the leading dot) on top of [`DANGEROUS_EXTENSIONS`].
    pub extra_extensions: Vec<String>,
}

impl LinkFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn dangerous_only() -> Self {
        Self {
            only_dangerous: true,
            extra_extensions: Vec::new(),
        }
    }

    pub fn accepts(&self, link: &str) -> bool {
        if !self.only_dangerous {
            return true;
        }
        let name = link_path(link);
        is_file_extension_dangerous(&name)
            || self
                .extra_extensions
                .iter()
                .any(|ext| has_extension(&name, ext))
    }
}

/// True if `filename` (a bare name, path or URL) ends with a dangerous extension.
///
/// Case-insensitive. For URLs only the path is considered, so query strings
/// and fragments do not hide the extension.
pub fn is_file_extension_dangerous(filename: &str) -> bool {
    let name = link_path(filename);
    DANGEROUS_EXTENSIONS
        .iter()
        .any(|ext| has_extension(&name, ext))
}

fn has_extension(name: &str, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() {
        return false;
    }
    let name = name.to_lowercase();
    let ext = ext.to_lowercase();
    name.len() > ext.len()
        && name.ends_with(&ext)
        && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
}

/// URL path when `link` parses as a URL, the link itself otherwise.
fn link_path(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(u) => u.path().to_string(),
        Err(_) => link.to_string(),
    }
}

/// Collects the `href` of every anchor in `html`.
///
/// Relative links are resolved against `page_url` when given; hrefs that
/// cannot be resolved are kept verbatim. The result is deduplicated.
pub fn extract_links(html: &str, page_url: Option<&str>, filter: &LinkFilter) -> BTreeSet<String> {
    let base = page_url.and_then(|u| url::Url::parse(u).ok());
    let links: BTreeSet<String> = ANCHOR_HREF_PATTERN
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|href| !href.is_empty())
        .map(|href| resolve(&href, base.as_ref()))
        .filter(|link| filter.accepts(link))
        .collect();
    tracing::debug!("{} links found", links.len());
    links
}

fn resolve(href: &str, base: Option<&url::Url>) -> String {
    if let Ok(absolute) = url::Url::parse(href) {
        return absolute.to_string();
    }
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// Decodes character references in a single pass, so `&amp;lt;` yields `&lt;`.
/// References that do not name a valid character are left as written.
fn decode_entities(s: &str) -> String {
    ENTITY_PATTERN
        .replace_all(s, |caps: &regex::Captures| {
            let decoded = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = caps.get(2) {
                dec.as_str().parse().ok().and_then(char::from_u32)
            } else {
                match caps[3].to_ascii_lowercase().as_str() {
                    "amp" => Some('&'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangerous_extension_detection() {
        assert!(is_file_extension_dangerous("http://x/setup.EXE"));
        assert!(!is_file_extension_dangerous("http://x/readme.txt"));
        assert!(is_file_extension_dangerous("https://x/linux-6.1.tar.xz?mirror=1"));
        assert!(is_file_extension_dangerous("debian-12.iso"));
        assert!(!is_file_extension_dangerous("https://x/about"));
    }

    #[test]
    fn dangerous_extensions_are_case_insensitive() {
        for ext in DANGEROUS_EXTENSIONS {
            let lower = format!("http://x/file.{}", ext);
            let upper = format!("http://x/file.{}", ext.to_uppercase());
            assert!(is_file_extension_dangerous(&lower), "{lower}");
            assert!(is_file_extension_dangerous(&upper), "{upper}");
        }
    }

    #[test]
    fn extracts_and_resolves_links() {
        let html = r#"
            <a href="https://cdn.example.com/tool.zip">zip</a>
            <A class="btn" HREF='/files/setup.exe'>exe</A>
            <a href=notes.txt>notes</a>
            <a name="anchor-without-href">x</a>
            <a href="https://cdn.example.com/tool.zip">dup</a>
        "#;
        let links = extract_links(html, Some("https://example.com/downloads/"), &LinkFilter::all());
        let expected: BTreeSet<String> = [
            "https://cdn.example.com/tool.zip",
            "https://example.com/files/setup.exe",
            "https://example.com/downloads/notes.txt",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn only_dangerous_filter_drops_documents() {
        let html = r#"<a href="https://e.com/a.deb">deb</a><a href="https://e.com/b.html">page</a>"#;
        let links = extract_links(html, None, &LinkFilter::dangerous_only());
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://e.com/a.deb"));
    }

    #[test]
    fn extra_extensions_extend_the_list() {
        let filter = LinkFilter {
            only_dangerous: true,
            extra_extensions: vec![".img".to_string()],
        };
        assert!(filter.accepts("https://e.com/raspios.IMG"));
        assert!(!filter.accepts("https://e.com/index.html"));
    }

    #[test]
    fn data_href_does_not_shadow_href() {
        let html = r#"<a data-href="/track" href="https://e.com/setup.exe">dl</a>"#;
        let links = extract_links(html, Some("https://e.com/"), &LinkFilter::all());
        let expected: BTreeSet<String> = ["https://e.com/setup.exe".to_string()].into();
        assert_eq!(links, expected);

        let html = r#"<a data-href='/track'>no real link</a>"#;
        assert!(extract_links(html, Some("https://e.com/"), &LinkFilter::all()).is_empty());
    }

    #[test]
    fn entities_are_decoded_once() {
        assert_eq!(decode_entities("a&amp;lt;b"), "a&lt;b");
        assert_eq!(decode_entities("&#x2F;files&#47;x&#39;s&quot;"), "/files/x's\"");
        assert_eq!(decode_entities("&AMP;&apos;&gt;"), "&'>");
        assert_eq!(decode_entities("&#xD800;&nbsp;"), "&#xD800;&nbsp;");
    }

    #[test]
    fn numeric_entities_in_href_resolve() {
        let links = extract_links(
            r#"<a href="&#x2F;files&#x2F;setup.exe">x</a>"#,
            Some("https://e.com/dl/"),
            &LinkFilter::all(),
        );
        assert!(links.contains("https://e.com/files/setup.exe"));
    }

    #[test]
    fn relative_links_without_base_are_kept_verbatim() {
        let links = extract_links(r#"<a href="dl?id=1&amp;os=linux">x</a>"#, None, &LinkFilter::all());
        assert!(links.contains("dl?id=1&os=linux"));
    }
}
