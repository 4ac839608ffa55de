//! Heuristic signal extraction over third-party HTML.
//!
//! Everything here is a pure function of the markup (plus the URL it came
//! from, for resolving relative links), so it can be tested against captured
//! pages without touching the network. Results are best-effort: the name
//! heuristic happily picks up any capitalised words.

use crate::domain::model::{ExtractedSignal, PageMeta, SearchHit};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

pub const MAX_SNIPPET_CHARS: usize = 300;
pub const MAX_PAGE_TEXT_CHARS: usize = 800;

struct Selectors {
    result_link: Selector,
    result_snippet: Selector,
    any_link: Selector,
    og_title: Selector,
    meta_title: Selector,
    og_image: Selector,
    img: Selector,
    title: Selector,
    body: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static selector is valid");
        Selectors {
            result_link: parse("a.result__a"),
            result_snippet: parse(".result__snippet"),
            any_link: parse("a[href]"),
            og_title: parse(r#"meta[property="og:title"]"#),
            meta_title: parse(r#"meta[name="title"]"#),
            og_image: parse(r#"meta[property="og:image"]"#),
            img: parse("img[src]"),
            title: parse("title"),
            body: parse("body"),
        }
    })
}

fn name_pattern() -> &'static Regex {
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    NAME_RE.get_or_init(|| {
        Regex::new(r"[A-Z][a-z]{2,}(?:\s[A-Z][a-z]{2,}){0,3}").expect("name pattern is valid")
    })
}

/// 第一段 1~4 個大寫開頭單字的序列，例如 "John Doe"
pub fn extract_name(text: &str) -> Option<String> {
    name_pattern().find(text).map(|m| m.as_str().to_string())
}

/// 把連續空白壓成一個空格
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn element_text(element: ElementRef) -> String {
    normalize_ws(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text a reader would see: skips script/style contents.
fn visible_text(root: ElementRef) -> String {
    fn collect(element: ElementRef, out: &mut Vec<String>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let text = normalize_ws(text);
                if !text.is_empty() {
                    out.push(text);
                }
            } else if let Some(child_element) = ElementRef::wrap(child) {
                if !matches!(
                    child_element.value().name(),
                    "script" | "style" | "noscript" | "template"
                ) {
                    collect(child_element, out);
                }
            }
        }
    }

    let mut parts = Vec::new();
    collect(root, &mut parts);
    parts.join(" ")
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn meta_value(element: ElementRef) -> Option<String> {
    non_empty(element.value().attr("content")).or_else(|| non_empty(element.value().attr("value")))
}

/// Resolve `href` against `base`, unwrapping DuckDuckGo `/l/?uddg=` redirects.
pub fn resolve_link(base: &str, href: &str) -> String {
    let resolved = Url::parse(base)
        .and_then(|b| b.join(href))
        .or_else(|_| Url::parse(href));

    match resolved {
        Ok(url) => {
            if url.path().starts_with("/l/") {
                if let Some((_, target)) = url.query_pairs().find(|(k, _)| k == "uddg") {
                    return target.into_owned();
                }
            }
            url.to_string()
        }
        Err(_) => href.to_string(),
    }
}

fn is_navigable(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:"))
}

/// 解析搜尋結果頁。優先使用 DuckDuckGo 的結果區塊，找不到再退回所有連結
pub fn parse_search_results(html: &str, base_url: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let sel = selectors();
    let mut hits = Vec::new();

    for link in document.select(&sel.result_link) {
        if hits.len() >= limit {
            break;
        }
        let Some(href) = link.value().attr("href").filter(|h| is_navigable(h)) else {
            continue;
        };
        let title = element_text(link);
        if title.is_empty() {
            continue;
        }

        let snippet = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().classes().any(|c| c == "result"))
            .and_then(|block| block.select(&sel.result_snippet).next())
            .map(element_text)
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            href: resolve_link(base_url, href),
            snippet: truncate_chars(&snippet, MAX_SNIPPET_CHARS),
        });
    }

    if !hits.is_empty() {
        return hits;
    }

    for link in document.select(&sel.any_link) {
        if hits.len() >= limit {
            break;
        }
        let Some(href) = link.value().attr("href").filter(|h| is_navigable(h)) else {
            continue;
        };
        let title = element_text(link);
        if title.is_empty() {
            continue;
        }

        // 沒有結構化摘要時，用父節點文字扣掉標題當摘要
        let snippet = link
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| normalize_ws(&element_text(parent).replace(&title, "")))
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            href: resolve_link(base_url, href),
            snippet: truncate_chars(&snippet, MAX_SNIPPET_CHARS),
        });
    }

    hits
}

/// A name found in one of the search hits, with the index of that hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub hit_index: usize,
    pub name: String,
}

pub fn find_name_in_hits(hits: &[SearchHit]) -> Option<NameMatch> {
    hits.iter().enumerate().find_map(|(hit_index, hit)| {
        let text = format!("{} {}", hit.snippet, hit.title);
        extract_name(&text).map(|name| NameMatch { hit_index, name })
    })
}

pub fn parse_page_meta(html: &str, page_url: &str) -> PageMeta {
    let document = Html::parse_document(html);
    let sel = selectors();

    let title = document
        .select(&sel.og_title)
        .next()
        .and_then(meta_value)
        .or_else(|| document.select(&sel.meta_title).next().and_then(meta_value))
        .or_else(|| {
            document
                .select(&sel.title)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
        });

    let image = document
        .select(&sel.og_image)
        .next()
        .and_then(meta_value)
        .or_else(|| {
            document
                .select(&sel.img)
                .find_map(|img| non_empty(img.value().attr("src")))
        })
        .map(|src| resolve_link(page_url, &src));

    let text_root = document
        .select(&sel.body)
        .next()
        .unwrap_or_else(|| document.root_element());
    let text = truncate_chars(&visible_text(text_root), MAX_PAGE_TEXT_CHARS);

    PageMeta { title, image, text }
}

/// Name from the title first, then from the page text.
pub fn page_signal(meta: PageMeta, page_url: &str) -> ExtractedSignal {
    let name = meta
        .title
        .as_deref()
        .and_then(extract_name)
        .or_else(|| extract_name(&meta.text));

    let raw_snippet = if meta.text.is_empty() {
        None
    } else {
        Some(truncate_chars(&meta.text, MAX_SNIPPET_CHARS))
    };

    ExtractedSignal {
        name,
        photo_url: meta.image,
        raw_snippet,
        source_url: Some(page_url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DDG_BASE: &str = "https://html.duckduckgo.com/html/";
    const DDG_RESULTS: &str = include_str!("../../tests/fixtures/ddg_results.html");
    const DDG_NO_NAMES: &str = include_str!("../../tests/fixtures/ddg_no_names.html");
    const PLAIN_LINKS: &str = include_str!("../../tests/fixtures/plain_links.html");
    const PROFILE_OG: &str = include_str!("../../tests/fixtures/profile_og.html");
    const PROFILE_FALLBACKS: &str = include_str!("../../tests/fixtures/profile_fallbacks.html");

    #[test]
    fn test_extract_name() {
        assert_eq!(
            extract_name("caller id shows John Doe, based in mumbai"),
            Some("John Doe".to_string())
        );
        assert_eq!(
            extract_name("Anna Maria Del Rio Castillo"),
            Some("Anna Maria Del Rio".to_string())
        );
        assert_eq!(extract_name("no capitals here"), None);
        assert_eq!(extract_name("ID 42 OK"), None);
    }

    #[test]
    fn test_parse_ddg_result_blocks() {
        let hits = parse_search_results(DDG_RESULTS, DDG_BASE, 8);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "919876543210 - who called me?");
        assert_eq!(
            hits[0].href,
            "https://whocallsme.example/number/919876543210"
        );
        assert_eq!(
            hits[0].snippet,
            "reported by users: caller id shows John Doe, based in mumbai. 3 reports."
        );
        assert_eq!(hits[1].href, "https://spamcalls.example/in/919876543210");
    }

    #[test]
    fn test_search_result_limit() {
        let hits = parse_search_results(DDG_RESULTS, DDG_BASE, 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_find_name_uses_first_matching_hit() {
        let hits = parse_search_results(DDG_RESULTS, DDG_BASE, 8);
        let found = find_name_in_hits(&hits).unwrap();

        assert_eq!(found.hit_index, 0);
        assert_eq!(found.name, "John Doe");
    }

    #[test]
    fn test_no_name_in_hits() {
        let hits = parse_search_results(DDG_NO_NAMES, DDG_BASE, 8);
        assert_eq!(hits.len(), 1);
        assert!(find_name_in_hits(&hits).is_none());
    }

    #[test]
    fn test_plain_link_fallback() {
        let hits = parse_search_results(PLAIN_LINKS, "https://search.example/html/", 8);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Asha Verma");
        assert_eq!(hits[0].href, "https://search.example/profile/42");
        assert_eq!(hits[0].snippet, "listed owner since 2019");
        assert_eq!(find_name_in_hits(&hits).unwrap().name, "Asha Verma");
    }

    #[test]
    fn test_parse_og_meta() {
        let page_url = "https://directory.example/in/919876543210";
        let meta = parse_page_meta(PROFILE_OG, page_url);

        assert_eq!(
            meta.title.as_deref(),
            Some("Rahul Sharma | directory listing")
        );
        assert_eq!(
            meta.image.as_deref(),
            Some("https://directory.example/avatars/rahul.jpg")
        );
        assert_eq!(meta.text, "profile for 919876543210 spread over lines");

        let signal = page_signal(meta, page_url);
        assert_eq!(signal.name.as_deref(), Some("Rahul Sharma"));
        assert_eq!(signal.source_url.as_deref(), Some(page_url));
        assert!(signal.has_identity());
    }

    #[test]
    fn test_page_meta_fallbacks() {
        let page_url = "https://lookup.example/919876543210";
        let meta = parse_page_meta(PROFILE_FALLBACKS, page_url);

        assert_eq!(meta.title.as_deref(), Some("number 919876543210 - lookup"));
        assert_eq!(
            meta.image.as_deref(),
            Some("https://cdn.example/img/first.png")
        );

        // 標題沒有名字時改從內文找
        let signal = page_signal(meta, page_url);
        assert_eq!(signal.name.as_deref(), Some("Priya Nair"));
    }

    #[test]
    fn test_empty_page() {
        let meta = parse_page_meta("", "https://x.example/");
        assert_eq!(meta, PageMeta::default());

        let signal = page_signal(meta, "https://x.example/");
        assert!(!signal.has_identity());
        assert!(signal.raw_snippet.is_none());
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link(DDG_BASE, "//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example%2Fp%3Fx%3D1"),
            "https://a.example/p?x=1"
        );
        assert_eq!(
            resolve_link("http://x/y/page", "../img/a.jpg"),
            "http://x/img/a.jpg"
        );
        assert_eq!(resolve_link("not a base", "http://x/y.jpg"), "http://x/y.jpg");
    }
}
