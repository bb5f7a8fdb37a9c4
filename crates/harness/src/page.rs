//! Immutable page snapshots
//!
//! A [`Page`] captures one HTTP response: the final URL, status, raw body,
//! and the forms and links discovered in the markup, in document order.
//! Pages are never mutated; every subsequent request produces a new one.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{HarnessError, Result};
use crate::form::{Form, FormMethod, FormPredicate};

/// A hyperlink discovered on a page. Links carry newly assigned entity
/// identifiers as trailing numeric path segments (see [`crate::resolve_id`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// An immutable snapshot of one HTTP response.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    status: u16,
    body: String,
    forms: Vec<Form>,
    links: Vec<Link>,
}

impl Page {
    /// Parse a response body into a snapshot. Forms and links are extracted
    /// eagerly; ad-hoc selector queries re-parse on demand.
    pub fn from_html(url: Url, status: u16, body: String) -> Self {
        let document = Html::parse_document(&body);
        let forms = extract_forms(&document, &url);
        let links = extract_links(&document);
        Self {
            url,
            status,
            body,
            forms,
            links,
        }
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.body.contains(needle)
    }

    /// All forms in document order.
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    /// All links in document order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// First form satisfying the predicate, in document order. When several
    /// candidates match, the first wins; callers requiring uniqueness assert
    /// the candidate count via [`Page::forms_matching`] themselves. The
    /// returned form is an independent value; assigning fields on it does
    /// not touch this snapshot.
    pub fn form_matching(&self, predicate: &FormPredicate) -> Option<Form> {
        self.forms.iter().find(|f| predicate.matches(f)).cloned()
    }

    /// All forms satisfying the predicate, in document order.
    pub fn forms_matching<'a>(
        &'a self,
        predicate: &'a FormPredicate,
    ) -> impl Iterator<Item = &'a Form> + 'a {
        self.forms.iter().filter(move |f| predicate.matches(f))
    }

    /// All links satisfying the predicate, in document order.
    pub fn links_matching<'a>(
        &'a self,
        predicate: &'a LinkPredicate,
    ) -> impl Iterator<Item = &'a Link> + 'a {
        self.links.iter().filter(move |l| predicate.matches(l))
    }

    /// First link whose visible text equals `text` exactly.
    pub fn link_with_text(&self, text: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.text == text)
    }

    /// Count elements matching a CSS selector. The stored body is re-parsed
    /// on each call; this keeps the snapshot itself plain data.
    pub fn query_count(&self, css: &str) -> Result<usize> {
        // Debug-format the parse error: scraper 0.19's Display impl panics
        // on some malformed selectors.
        let selector =
            Selector::parse(css).map_err(|e| HarnessError::Selector(format!("{css}: {e:?}")))?;
        let document = Html::parse_document(&self.body);
        Ok(document.select(&selector).count())
    }
}

/// Declarative link selection; configured conditions are conjunctive.
#[derive(Debug, Default, Clone)]
pub struct LinkPredicate {
    text_equals: Option<String>,
    text_matches: Option<Regex>,
    href_matches: Option<Regex>,
}

impl LinkPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_equals(mut self, text: impl Into<String>) -> Self {
        self.text_equals = Some(text.into());
        self
    }

    pub fn text_matches(mut self, pattern: Regex) -> Self {
        self.text_matches = Some(pattern);
        self
    }

    pub fn href_matches(mut self, pattern: Regex) -> Self {
        self.href_matches = Some(pattern);
        self
    }

    /// Convenience for the common "visible text contains this marker" case.
    pub fn text_contains(self, needle: &str) -> Self {
        self.text_matches(Regex::new(&regex::escape(needle)).expect("escaped pattern is valid"))
    }

    pub fn matches(&self, link: &Link) -> bool {
        if let Some(expected) = &self.text_equals {
            if &link.text != expected {
                return false;
            }
        }
        if let Some(pattern) = &self.text_matches {
            if !pattern.is_match(&link.text) {
                return false;
            }
        }
        if let Some(pattern) = &self.href_matches {
            if !pattern.is_match(&link.href) {
                return false;
            }
        }
        true
    }
}

fn extract_forms(document: &Html, page_url: &Url) -> Vec<Form> {
    let form_sel = Selector::parse("form").expect("static selector");
    document
        .select(&form_sel)
        .map(|form_el| {
            let action = form_el.value().attr("action").unwrap_or("").to_string();
            let method = match form_el.value().attr("method") {
                Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
                _ => FormMethod::Get,
            };
            let fields = extract_fields(form_el);
            Form::new(action, method, fields, page_url.clone())
        })
        .collect()
}

fn extract_fields(form_el: ElementRef<'_>) -> Vec<(String, String)> {
    let ctrl_sel = Selector::parse("input, textarea, select").expect("static selector");
    let option_sel = Selector::parse("option").expect("static selector");

    let mut fields = Vec::new();
    for ctrl in form_el.select(&ctrl_sel) {
        let Some(name) = ctrl.value().attr("name") else {
            continue;
        };
        let value = match ctrl.value().name() {
            "input" => {
                let kind = ctrl.value().attr("type").unwrap_or("text");
                match kind {
                    // Only ticked toggles participate in submission.
                    "checkbox" | "radio" => {
                        if ctrl.value().attr("checked").is_none() {
                            continue;
                        }
                        ctrl.value().attr("value").unwrap_or("on").to_string()
                    }
                    // Buttons contribute only when clicked; the harness
                    // submits forms wholesale, so they are omitted.
                    "submit" | "button" | "image" | "reset" => continue,
                    _ => ctrl.value().attr("value").unwrap_or("").to_string(),
                }
            }
            "textarea" => ctrl.text().collect::<String>(),
            "select" => {
                let options: Vec<_> = ctrl.select(&option_sel).collect();
                let chosen = options
                    .iter()
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.first());
                match chosen {
                    Some(option) => option
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| option.text().collect::<String>().trim().to_string()),
                    None => String::new(),
                }
            }
            _ => continue,
        };
        fields.push((name.to_string(), value));
    }
    fields
}

fn extract_links(document: &Html) -> Vec<Link> {
    let link_sel = Selector::parse("a[href]").expect("static selector");
    document
        .select(&link_sel)
        .map(|a| Link {
            href: a.value().attr("href").unwrap_or("").to_string(),
            text: a.text().collect::<String>().trim().to_string(),
        })
        .collect()
}
