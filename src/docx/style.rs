//! Visible-style extraction for runs and paragraphs.
//!
//! Formatting lives in a properties child of the element it describes
//! (`w:rPr` under `w:r`, `w:pPr` under `w:p`). Only a fixed allow-list of
//! formatting tags is recognized; spelling, revision, and proofing tags never
//! make it out of here. The normalized style list serves two masters: it is
//! rendered as inline HTML when HTML mode is on, and it is the equality key
//! that decides whether adjacent runs merge.
//!
//! Span-style properties (size, color, highlight, ...) are grouped into a
//! single `span style="..."` entry placed first; bare tags (`b`, `i`, ...)
//! follow in alphabetical order, so two equal styles always normalize to the
//! same list.

use crate::common::xml::XmlElement;
use crate::docx::tags::Tag;
use std::collections::BTreeMap;

/// How one recognized formatting tag renders into HTML.
struct HtmlFormatter {
    /// Render `(tag, val)` into tag content or a CSS declaration
    render: fn(&str, &str) -> String,
    /// Container element and property the rendering belongs in, e.g.
    /// `("span", "style")`; `None` for bare tags like `<b>`
    container: Option<(&'static str, &'static str)>,
}

fn render_tag(tag: &str, _val: &str) -> String {
    tag.to_string()
}

fn render_strike(_tag: &str, _val: &str) -> String {
    "s".to_string()
}

fn render_vert_align(_tag: &str, val: &str) -> String {
    // "subscript" -> "sub", "superscript" -> "sup"
    val.get(..3).unwrap_or(val).to_string()
}

fn render_small_caps(_tag: &str, _val: &str) -> String {
    "font-variant:small-caps".to_string()
}

fn render_caps(_tag: &str, _val: &str) -> String {
    "text-transform:uppercase".to_string()
}

fn render_highlight(_tag: &str, val: &str) -> String {
    format!("background-color:{val}")
}

fn render_size(_tag: &str, val: &str) -> String {
    format!("font-size:{val}pt")
}

fn render_color(_tag: &str, val: &str) -> String {
    format!("color:{val}")
}

fn render_rtl(_tag: &str, _val: &str) -> String {
    "direction:rtl".to_string()
}

fn render_heading(tag: &str, _val: &str) -> String {
    format!("h{}", &tag[7..])
}

/// Look up the formatter for a recognized tag; `None` means the tag is
/// ignored (by design, not by accident).
fn formatter_for(tag: &str) -> Option<HtmlFormatter> {
    let bare = |render| HtmlFormatter {
        render,
        container: None,
    };
    let span_style = |render| HtmlFormatter {
        render,
        container: Some(("span", "style")),
    };
    match tag {
        "b" | "i" | "u" => Some(bare(render_tag)),
        "strike" | "dstrike" => Some(bare(render_strike)),
        "vertAlign" => Some(bare(render_vert_align)),
        "smallCaps" => Some(span_style(render_small_caps)),
        "caps" => Some(span_style(render_caps)),
        "highlight" => Some(span_style(render_highlight)),
        "sz" => Some(span_style(render_size)),
        "color" => Some(span_style(render_color)),
        "rtl" => Some(span_style(render_rtl)),
        "Heading1" | "Heading2" | "Heading3" | "Heading4" | "Heading5" | "Heading6" => {
            Some(bare(render_heading))
        },
        _ => None,
    }
}

/// Gather `(tag, value)` pairs from an element's properties child.
///
/// Looks for the child named after the element itself plus `Pr` (`w:p` ->
/// `w:pPr`, `w:r` -> `w:rPr`, `w:tc` -> `w:tcPr`). Valueless tags like
/// `<w:b/>` yield `None`; tags with `w:val` yield the value. Elements without
/// a properties child quietly return an empty list.
pub fn gather_pr(elem: &XmlElement) -> Vec<(String, Option<String>)> {
    let pr_name = format!("{}Pr", elem.name);
    let Some(pr) = elem.find_child(&pr_name) else {
        return Vec::new();
    };
    pr.children
        .iter()
        .map(|sub| {
            let val = sub.attr("w:val").filter(|v| !v.is_empty()).map(String::from);
            (sub.local_name().to_string(), val)
        })
        .collect()
}

/// The `pStyle` value of a paragraph element, or `""`.
pub fn get_pstyle(paragraph: &XmlElement) -> String {
    gather_pr(paragraph)
        .into_iter()
        .find(|(tag, _)| tag == "pStyle")
        .and_then(|(_, val)| val)
        .unwrap_or_default()
}

/// Normalize gathered properties into an ordered HTML style list.
///
/// Returns the interior of opening tags, e.g.
/// `["span style=\"color:red;font-size:24pt\"", "b", "i"]`.
/// With HTML mode off, every tag is unrecognized and the list is empty.
fn format_pr_into_html(pairs: &[(String, Option<String>)], html: bool) -> Vec<String> {
    if !html {
        return Vec::new();
    }

    let mut bare: Vec<String> = Vec::new();
    // (container, property) -> rendered declarations
    let mut grouped: BTreeMap<(&'static str, &'static str), Vec<String>> = BTreeMap::new();

    for (tag, val) in pairs {
        let Some(formatter) = formatter_for(tag) else {
            continue;
        };
        let rendered = (formatter.render)(tag, val.as_deref().unwrap_or(""));
        match formatter.container {
            Some(key) => grouped.entry(key).or_default().push(rendered),
            None => bare.push(rendered),
        }
    }

    // Everything sharing a container collapses into one element, so a run
    // with size and color opens one span, not two.
    let mut container_parts: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
    for ((container, property), mut declarations) in grouped {
        declarations.sort();
        container_parts
            .entry(container)
            .or_default()
            .push(format!("{property}=\"{}\"", declarations.join(";")));
    }

    let mut style: Vec<String> = container_parts
        .into_iter()
        .map(|(container, parts)| format!("{container} {}", parts.join(" ")))
        .collect();
    bare.sort();
    style.extend(bare);
    style
}

/// Run-element formatting converted into an HTML style list.
pub fn get_run_formatting(run: &XmlElement, html: bool) -> Vec<String> {
    format_pr_into_html(&gather_pr(run), html)
}

/// Paragraph-element formatting converted into an HTML style list.
///
/// Only the paragraph style name participates, which is how `Heading1`
/// paragraphs become `<h1>` wrappers.
pub fn get_paragraph_formatting(paragraph: &XmlElement, html: bool) -> Vec<String> {
    format_pr_into_html(&[(get_pstyle(paragraph), None)], html)
}

/// Style for any element (runs and paragraphs have one, others do not).
pub fn get_html_formatting(elem: &XmlElement, html: bool) -> Vec<String> {
    match Tag::of(elem) {
        Tag::Run => get_run_formatting(elem, html),
        Tag::Paragraph => get_paragraph_formatting(elem, html),
        _ => Vec::new(),
    }
}

/// HTML tags to open a style.
///
/// ```
/// use longan::docx::style::html_open;
/// let style = ["span style=\"color:red\"".to_string(), "b".to_string()];
/// assert_eq!(html_open(&style), "<span style=\"color:red\"><b>");
/// ```
pub fn html_open(style: &[String]) -> String {
    style.iter().map(|x| format!("<{x}>")).collect()
}

/// HTML tags to close a style, in reverse of opening order.
///
/// ```
/// use longan::docx::style::html_close;
/// let style = ["span style=\"color:red\"".to_string(), "b".to_string()];
/// assert_eq!(html_close(&style), "</b></span>");
/// ```
pub fn html_close(style: &[String]) -> String {
    style
        .iter()
        .rev()
        .map(|x| format!("</{}>", x.split_whitespace().next().unwrap_or(x)))
        .collect()
}
