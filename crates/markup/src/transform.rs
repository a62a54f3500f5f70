//! Line-oriented questionnaire markup.
//!
//! ```text
//! {"name": "Module1"}          optional header, first line only
//! Intro prose (markdown)
//! [Q1] Do you smoke?           opens question Q1
//! (1) -> Q3 Yes                radio, skips to Q3 when chosen
//! (0) No
//! [Q2] Which apply?
//! [1] Coffee                   checkbox
//! [2] Other: |__|xor=drink|    checkbox with a paired text field
//! |date|id=DOB|                standalone control
//! ```
//!
//! `{$u:name}` and `{#current_year}`-style tokens are replaced from the
//! [`TransformContext`] before any parsing happens.

use crate::context::{TransformContext, substitute_user_vars};
use crate::error::MarkupError;
use crate::locale::Locale;
use pulldown_cmark::{Parser, html};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const DEFAULT_MODULE_NAME: &str = "Questionnaire";

/// Output of a transform: injectable HTML plus the module name it declared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub content: String,
    pub name: String,
}

struct Grammar {
    date_token: Regex,
    question: Regex,
    radio: Regex,
    checkbox: Regex,
    skip: Regex,
    control: Regex,
}

impl Grammar {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            date_token: Regex::new(r"\{#(\w+)\}")?,
            question: Regex::new(r"^\[([A-Z_][A-Za-z0-9_]*)\](?:\s+(.*))?$")?,
            radio: Regex::new(r"^\(([^)\s][^)]*)\)(.*)$")?,
            checkbox: Regex::new(r"^\[(\d[^\]]*)\](.*)$")?,
            skip: Regex::new(r"^\s*->\s*([A-Za-z_]\w*)(.*)$")?,
            control: Regex::new(r"\|(___|__|[A-Za-z]+)\|(?:([A-Za-z][^|\n]*)\|)?")?,
        })
    }
}

fn grammar() -> Result<&'static Grammar, MarkupError> {
    static GRAMMAR: OnceLock<Result<Grammar, regex::Error>> = OnceLock::new();
    GRAMMAR
        .get_or_init(Grammar::compile)
        .as_ref()
        .map_err(|e| MarkupError::Grammar(e.clone()))
}

/// Convert questionnaire markup to HTML.
pub fn transform(
    content: &str,
    ctx: &TransformContext,
    locale: &Locale,
) -> Result<TransformResult, MarkupError> {
    let g = grammar()?;
    let text = substitute_user_vars(content, ctx)?;
    let text = g
        .date_token
        .replace_all(&text, |caps: &Captures<'_>| {
            ctx.date_field(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();

    let (name, body) = split_header(&text)?;
    let (preamble, questions) = split_questions(g, body)?;

    let mut out = String::new();
    if !preamble.trim().is_empty() {
        out.push_str(&markdown_block(&preamble));
    }
    let last = questions.len().saturating_sub(1);
    for (index, question) in questions.iter().enumerate() {
        render_question(g, question, index == last, locale, &mut out)?;
    }

    Ok(TransformResult { content: out, name })
}

#[derive(Deserialize)]
struct Header {
    name: Option<String>,
}

fn split_header(text: &str) -> Result<(String, &str), MarkupError> {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    let first_trimmed = first.trim_start();
    if !first_trimmed.starts_with('{') || first_trimmed.starts_with("{#") {
        return Ok((DEFAULT_MODULE_NAME.to_string(), text));
    }
    let header: Header = serde_json::from_str(first.trim()).map_err(MarkupError::InvalidHeader)?;
    let name = header
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_MODULE_NAME.to_string());
    Ok((name, rest))
}

struct Question<'a> {
    id: &'a str,
    heading: &'a str,
    lines: Vec<&'a str>,
}

fn split_questions<'a>(
    g: &Grammar,
    body: &'a str,
) -> Result<(String, Vec<Question<'a>>), MarkupError> {
    let mut preamble = String::new();
    let mut questions: Vec<Question<'a>> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for line in body.lines() {
        if let Some(caps) = g.question.captures(line.trim_end())
            && let Some(id) = caps.get(1)
        {
            let id = id.as_str();
            if !seen.insert(id) {
                return Err(MarkupError::DuplicateQuestion(id.to_string()));
            }
            questions.push(Question {
                id,
                heading: caps.get(2).map_or("", |m| m.as_str()),
                lines: Vec::new(),
            });
            continue;
        }
        match questions.last_mut() {
            Some(q) => q.lines.push(line),
            None => {
                preamble.push_str(line);
                preamble.push('\n');
            }
        }
    }
    Ok((preamble, questions))
}

fn render_question(
    g: &Grammar,
    q: &Question<'_>,
    is_last: bool,
    locale: &Locale,
    out: &mut String,
) -> Result<(), MarkupError> {
    out.push_str(&format!("<form class=\"question\" id=\"{}\">\n", escape_html(q.id)));
    if !q.heading.trim().is_empty() {
        out.push_str("<div class=\"question-text\">");
        out.push_str(&inline_markdown(q.heading));
        out.push_str("</div>\n");
    }

    let mut ids = IdAllocator::new(q.id);
    let mut prose = String::new();
    for line in &q.lines {
        let response = render_response(g, q.id, line, &mut ids)?;
        match response {
            Some(html) => {
                flush_prose(&mut prose, out);
                out.push_str(&html);
            }
            None => {
                prose.push_str(line);
                prose.push('\n');
            }
        }
    }
    flush_prose(&mut prose, out);

    out.push_str("<div class=\"question-buttons\">\n");
    let back_id = if is_last { " id=\"lastBackButton\"" } else { "" };
    out.push_str(&format!(
        "<button type=\"submit\" class=\"previous\"{back_id} data-click-type=\"previous\">{}</button>\n",
        escape_html(&locale.previous)
    ));
    out.push_str(&format!(
        "<button type=\"submit\" class=\"reset\" data-click-type=\"reset\">{}</button>\n",
        escape_html(&locale.reset)
    ));
    out.push_str(&format!(
        "<button type=\"submit\" class=\"next\" data-click-type=\"next\">{}</button>\n",
        escape_html(&locale.next)
    ));
    if is_last {
        out.push_str(&format!(
            "<button type=\"submit\" id=\"submitButton\" class=\"submitSurvey\" data-click-type=\"submitSurvey\">{}</button>\n",
            escape_html(&locale.submit)
        ));
    }
    out.push_str("</div>\n</form>\n");
    Ok(())
}

fn flush_prose(prose: &mut String, out: &mut String) {
    if !prose.trim().is_empty() {
        out.push_str(&markdown_block(prose));
    }
    prose.clear();
}

struct IdAllocator<'a> {
    question: &'a str,
    next: usize,
}

impl<'a> IdAllocator<'a> {
    fn new(question: &'a str) -> Self {
        Self { question, next: 1 }
    }

    fn allocate(&mut self) -> String {
        let id = format!("{}_{}", self.question, self.next);
        self.next += 1;
        id
    }
}

/// Render a response line, or `None` if the line is prose.
fn render_response(
    g: &Grammar,
    question: &str,
    line: &str,
    ids: &mut IdAllocator<'_>,
) -> Result<Option<String>, MarkupError> {
    let trimmed = line.trim();
    let toggle = g
        .radio
        .captures(trimmed)
        .map(|caps| ("radio", caps))
        .or_else(|| g.checkbox.captures(trimmed).map(|caps| ("checkbox", caps)));

    if let Some((ty, caps)) = toggle {
        let value = caps[1].trim();
        let mut rest = caps.get(2).map_or("", |m| m.as_str());
        let mut skip_to = None;
        if let Some(skip) = g.skip.captures(rest)
            && let (Some(target), Some(tail)) = (skip.get(1), skip.get(2))
        {
            skip_to = Some(target.as_str());
            rest = tail.as_str();
        }

        let id = ids.allocate();
        let mut html = format!(
            "<div class=\"response\"><label for=\"{id}\"><input type=\"{ty}\" id=\"{id}\" name=\"{}\" value=\"{}\"",
            escape_html(question),
            escape_html(value)
        );
        if let Some(target) = skip_to {
            html.push_str(&format!(" data-skip-to=\"{}\"", escape_html(target)));
        }
        html.push('>');
        html.push_str(&render_inline_with_controls(g, question, rest, ids)?);
        html.push_str("</label></div>\n");
        return Ok(Some(html));
    }

    if g.control.is_match(trimmed) {
        let mut html = String::from("<div class=\"response\">");
        html.push_str(&render_inline_with_controls(g, question, trimmed, ids)?);
        html.push_str("</div>\n");
        return Ok(Some(html));
    }

    Ok(None)
}

fn render_inline_with_controls(
    g: &Grammar,
    question: &str,
    text: &str,
    ids: &mut IdAllocator<'_>,
) -> Result<String, MarkupError> {
    let mut out = String::new();
    let mut last = 0;
    for caps in g.control.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&inline_markdown(&text[last..whole.start()]));
        let attrs = caps.get(2).map_or("", |m| m.as_str());
        out.push_str(&render_control(question, &caps[1], attrs, ids)?);
        last = whole.end();
    }
    out.push_str(&inline_markdown(&text[last..]));
    Ok(out)
}

fn render_control(
    question: &str,
    kind: &str,
    attrs: &str,
    ids: &mut IdAllocator<'_>,
) -> Result<String, MarkupError> {
    let (tag, ty, class) = match kind {
        "__" => ("input", Some("text"), None),
        "___" => ("textarea", None, None),
        "tel" | "date" | "month" | "time" | "number" | "email" => ("input", Some(kind), None),
        "SSN" => ("input", Some("text"), Some("SSN")),
        _ => {
            return Err(MarkupError::UnknownControl {
                question: question.to_string(),
                kind: kind.to_string(),
            });
        }
    };

    let mut id = None;
    let mut extra: Vec<(&str, Option<&str>)> = Vec::new();
    for token in attrs.split_whitespace() {
        match token.split_once('=') {
            Some(("id", v)) if !v.is_empty() => id = Some(v.to_string()),
            Some((k, v)) => extra.push((k, Some(v))),
            None => extra.push((token, None)),
        }
    }
    let id = id.unwrap_or_else(|| ids.allocate());

    let mut html = format!("<{tag}");
    if let Some(ty) = ty {
        html.push_str(&format!(" type=\"{ty}\""));
    }
    html.push_str(&format!(" id=\"{0}\" name=\"{0}\"", escape_html(&id)));
    if let Some(class) = class {
        html.push_str(&format!(" class=\"{class}\""));
    }
    for (k, v) in extra {
        html.push(' ');
        html.push_str(&escape_html(k));
        if let Some(v) = v {
            html.push_str(&format!("=\"{}\"", escape_html(v)));
        }
    }
    html.push('>');
    if tag == "textarea" {
        html.push_str("</textarea>");
    }
    Ok(html)
}

fn markdown_block(text: &str) -> String {
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(text));
    out
}

/// Render a fragment as inline markdown, keeping surrounding whitespace as one space.
fn inline_markdown(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if text.is_empty() { String::new() } else { " ".to_string() };
    }
    let rendered = markdown_block(trimmed);
    let inner = rendered
        .trim_end()
        .strip_prefix("<p>")
        .and_then(|s| s.strip_suffix("</p>"))
        .unwrap_or(rendered.trim_end());

    let mut out = String::new();
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(inner);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
