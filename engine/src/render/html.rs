use std::collections::{BTreeSet, HashMap};

use html_escape::{encode_double_quoted_attribute, encode_text};
use mdt::block::BlockKind;
use mdt::{Issue, IssueKind, Node, Role, Tag};
use tracing::warn;

use crate::HeadingPosition;
use crate::render::{self, Visit, Visitor};

/// Structural backend: HTML with class-annotated blocks and spans.
#[derive(Debug)]
pub struct HtmlRenderer {
    /// Bibliography entry number by key, in document order from 1.
    bibliography: HashMap<String, usize>,
    in_table_head: bool,
    file_id: usize,
    issues: Vec<Issue>,
}

impl HtmlRenderer {
    /// Prepare a renderer for `root`, numbering its bibliography entries.
    pub fn new(root: &Node, file_id: usize) -> Self {
        let mut entries = Vec::new();
        root.find_all(&|n| n.tag == Tag::BibEntry, &mut entries);
        let mut bibliography = HashMap::new();
        for entry in entries {
            if let Some(key) = entry.attr("key") {
                let next = bibliography.len() + 1;
                bibliography.entry(key.to_string()).or_insert(next);
            }
        }
        HtmlRenderer {
            bibliography,
            in_table_head: false,
            file_id,
            issues: Vec::new(),
        }
    }

    pub fn render(&mut self, node: &Node) -> String {
        render::render(self, node)
    }

    /// Issues met while rendering (unknown citations).
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    fn citation(&mut self, node: &Node) -> String {
        let key = node.attr("key").unwrap_or_default();
        match self.bibliography.get(key) {
            Some(n) => format!(
                "<a class=\"citation\" href=\"#bib-{}\">[{}]</a>",
                encode_double_quoted_attribute(key),
                n
            ),
            None => {
                warn!(%key, "citation without bibliography entry");
                self.issues.push(Issue::warning(
                    IssueKind::UnknownCitation {
                        key: key.to_string(),
                    },
                    None,
                    self.file_id,
                ));
                format!("<span class=\"citation unknown\">[{}]</span>", encode_text(key))
            }
        }
    }
}

fn attr(name: &str, value: &str) -> String {
    format!(" {}=\"{}\"", name, encode_double_quoted_attribute(value))
}

fn opt_attr(name: &str, value: Option<&str>) -> String {
    value.map(|v| attr(name, v)).unwrap_or_default()
}

fn span_classes(node: &Node, role: Role) -> String {
    let mut classes = role.class_name().to_string();
    if node.flags.anchor {
        classes.push_str(" anchor");
    }
    if node.flags.nested {
        classes.push_str(" nested");
    }
    classes
}

impl Visitor for HtmlRenderer {
    fn enter(&mut self, node: &Node) -> Visit {
        match &node.tag {
            Tag::CodeBlock { language } => {
                let class = language
                    .as_deref()
                    .map(|l| attr("class", &format!("language-{}", l)))
                    .unwrap_or_default();
                Visit::Emit(format!("<pre><code{}>{}</code></pre>\n", class, encode_text(&node.text)))
            }
            Tag::Code => Visit::Emit(format!("<code>{}</code>", encode_text(&node.text))),
            Tag::Math { display: false } => Visit::Emit(format!("\\({}\\)", encode_text(&node.text))),
            Tag::Math { display: true } => Visit::Emit(format!("\\[{}\\]", encode_text(&node.text))),
            Tag::Html => Visit::Emit(node.text.clone()),
            Tag::Rule => Visit::Emit("<hr />\n".to_string()),
            Tag::HardBreak => Visit::Emit("<br />\n".to_string()),
            Tag::Image => Visit::Emit(format!(
                "<img{}{}{} />",
                opt_attr("src", node.attr("src")),
                attr("alt", &node.text_content()),
                opt_attr("title", node.attr("title")),
            )),
            Tag::Label => Visit::Emit(format!(
                "<span class=\"label\"{}></span>",
                opt_attr("key", node.attr("key"))
            )),
            Tag::Citation => Visit::Emit(self.citation(node)),
            Tag::BibEntry => {
                let key = node.attr("key").unwrap_or_default();
                let n = self.bibliography.get(key).copied().unwrap_or_default();
                Visit::Emit(format!(
                    "<span class=\"bibitem anchor\"{}>[{}]</span>",
                    attr("id", &format!("bib-{}", key)),
                    n
                ))
            }
            Tag::TableHead => {
                self.in_table_head = true;
                Visit::Descend
            }
            _ => Visit::Descend,
        }
    }

    fn text(&mut self, text: &str) -> String {
        encode_text(text).into_owned()
    }

    fn leave(&mut self, node: &Node, content: String) -> String {
        match &node.tag {
            Tag::Root => content,
            Tag::Section => format!(
                "<section{}{}{}>\n{}</section>\n",
                opt_attr("level", node.attr("level")),
                opt_attr("number", node.attr("number")),
                opt_attr("title", node.attr("title")),
                content
            ),
            Tag::Toc => format!("<nav class=\"toc\">\n{}</nav>\n", content),
            Tag::Heading(level) => format!("<h{}>{}</h{}>\n", level, content, level),
            Tag::Paragraph => format!("<p>{}</p>\n", content),
            Tag::BlockQuote => format!("<blockquote>\n{}</blockquote>\n", content),
            Tag::List { ordered: false, .. } => format!("<ul>\n{}</ul>\n", content),
            Tag::List { ordered: true, start } => {
                let start = if *start == 1 {
                    String::new()
                } else {
                    attr("start", &start.to_string())
                };
                format!("<ol{}>\n{}</ol>\n", start, content)
            }
            Tag::Item => format!("<li>{}</li>\n", content),
            Tag::Table => format!("<table>\n{}</table>\n", content),
            Tag::TableHead => {
                self.in_table_head = false;
                format!("<thead>\n<tr>{}</tr>\n</thead>\n", content)
            }
            Tag::TableRow => format!("<tr>{}</tr>\n", content),
            Tag::TableCell if self.in_table_head => format!("<th>{}</th>", content),
            Tag::TableCell => format!("<td>{}</td>", content),
            Tag::Emphasis => format!("<em>{}</em>", content),
            Tag::Strong => format!("<strong>{}</strong>", content),
            Tag::Strikethrough => format!("<del>{}</del>", content),
            Tag::Link => format!(
                "<a{}{}>{}</a>",
                opt_attr("href", node.attr("href")),
                opt_attr("title", node.attr("title")),
                content
            ),
            Tag::Reference => format!(
                "<span class=\"reference\"{}>{}</span>",
                opt_attr("key", node.attr("key")),
                content
            ),
            Tag::Block(info) => {
                let mut classes = format!("block {}", info.kind);
                if !info.numbered {
                    classes.push_str(" do_not_number");
                }
                if node.flags.anchor {
                    classes.push_str(" anchor");
                }
                format!(
                    "<div{}{}{}{}{}{}>\n{}</div>\n",
                    attr("class", &classes),
                    attr("type", info.kind.as_str()),
                    opt_attr("id", node.attr("id")),
                    opt_attr("label", info.label.as_deref()),
                    opt_attr("name", info.name.as_deref()),
                    opt_attr("references", info.references.as_deref()),
                    content
                )
            }
            Tag::Span(Role::ReferenceNumber) if node.attr("href").is_some() => format!(
                "<a class=\"reference_number\"{}>{}</a>",
                opt_attr("href", node.attr("href")),
                content
            ),
            Tag::Span(role) => format!(
                "<span{}{}{}>{}</span>",
                attr("class", &span_classes(node, *role)),
                opt_attr("id", node.attr("id")),
                opt_attr("type", node.attr("type")),
                content
            ),
            _ => content,
        }
    }
}

/// Style rules giving every block type found under `root` its heading
/// label. The rules attach to the empty `block_label` span that precedes
/// the number (or the subject of a proof), on its `:before` or `:after`.
pub fn headings_css(root: &Node, position: HeadingPosition) -> String {
    let mut blocks = Vec::new();
    root.find_all(&|n| n.block().is_some(), &mut blocks);
    let kinds: BTreeSet<BlockKind> = blocks
        .iter()
        .filter_map(|n| n.block().map(|b| b.kind))
        .collect();

    let (pseudo, space) = match position {
        HeadingPosition::Before => ("before", ""),
        HeadingPosition::After => ("after", " "),
    };
    let mut css = String::new();
    for kind in kinds {
        css.push_str(&format!(
            ".block_label[type=\"{}\"]:{} {{\n  content:'{}{}';\n",
            kind, pseudo, kind, space
        ));
        if kind.is_proof() {
            css.push_str("  font-style:italic;\n");
        }
        css.push_str("}\n");
    }
    css
}
