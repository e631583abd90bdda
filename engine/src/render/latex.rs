use std::collections::BTreeSet;
use std::path::Path;

use mdt::block::reference::ProofSubject;
use mdt::block::{BlockInfo, BlockKind};
use mdt::{Node, Role, Tag};

use crate::NumberingOptions;
use crate::assets::{print_form, AssetProbe};
use crate::options::RenderOptions;
use crate::render::{self, Visit, Visitor};

/// Typesetting backend: LaTeX with one environment per block type.
pub struct LatexRenderer<'a> {
    options: &'a RenderOptions,
    assets: &'a dyn AssetProbe,
    math: bool,
}

impl<'a> LatexRenderer<'a> {
    pub fn new(options: &'a RenderOptions, assets: &'a dyn AssetProbe) -> Self {
        LatexRenderer {
            options,
            assets,
            math: false,
        }
    }

    pub fn render(&mut self, node: &Node) -> String {
        render::render(self, node)
    }

    fn ignored(&self, role: Role) -> bool {
        self.options.ignore_roles.contains(&role)
    }

    fn table(&mut self, table: &Node) -> String {
        let columns = table
            .children
            .first()
            .map(|row| row.children.len())
            .unwrap_or(0)
            .max(1);
        let mut out = format!("\\begin{{tabular}}{{{}}}\n", vec!["l"; columns].join(" "));
        for row in &table.children {
            let cells: Vec<String> = row
                .children
                .iter()
                .map(|cell| render::render_content(self, cell).trim().to_string())
                .collect();
            out.push_str(&cells.join(" & "));
            out.push_str(" \\\\\n");
            if row.tag == Tag::TableHead {
                out.push_str("\\hline\n");
            }
        }
        out.push_str("\\end{tabular}\n\n");
        out
    }

    fn link(&self, node: &Node, content: String) -> String {
        let href = escape_url(node.attr("href").unwrap_or_default());
        let content = content.trim();
        let mut out = if content.is_empty() {
            format!("\\url{{{}}}", href)
        } else {
            format!("\\href{{{}}}{{{}}}", href, content)
        };
        if self.options.link_filetypes {
            if let Some(ext) = node
                .attr("href")
                .and_then(|h| Path::new(h).extension())
                .and_then(|e| e.to_str())
            {
                out.push_str(&format!(" ({})", ext.to_uppercase()));
            }
        }
        out
    }
}

/// Escape text outside math mode.
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\textbackslash{}")
        .replace('_', "\\_")
        .replace('&', "\\&")
        .replace('%', "\\%")
}

fn escape_url(url: &str) -> String {
    url.replace('%', "\\%").replace('#', "\\#")
}

fn environment(info: &BlockInfo) -> String {
    let mut env = info.kind.environment();
    if !info.numbered && !info.kind.is_proof() {
        env.push('*');
    }
    env
}

/// Optional argument of `\begin{env}`: name and references, or the proof
/// subject.
fn environment_argument(info: &BlockInfo) -> String {
    if let Some(subject) = &info.subject {
        return match subject {
            ProofSubject::Reference(key) => format!("[Proof of \\ref{{{}}}]", key),
            ProofSubject::Text(text) => format!("[Proof of {}]", escape(text)),
        };
    }
    let parts: Vec<String> = [info.name.as_deref(), info.references.as_deref()]
        .into_iter()
        .flatten()
        .map(escape)
        .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts.join(", "))
    }
}

fn sectioning_command(level: u8) -> String {
    match level {
        0..=3 => format!("\\{}section", "sub".repeat(usize::from(level.saturating_sub(1)))),
        _ => "\\paragraph".to_string(),
    }
}

impl Visitor for LatexRenderer<'_> {
    fn enter(&mut self, node: &Node) -> Visit {
        match &node.tag {
            Tag::Span(role) if self.ignored(*role) => Visit::Emit(String::new()),
            Tag::CodeBlock { .. } => Visit::Emit(format!("\\begin{{verbatim}}\n{}\\end{{verbatim}}\n\n", node.text)),
            Tag::Code => Visit::Emit(format!("\\texttt{{{}}}", escape(&node.text))),
            Tag::Math { .. } => {
                self.math = true;
                Visit::Descend
            }
            Tag::Html => Visit::Emit(String::new()),
            Tag::Rule => Visit::Emit("\\noindent\\rule{\\linewidth}{0.4pt}\n\n".to_string()),
            Tag::HardBreak => Visit::Emit("\\\\\n".to_string()),
            Tag::Image => {
                let src = node.attr("src").unwrap_or_default();
                Visit::Emit(format!("\\includegraphics{{{}}}", print_form(self.assets, src)))
            }
            Tag::Label => Visit::Emit(format!("\\label{{{}}}", node.attr("key").unwrap_or_default())),
            Tag::Reference => Visit::Emit(format!("\\ref{{{}}}", node.attr("key").unwrap_or_default())),
            Tag::Citation => Visit::Emit(format!("\\cite{{{}}}", node.attr("key").unwrap_or_default())),
            Tag::BibEntry => Visit::Emit(format!("\\bibitem{{{}}}", node.attr("key").unwrap_or_default())),
            Tag::Table => Visit::Emit(self.table(node)),
            Tag::Toc => Visit::Emit("\\tableofcontents\n".to_string()),
            _ => Visit::Descend,
        }
    }

    fn text(&mut self, text: &str) -> String {
        if self.math {
            text.to_string()
        } else {
            escape(text)
        }
    }

    fn leave(&mut self, node: &Node, content: String) -> String {
        match &node.tag {
            Tag::Math { display } => {
                self.math = false;
                if *display {
                    format!("\\[{}\\]", content)
                } else {
                    format!("${}$", content)
                }
            }
            Tag::Heading(level) => format!("{}{{{}}}\n\n", sectioning_command(*level), content.trim()),
            Tag::Paragraph => format!("{}\n\n", content.trim()),
            Tag::Block(info) => {
                let env = environment(info);
                format!(
                    "\\begin{{{}}}{}\n{}\n\\end{{{}}}\n\n",
                    env,
                    environment_argument(info),
                    content.trim(),
                    env
                )
            }
            Tag::List { ordered, .. } => {
                let env = if *ordered { "enumerate" } else { "itemize" };
                format!("\\begin{{{}}}\n{}\\end{{{}}}\n\n", env, content, env)
            }
            Tag::Item => format!("  \\item {}\n", content.trim()),
            Tag::BlockQuote => format!("\\begin{{quote}}\n{}\n\\end{{quote}}\n\n", content.trim()),
            Tag::Emphasis => format!("\\emph{{{}}}", content),
            Tag::Strong => format!("\\textbf{{{}}}", content),
            Tag::Strikethrough => format!("\\sout{{{}}}", content),
            Tag::Link => self.link(node, content),
            _ => content,
        }
    }
}

/// `\newtheorem` declarations for every block type found under `root`.
///
/// Types appearing unnumbered get a starred declaration. Without
/// per-type numbering all types share the counter of the first declared
/// one. With a positive depth limit numbers restart per section.
pub fn theorem_declarations(root: &Node, numbering: &NumberingOptions) -> String {
    let mut blocks = Vec::new();
    root.find_all(&|n| n.block().is_some(), &mut blocks);

    let mut numbered = BTreeSet::new();
    let mut unnumbered = BTreeSet::new();
    for info in blocks.iter().filter_map(|n| n.block()) {
        if info.kind.is_proof() {
            continue;
        }
        if info.numbered {
            numbered.insert(info.kind);
        } else {
            unnumbered.insert(info.kind);
        }
    }

    let within = match numbering.depth_limit {
        0 => String::new(),
        1 => "[section]".to_string(),
        2 => "[subsection]".to_string(),
        _ => "[subsubsection]".to_string(),
    };

    let mut out = String::new();
    let mut shared: Option<BlockKind> = None;
    for kind in &numbered {
        let env = kind.environment();
        match shared {
            Some(first) if !numbering.number_by_type => {
                out.push_str(&format!("\\newtheorem{{{}}}[{}]{{{}}}\n", env, first.environment(), kind));
            }
            _ => {
                out.push_str(&format!("\\newtheorem{{{}}}{{{}}}{}\n", env, kind, within));
                shared.get_or_insert(*kind);
            }
        }
    }
    for kind in &unnumbered {
        out.push_str(&format!("\\newtheorem*{{{}*}}{{{}}}\n", kind.environment(), kind));
    }
    out
}
