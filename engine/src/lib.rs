pub mod assets;
pub mod error;
pub mod numbering;
pub mod options;
pub mod render;
pub mod sections;
pub mod toc;

pub use assets::{AssetProbe, FsAssets, NoAssets};
pub use error::OptionError;
pub use numbering::{Resolution, Resolver, Target};
pub use options::RenderOptions;
pub use sections::build_sections;
pub use toc::TocNode;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use mdt::{Issue, Meta, Node, Parser};
use serde::Deserialize;
use tracing::debug;

use crate::render::html::{headings_css, HtmlRenderer};
use crate::render::latex::{theorem_declarations, LatexRenderer};

/// Output backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Html,
    Latex,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Latex => "latex",
        }
    }

    /// Conventional file extension of the output.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Latex => "tex",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(Format::Html),
            "latex" | "tex" => Ok(Format::Latex),
            other => Err(OptionError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where generated heading labels go relative to the block number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingPosition {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumberingOptions {
    /// Heading levels that take part in block numbers.
    pub depth_limit: usize,
    /// One counter per block type instead of a shared one.
    pub number_by_type: bool,
    /// Number only blocks that carry a label.
    pub number_referenced_only: bool,
}

impl Default for NumberingOptions {
    fn default() -> Self {
        NumberingOptions {
            depth_limit: 1,
            number_by_type: false,
            number_referenced_only: false,
        }
    }
}

/// Conversion options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    pub format: Format,
    /// Wrap headings and their content into section nodes.
    pub sections: bool,
    pub numbering: NumberingOptions,
    pub heading_position: HeadingPosition,
    /// Raw backend options (`link_filetypes`, `ignore_classes`).
    pub render: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            format: Format::Html,
            sections: true,
            numbering: NumberingOptions::default(),
            heading_position: HeadingPosition::After,
            render: BTreeMap::new(),
        }
    }
}

/// A converted document.
#[derive(Debug, Clone)]
pub struct Output {
    pub format: Format,
    /// Rendered body.
    pub content: String,
    /// Rendered table of contents.
    pub toc: String,
    /// Heading style rules (HTML) or theorem declarations (LaTeX).
    pub headings: String,
    pub meta: Meta,
    /// The resolved tree.
    pub root: Node,
    /// Macro-expanded source; issue spans index into it.
    pub source: String,
    pub issues: Vec<Issue>,
}

impl Output {
    /// Template variables: front matter first, then `content`, `toc` and
    /// `headings_css` or `headings`, which take precedence.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.meta.clone();
        vars.insert("content".to_string(), self.content.clone());
        vars.insert("toc".to_string(), self.toc.clone());
        let key = match self.format {
            Format::Html => "headings_css",
            Format::Latex => "headings",
        };
        vars.insert(key.to_string(), self.headings.clone());
        vars
    }
}

/// Convert `source` with file id 0 and no image assets.
pub fn convert(source: &str, options: &Options) -> Output {
    convert_with(source, 0, options, &NoAssets)
}

/// Run the full pipeline: parse, sectionize, number and resolve, render.
pub fn convert_with(source: &str, file_id: usize, options: &Options, assets: &dyn AssetProbe) -> Output {
    let parsed = Parser::new(source.to_string(), file_id).parse();
    let mut issues = parsed.issues;

    let mut root = if options.sections {
        build_sections(parsed.root)
    } else {
        parsed.root
    };

    let resolution = Resolver::new(options.numbering.clone(), file_id).run(&mut root);
    issues.extend(resolution.issues);
    let toc_node = resolution.toc.to_node();
    debug!(labels = resolution.labels.len(), "resolved");

    let (render_options, option_errors) = RenderOptions::from_map(&options.render);
    issues.extend(option_errors.iter().map(|e| e.to_issue(file_id)));

    let (content, toc, headings) = match options.format {
        Format::Html => {
            let mut renderer = HtmlRenderer::new(&root, file_id);
            let content = renderer.render(&root);
            let toc = renderer.render(&toc_node);
            issues.extend(renderer.into_issues());
            (content, toc, headings_css(&root, options.heading_position))
        }
        Format::Latex => {
            let mut renderer = LatexRenderer::new(&render_options, assets);
            let content = renderer.render(&root);
            let toc = renderer.render(&toc_node);
            (content, toc, theorem_declarations(&root, &options.numbering))
        }
    };

    Output {
        format: options.format,
        content,
        toc,
        headings,
        meta: parsed.meta,
        root,
        source: parsed.source,
        issues,
    }
}
