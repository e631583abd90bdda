//! Section and block numbering, label collection, and reference resolution.
//!
//! All state lives in a [`Resolver`] built for one document. Two passes
//! run over the tree: the first assigns numbers and records labels, the
//! second resolves references (forward references are legal).

use std::collections::{BTreeMap, HashMap};

use mdt::{Issue, IssueKind, Node, Role, Tag};
use tracing::{debug, warn};

use crate::NumberingOptions;
use crate::sections::{fill_section_attrs, heading_title};
use crate::toc::TocNode;

/// Placeholder shown for a reference whose label is unknown.
pub const UNRESOLVED: &str = "??";

/// Where a label points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Display text: a section or block number.
    pub number: String,
    /// Anchor id: `sec<n>` for sections, the block number for blocks.
    pub anchor: String,
}

/// Result of resolving one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub toc: TocNode,
    pub labels: BTreeMap<String, Target>,
    pub issues: Vec<Issue>,
}

/// Per-document numbering context.
#[derive(Debug)]
pub struct Resolver {
    options: NumberingOptions,
    file_id: usize,
    section: Vec<u32>,
    counters: HashMap<String, u32>,
    /// Enclosing blocks, innermost last. `Some` holds the number of a
    /// numbered block.
    blocks: Vec<Option<Target>>,
    labels: BTreeMap<String, Target>,
    toc: TocNode,
    issues: Vec<Issue>,
}

impl Resolver {
    pub fn new(options: NumberingOptions, file_id: usize) -> Self {
        Resolver {
            section: vec![0; options.depth_limit],
            options,
            file_id,
            counters: HashMap::new(),
            blocks: Vec::new(),
            labels: BTreeMap::new(),
            toc: TocNode::root(),
            issues: Vec::new(),
        }
    }

    /// Number and resolve `root` in place. Consumes the resolver, so every
    /// run starts from fresh state.
    pub fn run(mut self, root: &mut Node) -> Resolution {
        self.number(root);
        self.resolve(root);
        Resolution {
            toc: self.toc,
            labels: self.labels,
            issues: self.issues,
        }
    }

    /// Dotted section number limited to the first `depth` components.
    pub fn section_number(&self, depth: usize) -> String {
        self.section
            .iter()
            .take(depth)
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn full_section_number(&self) -> String {
        self.section_number(self.section.len())
    }

    // -----------------------------------------------------------------------
    // First pass
    // -----------------------------------------------------------------------

    fn number(&mut self, node: &mut Node) {
        for child in &mut node.children {
            if let Some(level) = child.heading_level() {
                self.enter_section(level);
                self.number_heading(child);
                self.number(child);
            } else if child.block().is_some() {
                let target = self.number_block(child);
                self.blocks.push(target);
                self.number(child);
                self.blocks.pop();
            } else if child.role() == Some(Role::BlockNumber) {
                child.text = self
                    .blocks
                    .last()
                    .and_then(|b| b.as_ref())
                    .map(|t| t.number.clone())
                    .unwrap_or_default();
            } else if child.tag == Tag::Label {
                self.record_label(child);
            } else {
                self.number(child);
            }

            if child.tag == Tag::Section {
                if let Some(heading) = child.children.iter().find(|c| c.heading_level().is_some()) {
                    let heading = heading.clone();
                    fill_section_attrs(child, &heading);
                }
            }
        }
    }

    fn enter_section(&mut self, level: u8) {
        let depth = usize::from(level.saturating_sub(1));
        if depth < self.section.len() {
            self.section[depth] += 1;
            self.section.truncate(depth + 1);
        } else {
            self.section.push(1);
        }
        if depth < self.options.depth_limit {
            for counter in self.counters.values_mut() {
                *counter = 0;
            }
        }
        debug!(section = %self.full_section_number(), "section");
    }

    fn number_heading(&mut self, heading: &mut Node) {
        let number = self.full_section_number();
        let title = heading_title(heading);

        let existing = heading
            .children
            .iter()
            .position(|c| c.role() == Some(Role::SectionNumber));
        let index = match existing {
            Some(index) => index,
            None => {
                let mut span = Node::span(Role::SectionNumber);
                span.tail = std::mem::take(&mut heading.text);
                heading.children.insert(0, span);
                0
            }
        };
        let span = &mut heading.children[index];
        span.text = number.clone();
        span.set_attr("id", format!("sec{}", number));
        span.flags.anchor = true;

        self.toc.insert_section(&number, &title);
    }

    fn number_block(&mut self, block: &mut Node) -> Option<Target> {
        let labeled = block.find(&|n| n.tag == Tag::Label).is_some();
        let referenced_only = self.options.number_referenced_only;
        let by_type = self.options.number_by_type;
        let info = block.block_mut()?;
        if referenced_only && !labeled {
            info.numbered = false;
        }
        let (kind, numbered) = (info.kind, info.numbered);
        if !numbered {
            block.flags.anchor = false;
            return None;
        }

        let key = if by_type {
            kind.as_str().to_string()
        } else {
            "generic".to_string()
        };
        let counter = self.counters.entry(key).or_insert(0);
        *counter += 1;
        let counter = *counter;

        let prefix = self.section_number(self.options.depth_limit);
        let number = if prefix.is_empty() {
            counter.to_string()
        } else {
            format!("{}.{}", prefix, counter)
        };
        debug!(%kind, %number, "block");

        block.set_attr("id", number.clone());
        block.flags.anchor = true;
        Some(Target {
            anchor: number.clone(),
            number,
        })
    }

    fn record_label(&mut self, label: &Node) {
        let Some(key) = label.attr("key") else {
            return;
        };
        let target = match self.blocks.iter().rev().flatten().next() {
            Some(block) => block.clone(),
            None => {
                let number = self.full_section_number();
                Target {
                    anchor: format!("sec{}", number),
                    number,
                }
            }
        };
        self.labels.insert(key.to_string(), target);
    }

    // -----------------------------------------------------------------------
    // Second pass
    // -----------------------------------------------------------------------

    fn resolve(&mut self, node: &mut Node) {
        for child in &mut node.children {
            if child.tag == Tag::Reference {
                self.resolve_reference(child);
            } else {
                self.resolve(child);
            }
        }
    }

    fn resolve_reference(&mut self, reference: &mut Node) {
        let key = reference.attr("key").unwrap_or_default().to_string();
        reference
            .children
            .retain(|c| c.role() != Some(Role::ReferenceNumber));

        let number = match self.labels.get(&key) {
            Some(target) => Node::span(Role::ReferenceNumber)
                .with_attr("href", format!("#{}", target.anchor))
                .with_text(target.number.clone()),
            None => {
                warn!(%key, "undefined reference");
                self.issues.push(Issue::warning(
                    IssueKind::UnresolvedReference { key },
                    None,
                    self.file_id,
                ));
                Node::span(Role::ReferenceNumber).with_text(UNRESOLVED)
            }
        };
        reference.push(number);
    }
}
