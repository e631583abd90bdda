use mdt::{Node, Role, Tag};

/// Table of contents as a tree indexed by dotted section numbers.
///
/// Children keep insertion order, which is document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TocNode {
    pub title: Option<String>,
    pub children: Vec<(String, TocNode)>,
    pub root: bool,
}

impl TocNode {
    pub fn root() -> Self {
        TocNode {
            root: true,
            ..TocNode::default()
        }
    }

    /// Insert a section by dotted number, creating intermediate nodes.
    pub fn insert_section(&mut self, number: &str, title: &str) {
        let mut node = self;
        for segment in number.split('.') {
            node = node.child_mut(segment);
        }
        node.title = Some(title.to_string());
    }

    fn child_mut(&mut self, segment: &str) -> &mut TocNode {
        let index = match self.children.iter().position(|(id, _)| id == segment) {
            Some(index) => index,
            None => {
                self.children.push((segment.to_string(), TocNode::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[index].1
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Export as a renderable tree: a [`Tag::Toc`] node holding nested
    /// lists whose titled items link to `#sec<number>`.
    pub fn to_node(&self) -> Node {
        let mut toc = Node::new(Tag::Toc);
        if let Some(list) = self.list_node("") {
            toc.push(list);
        }
        toc
    }

    fn list_node(&self, prefix: &str) -> Option<Node> {
        if self.children.is_empty() {
            return None;
        }
        let mut list = Node::new(Tag::List {
            ordered: false,
            start: 1,
        });
        for (id, child) in &self.children {
            let path = if prefix.is_empty() {
                id.clone()
            } else {
                format!("{}.{}", prefix, id)
            };
            list.push(child.item_node(&path));
        }
        Some(list)
    }

    fn item_node(&self, path: &str) -> Node {
        let mut item = Node::new(Tag::Item).with_attr("path", path);
        if let Some(title) = &self.title {
            let mut link = Node::new(Tag::Link).with_attr("href", format!("#sec{}", path));
            link.push(Node::span(Role::SectionNumber).with_text(path));
            link.push(Node::span(Role::TocTitle).with_text(title.clone()));
            item.push(link);
        }
        if let Some(list) = self.list_node(path) {
            item.push(list);
        }
        item
    }
}
