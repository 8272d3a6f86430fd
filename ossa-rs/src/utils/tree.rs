//! Tree rendering for bone hierarchies

use std::fmt::Write;

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    pub metadata: Vec<(String, String)>,
}

/// Kinds of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// The rig file itself
    Root,
    Bone,
    Clip,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Deepest level printed; the root is level zero
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
    /// Metadata on the node's own line instead of below it
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.push((key.to_string(), value.into()));
        self
    }

    /// Number of bone nodes in this subtree
    pub fn bone_count(&self) -> usize {
        let own = usize::from(self.node_type == NodeType::Bone);
        own + self.children.iter().map(TreeNode::bone_count).sum::<usize>()
    }
}

impl NodeType {
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "🦴",
            NodeType::Bone => "•",
            NodeType::Clip => "🎞️",
        }
    }

    pub fn style(self, no_color: bool) -> Style {
        let style = Style::new();
        if no_color {
            return style;
        }
        match self {
            NodeType::Root => style.bold().cyan(),
            NodeType::Bone => style.green(),
            NodeType::Clip => style.magenta(),
        }
    }
}

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

struct Renderer<'a> {
    options: &'a TreeOptions,
    meta_style: Style,
    output: String,
}

impl Renderer<'_> {
    /// `indent` is the prefix for this node's children and metadata
    fn node(&mut self, node: &TreeNode, lead: &str, indent: &str, depth: usize) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        let name = node.node_type.style(self.options.no_color).apply_to(&node.name);
        let _ = write!(self.output, "{lead}{} {name}", node.node_type.icon());

        let metadata = self.options.show_metadata && !node.metadata.is_empty();
        if metadata && self.options.compact {
            let pairs: Vec<String> = node
                .metadata
                .iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect();
            let _ = write!(self.output, " [{}]", pairs.join(", "));
        }
        self.output.push('\n');

        if metadata && !self.options.compact {
            for (key, value) in &node.metadata {
                let key = self.meta_style.apply_to(key);
                let _ = writeln!(self.output, "{indent}{SPACE}{key}: {value}");
            }
        }

        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let (branch, continuation) = if i + 1 == count {
                (LAST_BRANCH, SPACE)
            } else {
                (BRANCH, PIPE)
            };
            self.node(
                child,
                &format!("{indent}{branch}"),
                &format!("{indent}{continuation}"),
                depth + 1,
            );
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let meta_style = if options.no_color {
        Style::new()
    } else {
        Style::new().dim()
    };
    let mut renderer = Renderer {
        options,
        meta_style,
        output: String::new(),
    };
    renderer.node(root, "", "", 0);
    renderer.output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::new("arm.json", NodeType::Root)
            .add_child(
                TreeNode::new("shoulder", NodeType::Bone)
                    .with_metadata("index", "0")
                    .add_child(TreeNode::new("elbow", NodeType::Bone))
                    .add_child(TreeNode::new("hand", NodeType::Bone)),
            )
            .add_child(TreeNode::new("wave", NodeType::Clip))
    }

    #[test]
    fn test_tree_rendering() {
        let options = TreeOptions {
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample(), &options);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "🦴 arm.json");
        assert_eq!(lines[1], "├── • shoulder");
        assert_eq!(lines[2], "│       index: 0");
        assert_eq!(lines[3], "│   ├── • elbow");
        assert_eq!(lines[4], "│   └── • hand");
        assert_eq!(lines[5], "└── 🎞️ wave");
    }

    #[test]
    fn test_depth_and_compact() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            compact: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample(), &options);

        assert!(output.contains("├── • shoulder [index:0]"));
        assert!(!output.contains("elbow"));
        assert!(output.contains("wave"));
    }

    #[test]
    fn test_bone_count() {
        assert_eq!(sample().bone_count(), 3);
    }
}
