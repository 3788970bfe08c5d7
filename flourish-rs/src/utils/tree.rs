//! Tree structure rendering for clip part hierarchies

use console::Style;

/// Represents a node in a tree structure
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Ordered key/value lines shown under the node
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Clip,
    Part,
    /// Part that draws nothing by itself
    Group,
    Events,
}

/// Reference from a part to something outside its subtree
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub ref_type: RefType,
}

/// Types of references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Texture,
    SplitPivot,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Add external reference
    pub fn with_external_ref(mut self, path: &str, ref_type: RefType) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            ref_type,
        });
        self
    }
}

impl ExternalRef {
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Texture => "🖼️",
            RefType::SplitPivot => "✂️",
        }
    }

    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.ref_type {
                RefType::Texture => Style::new().green(),
                RefType::SplitPivot => Style::new().yellow(),
            }
        }
    }
}

impl NodeType {
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Clip => "🎬",
            NodeType::Part => "🦴",
            NodeType::Group => "📁",
            NodeType::Events => "⏱️",
        }
    }

    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Clip => Style::new().bold().cyan(),
                NodeType::Part => Style::new().green(),
                NodeType::Group => Style::new().cyan(),
                NodeType::Events => Style::new().magenta(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let icon = node.node_type.icon();
    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        connector,
        icon,
        style.apply_to(&node.name)
    );

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let meta: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        line.push_str(&format!(" [{}]", meta.join(", ")));
    }

    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        ""
    } else if is_last {
        "    "
    } else {
        "│   "
    };
    let detail_prefix = format!("{prefix}{child_prefix}    ");

    if options.show_metadata && !options.compact {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}🏷️  {}: {}\n",
                detail_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs {
        for ext_ref in &node.external_refs {
            output.push_str(&format!(
                "{}└─→ {} {}\n",
                detail_prefix,
                ext_ref.icon(),
                ext_ref.style(options.no_color).apply_to(&ext_ref.path)
            ));
        }
    }

    let new_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{child_prefix}")
    };
    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(child, output, &new_prefix, is_last_child, depth + 1, options);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::new("Lunge", NodeType::Clip)
            .with_metadata("duration", "1.000s")
            .add_child(
                TreeNode::new("Body", NodeType::Part)
                    .with_external_ref("Things/Body", RefType::Texture)
                    .add_child(
                        TreeNode::new("Sword", NodeType::Part)
                            .with_external_ref("Body", RefType::SplitPivot),
                    ),
            )
            .add_child(TreeNode::new("Events (2)", NodeType::Events))
    }

    #[test]
    fn test_tree_rendering() {
        let options = TreeOptions {
            no_color: true,
            ..Default::default()
        };
        let output = render_tree(&sample_tree(), &options);

        assert!(output.starts_with("🎬 Lunge\n"));
        assert!(output.contains("├── 🦴 Body"));
        assert!(output.contains("│   └── 🦴 Sword"));
        assert!(output.contains("└── ⏱️ Events (2)"));
        assert!(output.contains("└─→ 🖼️ Things/Body"));
        assert!(output.contains("duration: 1.000s"));
    }

    #[test]
    fn test_depth_limit() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
            ..Default::default()
        };
        let output = render_tree(&sample_tree(), &options);
        assert!(output.contains("Body"));
        assert!(!output.contains("Sword"));
    }

    #[test]
    fn test_compact_metadata() {
        let options = TreeOptions {
            compact: true,
            no_color: true,
            show_external_refs: false,
            ..Default::default()
        };
        let output = render_tree(&sample_tree(), &options);
        assert!(output.starts_with("🎬 Lunge [duration:1.000s]\n"));
        assert!(!output.contains("Things/Body"));
    }
}
