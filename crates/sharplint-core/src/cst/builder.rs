//! Thin wrapper over rowan's `GreenNodeBuilder` speaking `CsSyntaxKind`

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

use super::{CsSyntaxKind, CsSyntaxNode, CstToken};

/// Incremental CST builder used by the parser and the node factory
#[derive(Default)]
pub struct CstBuilder {
    inner: GreenNodeBuilder<'static>,
}

impl CstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: CsSyntaxKind) {
        self.inner.start_node(kind.into());
    }

    pub fn finish_node(&mut self) {
        self.inner.finish_node();
    }

    pub fn token(&mut self, kind: CsSyntaxKind, text: &str) {
        self.inner.token(kind.into(), text);
    }

    pub fn add_token(&mut self, token: &CstToken) {
        self.token(token.kind, &token.text);
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.inner.checkpoint()
    }

    /// Wrap everything added since `checkpoint` in a node of `kind`
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: CsSyntaxKind) {
        self.inner.start_node_at(checkpoint, kind.into());
    }

    pub fn finish_green(self) -> GreenNode {
        self.inner.finish()
    }

    pub fn finish(self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.finish_green())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_wraps_previous_children() {
        let mut builder = CstBuilder::new();
        builder.start_node(CsSyntaxKind::ExpressionStatement);
        let checkpoint = builder.checkpoint();
        builder.token(CsSyntaxKind::Ident, "a");
        builder.start_node_at(checkpoint, CsSyntaxKind::IdentifierName);
        builder.finish_node();
        builder.token(CsSyntaxKind::Semicolon, ";");
        builder.finish_node();

        let root = builder.finish();
        let child = root.first_child().unwrap();
        assert_eq!(child.kind(), CsSyntaxKind::IdentifierName);
        assert_eq!(child.text().to_string(), "a");
        assert_eq!(root.text().to_string(), "a;");
    }
}
