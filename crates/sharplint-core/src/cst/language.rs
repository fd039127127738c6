//! Rowan language implementation for C#
//!
//! This module implements the `rowan::Language` trait for C#, which connects
//! our CsSyntaxKind enum to Rowan's generic CST infrastructure.

use rowan::Language;

use super::CsSyntaxKind;

/// Language implementation for C#
///
/// This is a zero-sized type that implements `rowan::Language` to provide
/// the connection between our syntax kinds and Rowan's generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = CsSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        CsSyntaxKind::from_raw(raw.0).unwrap_or(CsSyntaxKind::Unknown)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}
