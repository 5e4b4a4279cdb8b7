//! # Shared Vocabulary (Host ↔ Engine)
//!
//! Types and constants shared between a host integration (the application
//! emitting lifecycle notifications) and the `iterscope` capture engine. The
//! crate is `no_std` and dependency-free unless the `serde` feature is enabled,
//! so a host can depend on it without pulling in the engine.
//!
//! ## Key Types
//!
//! - [`IterationKind`] - Phase tag attached to iterations and kind-qualified spans
//! - [`EventFlags`] - Bit-set carried by every span (user code, flatten)
//!
//! ## Defaults
//!
//! The numeric defaults below are the values the engine uses when no
//! configuration overrides them.

#![cfg_attr(not(test), no_std)]

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Default Constants
// ============================================================================

/// Number of sampled frames a marker search stays alive before it is dropped.
pub const DEFAULT_FRAME_BUDGET: u32 = 600;

/// Depth bound for marker search in a regular capture.
pub const DEFAULT_SEARCH_DEPTH: usize = 8;

/// Depth bound for marker search while deep capture is active.
///
/// Deep capture instruments every managed call, so markers sit further down
/// the sample hierarchy.
pub const DEFAULT_DEEP_SEARCH_DEPTH: usize = 12;

/// Samples with an inclusive duration below this value (ms) are not imported.
pub const DEFAULT_MIN_IMPORT_DURATION: f64 = 0.01;

/// Share of the iteration (0-100) below which the performance report stops
/// expanding a subtree.
pub const DEFAULT_PRUNE_PERCENTAGE: f64 = 1.0;

/// Share of the parent's share (0-100) above which a node is treated as a
/// pass-through and folded into its parent in the performance report.
pub const DEFAULT_DIVERGENCE_PERCENTAGE: f64 = 75.0;

// ============================================================================
// Iteration Kind
// ============================================================================

/// Phase of a development iteration.
///
/// Used both as the tag of a whole iteration and as the kind of the spans
/// created from lifecycle notifications. Spans imported from sampled data
/// carry [`IterationKind::None`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IterationKind {
    #[default]
    None,
    AssetImport,
    AssetPostProcess,
    ScriptCompilation,
    AssemblyCompilation,
    EnterPlayMode,
    ExitPlayMode,
    AssemblyReload,
}

impl IterationKind {
    /// Every kind, in declaration order.
    pub const ALL: [IterationKind; 8] = [
        IterationKind::None,
        IterationKind::AssetImport,
        IterationKind::AssetPostProcess,
        IterationKind::ScriptCompilation,
        IterationKind::AssemblyCompilation,
        IterationKind::EnterPlayMode,
        IterationKind::ExitPlayMode,
        IterationKind::AssemblyReload,
    ];

    /// Textual name, also used as the default span identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            IterationKind::None => "None",
            IterationKind::AssetImport => "AssetImport",
            IterationKind::AssetPostProcess => "AssetPostProcess",
            IterationKind::ScriptCompilation => "ScriptCompilation",
            IterationKind::AssemblyCompilation => "AssemblyCompilation",
            IterationKind::EnterPlayMode => "EnterPlayMode",
            IterationKind::ExitPlayMode => "ExitPlayMode",
            IterationKind::AssemblyReload => "AssemblyReload",
        }
    }

    /// Parse a kind from its textual name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, IterationKind::None)
    }
}

impl fmt::Display for IterationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Event Flags
// ============================================================================

/// Bit-set of span flags.
///
/// Flags are only ever added: importing ORs marker flags into the inherited
/// set, and the structural pass ORs in [`EventFlags::FLATTEN`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventFlags(u32);

impl EventFlags {
    pub const NONE: EventFlags = EventFlags(0);

    /// Span is attributable to caller code rather than framework internals.
    pub const USER_CODE: EventFlags = EventFlags(1 << 0);

    /// Span's sole child may be merged with it when rendering.
    pub const FLATTEN: EventFlags = EventFlags(1 << 1);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        EventFlags(bits)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: EventFlags) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn intersection(self, other: EventFlags) -> EventFlags {
        EventFlags(self.0 & other.0)
    }

    pub fn insert(&mut self, other: EventFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for EventFlags {
    type Output = EventFlags;

    fn bitor(self, rhs: EventFlags) -> EventFlags {
        EventFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventFlags {
    fn bitor_assign(&mut self, rhs: EventFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut first = true;
        for (flag, name) in [(EventFlags::USER_CODE, "UserCode"), (EventFlags::FLATTEN, "Flatten")] {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_name_round_trips() {
        for kind in IterationKind::ALL {
            assert_eq!(IterationKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(IterationKind::from_name("Bogus"), None);
    }

    #[test]
    fn test_flags_are_additive() {
        let mut flags = EventFlags::NONE;
        flags |= EventFlags::USER_CODE;
        flags.insert(EventFlags::FLATTEN);

        assert!(flags.contains(EventFlags::USER_CODE));
        assert!(flags.contains(EventFlags::FLATTEN));
        assert!(!EventFlags::NONE.contains(EventFlags::NONE));
        assert_eq!(flags.bits(), 0b11);
    }

    #[test]
    fn test_flags_intersection() {
        let flags = EventFlags::USER_CODE | EventFlags::FLATTEN;
        assert_eq!(flags.intersection(EventFlags::FLATTEN), EventFlags::FLATTEN);
        assert!(EventFlags::USER_CODE.intersection(EventFlags::FLATTEN).is_empty());
    }
}
