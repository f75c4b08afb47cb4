//! Operation options
//!
//! Put modes and the bitmask flags accepted by tune, ext, restore and the
//! batched (misc) calls. The raw integer constants are exported under the
//! names host bindings traditionally register, so numeric options coming
//! from an embedding environment can be resolved into the typed forms.

use std::ops::{BitOr, BitOrAssign};

use crate::error::{Result, TyrantError};

// =============================================================================
// Named Integer Constants
// =============================================================================

/// Tune: reconnect automatically after a transport failure
pub const RDBTRECON: u32 = 1 << 0;

/// Ext: lock the record while the extension runs
pub const RDBXOLCKREC: u32 = 1 << 0;

/// Ext: lock the whole database while the extension runs
pub const RDBXOLCKGLB: u32 = 1 << 1;

/// Restore: check consistency of the update log
pub const RDBROCHKCON: u32 = 1 << 0;

/// Misc: do not write the update log
pub const RDBMONOULOG: u32 = 1 << 0;

/// Put mode: overwrite the existing value
pub const RDBPUT: i32 = 0;

/// Put mode: keep the existing value
pub const RDBPUTKEEP: i32 = 1;

/// Put mode: concatenate to the existing value
pub const RDBPUTCAT: i32 = 2;

/// Put mode: concatenate and shift left to a width
pub const RDBPUTSHL: i32 = 3;

/// Put mode: put without waiting for a reply
pub const RDBPUTNR: i32 = 4;

// =============================================================================
// Flag Sets
// =============================================================================

macro_rules! option_flags {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $value:expr;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// No flags set
            pub const NONE: Self = Self(0);
            $($(#[$fmeta])* pub const $flag: Self = Self($value);)*

            const ALL: u32 = 0 $(| $value)*;

            /// Raw bitmask as sent on the wire
            pub fn bits(self) -> u32 {
                self.0
            }

            /// Build from a raw bitmask, rejecting unknown bits
            pub fn from_bits(bits: u32) -> Option<Self> {
                if bits & !Self::ALL == 0 {
                    Some(Self(bits))
                } else {
                    None
                }
            }

            /// True if every flag in `other` is set
            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

option_flags! {
    /// Connection-level behavior flags applied by `tune`
    TuneOptions {
        /// Reconnect and retry once when a request hits a transport failure
        RECONNECT = RDBTRECON;
    }
}

option_flags! {
    /// Locking flags for extension calls
    ExtOptions {
        LOCK_RECORD = RDBXOLCKREC;
        LOCK_GLOBAL = RDBXOLCKGLB;
    }
}

option_flags! {
    /// Flags for `restore` and `setmaster`
    RestoreOptions {
        CONSISTENCY_CHECK = RDBROCHKCON;
    }
}

option_flags! {
    /// Flags for misc calls (batched put/out/get)
    MiscOptions {
        NO_UPDATE_LOG = RDBMONOULOG;
    }
}

// =============================================================================
// Put Mode
// =============================================================================

/// How a single-record put treats an existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PutMode {
    /// Replace any existing value
    #[default]
    Overwrite,

    /// Store only if the key is absent
    Keep,

    /// Append to the existing value
    Concat,

    /// Append, then keep only the trailing `width` bytes
    ConcatShiftLeft { width: u32 },

    /// Overwrite without waiting for acknowledgment
    NoReply,
}

impl PutMode {
    /// Resolve a host-side put-mode constant (`RDBPUT` .. `RDBPUTNR`)
    ///
    /// `width` is required for `RDBPUTSHL` and ignored otherwise.
    pub fn from_code(code: i32, width: Option<u32>) -> Result<Self> {
        match code {
            RDBPUT => Ok(PutMode::Overwrite),
            RDBPUTKEEP => Ok(PutMode::Keep),
            RDBPUTCAT => Ok(PutMode::Concat),
            RDBPUTSHL => width
                .map(|width| PutMode::ConcatShiftLeft { width })
                .ok_or_else(|| {
                    TyrantError::InvalidArgument("shift-left put requires a width".to_string())
                }),
            RDBPUTNR => Ok(PutMode::NoReply),
            other => Err(TyrantError::InvalidArgument(format!(
                "unknown put mode: {}",
                other
            ))),
        }
    }

    /// Host-side constant for this mode
    pub fn code(self) -> i32 {
        match self {
            PutMode::Overwrite => RDBPUT,
            PutMode::Keep => RDBPUTKEEP,
            PutMode::Concat => RDBPUTCAT,
            PutMode::ConcatShiftLeft { .. } => RDBPUTSHL,
            PutMode::NoReply => RDBPUTNR,
        }
    }
}
