//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 10-19   | config           | Configuration loading codes              |
//! | 20-29   | fetch            | Sheet read codes                         |
//! | 30-39   | mutate           | Webhook write codes                      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Config file exists but cannot be read or parsed.
pub const EXIT_CONFIG_PARSE: u8 = 10;

/// Required setting missing after flag > env > file resolution.
pub const EXIT_CONFIG_MISSING: u8 = 11;

// =============================================================================
// Fetch (20-29) — sheet reads
// =============================================================================

/// Network failure talking to the sheet endpoints (after retries).
pub const EXIT_FETCH_NETWORK: u8 = 20;

/// Sheet endpoint answered with an error (bad tab, revoked access).
pub const EXIT_FETCH_API: u8 = 21;

// =============================================================================
// Mutate (30-39) — webhook writes
// =============================================================================

/// Mutation payload failed validation before sending.
pub const EXIT_MUTATE_INVALID: u8 = 30;

/// Webhook was reached but rejected the mutation.
pub const EXIT_MUTATE_REJECTED: u8 = 31;

/// Webhook unreachable (network failure).
pub const EXIT_MUTATE_NETWORK: u8 = 32;
