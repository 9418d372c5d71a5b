//! CLI Exit Code Registry
//!
//! Single source of truth for `tankgauge` exit codes. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error (unspecified)                   |
//! | 2       | Universal  | CLI usage error (bad args)                    |
//! | 3       | Universal  | File could not be read or written             |
//! | 10-19   | import     | Bulk import codes                             |
//! | 20-29   | gauge      | Volume lookup and correction codes            |
//! | 30-39   | store      | Calibration snapshot and history storage      |
//! | 40-49   | tables     | Correction tables configuration               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown product, malformed number.
pub const EXIT_USAGE: u8 = 2;

/// Input or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Import (10-19)
// =============================================================================

/// Input is empty or contains no record tags. Nothing was applied.
pub const EXIT_IMPORT_NO_RECORDS: u8 = 10;

/// Some records failed and `--fail-on-error` was given.
/// The partial result is still persisted.
pub const EXIT_IMPORT_RECORD_ERRORS: u8 = 11;

// =============================================================================
// Gauge (20-29)
// =============================================================================

/// Vessel or tank external id not found in the calibration store.
pub const EXIT_GAUGE_NOT_FOUND: u8 = 20;

/// Trim not calibrated for the tank, or height outside the calibrated range.
pub const EXIT_GAUGE_RANGE: u8 = 21;

/// Reading rejected (non-finite or negative input).
pub const EXIT_GAUGE_INVALID: u8 = 22;

/// Correction computed but the product is outside its specification (FORA).
pub const EXIT_GAUGE_OUT_OF_SPEC: u8 = 23;

// =============================================================================
// Store (30-39)
// =============================================================================

/// Calibration snapshot exists but cannot be parsed.
pub const EXIT_STORE_CORRUPT: u8 = 30;

/// Measurement history could not be read or written.
pub const EXIT_HISTORY: u8 = 31;

// =============================================================================
// Tables (40-49)
// =============================================================================

/// Correction tables TOML failed to parse or validate.
pub const EXIT_TABLES_INVALID: u8 = 40;
