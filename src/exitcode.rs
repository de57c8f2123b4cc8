/// Exit codes for the kbimport CLI, following the BSD sysexits convention.
///
/// Successful termination
pub const SUCCESS: i32 = 0;

/// Command line usage error: bad arguments, unknown format, undetectable input
pub const USAGE: i32 = 64;

/// The input file was read but could not be parsed at all
pub const DATAERR: i32 = 65;

/// The input file does not exist or is not readable
pub const NOINPUT: i32 = 66;

