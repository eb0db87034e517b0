use libdockyard::DockyardError;

/// Image existence and working directory check
pub mod check;

/// Reference parsing diagnostics
pub mod parse;

/// Version command handlers
pub mod version;

/// Exit status for a failed command: 2 when the reference itself is
/// malformed or ambiguous, 1 for everything else.
pub fn exit_code(error: &DockyardError) -> i32 {
    if error.is_parse_error() { 2 } else { 1 }
}

/// Renders an error for the terminal, listing every reading of an
/// ambiguous reference.
pub fn describe_error(error: &DockyardError) -> String {
    match error {
        DockyardError::AmbiguousReference { input, candidates } => {
            let listed: Vec<String> = candidates.iter().map(|c| format!("  - {}", c)).collect();
            format!(
                "'{}' is ambiguous, it could mean:\n{}\nSpell out the registry host or namespace.",
                input,
                listed.join("\n")
            )
        }
        other => other.to_string(),
    }
}
