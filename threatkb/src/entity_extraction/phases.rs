//! Kill-chain phase names and the tactic ids they map to.

/// Phase-name → tactic-id table for the canonical kill chain. Phases not
/// listed here are dropped silently during derivation.
pub(crate) const PHASE_TACTICS: &[(&str, &str)] = &[
    ("initial-access", "TA0001"),
    ("execution", "TA0002"),
    ("persistence", "TA0003"),
    ("privilege-escalation", "TA0004"),
    ("defense-evasion", "TA0005"),
    ("credential-access", "TA0006"),
    ("discovery", "TA0007"),
    ("lateral-movement", "TA0008"),
    ("collection", "TA0009"),
    ("exfiltration", "TA0010"),
    ("command-and-control", "TA0011"),
    ("impact", "TA0040"),
];
