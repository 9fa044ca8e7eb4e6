//! Checkpoint catalog and value normalization
//!
//! Every milestone row carries the same fixed set of boolean checkpoints,
//! grouped into ordered milestone phases. Values arrive from the backend in
//! whatever shape was last written (booleans, 0/1, "yes", ...) and are
//! normalized to strict booleans on load and on edit.

use serde_json::Value;

/// A single checkpoint column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Field key on the row (e.g., "m1_slab1")
    pub field: &'static str,
    /// Column header shown to users
    pub header: &'static str,
}

/// An ordered milestone phase and its checkpoints
#[derive(Debug, Clone, Copy)]
pub struct MilestoneGroup {
    pub name: &'static str,
    pub checkpoints: &'static [Checkpoint],
}

const fn cp(field: &'static str, header: &'static str) -> Checkpoint {
    Checkpoint { field, header }
}

/// The milestone catalog in display order
pub const MILESTONE_GROUPS: &[MilestoneGroup] = &[
    MilestoneGroup {
        name: "Entry point",
        checkpoints: &[
            cp("m_entry_electrical_labour", "Electrical Labour contract"),
            cp("m_entry_electrical_design", "Electrical Design Contract"),
            cp("m_entry_essential", "Essential contract"),
            cp("m_entry_automation", "Building Automation Contract"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 1 - Slab Conduits",
        checkpoints: &[
            cp("m1_slab1", "Conduits, accessories, JBs, and Drop Boxes - SLAB 1"),
            cp("m1_slab2", "Conduits, accessories, JBs, and Drop Boxes - SLAB 2"),
            cp("m1_slab3", "Conduits, accessories, JBs, and Drop Boxes - SLAB 3"),
            cp("m1_slab4", "Conduits, accessories, JBs, and Drop Boxes - SLAB 4"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 2 - Wall chipping",
        checkpoints: &[
            cp("m2_conduits", "Conduits & accessories"),
            cp("m2_db_wall_boxes", "DB & Wall boxes"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 3 - Wiring",
        checkpoints: &[
            cp("m3_wires", "Electrical wires"),
            cp("m3_comm_cables", "Communication cables"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 4 - DB Dressing, Backend & Passive",
        checkpoints: &[
            cp("m4_mcbs", "MCBs & Protection"),
            cp("m4_automation_backend", "Automation Backend"),
            cp("m4_networking_passive", "Networking passive"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 5 - Infrastructure",
        checkpoints: &[
            cp("m5_power_panels", "Power panels"),
            cp("m5_earthing", "Earthing"),
            cp("m5_gate_motor", "Gate Motor"),
            cp("m5_stabilizer", "Stabilizer"),
            cp("m5_ups", "UPS"),
            cp("m5_solar", "Solar Panels"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 6 - Switches & Front End",
        checkpoints: &[
            cp("m6_switches_int", "Switches (Int.)"),
            cp("m6_switches_ind", "Switches (Ind.)"),
            cp("m6_frontend", "Frontend Components"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 7 - Essentials",
        checkpoints: &[
            cp("m7_cctv", "CCTV"),
            cp("m7_vdp", "VDP"),
            cp("m7_networking_active", "Networking Active"),
            cp("m7_wifi", "Wi-Fi"),
            cp("m7_digital_locks", "Digital Locks"),
            cp("m7_security_basic", "Security Basic"),
            cp("m7_security_advanced", "Security Advanced"),
            cp("m7_intercomm", "EPBAX/Intercom"),
            cp("m7_motion_sensors", "Motion sensors"),
            cp("m7_water_mgmt", "Water management"),
        ],
    },
    MilestoneGroup {
        name: "Milestone 8 and 9 - Light Fixtures",
        checkpoints: &[
            cp("m8_light_fixtures", "Light Fixtures"),
            cp("m8_curtain_motor", "Curtain Motor/Blinds for Windows"),
            cp("m8_zonal_audio", "Zonal Audio"),
            cp("m8_home_theater", "Home theater"),
        ],
    },
    // Milestone 9 was folded into 8 upstream; field keys keep the m9_ prefix.
    MilestoneGroup {
        name: "Milestone 10 - Visualization & Handover",
        checkpoints: &[
            cp("m9_mobile_control", "Visualization / Mobile Control"),
            cp("m9_hvac", "HVAC Control"),
            cp("m9_socket_timer", "Any Socket on Schedule or Timer control"),
            cp("m9_heat_pump", "Heat Pump On-Off control based on time"),
            cp("m9_voice_control", "Voice control with Alexa or Siri"),
            cp(
                "m10_handover",
                "Commissioning, programming, handover and 1 year service",
            ),
        ],
    },
];

/// Iterate every checkpoint across all groups, in display order
pub fn all_checkpoints() -> impl Iterator<Item = &'static Checkpoint> {
    MILESTONE_GROUPS.iter().flat_map(|g| g.checkpoints.iter())
}

/// All checkpoint field keys, in display order
pub fn checkpoint_fields() -> Vec<&'static str> {
    all_checkpoints().map(|c| c.field).collect()
}

/// Total number of checkpoints across every group
pub fn checkpoint_count() -> usize {
    MILESTONE_GROUPS.iter().map(|g| g.checkpoints.len()).sum()
}

/// Whether a field key names a checkpoint
pub fn is_checkpoint(field: &str) -> bool {
    all_checkpoints().any(|c| c.field == field)
}

/// Look up a checkpoint by field key
pub fn find_checkpoint(field: &str) -> Option<&'static Checkpoint> {
    all_checkpoints().find(|c| c.field == field)
}

/// Normalize a raw cell value to a checkpoint state.
///
/// Checked iff the value is `true`, the number 1, or one of the strings
/// "true", "1", "yes", "on" (trimmed, case-insensitive). Anything else,
/// including null, reads as unchecked.
pub fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

/// Normalize an optional raw value; absence reads as unchecked
pub fn is_checked_opt(value: Option<&Value>) -> bool {
    value.map(is_checked).unwrap_or(false)
}
