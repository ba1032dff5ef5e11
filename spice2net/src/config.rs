//! Injectable static configuration.
//!
//! Footprint lookups, library URIs, fixed pin layouts, and the net
//! priority table are pure data. They are bundled into an immutable
//! [`BoardProfile`] handed to the classifier, the graph builder, and
//! the serializer, so a different board family only needs a different
//! profile value.

use crate::netlist::PinType;

/// Library/part metadata shared by every component of one kind.
#[derive(Debug, PartialEq, Clone)]
pub struct PartInfo {
    pub lib: String,
    pub part: String,
    pub description: String,
    pub footprint: String,
    /// Footprint name filters for the libpart descriptor.
    pub footprint_filters: Vec<String>,
    /// Reference designator prefix shown in the libpart fields.
    pub reference_prefix: String,
}

impl PartInfo {
    fn new(
        lib: &str,
        part: &str,
        description: &str,
        footprint: &str,
        filters: &[&str],
        prefix: &str,
    ) -> Self {
        Self {
            lib: lib.to_string(),
            part: part.to_string(),
            description: description.to_string(),
            footprint: footprint.to_string(),
            footprint_filters: filters.iter().map(|f| f.to_string()).collect(),
            reference_prefix: prefix.to_string(),
        }
    }
}

/// One named pin slot in a component's layout.
#[derive(Debug, PartialEq, Clone)]
pub struct PinDef {
    pub name: String,
    pub number: u32,
    pub typ: PinType,
}

fn pin(name: &str, number: u32, typ: PinType) -> PinDef {
    PinDef {
        name: name.to_string(),
        number,
        typ,
    }
}

/// Two anonymous passive pins, the fixed layout of every two-terminal
/// discrete device.
pub fn discrete_pins() -> Vec<PinDef> {
    vec![pin("~", 1, PinType::Passive), pin("~", 2, PinType::Passive)]
}

/// A known multi-pin subcircuit instance, keyed by its record marker
/// (e.g. `XU2` registers component `U2`).
#[derive(Debug, PartialEq, Clone)]
pub struct SubcircuitDef {
    pub marker: String,
    pub reference: String,
    pub value: String,
    pub part: PartInfo,
    pub pins: Vec<PinDef>,
}

/// What to do with a pin-name assignment that is absent from the
/// component's layout.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum UnknownPinPolicy {
    /// Drop the connection and emit a diagnostic.
    #[default]
    Drop,
    /// Append the pin to the layout at the next sequential position.
    Extend,
}

/// The full configuration surface for one conversion run.
#[derive(Debug, PartialEq, Clone)]
pub struct BoardProfile {
    pub capacitor: PartInfo,
    pub resistor: PartInfo,
    /// Component-kind table for the JSON board variant (`type` values).
    pub kinds: Vec<(String, PartInfo)>,
    /// Fallback descriptor for unlisted kinds.
    pub generic: PartInfo,
    pub subcircuits: Vec<SubcircuitDef>,
    /// Logical library name to URI, in emission order.
    pub libraries: Vec<(String, String)>,
    /// Net names ranked (by position) ahead of everything else.
    pub net_priority: Vec<String>,
    pub unknown_pins: UnknownPinPolicy,
}

impl BoardProfile {
    pub fn subcircuit(&self, marker: &str) -> Option<&SubcircuitDef> {
        self.subcircuits.iter().find(|s| s.marker == marker)
    }

    pub fn subcircuit_by_reference(&self, reference: &str) -> Option<&SubcircuitDef> {
        self.subcircuits.iter().find(|s| s.reference == reference)
    }

    pub fn part_for_kind(&self, kind: &str) -> &PartInfo {
        self.kinds
            .iter()
            .find(|(name, _)| name == kind)
            .map(|(_, part)| part)
            .unwrap_or(&self.generic)
    }

    /// Rank of a net in the final ordering; nets outside the priority
    /// table share a common fallback rank below every declared one.
    pub fn priority_rank(&self, net: &str) -> usize {
        self.net_priority
            .iter()
            .position(|n| n == net)
            .unwrap_or(usize::MAX)
    }

    /// The LCD/LPC2148 interface board the converter was written for.
    pub fn lcd_lpc2148() -> Self {
        let capacitor = PartInfo::new(
            "Device",
            "C",
            "Unpolarized capacitor",
            "Capacitor_THT:C_Disc_D5.0mm_W2.5mm_P2.50mm",
            &["C_*"],
            "C",
        );
        let resistor = PartInfo::new(
            "Device",
            "R",
            "Resistor",
            "Resistor_THT:R_Axial_DIN0204_L3.6mm_D1.6mm_P2.54mm_Vertical",
            &["R_*"],
            "R",
        );
        let led = PartInfo::new(
            "Device",
            "LED",
            "Light emitting diode",
            "LED_THT:LED_D3.0mm",
            &["LED*"],
            "D",
        );
        let mcu = PartInfo::new(
            "Device",
            "U",
            "Integrated Circuit",
            "Package_DIP:DIP-28_W7.62mm",
            &["DIP*W7.62mm*"],
            "U",
        );
        let lcd = PartInfo::new(
            "Display",
            "LCD-016N002L",
            "Character LCD module",
            "Display_Character:LCD-016N002L",
            &["LCD*"],
            "U",
        );

        let lcd_subckt = SubcircuitDef {
            marker: "XU2".to_string(),
            reference: "U2".to_string(),
            value: "LCD_HD44780".to_string(),
            part: PartInfo::new(
                "LCD_HD44780",
                "LCD_HD44780",
                "Alphanumeric LCD w/HD44780 controller",
                "Display:LCD-Character_16x2",
                &["LCD*"],
                "U",
            ),
            pins: vec![
                pin("VSS", 1, PinType::PowerIn),
                pin("VDD", 2, PinType::PowerIn),
                pin("VO", 3, PinType::Input),
                pin("RS", 4, PinType::Input),
                pin("RW", 5, PinType::Input),
                pin("E", 6, PinType::Input),
                pin("DB0", 7, PinType::Bidirectional),
                pin("DB1", 8, PinType::Bidirectional),
                pin("DB2", 9, PinType::Bidirectional),
                pin("DB3", 10, PinType::Bidirectional),
                pin("DB4", 11, PinType::Bidirectional),
                pin("DB5", 12, PinType::Bidirectional),
                pin("DB6", 13, PinType::Bidirectional),
                pin("DB7", 14, PinType::Bidirectional),
                pin("A", 15, PinType::PowerIn),
                pin("K", 16, PinType::PowerIn),
            ],
        };

        let mcu_subckt = SubcircuitDef {
            marker: "XU1".to_string(),
            reference: "U1".to_string(),
            value: "LPC2148".to_string(),
            part: PartInfo::new(
                "MCU_NXP_ARM",
                "LPC2148",
                "NXP LPC2148 ARM7 microcontroller",
                "Package_QFP:LQFP-64_10x10mm_P0.5mm",
                &["*LQFP*"],
                "U",
            ),
            // Only the pins the board uses, plus the supply placeholders.
            pins: vec![
                pin("P0.21", 1, PinType::Bidirectional),
                pin("P0.22", 2, PinType::Bidirectional),
                pin("P0.14", 41, PinType::Bidirectional),
                pin("P0.15", 45, PinType::Bidirectional),
                pin("P0.16", 46, PinType::Bidirectional),
                pin("P0.17", 47, PinType::Bidirectional),
                pin("P0.18", 53, PinType::Bidirectional),
                pin("P0.19", 54, PinType::Bidirectional),
                pin("P0.20", 55, PinType::Bidirectional),
                pin("P0.23", 58, PinType::Bidirectional),
                pin("VDD", 100, PinType::PowerIn),
                pin("VSS", 101, PinType::PowerIn),
            ],
        };

        Self {
            generic: resistor.clone(),
            kinds: vec![
                ("capacitor".to_string(), capacitor.clone()),
                ("resistor".to_string(), resistor.clone()),
                ("led".to_string(), led),
                ("mcu".to_string(), mcu),
                ("lcd".to_string(), lcd),
            ],
            capacitor,
            resistor,
            subcircuits: vec![lcd_subckt, mcu_subckt],
            libraries: vec![
                (
                    "Device".to_string(),
                    r"C:\Program Files\KiCad\share\kicad\library/Device.lib".to_string(),
                ),
                (
                    "LCD_HD44780".to_string(),
                    r"C:\Libraries\LCD_HD44780.lib".to_string(),
                ),
                (
                    "MCU_NXP_ARM".to_string(),
                    r"C:\Program Files\KiCad\share\kicad\library/MCU_NXP_ARM.lib".to_string(),
                ),
                (
                    "Display".to_string(),
                    r"C:\Libraries\Display.lib".to_string(),
                ),
            ],
            net_priority: vec![
                "GND".to_string(),
                "VCC".to_string(),
                "VDD".to_string(),
                "VO".to_string(),
            ],
            unknown_pins: UnknownPinPolicy::default(),
        }
    }
}

impl Default for BoardProfile {
    fn default() -> Self {
        Self::lcd_lpc2148()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcircuit_lookup_by_marker_and_reference() {
        let profile = BoardProfile::default();

        let by_marker = profile.subcircuit("XU2").unwrap();
        assert_eq!(by_marker.reference, "U2");
        assert_eq!(profile.subcircuit("XU9"), None);

        let by_reference = profile.subcircuit_by_reference("U1").unwrap();
        assert_eq!(by_reference.marker, "XU1");
    }

    #[test]
    fn priority_ranks_are_total() {
        let profile = BoardProfile::default();

        assert_eq!(profile.priority_rank("GND"), 0);
        assert_eq!(profile.priority_rank("VCC"), 1);
        assert_eq!(profile.priority_rank("VDD"), 2);
        assert_eq!(profile.priority_rank("VO"), 3);
        assert_eq!(profile.priority_rank("CTRL_RS"), usize::MAX);
    }

    #[test]
    fn unknown_kind_falls_back_to_generic() {
        let profile = BoardProfile::default();

        assert_eq!(profile.part_for_kind("mcu").part, "U");
        assert_eq!(profile.part_for_kind("widget"), &profile.generic);
    }

    #[test]
    fn pin_positions_are_unique_within_each_layout() {
        let profile = BoardProfile::default();

        for subcircuit in &profile.subcircuits {
            let mut numbers: Vec<u32> = subcircuit.pins.iter().map(|p| p.number).collect();
            numbers.sort_unstable();
            numbers.dedup();
            assert_eq!(numbers.len(), subcircuit.pins.len(), "{}", subcircuit.marker);
        }
    }
}
