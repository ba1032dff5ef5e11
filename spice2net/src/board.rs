//! The JSON board-description input variant.
//!
//! A board file declares the component inventory up front: reference,
//! kind, value, and the ordered pin-name layout. Connectivity still
//! comes from a companion netlist text whose records are resolved
//! against the declared inventory instead of the built-in subcircuit
//! table.

use serde::Deserialize;

use crate::config::{discrete_pins, BoardProfile, PinDef};
use crate::graph::NetGraph;
use crate::netlist::PinType;
use crate::record::{self, Record, RecordError};
use crate::ConvertError;

/// The top-level board-description document.
#[derive(Debug, PartialEq, Deserialize)]
pub struct BoardFile {
    pub components: Vec<BoardComponent>,
}

/// One declared component.
#[derive(Debug, PartialEq, Deserialize)]
pub struct BoardComponent {
    #[serde(rename = "ref")]
    pub reference: String,
    /// Component kind, looked up in the profile's kind table.
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    /// Ordered pin names; position in this list is the pin number,
    /// starting at 1. Empty for two-terminal discretes.
    #[serde(default)]
    pub pins: Vec<String>,
}

impl BoardFile {
    pub fn from_json(text: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Registers every declared component, in document order, so that
    /// tstamps follow the inventory rather than first connection.
    pub fn register(&self, graph: &mut NetGraph, profile: &BoardProfile) {
        for component in &self.components {
            let part = profile.part_for_kind(&component.kind).clone();
            let pins = if component.pins.is_empty() {
                discrete_pins()
            } else {
                component
                    .pins
                    .iter()
                    .enumerate()
                    .map(|(index, name)| PinDef {
                        name: name.clone(),
                        number: (index + 1) as u32,
                        typ: PinType::Passive,
                    })
                    .collect()
            };
            graph.ensure_component(&component.reference, &component.value, part, pins);
        }
    }

    /// Maps a record head to a declared reference: first an exact
    /// match, then with a leading instance marker `X` stripped.
    fn resolve_reference(&self, head: &str) -> Option<&str> {
        let declared = |name: &str| {
            self.components
                .iter()
                .find(|c| c.reference == name)
                .map(|c| c.reference.as_str())
        };
        declared(head).or_else(|| head.strip_prefix('X').and_then(declared))
    }

    /// Classifies a companion-netlist record against the declared
    /// inventory, falling back to the stock classifier for records
    /// that name no declared component.
    pub fn classify(
        &self,
        record: &str,
        profile: &BoardProfile,
    ) -> Result<Record, RecordError> {
        let tokens: Vec<&str> = record.split_whitespace().collect();
        if let Some(&head) = tokens.first() {
            // A positional discrete record carries no `=` at all; only
            // parse assignments when the record actually has some, so
            // well-formed discrete records convert without diagnostics.
            if tokens[1..].iter().any(|t| t.contains('=')) {
                if let Some(reference) = self.resolve_reference(head) {
                    let assignments = record::parse_assignments(&tokens[1..]);
                    if !assignments.is_empty() {
                        return Ok(Record::Subcircuit {
                            reference: reference.to_string(),
                            assignments,
                        });
                    }
                }
            }
        }
        record::classify(record, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"{
        "components": [
            {"ref": "C1", "type": "capacitor", "value": "100n"},
            {"ref": "D1", "type": "led", "value": "red", "pins": ["A", "K"]},
            {"ref": "U3", "type": "mcu", "value": "LPC2148",
             "pins": ["P0.0", "P0.1", "VDD", "VSS"]}
        ]
    }"#;

    #[test]
    fn parses_a_board_document() {
        let board = BoardFile::from_json(BOARD).unwrap();

        assert_eq!(board.components.len(), 3);
        assert_eq!(board.components[0].reference, "C1");
        assert!(board.components[0].pins.is_empty());
        assert_eq!(board.components[2].pins.len(), 4);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(BoardFile::from_json("{\"components\": [{}]}").is_err());
    }

    #[test]
    fn declared_pins_take_layout_positions_in_order() {
        let profile = BoardProfile::default();
        let board = BoardFile::from_json(BOARD).unwrap();
        let mut graph = NetGraph::new(&profile);
        board.register(&mut graph, &profile);
        graph.add_subcircuit("U3", &[("VDD".to_string(), "VCC".to_string())]);

        let netlist = graph.into_netlist(&crate::netlist::DesignMeta::default());

        assert_eq!(netlist.components.len(), 3);
        assert_eq!(netlist.nets[0].nodes[0].pin, "3");
    }

    #[test]
    fn record_heads_resolve_with_and_without_instance_marker() {
        let profile = BoardProfile::default();
        let board = BoardFile::from_json(BOARD).unwrap();

        let Ok(Record::Subcircuit { reference, .. }) =
            board.classify("XU3 P0.0=NET_A", &profile)
        else {
            panic!("expected a subcircuit record");
        };
        assert_eq!(reference, "U3");

        let Ok(Record::Subcircuit { reference, .. }) = board.classify("D1 A=LED1", &profile)
        else {
            panic!("expected a subcircuit record");
        };
        assert_eq!(reference, "D1");
    }

    #[test]
    fn discrete_record_for_a_declared_component_converts_silently() {
        use std::sync::Mutex;

        static WARNINGS: Mutex<Vec<String>> = Mutex::new(Vec::new());

        struct WarningCapture;

        impl log::Log for WarningCapture {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                metadata.level() <= log::Level::Warn
            }

            fn log(&self, record: &log::Record) {
                if record.level() == log::Level::Warn {
                    WARNINGS.lock().unwrap().push(record.args().to_string());
                }
            }

            fn flush(&self) {}
        }

        let _ = log::set_logger(&WarningCapture);
        log::set_max_level(log::LevelFilter::Warn);

        let profile = BoardProfile::default();
        let board = BoardFile::from_json(BOARD).unwrap();

        let Ok(Record::Discrete { reference, .. }) =
            board.classify("C1 VCC GND 100n", &profile)
        else {
            panic!("expected a discrete record");
        };
        assert_eq!(reference, "C1");

        // Other tests may log concurrently; only this record's tokens
        // must be absent from the diagnostics.
        let warnings = WARNINGS.lock().unwrap();
        assert!(
            warnings.iter().all(|w| !w.contains("100n")),
            "unexpected diagnostics: {warnings:?}"
        );
    }

    #[test]
    fn undeclared_heads_fall_back_to_the_stock_classifier() {
        let profile = BoardProfile::default();
        let board = BoardFile::from_json(BOARD).unwrap();

        let Ok(Record::Discrete { reference, .. }) = board.classify("R9 A B 1k", &profile)
        else {
            panic!("expected a discrete record");
        };
        assert_eq!(reference, "R9");
        assert_eq!(board.classify(".END", &profile), Ok(Record::End));
    }
}
