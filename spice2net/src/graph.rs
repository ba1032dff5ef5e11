//! The connectivity graph: component registry, net accumulation,
//! deterministic ordering, and net-code assignment.
//!
//! All containers here preserve insertion order, because downstream
//! identifiers (creation-order tstamps, net codes) are compared for
//! byte-identical regeneration.

use std::collections::HashMap;

use crate::config::{discrete_pins, BoardProfile, PartInfo, PinDef, UnknownPinPolicy};
use crate::netlist::{
    Comment, Component, Design, DesignMeta, Field, LibPart, LibSource, Library, Net, NetlistFile,
    Node, Pin, PinType, Sheet, SheetPath, TitleBlock,
};
use crate::record::{DiscreteKind, Record};

/// The canonical ground net name.
pub const GROUND_NET: &str = "GND";

const GROUND_ALIASES: [&str; 4] = ["0", "GND", "gnd", "VGND"];

/// Collapses the accepted ground spellings into the canonical ground
/// net; every other name passes through untouched (case-sensitive).
pub fn canonical_net(name: &str) -> String {
    let name = name.trim();
    if GROUND_ALIASES.contains(&name) {
        GROUND_NET.to_string()
    } else {
        name.to_string()
    }
}

/// Monotonic creation-order tokens, `%08X` formatted. Never derived
/// from the wall clock or a random source, so reruns over identical
/// input regenerate identical output.
struct TstampGen(u32);

impl TstampGen {
    fn new() -> Self {
        Self(0x5F00_0001)
    }

    fn next(&mut self) -> String {
        let token = format!("{:08X}", self.0);
        self.0 += 1;
        token
    }
}

/// One registered component: identity, static metadata, and its pin
/// layout (which may grow under [`UnknownPinPolicy::Extend`]).
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    pub reference: String,
    pub value: String,
    pub part: PartInfo,
    pub pins: Vec<PinDef>,
    pub tstamp: String,
}

#[derive(Debug, Clone)]
struct NetEntry {
    name: String,
    /// `(reference, pin position)` in first-added order, no duplicates.
    endpoints: Vec<(String, u32)>,
}

/// Accumulates components and nets over one conversion run, then
/// freezes into a [`NetlistFile`].
pub struct NetGraph<'a> {
    profile: &'a BoardProfile,
    components: Vec<ComponentEntry>,
    component_index: HashMap<String, usize>,
    nets: Vec<NetEntry>,
    net_index: HashMap<String, usize>,
    /// Which net each pin currently belongs to; a pin belongs to
    /// exactly one net at a time, last write wins.
    pin_nets: HashMap<(String, u32), usize>,
    tstamps: TstampGen,
}

impl<'a> NetGraph<'a> {
    pub fn new(profile: &'a BoardProfile) -> Self {
        Self {
            profile,
            components: Vec::new(),
            component_index: HashMap::new(),
            nets: Vec::new(),
            net_index: HashMap::new(),
            pin_nets: HashMap::new(),
            tstamps: TstampGen::new(),
        }
    }

    pub fn add_record(&mut self, record: Record) {
        match record {
            Record::Discrete {
                reference,
                kind,
                nets,
                value,
            } => self.add_discrete(&reference, kind, &nets, &value),
            Record::Subcircuit {
                reference,
                assignments,
            } => self.add_subcircuit(&reference, &assignments),
            Record::End | Record::Ignored => {}
        }
    }

    /// Registers a two-terminal device and connects its fixed pin
    /// positions 1 and 2.
    pub fn add_discrete(
        &mut self,
        reference: &str,
        kind: DiscreteKind,
        nets: &[String; 2],
        value: &str,
    ) {
        let part = match kind {
            DiscreteKind::Capacitor => self.profile.capacitor.clone(),
            DiscreteKind::Resistor => self.profile.resistor.clone(),
        };
        self.ensure_component(reference, value, part, discrete_pins());
        self.connect(reference, 1, &nets[0]);
        self.connect(reference, 2, &nets[1]);
    }

    /// Applies `pin_name=net_name` assignments to a subcircuit
    /// instance, registering it on first sight.
    pub fn add_subcircuit(&mut self, reference: &str, assignments: &[(String, String)]) {
        if !self.component_index.contains_key(reference) {
            let Some(subcircuit) = self.profile.subcircuit_by_reference(reference).cloned() else {
                log::warn!("ignoring assignments for unknown subcircuit instance `{reference}`");
                return;
            };
            self.ensure_component(
                &subcircuit.reference,
                &subcircuit.value,
                subcircuit.part,
                subcircuit.pins,
            );
        }

        for (pin_name, net) in assignments {
            match self.resolve_pin(reference, pin_name) {
                Some(number) => self.connect(reference, number, net),
                None => {
                    log::warn!("dropping assignment to unknown pin `{pin_name}` on {reference}")
                }
            }
        }
    }

    /// Registers a component exactly once; re-registration keeps the
    /// original identity, metadata, and creation-order token.
    pub fn ensure_component(
        &mut self,
        reference: &str,
        value: &str,
        part: PartInfo,
        pins: Vec<PinDef>,
    ) {
        if self.component_index.contains_key(reference) {
            return;
        }

        let tstamp = self.tstamps.next();
        self.component_index
            .insert(reference.to_string(), self.components.len());
        self.components.push(ComponentEntry {
            reference: reference.to_string(),
            value: value.to_string(),
            part,
            pins,
            tstamp,
        });
    }

    /// Resolves a symbolic pin name against a component's layout. Under
    /// [`UnknownPinPolicy::Extend`] an unknown name is appended at the
    /// next sequential position; otherwise the caller drops it.
    fn resolve_pin(&mut self, reference: &str, pin_name: &str) -> Option<u32> {
        let policy = self.profile.unknown_pins;
        let index = *self.component_index.get(reference)?;
        let entry = &mut self.components[index];

        if let Some(pin) = entry.pins.iter().find(|p| p.name == pin_name) {
            return Some(pin.number);
        }

        match policy {
            UnknownPinPolicy::Drop => None,
            UnknownPinPolicy::Extend => {
                let number = entry.pins.iter().map(|p| p.number).max().unwrap_or(0) + 1;
                entry.pins.push(PinDef {
                    name: pin_name.to_string(),
                    number,
                    typ: PinType::Passive,
                });
                Some(number)
            }
        }
    }

    /// Attaches one endpoint to a net (created on first insertion).
    /// Duplicate `ref+pin` entries for the same net are dropped;
    /// re-assignment to a different net is last-write-wins and leaves
    /// a diagnostic, since well-formed input never does this.
    pub fn connect(&mut self, reference: &str, pin: u32, net: &str) {
        let name = canonical_net(net);
        let net_index = match self.net_index.get(&name) {
            Some(&index) => index,
            None => {
                let index = self.nets.len();
                self.net_index.insert(name.clone(), index);
                self.nets.push(NetEntry {
                    name,
                    endpoints: Vec::new(),
                });
                index
            }
        };

        let key = (reference.to_string(), pin);
        if let Some(&previous) = self.pin_nets.get(&key) {
            if previous == net_index {
                return;
            }
            log::warn!(
                "pin {pin} of {reference} moved from net `{}` to `{}`",
                self.nets[previous].name,
                self.nets[net_index].name
            );
            self.nets[previous]
                .endpoints
                .retain(|(r, p)| !(r == reference && *p == pin));
        }

        self.pin_nets.insert(key, net_index);
        self.nets[net_index]
            .endpoints
            .push((reference.to_string(), pin));
    }

    /// Freezes the graph: orders nets, assigns dense 1-based codes, and
    /// renders every section of the output model.
    pub fn into_netlist(self, meta: &DesignMeta) -> NetlistFile {
        // Priority nets first, then lexical; endpointless nets are
        // filtered before codes are assigned so codes stay dense.
        let mut ordered: Vec<&NetEntry> =
            self.nets.iter().filter(|n| !n.endpoints.is_empty()).collect();
        ordered.sort_by(|a, b| {
            self.profile
                .priority_rank(&a.name)
                .cmp(&self.profile.priority_rank(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });

        let nets = ordered
            .iter()
            .enumerate()
            .map(|(index, entry)| Net {
                code: (index + 1) as u32,
                name: entry.name.clone(),
                nodes: entry
                    .endpoints
                    .iter()
                    .map(|(reference, pin)| Node {
                        reference: reference.clone(),
                        pin: pin.to_string(),
                    })
                    .collect(),
            })
            .collect();

        let components = self
            .components
            .iter()
            .map(|entry| Component {
                reference: entry.reference.clone(),
                value: entry.value.clone(),
                footprint: entry.part.footprint.clone(),
                datasheet: "~".to_string(),
                libsource: LibSource {
                    lib: entry.part.lib.clone(),
                    part: entry.part.part.clone(),
                    description: entry.part.description.clone(),
                },
                sheetpath: SheetPath::default(),
                tstamp: entry.tstamp.clone(),
            })
            .collect();

        let libparts = self.build_libparts();
        let libraries = self.build_libraries(&libparts);

        let design = Design {
            source: meta.source.clone(),
            date: meta.date.clone(),
            tool: meta.tool.clone(),
            sheet: Sheet {
                number: 1,
                name: "/".to_string(),
                tstamps: "/".to_string(),
                title_block: TitleBlock {
                    title: meta.title.clone(),
                    rev: "v1".to_string(),
                    date: meta.day.clone(),
                    source: meta.source.clone(),
                    comments: meta
                        .comments
                        .iter()
                        .enumerate()
                        .map(|(index, value)| Comment {
                            number: (index + 1) as u32,
                            value: value.clone(),
                        })
                        .collect(),
                },
            },
        };

        NetlistFile {
            design,
            components,
            libparts,
            libraries,
            nets,
        }
    }

    /// One libpart per `(lib, part)` pair actually used, in first-use
    /// order. When the same pair appears with a larger pin layout (a
    /// dynamically extended instance), the larger layout wins.
    fn build_libparts(&self) -> Vec<LibPart> {
        let mut libparts: Vec<LibPart> = Vec::new();

        for entry in &self.components {
            let mut pins = entry.pins.clone();
            pins.sort_by_key(|p| p.number);
            let pins: Vec<Pin> = pins
                .into_iter()
                .map(|p| Pin {
                    num: p.number.to_string(),
                    name: p.name,
                    typ: p.typ,
                })
                .collect();

            if let Some(existing) = libparts
                .iter_mut()
                .find(|lp| lp.lib == entry.part.lib && lp.part == entry.part.part)
            {
                if pins.len() > existing.pins.len() {
                    existing.pins = pins;
                }
                continue;
            }

            libparts.push(LibPart {
                lib: entry.part.lib.clone(),
                part: entry.part.part.clone(),
                description: entry.part.description.clone(),
                docs: "~".to_string(),
                footprints: entry.part.footprint_filters.clone(),
                fields: vec![
                    Field {
                        name: "Reference".to_string(),
                        value: entry.part.reference_prefix.clone(),
                    },
                    Field {
                        name: "Value".to_string(),
                        value: entry.part.part.clone(),
                    },
                ],
                pins,
            });
        }

        libparts
    }

    /// The library-URI table, filtered to the logical libraries the
    /// emitted libparts reference, in profile order.
    fn build_libraries(&self, libparts: &[LibPart]) -> Vec<Library> {
        self.profile
            .libraries
            .iter()
            .filter(|(logical, _)| libparts.iter().any(|lp| &lp.lib == logical))
            .map(|(logical, uri)| Library {
                logical: logical.clone(),
                uri: uri.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnknownPinPolicy;

    fn meta() -> DesignMeta {
        DesignMeta {
            date: "2025-01-01 00:00:00".to_string(),
            day: "2025-01-01".to_string(),
            ..DesignMeta::default()
        }
    }

    fn discrete(reference: &str, kind: DiscreteKind, n1: &str, n2: &str, value: &str) -> Record {
        Record::Discrete {
            reference: reference.to_string(),
            kind,
            nets: [n1.to_string(), n2.to_string()],
            value: value.to_string(),
        }
    }

    #[test]
    fn ground_aliases_collapse_to_one_net() {
        for alias in ["0", "GND", "gnd", "VGND"] {
            assert_eq!(canonical_net(alias), "GND");
        }
        assert_eq!(canonical_net("VCC"), "VCC");
        assert_eq!(canonical_net("vcc"), "vcc");
    }

    #[test]
    fn discrete_records_connect_fixed_positions() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_record(discrete("C1", DiscreteKind::Capacitor, "VCC", "GND", "100n"));
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "VCC", "LED1", "220"));
        graph.add_record(discrete("RLED", DiscreteKind::Resistor, "LED1", "0", "330"));

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.components.len(), 3);
        assert_eq!(netlist.nets.len(), 3);

        let names: Vec<&str> = netlist.nets.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["GND", "VCC", "LED1"]);
        let codes: Vec<u32> = netlist.nets.iter().map(|n| n.code).collect();
        assert_eq!(codes, [1, 2, 3]);

        let gnd = &netlist.nets[0];
        assert_eq!(gnd.nodes.len(), 2);
        assert_eq!(gnd.nodes[0].reference, "C1");
        assert_eq!(gnd.nodes[0].pin, "2");
        assert_eq!(gnd.nodes[1].reference, "RLED");
        assert_eq!(gnd.nodes[1].pin, "2");

        let led1 = &netlist.nets[2];
        assert_eq!(led1.nodes[0].reference, "R1");
        assert_eq!(led1.nodes[0].pin, "2");
        assert_eq!(led1.nodes[1].reference, "RLED");
        assert_eq!(led1.nodes[1].pin, "1");
    }

    #[test]
    fn subcircuit_instance_registers_once() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U2", &[("RS".to_string(), "CTRL_RS".to_string())]);
        graph.add_subcircuit("U2", &[("E".to_string(), "CTRL_E".to_string())]);

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.components.len(), 1);
        assert_eq!(netlist.components[0].reference, "U2");
        assert_eq!(netlist.nets.len(), 2);
    }

    #[test]
    fn subcircuit_pins_resolve_to_layout_positions() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit(
            "U2",
            &[
                ("RS".to_string(), "CTRL_RS".to_string()),
                ("RW".to_string(), "0".to_string()),
                ("E".to_string(), "CTRL_E".to_string()),
            ],
        );

        let netlist = graph.into_netlist(&meta());

        let find = |name: &str| {
            netlist
                .nets
                .iter()
                .find(|n| n.name == name)
                .unwrap_or_else(|| panic!("net {name} missing"))
        };
        assert_eq!(find("CTRL_RS").nodes[0].pin, "4");
        assert_eq!(find("GND").nodes[0].pin, "5");
        assert_eq!(find("CTRL_E").nodes[0].pin, "6");
    }

    #[test]
    fn unknown_pin_is_dropped_by_default() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U2", &[("BOGUS".to_string(), "NET_X".to_string())]);

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.components.len(), 1);
        assert!(netlist.nets.is_empty());
    }

    #[test]
    fn unknown_pin_is_appended_under_extend_policy() {
        let mut profile = BoardProfile::default();
        profile.unknown_pins = UnknownPinPolicy::Extend;
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U2", &[("BOGUS".to_string(), "NET_X".to_string())]);

        let netlist = graph.into_netlist(&meta());

        // The LCD layout tops out at 16, so the dynamic pin lands at 17.
        assert_eq!(netlist.nets[0].nodes[0].pin, "17");
        let libpart = netlist
            .libparts
            .iter()
            .find(|lp| lp.part == "LCD_HD44780")
            .unwrap();
        assert!(libpart.pins.iter().any(|p| p.name == "BOGUS"));
    }

    #[test]
    fn pin_reassignment_is_last_write_wins() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U2", &[("RS".to_string(), "NET_A".to_string())]);
        graph.add_subcircuit("U2", &[("RS".to_string(), "NET_B".to_string())]);

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.nets.len(), 1);
        assert_eq!(netlist.nets[0].name, "NET_B");
        assert_eq!(netlist.nets[0].nodes.len(), 1);
    }

    #[test]
    fn duplicate_endpoints_are_dropped() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "A", "B", "1k"));
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "A", "B", "1k"));

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.components.len(), 1);
        assert_eq!(netlist.nets.iter().map(|n| n.nodes.len()).sum::<usize>(), 2);
    }

    #[test]
    fn net_codes_are_dense_after_reassignment_empties_a_net() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U2", &[("RS".to_string(), "NET_A".to_string())]);
        graph.add_subcircuit("U2", &[("RS".to_string(), "NET_B".to_string())]);
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "NET_B", "NET_C", "1k"));

        let netlist = graph.into_netlist(&meta());

        let codes: Vec<u32> = netlist.nets.iter().map(|n| n.code).collect();
        assert_eq!(codes, (1..=netlist.nets.len() as u32).collect::<Vec<_>>());
        assert!(netlist.nets.iter().all(|n| n.name != "NET_A"));
    }

    #[test]
    fn libparts_and_libraries_cover_only_used_kinds() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "A", "B", "1k"));
        graph.add_record(discrete("R2", DiscreteKind::Resistor, "B", "C", "2k"));

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.libparts.len(), 1);
        assert_eq!(netlist.libparts[0].part, "R");
        assert_eq!(netlist.libraries.len(), 1);
        assert_eq!(netlist.libraries[0].logical, "Device");
    }

    #[test]
    fn mcu_libpart_pins_are_sorted_by_position() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_subcircuit("U1", &[("P0.14".to_string(), "NET_RS".to_string())]);

        let netlist = graph.into_netlist(&meta());

        let libpart = netlist.libparts.iter().find(|lp| lp.part == "LPC2148").unwrap();
        let numbers: Vec<u32> = libpart.pins.iter().map(|p| p.num.parse().unwrap()).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn tstamps_follow_first_registration_order() {
        let profile = BoardProfile::default();
        let mut graph = NetGraph::new(&profile);
        graph.add_record(discrete("C1", DiscreteKind::Capacitor, "VCC", "GND", "100n"));
        graph.add_record(discrete("R1", DiscreteKind::Resistor, "VCC", "OUT", "220"));

        let netlist = graph.into_netlist(&meta());

        assert_eq!(netlist.components[0].tstamp, "5F000001");
        assert_eq!(netlist.components[1].tstamp, "5F000002");
    }
}
