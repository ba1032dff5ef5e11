//! The netlist output model (`.net` files).
//!
//! This module mirrors the structure of a KiCad netlist export: a
//! `design` header, the `components`, `libparts`, and `libraries`
//! sections, and the `nets` section, in that fixed order. Everything
//! here is a plain data struct; [`ToSexpr`] turns the whole tree into
//! the parenthesized output syntax, which is balanced by construction.

use netlist_sexpr::Sexpr;

use crate::convert::{ToSexpr, VecToMaybeSexprVec};
use crate::simple_to_from_string;

/// Electrical classification of a library-part pin.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PinType {
    PowerIn,
    Input,
    Output,
    Bidirectional,
    Passive,
}

simple_to_from_string! {
    PinType,
    power_in <-> PowerIn,
    input <-> Input,
    output <-> Output,
    bidirectional <-> Bidirectional,
    passive <-> Passive,
}

/// Cosmetic header values carried into the `design` section.
///
/// The date fields are plain strings supplied by the caller so that a
/// conversion run is reproducible under test; the CLI fills them from
/// the wall clock.
#[derive(Debug, PartialEq, Clone)]
pub struct DesignMeta {
    /// Title block name.
    pub title: String,
    /// Source schematic name shown in the netlist.
    pub source: String,
    /// Generation timestamp (`YYYY-MM-DD HH:MM:SS`).
    pub date: String,
    /// Title block date (`YYYY-MM-DD`).
    pub day: String,
    /// Tool identifier string.
    pub tool: String,
    /// Title block comment slots (always emitted, may be empty).
    pub comments: Vec<String>,
}

impl Default for DesignMeta {
    fn default() -> Self {
        Self {
            title: "8-bit LCD / LPC2148 Interface".to_string(),
            source: "LCD_LPC2148.sch".to_string(),
            date: String::new(),
            day: String::new(),
            tool: concat!("spice2net (", env!("CARGO_PKG_VERSION"), ")").to_string(),
            comments: vec![
                "Converted from SPICE-like netlist".to_string(),
                "RW tied low; LCD backlight via RLED".to_string(),
                "VCC=5V, VDD=3.3V".to_string(),
                String::new(),
            ],
        }
    }
}

/// The entire contents of a netlist file.
#[derive(Debug, PartialEq, Clone)]
pub struct NetlistFile {
    pub design: Design,
    pub components: Vec<Component>,
    pub libparts: Vec<LibPart>,
    pub libraries: Vec<Library>,
    pub nets: Vec<Net>,
}

impl ToSexpr for NetlistFile {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "export",
            [
                Some(Sexpr::symbol_with_name("version", "D")),
                Some(self.design.to_sexpr()),
                Some(Sexpr::list_with_name(
                    "components",
                    self.components.as_slice().into_sexpr_vec(),
                )),
                Some(Sexpr::list_with_name(
                    "libparts",
                    self.libparts.as_slice().into_sexpr_vec(),
                )),
                Some(Sexpr::list_with_name(
                    "libraries",
                    self.libraries.as_slice().into_sexpr_vec(),
                )),
                Some(Sexpr::list_with_name(
                    "nets",
                    self.nets.as_slice().into_sexpr_vec(),
                )),
            ],
        )
    }
}

/// The `design` header section.
#[derive(Debug, PartialEq, Clone)]
pub struct Design {
    pub source: String,
    pub date: String,
    pub tool: String,
    pub sheet: Sheet,
}

impl ToSexpr for Design {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "design",
            [
                Some(Sexpr::string_with_name("source", &self.source)),
                Some(Sexpr::string_with_name("date", &self.date)),
                Some(Sexpr::string_with_name("tool", &self.tool)),
                Some(self.sheet.to_sexpr()),
            ],
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Sheet {
    pub number: u32,
    pub name: String,
    pub tstamps: String,
    pub title_block: TitleBlock,
}

impl ToSexpr for Sheet {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "sheet",
            [
                Some(Sexpr::number_with_name("number", self.number as f32)),
                Some(Sexpr::atom_with_name("name", &self.name)),
                Some(Sexpr::atom_with_name("tstamps", &self.tstamps)),
                Some(self.title_block.to_sexpr()),
            ],
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct TitleBlock {
    pub title: String,
    /// Fixed revision literal.
    pub rev: String,
    pub date: String,
    pub source: String,
    pub comments: Vec<Comment>,
}

impl ToSexpr for TitleBlock {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "title_block",
            [
                Some(Sexpr::string_with_name("title", &self.title)),
                // The company slot is always present and always empty.
                Some(Sexpr::list_with_name("company", [])),
                Some(Sexpr::atom_with_name("rev", &self.rev)),
                Some(Sexpr::atom_with_name("date", &self.date)),
                Some(Sexpr::atom_with_name("source", &self.source)),
            ]
            .into_iter()
            .chain(self.comments.iter().map(|c| Some(c.to_sexpr())))
            .collect::<Vec<_>>(),
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Comment {
    pub number: u32,
    pub value: String,
}

impl ToSexpr for Comment {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "comment",
            [
                Some(Sexpr::number_with_name("number", self.number as f32)),
                Some(Sexpr::string_with_name("value", &self.value)),
            ],
        )
    }
}

/// One entry of the `components` section.
#[derive(Debug, PartialEq, Clone)]
pub struct Component {
    pub reference: String,
    pub value: String,
    pub footprint: String,
    /// Datasheet placeholder; `~` when there is none.
    pub datasheet: String,
    pub libsource: LibSource,
    pub sheetpath: SheetPath,
    /// Deterministic creation-order token, unique within the run.
    pub tstamp: String,
}

impl ToSexpr for Component {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "comp",
            [
                Some(Sexpr::atom_with_name("ref", &self.reference)),
                Some(Sexpr::atom_with_name("value", &self.value)),
                Some(Sexpr::atom_with_name("footprint", &self.footprint)),
                Some(Sexpr::atom_with_name("datasheet", &self.datasheet)),
                Some(self.libsource.to_sexpr()),
                Some(self.sheetpath.to_sexpr()),
                Some(Sexpr::symbol_with_name("tstamp", &self.tstamp)),
            ],
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct LibSource {
    pub lib: String,
    pub part: String,
    pub description: String,
}

impl ToSexpr for LibSource {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "libsource",
            [
                Some(Sexpr::atom_with_name("lib", &self.lib)),
                Some(Sexpr::atom_with_name("part", &self.part)),
                Some(Sexpr::string_with_name("description", &self.description)),
            ],
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SheetPath {
    pub names: String,
    pub tstamps: String,
}

impl Default for SheetPath {
    fn default() -> Self {
        Self {
            names: "/".to_string(),
            tstamps: "/".to_string(),
        }
    }
}

impl ToSexpr for SheetPath {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "sheetpath",
            [
                Some(Sexpr::atom_with_name("names", &self.names)),
                Some(Sexpr::atom_with_name("tstamps", &self.tstamps)),
            ],
        )
    }
}

/// One static library-part descriptor, emitted once per component kind
/// actually used.
#[derive(Debug, PartialEq, Clone)]
pub struct LibPart {
    pub lib: String,
    pub part: String,
    pub description: String,
    /// Docs placeholder; `~` when there is none.
    pub docs: String,
    /// Footprint name filters (`fp` entries).
    pub footprints: Vec<String>,
    pub fields: Vec<Field>,
    pub pins: Vec<Pin>,
}

impl ToSexpr for LibPart {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "libpart",
            [
                Some(Sexpr::atom_with_name("lib", &self.lib)),
                Some(Sexpr::atom_with_name("part", &self.part)),
                Some(Sexpr::string_with_name("description", &self.description)),
                Some(Sexpr::atom_with_name("docs", &self.docs)),
                Some(Sexpr::list_with_name(
                    "footprints",
                    self.footprints
                        .iter()
                        .map(|f| Some(Sexpr::list_with_name("fp", [Some(Sexpr::atom(f))])))
                        .collect::<Vec<_>>(),
                )),
                Some(Sexpr::list_with_name(
                    "fields",
                    self.fields.as_slice().into_sexpr_vec(),
                )),
                Some(Sexpr::list_with_name(
                    "pins",
                    self.pins.as_slice().into_sexpr_vec(),
                )),
            ],
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl ToSexpr for Field {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "field",
            [
                Some(Sexpr::atom_with_name("name", &self.name)),
                Some(Sexpr::atom(&self.value)),
            ],
        )
    }
}

/// A library-part pin: stable numeric position, symbolic name, type.
#[derive(Debug, PartialEq, Clone)]
pub struct Pin {
    pub num: String,
    pub name: String,
    pub typ: PinType,
}

impl ToSexpr for Pin {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "pin",
            [
                Some(Sexpr::atom_with_name("num", &self.num)),
                Some(Sexpr::atom_with_name("name", &self.name)),
                Some(Sexpr::symbol_with_name("type", self.typ.to_string())),
            ],
        )
    }
}

/// One entry of the `libraries` URI table.
#[derive(Debug, PartialEq, Clone)]
pub struct Library {
    pub logical: String,
    pub uri: String,
}

impl ToSexpr for Library {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "library",
            [
                Some(Sexpr::atom_with_name("logical", &self.logical)),
                Some(Sexpr::string_with_name("uri", &self.uri)),
            ],
        )
    }
}

/// A net: dense 1-based code, name, and its endpoint nodes in
/// first-added order.
#[derive(Debug, PartialEq, Clone)]
pub struct Net {
    pub code: u32,
    pub name: String,
    pub nodes: Vec<Node>,
}

impl ToSexpr for Net {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "net",
            [
                Some(Sexpr::number_with_name("code", self.code as f32)),
                Some(Sexpr::atom_with_name("name", &self.name)),
            ]
            .into_iter()
            .chain(self.nodes.iter().map(|n| Some(n.to_sexpr())))
            .collect::<Vec<_>>(),
        )
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Node {
    pub reference: String,
    pub pin: String,
}

impl ToSexpr for Node {
    fn to_sexpr(&self) -> Sexpr {
        Sexpr::list_with_name(
            "node",
            [
                Some(Sexpr::atom_with_name("ref", &self.reference)),
                Some(Sexpr::atom_with_name("pin", &self.pin)),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_type_round_trips_through_strings() {
        for (text, typ) in [
            ("power_in", PinType::PowerIn),
            ("input", PinType::Input),
            ("output", PinType::Output),
            ("bidirectional", PinType::Bidirectional),
            ("passive", PinType::Passive),
        ] {
            assert_eq!(text.parse::<PinType>().unwrap(), typ);
            assert_eq!(typ.to_string(), text);
        }
    }

    #[test]
    fn default_meta_carries_the_board_comment_slots() {
        let meta = DesignMeta::default();

        assert_eq!(
            meta.comments,
            [
                "Converted from SPICE-like netlist",
                "RW tied low; LCD backlight via RLED",
                "VCC=5V, VDD=3.3V",
                "",
            ]
        );
    }

    #[test]
    fn net_name_with_whitespace_is_quoted() {
        let net = Net {
            code: 1,
            name: "a net name".to_string(),
            nodes: vec![],
        };

        let rendered = netlist_sexpr::to_string(&net.to_sexpr());
        assert!(rendered.contains(r#""a net name""#));
    }

    #[test]
    fn net_name_without_punctuation_is_bare() {
        let net = Net {
            code: 1,
            name: "CTRL_RS".to_string(),
            nodes: vec![],
        };

        let rendered = netlist_sexpr::to_string(&net.to_sexpr());
        assert!(rendered.contains("(name CTRL_RS)"));
        assert!(!rendered.contains('"'));
    }

    #[test]
    fn component_renders_all_keys() {
        let component = Component {
            reference: "C1".to_string(),
            value: "100n".to_string(),
            footprint: "Capacitor_THT:C_Disc_D5.0mm_W2.5mm_P2.50mm".to_string(),
            datasheet: "~".to_string(),
            libsource: LibSource {
                lib: "Device".to_string(),
                part: "C".to_string(),
                description: "Unpolarized capacitor".to_string(),
            },
            sheetpath: SheetPath::default(),
            tstamp: "5F000001".to_string(),
        };

        let rendered = netlist_sexpr::to_string(&component.to_sexpr());
        for key in [
            "(ref C1)",
            "(value 100n)",
            "(datasheet ~)",
            "(tstamp 5F000001)",
        ] {
            assert!(rendered.contains(key), "missing {key} in {rendered}");
        }
    }
}
