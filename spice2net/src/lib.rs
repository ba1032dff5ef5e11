//! Converts SPICE-like connectivity netlists (and JSON board
//! descriptions) into KiCad netlist files.

use thiserror::Error;

use crate::board::BoardFile;
use crate::config::BoardProfile;
use crate::convert::ToSexpr;
use crate::graph::NetGraph;
use crate::netlist::{DesignMeta, NetlistFile};
use crate::record::{classify, logical_records};

pub mod board;
pub mod config;
pub mod convert;
pub mod graph;
pub mod netlist;
pub mod record;

/// Errors that can occur when converting an input document. Malformed
/// individual records are diagnostics, not errors; only an unusable
/// input document fails the run.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid board description: {0}")]
    InvalidBoardJson(#[from] serde_json::Error),
    #[error("invalid value `{value}` for enum `{enum_name}`")]
    InvalidEnumValue {
        value: String,
        enum_name: &'static str,
    },
}

impl ConvertError {
    pub fn invalid_enum_value<T>(value: impl Into<String>) -> Self {
        Self::InvalidEnumValue {
            value: value.into(),
            enum_name: std::any::type_name::<T>(),
        }
    }
}

macro_rules! simple_to_from_string {
    ($name:ident, $( $string:ident <-> $variant:ident ),+ $(,)?) => {
        impl std::str::FromStr for $name {
            type Err = $crate::ConvertError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $(
                        stringify!($string) => Self::$variant,
                    )*
                    _ => return Err($crate::ConvertError::invalid_enum_value::<Self>(s)),
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                match value {
                    $(
                        $name::$variant => stringify!($string).to_string(),
                    )*
                }
            }
        }

        impl std::string::ToString for $name {
            fn to_string(&self) -> String {
                match self {
                    $(
                        Self::$variant => stringify!($string).to_string(),
                    )*
                }
            }
        }
    };
}

pub(crate) use simple_to_from_string;

/* Exposed APIs */

/// Converts a SPICE-like netlist text into the output model.
/// Malformed records are skipped with a diagnostic.
pub fn convert_spice(input: &str, profile: &BoardProfile, meta: &DesignMeta) -> NetlistFile {
    let mut graph = NetGraph::new(profile);

    for record in logical_records(input) {
        match classify(&record, profile) {
            Ok(record) => graph.add_record(record),
            Err(error) => log::warn!("skipping record: {error}"),
        }
    }

    graph.into_netlist(meta)
}

/// Converts a JSON board description, plus an optional companion
/// netlist text carrying the connectivity, into the output model.
pub fn convert_board(
    board_json: &str,
    netlist: Option<&str>,
    profile: &BoardProfile,
    meta: &DesignMeta,
) -> Result<NetlistFile, ConvertError> {
    let board = BoardFile::from_json(board_json)?;
    let mut graph = NetGraph::new(profile);
    board.register(&mut graph, profile);

    if let Some(netlist) = netlist {
        for record in logical_records(netlist) {
            match board.classify(&record, profile) {
                Ok(record) => graph.add_record(record),
                Err(error) => log::warn!("skipping record: {error}"),
            }
        }
    }

    Ok(graph.into_netlist(meta))
}

/// Serializes the output model to netlist file text.
pub fn serialize_netlist(netlist: &NetlistFile) -> String {
    netlist_sexpr::to_string(&netlist.to_sexpr())
}
