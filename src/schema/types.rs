// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical type of a canonical column, independent of its Arrow encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    /// Free text, trimmed; empty becomes null.
    Text,
    /// Code-like text (ids, RUTs, territorial codes). Never parsed as a number.
    Identifier,
    /// Nullable integer (only the year).
    Integer,
    /// Nullable float, comma or point decimal separator.
    Float,
    /// Calendar date (only the ingestion date).
    Date,
}

/// The 27 fields of the canonical v1 staging schema, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    // metadata
    SourceFile,
    FechaIngestion,
    // time
    Anio,
    // establishment
    RazonSocial,
    RutRazonSocial,
    NombreEstablecimiento,
    IdVu,
    // economic classification
    Ciiu4,
    Ciiu4Id,
    Ciiu6,
    Ciiu6Id,
    Rubro,
    RubroId,
    // geography
    Region,
    Provincia,
    Comuna,
    CodigoTerritorial,
    // location
    Latitud,
    Longitud,
    // infrastructure
    Ducto,
    NombreDucto,
    // emission
    Contaminante,
    ContaminanteId,
    EmisionToneladas,
    Norma,
    Tabla,
    Origen,
}

impl CanonicalField {
    /// Every canonical field, in output order.
    pub const ALL: [CanonicalField; 27] = [
        CanonicalField::SourceFile,
        CanonicalField::FechaIngestion,
        CanonicalField::Anio,
        CanonicalField::RazonSocial,
        CanonicalField::RutRazonSocial,
        CanonicalField::NombreEstablecimiento,
        CanonicalField::IdVu,
        CanonicalField::Ciiu4,
        CanonicalField::Ciiu4Id,
        CanonicalField::Ciiu6,
        CanonicalField::Ciiu6Id,
        CanonicalField::Rubro,
        CanonicalField::RubroId,
        CanonicalField::Region,
        CanonicalField::Provincia,
        CanonicalField::Comuna,
        CanonicalField::CodigoTerritorial,
        CanonicalField::Latitud,
        CanonicalField::Longitud,
        CanonicalField::Ducto,
        CanonicalField::NombreDucto,
        CanonicalField::Contaminante,
        CanonicalField::ContaminanteId,
        CanonicalField::EmisionToneladas,
        CanonicalField::Norma,
        CanonicalField::Tabla,
        CanonicalField::Origen,
    ];

    /// Column name in the staging dataset.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::SourceFile => "source_file",
            CanonicalField::FechaIngestion => "fecha_ingestion",
            CanonicalField::Anio => "anio",
            CanonicalField::RazonSocial => "razon_social",
            CanonicalField::RutRazonSocial => "rut_razon_social",
            CanonicalField::NombreEstablecimiento => "nombre_establecimiento",
            CanonicalField::IdVu => "id_vu",
            CanonicalField::Ciiu4 => "ciiu4",
            CanonicalField::Ciiu4Id => "ciiu4_id",
            CanonicalField::Ciiu6 => "ciiu6",
            CanonicalField::Ciiu6Id => "ciiu6_id",
            CanonicalField::Rubro => "rubro",
            CanonicalField::RubroId => "rubro_id",
            CanonicalField::Region => "region",
            CanonicalField::Provincia => "provincia",
            CanonicalField::Comuna => "comuna",
            CanonicalField::CodigoTerritorial => "codigo_territorial",
            CanonicalField::Latitud => "latitud",
            CanonicalField::Longitud => "longitud",
            CanonicalField::Ducto => "ducto",
            CanonicalField::NombreDucto => "nombre_ducto",
            CanonicalField::Contaminante => "contaminante",
            CanonicalField::ContaminanteId => "contaminante_id",
            CanonicalField::EmisionToneladas => "emision_toneladas",
            CanonicalField::Norma => "norma",
            CanonicalField::Tabla => "tabla",
            CanonicalField::Origen => "origen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn logical_type(self) -> LogicalType {
        use CanonicalField::*;
        match self {
            FechaIngestion => LogicalType::Date,
            Anio => LogicalType::Integer,
            Latitud | Longitud | EmisionToneladas => LogicalType::Float,
            IdVu | RutRazonSocial | Ciiu4Id | Ciiu6Id | RubroId | ContaminanteId
            | CodigoTerritorial => LogicalType::Identifier,
            _ => LogicalType::Text,
        }
    }

    /// Ingestion metadata is stamped on every row and can never be null.
    pub fn is_metadata(self) -> bool {
        matches!(self, CanonicalField::SourceFile | CanonicalField::FechaIngestion)
    }

    /// Position in the canonical ordering.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
