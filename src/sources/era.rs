// src/sources/era.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::schema::CanonicalField;
use CanonicalField::*;

/// Raw header (already trimmed) → canonical field.
pub type RenameTable = HashMap<&'static str, CanonicalField>;

/// The three publication eras of the source extracts. Each one carries its own
/// header vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    /// Spanish prose headers with spaces and accents, `;`-separated.
    #[serde(rename = "2005-2017")]
    Era2005To2017,
    /// snake_case headers, latin-1, with a mangled `año` in some years.
    #[serde(rename = "2018-2023")]
    Era2018To2023,
    /// Clean snake_case headers, `,`-separated UTF-8.
    #[serde(rename = "2024-2026")]
    Era2024To2026,
}

// Huso / Coordenada norte / Coordenada este (UTM) are not carried into lat/long in v1.
static RENAME_2005_2017: Lazy<RenameTable> = Lazy::new(|| {
    HashMap::from([
        ("Razón social", RazonSocial),
        ("Nombre de establecimiento", NombreEstablecimiento),
        ("ID establecimiento (VU)", IdVu),
        ("CIIU4", Ciiu4),
        ("Rubro RETC", Rubro),
        ("Ducto", Ducto),
        ("Tipo de Contaminante", Contaminante),
        ("Emisión (toneladas)", EmisionToneladas),
        ("Año", Anio),
        ("Norma", Norma),
        ("Región", Region),
        ("Provincia", Provincia),
        ("Comuna", Comuna),
    ])
});

static RENAME_2018_2023: Lazy<RenameTable> = Lazy::new(|| {
    HashMap::from([
        ("año", Anio),
        // U+FFFD baked into the header by an earlier lossy re-encode
        ("a\u{FFFD}o", Anio),
        // the same replacement char, re-read byte-wise as latin-1
        ("aï¿½o", Anio),
        // UTF-8 `ñ` read as latin-1
        ("aÃ±o", Anio),
        ("razon_social", RazonSocial),
        ("rut_razon_social", RutRazonSocial),
        ("nombre_establecimiento", NombreEstablecimiento),
        ("id_vu", IdVu),
        ("ciiu4", Ciiu4),
        ("id_ciiu4", Ciiu4Id),
        ("ciiu6", Ciiu6),
        ("id_ciiu6", Ciiu6Id),
        ("rubro_vu", Rubro),
        ("id_rubro_vu", RubroId),
        ("region", Region),
        ("provincia", Provincia),
        ("comuna", Comuna),
        ("comuna_", Comuna),
        ("id_comuna", CodigoTerritorial),
        ("latitud", Latitud),
        ("longitud", Longitud),
        ("cantidad_toneladas", EmisionToneladas),
        ("contaminantes", Contaminante),
        // also shipped as "id_contaminantes " (trailing space); headers are trimmed first
        ("id_contaminantes", ContaminanteId),
        ("ducto", Ducto),
        ("norma", Norma),
        ("nombre_ducto", NombreDucto),
        ("tabla", Tabla),
        ("origen", Origen),
    ])
});

static RENAME_2024_2026: Lazy<RenameTable> = Lazy::new(|| {
    HashMap::from([
        ("año", Anio),
        ("id_vu", IdVu),
        ("razon_social", RazonSocial),
        ("rut_razon_social", RutRazonSocial),
        ("nombre_establecimiento", NombreEstablecimiento),
        ("ciiu4", Ciiu4),
        ("ciiu4_id", Ciiu4Id),
        ("ciiu6", Ciiu6),
        ("ciiu6_id", Ciiu6Id),
        ("rubro", Rubro),
        ("rubro_id", RubroId),
        ("region", Region),
        ("provincia", Provincia),
        ("comuna", Comuna),
        ("codigo_unico_territorial", CodigoTerritorial),
        ("latitud", Latitud),
        ("longitud", Longitud),
        ("ducto", Ducto),
        ("ducto_nombre", NombreDucto),
        ("contaminante", Contaminante),
        ("contaminante_id", ContaminanteId),
        ("emision_total", EmisionToneladas),
        ("norma", Norma),
        ("tabla", Tabla),
        ("origen", Origen),
    ])
});

impl Era {
    pub fn rename_table(self) -> &'static RenameTable {
        match self {
            Era::Era2005To2017 => &RENAME_2005_2017,
            Era::Era2018To2023 => &RENAME_2018_2023,
            Era::Era2024To2026 => &RENAME_2024_2026,
        }
    }

    /// Canonical field for a raw header cell, if this era knows it.
    pub fn resolve(self, raw_header: &str) -> Option<CanonicalField> {
        self.rename_table().get(raw_header).copied()
    }

    /// Rename one header: canonical name if mapped, otherwise the header unchanged.
    pub fn rename(self, raw_header: &str) -> String {
        match self.resolve(raw_header) {
            Some(field) => field.name().to_string(),
            None => raw_header.to_string(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Era::Era2005To2017 => "2005-2017",
            Era::Era2018To2023 => "2018-2023",
            Era::Era2024To2026 => "2024-2026",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
