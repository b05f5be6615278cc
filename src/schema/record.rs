// src/schema/record.rs

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::concat_batches;
use arrow::datatypes::{Date32Type, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::Serialize;

use super::arrow::canonical_schema;
use super::types::CanonicalField;

/// One staging row, typed per the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    pub source_file: String,
    pub fecha_ingestion: NaiveDate,
    pub anio: Option<i64>,
    pub razon_social: Option<String>,
    pub rut_razon_social: Option<String>,
    pub nombre_establecimiento: Option<String>,
    pub id_vu: Option<String>,
    pub ciiu4: Option<String>,
    pub ciiu4_id: Option<String>,
    pub ciiu6: Option<String>,
    pub ciiu6_id: Option<String>,
    pub rubro: Option<String>,
    pub rubro_id: Option<String>,
    pub region: Option<String>,
    pub provincia: Option<String>,
    pub comuna: Option<String>,
    pub codigo_territorial: Option<String>,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
    pub ducto: Option<String>,
    pub nombre_ducto: Option<String>,
    pub contaminante: Option<String>,
    pub contaminante_id: Option<String>,
    pub emision_toneladas: Option<f64>,
    pub norma: Option<String>,
    pub tabla: Option<String>,
    pub origen: Option<String>,
}

/// The unified staging dataset: one RecordBatch carrying exactly the canonical schema.
#[derive(Debug, Clone)]
pub struct CanonicalDataset {
    batch: RecordBatch,
}

impl CanonicalDataset {
    /// Wrap a batch, rejecting anything whose schema is not the canonical one.
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        let expected = canonical_schema();
        if batch.schema().fields() != expected.fields() {
            let got: Vec<&str> = batch
                .schema_ref()
                .fields()
                .iter()
                .map(|f| f.name().as_str())
                .collect();
            bail!("batch does not carry the canonical schema; got columns {:?}", got);
        }
        Ok(Self { batch })
    }

    /// Concatenate per-source batches, preserving their order and row order.
    pub fn concat(batches: &[RecordBatch]) -> Result<Self> {
        let schema = canonical_schema();
        let batch = concat_batches(&schema, batches).context("concatenating staging batches")?;
        Self::try_new(batch)
    }

    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(canonical_schema()),
        }
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    pub fn column(&self, field: CanonicalField) -> &ArrayRef {
        self.batch.column(field.index())
    }

    /// Count of null cells per canonical field, in canonical order.
    pub fn null_counts(&self) -> Vec<(CanonicalField, usize)> {
        CanonicalField::ALL
            .iter()
            .map(|f| (*f, self.column(*f).null_count()))
            .collect()
    }

    pub fn record(&self, row: usize) -> Option<CanonicalRecord> {
        if row >= self.num_rows() {
            return None;
        }
        let text = |f: CanonicalField| {
            let arr = self.column(f).as_string::<i32>();
            arr.is_valid(row).then(|| arr.value(row).to_string())
        };
        let float = |f: CanonicalField| {
            let arr = self.column(f).as_primitive::<Float64Type>();
            arr.is_valid(row).then(|| arr.value(row))
        };
        let anio = self.column(CanonicalField::Anio).as_primitive::<Int64Type>();
        let fecha = self
            .column(CanonicalField::FechaIngestion)
            .as_primitive::<Date32Type>();

        use CanonicalField::*;
        Some(CanonicalRecord {
            source_file: text(SourceFile).unwrap_or_default(),
            fecha_ingestion: fecha.value_as_date(row)?,
            anio: anio.is_valid(row).then(|| anio.value(row)),
            razon_social: text(RazonSocial),
            rut_razon_social: text(RutRazonSocial),
            nombre_establecimiento: text(NombreEstablecimiento),
            id_vu: text(IdVu),
            ciiu4: text(Ciiu4),
            ciiu4_id: text(Ciiu4Id),
            ciiu6: text(Ciiu6),
            ciiu6_id: text(Ciiu6Id),
            rubro: text(Rubro),
            rubro_id: text(RubroId),
            region: text(Region),
            provincia: text(Provincia),
            comuna: text(Comuna),
            codigo_territorial: text(CodigoTerritorial),
            latitud: float(Latitud),
            longitud: float(Longitud),
            ducto: text(Ducto),
            nombre_ducto: text(NombreDucto),
            contaminante: text(Contaminante),
            contaminante_id: text(ContaminanteId),
            emision_toneladas: float(EmisionToneladas),
            norma: text(Norma),
            tabla: text(Tabla),
            origen: text(Origen),
        })
    }

    pub fn records(&self) -> impl Iterator<Item = CanonicalRecord> + '_ {
        (0..self.num_rows()).filter_map(move |i| self.record(i))
    }
}
