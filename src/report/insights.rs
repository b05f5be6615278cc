// src/report/insights.rs

use anyhow::{bail, Result};
use arrow::array::{Array, Float64Array, StringArray};
use serde::Serialize;
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use super::StagingFrame;
use crate::schema::CanonicalField;

/// Tonnage total per year. `None` when every tonnage cell of that year is null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotal {
    pub anio: i64,
    pub emision_total_ton: Option<f64>,
}

impl YearTotal {
    pub const HEADERS: [&'static str; 2] = ["anio", "emision_total_ton"];
}

/// Tonnage total per text key (region, pollutant, emitter).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub emision_total_ton: Option<f64>,
}

/// Which column identifies an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKey {
    #[serde(rename = "id_vu")]
    IdVu,
    #[serde(rename = "razon_social")]
    RazonSocial,
}

impl GroupKey {
    /// `id_vu` when the loaded schema has it, `razon_social` otherwise.
    pub fn for_frame(frame: &StagingFrame) -> Self {
        if frame.has_field(CanonicalField::IdVu) {
            GroupKey::IdVu
        } else {
            GroupKey::RazonSocial
        }
    }

    pub fn field(self) -> CanonicalField {
        match self {
            GroupKey::IdVu => CanonicalField::IdVu,
            GroupKey::RazonSocial => CanonicalField::RazonSocial,
        }
    }
}

/// Share of total tonnage emitted by the top slice of emitters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concentration {
    pub group_key: GroupKey,
    pub emitters_total: usize,
    pub top_pct: f64,
    pub top_n: usize,
    pub emision_total_ton: f64,
    pub emision_top_ton: f64,
    pub share_top: f64,
}

impl Concentration {
    pub const HEADERS: [&'static str; 7] = [
        "group_key",
        "emitters_total",
        "top_pct",
        "top_n",
        "emision_total_ton",
        "emision_top_ton",
        "share_top",
    ];
}

fn accumulate(slot: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *slot = Some(slot.unwrap_or(0.0) + v);
    }
}

fn tonnage_at(tonnage: &Float64Array, row: usize) -> Option<f64> {
    tonnage.is_valid(row).then(|| tonnage.value(row))
}

/// Sum tonnage per non-null key.
fn sum_by_text(keys: &StringArray, tonnage: &Float64Array) -> Vec<GroupTotal> {
    let mut totals: HashMap<&str, Option<f64>> = HashMap::new();
    for row in 0..keys.len() {
        if keys.is_null(row) {
            continue;
        }
        accumulate(totals.entry(keys.value(row)).or_default(), tonnage_at(tonnage, row));
    }
    totals
        .into_iter()
        .map(|(key, emision_total_ton)| GroupTotal {
            key: key.to_string(),
            emision_total_ton,
        })
        .collect()
}

/// Largest total first, null totals last, ties broken by key.
fn rank_desc(a: &GroupTotal, b: &GroupTotal) -> Ordering {
    match (a.emision_total_ton, b.emision_total_ton) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.key.cmp(&b.key)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.key.cmp(&b.key),
    }
}

fn top_by(frame: &StagingFrame, field: CanonicalField, top_n: usize) -> Result<Vec<GroupTotal>> {
    let keys = frame.text(field)?;
    let tonnage = frame.float(CanonicalField::EmisionToneladas)?;
    let mut totals = sum_by_text(keys, tonnage);
    totals.sort_by(rank_desc);
    totals.truncate(top_n);
    Ok(totals)
}

/// Total tonnage per year, ascending. Rows with a null year are skipped.
pub fn emissions_by_year(frame: &StagingFrame) -> Result<Vec<YearTotal>> {
    let years = frame.integer(CanonicalField::Anio)?;
    let tonnage = frame.float(CanonicalField::EmisionToneladas)?;

    let mut totals: BTreeMap<i64, Option<f64>> = BTreeMap::new();
    for row in 0..years.len() {
        if years.is_null(row) {
            continue;
        }
        accumulate(totals.entry(years.value(row)).or_default(), tonnage_at(tonnage, row));
    }
    Ok(totals
        .into_iter()
        .map(|(anio, emision_total_ton)| YearTotal {
            anio,
            emision_total_ton,
        })
        .collect())
}

pub fn top_regions(frame: &StagingFrame, top_n: usize) -> Result<Vec<GroupTotal>> {
    top_by(frame, CanonicalField::Region, top_n)
}

pub fn top_contaminants(frame: &StagingFrame, top_n: usize) -> Result<Vec<GroupTotal>> {
    top_by(frame, CanonicalField::Contaminante, top_n)
}

/// How much of the total the top `top_pct` of emitters account for.
///
/// Emitters are grouped by [`GroupKey::for_frame`]; emitters without any tonnage are
/// not counted. At least one emitter always forms the top slice.
pub fn top_emitters_concentration(frame: &StagingFrame, top_pct: f64) -> Result<Concentration> {
    if !(top_pct > 0.0 && top_pct <= 1.0) {
        bail!("top_pct must be in (0, 1], got {}", top_pct);
    }

    let group_key = GroupKey::for_frame(frame);
    let keys = frame.text(group_key.field())?;
    let tonnage = frame.float(CanonicalField::EmisionToneladas)?;

    let mut sums: Vec<f64> = sum_by_text(keys, tonnage)
        .into_iter()
        .filter_map(|g| g.emision_total_ton)
        .collect();
    sums.sort_by(|a, b| b.total_cmp(a));

    let emitters_total = sums.len();
    let top_n = ((emitters_total as f64 * top_pct) as usize).max(1);
    // fold from +0.0; an empty `Sum` of f64 is -0.0
    let total = sums.iter().fold(0.0, |acc, v| acc + v);
    let top = sums.iter().take(top_n).fold(0.0, |acc, v| acc + v);
    let share_top = if total > 0.0 { top / total } else { 0.0 };

    Ok(Concentration {
        group_key,
        emitters_total,
        top_pct,
        top_n,
        emision_total_ton: total,
        emision_top_ton: top,
        share_top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn frame(with_id_vu: bool) -> StagingFrame {
        let mut fields = vec![
            Field::new("anio", DataType::Int64, true),
            Field::new("razon_social", DataType::Utf8, true),
            Field::new("region", DataType::Utf8, true),
            Field::new("contaminante", DataType::Utf8, true),
            Field::new("emision_toneladas", DataType::Float64, true),
        ];
        let mut cols: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![
                Some(2006),
                Some(2006),
                Some(2019),
                None,
                Some(2024),
                Some(2024),
            ])),
            Arc::new(StringArray::from(vec![
                Some("Arauco"),
                Some("Arauco"),
                Some("Escondida"),
                Some("Essbio"),
                Some("Essbio"),
                None,
            ])),
            Arc::new(StringArray::from(vec![
                Some("Biobío"),
                Some("Biobío"),
                Some("Antofagasta"),
                Some("Ñuble"),
                Some("Ñuble"),
                None,
            ])),
            Arc::new(StringArray::from(vec![
                Some("DBO5"),
                Some("Fósforo"),
                Some("Cobre"),
                Some("DBO5"),
                Some("DBO5"),
                Some("Cobre"),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(10.0),
                Some(5.0),
                Some(80.0),
                Some(4.0),
                Some(1.0),
                None,
            ])),
        ];
        if with_id_vu {
            fields.push(Field::new("id_vu", DataType::Utf8, true));
            cols.push(Arc::new(StringArray::from(vec![
                Some("001"),
                Some("002"),
                Some("003"),
                Some("004"),
                Some("004"),
                Some("005"),
            ])));
        }
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).unwrap();
        StagingFrame::new(batch)
    }

    #[test]
    fn totals_per_year_ascending_skip_null_years() -> Result<()> {
        let years = emissions_by_year(&frame(true))?;
        assert_eq!(
            years,
            vec![
                YearTotal { anio: 2006, emision_total_ton: Some(15.0) },
                YearTotal { anio: 2019, emision_total_ton: Some(80.0) },
                YearTotal { anio: 2024, emision_total_ton: Some(1.0) },
            ]
        );
        Ok(())
    }

    #[test]
    fn ranking_is_descending_and_truncated() -> Result<()> {
        let regions = top_regions(&frame(true), 2)?;
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].key, "Antofagasta");
        assert_eq!(regions[1].key, "Biobío");
        assert_eq!(regions[1].emision_total_ton, Some(15.0));

        let pollutants = top_contaminants(&frame(true), 10)?;
        let keys: Vec<&str> = pollutants.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Cobre", "DBO5", "Fósforo"]);
        assert_eq!(pollutants[1].emision_total_ton, Some(15.0));
        Ok(())
    }

    #[test]
    fn concentration_prefers_establishment_id() -> Result<()> {
        let c = top_emitters_concentration(&frame(true), 0.05)?;
        assert_eq!(c.group_key, GroupKey::IdVu);
        // 005 has only null tonnage and is not an emitter
        assert_eq!(c.emitters_total, 4);
        assert_eq!(c.top_n, 1);
        assert_eq!(c.emision_total_ton, 100.0);
        assert_eq!(c.emision_top_ton, 80.0);
        assert!((c.share_top - 0.8).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn concentration_falls_back_to_legal_name() -> Result<()> {
        let f = frame(false);
        assert!(!f.has_field(CanonicalField::IdVu));
        let c = top_emitters_concentration(&f, 1.0)?;
        assert_eq!(c.group_key, GroupKey::RazonSocial);
        assert_eq!(c.emitters_total, 3);
        assert_eq!(c.top_n, 3);
        assert_eq!(c.share_top, 1.0);
        Ok(())
    }

    #[test]
    fn concentration_over_no_emitters_is_positive_zero() -> Result<()> {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("id_vu", DataType::Utf8, true),
                Field::new("emision_toneladas", DataType::Float64, true),
            ])),
            vec![
                Arc::new(StringArray::from(Vec::<Option<&str>>::new())),
                Arc::new(Float64Array::from(Vec::<Option<f64>>::new())),
            ],
        )
        .unwrap();
        let c = top_emitters_concentration(&StagingFrame::new(batch), 0.05)?;
        assert_eq!(c.emitters_total, 0);
        assert_eq!(c.top_n, 1);
        assert!(c.emision_total_ton == 0.0 && c.emision_total_ton.is_sign_positive());
        assert!(c.emision_top_ton == 0.0 && c.emision_top_ton.is_sign_positive());
        assert_eq!(c.share_top, 0.0);
        Ok(())
    }

    #[test]
    fn group_key_name_matches_serialized_label() {
        for key in [GroupKey::IdVu, GroupKey::RazonSocial] {
            let label = serde_json::to_string(&key).unwrap();
            assert_eq!(label, format!("\"{}\"", key.field().name()));
        }
    }

    #[test]
    fn concentration_rejects_bad_pct() {
        assert!(top_emitters_concentration(&frame(true), 0.0).is_err());
        assert!(top_emitters_concentration(&frame(true), 1.5).is_err());
        assert!(top_emitters_concentration(&frame(true), f64::NAN).is_err());
    }

    #[test]
    fn missing_column_is_an_error() {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("anio", DataType::Int64, true)])),
            vec![Arc::new(Int64Array::from(vec![Some(2020)]))],
        )
        .unwrap();
        let err = emissions_by_year(&StagingFrame::new(batch)).unwrap_err();
        assert!(err.to_string().contains("emision_toneladas"));
    }
}
