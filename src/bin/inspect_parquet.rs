use emistage::CanonicalField;
use parquet::file::metadata::{ColumnChunkMetaData, RowGroupMetaData};
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::{env, fs::File, path::Path, process::exit};

fn main() {
    // Expect exactly one CLI argument: path to a staging Parquet file.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <STAGING_PARQUET>", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_parquet(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        exit(1);
    }
}

/// Print the file summary, then per-column types and null counts so that cells
/// lost to coercion are visible.
fn inspect_parquet(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let parquet_meta = reader.metadata();
    let file_meta = parquet_meta.file_metadata();

    println!("=== Staging file: {} ===", path.display());
    println!("Total rows:           {}", file_meta.num_rows());
    println!("Number of row groups: {}", parquet_meta.num_row_groups());
    println!("File size on disk:    {} bytes", std::fs::metadata(path)?.len());
    println!();

    // Columns, flagged when they are not part of the canonical schema
    let columns = file_meta.schema_descr().columns();
    let mut nulls = vec![0i64; columns.len()];
    for rg_idx in 0..parquet_meta.num_row_groups() {
        let rg_md = parquet_meta.row_group(rg_idx);
        print_row_group(rg_idx, rg_md);
        for (col_idx, total) in nulls.iter_mut().enumerate() {
            *total += null_count(rg_md.column(col_idx)).unwrap_or(0) as i64;
        }
    }

    println!("=== Columns ===");
    let missing: Vec<&str> = CanonicalField::ALL
        .iter()
        .map(|f| f.name())
        .filter(|name| !columns.iter().any(|c| c.name() == *name))
        .collect();
    for (col_desc, nulls) in columns.iter().zip(&nulls) {
        let name = col_desc.name();
        let marker = if CanonicalField::from_name(name).is_some() { " " } else { "?" };
        let logical = col_desc
            .logical_type()
            .as_ref()
            .map_or("<none>".to_string(), |lt| format!("{:?}", lt));
        let pct = if file_meta.num_rows() > 0 {
            100.0 * *nulls as f64 / file_meta.num_rows() as f64
        } else {
            0.0
        };
        println!(
            "{} {:<24} | {:<10} | {:<28} | nulls {:>9} ({:5.1}%)",
            marker,
            name,
            format!("{:?}", col_desc.physical_type()),
            logical,
            nulls,
            pct
        );
    }
    if !missing.is_empty() {
        println!();
        println!("Missing canonical columns: {}", missing.join(", "));
    }
    Ok(())
}

fn null_count(col_md: &ColumnChunkMetaData) -> Option<u64> {
    col_md.statistics().and_then(|s| s.null_count_opt())
}

fn print_row_group(idx: usize, rg_md: &RowGroupMetaData) {
    println!("--- Row Group {} ---", idx);
    println!("  Rows:              {}", rg_md.num_rows());
    println!("  Uncompressed size: {} bytes", rg_md.total_byte_size());
    println!("  Compressed size:   {} bytes", rg_md.compressed_size());
    if rg_md.num_columns() > 0 {
        println!("  Compression:       {:?}", rg_md.column(0).compression());
    }
    println!();
}
