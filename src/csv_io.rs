//! CSV import of the population and export of drawn samples.
//!
//! Both directions use the `ID,Movie` header layout.

use crate::movie_store::PopulationRecord;
use anyhow::{Context, Result};
use std::io;
use std::path::Path;

pub fn read_population<R: io::Read>(reader: R) -> Result<Vec<PopulationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for (idx, result) in reader.deserialize::<PopulationRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn read_population_csv(path: &Path) -> Result<Vec<PopulationRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_population(file)
}

/// Writes the records sorted by id.
pub fn write_sample<W: io::Write>(writer: W, records: &[PopulationRecord]) -> Result<()> {
    let mut sorted: Vec<&PopulationRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.id);

    let mut writer = csv::Writer::from_writer(writer);
    for record in sorted {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_sample_csv(path: &Path, records: &[PopulationRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_sample(file, records)
}
