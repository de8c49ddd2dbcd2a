use std::io::Read;
use std::path::Path;

use crate::sampler::{RankDistributionEntry, SampleError};

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("Could not read distribution table: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Invalid(#[from] SampleError),

    #[error("Distribution table is empty")]
    Empty,
}

/// Reads a `tier,division,percentage` table. `division` may be left blank
/// for apex tiers.
pub fn load_distribution(path: &Path) -> Result<Vec<RankDistributionEntry>, DistributionError> {
    parse_distribution(csv::Reader::from_path(path)?)
}

pub fn read_distribution<R: Read>(reader: R) -> Result<Vec<RankDistributionEntry>, DistributionError> {
    parse_distribution(csv::Reader::from_reader(reader))
}

fn parse_distribution<R: Read>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<RankDistributionEntry>, DistributionError> {
    let mut entries = Vec::new();
    for row in reader.deserialize() {
        let entry: RankDistributionEntry = row?;
        entry.validate()?;
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(DistributionError::Empty);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{Division, Tier};
    use std::io::Write;

    #[test]
    fn parses_table_with_blank_apex_division() {
        let table = "tier,division,percentage\nGOLD,II,0.25\nCHALLENGER,,0.01\n";

        let entries = read_distribution(table.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tier, Tier::Gold);
        assert_eq!(entries[0].division, Some(Division::Ii));
        assert_eq!(entries[1].division, None);
        assert_eq!(entries[1].percentage, 0.01);
    }

    #[test]
    fn rejects_out_of_range_share() {
        let table = "tier,division,percentage\nGOLD,II,0\n";
        let err = read_distribution(table.as_bytes()).unwrap_err();
        assert!(matches!(err, DistributionError::Invalid(_)));
    }

    #[test]
    fn rejects_missing_division_below_apex() {
        let table = "tier,division,percentage\nSILVER,,0.5\n";
        assert!(read_distribution(table.as_bytes()).is_err());
    }

    #[test]
    fn rejects_unknown_tier() {
        let table = "tier,division,percentage\nWOOD,I,0.5\n";
        assert!(matches!(
            read_distribution(table.as_bytes()),
            Err(DistributionError::Csv(_))
        ));
    }

    #[test]
    fn empty_table_is_an_error() {
        assert!(matches!(
            read_distribution("tier,division,percentage\n".as_bytes()),
            Err(DistributionError::Empty)
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tier,division,percentage").unwrap();
        writeln!(file, "DIAMOND,IV,0.1").unwrap();

        let entries = load_distribution(file.path()).unwrap();
        assert_eq!(entries[0].tier, Tier::Diamond);
    }
}
