//! FASTA input and contig output.
use crate::contig::Contig;
use crate::Result;
use bio::io::fasta;
use log::{debug, warn};
use std::io::{Read, Write};
use std::path::Path;

/// Reads every record of a FASTA file, compressed or not, as an upper case sequence
pub fn read_sequences<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let (rdr, format) = niffler::from_path(path.as_ref())?;
    debug!("Reading {} ({:?})", path.as_ref().display(), format);
    let reads = parse_sequences(rdr)?;
    if reads.is_empty() {
        warn!("No sequences found in {}", path.as_ref().display());
    }
    Ok(reads)
}

/// Parses FASTA records from `rdr`
pub fn parse_sequences<R: Read>(rdr: R) -> Result<Vec<Vec<u8>>> {
    let mut reads = Vec::new();
    for record in fasta::Reader::new(rdr).records() {
        let record = record?;
        reads.push(record.seq().to_ascii_uppercase());
    }
    Ok(reads)
}

/// Writes `contigs` as FASTA records named `contig0`, `contig1` and so on
pub fn write_contigs<W: Write>(contigs: &[Contig], writer: W) -> Result<()> {
    let mut wrt = fasta::Writer::new(writer);
    for (i, contig) in contigs.iter().enumerate() {
        wrt.write(&format!("contig{}", i), None, contig.seq())?;
    }
    wrt.flush()?;
    Ok(())
}
