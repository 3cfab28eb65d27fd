//! k-mer spectrum read correction. Rare k-mers are likely sequencing errors: they are
//! replaced with a frequent neighbour one substitution away where possible, and whatever
//! stays rare is handed to the assembler as the suspect set.
use crate::NUCLEOTIDES;
use bio::alignment::sparse::HashMapFx;
use log::{debug, info};

/// Occurrence count of every k-mer
pub type KmerHistogram = HashMapFx<Vec<u8>, u32>;

/// Counts the k-mers of all `reads`
pub fn kmer_histogram<I, S>(reads: I, k: usize) -> KmerHistogram
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut histogram = KmerHistogram::default();
    if k == 0 {
        return histogram;
    }
    for read in reads {
        for kmer in read.as_ref().windows(k) {
            *histogram.entry(kmer.to_vec()).or_insert(0) += 1;
        }
    }
    histogram
}

/// Mean count minus its sample standard deviation, never below 0
pub fn error_threshold(histogram: &KmerHistogram) -> f64 {
    let n = histogram.len();
    if n == 0 {
        return 0.0;
    }
    let mean = histogram.values().map(|&c| f64::from(c)).sum::<f64>() / n as f64;
    let sd = if n < 2 {
        0.0
    } else {
        let ss: f64 = histogram
            .values()
            .map(|&c| (f64::from(c) - mean).powi(2))
            .sum();
        (ss / (n - 1) as f64).sqrt()
    };
    (mean - sd).max(0.0)
}

/// Every sequence at Hamming distance 1 from `kmer`, substituting the last position first
/// and trying letters in `alphabet` order.
pub fn neighbours_1mm(kmer: &[u8], alphabet: &[u8]) -> Vec<Vec<u8>> {
    let mut neighbours = Vec::with_capacity(kmer.len() * alphabet.len().saturating_sub(1));
    for pos in (0..kmer.len()).rev() {
        for &letter in alphabet {
            if letter == kmer[pos] {
                continue;
            }
            let mut neighbour = kmer.to_vec();
            neighbour[pos] = letter;
            neighbours.push(neighbour);
        }
    }
    neighbours
}

fn count(histogram: &KmerHistogram, kmer: &[u8]) -> f64 {
    histogram.get(kmer).map_or(0.0, |&c| f64::from(c))
}

/// Walks the windows of `read` and replaces every k-mer seen at most `threshold` times
/// with its first neighbour seen more often. Later windows see earlier replacements.
pub fn correct_read(
    read: &[u8],
    k: usize,
    histogram: &KmerHistogram,
    alphabet: &[u8],
    threshold: f64,
) -> Vec<u8> {
    let mut read = read.to_vec();
    if k == 0 || read.len() < k {
        return read;
    }
    for i in 0..=read.len() - k {
        if count(histogram, &read[i..i + k]) > threshold {
            continue;
        }
        let replacement = neighbours_1mm(&read[i..i + k], alphabet)
            .into_iter()
            .find(|neighbour| count(histogram, neighbour) > threshold);
        if let Some(kmer) = replacement {
            read[i..i + k].copy_from_slice(&kmer);
        }
    }
    read
}

/// k-mers seen at most `threshold` times, sorted
pub fn suspect_kmers(histogram: &KmerHistogram, threshold: f64) -> Vec<Vec<u8>> {
    let mut suspect = histogram
        .iter()
        .filter(|(_, count)| f64::from(**count) <= threshold)
        .map(|(kmer, _)| kmer.clone())
        .collect::<Vec<Vec<u8>>>();
    suspect.sort();
    suspect
}

/// Corrected reads along with what is needed to filter the graph built from them
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Reads after substitution, in input order
    pub reads: Vec<Vec<u8>>,
    /// k-mers still rare after correction
    pub suspect: Vec<Vec<u8>>,
    /// Count threshold derived from the input reads
    pub threshold: f64,
}

/// Single substitution read corrector
#[derive(Debug, Clone)]
pub struct ErrorCorrector {
    k: usize,
    alphabet: Vec<u8>,
}

impl ErrorCorrector {
    /// Corrector over the nucleotide alphabet
    pub fn new(k: usize) -> Self {
        Self::with_alphabet(k, &NUCLEOTIDES)
    }

    /// Corrector substituting letters of `alphabet`
    pub fn with_alphabet(k: usize, alphabet: &[u8]) -> Self {
        Self {
            k,
            alphabet: alphabet.to_vec(),
        }
    }

    /// Derives the threshold from the input spectrum, corrects every read against it and
    /// collects the k-mers that are still rare in the corrected reads.
    pub fn correct<S: AsRef<[u8]>>(&self, reads: &[S]) -> Correction {
        let histogram = kmer_histogram(reads, self.k);
        let threshold = error_threshold(&histogram);
        info!(
            "{} distinct {}-mers, error threshold = {:.2}",
            histogram.len(),
            self.k,
            threshold
        );

        let mut changed = 0;
        let corrected = reads
            .iter()
            .map(|read| {
                let read = read.as_ref();
                let fixed = correct_read(read, self.k, &histogram, &self.alphabet, threshold);
                if fixed != read {
                    debug!(
                        "{} => {}",
                        String::from_utf8_lossy(read),
                        String::from_utf8_lossy(&fixed)
                    );
                    changed += 1;
                }
                fixed
            })
            .collect::<Vec<Vec<u8>>>();
        info!("Number of corrected reads = {}", changed);

        let suspect = suspect_kmers(&kmer_histogram(&corrected, self.k), threshold);
        info!("Number of suspect k-mers = {}", suspect.len());
        Correction {
            reads: corrected,
            suspect,
            threshold,
        }
    }
}
