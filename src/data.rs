use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::error::{BanditError, Result};

const HEADER_LEN: usize = 2 * size_of::<u64>();

/// T rounds of N prices each, stored row-major: price `n` of round `t`
/// lives at `prices[N * t + n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    rounds: usize,
    prices_per_round: usize,
    prices: Vec<f64>,
}

impl PriceSeries {
    pub fn new(rounds: usize, prices_per_round: usize, prices: Vec<f64>) -> Result<Self> {
        if rounds == 0 || prices_per_round == 0 {
            return Err(BanditError::InvalidDimensions(format!(
                "price series needs at least one round and one price per round, got T={rounds} N={prices_per_round}"
            )));
        }
        if prices.len() != rounds * prices_per_round {
            return Err(BanditError::InvalidDimensions(format!(
                "expected {} prices for T={rounds} N={prices_per_round}, got {}",
                rounds * prices_per_round,
                prices.len()
            )));
        }
        Ok(Self {
            rounds,
            prices_per_round,
            prices,
        })
    }

    pub fn from_rounds(rounds: &[Vec<f64>]) -> Result<Self> {
        let prices_per_round = rounds.first().map_or(0, Vec::len);
        if rounds.iter().any(|r| r.len() != prices_per_round) {
            return Err(BanditError::InvalidDimensions(
                "every round must hold the same number of prices".to_string(),
            ));
        }
        let prices = rounds.iter().flatten().copied().collect();
        Self::new(rounds.len(), prices_per_round, prices)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn prices_per_round(&self) -> usize {
        self.prices_per_round
    }

    pub fn round(&self, t: usize) -> &[f64] {
        let start = self.prices_per_round * t;
        &self.prices[start..start + self.prices_per_round]
    }

    pub fn iter_rounds(&self) -> impl Iterator<Item = &[f64]> {
        self.prices.chunks_exact(self.prices_per_round)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    /// Global (min, max) over every price in the series.
    pub fn min_max(&self) -> (f64, f64) {
        self.prices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
                (lo.min(p), hi.max(p))
            })
    }

    /// Rescales every price into [0, 1] with the series' own min and max.
    /// A constant series maps to all zeros.
    pub fn normalize(&mut self) {
        let (min, max) = self.min_max();
        let span = max - min;
        for p in self.prices.iter_mut() {
            *p = if span > 0.0 { (*p - min) / span } else { 0.0 };
        }
    }

    /// Decodes the generator's binary layout: u64 T, u64 N, then T*N f64,
    /// all little-endian. Bytes past the last price are rejected.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.len() < HEADER_LEN {
            return Err(BanditError::MalformedPriceFile(format!(
                "header needs {HEADER_LEN} bytes, file has {}",
                bytes.len()
            )));
        }

        let (header, payload) = bytes.split_at(HEADER_LEN);
        let rounds = read_u64(&header[..8]);
        let prices_per_round = read_u64(&header[8..]);

        let expected = rounds.checked_mul(prices_per_round).ok_or_else(|| {
            BanditError::MalformedPriceFile(format!(
                "T={rounds} N={prices_per_round} overflows the price count"
            ))
        })?;
        let found = (payload.len() / size_of::<f64>()) as u64;
        if found < expected {
            return Err(BanditError::TruncatedPriceFile { expected, found });
        }
        let trailing = payload.len() as u64 - expected * size_of::<f64>() as u64;
        if trailing > 0 {
            return Err(BanditError::MalformedPriceFile(format!(
                "{trailing} bytes after the last of {expected} prices"
            )));
        }

        let prices = payload
            .chunks_exact(size_of::<f64>())
            .take(expected as usize)
            .map(|chunk| f64::from_bits(read_u64(chunk)))
            .collect();

        Self::new(rounds as usize, prices_per_round as usize, prices)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&(self.rounds as u64).to_le_bytes())?;
        writer.write_all(&(self.prices_per_round as u64).to_le_bytes())?;
        for p in &self.prices {
            writer.write_all(&p.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
