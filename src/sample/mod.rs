use nalgebra::*;
use serde::{Serialize, Deserialize};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::Read;
use std::ops::Index;
use std::path::Path;

use crate::error::Error;

/// A single experimental unit: the strength of a plastic specimen together
/// with the extrusion temperature and pressure under which it was produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {

    pub temperature : f64,

    pub pressure : f64,

    pub strength : f64

}

/// An immutable, in-memory table of observations. Tables are read from
/// delimited text with a header row (whitespace-separated columns or CSV),
/// and expose the columns as `nalgebra` vectors for the estimation and
/// simulation routines. All derived tables (subsamples, permutations) are
/// new values; nothing is mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {

    obs : Vec<Observation>

}

impl Table {

    pub fn new(obs : Vec<Observation>) -> Result<Self, Error> {
        if obs.is_empty() {
            return Err(Error::EmptyTable);
        }
        Ok(Self { obs })
    }

    /// Opens a delimited text file with a header row carrying (at least) the
    /// temperature, pressure and strength columns, in any order.
    pub fn open<P>(path : P) -> Result<Self, Error>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        Self::from_reader(f)
    }

    /// Reads a table from any source. Column separation is detected from the
    /// header row: a comma makes the table CSV; otherwise runs of whitespace
    /// separate the columns.
    pub fn from_reader<R>(mut reader : R) -> Result<Self, Error>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let header = content.lines().find(|l| !l.trim().is_empty() ).unwrap_or("");
        let (text, delim) = if header.contains(',') {
            (content.clone(), b',')
        } else {
            let rows : Vec<String> = content.lines()
                .map(|l| l.split_whitespace().collect::<Vec<_>>().join("\t") )
                .collect();
            (rows.join("\n"), b'\t')
        };
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let cols = [
            column_position(&mut rdr, "temperature")?,
            column_position(&mut rdr, "pressure")?,
            column_position(&mut rdr, "strength")?
        ];
        let names = ["temperature", "pressure", "strength"];
        let mut obs = Vec::new();
        for (i, rec) in rdr.records().enumerate() {
            let rec = rec?;
            let mut vals = [0.0; 3];
            for k in 0..3 {
                let field = rec.get(cols[k]).unwrap_or("");
                vals[k] = field.parse::<f64>().map_err(|_| Error::MalformedValue {
                    line : i + 2,
                    column : names[k].to_string(),
                    value : field.to_string()
                })?;
            }
            obs.push(Observation { temperature : vals[0], pressure : vals[1], strength : vals[2] });
        }
        Self::new(obs)
    }

    /// Draws a uniform subsample of size n without replacement. The draw is
    /// fully determined by the seed, so a fixed seed reproduces the same
    /// subsample across runs.
    pub fn subsample(&self, n : usize, seed : u64) -> Result<Self, Error> {
        if n == 0 || n > self.obs.len() {
            return Err(Error::SubsampleSize { requested : n, available : self.obs.len() });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let ixs = rand::seq::index::sample(&mut rng, self.obs.len(), n);
        let obs = ixs.iter().map(|ix| self.obs[ix] ).collect();
        Self::new(obs)
    }

    /// Returns a new table with the observations in reversed order. Useful to
    /// verify order-insensitivity of criteria computed over the table.
    pub fn reversed(&self) -> Self {
        let obs : Vec<_> = self.obs.iter().rev().copied().collect();
        Self { obs }
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obs.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.obs
    }

    pub fn iter(&self) -> impl Iterator<Item=&Observation> {
        self.obs.iter()
    }

    /// Response column, as the estimation routines expect it.
    pub fn strength(&self) -> DVector<f64> {
        DVector::from_iterator(self.obs.len(), self.obs.iter().map(|o| o.strength ))
    }

    pub fn temperature(&self) -> DVector<f64> {
        DVector::from_iterator(self.obs.len(), self.obs.iter().map(|o| o.temperature ))
    }

    pub fn pressure(&self) -> DVector<f64> {
        DVector::from_iterator(self.obs.len(), self.obs.iter().map(|o| o.pressure ))
    }

    /// Packed representation, observations over rows and variables over
    /// columns (temperature, pressure, strength).
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.obs.len(), 3, |i, j| match j {
            0 => self.obs[i].temperature,
            1 => self.obs[i].pressure,
            _ => self.obs[i].strength
        })
    }

}

fn column_position<R>(rdr : &mut csv::Reader<R>, name : &str) -> Result<usize, Error>
where
    R : Read
{
    rdr.headers()?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name) )
        .ok_or_else(|| Error::MissingColumn(name.to_string()) )
}

impl Index<usize> for Table {

    type Output = Observation;

    fn index(&self, ix : usize) -> &Self::Output {
        &self.obs[ix]
    }

}

impl Display for Table {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>12} {:>12}", "temperature", "pressure", "strength")?;
        for o in self.obs.iter().take(10) {
            writeln!(f, "{:>12.2} {:>12.2} {:>12.2}", o.temperature, o.pressure, o.strength)?;
        }
        if self.obs.len() > 10 {
            writeln!(f, "({} rows omitted)", self.obs.len() - 10)?;
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    const TXT : &str = "temperature pressure strength\n80.0 4.0 35.5\n90.5 6.0 33.1\n70.0 3.5 36.0\n";

    #[test]
    fn whitespace_table() {
        let tbl = Table::from_reader(TXT.as_bytes()).unwrap();
        assert_eq!(tbl.len(), 3);
        assert_eq!(tbl[1].pressure, 6.0);
        assert_eq!(tbl.strength()[2], 36.0);
    }

    #[test]
    fn comma_table() {
        let csv = "strength,temperature,pressure\n35.5,80.0,4.0\n33.1,90.5,6.0\n";
        let tbl = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(tbl.len(), 2);
        assert_eq!(tbl[0].strength, 35.5);
        assert_eq!(tbl[1].temperature, 90.5);
    }

    #[test]
    fn malformed_value() {
        let bad = "temperature pressure strength\n80.0 oops 35.5\n";
        match Table::from_reader(bad.as_bytes()) {
            Err(Error::MalformedValue { line, ref column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "pressure");
            },
            other => panic!("unexpected: {:?}", other)
        }
    }

    #[test]
    fn missing_column() {
        let bad = "temperature pressure\n80.0 4.0\n";
        assert!(matches!(Table::from_reader(bad.as_bytes()), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn subsample_reproducible() {
        let tbl = Table::from_reader(TXT.as_bytes()).unwrap();
        let a = tbl.subsample(2, 42).unwrap();
        let b = tbl.subsample(2, 42).unwrap();
        assert_eq!(a.observations(), b.observations());
    }

    #[test]
    fn subsample_bounds() {
        let tbl = Table::from_reader(TXT.as_bytes()).unwrap();
        assert!(matches!(tbl.subsample(4, 1), Err(Error::SubsampleSize { .. })));
        assert!(matches!(tbl.subsample(0, 1), Err(Error::SubsampleSize { .. })));
    }

}
