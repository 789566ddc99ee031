//src/types.rs

use std::fmt;
use std::str::FromStr;

/// One row of a Kraken report as written to disk:
///  %  cladeReads  taxonReads  rank  taxID  taxName
#[derive(Debug, Clone, PartialEq)]
pub struct KrakenReportRow {
    pub pct: f64,
    pub clade_reads: u64,
    pub taxon_reads: u64,
    pub rank: String,
    pub tax_id: u32,
    /// Kept verbatim, including the indentation Kraken uses to encode depth.
    pub tax_name: String,
}

/// Row identity across samples. Two rows are the same taxon only when
/// all three fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MergeKey {
    pub tax_id: u32,
    pub tax_name: String,
    pub rank: String,
}

impl MergeKey {
    pub fn new(tax_id: u32, tax_name: impl Into<String>, rank: impl Into<String>) -> Self {
        Self {
            tax_id,
            tax_name: tax_name.into(),
            rank: rank.into(),
        }
    }
}

impl From<&KrakenReportRow> for MergeKey {
    fn from(row: &KrakenReportRow) -> Self {
        MergeKey::new(row.tax_id, row.tax_name.clone(), row.rank.clone())
    }
}

/// A normalized record extracted from a report row.
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonAbundance {
    pub key: MergeKey,
    pub abundance: f64,
}

/// Which report column the per-sample abundance is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbundanceSource {
    /// Clade read count divided by (unclassified + root reads) / 100.
    #[default]
    CladeReads,
    /// The percentage Kraken printed, rounded to 2 decimals.
    ReportedPercent,
}

/// Taxonomic ranks that get their own OTU table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Domain,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    Unclassified,
    /// Any rank code outside the canonical set, written as `-`.
    Unranked,
}

impl Rank {
    pub const ALL: [Rank; 10] = [
        Rank::Domain,
        Rank::Kingdom,
        Rank::Phylum,
        Rank::Class,
        Rank::Order,
        Rank::Family,
        Rank::Genus,
        Rank::Species,
        Rank::Unclassified,
        Rank::Unranked,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Rank::Domain => "D",
            Rank::Kingdom => "K",
            Rank::Phylum => "P",
            Rank::Class => "C",
            Rank::Order => "O",
            Rank::Family => "F",
            Rank::Genus => "G",
            Rank::Species => "S",
            Rank::Unclassified => "U",
            Rank::Unranked => "-",
        }
    }

    pub fn from_code(code: &str) -> Option<Rank> {
        Rank::ALL.iter().copied().find(|r| r.code() == code)
    }

    /// Case-sensitive match against a report's rank column.
    pub fn matches(&self, code: &str) -> bool {
        match self {
            Rank::Unranked => !Rank::ALL
                .iter()
                .any(|r| *r != Rank::Unranked && r.code() == code),
            canonical => canonical.code() == code,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which OTU tables to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankSelection {
    /// One table per rank in `Rank::ALL`.
    #[default]
    All,
    Only(Rank),
    /// No OTU tables.
    Nothing,
}

impl RankSelection {
    pub fn ranks(&self) -> Vec<Rank> {
        match self {
            RankSelection::All => Rank::ALL.to_vec(),
            RankSelection::Only(rank) => vec![*rank],
            RankSelection::Nothing => Vec::new(),
        }
    }
}

impl FromStr for RankSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "no" {
            return Ok(RankSelection::Nothing);
        }
        Rank::from_code(s).map(RankSelection::Only).ok_or_else(|| {
            format!("invalid rank \"{s}\", expected one of D K P C O F G S U - no")
        })
    }
}
