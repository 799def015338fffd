//! Instrument catalogue: which tickers each stage requests and where they land.

/// What an instrument is used for in the acquisition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Physical spot quote. Probed only; the free feed has no history for it.
    Spot,
    /// COMEX futures, the proxy for spot in the output.
    Futures,
    /// Independent market variable for the downstream regression.
    Benchmark,
}

/// A ticker the run requests, with its output column if it is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub ticker: &'static str,
    pub label: &'static str,
    pub column: Option<&'static str>,
    pub role: Role,
}

pub const GOLD_SPOT: Instrument = Instrument {
    ticker: "XAUUSD=X",
    label: "Gold spot",
    column: None,
    role: Role::Spot,
};

pub const SILVER_SPOT: Instrument = Instrument {
    ticker: "XAGUSD=X",
    label: "Silver spot",
    column: None,
    role: Role::Spot,
};

pub const GOLD_FUTURES: Instrument = Instrument {
    ticker: "GC=F",
    label: "Gold futures",
    column: Some("Gold_USD"),
    role: Role::Futures,
};

pub const SILVER_FUTURES: Instrument = Instrument {
    ticker: "SI=F",
    label: "Silver futures",
    column: Some("Silver_USD"),
    role: Role::Futures,
};

pub const SP500: Instrument = Instrument {
    ticker: "^GSPC",
    label: "S&P 500",
    column: Some("SP500"),
    role: Role::Benchmark,
};

pub const VIX: Instrument = Instrument {
    ticker: "^VIX",
    label: "VIX",
    column: Some("VIX"),
    role: Role::Benchmark,
};

/// Date column header of the output file.
pub const DATE_COLUMN: &str = "Date";

/// Every instrument the run requests, in request order.
pub const CATALOGUE: [Instrument; 6] = [
    GOLD_SPOT,
    SILVER_SPOT,
    GOLD_FUTURES,
    SILVER_FUTURES,
    SP500,
    VIX,
];

/// Instruments merged into the output, in column order.
pub const MERGED: [Instrument; 4] = [GOLD_FUTURES, SILVER_FUTURES, SP500, VIX];

/// Catalogue entries with the given role, in request order.
pub fn with_role(role: Role) -> Vec<Instrument> {
    CATALOGUE.iter().filter(|i| i.role == role).copied().collect()
}

impl Instrument {
    /// Output column name, falling back to the ticker for probe-only instruments.
    pub fn column_name(&self) -> &'static str {
        self.column.unwrap_or(self.ticker)
    }
}
