// ===============================
// src/view.rs
// ===============================
//
// Per-table view state: the snapshot rows plus the user's sort/filter
// choices, and derive() which turns them into the ordered, filtered view
// the renderer consumes. One TableView per table; settings survive
// snapshot replacement so the chosen view persists across polls.
//
// Sort keys are closed enums (one per table) instead of stringly field
// lookups: every declared key is guaranteed to exist on the row type.

use std::cmp::Ordering;

use ahash::AHashMap as HashMap;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{PositionRow, ScannerRow, SignalRow, TradeRow};

/// Comparable projection of one row field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Num(f64),
    Date(NaiveDate),
    Time(DateTime<Utc>),
}

impl SortValue {
    fn cmp_same(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Num(a), SortValue::Num(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            // A single sort key always projects one kind; mixed kinds can
            // only mean a bug upstream, so treat them as ties.
            _ => Ordering::Equal,
        }
    }
}

// NaN behaves like a missing value: it sorts last instead of poisoning the
// comparator.
fn normalize(v: Option<SortValue>) -> Option<SortValue> {
    match v {
        Some(SortValue::Num(x)) if !x.is_finite() => None,
        other => other,
    }
}

/// Closed accessor set for one table's sortable fields.
pub trait SortField<R>: Copy + Eq {
    fn key(&self, row: &R) -> Option<SortValue>;
    /// Identifier-like fields browse A->Z (ascending); magnitude fields
    /// browse largest-first (descending).
    fn default_ascending(&self) -> bool;
}

pub type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

pub struct TableView<R, S: SortField<R>> {
    rows: Vec<R>,
    sort_key: S,
    sort_ascending: bool,
    filters: HashMap<&'static str, Predicate<R>>,
}

impl<R, S: SortField<R>> TableView<R, S> {
    pub fn new(initial: S) -> Self {
        Self {
            rows: Vec::new(),
            sort_key: initial,
            sort_ascending: initial.default_ascending(),
            filters: HashMap::new(),
        }
    }

    /// Install a new snapshot. Sort/filter settings are intentionally kept.
    pub fn replace(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }

    /// Same key: flip direction. New key: adopt it with its default
    /// direction.
    pub fn toggle_sort(&mut self, key: S) {
        if key == self.sort_key {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_key = key;
            self.sort_ascending = key.default_ascending();
        }
    }

    /// Replace one named filter. Active filters compose by AND.
    pub fn set_filter(&mut self, name: &'static str, pred: Predicate<R>) {
        self.filters.insert(name, pred);
    }

    pub fn clear_filter(&mut self, name: &str) {
        self.filters.remove(name);
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn sort_key(&self) -> S {
        self.sort_key
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_ascending
    }

    /// Filter (short-circuit AND), then stable sort. Rows whose key is
    /// absent go last regardless of direction. Never fails; empty in,
    /// empty out.
    pub fn derive(&self) -> Vec<&R> {
        let mut out: Vec<&R> = self
            .rows
            .iter()
            .filter(|r| self.filters.values().all(|p| p(r)))
            .collect();
        out.sort_by(|a, b| {
            let ka = normalize(self.sort_key.key(a));
            let kb = normalize(self.sort_key.key(b));
            match (ka, kb) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => {
                    let ord = x.cmp_same(&y);
                    if self.sort_ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
            }
        });
        out
    }
}

// ---------- per-table sort fields ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionField {
    Symbol,
    Qty,
    AvgCost,
    CurrentPrice,
    MarketValue,
    UnrealizedPnl,
    RealizedPnl,
    Strategy,
    EntryDate,
}

impl PositionField {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbol" | "sym" => Some(Self::Symbol),
            "qty" | "quantity" => Some(Self::Qty),
            "avg_cost" | "cost" => Some(Self::AvgCost),
            "price" | "current_price" => Some(Self::CurrentPrice),
            "market_value" | "value" | "mv" => Some(Self::MarketValue),
            "unrealized_pnl" | "upnl" => Some(Self::UnrealizedPnl),
            "realized_pnl" | "rpnl" => Some(Self::RealizedPnl),
            "strategy" | "strat" => Some(Self::Strategy),
            "entry_date" | "entry" => Some(Self::EntryDate),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Qty => "qty",
            Self::AvgCost => "avg_cost",
            Self::CurrentPrice => "price",
            Self::MarketValue => "market_value",
            Self::UnrealizedPnl => "unrealized_pnl",
            Self::RealizedPnl => "realized_pnl",
            Self::Strategy => "strategy",
            Self::EntryDate => "entry_date",
        }
    }
}

impl SortField<PositionRow> for PositionField {
    fn key(&self, row: &PositionRow) -> Option<SortValue> {
        match self {
            Self::Symbol => Some(SortValue::Text(row.symbol.clone())),
            Self::Qty => row.qty.map(SortValue::Num),
            Self::AvgCost => row.avg_cost.map(SortValue::Num),
            Self::CurrentPrice => row.current_price.map(SortValue::Num),
            Self::MarketValue => row.market_value.map(SortValue::Num),
            Self::UnrealizedPnl => row.unrealized_pnl.map(SortValue::Num),
            Self::RealizedPnl => row.realized_pnl.map(SortValue::Num),
            Self::Strategy => row.strategy.clone().map(SortValue::Text),
            Self::EntryDate => row.entry_date.map(SortValue::Date),
        }
    }

    fn default_ascending(&self) -> bool {
        matches!(self, Self::Symbol | Self::Strategy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerField {
    Symbol,
    Close,
    Sma20,
    Rsi14,
    Signal,
}

impl ScannerField {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbol" | "sym" => Some(Self::Symbol),
            "close" | "price" => Some(Self::Close),
            "sma_20" | "sma" => Some(Self::Sma20),
            "rsi_14" | "rsi" => Some(Self::Rsi14),
            "signal" | "verdict" => Some(Self::Signal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Close => "close",
            Self::Sma20 => "sma_20",
            Self::Rsi14 => "rsi_14",
            Self::Signal => "signal",
        }
    }
}

impl SortField<ScannerRow> for ScannerField {
    fn key(&self, row: &ScannerRow) -> Option<SortValue> {
        match self {
            Self::Symbol => Some(SortValue::Text(row.symbol.clone())),
            Self::Close => row.close.map(SortValue::Num),
            Self::Sma20 => row.sma_20.map(SortValue::Num),
            Self::Rsi14 => row.rsi_14.map(SortValue::Num),
            Self::Signal => row
                .signal
                .as_ref()
                .and_then(|v| v.label())
                .map(|l| SortValue::Text(l.to_string())),
        }
    }

    fn default_ascending(&self) -> bool {
        matches!(self, Self::Symbol | Self::Signal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalField {
    Symbol,
    SignalType,
    Qty,
    TargetPrice,
    Strategy,
    GeneratedAt,
}

impl SignalField {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbol" | "sym" => Some(Self::Symbol),
            "type" | "signal_type" => Some(Self::SignalType),
            "qty" | "quantity" => Some(Self::Qty),
            "target_price" | "target" => Some(Self::TargetPrice),
            "strategy" | "strat" => Some(Self::Strategy),
            "generated_at" | "time" => Some(Self::GeneratedAt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::SignalType => "type",
            Self::Qty => "qty",
            Self::TargetPrice => "target_price",
            Self::Strategy => "strategy",
            Self::GeneratedAt => "generated_at",
        }
    }
}

impl SortField<SignalRow> for SignalField {
    fn key(&self, row: &SignalRow) -> Option<SortValue> {
        match self {
            Self::Symbol => Some(SortValue::Text(row.symbol.clone())),
            Self::SignalType => row
                .signal_type
                .as_ref()
                .and_then(|a| a.label())
                .map(|l| SortValue::Text(l.to_string())),
            Self::Qty => row.qty.map(SortValue::Num),
            Self::TargetPrice => row.target_price.map(SortValue::Num),
            Self::Strategy => row.strategy.clone().map(SortValue::Text),
            Self::GeneratedAt => row.generated_at.map(SortValue::Time),
        }
    }

    fn default_ascending(&self) -> bool {
        matches!(self, Self::Symbol | Self::SignalType | Self::Strategy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeField {
    Date,
    Symbol,
    Action,
    Qty,
    Price,
    RealizedPnl,
    Strategy,
}

impl TradeField {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Some(Self::Date),
            "symbol" | "sym" => Some(Self::Symbol),
            "action" | "side" => Some(Self::Action),
            "qty" | "quantity" => Some(Self::Qty),
            "price" | "px" => Some(Self::Price),
            "realized_pnl" | "rpnl" | "pnl" => Some(Self::RealizedPnl),
            "strategy" | "strat" => Some(Self::Strategy),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Symbol => "symbol",
            Self::Action => "action",
            Self::Qty => "qty",
            Self::Price => "price",
            Self::RealizedPnl => "realized_pnl",
            Self::Strategy => "strategy",
        }
    }
}

impl SortField<TradeRow> for TradeField {
    fn key(&self, row: &TradeRow) -> Option<SortValue> {
        match self {
            Self::Date => row.date.map(SortValue::Date),
            Self::Symbol => Some(SortValue::Text(row.symbol.clone())),
            Self::Action => row
                .action
                .as_ref()
                .and_then(|a| a.label())
                .map(|l| SortValue::Text(l.to_string())),
            Self::Qty => row.qty.map(SortValue::Num),
            Self::Price => row.price.map(SortValue::Num),
            Self::RealizedPnl => row.realized_pnl.map(SortValue::Num),
            Self::Strategy => row.strategy.clone().map(SortValue::Text),
        }
    }

    fn default_ascending(&self) -> bool {
        matches!(self, Self::Symbol | Self::Action | Self::Strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        value: Option<f64>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Name,
        Value,
    }

    impl SortField<Row> for Field {
        fn key(&self, row: &Row) -> Option<SortValue> {
            match self {
                Field::Name => Some(SortValue::Text(row.name.to_string())),
                Field::Value => row.value.map(SortValue::Num),
            }
        }

        fn default_ascending(&self) -> bool {
            matches!(self, Field::Name)
        }
    }

    fn sample() -> Vec<Row> {
        vec![
            Row { name: "c", value: Some(2.0) },
            Row { name: "a", value: Some(2.0) },
            Row { name: "b", value: None },
            Row { name: "d", value: Some(1.0) },
        ]
    }

    fn names<'a>(rows: &[&'a Row]) -> Vec<&'a str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn test_derive_sorts_by_key_with_default_direction() {
        let mut view = TableView::new(Field::Name);
        view.replace(sample());
        assert_eq!(names(&view.derive()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_equal_keys_keep_original_relative_order() {
        let mut view = TableView::new(Field::Value);
        view.replace(sample());
        // Value defaults descending: c and a tie at 2.0 and must keep their
        // snapshot order (c before a); the None row goes last.
        assert_eq!(names(&view.derive()), vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn test_absent_keys_sort_last_in_both_directions() {
        let mut view = TableView::new(Field::Value);
        view.replace(sample());
        assert_eq!(names(&view.derive()).last(), Some(&"b"));
        view.toggle_sort(Field::Value); // flip to ascending
        assert_eq!(names(&view.derive()), vec!["d", "c", "a", "b"]);
    }

    #[test]
    fn test_toggle_same_key_twice_restores_direction() {
        let mut view: TableView<Row, Field> = TableView::new(Field::Value);
        assert!(!view.sort_ascending());
        view.toggle_sort(Field::Value);
        assert!(view.sort_ascending());
        view.toggle_sort(Field::Value);
        assert!(!view.sort_ascending());
    }

    #[test]
    fn test_toggle_new_key_adopts_its_default_direction() {
        let mut view: TableView<Row, Field> = TableView::new(Field::Name);
        assert!(view.sort_ascending());
        view.toggle_sort(Field::Value);
        assert_eq!(view.sort_key(), Field::Value);
        assert!(!view.sort_ascending()); // value's own default, not the prior direction
    }

    #[test]
    fn test_filters_compose_by_and_order_independent() {
        let has_value: fn(&Row) -> bool = |r| r.value.is_some();
        let late_name: fn(&Row) -> bool = |r| r.name >= "c";

        let mut ab = TableView::new(Field::Name);
        ab.replace(sample());
        ab.set_filter("has_value", Box::new(has_value));
        ab.set_filter("late_name", Box::new(late_name));

        let mut ba = TableView::new(Field::Name);
        ba.replace(sample());
        ba.set_filter("late_name", Box::new(late_name));
        ba.set_filter("has_value", Box::new(has_value));

        let expect = vec!["c", "d"]; // intersection of the two result sets
        assert_eq!(names(&ab.derive()), expect);
        assert_eq!(names(&ba.derive()), expect);
    }

    #[test]
    fn test_clear_filter_restores_rows() {
        let mut view = TableView::new(Field::Name);
        view.replace(sample());
        view.set_filter("has_value", Box::new(|r: &Row| r.value.is_some()));
        assert_eq!(view.derive().len(), 3);
        view.clear_filter("has_value");
        assert_eq!(view.derive().len(), 4);
        assert!(!view.has_filters());
    }

    #[test]
    fn test_replace_preserves_sort_and_filter_settings() {
        let mut view = TableView::new(Field::Name);
        view.toggle_sort(Field::Value);
        view.set_filter("has_value", Box::new(|r: &Row| r.value.is_some()));
        view.replace(sample());
        assert_eq!(view.sort_key(), Field::Value);
        assert!(view.has_filters());
        assert_eq!(view.derive().len(), 3);
        // next poll's snapshot keeps the same view settings
        view.replace(vec![Row { name: "z", value: None }]);
        assert_eq!(view.sort_key(), Field::Value);
        assert!(view.has_filters());
        assert!(view.derive().is_empty());
    }

    #[test]
    fn test_derive_on_empty_rows_is_empty() {
        let view: TableView<Row, Field> = TableView::new(Field::Name);
        assert!(view.derive().is_empty());
    }

    #[test]
    fn test_nan_sorts_like_a_missing_value() {
        let mut view = TableView::new(Field::Value);
        view.replace(vec![
            Row { name: "n", value: Some(f64::NAN) },
            Row { name: "x", value: Some(1.0) },
        ]);
        assert_eq!(names(&view.derive()), vec!["x", "n"]);
    }

    #[test]
    fn test_position_field_defaults() {
        assert!(PositionField::Symbol.default_ascending());
        assert!(PositionField::Strategy.default_ascending());
        assert!(!PositionField::MarketValue.default_ascending());
        assert!(!PositionField::EntryDate.default_ascending());
    }

    #[test]
    fn test_field_parsing_mirrors_known_aliases() {
        assert_eq!(PositionField::parse_one("Market_Value"), Some(PositionField::MarketValue));
        assert_eq!(PositionField::parse_one("mv"), Some(PositionField::MarketValue));
        assert_eq!(ScannerField::parse_one("rsi"), Some(ScannerField::Rsi14));
        assert_eq!(TradeField::parse_one("pnl"), Some(TradeField::RealizedPnl));
        assert_eq!(SignalField::parse_one("nope"), None);
    }
}
