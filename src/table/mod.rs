//! Domain-agnostic drill-down table: free-text search, column sort and
//! pagination over opaque JSON rows.

pub mod collate;

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use collate::natural_cmp;

/// One record; cells are looked up by column key.
pub type Row = serde_json::Map<String, Value>;

/// Shown for null, missing and empty cells.
pub const PLACEHOLDER: &str = "—";

static RE_NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\-]").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: String,
    pub label: String,
}

impl Column {
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Orient an ascending comparison.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PageSize {
    Twenty,
    #[default]
    Fifty,
    Hundred,
    TwoFifty,
}

impl PageSize {
    pub const ALL: [PageSize; 4] = [
        PageSize::Twenty,
        PageSize::Fifty,
        PageSize::Hundred,
        PageSize::TwoFifty,
    ];

    pub fn rows(self) -> u32 {
        match self {
            PageSize::Twenty => 20,
            PageSize::Fifty => 50,
            PageSize::Hundred => 100,
            PageSize::TwoFifty => 250,
        }
    }

    pub fn from_rows(n: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.rows() == n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

/// Text form of a cell, `None` for null or missing.
pub fn cell_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Display form of a cell, with [`PLACEHOLDER`] for empty values.
pub fn cell_display(value: Option<&Value>) -> String {
    match cell_string(value) {
        Some(s) if !s.is_empty() => s,
        _ => PLACEHOLDER.to_string(),
    }
}

/// Numbers as-is; strings after stripping everything but digits, '.' and '-'.
/// Anything that does not end up a finite number is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let stripped = RE_NON_NUMERIC.replace_all(s, "");
            if stripped.is_empty() {
                return None;
            }
            stripped.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Ascending order of two present cells: numeric when both coerce,
/// natural string order otherwise.
pub fn compare_cells(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (coerce_number(a), coerce_number(b)) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    let a = cell_string(Some(a)).unwrap_or_default();
    let b = cell_string(Some(b)).unwrap_or_default();
    natural_cmp(&a, &b)
}

/// Rows where any column's text contains `query`, case-insensitively.
/// A blank query keeps every row.
pub fn search_rows<'a>(rows: &'a [Row], columns: &[Column], query: &str) -> Vec<&'a Row> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter()
        .filter(|row| {
            columns.iter().any(|col| {
                cell_string(row.get(&col.key))
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .collect()
}

/// Stable sort by one column. Missing and empty cells go last in both directions.
pub fn sort_rows(rows: &mut [&Row], key: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let (av, bv) = (a.get(key), b.get(key));
        match (is_missing(av), is_missing(bv)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match (av, bv) {
                (Some(x), Some(y)) => direction.apply(compare_cells(x, y)),
                _ => Ordering::Equal,
            },
        }
    });
}

/// Number of pages for `total` rows; never less than one.
pub fn page_count(total: usize, page_size: PageSize) -> usize {
    let size = page_size.rows() as usize;
    total.div_ceil(size).max(1)
}

/// One rendered page of a [`DrillDownTable`].
#[derive(Debug, Clone, Serialize)]
pub struct TablePage<'a> {
    pub title: &'a str,
    pub columns: &'a [Column],
    pub rows: Vec<&'a Row>,
    /// Zero-based.
    pub page: usize,
    pub total_pages: usize,
    /// Rows left after search, across all pages.
    pub total_rows: usize,
    /// Zero-based index of the first visible row.
    pub start_index: usize,
    /// Exclusive end index of the visible rows.
    pub end_index: usize,
    pub query: &'a str,
    pub sort: Option<&'a SortState>,
}

impl TablePage<'_> {
    /// One-based "showing a-b" range, `None` when nothing matched.
    pub fn showing(&self) -> Option<(usize, usize)> {
        if self.total_rows == 0 {
            None
        } else {
            Some((self.start_index + 1, self.end_index))
        }
    }
}

/// Search/sort/paginate state bound to one data set.
#[derive(Debug, Clone, Default)]
pub struct DrillDownTable {
    title: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    query: String,
    sort: Option<SortState>,
    page_size: PageSize,
    page: usize,
}

impl DrillDownTable {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Bind a new data set. Query, sort and page go back to their defaults;
    /// the page size is kept.
    pub fn open(&mut self, title: &str, columns: Vec<Column>, rows: Vec<Row>) {
        log::debug!("drill-down open: {title} ({} rows)", rows.len());
        self.title = title.to_string();
        self.columns = columns;
        self.rows = rows;
        self.query.clear();
        self.sort = None;
        self.page = 0;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.page = 0;
    }

    /// Same key flips direction; a new key starts ascending.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = Some(match self.sort.take() {
            Some(s) if s.key == key => SortState {
                key: s.key,
                direction: s.direction.flip(),
            },
            _ => SortState {
                key: key.to_string(),
                direction: SortDirection::Asc,
            },
        });
        self.page = 0;
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.page = 0;
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 0;
    }

    /// Jump to `page`, clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.total_pages() - 1);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Rows matching the query, sorted, across all pages.
    pub fn visible_rows(&self) -> Vec<&Row> {
        let mut rows = search_rows(&self.rows, &self.columns, &self.query);
        if let Some(ref sort) = self.sort {
            sort_rows(&mut rows, &sort.key, sort.direction);
        }
        rows
    }

    pub fn total_pages(&self) -> usize {
        page_count(
            search_rows(&self.rows, &self.columns, &self.query).len(),
            self.page_size,
        )
    }

    pub fn view(&self) -> TablePage<'_> {
        let all = self.visible_rows();
        let total_rows = all.len();
        let total_pages = page_count(total_rows, self.page_size);
        let page = self.page.min(total_pages - 1);
        let size = self.page_size.rows() as usize;
        let start_index = (page * size).min(total_rows);
        let end_index = (start_index + size).min(total_rows);
        TablePage {
            title: &self.title,
            columns: &self.columns,
            rows: all[start_index..end_index].to_vec(),
            page,
            total_pages,
            total_rows,
            start_index,
            end_index,
            query: &self.query,
            sort: self.sort.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(map) => map,
            _ => panic!("fixture rows must be objects"),
        }
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::new("name", "Name"),
            Column::new("hops", "Hops"),
        ]
    }

    fn numbered(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| row(json!({"id": format!("T{i:03}"), "name": format!("row {i}"), "hops": i})))
            .collect()
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .map(|r| cell_string(r.get("id")).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_empty_search_returns_everything() {
        let rows = numbered(5);
        assert_eq!(search_rows(&rows, &columns(), "").len(), 5);
        assert_eq!(search_rows(&rows, &columns(), "   ").len(), 5);
    }

    #[test]
    fn test_search_any_column_case_insensitive() {
        let rows = vec![
            row(json!({"id": "A", "name": "Printer JAM", "hops": 1})),
            row(json!({"id": "B", "name": "vpn down", "hops": 12})),
            row(json!({"id": "C", "name": null, "hops": 3})),
        ];
        let hit = search_rows(&rows, &columns(), "jam");
        assert_eq!(ids(&hit), vec!["A"]);

        let hit = search_rows(&rows, &columns(), "12");
        assert_eq!(ids(&hit), vec!["B"]);

        let hit = search_rows(&rows, &columns(), "null");
        assert!(hit.is_empty(), "null cells never match");
    }

    #[test]
    fn test_search_only_looks_at_declared_columns() {
        let rows = vec![row(json!({"id": "A", "secret": "needle"}))];
        assert!(search_rows(&rows, &columns(), "needle").is_empty());
    }

    #[test]
    fn test_sort_numeric_strings() {
        let rows = vec![
            row(json!({"id": "a", "hops": "10 hops"})),
            row(json!({"id": "b", "hops": "9 hops"})),
            row(json!({"id": "c", "hops": 2})),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, "hops", SortDirection::Asc);
        assert_eq!(ids(&refs), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_falls_back_to_natural_strings() {
        let rows = vec![
            row(json!({"id": "x", "name": "Zulu"})),
            row(json!({"id": "y", "name": "alpha"})),
            row(json!({"id": "z", "name": "Bravo"})),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, "name", SortDirection::Asc);
        assert_eq!(ids(&refs), vec!["y", "z", "x"]);
    }

    #[test]
    fn test_malformed_numbers_compare_as_strings() {
        let a = json!("1.2.3");
        let b = json!("1.10");
        assert!(coerce_number(&a).is_none());
        assert_eq!(coerce_number(&b), Some(1.1));
        assert_eq!(coerce_number(&json!("n/a")), None);
        assert_eq!(compare_cells(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_missing_values_sort_last_both_directions() {
        let rows = vec![
            row(json!({"id": "a", "hops": null})),
            row(json!({"id": "b", "hops": 5})),
            row(json!({"id": "c", "hops": ""})),
            row(json!({"id": "d", "hops": 1})),
            row(json!({"id": "e"})),
        ];
        let mut refs: Vec<&Row> = rows.iter().collect();
        sort_rows(&mut refs, "hops", SortDirection::Asc);
        assert_eq!(ids(&refs)[..2], ["d", "b"]);

        sort_rows(&mut refs, "hops", SortDirection::Desc);
        assert_eq!(ids(&refs)[..2], ["b", "d"]);
        assert_eq!(refs.len(), 5);
    }

    #[test]
    fn test_toggle_sort_flips_then_resets() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("t", columns(), numbered(3));
        table.toggle_sort("hops");
        assert_eq!(table.sort().unwrap().direction, SortDirection::Asc);
        table.toggle_sort("hops");
        assert_eq!(table.sort().unwrap().direction, SortDirection::Desc);
        table.toggle_sort("name");
        let s = table.sort().unwrap();
        assert_eq!(s.key, "name");
        assert_eq!(s.direction, SortDirection::Asc);
    }

    #[test]
    fn test_pagination_45_rows_of_20() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("t", columns(), numbered(45));
        assert_eq!(table.total_pages(), 3);

        table.set_page(2);
        let view = table.view();
        assert_eq!(view.rows.len(), 5);
        assert_eq!(view.showing(), Some((41, 45)));
        assert_eq!(ids(&view.rows)[0], "T041");
    }

    #[test]
    fn test_page_clamps() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("t", columns(), numbered(45));
        table.set_page(99);
        assert_eq!(table.page(), 2);
        table.next_page();
        assert_eq!(table.page(), 2);
        table.set_page(0);
        table.prev_page();
        assert_eq!(table.page(), 0);
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let mut table = DrillDownTable::new(PageSize::Fifty);
        table.open("empty", columns(), Vec::new());
        let view = table.view();
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.page, 0);
        assert!(view.rows.is_empty());
        assert_eq!(view.showing(), None);
    }

    #[test]
    fn test_state_changes_reset_page() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("t", columns(), numbered(45));

        table.set_page(2);
        table.set_query("row");
        assert_eq!(table.page(), 0);

        table.set_page(2);
        table.toggle_sort("hops");
        assert_eq!(table.page(), 0);

        table.set_page(2);
        table.set_page_size(PageSize::Fifty);
        assert_eq!(table.page(), 0);
        assert_eq!(table.total_pages(), 1);
    }

    #[test]
    fn test_open_resets_state_but_keeps_page_size() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("first", columns(), numbered(45));
        table.set_query("row 1");
        table.toggle_sort("hops");
        table.set_page_size(PageSize::Hundred);

        table.open("second", columns(), numbered(10));
        assert_eq!(table.title(), "second");
        assert_eq!(table.query(), "");
        assert!(table.sort().is_none());
        assert_eq!(table.page(), 0);
        assert_eq!(table.page_size(), PageSize::Hundred);
    }

    #[test]
    fn test_view_applies_search_then_sort() {
        let mut table = DrillDownTable::new(PageSize::Twenty);
        table.open("t", columns(), numbered(30));
        table.set_query("row 2");
        table.toggle_sort("hops");
        table.toggle_sort("hops");
        let view = table.view();
        // "row 2" and "row 20".."row 29"
        assert_eq!(view.total_rows, 11);
        assert_eq!(ids(&view.rows)[0], "T029");
        assert_eq!(ids(&view.rows)[10], "T002");
    }

    #[test]
    fn test_cell_display_placeholder() {
        assert_eq!(cell_display(None), PLACEHOLDER);
        assert_eq!(cell_display(Some(&Value::Null)), PLACEHOLDER);
        assert_eq!(cell_display(Some(&json!(""))), PLACEHOLDER);
        assert_eq!(cell_display(Some(&json!(3))), "3");
        assert_eq!(cell_display(Some(&json!("P1"))), "P1");
    }

    #[test]
    fn test_page_size_options() {
        assert_eq!(PageSize::from_rows(250), Some(PageSize::TwoFifty));
        assert_eq!(PageSize::from_rows(25), None);
        assert_eq!(PageSize::default().rows(), 50);
    }
}
