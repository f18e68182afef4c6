use std::ops::Range;

use crate::domain::format_currency;
use crate::record::{CellValue, Row};
use crate::theme::Tone;

/// Schema entry for one table column: which field it reads, how it is
/// labelled, whether its header toggles sorting, and the render strategy
/// for its cells. Duplicate keys across a column set are undefined
/// behavior; the last matching column wins for header handling.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub cell: CellKind,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
            cell: CellKind::Text,
        }
    }

    pub const fn cell(mut self, kind: CellKind) -> Self {
        self.cell = kind;
        self
    }

    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

/// Per-column cell rendering strategy. A fixed set of variants instead of
/// an arbitrary callback keeps rendering pure and testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Badge,
    Currency,
    Date,
    Quantity,
}

/// A rendered cell: display text plus an optional badge tone.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Option<Tone>,
}

impl Column {
    /// Pure value-to-display mapping. Absent fields render blank.
    pub fn render(&self, row: &Row) -> Cell {
        let value = row.get(self.key);
        match self.cell {
            CellKind::Badge => {
                let text = value.to_string();
                let tone = Some(Tone::for_badge(&text));
                Cell { text, tone }
            }
            CellKind::Currency => {
                let text = match value {
                    CellValue::Float(n) => format_currency(*n),
                    CellValue::Int(n) => format_currency(*n as f64),
                    CellValue::Null => String::new(),
                    other => other.to_string(),
                };
                Cell { text, tone: None }
            }
            CellKind::Text | CellKind::Date | CellKind::Quantity => Cell {
                text: value.to_string(),
                tone: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Sort state of one table. `key: None` leaves the input in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: Option<&'static str>,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: None,
            direction: SortDirection::Ascending,
        }
    }
}

/// Page window over the (sorted, filtered) row sequence. `current` is
/// 1-based and always kept inside `[1, total_pages]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub current: usize,
    pub size: usize,
}

impl PageState {
    pub fn new(size: usize) -> Self {
        Self {
            current: 1,
            size: size.max(1),
        }
    }
}

/// Sort + page state for one table instance. Owns that state exclusively;
/// the row sequence itself is borrowed per call and never mutated.
#[derive(Debug, Clone)]
pub struct TableState {
    pub columns: Vec<Column>,
    pub sort: SortState,
    pub page: PageState,
    /// Which column the header cursor is on (sort target).
    pub picked: usize,
}

impl TableState {
    pub fn new(columns: Vec<Column>, page_size: usize) -> Self {
        let picked = columns.iter().position(|c| c.sortable).unwrap_or(0);
        Self {
            columns,
            sort: SortState::default(),
            page: PageState::new(page_size),
            picked,
        }
    }

    /// Stable-sorted index view of `rows`. Ties keep their original
    /// relative order; with no sort key the input order passes through.
    pub fn order(&self, rows: &[Row]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..rows.len()).collect();
        let Some(key) = self.sort.key else {
            return indices;
        };
        indices.sort_by(|&a, &b| {
            let ord = rows[a].get(key).compare(rows[b].get(key));
            match self.sort.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        indices
    }

    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page.size).max(1)
    }

    /// The current page window as an index range into the ordered sequence.
    pub fn page_slice(&self, len: usize) -> Range<usize> {
        let start = (self.page.current - 1) * self.page.size;
        let end = (start + self.page.size).min(len);
        start.min(end)..end
    }

    pub fn page_label(&self, len: usize) -> String {
        format!("Page {} of {}", self.page.current, self.total_pages(len))
    }

    /// "Showing 1 to 5 of 8 results" line under the table.
    pub fn showing_label(&self, len: usize) -> String {
        let slice = self.page_slice(len);
        if slice.is_empty() {
            return "No results".to_string();
        }
        format!(
            "Showing {} to {} of {} results",
            slice.start + 1,
            slice.end,
            len
        )
    }

    pub fn first_page(&mut self) {
        self.page.current = 1;
    }

    pub fn last_page(&mut self, len: usize) {
        self.page.current = self.total_pages(len);
    }

    pub fn next_page(&mut self, len: usize) {
        self.page.current = (self.page.current + 1).min(self.total_pages(len));
    }

    pub fn prev_page(&mut self) {
        self.page.current = self.page.current.saturating_sub(1).max(1);
    }

    pub fn on_first_page(&self) -> bool {
        self.page.current == 1
    }

    pub fn on_last_page(&self, len: usize) -> bool {
        self.page.current == self.total_pages(len)
    }

    /// Clamp the page whenever the underlying row count changed (filter,
    /// delete, refetch). The app this replaces let the page dangle past the
    /// end and rendered an empty table; here an input-set change always
    /// lands on a valid page.
    pub fn sync_len(&mut self, len: usize) {
        self.page.current = self.page.current.clamp(1, self.total_pages(len));
    }

    /// Header press on the picked column: first press sorts ascending,
    /// pressing the sorted column again flips direction, and a different
    /// column resets to ascending. Also returns to page 1, since the
    /// reordered sequence makes the old window meaningless.
    pub fn toggle_sort(&mut self) {
        let Some(col) = self.columns.get(self.picked) else {
            return;
        };
        if !col.sortable {
            return;
        }
        if self.sort.key == Some(col.key) {
            self.sort.direction = match self.sort.direction {
                SortDirection::Ascending => SortDirection::Descending,
                SortDirection::Descending => SortDirection::Ascending,
            };
        } else {
            self.sort.key = Some(col.key);
            self.sort.direction = SortDirection::Ascending;
        }
        self.page.current = 1;
    }

    /// Move the header cursor to the previous/next sortable column.
    pub fn pick_left(&mut self) {
        let mut i = self.picked;
        while i > 0 {
            i -= 1;
            if self.columns[i].sortable {
                self.picked = i;
                return;
            }
        }
    }

    pub fn pick_right(&mut self) {
        let mut i = self.picked;
        while i + 1 < self.columns.len() {
            i += 1;
            if self.columns[i].sortable {
                self.picked = i;
                return;
            }
        }
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = c.chars().any(|ch| ch == ' ' || ch == '\t' || ch == ',');
    let mut out = String::from(c);
    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping || needs_escaping {
        out = format!("\"{out}\"");
    }
    out
}

/// One row as a CSV line in column order, for the clipboard yank.
pub fn csv_line(columns: &[Column], row: &Row) -> String {
    columns
        .iter()
        .map(|c| wrap_cell_content(&c.render(row).text))
        .collect::<Vec<String>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn rows(names: &[(&str, i64)]) -> Vec<Row> {
        names
            .iter()
            .map(|(n, v)| Row::new().set("name", *n).set("n", CellValue::Int(*v)))
            .collect()
    }

    fn table(page_size: usize) -> TableState {
        TableState::new(
            vec![
                Column::new("name", "Name"),
                Column::new("n", "N"),
                Column::new("note", "Note").unsortable(),
            ],
            page_size,
        )
    }

    #[test]
    fn unsorted_preserves_insertion_order() {
        let rows = rows(&[("c", 1), ("a", 2), ("b", 3)]);
        let t = table(10);
        assert_eq!(t.order(&rows), vec![0, 1, 2]);
    }

    #[test]
    fn ascending_then_descending_inverts() {
        let rows = rows(&[("b", 2), ("c", 3), ("a", 1)]);
        let mut t = table(10);
        t.toggle_sort();
        let asc = t.order(&rows);
        t.toggle_sort();
        let desc = t.order(&rows);
        assert_eq!(asc.first(), desc.last());
        assert_eq!(asc.last(), desc.first());
        let sorted: Vec<&str> = asc
            .iter()
            .map(|&i| match rows[i].get("name") {
                CellValue::Text(s) => s.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_keep_original_relative_order() {
        let rows = rows(&[("x", 1), ("x", 2), ("a", 3), ("x", 4)]);
        let mut t = table(10);
        t.toggle_sort();
        // "a" first, then the three "x" rows in insertion order.
        assert_eq!(t.order(&rows), vec![2, 0, 1, 3]);
    }

    #[test]
    fn switching_column_resets_to_ascending() {
        let mut t = table(10);
        t.toggle_sort();
        t.toggle_sort();
        assert_eq!(t.sort.direction, SortDirection::Descending);
        t.pick_right();
        t.toggle_sort();
        assert_eq!(t.sort.key, Some("n"));
        assert_eq!(t.sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn sorting_returns_to_first_page() {
        let mut t = table(2);
        t.next_page(8);
        assert_eq!(t.page.current, 2);
        t.toggle_sort();
        assert_eq!(t.page.current, 1);
    }

    #[test]
    fn unsortable_header_is_a_noop() {
        let mut t = table(10);
        t.picked = 2;
        t.toggle_sort();
        assert_eq!(t.sort.key, None);
    }

    #[test]
    fn pages_cover_sequence_exactly_once() {
        for page_size in 1..=9 {
            let mut t = table(page_size);
            let len = 8;
            let mut seen = Vec::new();
            for page in 1..=t.total_pages(len) {
                t.page.current = page;
                seen.extend(t.page_slice(len));
            }
            assert_eq!(seen, (0..len).collect::<Vec<usize>>(), "size {page_size}");
        }
    }

    #[test]
    fn eight_rows_page_size_five() {
        let mut t = table(5);
        let len = 8;
        assert_eq!(t.page_slice(len).len(), 5);
        assert_eq!(t.page_label(len), "Page 1 of 2");
        assert_eq!(t.showing_label(len), "Showing 1 to 5 of 8 results");
        t.next_page(len);
        assert_eq!(t.page_slice(len).len(), 3);
        assert!(t.on_last_page(len));
        t.next_page(len); // no-op at the boundary
        assert_eq!(t.page.current, 2);
        t.first_page();
        assert!(t.on_first_page());
        t.prev_page(); // no-op at the boundary
        assert_eq!(t.page.current, 1);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        let mut t = table(5);
        t.page.current = 7;
        t.sync_len(8);
        assert_eq!(t.page.current, 2);
        t.sync_len(0);
        assert_eq!(t.page.current, 1);
        assert_eq!(t.total_pages(0), 1);
        assert!(t.page_slice(0).is_empty());
    }

    #[test]
    fn absent_field_renders_blank() {
        let col = Column::new("missing", "Missing");
        let cell = col.render(&Row::new().set("name", "x"));
        assert_eq!(cell.text, "");
        assert_eq!(cell.tone, None);
    }

    #[test]
    fn badge_and_currency_cells() {
        let row = Row::new()
            .set("status", "Completed")
            .set("total", CellValue::Float(159.98));
        let badge = Column::new("status", "Status").cell(CellKind::Badge);
        let money = Column::new("total", "Total").cell(CellKind::Currency);
        assert_eq!(badge.render(&row).tone, Some(Tone::Success));
        assert_eq!(money.render(&row).text, "$159.98");
    }

    #[test]
    fn csv_line_quotes_like_a_spreadsheet() {
        let columns = vec![Column::new("name", "Name"), Column::new("note", "Note")];
        let row = Row::new()
            .set("name", "John Doe")
            .set("note", "says \"hi\"");
        assert_eq!(csv_line(&columns, &row), "\"John Doe\",\"says \"\"hi\"\"\"");
    }
}
