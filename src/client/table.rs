//! Table state for the inventory page.
//!
//! Rows move between `Display` and `Editing`. Sorting and filtering only reorder or
//! hide rows that are already loaded; neither goes back to the server.

use super::api::{ClientError, InventoryApi, ItemDraft};
use super::notice::Notices;
use crate::models::Item;
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use thiserror::Error;

/// Label of the category-filter option that matches every row.
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("no row with id {0}")]
    UnknownRow(String),
    #[error("row {0} is not being edited")]
    NotEditing(String),
    #[error("row {0} is already being edited")]
    AlreadyEditing(String),
    #[error(transparent)]
    Request(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Quantity,
    Category,
}

impl Column {
    fn index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::Quantity => 1,
            Self::Category => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Cell text as shown in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValues {
    pub name: String,
    pub quantity: String,
    pub category: String,
}

impl RowValues {
    fn get(&self, column: Column) -> &str {
        match column {
            Column::Name => &self.name,
            Column::Quantity => &self.quantity,
            Column::Category => &self.category,
        }
    }

    fn get_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::Name => &mut self.name,
            Column::Quantity => &mut self.quantity,
            Column::Category => &mut self.category,
        }
    }

    fn to_draft(&self) -> ItemDraft {
        ItemDraft::new(&self.name, &self.quantity, &self.category)
    }
}

impl From<&Item> for RowValues {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity.to_string(),
            category: item.category.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Display,
    /// `snapshot` holds the values captured when editing started; `draft` holds the
    /// form contents.
    Editing { snapshot: RowValues, draft: RowValues },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub values: RowValues,
    pub state: RowState,
    pub visible: bool,
}

impl Row {
    fn from_item(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            values: RowValues::from(item),
            state: RowState::Display,
            visible: true,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, RowState::Editing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn from_selection(selection: &str) -> Self {
        if selection.eq_ignore_ascii_case(ALL_CATEGORIES) {
            Self::All
        } else {
            Self::Named(selection.to_lowercase())
        }
    }
}

/// Both filters together. A row stays visible only when it satisfies each of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableFilter {
    name_contains: String,
    category: CategoryFilter,
}

impl TableFilter {
    pub fn matches(&self, values: &RowValues) -> bool {
        let name_ok = values.name.to_lowercase().contains(&self.name_contains);
        let category_ok = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Named(selected) => values.category.to_lowercase() == *selected,
        };
        name_ok && category_ok
    }
}

/// Category names loaded once per session. Later loads reuse the first successful
/// result, so categories created afterwards stay invisible until `refresh` is called
/// or a new session starts.
#[derive(Debug, Default)]
pub struct CategoryCache {
    names: OnceCell<Vec<String>>,
}

impl CategoryCache {
    pub async fn ensure_loaded<A: InventoryApi + ?Sized>(&self, api: &A) -> Result<&[String], ClientError> {
        if let Some(names) = self.names.get() {
            return Ok(names.as_slice());
        }
        let categories = api.list_categories().await?;
        let names = categories.into_iter().map(|category| category.category).collect();
        Ok(self.names.get_or_init(|| names).as_slice())
    }

    /// Forgets the cached list; the next `ensure_loaded` fetches it again.
    pub fn refresh(&mut self) {
        self.names = OnceCell::new();
    }

    pub fn names(&self) -> &[String] {
        self.names.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entry_form_options(&self) -> Vec<String> {
        self.names().to_vec()
    }

    pub fn filter_options(&self) -> Vec<String> {
        std::iter::once(ALL_CATEGORIES.to_string())
            .chain(self.names().iter().cloned())
            .collect()
    }
}

pub struct TableController<A: InventoryApi> {
    api: A,
    categories: CategoryCache,
    rows: Vec<Row>,
    filter: TableFilter,
    sort_flags: [Option<SortOrder>; 3],
    notices: Notices,
}

impl<A: InventoryApi> TableController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            categories: CategoryCache::default(),
            rows: Vec::new(),
            filter: TableFilter::default(),
            sort_flags: [None; 3],
            notices: Notices::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.visible)
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn categories(&self) -> &CategoryCache {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut CategoryCache {
        &mut self.categories
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    /// Loads categories (first call only) and refetches every item.
    pub async fn load(&mut self) -> Result<(), TableError> {
        if let Err(error) = self.categories.ensure_loaded(&self.api).await {
            self.notices.error(format!("Error loading categories: {error}"));
        }
        self.refresh_items().await
    }

    async fn refresh_items(&mut self) -> Result<(), TableError> {
        match self.api.list_items().await {
            Ok(items) => {
                self.rows = items.iter().map(Row::from_item).collect();
                self.apply_filters();
                Ok(())
            }
            Err(error) => {
                self.notices.error(format!("Error fetching items: {error}"));
                Err(error.into())
            }
        }
    }

    pub async fn add(&mut self, draft: ItemDraft) -> Result<(), TableError> {
        match self.api.create_item(&draft).await {
            Ok(created) => {
                tracing::debug!(item_id = %created.id, "item added");
                self.notices.info("Item added!");
                self.refresh_items().await
            }
            Err(error) => {
                self.notices.error(format!("Error adding item: {error}"));
                Err(error.into())
            }
        }
    }

    pub fn begin_edit(&mut self, id: &str) -> Result<(), TableError> {
        let row = self.row_mut(id)?;
        if row.is_editing() {
            return Err(TableError::AlreadyEditing(id.to_string()));
        }
        row.state = RowState::Editing {
            snapshot: row.values.clone(),
            draft: row.values.clone(),
        };
        Ok(())
    }

    pub fn edit_field(&mut self, id: &str, column: Column, value: impl Into<String>) -> Result<(), TableError> {
        let row = self.row_mut(id)?;
        match &mut row.state {
            RowState::Editing { draft, .. } => {
                *draft.get_mut(column) = value.into();
                Ok(())
            }
            RowState::Display => Err(TableError::NotEditing(id.to_string())),
        }
    }

    /// Sends the full edited record. The row leaves edit mode only once the server
    /// accepts it.
    pub async fn save(&mut self, id: &str) -> Result<(), TableError> {
        let draft = match &self.row_mut(id)?.state {
            RowState::Editing { draft, .. } => draft.clone(),
            RowState::Display => return Err(TableError::NotEditing(id.to_string())),
        };

        match self.api.update_item(id, &draft.to_draft()).await {
            Ok(_) => {
                let filter = self.filter.clone();
                let row = self.row_mut(id)?;
                row.values = RowValues {
                    quantity: canonical_quantity(&draft.quantity),
                    ..draft
                };
                row.state = RowState::Display;
                row.visible = filter.matches(&row.values);
                self.notices.info("Item updated!");
                Ok(())
            }
            Err(error) => {
                self.notices.error(format!("Error updating item: {error}"));
                Err(error.into())
            }
        }
    }

    /// Restores the values captured by `begin_edit`. No request is made.
    pub fn cancel(&mut self, id: &str) -> Result<(), TableError> {
        let row = self.row_mut(id)?;
        match std::mem::replace(&mut row.state, RowState::Display) {
            RowState::Editing { snapshot, .. } => {
                row.values = snapshot;
                Ok(())
            }
            RowState::Display => Err(TableError::NotEditing(id.to_string())),
        }
    }

    /// Removes the row after the server confirms the delete.
    pub async fn delete(&mut self, id: &str) -> Result<(), TableError> {
        self.row_mut(id)?;
        match self.api.delete_item(id).await {
            Ok(_) => {
                self.rows.retain(|row| row.id != id);
                self.notices.info("Item deleted!");
                Ok(())
            }
            Err(error) => {
                self.notices.error(format!("Error deleting item: {error}"));
                Err(error.into())
            }
        }
    }

    /// Flips the column's order (first click is ascending) and reorders rows.
    pub fn toggle_sort(&mut self, column: Column) -> SortOrder {
        let flag = &mut self.sort_flags[column.index()];
        let order = match flag {
            Some(SortOrder::Ascending) => SortOrder::Descending,
            _ => SortOrder::Ascending,
        };
        *flag = Some(order);
        self.sort_rows(column, order);
        order
    }

    pub fn sort_rows(&mut self, column: Column, order: SortOrder) {
        // `sort_by` is stable, so equal keys keep their current relative order.
        self.rows.sort_by(|a, b| {
            let ordering = compare_cells(column, a.values.get(column), b.values.get(column));
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }

    pub fn set_name_filter(&mut self, text: &str) {
        self.filter.name_contains = text.to_lowercase();
        self.apply_filters();
    }

    pub fn set_category_filter(&mut self, selection: &str) {
        self.filter.category = CategoryFilter::from_selection(selection);
        self.apply_filters();
    }

    fn apply_filters(&mut self) {
        for row in &mut self.rows {
            row.visible = self.filter.matches(&row.values);
        }
    }

    fn row_mut(&mut self, id: &str) -> Result<&mut Row, TableError> {
        self.rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| TableError::UnknownRow(id.to_string()))
    }
}

fn compare_cells(column: Column, a: &str, b: &str) -> Ordering {
    match column {
        Column::Quantity => numeric_cell(a).total_cmp(&numeric_cell(b)),
        Column::Name | Column::Category => a.trim().to_lowercase().cmp(&b.trim().to_lowercase()),
    }
}

/// Unparsable quantities sort as zero.
fn numeric_cell(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
        .unwrap_or(0.0)
}

fn canonical_quantity(text: &str) -> String {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value >= 0.0 => {
            format!("{}", value as u64)
        }
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{numeric_cell, Column, RowState, SortOrder, TableController, TableError, ALL_CATEGORIES};
    use crate::client::api::{ClientError, ClientResult, InventoryApi, ItemDraft};
    use crate::models::{Category, Item, MessageResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        items: Mutex<Vec<Item>>,
        categories: Mutex<Vec<Category>>,
        fail_writes: AtomicBool,
        category_fetches: AtomicUsize,
        update_calls: AtomicUsize,
    }

    impl FakeApi {
        fn with_items(items: &[(&str, u64, &str)]) -> Self {
            let api = Self::default();
            {
                let mut stored = api.items.lock().expect("items lock");
                for (index, (name, quantity, category)) in items.iter().enumerate() {
                    stored.push(Item {
                        id: format!("id-{index}"),
                        name: name.to_string(),
                        quantity: *quantity,
                        category: category.to_string(),
                    });
                }
                let mut categories = api.categories.lock().expect("categories lock");
                for name in ["Tools", "Toys"] {
                    categories.push(Category {
                        id: format!("cat-{name}"),
                        category: name.to_string(),
                    });
                }
            }
            api
        }

        fn failure() -> ClientError {
            ClientError::Status {
                status: 500,
                message: "boom".to_string(),
            }
        }
    }

    #[async_trait]
    impl InventoryApi for FakeApi {
        async fn list_items(&self) -> ClientResult<Vec<Item>> {
            Ok(self.items.lock().expect("items lock").clone())
        }

        async fn create_item(&self, draft: &ItemDraft) -> ClientResult<Item> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            let mut items = self.items.lock().expect("items lock");
            let item = Item {
                id: format!("id-{}", items.len()),
                name: draft.name.clone(),
                quantity: draft.quantity.parse().unwrap_or(0),
                category: draft.category.clone(),
            };
            items.push(item.clone());
            Ok(item)
        }

        async fn update_item(&self, id: &str, draft: &ItemDraft) -> ClientResult<MessageResponse> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            let mut items = self.items.lock().expect("items lock");
            let item = items.iter_mut().find(|item| item.id == id).ok_or(ClientError::Status {
                status: 404,
                message: "Item not found".to_string(),
            })?;
            item.name = draft.name.clone();
            item.quantity = draft.quantity.parse().unwrap_or(0);
            item.category = draft.category.clone();
            Ok(MessageResponse::new("Item updated successfully"))
        }

        async fn delete_item(&self, id: &str) -> ClientResult<MessageResponse> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Self::failure());
            }
            self.items.lock().expect("items lock").retain(|item| item.id != id);
            Ok(MessageResponse::new("Item deleted successfully"))
        }

        async fn list_categories(&self) -> ClientResult<Vec<Category>> {
            self.category_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.categories.lock().expect("categories lock").clone())
        }

        async fn create_category(&self, name: &str) -> ClientResult<Category> {
            let category = Category {
                id: format!("cat-{name}"),
                category: name.to_string(),
            };
            self.categories.lock().expect("categories lock").push(category.clone());
            Ok(category)
        }
    }

    async fn loaded(items: &[(&str, u64, &str)]) -> TableController<FakeApi> {
        let mut table = TableController::new(FakeApi::with_items(items));
        table.load().await.expect("load");
        table
    }

    fn names<'a>(rows: impl Iterator<Item = &'a super::Row>) -> Vec<String> {
        rows.map(|row| row.values.name.clone()).collect()
    }

    #[tokio::test]
    async fn quantity_sort_toggles_between_ascending_and_descending() {
        let mut table = loaded(&[("A", 3, "Tools"), ("B", 1, "Tools"), ("C", 2, "Tools")]).await;

        assert_eq!(table.toggle_sort(Column::Quantity), SortOrder::Ascending);
        assert_eq!(names(table.rows().iter()), vec!["B", "C", "A"]);

        assert_eq!(table.toggle_sort(Column::Quantity), SortOrder::Descending);
        assert_eq!(names(table.rows().iter()), vec!["A", "C", "B"]);
    }

    #[tokio::test]
    async fn quantity_sort_compares_numbers_not_text() {
        let mut table = loaded(&[
            ("A", 10, "Tools"),
            ("B", 9, "Tools"),
            ("C", 100, "Tools"),
            ("D", 9, "Tools"),
        ])
        .await;

        table.toggle_sort(Column::Quantity);
        assert_eq!(names(table.rows().iter()), vec!["B", "D", "A", "C"]);

        table.toggle_sort(Column::Quantity);
        assert_eq!(names(table.rows().iter()), vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn unparsable_quantities_sort_as_zero() {
        assert_eq!(numeric_cell("abc"), 0.0);
        assert_eq!(numeric_cell(""), 0.0);
        assert_eq!(numeric_cell("NaN"), 0.0);
        assert_eq!(numeric_cell(" 7 "), 7.0);
    }

    #[tokio::test]
    async fn text_sort_ignores_case_and_keeps_ties_stable() {
        let mut table = loaded(&[
            ("beta", 1, "Tools"),
            ("Alpha", 2, "toys"),
            ("alpha", 3, "Tools"),
        ])
        .await;

        table.toggle_sort(Column::Name);
        assert_eq!(names(table.rows().iter()), vec!["Alpha", "alpha", "beta"]);

        // Each column keeps its own flag.
        assert_eq!(table.toggle_sort(Column::Category), SortOrder::Ascending);
        assert_eq!(names(table.rows().iter()), vec!["alpha", "beta", "Alpha"]);
    }

    #[tokio::test]
    async fn filters_compose_instead_of_overwriting_each_other() {
        let mut table = loaded(&[
            ("Widget", 5, "Tools"),
            ("Hammer", 1, "Tools"),
            ("Widget Toy", 2, "Toys"),
            ("Yoyo", 9, "Toys"),
        ])
        .await;

        table.set_name_filter("WID");
        assert_eq!(names(table.visible_rows()), vec!["Widget", "Widget Toy"]);

        table.set_category_filter("toys");
        assert_eq!(names(table.visible_rows()), vec!["Widget Toy"]);

        // Changing the name filter must not reveal rows the category filter hides.
        table.set_name_filter("");
        assert_eq!(names(table.visible_rows()), vec!["Widget Toy", "Yoyo"]);

        table.set_category_filter(ALL_CATEGORIES);
        assert_eq!(table.visible_rows().count(), 4);
        assert_eq!(table.rows().len(), 4, "hidden rows stay in the table");
    }

    #[tokio::test]
    async fn cancel_restores_snapshot_without_a_request() {
        let mut table = loaded(&[("Widget", 5, "Tools")]).await;

        table.begin_edit("id-0").expect("edit");
        table.edit_field("id-0", Column::Quantity, "42").expect("edit field");
        table.cancel("id-0").expect("cancel");

        let row = table.row("id-0").expect("row");
        assert_eq!(row.state, RowState::Display);
        assert_eq!(row.values.quantity, "5");
        assert_eq!(table.api().update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn save_commits_full_record_and_returns_to_display() {
        let mut table = loaded(&[("Widget", 5, "Tools")]).await;

        table.begin_edit("id-0").expect("edit");
        assert!(matches!(table.begin_edit("id-0"), Err(TableError::AlreadyEditing(_))));
        table.edit_field("id-0", Column::Quantity, "10").expect("edit field");
        table.save("id-0").await.expect("save");

        let row = table.row("id-0").expect("row");
        assert_eq!(row.state, RowState::Display);
        assert_eq!(row.values.quantity, "10");
        assert_eq!(row.values.name, "Widget");
        assert_eq!(table.api().items.lock().expect("items lock")[0].quantity, 10);
        assert_eq!(table.notices().latest().map(|n| n.message.as_str()), Some("Item updated!"));
    }

    #[tokio::test]
    async fn saved_row_is_hidden_when_it_no_longer_matches_the_filter() {
        let mut table = loaded(&[("Widget", 5, "Tools"), ("Hammer", 1, "Tools")]).await;
        table.set_category_filter("Tools");

        table.begin_edit("id-0").expect("edit");
        table.edit_field("id-0", Column::Category, "Toys").expect("edit field");
        table.save("id-0").await.expect("save");

        let row = table.row("id-0").expect("row");
        assert_eq!(row.values.category, "Toys");
        assert!(!row.visible);
        assert_eq!(names(table.visible_rows()), vec!["Hammer"]);
    }

    #[tokio::test]
    async fn failed_save_keeps_editing_and_raises_notice() {
        let mut table = loaded(&[("Widget", 5, "Tools")]).await;
        table.api().fail_writes.store(true, Ordering::SeqCst);

        table.begin_edit("id-0").expect("edit");
        assert!(table.save("id-0").await.is_err());
        assert!(table.row("id-0").expect("row").is_editing());
        assert!(table.notices().latest().expect("notice").is_error);
    }

    #[tokio::test]
    async fn delete_removes_row_only_after_confirmation() {
        let mut table = loaded(&[("Widget", 5, "Tools"), ("Gadget", 1, "Toys")]).await;

        table.api().fail_writes.store(true, Ordering::SeqCst);
        assert!(table.delete("id-0").await.is_err());
        assert_eq!(table.rows().len(), 2);

        table.api().fail_writes.store(false, Ordering::SeqCst);
        table.delete("id-0").await.expect("delete");
        assert_eq!(names(table.rows().iter()), vec!["Gadget"]);
    }

    #[tokio::test]
    async fn add_refetches_items_but_categories_load_once() {
        let mut table = loaded(&[("Widget", 5, "Tools")]).await;
        table
            .api()
            .create_category("Garden")
            .await
            .expect("create category");

        table.add(ItemDraft::new("Shovel", "3", "Garden")).await.expect("add");
        assert_eq!(names(table.rows().iter()), vec!["Widget", "Shovel"]);

        assert_eq!(table.api().category_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(table.categories().entry_form_options(), vec!["Tools", "Toys"]);
        assert_eq!(table.categories().filter_options(), vec!["All", "Tools", "Toys"]);

        table.categories_mut().refresh();
        table.load().await.expect("reload");
        assert_eq!(table.categories().entry_form_options(), vec!["Tools", "Toys", "Garden"]);
    }

    #[tokio::test]
    async fn unknown_rows_are_reported() {
        let mut table = loaded(&[]).await;
        assert!(matches!(table.begin_edit("missing"), Err(TableError::UnknownRow(_))));
        assert!(matches!(table.cancel("missing"), Err(TableError::UnknownRow(_))));
        assert!(matches!(table.delete("missing").await, Err(TableError::UnknownRow(_))));
    }
}
