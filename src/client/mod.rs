pub mod api;
pub mod notice;
pub mod table;

pub use api::{ClientError, ClientResult, HttpInventoryApi, InventoryApi, ItemDraft};
pub use notice::{Notice, Notices};
pub use table::{CategoryCache, Column, Row, RowState, RowValues, SortOrder, TableController, TableError};
