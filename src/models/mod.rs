mod column_map;
mod sheet;

pub use column_map::ColumnMap;
pub use sheet::{HeaderRow, SheetGrid};
