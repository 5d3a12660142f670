//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::cumulative;

/// Database row for one selection's cumulative flow.
///
/// Net values are not columns; they are derived from in and out on read.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = cumulative)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CumulativeRow {
    pub market_id: String,
    pub selection_id: String,
    pub team_label: String,
    pub in_back: f64,
    pub in_lay: f64,
    pub out_back: f64,
    pub out_lay: f64,
    pub last_back_stake: f64,
    pub last_lay_stake: f64,
    pub updated_at: String,
}
