use sqlx::{Postgres, QueryBuilder};

use crate::db::literal::{self, LiteralError, SqlArg};
use crate::domain::MeterReading;

/// Target table. Schema is owned out-of-band; only its shape is relied on here.
pub const TABLE: &str = "meter_readings";
pub const COLUMNS: [&str; 3] = ["nmi", "timestamp", "consumption"];
pub const CONFLICT_KEY: [&str; 2] = ["nmi", "timestamp"];

/// A multi-row insert with `$N` placeholders and the arguments bound to them, in order.
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl InsertStatement {
    /// Splice the arguments into the SQL text as literals.
    pub fn render(&self) -> Result<String, LiteralError> {
        literal::inline_args(&self.sql, &self.args)
    }
}

/// Build `INSERT INTO meter_readings (...) VALUES (...), ... ON CONFLICT (nmi, timestamp) DO NOTHING`.
pub fn insert_batch_statement(batch: &[MeterReading]) -> InsertStatement {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO {TABLE} ({}) ",
        COLUMNS.join(", ")
    ));
    let mut args = Vec::with_capacity(batch.len() * COLUMNS.len());

    // push_values asserts a non-empty iterator in debug builds.
    if batch.is_empty() {
        builder.push("VALUES ");
    } else {
        builder.push_values(batch, |mut b, r| {
            b.push_bind(r.nmi.clone())
                .push_bind(r.timestamp)
                .push_bind(r.consumption);
            args.push(SqlArg::Text(r.nmi.clone()));
            args.push(SqlArg::Timestamp(r.timestamp));
            args.push(SqlArg::Float(r.consumption));
        });
    }

    builder.push(format!(" ON CONFLICT ({}) DO NOTHING", CONFLICT_KEY.join(", ")));

    InsertStatement {
        sql: builder.sql().to_owned(),
        args,
    }
}
